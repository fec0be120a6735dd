//! Tank Waves - a top-down arcade tank survival game
//!
//! Core modules:
//! - `sim`: Fixed-tick simulation (entities, AI, combat, waves, collision reactions)
//! - `physics`: Minimal 2D circle-body world the simulation runs on
//! - `renderer`: Camera-relative presentation onto an abstract canvas
//! - `input`: Key events to player controls and session actions
//! - `config`: Data-driven tuning tables for both game variants

pub mod config;
pub mod error;
pub mod input;
pub mod physics;
pub mod pilot;
pub mod renderer;
pub mod sim;

pub use config::GameConfig;
pub use error::ConfigError;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep in milliseconds
    pub const TIME_STEP_MS: u32 = 15;
    /// Weapon reload time in milliseconds
    pub const SHOOT_RELOAD_MS: i32 = 100;

    /// Arena variant screen size
    pub const SCREEN_WIDTH: f32 = 320.0;
    pub const SCREEN_HEIGHT: f32 = 240.0;

    /// Spacing of the background dot grid (pixels)
    pub const GRID_SPACING: i32 = 16;
}

/// Normalize an angle to (-π, π]
///
/// Angles already in range come back bit-for-bit unchanged.
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    while angle > PI {
        angle -= TAU;
    }
    while angle <= -PI {
        angle += TAU;
    }
    angle
}

/// Unit vector for an angle (the body "rotation" vector)
#[inline]
pub fn rotation_vector(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Perpendicular of a vector (rotated +90°)
#[inline]
pub fn perp(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// 2D cross product (z component)
#[inline]
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_boundaries() {
        assert_eq!(normalize_angle(0.0), 0.0);
        assert_eq!(normalize_angle(-PI / 2.0), -PI / 2.0);
        assert!((normalize_angle(PI) - PI).abs() < 1e-6);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-6);
        assert!((normalize_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_perp_of_rotation_is_forward() {
        // Angle 0 faces local +y
        let forward = perp(rotation_vector(0.0));
        assert!((forward - Vec2::Y).length() < 1e-6);
    }

    proptest! {
        #[test]
        fn normalize_angle_stays_in_range(angle in -100.0f32..100.0) {
            let n = normalize_angle(angle);
            prop_assert!(n > -PI && n <= PI + 1e-6);
            // Same direction as the input
            prop_assert!((rotation_vector(n) - rotation_vector(angle)).length() < 1e-3);
        }
    }
}
