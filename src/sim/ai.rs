//! Steering decisions for computer-controlled tanks
//!
//! All functions here are pure: they take the geometry the tick gathered
//! from the world and return the control flags to apply this frame.

use std::f32::consts::FRAC_PI_2;

use glam::Vec2;

use super::entity::{Control, ControlFlags};
use crate::normalize_angle;

/// A same-team tank seen by the flocking query
#[derive(Debug, Clone, Copy)]
pub struct Neighbor {
    /// Unit vector from the neighbor toward the querying tank
    pub gradient: Vec2,
    /// Distance from the querying point to the neighbor's surface
    pub distance: f32,
    /// Neighbor facing
    pub forward: Vec2,
    /// Whether the neighbor is currently driving forward
    pub thrusting: bool,
}

/// Signed angle from `heading` to the direction of `desired`, in (-π, π]
#[inline]
pub fn heading_error(heading: f32, desired: Vec2) -> f32 {
    normalize_angle(desired.y.atan2(desired.x) - heading)
}

/// Turn toward `desired`, driving forward only when `drive` allows it and
/// the target is strictly within 90° of the heading
pub fn steer(heading: f32, desired: Vec2, drive: bool) -> ControlFlags {
    let error = heading_error(heading, desired);
    let mut flags = ControlFlags::NONE;
    if drive && error.abs() < FRAC_PI_2 {
        flags.insert(Control::Forward);
    }
    if error > 0.0 {
        flags.insert(Control::TurnRight);
    } else {
        flags.insert(Control::TurnLeft);
    }
    flags
}

/// Boid separation and alignment summed over the neighbors
///
/// Separation pushes away from every neighbor with strength
/// `separation / distance²`; alignment adds the facing of every neighbor
/// that is driving forward.
pub fn flock_vector(neighbors: impl IntoIterator<Item = Neighbor>, separation: f32) -> Vec2 {
    neighbors.into_iter().fold(Vec2::ZERO, |acc, n| {
        let mut acc = acc;
        if n.distance > 0.0 {
            acc += n.gradient * (separation / (n.distance * n.distance));
        }
        if n.thrusting {
            acc += n.forward;
        }
        acc
    })
}

/// Desired direction of an enemy: pull toward the player plus the
/// normalized flocking vector. Zero-length terms are skipped.
pub fn enemy_desired_direction(to_player: Vec2, flock: Vec2, attraction: f32) -> Option<Vec2> {
    let mut go = Vec2::ZERO;
    let dist_sq = to_player.length_squared();
    if dist_sq > f32::EPSILON {
        go += to_player * (attraction / dist_sq);
    }
    if let Some(dir) = flock.try_normalize() {
        go += dir;
    }
    go.try_normalize()
}

/// Enemy controls: chase the player while keeping formation
pub fn enemy_controls(heading: f32, to_player: Vec2, flock: Vec2, attraction: f32) -> ControlFlags {
    match enemy_desired_direction(to_player, flock, attraction) {
        Some(dir) => steer(heading, dir, true),
        None => ControlFlags::NONE,
    }
}

/// Ally controls when an enemy is in range: drive at it to get in its way
pub fn ally_block_controls(heading: f32, to_enemy: Vec2) -> ControlFlags {
    if to_enemy.length_squared() <= f32::EPSILON {
        return ControlFlags::only(Control::Forward);
    }
    let mut flags = steer(heading, to_enemy, false);
    flags.insert(Control::Forward);
    flags
}

/// Ally controls with nothing to block: drift back to the player, only
/// driving once farther than the follow distance
pub fn ally_follow_controls(heading: f32, to_player: Vec2, follow_distance_sq: f32) -> ControlFlags {
    if to_player.length_squared() <= f32::EPSILON {
        return ControlFlags::NONE;
    }
    let far_enough = to_player.length_squared() > follow_distance_sq;
    steer(heading, to_player, far_enough)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::PI;

    /// Heading of a tank at body angle 0 (facing +y)
    const NORTH: f32 = FRAC_PI_2;

    #[test]
    fn test_target_dead_ahead() {
        let to_player = Vec2::new(0.0, 250.0);
        assert_eq!(heading_error(NORTH, to_player), 0.0);
        let flags = enemy_controls(NORTH, to_player, Vec2::ZERO, 25.0);
        assert!(flags.contains(Control::Forward));
        assert!(flags.contains(Control::TurnLeft));
        assert!(!flags.contains(Control::TurnRight));
    }

    #[test]
    fn test_target_behind_flips_turn_and_stops() {
        let flags = enemy_controls(NORTH, Vec2::new(0.0, -250.0), Vec2::ZERO, 25.0);
        assert!(!flags.contains(Control::Forward));
        assert!(flags.contains(Control::TurnRight));
        assert!(!flags.contains(Control::TurnLeft));
    }

    #[test]
    fn test_exactly_ninety_degrees_does_not_drive() {
        let error = heading_error(NORTH, Vec2::new(250.0, 0.0));
        assert_eq!(error.abs(), FRAC_PI_2);
        let flags = enemy_controls(NORTH, Vec2::new(250.0, 0.0), Vec2::ZERO, 25.0);
        assert!(!flags.contains(Control::Forward));
        assert!(flags.contains(Control::TurnLeft));
    }

    #[test]
    fn test_just_inside_ninety_degrees_drives() {
        let flags = steer(NORTH, Vec2::new(1.0, 0.01), true);
        assert!(flags.contains(Control::Forward));
    }

    #[test]
    fn test_no_steering_input_yields_no_controls() {
        assert_eq!(enemy_controls(NORTH, Vec2::ZERO, Vec2::ZERO, 25.0), ControlFlags::NONE);
    }

    #[test]
    fn test_flock_skips_alignment_of_idle_neighbors() {
        let idle = Neighbor {
            gradient: Vec2::X,
            distance: 10.0,
            forward: Vec2::Y,
            thrusting: false,
        };
        let v = flock_vector([idle], 300.0);
        assert!((v - Vec2::new(3.0, 0.0)).length() < 1e-5);

        let moving = Neighbor { thrusting: true, ..idle };
        let v = flock_vector([moving], 300.0);
        assert!((v - Vec2::new(3.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_flock_ignores_zero_distance_separation() {
        let overlapping = Neighbor {
            gradient: Vec2::X,
            distance: 0.0,
            forward: Vec2::Y,
            thrusting: false,
        };
        assert_eq!(flock_vector([overlapping], 300.0), Vec2::ZERO);
    }

    #[test]
    fn test_attraction_fades_with_distance() {
        // Far away, flocking dominates the desired direction
        let dir = enemy_desired_direction(Vec2::new(0.0, 1000.0), Vec2::X, 25.0).unwrap();
        assert!(dir.x > 0.99);
        // Close by, the player pull dominates
        let dir = enemy_desired_direction(Vec2::new(0.0, 1.0), Vec2::X, 25.0).unwrap();
        assert!(dir.y > 0.99);
    }

    #[test]
    fn test_ally_block_always_drives() {
        let flags = ally_block_controls(NORTH, Vec2::new(0.0, -50.0));
        assert!(flags.contains(Control::Forward));
        assert!(flags.contains(Control::TurnRight));
    }

    #[test]
    fn test_ally_follow_only_drives_when_far() {
        let near = ally_follow_controls(NORTH, Vec2::new(0.0, 60.0), 4900.0);
        assert!(!near.contains(Control::Forward));
        let far = ally_follow_controls(NORTH, Vec2::new(0.0, 80.0), 4900.0);
        assert!(far.contains(Control::Forward));
    }

    proptest! {
        #[test]
        fn forward_iff_within_ninety_degrees(heading in -PI..PI, angle in -PI..PI) {
            let desired = Vec2::new(angle.cos(), angle.sin());
            let error = heading_error(heading, desired);
            let flags = steer(heading, desired, true);
            prop_assert_eq!(flags.contains(Control::Forward), error.abs() < FRAC_PI_2);
            prop_assert!(flags.contains(Control::TurnLeft) != flags.contains(Control::TurnRight));
        }
    }
}
