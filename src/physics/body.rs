//! Body descriptions and glam-flavored access to rapier bodies

use glam::Vec2;
use rapier2d::prelude::*;

use super::CollisionType;
use crate::{perp, rotation_vector};

/// Key stored in a body's `user_data`, mapping it back to its owner
pub trait BodyKey: Copy + Ord {
    fn to_user_data(self) -> u128;
    fn from_user_data(data: u128) -> Self;
}

impl BodyKey for u32 {
    fn to_user_data(self) -> u128 {
        u128::from(self)
    }

    fn from_user_data(data: u128) -> Self {
        data as u32
    }
}

/// Everything needed to create a body with its single ball collider
#[derive(Debug, Clone, Copy)]
pub struct BodyDesc<K> {
    pub key: K,
    pub position: Vec2,
    pub radius: f32,
    pub mass: f32,
    pub groups: InteractionGroups,
    pub collision_type: CollisionType,
}

/// Rotational inertia of a solid disc
#[inline]
pub fn moment_for_circle(mass: f32, radius: f32) -> f32 {
    mass * radius * radius / 2.0
}

#[inline]
pub(crate) fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

#[inline]
pub(crate) fn to_vec2(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// Game-side view of a rigid body in glam types
///
/// Forces added here last until the world's next step.
pub trait BodyExt {
    fn center(&self) -> Vec2;
    fn set_center(&mut self, position: Vec2);
    fn linear_velocity(&self) -> Vec2;
    fn set_linear_velocity(&mut self, velocity: Vec2);
    /// Orientation (radians)
    fn angle(&self) -> f32;
    fn set_angle(&mut self, angle: f32);
    fn set_angular_velocity(&mut self, angular_velocity: f32);
    /// Facing direction: the body's local +y axis in world space
    fn forward(&self) -> Vec2;
    /// Heading angle of [`BodyExt::forward`]
    fn heading(&self) -> f32;
    /// Force along body-local axes, applied at the center
    fn add_local_force(&mut self, force: Vec2);
    fn add_world_force(&mut self, force: Vec2);
    fn apply_world_impulse(&mut self, impulse: Vec2);
    fn apply_impulse_at_world_point(&mut self, impulse: Vec2, point: Vec2);
    /// Kinetic energy in the `m·v² + I·ω²` convention
    fn energy(&self) -> f32;
}

impl BodyExt for RigidBody {
    fn center(&self) -> Vec2 {
        to_vec2(self.translation())
    }

    fn set_center(&mut self, position: Vec2) {
        self.set_translation(to_vector(position), true);
    }

    fn linear_velocity(&self) -> Vec2 {
        to_vec2(self.linvel())
    }

    fn set_linear_velocity(&mut self, velocity: Vec2) {
        self.set_linvel(to_vector(velocity), true);
    }

    fn angle(&self) -> f32 {
        self.rotation().angle()
    }

    fn set_angle(&mut self, angle: f32) {
        self.set_rotation(Rotation::new(angle), true);
    }

    fn set_angular_velocity(&mut self, angular_velocity: f32) {
        self.set_angvel(angular_velocity, true);
    }

    fn forward(&self) -> Vec2 {
        perp(rotation_vector(BodyExt::angle(self)))
    }

    fn heading(&self) -> f32 {
        BodyExt::angle(self) + std::f32::consts::FRAC_PI_2
    }

    fn add_local_force(&mut self, force: Vec2) {
        let world = rotation_vector(BodyExt::angle(self)).rotate(force);
        self.add_force(to_vector(world), true);
    }

    fn add_world_force(&mut self, force: Vec2) {
        self.add_force(to_vector(force), true);
    }

    fn apply_world_impulse(&mut self, impulse: Vec2) {
        self.apply_impulse(to_vector(impulse), true);
    }

    fn apply_impulse_at_world_point(&mut self, impulse: Vec2, point: Vec2) {
        self.apply_impulse_at_point(to_vector(impulse), point![point.x, point.y], true);
    }

    fn energy(&self) -> f32 {
        // rapier reports the halved form
        2.0 * self.kinetic_energy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamic_at(position: Vec2) -> RigidBody {
        RigidBodyBuilder::dynamic()
            .translation(to_vector(position))
            .build()
    }

    #[test]
    fn test_vector_conversions() {
        let v = Vec2::new(3.5, -2.0);
        assert_eq!(to_vec2(&to_vector(v)), v);
    }

    #[test]
    fn test_forward_follows_angle() {
        let mut body = dynamic_at(Vec2::ZERO);
        assert!((body.forward() - Vec2::Y).length() < 1e-6);
        body.set_angle(std::f32::consts::FRAC_PI_2);
        // Local +y rotated by 90° points along -x
        assert!((body.forward() - Vec2::new(-1.0, 0.0)).length() < 1e-5);
        assert!((body.heading() - std::f32::consts::PI).abs() < 1e-5);
    }

    #[test]
    fn test_center_and_velocity_setters() {
        let mut body = dynamic_at(Vec2::new(3.0, 4.0));
        assert_eq!(body.center(), Vec2::new(3.0, 4.0));
        body.set_center(Vec2::new(-1.0, 2.0));
        body.set_linear_velocity(Vec2::new(5.0, 0.0));
        assert_eq!(body.center(), Vec2::new(-1.0, 2.0));
        assert_eq!(body.linear_velocity(), Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_moment_for_circle() {
        assert_eq!(moment_for_circle(100.0, 10.0), 5_000.0);
        assert_eq!(moment_for_circle(20.0, 3.0), 90.0);
    }

    #[test]
    fn test_u32_key_roundtrip() {
        assert_eq!(u32::from_user_data(7u32.to_user_data()), 7);
    }
}
