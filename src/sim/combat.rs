//! Weapon firing
//!
//! A shot spawns a bullet at the muzzle, kicks it forward and pushes the
//! tank back. Heavier tanks fire harder and recoil less.

use glam::Vec2;

use super::entity::{EntityId, EntityKind, Team};
use super::session::{GameEvent, Session};
use crate::physics::BodyExt;

/// Launch impulse magnitudes along the tank's forward axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchImpulses {
    pub bullet: f32,
    /// Negative: pushes the tank backwards
    pub recoil: f32,
}

/// Impulses for a shot with base speed `launch_speed`
///
/// `bullet / launch_speed == tank_mass / bullet_mass == launch_speed / |recoil|`.
pub fn launch_impulses(tank_mass: f32, bullet_mass: f32, launch_speed: f32) -> LaunchImpulses {
    LaunchImpulses {
        bullet: launch_speed * tank_mass / bullet_mass,
        recoil: -launch_speed * bullet_mass / tank_mass,
    }
}

/// Where a bullet appears for a tank at `position` facing `forward`
#[inline]
pub fn muzzle_position(position: Vec2, forward: Vec2, offset: f32) -> Vec2 {
    position + forward * offset
}

/// Fire the weapon of `shooter`
///
/// Must run outside the locked world. Returns the new bullet, or `None` when
/// the shooter no longer exists.
pub fn fire(session: &mut Session, shooter: EntityId) -> Option<EntityId> {
    let weapon = session.config.weapon;
    let (position, forward, velocity, angle, tank_mass) = {
        let body = session.body(shooter)?;
        (
            body.center(),
            body.forward(),
            body.linear_velocity(),
            BodyExt::angle(body),
            body.mass(),
        )
    };

    let muzzle = muzzle_position(position, forward, weapon.muzzle_offset);
    let bullet = session.spawn(muzzle, EntityKind::Bullet, Team::Neutral);

    let bullet_mass = session.body(bullet)?.mass();
    let impulses = launch_impulses(tank_mass, bullet_mass, weapon.launch_speed);

    if let Some(body) = session.body_mut(bullet) {
        body.set_linear_velocity(velocity);
        body.set_angle(angle);
        body.apply_impulse_at_world_point(forward * impulses.bullet, muzzle);
    }
    if let Some(body) = session.body_mut(shooter) {
        body.apply_impulse_at_world_point(forward * impulses.recoil, position);
    }

    session.events.push(GameEvent::ShotFired { shooter, bullet });
    Some(bullet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::session::tests::arena;
    use proptest::prelude::*;

    #[test]
    fn test_player_shot_impulses() {
        let impulses = launch_impulses(100.0, 30.0, 3000.0);
        assert!((impulses.bullet - 10_000.0).abs() < 1e-2);
        assert!((impulses.recoil + 900.0).abs() < 1e-3);
    }

    #[test]
    fn test_fire_spawns_bullet_at_muzzle() {
        let mut session = arena();
        let player = session.player();
        let bullet = fire(&mut session, player).unwrap();

        let body = session.body(bullet).unwrap();
        // Angle 0 faces +y
        assert!((body.center() - Vec2::new(0.0, 15.0)).length() < 1e-4);
        assert!(body.linear_velocity().y > 0.0);
        assert_eq!(session.entity(bullet).unwrap().kind, EntityKind::Bullet);
        assert_eq!(session.entity(bullet).unwrap().team, Team::Neutral);

        let tank = session.player_body().unwrap();
        assert!(tank.linear_velocity().y < 0.0);
    }

    #[test]
    fn test_fire_momentum_ratio() {
        let mut session = arena();
        let player = session.player();
        let v0 = Vec2::new(20.0, 5.0);
        session.body_mut(player).unwrap().set_linear_velocity(v0);

        let bullet = fire(&mut session, player).unwrap();

        // Bullet inherits the tank velocity, so compare in that frame
        let tank = session.player_body().unwrap();
        let shot = session.body(bullet).unwrap();
        let tank_dp = tank.mass() * (tank.linear_velocity() - v0);
        let shot_dp = shot.mass() * (shot.linear_velocity() - v0);
        assert!(tank_dp.dot(shot_dp) < 0.0);
        // Impulses scale as (mt/mb) and (mb/mt)
        let ratio = shot_dp.length() / tank_dp.length();
        assert!((ratio - (100.0f32 / 30.0).powi(2)).abs() < 2e-2);
    }

    #[test]
    fn test_fire_on_missing_shooter_is_noop() {
        let mut session = arena();
        let count = session.entity_count();
        assert!(fire(&mut session, EntityId(999)).is_none());
        assert_eq!(session.entity_count(), count);
    }

    proptest! {
        #[test]
        fn launch_ratios_hold(tank_mass in 1.0f32..500.0, bullet_mass in 1.0f32..500.0) {
            let base = 3000.0;
            let impulses = launch_impulses(tank_mass, bullet_mass, base);
            let mass_ratio = tank_mass / bullet_mass;
            prop_assert!(((impulses.bullet / base) - mass_ratio).abs() <= mass_ratio * 1e-4);
            prop_assert!(((base / impulses.recoil.abs()) - mass_ratio).abs() <= mass_ratio * 1e-4);
            prop_assert!(impulses.recoil < 0.0);
        }
    }
}
