//! Fixed timestep simulation tick
//!
//! One tick runs, in order:
//! 1. a query refresh so spawns and teleports are visible to the AI
//! 2. the entity pass (AI, controls, drag, bullet attrition, lifespans)
//!    with the world locked, so removals and shots are queued
//! 3. the physics step and the collision reactions
//! 4. the deferred queue, in enqueue order
//! 5. the wave spawner
//! 6. the session clock

use glam::Vec2;

use super::ai::{self, Neighbor};
use super::collision;
use super::deferred::DeferredAction;
use super::entity::{Control, ControlFlags, EntityId, EntityKind, Team};
use super::session::{GameEvent, Session};
use super::waves;
use crate::physics::{BodyExt, QueryFilter};

/// Advance the session by one fixed step
pub fn tick(session: &mut Session) {
    let dt_ms = session.config.tick_ms as i32;

    session.world.update_queries();
    session.world.lock();
    for id in session.entities.ids() {
        update_entity(session, id, dt_ms);
    }
    session.world.unlock();

    let contacts = session.world.step(session.config.tick_secs());
    session.world.lock();
    for contact in &contacts {
        collision::dispatch_contact(session, contact);
    }
    session.world.unlock();

    session.drain_deferred();
    waves::spawn_due_wave(session);
    session.clock.advance(session.config.tick_ms);
}

/// Run `n` ticks
pub fn run_ticks(session: &mut Session, n: u32) {
    for _ in 0..n {
        tick(session);
    }
}

fn update_entity(session: &mut Session, id: EntityId, dt_ms: i32) {
    let Some(entity) = session.entities.get(id) else {
        return;
    };
    let (kind, team) = (entity.kind, entity.team);

    if kind == EntityKind::Tank {
        if let Some(controls) = decide(session, id, team) {
            if let Some(entity) = session.entities.get_mut(id) {
                entity.controls = controls;
            }
        }
        apply_controls(session, id, dt_ms);
    }

    if matches!(kind, EntityKind::Tank | EntityKind::Scrap) {
        apply_drag(session, id);
    }

    if kind == EntityKind::Bullet {
        let min_energy = session.config.weapon.bullet_min_energy;
        if session
            .body(id)
            .is_some_and(|body| body.energy() < min_energy)
        {
            session.kill(id);
        }
    }

    age_lifespan(session, id, dt_ms);
}

/// AI controls for computer tanks; `None` leaves the current controls alone
fn decide(session: &Session, id: EntityId, team: Team) -> Option<ControlFlags> {
    let body = session.body(id)?;
    let (position, heading) = (body.center(), body.heading());
    let to_player = session
        .player_body()
        .map_or(Vec2::ZERO, |player| player.center() - position);
    let ai = &session.config.ai;

    match team {
        Team::Enemy => {
            let neighbors = session
                .world
                .point_query(position, ai.flock_radius, QueryFilter::categories(Team::Enemy.bit()))
                .into_iter()
                .filter(|hit| hit.key != id && hit.distance >= 0.0)
                .filter_map(|hit| {
                    let other = session.world.get(hit.handle)?;
                    let thrusting = session
                        .entities
                        .get(hit.key)
                        .is_some_and(|e| e.controls.contains(Control::Forward));
                    Some(Neighbor {
                        gradient: hit.gradient,
                        distance: hit.distance,
                        forward: other.forward(),
                        thrusting,
                    })
                });
            let flock = ai::flock_vector(neighbors, ai.separation);
            Some(ai::enemy_controls(heading, to_player, flock, ai.attraction))
        }
        Team::Ally => {
            let nearest = session.world.point_query_nearest(
                position,
                ai.ally_search_radius,
                QueryFilter::categories(Team::Enemy.bit()),
            );
            let controls = match nearest {
                Some(hit) => {
                    let target = session.world.get(hit.handle)?.center();
                    ai::ally_block_controls(heading, target - position)
                }
                None if ai.ally_follow_player => {
                    ai::ally_follow_controls(heading, to_player, ai.ally_follow_distance_sq)
                }
                None => ControlFlags::NONE,
            };
            Some(controls)
        }
        _ => None,
    }
}

/// Motor forces, turning torque and the trigger
fn apply_controls(session: &mut Session, id: EntityId, dt_ms: i32) {
    let Session {
        config,
        world,
        entities,
        deferred,
        ..
    } = session;
    let Some(entity) = entities.get_mut(id) else {
        return;
    };
    let Some(moment) = world.moment(entity.body) else {
        return;
    };
    let Some(body) = world.get_mut(entity.body) else {
        return;
    };

    let motor = *config.motors.units.get(entity.team);
    let controls = entity.controls;
    let mass = body.mass();

    if controls.contains(Control::Forward) {
        let thrust = config.motors.forward_factor * motor.speed_unit * mass;
        body.add_local_force(Vec2::new(0.0, thrust));
    }
    if controls.contains(Control::Reverse) {
        let thrust = config.motors.reverse_factor * motor.speed_unit * mass;
        body.add_local_force(Vec2::new(0.0, -thrust));
    }
    if controls.contains(Control::TurnLeft) {
        body.add_torque(-motor.angle_unit * moment, true);
    }
    if controls.contains(Control::TurnRight) {
        body.add_torque(motor.angle_unit * moment, true);
    }
    if controls.contains(Control::Shoot) {
        entity.shoot_timer_ms -= dt_ms;
        if entity.shoot_timer_ms < 0 {
            entity.shoot_timer_ms = config.weapon.reload_ms;
            deferred.push(DeferredAction::Fire(id));
        }
    }
}

/// Velocity-proportional drag; Grip multiplies it when enabled
fn apply_drag(session: &mut Session, id: EntityId) {
    let Session {
        config,
        world,
        entities,
        ..
    } = session;
    let Some(entity) = entities.get(id) else {
        return;
    };
    let Some(moment) = world.moment(entity.body) else {
        return;
    };
    let Some(body) = world.get_mut(entity.body) else {
        return;
    };

    let drag = &config.drag;
    let grip = if config.grip_enabled && entity.controls.contains(Control::Grip) {
        drag.grip_multiplier
    } else {
        1.0
    };

    let force = body.linear_velocity() * (-drag.linear * grip * body.mass());
    body.add_world_force(force);
    body.add_torque(-drag.angular * grip * body.angvel() * moment, true);
}

/// Count down the team lifespan; enemies turn to scrap, allies expire
fn age_lifespan(session: &mut Session, id: EntityId, dt_ms: i32) {
    let Some(entity) = session.entities.get_mut(id) else {
        return;
    };
    if entity.scrap_timer_ms <= 0 || !entity.is_tank() {
        return;
    }
    entity.scrap_timer_ms -= dt_ms;
    if entity.scrap_timer_ms > 0 {
        return;
    }

    let team = entity.team;
    match team {
        Team::Enemy => {
            entity.become_scrap(&mut session.world);
            log::debug!("{id} scrapped");
            session.events.push(GameEvent::EnemyScrapped(id));
        }
        Team::Ally => {
            session.kill(id);
            session.events.push(GameEvent::AllyExpired(id));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::session::tests::arena;

    fn ticks_for(ms: u32) -> u32 {
        ms.div_ceil(crate::consts::TIME_STEP_MS)
    }

    #[test]
    fn test_tick_advances_clock() {
        let mut session = arena();
        tick(&mut session);
        tick(&mut session);
        assert_eq!(session.clock().elapsed_ms, 30);
        assert!(!session.world().is_locked());
    }

    #[test]
    fn test_forward_control_moves_player() {
        let mut session = arena();
        session.set_player_control(Control::Forward, true);
        run_ticks(&mut session, 20);
        let body = session.player_body().unwrap();
        assert!(body.center().y > 0.0);
        assert!(body.center().x.abs() < 1e-3);
    }

    #[test]
    fn test_turn_right_spins_positive() {
        let mut session = arena();
        session.set_player_control(Control::TurnRight, true);
        run_ticks(&mut session, 10);
        assert!(session.player_body().unwrap().angle() > 0.0);
    }

    #[test]
    fn test_drag_settles_motion() {
        let mut session = arena();
        let player = session.player();
        session
            .body_mut(player)
            .unwrap()
            .set_linear_velocity(Vec2::new(100.0, 0.0));
        run_ticks(&mut session, 200);
        assert!(session.player_body().unwrap().linear_velocity().length() < 1.0);
    }

    #[test]
    fn test_shoot_fires_through_deferred_queue() {
        let mut session = arena();
        session.set_player_control(Control::Shoot, true);
        tick(&mut session);
        // First shot on the first tick, drained before the tick returns
        assert_eq!(session.team_count(Team::Neutral), 1);
        assert!(session.deferred().is_empty());
        assert_eq!(session.player_entity().unwrap().shoot_timer_ms, 100);
    }

    #[test]
    fn test_reload_limits_fire_rate() {
        let mut session = arena();
        session.set_player_control(Control::Shoot, true);
        let mut shots = 0;
        for _ in 0..ticks_for(1_000) {
            tick(&mut session);
            shots += session
                .drain_events()
                .iter()
                .filter(|e| matches!(e, GameEvent::ShotFired { .. }))
                .count();
        }
        // The timer must drop below zero: one shot every 7 ticks
        assert_eq!(shots, 10);
    }

    #[test]
    fn test_slow_bullet_is_removed() {
        let mut session = arena();
        let bullet = session.spawn(Vec2::new(200.0, 200.0), EntityKind::Bullet, Team::Neutral);
        tick(&mut session);
        assert!(session.entity(bullet).is_none());
    }

    #[test]
    fn test_fast_bullet_survives() {
        let mut session = arena();
        let bullet = session.spawn(Vec2::new(200.0, 200.0), EntityKind::Bullet, Team::Neutral);
        session
            .body_mut(bullet)
            .unwrap()
            .set_linear_velocity(Vec2::new(0.0, 1000.0));
        tick(&mut session);
        assert!(session.entity(bullet).is_some());
    }

    #[test]
    fn test_enemy_turns_to_scrap() {
        let mut session = arena();
        let enemy = session.spawn(Vec2::new(0.0, 400.0), EntityKind::Tank, Team::Enemy);
        run_ticks(&mut session, ticks_for(15_000));
        let entity = session.entity(enemy).unwrap();
        assert_eq!(entity.kind, EntityKind::Scrap);
        assert_eq!(entity.team, Team::Scrap);
        assert!(entity.controls.is_empty());
        let body = session.entity(enemy).unwrap().body;
        assert_eq!(session.world().groups(body), Some(Team::Scrap.groups()));
        assert!(
            session
                .drain_events()
                .contains(&GameEvent::EnemyScrapped(enemy))
        );
    }

    #[test]
    fn test_ally_expires() {
        let mut session = arena();
        let ally = session.spawn(Vec2::new(300.0, 0.0), EntityKind::Tank, Team::Ally);
        run_ticks(&mut session, ticks_for(20_000) - 1);
        assert!(session.entity(ally).is_some());
        tick(&mut session);
        assert!(session.entity(ally).is_none());
    }

    #[test]
    fn test_enemy_chases_player() {
        let mut session = arena();
        let enemy = session.spawn(Vec2::new(0.0, 150.0), EntityKind::Tank, Team::Enemy);
        // Face the player (body angle π points the nose at -y)
        session
            .body_mut(enemy)
            .unwrap()
            .set_angle(std::f32::consts::PI);
        tick(&mut session);
        let controls = session.entity(enemy).unwrap().controls;
        assert!(controls.contains(Control::Forward));
        run_ticks(&mut session, 30);
        assert!(session.position(enemy).unwrap().y < 150.0);
    }

    #[test]
    fn test_ally_drives_at_enemy_in_range() {
        let mut session = arena();
        let ally = session.spawn(Vec2::new(200.0, 0.0), EntityKind::Tank, Team::Ally);
        session.spawn(Vec2::new(200.0, 100.0), EntityKind::Tank, Team::Enemy);
        tick(&mut session);
        assert!(session.entity(ally).unwrap().controls.contains(Control::Forward));
    }

    #[test]
    fn test_idle_ally_without_follow() {
        let mut session = arena();
        let ally = session.spawn(Vec2::new(200.0, 0.0), EntityKind::Tank, Team::Ally);
        tick(&mut session);
        assert!(session.entity(ally).unwrap().controls.is_empty());
    }

    #[test]
    fn test_ally_follows_player_in_roster_variant() {
        let mut session = Session::new(GameConfig::roster()).unwrap();
        let ally = session.spawn(Vec2::new(0.0, -150.0), EntityKind::Tank, Team::Ally);
        tick(&mut session);
        let controls = session.entity(ally).unwrap().controls;
        assert!(controls.contains(Control::Forward));
    }

    #[test]
    fn test_enemy_contact_ends_game_once() {
        let mut session = arena();
        session.start();
        session.drain_events();
        session.set_player_control(Control::Forward, true);
        session.spawn(Vec2::new(0.0, 12.0), EntityKind::Tank, Team::Enemy);
        tick(&mut session);

        let over_at = session.clock().game_over_at_ms;
        assert!(over_at.is_some());
        assert!(session.player_entity().unwrap().controls.is_empty());

        run_ticks(&mut session, 10);
        assert_eq!(session.clock().game_over_at_ms, over_at);
        let overs = session
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count();
        assert_eq!(overs, 1);
    }

    #[test]
    fn test_bullets_on_scrap_call_reinforcements() {
        let mut session = arena();
        let scrap = session.spawn(Vec2::new(0.0, 300.0), EntityKind::Tank, Team::Enemy);
        session.scrap(scrap);

        for _ in 0..4 {
            let target = session.body_mut(scrap).unwrap();
            target.set_linear_velocity(Vec2::ZERO);
            target.set_angular_velocity(0.0);
            // Overlapping, so the contact starts on this tick's step
            let at = target.center() - Vec2::new(0.0, 8.5);
            let bullet = session.spawn(at, EntityKind::Bullet, Team::Neutral);
            session
                .body_mut(bullet)
                .unwrap()
                .set_linear_velocity(Vec2::new(0.0, 1000.0));
            tick(&mut session);
            assert!(session.entity(bullet).is_none());
        }

        assert!(session.entity(scrap).is_none());
        assert_eq!(session.team_count(Team::Ally), 3);
    }

    #[test]
    fn test_waves_arrive_after_start() {
        let mut session = arena();
        session.start();
        // The clock has not moved yet on the first tick
        tick(&mut session);
        assert_eq!(session.waves().wave_count, 0);
        tick(&mut session);
        assert_eq!(session.waves().wave_count, 1);
        assert_eq!(session.waves().next_wave_at_ms, 10_000);
        assert_eq!(session.team_count(Team::Enemy), 1);
        assert!(
            session
                .drain_events()
                .contains(&GameEvent::WaveSpawned { wave: 1, enemies: 1 })
        );
    }

    #[test]
    fn test_determinism() {
        let mut a = Session::new(GameConfig::roster()).unwrap();
        let mut b = Session::new(GameConfig::roster()).unwrap();
        a.start();
        b.start();
        for session in [&mut a, &mut b] {
            session.set_player_control(Control::Shoot, true);
            session.set_player_control(Control::TurnLeft, true);
        }
        run_ticks(&mut a, 300);
        run_ticks(&mut b, 300);

        assert_eq!(a.entity_count(), b.entity_count());
        let positions = |s: &Session| {
            let mut out = Vec::new();
            s.for_each(|id, _, body| out.push((id, body.center())));
            out
        };
        assert_eq!(positions(&a), positions(&b));
    }
}
