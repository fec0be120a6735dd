//! Collision reactions
//!
//! The physics step reports contacts for the registered team pairs; the
//! reactions here run with the world locked, so every structural change
//! they make goes through the deferred queue.

use glam::Vec2;

use super::deferred::{DeferredAction, DeferredQueue};
use super::entity::{Entity, EntityId, EntityKind, Team};
use super::session::{GameEvent, Session, SessionClock};
use crate::physics::{BodyExt, BodyHandle, Contact};

/// Counts bullet hits on scrap; every n-th hit calls in reinforcements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapHitCounter {
    count: u32,
}

impl ScrapHitCounter {
    /// Record one hit; true when the count wraps back to zero
    pub fn register_hit(&mut self, period: u32) -> bool {
        self.count = (self.count + 1) % period.max(1);
        self.count == 0
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

/// Player touched an enemy: end the game once and let go of the controls
///
/// Returns true if this contact ended the game.
pub fn on_player_enemy_touch(clock: &mut SessionClock, player: &mut Entity) -> bool {
    if !clock.latch_game_over() {
        return false;
    }
    player.controls.clear();
    true
}

/// Bullet touched scrap: the bullet is spent, and every `period`-th hit the
/// scrap turns into reinforcements
///
/// Returns true if an ally wave was queued.
pub fn on_bullet_scrap_touch(
    counter: &mut ScrapHitCounter,
    period: u32,
    queue: &mut DeferredQueue,
    bullet: EntityId,
    scrap: EntityId,
) -> bool {
    queue.push(DeferredAction::Kill(bullet));
    if counter.register_hit(period) {
        queue.push(DeferredAction::SpawnAllyWave(scrap));
        true
    } else {
        false
    }
}

/// Route a reported contact to its reaction
pub fn dispatch_contact(session: &mut Session, contact: &Contact<EntityId>) {
    let team_of = |handle: BodyHandle| {
        session
            .world
            .collision_type(handle)
            .and_then(Team::from_collision_type)
    };
    let (Some(team_a), Some(team_b)) = (team_of(contact.body_a), team_of(contact.body_b)) else {
        return;
    };

    match (team_a, team_b) {
        (Team::Player, Team::Enemy) => {
            let Some(player) = session.entities.get_mut(contact.a) else {
                return;
            };
            if on_player_enemy_touch(&mut session.clock, player) {
                let survived_ms = session.clock.survival_ms();
                log::info!("Game over after {} ms, rammed by {}", survived_ms, contact.b);
                session.events.push(GameEvent::GameOver { survived_ms });
            }
        }
        (Team::Neutral, Team::Scrap) => {
            let is_bullet = session
                .entities
                .get(contact.a)
                .is_some_and(|e| e.kind == EntityKind::Bullet);
            if !is_bullet {
                return;
            }
            let period = session.config.reinforcements.hits_per_wave;
            if on_bullet_scrap_touch(
                &mut session.scrap_hits,
                period,
                &mut session.deferred,
                contact.a,
                contact.b,
            ) {
                log::debug!("Scrap {} will turn into reinforcements", contact.b);
            }
        }
        _ => {}
    }
}

/// Impulses for a symmetric burst: `base` rotated by equal steps
pub fn burst_impulses(base: Vec2, count: u32) -> Vec<Vec2> {
    let step = Vec2::from_angle(std::f32::consts::TAU / count.max(1) as f32);
    let mut impulse = base;
    let mut impulses = Vec::with_capacity(count as usize);
    for _ in 0..count {
        impulses.push(impulse);
        impulse = step.rotate(impulse);
    }
    impulses
}

/// Replace a scrap entity by a burst of allied tanks at its position
///
/// Returns the new allies; empty if the scrap is already gone.
pub fn spawn_ally_wave(session: &mut Session, scrap: EntityId) -> Vec<EntityId> {
    let Some(position) = session.position(scrap) else {
        return Vec::new();
    };
    session.kill(scrap);

    let reinforcements = session.config.reinforcements;
    let base = Vec2::new(reinforcements.impulse, 0.0);
    let mut allies = Vec::with_capacity(reinforcements.count as usize);
    for impulse in burst_impulses(base, reinforcements.count) {
        let ally = session.spawn(position, EntityKind::Tank, Team::Ally);
        if let Some(body) = session.body_mut(ally) {
            body.apply_world_impulse(impulse);
        }
        allies.push(ally);
    }

    log::debug!("{} allies out of scrap {}", allies.len(), scrap);
    session.events.push(GameEvent::ReinforcementsArrived {
        scrap,
        allies: allies.len() as u32,
    });
    allies
}
