//! Timed enemy waves
//!
//! Every wave interval a fan of enemies appears ahead of the player. The fan
//! grows by one tank every few waves.

use glam::Vec2;

use super::entity::{EntityKind, Team};
use super::session::{GameEvent, Session};
use crate::physics::BodyExt;

/// Wave schedule of the current round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaveSpawner {
    /// Waves spawned so far this round
    pub wave_count: u32,
    /// Elapsed time after which the next wave is due (ms)
    pub next_wave_at_ms: u32,
}

impl WaveSpawner {
    /// Fresh schedule: the first wave is due as soon as the clock has moved
    pub fn new() -> Self {
        Self::default()
    }

    /// Due once the clock has moved strictly past the scheduled time
    #[inline]
    pub fn is_due(&self, elapsed_ms: u32) -> bool {
        elapsed_ms > self.next_wave_at_ms
    }

    /// Count the wave and schedule the next one; returns the new wave number
    pub fn advance(&mut self, interval_ms: u32) -> u32 {
        self.wave_count += 1;
        self.next_wave_at_ms = self.next_wave_at_ms.saturating_add(interval_ms);
        self.wave_count
    }
}

/// Enemies in wave `wave`
#[inline]
pub fn wave_size(wave: u32, waves_per_extra_enemy: u32) -> u32 {
    wave / waves_per_extra_enemy.max(1) + 1
}

/// Spawn points: `count` points at `distance` from `origin`, the first along
/// `facing` and each next one rotated by `step` radians
pub fn fan_positions(origin: Vec2, facing: Vec2, count: u32, distance: f32, step: f32) -> Vec<Vec2> {
    let turn = Vec2::from_angle(step);
    let mut offset = facing.normalize_or(Vec2::Y) * distance;
    let mut points = Vec::with_capacity(count as usize);
    for _ in 0..count {
        points.push(origin + offset);
        offset = turn.rotate(offset);
    }
    points
}

/// Spawn the next wave if it is due
///
/// Waves only run while a round is in progress. Returns the number of
/// enemies spawned.
pub fn spawn_due_wave(session: &mut Session) -> Option<u32> {
    let config = session.config.waves?;
    if !session.clock.is_running() || !session.waves.is_due(session.clock.elapsed_ms) {
        return None;
    }

    let (origin, facing) = {
        let body = session.player_body()?;
        (body.center(), body.forward())
    };

    let wave = session.waves.advance(config.interval_ms);
    let count = wave_size(wave, config.waves_per_extra_enemy);
    for position in fan_positions(origin, facing, count, config.fan_distance, config.fan_step) {
        session.spawn(position, EntityKind::Tank, Team::Enemy);
    }

    log::info!("Wave {wave}: {count} enemies");
    session.events.push(GameEvent::WaveSpawned {
        wave,
        enemies: count,
    });
    Some(count)
}
