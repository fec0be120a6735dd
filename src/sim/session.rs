//! Game session state
//!
//! The session owns the physics world, the entity side-table, the deferred
//! queue and the clock. Spawning and killing always go through here so the
//! side-table and the world never disagree about which entities exist.

use glam::Vec2;

use super::collision::{self, ScrapHitCounter};
use super::combat;
use super::deferred::{DeferredAction, DeferredQueue};
use super::entity::{Control, Entity, EntityId, EntityKind, EntityStore, Team};
use super::waves::WaveSpawner;
use crate::config::GameConfig;
use crate::error::ConfigError;
use crate::physics::{BodyDesc, BodyExt, PhysicsWorld, RigidBody};

/// Session timing and end-of-game latch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionClock {
    /// Simulated time since the last start (ms)
    pub elapsed_ms: u32,
    /// Whether a round has been started
    pub started: bool,
    /// Elapsed time at which the game ended, latched once
    pub game_over_at_ms: Option<u32>,
}

impl SessionClock {
    #[inline]
    pub fn is_over(&self) -> bool {
        self.game_over_at_ms.is_some()
    }

    /// Started and not yet over
    #[inline]
    pub fn is_running(&self) -> bool {
        self.started && !self.is_over()
    }

    /// Latch game over at the current time; returns false if already latched
    pub fn latch_game_over(&mut self) -> bool {
        if self.is_over() {
            return false;
        }
        self.game_over_at_ms = Some(self.elapsed_ms);
        true
    }

    pub fn advance(&mut self, ms: u32) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(ms);
    }

    /// Survival time shown in the HUD: frozen once the game is over
    pub fn survival_ms(&self) -> u32 {
        self.game_over_at_ms.unwrap_or(self.elapsed_ms)
    }

    fn restart(&mut self) {
        *self = SessionClock {
            started: true,
            ..SessionClock::default()
        };
    }
}

/// Format milliseconds as `MM:SS`
pub fn format_mm_ss(ms: u32) -> String {
    let secs = ms / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Notable things that happened, drained by the driver for logging
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Started,
    WaveSpawned { wave: u32, enemies: u32 },
    GameOver { survived_ms: u32 },
    EnemyScrapped(EntityId),
    AllyExpired(EntityId),
    ReinforcementsArrived { scrap: EntityId, allies: u32 },
    ShotFired { shooter: EntityId, bullet: EntityId },
}

/// One running game
#[derive(Debug)]
pub struct Session {
    pub(crate) config: GameConfig,
    pub(crate) world: PhysicsWorld<EntityId>,
    pub(crate) entities: EntityStore,
    pub(crate) player: EntityId,
    pub(crate) deferred: DeferredQueue,
    pub(crate) clock: SessionClock,
    pub(crate) waves: WaveSpawner,
    pub(crate) scrap_hits: ScrapHitCounter,
    pub(crate) events: Vec<GameEvent>,
}

impl Session {
    /// Build the world, register the collision reactions and spawn the player
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut world = PhysicsWorld::new(config.world);
        world.add_collision_handler(Team::Player.collision_type(), Team::Enemy.collision_type());
        world.add_collision_handler(Team::Neutral.collision_type(), Team::Scrap.collision_type());

        let mut session = Self {
            waves: WaveSpawner::new(),
            config,
            world,
            entities: EntityStore::new(),
            player: EntityId(0),
            deferred: DeferredQueue::new(),
            clock: SessionClock::default(),
            scrap_hits: ScrapHitCounter::default(),
            events: Vec::new(),
        };
        session.player = session.spawn(Vec2::ZERO, EntityKind::Tank, Team::Player);
        log::debug!("Session created, player is {}", session.player);
        Ok(session)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn world(&self) -> &PhysicsWorld<EntityId> {
        &self.world
    }

    pub fn deferred(&self) -> &DeferredQueue {
        &self.deferred
    }

    pub fn waves(&self) -> &WaveSpawner {
        &self.waves
    }

    pub fn player(&self) -> EntityId {
        self.player
    }

    pub fn player_entity(&self) -> Option<&Entity> {
        self.entities.get(self.player)
    }

    pub fn player_entity_mut(&mut self) -> Option<&mut Entity> {
        self.entities.get_mut(self.player)
    }

    pub fn player_body(&self) -> Option<&RigidBody> {
        self.body(self.player)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn body(&self, id: EntityId) -> Option<&RigidBody> {
        let entity = self.entities.get(id)?;
        self.world.get(entity.body)
    }

    pub fn body_mut(&mut self, id: EntityId) -> Option<&mut RigidBody> {
        let entity = self.entities.get(id)?;
        self.world.get_mut(entity.body)
    }

    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        self.body(id).map(|body| body.center())
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn team_count(&self, team: Team) -> usize {
        self.entities.count_team(team)
    }

    /// Ids of live entities in ascending order
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.ids()
    }

    /// Create a body and its record at `position`
    pub fn spawn(&mut self, position: Vec2, kind: EntityKind, team: Team) -> EntityId {
        let id = self.entities.allocate_id();
        let spec = self.config.bodies.lookup(kind, team);
        let body = self.world.insert(BodyDesc {
            key: id,
            position,
            radius: spec.radius,
            mass: spec.mass,
            groups: team.groups(),
            collision_type: team.collision_type(),
        });
        let timer = if kind == EntityKind::Tank {
            self.config.lifespan(team)
        } else {
            0
        };
        self.entities.insert(id, Entity::new(kind, team, body, timer));
        log::trace!("spawn {id} {kind:?}/{team:?} at ({:.1}, {:.1})", position.x, position.y);
        id
    }

    /// Remove an entity and its body
    ///
    /// While the world is locked the removal is queued instead. Killing an
    /// id that is already gone does nothing, and the player is never removed.
    pub fn kill(&mut self, id: EntityId) {
        if id == self.player {
            log::warn!("ignoring request to kill the player");
            return;
        }
        if self.world.is_locked() {
            self.deferred.push(DeferredAction::Kill(id));
            return;
        }
        let Some(entity) = self.entities.remove(id) else {
            return;
        };
        self.world.remove(entity.body);
        log::trace!("kill {id}");
    }

    /// Queue an action for after the current step
    pub fn defer(&mut self, action: DeferredAction) {
        self.deferred.push(action);
    }

    /// Visit every live entity with its body, in id order
    pub fn for_each(&self, mut visitor: impl FnMut(EntityId, &Entity, &RigidBody)) {
        for (id, entity) in self.entities.iter() {
            if let Some(body) = self.world.get(entity.body) {
                visitor(id, entity, body);
            }
        }
    }

    /// Turn a live tank into scrap
    pub fn scrap(&mut self, id: EntityId) {
        if let Some(entity) = self.entities.get_mut(id) {
            entity.become_scrap(&mut self.world);
        }
    }

    pub fn kill_all_except_player(&mut self) {
        for id in self.entities.ids() {
            if id != self.player {
                self.kill(id);
            }
        }
    }

    /// Begin a fresh round
    ///
    /// Clears the field, puts the player back at the origin, resets the
    /// clock and the wave schedule and spawns the configured roster.
    pub fn start(&mut self) {
        self.kill_all_except_player();

        let player = self.player;
        if let Some(body) = self.body_mut(player) {
            body.set_center(Vec2::ZERO);
            body.set_linear_velocity(Vec2::ZERO);
            body.set_angle(0.0);
            body.set_angular_velocity(0.0);
        }
        if let Some(entity) = self.entities.get_mut(player) {
            entity.controls.clear();
            entity.shoot_timer_ms = 0;
        }

        self.clock.restart();
        self.waves = WaveSpawner::new();

        let roster = self.config.roster.clone();
        for entry in roster {
            self.spawn(entry.position, EntityKind::Tank, entry.team);
        }

        log::info!("Round started with {} entities", self.entities.len());
        self.events.push(GameEvent::Started);
    }

    /// Set or clear one of the player's controls
    pub fn set_player_control(&mut self, control: Control, active: bool) {
        if let Some(entity) = self.entities.get_mut(self.player) {
            entity.controls.set(control, active);
        }
    }

    /// Execute every queued action in enqueue order
    ///
    /// Actions queued while draining run in the same pass.
    pub fn drain_deferred(&mut self) {
        debug_assert!(!self.world.is_locked(), "draining while the world is locked");
        while let Some(action) = self.deferred.pop() {
            match action {
                DeferredAction::Kill(id) => self.kill(id),
                DeferredAction::Fire(id) => {
                    combat::fire(self, id);
                }
                DeferredAction::SpawnAllyWave(id) => {
                    collision::spawn_ally_wave(self, id);
                }
            }
        }
    }

    /// Take the events recorded since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
