//! Entity records and the side-table that maps entity ids to them
//!
//! Physical state lives in the physics world; each body carries only an
//! [`EntityId`] key, and the record here carries the gameplay metadata.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::physics::{
    BodyHandle, BodyKey, CollisionType, InteractionGroups, PhysicsWorld, exclusive_groups,
};

/// What an entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Tank,
    Bullet,
    Scrap,
}

/// Collision and behavior partition
///
/// Each team is one collision category; shapes never touch their own team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Neutral,
    Player,
    Ally,
    Enemy,
    Scrap,
}

impl Team {
    pub const ALL: [Team; 5] = [
        Team::Neutral,
        Team::Player,
        Team::Ally,
        Team::Enemy,
        Team::Scrap,
    ];

    /// Category bit of this team
    pub const fn bit(self) -> u32 {
        match self {
            Team::Neutral => 1,
            Team::Player => 2,
            Team::Ally => 4,
            Team::Enemy => 8,
            Team::Scrap => 16,
        }
    }

    /// Member of its own group, touching every other
    pub fn groups(self) -> InteractionGroups {
        exclusive_groups(self.bit())
    }

    pub const fn collision_type(self) -> CollisionType {
        CollisionType(self.bit())
    }

    pub fn from_collision_type(collision_type: CollisionType) -> Option<Team> {
        Team::ALL
            .into_iter()
            .find(|team| team.collision_type() == collision_type)
    }
}

/// A single control input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Control {
    Forward,
    Reverse,
    TurnLeft,
    TurnRight,
    Shoot,
    /// Handbrake (extended variant)
    Grip,
}

impl Control {
    const fn bit(self) -> u8 {
        match self {
            Control::Forward => 1,
            Control::Reverse => 2,
            Control::TurnLeft => 4,
            Control::TurnRight => 8,
            Control::Shoot => 16,
            Control::Grip => 32,
        }
    }
}

/// Set of active controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ControlFlags(u8);

impl ControlFlags {
    pub const NONE: ControlFlags = ControlFlags(0);

    pub const fn only(control: Control) -> Self {
        ControlFlags(control.bit())
    }

    #[inline]
    pub const fn contains(self, control: Control) -> bool {
        self.0 & control.bit() != 0
    }

    #[inline]
    pub fn insert(&mut self, control: Control) {
        self.0 |= control.bit();
    }

    #[inline]
    pub fn remove(&mut self, control: Control) {
        self.0 &= !control.bit();
    }

    pub fn set(&mut self, control: Control, active: bool) {
        if active {
            self.insert(control);
        } else {
            self.remove(control);
        }
    }

    pub fn with(mut self, control: Control) -> Self {
        self.insert(control);
        self
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<Control> for ControlFlags {
    fn from_iter<I: IntoIterator<Item = Control>>(iter: I) -> Self {
        iter.into_iter().fold(ControlFlags::NONE, ControlFlags::with)
    }
}

/// Stable entity identifier, the key stored on physics bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl BodyKey for EntityId {
    fn to_user_data(self) -> u128 {
        u128::from(self.0)
    }

    fn from_user_data(data: u128) -> Self {
        EntityId(data as u32)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Gameplay metadata of one live body
#[derive(Debug, Clone)]
pub struct Entity {
    pub kind: EntityKind,
    pub team: Team,
    pub controls: ControlFlags,
    /// Countdown to the next shot (ms)
    pub shoot_timer_ms: i32,
    /// Countdown to the team lifecycle transition (ms, 0 = never)
    pub scrap_timer_ms: i32,
    pub body: BodyHandle,
}

impl Entity {
    pub fn new(kind: EntityKind, team: Team, body: BodyHandle, scrap_timer_ms: i32) -> Self {
        Self {
            kind,
            team,
            controls: ControlFlags::NONE,
            shoot_timer_ms: 0,
            scrap_timer_ms,
            body,
        }
    }

    #[inline]
    pub fn is_tank(&self) -> bool {
        self.kind == EntityKind::Tank
    }

    /// Turn this entity into scrap and refilter its body in one go
    pub fn become_scrap(&mut self, world: &mut PhysicsWorld<EntityId>) {
        self.kind = EntityKind::Scrap;
        self.team = Team::Scrap;
        self.controls.clear();
        world.set_filter(
            self.body,
            Team::Scrap.groups(),
            Team::Scrap.collision_type(),
        );
    }
}

/// Side-table of live entities, iterated in id order
#[derive(Debug, Default)]
pub struct EntityStore {
    entries: BTreeMap<EntityId, Entity>,
    next_id: u32,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id that has never been handed out before
    pub fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, id: EntityId, entity: Entity) {
        self.entries.insert(id, entity);
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entries.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entries.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of live ids, safe to hold while mutating the store
    pub fn ids(&self) -> Vec<EntityId> {
        self.entries.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entries.iter().map(|(id, e)| (*id, e))
    }

    /// Count of live entities on a team
    pub fn count_team(&self, team: Team) -> usize {
        self.entries.values().filter(|e| e.team == team).count()
    }
}
