//! Rigid-body world backed by rapier2d
//!
//! The game only needs a thin layer over rapier:
//! - one ball collider per body, with the owner's key in the body's
//!   `user_data` and the collision type in the collider's
//! - team membership through [`InteractionGroups`]
//! - contact reports for registered pairs of collision types
//! - a lock counter so callers can refuse structural changes mid-iteration
//! - point queries through rapier's query pipeline

mod body;
mod query;

pub use body::{BodyDesc, BodyExt, BodyKey, moment_for_circle};
pub use query::{PointQueryInfo, QueryFilter};
pub use rapier2d::prelude::{Group, InteractionGroups, RigidBody, RigidBodyHandle as BodyHandle};

use std::fmt;
use std::marker::PhantomData;

use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

use body::to_vector;

/// Collision type used to select contact handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionType(pub u32);

/// Groups for a body that belongs to `bits` and touches everything else
pub fn exclusive_groups(bits: u32) -> InteractionGroups {
    InteractionGroups::new(
        Group::from_bits_truncate(bits),
        Group::from_bits_truncate(!bits),
    )
}

/// Global world parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Fraction of velocity retained after one second
    pub damping: f32,
    /// Coulomb friction coefficient for every contact
    pub friction: f32,
    /// Restitution for every contact (0 = perfectly inelastic)
    pub elasticity: f32,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            damping: 0.7,
            friction: 0.7,
            elasticity: 0.0,
        }
    }
}

impl WorldSettings {
    /// rapier damping coefficient giving the same per-second decay
    pub fn damping_rate(&self) -> f32 {
        -self.damping.max(f32::MIN_POSITIVE).ln()
    }
}

/// A contact reported to a registered handler
///
/// `a` always carries the first collision type of the handler pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact<K> {
    pub a: K,
    pub b: K,
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
}

/// rapier sets and pipelines plus the handler table
pub struct PhysicsWorld<K> {
    settings: WorldSettings,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    handlers: Vec<(CollisionType, CollisionType)>,
    lock_depth: u32,
    _key: PhantomData<K>,
}

impl<K> fmt::Debug for PhysicsWorld<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("settings", &self.settings)
            .field("bodies", &self.bodies.len())
            .field("handlers", &self.handlers)
            .field("lock_depth", &self.lock_depth)
            .finish()
    }
}

impl<K: BodyKey> PhysicsWorld<K> {
    pub fn new(settings: WorldSettings) -> Self {
        Self {
            settings,
            gravity: Vector::zeros(),
            integration_params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            handlers: Vec::new(),
            lock_depth: 0,
            _key: PhantomData,
        }
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    /// Number of live bodies
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Register a handler for an unordered pair of collision types
    pub fn add_collision_handler(&mut self, a: CollisionType, b: CollisionType) {
        if !self.handlers.contains(&(a, b)) {
            self.handlers.push((a, b));
        }
    }

    /// Enter a locked section (nested sections are counted)
    pub fn lock(&mut self) {
        self.lock_depth += 1;
    }

    pub fn unlock(&mut self) {
        debug_assert!(self.lock_depth > 0, "unbalanced physics world unlock");
        self.lock_depth = self.lock_depth.saturating_sub(1);
    }

    /// True while stepping or while a caller iterates bodies
    pub fn is_locked(&self) -> bool {
        self.lock_depth > 0
    }

    pub fn insert(&mut self, desc: BodyDesc<K>) -> BodyHandle {
        let rate = self.settings.damping_rate();
        let body = RigidBodyBuilder::dynamic()
            .translation(to_vector(desc.position))
            .linear_damping(rate)
            .angular_damping(rate)
            .can_sleep(false)
            .user_data(desc.key.to_user_data())
            .build();
        let handle = self.bodies.insert(body);

        let collider = ColliderBuilder::ball(desc.radius)
            .mass(desc.mass)
            .friction(self.settings.friction)
            .restitution(self.settings.elasticity)
            .collision_groups(desc.groups)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .user_data(u128::from(desc.collision_type.0))
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        if let Some(body) = self.bodies.get_mut(handle) {
            body.recompute_mass_properties_from_colliders(&self.colliders);
        }
        handle
    }

    /// Remove a body and its collider, returning its key
    ///
    /// Refused while the world is locked; stale handles return `None`.
    pub fn remove(&mut self, handle: BodyHandle) -> Option<K> {
        if self.is_locked() {
            log::warn!("refusing to remove body {:?} while the world is locked", handle);
            return None;
        }
        let body = self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        )?;
        Some(K::from_user_data(body.user_data))
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle)
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    pub fn key(&self, handle: BodyHandle) -> Option<K> {
        self.bodies
            .get(handle)
            .map(|body| K::from_user_data(body.user_data))
    }

    fn collider(&self, handle: BodyHandle) -> Option<&Collider> {
        let body = self.bodies.get(handle)?;
        self.colliders.get(*body.colliders().first()?)
    }

    pub fn radius(&self, handle: BodyHandle) -> Option<f32> {
        self.collider(handle)?
            .shape()
            .as_ball()
            .map(|ball| ball.radius)
    }

    /// Rotational inertia of the body's disc
    pub fn moment(&self, handle: BodyHandle) -> Option<f32> {
        let mass = self.bodies.get(handle)?.mass();
        Some(moment_for_circle(mass, self.radius(handle)?))
    }

    pub fn collision_type(&self, handle: BodyHandle) -> Option<CollisionType> {
        self.collider(handle)
            .map(|collider| CollisionType(collider.user_data as u32))
    }

    pub fn groups(&self, handle: BodyHandle) -> Option<InteractionGroups> {
        self.collider(handle)
            .map(|collider| collider.collision_groups())
    }

    /// Move a body to other groups and another collision type
    pub fn set_filter(
        &mut self,
        handle: BodyHandle,
        groups: InteractionGroups,
        collision_type: CollisionType,
    ) {
        let Some(&collider) = self
            .bodies
            .get(handle)
            .and_then(|body| body.colliders().first())
        else {
            return;
        };
        if let Some(collider) = self.colliders.get_mut(collider) {
            collider.set_collision_groups(groups);
            collider.user_data = u128::from(collision_type.0);
        }
    }

    /// Advance the world by `dt` seconds
    ///
    /// Returns the contacts that began this step and match a registered
    /// handler, ordered by key pair. User forces are cleared afterwards.
    pub fn step(&mut self, dt: f32) -> Vec<Contact<K>> {
        self.lock();
        self.integration_params.dt = dt;

        let (collision_send, collision_recv) =
            rapier2d::crossbeam::channel::unbounded::<CollisionEvent>();
        let (force_send, _force_recv) =
            rapier2d::crossbeam::channel::unbounded::<ContactForceEvent>();
        let events = ChannelEventCollector::new(collision_send, force_send);

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &events,
        );

        for (_, body) in self.bodies.iter_mut() {
            body.reset_forces(false);
            body.reset_torques(false);
        }

        let mut contacts = Vec::new();
        while let Ok(event) = collision_recv.try_recv() {
            if let CollisionEvent::Started(c1, c2, _) = event {
                if let Some(contact) = self.report(c1, c2) {
                    contacts.push(contact);
                }
            }
        }
        contacts.sort_by_key(|c| (c.a, c.b));

        self.unlock();
        contacts
    }

    fn report(&self, c1: ColliderHandle, c2: ColliderHandle) -> Option<Contact<K>> {
        let side = |handle: ColliderHandle| {
            let collider = self.colliders.get(handle)?;
            let body = collider.parent()?;
            let key = self.key(body)?;
            Some((body, key, CollisionType(collider.user_data as u32)))
        };
        let (body_1, key_1, type_1) = side(c1)?;
        let (body_2, key_2, type_2) = side(c2)?;

        if self.handlers.contains(&(type_1, type_2)) {
            Some(Contact {
                a: key_1,
                b: key_2,
                body_a: body_1,
                body_b: body_2,
            })
        } else if self.handlers.contains(&(type_2, type_1)) {
            Some(Contact {
                a: key_2,
                b: key_1,
                body_a: body_2,
                body_b: body_1,
            })
        } else {
            None
        }
    }
}
