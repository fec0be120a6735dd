//! Deterministic simulation module
//!
//! All gameplay logic lives here:
//! - Fixed timestep only
//! - Stable iteration order (by entity id)
//! - Structural changes during a step go through the deferred queue
//! - No rendering or platform dependencies

pub mod ai;
pub mod collision;
pub mod combat;
pub mod deferred;
pub mod entity;
pub mod session;
pub mod tick;
pub mod waves;

pub use collision::{ScrapHitCounter, spawn_ally_wave};
pub use combat::{fire, launch_impulses};
pub use deferred::{DeferredAction, DeferredQueue};
pub use entity::{Control, ControlFlags, Entity, EntityId, EntityKind, EntityStore, Team};
pub use session::{GameEvent, Session, SessionClock, format_mm_ss};
pub use tick::{run_ticks, tick};
pub use waves::{WaveSpawner, wave_size};
