//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time comes in from the caller as milliseconds, never from a real clock
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering, storage, or platform dependencies

pub mod clock;
pub mod entity;
pub mod scheduler;
pub mod score;
pub mod session;
pub mod spawn;

pub use clock::{ClockState, ClockTick, RoundClock};
pub use entity::{Basket, CollisionPolicy, FallingItem, ItemCategory, Rect, ScoringRule};
pub use scheduler::{Fired, Scheduler, TimerId};
pub use score::ScoreTracker;
pub use session::{
    Difficulty, EndReason, EndSummary, FrameInput, Session, SessionAction, SessionError,
    SessionEvent, SessionPhase, SessionTask,
};
pub use spawn::{Archetype, SpawnBatch, SpawnCatalog, Spawner};
