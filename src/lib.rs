//! Friction Combat - text-driven combat resolution
//!
//! Free-text actions are scored for precision, rolled against a failure
//! chance, and may leave the actor immobilized. Incoming actions open timed
//! reaction windows that close exactly once.

pub mod combat;
pub mod core;
pub mod engine;
pub mod narration;
pub mod ports;
pub mod reaction;
pub mod timer;

pub use crate::core::config::EngineConfig;
pub use crate::core::error::{CombatError, Result};
pub use crate::engine::{ActorStatus, Attempt, CombatEngine, CounterOutcome};
