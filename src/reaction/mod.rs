//! Timed reaction windows
//!
//! When an action targets a defender, the defender gets a rank-dependent
//! window to answer. The window closes exactly once: the defender responds,
//! the deadline passes, a simulated defender reacts on its own, or the
//! caller cancels it.

pub mod npc;
pub mod reminders;
pub mod scheduler;
pub mod timer;
pub mod vulnerability;

pub use npc::{NpcAutoResponder, NpcReaction};
pub use scheduler::{ReactionRequest, ReactionScheduler, Response};
pub use timer::{ReactionStatus, ReactionTimer};
pub use vulnerability::VulnerabilityNotifier;
