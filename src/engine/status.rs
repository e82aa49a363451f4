use serde::{Deserialize, Serialize};

use crate::combat::severity::FailureSeverity;
use crate::core::types::{ActionId, ActorId};

/// Point-in-time view of an actor's combat state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorStatus {
    pub actor: ActorId,
    pub immobilized: bool,
    pub remaining_ms: u64,
    pub severity: Option<FailureSeverity>,
    /// Action that caused the immobilization
    pub cause: Option<String>,
    pub consecutive_failures: u32,
    pub failure_penalty: f64,
    /// Open reaction window the actor has to answer
    pub pending_reaction: Option<ActionId>,
}

impl ActorStatus {
    pub fn in_reaction_window(&self) -> bool {
        self.pending_reaction.is_some()
    }
}
