//! Seams to the rest of the game
//!
//! The combat core never owns characters or rooms. It reads ranks from a
//! [`CharacterStore`], writes damage and bonuses back through it, and pushes
//! text to a [`NotificationChannel`]. All three traits are synchronous: timer
//! callbacks call them directly and swallow their errors.

pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::combat::counter::CounterReport;
use crate::combat::resolution::Outcome;
use crate::combat::severity::BonusEffects;
use crate::core::error::CollaboratorError;
use crate::core::types::{ActorId, ActorKind, Rank, RoomId};
use crate::reaction::NpcReaction;

pub use memory::{
    CharacterSheet, ForwardingChannel, InMemoryCharacterStore, Notification, RecordingChannel,
    TracingChannel,
};

/// What the combat core needs to know about an actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorProfile {
    pub id: ActorId,
    pub name: String,
    pub kind: ActorKind,
    pub rank: Rank,
}

impl ActorProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ActorKind, rank: Rank) -> Self {
        Self {
            id: ActorId::new(id),
            name: name.into(),
            kind,
            rank,
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == ActorKind::Player
    }
}

pub trait CharacterStore: Send + Sync {
    fn profile(&self, actor: &ActorId) -> Result<ActorProfile, CollaboratorError>;

    fn rank(&self, actor: &ActorId) -> Result<Rank, CollaboratorError> {
        self.profile(actor).map(|profile| profile.rank)
    }

    fn apply_damage(&self, actor: &ActorId, amount: f64) -> Result<(), CollaboratorError>;

    fn apply_bonus(&self, actor: &ActorId, bonus: &BonusEffects) -> Result<(), CollaboratorError>;
}

/// Fire-and-forget delivery of chat text
pub trait NotificationChannel: Send + Sync {
    fn send(&self, room: &RoomId, text: &str) -> Result<(), CollaboratorError>;
}

/// Turns resolved events into player-facing text
pub trait Narrator: Send + Sync {
    /// Text for a resolved action attempt
    fn narrate(&self, actor: &ActorProfile, action: &str, outcome: &Outcome) -> String;

    fn countdown(&self, subject: &ActorProfile, description: &str, window: Duration) -> String;

    fn reminder(&self, subject: &ActorProfile, remaining: Duration) -> String;

    /// `immobilized_for` is how long the subject now stays down
    fn timeout(&self, subject: &ActorProfile, damage: f64, immobilized_for: Duration) -> String;

    fn npc_reaction(&self, npc: &ActorProfile, reaction: &NpcReaction) -> String;

    fn counter(&self, defender: &ActorProfile, report: &CounterReport, damage: f64) -> String;
}

/// The collaborators shared by every component
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn CharacterStore>,
    pub channel: Arc<dyn NotificationChannel>,
    pub narrator: Arc<dyn Narrator>,
}

impl Collaborators {
    pub fn new(
        store: Arc<dyn CharacterStore>,
        channel: Arc<dyn NotificationChannel>,
        narrator: Arc<dyn Narrator>,
    ) -> Self {
        Self {
            store,
            channel,
            narrator,
        }
    }

    /// Send a message, logging instead of failing
    pub fn notify(&self, room: &RoomId, text: &str) {
        if let Err(e) = self.channel.send(room, text) {
            tracing::warn!("Dropped notification for room {}: {}", room, e);
        }
    }

    /// Apply damage, logging instead of failing
    pub fn damage(&self, actor: &ActorId, amount: f64) {
        if amount <= 0.0 {
            return;
        }
        if let Err(e) = self.store.apply_damage(actor, amount) {
            tracing::warn!("Could not apply {:.1} damage to {}: {}", amount, actor, e);
        }
    }
}
