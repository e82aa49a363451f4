//! In-memory collaborators for tests and the demo binary

use std::sync::Mutex;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use super::{ActorProfile, CharacterStore, NotificationChannel};
use crate::combat::severity::BonusEffects;
use crate::core::error::CollaboratorError;
use crate::core::sync::lock;
use crate::core::types::{ActorId, RoomId};

const DEFAULT_HEALTH: f64 = 100.0;
const DEFAULT_ENERGY: f64 = 100.0;
/// Energy spent by a plain action before the bonus multiplier
const BASE_ACTION_ENERGY: f64 = 5.0;

/// Mutable part of a character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSheet {
    pub profile: ActorProfile,
    pub health: f64,
    pub energy: f64,
    pub reputation: i32,
    pub bonuses_applied: u32,
}

impl CharacterSheet {
    pub fn new(profile: ActorProfile) -> Self {
        Self {
            profile,
            health: DEFAULT_HEALTH,
            energy: DEFAULT_ENERGY,
            reputation: 0,
            bonuses_applied: 0,
        }
    }

    pub fn is_down(&self) -> bool {
        self.health <= 0.0
    }
}

#[derive(Default)]
pub struct InMemoryCharacterStore {
    sheets: Mutex<AHashMap<ActorId, CharacterSheet>>,
}

impl InMemoryCharacterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: ActorProfile) {
        let id = profile.id.clone();
        lock(&self.sheets).insert(id, CharacterSheet::new(profile));
    }

    pub fn with_actors(profiles: impl IntoIterator<Item = ActorProfile>) -> Self {
        let store = Self::new();
        for profile in profiles {
            store.insert(profile);
        }
        store
    }

    pub fn sheet(&self, actor: &ActorId) -> Option<CharacterSheet> {
        lock(&self.sheets).get(actor).cloned()
    }

    pub fn health(&self, actor: &ActorId) -> Option<f64> {
        self.sheet(actor).map(|sheet| sheet.health)
    }

    fn update<T>(
        &self,
        actor: &ActorId,
        f: impl FnOnce(&mut CharacterSheet) -> T,
    ) -> Result<T, CollaboratorError> {
        lock(&self.sheets)
            .get_mut(actor)
            .map(f)
            .ok_or_else(|| CollaboratorError::UnknownActor(actor.clone()))
    }
}

impl CharacterStore for InMemoryCharacterStore {
    fn profile(&self, actor: &ActorId) -> Result<ActorProfile, CollaboratorError> {
        lock(&self.sheets)
            .get(actor)
            .map(|sheet| sheet.profile.clone())
            .ok_or_else(|| CollaboratorError::UnknownActor(actor.clone()))
    }

    fn apply_damage(&self, actor: &ActorId, amount: f64) -> Result<(), CollaboratorError> {
        self.update(actor, |sheet| {
            sheet.health = (sheet.health - amount.max(0.0)).max(0.0);
        })
    }

    fn apply_bonus(&self, actor: &ActorId, bonus: &BonusEffects) -> Result<(), CollaboratorError> {
        self.update(actor, |sheet| {
            sheet.energy = (sheet.energy - BASE_ACTION_ENERGY * bonus.energy_cost_multiplier).max(0.0);
            sheet.reputation += bonus.reputation_delta;
            sheet.bonuses_applied += 1;
        })
    }
}

/// A message addressed to a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub room: RoomId,
    pub text: String,
}

/// Keeps every message for later inspection
#[derive(Default)]
pub struct RecordingChannel {
    messages: Mutex<Vec<Notification>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Notification> {
        lock(&self.messages).clone()
    }

    pub fn texts(&self) -> Vec<String> {
        lock(&self.messages).iter().map(|m| m.text.clone()).collect()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        lock(&self.messages)
            .iter()
            .filter(|m| m.text.contains(needle))
            .count()
    }

    pub fn clear(&self) {
        lock(&self.messages).clear();
    }
}

impl NotificationChannel for RecordingChannel {
    fn send(&self, room: &RoomId, text: &str) -> Result<(), CollaboratorError> {
        lock(&self.messages).push(Notification {
            room: room.clone(),
            text: text.to_string(),
        });
        Ok(())
    }
}

/// Pushes messages into a tokio channel
pub struct ForwardingChannel {
    sender: UnboundedSender<Notification>,
}

impl ForwardingChannel {
    pub fn new(sender: UnboundedSender<Notification>) -> Self {
        Self { sender }
    }
}

impl NotificationChannel for ForwardingChannel {
    fn send(&self, room: &RoomId, text: &str) -> Result<(), CollaboratorError> {
        self.sender
            .send(Notification {
                room: room.clone(),
                text: text.to_string(),
            })
            .map_err(|_| CollaboratorError::ChannelClosed)
    }
}

/// Only logs
pub struct TracingChannel;

impl NotificationChannel for TracingChannel {
    fn send(&self, room: &RoomId, text: &str) -> Result<(), CollaboratorError> {
        tracing::info!(room = %room, "{}", text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::precision::PrecisionLevel;
    use crate::core::types::{ActorKind, Rank};

    fn store() -> InMemoryCharacterStore {
        InMemoryCharacterStore::with_actors([ActorProfile::new(
            "p1",
            "Aria",
            ActorKind::Player,
            Rank::C,
        )])
    }

    #[test]
    fn test_damage_floors_at_zero() {
        let store = store();
        let id = ActorId::from("p1");
        store.apply_damage(&id, 30.0).unwrap();
        assert_eq!(store.health(&id), Some(70.0));
        store.apply_damage(&id, 500.0).unwrap();
        assert!(store.sheet(&id).unwrap().is_down());
    }

    #[test]
    fn test_unknown_actor_is_reported() {
        let store = store();
        let ghost = ActorId::from("ghost");
        assert_eq!(
            store.apply_damage(&ghost, 1.0),
            Err(CollaboratorError::UnknownActor(ghost.clone()))
        );
        assert!(store.profile(&ghost).is_err());
    }

    #[test]
    fn test_bonus_moves_reputation_and_energy() {
        let store = store();
        let id = ActorId::from("p1");
        store
            .apply_bonus(&id, &BonusEffects::for_level(PrecisionLevel::VeryHigh))
            .unwrap();
        let sheet = store.sheet(&id).unwrap();
        assert_eq!(sheet.reputation, 2);
        assert_eq!(sheet.energy, 96.0);
        assert_eq!(sheet.bonuses_applied, 1);
    }

    #[test]
    fn test_forwarding_channel_reports_closed_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let channel = ForwardingChannel::new(tx);
        let room = RoomId::new("arene");
        assert!(channel.send(&room, "bonjour").is_ok());
        drop(rx);
        assert_eq!(channel.send(&room, "encore"), Err(CollaboratorError::ChannelClosed));
    }
}
