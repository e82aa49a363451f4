use std::sync::Arc;
use std::time::Duration;

use super::npc::NpcAutoResponder;
use crate::combat::immobilization::{ImmobilizationListener, ImmobilizationRecord};
use crate::ports::CharacterStore;

/// Lets NPCs exploit a player who just got immobilized
///
/// Every pending NPC counter-reaction aimed at the player is brought forward
/// to at most half the immobilization.
pub struct VulnerabilityNotifier {
    store: Arc<dyn CharacterStore>,
    responder: NpcAutoResponder,
}

impl VulnerabilityNotifier {
    pub fn new(store: Arc<dyn CharacterStore>, responder: NpcAutoResponder) -> Self {
        Self { store, responder }
    }
}

impl ImmobilizationListener for VulnerabilityNotifier {
    fn on_immobilized(&self, record: &ImmobilizationRecord, duration: Duration) {
        match self.store.profile(&record.actor) {
            Ok(profile) if profile.is_player() => {}
            Ok(_) => return,
            Err(e) => {
                tracing::warn!("Skipping vulnerability check for {}: {}", record.actor, e);
                return;
            }
        }

        let moved = self.responder.accelerate_targeting(&record.actor, duration / 2);
        if moved > 0 {
            tracing::info!(
                "{} NPC reaction(s) accelerated against immobilized {}",
                moved,
                record.actor
            );
        }
    }
}
