//! Counter-reactions of simulated defenders
//!
//! A non-player defender does not type. Instead it reacts on its own at a
//! random point inside its window, claims the window before the deadline can,
//! and hits back at whoever attacked it.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::timer::{ReactionStatus, ReactionTimer};
use crate::combat::constants::{npc_base_damage, npc_lethal_chance};
use crate::core::config::NpcConfig;
use crate::core::dice::{Dice, SharedDice};
use crate::core::sync::lock;
use crate::core::types::{ActionId, ActorId};
use crate::ports::Collaborators;
use crate::timer::{TimerHandle, TimerScheduler};

const REACTION_LABELS: &[&str] = &[
    "esquive et contre-attaque",
    "parade suivie d'une riposte",
    "blocage puis frappe au flanc",
    "feinte et coup bas",
    "pas de côté et coup de coude",
];

/// What a simulated defender did with its window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcReaction {
    pub action_id: ActionId,
    pub npc: ActorId,
    /// Actor hit by the counter-reaction
    pub target: Option<ActorId>,
    pub label: String,
    /// Percent, 0..=100
    pub effectiveness: u32,
    pub damage: f64,
    pub lethal: bool,
}

/// Schedules and runs NPC counter-reactions
#[derive(Clone)]
pub struct NpcAutoResponder {
    inner: Arc<ResponderInner>,
}

struct ResponderInner {
    config: NpcConfig,
    scheduler: TimerScheduler,
    dice: SharedDice,
    collaborators: Collaborators,
    schedules: Mutex<AHashMap<ActionId, NpcSchedule>>,
}

struct NpcSchedule {
    target: Option<ActorId>,
    reaction: Weak<ReactionTimer>,
    handle: TimerHandle,
}

impl NpcAutoResponder {
    pub fn new(
        config: NpcConfig,
        scheduler: TimerScheduler,
        dice: SharedDice,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            inner: Arc::new(ResponderInner {
                config,
                scheduler,
                dice,
                collaborators,
                schedules: Mutex::new(AHashMap::new()),
            }),
        }
    }

    /// Arm the counter-reaction for a window whose subject is an NPC
    ///
    /// Returns the delay that was drawn.
    pub fn schedule(&self, reaction: &Arc<ReactionTimer>) -> Duration {
        let inner = &self.inner;
        let window = reaction.window();
        let fraction = lock(&inner.dice).between(
            inner.config.min_delay_fraction,
            inner.config.max_delay_fraction,
        );
        let delay = window.mul_f64(fraction.clamp(0.0, 1.0));

        let responder = Arc::downgrade(&self.inner);
        let weak_reaction = Arc::downgrade(reaction);
        let handle = inner.scheduler.schedule(delay, move || {
            let (Some(responder), Some(reaction)) = (responder.upgrade(), weak_reaction.upgrade())
            else {
                return;
            };
            responder.fire(&reaction);
        });

        lock(&inner.schedules).insert(
            reaction.action_id,
            NpcSchedule {
                target: reaction.attacker.clone(),
                reaction: Arc::downgrade(reaction),
                handle,
            },
        );
        tracing::debug!(
            "{} will react to {} in {:?}",
            reaction.subject.id,
            reaction.action_id,
            delay
        );
        delay
    }

    /// Drop the schedule of a window that was resolved some other way
    pub fn forget(&self, action_id: &ActionId) -> bool {
        match lock(&self.inner.schedules).remove(action_id) {
            Some(schedule) => schedule.handle.cancel(),
            None => false,
        }
    }

    /// When the NPC reaction for an action is due
    pub fn fire_at(&self, action_id: &ActionId) -> Option<Instant> {
        lock(&self.inner.schedules)
            .get(action_id)
            .filter(|schedule| schedule.handle.is_pending())
            .map(|schedule| schedule.handle.fire_at())
    }

    /// Bring forward every pending reaction aimed at `actor`
    ///
    /// Each matching timer fires at most `cap` from now. Returns how many
    /// timers were moved.
    pub fn accelerate_targeting(&self, actor: &ActorId, cap: Duration) -> usize {
        let mut moved = 0;
        let mut schedules = lock(&self.inner.schedules);
        for (action_id, schedule) in schedules.iter_mut() {
            if schedule.target.as_ref() != Some(actor) || !schedule.handle.is_pending() {
                continue;
            }
            let waiting = schedule
                .reaction
                .upgrade()
                .map(|reaction| reaction.is_waiting())
                .unwrap_or(false);
            if !waiting {
                continue;
            }
            let remaining = schedule.handle.remaining();
            if cap < remaining && schedule.handle.reschedule(cap) {
                tracing::info!(
                    "{} is vulnerable, NPC reaction to {} moved up from {:?} to {:?}",
                    actor,
                    action_id,
                    remaining,
                    cap
                );
                moved += 1;
            }
        }
        moved
    }

    pub fn pending(&self) -> usize {
        lock(&self.inner.schedules)
            .values()
            .filter(|schedule| schedule.handle.is_pending())
            .count()
    }
}

impl ResponderInner {
    fn fire(&self, reaction: &ReactionTimer) {
        lock(&self.schedules).remove(&reaction.action_id);

        if !reaction.resolve(ReactionStatus::NpcPreempted) {
            tracing::debug!(
                "NPC reaction to {} arrived after the window closed",
                reaction.action_id
            );
            return;
        }

        let npc = &reaction.subject;
        let outcome = self.roll_reaction(reaction);
        tracing::info!(
            "{} pre-empted {} with '{}' ({}%, {:.1} damage{})",
            npc.id,
            reaction.action_id,
            outcome.label,
            outcome.effectiveness,
            outcome.damage,
            if outcome.lethal { ", lethal" } else { "" }
        );

        if let Some(target) = &outcome.target {
            self.collaborators.damage(target, outcome.damage);
        }
        let text = self.collaborators.narrator.npc_reaction(npc, &outcome);
        self.collaborators.notify(&reaction.room, &text);
    }

    fn roll_reaction(&self, reaction: &ReactionTimer) -> NpcReaction {
        let rank = reaction.subject.rank;
        let mut dice = lock(&self.dice);
        let label = REACTION_LABELS[dice.pick(REACTION_LABELS.len())];
        let effectiveness = dice
            .between(
                self.config.min_effectiveness as f64,
                self.config.max_effectiveness as f64 + 1.0,
            )
            .floor()
            .min(self.config.max_effectiveness as f64) as u32;
        let lethal = dice.unit() < npc_lethal_chance(rank);
        drop(dice);

        let damage = (npc_base_damage(rank) * effectiveness as f64 / 100.0 * 10.0).round() / 10.0;
        NpcReaction {
            action_id: reaction.action_id,
            npc: reaction.subject.id.clone(),
            target: reaction.attacker.clone(),
            label: label.to_string(),
            effectiveness,
            damage,
            lethal,
        }
    }
}
