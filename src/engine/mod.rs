//! Combat engine: the single entry point the game talks to
//!
//! Owns one instance of every component and wires them together: the
//! resolver feeds the immobilization table, which notifies the vulnerability
//! listener, which accelerates NPC counter-reactions run by the reaction
//! scheduler.

mod status;

pub use status::ActorStatus;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::combat::counter::{evaluate_counter, CounterReport};
use crate::combat::immobilization::Immobilizations;
use crate::combat::precision::{self, PrecisionReport};
use crate::combat::resolution::{Outcome, OutcomeResolver};
use crate::combat::streak::FailureStreaks;
use crate::core::config::EngineConfig;
use crate::core::dice::{self, SharedDice};
use crate::core::error::{CollaboratorError, CombatError, Result};
use crate::core::sync::lock;
use crate::core::types::{ActionId, ActorId};
use crate::ports::Collaborators;
use crate::reaction::{
    NpcAutoResponder, ReactionRequest, ReactionScheduler, ReactionStatus, ReactionTimer, Response,
    VulnerabilityNotifier,
};
use crate::timer::TimerScheduler;

/// A resolved action attempt with its narration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub report: PrecisionReport,
    pub outcome: Outcome,
    pub narration: String,
}

/// Result of answering a reaction window with a counter-attack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CounterOutcome {
    Resolved {
        report: CounterReport,
        damage: f64,
        narration: String,
    },
    TooLate {
        status: ReactionStatus,
    },
}

pub struct CombatEngine {
    config: EngineConfig,
    collaborators: Collaborators,
    dice: SharedDice,
    streaks: FailureStreaks,
    immobilizations: Immobilizations,
    resolver: OutcomeResolver,
    reactions: ReactionScheduler,
}

impl CombatEngine {
    /// Build an engine on the current tokio runtime
    pub fn new(config: EngineConfig, collaborators: Collaborators, dice: SharedDice) -> Result<Self> {
        Self::with_scheduler(config, collaborators, dice, TimerScheduler::current()?)
    }

    /// Build an engine with reproducible randomness
    pub fn seeded(config: EngineConfig, collaborators: Collaborators, seed: u64) -> Result<Self> {
        Self::new(config, collaborators, dice::shared(dice::seeded(seed)))
    }

    pub fn with_scheduler(
        config: EngineConfig,
        collaborators: Collaborators,
        dice: SharedDice,
        scheduler: TimerScheduler,
    ) -> Result<Self> {
        config.validate()?;

        let streaks = FailureStreaks::new(config.streak.clone(), scheduler.clone());
        let immobilizations = Immobilizations::new(scheduler.clone());
        let npc = NpcAutoResponder::new(
            config.npc.clone(),
            scheduler.clone(),
            dice.clone(),
            collaborators.clone(),
        );
        immobilizations.add_listener(Arc::new(VulnerabilityNotifier::new(
            collaborators.store.clone(),
            npc.clone(),
        )));

        let resolver = OutcomeResolver::new(
            config.resolution.clone(),
            streaks.clone(),
            immobilizations.clone(),
            dice.clone(),
        );
        let reactions = ReactionScheduler::new(
            config.reaction.clone(),
            scheduler,
            collaborators.clone(),
            immobilizations.clone(),
            npc,
        );

        tracing::info!("Combat engine ready");
        Ok(Self {
            config,
            collaborators,
            dice,
            streaks,
            immobilizations,
            resolver,
            reactions,
        })
    }

    /// Resolve a free-text action
    ///
    /// `opponent` is the actor the action is aimed at, if any; its rank
    /// raises the failure chance.
    pub fn attempt(&self, actor: &ActorId, text: &str, opponent: Option<&ActorId>) -> Result<Attempt> {
        let store = &self.collaborators.store;
        let profile = store.profile(actor).map_err(CollaboratorError::into_lookup_error)?;
        let opponent_rank = match opponent {
            Some(opponent) => Some(store.rank(opponent).map_err(CollaboratorError::into_lookup_error)?),
            None => None,
        };

        let report = precision::evaluate(text);
        let outcome = self.resolver.resolve(actor, text, report.level, opponent_rank);

        if let Outcome::Success(success) = &outcome {
            if let Err(e) = store.apply_bonus(actor, &success.bonus) {
                tracing::warn!("Could not apply bonus to {}: {}", actor, e);
            }
        }

        let narration = self.collaborators.narrator.narrate(&profile, text, &outcome);
        Ok(Attempt {
            report,
            outcome,
            narration,
        })
    }

    /// Open a reaction window sized by the subject's rank
    pub fn start_reaction(&self, request: ReactionRequest) -> Result<Arc<ReactionTimer>> {
        self.reactions.start(request)
    }

    pub fn respond(&self, action_id: &ActionId) -> Result<Response> {
        self.reactions.respond(action_id)
    }

    /// Answer a window with a counter-attack
    ///
    /// The counter claims the window like a plain response. A landed counter
    /// sends the incoming damage back at the attacker, scaled by timing.
    pub fn counter(&self, action_id: &ActionId, text: &str) -> Result<CounterOutcome> {
        let reaction = self
            .reactions
            .get(action_id)
            .ok_or(CombatError::UnknownAction(*action_id))?;
        let elapsed = reaction.elapsed();

        if let Response::TooLate { status } = self.reactions.respond(action_id)? {
            return Ok(CounterOutcome::TooLate { status });
        }

        let report = {
            let mut dice = lock(&self.dice);
            evaluate_counter(text, elapsed, reaction.window(), &mut **dice)
        };
        let damage = reaction.incoming_damage * report.damage_multiplier;
        if let Some(attacker) = &reaction.attacker {
            self.collaborators.damage(attacker, damage);
        }
        tracing::info!(
            "{} countered {} with {:?} timing ({})",
            reaction.subject.id,
            action_id,
            report.timing,
            if report.success { "hit" } else { "miss" }
        );

        let narration = self
            .collaborators
            .narrator
            .counter(&reaction.subject, &report, damage);
        self.collaborators.notify(&reaction.room, &narration);
        Ok(CounterOutcome::Resolved {
            report,
            damage,
            narration,
        })
    }

    pub fn cancel_reaction(&self, action_id: &ActionId) -> Result<bool> {
        self.reactions.cancel(action_id)
    }

    /// Snapshot of an actor's combat state
    pub fn status(&self, actor: &ActorId) -> Result<ActorStatus> {
        self.collaborators.store.profile(actor).map_err(CollaboratorError::into_lookup_error)?;
        let record = self.immobilizations.record(actor);
        Ok(ActorStatus {
            actor: actor.clone(),
            immobilized: record.is_some(),
            remaining_ms: record
                .as_ref()
                .map(|r| r.remaining().as_millis() as u64)
                .unwrap_or(0),
            severity: record.as_ref().map(|r| r.severity),
            cause: record.map(|r| r.cause),
            consecutive_failures: self.streaks.count(actor),
            failure_penalty: self.streaks.penalty(actor),
            pending_reaction: self.reactions.pending_for(actor),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn immobilizations(&self) -> &Immobilizations {
        &self.immobilizations
    }

    pub fn streaks(&self) -> &FailureStreaks {
        &self.streaks
    }

    pub fn reactions(&self) -> &ReactionScheduler {
        &self.reactions
    }
}
