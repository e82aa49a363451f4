//! Outcome resolution for attempted actions
//!
//! One roll per attempt. The failure chance stacks three additive terms:
//! the precision level's base risk, the actor's failure streak penalty, and
//! the opponent's rank modifier, capped below certainty.

use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::combat::constants::opponent_modifier;
use crate::combat::immobilization::Immobilizations;
use crate::combat::precision::PrecisionLevel;
use crate::combat::severity::{severity_score, BonusEffects, FailureSeverity};
use crate::combat::streak::FailureStreaks;
use crate::core::config::ResolutionConfig;
use crate::core::dice::{Dice, SharedDice};
use crate::core::sync::lock;
use crate::core::types::{ActorId, Rank};

/// The terms behind a failure chance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FailureOdds {
    pub base_risk: f64,
    pub streak_penalty: f64,
    pub opponent_modifier: f64,
    /// Sum of the terms, clamped into [0, max_failure_chance]
    pub total: f64,
}

/// Result of an action attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    /// The actor is immobilized; nothing was rolled
    Busy {
        severity: FailureSeverity,
        remaining_ms: u64,
        cause: String,
    },
    Failure(FailureOutcome),
    Success(SuccessOutcome),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureOutcome {
    pub precision: PrecisionLevel,
    pub failure_chance: f64,
    pub roll: f64,
    pub severity: FailureSeverity,
    pub immobilization_ms: u64,
    /// Streak length including this failure
    pub streak: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessOutcome {
    pub precision: PrecisionLevel,
    pub failure_chance: f64,
    pub roll: f64,
    pub bonus: BonusEffects,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Outcome::Busy { .. })
    }

    pub fn precision(&self) -> Option<PrecisionLevel> {
        match self {
            Outcome::Busy { .. } => None,
            Outcome::Failure(f) => Some(f.precision),
            Outcome::Success(s) => Some(s.precision),
        }
    }

    /// Failure chance the roll was made against
    pub fn failure_chance(&self) -> Option<f64> {
        match self {
            Outcome::Busy { .. } => None,
            Outcome::Failure(f) => Some(f.failure_chance),
            Outcome::Success(s) => Some(s.failure_chance),
        }
    }

    pub fn immobilization(&self) -> Option<Duration> {
        match self {
            Outcome::Failure(f) => Some(Duration::from_millis(f.immobilization_ms)),
            _ => None,
        }
    }
}

/// Rolls attempts and applies their consequences
pub struct OutcomeResolver {
    config: ResolutionConfig,
    streaks: FailureStreaks,
    immobilizations: Immobilizations,
    dice: SharedDice,
    /// Held from the busy check until the failure is recorded
    attempts: Mutex<()>,
}

impl OutcomeResolver {
    pub fn new(
        config: ResolutionConfig,
        streaks: FailureStreaks,
        immobilizations: Immobilizations,
        dice: SharedDice,
    ) -> Self {
        Self {
            config,
            streaks,
            immobilizations,
            dice,
            attempts: Mutex::new(()),
        }
    }

    /// Failure chance the actor would face right now
    pub fn odds(&self, actor: &ActorId, level: PrecisionLevel, opponent: Option<Rank>) -> FailureOdds {
        let base_risk = level.base_risk().clamp(0.0, 1.0);
        let streak_penalty = self.streaks.penalty(actor).max(0.0);
        let modifier = opponent.map(opponent_modifier).unwrap_or(0.0).max(0.0);
        let cap = self.config.max_failure_chance.clamp(0.0, 1.0);
        FailureOdds {
            base_risk,
            streak_penalty,
            opponent_modifier: modifier,
            total: (base_risk + streak_penalty + modifier).clamp(0.0, cap),
        }
    }

    /// Resolve one attempt
    ///
    /// An immobilized actor gets [`Outcome::Busy`] without any roll or state
    /// change. A failure immobilizes the actor and extends its streak; a
    /// success clears the streak. Concurrent attempts are resolved one after
    /// the other, so a second attempt sees the first one's immobilization.
    pub fn resolve(
        &self,
        actor: &ActorId,
        action: &str,
        level: PrecisionLevel,
        opponent: Option<Rank>,
    ) -> Outcome {
        let _attempt = lock(&self.attempts);
        if let Some(record) = self.immobilizations.record(actor) {
            tracing::debug!("{} tried to act while immobilized", actor);
            return Outcome::Busy {
                severity: record.severity,
                remaining_ms: record.remaining().as_millis() as u64,
                cause: record.cause,
            };
        }

        let odds = self.odds(actor, level, opponent);
        let roll = lock(&self.dice).unit();

        if roll < odds.total {
            let score = severity_score(odds.base_risk, odds.streak_penalty, roll);
            let severity = FailureSeverity::from_score(score, &self.config.severity_thresholds);
            self.immobilizations.immobilize(actor, severity, action);
            let streak = self.streaks.record_failure(actor);

            tracing::info!(
                "{} failed a {} action (roll {:.3} < {:.3}), severity {:?}",
                actor,
                level.label(),
                roll,
                odds.total,
                severity
            );

            Outcome::Failure(FailureOutcome {
                precision: level,
                failure_chance: odds.total,
                roll,
                severity,
                immobilization_ms: severity.immobilization().as_millis() as u64,
                streak,
            })
        } else {
            self.streaks.record_success(actor);
            tracing::info!(
                "{} landed a {} action (roll {:.3} >= {:.3})",
                actor,
                level.label(),
                roll,
                odds.total
            );

            Outcome::Success(SuccessOutcome {
                precision: level,
                failure_chance: odds.total,
                roll,
                bonus: BonusEffects::for_level(level),
            })
        }
    }
}
