//! Failure severity tiers and success bonuses

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::combat::precision::PrecisionLevel;
use crate::core::config::SeverityThresholds;

/// How badly a failed action went (ordered, lightest first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureSeverity {
    Light,
    Moderate,
    Heavy,
    Critical,
    Catastrophic,
}

impl FailureSeverity {
    pub fn all() -> [FailureSeverity; 5] {
        [
            FailureSeverity::Light,
            FailureSeverity::Moderate,
            FailureSeverity::Heavy,
            FailureSeverity::Critical,
            FailureSeverity::Catastrophic,
        ]
    }

    /// How long a failure of this severity immobilizes the actor
    pub fn immobilization(&self) -> Duration {
        let ms = match self {
            FailureSeverity::Light => 2_000,
            FailureSeverity::Moderate => 4_000,
            FailureSeverity::Heavy => 6_000,
            FailureSeverity::Critical => 8_000,
            FailureSeverity::Catastrophic => 12_000,
        };
        Duration::from_millis(ms)
    }

    /// Bucket a severity score
    ///
    /// Non-finite scores (a misconfigured table upstream) count as light.
    pub fn from_score(score: f64, thresholds: &SeverityThresholds) -> Self {
        if !score.is_finite() {
            return FailureSeverity::Light;
        }
        if score >= thresholds.catastrophic {
            FailureSeverity::Catastrophic
        } else if score >= thresholds.critical {
            FailureSeverity::Critical
        } else if score >= thresholds.heavy {
            FailureSeverity::Heavy
        } else if score >= thresholds.moderate {
            FailureSeverity::Moderate
        } else {
            FailureSeverity::Light
        }
    }
}

/// Severity score of a failed roll
pub fn severity_score(base_risk: f64, streak_penalty: f64, roll: f64) -> f64 {
    base_risk.clamp(0.0, 1.0) * 5.0 + streak_penalty.max(0.0) * 10.0 + roll.clamp(0.0, 1.0) * 3.0
}

/// Effects granted by a successful action
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BonusEffects {
    pub damage_multiplier: f64,
    pub energy_cost_multiplier: f64,
    pub critical_chance_bonus: f64,
    pub reputation_delta: i32,
}

impl BonusEffects {
    /// Bonus table: precise actions hit harder and cost less
    pub fn for_level(level: PrecisionLevel) -> Self {
        let (damage, energy, crit, reputation) = match level {
            PrecisionLevel::VeryHigh => (1.5, 0.8, 0.30, 2),
            PrecisionLevel::High => (1.3, 0.9, 0.20, 1),
            PrecisionLevel::Medium => (1.0, 1.0, 0.10, 0),
            PrecisionLevel::Low => (0.8, 1.2, 0.05, 0),
            PrecisionLevel::VeryLow => (0.6, 1.5, 0.0, -1),
        };
        Self {
            damage_multiplier: damage,
            energy_cost_multiplier: energy,
            critical_chance_bonus: crit,
            reputation_delta: reputation,
        }
    }
}
