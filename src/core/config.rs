//! Engine configuration with documented constants
//!
//! The rank reaction windows and the severity durations are authoritative
//! game rules and live next to their enums. Everything here is a tuning knob:
//! the values reproduce the live game, but can be overridden from a TOML file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::combat::severity::FailureSeverity;
use crate::core::error::{CombatError, Result};

/// Configuration for the whole combat core
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub resolution: ResolutionConfig,
    pub streak: StreakConfig,
    pub reaction: ReactionConfig,
    pub npc: NpcConfig,
}

// === RESOLUTION ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Hard ceiling on the failure chance of any action
    ///
    /// Even the vaguest action against a MONARQUE with a long failure streak
    /// keeps a 5% chance to land.
    pub max_failure_chance: f64,

    /// Severity score bucket boundaries
    ///
    /// Score = base_risk * 5 + streak_penalty * 10 + roll * 3, so it ranges
    /// over roughly [0, 10]. These boundaries were observed in the live game
    /// and have no derivation behind them; treat them as tunable.
    pub severity_thresholds: SeverityThresholds,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            max_failure_chance: 0.95,
            severity_thresholds: SeverityThresholds::default(),
        }
    }
}

/// Lower bound of each severity bucket (light has no bound)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityThresholds {
    pub moderate: f64,
    pub heavy: f64,
    pub critical: f64,
    pub catastrophic: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            moderate: 1.5,
            heavy: 2.5,
            critical: 3.5,
            catastrophic: 4.5,
        }
    }
}

// === FAILURE STREAK ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakConfig {
    /// Failure chance added per recent failure
    pub penalty_per_failure: f64,

    /// Ceiling on the streak penalty
    ///
    /// At 0.05 per failure the cap is reached after six failures.
    pub max_penalty: f64,

    /// Quiet time after the last failure before the streak is forgotten
    pub reset_after_secs: u64,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            penalty_per_failure: 0.05,
            max_penalty: 0.30,
            reset_after_secs: 120,
        }
    }
}

impl StreakConfig {
    pub fn reset_after(&self) -> Duration {
        Duration::from_secs(self.reset_after_secs)
    }
}

// === REACTION WINDOWS ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionConfig {
    /// Windows at least this long get proportional reminders
    ///
    /// Below it, reminders are sent at fixed remaining times instead, since
    /// "50% elapsed" of a 5 second window is noise in a chat room.
    pub long_window_secs: u64,

    /// Elapsed fractions at which long windows send a reminder
    pub long_window_checkpoints: Vec<f64>,

    /// Remaining seconds at which short windows send a reminder
    ///
    /// Checkpoints that do not fit inside the window are skipped.
    pub short_window_remainders_secs: Vec<u64>,

    /// Severity applied to a defender who let the window run out
    pub timeout_severity: FailureSeverity,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            long_window_secs: 60,
            long_window_checkpoints: vec![0.5, 0.8, 0.95],
            short_window_remainders_secs: vec![10, 5, 3],
            timeout_severity: FailureSeverity::Heavy,
        }
    }
}

impl ReactionConfig {
    pub fn long_window(&self) -> Duration {
        Duration::from_secs(self.long_window_secs)
    }
}

// === NON-PLAYER COUNTER-REACTIONS ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcConfig {
    /// Earliest point in the window an NPC reacts, as a fraction of it
    pub min_delay_fraction: f64,

    /// Latest point in the window an NPC reacts
    ///
    /// Kept below 1.0 so an unhurried NPC still beats its own deadline.
    pub max_delay_fraction: f64,

    /// Effectiveness roll range, in percent
    pub min_effectiveness: u32,
    pub max_effectiveness: u32,
}

impl Default for NpcConfig {
    fn default() -> Self {
        Self {
            min_delay_fraction: 0.3,
            max_delay_fraction: 0.8,
            min_effectiveness: 40,
            max_effectiveness: 100,
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a TOML file, missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a config from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let res = &self.resolution;
        if !(0.0..=1.0).contains(&res.max_failure_chance) {
            return Err(invalid(format!(
                "max_failure_chance ({}) must be within [0, 1]",
                res.max_failure_chance
            )));
        }

        let t = res.severity_thresholds;
        if !(t.moderate < t.heavy && t.heavy < t.critical && t.critical < t.catastrophic) {
            return Err(invalid(format!(
                "severity thresholds must be strictly increasing ({} < {} < {} < {})",
                t.moderate, t.heavy, t.critical, t.catastrophic
            )));
        }

        let streak = &self.streak;
        if streak.penalty_per_failure < 0.0 || streak.max_penalty < 0.0 {
            return Err(invalid("streak penalties must not be negative".into()));
        }
        if streak.reset_after_secs == 0 {
            return Err(invalid("streak reset window must be positive".into()));
        }

        if self
            .reaction
            .long_window_checkpoints
            .iter()
            .any(|f| !(0.0..1.0).contains(f))
        {
            return Err(invalid("reminder checkpoints must be fractions in [0, 1)".into()));
        }

        let npc = &self.npc;
        if !(0.0 <= npc.min_delay_fraction
            && npc.min_delay_fraction <= npc.max_delay_fraction
            && npc.max_delay_fraction < 1.0)
        {
            return Err(invalid(format!(
                "npc delay fractions must satisfy 0 <= {} <= {} < 1",
                npc.min_delay_fraction, npc.max_delay_fraction
            )));
        }
        if npc.min_effectiveness > npc.max_effectiveness || npc.max_effectiveness > 100 {
            return Err(invalid(format!(
                "npc effectiveness range {}..={} must lie within 0..=100",
                npc.min_effectiveness, npc.max_effectiveness
            )));
        }

        Ok(())
    }
}

fn invalid(message: String) -> CombatError {
    CombatError::InvalidConfig(message)
}
