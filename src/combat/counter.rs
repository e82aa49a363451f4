//! Counter-attack timing
//!
//! A defender can answer a reaction window with a counter-attack instead of a
//! plain defense. The earlier in the window the counter comes, the harder it
//! hits and the more likely it lands.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::combat::precision::{extract_angle, extract_distance, precision_level, PrecisionLevel};
use crate::core::dice::Dice;

/// Timing grade of a counter-attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingQuality {
    Perfect,
    Good,
    Normal,
    Late,
    Failed,
}

impl TimingQuality {
    /// Grade from the elapsed fraction of the reaction window
    pub fn from_fraction(fraction: f64) -> Self {
        if fraction.is_nan() || fraction >= 0.95 {
            TimingQuality::Failed
        } else if fraction >= 0.75 {
            TimingQuality::Late
        } else if fraction >= 0.5 {
            TimingQuality::Normal
        } else if fraction >= 0.2 {
            TimingQuality::Good
        } else {
            TimingQuality::Perfect
        }
    }

    pub fn damage_multiplier(&self) -> f64 {
        match self {
            TimingQuality::Perfect => 2.5,
            TimingQuality::Good => 1.8,
            TimingQuality::Normal => 1.3,
            TimingQuality::Late => 0.8,
            TimingQuality::Failed => 0.0,
        }
    }

    /// Chance the counter lands
    pub fn success_rate(&self) -> f64 {
        match self {
            TimingQuality::Perfect => 1.0,
            TimingQuality::Good => 0.85,
            TimingQuality::Normal => 0.60,
            TimingQuality::Late => 0.30,
            TimingQuality::Failed => 0.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimingQuality::Perfect => "parfait",
            TimingQuality::Good => "bon",
            TimingQuality::Normal => "correct",
            TimingQuality::Late => "tardif",
            TimingQuality::Failed => "raté",
        }
    }
}

/// Report of a counter-attack attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterReport {
    pub timing: TimingQuality,
    pub elapsed_ms: u64,
    pub window_ms: u64,
    pub precision: PrecisionLevel,
    pub distance: Option<String>,
    pub angle: Option<String>,
    pub success: bool,
    /// Zero when the counter missed
    pub damage_multiplier: f64,
}

/// Grade and roll a counter-attack made `elapsed` into a `window`
pub fn evaluate_counter(
    text: &str,
    elapsed: Duration,
    window: Duration,
    dice: &mut dyn Dice,
) -> CounterReport {
    let fraction = if window.is_zero() {
        1.0
    } else {
        elapsed.as_secs_f64() / window.as_secs_f64()
    };
    let timing = TimingQuality::from_fraction(fraction);
    let success = dice.unit() < timing.success_rate();

    CounterReport {
        timing,
        elapsed_ms: elapsed.as_millis() as u64,
        window_ms: window.as_millis() as u64,
        precision: precision_level(text),
        distance: extract_distance(text),
        angle: extract_angle(text),
        success,
        damage_multiplier: if success {
            timing.damage_multiplier()
        } else {
            0.0
        },
    }
}
