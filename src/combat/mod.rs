pub mod constants;
pub mod counter;
pub mod immobilization;
pub mod precision;
pub mod resolution;
pub mod severity;
pub mod streak;

pub use counter::{evaluate_counter, CounterReport, TimingQuality};
pub use immobilization::{ImmobilizationListener, ImmobilizationRecord, Immobilizations};
pub use precision::{evaluate, precision_level, PrecisionLevel, PrecisionReport};
pub use resolution::{FailureOdds, Outcome, OutcomeResolver};
pub use severity::{BonusEffects, FailureSeverity};
pub use streak::FailureStreaks;
