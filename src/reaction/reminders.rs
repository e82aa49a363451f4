//! When to nag a defender who has not reacted yet

use std::time::Duration;

use crate::core::config::ReactionConfig;

/// Offsets from the start of the window at which a reminder goes out
///
/// Long windows are checked at fixed fractions of the window. Short ones at
/// fixed remaining times, skipping those that would fall before the start.
/// The result is sorted and has no duplicates.
pub fn reminder_offsets(window: Duration, config: &ReactionConfig) -> Vec<Duration> {
    let mut offsets: Vec<Duration> = if window >= config.long_window() {
        config
            .long_window_checkpoints
            .iter()
            .filter(|fraction| (0.0..1.0).contains(*fraction) && **fraction > 0.0)
            .map(|fraction| window.mul_f64(*fraction))
            .collect()
    } else {
        config
            .short_window_remainders_secs
            .iter()
            .map(|secs| Duration::from_secs(*secs))
            .filter(|remaining| *remaining < window)
            .map(|remaining| window - remaining)
            .collect()
    };
    offsets.sort();
    offsets.dedup();
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Rank;

    fn secs(offsets: &[Duration]) -> Vec<f64> {
        offsets.iter().map(|d| d.as_secs_f64()).collect()
    }

    #[test]
    fn test_long_window_uses_fractions() {
        let offsets = reminder_offsets(Rank::C.reaction_window(), &ReactionConfig::default());
        assert_eq!(secs(&offsets), vec![60.0, 96.0, 114.0]);
    }

    #[test]
    fn test_sixty_seconds_counts_as_long() {
        let offsets = reminder_offsets(Rank::B.reaction_window(), &ReactionConfig::default());
        assert_eq!(secs(&offsets), vec![30.0, 48.0, 57.0]);
    }

    #[test]
    fn test_short_window_uses_remaining_times() {
        let offsets = reminder_offsets(Rank::S.reaction_window(), &ReactionConfig::default());
        assert_eq!(secs(&offsets), vec![5.0, 10.0, 12.0]);
    }

    #[test]
    fn test_tiny_window_drops_checkpoints_before_start() {
        let offsets = reminder_offsets(Rank::SSS.reaction_window(), &ReactionConfig::default());
        // 10s and 5s remaining do not fit in a 5s window
        assert_eq!(secs(&offsets), vec![2.0]);

        let monarque = reminder_offsets(Rank::Monarque.reaction_window(), &ReactionConfig::default());
        assert!(monarque.is_empty());
    }
}
