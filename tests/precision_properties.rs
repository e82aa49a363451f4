//! Invariants of the scoring and odds tables

use friction_combat::combat::precision::{evaluate, PrecisionLevel};
use friction_combat::combat::severity::{severity_score, FailureSeverity};
use friction_combat::combat::{FailureStreaks, Immobilizations, OutcomeResolver, TimingQuality};
use friction_combat::core::config::{ResolutionConfig, SeverityThresholds, StreakConfig};
use friction_combat::core::dice;
use friction_combat::core::types::{ActorId, Rank};
use friction_combat::timer::TimerScheduler;
use proptest::prelude::*;

fn any_rank() -> impl Strategy<Value = Rank> {
    (0..Rank::all().len()).prop_map(|i| Rank::all()[i])
}

fn any_level() -> impl Strategy<Value = PrecisionLevel> {
    (0..PrecisionLevel::all().len()).prop_map(|i| PrecisionLevel::all()[i])
}

#[test]
fn test_risk_table_is_monotone() {
    let risks: Vec<f64> = PrecisionLevel::all().iter().map(|l| l.base_risk()).collect();
    assert_eq!(risks, vec![0.9, 0.7, 0.3, 0.1, 0.0]);
}

proptest! {
    #[test]
    fn evaluation_is_deterministic(text in "\\PC{0,200}") {
        prop_assert_eq!(evaluate(&text), evaluate(&text));
    }

    #[test]
    fn level_follows_score(text in "[a-zéèêàç0-9 ]{0,300}") {
        let report = evaluate(&text);
        prop_assert_eq!(report.level, PrecisionLevel::from_score(report.score));
        prop_assert!(report.score <= 12);
    }

    #[test]
    fn adding_a_technique_never_lowers_precision(text in "[a-z ]{0,120}") {
        let plain = evaluate(&text);
        let detailed = evaluate(&format!("{} uppercut", text));
        prop_assert!(detailed.level >= plain.level || plain.detectors.technique);
    }

    #[test]
    fn total_failure_chance_is_capped(
        level in any_level(),
        failures in 0u32..20,
        rank in any_rank(),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let _guard = rt.enter();
        let scheduler = TimerScheduler::current().unwrap();
        let streaks = FailureStreaks::new(StreakConfig::default(), scheduler.clone());
        let resolver = OutcomeResolver::new(
            ResolutionConfig::default(),
            streaks.clone(),
            Immobilizations::new(scheduler),
            dice::shared(dice::seeded(1)),
        );

        let actor = ActorId::from("p1");
        for _ in 0..failures {
            streaks.record_failure(&actor);
        }

        let penalty = streaks.penalty(&actor);
        prop_assert!(penalty <= 0.30 + 1e-12);
        prop_assert!((penalty - (failures as f64 * 0.05).min(0.30)).abs() < 1e-9);

        let odds = resolver.odds(&actor, level, Some(rank));
        prop_assert!(odds.total <= 0.95);
        prop_assert!(odds.total >= 0.0);
        prop_assert_eq!(odds.streak_penalty, penalty);
        let uncapped = odds.base_risk + odds.streak_penalty + odds.opponent_modifier;
        prop_assert!(odds.total <= uncapped + 1e-12);
    }

    #[test]
    fn severity_grows_with_roll(
        base in 0.0f64..=1.0,
        penalty in 0.0f64..=0.30,
        low in 0.0f64..1.0,
        high in 0.0f64..1.0,
    ) {
        let thresholds = SeverityThresholds::default();
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let a = FailureSeverity::from_score(severity_score(base, penalty, low), &thresholds);
        let b = FailureSeverity::from_score(severity_score(base, penalty, high), &thresholds);
        prop_assert!(a.immobilization() <= b.immobilization());
    }

    #[test]
    fn later_counters_never_hit_harder(a in 0.0f64..1.5, b in 0.0f64..1.5) {
        let (early, late) = if a <= b { (a, b) } else { (b, a) };
        let early = TimingQuality::from_fraction(early);
        let late = TimingQuality::from_fraction(late);
        prop_assert!(early.damage_multiplier() >= late.damage_multiplier());
        prop_assert!(early.success_rate() >= late.success_rate());
    }
}
