//! End-to-end combat scenarios on a paused clock

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use friction_combat::combat::{FailureSeverity, Outcome, PrecisionLevel, TimingQuality};
use friction_combat::core::dice::{self, Dice, SharedDice};
use friction_combat::core::types::{ActorId, ActorKind, Rank, RoomId};
use friction_combat::narration::TemplateNarrator;
use friction_combat::ports::{ActorProfile, Collaborators, InMemoryCharacterStore, RecordingChannel};
use friction_combat::reaction::{ReactionRequest, ReactionStatus, Response};
use friction_combat::{CombatEngine, CombatError, CounterOutcome, EngineConfig};
use tokio::time::Instant;

const DETAILED_ATTACK: &str = "Accroupi en garde, je fais un pas de 2 mètres vers la gauche \
    puis je lance un uppercut du bras droit vers la tête du garde, en gardant \
    le poids sur la jambe arrière pour reculer aussitôt après le coup porté";

/// Replays queued rolls, then a fallback, and counts every draw
struct ScriptedDice {
    rolls: VecDeque<f64>,
    fallback: f64,
    draws: Arc<AtomicUsize>,
}

impl Dice for ScriptedDice {
    fn unit(&mut self) -> f64 {
        self.draws.fetch_add(1, Ordering::SeqCst);
        self.rolls.pop_front().unwrap_or(self.fallback)
    }
}

fn scripted(rolls: &[f64], fallback: f64) -> (SharedDice, Arc<AtomicUsize>) {
    let draws = Arc::new(AtomicUsize::new(0));
    let dice = dice::shared(ScriptedDice {
        rolls: rolls.iter().copied().collect(),
        fallback,
        draws: draws.clone(),
    });
    (dice, draws)
}

struct Arena {
    engine: CombatEngine,
    store: Arc<InMemoryCharacterStore>,
    channel: Arc<RecordingChannel>,
    player: ActorId,
    guard: ActorId,
    room: RoomId,
}

fn arena_with(config: EngineConfig, dice: SharedDice) -> Arena {
    let store = Arc::new(InMemoryCharacterStore::with_actors([
        ActorProfile::new("p1", "Aria", ActorKind::Player, Rank::S),
        ActorProfile::new("rookie", "Tom", ActorKind::Player, Rank::G),
        ActorProfile::new("g1", "Garde", ActorKind::NonPlayer, Rank::S),
    ]));
    let channel = Arc::new(RecordingChannel::new());
    let collaborators =
        Collaborators::new(store.clone(), channel.clone(), Arc::new(TemplateNarrator::new()));
    let engine = CombatEngine::new(config, collaborators, dice).unwrap();
    Arena {
        engine,
        store,
        channel,
        player: ActorId::from("p1"),
        guard: ActorId::from("g1"),
        room: RoomId::new("arene"),
    }
}

fn arena(dice: SharedDice) -> Arena {
    arena_with(EngineConfig::default(), dice)
}

#[tokio::test(start_paused = true)]
async fn test_vague_attack_against_weakest_rank() {
    let (dice, _) = scripted(&[], 0.99);
    let arena = arena(dice);
    let weakling = ActorProfile::new("w1", "Gamin", ActorKind::NonPlayer, Rank::G);
    arena.store.insert(weakling.clone());

    let attempt = arena
        .engine
        .attempt(&arena.player, "j'attaque", Some(&weakling.id))
        .unwrap();
    assert_eq!(attempt.report.level, PrecisionLevel::VeryLow);
    let chance = attempt.outcome.failure_chance().unwrap();
    assert!((chance - 0.90).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_detailed_attack_only_pays_streak_penalty() {
    let (dice, _) = scripted(&[0.0], 0.5);
    let arena = arena(dice);

    // One failure to build a streak
    let first = arena
        .engine
        .attempt(&arena.player, "Je tente un crochet rapide vers son genou", None)
        .unwrap();
    assert!(matches!(first.outcome, Outcome::Failure(_)));
    tokio::time::sleep(Duration::from_secs(13)).await;

    let attempt = arena.engine.attempt(&arena.player, DETAILED_ATTACK, None).unwrap();
    assert_eq!(attempt.report.level, PrecisionLevel::VeryHigh);
    assert!(attempt.report.detectors.technique);
    assert!(attempt.report.detectors.target);
    assert!(attempt.report.detectors.metric);
    assert!(attempt.report.detectors.stance);
    let chance = attempt.outcome.failure_chance().unwrap();
    assert!((chance - 0.05).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_three_recent_failures_raise_fourth_attempt() {
    let (dice, _) = scripted(&[0.0, 0.0, 0.0], 0.99);
    let arena = arena(dice);
    let medium = "Je tente un crochet rapide vers son genou";

    for _ in 0..3 {
        let attempt = arena.engine.attempt(&arena.player, medium, None).unwrap();
        assert!(matches!(attempt.outcome, Outcome::Failure(_)));
        tokio::time::sleep(Duration::from_secs(13)).await;
    }

    let fourth = arena.engine.attempt(&arena.player, medium, None).unwrap();
    let chance = fourth.outcome.failure_chance().unwrap();
    assert!((chance - 0.45).abs() < 1e-9);
    assert!(fourth.outcome.is_success());
    assert_eq!(arena.engine.status(&arena.player).unwrap().consecutive_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_busy_actor_gets_no_roll() {
    let (dice, draws) = scripted(&[0.0], 0.99);
    let arena = arena(dice);

    let failed = arena.engine.attempt(&arena.player, "j'attaque", None).unwrap();
    assert!(matches!(failed.outcome, Outcome::Failure(_)));
    let after_failure = draws.load(Ordering::SeqCst);

    for _ in 0..3 {
        let attempt = arena.engine.attempt(&arena.player, DETAILED_ATTACK, None).unwrap();
        assert!(attempt.outcome.is_busy());
    }
    assert_eq!(draws.load(Ordering::SeqCst), after_failure);
    assert_eq!(arena.engine.status(&arena.player).unwrap().consecutive_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_streak_forgotten_after_quiet_period() {
    let (dice, _) = scripted(&[0.0, 0.0], 0.99);
    let arena = arena(dice);

    arena.engine.attempt(&arena.player, "j'attaque", None).unwrap();
    tokio::time::sleep(Duration::from_secs(13)).await;
    arena.engine.attempt(&arena.player, "j'attaque", None).unwrap();

    let status = arena.engine.status(&arena.player).unwrap();
    assert_eq!(status.consecutive_failures, 2);
    assert!((status.failure_penalty - 0.10).abs() < 1e-9);

    tokio::time::sleep(Duration::from_secs(121)).await;
    let status = arena.engine.status(&arena.player).unwrap();
    assert_eq!(status.consecutive_failures, 0);
    assert_eq!(status.failure_penalty, 0.0);
    assert!(!status.immobilized);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_actor_mutates_nothing() {
    let (dice, draws) = scripted(&[], 0.0);
    let arena = arena(dice);
    let ghost = ActorId::from("ghost");

    let result = arena.engine.attempt(&ghost, "j'attaque", None);
    assert!(matches!(result, Err(CombatError::NoSuchActor(_))));
    let result = arena.engine.attempt(&arena.player, "j'attaque", Some(&ghost));
    assert!(matches!(result, Err(CombatError::NoSuchActor(_))));

    assert_eq!(draws.load(Ordering::SeqCst), 0);
    assert!(!arena.engine.immobilizations().is_immobilized(&arena.player));
    assert!(matches!(arena.engine.status(&ghost), Err(CombatError::NoSuchActor(_))));
}

#[tokio::test(start_paused = true)]
async fn test_npc_defender_preempts_its_deadline() {
    let arena = arena(dice::shared(dice::seeded(21)));
    let request = ReactionRequest::new(arena.guard.clone(), arena.room.clone(), "un direct au menton")
        .from_attacker(arena.player.clone())
        .with_damage(20.0);
    let reaction = arena.engine.start_reaction(request).unwrap();

    let fire_at = arena.engine.reactions().npc().fire_at(&reaction.action_id).unwrap();
    let delay = fire_at - reaction.started_at;
    assert!(delay >= Duration::from_millis(4_500));
    assert!(delay <= Duration::from_millis(12_000));

    tokio::time::sleep(Duration::from_millis(12_001)).await;
    assert_eq!(reaction.status(), ReactionStatus::NpcPreempted);
    assert!(arena.store.health(&arena.player).unwrap() < 100.0);

    // The 15 second deadline passes without a second resolution
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(reaction.status(), ReactionStatus::NpcPreempted);
    assert_eq!(arena.store.health(&arena.guard), Some(100.0));
    assert!(!arena.engine.immobilizations().is_immobilized(&arena.guard));
    assert_eq!(arena.channel.count_containing("n'a pas réagi"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_immobilized_player_speeds_up_npc_counter() {
    // NPC delay draws the top of its range (12s), then the attempt fails
    let (dice, _) = scripted(&[1.0, 0.0], 0.5);
    let arena = arena(dice);
    let request = ReactionRequest::new(arena.guard.clone(), arena.room.clone(), "une feinte")
        .from_attacker(arena.player.clone())
        .with_damage(20.0);
    let reaction = arena.engine.start_reaction(request).unwrap();
    let npc = arena.engine.reactions().npc();
    let before = npc.fire_at(&reaction.action_id).unwrap();
    assert!(before - reaction.started_at >= Duration::from_millis(11_999));

    let attempt = arena
        .engine
        .attempt(&arena.player, "j'attaque", Some(&arena.guard))
        .unwrap();
    let immobilized_for = attempt.outcome.immobilization().unwrap();
    let after = npc.fire_at(&reaction.action_id).unwrap();
    assert!(after < before);
    assert!(after <= Instant::now() + immobilized_for / 2);

    tokio::time::sleep(immobilized_for / 2 + Duration::from_millis(1)).await;
    assert_eq!(reaction.status(), ReactionStatus::NpcPreempted);
}

#[tokio::test(start_paused = true)]
async fn test_second_response_is_too_late() {
    let arena = arena(dice::shared(dice::seeded(3)));
    let request = ReactionRequest::new(arena.player.clone(), arena.room.clone(), "un coup de masse")
        .from_attacker(arena.guard.clone())
        .with_damage(30.0);
    let reaction = arena.engine.start_reaction(request).unwrap();
    assert!(arena.engine.status(&arena.player).unwrap().in_reaction_window());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(arena.engine.respond(&reaction.action_id).unwrap().is_accepted());
    assert_eq!(
        arena.engine.respond(&reaction.action_id).unwrap(),
        Response::TooLate {
            status: ReactionStatus::Responded
        }
    );

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(arena.store.health(&arena.player), Some(100.0));
    assert!(!arena.engine.status(&arena.player).unwrap().in_reaction_window());
}

#[tokio::test(start_paused = true)]
async fn test_ignored_window_times_out() {
    let arena = arena(dice::shared(dice::seeded(3)));
    let request = ReactionRequest::new(arena.player.clone(), arena.room.clone(), "un coup de masse")
        .from_attacker(arena.guard.clone())
        .with_damage(30.0);
    let reaction = arena.engine.start_reaction(request).unwrap();

    tokio::time::sleep(Duration::from_millis(15_001)).await;
    assert_eq!(reaction.status(), ReactionStatus::TimedOut);
    assert_eq!(arena.store.health(&arena.player), Some(70.0));

    let status = arena.engine.status(&arena.player).unwrap();
    assert!(status.immobilized);
    assert_eq!(status.severity, Some(FailureSeverity::Heavy));
    assert_eq!(arena.channel.count_containing("n'a pas réagi"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_configured_timeout_severity() {
    let config = EngineConfig::from_toml_str(
        r#"
        [reaction]
        timeout_severity = "light"
        "#,
    )
    .unwrap();
    let arena = arena_with(config, dice::shared(dice::seeded(3)));
    let request = ReactionRequest::new(arena.player.clone(), arena.room.clone(), "un jab");
    arena.engine.start_reaction(request).unwrap();

    tokio::time::sleep(Duration::from_millis(15_001)).await;
    let status = arena.engine.status(&arena.player).unwrap();
    assert_eq!(status.severity, Some(FailureSeverity::Light));
    assert!(status.remaining_ms > 1_900 && status.remaining_ms <= 2_000);
}

#[tokio::test(start_paused = true)]
async fn test_early_counter_hits_back() {
    let (dice, _) = scripted(&[], 0.5);
    let arena = arena(dice);
    let request = ReactionRequest::new(arena.player.clone(), arena.room.clone(), "un coup d'épée")
        .from_attacker(arena.guard.clone())
        .with_damage(10.0);
    let reaction = arena.engine.start_reaction(request).unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    let outcome = arena
        .engine
        .counter(&reaction.action_id, "riposte latérale de 30 cm vers le torse")
        .unwrap();
    match outcome {
        CounterOutcome::Resolved { report, damage, .. } => {
            assert_eq!(report.timing, TimingQuality::Perfect);
            assert!(report.success);
            assert_eq!(damage, 25.0);
            assert_eq!(report.distance.as_deref(), Some("30cm"));
            assert_eq!(report.angle.as_deref(), Some("latéral (90°)"));
        }
        other => panic!("expected a resolved counter, got {:?}", other),
    }
    assert_eq!(arena.store.health(&arena.guard), Some(75.0));
    assert_eq!(reaction.status(), ReactionStatus::Responded);

    let late = arena.engine.counter(&reaction.action_id, "riposte").unwrap();
    assert_eq!(
        late,
        CounterOutcome::TooLate {
            status: ReactionStatus::Responded
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_long_window_reminders() {
    let arena = arena(dice::shared(dice::seeded(8)));
    let rookie = ActorId::from("rookie");
    let request = ReactionRequest::new(rookie.clone(), arena.room.clone(), "une gifle");
    let reaction = arena.engine.start_reaction(request).unwrap();
    assert_eq!(reaction.window(), Duration::from_secs(360));

    tokio::time::sleep(Duration::from_secs(343)).await;
    // countdown + reminders at 180s, 288s and 342s
    assert_eq!(arena.channel.messages().len(), 4);
    assert!(arena.channel.messages().iter().all(|m| m.room == arena.room));

    assert!(arena.engine.cancel_reaction(&reaction.action_id).unwrap());
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(arena.channel.messages().len(), 4);
    assert!(!arena.engine.immobilizations().is_immobilized(&rookie));
}

#[tokio::test(start_paused = true)]
async fn test_success_applies_bonus() {
    let (dice, _) = scripted(&[], 0.99);
    let arena = arena(dice);
    let attempt = arena.engine.attempt(&arena.player, DETAILED_ATTACK, None).unwrap();
    assert!(attempt.outcome.is_success());
    assert!(attempt.narration.contains("Aria"));

    let sheet = arena.store.sheet(&arena.player).unwrap();
    assert_eq!(sheet.reputation, 2);
    assert_eq!(sheet.bonuses_applied, 1);
}
