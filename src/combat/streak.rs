//! Consecutive failure tracking
//!
//! Each failure raises the actor's failure chance on the next attempts. The
//! streak is forgotten after a quiet period without failures, or immediately
//! on a success.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use ahash::AHashMap;

use crate::core::config::StreakConfig;
use crate::core::sync::lock;
use crate::core::types::ActorId;
use crate::timer::{TimerHandle, TimerScheduler};

/// Per-actor failure streaks with self-expiring counters
#[derive(Clone)]
pub struct FailureStreaks {
    inner: Arc<StreakTable>,
}

struct StreakTable {
    config: StreakConfig,
    scheduler: TimerScheduler,
    entries: Mutex<AHashMap<ActorId, Streak>>,
    next_generation: AtomicU64,
}

struct Streak {
    count: u32,
    /// Only the reset timer armed with this generation may clear the streak
    generation: u64,
    reset: TimerHandle,
}

impl FailureStreaks {
    pub fn new(config: StreakConfig, scheduler: TimerScheduler) -> Self {
        Self {
            inner: Arc::new(StreakTable {
                config,
                scheduler,
                entries: Mutex::new(AHashMap::new()),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Current number of recent failures
    pub fn count(&self, actor: &ActorId) -> u32 {
        lock(&self.inner.entries)
            .get(actor)
            .map(|streak| streak.count)
            .unwrap_or(0)
    }

    /// Failure chance added by the actor's streak, capped
    pub fn penalty(&self, actor: &ActorId) -> f64 {
        self.inner.penalty_for(self.count(actor))
    }

    /// Count a failure and restart the quiet-period timer
    ///
    /// Returns the new streak length.
    pub fn record_failure(&self, actor: &ActorId) -> u32 {
        let table = &self.inner;
        let generation = table.next_generation.fetch_add(1, Ordering::SeqCst);
        let reset = table.arm_reset(Arc::downgrade(&self.inner), actor.clone(), generation);

        let mut entries = lock(&table.entries);
        let count = match entries.get_mut(actor) {
            Some(streak) => {
                streak.reset.cancel();
                streak.count += 1;
                streak.generation = generation;
                streak.reset = reset;
                streak.count
            }
            None => {
                entries.insert(
                    actor.clone(),
                    Streak {
                        count: 1,
                        generation,
                        reset,
                    },
                );
                1
            }
        };
        drop(entries);

        tracing::debug!(
            "Failure streak for {} is now {} (penalty {:.2})",
            actor,
            count,
            table.penalty_for(count)
        );
        count
    }

    /// Forget the streak right away
    pub fn record_success(&self, actor: &ActorId) {
        if let Some(streak) = lock(&self.inner.entries).remove(actor) {
            streak.reset.cancel();
            tracing::debug!("Failure streak for {} cleared by a success", actor);
        }
    }
}

impl StreakTable {
    fn penalty_for(&self, count: u32) -> f64 {
        let max = self.config.max_penalty.max(0.0);
        (count as f64 * self.config.penalty_per_failure).clamp(0.0, max)
    }

    fn arm_reset(&self, table: Weak<StreakTable>, actor: ActorId, generation: u64) -> TimerHandle {
        self.scheduler.schedule(self.config.reset_after(), move || {
            let Some(table) = table.upgrade() else {
                return;
            };
            let mut entries = lock(&table.entries);
            if entries.get(&actor).map(|s| s.generation) == Some(generation) {
                entries.remove(&actor);
                tracing::debug!("Failure streak for {} expired", actor);
            }
        })
    }
}
