//! Immobilization state machine
//!
//! A failed action leaves the actor unable to act for a severity-dependent
//! time. Records are created on failure and removed by their own expiry
//! timer; a second failure while immobilized only ever pushes the end time
//! later, never earlier, and never stacks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use ahash::AHashMap;
use tokio::time::Instant;

use crate::combat::severity::FailureSeverity;
use crate::core::sync::lock;
use crate::core::types::ActorId;
use crate::timer::{TimerHandle, TimerScheduler};

/// An actor's current disabled state
#[derive(Debug, Clone, PartialEq)]
pub struct ImmobilizationRecord {
    pub actor: ActorId,
    pub severity: FailureSeverity,
    pub started_at: Instant,
    pub ends_at: Instant,
    /// The failed action text
    pub cause: String,
}

impl ImmobilizationRecord {
    pub fn duration(&self) -> Duration {
        self.ends_at.saturating_duration_since(self.started_at)
    }

    pub fn remaining(&self) -> Duration {
        self.ends_at.saturating_duration_since(Instant::now())
    }

    pub fn is_active(&self) -> bool {
        Instant::now() < self.ends_at
    }
}

/// Reacts to actors becoming immobilized
pub trait ImmobilizationListener: Send + Sync {
    /// Called after the record is stored, with no table lock held
    ///
    /// `duration` is how long the actor stays down from now.
    fn on_immobilized(&self, record: &ImmobilizationRecord, duration: Duration);
}

/// Per-actor immobilization table
#[derive(Clone)]
pub struct Immobilizations {
    inner: Arc<ImmobilizationTable>,
}

struct ImmobilizationTable {
    scheduler: TimerScheduler,
    entries: Mutex<AHashMap<ActorId, Entry>>,
    listeners: RwLock<Vec<Arc<dyn ImmobilizationListener>>>,
    next_generation: AtomicU64,
}

struct Entry {
    record: ImmobilizationRecord,
    generation: u64,
    expiry: TimerHandle,
}

impl Immobilizations {
    pub fn new(scheduler: TimerScheduler) -> Self {
        Self {
            inner: Arc::new(ImmobilizationTable {
                scheduler,
                entries: Mutex::new(AHashMap::new()),
                listeners: RwLock::new(Vec::new()),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn ImmobilizationListener>) {
        self.inner
            .listeners
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(listener);
    }

    /// Disable an actor for the severity's duration
    ///
    /// Returns the stored record, or `None` when a live record already ends
    /// at or after the new end time (nothing changes in that case).
    pub fn immobilize(
        &self,
        actor: &ActorId,
        severity: FailureSeverity,
        cause: &str,
    ) -> Option<ImmobilizationRecord> {
        let table = &self.inner;
        let duration = severity.immobilization();
        let now = Instant::now();
        let ends_at = now + duration;
        let generation = table.next_generation.fetch_add(1, Ordering::SeqCst);

        let mut entries = lock(&table.entries);
        let record = match entries.get_mut(actor) {
            Some(entry) if entry.record.ends_at > now => {
                if entry.record.ends_at >= ends_at {
                    return None;
                }
                entry.expiry.cancel();
                entry.record.ends_at = ends_at;
                entry.generation = generation;
                entry.expiry = table.arm_expiry(&self.inner, actor.clone(), generation, duration);
                tracing::info!(
                    "{} already immobilized, extended by a {:?} failure to {:?}",
                    actor,
                    severity,
                    duration
                );
                entry.record.clone()
            }
            _ => {
                let record = ImmobilizationRecord {
                    actor: actor.clone(),
                    severity,
                    started_at: now,
                    ends_at,
                    cause: cause.to_string(),
                };
                let expiry = table.arm_expiry(&self.inner, actor.clone(), generation, duration);
                if let Some(stale) = entries.insert(
                    actor.clone(),
                    Entry {
                        record: record.clone(),
                        generation,
                        expiry,
                    },
                ) {
                    stale.expiry.cancel();
                }
                tracing::info!("{} immobilized for {:?} ({:?})", actor, duration, severity);
                record
            }
        };
        drop(entries);

        let listeners = table
            .listeners
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener.on_immobilized(&record, duration);
        }
        Some(record)
    }

    pub fn is_immobilized(&self, actor: &ActorId) -> bool {
        self.record(actor).is_some()
    }

    /// Time left before the actor can act again (zero when free)
    pub fn remaining(&self, actor: &ActorId) -> Duration {
        self.record(actor)
            .map(|record| record.remaining())
            .unwrap_or(Duration::ZERO)
    }

    /// The actor's live record, if any
    pub fn record(&self, actor: &ActorId) -> Option<ImmobilizationRecord> {
        lock(&self.inner.entries)
            .get(actor)
            .filter(|entry| entry.record.is_active())
            .map(|entry| entry.record.clone())
    }

    /// Lift an immobilization early
    pub fn clear(&self, actor: &ActorId) -> bool {
        match lock(&self.inner.entries).remove(actor) {
            Some(entry) => {
                entry.expiry.cancel();
                tracing::info!("{} released from immobilization", actor);
                true
            }
            None => false,
        }
    }
}

impl ImmobilizationTable {
    fn arm_expiry(
        &self,
        table: &Arc<ImmobilizationTable>,
        actor: ActorId,
        generation: u64,
        duration: Duration,
    ) -> TimerHandle {
        let table: Weak<ImmobilizationTable> = Arc::downgrade(table);
        self.scheduler.schedule(duration, move || {
            let Some(table) = table.upgrade() else {
                return;
            };
            let mut entries = lock(&table.entries);
            if entries.get(&actor).map(|e| e.generation) == Some(generation) {
                entries.remove(&actor);
                tracing::info!("{} is no longer immobilized", actor);
            }
        })
    }
}
