use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::core::sync::lock;
use crate::core::types::{ActionId, ActorId, RoomId};
use crate::ports::ActorProfile;
use crate::timer::TimerHandle;

/// Where a reaction window stands
///
/// `Waiting` is the only non-terminal status. Once a window leaves it, the
/// status never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionStatus {
    Waiting,
    Responded,
    TimedOut,
    NpcPreempted,
    Cancelled,
}

impl ReactionStatus {
    fn to_u8(self) -> u8 {
        match self {
            ReactionStatus::Waiting => 0,
            ReactionStatus::Responded => 1,
            ReactionStatus::TimedOut => 2,
            ReactionStatus::NpcPreempted => 3,
            ReactionStatus::Cancelled => 4,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => ReactionStatus::Waiting,
            1 => ReactionStatus::Responded,
            2 => ReactionStatus::TimedOut,
            3 => ReactionStatus::NpcPreempted,
            _ => ReactionStatus::Cancelled,
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self != ReactionStatus::Waiting
    }
}

/// One open (or closed) reaction window
pub struct ReactionTimer {
    pub action_id: ActionId,
    pub subject: ActorProfile,
    pub attacker: Option<ActorId>,
    pub room: RoomId,
    pub description: String,
    /// Damage taken by the subject if the window runs out
    pub incoming_damage: f64,
    pub started_at: Instant,
    pub deadline: Instant,
    status: AtomicU8,
    resolved_at: Mutex<Option<Instant>>,
    /// Reminder and deadline timers, cancelled on resolution
    pending: Mutex<Vec<TimerHandle>>,
}

impl ReactionTimer {
    pub(crate) fn new(
        action_id: ActionId,
        subject: ActorProfile,
        attacker: Option<ActorId>,
        room: RoomId,
        description: String,
        incoming_damage: f64,
        window: Duration,
    ) -> Self {
        let started_at = Instant::now();
        Self {
            action_id,
            subject,
            attacker,
            room,
            description,
            incoming_damage,
            started_at,
            deadline: started_at + window,
            status: AtomicU8::new(ReactionStatus::Waiting.to_u8()),
            resolved_at: Mutex::new(None),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn status(&self) -> ReactionStatus {
        ReactionStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    pub fn is_waiting(&self) -> bool {
        self.status() == ReactionStatus::Waiting
    }

    pub fn window(&self) -> Duration {
        self.deadline - self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        Instant::now().saturating_duration_since(self.started_at)
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn resolved_at(&self) -> Option<Instant> {
        *lock(&self.resolved_at)
    }

    /// Move from waiting to `to`, exactly once
    ///
    /// Every resolving path (response, deadline, NPC, cancellation) goes
    /// through here. Only the caller that wins the swap gets `true`; it is
    /// then the only one allowed to apply consequences. Pending reminders
    /// and the deadline are cancelled on the way out.
    pub fn resolve(&self, to: ReactionStatus) -> bool {
        if to == ReactionStatus::Waiting {
            return false;
        }
        let won = self
            .status
            .compare_exchange(
                ReactionStatus::Waiting.to_u8(),
                to.to_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        if won {
            *lock(&self.resolved_at) = Some(Instant::now());
            self.cancel_pending();
        }
        won
    }

    /// Track a timer that must die with the window
    pub(crate) fn attach(&self, handle: TimerHandle) {
        lock(&self.pending).push(handle);
        // Resolved between scheduling and attaching
        if !self.is_waiting() {
            self.cancel_pending();
        }
    }

    fn cancel_pending(&self) {
        let handles: Vec<TimerHandle> = lock(&self.pending).drain(..).collect();
        for handle in handles {
            handle.cancel();
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_timers(&self) -> usize {
        lock(&self.pending).iter().filter(|h| h.is_pending()).count()
    }
}

impl std::fmt::Debug for ReactionTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactionTimer")
            .field("action_id", &self.action_id)
            .field("subject", &self.subject.id)
            .field("status", &self.status())
            .field("deadline", &self.deadline)
            .finish()
    }
}
