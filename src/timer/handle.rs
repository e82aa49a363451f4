use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{Callback, TimerScheduler};

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

/// Lifecycle of a single timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Pending,
    Fired,
    Cancelled,
}

/// Handle to a scheduled callback
///
/// Dropping the handle does not cancel the timer.
pub struct TimerHandle {
    scheduler: TimerScheduler,
    callback: Callback,
    state: Arc<AtomicU8>,
    fire_at: Instant,
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub(super) fn arm(scheduler: TimerScheduler, fire_at: Instant, callback: Callback) -> Self {
        let state = Arc::new(AtomicU8::new(PENDING));
        let task = spawn(&scheduler, fire_at, callback.clone(), state.clone());
        Self {
            scheduler,
            callback,
            state,
            fire_at,
            task,
        }
    }

    /// Stop the timer if it has not fired yet
    ///
    /// Returns true when this call prevented the callback from running.
    pub fn cancel(&self) -> bool {
        let prevented = self
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if prevented {
            self.task.abort();
        }
        prevented
    }

    /// Cancel the pending sleep and arm the same callback `delay` from now
    ///
    /// Returns false (and changes nothing) once the timer fired or was
    /// cancelled.
    pub fn reschedule(&mut self, delay: Duration) -> bool {
        if self.state() != TimerState::Pending {
            return false;
        }
        self.task.abort();
        self.fire_at = Instant::now() + delay;
        // The new task shares the state word, so if the old one slipped
        // through before the abort the new one cannot fire again.
        self.task = spawn(
            &self.scheduler,
            self.fire_at,
            self.callback.clone(),
            self.state.clone(),
        );
        true
    }

    pub fn state(&self) -> TimerState {
        match self.state.load(Ordering::SeqCst) {
            PENDING => TimerState::Pending,
            FIRED => TimerState::Fired,
            _ => TimerState::Cancelled,
        }
    }

    pub fn has_fired(&self) -> bool {
        self.state() == TimerState::Fired
    }

    pub fn is_pending(&self) -> bool {
        self.state() == TimerState::Pending
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == TimerState::Cancelled
    }

    /// When the callback is (or was) due
    pub fn fire_at(&self) -> Instant {
        self.fire_at
    }

    /// Time left before firing, zero once due
    pub fn remaining(&self) -> Duration {
        self.fire_at.saturating_duration_since(Instant::now())
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("state", &self.state())
            .field("fire_at", &self.fire_at)
            .finish()
    }
}

fn spawn(
    scheduler: &TimerScheduler,
    fire_at: Instant,
    callback: Callback,
    state: Arc<AtomicU8>,
) -> JoinHandle<()> {
    scheduler.runtime().spawn(async move {
        tokio::time::sleep_until(fire_at).await;
        if state
            .compare_exchange(PENDING, FIRED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            callback();
        }
    })
}
