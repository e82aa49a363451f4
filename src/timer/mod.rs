//! Cancellable one-shot timers
//!
//! Every delayed step of the combat core (immobilization expiry, streak
//! reset, reaction reminders and deadlines, NPC counter-reactions) is a
//! [`TimerHandle`] obtained from a [`TimerScheduler`]. Each timer is its own
//! tokio task sleeping on the tokio clock, so tests can drive them with a
//! paused clock.
//!
//! A timer fires at most once. Cancelling a timer that already fired is a
//! no-op, and rescheduling cancels the pending sleep before arming a new one
//! so a stale deadline can never fire alongside the new one.

mod handle;

pub use handle::{TimerHandle, TimerState};

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::Instant;

use crate::core::error::{CombatError, Result};

/// Callback run when a timer fires
///
/// Callbacks must not block: they run on the runtime's worker threads.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Spawns timers on a tokio runtime
#[derive(Clone, Debug)]
pub struct TimerScheduler {
    runtime: Handle,
}

impl TimerScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Scheduler bound to the runtime the caller is running on
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| CombatError::NoRuntime)
    }

    /// Run `callback` once, `delay` from now
    pub fn schedule<F>(&self, delay: Duration, callback: F) -> TimerHandle
    where
        F: Fn() + Send + Sync + 'static,
    {
        TimerHandle::arm(self.clone(), Instant::now() + delay, Arc::new(callback))
    }

    pub(crate) fn runtime(&self) -> &Handle {
        &self.runtime
    }
}
