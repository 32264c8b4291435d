//! Cancellable one-second countdown.
//!
//! A [`CountdownTimer`] drives at most one countdown at a time. Starting it
//! again cancels the running countdown first, and once [`CountdownTimer::cancel`]
//! returns no callback of the cancelled run fires.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Lifecycle of the timer's current (or last) run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerState {
    /// Never started
    Idle,
    /// Counting down
    Running,
    /// Reached zero and fired `on_expire`
    Expired,
    /// Stopped before reaching zero
    Cancelled,
}

struct TimerInner {
    state: TimerState,
    run: u64,
    handle: Option<JoinHandle<()>>,
}

/// Single-slot countdown timer
///
/// Must be started from within a Tokio runtime.
pub struct CountdownTimer {
    inner: Arc<Mutex<TimerInner>>,
}

fn lock(inner: &Mutex<TimerInner>) -> MutexGuard<'_, TimerInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CountdownTimer {
    /// An idle timer
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(TimerInner {
                state: TimerState::Idle,
                run: 0,
                handle: None,
            })),
        }
    }

    /// Count down from `seconds`, one tick per second
    ///
    /// `on_tick` receives the seconds left after each elapsed second while
    /// time remains; `on_expire` fires exactly once when zero is reached.
    /// A zero-length countdown expires on the next scheduler turn.
    pub fn start<T, X>(&self, seconds: u32, on_tick: T, on_expire: X)
    where
        T: Fn(u32) + Send + 'static,
        X: FnOnce() + Send + 'static,
    {
        let mut inner = lock(&self.inner);
        if let Some(previous) = inner.handle.take() {
            previous.abort();
        }
        inner.run = inner.run.wrapping_add(1);
        inner.state = TimerState::Running;
        let run = inner.run;

        tracing::debug!(seconds, run, "Countdown started");

        let shared = Arc::clone(&self.inner);
        inner.handle = Some(tokio::spawn(async move {
            let period = Duration::from_secs(1);
            let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Burst);

            let mut remaining = seconds;
            while remaining > 0 {
                ticks.tick().await;
                remaining -= 1;
                if remaining == 0 {
                    break;
                }
                let inner = lock(&shared);
                if inner.run != run || inner.state != TimerState::Running {
                    return;
                }
                on_tick(remaining);
            }

            let mut inner = lock(&shared);
            if inner.run != run || inner.state != TimerState::Running {
                return;
            }
            inner.state = TimerState::Expired;
            inner.handle = None;
            tracing::debug!(run, "Countdown expired");
            on_expire();
        }));
    }

    /// Stop the countdown
    ///
    /// Idempotent, and a no-op when nothing runs.
    pub fn cancel(&self) {
        let mut inner = lock(&self.inner);
        if let Some(handle) = inner.handle.take() {
            handle.abort();
        }
        if inner.state == TimerState::Running {
            inner.run = inner.run.wrapping_add(1);
            inner.state = TimerState::Cancelled;
            tracing::debug!("Countdown cancelled");
        }
    }

    /// State of the current (or last) run
    #[must_use]
    pub fn state(&self) -> TimerState {
        lock(&self.inner).state
    }

    /// Whether a countdown is in progress
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == TimerState::Running
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
