//! Fixed-interval polling with an attempt budget.
//!
//! A [`PollingScheduler`] runs at most one polling loop. Cancelling stops
//! further checks right away; a check already in flight is left to finish and
//! its result is dropped.

use boxoffice_core::error::BookingError;
use boxoffice_core::polling::{PollOutcome, PollSchedule, PollUpdate, CheckStatus};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Lifecycle of the scheduler's current (or last) run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollerState {
    /// Never started
    Idle,
    /// Probing
    Running,
    /// Delivered its outcome
    Finished,
    /// Stopped by [`PollingScheduler::cancel`] or a restart
    Cancelled,
}

struct PollerInner {
    state: PollerState,
    run: u64,
    wake: Option<Arc<Notify>>,
}

impl PollerInner {
    fn is_current(&self, run: u64) -> bool {
        self.run == run && self.state == PollerState::Running
    }

    fn stop(&mut self, state: PollerState) {
        self.state = state;
        if let Some(wake) = self.wake.take() {
            wake.notify_one();
        }
    }
}

fn lock(inner: &Mutex<PollerInner>) -> MutexGuard<'_, PollerInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single-slot polling scheduler
///
/// Must be started from within a Tokio runtime.
pub struct PollingScheduler {
    inner: Arc<Mutex<PollerInner>>,
}

impl PollingScheduler {
    /// An idle scheduler
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(PollerInner {
                state: PollerState::Idle,
                run: 0,
                wake: None,
            })),
        }
    }

    /// Start polling with `check`, cancelling any previous run
    ///
    /// Each attempt's result is classified as follows:
    ///
    /// - `Done` ends the run with [`PollOutcome::Completed`]
    /// - `Pending` is reported through `on_update`
    /// - a retryable error (see [`BookingError::is_retryable_while_polling`]) is
    ///   reported through `on_update` as [`PollUpdate::Retrying`]
    /// - any other error ends the run with [`PollOutcome::Failed`]
    ///
    /// Once the schedule's attempt budget is spent without a final answer the
    /// run ends with [`PollOutcome::Exhausted`]. `on_done` fires at most once
    /// and never after [`cancel`](Self::cancel) has returned.
    pub fn start<T, P, F, U, D>(&self, schedule: PollSchedule, mut check: P, on_update: U, on_done: D)
    where
        T: Send + 'static,
        P: FnMut() -> F + Send + 'static,
        F: Future<Output = Result<CheckStatus<T>, BookingError>> + Send + 'static,
        U: Fn(PollUpdate<T>) + Send + 'static,
        D: FnOnce(PollOutcome<T>) + Send + 'static,
    {
        let wake = Arc::new(Notify::new());
        let run = {
            let mut inner = lock(&self.inner);
            if inner.state == PollerState::Running {
                inner.stop(PollerState::Cancelled);
            }
            inner.run = inner.run.wrapping_add(1);
            inner.state = PollerState::Running;
            inner.wake = Some(Arc::clone(&wake));
            inner.run
        };

        tracing::debug!(
            run,
            interval_ms = u64::try_from(schedule.interval.as_millis()).unwrap_or(u64::MAX),
            max_attempts = ?schedule.max_attempts,
            "Polling started"
        );

        let shared = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if !schedule.immediate {
                tokio::select! {
                    () = tokio::time::sleep(schedule.interval) => {},
                    () = wake.notified() => return,
                }
            }

            let mut attempt: u32 = 0;
            loop {
                if !lock(&shared).is_current(run) {
                    return;
                }
                attempt = attempt.saturating_add(1);
                tracing::debug!(run, attempt, "Polling attempt");
                let result = check().await;

                {
                    let mut inner = lock(&shared);
                    if !inner.is_current(run) {
                        tracing::debug!(run, attempt, "Discarding check result of a cancelled run");
                        return;
                    }
                    let exhausted = schedule.is_exhausted(attempt);
                    let outcome = match result {
                        Ok(CheckStatus::Done(value)) => Some(PollOutcome::Completed {
                            attempts: attempt,
                            value,
                        }),
                        Ok(CheckStatus::Pending(_)) if exhausted => Some(PollOutcome::Exhausted {
                            attempts: attempt,
                            last_error: None,
                        }),
                        Ok(CheckStatus::Pending(value)) => {
                            on_update(PollUpdate::Pending { attempt, value });
                            None
                        },
                        Err(error) if !error.is_retryable_while_polling() => {
                            Some(PollOutcome::Failed {
                                attempts: attempt,
                                error,
                            })
                        },
                        Err(error) if exhausted => Some(PollOutcome::Exhausted {
                            attempts: attempt,
                            last_error: Some(error),
                        }),
                        Err(error) => {
                            tracing::warn!(run, attempt, %error, "Check failed, will retry");
                            on_update(PollUpdate::Retrying { attempt, error });
                            None
                        },
                    };

                    if let Some(outcome) = outcome {
                        inner.state = PollerState::Finished;
                        inner.wake = None;
                        tracing::debug!(run, attempts = attempt, "Polling finished");
                        on_done(outcome);
                        return;
                    }
                }

                tokio::select! {
                    () = tokio::time::sleep(schedule.interval) => {},
                    () = wake.notified() => return,
                }
            }
        });
    }

    /// Stop polling
    ///
    /// Idempotent, and a no-op when nothing runs.
    pub fn cancel(&self) {
        let mut inner = lock(&self.inner);
        if inner.state == PollerState::Running {
            inner.stop(PollerState::Cancelled);
            tracing::debug!(run = inner.run, "Polling cancelled");
        }
    }

    /// State of the current (or last) run
    #[must_use]
    pub fn state(&self) -> PollerState {
        lock(&self.inner).state
    }

    /// Whether a polling loop is active
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == PollerState::Running
    }
}

impl Default for PollingScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    type Outcomes = Arc<Mutex<Vec<PollOutcome<u32>>>>;
    type Updates = Arc<Mutex<Vec<PollUpdate<u32>>>>;

    fn schedule(max_attempts: Option<u32>) -> PollSchedule {
        PollSchedule {
            interval: Duration::from_secs(2),
            max_attempts,
            immediate: true,
        }
    }

    fn sinks() -> (Updates, Outcomes) {
        (Arc::default(), Arc::default())
    }

    fn start_counting<P>(
        scheduler: &PollingScheduler,
        schedule: PollSchedule,
        calls: Arc<AtomicU32>,
        answer: P,
        updates: &Updates,
        outcomes: &Outcomes,
    ) where
        P: Fn(u32) -> Result<CheckStatus<u32>, BookingError> + Send + Sync + 'static,
    {
        let answer = Arc::new(answer);
        let updates = Arc::clone(updates);
        let outcomes = Arc::clone(outcomes);
        scheduler.start(
            schedule,
            move || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                let answer = Arc::clone(&answer);
                async move { answer(n) }
            },
            move |update| updates.lock().unwrap().push(update),
            move |outcome| outcomes.lock().unwrap().push(outcome),
        );
    }

    #[tokio::test(start_paused = true)]
    async fn completes_when_check_reports_done() {
        let scheduler = PollingScheduler::new();
        let calls = Arc::new(AtomicU32::new(0));
        let (updates, outcomes) = sinks();
        start_counting(
            &scheduler,
            schedule(None),
            Arc::clone(&calls),
            |n| Ok(if n < 4 { CheckStatus::Pending(n) } else { CheckStatus::Done(n) }),
            &updates,
            &outcomes,
        );

        tokio::time::sleep(Duration::from_secs(7)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(updates.lock().unwrap().len(), 3);
        assert_eq!(
            *outcomes.lock().unwrap(),
            vec![PollOutcome::Completed {
                attempts: 4,
                value: 4
            }]
        );
        assert_eq!(scheduler.state(), PollerState::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_retries_until_budget_is_spent() {
        let scheduler = PollingScheduler::new();
        let calls = Arc::new(AtomicU32::new(0));
        let (updates, outcomes) = sinks();
        start_counting(
            &scheduler,
            schedule(Some(10)),
            Arc::clone(&calls),
            |_| Err(BookingError::NotFound("H1".to_string())),
            &updates,
            &outcomes,
        );

        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 10);
        assert_eq!(updates.lock().unwrap().len(), 9);
        assert!(matches!(
            outcomes.lock().unwrap().as_slice(),
            [PollOutcome::Exhausted {
                attempts: 10,
                last_error: Some(BookingError::NotFound(_))
            }]
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_fails_immediately() {
        let scheduler = PollingScheduler::new();
        let calls = Arc::new(AtomicU32::new(0));
        let (updates, outcomes) = sinks();
        start_counting(
            &scheduler,
            schedule(Some(10)),
            Arc::clone(&calls),
            |_| Err(BookingError::UnexpectedResponse("garbage".to_string())),
            &updates,
            &outcomes,
        );

        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(updates.lock().unwrap().is_empty());
        assert!(matches!(
            outcomes.lock().unwrap().as_slice(),
            [PollOutcome::Failed { attempts: 1, .. }]
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_probing_and_is_idempotent() {
        let scheduler = PollingScheduler::new();
        let calls = Arc::new(AtomicU32::new(0));
        let (updates, outcomes) = sinks();
        start_counting(
            &scheduler,
            schedule(None),
            Arc::clone(&calls),
            |n| Ok(CheckStatus::Pending(n)),
            &updates,
            &outcomes,
        );

        tokio::time::sleep(Duration::from_secs(3)).await;
        scheduler.cancel();
        scheduler.cancel();
        let seen = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(seen, 2);
        assert_eq!(calls.load(Ordering::SeqCst), seen);
        assert!(outcomes.lock().unwrap().is_empty());
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_result_is_discarded_after_cancel() {
        let scheduler = PollingScheduler::new();
        let outcomes: Outcomes = Arc::default();
        let sink = Arc::clone(&outcomes);
        scheduler.start(
            schedule(None),
            || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(CheckStatus::Done(1_u32))
            },
            |_| {},
            move |outcome| sink.lock().unwrap().push(outcome),
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        scheduler.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(outcomes.lock().unwrap().is_empty());
        assert_eq!(scheduler.state(), PollerState::Cancelled);
    }
}
