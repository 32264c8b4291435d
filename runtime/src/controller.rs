//! The booking session controller.
//!
//! A [`SessionController`] owns one [`BookingSession`], one [`CountdownTimer`]
//! and one [`PollingScheduler`]. Every input (host command, API result, tick,
//! check result) goes through a single mailbox and is applied by one event
//! loop, strictly one action at a time.
//!
//! # Same-tick ordering
//!
//! When the loop dequeues a countdown expiry it first yields to the scheduler,
//! then takes everything already queued and applies the expiry after the rest
//! of that batch. A payment or booking outcome that lands in the same tick as
//! the hold window closing therefore wins over the timeout.

use crate::countdown::CountdownTimer;
use crate::error::ControllerError;
use crate::metrics::{
    ACTIONS, EFFECTS_EXECUTED, PHASE_TRANSITIONS, REJECTED_COMMANDS, REMAINING_SECONDS,
    STALE_RESULTS,
};
use crate::poller::PollingScheduler;
use boxoffice_core::effect::Effect;
use boxoffice_core::reducer::Reducer;
use boxoffice_core::session::{
    BookingSession, Phase, SessionAction, SessionEnvironment, SessionReducer,
};
use boxoffice_core::types::HoldRequest;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Callback invoked after every phase change
pub type PhaseObserver = Box<dyn Fn(Phase, &BookingSession) + Send + Sync>;

type Ack = oneshot::Sender<Result<BookingSession, ControllerError>>;

/// Mailbox entry: an action plus, for host commands, where to report the result
struct Envelope {
    action: SessionAction,
    ack: Option<Ack>,
}

/// Sender half handed to effects, the timer and the poller
#[derive(Clone)]
struct Mailbox(mpsc::UnboundedSender<Envelope>);

impl Mailbox {
    fn feed(&self, action: SessionAction) {
        if self.0.send(Envelope { action, ack: None }).is_err() {
            tracing::trace!("Session loop stopped, dropping feedback action");
        }
    }
}

/// Drives one booking session
///
/// Create one controller per session. Dropping it stops the countdown, the
/// poller and the event loop.
///
/// # Example
///
/// ```ignore
/// let controller = SessionController::new(env);
/// controller.submit_hold(request).await?;
/// let session = controller
///     .wait_for_phase(|phase| phase != Phase::HoldRequested, Duration::from_secs(15))
///     .await?;
/// if session.phase == Phase::AwaitingPayment {
///     controller.confirm_payment_sent().await?;
/// }
/// let done = controller.wait_until_terminal(Duration::from_secs(300)).await?;
/// ```
pub struct SessionController {
    mailbox: Mailbox,
    snapshots: watch::Receiver<BookingSession>,
    observers: Arc<Mutex<Vec<PhaseObserver>>>,
    timer: Arc<CountdownTimer>,
    poller: Arc<PollingScheduler>,
    event_loop: JoinHandle<()>,
}

impl SessionController {
    /// Start a controller with a fresh, idle session
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(env: SessionEnvironment) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshots) = watch::channel(BookingSession::new());
        let mailbox = Mailbox(tx);
        let observers: Arc<Mutex<Vec<PhaseObserver>>> = Arc::default();
        let timer = Arc::new(CountdownTimer::new());
        let poller = Arc::new(PollingScheduler::new());

        let event_loop = EventLoop {
            session: BookingSession::new(),
            reducer: SessionReducer::new(),
            env,
            mailbox: mailbox.clone(),
            snapshots: snapshot_tx,
            observers: Arc::clone(&observers),
            timer: Arc::clone(&timer),
            poller: Arc::clone(&poller),
        };

        Self {
            mailbox,
            snapshots,
            observers,
            timer,
            poller,
            event_loop: tokio::spawn(event_loop.run(rx)),
        }
    }

    /// Submit the seat hold
    ///
    /// Resolves once the request is accepted (`HoldRequested`) or rejected by
    /// local validation (`Failed`); follow the outcome with
    /// [`wait_for_phase`](Self::wait_for_phase).
    ///
    /// # Errors
    ///
    /// [`ControllerError::InvalidTransition`] unless the session is `Idle`.
    #[tracing::instrument(skip(self, request), fields(show_id = request.show_id))]
    pub async fn submit_hold(&self, request: HoldRequest) -> Result<BookingSession, ControllerError> {
        self.command(SessionAction::SubmitHold { request }).await
    }

    /// Report that the customer has paid; starts payment-status polling
    ///
    /// # Errors
    ///
    /// [`ControllerError::InvalidTransition`] unless the session is `AwaitingPayment`.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_payment_sent(&self) -> Result<BookingSession, ControllerError> {
        self.command(SessionAction::ConfirmPaymentSent).await
    }

    /// Abandon the session: stops the timer and the poller and ends in `Failed`
    ///
    /// Calling it on a finished session is harmless and returns the session
    /// unchanged.
    ///
    /// # Errors
    ///
    /// [`ControllerError::ChannelClosed`] if the event loop is gone.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_session(&self) -> Result<BookingSession, ControllerError> {
        match self.command(SessionAction::cancel_by_user()).await {
            Err(ControllerError::InvalidTransition { .. }) => Ok(self.session()),
            result => result,
        }
    }

    /// Snapshot of the session
    #[must_use]
    pub fn session(&self) -> BookingSession {
        self.snapshots.borrow().clone()
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.snapshots.borrow().phase
    }

    /// Receiver that sees every published snapshot
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BookingSession> {
        self.snapshots.clone()
    }

    /// Register a callback for phase changes
    ///
    /// Callbacks run on the event loop right after the change is applied and
    /// must not block. Registering from inside a callback deadlocks.
    pub fn on_phase_change<F>(&self, callback: F)
    where
        F: Fn(Phase, &BookingSession) + Send + Sync + 'static,
    {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(callback));
    }

    /// Wait until the phase satisfies `predicate`
    ///
    /// # Errors
    ///
    /// [`ControllerError::Timeout`] when `timeout` elapses first,
    /// [`ControllerError::ChannelClosed`] if the event loop is gone.
    pub async fn wait_for_phase<P>(
        &self,
        predicate: P,
        timeout: Duration,
    ) -> Result<BookingSession, ControllerError>
    where
        P: Fn(Phase) -> bool,
    {
        let mut snapshots = self.subscribe();
        let wait = snapshots.wait_for(|session| predicate(session.phase));
        match tokio::time::timeout(timeout, wait).await {
            Ok(Ok(session)) => Ok(session.clone()),
            Ok(Err(_)) => Err(ControllerError::ChannelClosed),
            Err(_) => Err(ControllerError::Timeout(timeout)),
        }
    }

    /// Wait until the session reaches a terminal phase
    ///
    /// # Errors
    ///
    /// Same as [`wait_for_phase`](Self::wait_for_phase).
    pub async fn wait_until_terminal(
        &self,
        timeout: Duration,
    ) -> Result<BookingSession, ControllerError> {
        self.wait_for_phase(Phase::is_terminal, timeout).await
    }

    /// Whether the hold-window countdown is running
    #[must_use]
    pub fn timer_running(&self) -> bool {
        self.timer.is_running()
    }

    /// Whether the polling scheduler is running
    #[must_use]
    pub fn poller_running(&self) -> bool {
        self.poller.is_running()
    }

    async fn command(&self, action: SessionAction) -> Result<BookingSession, ControllerError> {
        let (ack, reply) = oneshot::channel();
        self.mailbox
            .0
            .send(Envelope {
                action,
                ack: Some(ack),
            })
            .map_err(|_| ControllerError::ChannelClosed)?;
        reply.await.map_err(|_| ControllerError::ChannelClosed)?
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.timer.cancel();
        self.poller.cancel();
        self.event_loop.abort();
    }
}

/// State owned by the event loop task
struct EventLoop {
    session: BookingSession,
    reducer: SessionReducer,
    env: SessionEnvironment,
    mailbox: Mailbox,
    snapshots: watch::Sender<BookingSession>,
    observers: Arc<Mutex<Vec<PhaseObserver>>>,
    timer: Arc<CountdownTimer>,
    poller: Arc<PollingScheduler>,
}

impl EventLoop {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Envelope>) {
        while let Some(envelope) = rx.recv().await {
            if !envelope.action.is_countdown_expiry() {
                self.handle(envelope);
                continue;
            }

            // Let work that became ready in the same tick reach the mailbox
            tokio::task::yield_now().await;
            let mut expiries = vec![envelope];
            while let Ok(next) = rx.try_recv() {
                if next.action.is_countdown_expiry() {
                    expiries.push(next);
                } else {
                    self.handle(next);
                }
            }
            for expiry in expiries {
                self.handle(expiry);
            }
        }
        tracing::debug!("Session loop stopped");
    }

    fn handle(&mut self, envelope: Envelope) {
        let Envelope { action, ack } = envelope;
        let result = self.apply(action);
        if let Some(ack) = ack {
            // The host may have stopped waiting
            let _ = ack.send(result);
        }
    }

    fn apply(&mut self, action: SessionAction) -> Result<BookingSession, ControllerError> {
        let from = self.session.phase;
        let name = action.name();

        if !action.is_accepted_in(from) {
            metrics::counter!(REJECTED_COMMANDS, "action" => name).increment(1);
            tracing::warn!(action = name, phase = %from, "Command not accepted in current phase");
            return Err(ControllerError::InvalidTransition {
                action: name,
                phase: from,
            });
        }

        if self.session.is_stale(&action) {
            metrics::counter!(STALE_RESULTS, "action" => name).increment(1);
            tracing::debug!(action = name, "Discarding result of a superseded timer or poller run");
            return Ok(self.session.clone());
        }

        metrics::counter!(ACTIONS, "action" => name).increment(1);
        if let SessionAction::TicketFetched { result: Err(error), .. } = &action {
            tracing::warn!(%error, "Ticket lookup failed after confirmation");
        }

        let effects = self.reducer.reduce(&mut self.session, action, &self.env);
        for effect in effects {
            self.execute(effect);
        }

        let to = self.session.phase;
        let snapshot = self.session.clone();
        if to != from {
            metrics::counter!(PHASE_TRANSITIONS, "phase" => to.as_str()).increment(1);
            tracing::info!(
                hold_id = ?snapshot.hold_id.as_ref().map(ToString::to_string),
                from = %from,
                to = %to,
                last_error = ?snapshot.last_error,
                "Booking session phase changed"
            );
        } else {
            tracing::trace!(action = name, phase = %to, "Action applied");
        }
        if name == "countdown_ticked" {
            metrics::gauge!(REMAINING_SECONDS).set(f64::from(snapshot.remaining_seconds));
        }

        self.snapshots.send_replace(snapshot.clone());
        if to != from {
            let observers = self.observers.lock().unwrap_or_else(PoisonError::into_inner);
            for observer in observers.iter() {
                observer(to, &snapshot);
            }
        }
        Ok(snapshot)
    }

    fn execute(&self, effect: Effect<SessionAction>) {
        metrics::counter!(EFFECTS_EXECUTED, "type" => effect.kind()).increment(1);
        match effect {
            Effect::None => {},
            Effect::Parallel(effects) => {
                for effect in effects {
                    self.execute(effect);
                }
            },
            Effect::Future(fut) => {
                let mailbox = self.mailbox.clone();
                tokio::spawn(async move {
                    if let Some(action) = fut.await {
                        mailbox.feed(action);
                    }
                });
            },
            Effect::StartCountdown { seconds, epoch } => {
                let on_tick = self.mailbox.clone();
                let on_expire = self.mailbox.clone();
                self.timer.start(
                    seconds,
                    move |remaining| on_tick.feed(SessionAction::CountdownTicked { epoch, remaining }),
                    move || on_expire.feed(SessionAction::CountdownExpired { epoch }),
                );
            },
            Effect::CancelCountdown => self.timer.cancel(),
            Effect::StartPolling {
                target,
                schedule,
                epoch,
            } => {
                tracing::debug!(poll = target.kind(), %epoch, "Starting poller");
                let api = Arc::clone(&self.env.api);
                let on_update = self.mailbox.clone();
                let on_done = self.mailbox.clone();
                self.poller.start(
                    schedule,
                    move || target.check(Arc::clone(&api)),
                    move |update| on_update.feed(SessionAction::PollUpdated { epoch, update }),
                    move |outcome| on_done.feed(SessionAction::PollFinished { epoch, outcome }),
                );
            },
            Effect::CancelPolling => self.poller.cancel(),
        }
    }
}
