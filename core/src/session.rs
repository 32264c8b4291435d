//! Booking session state machine.
//!
//! ```text
//! Idle ─submit─▶ HoldRequested ─hold with address──▶ AwaitingPayment ─confirm─▶ Polling (payment)
//!                      │        └─hold without address─────────────────────────▶ Polling (booking)
//!                      └─rejected─▶ Failed
//! Polling ─settled─▶ Confirmed | Failed      countdown expiry / attempt budget ─▶ TimedOut
//! any non-terminal ─cancel─▶ Failed
//! ```
//!
//! The reducer only describes work. Timer and poller results carry the
//! [`Epoch`] they were started with; anything stamped with a superseded epoch is
//! dropped without touching the session.

use crate::api::BookingApi;
use crate::effect::{Effect, Epoch};
use crate::environment::Clock;
use crate::error::BookingError;
use crate::polling::{PollOutcome, PollReport, PollSchedule, PollTarget, PollUpdate};
use crate::reducer::Reducer;
use crate::types::{
    BookingRecord, BookingStatus, HoldId, HoldRequest, HoldResult, PaymentInstructions,
    PaymentStatus,
};
use crate::{SmallVec, smallvec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Reason recorded when the host cancels a session
pub const CANCELLED_BY_USER: &str = "Cancelled by user";

/// Reason recorded when the hold window closes
pub const HOLD_WINDOW_EXPIRED: &str = "Time expired! Please try booking again.";

/// Default hold window in seconds
pub const DEFAULT_HOLD_WINDOW_SECS: u32 = 300;

// ============================================================================
// State
// ============================================================================

/// Where a session is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Nothing submitted yet
    Idle,
    /// Hold request in flight
    HoldRequested,
    /// Hold placed; waiting for the customer to pay
    AwaitingPayment,
    /// Probing payment status or booking lookup
    Polling,
    /// Booking confirmed
    Confirmed,
    /// Rejected, failed or cancelled
    Failed,
    /// Hold window closed or polling budget spent
    TimedOut,
}

impl Phase {
    /// Terminal phases never change again
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed | Self::TimedOut)
    }

    /// Stable label for logs and metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::HoldRequested => "hold_requested",
            Self::AwaitingPayment => "awaiting_payment",
            Self::Polling => "polling",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one booking session
///
/// Owned by a single controller. Hosts read snapshots of it; only
/// [`SessionReducer`] mutates it.
#[derive(Clone, Debug, PartialEq)]
pub struct BookingSession {
    /// Server hold id, once the hold is placed
    pub hold_id: Option<HoldId>,
    /// Current phase
    pub phase: Phase,
    /// Seconds left in the hold window (0 when no countdown runs)
    pub remaining_seconds: u32,
    /// Human-readable reason of the latest failure
    pub last_error: Option<String>,
    /// The submitted request
    pub request: Option<HoldRequest>,
    /// Payment step details, when the hold needs one
    pub payment: Option<PaymentInstructions>,
    /// Latest booking record seen
    pub booking: Option<BookingRecord>,
    /// Checks issued by the current polling run
    pub poll_attempts: u32,
    /// When the hold was submitted
    pub started_at: Option<DateTime<Utc>>,
    /// When the session reached its terminal phase
    pub finished_at: Option<DateTime<Utc>>,
    countdown_epoch: Epoch,
    polling_epoch: Epoch,
}

impl BookingSession {
    /// A fresh, idle session
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hold_id: None,
            phase: Phase::Idle,
            remaining_seconds: 0,
            last_error: None,
            request: None,
            payment: None,
            booking: None,
            poll_attempts: 0,
            started_at: None,
            finished_at: None,
            countdown_epoch: Epoch::initial(),
            polling_epoch: Epoch::initial(),
        }
    }

    /// Whether the session has finished
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Epoch of the current (or last) countdown
    #[must_use]
    pub const fn countdown_epoch(&self) -> Epoch {
        self.countdown_epoch
    }

    /// Epoch of the current (or last) polling run
    #[must_use]
    pub const fn polling_epoch(&self) -> Epoch {
        self.polling_epoch
    }

    /// Whether the session waits on a payment step
    #[must_use]
    pub const fn requires_payment(&self) -> bool {
        self.payment.is_some()
    }

    /// Whether `action` comes from a superseded timer or poller run
    #[must_use]
    pub fn is_stale(&self, action: &SessionAction) -> bool {
        match action {
            SessionAction::CountdownTicked { epoch, .. }
            | SessionAction::CountdownExpired { epoch } => *epoch != self.countdown_epoch,
            SessionAction::PollUpdated { epoch, .. } | SessionAction::PollFinished { epoch, .. } => {
                *epoch != self.polling_epoch
            },
            _ => false,
        }
    }
}

impl Default for BookingSession {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Every input a booking session reacts to
#[derive(Clone, Debug, PartialEq)]
pub enum SessionAction {
    // Host commands
    /// Submit the seat hold (valid from `Idle` only)
    SubmitHold {
        /// Seats to hold
        request: HoldRequest,
    },

    /// The customer reports having paid (valid from `AwaitingPayment` only)
    ConfirmPaymentSent,

    /// Abandon the session (valid from any non-terminal phase)
    Cancel {
        /// Recorded as the session's `last_error`
        reason: String,
    },

    // API results
    /// The hold was placed
    HoldPlaced {
        /// Server answer
        result: HoldResult,
    },

    /// The hold request failed
    HoldRejected {
        /// Classified failure
        error: BookingError,
    },

    /// Ticket lookup after a confirmed payment finished
    TicketFetched {
        /// Hold the lookup was made for
        hold_id: HoldId,
        /// Lookup result
        result: Result<BookingRecord, BookingError>,
    },

    // Timer
    /// One second of the hold window elapsed
    CountdownTicked {
        /// Countdown run that produced the tick
        epoch: Epoch,
        /// Seconds left
        remaining: u32,
    },

    /// The hold window closed
    CountdownExpired {
        /// Countdown run that expired
        epoch: Epoch,
    },

    // Poller
    /// A check answered without settling anything
    PollUpdated {
        /// Polling run that produced the update
        epoch: Epoch,
        /// What the check saw
        update: PollUpdate<PollReport>,
    },

    /// A polling run ended on its own
    PollFinished {
        /// Polling run that ended
        epoch: Epoch,
        /// How it ended
        outcome: PollOutcome<PollReport>,
    },
}

impl SessionAction {
    /// Cancellation requested by the customer
    #[must_use]
    pub fn cancel_by_user() -> Self {
        Self::Cancel {
            reason: CANCELLED_BY_USER.to_string(),
        }
    }

    /// Variant name for logs and metrics
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SubmitHold { .. } => "submit_hold",
            Self::ConfirmPaymentSent => "confirm_payment_sent",
            Self::Cancel { .. } => "cancel",
            Self::HoldPlaced { .. } => "hold_placed",
            Self::HoldRejected { .. } => "hold_rejected",
            Self::TicketFetched { .. } => "ticket_fetched",
            Self::CountdownTicked { .. } => "countdown_ticked",
            Self::CountdownExpired { .. } => "countdown_expired",
            Self::PollUpdated { .. } => "poll_updated",
            Self::PollFinished { .. } => "poll_finished",
        }
    }

    /// Countdown expiries yield to every other action arriving in the same tick
    #[must_use]
    pub const fn is_countdown_expiry(&self) -> bool {
        matches!(self, Self::CountdownExpired { .. })
    }

    /// Whether `phase` accepts this action as a host command
    ///
    /// Non-command actions are always accepted; the reducer decides what they mean.
    #[must_use]
    pub const fn is_accepted_in(&self, phase: Phase) -> bool {
        match self {
            Self::SubmitHold { .. } => matches!(phase, Phase::Idle),
            Self::ConfirmPaymentSent => matches!(phase, Phase::AwaitingPayment),
            Self::Cancel { .. } => !phase.is_terminal(),
            _ => true,
        }
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Tunables of a session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSettings {
    /// Hold window length in seconds
    pub hold_window_secs: u32,
    /// Schedule for booking lookups (holds without a payment step)
    pub booking_poll: PollSchedule,
    /// Schedule for payment-status checks
    pub payment_poll: PollSchedule,
    /// Fetch the booking record once a payment succeeds
    pub fetch_ticket_on_confirm: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            hold_window_secs: DEFAULT_HOLD_WINDOW_SECS,
            booking_poll: PollSchedule::booking_lookup(),
            payment_poll: PollSchedule::payment_status(),
            fetch_ticket_on_confirm: true,
        }
    }
}

/// Collaborators injected into the session reducer
#[derive(Clone)]
pub struct SessionEnvironment {
    /// Booking API
    pub api: Arc<dyn BookingApi>,
    /// Clock for session timestamps
    pub clock: Arc<dyn Clock>,
    /// Tunables
    pub settings: SessionSettings,
}

impl SessionEnvironment {
    /// Environment with default settings
    #[must_use]
    pub fn new(api: Arc<dyn BookingApi>, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            clock,
            settings: SessionSettings::default(),
        }
    }

    /// Replace the settings
    #[must_use]
    pub const fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl fmt::Debug for SessionEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionEnvironment")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Pure transition function of a booking session
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionReducer;

type Effects = SmallVec<[Effect<SessionAction>; 4]>;

impl SessionReducer {
    /// Creates the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Enter a terminal phase and stop whatever still runs
    fn finish(
        state: &mut BookingSession,
        phase: Phase,
        error: Option<String>,
        env: &SessionEnvironment,
    ) -> Effects {
        state.phase = phase;
        if error.is_some() {
            state.last_error = error;
        }
        if phase == Phase::TimedOut {
            state.remaining_seconds = 0;
        }
        state.finished_at = Some(env.clock.now());
        smallvec![Effect::CancelCountdown, Effect::CancelPolling]
    }

    fn start_polling(
        state: &mut BookingSession,
        target: PollTarget,
        schedule: PollSchedule,
    ) -> Effect<SessionAction> {
        state.phase = Phase::Polling;
        state.poll_attempts = 0;
        state.polling_epoch = state.polling_epoch.next();
        Effect::StartPolling {
            target,
            schedule,
            epoch: state.polling_epoch,
        }
    }

    fn request_hold(request: HoldRequest, env: &SessionEnvironment) -> Effect<SessionAction> {
        let api = Arc::clone(&env.api);
        Effect::Future(Box::pin(async move {
            Some(match api.request_hold(request).await {
                Ok(result) => SessionAction::HoldPlaced { result },
                Err(error) => SessionAction::HoldRejected { error },
            })
        }))
    }

    fn fetch_ticket(hold_id: HoldId, env: &SessionEnvironment) -> Effect<SessionAction> {
        let api = Arc::clone(&env.api);
        Effect::Future(Box::pin(async move {
            let result = api.fetch_booking(hold_id.clone()).await;
            Some(SessionAction::TicketFetched { hold_id, result })
        }))
    }

    fn on_hold_placed(
        state: &mut BookingSession,
        result: HoldResult,
        env: &SessionEnvironment,
    ) -> Effects {
        if result.hold_id.is_blank() {
            let error = BookingError::UnexpectedResponse("hold response has no holdId".to_string());
            return Self::finish(state, Phase::Failed, Some(error.to_string()), env);
        }

        let fallback = state
            .request
            .as_ref()
            .map(|request| request.payment_method);
        let instructions = fallback.and_then(|method| result.payment_instructions(method));
        let hold_id = result.hold_id;
        state.hold_id = Some(hold_id.clone());

        match instructions {
            Some(payment) => {
                state.phase = Phase::AwaitingPayment;
                state.payment = Some(payment);
                state.remaining_seconds = env.settings.hold_window_secs;
                state.countdown_epoch = state.countdown_epoch.next();
                smallvec![Effect::StartCountdown {
                    seconds: env.settings.hold_window_secs,
                    epoch: state.countdown_epoch,
                }]
            },
            None => smallvec![Self::start_polling(
                state,
                PollTarget::Booking(hold_id),
                env.settings.booking_poll,
            )],
        }
    }

    fn on_poll_update(state: &mut BookingSession, update: PollUpdate<PollReport>) {
        state.poll_attempts = update.attempt();
        match update {
            PollUpdate::Pending {
                value: PollReport::Payment(PaymentStatus::Failed { message, .. }),
                ..
            } => state.last_error = Some(message),
            PollUpdate::Pending {
                value: PollReport::Payment(_),
                ..
            } => state.last_error = None,
            PollUpdate::Pending {
                value: PollReport::Booking(record),
                ..
            } => {
                state.booking = Some(record);
                state.last_error = None;
            },
            PollUpdate::Retrying { error, .. } => state.last_error = Some(error.to_string()),
        }
    }

    fn on_poll_finished(
        state: &mut BookingSession,
        outcome: PollOutcome<PollReport>,
        env: &SessionEnvironment,
    ) -> Effects {
        state.poll_attempts = outcome.attempts();
        match outcome {
            PollOutcome::Completed {
                value: PollReport::Payment(PaymentStatus::Success),
                ..
            } => {
                let stop = Self::finish(state, Phase::Confirmed, None, env);
                state.last_error = None;
                match state.hold_id.clone() {
                    // Teardown and the ticket lookup run side by side
                    Some(hold_id) if env.settings.fetch_ticket_on_confirm => smallvec![
                        Effect::merge(stop.into_vec()),
                        Self::fetch_ticket(hold_id, env),
                    ],
                    _ => stop,
                }
            },
            PollOutcome::Completed {
                value: PollReport::Payment(PaymentStatus::Failed { message, .. }),
                ..
            } => Self::finish(state, Phase::Failed, Some(message), env),
            PollOutcome::Completed {
                value: PollReport::Booking(record),
                ..
            } => {
                let status = record.effective_status();
                let message = record.message.clone();
                state.booking = Some(record);
                match status {
                    BookingStatus::Confirmed => {
                        state.last_error = None;
                        Self::finish(state, Phase::Confirmed, None, env)
                    },
                    BookingStatus::Failed | BookingStatus::Cancelled => {
                        let reason = message.unwrap_or_else(|| format!("Booking {status}"));
                        Self::finish(state, Phase::Failed, Some(reason), env)
                    },
                    // Not settled; the scheduler should not have stopped
                    BookingStatus::Pending => SmallVec::new(),
                }
            },
            // A pending payment never completes a run
            PollOutcome::Completed {
                value: PollReport::Payment(PaymentStatus::Pending),
                ..
            } => SmallVec::new(),
            PollOutcome::Failed { error, .. } => {
                Self::finish(state, Phase::Failed, Some(error.to_string()), env)
            },
            PollOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                let reason = match last_error {
                    Some(error) => format!("No confirmation after {attempts} attempts ({error})"),
                    None => format!("No confirmation after {attempts} attempts"),
                };
                let error = BookingError::Timeout(reason);
                Self::finish(state, Phase::TimedOut, Some(error.to_string()), env)
            },
        }
    }
}

impl Reducer for SessionReducer {
    type State = BookingSession;
    type Action = SessionAction;
    type Environment = SessionEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        if state.is_stale(&action) {
            return SmallVec::new();
        }

        match action {
            // ========== Host commands ==========
            SessionAction::SubmitHold { request } => {
                if state.phase != Phase::Idle {
                    return SmallVec::new();
                }
                state.started_at = Some(env.clock.now());
                if let Err(error) = request.validate() {
                    state.request = Some(request);
                    return Self::finish(state, Phase::Failed, Some(error.to_string()), env);
                }
                state.phase = Phase::HoldRequested;
                state.request = Some(request.clone());
                smallvec![Self::request_hold(request, env)]
            },

            SessionAction::ConfirmPaymentSent => {
                let Some(payment) = state.payment.clone() else {
                    return SmallVec::new();
                };
                if state.phase != Phase::AwaitingPayment {
                    return SmallVec::new();
                }
                smallvec![Self::start_polling(
                    state,
                    PollTarget::Payment(payment),
                    env.settings.payment_poll,
                )]
            },

            SessionAction::Cancel { reason } => {
                if state.is_terminal() {
                    return SmallVec::new();
                }
                Self::finish(state, Phase::Failed, Some(reason), env)
            },

            // ========== Hold result ==========
            SessionAction::HoldPlaced { result } => {
                if state.phase != Phase::HoldRequested {
                    return SmallVec::new();
                }
                Self::on_hold_placed(state, result, env)
            },

            SessionAction::HoldRejected { error } => {
                if state.phase != Phase::HoldRequested {
                    return SmallVec::new();
                }
                Self::finish(state, Phase::Failed, Some(error.to_string()), env)
            },

            // ========== Countdown ==========
            SessionAction::CountdownTicked { remaining, .. } => {
                if matches!(state.phase, Phase::AwaitingPayment | Phase::Polling) {
                    state.remaining_seconds = remaining;
                }
                SmallVec::new()
            },

            SessionAction::CountdownExpired { .. } => {
                if !matches!(state.phase, Phase::AwaitingPayment | Phase::Polling) {
                    return SmallVec::new();
                }
                Self::finish(
                    state,
                    Phase::TimedOut,
                    Some(HOLD_WINDOW_EXPIRED.to_string()),
                    env,
                )
            },

            // ========== Polling ==========
            SessionAction::PollUpdated { update, .. } => {
                if state.phase == Phase::Polling {
                    Self::on_poll_update(state, update);
                }
                SmallVec::new()
            },

            SessionAction::PollFinished { outcome, .. } => {
                if state.phase != Phase::Polling {
                    return SmallVec::new();
                }
                Self::on_poll_finished(state, outcome, env)
            },

            // ========== Ticket ==========
            SessionAction::TicketFetched { hold_id, result } => {
                if state.phase == Phase::Confirmed && state.hold_id.as_ref() == Some(&hold_id) {
                    if let Ok(record) = result {
                        state.booking = Some(record);
                    }
                }
                SmallVec::new()
            },
        }
    }
}
