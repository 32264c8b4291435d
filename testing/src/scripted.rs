//! In-memory [`BookingApi`] that answers from a script.
//!
//! Each operation has a queue of answers and an optional fallback used once the
//! queue is empty. Without a fallback, holds fail with a transport error,
//! booking lookups answer 404 and payment checks answer pending.

use boxoffice_core::api::{ApiFuture, BookingApi};
use boxoffice_core::error::BookingError;
use boxoffice_core::types::{
    BookingRecord, HoldId, HoldRequest, HoldResult, PaymentInstructions, PaymentStatus,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Default)]
struct Script {
    holds: VecDeque<Result<HoldResult, BookingError>>,
    bookings: VecDeque<Result<BookingRecord, BookingError>>,
    booking_fallback: Option<Result<BookingRecord, BookingError>>,
    payments: VecDeque<PaymentStatus>,
    payment_fallback: Option<PaymentStatus>,
    hold_requests: Vec<HoldRequest>,
    booking_lookups: Vec<HoldId>,
    payment_checks: Vec<PaymentInstructions>,
}

/// Scripted booking API with call recording
///
/// # Example
///
/// ```
/// use boxoffice_testing::{ScriptedBookingApi, fixtures};
/// use boxoffice_core::types::PaymentStatus;
///
/// let api = ScriptedBookingApi::new()
///     .with_hold(Ok(fixtures::hold_with_payment("H2")))
///     .with_payments([PaymentStatus::Pending, PaymentStatus::Success]);
/// assert_eq!(api.hold_calls(), 0);
/// ```
#[derive(Default)]
pub struct ScriptedBookingApi {
    script: Mutex<Script>,
    latency: Option<Duration>,
}

impl ScriptedBookingApi {
    /// An empty script
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue the answer to the next hold request
    #[must_use]
    pub fn with_hold(self, result: Result<HoldResult, BookingError>) -> Self {
        self.script().holds.push_back(result);
        self
    }

    /// Queue the answer to the next booking lookup
    #[must_use]
    pub fn with_booking(self, result: Result<BookingRecord, BookingError>) -> Self {
        self.script().bookings.push_back(result);
        self
    }

    /// Answer every booking lookup past the queue with `result`
    #[must_use]
    pub fn always_booking(self, result: Result<BookingRecord, BookingError>) -> Self {
        self.script().booking_fallback = Some(result);
        self
    }

    /// Queue payment-status answers, in order
    #[must_use]
    pub fn with_payments<I>(self, statuses: I) -> Self
    where
        I: IntoIterator<Item = PaymentStatus>,
    {
        self.script().payments.extend(statuses);
        self
    }

    /// Answer every payment check past the queue with `status`
    #[must_use]
    pub fn always_payment(self, status: PaymentStatus) -> Self {
        self.script().payment_fallback = Some(status);
        self
    }

    /// Delay every answer by `latency` (tokio time, so paused clocks apply)
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Wrap for use as a session environment's API
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Hold requests received so far
    #[must_use]
    pub fn hold_calls(&self) -> usize {
        self.script().hold_requests.len()
    }

    /// Booking lookups received so far
    #[must_use]
    pub fn booking_calls(&self) -> usize {
        self.script().booking_lookups.len()
    }

    /// Payment checks received so far
    #[must_use]
    pub fn payment_calls(&self) -> usize {
        self.script().payment_checks.len()
    }

    /// Every hold request received, in order
    #[must_use]
    pub fn hold_requests(&self) -> Vec<HoldRequest> {
        self.script().hold_requests.clone()
    }

    /// Every payment check received, in order
    #[must_use]
    pub fn payment_checks(&self) -> Vec<PaymentInstructions> {
        self.script().payment_checks.clone()
    }

    fn answer<T>(&self, value: T) -> ApiFuture<'static, T>
    where
        T: Send + 'static,
    {
        let latency = self.latency;
        Box::pin(async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            value
        })
    }
}

impl BookingApi for ScriptedBookingApi {
    fn request_hold(&self, request: HoldRequest) -> ApiFuture<'_, Result<HoldResult, BookingError>> {
        let result = {
            let mut script = self.script();
            script.hold_requests.push(request);
            script.holds.pop_front().unwrap_or_else(|| {
                Err(BookingError::Transport("no scripted hold response".to_string()))
            })
        };
        self.answer(result)
    }

    fn fetch_booking(&self, hold_id: HoldId) -> ApiFuture<'_, Result<BookingRecord, BookingError>> {
        let result = {
            let mut script = self.script();
            script.booking_lookups.push(hold_id.clone());
            script
                .bookings
                .pop_front()
                .or_else(|| script.booking_fallback.clone())
                .unwrap_or_else(|| Err(BookingError::NotFound(hold_id.to_string())))
        };
        self.answer(result)
    }

    fn fetch_payment_status(&self, payment: PaymentInstructions) -> ApiFuture<'_, PaymentStatus> {
        let status = {
            let mut script = self.script();
            script.payment_checks.push(payment);
            script
                .payments
                .pop_front()
                .or_else(|| script.payment_fallback.clone())
                .unwrap_or(PaymentStatus::Pending)
        };
        self.answer(status)
    }
}
