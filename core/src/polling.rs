//! Polling vocabulary shared by the reducer and the runtime scheduler.
//!
//! A check answers either "not yet" ([`CheckStatus::Pending`]) or "settled"
//! ([`CheckStatus::Done`]), or fails with a [`BookingError`]. Failures that
//! [`BookingError::is_retryable_while_polling`] accepts keep the scheduler
//! going; anything else ends it.

use crate::api::{ApiFuture, BookingApi};
use crate::error::BookingError;
use crate::types::{BookingRecord, BookingStatus, HoldId, PaymentInstructions, PaymentStatus};
use std::sync::Arc;
use std::time::Duration;

/// What a single check observed
#[derive(Clone, Debug, PartialEq)]
pub enum CheckStatus<T> {
    /// Keep polling; the value is reported as an intermediate update
    Pending(T),
    /// Stop polling; the value is final
    Done(T),
}

impl<T> CheckStatus<T> {
    /// Whether this result ends polling
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

/// When and how often to check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollSchedule {
    /// Delay between the end of one check and the start of the next
    pub interval: Duration,
    /// Check budget; `None` polls until cancelled or settled
    pub max_attempts: Option<u32>,
    /// Check right away instead of waiting one interval first
    pub immediate: bool,
}

impl PollSchedule {
    /// Default interval for booking lookups
    pub const BOOKING_INTERVAL: Duration = Duration::from_secs(2);

    /// Default attempt budget for booking lookups
    pub const BOOKING_MAX_ATTEMPTS: u32 = 10;

    /// Default interval for payment-status checks
    pub const PAYMENT_INTERVAL: Duration = Duration::from_secs(3);

    /// Booking lookup after a hold that needs no payment: every 2s, 10 attempts
    #[must_use]
    pub const fn booking_lookup() -> Self {
        Self {
            interval: Self::BOOKING_INTERVAL,
            max_attempts: Some(Self::BOOKING_MAX_ATTEMPTS),
            immediate: true,
        }
    }

    /// Payment status: every 3s, bounded only by the hold window
    #[must_use]
    pub const fn payment_status() -> Self {
        Self {
            interval: Self::PAYMENT_INTERVAL,
            max_attempts: None,
            immediate: true,
        }
    }

    /// Same schedule with a different interval
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Same schedule with a different attempt budget
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Whether `attempts` checks have used up the budget
    #[must_use]
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

/// What a session polls for
#[derive(Clone, Debug, PartialEq)]
pub enum PollTarget {
    /// Payment-status checks against the hold's payment address
    Payment(PaymentInstructions),
    /// Booking lookups by hold id
    Booking(HoldId),
}

impl PollTarget {
    /// Short label for logs and metrics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Payment(_) => "payment",
            Self::Booking(_) => "booking",
        }
    }

    /// Run one check against `api` and classify the answer
    ///
    /// The returned future owns everything it needs, so it can be spawned.
    #[must_use]
    pub fn check(
        &self,
        api: Arc<dyn BookingApi>,
    ) -> ApiFuture<'static, Result<CheckStatus<PollReport>, BookingError>> {
        match self.clone() {
            Self::Payment(payment) => Box::pin(async move {
                classify_payment(api.fetch_payment_status(payment).await)
            }),
            Self::Booking(hold_id) => {
                Box::pin(async move { classify_booking(api.fetch_booking(hold_id).await) })
            },
        }
    }
}

/// Value reported by a check
#[derive(Clone, Debug, PartialEq)]
pub enum PollReport {
    /// Payment-status answer
    Payment(PaymentStatus),
    /// Booking lookup answer
    Booking(BookingRecord),
}

/// Intermediate result delivered while polling continues
#[derive(Clone, Debug, PartialEq)]
pub enum PollUpdate<T> {
    /// The check answered but nothing is settled yet
    Pending {
        /// 1-based attempt number
        attempt: u32,
        /// What the check saw
        value: T,
    },
    /// The check failed in a way worth retrying
    Retrying {
        /// 1-based attempt number
        attempt: u32,
        /// Why it failed
        error: BookingError,
    },
}

impl<T> PollUpdate<T> {
    /// Attempt number this update belongs to
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        match self {
            Self::Pending { attempt, .. } | Self::Retrying { attempt, .. } => *attempt,
        }
    }
}

/// How a polling run ended (cancellation delivers nothing)
#[derive(Clone, Debug, PartialEq)]
pub enum PollOutcome<T> {
    /// A check reported a settled value
    Completed {
        /// Checks issued, including the final one
        attempts: u32,
        /// Final value
        value: T,
    },
    /// A check failed with a non-retryable error
    Failed {
        /// Checks issued, including the failing one
        attempts: u32,
        /// The error
        error: BookingError,
    },
    /// The attempt budget ran out
    Exhausted {
        /// Checks issued
        attempts: u32,
        /// Error of the last attempt, if it failed
        last_error: Option<BookingError>,
    },
}

impl<T> PollOutcome<T> {
    /// Checks issued during the run
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Completed { attempts, .. }
            | Self::Failed { attempts, .. }
            | Self::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// Classify a payment-status answer
///
/// Success and definitive failures settle the payment. Pending and transient
/// failures keep polling; the transient failure is still reported so its
/// message can be surfaced.
///
/// # Errors
///
/// Never fails today; the signature matches [`classify_booking`] so both feed
/// the same scheduler.
pub fn classify_payment(status: PaymentStatus) -> Result<CheckStatus<PollReport>, BookingError> {
    if status.is_terminal() {
        Ok(CheckStatus::Done(PollReport::Payment(status)))
    } else {
        Ok(CheckStatus::Pending(PollReport::Payment(status)))
    }
}

/// Classify a booking lookup
///
/// A record with a final effective status settles the booking.
///
/// # Errors
///
/// Passes the lookup error through for the scheduler to classify.
pub fn classify_booking(
    result: Result<BookingRecord, BookingError>,
) -> Result<CheckStatus<PollReport>, BookingError> {
    let record = result?;
    if record.effective_status() == BookingStatus::Pending {
        Ok(CheckStatus::Pending(PollReport::Booking(record)))
    } else {
        Ok(CheckStatus::Done(PollReport::Booking(record)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Seat;

    fn record(seats: usize, status: Option<BookingStatus>) -> BookingRecord {
        BookingRecord {
            show_id: Some(1),
            movie_name: "Dune".to_string(),
            theatre_name: "PVR".to_string(),
            show_time: None,
            seats: (0..seats)
                .map(|i| Seat {
                    seat_id: i64::try_from(i).unwrap() + 1,
                    row: "A".to_string(),
                    seat_no: i32::try_from(i).unwrap() + 1,
                    category: "GOLD".to_string(),
                    seat_identifier: format!("A{}", i + 1),
                })
                .collect(),
            phone_number: "9876543210".to_string(),
            booking_time: None,
            amount: 300.0,
            status,
            booking_id: None,
            message: None,
        }
    }

    #[test]
    fn default_schedules() {
        let booking = PollSchedule::booking_lookup();
        assert_eq!(booking.interval, Duration::from_secs(2));
        assert_eq!(booking.max_attempts, Some(10));
        assert!(booking.immediate);
        assert!(!booking.is_exhausted(9));
        assert!(booking.is_exhausted(10));

        let payment = PollSchedule::payment_status();
        assert_eq!(payment.interval, Duration::from_secs(3));
        assert!(!payment.is_exhausted(u32::MAX));
    }

    #[test]
    fn payment_classification() {
        assert!(classify_payment(PaymentStatus::Success).unwrap().is_done());
        assert!(!classify_payment(PaymentStatus::Pending).unwrap().is_done());
        assert!(
            classify_payment(PaymentStatus::Failed {
                message: "Payment failed. Please try again.".to_string(),
                transient: false,
            })
            .unwrap()
            .is_done()
        );
        assert!(
            !classify_payment(PaymentStatus::unreachable("connection refused"))
                .unwrap()
                .is_done()
        );
    }

    #[test]
    fn booking_classification() {
        assert!(classify_booking(Ok(record(1, None))).unwrap().is_done());
        assert!(!classify_booking(Ok(record(0, None))).unwrap().is_done());
        assert!(
            classify_booking(Ok(record(0, Some(BookingStatus::Cancelled))))
                .unwrap()
                .is_done()
        );
        let err = classify_booking(Err(BookingError::NotFound("H1".into()))).unwrap_err();
        assert!(err.is_retryable_while_polling());
    }
}
