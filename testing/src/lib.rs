//! # Box Office Testing
//!
//! Testing utilities and helpers for booking sessions.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - Fixtures for requests, holds and booking records
//! - Property-based testing strategies
//! - A Given-When-Then harness and assertion helpers for the session reducer
//!
//! ## Example
//!
//! ```ignore
//! use boxoffice_testing::{ScriptedBookingApi, fixtures};
//! use boxoffice_runtime::SessionController;
//!
//! #[tokio::test(start_paused = true)]
//! async fn hold_without_payment_confirms() {
//!     let api = ScriptedBookingApi::new()
//!         .with_hold(Ok(fixtures::hold_without_payment("H1")))
//!         .with_booking(Ok(fixtures::confirmed_booking()));
//!     let controller = SessionController::new(fixtures::test_environment(api.shared()));
//!
//!     controller.submit_hold(fixtures::hold_request()).await.unwrap();
//!     let session = controller.wait_until_terminal(Duration::from_secs(30)).await.unwrap();
//!     assert_eq!(session.phase, Phase::Confirmed);
//! }
//! ```

use boxoffice_core::environment::Clock;
use chrono::{DateTime, Utc};

/// Scripted booking API
pub mod scripted;


/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use boxoffice_testing::mocks::FixedClock;
    /// use boxoffice_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Ready-made domain values
pub mod fixtures {
    use crate::mocks::test_clock;
    use boxoffice_core::api::BookingApi;
    use boxoffice_core::session::SessionEnvironment;
    use boxoffice_core::types::{
        BookingRecord, BookingStatus, HoldRequest, HoldResult, PaymentMethod, PhoneNumber, Seat,
    };
    use std::sync::Arc;

    /// Phone number used by every fixture
    pub const PHONE: &str = "9876543210";

    /// Two seats for show 1, paid by UPI
    #[must_use]
    pub fn hold_request() -> HoldRequest {
        hold_request_with(PaymentMethod::Upi)
    }

    /// Two seats for show 1, paid with `method`
    ///
    /// Built without validation so tests can start from it and break it.
    #[must_use]
    pub fn hold_request_with(method: PaymentMethod) -> HoldRequest {
        HoldRequest {
            show_id: 1,
            seat_ids: vec![1, 2],
            payment_method: method,
            phone_number: phone(),
        }
    }

    /// The fixture phone number
    ///
    /// # Panics
    ///
    /// Never; the constant is a valid number.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn phone() -> PhoneNumber {
        PhoneNumber::parse(PHONE).expect("fixture phone number is valid")
    }

    /// Hold that goes straight to booking lookup
    #[must_use]
    pub fn hold_without_payment(hold_id: &str) -> HoldResult {
        HoldResult::without_payment(hold_id)
    }

    /// Hold that must be paid by UPI (300.00)
    #[must_use]
    pub fn hold_with_payment(hold_id: &str) -> HoldResult {
        HoldResult::with_payment(hold_id, "boxoffice@upi", PaymentMethod::Upi, 300.0)
    }

    /// Seat `A{number}`
    #[must_use]
    pub fn seat(seat_id: i64, number: i32) -> Seat {
        Seat {
            seat_id,
            row: "A".to_string(),
            seat_no: number,
            category: "GOLD".to_string(),
            seat_identifier: format!("A{number}"),
        }
    }

    /// Booking with seats and no explicit status (confirmed by its seats)
    #[must_use]
    pub fn confirmed_booking() -> BookingRecord {
        BookingRecord {
            show_id: Some(1),
            movie_name: "Interstellar".to_string(),
            theatre_name: "PVR Forum".to_string(),
            show_time: None,
            seats: vec![seat(1, 1), seat(2, 2)],
            phone_number: PHONE.to_string(),
            booking_time: None,
            amount: 300.0,
            status: None,
            booking_id: Some("B-1".to_string()),
            message: None,
        }
    }

    /// Booking without seats yet
    #[must_use]
    pub fn pending_booking() -> BookingRecord {
        BookingRecord {
            seats: Vec::new(),
            booking_id: None,
            ..confirmed_booking()
        }
    }

    /// Booking the server reports with an explicit status
    #[must_use]
    pub fn booking_with_status(status: BookingStatus) -> BookingRecord {
        BookingRecord {
            status: Some(status),
            ..confirmed_booking()
        }
    }

    /// Session environment over `api` with the fixed test clock and default settings
    #[must_use]
    pub fn test_environment(api: Arc<dyn BookingApi>) -> SessionEnvironment {
        SessionEnvironment::new(api, Arc::new(test_clock()))
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use boxoffice_core::types::{HoldResult, PaymentMethod};
    use proptest::prelude::*;

    /// Any payment method
    pub fn payment_method() -> impl Strategy<Value = PaymentMethod> {
        prop_oneof![
            Just(PaymentMethod::Upi),
            Just(PaymentMethod::Eth),
            Just(PaymentMethod::Card),
            Just(PaymentMethod::Wallet),
            Just(PaymentMethod::NetBanking),
        ]
    }

    /// Hold results with a non-blank id, with or without payment fields
    ///
    /// Addresses include blank strings, which mean "no payment step".
    pub fn hold_result() -> impl Strategy<Value = HoldResult> {
        (
            "H[0-9A-Z]{1,8}",
            proptest::option::of(prop_oneof![Just(String::new()), Just("  ".to_string()), "[a-z0-9@]{4,20}"]),
            proptest::option::of(prop_oneof![Just("UPI".to_string()), Just("eth".to_string())]),
            proptest::option::of(1.0_f64..5_000.0),
        )
            .prop_map(|(hold_id, payment_address, payment_method, price)| HoldResult {
                hold_id: boxoffice_core::types::HoldId::new(hold_id),
                payment_address,
                payment_method,
                price,
                message: None,
            })
    }

    /// Whether a generated hold result carries a usable payment address
    #[must_use]
    pub fn has_payment_address(result: &HoldResult) -> bool {
        result
            .payment_address
            .as_deref()
            .is_some_and(|address| !address.trim().is_empty())
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use scripted::ScriptedBookingApi;
pub use session_test::{SessionTest, assertions};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn fixtures_are_valid() {
        assert!(fixtures::hold_request().validate().is_ok());
        assert!(properties::has_payment_address(&fixtures::hold_with_payment("H2")));
        assert!(!properties::has_payment_address(&fixtures::hold_without_payment("H1")));
    }
}
