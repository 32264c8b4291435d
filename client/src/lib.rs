//! # Box Office HTTP Client
//!
//! reqwest-backed implementation of [`BookingApi`](boxoffice_core::api::BookingApi)
//! for the booking backend:
//!
//! - `POST /booking/seats` places a hold
//! - `GET /booking/bookings?holdId=..` looks up the booking behind a hold
//! - `GET /api/payments/status/{METHOD}/{address}?requiredAmount=..` checks a payment
//!
//! HTTP outcomes are classified into [`BookingError`](boxoffice_core::error::BookingError)
//! and [`PaymentStatus`](boxoffice_core::types::PaymentStatus) here, so a session
//! never sees status codes.
//!
//! ## Example
//!
//! ```no_run
//! use boxoffice_client::HttpBookingApi;
//! use boxoffice_core::types::{HoldRequest, PaymentMethod};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! // BOXOFFICE_API_URL / BOXOFFICE_HTTP_TIMEOUT_SECS
//! let api = HttpBookingApi::from_env()?;
//!
//! let request = HoldRequest::new(1, vec![4, 5], PaymentMethod::Upi, "9876543210")?;
//! let hold = api.hold_seats(&request).await?;
//! println!("hold {}", hold.hold_id);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod wire;

// Re-export main types for convenience
pub use client::{ClientConfig, HttpBookingApi};
