//! The booking API as seen by a session.
//!
//! Implemented over HTTP by `boxoffice-client` and by scripted fakes in
//! `boxoffice-testing`.

use crate::error::BookingError;
use crate::types::{BookingRecord, HoldId, HoldRequest, HoldResult, PaymentInstructions, PaymentStatus};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`BookingApi`] methods
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Remote operations a booking session depends on
///
/// Every call is a single request; no retries and no caching happen at this
/// layer. Retrying is the polling scheduler's job.
pub trait BookingApi: Send + Sync {
    /// Place a hold on the requested seats
    ///
    /// # Errors
    ///
    /// - [`BookingError::Validation`] when the server rejects the request (400)
    /// - [`BookingError::Conflict`] when a seat is already taken (409)
    /// - [`BookingError::Transport`] on network failure
    /// - [`BookingError::UnexpectedResponse`] when a success carries no hold id
    fn request_hold(&self, request: HoldRequest) -> ApiFuture<'_, Result<HoldResult, BookingError>>;

    /// Look up the booking created for a hold
    ///
    /// # Errors
    ///
    /// [`BookingError::NotFound`] on 404, [`BookingError::Transport`] for anything else.
    fn fetch_booking(&self, hold_id: HoldId) -> ApiFuture<'_, Result<BookingRecord, BookingError>>;

    /// Check whether the payment described by `payment` has arrived
    ///
    /// Never fails: transport problems and unknown codes come back as a
    /// transient [`PaymentStatus::Failed`].
    fn fetch_payment_status(&self, payment: PaymentInstructions) -> ApiFuture<'_, PaymentStatus>;
}
