//! Booking API client implementation

use crate::wire::{ErrorBody, HoldBody, PaymentStatusBody};
use boxoffice_core::api::{ApiFuture, BookingApi};
use boxoffice_core::error::{BookingError, ConfigError, env_or};
use boxoffice_core::types::{
    BookingRecord, HoldId, HoldRequest, HoldResult, PaymentInstructions, PaymentStatus,
};
use reqwest::{Client, StatusCode, Url};
use std::env;
use std::time::Duration;

/// Connection settings for [`HttpBookingApi`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the booking backend (`BOXOFFICE_API_URL`)
    pub api_url: String,
    /// Per-request timeout in seconds (`BOXOFFICE_HTTP_TIMEOUT_SECS`)
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            timeout_secs: 15,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable does not parse or the URL is unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            api_url: env_or(&lookup, "BOXOFFICE_API_URL", defaults.api_url)?,
            timeout_secs: env_or(&lookup, "BOXOFFICE_HTTP_TIMEOUT_SECS", defaults.timeout_secs)?,
        };
        config.base_url()?;
        if config.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "BOXOFFICE_HTTP_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    /// Parsed base URL
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the URL does not parse or
    /// cannot carry a path (`mailto:` and the like).
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            var: "BOXOFFICE_API_URL",
            value: self.api_url.clone(),
        };
        let url = Url::parse(self.api_url.trim()).map_err(|_| invalid())?;
        if url.cannot_be_a_base() {
            return Err(invalid());
        }
        Ok(url)
    }

    /// Request timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// [`BookingApi`] over HTTP
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpBookingApi {
    client: Client,
    base_url: Url,
}

impl HttpBookingApi {
    /// Create a client from environment configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(&ClientConfig::from_env()?)
    }

    /// Create a client for `config`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the base URL is unusable or the HTTP
    /// client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ConfigError::Invalid(format!("Cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url()?,
        })
    }

    /// Base URL every request is resolved against
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one
    fn endpoint<I>(&self, segments: I) -> Url
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Place a hold on seats
    ///
    /// # Errors
    ///
    /// See [`BookingApi::request_hold`].
    #[tracing::instrument(skip(self, request), fields(show_id = request.show_id, seats = request.seat_ids.len()))]
    pub async fn hold_seats(&self, request: &HoldRequest) -> Result<HoldResult, BookingError> {
        let response = self
            .client
            .post(self.endpoint(["booking", "seats"]))
            .json(request)
            .send()
            .await
            .map_err(|e| BookingError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BookingError::Transport(e.to_string()))?;

        match status {
            status if status.is_success() => {
                let hold: HoldBody = serde_json::from_str(&body)
                    .map_err(|e| BookingError::UnexpectedResponse(e.to_string()))?;
                hold.into_hold().ok_or_else(|| {
                    BookingError::UnexpectedResponse("hold response carried no holdId".to_string())
                })
            },
            StatusCode::BAD_REQUEST => Err(BookingError::Validation(
                ErrorBody::parse(&body).message_or("Invalid booking request"),
            )),
            StatusCode::CONFLICT => Err(BookingError::Conflict(
                ErrorBody::parse(&body).message_or("Selected seats are no longer available"),
            )),
            status => {
                tracing::warn!(status = status.as_u16(), "hold request answered unexpectedly");
                Err(BookingError::UnexpectedResponse(format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    ErrorBody::parse(&body).message_or("no details")
                )))
            },
        }
    }

    /// Look up the booking created for a hold
    ///
    /// # Errors
    ///
    /// See [`BookingApi::fetch_booking`].
    #[tracing::instrument(skip(self, hold_id), fields(hold_id = %hold_id))]
    pub async fn booking(&self, hold_id: &HoldId) -> Result<BookingRecord, BookingError> {
        let mut url = self.endpoint(["booking", "bookings"]);
        url.query_pairs_mut().append_pair("holdId", hold_id.as_str());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BookingError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(BookingError::NotFound(hold_id.to_string())),
            status if status.is_success() => response
                .json::<BookingRecord>()
                .await
                .map_err(|e| BookingError::Transport(format!("Unreadable booking: {e}"))),
            status => Err(BookingError::Transport(format!(
                "Booking lookup failed with HTTP {}",
                status.as_u16()
            ))),
        }
    }

    /// Check whether a payment has arrived
    ///
    /// Never fails; see [`BookingApi::fetch_payment_status`].
    #[tracing::instrument(skip(self, payment), fields(method = %payment.method))]
    pub async fn payment_status(&self, payment: &PaymentInstructions) -> PaymentStatus {
        let method = payment.method.to_ascii_uppercase();
        let mut url = self.endpoint([
            "api",
            "payments",
            "status",
            method.as_str(),
            payment.address.as_str(),
        ]);
        if let Some(amount) = payment.amount {
            url.query_pairs_mut()
                .append_pair("requiredAmount", &amount.to_string());
        }

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "payment status check failed");
                return PaymentStatus::unreachable(e);
            },
        };

        let code = response.status().as_u16();
        let body = match response.text().await {
            Ok(raw) => PaymentStatusBody::parse(&raw),
            Err(e) => {
                tracing::warn!(error = %e, "payment status body unreadable");
                PaymentStatusBody::default()
            },
        };

        let status = PaymentStatus::from_status_code(body.status.unwrap_or(code), body.message.as_deref());
        tracing::debug!(http_status = code, ?status, "payment status checked");
        status
    }
}

impl BookingApi for HttpBookingApi {
    fn request_hold(&self, request: HoldRequest) -> ApiFuture<'_, Result<HoldResult, BookingError>> {
        Box::pin(async move { self.hold_seats(&request).await })
    }

    fn fetch_booking(&self, hold_id: HoldId) -> ApiFuture<'_, Result<BookingRecord, BookingError>> {
        Box::pin(async move { self.booking(&hold_id).await })
    }

    fn fetch_payment_status(&self, payment: PaymentInstructions) -> ApiFuture<'_, PaymentStatus> {
        Box::pin(async move { self.payment_status(&payment).await })
    }
}
