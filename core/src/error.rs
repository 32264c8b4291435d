//! Error types for booking sessions.

use thiserror::Error;

/// Classified failure of a booking API call or of the session itself
///
/// `Validation` and `Conflict` display the server's message verbatim so a host
/// can show it to the customer as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    /// The request was rejected as invalid (HTTP 400, or local pre-checks)
    #[error("{0}")]
    Validation(String),

    /// The seats are no longer available (HTTP 409)
    ///
    /// The caller should re-fetch seat availability before starting a new hold.
    #[error("{0}")]
    Conflict(String),

    /// No booking exists for the hold yet (HTTP 404 on lookup)
    #[error("Booking not found: {0}")]
    NotFound(String),

    /// Network failure or unusable response from the booking API
    #[error("Transport error: {0}")]
    Transport(String),

    /// A success response did not carry what the protocol requires
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The hold window closed or the polling budget was spent
    #[error("{0}")]
    Timeout(String),
}

impl BookingError {
    /// Whether a poller should keep probing after seeing this error
    ///
    /// A booking may not be committed yet (`NotFound`) and networks drop
    /// requests (`Transport`); everything else ends polling.
    #[must_use]
    pub const fn is_retryable_while_polling(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Transport(_))
    }

    /// Short label for logs and metrics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::Transport(_) => "transport",
            Self::UnexpectedResponse(_) => "unexpected_response",
            Self::Timeout(_) => "timeout",
        }
    }
}

/// Invalid environment configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },

    /// Values parse but are unusable together or alone
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Read `var` through `lookup`, falling back to `default` when it is unset
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] when the variable is set but does not parse.
pub fn env_or<T, F>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { var, value })
        },
        _ => Ok(default),
    }
}
