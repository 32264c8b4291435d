//! Session configuration loaded from environment variables.

use boxoffice_core::error::{ConfigError, env_or};
use boxoffice_core::polling::PollSchedule;
use boxoffice_core::session::{DEFAULT_HOLD_WINDOW_SECS, SessionSettings};
use std::env;
use std::time::Duration;

/// Timing configuration of a session controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Hold window length in seconds (`BOXOFFICE_HOLD_WINDOW_SECS`, default 300)
    pub hold_window_secs: u32,
    /// Booking lookup interval in ms (`BOXOFFICE_BOOKING_POLL_INTERVAL_MS`, default 2000)
    pub booking_poll_interval_ms: u64,
    /// Booking lookup budget (`BOXOFFICE_BOOKING_POLL_MAX_ATTEMPTS`, default 10)
    pub booking_poll_max_attempts: u32,
    /// Payment status interval in ms (`BOXOFFICE_PAYMENT_POLL_INTERVAL_MS`, default 3000)
    pub payment_poll_interval_ms: u64,
    /// Fetch the ticket after payment (`BOXOFFICE_FETCH_TICKET_ON_CONFIRM`, default true)
    pub fetch_ticket_on_confirm: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            hold_window_secs: DEFAULT_HOLD_WINDOW_SECS,
            booking_poll_interval_ms: 2_000,
            booking_poll_max_attempts: PollSchedule::BOOKING_MAX_ATTEMPTS,
            payment_poll_interval_ms: 3_000,
            fetch_ticket_on_confirm: true,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set to an unparsable or
    /// unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
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
            hold_window_secs: env_or(&lookup, "BOXOFFICE_HOLD_WINDOW_SECS", defaults.hold_window_secs)?,
            booking_poll_interval_ms: env_or(
                &lookup,
                "BOXOFFICE_BOOKING_POLL_INTERVAL_MS",
                defaults.booking_poll_interval_ms,
            )?,
            booking_poll_max_attempts: env_or(
                &lookup,
                "BOXOFFICE_BOOKING_POLL_MAX_ATTEMPTS",
                defaults.booking_poll_max_attempts,
            )?,
            payment_poll_interval_ms: env_or(
                &lookup,
                "BOXOFFICE_PAYMENT_POLL_INTERVAL_MS",
                defaults.payment_poll_interval_ms,
            )?,
            fetch_ticket_on_confirm: env_or(
                &lookup,
                "BOXOFFICE_FETCH_TICKET_ON_CONFIRM",
                defaults.fetch_ticket_on_confirm,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject zero-length windows, intervals and budgets
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hold_window_secs == 0 {
            return Err(ConfigError::Invalid("hold window must be at least 1 second".to_string()));
        }
        if self.booking_poll_interval_ms == 0 || self.payment_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll intervals must be positive".to_string()));
        }
        if self.booking_poll_max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "booking lookup needs at least one attempt".to_string(),
            ));
        }
        Ok(())
    }

    /// Session tunables derived from this configuration
    #[must_use]
    pub const fn settings(&self) -> SessionSettings {
        SessionSettings {
            hold_window_secs: self.hold_window_secs,
            booking_poll: PollSchedule::booking_lookup()
                .with_interval(Duration::from_millis(self.booking_poll_interval_ms))
                .with_max_attempts(Some(self.booking_poll_max_attempts)),
            payment_poll: PollSchedule::payment_status()
                .with_interval(Duration::from_millis(self.payment_poll_interval_ms)),
            fetch_ticket_on_confirm: self.fetch_ticket_on_confirm,
        }
    }
}
