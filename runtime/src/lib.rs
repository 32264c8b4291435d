//! # Box Office Runtime
//!
//! Runtime for booking sessions.
//!
//! This crate executes what the pure `SessionReducer` in `boxoffice-core`
//! describes: it runs the hold-window countdown, the polling scheduler and the
//! booking API calls, and feeds their results back as actions.
//!
//! ## Core Components
//!
//! - **`SessionController`**: Owns a session and runs its event loop
//! - **`CountdownTimer`**: Single-slot, cancellable one-second countdown
//! - **`PollingScheduler`**: Single-slot, cancellable fixed-interval poller
//! - **`ControllerConfig`**: Environment-driven timing configuration
//!
//! ## Example
//!
//! ```ignore
//! use boxoffice_runtime::{ControllerConfig, SessionController};
//!
//! let settings = ControllerConfig::from_env()?.settings();
//! let controller = SessionController::new(
//!     SessionEnvironment::new(api, Arc::new(SystemClock)).with_settings(settings),
//! );
//! controller.submit_hold(request).await?;
//! ```

/// Environment-driven configuration
pub mod config;

/// The session controller and its event loop
pub mod controller;

/// Cancellable countdown timer
pub mod countdown;

/// Metric names and descriptions
pub mod metrics;

/// Fixed-interval polling scheduler
pub mod poller;

pub use config::ControllerConfig;
pub use controller::{PhaseObserver, SessionController};
pub use countdown::{CountdownTimer, TimerState};
pub use poller::{PollerState, PollingScheduler};

/// Error types for the session runtime
pub mod error {
    use boxoffice_core::session::Phase;
    use std::time::Duration;
    use thiserror::Error;

    /// Errors returned by [`SessionController`](crate::SessionController) methods
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum ControllerError {
        /// The session's phase does not accept this command
        ///
        /// The session is left unchanged.
        #[error("Cannot {action} while the session is {phase}")]
        InvalidTransition {
            /// Rejected action
            action: &'static str,
            /// Phase at the time of the command
            phase: Phase,
        },

        /// Waiting for a phase took longer than allowed
        #[error("Timed out after {0:?} waiting for the session")]
        Timeout(Duration),

        /// The controller's event loop has stopped
        #[error("Session controller has stopped")]
        ChannelClosed,
    }
}

pub use error::ControllerError;
