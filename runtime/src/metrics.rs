//! Metric names emitted by the session controller.
//!
//! The controller records through the `metrics` facade; nothing is exported
//! unless the host installs a recorder. Call [`register_metrics`] once after
//! installing one to attach descriptions.

use metrics::{describe_counter, describe_gauge};

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge};

/// Actions applied to a session, labelled by `action`
pub const ACTIONS: &str = "booking_session.actions";

/// Phase changes, labelled by the `phase` entered
pub const PHASE_TRANSITIONS: &str = "booking_session.phase_transitions";

/// Effects executed, labelled by `type`
pub const EFFECTS_EXECUTED: &str = "booking_session.effects.executed";

/// Timer or poller results dropped because their run was superseded
pub const STALE_RESULTS: &str = "booking_session.stale_results";

/// Commands refused because the current phase does not accept them
pub const REJECTED_COMMANDS: &str = "booking_session.rejected_commands";

/// Seconds left in the hold window of the most recently updated session
pub const REMAINING_SECONDS: &str = "booking_session.remaining_seconds";

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(ACTIONS, "Total number of actions applied to booking sessions");
    describe_counter!(PHASE_TRANSITIONS, "Total number of booking session phase changes");
    describe_counter!(EFFECTS_EXECUTED, "Total number of effects executed by session controllers");
    describe_counter!(
        STALE_RESULTS,
        "Total number of timer or poller results discarded as stale"
    );
    describe_counter!(
        REJECTED_COMMANDS,
        "Total number of host commands refused in the current phase"
    );
    describe_gauge!(REMAINING_SECONDS, "Seconds left in the hold window");
}
