//! # Box Office Core
//!
//! Core traits and types for driving a movie-ticket booking session.
//!
//! A booking session walks a fixed path: hold seats, optionally wait for the
//! customer to pay to a server-issued address, poll until the server confirms,
//! and finish in exactly one terminal phase. This crate holds the pure part of
//! that machine; the `boxoffice-runtime` crate executes its effects.
//!
//! ## Core Concepts
//!
//! - **State**: [`session::BookingSession`], owned by a single controller
//! - **Action**: [`session::SessionAction`], every input the machine reacts to
//!   (host commands, API results, timer ticks, poll results)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (API calls, timer and poller control)
//! - **Environment**: Injected collaborators ([`api::BookingApi`], [`environment::Clock`])
//!
//! ## Example
//!
//! ```ignore
//! use boxoffice_core::{reducer::Reducer, session::*};
//!
//! let mut session = BookingSession::new();
//! let effects = SessionReducer.reduce(
//!     &mut session,
//!     SessionAction::SubmitHold { request },
//!     &env,
//! );
//! assert_eq!(session.phase, Phase::HoldRequested);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{SmallVec, smallvec};

/// Booking API abstraction consumed by the session
pub mod api;

/// Error taxonomy shared by the client, reducer and runtime
pub mod error;

/// Polling vocabulary: schedules, check classification and outcomes
pub mod polling;

/// The booking session state machine
pub mod session;

/// Domain value types (holds, bookings, seats, payments)
pub mod types;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They never perform I/O; everything observable happens through the effects
/// they return.
pub mod reducer {
    use super::SmallVec;
    use super::effect::Effect;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        ///
        /// # Returns
        ///
        /// The effects to be executed by the runtime, in order
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects are values, not execution. The session controller in
/// `boxoffice-runtime` interprets them: futures are spawned and their action is
/// fed back, timer and poller effects are routed to the single countdown and
/// the single polling scheduler the controller owns.
pub mod effect {
    use crate::polling::{PollSchedule, PollTarget};
    use std::future::Future;
    use std::pin::Pin;

    /// Generation token tying a timer or poller run to the actions it produces
    ///
    /// Every start of the countdown or the poller advances its epoch. Callbacks
    /// carry the epoch they were started with, and actions from a superseded run
    /// are ignored by the reducer.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct Epoch(u64);

    impl Epoch {
        /// The epoch before any run has started
        #[must_use]
        pub const fn initial() -> Self {
            Self(0)
        }

        /// The epoch following this one
        #[must_use]
        pub const fn next(self) -> Self {
            Self(self.0.wrapping_add(1))
        }

        /// Raw counter value, for logging
        #[must_use]
        pub const fn value(self) -> u64 {
            self.0
        }
    }

    impl std::fmt::Display for Epoch {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "#{}", self.0)
        }
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in order of appearance, without waiting on each other
        Parallel(Vec<Effect<Action>>),

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

        /// (Re)start the hold-window countdown; any running countdown is cancelled first
        StartCountdown {
            /// Length of the window in whole seconds
            seconds: u32,
            /// Epoch stamped on every tick and on the expiry
            epoch: Epoch,
        },

        /// Stop the countdown; no further ticks or expiry are delivered
        CancelCountdown,

        /// (Re)start the polling scheduler; any running poller is cancelled first
        StartPolling {
            /// What to check
            target: PollTarget,
            /// Interval, attempt budget and first-attempt behavior
            schedule: PollSchedule,
            /// Epoch stamped on every update and on the outcome
            epoch: Epoch,
        },

        /// Stop scheduling checks; an in-flight check's result is discarded
        CancelPolling,
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::StartCountdown { seconds, epoch } => f
                    .debug_struct("Effect::StartCountdown")
                    .field("seconds", seconds)
                    .field("epoch", epoch)
                    .finish(),
                Effect::CancelCountdown => write!(f, "Effect::CancelCountdown"),
                Effect::StartPolling {
                    target,
                    schedule,
                    epoch,
                } => f
                    .debug_struct("Effect::StartPolling")
                    .field("target", target)
                    .field("schedule", schedule)
                    .field("epoch", epoch)
                    .finish(),
                Effect::CancelPolling => write!(f, "Effect::CancelPolling"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run side by side
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Short label for logs and metrics
        #[must_use]
        pub const fn kind(&self) -> &'static str {
            match self {
                Effect::None => "none",
                Effect::Parallel(_) => "parallel",
                Effect::Future(_) => "future",
                Effect::StartCountdown { .. } => "start_countdown",
                Effect::CancelCountdown => "cancel_countdown",
                Effect::StartPolling { .. } => "start_polling",
                Effect::CancelPolling => "cancel_polling",
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::{Effect, Epoch};

    #[test]
    fn epochs_advance_monotonically() {
        let first = Epoch::initial();
        let second = first.next();
        assert!(second > first);
        assert_eq!(second.next().value(), 2);
    }

    #[test]
    fn effect_kinds_are_stable_labels() {
        let effect: Effect<()> = Effect::CancelCountdown;
        assert_eq!(effect.kind(), "cancel_countdown");
        assert_eq!(format!("{effect:?}"), "Effect::CancelCountdown");

        let merged: Effect<()> = Effect::merge(vec![Effect::None, Effect::CancelPolling]);
        assert_eq!(merged.kind(), "parallel");
    }
}
