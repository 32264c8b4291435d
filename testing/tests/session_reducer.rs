//! Reducer-level tests for booking session transitions.

#![allow(clippy::unwrap_used)]

use boxoffice_core::effect::Epoch;
use boxoffice_core::environment::Clock;
use boxoffice_core::error::BookingError;
use boxoffice_core::polling::{PollOutcome, PollReport, PollUpdate};
use boxoffice_core::session::{CANCELLED_BY_USER, HOLD_WINDOW_EXPIRED, Phase, SessionAction};
use boxoffice_core::types::{BookingStatus, HoldId, PaymentMethod, PaymentStatus};
use boxoffice_testing::{SessionTest, assertions, fixtures, test_clock};

fn submit() -> SessionAction {
    SessionAction::SubmitHold {
        request: fixtures::hold_request(),
    }
}

fn placed_with_payment() -> SessionAction {
    SessionAction::HoldPlaced {
        result: fixtures::hold_with_payment("H2"),
    }
}

fn placed_without_payment() -> SessionAction {
    SessionAction::HoldPlaced {
        result: fixtures::hold_without_payment("H1"),
    }
}

#[test]
fn submit_hold_moves_to_hold_requested() {
    SessionTest::new()
        .when_action(submit())
        .then_session(|session| {
            assert_eq!(session.phase, Phase::HoldRequested);
            assert_eq!(session.request, Some(fixtures::hold_request()));
            assert_eq!(session.started_at, Some(test_clock().now()));
        })
        .then_effects(|effects| {
            assertions::assert_effects_count(effects, 1);
            assertions::assert_has_future_effect(effects);
        })
        .run();
}

#[test]
fn duplicate_seats_fail_before_any_request() {
    let mut request = fixtures::hold_request();
    request.seat_ids = vec![4, 4];

    SessionTest::new()
        .when_action(SessionAction::SubmitHold { request })
        .then_session(|session| {
            assert_eq!(session.phase, Phase::Failed);
            assert_eq!(session.last_error.as_deref(), Some("Seat 4 selected more than once"));
        })
        .then_effects(assertions::assert_no_future_effect)
        .run();
}

#[test]
fn second_submit_is_ignored() {
    SessionTest::new()
        .given_actions([submit()])
        .when_action(submit())
        .then_session(|session| assert_eq!(session.phase, Phase::HoldRequested))
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn hold_with_payment_address_awaits_payment() {
    SessionTest::new()
        .given_actions([submit()])
        .when_action(placed_with_payment())
        .then_session(|session| {
            assert_eq!(session.phase, Phase::AwaitingPayment);
            assert_eq!(session.remaining_seconds, 300);
            assert_eq!(session.hold_id, Some(HoldId::new("H2")));
            let payment = session.payment.as_ref().unwrap();
            assert_eq!(payment.address, "boxoffice@upi");
            assert_eq!(payment.amount, Some(300.0));
        })
        .then_effects(|effects| assertions::assert_starts_countdown(effects, 300))
        .run();
}

#[test]
fn hold_without_payment_address_polls_booking() {
    SessionTest::new()
        .given_actions([submit()])
        .when_action(placed_without_payment())
        .then_session(|session| {
            assert_eq!(session.phase, Phase::Polling);
            assert!(session.payment.is_none());
            assert_eq!(session.remaining_seconds, 0);
        })
        .then_effects(|effects| assertions::assert_starts_polling(effects, "booking"))
        .run();
}

#[test]
fn blank_hold_id_is_an_unexpected_response() {
    SessionTest::new()
        .given_actions([submit()])
        .when_action(SessionAction::HoldPlaced {
            result: fixtures::hold_without_payment(" "),
        })
        .then_session(|session| {
            assert_eq!(session.phase, Phase::Failed);
            assert!(session.last_error.as_deref().unwrap().starts_with("Unexpected response"));
        })
        .run();
}

#[test]
fn conflict_surfaces_the_server_message() {
    SessionTest::new()
        .given_actions([submit()])
        .when_action(SessionAction::HoldRejected {
            error: BookingError::Conflict("Seats no longer available".to_string()),
        })
        .then_session(|session| {
            assert_eq!(session.phase, Phase::Failed);
            assert_eq!(session.last_error.as_deref(), Some("Seats no longer available"));
            assert_eq!(session.finished_at, Some(test_clock().now()));
        })
        .then_effects(assertions::assert_stops_background_work)
        .run();
}

#[test]
fn confirm_payment_starts_payment_polling() {
    SessionTest::new()
        .given_actions([submit(), placed_with_payment()])
        .when_action(SessionAction::ConfirmPaymentSent)
        .then_session(|session| assert_eq!(session.phase, Phase::Polling))
        .then_effects(|effects| {
            assertions::assert_effects_count(effects, 1);
            assertions::assert_starts_polling(effects, "payment");
        })
        .run();
}

#[test]
fn confirm_payment_without_payment_step_is_ignored() {
    SessionTest::new()
        .given_actions([submit(), placed_without_payment()])
        .when_action(SessionAction::ConfirmPaymentSent)
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn ticks_update_remaining_seconds() {
    SessionTest::new()
        .given_actions([submit(), placed_with_payment()])
        .when_action_from(|session| SessionAction::CountdownTicked {
            epoch: session.countdown_epoch(),
            remaining: 42,
        })
        .then_session(|session| assert_eq!(session.remaining_seconds, 42))
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn expiry_while_polling_times_out() {
    SessionTest::new()
        .given_actions([submit(), placed_with_payment(), SessionAction::ConfirmPaymentSent])
        .when_action_from(|session| SessionAction::CountdownExpired {
            epoch: session.countdown_epoch(),
        })
        .then_session(|session| {
            assert_eq!(session.phase, Phase::TimedOut);
            assert_eq!(session.last_error.as_deref(), Some(HOLD_WINDOW_EXPIRED));
        })
        .then_effects(assertions::assert_stops_background_work)
        .run();
}

#[test]
fn stale_poll_results_are_discarded() {
    SessionTest::new()
        .given_actions([submit(), placed_with_payment(), SessionAction::ConfirmPaymentSent])
        .when_action_from(|session| SessionAction::PollFinished {
            epoch: session.polling_epoch().next(),
            outcome: PollOutcome::Completed {
                attempts: 1,
                value: PollReport::Payment(PaymentStatus::Success),
            },
        })
        .then_session(|session| assert_eq!(session.phase, Phase::Polling))
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn pending_payment_updates_attempts() {
    SessionTest::new()
        .given_actions([submit(), placed_with_payment(), SessionAction::ConfirmPaymentSent])
        .when_action_from(|session| SessionAction::PollUpdated {
            epoch: session.polling_epoch(),
            update: PollUpdate::Pending {
                attempt: 3,
                value: PollReport::Payment(PaymentStatus::Pending),
            },
        })
        .then_session(|session| {
            assert_eq!(session.phase, Phase::Polling);
            assert_eq!(session.poll_attempts, 3);
            assert!(session.last_error.is_none());
        })
        .run();
}

#[test]
fn definitive_payment_failure_fails_the_session() {
    SessionTest::new()
        .given_actions([submit(), placed_with_payment(), SessionAction::ConfirmPaymentSent])
        .when_action_from(|session| SessionAction::PollFinished {
            epoch: session.polling_epoch(),
            outcome: PollOutcome::Completed {
                attempts: 2,
                value: PollReport::Payment(PaymentStatus::from_status_code(400, None)),
            },
        })
        .then_session(|session| {
            assert_eq!(session.phase, Phase::Failed);
            assert_eq!(session.last_error.as_deref(), Some("Payment failed. Please try again."));
        })
        .then_effects(assertions::assert_stops_background_work)
        .run();
}

#[test]
fn payment_success_fetches_ticket_when_enabled() {
    SessionTest::new()
        .given_actions([submit(), placed_with_payment(), SessionAction::ConfirmPaymentSent])
        .when_action_from(|session| SessionAction::PollFinished {
            epoch: session.polling_epoch(),
            outcome: PollOutcome::Completed {
                attempts: 4,
                value: PollReport::Payment(PaymentStatus::Success),
            },
        })
        .then_session(|session| {
            assert_eq!(session.phase, Phase::Confirmed);
            assert!(session.last_error.is_none());
        })
        .then_effects(|effects| {
            assertions::assert_stops_background_work(effects);
            assertions::assert_has_future_effect(effects);
        })
        .run();
}

#[test]
fn payment_success_skips_ticket_when_disabled() {
    let mut env = fixtures::test_environment(boxoffice_testing::ScriptedBookingApi::new().shared());
    env.settings.fetch_ticket_on_confirm = false;

    SessionTest::new()
        .with_env(env)
        .given_actions([submit(), placed_with_payment(), SessionAction::ConfirmPaymentSent])
        .when_action_from(|session| SessionAction::PollFinished {
            epoch: session.polling_epoch(),
            outcome: PollOutcome::Completed {
                attempts: 1,
                value: PollReport::Payment(PaymentStatus::Success),
            },
        })
        .then_effects(assertions::assert_no_future_effect)
        .run();
}

#[test]
fn booking_with_seats_confirms() {
    SessionTest::new()
        .given_actions([submit(), placed_without_payment()])
        .when_action_from(|session| SessionAction::PollFinished {
            epoch: session.polling_epoch(),
            outcome: PollOutcome::Completed {
                attempts: 2,
                value: PollReport::Booking(fixtures::confirmed_booking()),
            },
        })
        .then_session(|session| {
            assert_eq!(session.phase, Phase::Confirmed);
            assert_eq!(session.booking, Some(fixtures::confirmed_booking()));
        })
        .then_effects(assertions::assert_no_future_effect)
        .run();
}

#[test]
fn cancelled_booking_fails() {
    SessionTest::new()
        .given_actions([submit(), placed_without_payment()])
        .when_action_from(|session| SessionAction::PollFinished {
            epoch: session.polling_epoch(),
            outcome: PollOutcome::Completed {
                attempts: 1,
                value: PollReport::Booking(fixtures::booking_with_status(BookingStatus::Cancelled)),
            },
        })
        .then_session(|session| {
            assert_eq!(session.phase, Phase::Failed);
            assert_eq!(session.last_error.as_deref(), Some("Booking CANCELLED"));
        })
        .run();
}

#[test]
fn retrying_lookup_records_the_error() {
    SessionTest::new()
        .given_actions([submit(), placed_without_payment()])
        .when_action_from(|session| SessionAction::PollUpdated {
            epoch: session.polling_epoch(),
            update: PollUpdate::Retrying {
                attempt: 1,
                error: BookingError::NotFound("H1".to_string()),
            },
        })
        .then_session(|session| {
            assert_eq!(session.phase, Phase::Polling);
            assert_eq!(session.last_error.as_deref(), Some("Booking not found: H1"));
        })
        .run();
}

#[test]
fn cancel_from_awaiting_payment_fails_with_reason() {
    SessionTest::new()
        .given_actions([submit(), placed_with_payment()])
        .when_action(SessionAction::cancel_by_user())
        .then_session(|session| {
            assert_eq!(session.phase, Phase::Failed);
            assert_eq!(session.last_error.as_deref(), Some(CANCELLED_BY_USER));
        })
        .then_effects(assertions::assert_stops_background_work)
        .run();
}

#[test]
fn ticket_is_attached_only_for_the_confirmed_hold() {
    // One polling run has started, so its epoch is the first after the initial one
    let paid = SessionAction::PollFinished {
        epoch: Epoch::initial().next(),
        outcome: PollOutcome::Completed {
            attempts: 1,
            value: PollReport::Payment(PaymentStatus::Success),
        },
    };
    let history = [submit(), placed_with_payment(), SessionAction::ConfirmPaymentSent, paid];

    SessionTest::new()
        .given_actions(history.clone())
        .when_action(SessionAction::TicketFetched {
            hold_id: HoldId::new("OTHER"),
            result: Ok(fixtures::confirmed_booking()),
        })
        .then_session(|session| {
            assert_eq!(session.phase, Phase::Confirmed);
            assert!(session.booking.is_none());
        })
        .run();

    SessionTest::new()
        .given_actions(history)
        .when_action(SessionAction::TicketFetched {
            hold_id: HoldId::new("H2"),
            result: Ok(fixtures::confirmed_booking()),
        })
        .then_session(|session| {
            assert_eq!(session.phase, Phase::Confirmed);
            assert_eq!(session.booking, Some(fixtures::confirmed_booking()));
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn eth_holds_fall_back_to_the_requested_method() {
    let mut result = fixtures::hold_with_payment("H3");
    result.payment_method = None;

    SessionTest::new()
        .given_actions([SessionAction::SubmitHold {
            request: fixtures::hold_request_with(PaymentMethod::Eth),
        }])
        .when_action(SessionAction::HoldPlaced { result })
        .then_session(|session| {
            let payment = session.payment.as_ref().unwrap();
            assert_eq!(payment.method, "ETH");
            assert_eq!(payment.amount_label().as_deref(), Some("300 ETH"));
        })
        .run();
}
