//! Box Office terminal harness.
//!
//! Drives one booking session against a live booking API:
//!
//! ```text
//! boxoffice <show-id> <seat-ids> <method> <phone>
//! ```
//!
//! Press Enter once the payment is sent; Ctrl-C abandons the session.

mod args;

use anyhow::{Context, Result};
use args::Invocation;
use boxoffice_client::{ClientConfig, HttpBookingApi};
use boxoffice_core::environment::SystemClock;
use boxoffice_core::session::{BookingSession, Phase, SessionEnvironment};
use boxoffice_core::types::{PaymentInstructions, format_amount, format_countdown};
use boxoffice_runtime::metrics::register_metrics;
use boxoffice_runtime::{ControllerConfig, SessionController};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,boxoffice=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    register_metrics();

    let request = match Invocation::parse().into_request() {
        Ok(request) => request,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(ExitCode::from(2));
        },
    };

    let client_config = ClientConfig::from_env()?;
    let controller_config = ControllerConfig::from_env()?;
    info!(
        api_url = %client_config.api_url,
        hold_window_secs = controller_config.hold_window_secs,
        "Configuration loaded"
    );

    let api = HttpBookingApi::new(&client_config)?;
    let env = SessionEnvironment::new(Arc::new(api), Arc::new(SystemClock))
        .with_settings(controller_config.settings());
    let controller = SessionController::new(env);
    controller.on_phase_change(|phase, session| {
        let hold = session
            .hold_id
            .as_ref()
            .map_or_else(String::new, |id| format!(" (hold {id})"));
        println!("> {phase}{hold}");
    });

    println!(
        "Holding seats {:?} for show {} ...",
        request.seat_ids, request.show_id
    );
    controller
        .submit_hold(request)
        .await
        .context("submitting the hold")?;

    let outcome = drive(&controller).await?;
    print_outcome(&outcome);

    Ok(if outcome.phase == Phase::Confirmed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Follow the session until it ends, relaying Enter and Ctrl-C
async fn drive(controller: &SessionController) -> Result<BookingSession> {
    let mut snapshots = controller.subscribe();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut instructions_shown = false;
    let mut last_remaining = None;

    loop {
        let session = snapshots.borrow_and_update().clone();
        if session.is_terminal() {
            return Ok(session);
        }

        if session.phase == Phase::AwaitingPayment && !instructions_shown {
            if let Some(payment) = &session.payment {
                print_instructions(payment);
            }
            instructions_shown = true;
        }

        if controller.timer_running() && last_remaining != Some(session.remaining_seconds) {
            last_remaining = Some(session.remaining_seconds);
            if session.remaining_seconds % 30 == 0 || session.remaining_seconds <= 10 {
                println!("  {} left", format_countdown(session.remaining_seconds));
            }
        }

        tokio::select! {
            changed = snapshots.changed() => {
                changed.context("session loop stopped")?;
            }
            line = stdin.next_line(), if stdin_open => {
                if line?.is_none() {
                    stdin_open = false;
                } else if controller.phase() == Phase::AwaitingPayment {
                    if let Err(e) = controller.confirm_payment_sent().await {
                        warn!(error = %e, "Payment confirmation not accepted");
                    }
                } else {
                    println!("  nothing to confirm while {}", controller.phase());
                }
            }
            _ = signal::ctrl_c() => {
                println!("Cancelling ...");
                return Ok(controller.cancel_session().await?);
            }
        }
    }
}

fn print_instructions(payment: &PaymentInstructions) {
    println!();
    println!("Pay with {} to: {}", payment.method, payment.address);
    if let Some(amount) = payment.amount_label() {
        println!("Amount: {amount}");
    }
    println!("Press Enter once the payment is sent.");
    println!();
}

fn print_outcome(session: &BookingSession) {
    match (session.phase, &session.booking) {
        (Phase::Confirmed, Some(booking)) => {
            println!("Booking confirmed");
            if let Some(id) = &booking.booking_id {
                println!("  booking  {id}");
            }
            println!("  movie    {} at {}", booking.movie_name, booking.theatre_name);
            if let Some(show_time) = booking.show_time {
                println!("  show     {}", show_time.format("%a %d %b %Y %H:%M"));
            }
            println!("  seats    {}", booking.seat_labels().join("; "));
            println!("  amount   {}", format_amount(booking.amount));
        },
        (Phase::Confirmed, None) => println!("Booking confirmed"),
        (phase, _) => println!(
            "Booking {phase}: {}",
            session.last_error.as_deref().unwrap_or("no details")
        ),
    }
}
