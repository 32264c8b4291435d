//! Command-line arguments.

use boxoffice_core::error::BookingError;
use boxoffice_core::types::{HoldRequest, PaymentMethod};
use clap::Parser;
use std::str::FromStr;

/// Hold seats for a show and follow the booking until it settles
///
/// Press Enter once the payment is sent; Ctrl-C abandons the session.
#[derive(Debug, Parser)]
#[command(name = "boxoffice")]
#[command(version, about, long_about = None)]
pub struct Invocation {
    /// Show to book
    pub show_id: i64,
    /// Seats to hold, comma-separated (e.g. 12,13,14)
    #[arg(value_delimiter = ',', num_args = 1, required = true, action = clap::ArgAction::Set)]
    pub seat_ids: Vec<i64>,
    /// Payment method: UPI, ETH, CARD, WALLET or NETBANKING
    #[arg(value_parser = PaymentMethod::from_str)]
    pub method: PaymentMethod,
    /// Ten-digit contact number
    pub phone: String,
}

impl Invocation {
    /// Build the validated hold request
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] for a duplicated seat or a phone
    /// number that is not ten digits.
    pub fn into_request(self) -> Result<HoldRequest, BookingError> {
        HoldRequest::new(self.show_id, self.seat_ids, self.method, &self.phone)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Invocation, clap::Error> {
        Invocation::try_parse_from(std::iter::once("boxoffice").chain(args.iter().copied()))
    }

    #[test]
    fn command_definition_is_consistent() {
        Invocation::command().debug_assert();
    }

    #[test]
    fn parses_a_full_invocation() {
        let request = parse(&["7", "12,13,14", "eth", "9876543210"])
            .unwrap()
            .into_request()
            .unwrap();
        assert_eq!(request.show_id, 7);
        assert_eq!(request.seat_ids, vec![12, 13, 14]);
        assert_eq!(request.payment_method, PaymentMethod::Eth);
        assert_eq!(request.phone_number.as_str(), "9876543210");
    }

    #[test]
    fn rejects_missing_or_malformed_arguments() {
        assert!(parse(&["7", "12"]).is_err());
        assert!(parse(&["seven", "12", "UPI", "9876543210"]).is_err());
        assert!(parse(&["7", "12,x", "UPI", "9876543210"]).is_err());

        let err = parse(&["7", "12", "CASH", "9876543210"]).unwrap_err();
        assert!(err.to_string().contains("Unsupported payment method: CASH"));
    }

    #[test]
    fn request_validation_runs_after_parsing() {
        let err = parse(&["7", "12,12", "UPI", "9876543210"])
            .unwrap()
            .into_request()
            .unwrap_err();
        assert_eq!(err.to_string(), "Seat 12 selected more than once");

        let err = parse(&["7", "12", "UPI", "98765"])
            .unwrap()
            .into_request()
            .unwrap_err();
        assert_eq!(err.to_string(), "Phone number must be exactly 10 digits");
    }
}
