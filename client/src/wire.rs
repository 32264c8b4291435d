//! Response bodies as the booking backend sends them.
//!
//! Every field is optional: the backend omits fields freely and the client
//! decides what a missing value means.

use boxoffice_core::types::{HoldId, HoldResult};
use serde::Deserialize;

/// `{message}` body attached to 4xx answers
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Parse an error body, tolerating empty and non-JSON payloads
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    /// The message if it is non-blank, otherwise `fallback`
    #[must_use]
    pub fn message_or(self, fallback: &str) -> String {
        self.message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Answer to `POST /booking/seats`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldBody {
    #[serde(default)]
    hold_id: Option<String>,
    #[serde(default)]
    payment_address: Option<String>,
    #[serde(default)]
    payment_method: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    message: Option<String>,
}

impl HoldBody {
    /// Convert into a hold, or `None` when the hold id is missing or blank
    #[must_use]
    pub fn into_hold(self) -> Option<HoldResult> {
        let hold_id = self
            .hold_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())?;
        Some(HoldResult {
            hold_id: HoldId::new(hold_id),
            payment_address: self.payment_address,
            payment_method: self.payment_method,
            price: self.price,
            message: self.message,
        })
    }
}

/// Answer to `GET /api/payments/status/{method}/{address}`
///
/// The backend mirrors the outcome in `status` and may answer HTTP 200 for
/// every outcome, so `status` wins over the transport status code.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentStatusBody {
    /// Outcome code: 200 paid, 202 pending, 400 failed
    #[serde(default)]
    pub status: Option<u16>,
    /// Human-readable detail
    #[serde(default)]
    pub message: Option<String>,
}

impl PaymentStatusBody {
    /// Parse a status body, tolerating empty and non-JSON payloads
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn hold_body_requires_a_hold_id() {
        let body: HoldBody = serde_json::from_str(r#"{"holdId":"  "}"#).unwrap();
        assert!(body.into_hold().is_none());

        let body: HoldBody = serde_json::from_str(r#"{"paymentAddress":"addr"}"#).unwrap();
        assert!(body.into_hold().is_none());
    }

    #[test]
    fn hold_body_keeps_payment_fields() {
        let body: HoldBody = serde_json::from_str(
            r#"{"holdId":"H2","paymentAddress":"addr","paymentMethod":"upi","price":300}"#,
        )
        .unwrap();
        let hold = body.into_hold().unwrap();
        assert_eq!(hold.hold_id, HoldId::new("H2"));
        assert_eq!(hold.payment_address.as_deref(), Some("addr"));
        assert_eq!(hold.payment_method.as_deref(), Some("upi"));
        assert_eq!(hold.price, Some(300.0));
    }

    #[test]
    fn unparsable_bodies_are_empty() {
        assert!(ErrorBody::parse("<html>").message.is_none());
        assert_eq!(ErrorBody::parse("").message_or("fallback"), "fallback");
        assert!(PaymentStatusBody::parse("not json").status.is_none());
    }

    #[test]
    fn status_body_reads_code_and_message() {
        let body = PaymentStatusBody::parse(r#"{"status":400,"message":"Amount too low"}"#);
        assert_eq!(body.status, Some(400));
        assert_eq!(body.message.as_deref(), Some("Amount too low"));
    }
}
