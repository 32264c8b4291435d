//! Domain types for booking sessions.
//!
//! Field names follow the booking API's JSON (`camelCase`), so these types are
//! also the wire format for holds and booking records.

use crate::error::BookingError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque, server-assigned identifier of a seat hold
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HoldId(String);

impl HoldId {
    /// Wrap a server-issued hold id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the server sent an empty or whitespace-only id
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for HoldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Payment method
// ============================================================================

/// How the customer pays for a hold
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    /// Unified Payments Interface transfer to a VPA
    Upi,
    /// Ether transfer to a generated address
    Eth,
    /// Card payment
    Card,
    /// Wallet payment
    Wallet,
    /// Net banking
    NetBanking,
}

impl PaymentMethod {
    /// Upper-case code used in request bodies and status URLs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upi => "UPI",
            Self::Eth => "ETH",
            Self::Card => "CARD",
            Self::Wallet => "WALLET",
            Self::NetBanking => "NETBANKING",
        }
    }

    /// Crypto methods quote amounts in the coin rather than in rupees
    #[must_use]
    pub const fn is_crypto(self) -> bool {
        matches!(self, Self::Eth)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UPI" => Ok(Self::Upi),
            "ETH" => Ok(Self::Eth),
            "CARD" => Ok(Self::Card),
            "WALLET" => Ok(Self::Wallet),
            "NETBANKING" => Ok(Self::NetBanking),
            other => Err(BookingError::Validation(format!(
                "Unsupported payment method: {other}"
            ))),
        }
    }
}

// ============================================================================
// Phone number
// ============================================================================

/// Ten-digit customer phone number
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse a phone number, ignoring surrounding whitespace
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] unless the input is exactly ten ASCII digits.
    pub fn parse(raw: &str) -> Result<Self, BookingError> {
        let digits = raw.trim();
        if digits.len() == 10 && digits.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(digits.to_string()))
        } else {
            Err(BookingError::Validation(
                "Phone number must be exactly 10 digits".to_string(),
            ))
        }
    }

    /// Borrow the digits
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = BookingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Hold request / result
// ============================================================================

/// Seats the customer wants to hold, submitted once per session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldRequest {
    /// Show being booked
    pub show_id: i64,
    /// Selected seats, in selection order
    pub seat_ids: Vec<i64>,
    /// How the customer will pay
    pub payment_method: PaymentMethod,
    /// Contact number for the ticket
    pub phone_number: PhoneNumber,
}

impl HoldRequest {
    /// Build and validate a hold request
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] if no seat is selected, a seat is
    /// selected twice, or the phone number is not ten digits.
    pub fn new(
        show_id: i64,
        seat_ids: Vec<i64>,
        payment_method: PaymentMethod,
        phone_number: &str,
    ) -> Result<Self, BookingError> {
        let request = Self {
            show_id,
            seat_ids,
            payment_method,
            phone_number: PhoneNumber::parse(phone_number)?,
        };
        request.validate()?;
        Ok(request)
    }

    /// Check the seat selection
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] for an empty or duplicated selection.
    pub fn validate(&self) -> Result<(), BookingError> {
        if self.seat_ids.is_empty() {
            return Err(BookingError::Validation(
                "At least one seat must be selected".to_string(),
            ));
        }
        let mut seen = HashSet::with_capacity(self.seat_ids.len());
        if let Some(duplicate) = self.seat_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(BookingError::Validation(format!(
                "Seat {duplicate} selected more than once"
            )));
        }
        Ok(())
    }
}

/// Server answer to a successful hold
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldResult {
    /// Hold identifier used for every later lookup
    pub hold_id: HoldId,
    /// Where the customer must send the payment, if a payment step is required
    #[serde(default)]
    pub payment_address: Option<String>,
    /// Payment method the server expects
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Amount the payment must cover
    #[serde(default)]
    pub price: Option<f64>,
    /// Informational server message
    #[serde(default)]
    pub message: Option<String>,
}

impl HoldResult {
    /// A hold that needs no payment step
    #[must_use]
    pub fn without_payment(hold_id: impl Into<String>) -> Self {
        Self {
            hold_id: HoldId::new(hold_id),
            payment_address: None,
            payment_method: None,
            price: None,
            message: None,
        }
    }

    /// A hold that must be paid to `address`
    #[must_use]
    pub fn with_payment(
        hold_id: impl Into<String>,
        address: impl Into<String>,
        method: PaymentMethod,
        price: f64,
    ) -> Self {
        Self {
            hold_id: HoldId::new(hold_id),
            payment_address: Some(address.into()),
            payment_method: Some(method.as_str().to_string()),
            price: Some(price),
            message: None,
        }
    }

    /// Payment details, if the hold requires a payment step
    ///
    /// A blank or missing address means no payment step. A missing method falls
    /// back to the one the customer asked for.
    #[must_use]
    pub fn payment_instructions(&self, fallback: PaymentMethod) -> Option<PaymentInstructions> {
        let address = self
            .payment_address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())?;
        let method = self
            .payment_method
            .as_deref()
            .map(str::trim)
            .filter(|method| !method.is_empty())
            .map_or_else(|| fallback.as_str().to_string(), str::to_ascii_uppercase);

        Some(PaymentInstructions {
            method,
            address: address.to_string(),
            amount: self.price,
        })
    }
}

/// What the customer has to pay, and where
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentInstructions {
    /// Upper-case payment method code (`UPI`, `ETH`, ...)
    pub method: String,
    /// Payment address (VPA or wallet address)
    pub address: String,
    /// Required amount, as sent by the server
    pub amount: Option<f64>,
}

impl PaymentInstructions {
    /// Amount as shown to the customer: coin units for crypto, rupees otherwise
    #[must_use]
    pub fn amount_label(&self) -> Option<String> {
        let amount = self.amount?;
        match self.method.parse::<PaymentMethod>() {
            Ok(method) if method.is_crypto() => Some(format!("{amount} {}", self.method)),
            _ => Some(format_amount(amount)),
        }
    }
}

// ============================================================================
// Payment status
// ============================================================================

/// Result of one payment-status check
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentStatus {
    /// The payment arrived and covers the amount
    Success,
    /// No (sufficient) payment yet
    Pending,
    /// The payment could not be verified
    Failed {
        /// Human-readable reason
        message: String,
        /// `true` when the check itself failed (network, unknown status) and a
        /// later check may still succeed
        transient: bool,
    },
}

impl PaymentStatus {
    /// Map a payment-status code to a status
    ///
    /// 200 is success, 202 pending, 400 a definitive failure. Any other code is
    /// reported as a transient failure carrying a diagnostic.
    ///
    /// Transient failures do not end a session: the poller keeps checking
    /// until the payment settles or the hold window runs out. A gateway that
    /// briefly answers 5xx therefore cannot fail a booking the user already
    /// paid for. [`PaymentStatus::unreachable`] follows the same rule.
    #[must_use]
    pub fn from_status_code(code: u16, message: Option<&str>) -> Self {
        let message = message.map(str::trim).filter(|m| !m.is_empty());
        match code {
            200 => Self::Success,
            202 => Self::Pending,
            400 => Self::Failed {
                message: message
                    .unwrap_or("Payment failed. Please try again.")
                    .to_string(),
                transient: false,
            },
            other => Self::Failed {
                message: message.map_or_else(
                    || format!("Unexpected payment status {other}"),
                    |m| format!("Unexpected payment status {other}: {m}"),
                ),
                transient: true,
            },
        }
    }

    /// A transient failure for a check that never got an answer
    #[must_use]
    pub fn unreachable(reason: impl fmt::Display) -> Self {
        Self::Failed {
            message: format!("Error verifying payment: {reason}"),
            transient: true,
        }
    }

    /// Whether this status settles the payment one way or the other
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Failed {
                transient: false,
                ..
            }
        )
    }
}

// ============================================================================
// Bookings
// ============================================================================

/// One seat of a booking
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    /// Seat id, as used in hold requests
    pub seat_id: i64,
    /// Row letter
    #[serde(default)]
    pub row: String,
    /// Seat number within the row
    #[serde(default)]
    pub seat_no: i32,
    /// Pricing category
    #[serde(default)]
    pub category: String,
    /// Printed seat identifier (e.g. `A3`)
    #[serde(default)]
    pub seat_identifier: String,
}

impl Seat {
    /// `Row A, Seat 3`
    #[must_use]
    pub fn label(&self) -> String {
        format!("Row {}, Seat {}", self.row, self.seat_no)
    }
}

/// Server-side booking status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Not yet settled
    Pending,
    /// Seats are booked
    Confirmed,
    /// Booking failed
    Failed,
    /// Booking was cancelled
    Cancelled,
}

impl FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(BookingError::UnexpectedResponse(format!(
                "Unknown booking status: {other}"
            ))),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(label)
    }
}

/// Booking looked up by hold id
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    /// Show the booking belongs to
    #[serde(default)]
    pub show_id: Option<i64>,
    /// Movie title
    #[serde(default)]
    pub movie_name: String,
    /// Theatre name
    #[serde(default)]
    pub theatre_name: String,
    /// Show start
    #[serde(default, with = "server_datetime")]
    pub show_time: Option<NaiveDateTime>,
    /// Booked seats
    #[serde(default)]
    pub seats: Vec<Seat>,
    /// Contact number
    #[serde(default)]
    pub phone_number: String,
    /// When the booking was made
    #[serde(default, with = "server_datetime")]
    pub booking_time: Option<NaiveDateTime>,
    /// Total amount, as computed by the server
    #[serde(default)]
    pub amount: f64,
    /// Explicit status, when the server sends a recognised one
    #[serde(default, deserialize_with = "lenient::status")]
    pub status: Option<BookingStatus>,
    /// Server booking id, when assigned; numeric ids arrive as text
    #[serde(default, deserialize_with = "lenient::booking_id")]
    pub booking_id: Option<String>,
    /// Informational server message
    #[serde(default)]
    pub message: Option<String>,
}

impl BookingRecord {
    /// Status to act on
    ///
    /// The explicit status wins. Without one, a booking that lists seats counts
    /// as confirmed and an empty one as pending.
    #[must_use]
    pub fn effective_status(&self) -> BookingStatus {
        self.status.unwrap_or(if self.seats.is_empty() {
            BookingStatus::Pending
        } else {
            BookingStatus::Confirmed
        })
    }

    /// Seat labels, in booking order
    #[must_use]
    pub fn seat_labels(&self) -> Vec<String> {
        self.seats.iter().map(Seat::label).collect()
    }
}

/// Booking fields whose wire shape varies between server versions
mod lenient {
    use super::BookingStatus;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Text(String),
    }

    /// Unknown statuses read as absent, so seats decide
    pub fn status<'de, D>(deserializer: D) -> Result<Option<BookingStatus>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|status| status.parse().ok()))
    }

    pub fn booking_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
            Raw::Num(id) => id.to_string(),
            Raw::Text(id) => id,
        }))
    }
}

/// Date-times as the booking API emits them
///
/// The server serializes `LocalDateTime` either as an array
/// `[year, month, day, hour, minute, (second), (nanos)]` or as an ISO-8601
/// string; both are accepted. Output is always ISO-8601.
mod server_datetime {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Parts(Vec<i64>),
        Text(String),
    }

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => {
                serializer.serialize_str(&value.format("%Y-%m-%dT%H:%M:%S").to_string())
            },
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Raw::Parts(parts)) => from_parts(&parts)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date-time parts {parts:?}"))),
            Some(Raw::Text(text)) => from_text(&text)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date-time {text:?}"))),
        }
    }

    fn from_parts(parts: &[i64]) -> Option<NaiveDateTime> {
        if parts.len() < 5 {
            return None;
        }
        let field = |index: usize| -> Option<u32> {
            parts.get(index).map_or(Some(0), |value| u32::try_from(*value).ok())
        };
        let year = i32::try_from(parts[0]).ok()?;
        NaiveDate::from_ymd_opt(year, field(1)?, field(2)?)?.and_hms_nano_opt(
            field(3)?,
            field(4)?,
            field(5)?,
            field(6)?,
        )
    }

    fn from_text(text: &str) -> Option<NaiveDateTime> {
        let text = text.trim();
        NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M"))
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(text)
                    .ok()
                    .map(|dt| dt.naive_local())
            })
    }
}

// ============================================================================
// Display helpers
// ============================================================================

/// Remaining hold window as `mm:ss`
#[must_use]
pub fn format_countdown(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Rupee amount with two decimals, e.g. `₹300.00`
#[must_use]
pub fn format_amount(amount: f64) -> String {
    format!("₹{amount:.2}")
}

/// Total of per-seat prices, as quoted by the server
#[must_use]
pub fn seat_total<I>(prices: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    prices.into_iter().sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn hold_request_rejects_bad_input() {
        let err = HoldRequest::new(7, vec![], PaymentMethod::Upi, "9876543210").unwrap_err();
        assert_eq!(err.to_string(), "At least one seat must be selected");

        let err = HoldRequest::new(7, vec![1, 2, 1], PaymentMethod::Upi, "9876543210").unwrap_err();
        assert_eq!(err.to_string(), "Seat 1 selected more than once");

        let err = HoldRequest::new(7, vec![1], PaymentMethod::Upi, "98765-4321").unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[test]
    fn hold_request_serializes_like_the_api_expects() {
        let request = HoldRequest::new(12, vec![4, 5], PaymentMethod::Eth, " 9876543210 ").unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "showId": 12,
                "seatIds": [4, 5],
                "paymentMethod": "ETH",
                "phoneNumber": "9876543210"
            })
        );
    }

    #[test]
    fn payment_method_parsing_is_case_insensitive() {
        assert_eq!("upi".parse::<PaymentMethod>().unwrap(), PaymentMethod::Upi);
        assert_eq!(" NetBanking ".parse::<PaymentMethod>().unwrap(), PaymentMethod::NetBanking);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn payment_instructions_require_an_address() {
        let result: HoldResult = serde_json::from_str(r#"{"holdId":"H1"}"#).unwrap();
        assert!(result.payment_instructions(PaymentMethod::Upi).is_none());

        let blank: HoldResult =
            serde_json::from_str(r#"{"holdId":"H1","paymentAddress":"  "}"#).unwrap();
        assert!(blank.payment_instructions(PaymentMethod::Upi).is_none());
    }

    #[test]
    fn payment_instructions_fall_back_to_requested_method() {
        let result: HoldResult = serde_json::from_str(
            r#"{"holdId":"H2","paymentAddress":"addr","price":300.0,"message":"Seats held"}"#,
        )
        .unwrap();
        let instructions = result.payment_instructions(PaymentMethod::Eth).unwrap();
        assert_eq!(instructions.method, "ETH");
        assert_eq!(instructions.address, "addr");
        assert_eq!(instructions.amount, Some(300.0));
        assert_eq!(instructions.amount_label().unwrap(), "300 ETH");

        let upi = HoldResult::with_payment("H3", "shop@upi", PaymentMethod::Upi, 450.0);
        let instructions = upi.payment_instructions(PaymentMethod::Eth).unwrap();
        assert_eq!(instructions.method, "UPI");
        assert_eq!(instructions.amount_label().unwrap(), "₹450.00");
    }

    #[test]
    fn payment_status_codes_map_to_statuses() {
        assert_eq!(PaymentStatus::from_status_code(200, None), PaymentStatus::Success);
        assert_eq!(PaymentStatus::from_status_code(202, Some("waiting")), PaymentStatus::Pending);
        assert_eq!(
            PaymentStatus::from_status_code(400, Some("Insufficient amount")),
            PaymentStatus::Failed {
                message: "Insufficient amount".to_string(),
                transient: false
            }
        );
        let unknown = PaymentStatus::from_status_code(500, Some("boom"));
        assert!(!unknown.is_terminal());
        assert!(matches!(unknown, PaymentStatus::Failed { transient: true, .. }));
    }

    #[test]
    fn booking_record_accepts_array_dates() {
        let record: BookingRecord = serde_json::from_str(
            r#"{
                "showId": 3,
                "movieName": "Dune",
                "theatreName": "PVR",
                "showTime": [2025, 3, 14, 18, 30],
                "seats": [{"seatId": 1, "row": "A", "seatNo": 3, "category": "GOLD", "seatIdentifier": "A3"}],
                "phoneNumber": "9876543210",
                "bookingTime": [2025, 3, 10, 9, 15, 42, 500000000],
                "amount": 300.0
            }"#,
        )
        .unwrap();

        assert_eq!(
            record.show_time.unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 14)
                .unwrap()
                .and_hms_opt(18, 30, 0)
                .unwrap()
        );
        assert_eq!(record.booking_time.unwrap().second(), 42);
        assert_eq!(record.effective_status(), BookingStatus::Confirmed);
        assert_eq!(record.seat_labels(), vec!["Row A, Seat 3".to_string()]);
    }

    #[test]
    fn booking_record_accepts_iso_dates_and_explicit_status() {
        let record: BookingRecord = serde_json::from_str(
            r#"{"showTime":"2025-03-14T18:30:00","seats":[{"seatId":1}],"status":"PENDING"}"#,
        )
        .unwrap();
        assert_eq!(record.show_time.unwrap().hour(), 18);
        // An explicit status beats the seat-list heuristic
        assert_eq!(record.effective_status(), BookingStatus::Pending);

        let empty: BookingRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.effective_status(), BookingStatus::Pending);
    }

    #[test]
    fn booking_record_tolerates_numeric_ids_and_unknown_statuses() {
        let record: BookingRecord = serde_json::from_str(
            r#"{"bookingId":42,"status":"BOOKED","seats":[{"seatId":1}]}"#,
        )
        .unwrap();
        assert_eq!(record.booking_id.as_deref(), Some("42"));
        assert_eq!(record.status, None);
        assert_eq!(record.effective_status(), BookingStatus::Confirmed);

        let record: BookingRecord =
            serde_json::from_str(r#"{"bookingId":"BK-7","status":"cancelled"}"#).unwrap();
        assert_eq!(record.booking_id.as_deref(), Some("BK-7"));
        assert_eq!(record.effective_status(), BookingStatus::Cancelled);

        let record: BookingRecord =
            serde_json::from_str(r#"{"bookingId":null,"status":null}"#).unwrap();
        assert_eq!(record.booking_id, None);
        assert_eq!(record.effective_status(), BookingStatus::Pending);
    }

    #[test]
    fn display_helpers() {
        assert_eq!(format_countdown(300), "05:00");
        assert_eq!(format_countdown(61), "01:01");
        assert_eq!(format_countdown(0), "00:00");
        assert_eq!(format_amount(300.0), "₹300.00");
        assert!((seat_total([150.0, 150.0, 200.5]) - 500.5).abs() < f64::EPSILON);
    }
}
