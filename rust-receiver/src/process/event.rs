//! Notification envelope parsing.
//!
//! Square posts a small JSON envelope that only names the changed entity:
//!
//! ```json
//! {"merchant_id":"M1","location_id":"L1","event_type":"PAYMENT_UPDATED","entity_id":"E1"}
//! ```
//!
//! The envelope is decoded into a typed [`Event`]; anything else becomes a
//! [`ParseError`] so the caller can acknowledge it without fetching.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

/// Tag of the only notification type that triggers a fetch.
pub const PAYMENT_UPDATED: &str = "PAYMENT_UPDATED";

/// Why a body could not be turned into an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("notification has no event_type")]
    MissingType,

    /// Carries the original tag, e.g. `INVENTORY_UPDATED` or `TIMECARD_UPDATED`.
    #[error("unsupported event type {0}")]
    UnsupportedType(String),

    #[error("malformed event: {0}")]
    MalformedEvent(String),

    #[error("body is not a JSON object: {0}")]
    InvalidJson(String),
}

impl ParseError {
    /// Short label used in logs and responses.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::MissingType => "missing_type",
            ParseError::UnsupportedType(_) => "unsupported_type",
            ParseError::MalformedEvent(_) => "malformed_event",
            ParseError::InvalidJson(_) => "invalid_json",
        }
    }
}

/// A verified, decoded notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    PaymentUpdated(PaymentUpdated),
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::PaymentUpdated(_) => PAYMENT_UPDATED,
        }
    }

    /// The untouched request body, kept for export.
    pub fn raw_body(&self) -> &str {
        match self {
            Event::PaymentUpdated(p) => &p.raw_body,
        }
    }
}

/// `PAYMENT_UPDATED` notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentUpdated {
    /// ID of the updated payment
    pub entity_id: String,
    /// ID of the payment's location
    pub location_id: String,
    /// Request body as received
    pub raw_body: String,
}

/// Decode a notification body.
pub fn parse(body: &[u8]) -> Result<Event, ParseError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let object = match value {
        Value::Object(object) => object,
        other => {
            return Err(ParseError::InvalidJson(format!(
                "expected object, found {}",
                json_kind(&other)
            )))
        }
    };

    let event_type = match object.get("event_type") {
        None | Some(Value::Null) => return Err(ParseError::MissingType),
        Some(Value::String(tag)) => tag.as_str(),
        Some(other) => {
            return Err(ParseError::MalformedEvent(format!(
                "event_type must be a string, found {}",
                json_kind(other)
            )))
        }
    };

    match event_type {
        PAYMENT_UPDATED => {
            let entity_id = required_id(&object, "entity_id")?;
            let location_id = required_id(&object, "location_id")?;

            info!(
                event_type = PAYMENT_UPDATED,
                entity_id = %entity_id,
                location_id = %location_id,
                "square_event_parsed"
            );

            Ok(Event::PaymentUpdated(PaymentUpdated {
                entity_id,
                location_id,
                // from_slice above already rejected invalid UTF-8
                raw_body: String::from_utf8_lossy(body).into_owned(),
            }))
        }
        other => Err(ParseError::UnsupportedType(other.to_string())),
    }
}

fn required_id(object: &Map<String, Value>, field: &str) -> Result<String, ParseError> {
    match object.get(field) {
        Some(Value::String(id)) if id.trim().is_empty() => {
            Err(ParseError::MalformedEvent(format!("{} is empty", field)))
        }
        // Dot segments cannot address a single resource in a URL path
        Some(Value::String(id)) if id == "." || id == ".." => Err(ParseError::MalformedEvent(
            format!("{} is not a resource id: {:?}", field, id),
        )),
        Some(Value::String(id)) => Ok(id.clone()),
        None | Some(Value::Null) => Err(ParseError::MalformedEvent(format!("{} is missing", field))),
        Some(other) => Err(ParseError::MalformedEvent(format!(
            "{} must be a string, found {}",
            field,
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
