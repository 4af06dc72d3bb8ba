//! Flattening of a fetched payment into one export row.

use super::event::Event;
use crate::square::PaymentDetail;

/// One row of the payment export.
///
/// Values are written in the same column order as the legacy header-less
/// export; the header row naming them is new.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRecord {
    pub payment_id: String,
    pub location_id: String,
    pub payment_url: String,
    /// JSON-encoded itemization list
    pub itemizations: String,
    /// Notification body as received
    pub callback_body: String,
}

impl ExportRecord {
    /// Column names in write order.
    pub const COLUMNS: [&'static str; 5] = [
        "paymentId",
        "locationId",
        "payment_url",
        "itemizations",
        "callbackBody",
    ];

    /// Field values paired with their column names.
    pub fn fields(&self) -> [(&'static str, &str); 5] {
        [
            (Self::COLUMNS[0], self.payment_id.as_str()),
            (Self::COLUMNS[1], self.location_id.as_str()),
            (Self::COLUMNS[2], self.payment_url.as_str()),
            (Self::COLUMNS[3], self.itemizations.as_str()),
            (Self::COLUMNS[4], self.callback_body.as_str()),
        ]
    }
}

/// Build the export row for an event and its fetched payment.
pub fn to_export_record(event: &Event, detail: &PaymentDetail) -> ExportRecord {
    match event {
        Event::PaymentUpdated(payment) => ExportRecord {
            payment_id: payment.entity_id.clone(),
            location_id: payment.location_id.clone(),
            payment_url: detail.payment_url.clone().unwrap_or_default(),
            itemizations: detail.itemizations.to_string(),
            callback_body: payment.raw_body.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::event::PaymentUpdated;
    use serde_json::{json, Value};

    fn payment_event() -> Event {
        Event::PaymentUpdated(PaymentUpdated {
            entity_id: "E1".to_string(),
            location_id: "L1".to_string(),
            raw_body: r#"{"event_type":"PAYMENT_UPDATED","entity_id":"E1","location_id":"L1"}"#
                .to_string(),
        })
    }

    #[test]
    fn test_to_export_record() {
        let detail = PaymentDetail {
            payment_url: Some("https://x".to_string()),
            itemizations: json!([{"name": "Coffee", "quantity": "2.00000000"}]),
            ..Default::default()
        };

        let record = to_export_record(&payment_event(), &detail);

        assert_eq!(record.payment_id, "E1");
        assert_eq!(record.location_id, "L1");
        assert_eq!(record.payment_url, "https://x");
        assert_eq!(
            record.itemizations,
            r#"[{"name":"Coffee","quantity":"2.00000000"}]"#
        );
        assert!(record.callback_body.starts_with(r#"{"event_type":"PAYMENT_UPDATED""#));
    }

    #[test]
    fn test_to_export_record_missing_fields() {
        let record = to_export_record(&payment_event(), &PaymentDetail::default());

        assert_eq!(record.payment_url, "");
        assert_eq!(record.itemizations, "null");
    }

    #[test]
    fn test_itemizations_round_trip_as_json() {
        let itemizations = json!([{"name": "Tea", "modifiers": [{"name": "Oat milk"}]}]);
        let detail = PaymentDetail {
            itemizations: itemizations.clone(),
            ..Default::default()
        };

        let record = to_export_record(&payment_event(), &detail);
        let parsed: Value = serde_json::from_str(&record.itemizations).unwrap();

        assert_eq!(parsed, itemizations);
    }

    #[test]
    fn test_fields_follow_column_order() {
        let record = to_export_record(&payment_event(), &PaymentDetail::default());

        let names: Vec<&str> = record.fields().iter().map(|(name, _)| *name).collect();

        assert_eq!(names, ExportRecord::COLUMNS);
        assert_eq!(record.fields()[0].1, "E1");
    }
}
