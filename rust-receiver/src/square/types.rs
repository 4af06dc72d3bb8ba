//! Connect API response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payment returned by the v1 Retrieve Payment endpoint.
///
/// Only the fields the export needs are typed; `itemizations` stays opaque
/// JSON because it is written out verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetail {
    /// Payment ID
    #[serde(default)]
    pub id: Option<String>,
    /// Dashboard URL of the payment
    #[serde(default)]
    pub payment_url: Option<String>,
    /// Customer-facing receipt URL
    #[serde(default)]
    pub receipt_url: Option<String>,
    /// RFC 3339 creation time
    #[serde(default)]
    pub created_at: Option<String>,
    /// V1PaymentItemization[]
    #[serde(default)]
    pub itemizations: Value,
}
