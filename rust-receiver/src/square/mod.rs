//! Square Connect API access.
//!
//! This module provides:
//! - The [`ResourceFetcher`] seam the dispatcher fetches payments through
//! - An HTTP implementation against the Connect v1 API
//! - A retrying decorator for transient failures
//!
//! The dispatcher itself makes a single attempt per event; any retry policy
//! lives in the fetcher it is given.

pub mod client;
pub mod retry;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use client::ConnectClient;
pub use retry::RetryingFetcher;
pub use types::PaymentDetail;

/// Errors returned by a [`ResourceFetcher`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid payment response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("cannot build request URL from {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether another attempt could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(_) => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Decode(_) | FetchError::InvalidUrl(_) => false,
        }
    }
}

/// Fetches the authoritative payment a notification refers to.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Retrieve a payment by entity and location ID.
    async fn fetch(&self, entity_id: &str, location_id: &str) -> Result<PaymentDetail, FetchError>;
}
