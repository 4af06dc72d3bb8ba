//! HTTP client for the Connect v1 Retrieve Payment endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::{info, warn};
use url::Url;

use super::{FetchError, PaymentDetail, ResourceFetcher};

/// Longest response body kept in a [`FetchError::Status`].
const ERROR_BODY_LIMIT: usize = 512;

/// Connect API client authenticated with a bearer token.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct ConnectClient {
    http: Client,
    base_url: Url,
    access_token: String,
}

impl ConnectClient {
    /// Create a client with the given request timeout.
    pub fn new(base_url: Url, access_token: String, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(16)
            .build()?;

        Ok(Self::with_client(http, base_url, access_token))
    }

    /// Create a client around an existing HTTP client.
    pub fn with_client(http: Client, base_url: Url, access_token: String) -> Self {
        Self {
            http,
            base_url,
            access_token,
        }
    }

    /// `{base}/v1/{location_id}/payments/{payment_id}`, with each ID
    /// percent-encoded as a single path segment.
    ///
    /// `.` and `..` are rejected: the URL parser would resolve them away and
    /// the request would land on a different endpoint.
    pub fn payment_url(&self, location_id: &str, payment_id: &str) -> Result<Url, FetchError> {
        for id in [location_id, payment_id] {
            if is_dot_segment(id) {
                return Err(FetchError::InvalidUrl(format!(
                    "{}v1/{}/payments/{}",
                    self.base_url, location_id, payment_id
                )));
            }
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["v1", location_id, "payments", payment_id]);
        Ok(url)
    }
}

fn is_dot_segment(id: &str) -> bool {
    id == "." || id == ".."
}

#[async_trait]
impl ResourceFetcher for ConnectClient {
    async fn fetch(&self, entity_id: &str, location_id: &str) -> Result<PaymentDetail, FetchError> {
        let url = self.payment_url(location_id, entity_id)?;

        info!(
            entity_id = %entity_id,
            location_id = %location_id,
            "connect_payment_fetch_start"
        );

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let preview = String::from_utf8_lossy(&body[..body.len().min(ERROR_BODY_LIMIT)])
                .into_owned();
            warn!(
                entity_id = %entity_id,
                status = status.as_u16(),
                body_preview = %preview,
                "connect_payment_fetch_status"
            );
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: preview,
            });
        }

        let detail: PaymentDetail = serde_json::from_slice(&body)?;

        info!(
            entity_id = %entity_id,
            status = status.as_u16(),
            body_length = body.len(),
            has_payment_url = detail.payment_url.is_some(),
            "connect_payment_fetch_complete"
        );

        Ok(detail)
    }
}
