//! Retrying decorator for [`ResourceFetcher`]s.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::time::sleep;
use tracing::{info, warn};

use super::{FetchError, PaymentDetail, ResourceFetcher};

/// Retries transient fetch failures with a random delay between attempts.
///
/// Permanent failures (4xx other than 429, undecodable bodies) are returned
/// immediately.
pub struct RetryingFetcher<F> {
    inner: F,
    max_attempts: u32,
    delay_ms: (u64, u64),
}

impl<F> RetryingFetcher<F> {
    /// `max_attempts` counts the first attempt; values below 1 are treated as 1.
    pub fn new(inner: F, max_attempts: u32, delay_ms: (u64, u64)) -> Self {
        let (min, max) = delay_ms;
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            delay_ms: (min.min(max), max.max(min)),
        }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: ResourceFetcher> ResourceFetcher for RetryingFetcher<F> {
    async fn fetch(&self, entity_id: &str, location_id: &str) -> Result<PaymentDetail, FetchError> {
        let mut attempt = 1;

        loop {
            match self.inner.fetch(entity_id, location_id).await {
                Ok(detail) => {
                    if attempt > 1 {
                        info!(entity_id = %entity_id, attempt = attempt, "fetch_retry_succeeded");
                    }
                    return Ok(detail);
                }
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    // ThreadRng is not Send, so draw before awaiting
                    let delay_ms = rand::thread_rng().gen_range(self.delay_ms.0..=self.delay_ms.1);

                    warn!(
                        entity_id = %entity_id,
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay_ms,
                        error = %e,
                        "fetch_retry_scheduled"
                    );

                    sleep(Duration::from_millis(delay_ms)).await;
                    attempt += 1;
                }
                Err(e) => {
                    if attempt > 1 {
                        warn!(
                            entity_id = %entity_id,
                            attempt = attempt,
                            error = %e,
                            "fetch_retry_exhausted"
                        );
                    }
                    return Err(e);
                }
            }
        }
    }
}
