//! Event dispatch: one follow-up fetch per verified event.

use thiserror::Error;
use tracing::{debug, error, info};

use super::event::Event;
use super::export::{to_export_record, ExportRecord};
use crate::square::{FetchError, ResourceFetcher};

/// Failure while acting on a parsed event.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("fetching payment {entity_id} failed: {source}")]
    FetchFailed {
        entity_id: String,
        #[source]
        source: FetchError,
    },
}

/// Progress of a single event through dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Pending,
    Fetched,
    FetchFailed,
}

impl DispatchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchState::Pending => "pending",
            DispatchState::Fetched => "fetched",
            DispatchState::FetchFailed => "fetch_failed",
        }
    }
}

/// Fetch the resource an event refers to and build its export record.
///
/// Makes exactly one call to `fetcher`. No record is produced when the fetch
/// fails.
pub async fn dispatch(
    event: Event,
    fetcher: &dyn ResourceFetcher,
) -> Result<ExportRecord, DispatchError> {
    let (entity_id, location_id) = match &event {
        Event::PaymentUpdated(payment) => (payment.entity_id.as_str(), payment.location_id.as_str()),
    };

    info!(
        event_type = event.event_type(),
        entity_id = %entity_id,
        location_id = %location_id,
        state = DispatchState::Pending.as_str(),
        "dispatch_start"
    );

    match fetcher.fetch(entity_id, location_id).await {
        Ok(detail) => {
            info!(
                entity_id = %entity_id,
                state = DispatchState::Fetched.as_str(),
                has_payment_url = detail.payment_url.is_some(),
                "dispatch_complete"
            );
            debug!(
                entity_id = %entity_id,
                payment_id = detail.id.as_deref().unwrap_or_default(),
                created_at = detail.created_at.as_deref().unwrap_or_default(),
                detail = %serde_json::to_string(&detail).unwrap_or_default(),
                "payment_fetched"
            );
            Ok(to_export_record(&event, &detail))
        }
        Err(e) => {
            error!(
                entity_id = %entity_id,
                location_id = %location_id,
                state = DispatchState::FetchFailed.as_str(),
                transient = e.is_transient(),
                error = %e,
                "dispatch_failed"
            );
            Err(DispatchError::FetchFailed {
                entity_id: entity_id.to_string(),
                source: e,
            })
        }
    }
}
