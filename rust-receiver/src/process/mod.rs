//! Notification processing pipeline.
//!
//! ## Processing Flow
//!
//! ```text
//! WebhookRequest → method gate → verify → parse → dispatch (fetch) → sink
//! ```
//!
//! Every stage returns an explicit outcome. Nothing here panics or aborts the
//! process; the HTTP layer decides how each error is answered.

pub mod dispatch;
pub mod event;
pub mod export;

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::sink::{RecordSink, SinkError};
use crate::square::ResourceFetcher;
use crate::web::signature::SignatureVerifier;

pub use dispatch::{dispatch, DispatchError, DispatchState};
pub use event::{parse, Event, ParseError, PaymentUpdated, PAYMENT_UPDATED};
pub use export::{to_export_record, ExportRecord};

/// Tracing target for rejected notifications.
pub const AUDIT_TARGET: &str = "squarehook::audit";

/// One inbound notification as received over HTTP.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    method: String,
    body: Vec<u8>,
    signature: String,
}

impl WebhookRequest {
    pub fn new(method: impl Into<String>, body: Vec<u8>, signature: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            body,
            signature: signature.into(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }
}

/// Successful handling of a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not a POST; nothing was checked or fetched.
    Ignored,
    /// The payment was fetched and its record handed to the sink.
    Exported {
        payment_id: String,
        location_id: String,
    },
}

/// Request-scoped failure of the pipeline.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook signature is invalid")]
    SignatureInvalid,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl WebhookError {
    /// Whether redelivering the same notification could succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            WebhookError::SignatureInvalid | WebhookError::Parse(_) => false,
            WebhookError::Dispatch(_) | WebhookError::Sink(_) => true,
        }
    }
}

/// Verifies, parses, dispatches and persists notifications.
///
/// Holds only read-only configuration and shared collaborators, so one
/// instance serves all concurrent requests.
#[derive(Clone)]
pub struct WebhookProcessor {
    verifier: SignatureVerifier,
    fetcher: Arc<dyn ResourceFetcher>,
    sink: Arc<dyn RecordSink>,
}

impl WebhookProcessor {
    pub fn new(
        verifier: SignatureVerifier,
        fetcher: Arc<dyn ResourceFetcher>,
        sink: Arc<dyn RecordSink>,
    ) -> Self {
        Self {
            verifier,
            fetcher,
            sink,
        }
    }

    /// Process one notification end to end.
    pub async fn handle(&self, request: WebhookRequest) -> Result<Outcome, WebhookError> {
        info!(
            method = %request.method(),
            body_length = request.body().len(),
            has_signature = !request.signature().is_empty(),
            "square_webhook_received"
        );

        if request.method() != "POST" {
            info!(method = %request.method(), "square_webhook_ignored_non_post");
            return Ok(Outcome::Ignored);
        }

        if !self.verifier.verify(request.body(), request.signature()) {
            warn!(
                target: AUDIT_TARGET,
                body_length = request.body().len(),
                has_signature = !request.signature().is_empty(),
                algorithm = %self.verifier.algorithm(),
                "square_webhook_rejected_invalid_signature"
            );
            return Err(WebhookError::SignatureInvalid);
        }

        let event = parse(request.body()).map_err(|e| {
            match &e {
                ParseError::UnsupportedType(tag) => {
                    info!(event_type = %tag, "square_webhook_unsupported_event")
                }
                other => warn!(kind = other.kind(), error = %other, "square_webhook_parse_failed"),
            }
            e
        })?;

        let record = dispatch(event, self.fetcher.as_ref()).await?;

        let outcome = Outcome::Exported {
            payment_id: record.payment_id.clone(),
            location_id: record.location_id.clone(),
        };

        if let Err(e) = self.sink.append(record).await {
            error!(error = %e, "square_webhook_sink_failed");
            return Err(e.into());
        }

        info!(outcome = ?outcome, "square_webhook_processed");

        Ok(outcome)
    }
}
