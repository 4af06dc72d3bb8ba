//! Webhook endpoint handlers.
//!
//! The handler only adapts HTTP to the processing pipeline: it collects the
//! method, raw body and signature header, runs the pipeline, and maps its
//! outcome to a status code the sender understands.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::process::{Outcome, WebhookError, WebhookProcessor, WebhookRequest};
use crate::web::signature::SIGNATURE_HEADER;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub processor: WebhookProcessor,
}

impl AppState {
    pub fn new(processor: WebhookProcessor) -> Self {
        Self { processor }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Square Webhook
// =============================================================================

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
}

impl WebhookResponse {
    fn status(status: &'static str) -> Self {
        Self {
            status,
            payment_id: None,
        }
    }
}

/// Square webhook endpoint.
///
/// Responses:
/// - 200 for exported payments, non-POST requests and events we will never
///   handle, so Square stops redelivering them
/// - 401 for invalid signatures
/// - 502/500 when fetching or exporting failed, so Square redelivers
pub async fn square_webhook(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let request = WebhookRequest::new(method.as_str(), body.to_vec(), signature);

    let (status, response) = match state.processor.handle(request).await {
        Ok(Outcome::Exported { payment_id, .. }) => (
            StatusCode::OK,
            WebhookResponse {
                status: "exported",
                payment_id: Some(payment_id),
            },
        ),
        Ok(Outcome::Ignored) => (StatusCode::OK, WebhookResponse::status("ignored")),
        Err(e) => error_response(&e),
    };

    info!(
        status = status.as_u16(),
        outcome = response.status,
        "square_webhook_responded"
    );

    (status, Json(response))
}

fn error_response(error: &WebhookError) -> (StatusCode, WebhookResponse) {
    match error {
        WebhookError::SignatureInvalid => {
            (StatusCode::UNAUTHORIZED, WebhookResponse::status("unauthorized"))
        }
        WebhookError::Parse(_) => (StatusCode::OK, WebhookResponse::status("ignored_event")),
        WebhookError::Dispatch(_) => {
            (StatusCode::BAD_GATEWAY, WebhookResponse::status("fetch_failed"))
        }
        WebhookError::Sink(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            WebhookResponse::status("sink_failed"),
        ),
    }
}
