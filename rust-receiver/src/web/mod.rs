//! Web server module for handling inbound webhooks.
//!
//! This module provides:
//! - Square signature verification
//! - The webhook and health endpoints
//! - The router wiring them together

pub mod handlers;
pub mod signature;

use axum::{
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{health, square_webhook, AppState, HealthResponse, WebhookResponse};
pub use signature::{sign, verify, SignatureAlgorithm, SignatureVerifier, SIGNATURE_HEADER};

/// Path Square is configured to post notifications to.
pub const WEBHOOK_PATH: &str = "/webhooks/square";

/// Build the application router.
///
/// The webhook route accepts every method so non-POST requests reach the
/// pipeline and are acknowledged as ignored.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(WEBHOOK_PATH, any(square_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
