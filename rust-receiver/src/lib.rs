//! Squarehook - Square payment webhook receiver.
//!
//! This library provides the modules behind two binaries:
//! - `squarehook-web`: Web server receiving Square notifications
//! - `squarehook-sign`: Computes notification signatures for manual testing
//!
//! ## Architecture
//!
//! ```text
//! Square → Web Server → verify → parse → Connect API fetch → daily CSV export
//! ```

pub mod config;
pub mod process;
pub mod sink;
pub mod square;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use process::{
    Event, ExportRecord, Outcome, ParseError, WebhookError, WebhookProcessor, WebhookRequest,
};
pub use sink::{DailyCsvSink, RecordSink, SinkError};
pub use square::{ConnectClient, FetchError, PaymentDetail, ResourceFetcher, RetryingFetcher};
pub use web::{AppState, SignatureAlgorithm, SignatureVerifier};
