//! Persistence of export records.
//!
//! The pipeline hands each [`ExportRecord`] to a [`RecordSink`] by value and
//! keeps nothing afterwards. File handles, connections and write ordering
//! belong to the sink.

pub mod csv;

use async_trait::async_trait;
use thiserror::Error;

use crate::process::ExportRecord;

pub use self::csv::DailyCsvSink;

/// Errors surfaced by a [`RecordSink`].
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("export I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("export CSV write failed: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("export task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Append-only destination for export records.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn append(&self, record: ExportRecord) -> Result<(), SinkError>;
}
