//! Daily CSV export: one append-only file per calendar day.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use tokio::sync::Mutex;
use tracing::info;

use super::{RecordSink, SinkError};
use crate::process::ExportRecord;

/// Writes each record as one row of `<dir>/webhooks_<YYYYMMDD>.csv`.
///
/// The header row is written when a day's file is first created. Writes from
/// concurrent requests are serialized, so clones of one sink may be shared
/// freely.
#[derive(Debug, Clone)]
pub struct DailyCsvSink {
    dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl DailyCsvSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Export file for a given day.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("webhooks_{}.csv", date.format("%Y%m%d")))
    }

    /// Append to the file for `date`.
    pub async fn append_on(&self, date: NaiveDate, record: ExportRecord) -> Result<(), SinkError> {
        let path = self.path_for(date);
        let payment_id = record.payment_id.clone();

        let _guard = self.write_lock.lock().await;
        let write_path = path.clone();
        let header_written =
            tokio::task::spawn_blocking(move || write_row(&write_path, &record)).await??;

        info!(
            payment_id = %payment_id,
            path = %path.display(),
            header_written = header_written,
            "csv_export_appended"
        );

        Ok(())
    }
}

#[async_trait]
impl RecordSink for DailyCsvSink {
    async fn append(&self, record: ExportRecord) -> Result<(), SinkError> {
        self.append_on(Local::now().date_naive(), record).await
    }
}

/// Append one row, preceded by the header if the file is empty.
///
/// Returns whether the header was written.
fn write_row(path: &Path, record: &ExportRecord) -> Result<bool, SinkError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let needs_header = file.metadata()?.len() == 0;

    let mut writer = ::csv::Writer::from_writer(file);
    if needs_header {
        writer.write_record(ExportRecord::COLUMNS)?;
    }
    writer.write_record(record.fields().iter().map(|(_, value)| *value))?;
    writer.flush()?;

    Ok(needs_header)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(payment_id: &str) -> ExportRecord {
        ExportRecord {
            payment_id: payment_id.to_string(),
            location_id: "L1".to_string(),
            payment_url: "https://x".to_string(),
            itemizations: r#"[{"name":"Coffee, large"}]"#.to_string(),
            callback_body: r#"{"event_type":"PAYMENT_UPDATED"}"#.to_string(),
        }
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_path_for() {
        let sink = DailyCsvSink::new("/var/exports");
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();

        assert_eq!(
            sink.path_for(date),
            PathBuf::from("/var/exports/webhooks_20240307.csv")
        );
    }

    #[tokio::test]
    async fn test_append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DailyCsvSink::new(dir.path());
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();

        sink.append_on(date, record("E1")).await.unwrap();
        sink.append_on(date, record("E2")).await.unwrap();

        let rows = read_rows(&sink.path_for(date));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], ExportRecord::COLUMNS);
        assert_eq!(rows[1][0], "E1");
        assert_eq!(rows[2][0], "E2");
        // Quoted field survives the comma
        assert_eq!(rows[1][3], r#"[{"name":"Coffee, large"}]"#);
        assert_eq!(rows[1][4], r#"{"event_type":"PAYMENT_UPDATED"}"#);
    }

    #[tokio::test]
    async fn test_append_separates_days() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DailyCsvSink::new(dir.path());
        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

        sink.append_on(monday, record("E1")).await.unwrap();
        sink.append_on(tuesday, record("E2")).await.unwrap();

        assert_eq!(read_rows(&sink.path_for(monday)).len(), 2);
        assert_eq!(read_rows(&sink.path_for(tuesday)).len(), 2);
    }

    #[tokio::test]
    async fn test_append_uses_today() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DailyCsvSink::new(dir.path());

        sink.append(record("E1")).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("webhooks_"));
        assert!(names[0].ends_with(".csv"));
        assert_eq!(names[0].len(), "webhooks_YYYYMMDD.csv".len());
    }

    #[tokio::test]
    async fn test_concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DailyCsvSink::new(dir.path());
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();

        let writes = (0..20).map(|i| {
            let sink = sink.clone();
            async move { sink.append_on(date, record(&format!("E{}", i))).await }
        });
        for result in futures::future::join_all(writes).await {
            result.unwrap();
        }

        let rows = read_rows(&sink.path_for(date));
        assert_eq!(rows.len(), 21);
        assert!(rows.iter().all(|row| row.len() == 5));
    }

    #[tokio::test]
    async fn test_append_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DailyCsvSink::new(dir.path().join("missing"));

        let result = sink.append(record("E1")).await;

        assert!(matches!(result, Err(SinkError::Io(_))));
    }
}
