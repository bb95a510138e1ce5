//! Tabular export of finished jobs.
//!
//! The sink is an interface; the built-in implementation writes JSON lines.
//! Layout-heavy formats (spreadsheets) are expected to implement the same
//! trait out of tree.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::CollectError;
use crate::job::{CollectionJob, JobStatus};

pub trait ExportSink: Send + Sync {
    /// Writes one table: `headers` names the columns, each row aligns with it.
    ///
    /// # Errors
    ///
    /// [`CollectError::Io`] or [`CollectError::Serde`] from the backing medium.
    fn write(&mut self, headers: &[String], rows: &[Vec<String>]) -> Result<(), CollectError>;
}

const BASE_HEADERS: [&str; 4] = ["identity_id", "status", "error", "notes"];

/// Flattens terminal jobs into a header row plus data rows.
///
/// Base columns come first, then the sorted union of every field name seen
/// across the jobs' records, so all rows align even when jobs collected
/// different subsets.
#[must_use]
pub fn export_table(jobs: &[CollectionJob]) -> (Vec<String>, Vec<Vec<String>>) {
    let terminal: Vec<&CollectionJob> = jobs.iter().filter(|j| j.is_terminal()).collect();

    let field_names: BTreeSet<&String> = terminal.iter().flat_map(|j| j.record.keys()).collect();

    let mut headers: Vec<String> = BASE_HEADERS.iter().map(ToString::to_string).collect();
    headers.extend(field_names.iter().map(|name| (*name).clone()));

    let rows = terminal
        .iter()
        .map(|job| {
            let status = if job.status == JobStatus::Completed {
                "completed"
            } else {
                "failed"
            };
            let mut row = vec![
                job.identity_id.clone(),
                status.to_string(),
                job.error.clone().unwrap_or_default(),
                job.failure_notes.join("; "),
            ];
            row.extend(
                field_names
                    .iter()
                    .map(|name| job.record.get(*name).cloned().unwrap_or_default()),
            );
            row
        })
        .collect();

    (headers, rows)
}

/// Sink writing one JSON object per row, keyed by header.
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ExportSink for JsonLinesSink {
    fn write(&mut self, headers: &[String], rows: &[Vec<String>]) -> Result<(), CollectError> {
        use std::io::Write as _;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(&self.path)?;
        let mut out = std::io::BufWriter::new(file);
        for row in rows {
            let object: serde_json::Map<String, serde_json::Value> = headers
                .iter()
                .zip(row)
                .map(|(h, v)| (h.clone(), serde_json::Value::String(v.clone())))
                .collect();
            serde_json::to_writer(&mut out, &object)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(())
    }
}
