// src/export.rs

use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::{error::Result, history::HistoryBuffer, ingest::RowTable};

pub const HISTORY_HEADER: [&str; 3] = ["time", "batch_id", "defect_probability"];

/// A CSV document ready to be handed to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub file_name: String,
    pub contents: String,
}

impl CsvExport {
    pub fn as_bytes(&self) -> &[u8] {
        self.contents.as_bytes()
    }

    /// Write under `dir` (created if missing) and return the full path.
    pub async fn save_in(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await?;
        let path = dir.join(&self.file_name);
        fs::write(&path, self.as_bytes()).await?;
        info!(path = %path.display(), bytes = self.contents.len(), "export saved");
        Ok(path)
    }
}

fn join_lines(lines: impl Iterator<Item = String>) -> String {
    lines.collect::<Vec<_>>().join("\n")
}

/// The uploaded rows as CSV, columns in parsed order. Values are joined
/// with bare commas, exactly as they were read.
pub fn export_rows(table: &RowTable, today: NaiveDate) -> Option<CsvExport> {
    if table.is_empty() {
        return None;
    }

    let header = table.columns().join(",");
    let body = table
        .rows()
        .iter()
        .map(|row| row.iter().map(|(_, v)| v).collect::<Vec<_>>().join(","));

    Some(CsvExport {
        file_name: format!("original_data_{}.csv", today.format("%Y-%m-%d")),
        contents: join_lines(std::iter::once(header).chain(body)),
    })
}

/// Prediction history as `time,batch_id,defect_probability`, oldest first.
pub fn export_history(history: &HistoryBuffer, today: NaiveDate) -> Option<CsvExport> {
    if history.is_empty() {
        return None;
    }

    let header = HISTORY_HEADER.join(",");
    let body = history.iter().map(|entry| {
        format!(
            "{},{},{:.2}",
            entry.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            entry.batch_id,
            entry.defect_probability
        )
    });

    Some(CsvExport {
        file_name: format!("prediction_history_{}.csv", today.format("%Y-%m-%d")),
        contents: join_lines(std::iter::once(header).chain(body)),
    })
}
