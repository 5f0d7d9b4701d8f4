// src/ingest/parse.rs

use std::{collections::HashMap, path::Path, sync::Arc};
use tracing::{debug, warn};

use super::{RawRow, RowTable};
use crate::error::{Result, WorkspaceError};

const CSV_CONTENT_TYPE: &str = "text/csv";

/// Accept an upload when either its declared content type or its file name says CSV.
pub fn ensure_csv(file_name: &str, content_type: Option<&str>) -> Result<()> {
    let by_type = content_type
        .map(|t| t.split(';').next().unwrap_or("").trim().eq_ignore_ascii_case(CSV_CONTENT_TYPE))
        .unwrap_or(false);
    let by_name = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if by_type || by_name {
        Ok(())
    } else {
        warn!(file_name, ?content_type, "rejected non-CSV upload");
        Err(WorkspaceError::Format(file_name.to_string()))
    }
}

/// Trim whitespace only; quotes are kept as-is.
fn clean_cell(raw: &str) -> String {
    raw.trim().to_string()
}

/// Parse uploaded text into rows keyed by the header line.
///
/// Lines are split on every raw comma, so quoted fields containing
/// commas are not supported. Blank lines are skipped everywhere. Short
/// lines are padded with empty values and surplus values are dropped.
/// Repeated header names keep their first position and the last value.
pub fn parse_csv_text(text: &str) -> RowTable {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return RowTable::default();
    };
    let headers: Vec<String> = header_line.split(',').map(clean_cell).collect();

    let mut unique: Vec<String> = Vec::with_capacity(headers.len());
    for header in &headers {
        if !unique.contains(header) {
            unique.push(header.clone());
        }
    }
    if unique.len() != headers.len() {
        debug!(
            declared = headers.len(),
            distinct = unique.len(),
            "duplicate header names collapsed"
        );
    }
    let columns: Arc<[String]> = unique.into();

    let rows: Vec<RawRow> = lines
        .map(|line| {
            let values: Vec<&str> = line.split(',').collect();
            let mut map = HashMap::with_capacity(columns.len());
            for (idx, header) in headers.iter().enumerate() {
                let value = values.get(idx).map(|v| clean_cell(v)).unwrap_or_default();
                map.insert(header.clone(), value);
            }
            RawRow::new(Arc::clone(&columns), map)
        })
        .collect();

    RowTable::new(columns, rows)
}
