// src/ingest/mod.rs

pub mod parse;

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::{collections::HashMap, path::Path, sync::Arc};
use tracing::{debug, info};

use crate::error::{Result, WorkspaceError};

pub use parse::{ensure_csv, parse_csv_text};

/// Column holding an explicit batch identifier, when the upload carries one.
pub const BATCH_ID_COLUMN: &str = "batch_id";

/// One uploaded batch row.
///
/// The column list is shared by every row of an ingestion, so iteration
/// always follows the header order even though values live in a map.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    columns: Arc<[String]>,
    values: HashMap<String, String>,
}

impl RawRow {
    pub(crate) fn new(columns: Arc<[String]>, values: HashMap<String, String>) -> Self {
        Self { columns, values }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of keys in this row (always the width of the de-duplicated header).
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// `(column, value)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .map(move |c| (c.as_str(), self.get(c).unwrap_or("")))
    }

    /// Explicit batch identifier, ignoring blank cells.
    pub fn batch_id(&self) -> Option<&str> {
        self.get(BATCH_ID_COLUMN).filter(|v| !v.is_empty())
    }

    /// Numeric reading of a column, treating unparsable, non-finite and zero as absent.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v != 0.0)
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// All rows of one upload, plus the header they were read against.
#[derive(Debug, Clone, PartialEq)]
pub struct RowTable {
    columns: Arc<[String]>,
    rows: Vec<RawRow>,
}

impl Default for RowTable {
    fn default() -> Self {
        Self::new(Arc::from(Vec::new()), Vec::new())
    }
}

impl RowTable {
    pub(crate) fn new(columns: Arc<[String]>, rows: Vec<RawRow>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read an uploaded file from disk and parse it.
///
/// The extension check runs before the file is touched, so a rejected
/// upload never costs a read.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub async fn read_csv_file(path: impl AsRef<Path>) -> Result<RowTable> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    ensure_csv(&file_name, None)?;

    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        WorkspaceError::Io(std::io::Error::new(
            e.kind(),
            format!("reading {}: {}", path.display(), e),
        ))
    })?;
    debug!(bytes = text.len(), "read upload");

    let table = parse_csv_text(&text);
    info!(rows = table.len(), columns = table.columns().len(), "parsed upload");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[tokio::test]
    async fn test_read_csv_file_parses_rows() {
        let mut tmp = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(tmp, "batch_id,particle_size_d50").unwrap();
        writeln!(tmp, "B1,120").unwrap();
        writeln!(tmp, "B2,130").unwrap();

        let table = read_csv_file(tmp.path()).await.unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].get("particle_size_d50"), Some("130"));
    }

    #[tokio::test]
    async fn test_read_csv_file_rejects_other_extensions() {
        let mut tmp = Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(tmp, "a,b").unwrap();

        let err = read_csv_file(tmp.path()).await.unwrap_err();
        assert!(matches!(err, WorkspaceError::Format(_)));
    }

    #[test]
    fn test_row_serializes_in_header_order() {
        let table = parse_csv_text("z,a,m\n1,2,3\n");
        let json = serde_json::to_string(&table.rows()[0]).unwrap();
        assert_eq!(json, r#"{"z":"1","a":"2","m":"3"}"#);
    }

    #[test]
    fn test_number_ignores_blank_and_zero() {
        let table = parse_csv_text("x,y,z\n12.5,0,abc\n");
        let row = &table.rows()[0];
        assert_eq!(row.number("x"), Some(12.5));
        assert_eq!(row.number("y"), None);
        assert_eq!(row.number("z"), None);
        assert_eq!(row.number("missing"), None);

        let suffixed = parse_csv_text("particle_size_d50\n120nm\n");
        assert_eq!(suffixed.rows()[0].number("particle_size_d50"), None);
    }
}
