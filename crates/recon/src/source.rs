//! Table loading seam. The pipeline only sees [`TableLoader`]; reading the
//! actual workbooks is up to the caller.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ReconError;
use crate::model::Table;

/// Supplies a loaded sheet for a `(file, sheet)` pair.
pub trait TableLoader {
    fn load(&self, file: &str, sheet: &str) -> Result<Table, ReconError>;
}

fn load_error(file: &str, sheet: &str, reason: impl Into<String>) -> ReconError {
    ReconError::SourceLoad {
        source_id: String::new(),
        file: file.into(),
        sheet: sheet.into(),
        reason: reason.into(),
    }
}

impl Table {
    /// Parse CSV text with a header row. Ragged rows are allowed.
    pub fn from_csv(data: &str) -> Result<Table, ReconError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|v| v.to_string()).collect());
        }

        Ok(Table::new(headers, rows))
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InMemoryLoader {
    tables: HashMap<(String, String), Table>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file: &str, sheet: &str, table: Table) {
        self.tables.insert((file.to_string(), sheet.to_string()), table);
    }

    pub fn with(mut self, file: &str, sheet: &str, table: Table) -> Self {
        self.insert(file, sheet, table);
        self
    }
}

impl TableLoader for InMemoryLoader {
    fn load(&self, file: &str, sheet: &str) -> Result<Table, ReconError> {
        self.tables
            .get(&(file.to_string(), sheet.to_string()))
            .cloned()
            .ok_or_else(|| load_error(file, sheet, "not supplied"))
    }
}

// ---------------------------------------------------------------------------
// CSV directory
// ---------------------------------------------------------------------------

/// Workbooks exported one CSV per sheet: `<root>/<file stem>/<sheet>.csv`.
#[derive(Debug, Clone)]
pub struct CsvDirLoader {
    root: PathBuf,
}

impl CsvDirLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn sheet_path(&self, file: &str, sheet: &str) -> PathBuf {
        let stem = Path::new(file)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.to_string());
        self.root.join(stem).join(format!("{sheet}.csv"))
    }
}

impl TableLoader for CsvDirLoader {
    fn load(&self, file: &str, sheet: &str) -> Result<Table, ReconError> {
        let path = self.sheet_path(file, sheet);
        let data = std::fs::read_to_string(&path)
            .map_err(|e| load_error(file, sheet, format!("{}: {e}", path.display())))?;
        Table::from_csv(&data)
    }
}
