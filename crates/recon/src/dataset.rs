use std::io::Write;

use serde::Serialize;

use crate::error::ReconError;
use crate::model::{CanonicalTransaction, CANONICAL_COLUMNS};

/// The final canonical table. Stored row-wise; `columns()` gives the
/// column-aligned view downstream consumers expect.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedDataset {
    pub rows: Vec<CanonicalTransaction>,
}

impl MergedDataset {
    pub fn new(rows: Vec<CanonicalTransaction>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every canonical column with its values, all of length `len()`.
    pub fn columns(&self) -> Vec<(&'static str, Vec<String>)> {
        let mut columns: Vec<(&'static str, Vec<String>)> = CANONICAL_COLUMNS
            .iter()
            .map(|&name| (name, Vec::with_capacity(self.rows.len())))
            .collect();
        for row in &self.rows {
            for (slot, value) in columns.iter_mut().zip(row.values()) {
                slot.1.push(value);
            }
        }
        columns
    }

    /// Values of one canonical column, or `None` for an unknown name.
    pub fn column(&self, name: &str) -> Option<Vec<String>> {
        let idx = CANONICAL_COLUMNS.iter().position(|&c| c == name)?;
        Some(self.rows.iter().map(|r| r.values()[idx].clone()).collect())
    }

    /// Write as CSV with the canonical header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ReconError> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(CANONICAL_COLUMNS)?;
        for row in &self.rows {
            out.write_record(row.values())?;
        }
        out.flush()?;
        Ok(())
    }
}
