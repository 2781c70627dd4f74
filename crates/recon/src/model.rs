use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

use crate::dataset::MergedDataset;
use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One loaded sheet: a header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a named column, or `MissingColumn` tagged with the source.
    pub fn column(&self, source: &str, name: &str) -> Result<usize, ReconError> {
        self.headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| ReconError::missing_column(source, name))
    }

    /// Cell text; short rows read as blank.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Keep only the rows at `indices`, in order.
    pub fn select(&self, indices: &[usize]) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: indices.iter().filter_map(|&i| self.rows.get(i).cloned()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Canonical transaction
// ---------------------------------------------------------------------------

pub const CANONICAL_COLUMNS: [&str; 13] = [
    "Representative",
    "Representative ID",
    "Client",
    "Client ID",
    "Product issuer",
    "Product name",
    "Transaction number",
    "Issuance Date",
    "Product category",
    "Excluded from Sampling base",
    "Mandatory Sampling",
    "Quarter Gross Commission Entitled",
    "Total Gross Commission Entitled",
];

pub const ISSUANCE_DATE_FORMAT: &str = "%d-%m-%Y";

/// One normalized transaction, independent of the source it came from.
///
/// The last four fields are placeholders owned by the downstream sampling
/// step and are always blank here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalTransaction {
    #[serde(skip)]
    pub source: String,
    #[serde(rename = "Representative")]
    pub representative: String,
    #[serde(rename = "Representative ID")]
    pub representative_id: String,
    #[serde(rename = "Client")]
    pub client_name: String,
    #[serde(rename = "Client ID")]
    pub client_id: String,
    #[serde(rename = "Product issuer")]
    pub product_issuer_and_amount: String,
    #[serde(rename = "Product name")]
    pub product_name: String,
    #[serde(rename = "Transaction number")]
    pub transaction_number: String,
    #[serde(rename = "Issuance Date", serialize_with = "serialize_dmy")]
    pub issuance_date: NaiveDate,
    #[serde(rename = "Product category")]
    pub product_category: String,
    #[serde(rename = "Excluded from Sampling base")]
    pub excluded_flag: String,
    #[serde(rename = "Mandatory Sampling")]
    pub mandatory_sampling_flag: String,
    #[serde(rename = "Quarter Gross Commission Entitled")]
    pub quarter_commission: String,
    #[serde(rename = "Total Gross Commission Entitled")]
    pub total_commission: String,
}

impl CanonicalTransaction {
    /// Field values in `CANONICAL_COLUMNS` order.
    pub fn values(&self) -> [String; 13] {
        [
            self.representative.clone(),
            self.representative_id.clone(),
            self.client_name.clone(),
            self.client_id.clone(),
            self.product_issuer_and_amount.clone(),
            self.product_name.clone(),
            self.transaction_number.clone(),
            self.issuance_date.format(ISSUANCE_DATE_FORMAT).to_string(),
            self.product_category.clone(),
            self.excluded_flag.clone(),
            self.mandatory_sampling_flag.clone(),
            self.quarter_commission.clone(),
            self.total_commission.clone(),
        ]
    }
}

fn serialize_dmy<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&date.format(ISSUANCE_DATE_FORMAT))
}

// ---------------------------------------------------------------------------
// AI reference data
// ---------------------------------------------------------------------------

/// Inclusive date range during which a client is AI-eligible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityWindow {
    pub client_id: String,
    pub effective_date: NaiveDate,
    pub expiry_date: NaiveDate,
}

impl EligibilityWindow {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.effective_date <= date && date <= self.expiry_date
    }
}

/// One raw opt-in record from the declarations sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptInDeclaration {
    pub client_id: String,
    pub timestamp: NaiveDateTime,
    pub status: String,
}

/// Per-party answer from the resolver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub opted_in: bool,
    pub eligible: bool,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub source: String,
    pub loaded: usize,
    pub individual: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    pub sources: Vec<SourceSummary>,
    pub normalized: usize,
    pub excluded: usize,
    pub retained: usize,
    /// True when there was no opt-in data, so nothing could be excluded.
    pub exclusion_skipped: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub dataset: MergedDataset,
}
