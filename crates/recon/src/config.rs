use std::collections::HashSet;

use serde::Deserialize;

use crate::error::ReconError;
use crate::party::MAX_PARTIES;

const BUILTIN_TOML: &str = include_str!("../config/cau.recon.toml");

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    /// Source adapters, concatenated in this order.
    pub sources: Vec<SourceConfig>,
    pub ai: AiConfig,
}

// ---------------------------------------------------------------------------
// Source adapter
// ---------------------------------------------------------------------------

/// Everything needed to turn one sheet into canonical transactions.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    pub file: String,
    pub sheet: String,
    pub classify: ClassifyRule,
    pub columns: ColumnMapping,
}

/// Individual-transaction predicate for one source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ClassifyRule {
    /// Keep rows whose `column` starts with any prefix.
    StartsWith { column: String, prefixes: Vec<String> },
    /// Keep rows where none of `columns` contains any needle.
    Excludes {
        columns: Vec<String>,
        needles: Vec<String>,
        #[serde(default = "default_true")]
        case_sensitive: bool,
    },
    /// Keep rows whose `column` contains any needle.
    Contains {
        column: String,
        needles: Vec<String>,
        #[serde(default = "default_true")]
        case_sensitive: bool,
    },
}

impl ClassifyRule {
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Self::StartsWith { column, .. } | Self::Contains { column, .. } => vec![column.as_str()],
            Self::Excludes { columns, .. } => columns.iter().map(String::as_str).collect(),
        }
    }

    fn patterns(&self) -> &[String] {
        match self {
            Self::StartsWith { prefixes, .. } => prefixes,
            Self::Excludes { needles, .. } | Self::Contains { needles, .. } => needles,
        }
    }
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnMapping {
    pub representative: String,
    pub representative_id: String,
    /// Party name columns in slot order (primary, joint 1..3). May be empty.
    #[serde(default)]
    pub client_name: Vec<String>,
    /// Party id columns in slot order (primary, joint 1..3).
    pub client_id: Vec<String>,
    pub product_issuer: IssuerMapping,
    pub product_name: TextField,
    pub transaction_number: TextField,
    pub issuance_date: String,
    pub product_category: TextField,
}

impl ColumnMapping {
    /// Every column this mapping reads.
    pub fn columns(&self) -> Vec<&str> {
        let mut cols = vec![self.representative.as_str(), self.representative_id.as_str()];
        cols.extend(self.client_name.iter().map(String::as_str));
        cols.extend(self.client_id.iter().map(String::as_str));
        cols.push(self.product_issuer.label.as_str());
        cols.extend(self.product_issuer.amount.columns());
        cols.extend(self.product_name.columns());
        cols.extend(self.transaction_number.columns());
        cols.push(self.issuance_date.as_str());
        cols.extend(self.product_category.columns());
        cols
    }
}

/// A canonical text field: a column, a fixed value, or joined columns.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TextField {
    Column(String),
    Literal {
        literal: String,
    },
    Join {
        join: Vec<String>,
        #[serde(default = "default_join_separator")]
        sep: String,
    },
}

impl TextField {
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Self::Column(c) => vec![c.as_str()],
            Self::Literal { .. } => Vec::new(),
            Self::Join { join, .. } => join.iter().map(String::as_str).collect(),
        }
    }
}

fn default_join_separator() -> String {
    "-".into()
}

/// `"<label> <amount>"` for the product issuer field.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuerMapping {
    pub label: String,
    pub amount: AmountField,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AmountField {
    Column(String),
    /// Use `numeric` when its value is a number, else `fallback`.
    Numeric { numeric: String, fallback: String },
}

impl AmountField {
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Self::Column(c) => vec![c.as_str()],
            Self::Numeric { numeric, fallback } => vec![numeric.as_str(), fallback.as_str()],
        }
    }
}

// ---------------------------------------------------------------------------
// AI reference tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub file: String,
    pub eligibility_sheet: String,
    pub opt_in_sheet: String,
    #[serde(default)]
    pub columns: AiColumns,
    /// Status value that counts as opted in.
    #[serde(default = "default_affirmative")]
    pub affirmative: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiColumns {
    pub relationship_no: String,
    pub effective_date: String,
    pub expiry_date: String,
    pub modified_time: String,
    pub status: String,
}

impl Default for AiColumns {
    fn default() -> Self {
        Self {
            relationship_no: "Relationship No".into(),
            effective_date: "Effective Date".into(),
            expiry_date: "Expiry Date".into(),
            modified_time: "Modified Time".into(),
            status: "Wealth Indicator Value Code".into(),
        }
    }
}

fn default_affirmative() -> String {
    "Yes".into()
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// The standard eight-source adapter table.
    pub fn builtin() -> Result<Self, ReconError> {
        Self::from_toml(BUILTIN_TOML)
    }

    pub fn source(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.sources.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least 1 source is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.id.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "duplicate source id '{}'",
                    source.id
                )));
            }
            validate_source(source)?;
        }

        let ai = &self.ai;
        if ai.eligibility_sheet.is_empty() || ai.opt_in_sheet.is_empty() {
            return Err(ReconError::ConfigValidation(
                "ai: eligibility_sheet and opt_in_sheet are required".into(),
            ));
        }

        Ok(())
    }
}

fn validate_source(source: &SourceConfig) -> Result<(), ReconError> {
    let id = &source.id;
    let rule = &source.classify;
    if rule.columns().is_empty() {
        return Err(ReconError::ConfigValidation(format!(
            "source '{id}': classify rule names no column"
        )));
    }
    if rule.patterns().iter().all(|p| p.is_empty()) {
        return Err(ReconError::ConfigValidation(format!(
            "source '{id}': classify rule needs at least one non-empty pattern"
        )));
    }

    let cols = &source.columns;
    if cols.client_id.is_empty() {
        return Err(ReconError::ConfigValidation(format!(
            "source '{id}': client_id needs at least one party column"
        )));
    }
    for (field, parties) in [("client_name", &cols.client_name), ("client_id", &cols.client_id)] {
        if parties.len() > MAX_PARTIES {
            return Err(ReconError::ConfigValidation(format!(
                "source '{id}': {field} has {} party columns, max {MAX_PARTIES}",
                parties.len()
            )));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
