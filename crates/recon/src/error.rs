use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (duplicate source, empty rule, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// A required source/sheet is missing or has no header row.
    #[error("source '{source_id}': cannot load '{file}' sheet '{sheet}': {reason}")]
    SourceLoad {
        source_id: String,
        file: String,
        sheet: String,
        reason: String,
    },

    /// Missing required column in a loaded table.
    #[error("source '{source_id}': missing column '{column}'")]
    MissingColumn { source_id: String, column: String },

    /// Date (or date-time) that does not parse as day-month-year.
    #[error("source '{source_id}', column '{column}', row {row}: cannot parse date '{value}'")]
    DateParse {
        source_id: String,
        column: String,
        row: usize,
        value: String,
    },

    /// IO error (file read, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ReconError {
    pub fn missing_column(source: &str, column: &str) -> Self {
        Self::MissingColumn {
            source_id: source.into(),
            column: column.into(),
        }
    }

    pub fn date_parse(source: &str, column: &str, row: usize, value: &str) -> Self {
        Self::DateParse {
            source_id: source.into(),
            column: column.into(),
            row,
            value: value.into(),
        }
    }
}
