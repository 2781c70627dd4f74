//! Source rows → canonical transactions, driven by each source's
//! [`ColumnMapping`]. Cell text is copied through untouched apart from the
//! issuer amount selection and the issuance date parse.

use crate::config::{AmountField, ColumnMapping, SourceConfig, TextField};
use crate::dates::parse_date;
use crate::error::ReconError;
use crate::model::{CanonicalTransaction, Table};
use crate::party::{join_slots, ID_SEPARATOR, NAME_SEPARATOR};

/// Normalize every row of `table`.
pub fn normalize(
    source: &SourceConfig,
    table: &Table,
) -> Result<Vec<CanonicalTransaction>, ReconError> {
    let all: Vec<usize> = (0..table.len()).collect();
    normalize_rows(source, table, &all)
}

/// Normalize the given rows of `table`. Errors carry the row index in `table`.
pub fn normalize_rows(
    source: &SourceConfig,
    table: &Table,
    rows: &[usize],
) -> Result<Vec<CanonicalTransaction>, ReconError> {
    let layout = Layout::resolve(&source.id, &source.columns, table)?;
    rows.iter()
        .map(|&row| layout.transaction(&source.id, &source.columns, table, row))
        .collect()
}

// ---------------------------------------------------------------------------
// Resolved column layout
// ---------------------------------------------------------------------------

enum Text {
    Column(usize),
    Literal(String),
    Join(Vec<usize>, String),
}

enum Amount {
    Column(usize),
    Numeric(usize, usize),
}

/// A `ColumnMapping` with every column name resolved to an index.
struct Layout {
    representative: usize,
    representative_id: usize,
    client_name: Vec<usize>,
    client_id: Vec<usize>,
    issuer_label: usize,
    issuer_amount: Amount,
    product_name: Text,
    transaction_number: Text,
    issuance_date: usize,
    product_category: Text,
}

impl Layout {
    fn resolve(
        source_id: &str,
        mapping: &ColumnMapping,
        table: &Table,
    ) -> Result<Self, ReconError> {
        let col = |name: &str| table.column(source_id, name);
        let cols = |names: &[String]| {
            names.iter().map(|n| col(n)).collect::<Result<Vec<_>, ReconError>>()
        };
        let text = |field: &TextField| -> Result<Text, ReconError> {
            Ok(match field {
                TextField::Column(name) => Text::Column(col(name)?),
                TextField::Literal { literal } => Text::Literal(literal.clone()),
                TextField::Join { join, sep } => Text::Join(cols(join)?, sep.clone()),
            })
        };

        Ok(Self {
            representative: col(&mapping.representative)?,
            representative_id: col(&mapping.representative_id)?,
            client_name: cols(&mapping.client_name)?,
            client_id: cols(&mapping.client_id)?,
            issuer_label: col(&mapping.product_issuer.label)?,
            issuer_amount: match &mapping.product_issuer.amount {
                AmountField::Column(name) => Amount::Column(col(name)?),
                AmountField::Numeric { numeric, fallback } => {
                    Amount::Numeric(col(numeric)?, col(fallback)?)
                }
            },
            product_name: text(&mapping.product_name)?,
            transaction_number: text(&mapping.transaction_number)?,
            issuance_date: col(&mapping.issuance_date)?,
            product_category: text(&mapping.product_category)?,
        })
    }

    fn transaction(
        &self,
        source_id: &str,
        mapping: &ColumnMapping,
        table: &Table,
        row: usize,
    ) -> Result<CanonicalTransaction, ReconError> {
        let cell = |col: usize| table.cell(row, col);
        let text = |field: &Text| match field {
            Text::Column(c) => cell(*c).to_string(),
            Text::Literal(value) => value.clone(),
            Text::Join(cs, sep) => join_slots(cs.iter().map(|&c| cell(c)), sep),
        };

        let raw_date = cell(self.issuance_date);
        let issuance_date = parse_date(raw_date).ok_or_else(|| {
            ReconError::date_parse(source_id, &mapping.issuance_date, row, raw_date)
        })?;

        let amount = match self.issuer_amount {
            Amount::Column(c) => cell(c),
            Amount::Numeric(numeric, fallback) => {
                if is_number(cell(numeric)) {
                    cell(numeric)
                } else {
                    cell(fallback)
                }
            }
        };

        Ok(CanonicalTransaction {
            source: source_id.to_string(),
            representative: cell(self.representative).to_string(),
            representative_id: cell(self.representative_id).to_string(),
            client_name: join_slots(self.client_name.iter().map(|&c| cell(c)), NAME_SEPARATOR),
            client_id: join_slots(self.client_id.iter().map(|&c| cell(c)), ID_SEPARATOR),
            product_issuer_and_amount: format!("{} {}", cell(self.issuer_label), amount),
            product_name: text(&self.product_name),
            transaction_number: text(&self.transaction_number),
            issuance_date,
            product_category: text(&self.product_category),
            excluded_flag: String::new(),
            mandatory_sampling_flag: String::new(),
            quarter_commission: String::new(),
            total_commission: String::new(),
        })
    }
}

fn is_number(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok_and(f64::is_finite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconConfig;
    use chrono::NaiveDate;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn builtin(id: &str) -> SourceConfig {
        ReconConfig::builtin().unwrap().source(id).unwrap().clone()
    }

    const PRU_HEADERS: &[&str] = &[
        "FSC",
        "Bank ID",
        "Owner Surname",
        "Owner Given Name 1",
        "Owner Given Name 2",
        "Owner Christian Name",
        "Owner ID Num",
        "Contract Plan Description",
        "API",
        "SPI",
        "Contract Number",
        "Issuance Date",
    ];

    #[test]
    fn uts_four_party_composites() {
        let source = builtin("uts");
        let t = table(
            &[
                "Sales Staff Name",
                "Order Closing Id",
                "Account Holder 1",
                "Account Holder 2",
                "Account Holder 3",
                "Account Holder 4",
                "EBBS Rel ID 1",
                "EBBS Rel ID 2",
                "EBBS Rel ID 3",
                "EBBS Rel ID 4",
                "Asset Currency",
                "Transaction Amount",
                "Asset Name",
                "Order No.",
                "Order Date",
                "Account Type",
            ],
            &[&[
                "Jane Ong", "RM01", "TAN AH KOW", "LIM MEI", "", "", "0111", "0122", "", "",
                "SGD", "15000", "Global Equity Fund", "ORD-1", "03-02-2024", "UT",
            ]],
        );
        let txs = normalize(&source, &t).unwrap();
        assert_eq!(txs.len(), 1);
        let tx = &txs[0];
        assert_eq!(tx.source, "uts");
        assert_eq!(tx.representative, "Jane Ong");
        assert_eq!(tx.client_name, "TAN AH KOW-LIM MEI--");
        assert_eq!(tx.client_id, "0111|0122||");
        assert_eq!(tx.product_issuer_and_amount, "SGD 15000");
        assert_eq!(tx.issuance_date, NaiveDate::from_ymd_opt(2024, 2, 3).unwrap());
        assert_eq!(tx.product_category, "UT");
        assert!(tx.excluded_flag.is_empty() && tx.total_commission.is_empty());
    }

    #[test]
    fn pru_prefers_numeric_api() {
        let source = builtin("banca_pru_fsc");
        let t = table(
            PRU_HEADERS,
            &[
                &["Ken", "B1", "TAN", "AH", "", "", "S1", "PRUlife", "1200", "0", "C-1", "01-01-2024"],
                &["Ken", "B1", "LEE", "", "", "", "S2", "PRUsaver", "", "50000", "C-2", "02-01-2024"],
                &["Ken", "B1", "ONG", "", "", "", "S3", "PRUsaver", "n/a", "700", "C-3", "02-01-2024"],
            ],
        );
        let txs = normalize(&source, &t).unwrap();
        assert_eq!(txs[0].product_issuer_and_amount, "PRUlife 1200");
        assert_eq!(txs[1].product_issuer_and_amount, "PRUsaver 50000");
        assert_eq!(txs[2].product_issuer_and_amount, "PRUsaver 700");
        assert_eq!(txs[0].client_id, "S1");
        assert_eq!(txs[0].client_name, "TAN-AH--");
        assert_eq!(txs[0].product_category, "Banca");
    }

    #[test]
    fn literal_and_joined_fields() {
        let source = builtin("structured_deposits");
        let t = table(
            &[
                "SALES PERSON",
                "peoplewise ID RM",
                "REL ID (PRIMARY)",
                "REL ID (JOINT 1)",
                "REL ID (JOINT 2)",
                "REL ID (JOINT 3)",
                "CCY",
                "AMOUNT",
                "Product name",
                "SEQ NO.",
                "Branch code - Rotation no.",
                "CM ORDER DATE",
            ],
            &[&["Raj", "P9", "0455", "", "", "", "USD", "250000", "SD Note", "17", "B01-4", "15/06/2024"]],
        );
        let tx = &normalize(&source, &t).unwrap()[0];
        assert_eq!(tx.client_name, "");
        assert_eq!(tx.client_id, "0455|||");
        assert_eq!(tx.transaction_number, "17-B01-4");
        assert_eq!(tx.product_category, "SD");
        assert_eq!(tx.issuance_date, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
    }

    #[test]
    fn bad_date_reports_source_column_row() {
        let source = builtin("banca_pru_is");
        let t = table(
            PRU_HEADERS,
            &[
                &["Ken", "B1", "TAN", "", "", "", "S1", "P", "1", "", "C-1", "01-01-2024"],
                &["Ken", "B1", "LEE", "", "", "", "S2", "P", "1", "", "C-2", "2024-01-02"],
            ],
        );
        let err = normalize(&source, &t).unwrap_err();
        match err {
            ReconError::DateParse { source_id, column, row, value } => {
                assert_eq!(source_id, "banca_pru_is");
                assert_eq!(column, "Issuance Date");
                assert_eq!(row, 1);
                assert_eq!(value, "2024-01-02");
            }
            other => panic!("expected DateParse, got {other:?}"),
        }
    }

    #[test]
    fn two_digit_year_is_a_date_error() {
        let source = builtin("banca_pru_is");
        let t = table(
            PRU_HEADERS,
            &[&["Ken", "B1", "TAN", "", "", "", "S1", "P", "1", "", "C-1", "05-03-24"]],
        );
        let err = normalize(&source, &t).unwrap_err();
        assert!(matches!(
            err,
            ReconError::DateParse { row: 0, ref value, .. } if value == "05-03-24"
        ));
    }

    #[test]
    fn missing_mapped_column_fails_without_rows() {
        let source = builtin("banca_hsbc");
        let t = table(&["AGENT", "PeopleWise ID"], &[]);
        let err = normalize(&source, &t).unwrap_err();
        assert!(matches!(err, ReconError::MissingColumn { .. }));
    }

    #[test]
    fn numeric_detection() {
        assert!(is_number("1200"));
        assert!(is_number(" 12.5 "));
        assert!(!is_number(""));
        assert!(!is_number("nan"));
        assert!(!is_number("n/a"));
    }
}
