//! Individual-transaction filter. Each source carries one [`ClassifyRule`];
//! rows failing it are corporate or non-individual and never get normalized.

use crate::config::{ClassifyRule, SourceConfig};
use crate::error::ReconError;
use crate::model::Table;

/// Keep the rows of `table` that pass the source's rule.
pub fn classify(source: &SourceConfig, table: &Table) -> Result<Table, ReconError> {
    let keep = individual_rows(&source.id, &source.classify, table)?;
    Ok(table.select(&keep))
}

/// Indices of rows passing `rule`, in table order.
pub fn individual_rows(
    source_id: &str,
    rule: &ClassifyRule,
    table: &Table,
) -> Result<Vec<usize>, ReconError> {
    let cols = rule
        .columns()
        .into_iter()
        .map(|c| table.column(source_id, c))
        .collect::<Result<Vec<_>, ReconError>>()?;

    let keep = (0..table.len())
        .filter(|&row| {
            let cell = |i: usize| table.cell(row, cols[i]);
            match rule {
                ClassifyRule::StartsWith { prefixes, .. } => {
                    prefixes.iter().any(|p| cell(0).starts_with(p.as_str()))
                }
                ClassifyRule::Contains {
                    needles,
                    case_sensitive,
                    ..
                } => contains_any(cell(0), needles, *case_sensitive),
                ClassifyRule::Excludes {
                    needles,
                    case_sensitive,
                    ..
                } => (0..cols.len()).all(|i| !contains_any(cell(i), needles, *case_sensitive)),
            }
        })
        .collect();

    Ok(keep)
}

fn contains_any(value: &str, needles: &[String], case_sensitive: bool) -> bool {
    if case_sensitive {
        needles.iter().any(|n| value.contains(n.as_str()))
    } else {
        let value = value.to_lowercase();
        needles.iter().any(|n| value.contains(&n.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn starts_with_relationship_prefix() {
        let rule = ClassifyRule::StartsWith {
            column: "EBBS Rel ID 1".into(),
            prefixes: strings(&["01", "04"]),
        };
        let t = table(
            &["EBBS Rel ID 1", "Order No."],
            &[&["0112345", "A"], &["0299999", "B"], &["0400001", "C"], &["", "D"]],
        );
        assert_eq!(individual_rows("uts", &rule, &t).unwrap(), vec![0, 2]);
    }

    #[test]
    fn excludes_checks_every_owner_column() {
        let rule = ClassifyRule::Excludes {
            columns: strings(&["Surname", "Given"]),
            needles: strings(&["pte", "ltd"]),
            case_sensitive: true,
        };
        let t = table(
            &["Surname", "Given"],
            &[
                &["TAN", "AH KOW"],
                &["ACME", "holdings pte"],
                &["globex ltd", ""],
                &["INITECH", "Ltd"],
            ],
        );
        // "Ltd" survives a case-sensitive rule
        assert_eq!(individual_rows("pru", &rule, &t).unwrap(), vec![0, 3]);
    }

    #[test]
    fn excludes_case_insensitive() {
        let rule = ClassifyRule::Excludes {
            columns: strings(&["OWNER"]),
            needles: strings(&["pte", "ltd"]),
            case_sensitive: false,
        };
        let t = table(&["OWNER"], &[&["Acme PTE"], &["Lim Siew Ling"], &["Globex Ltd"]]);
        assert_eq!(individual_rows("manulife", &rule, &t).unwrap(), vec![1]);
    }

    #[test]
    fn contains_sign_authority() {
        let rule = ClassifyRule::Contains {
            column: "Sign Auth".into(),
            needles: strings(&["SINGLE", "EITHER/OR"]),
            case_sensitive: true,
        };
        let t = table(&["Sign Auth"], &[&["SINGLE"], &["JOINT"], &["EITHER/OR"], &["single"]]);
        assert_eq!(individual_rows("finiq", &rule, &t).unwrap(), vec![0, 2]);
    }

    #[test]
    fn missing_column_names_source() {
        let rule = ClassifyRule::Contains {
            column: "Sign Auth".into(),
            needles: strings(&["SINGLE"]),
            case_sensitive: true,
        };
        let t = table(&["Signing"], &[&["SINGLE"]]);
        let err = individual_rows("finiq", &rule, &t).unwrap_err();
        assert!(matches!(
            err,
            ReconError::MissingColumn { ref source_id, ref column } if source_id == "finiq" && column == "Sign Auth"
        ));
    }

    #[test]
    fn classify_keeps_headers_and_order() {
        let source = crate::config::ReconConfig::builtin()
            .unwrap()
            .source("structured_deposits")
            .unwrap()
            .clone();
        let t = table(
            &["REL ID (PRIMARY)", "SEQ NO."],
            &[&["0410006", "12"], &["0310007", "13"], &["0110008", "14"]],
        );
        let kept = classify(&source, &t).unwrap();
        assert_eq!(kept.headers, t.headers);
        assert_eq!(kept.rows, vec![strings(&["0410006", "12"]), strings(&["0110008", "14"])]);
    }

    #[test]
    fn short_rows_read_blank() {
        let rule = ClassifyRule::StartsWith {
            column: "REL".into(),
            prefixes: strings(&["01"]),
        };
        let t = Table::new(strings(&["A", "REL"]), vec![strings(&["x"]), strings(&["y", "0199"])]);
        assert_eq!(individual_rows("sd", &rule, &t).unwrap(), vec![1]);
    }
}
