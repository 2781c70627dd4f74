//! Accredited-investor lookups.
//!
//! Built once per run from the eligibility-window and opt-in sheets, then
//! queried per party. Opt-in follows the latest declaration per client by
//! `(effective date, modified time)`; when several records share that latest
//! timestamp the client is treated as not opted in.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use tracing::debug;

use crate::config::AiConfig;
use crate::dates::{parse_date, parse_timestamp};
use crate::error::ReconError;
use crate::model::{EligibilityWindow, OptInDeclaration, Resolution, Table};

#[derive(Debug, Default)]
pub struct AiResolver {
    windows: HashMap<String, Vec<EligibilityWindow>>,
    opted_in: HashSet<String>,
    declarations: usize,
    ambiguous: usize,
}

impl AiResolver {
    pub fn new(
        windows: Vec<EligibilityWindow>,
        declarations: Vec<OptInDeclaration>,
        affirmative: &str,
    ) -> Self {
        let mut by_client: HashMap<String, Vec<EligibilityWindow>> = HashMap::new();
        for w in windows {
            by_client.entry(w.client_id.clone()).or_default().push(w);
        }

        let total = declarations.len();
        let mut grouped: HashMap<&str, Vec<&OptInDeclaration>> = HashMap::new();
        for d in &declarations {
            grouped.entry(d.client_id.as_str()).or_default().push(d);
        }

        let mut opted_in = HashSet::new();
        let mut ambiguous = 0;
        for (client, records) in &grouped {
            match latest_declaration(records) {
                Some(d) if d.status.trim() == affirmative => {
                    opted_in.insert(client.to_string());
                }
                Some(_) => {}
                None => {
                    debug!(client = %client, records = records.len(), "ambiguous opt-in, treating as not opted in");
                    ambiguous += 1;
                }
            }
        }

        Self {
            windows: by_client,
            opted_in,
            declarations: total,
            ambiguous,
        }
    }

    /// Build from the two loaded reference sheets.
    pub fn from_tables(
        config: &AiConfig,
        eligibility: &Table,
        opt_in: &Table,
    ) -> Result<Self, ReconError> {
        let windows = read_windows(config, eligibility)?;
        let declarations = read_declarations(config, opt_in)?;
        Ok(Self::new(windows, declarations, &config.affirmative))
    }

    pub fn resolve(&self, client_id: &str, date: NaiveDate) -> Resolution {
        Resolution {
            opted_in: self.is_opted_in(client_id),
            eligible: self.is_eligible(client_id, date),
        }
    }

    pub fn is_opted_in(&self, client_id: &str) -> bool {
        self.opted_in.contains(client_id.trim())
    }

    /// Any window for the client covering `date`, both ends inclusive.
    pub fn is_eligible(&self, client_id: &str, date: NaiveDate) -> bool {
        self.windows
            .get(client_id.trim())
            .is_some_and(|ws| ws.iter().any(|w| w.covers(date)))
    }

    /// False when the opt-in sheet had no records at all.
    pub fn has_opt_in_data(&self) -> bool {
        self.declarations > 0
    }

    pub fn opted_in_count(&self) -> usize {
        self.opted_in.len()
    }

    pub fn ambiguous_count(&self) -> usize {
        self.ambiguous
    }
}

/// The single record carrying the latest timestamp, or `None` on a tie.
pub fn latest_declaration<'a>(records: &[&'a OptInDeclaration]) -> Option<&'a OptInDeclaration> {
    let latest = records.iter().map(|d| d.timestamp).max()?;
    let mut at_latest = records.iter().filter(|d| d.timestamp == latest);
    let first = at_latest.next()?;
    match at_latest.next() {
        Some(_) => None,
        None => Some(*first),
    }
}

// ---------------------------------------------------------------------------
// Sheet readers
// ---------------------------------------------------------------------------

fn read_windows(config: &AiConfig, table: &Table) -> Result<Vec<EligibilityWindow>, ReconError> {
    let source = config.eligibility_sheet.as_str();
    let cols = &config.columns;
    let id_idx = table.column(source, &cols.relationship_no)?;
    let eff_idx = table.column(source, &cols.effective_date)?;
    let exp_idx = table.column(source, &cols.expiry_date)?;

    let mut windows = Vec::new();
    for row in 0..table.len() {
        let client_id = table.cell(row, id_idx).trim();
        if client_id.is_empty() {
            continue;
        }
        let date = |idx: usize, column: &str| {
            let raw = table.cell(row, idx);
            parse_date(raw).ok_or_else(|| ReconError::date_parse(source, column, row, raw))
        };
        windows.push(EligibilityWindow {
            client_id: client_id.to_string(),
            effective_date: date(eff_idx, &cols.effective_date)?,
            expiry_date: date(exp_idx, &cols.expiry_date)?,
        });
    }
    Ok(windows)
}

fn read_declarations(
    config: &AiConfig,
    table: &Table,
) -> Result<Vec<OptInDeclaration>, ReconError> {
    let source = config.opt_in_sheet.as_str();
    let cols = &config.columns;
    let id_idx = table.column(source, &cols.relationship_no)?;
    let eff_idx = table.column(source, &cols.effective_date)?;
    let time_idx = table.column(source, &cols.modified_time)?;
    let status_idx = table.column(source, &cols.status)?;

    let mut declarations = Vec::new();
    for row in 0..table.len() {
        let client_id = table.cell(row, id_idx).trim();
        if client_id.is_empty() {
            continue;
        }
        let date = table.cell(row, eff_idx);
        let time = table.cell(row, time_idx);
        let timestamp = parse_timestamp(date, time).ok_or_else(|| {
            let column = format!("{} + {}", cols.effective_date, cols.modified_time);
            ReconError::date_parse(source, &column, row, &format!("{date} {time}"))
        })?;
        declarations.push(OptInDeclaration {
            client_id: client_id.to_string(),
            timestamp,
            status: table.cell(row, status_idx).to_string(),
        });
    }
    Ok(declarations)
}
