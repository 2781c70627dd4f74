use tracing::{debug, info, info_span};

use crate::classify::individual_rows;
use crate::config::{ReconConfig, SourceConfig};
use crate::dataset::MergedDataset;
use crate::error::ReconError;
use crate::exclusion::partition;
use crate::model::{CanonicalTransaction, ReconMeta, ReconResult, ReconSummary, SourceSummary, Table};
use crate::normalize::normalize_rows;
use crate::resolver::AiResolver;
use crate::source::TableLoader;

/// Every sheet a run needs, loaded before any processing starts.
pub struct LoadedInputs {
    /// One table per configured source, in config order.
    pub sources: Vec<Table>,
    pub eligibility: Table,
    pub opt_in: Table,
}

/// Run the pipeline per config: classify, normalize, then drop AI transactions.
pub fn run(config: &ReconConfig, loader: &dyn TableLoader) -> Result<ReconResult, ReconError> {
    let span = info_span!("recon", config = %config.name);
    let _guard = span.enter();

    let inputs = load_inputs(config, loader)?;
    run_loaded(config, &inputs)
}

/// Same as [`run`], over tables that are already loaded.
pub fn run_loaded(config: &ReconConfig, inputs: &LoadedInputs) -> Result<ReconResult, ReconError> {
    if inputs.sources.len() != config.sources.len() {
        return Err(ReconError::ConfigValidation(format!(
            "{} source tables supplied for {} configured sources",
            inputs.sources.len(),
            config.sources.len()
        )));
    }

    let mut transactions = Vec::new();
    let mut sources = Vec::with_capacity(config.sources.len());
    for (source, table) in config.sources.iter().zip(&inputs.sources) {
        let (txs, summary) = normalize_source(source, table)?;
        transactions.extend(txs);
        sources.push(summary);
    }
    let normalized = transactions.len();

    let resolver = AiResolver::from_tables(&config.ai, &inputs.eligibility, &inputs.opt_in)?;
    debug!(
        opted_in = resolver.opted_in_count(),
        ambiguous = resolver.ambiguous_count(),
        "built AI resolver"
    );

    let outcome = partition(transactions, &resolver);
    info!(
        normalized,
        excluded = outcome.excluded.len(),
        retained = outcome.retained.len(),
        skipped = outcome.skipped,
        "AI exclusion done"
    );

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary: ReconSummary {
            sources,
            normalized,
            excluded: outcome.excluded.len(),
            retained: outcome.retained.len(),
            exclusion_skipped: outcome.skipped,
        },
        dataset: MergedDataset::new(outcome.retained),
    })
}

/// Load every configured source plus both AI sheets. Fails on the first
/// sheet that is missing or has no header row.
pub fn load_inputs(
    config: &ReconConfig,
    loader: &dyn TableLoader,
) -> Result<LoadedInputs, ReconError> {
    let sources = config
        .sources
        .iter()
        .map(|s| load_table(loader, &s.id, &s.file, &s.sheet))
        .collect::<Result<Vec<_>, ReconError>>()?;

    let ai = &config.ai;
    let eligibility = load_table(loader, &ai.eligibility_sheet, &ai.file, &ai.eligibility_sheet)?;
    let opt_in = load_table(loader, &ai.opt_in_sheet, &ai.file, &ai.opt_in_sheet)?;

    Ok(LoadedInputs {
        sources,
        eligibility,
        opt_in,
    })
}

fn load_table(
    loader: &dyn TableLoader,
    source_id: &str,
    file: &str,
    sheet: &str,
) -> Result<Table, ReconError> {
    let table = loader.load(file, sheet).map_err(|e| match e {
        ReconError::SourceLoad {
            file, sheet, reason, ..
        } => ReconError::SourceLoad {
            source_id: source_id.into(),
            file,
            sheet,
            reason,
        },
        other => ReconError::SourceLoad {
            source_id: source_id.into(),
            file: file.into(),
            sheet: sheet.into(),
            reason: other.to_string(),
        },
    })?;

    if table.headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ReconError::SourceLoad {
            source_id: source_id.into(),
            file: file.into(),
            sheet: sheet.into(),
            reason: "sheet has no header row".into(),
        });
    }

    Ok(table)
}

/// Classify and normalize one source's table.
pub fn normalize_source(
    source: &SourceConfig,
    table: &Table,
) -> Result<(Vec<CanonicalTransaction>, SourceSummary), ReconError> {
    let span = info_span!("source", id = %source.id);
    let _guard = span.enter();

    let keep = individual_rows(&source.id, &source.classify, table)?;
    let txs = normalize_rows(source, table, &keep)?;
    info!(loaded = table.len(), individual = keep.len(), "normalized source");

    let summary = SourceSummary {
        source: source.id.clone(),
        loaded: table.len(),
        individual: keep.len(),
    };
    Ok((txs, summary))
}
