//! Drops transactions made entirely by opted-in accredited investors.
//!
//! A transaction is excluded iff every party id is opted in and at least one
//! party is AI-eligible on the issuance date. Transactions without any party
//! id are always kept. Exclusion never fails; an id the resolver does not
//! know is simply neither opted in nor eligible.

use tracing::debug;

use crate::model::CanonicalTransaction;
use crate::party::party_ids;
use crate::resolver::AiResolver;

#[derive(Debug, Default)]
pub struct ExclusionOutcome {
    pub retained: Vec<CanonicalTransaction>,
    pub excluded: Vec<CanonicalTransaction>,
    /// True when the resolver had no opt-in data and nothing was examined.
    pub skipped: bool,
}

/// Retained transactions, in input order.
pub fn filter(transactions: Vec<CanonicalTransaction>, resolver: &AiResolver) -> Vec<CanonicalTransaction> {
    partition(transactions, resolver).retained
}

/// Split transactions into retained and excluded, both in input order.
pub fn partition(transactions: Vec<CanonicalTransaction>, resolver: &AiResolver) -> ExclusionOutcome {
    if !resolver.has_opt_in_data() {
        debug!(transactions = transactions.len(), "no opt-in declarations, skipping AI exclusion");
        return ExclusionOutcome {
            retained: transactions,
            excluded: Vec::new(),
            skipped: true,
        };
    }

    let (excluded, retained): (Vec<_>, Vec<_>) = transactions
        .into_iter()
        .partition(|tx| is_ai_transaction(tx, resolver));

    for tx in &excluded {
        debug!(
            source = %tx.source,
            transaction = %tx.transaction_number,
            client_id = %tx.client_id,
            "excluded AI transaction"
        );
    }

    ExclusionOutcome {
        retained,
        excluded,
        skipped: false,
    }
}

pub fn is_ai_transaction(tx: &CanonicalTransaction, resolver: &AiResolver) -> bool {
    let ids = party_ids(&tx.client_id);
    if ids.is_empty() {
        return false;
    }

    let mut any_eligible = false;
    for id in ids {
        let res = resolver.resolve(id, tx.issuance_date);
        if !res.opted_in {
            return false;
        }
        any_eligible |= res.eligible;
    }
    any_eligible
}
