//! Zero-sum checks around the solver.
//!
//! The solver tolerates input that does not sum to zero. Callers that need a
//! hard guarantee check [`audit_zero_sum`] first, and can inspect
//! [`unresolved_residuals`] afterwards to surface a data-integrity warning.

use crate::model::{Balances, MATERIALITY_THRESHOLD, Money, ParticipantId, Transfer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementAuditError {
    #[error("balances sum to {total} instead of zero")]
    NonZeroAggregate { total: Money },
}

pub fn audit_zero_sum(balances: &Balances) -> Result<(), SettlementAuditError> {
    let total: Money = balances.values().sum();
    if total.is_settled() {
        Ok(())
    } else {
        tracing::warn!(
            total = %total,
            participant_count = balances.len(),
            "Aggregated balances do not sum to zero"
        );
        Err(SettlementAuditError::NonZeroAggregate { total })
    }
}

/// Participants whose balance is at or above the materiality threshold.
pub fn unresolved_residuals(balances: &Balances) -> Vec<(ParticipantId, Money)> {
    balances
        .iter()
        .filter(|(_, balance)| balance.abs() >= MATERIALITY_THRESHOLD)
        .map(|(id, balance)| (id.clone(), *balance))
        .collect()
}

/// Applies transfers to a copy of `balances`: the payer's balance rises, the
/// payee's falls. Participants not already present are added.
pub fn apply_transfers(balances: &Balances, transfers: &[Transfer]) -> Balances {
    let mut applied = balances.clone();
    for transfer in transfers {
        *applied.entry(transfer.from.clone()).or_insert(Money::ZERO) += transfer.amount;
        *applied.entry(transfer.to.clone()).or_insert(Money::ZERO) -= transfer.amount;
    }
    applied
}
