use crate::{
    error::{LedgerError, SettlementError},
    model::{BillSelection, PersonBalance},
    ports::BillSource,
};
use tabsplit_domain::{
    BalanceAggregator, Balances, Bill, Money, Roster, SettlementAuditError, SettlementContext,
    SettlementSolver, Transfer,
    services::{audit_zero_sum, unresolved_residuals},
};

/// Data-integrity problems the user should be told about. The transfers that
/// were produced are still usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementWarning {
    /// The selected bills do not net out to zero.
    NonZeroAggregate { total: Money },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettlementResult {
    pub balances: Vec<PersonBalance>,
    pub transfers: Vec<Transfer>,
    pub residuals: Vec<PersonBalance>,
    pub warning: Option<SettlementWarning>,
}

impl SettlementResult {
    pub fn is_settled(&self) -> bool {
        self.transfers.is_empty() && self.residuals.is_empty()
    }
}

/// Calling layer around the aggregator and solver. Holds no state between
/// calls; every result is recomputed from the bills passed in.
pub struct SettlementService {
    aggregator: BalanceAggregator,
    solver: SettlementSolver,
}

impl SettlementService {
    pub fn new(context: SettlementContext) -> Self {
        Self {
            aggregator: BalanceAggregator,
            solver: SettlementSolver::new(context),
        }
    }

    pub fn compute(
        &self,
        roster: &Roster,
        source: &dyn BillSource,
        selection: &BillSelection,
    ) -> Result<SettlementResult, LedgerError> {
        let bills = selection.resolve(source)?;
        let balances = self.aggregator.aggregate(bills.iter().copied(), roster);
        Ok(self.settle_balances(balances))
    }

    /// Like [`Self::compute`] but refuses bill sets that do not net to zero.
    pub fn compute_strict(
        &self,
        roster: &Roster,
        source: &dyn BillSource,
        selection: &BillSelection,
    ) -> Result<SettlementResult, SettlementError> {
        let result = self.compute(roster, source, selection)?;
        match result.warning {
            Some(SettlementWarning::NonZeroAggregate { total }) => {
                Err(SettlementError::NonZeroAggregate { total })
            }
            None => Ok(result),
        }
    }

    /// Freezes the bill's current totals and settles that bill on its own.
    pub fn finalize_bill(&self, bill: &mut Bill, roster: &Roster) -> SettlementResult {
        bill.finalize();
        tracing::info!(
            bill_id = bill.id(),
            total_amount = %bill.total_amount(),
            "Bill finalized"
        );
        let balances = self.aggregator.aggregate(std::iter::once(&*bill), roster);
        self.settle_balances(balances)
    }

    fn settle_balances(&self, balances: Balances) -> SettlementResult {
        let warning = audit_zero_sum(&balances)
            .err()
            .map(|err| match err {
                SettlementAuditError::NonZeroAggregate { total } => {
                    SettlementWarning::NonZeroAggregate { total }
                }
            });

        let person_balances = to_person_balances(&balances);
        let settlement = self.solver.settle(balances);
        let residuals: Vec<PersonBalance> = unresolved_residuals(&settlement.new_balances)
            .into_iter()
            .map(|(id, balance)| PersonBalance { id, balance })
            .collect();

        SettlementResult {
            balances: person_balances,
            transfers: settlement.transfers,
            residuals,
            warning,
        }
    }
}

impl Default for SettlementService {
    fn default() -> Self {
        Self::new(SettlementContext::default())
    }
}

fn to_person_balances(balances: &Balances) -> Vec<PersonBalance> {
    balances
        .iter()
        .map(|(id, balance)| PersonBalance {
            id: id.clone(),
            balance: *balance,
        })
        .collect()
}
