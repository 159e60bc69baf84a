use crate::model::{
    Balances, CURRENCY_SCALE, MATERIALITY_THRESHOLD, Money, ParticipantId, Settlement, Transfer,
};

/// Knobs for settlement calculation.
///
/// # Example
/// ```
/// use tabsplit_domain::{Money, services::SettlementContext};
///
/// let ctx = SettlementContext {
///     scale: 2,
///     materiality: Money::new(1, 2),
/// };
/// assert_eq!(ctx, SettlementContext::default());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettlementContext {
    /// Decimal places emitted transfer amounts are rounded to.
    pub scale: u32,
    /// Amounts below this are treated as already settled.
    pub materiality: Money,
}

impl Default for SettlementContext {
    fn default() -> Self {
        Self {
            scale: CURRENCY_SCALE,
            materiality: MATERIALITY_THRESHOLD,
        }
    }
}

/// Greedy largest-debtor / largest-creditor settlement.
///
/// Balances are stably sorted ascending and two cursors walk inwards: the
/// debtor cursor from the most negative balance, the creditor cursor from the
/// most positive. Each step moves `min(-debtor, creditor)` between them.
///
/// For a zero-sum input this yields at most `n - 1` transfers for `n`
/// participants with a non-zero balance. It is a heuristic and does not
/// guarantee the globally minimal number of transfers.
///
/// Input that does not sum to zero is not rejected; whatever cannot be
/// matched is left in [`Settlement::new_balances`].
pub struct SettlementSolver {
    context: SettlementContext,
}

impl SettlementSolver {
    pub fn new(context: SettlementContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> SettlementContext {
        self.context
    }

    pub fn solve(&self, balances: &Balances) -> Vec<Transfer> {
        self.settle(balances.clone()).transfers
    }

    /// Takes ownership of balances and returns them after all transfers were
    /// applied, together with the transfer list.
    pub fn settle(&self, balances: Balances) -> Settlement {
        let SettlementContext { scale, materiality } = self.context;

        let mut ledger: Vec<(ParticipantId, Money)> = balances
            .iter()
            .map(|(id, balance)| (id.clone(), *balance))
            .collect();
        // Stable: equal balances keep input order.
        ledger.sort_by(|(_, lhs), (_, rhs)| lhs.cmp(rhs));

        tracing::debug!(
            participant_count = ledger.len(),
            materiality = %materiality,
            "Settlement started"
        );

        let mut transfers = Vec::new();
        if ledger.len() >= 2 {
            let mut i = 0;
            let mut j = ledger.len() - 1;

            while i < j {
                let amount = (-ledger[i].1).min(ledger[j].1);

                if amount >= materiality {
                    transfers.push(Transfer {
                        from: ledger[i].0.clone(),
                        to: ledger[j].0.clone(),
                        amount: amount.round_dp(scale),
                    });
                    ledger[i].1 += amount;
                    ledger[j].1 -= amount;
                }

                // A cursor also moves on once its side has nothing left to match,
                // which keeps same-signed leftovers from stalling the walk.
                if ledger[i].1 > -materiality {
                    i += 1;
                }
                if ledger[j].1 < materiality {
                    j -= 1;
                }
            }
        }

        let mut new_balances = balances;
        for (id, balance) in ledger {
            if let Some(slot) = new_balances.get_mut(&id) {
                *slot = balance;
            }
        }

        let unresolved = new_balances
            .values()
            .filter(|balance| balance.abs() >= materiality)
            .count();
        if unresolved > 0 {
            tracing::warn!(
                unresolved,
                transfer_count = transfers.len(),
                "Settlement left residual balances; the input did not sum to zero"
            );
        }

        tracing::debug!(transfer_count = transfers.len(), "Settlement finished");

        Settlement {
            new_balances,
            transfers,
        }
    }
}

impl Default for SettlementSolver {
    fn default() -> Self {
        Self::new(SettlementContext::default())
    }
}

/// See [`SettlementSolver::solve`].
pub fn solve(balances: &Balances) -> Vec<Transfer> {
    SettlementSolver::default().solve(balances)
}
