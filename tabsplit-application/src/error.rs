use tabsplit_domain::{BillError, Money, RosterError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error("bill id '{0}' appears more than once")]
    DuplicateBill(String),
    #[error("no bill with id '{0}'")]
    UnknownBill(String),
    #[error("bill '{id}' is invalid")]
    InvalidBill {
        id: String,
        #[source]
        source: BillError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("balances sum to {total} instead of zero; audit the selected bills")]
    NonZeroAggregate { total: Money },
}
