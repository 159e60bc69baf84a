use crate::{error::LedgerError, ports::BillSource};
use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};
use tabsplit_domain::{Bill, Money, Participant, ParticipantId, Roster};

/// Snapshot of everything the storage collaborator holds for one group.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub bills: Vec<Bill>,
}

impl Ledger {
    pub fn roster(&self) -> Result<Roster, LedgerError> {
        Ok(Roster::new(self.participants.iter().cloned())?)
    }

    /// Checks every bill the way the storage layer does before saving.
    pub fn validate(&self) -> Result<(), LedgerError> {
        let mut seen = FxHashSet::default();
        for bill in &self.bills {
            if !seen.insert(bill.id()) {
                return Err(LedgerError::DuplicateBill(bill.id().to_owned()));
            }
            bill.validate().map_err(|source| LedgerError::InvalidBill {
                id: bill.id().to_owned(),
                source,
            })?;
        }
        Ok(())
    }

    /// Inserts `bill`, replacing a stored bill with the same id.
    pub fn upsert_bill(&mut self, bill: Bill) -> Result<(), LedgerError> {
        bill.validate().map_err(|source| LedgerError::InvalidBill {
            id: bill.id().to_owned(),
            source,
        })?;
        match self.bills.iter_mut().find(|stored| stored.id() == bill.id()) {
            Some(stored) => *stored = bill,
            None => self.bills.push(bill),
        }
        Ok(())
    }

    /// Brings records written by older versions up to date: bills that carry
    /// entries but no live totals get them rebuilt. Returns how many bills
    /// changed.
    pub fn migrate(&mut self) -> usize {
        let mut migrated = 0usize;
        for bill in &mut self.bills {
            if !bill.entries().is_empty() && bill.totals().is_empty() {
                bill.recalculate_totals();
                migrated += 1;
                tracing::info!(bill_id = bill.id(), "Rebuilt totals for legacy bill");
            }
        }
        migrated
    }

    pub fn remove_bill(&mut self, id: &str) -> Result<Bill, LedgerError> {
        let index = self
            .bills
            .iter()
            .position(|bill| bill.id() == id)
            .ok_or_else(|| LedgerError::UnknownBill(id.to_owned()))?;
        Ok(self.bills.remove(index))
    }
}

impl BillSource for Ledger {
    fn bills(&self) -> &[Bill] {
        &self.bills
    }
}

/// Which stored bills take part in a settlement run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BillSelection {
    #[default]
    All,
    Ids(Vec<String>),
}

impl BillSelection {
    /// Requested bills in request order; an id named twice is counted once.
    pub fn resolve<'s>(&self, source: &'s dyn BillSource) -> Result<Vec<&'s Bill>, LedgerError> {
        match self {
            Self::All => Ok(source.bills().iter().collect()),
            Self::Ids(ids) => {
                let mut seen = FxHashSet::default();
                ids.iter()
                    .filter(|id| seen.insert(id.as_str()))
                    .map(|id| {
                        source
                            .bill(id)
                            .ok_or_else(|| LedgerError::UnknownBill(id.clone()))
                    })
                    .collect()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonBalance {
    pub id: ParticipantId,
    pub balance: Money,
}
