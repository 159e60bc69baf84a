mod bill;
mod entry;
mod money;
mod roster;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use bill::{Bill, BillError};
pub use entry::{Entry, EntryValidationError, SplitStrategy};
pub use money::{CURRENCY_SCALE, MATERIALITY_THRESHOLD, Money};
pub use roster::{Participant, ParticipantId, Roster, RosterError};

/// Net contribution per participant inside one bill (positive: fronted money).
pub type Totals = IndexMap<ParticipantId, Money>;

/// Net position per participant across a bill set (positive: is owed money).
pub type Balances = IndexMap<ParticipantId, Money>;

/// `from` pays `to`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: Money,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Settlement {
    pub new_balances: Balances,
    pub transfers: Vec<Transfer>,
}
