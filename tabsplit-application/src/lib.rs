#![warn(clippy::uninlined_format_args)]

pub mod error;
pub mod history_service;
pub mod model;
pub mod ports;
pub mod settlement_service;

pub use error::{LedgerError, SettlementError};
pub use history_service::{BillQuery, HistoryService};
pub use model::{BillSelection, Ledger, PersonBalance};
pub use ports::{BillSource, ParticipantDirectory};
pub use settlement_service::{SettlementResult, SettlementService, SettlementWarning};
