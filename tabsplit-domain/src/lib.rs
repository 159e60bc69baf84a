#![warn(clippy::uninlined_format_args)]

pub mod model;
pub mod services;

pub use model::{
    Balances, Bill, BillError, CURRENCY_SCALE, Entry, EntryValidationError, MATERIALITY_THRESHOLD,
    Money, Participant, ParticipantId, Roster, RosterError, Settlement, SplitStrategy, Totals,
    Transfer,
};
pub use services::{
    BalanceAggregator, BillFilter, BillOrder, CategorySpending, DatePreset, EntryDraft,
    MonthlySpending, ParticipantSpending, SettlementAuditError, SettlementContext,
    SettlementSolver, SpendingAnalyzer, SpendingSummary, SplitInput, SplitResolver, aggregate,
    recent_bills, solve, sort_bills, summarize,
};
