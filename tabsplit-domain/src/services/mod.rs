pub mod balance_aggregator;
pub mod bill_query;
pub mod settlement_audit;
pub mod settlement_solver;
pub mod spending_summary;
pub mod split_resolver;

pub use balance_aggregator::{BalanceAggregator, aggregate};
pub use bill_query::{BillFilter, BillOrder, DatePreset, recent_bills, sort_bills};
pub use settlement_audit::{
    SettlementAuditError, apply_transfers, audit_zero_sum, unresolved_residuals,
};
pub use settlement_solver::{SettlementContext, SettlementSolver, solve};
pub use spending_summary::{
    CategorySpending, MonthlySpending, ParticipantSpending, SpendingAnalyzer, SpendingSummary,
    TREND_MONTHS, summarize,
};
pub use split_resolver::{EntryDraft, SplitInput, SplitResolver};
