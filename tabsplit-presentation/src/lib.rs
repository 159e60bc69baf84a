#![warn(clippy::uninlined_format_args)]

pub mod csv_export;
pub mod json_export;
pub mod settlement_presenter;
pub mod share_text;
pub mod strings;
pub mod summary_presenter;
pub mod text_table;

pub use csv_export::{ExportError, bills_csv, entries_csv, transfers_csv};
pub use json_export::bills_json;
pub use settlement_presenter::{SettlementPresenter, SettlementView};
pub use share_text::share_text;
pub use summary_presenter::{SummaryPresenter, SummaryView};
