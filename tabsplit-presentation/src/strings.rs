pub const MEMBER: &str = "Member";
pub const BALANCE: &str = "Balance";
pub const FROM: &str = "From";
pub const TO: &str = "To";
pub const AMOUNT: &str = "Amount";
pub const DESCRIPTION: &str = "Description";
pub const PARTICIPANTS: &str = "Participants";
pub const PAID_BY: &str = "Paid By";
pub const DATE: &str = "Date";
pub const NAME: &str = "Name";
pub const CATEGORY: &str = "Category";
pub const RESIDUAL: &str = "Unresolved";
pub const ALL_SETTLED: &str = "All settled up!";
pub const NO_DESCRIPTION: &str = "No description";
pub const CURRENCY_SYMBOL: &str = "₹";

pub fn non_zero_aggregate(total: impl std::fmt::Display) -> String {
    format!("Balances do not add up to zero (off by {total}); check the selected bills.")
}

pub const MONTH: &str = "Month";
pub const BILLS: &str = "Bills";
pub const SHARE: &str = "Share";
pub const SPENT: &str = "Spent";
pub const NO_BILLS: &str = "No bills recorded yet.";

pub fn spending_overview(total: impl std::fmt::Display, count: usize, average: impl std::fmt::Display) -> String {
    let noun = if count == 1 { "bill" } else { "bills" };
    format!("Total spent: {total} across {count} {noun} (average {average})")
}
