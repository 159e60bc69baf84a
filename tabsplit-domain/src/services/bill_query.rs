use crate::model::{Bill, CURRENCY_SCALE, ParticipantId};
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Calendar windows offered by the bill history view, relative to `today`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatePreset {
    Today,
    Week,
    Month,
    LastMonth,
    Year,
}

impl DatePreset {
    /// Inclusive `(from, to)` range. `Week` and `Month` are rolling windows
    /// ending today; `LastMonth` is the previous calendar month; `Year` starts
    /// on 1 January.
    pub fn range(self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            Self::Today => Some((today, today)),
            Self::Week => Some((today.checked_sub_days(Days::new(7))?, today)),
            Self::Month => Some((today.checked_sub_months(Months::new(1))?, today)),
            Self::LastMonth => {
                let last = today.with_day(1)?.pred_opt()?;
                Some((last.with_day(1)?, last))
            }
            Self::Year => Some((NaiveDate::from_ymd_opt(today.year(), 1, 1)?, today)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BillOrder {
    #[default]
    Newest,
    Oldest,
    AmountHigh,
    AmountLow,
    Name,
}

/// Conjunction of optional criteria; an empty filter matches every bill.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BillFilter {
    category: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    participant: Option<ParticipantId>,
    search: Option<String>,
}

impl BillFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Both ends inclusive; either may be open.
    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn participant(mut self, participant: ParticipantId) -> Self {
        self.participant = Some(participant);
        self
    }

    /// Case-insensitive match against name, description, category and the
    /// bill total written with two decimals.
    pub fn search(mut self, term: impl AsRef<str>) -> Self {
        let term = term.as_ref().trim().to_lowercase();
        self.search = (!term.is_empty()).then_some(term);
        self
    }

    pub fn matches(&self, bill: &Bill) -> bool {
        if self
            .category
            .as_deref()
            .is_some_and(|category| bill.category() != category)
        {
            return false;
        }
        if self.from.is_some_and(|from| bill.date() < from)
            || self.to.is_some_and(|to| bill.date() > to)
        {
            return false;
        }
        if self
            .participant
            .as_ref()
            .is_some_and(|participant| !involves(bill, participant))
        {
            return false;
        }
        match &self.search {
            Some(term) => mentions(bill, term),
            None => true,
        }
    }

    pub fn apply<'b, I>(&self, bills: I) -> Vec<&'b Bill>
    where
        I: IntoIterator<Item = &'b Bill>,
    {
        bills.into_iter().filter(|bill| self.matches(bill)).collect()
    }
}

/// Stable sort; bills that compare equal keep their stored order.
pub fn sort_bills(bills: &mut [&Bill], order: BillOrder) {
    match order {
        BillOrder::Newest => bills.sort_by_key(|bill| Reverse(bill.date())),
        BillOrder::Oldest => bills.sort_by_key(|bill| bill.date()),
        BillOrder::AmountHigh => bills.sort_by_key(|bill| Reverse(bill.total_amount())),
        BillOrder::AmountLow => bills.sort_by_key(|bill| bill.total_amount()),
        BillOrder::Name => bills.sort_by_cached_key(|bill| bill.name().to_lowercase()),
    }
}

/// Bills dated within the last `days` days up to `today`, newest first.
pub fn recent_bills<'b, I>(bills: I, today: NaiveDate, days: u64, limit: usize) -> Vec<&'b Bill>
where
    I: IntoIterator<Item = &'b Bill>,
{
    let since = today.checked_sub_days(Days::new(days));
    let mut recent = BillFilter::new().between(since, Some(today)).apply(bills);
    sort_bills(&mut recent, BillOrder::Newest);
    recent.truncate(limit);
    recent
}

fn involves(bill: &Bill, participant: &ParticipantId) -> bool {
    bill.participants().contains(&participant)
        || bill
            .effective_totals()
            .and_then(|totals| totals.get(participant))
            .is_some_and(|total| !total.is_zero())
}

fn mentions(bill: &Bill, term: &str) -> bool {
    [bill.name(), bill.description(), bill.category()]
        .iter()
        .any(|field| field.to_lowercase().contains(term))
        || bill.total_amount().to_fixed(CURRENCY_SCALE).contains(term)
}
