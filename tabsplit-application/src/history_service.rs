use crate::{error::LedgerError, model::BillSelection, ports::BillSource};
use tabsplit_domain::{
    Bill, BillFilter, BillOrder, Roster, SpendingAnalyzer, SpendingSummary, sort_bills,
};

/// Which bills a history view shows, and in what order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BillQuery {
    pub selection: BillSelection,
    pub filter: BillFilter,
    pub order: BillOrder,
    pub limit: Option<usize>,
}

/// Read-only views over stored bills: filtered listings and spending
/// statistics. Never touches totals.
pub struct HistoryService {
    analyzer: SpendingAnalyzer,
}

impl HistoryService {
    pub fn new() -> Self {
        Self {
            analyzer: SpendingAnalyzer,
        }
    }

    pub fn bills<'s>(
        &self,
        source: &'s dyn BillSource,
        query: &BillQuery,
    ) -> Result<Vec<&'s Bill>, LedgerError> {
        let selected = query.selection.resolve(source)?;
        let mut bills = query.filter.apply(selected);
        sort_bills(&mut bills, query.order);
        if let Some(limit) = query.limit {
            bills.truncate(limit);
        }
        tracing::debug!(matched = bills.len(), "Bills queried");
        Ok(bills)
    }

    /// Statistics over the bills `query` matches; order and limit are ignored.
    pub fn summary(
        &self,
        roster: &Roster,
        source: &dyn BillSource,
        query: &BillQuery,
    ) -> Result<SpendingSummary, LedgerError> {
        let selected = query.selection.resolve(source)?;
        let bills = query.filter.apply(selected);
        Ok(self.analyzer.summarize(bills, roster))
    }
}

impl Default for HistoryService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::{fixture, rstest};
    use tabsplit_domain::{Entry, Money, ParticipantId, SplitStrategy};

    #[fixture]
    fn roster() -> Roster {
        Roster::from_ids(["A", "B"]).expect("valid roster")
    }

    fn bill(id: &str, day: u32, category: &str, amount: i64) -> Bill {
        let date = NaiveDate::from_ymd_opt(2024, 8, day).expect("valid date");
        let entry = Entry::try_new(
            format!("{id}-e"),
            Money::from_i64(amount),
            SplitStrategy::Custom,
            ParticipantId::from("A"),
            [(ParticipantId::from("B"), Money::from_i64(amount))]
                .into_iter()
                .collect(),
            "",
        )
        .expect("valid entry");
        let mut bill = Bill::new(id, id, date, &roster()).with_category(category);
        bill.add_entry(entry).expect("unique entry");
        bill
    }

    fn source() -> Vec<Bill> {
        vec![
            bill("b1", 1, "food", 30),
            bill("b2", 9, "travel", 200),
            bill("b3", 15, "food", 45),
        ]
    }

    #[test]
    fn listing_filters_sorts_and_limits() {
        let query = BillQuery {
            filter: BillFilter::new().category("food"),
            order: BillOrder::AmountHigh,
            limit: Some(1),
            ..BillQuery::default()
        };

        let source = source();
        let bills = HistoryService::default()
            .bills(&source, &query)
            .expect("known bills");

        let ids: Vec<&str> = bills.iter().map(|bill| bill.id()).collect();
        assert_eq!(ids, ["b3"]);
    }

    #[test]
    fn selection_is_applied_before_the_filter() {
        let query = BillQuery {
            selection: BillSelection::Ids(vec!["b2".to_owned(), "b1".to_owned(), "b2".to_owned()]),
            order: BillOrder::Oldest,
            ..BillQuery::default()
        };

        let source = source();
        let bills = HistoryService::default()
            .bills(&source, &query)
            .expect("known bills");

        let ids: Vec<&str> = bills.iter().map(|bill| bill.id()).collect();
        assert_eq!(ids, ["b1", "b2"]);
    }

    #[rstest]
    fn summary_respects_the_filter(roster: Roster) {
        let query = BillQuery {
            filter: BillFilter::new().between(
                NaiveDate::from_ymd_opt(2024, 8, 5),
                NaiveDate::from_ymd_opt(2024, 8, 31),
            ),
            ..BillQuery::default()
        };

        let summary = HistoryService::default()
            .summary(&roster, &source(), &query)
            .expect("known bills");

        assert_eq!(summary.bill_count, 2);
        assert_eq!(summary.total_spent, Money::from_i64(245));
        assert_eq!(summary.categories[0].category, "travel");
        assert_eq!(summary.participants[0].id.as_str(), "B");
    }

    #[rstest]
    fn unknown_selected_bill_is_an_error(roster: Roster) {
        let query = BillQuery {
            selection: BillSelection::Ids(vec!["nope".to_owned()]),
            ..BillQuery::default()
        };

        let err = HistoryService::default()
            .summary(&roster, &source(), &query)
            .unwrap_err();

        assert_eq!(err, LedgerError::UnknownBill("nope".to_owned()));
    }
}
