use crate::model::{Bill, CURRENCY_SCALE, Money, ParticipantId, Roster};
use chrono::Datelike;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Reverse;

/// Number of trailing months kept by [`SpendingSummary::recent_months`].
pub const TREND_MONTHS: usize = 12;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpending {
    pub category: String,
    pub amount: Money,
    pub count: usize,
    /// Share of all spending, one decimal place.
    pub percentage: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySpending {
    /// `YYYY-MM`.
    pub month: String,
    pub amount: Money,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSpending {
    pub id: ParticipantId,
    pub amount: Money,
    pub percentage: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingSummary {
    pub total_spent: Money,
    pub bill_count: usize,
    pub average_per_bill: Money,
    /// Largest first.
    pub categories: Vec<CategorySpending>,
    /// Oldest first.
    pub months: Vec<MonthlySpending>,
    /// Largest first.
    pub participants: Vec<ParticipantSpending>,
}

impl SpendingSummary {
    /// The trailing [`TREND_MONTHS`] months of the trend.
    pub fn recent_months(&self) -> &[MonthlySpending] {
        let skip = self.months.len().saturating_sub(TREND_MONTHS);
        &self.months[skip..]
    }
}

/// Read-only spending statistics over a bill set.
///
/// Category and monthly figures use each bill's total amount, so quick-split
/// records without entries still count. Participant figures are what each
/// person consumed, the sum of their entry shares; every roster participant is
/// listed even at zero.
pub struct SpendingAnalyzer;

impl SpendingAnalyzer {
    pub fn summarize<'b, I>(&self, bills: I, roster: &Roster) -> SpendingSummary
    where
        I: IntoIterator<Item = &'b Bill>,
    {
        let mut total_spent = Money::ZERO;
        let mut bill_count = 0usize;
        let mut categories: IndexMap<&str, (Money, usize)> = IndexMap::new();
        let mut months: IndexMap<String, (Money, usize)> = IndexMap::new();
        let mut consumed: IndexMap<ParticipantId, Money> =
            roster.ids().map(|id| (id.clone(), Money::ZERO)).collect();

        for bill in bills {
            let amount = bill.total_amount();
            total_spent += amount;
            bill_count += 1;

            let slot = categories.entry(bill.category()).or_default();
            slot.0 += amount;
            slot.1 += 1;

            let month = format!("{:04}-{:02}", bill.date().year(), bill.date().month());
            let slot = months.entry(month).or_default();
            slot.0 += amount;
            slot.1 += 1;

            for entry in bill.entries() {
                for participant in entry.participants() {
                    *consumed.entry(participant.clone()).or_insert(Money::ZERO) +=
                        entry.share_of(participant.as_str());
                }
            }
        }

        let mut categories: Vec<CategorySpending> = categories
            .into_iter()
            .map(|(category, (amount, count))| CategorySpending {
                category: category.to_owned(),
                amount,
                count,
                percentage: percentage_of(amount, total_spent),
            })
            .collect();
        categories.sort_by_key(|category| Reverse(category.amount));

        let mut months: Vec<MonthlySpending> = months
            .into_iter()
            .map(|(month, (amount, count))| MonthlySpending {
                month,
                amount,
                count,
            })
            .collect();
        months.sort_by(|a, b| a.month.cmp(&b.month));

        let mut participants: Vec<ParticipantSpending> = consumed
            .into_iter()
            .map(|(id, amount)| ParticipantSpending {
                id,
                amount,
                percentage: percentage_of(amount, total_spent),
            })
            .collect();
        participants.sort_by_key(|participant| Reverse(participant.amount));

        let average_per_bill = match bill_count {
            0 => Money::ZERO,
            count => Money::from_decimal(total_spent.as_decimal() / Decimal::from(count))
                .round_dp(CURRENCY_SCALE),
        };

        tracing::debug!(
            bill_count,
            total_spent = %total_spent,
            category_count = categories.len(),
            "Spending summarized"
        );

        SpendingSummary {
            total_spent,
            bill_count,
            average_per_bill,
            categories,
            months,
            participants,
        }
    }
}

/// See [`SpendingAnalyzer::summarize`].
pub fn summarize(bills: &[Bill], roster: &Roster) -> SpendingSummary {
    SpendingAnalyzer.summarize(bills, roster)
}

fn percentage_of(part: Money, whole: Money) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (part.as_decimal() * Decimal::ONE_HUNDRED / whole.as_decimal()).round_dp(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entry, SplitStrategy};
    use chrono::NaiveDate;
    use rstest::{fixture, rstest};
    use rust_decimal_macros::dec;

    #[fixture]
    fn roster() -> Roster {
        Roster::from_ids(["A", "B", "C"]).expect("valid roster")
    }

    fn bill(id: &str, day: (i32, u32, u32), category: &str, split: &[(&str, i64)]) -> Bill {
        let date = NaiveDate::from_ymd_opt(day.0, day.1, day.2).expect("valid date");
        let shares: IndexMap<ParticipantId, Money> = split
            .iter()
            .map(|&(code, value)| (ParticipantId::from(code), Money::from_i64(value)))
            .collect();
        let amount: Money = shares.values().sum();
        let entry = Entry::try_new(
            format!("{id}-e"),
            amount,
            SplitStrategy::infer(shares.values()),
            ParticipantId::from(split[0].0),
            shares,
            "",
        )
        .expect("valid entry");
        let mut bill = Bill::new(id, id, date, &roster()).with_category(category);
        bill.add_entry(entry).expect("unique entry");
        bill
    }

    fn history() -> Vec<Bill> {
        vec![
            bill("b1", (2024, 1, 10), "food", &[("A", 30), ("B", 30)]),
            bill("b2", (2024, 1, 20), "transport", &[("B", 20)]),
            bill("b3", (2024, 2, 1), "food", &[("A", 40), ("B", 40), ("C", 40)]),
        ]
    }

    #[rstest]
    fn totals_and_average(roster: Roster) {
        let summary = SpendingAnalyzer.summarize(&history(), &roster);

        assert_eq!(summary.total_spent, Money::from_i64(200));
        assert_eq!(summary.bill_count, 3);
        assert_eq!(summary.average_per_bill, Money::new(6667, 2));
    }

    #[rstest]
    fn categories_are_largest_first(roster: Roster) {
        let summary = SpendingAnalyzer.summarize(&history(), &roster);

        assert_eq!(
            summary.categories,
            vec![
                CategorySpending {
                    category: "food".to_owned(),
                    amount: Money::from_i64(180),
                    count: 2,
                    percentage: dec!(90.0),
                },
                CategorySpending {
                    category: "transport".to_owned(),
                    amount: Money::from_i64(20),
                    count: 1,
                    percentage: dec!(10.0),
                },
            ]
        );
    }

    #[rstest]
    fn months_group_by_calendar_month(roster: Roster) {
        let summary = SpendingAnalyzer.summarize(&history(), &roster);

        let months: Vec<(&str, Money, usize)> = summary
            .months
            .iter()
            .map(|month| (month.month.as_str(), month.amount, month.count))
            .collect();
        assert_eq!(
            months,
            [
                ("2024-01", Money::from_i64(80), 2),
                ("2024-02", Money::from_i64(120), 1),
            ]
        );
    }

    #[rstest]
    fn participants_report_what_they_consumed(roster: Roster) {
        let summary = SpendingAnalyzer.summarize(&history(), &roster);

        let consumed: Vec<(&str, Money)> = summary
            .participants
            .iter()
            .map(|person| (person.id.as_str(), person.amount))
            .collect();
        assert_eq!(
            consumed,
            [
                ("B", Money::from_i64(90)),
                ("A", Money::from_i64(70)),
                ("C", Money::from_i64(40)),
            ]
        );
        assert_eq!(summary.participants[0].percentage, dec!(45.0));
    }

    #[rstest]
    fn quick_split_counts_toward_category_totals(roster: Roster) {
        let json = r#"{
            "id": "q1",
            "date": "2024-03-05T09:00:00Z",
            "category": "travel",
            "totalAmount": 80,
            "finalTotals": {"A": 40, "B": -40}
        }"#;
        let bills = vec![serde_json::from_str::<Bill>(json).expect("valid record")];

        let summary = summarize(&bills, &roster);

        assert_eq!(summary.total_spent, Money::from_i64(80));
        assert_eq!(summary.categories[0].category, "travel");
        assert_eq!(summary.months[0].month, "2024-03");
        assert!(summary.participants.iter().all(|person| person.amount.is_zero()));
    }

    #[rstest]
    fn empty_history_has_zero_percentages(roster: Roster) {
        let summary = summarize(&[], &roster);

        assert_eq!(summary.average_per_bill, Money::ZERO);
        assert!(summary.categories.is_empty());
        assert_eq!(summary.participants.len(), 3);
        assert!(
            summary
                .participants
                .iter()
                .all(|person| person.percentage.is_zero())
        );
    }

    #[test]
    fn trend_keeps_the_last_twelve_months() {
        let roster = Roster::from_ids(["A"]).expect("valid roster");
        let bills: Vec<Bill> = (1..=14)
            .map(|n| {
                let (year, month) = if n <= 12 { (2023, n) } else { (2024, n - 12) };
                bill(&format!("b{n}"), (year, month, 1), "food", &[("A", 10)])
            })
            .collect();

        let summary = SpendingAnalyzer.summarize(&bills, &roster);

        assert_eq!(summary.months.len(), 14);
        let trend = summary.recent_months();
        assert_eq!(trend.len(), TREND_MONTHS);
        assert_eq!(trend[0].month, "2023-03");
        assert_eq!(trend[11].month, "2024-02");
    }
}
