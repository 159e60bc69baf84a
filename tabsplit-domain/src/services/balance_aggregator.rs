use crate::model::{Balances, Bill, Money, ParticipantId, Roster};

/// Folds per-bill totals into one net balance per participant.
///
/// Every roster participant appears in the output (in roster order) even with
/// no activity. Participants found in bill totals but missing from the roster
/// are appended in first-seen order so the balances still sum to zero.
///
/// Entries are assumed to be validated already; this is a pure fold and never
/// rejects input.
pub struct BalanceAggregator;

impl BalanceAggregator {
    pub fn aggregate<'b, I>(&self, bills: I, roster: &Roster) -> Balances
    where
        I: IntoIterator<Item = &'b Bill>,
    {
        let mut balances: Balances = roster.ids().map(|id| (id.clone(), Money::ZERO)).collect();
        let mut unlisted: Vec<ParticipantId> = Vec::new();
        let mut bill_count = 0usize;
        let mut frozen_count = 0usize;

        for bill in bills {
            bill_count += 1;
            let Some(totals) = bill.effective_totals() else {
                continue;
            };
            if bill.is_finalized() {
                frozen_count += 1;
            }
            for (participant, total) in totals {
                match balances.get_mut(participant) {
                    Some(balance) => *balance += *total,
                    None => {
                        unlisted.push(participant.clone());
                        balances.insert(participant.clone(), *total);
                    }
                }
            }
        }

        if !unlisted.is_empty() {
            tracing::warn!(
                unknown_participants = ?unlisted,
                roster_size = roster.len(),
                "Bill totals reference participants missing from the roster"
            );
        }

        tracing::debug!(
            bill_count,
            frozen_count,
            participant_count = balances.len(),
            "Balances aggregated"
        );

        balances
    }
}

/// See [`BalanceAggregator::aggregate`].
pub fn aggregate(bills: &[Bill], roster: &Roster) -> Balances {
    BalanceAggregator.aggregate(bills, roster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entry, SplitStrategy};
    use chrono::NaiveDate;
    use indexmap::IndexMap;
    use rstest::{fixture, rstest};

    #[fixture]
    fn roster() -> Roster {
        Roster::from_ids(["A", "B", "C"]).expect("valid roster")
    }

    fn equal_entry(id: &str, payer: &str, amount: i64, between: &[&str]) -> Entry {
        let per_head = Money::from_decimal(
            Money::from_i64(amount).as_decimal() / rust_decimal::Decimal::from(between.len()),
        );
        let shares: IndexMap<ParticipantId, Money> = between
            .iter()
            .map(|&code| (ParticipantId::from(code), per_head))
            .collect();
        Entry::try_new(
            id,
            Money::from_i64(amount),
            SplitStrategy::Equal,
            ParticipantId::from(payer),
            shares,
            "",
        )
        .expect("valid entry")
    }

    fn bill(id: &str, roster: &Roster, entries: Vec<Entry>) -> Bill {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");
        let mut bill = Bill::new(id, id, date, roster);
        for entry in entries {
            bill.add_entry(entry).expect("unique entry");
        }
        bill
    }

    #[rstest]
    fn three_entries_over_one_bill(roster: Roster) {
        let bills = vec![bill(
            "b1",
            &roster,
            vec![
                equal_entry("e1", "A", 100, &["A", "B"]),
                equal_entry("e2", "B", 100, &["B", "C"]),
                equal_entry("e3", "C", 100, &["A", "C"]),
            ],
        )];

        let balances = aggregate(&bills, &roster);

        // A: +100 - 50 - 50, B: -50 + 100 - 50, C: -50 + 100 - 50
        assert_eq!(balances["A"], Money::ZERO);
        assert_eq!(balances["B"], Money::ZERO);
        assert_eq!(balances["C"], Money::ZERO);
    }

    #[rstest]
    fn one_payer_covers_everyone(roster: Roster) {
        let bills = vec![bill(
            "b1",
            &roster,
            vec![
                equal_entry("e1", "A", 100, &["A", "B"]),
                equal_entry("e2", "A", 100, &["B", "C"]),
                equal_entry("e3", "A", 100, &["A", "C"]),
            ],
        )];

        let balances = aggregate(&bills, &roster);

        assert_eq!(balances["A"], Money::from_i64(200));
        assert_eq!(balances["B"], Money::from_i64(-100));
        assert_eq!(balances["C"], Money::from_i64(-100));
    }

    #[rstest]
    fn idle_participants_are_reported_in_roster_order(roster: Roster) {
        let bills = vec![bill("b1", &roster, vec![equal_entry("e1", "C", 10, &["C", "B"])])];

        let balances = aggregate(&bills, &roster);
        let order: Vec<&str> = balances.keys().map(ParticipantId::as_str).collect();

        assert_eq!(order, ["A", "B", "C"]);
        assert_eq!(balances["A"], Money::ZERO);
    }

    #[rstest]
    fn frozen_totals_win_over_live_totals(roster: Roster) {
        let mut frozen = bill("b1", &roster, vec![equal_entry("e1", "A", 60, &["B", "C"])]);
        frozen.finalize();
        frozen.remove_entry("e1").expect("remove");
        let live = bill("b2", &roster, vec![equal_entry("e2", "B", 30, &["A"])]);

        let balances = aggregate(&[frozen, live], &roster);

        assert_eq!(balances["A"], Money::from_i64(30));
        assert_eq!(balances["B"], Money::ZERO);
        assert_eq!(balances["C"], Money::from_i64(-30));
    }

    #[rstest]
    fn bills_without_totals_contribute_nothing(roster: Roster) {
        let record: Bill =
            serde_json::from_str(r#"{"id": "b0", "name": "legacy", "date": "2022-02-02"}"#)
                .expect("valid record");

        let balances = aggregate(&[record], &roster);

        assert_eq!(balances.len(), 3);
        assert!(balances.values().all(|balance| balance.is_zero()));
    }

    #[rstest]
    fn participants_missing_from_roster_are_appended() {
        let wide = Roster::from_ids(["A", "B", "Z"]).expect("valid roster");
        let bills = vec![bill("b1", &wide, vec![equal_entry("e1", "Z", 10, &["A"])])];
        let narrow = Roster::from_ids(["B", "A"]).expect("valid roster");

        let balances = aggregate(&bills, &narrow);
        let order: Vec<&str> = balances.keys().map(ParticipantId::as_str).collect();

        assert_eq!(order, ["B", "A", "Z"]);
        assert_eq!(balances["Z"], Money::from_i64(10));
    }

    #[test]
    fn empty_input_yields_empty_balances() {
        let roster = Roster::default();
        assert!(aggregate(&[], &roster).is_empty());
    }

    #[rstest]
    fn aggregation_is_idempotent(roster: Roster) {
        let bills = vec![
            bill("b1", &roster, vec![equal_entry("e1", "A", 90, &["A", "B", "C"])]),
            bill("b2", &roster, vec![equal_entry("e2", "C", 40, &["B"])]),
        ];

        assert_eq!(aggregate(&bills, &roster), aggregate(&bills, &roster));
    }
}
