use crate::model::{
    CURRENCY_SCALE, Entry, EntryValidationError, MATERIALITY_THRESHOLD, Money, ParticipantId,
    Roster, SplitStrategy,
};
use fxhash::FxHashSet;
use indexmap::IndexMap;
use rust_decimal::{Decimal, RoundingStrategy};

/// Tolerance on the percentage total, in percentage points.
const PERCENTAGE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// How the user asked for an amount to be divided.
#[derive(Clone, Debug, PartialEq)]
pub enum SplitInput {
    Equal,
    Custom(IndexMap<ParticipantId, Money>),
    Percentage(IndexMap<ParticipantId, Decimal>),
}

impl SplitInput {
    pub fn strategy(&self) -> SplitStrategy {
        match self {
            Self::Equal => SplitStrategy::Equal,
            Self::Custom(_) => SplitStrategy::Custom,
            Self::Percentage(_) => SplitStrategy::Percentage,
        }
    }
}

/// Unresolved expense line as entered by the user.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryDraft {
    pub id: String,
    pub amount: Money,
    pub paid_by: ParticipantId,
    pub participants: Vec<ParticipantId>,
    pub split: SplitInput,
    pub description: String,
}

/// Turns drafts into entries whose shares are absolute amounts summing to the
/// entry amount.
pub struct SplitResolver<'a> {
    roster: &'a Roster,
}

impl<'a> SplitResolver<'a> {
    pub fn new(roster: &'a Roster) -> Self {
        Self { roster }
    }

    pub fn resolve(&self, draft: EntryDraft) -> Result<Entry, EntryValidationError> {
        let EntryDraft {
            id,
            amount,
            paid_by,
            participants,
            split,
            description,
        } = draft;

        if !amount.is_positive() {
            return Err(EntryValidationError::NonPositiveAmount(amount));
        }
        if amount.exceeds_scale(CURRENCY_SCALE) {
            return Err(EntryValidationError::ExcessPrecision(amount));
        }
        if !self.roster.contains(paid_by.as_str()) {
            return Err(EntryValidationError::UnknownPayer(paid_by));
        }
        self.check_selection(&participants)?;

        let strategy = split.strategy();
        let shares = match split {
            SplitInput::Equal => split_equally(amount, &participants),
            SplitInput::Custom(amounts) => {
                let shares = collect_shares(&participants, amounts, |value| {
                    value.round_dp(CURRENCY_SCALE)
                })?;
                let actual: Money = shares.values().sum();
                if (amount - actual).abs() > MATERIALITY_THRESHOLD {
                    return Err(EntryValidationError::SharesMismatch {
                        expected: amount,
                        actual,
                    });
                }
                absorb_residual(shares, amount)?
            }
            SplitInput::Percentage(percents) => {
                let total: Decimal = percents.values().sum();
                if (total - Decimal::ONE_HUNDRED).abs() > PERCENTAGE_TOLERANCE {
                    return Err(EntryValidationError::PercentagesMismatch { total });
                }
                let shares = collect_shares(&participants, percents, |percent| {
                    Money::from_decimal(amount.as_decimal() * percent / Decimal::ONE_HUNDRED)
                        .round_dp(CURRENCY_SCALE)
                })?;
                absorb_residual(shares, amount)?
            }
        };

        tracing::trace!(
            entry_id = %id,
            amount = %amount,
            split = ?strategy,
            participant_count = shares.len(),
            "Entry shares resolved"
        );

        Entry::try_new(id, amount, strategy, paid_by, shares, description)
    }

    fn check_selection(&self, participants: &[ParticipantId]) -> Result<(), EntryValidationError> {
        if participants.is_empty() {
            return Err(EntryValidationError::NoParticipants);
        }
        let mut seen = FxHashSet::default();
        for participant in participants {
            if !self.roster.contains(participant.as_str()) {
                return Err(EntryValidationError::UnknownParticipant(participant.clone()));
            }
            if !seen.insert(participant) {
                return Err(EntryValidationError::DuplicateParticipant(participant.clone()));
            }
        }
        Ok(())
    }
}

/// Divides `amount` into whole minor units; the remainder goes one unit at a
/// time to the first participants in selection order.
fn split_equally(
    amount: Money,
    participants: &[ParticipantId],
) -> IndexMap<ParticipantId, Money> {
    let unit = Money::new(1, CURRENCY_SCALE);
    let count = Decimal::from(participants.len());
    let base = Money::from_decimal(
        (amount.as_decimal() / count)
            .round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::ToZero),
    );
    let mut remainder = amount - Money::from_decimal(base.as_decimal() * count);

    participants
        .iter()
        .map(|participant| {
            let mut share = base;
            if remainder.is_positive() {
                share += unit;
                remainder -= unit;
            }
            (participant.clone(), share)
        })
        .collect()
}

fn collect_shares<T, F>(
    participants: &[ParticipantId],
    mut given: IndexMap<ParticipantId, T>,
    to_share: F,
) -> Result<IndexMap<ParticipantId, Money>, EntryValidationError>
where
    T: Copy + PartialOrd + Default,
    F: Fn(T) -> Money,
{
    let mut shares = IndexMap::with_capacity(participants.len());
    for participant in participants {
        let value = given
            .shift_remove(participant)
            .ok_or_else(|| EntryValidationError::MissingShare(participant.clone()))?;
        if value < T::default() {
            return Err(EntryValidationError::NegativeShare(participant.clone()));
        }
        shares.insert(participant.clone(), to_share(value));
    }
    if let Some((extra, _)) = given.into_iter().next() {
        return Err(EntryValidationError::UnexpectedShare(extra));
    }
    Ok(shares)
}

/// Moves the rounding residual onto the largest share (first one on ties) so
/// the shares add up to `amount` exactly.
fn absorb_residual(
    mut shares: IndexMap<ParticipantId, Money>,
    amount: Money,
) -> Result<IndexMap<ParticipantId, Money>, EntryValidationError> {
    let residual = amount - shares.values().sum::<Money>();
    if residual.is_zero() {
        return Ok(shares);
    }

    let largest = shares
        .values()
        .enumerate()
        .fold(None, |best: Option<(usize, Money)>, (index, &share)| match best {
            Some((_, top)) if top >= share => best,
            _ => Some((index, share)),
        })
        .map(|(index, _)| index);

    if let Some((participant, share)) = largest.and_then(|index| shares.get_index_mut(index)) {
        *share += residual;
        if share.is_negative() {
            return Err(EntryValidationError::NegativeShare(participant.clone()));
        }
    }
    Ok(shares)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use rust_decimal_macros::dec;

    #[fixture]
    fn roster() -> Roster {
        Roster::from_ids(["A", "B", "C", "D"]).expect("valid roster")
    }

    fn ids(codes: &[&str]) -> Vec<ParticipantId> {
        codes.iter().copied().map(ParticipantId::from).collect()
    }

    fn draft(amount: Money, participants: &[&str], split: SplitInput) -> EntryDraft {
        EntryDraft {
            id: "e1".to_owned(),
            amount,
            paid_by: ParticipantId::from("A"),
            participants: ids(participants),
            split,
            description: "snacks".to_owned(),
        }
    }

    fn shares_of(entry: &Entry) -> Vec<Money> {
        entry.shares().values().copied().collect()
    }

    #[rstest]
    #[case::even(Money::from_i64(90), &["A", "B", "C"], vec![3000, 3000, 3000])]
    #[case::remainder_to_first(Money::from_i64(100), &["A", "B", "C"], vec![3334, 3333, 3333])]
    #[case::two_cent_remainder(Money::new(1000, 2), &["A", "B", "C", "D"], vec![250, 250, 250, 250])]
    #[case::cents(Money::new(101, 2), &["A", "B"], vec![51, 50])]
    fn equal_split_distributes_remainder(
        roster: Roster,
        #[case] amount: Money,
        #[case] participants: &[&str],
        #[case] expected_cents: Vec<i64>,
    ) {
        let entry = SplitResolver::new(&roster)
            .resolve(draft(amount, participants, SplitInput::Equal))
            .expect("valid draft");

        let expected: Vec<Money> = expected_cents.into_iter().map(|c| Money::new(c, 2)).collect();
        assert_eq!(shares_of(&entry), expected);
        assert_eq!(entry.shares().values().sum::<Money>(), amount);
        assert_eq!(entry.split(), SplitStrategy::Equal);
    }

    #[rstest]
    fn custom_split_absorbs_cent_residual(roster: Roster) {
        let amounts: IndexMap<ParticipantId, Money> = [
            (ParticipantId::from("A"), Money::new(3333, 2)),
            (ParticipantId::from("B"), Money::new(6666, 2)),
        ]
        .into_iter()
        .collect();

        let entry = SplitResolver::new(&roster)
            .resolve(draft(Money::from_i64(100), &["A", "B"], SplitInput::Custom(amounts)))
            .expect("within tolerance");

        assert_eq!(shares_of(&entry), vec![Money::new(3333, 2), Money::new(6667, 2)]);
    }

    #[rstest]
    fn custom_split_outside_tolerance_is_rejected(roster: Roster) {
        let amounts: IndexMap<ParticipantId, Money> = [
            (ParticipantId::from("A"), Money::from_i64(40)),
            (ParticipantId::from("B"), Money::from_i64(50)),
        ]
        .into_iter()
        .collect();

        let err = SplitResolver::new(&roster)
            .resolve(draft(Money::from_i64(100), &["A", "B"], SplitInput::Custom(amounts)))
            .unwrap_err();

        assert_eq!(
            err,
            EntryValidationError::SharesMismatch {
                expected: Money::from_i64(100),
                actual: Money::from_i64(90),
            }
        );
    }

    #[rstest]
    fn percentage_split_resolves_to_amounts(roster: Roster) {
        let percents: IndexMap<ParticipantId, Decimal> = [
            (ParticipantId::from("A"), dec!(33.3)),
            (ParticipantId::from("B"), dec!(33.3)),
            (ParticipantId::from("C"), dec!(33.4)),
        ]
        .into_iter()
        .collect();

        let entry = SplitResolver::new(&roster)
            .resolve(draft(
                Money::new(1000, 2),
                &["A", "B", "C"],
                SplitInput::Percentage(percents),
            ))
            .expect("valid percentages");

        assert_eq!(
            shares_of(&entry),
            vec![Money::new(333, 2), Money::new(333, 2), Money::new(334, 2)]
        );
        assert_eq!(entry.split(), SplitStrategy::Percentage);
    }

    #[rstest]
    fn percentage_total_must_be_near_hundred(roster: Roster) {
        let percents: IndexMap<ParticipantId, Decimal> = [
            (ParticipantId::from("A"), dec!(50)),
            (ParticipantId::from("B"), dec!(40)),
        ]
        .into_iter()
        .collect();

        let err = SplitResolver::new(&roster)
            .resolve(draft(Money::from_i64(10), &["A", "B"], SplitInput::Percentage(percents)))
            .unwrap_err();

        assert_eq!(
            err,
            EntryValidationError::PercentagesMismatch { total: dec!(90) }
        );
    }

    #[rstest]
    #[case::zero_amount(draft(Money::ZERO, &["A"], SplitInput::Equal), EntryValidationError::NonPositiveAmount(Money::ZERO))]
    #[case::sub_cent_amount(draft(Money::new(1005, 3), &["A"], SplitInput::Equal), EntryValidationError::ExcessPrecision(Money::new(1005, 3)))]
    #[case::no_participants(draft(Money::from_i64(5), &[], SplitInput::Equal), EntryValidationError::NoParticipants)]
    #[case::unknown(draft(Money::from_i64(5), &["A", "Z"], SplitInput::Equal), EntryValidationError::UnknownParticipant(ParticipantId::from("Z")))]
    #[case::duplicate(draft(Money::from_i64(5), &["B", "B"], SplitInput::Equal), EntryValidationError::DuplicateParticipant(ParticipantId::from("B")))]
    fn rejects_invalid_drafts(
        roster: Roster,
        #[case] draft: EntryDraft,
        #[case] expected: EntryValidationError,
    ) {
        assert_eq!(SplitResolver::new(&roster).resolve(draft).unwrap_err(), expected);
    }

    #[rstest]
    fn unknown_payer_is_rejected(roster: Roster) {
        let mut draft = draft(Money::from_i64(5), &["A"], SplitInput::Equal);
        draft.paid_by = ParticipantId::from("Q");
        assert_eq!(
            SplitResolver::new(&roster).resolve(draft).unwrap_err(),
            EntryValidationError::UnknownPayer(ParticipantId::from("Q"))
        );
    }

    #[rstest]
    fn custom_split_requires_exact_selection(roster: Roster) {
        let missing: IndexMap<ParticipantId, Money> =
            [(ParticipantId::from("A"), Money::from_i64(5))].into_iter().collect();
        assert_eq!(
            SplitResolver::new(&roster)
                .resolve(draft(Money::from_i64(5), &["A", "B"], SplitInput::Custom(missing)))
                .unwrap_err(),
            EntryValidationError::MissingShare(ParticipantId::from("B"))
        );

        let extra: IndexMap<ParticipantId, Money> = [
            (ParticipantId::from("A"), Money::from_i64(5)),
            (ParticipantId::from("C"), Money::ZERO),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            SplitResolver::new(&roster)
                .resolve(draft(Money::from_i64(5), &["A"], SplitInput::Custom(extra)))
                .unwrap_err(),
            EntryValidationError::UnexpectedShare(ParticipantId::from("C"))
        );
    }
}
