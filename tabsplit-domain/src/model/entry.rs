use crate::model::{CURRENCY_SCALE, MATERIALITY_THRESHOLD, Money, ParticipantId, Totals};
use fxhash::FxHashSet;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    Equal,
    Custom,
    Percentage,
}

impl SplitStrategy {
    /// `Equal` when no share differs from the first by more than one cent, the
    /// spread an equal split leaves after distributing its remainder.
    pub fn infer<'a, I>(shares: I) -> Self
    where
        I: IntoIterator<Item = &'a Money>,
    {
        let mut shares = shares.into_iter();
        let Some(&first) = shares.next() else {
            return Self::Equal;
        };
        if shares.all(|&share| (share - first).abs() <= MATERIALITY_THRESHOLD) {
            Self::Equal
        } else {
            Self::Custom
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryValidationError {
    #[error("entry amount must be positive (got {0})")]
    NonPositiveAmount(Money),
    #[error("entry amount {0} has more precision than the currency allows")]
    ExcessPrecision(Money),
    #[error("select at least one participant")]
    NoParticipants,
    #[error("participant '{0}' is selected more than once")]
    DuplicateParticipant(ParticipantId),
    #[error("participant '{0}' is not on the roster")]
    UnknownParticipant(ParticipantId),
    #[error("payer '{0}' is not on the roster")]
    UnknownPayer(ParticipantId),
    #[error("share for '{0}' must not be negative")]
    NegativeShare(ParticipantId),
    #[error("share {share} for '{participant}' has more precision than the currency allows")]
    ShareExcessPrecision {
        participant: ParticipantId,
        share: Money,
    },
    #[error("missing share for selected participant '{0}'")]
    MissingShare(ParticipantId),
    #[error("share given for unselected participant '{0}'")]
    UnexpectedShare(ParticipantId),
    #[error("shares add up to {actual}, expected {expected}")]
    SharesMismatch { expected: Money, actual: Money },
    #[error("percentages add up to {total}%, expected 100%")]
    PercentagesMismatch { total: Decimal },
}

/// One expense line with its shares already resolved to currency amounts.
///
/// Shares sum to `amount` within [`MATERIALITY_THRESHOLD`]. Build entries through
/// [`crate::services::SplitResolver`] or [`Entry::try_new`]; records read back
/// from storage can be re-checked with [`Entry::validate`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    id: String,
    amount: Money,
    split: SplitStrategy,
    paid_by: ParticipantId,
    participants: Vec<ParticipantId>,
    shares: IndexMap<ParticipantId, Money>,
    #[serde(default)]
    description: String,
}

impl Entry {
    pub fn try_new(
        id: impl Into<String>,
        amount: Money,
        split: SplitStrategy,
        paid_by: ParticipantId,
        shares: IndexMap<ParticipantId, Money>,
        description: impl Into<String>,
    ) -> Result<Self, EntryValidationError> {
        let entry = Self {
            id: id.into(),
            amount,
            split,
            paid_by,
            participants: shares.keys().cloned().collect(),
            shares,
            description: description.into(),
        };
        entry.validate()?;
        Ok(entry)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn split(&self) -> SplitStrategy {
        self.split
    }

    pub fn paid_by(&self) -> &ParticipantId {
        &self.paid_by
    }

    pub fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    pub fn shares(&self) -> &IndexMap<ParticipantId, Money> {
        &self.shares
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// What `participant` consumed from this entry; zero when not in the split.
    pub fn share_of(&self, participant: &str) -> Money {
        self.shares.get(participant).copied().unwrap_or(Money::ZERO)
    }

    pub fn validate(&self) -> Result<(), EntryValidationError> {
        if !self.amount.is_positive() {
            return Err(EntryValidationError::NonPositiveAmount(self.amount));
        }
        if self.amount.exceeds_scale(CURRENCY_SCALE) {
            return Err(EntryValidationError::ExcessPrecision(self.amount));
        }
        if self.participants.is_empty() {
            return Err(EntryValidationError::NoParticipants);
        }

        let mut seen = FxHashSet::default();
        for participant in &self.participants {
            if !seen.insert(participant) {
                return Err(EntryValidationError::DuplicateParticipant(participant.clone()));
            }
            match self.shares.get(participant) {
                None => return Err(EntryValidationError::MissingShare(participant.clone())),
                Some(share) if share.is_negative() => {
                    return Err(EntryValidationError::NegativeShare(participant.clone()));
                }
                Some(&share) if share.exceeds_scale(CURRENCY_SCALE) => {
                    return Err(EntryValidationError::ShareExcessPrecision {
                        participant: participant.clone(),
                        share,
                    });
                }
                Some(_) => {}
            }
        }
        if let Some(extra) = self.shares.keys().find(|id| !seen.contains(id)) {
            return Err(EntryValidationError::UnexpectedShare(extra.clone()));
        }

        let actual: Money = self.shares.values().sum();
        if (actual - self.amount).abs() > MATERIALITY_THRESHOLD {
            return Err(EntryValidationError::SharesMismatch {
                expected: self.amount,
                actual,
            });
        }
        Ok(())
    }

    /// Net effect of this entry on each participant: the payer is credited the
    /// full amount, every share holder is debited their share.
    pub fn contributions(&self) -> Totals {
        let mut contributions = Totals::with_capacity(self.shares.len() + 1);
        contributions.insert(self.paid_by.clone(), self.amount);
        for (participant, share) in &self.shares {
            *contributions.entry(participant.clone()).or_insert(Money::ZERO) -= *share;
        }
        contributions
    }
}
