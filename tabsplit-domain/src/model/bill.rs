use crate::model::{
    CURRENCY_SCALE, Entry, EntryValidationError, Money, ParticipantId, Roster, Totals,
};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, de};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillError {
    #[error("bill is missing required field '{0}'")]
    MissingField(&'static str),
    #[error("bill has no entries")]
    NoEntries,
    #[error("entry '{0}' already exists in this bill")]
    DuplicateEntry(String),
    #[error("entry '{0}' does not exist in this bill")]
    UnknownEntry(String),
    #[error("entry '{id}' is invalid")]
    InvalidEntry {
        id: String,
        #[source]
        source: EntryValidationError,
    },
}

fn default_name() -> String {
    "Unnamed Bill".to_owned()
}

fn default_category() -> String {
    "other".to_owned()
}

/// A named, dated collection of entries.
///
/// `totals` tracks the live net contribution of every participant and is
/// updated by each entry operation. `final_totals` is the snapshot taken when
/// the bill was last finalized; once present it is what cross-bill aggregation
/// reads, even if entries have changed since.
///
/// Older records load as well: a missing name becomes "Unnamed Bill", dates may
/// carry a time of day, and quick-split records without entries keep their
/// stored `totalAmount`. Stored totals with sub-cent digits are rejected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    id: String,
    #[serde(default = "default_name")]
    name: String,
    #[serde(deserialize_with = "record_date")]
    date: NaiveDate,
    #[serde(default = "default_category")]
    category: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    entries: Vec<Entry>,
    #[serde(default, deserialize_with = "cent_totals")]
    totals: Totals,
    #[serde(
        default,
        deserialize_with = "cent_final_totals",
        skip_serializing_if = "Option::is_none"
    )]
    final_totals: Option<Totals>,
    #[serde(
        default,
        rename = "totalAmount",
        skip_serializing_if = "Option::is_none"
    )]
    recorded_total: Option<Money>,
}

impl Bill {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        date: NaiveDate,
        roster: &Roster,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            date,
            category: default_category(),
            description: String::new(),
            entries: Vec::new(),
            totals: zeroed_totals(roster.ids()),
            final_totals: None,
            recorded_total: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn final_totals(&self) -> Option<&Totals> {
        self.final_totals.as_ref()
    }

    pub fn is_finalized(&self) -> bool {
        self.final_totals.is_some()
    }

    /// The frozen snapshot when present, otherwise the live totals.
    /// `None` when the bill carries no totals at all.
    pub fn effective_totals(&self) -> Option<&Totals> {
        match &self.final_totals {
            Some(frozen) => Some(frozen),
            None if self.totals.is_empty() => None,
            None => Some(&self.totals),
        }
    }

    /// Sum of entry amounts; entry-less records fall back to their stored total.
    pub fn total_amount(&self) -> Money {
        if self.entries.is_empty() {
            return self.recorded_total.unwrap_or(Money::ZERO);
        }
        self.entries.iter().map(Entry::amount).sum()
    }

    /// Participants in order of first appearance across entries, payers included.
    pub fn participants(&self) -> Vec<&ParticipantId> {
        let mut seen: Vec<&ParticipantId> = Vec::new();
        for entry in &self.entries {
            for id in std::iter::once(entry.paid_by()).chain(entry.participants()) {
                if !seen.contains(&id) {
                    seen.push(id);
                }
            }
        }
        seen
    }

    pub fn add_entry(&mut self, entry: Entry) -> Result<(), BillError> {
        if self.entry(entry.id()).is_some() {
            return Err(BillError::DuplicateEntry(entry.id().to_owned()));
        }
        apply_contributions(&mut self.totals, &entry, Direction::Add);
        self.entries.push(entry);
        Ok(())
    }

    /// Swaps in an edited entry with the same id and returns the previous one.
    pub fn replace_entry(&mut self, entry: Entry) -> Result<Entry, BillError> {
        let slot = self
            .entries
            .iter_mut()
            .find(|existing| existing.id() == entry.id())
            .ok_or_else(|| BillError::UnknownEntry(entry.id().to_owned()))?;

        apply_contributions(&mut self.totals, slot, Direction::Remove);
        apply_contributions(&mut self.totals, &entry, Direction::Add);
        Ok(std::mem::replace(slot, entry))
    }

    pub fn remove_entry(&mut self, id: &str) -> Result<Entry, BillError> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id() == id)
            .ok_or_else(|| BillError::UnknownEntry(id.to_owned()))?;

        let removed = self.entries.remove(index);
        apply_contributions(&mut self.totals, &removed, Direction::Remove);
        Ok(removed)
    }

    pub fn clear_entries(&mut self) {
        self.entries.clear();
        for total in self.totals.values_mut() {
            *total = Money::ZERO;
        }
    }

    /// Rebuilds live totals from the entries, keeping every known participant.
    pub fn recalculate_totals(&mut self) {
        let mut totals = zeroed_totals(self.totals.keys());
        for entry in &self.entries {
            apply_contributions(&mut totals, entry, Direction::Add);
        }
        self.totals = totals;
    }

    /// Freezes the current live totals, replacing any earlier snapshot.
    pub fn finalize(&mut self) -> &Totals {
        self.final_totals.insert(self.totals.clone())
    }

    /// Freezes live totals only when no snapshot exists yet. Returns whether a
    /// snapshot was taken.
    pub fn finalize_if_unfrozen(&mut self) -> bool {
        if self.final_totals.is_some() {
            return false;
        }
        self.final_totals = Some(self.totals.clone());
        true
    }

    /// Copy of this bill under a new id, with the frozen snapshot dropped.
    pub fn duplicate(&self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            final_totals: None,
            ..self.clone()
        }
    }

    /// Pre-save check run by the storage layer. A frozen bill without entries
    /// (a quick split) is accepted.
    pub fn validate(&self) -> Result<(), BillError> {
        if self.id.trim().is_empty() {
            return Err(BillError::MissingField("id"));
        }
        if self.name.trim().is_empty() {
            return Err(BillError::MissingField("name"));
        }
        if self.entries.is_empty() && self.final_totals.is_none() {
            return Err(BillError::NoEntries);
        }
        for entry in &self.entries {
            entry.validate().map_err(|source| BillError::InvalidEntry {
                id: entry.id().to_owned(),
                source,
            })?;
        }
        Ok(())
    }
}

fn record_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(&raw)
                .ok()
                .map(|stamp| stamp.date_naive())
        })
        .ok_or_else(|| de::Error::custom(format!("'{raw}' is not a date")))
}

fn cent_totals<'de, D>(deserializer: D) -> Result<Totals, D::Error>
where
    D: Deserializer<'de>,
{
    let totals = Totals::deserialize(deserializer)?;
    check_cent_precision(&totals).map_err(de::Error::custom)?;
    Ok(totals)
}

fn cent_final_totals<'de, D>(deserializer: D) -> Result<Option<Totals>, D::Error>
where
    D: Deserializer<'de>,
{
    let totals = Option::<Totals>::deserialize(deserializer)?;
    if let Some(totals) = &totals {
        check_cent_precision(totals).map_err(de::Error::custom)?;
    }
    Ok(totals)
}

fn check_cent_precision(totals: &Totals) -> Result<(), String> {
    match totals
        .iter()
        .find(|(_, total)| total.exceeds_scale(CURRENCY_SCALE))
    {
        Some((id, total)) => Err(format!(
            "total {total} for '{id}' has more precision than the currency allows"
        )),
        None => Ok(()),
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Add,
    Remove,
}

fn zeroed_totals<'a, I>(ids: I) -> Totals
where
    I: IntoIterator<Item = &'a ParticipantId>,
{
    ids.into_iter().map(|id| (id.clone(), Money::ZERO)).collect()
}

fn apply_contributions(totals: &mut Totals, entry: &Entry, direction: Direction) {
    for (participant, contribution) in entry.contributions() {
        let slot = totals.entry(participant).or_insert(Money::ZERO);
        match direction {
            Direction::Add => *slot += contribution,
            Direction::Remove => *slot -= contribution,
        }
    }
}
