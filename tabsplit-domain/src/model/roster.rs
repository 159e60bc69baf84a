use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, fmt};
use thiserror::Error;

/// Stable short code identifying a participant.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for ParticipantId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Display metadata is cosmetic; only `id` takes part in the arithmetic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Participant {
    pub fn new(id: impl Into<ParticipantId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar: None,
            color: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("participant '{0}' is listed more than once")]
    DuplicateParticipant(ParticipantId),
    #[error("participant code must not be empty")]
    EmptyParticipantId,
}

/// Ordered participant universe injected into aggregation and settlement.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Roster {
    participants: IndexMap<ParticipantId, Participant>,
}

impl Roster {
    pub fn new<I>(participants: I) -> Result<Self, RosterError>
    where
        I: IntoIterator<Item = Participant>,
    {
        let mut map = IndexMap::new();
        for participant in participants {
            if participant.id.as_str().is_empty() {
                return Err(RosterError::EmptyParticipantId);
            }
            if map.contains_key(&participant.id) {
                return Err(RosterError::DuplicateParticipant(participant.id));
            }
            map.insert(participant.id.clone(), participant);
        }
        Ok(Self { participants: map })
    }

    /// Roster whose display names are the codes themselves.
    pub fn from_ids<I, T>(ids: I) -> Result<Self, RosterError>
    where
        I: IntoIterator<Item = T>,
        T: Into<ParticipantId>,
    {
        Self::new(ids.into_iter().map(|id| {
            let id = id.into();
            let name = id.as_str().to_owned();
            Participant::new(id, name)
        }))
    }

    pub fn ids(&self) -> impl Iterator<Item = &ParticipantId> + '_ {
        self.participants.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> + '_ {
        self.participants.values()
    }

    pub fn get(&self, id: &str) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.participants.contains_key(id)
    }

    pub fn display_name(&self, id: &str) -> Option<&str> {
        self.get(id).map(|participant| participant.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
