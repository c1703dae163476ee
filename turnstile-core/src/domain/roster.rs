use crate::domain::{Participant, ParticipantId};
use std::collections::HashSet;

/// Errors raised while building a roster
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RosterError {
    #[error("Roster must contain at least one participant")]
    Empty,

    #[error("Participant listed twice: {0}")]
    DuplicateParticipant(ParticipantId),
}

/// Fixed, ordered list of participants for one session
///
/// Turn order is list order and wraps around. The roster never changes after
/// construction, so an index handed out by it stays valid for the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    pub fn new<I, P>(ids: I) -> Result<Self, RosterError>
    where
        I: IntoIterator<Item = P>,
        P: Into<ParticipantId>,
    {
        let mut seen = HashSet::new();
        let mut participants = Vec::new();

        for (index, id) in ids.into_iter().enumerate() {
            let id = id.into();
            if !seen.insert(id.clone()) {
                return Err(RosterError::DuplicateParticipant(id));
            }
            participants.push(Participant::new(id, index));
        }

        if participants.is_empty() {
            return Err(RosterError::Empty);
        }

        Ok(Self { participants })
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Always false: a roster holds at least one participant
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Participant> {
        self.participants.get(index)
    }

    pub fn index_of(&self, id: &ParticipantId) -> Option<usize> {
        self.participants.iter().position(|p| p.id() == id)
    }

    /// Index following `index` in cyclic order
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.participants.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    pub fn as_slice(&self) -> &[Participant] {
        &self.participants
    }
}
