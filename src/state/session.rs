use std::{sync::Arc, time::SystemTime};

use dashmap::DashMap;
use uuid::Uuid;

use crate::state::game::{Participant, ParticipantId};

/// Identity of the local client for the lifetime of one client session.
///
/// Created once when the client joins and dropped (or replaced) on logout; there is no
/// process-wide identity cache.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    participant: Participant,
    started_at: SystemTime,
}

impl Session {
    /// Open a session for the local participant.
    pub fn new(participant: Participant) -> Self {
        Self {
            id: Uuid::new_v4(),
            participant,
            started_at: SystemTime::now(),
        }
    }

    /// Unique identifier of this session.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Local participant.
    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    /// When the session was opened.
    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    /// Whether the local participant moderates the room.
    pub fn is_host(&self) -> bool {
        self.participant.is_host()
    }
}

/// Read-only view of the room members, maintained outside the core.
pub trait Roster: Send + Sync {
    /// Look up a participant.
    fn get(&self, id: &ParticipantId) -> Option<Participant>;

    /// Every current participant, ordered by id.
    fn participants(&self) -> Vec<Participant>;

    /// Whether `id` is currently in the room.
    fn contains(&self, id: &ParticipantId) -> bool {
        self.get(id).is_some()
    }
}

/// Roster backed by a concurrent map so the connection layer can update it from any thread.
#[derive(Debug, Clone, Default)]
pub struct SharedRoster {
    members: Arc<DashMap<ParticipantId, Participant>>,
}

impl SharedRoster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a roster holding `participants`.
    pub fn from_participants(participants: impl IntoIterator<Item = Participant>) -> Self {
        let roster = Self::new();
        for participant in participants {
            roster.upsert(participant);
        }
        roster
    }

    /// Add or replace a participant.
    pub fn upsert(&self, participant: Participant) {
        self.members.insert(participant.id.clone(), participant);
    }

    /// Remove a departed participant.
    pub fn remove(&self, id: &ParticipantId) -> Option<Participant> {
        self.members.remove(id).map(|(_, participant)| participant)
    }

    /// Number of participants.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the room is empty.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Roster for SharedRoster {
    fn get(&self, id: &ParticipantId) -> Option<Participant> {
        self.members.get(id).map(|entry| entry.value().clone())
    }

    fn participants(&self) -> Vec<Participant> {
        let mut participants: Vec<_> = self
            .members
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        participants.sort_by(|a, b| a.id.cmp(&b.id));
        participants
    }
}
