use indexmap::IndexSet;

use crate::{
    error::IgnoreReason,
    state::{
        game::{Participant, ParticipantId},
        state_machine::RoundPhase,
    },
};

/// Position of a participant in the buzz queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuzzEntry {
    /// Who buzzed.
    pub participant_id: ParticipantId,
    /// Zero-based arrival rank as observed by this client.
    pub rank: usize,
}

/// Ordered record of who signaled intent to answer during the current round.
///
/// The order is local arrival order. The head is the active responder; it is never tracked
/// separately.
#[derive(Debug, Clone, Default)]
pub struct BuzzQueue {
    entries: IndexSet<ParticipantId>,
}

impl BuzzQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to append `participant_id`, returning its rank.
    ///
    /// `participant` is the roster entry for the id, if any; `phase` is the current round
    /// sub-phase. Hosts never buzz.
    pub fn admit(
        &mut self,
        participant_id: &ParticipantId,
        participant: Option<&Participant>,
        phase: RoundPhase,
    ) -> Result<usize, IgnoreReason> {
        let Some(participant) = participant else {
            return Err(IgnoreReason::StaleParticipant(participant_id.clone()));
        };
        if participant.is_host() {
            return Err(IgnoreReason::InvalidTransition("hosts cannot buzz".into()));
        }
        if !matches!(phase, RoundPhase::AwaitingBuzz | RoundPhase::Responding) {
            return Err(IgnoreReason::InvalidTransition(format!(
                "buzzing is closed while {phase:?}"
            )));
        }
        self.push(participant_id.clone())
    }

    /// Append without policy checks; duplicates are rejected.
    fn push(&mut self, participant_id: ParticipantId) -> Result<usize, IgnoreReason> {
        let (rank, inserted) = self.entries.insert_full(participant_id);
        if inserted {
            Ok(rank)
        } else {
            Err(IgnoreReason::DuplicateEvent("participant already queued"))
        }
    }

    /// Remove a participant, keeping the order of the others.
    pub fn withdraw(&mut self, participant_id: &ParticipantId) -> bool {
        self.entries.shift_remove(participant_id)
    }

    /// Participant currently entitled to answer.
    pub fn active_responder(&self) -> Option<&ParticipantId> {
        self.entries.first()
    }

    /// Whether `participant_id` already buzzed.
    pub fn contains(&self, participant_id: &ParticipantId) -> bool {
        self.entries.contains(participant_id)
    }

    /// Entries in arrival order.
    pub fn entries(&self) -> impl Iterator<Item = BuzzEntry> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(rank, participant_id)| BuzzEntry {
                participant_id: participant_id.clone(),
                rank,
            })
    }

    /// Number of queued participants.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nobody buzzed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}
