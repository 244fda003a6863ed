use std::collections::HashSet;

use indexmap::IndexMap;

use crate::{
    error::IgnoreReason,
    state::game::{JudgmentRecord, ParticipantId},
};

/// Idempotency key of a judgment: one score application per participant per round.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JudgmentKey {
    /// Round the judgment belongs to.
    pub round: u64,
    /// Judged participant.
    pub participant_id: ParticipantId,
}

/// Per-round judgments plus the session-wide score table.
///
/// Scores are only ever incremented, once per [`JudgmentKey`].
///
/// Applied keys outlive their round: a judgment replayed any number of rounds later is still
/// recognized. The set holds at most one key per judged participant per round and is only
/// emptied by [`ScoreLedger::reset_session`].
#[derive(Debug, Clone, Default)]
pub struct ScoreLedger {
    scores: IndexMap<ParticipantId, u64>,
    /// Keys already applied this session.
    applied: HashSet<JudgmentKey>,
    judgments: IndexMap<ParticipantId, JudgmentRecord>,
}

impl ScoreLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cumulative score of a participant, if they have an entry.
    pub fn score(&self, participant_id: &ParticipantId) -> Option<u64> {
        self.scores.get(participant_id).copied()
    }

    /// Score table in order of first appearance.
    pub fn scores(&self) -> &IndexMap<ParticipantId, u64> {
        &self.scores
    }

    /// Judgments of the current round, latest per participant.
    pub fn judgments(&self) -> &IndexMap<ParticipantId, JudgmentRecord> {
        &self.judgments
    }

    /// Create a zero entry when missing. Returns whether an entry was created.
    pub fn ensure_entry(&mut self, participant_id: &ParticipantId) -> bool {
        if self.scores.contains_key(participant_id) {
            return false;
        }
        self.scores.insert(participant_id.clone(), 0);
        true
    }

    /// Apply an observed judgment and return the participant's new total.
    ///
    /// When `in_current_round` is set the record replaces any earlier one for the participant,
    /// even for a replay. The score delta is applied once per key; a replay yields
    /// [`IgnoreReason::DuplicateEvent`].
    pub fn observe_judgment(
        &mut self,
        round: u64,
        in_current_round: bool,
        record: JudgmentRecord,
        points_delta: u32,
    ) -> Result<u64, IgnoreReason> {
        let key = JudgmentKey {
            round,
            participant_id: record.participant_id.clone(),
        };
        let participant_id = record.participant_id.clone();

        if in_current_round {
            self.judgments.insert(participant_id.clone(), record);
        }

        if !self.applied.insert(key) {
            return Err(IgnoreReason::DuplicateEvent("judgment already applied"));
        }

        let total = self.scores.entry(participant_id).or_insert(0);
        *total = total.saturating_add(u64::from(points_delta));
        Ok(*total)
    }

    /// Forget the round-local judgments; scores and applied keys survive.
    pub fn reset_round(&mut self) {
        self.judgments.clear();
    }

    /// Start over for a new room session.
    pub fn reset_session(&mut self) {
        self.scores.clear();
        self.applied.clear();
        self.judgments.clear();
    }
}
