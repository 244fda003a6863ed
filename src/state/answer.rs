use std::time::SystemTime;

use indexmap::IndexMap;

use crate::{
    dto::validation::validate_answer_text,
    error::IgnoreReason,
    state::game::{AnswerRecord, ParticipantId},
};

/// Answer state of the current round.
///
/// `has_answered` closes the floor for everyone once an answer is known, whether it was
/// submitted locally or observed through the authoritative echo.
#[derive(Debug, Clone, Default)]
pub struct AnswerSlot {
    has_answered: bool,
    current: Option<AnswerRecord>,
    log: IndexMap<ParticipantId, AnswerRecord>,
}

impl AnswerSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an answer was submitted or observed this round.
    pub fn has_answered(&self) -> bool {
        self.has_answered
    }

    /// Answer awaiting a verdict.
    pub fn current(&self) -> Option<&AnswerRecord> {
        self.current.as_ref()
    }

    /// Latest answer recorded for `participant_id` this round.
    pub fn answer_of(&self, participant_id: &ParticipantId) -> Option<&AnswerRecord> {
        self.log.get(participant_id)
    }

    /// Lock the slot for a local submission and return the trimmed text.
    ///
    /// The lock is taken before anything is sent, so a second call in the same tick is a
    /// no-op even if the first emission has not completed.
    pub fn begin_submit(
        &mut self,
        local: &ParticipantId,
        active_responder: Option<&ParticipantId>,
        text: &str,
        max_len: usize,
        now: SystemTime,
    ) -> Result<String, IgnoreReason> {
        if self.has_answered {
            return Err(IgnoreReason::DuplicateEvent("answer already submitted"));
        }
        if active_responder != Some(local) {
            return Err(IgnoreReason::InvalidTransition(
                "only the active responder may answer".into(),
            ));
        }
        validate_answer_text(text, max_len).map_err(|err| {
            IgnoreReason::InvalidInput(
                err.message
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| err.code.to_string()),
            )
        })?;

        let text = text.trim().to_string();
        self.record(local.clone(), text.clone(), now);
        Ok(text)
    }

    /// Apply the authoritative echo of an answer, including our own.
    pub fn observe_remote(
        &mut self,
        participant_id: &ParticipantId,
        text: &str,
        now: SystemTime,
    ) -> Result<(), IgnoreReason> {
        let text = text.trim();
        let known = self
            .log
            .get(participant_id)
            .is_some_and(|record| record.text == text);
        // Also covers replays arriving after the host cleared the slot: the floor stays open.
        if known {
            return Err(IgnoreReason::DuplicateEvent("answer already recorded"));
        }

        self.record(participant_id.clone(), text.to_string(), now);
        Ok(())
    }

    fn record(&mut self, participant_id: ParticipantId, text: String, now: SystemTime) {
        let record = AnswerRecord {
            participant_id: participant_id.clone(),
            text,
            submitted_at: now,
        };
        self.has_answered = true;
        self.current = Some(record.clone());
        self.log.insert(participant_id, record);
    }

    /// Reopen the floor after a verdict, keeping the per-round answer log.
    pub fn clear_current(&mut self) {
        self.has_answered = false;
        self.current = None;
    }
}
