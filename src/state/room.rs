use std::time::SystemTime;

use crate::{
    error::IgnoreReason,
    state::{
        answer::AnswerSlot,
        buzz_queue::BuzzQueue,
        game::{JudgmentRecord, Participant, ParticipantId, Quiz, Verdict},
        ledger::ScoreLedger,
        rotation::QuizRotation,
        state_machine::{FinishReason, GamePhase, GameStateMachine, RoundPhase, Stage, StageEvent},
    },
};

/// Round-local state. Replaced as a whole at every round boundary.
#[derive(Debug, Clone, Default)]
pub struct RoundState {
    seq: u64,
    queue: BuzzQueue,
    answer: AnswerSlot,
    revealed: bool,
}

impl RoundState {
    fn new(seq: u64) -> Self {
        Self {
            seq,
            ..Self::default()
        }
    }

    /// Sequence number of the round; `0` before the first round of the session.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Buzz queue of the round.
    pub fn queue(&self) -> &BuzzQueue {
        &self.queue
    }

    /// Answer state of the round.
    pub fn answer(&self) -> &AnswerSlot {
        &self.answer
    }

    /// Whether the canonical answer has been revealed.
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Participant entitled to answer: always the queue head.
    pub fn active_responder(&self) -> Option<&ParticipantId> {
        self.queue.active_responder()
    }

    /// Sub-phase derived from the round fields.
    pub fn phase(&self) -> RoundPhase {
        if self.revealed {
            RoundPhase::Judged
        } else if self.answer.has_answered() {
            RoundPhase::Submitted
        } else if !self.queue.is_empty() {
            RoundPhase::Responding
        } else {
            RoundPhase::AwaitingBuzz
        }
    }
}

/// Everything the client knows about the room, mutated only by the dispatch and action
/// services.
#[derive(Debug, Clone, Default)]
pub struct RoomState {
    machine: GameStateMachine,
    rotation: QuizRotation,
    round: RoundState,
    ledger: ScoreLedger,
}

impl RoomState {
    /// Fresh room over an ordered quiz catalog.
    pub fn new(catalog: Vec<Quiz>) -> Self {
        Self {
            rotation: QuizRotation::new(catalog),
            ..Self::default()
        }
    }

    /// Top-level stage.
    pub fn stage(&self) -> Stage {
        self.machine.stage()
    }

    /// Phase exposed to presentation.
    pub fn phase(&self) -> GamePhase {
        GamePhase::from_parts(self.machine.stage(), self.round.phase())
    }

    /// Number of accepted stage transitions.
    pub fn version(&self) -> usize {
        self.machine.version()
    }

    /// Quiz rotation.
    pub fn rotation(&self) -> &QuizRotation {
        &self.rotation
    }

    pub(crate) fn rotation_mut(&mut self) -> &mut QuizRotation {
        &mut self.rotation
    }

    /// Current round.
    pub fn round(&self) -> &RoundState {
        &self.round
    }

    /// Sequence number of the current round.
    pub fn round_seq(&self) -> u64 {
        self.round.seq
    }

    /// Judgments and scores.
    pub fn ledger(&self) -> &ScoreLedger {
        &self.ledger
    }

    /// Handle `quiz-started`. A later start always supersedes the running round.
    pub fn start_quiz(&mut self, quiz: Quiz, round: Option<u64>) -> Result<(), IgnoreReason> {
        if round.is_none() && self.is_running(&quiz, false) {
            return Err(IgnoreReason::DuplicateEvent("quiz already started"));
        }
        let seq = self.next_round(round)?;
        self.machine.apply(StageEvent::QuizStarted)?;
        self.rotation.begin_quiz(quiz);
        self.reset_round(seq);
        Ok(())
    }

    /// Handle `free-mode-started` (or its optimistic local counterpart).
    ///
    /// Every participant lacking a score entry gets one at zero, including on replays.
    pub fn begin_free_mode(
        &mut self,
        quiz: Quiz,
        round: Option<u64>,
        participants: &[Participant],
    ) -> Result<(), IgnoreReason> {
        let next = if self.is_running(&quiz, true) {
            None
        } else {
            Some(self.next_round(round)?)
        };

        for participant in participants {
            self.ledger.ensure_entry(&participant.id);
        }

        let Some(seq) = next else {
            return Err(IgnoreReason::DuplicateEvent("free mode already started"));
        };
        self.machine.apply(StageEvent::FreeModeStarted)?;
        self.rotation.begin_free_mode(quiz);
        self.reset_round(seq);
        Ok(())
    }

    /// Handle `free-mode-reset`: new round, same synthetic quiz, scores untouched.
    pub fn reset_free_mode_round(&mut self, round: Option<u64>) -> Result<u64, IgnoreReason> {
        if self.machine.stage() != Stage::Active || !self.rotation.is_free_mode() {
            return Err(IgnoreReason::InvalidTransition(
                "no free mode round to reset".into(),
            ));
        }
        let seq = self.next_round(round)?;
        self.machine.apply(StageEvent::RoundReset)?;
        self.reset_round(seq);
        Ok(seq)
    }

    /// Handle `buzz` (or an optimistic local buzz), returning the arrival rank.
    pub fn observe_buzz(
        &mut self,
        participant_id: &ParticipantId,
        participant: Option<&Participant>,
        round: Option<u64>,
    ) -> Result<usize, IgnoreReason> {
        self.check_round(round)?;
        self.ensure_active("buzz")?;
        let phase = self.round.phase();
        self.round.queue.admit(participant_id, participant, phase)
    }

    /// Undo an optimistic local buzz that never left the client.
    pub fn withdraw_buzz(&mut self, participant_id: &ParticipantId) -> bool {
        self.round.queue.withdraw(participant_id)
    }

    /// Lock the answer slot for a local submission, returning the trimmed text.
    pub fn begin_submit(
        &mut self,
        local: &ParticipantId,
        text: &str,
        max_len: usize,
        now: SystemTime,
    ) -> Result<String, IgnoreReason> {
        self.ensure_active("submit")?;
        if self.round.revealed {
            return Err(IgnoreReason::InvalidTransition(
                "answer already revealed".into(),
            ));
        }
        let active = self.round.queue.active_responder().cloned();
        self.round
            .answer
            .begin_submit(local, active.as_ref(), text, max_len, now)
    }

    /// Handle `answer-submitted`, the authoritative echo of an answer.
    pub fn observe_answer(
        &mut self,
        participant_id: &ParticipantId,
        text: &str,
        round: Option<u64>,
        now: SystemTime,
    ) -> Result<(), IgnoreReason> {
        self.check_round(round)?;
        self.ensure_active("answer")?;
        if self.round.revealed {
            return Err(IgnoreReason::InvalidTransition(
                "answer arrived after reveal".into(),
            ));
        }
        self.round.answer.observe_remote(participant_id, text, now)
    }

    /// Handle `judgment-applied`, returning the participant's new total.
    ///
    /// The answer snapshot is read from the round as it is now. Judgments of an earlier round
    /// still count towards the score table once.
    pub fn observe_judgment(
        &mut self,
        participant_id: &ParticipantId,
        verdict: Verdict,
        points_delta: u32,
        round: Option<u64>,
        now: SystemTime,
    ) -> Result<u64, IgnoreReason> {
        let round_no = round.unwrap_or(self.round.seq);
        if round_no > self.round.seq {
            return Err(IgnoreReason::InvalidTransition(format!(
                "round {round_no} has not started"
            )));
        }
        let in_current_round = round_no == self.round.seq && self.stage() == Stage::Active;
        let answer_text = if in_current_round {
            self.round
                .answer
                .answer_of(participant_id)
                .map(|record| record.text.clone())
        } else {
            None
        };

        let record = JudgmentRecord {
            participant_id: participant_id.clone(),
            answer_text,
            verdict,
            judged_at: now,
        };
        self.ledger
            .observe_judgment(round_no, in_current_round, record, points_delta)
    }

    /// Mandatory local cleanup after the host judged: queue and current answer go away.
    pub fn clear_after_judgment(&mut self) {
        self.round.queue.reset();
        self.round.answer.clear_current();
    }

    /// Handle `reveal-answer`.
    pub fn observe_reveal(&mut self, round: Option<u64>) -> Result<(), IgnoreReason> {
        self.check_round(round)?;
        self.ensure_active("reveal")?;
        if self.round.revealed {
            return Err(IgnoreReason::DuplicateEvent("answer already revealed"));
        }
        self.machine.apply(StageEvent::Reveal)?;
        self.round.revealed = true;
        Ok(())
    }

    /// Handle `quiz-ended` (or a local end): back to the lobby, or to the final scoreboard
    /// when `finished` is set. Scores are kept.
    ///
    /// An end tagged with a superseded round is stale and never touches the running round.
    pub fn end_quiz(&mut self, finished: bool, round: Option<u64>) -> Result<Stage, IgnoreReason> {
        self.check_round(round)?;
        let stage = self.machine.stage();
        match (stage, finished) {
            (Stage::Lobby, false) => {
                return Err(IgnoreReason::DuplicateEvent("quiz already ended"));
            }
            (Stage::Finished, true) => {
                return Err(IgnoreReason::DuplicateEvent("rotation already finished"));
            }
            _ => {}
        }

        let event = if finished {
            StageEvent::Finish(FinishReason::Announced)
        } else {
            StageEvent::QuizEnded
        };
        let next = self.machine.apply(event)?;
        self.close_round();
        Ok(next)
    }

    /// Move to the final scoreboard because the rotation has no quiz left.
    pub fn exhaust(&mut self) -> Result<(), IgnoreReason> {
        self.machine
            .apply(StageEvent::Finish(FinishReason::RotationExhausted))?;
        self.close_round();
        Ok(())
    }

    /// Start over for a new room session: scores included.
    pub fn reset_session(&mut self) {
        self.machine = GameStateMachine::new();
        self.rotation.reset_session();
        self.round = RoundState::new(0);
        self.ledger.reset_session();
    }

    fn is_running(&self, quiz: &Quiz, free_mode: bool) -> bool {
        self.machine.stage() == Stage::Active
            && self.rotation.is_free_mode() == free_mode
            && self
                .rotation
                .current()
                .is_some_and(|current| current.id == quiz.id)
    }

    fn next_round(&self, round: Option<u64>) -> Result<u64, IgnoreReason> {
        let current = self.round.seq;
        match round {
            Some(event_round) if event_round < current => Err(IgnoreReason::StaleRound {
                event_round,
                current_round: current,
            }),
            Some(event_round) if event_round == current => {
                Err(IgnoreReason::DuplicateEvent("round already started"))
            }
            Some(event_round) => Ok(event_round),
            None => Ok(current + 1),
        }
    }

    fn check_round(&self, round: Option<u64>) -> Result<(), IgnoreReason> {
        let current = self.round.seq;
        match round {
            Some(event_round) if event_round < current => Err(IgnoreReason::StaleRound {
                event_round,
                current_round: current,
            }),
            Some(event_round) if event_round > current => Err(IgnoreReason::InvalidTransition(
                format!("round {event_round} has not started"),
            )),
            _ => Ok(()),
        }
    }

    fn ensure_active(&self, action: &str) -> Result<(), IgnoreReason> {
        match self.machine.stage() {
            Stage::Active => Ok(()),
            other => Err(IgnoreReason::InvalidTransition(format!(
                "{action} requires an active round, current stage {other:?}"
            ))),
        }
    }

    fn close_round(&mut self) {
        self.rotation.clear_current();
        self.round = RoundState::new(self.round.seq);
        self.ledger.reset_round();
    }

    fn reset_round(&mut self, seq: u64) {
        self.round = RoundState::new(seq);
        self.ledger.reset_round();
    }
}
