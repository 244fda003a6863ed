use serde::Serialize;
use uuid::Uuid;

use crate::{
    config::ClientConfig,
    dto::format_system_time,
    state::{
        game::{ParticipantId, Quiz, QuizKind, Verdict},
        room::RoomState,
        session::{Roster, Session},
        state_machine::{GamePhase, RoundPhase},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
/// Flattened phase shown to presentation.
pub enum VisibleGamePhase {
    /// No quiz running.
    Lobby,
    /// Quiz running, nobody buzzed yet.
    AwaitingBuzz,
    /// Someone buzzed and may answer.
    Responding,
    /// An answer is waiting for judgment.
    Submitted,
    /// The canonical answer was revealed.
    Judged,
    /// Final scoreboard.
    Finished,
}

impl From<GamePhase> for VisibleGamePhase {
    fn from(phase: GamePhase) -> Self {
        match phase {
            GamePhase::Lobby => VisibleGamePhase::Lobby,
            GamePhase::Active(RoundPhase::AwaitingBuzz) => VisibleGamePhase::AwaitingBuzz,
            GamePhase::Active(RoundPhase::Responding) => VisibleGamePhase::Responding,
            GamePhase::Active(RoundPhase::Submitted) => VisibleGamePhase::Submitted,
            GamePhase::Active(RoundPhase::Judged) => VisibleGamePhase::Judged,
            GamePhase::Finished => VisibleGamePhase::Finished,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Quiz as shown to the local participant.
pub struct QuizSnapshot {
    /// Quiz identifier.
    pub id: Uuid,
    /// Question shown to everyone.
    pub prompt: String,
    /// Question format.
    pub kind: QuizKind,
    /// Optional illustration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Points for a correct answer when the quiz overrides the default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
    /// Canonical answer, present once revealed (or for the host when configured).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl QuizSnapshot {
    fn from_quiz(quiz: &Quiz, show_answer: bool) -> Self {
        Self {
            id: quiz.id,
            prompt: quiz.prompt.clone(),
            kind: quiz.kind,
            image_url: quiz.image_url.clone(),
            points: quiz.points,
            answer: show_answer.then(|| quiz.answer.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One queued buzz.
pub struct BuzzEntrySnapshot {
    /// Who buzzed.
    pub participant_id: ParticipantId,
    /// Name from the roster.
    pub display_name: String,
    /// Zero-based arrival rank; 0 is the active responder.
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Answer awaiting judgment.
pub struct AnswerSnapshot {
    /// Author.
    pub participant_id: ParticipantId,
    /// Trimmed answer text.
    pub text: String,
    /// RFC 3339 timestamp.
    pub submitted_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Judgment of the current round.
pub struct JudgmentSnapshot {
    /// Judged participant.
    pub participant_id: ParticipantId,
    /// Answer that was judged, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
    /// Host decision.
    pub verdict: Verdict,
    /// RFC 3339 timestamp.
    pub judged_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Scoreboard line.
pub struct ScoreSnapshot {
    /// Participant.
    pub participant_id: ParticipantId,
    /// Name from the roster, or the id when unknown.
    pub display_name: String,
    /// Cumulative score.
    pub score: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Read-only view of the room published after every dispatch and action.
pub struct GameSnapshot {
    /// Phase for presentation.
    pub phase: VisibleGamePhase,
    /// State machine version.
    pub version: usize,
    /// Current round number, 0 before the first round.
    pub round: u64,
    /// Whether the running quiz is a Free Mode round.
    pub free_mode: bool,
    /// Participant this client acts for.
    pub local_participant: ParticipantId,
    /// Whether the local participant is the host.
    pub is_host: bool,
    /// Running quiz, if any.
    pub quiz: Option<QuizSnapshot>,
    /// Buzz queue in arrival order.
    pub queue: Vec<BuzzEntrySnapshot>,
    /// Head of the queue.
    pub active_responder: Option<ParticipantId>,
    /// Whether the local participant already answered this round.
    pub has_answered: bool,
    /// Answer awaiting judgment.
    pub current_answer: Option<AnswerSnapshot>,
    /// Judgments of the current round.
    pub judgments: Vec<JudgmentSnapshot>,
    /// Score table in order of first appearance.
    pub scores: Vec<ScoreSnapshot>,
}

impl GameSnapshot {
    /// Project the room state for the local participant.
    pub fn build(
        room: &RoomState,
        session: &Session,
        roster: &dyn Roster,
        config: &ClientConfig,
    ) -> Self {
        let round = room.round();
        let is_host = session.is_host();
        let show_answer =
            round.is_revealed() || (is_host && config.snapshot_reveals_answer_to_host);
        let display_name = |id: &ParticipantId| {
            roster
                .get(id)
                .map(|participant| participant.display_name)
                .unwrap_or_else(|| id.to_string())
        };

        Self {
            phase: room.phase().into(),
            version: room.version(),
            round: round.seq(),
            free_mode: room.rotation().is_free_mode(),
            local_participant: session.participant().id.clone(),
            is_host,
            quiz: room
                .rotation()
                .current()
                .map(|quiz| QuizSnapshot::from_quiz(quiz, show_answer)),
            queue: round
                .queue()
                .entries()
                .map(|entry| BuzzEntrySnapshot {
                    display_name: display_name(&entry.participant_id),
                    participant_id: entry.participant_id,
                    rank: entry.rank,
                })
                .collect(),
            active_responder: round.active_responder().cloned(),
            has_answered: round.answer().has_answered(),
            current_answer: round.answer().current().map(|record| AnswerSnapshot {
                participant_id: record.participant_id.clone(),
                text: record.text.clone(),
                submitted_at: format_system_time(record.submitted_at),
            }),
            judgments: room
                .ledger()
                .judgments()
                .values()
                .map(|record| JudgmentSnapshot {
                    participant_id: record.participant_id.clone(),
                    answer_text: record.answer_text.clone(),
                    verdict: record.verdict,
                    judged_at: format_system_time(record.judged_at),
                })
                .collect(),
            scores: room
                .ledger()
                .scores()
                .iter()
                .map(|(id, score)| ScoreSnapshot {
                    participant_id: id.clone(),
                    display_name: display_name(id),
                    score: *score,
                })
                .collect(),
        }
    }
}
