//! Wire events exchanged with the room transport.
//!
//! Every frame is a JSON object internally tagged by `"type"`, with kebab-case event names and
//! snake_case fields. The optional `round` field lets the core drop events from superseded
//! rounds; events without it apply to the current round.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::TransportError,
    state::game::{ParticipantId, Quiz},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Events broadcast by the room transport and observed by every client.
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InboundEvent {
    /// A new quiz round began.
    QuizStarted {
        quiz: Quiz,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        round: Option<u64>,
    },
    /// The running quiz ended; `finished` moves to the final scoreboard instead of the lobby.
    QuizEnded {
        #[serde(default)]
        finished: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        round: Option<u64>,
    },
    /// A participant buzzed.
    Buzz {
        participant_id: ParticipantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        round: Option<u64>,
    },
    /// A participant's answer, echoed to everyone including its author.
    AnswerSubmitted {
        participant_id: ParticipantId,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        round: Option<u64>,
    },
    /// The host judged an answer.
    JudgmentApplied {
        participant_id: ParticipantId,
        correct: bool,
        points_delta: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        round: Option<u64>,
    },
    /// The canonical answer may be shown.
    RevealAnswer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        round: Option<u64>,
    },
    /// A Free Mode round began with the given synthetic quiz.
    FreeModeStarted {
        quiz: Quiz,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        round: Option<u64>,
    },
    /// A new Free Mode round began; scores are untouched.
    FreeModeReset {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        round: Option<u64>,
    },
}

/// Discriminant of [`InboundEvent`], used as subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundKind {
    /// `quiz-started`.
    QuizStarted,
    /// `quiz-ended`.
    QuizEnded,
    /// `buzz`.
    Buzz,
    /// `answer-submitted`.
    AnswerSubmitted,
    /// `judgment-applied`.
    JudgmentApplied,
    /// `reveal-answer`.
    RevealAnswer,
    /// `free-mode-started`.
    FreeModeStarted,
    /// `free-mode-reset`.
    FreeModeReset,
}

impl InboundKind {
    /// Every inbound kind, in wire documentation order.
    pub const ALL: [InboundKind; 8] = [
        InboundKind::QuizStarted,
        InboundKind::QuizEnded,
        InboundKind::Buzz,
        InboundKind::AnswerSubmitted,
        InboundKind::JudgmentApplied,
        InboundKind::RevealAnswer,
        InboundKind::FreeModeStarted,
        InboundKind::FreeModeReset,
    ];

    /// Wire name of the event.
    pub fn name(self) -> &'static str {
        match self {
            InboundKind::QuizStarted => "quiz-started",
            InboundKind::QuizEnded => "quiz-ended",
            InboundKind::Buzz => "buzz",
            InboundKind::AnswerSubmitted => "answer-submitted",
            InboundKind::JudgmentApplied => "judgment-applied",
            InboundKind::RevealAnswer => "reveal-answer",
            InboundKind::FreeModeStarted => "free-mode-started",
            InboundKind::FreeModeReset => "free-mode-reset",
        }
    }
}

impl InboundEvent {
    /// Decode a raw JSON frame.
    pub fn from_json_str(frame: &str) -> Result<Self, TransportError> {
        serde_json::from_str(frame).map_err(TransportError::Decode)
    }

    /// Encode as a JSON frame, as the transport would deliver it.
    pub fn to_json_string(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(TransportError::Encode)
    }

    /// Subscription key of the event.
    pub fn kind(&self) -> InboundKind {
        match self {
            InboundEvent::QuizStarted { .. } => InboundKind::QuizStarted,
            InboundEvent::QuizEnded { .. } => InboundKind::QuizEnded,
            InboundEvent::Buzz { .. } => InboundKind::Buzz,
            InboundEvent::AnswerSubmitted { .. } => InboundKind::AnswerSubmitted,
            InboundEvent::JudgmentApplied { .. } => InboundKind::JudgmentApplied,
            InboundEvent::RevealAnswer { .. } => InboundKind::RevealAnswer,
            InboundEvent::FreeModeStarted { .. } => InboundKind::FreeModeStarted,
            InboundEvent::FreeModeReset { .. } => InboundKind::FreeModeReset,
        }
    }

    /// Round tag carried by the event, if any.
    pub fn round(&self) -> Option<u64> {
        match self {
            InboundEvent::QuizStarted { round, .. }
            | InboundEvent::Buzz { round, .. }
            | InboundEvent::AnswerSubmitted { round, .. }
            | InboundEvent::JudgmentApplied { round, .. }
            | InboundEvent::RevealAnswer { round }
            | InboundEvent::FreeModeStarted { round, .. }
            | InboundEvent::FreeModeReset { round }
            | InboundEvent::QuizEnded { round, .. } => *round,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Requests emitted by this client, one per user action.
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutboundEvent {
    /// Local player buzzes.
    RequestBuzz {
        participant_id: ParticipantId,
        round: u64,
    },
    /// Local player answers.
    SubmitAnswer {
        participant_id: ParticipantId,
        text: String,
        round: u64,
    },
    /// Host starts a catalog quiz.
    RequestStartQuiz { quiz_id: Uuid },
    /// Host advances to the next catalog quiz.
    RequestNextQuiz { quiz_id: Uuid },
    /// Host judges an answer.
    ApplyJudgment {
        participant_id: ParticipantId,
        correct: bool,
        points_delta: u32,
        round: u64,
    },
    /// Host reveals the canonical answer.
    RequestRevealAnswer { round: u64 },
    /// Host ends the quiz; `finished` when the rotation is exhausted.
    EndQuiz {
        #[serde(default)]
        finished: bool,
        round: u64,
    },
    /// Host starts Free Mode with a synthetic quiz.
    StartFreeMode { quiz: Quiz, round: u64 },
    /// Host starts a new Free Mode round.
    ResetFreeModeRound { round: u64 },
}

impl OutboundEvent {
    /// Encode as a JSON frame.
    pub fn to_json_string(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(TransportError::Encode)
    }

    /// Wire name of the event, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::RequestBuzz { .. } => "request-buzz",
            OutboundEvent::SubmitAnswer { .. } => "submit-answer",
            OutboundEvent::RequestStartQuiz { .. } => "request-start-quiz",
            OutboundEvent::RequestNextQuiz { .. } => "request-next-quiz",
            OutboundEvent::ApplyJudgment { .. } => "apply-judgment",
            OutboundEvent::RequestRevealAnswer { .. } => "request-reveal-answer",
            OutboundEvent::EndQuiz { .. } => "end-quiz",
            OutboundEvent::StartFreeMode { .. } => "start-free-mode",
            OutboundEvent::ResetFreeModeRound { .. } => "reset-free-mode-round",
        }
    }
}
