use std::{fmt, time::SystemTime};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a room participant, as handed out by the identity layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wrap a raw identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw identifier.
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
        Self::new(value)
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Role of a participant inside the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Moderator: starts quizzes, judges answers, advances rounds.
    Host,
    /// Regular contestant.
    Player,
}

/// Room member as reported by the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Identifier shared by every client in the room.
    pub id: ParticipantId,
    /// Name shown on the scoreboard.
    pub display_name: String,
    /// Host or player.
    pub role: Role,
}

impl Participant {
    /// Build a participant with the player role.
    pub fn player(id: impl Into<ParticipantId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            role: Role::Player,
        }
    }

    /// Build a participant with the host role.
    pub fn host(id: impl Into<ParticipantId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            role: Role::Host,
        }
    }

    /// Whether this participant moderates the room.
    pub fn is_host(&self) -> bool {
        self.role == Role::Host
    }
}

/// Kind of question presented to the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizKind {
    /// Plain text prompt.
    Text,
    /// Prompt illustrated by an image.
    Image,
    /// Ad-hoc Free Mode round without authored content.
    Free,
}

/// A single quiz question. Immutable once its round has started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    /// Identifier shared by every client.
    pub id: Uuid,
    /// Question text.
    #[serde(default)]
    pub prompt: String,
    /// Canonical answer, hidden from players until revealed.
    #[serde(default)]
    pub answer: String,
    /// Content kind.
    pub kind: QuizKind,
    /// Picture shown for image quizzes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Points awarded for a correct answer; falls back to the configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
}

impl Quiz {
    /// Synthesize the ad-hoc quiz used by Free Mode, with a fresh identifier.
    pub fn free(prompt: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt: prompt.into(),
            answer: String::new(),
            kind: QuizKind::Free,
            image_url: None,
            points: None,
        }
    }
}

/// Host decision on an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The answer is accepted.
    Correct,
    /// The answer is rejected.
    Incorrect,
}

impl Verdict {
    /// Whether the verdict accepts the answer.
    pub fn is_correct(self) -> bool {
        self == Verdict::Correct
    }
}

impl From<bool> for Verdict {
    fn from(correct: bool) -> Self {
        if correct {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        }
    }
}

/// Answer text recorded for a participant during the current round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    /// Who answered.
    pub participant_id: ParticipantId,
    /// Trimmed answer text.
    pub text: String,
    /// When this client recorded the answer.
    pub submitted_at: SystemTime,
}

/// Verdict applied to a participant during the current round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgmentRecord {
    /// Judged participant.
    pub participant_id: ParticipantId,
    /// Answer text known for the participant when the judgment was processed.
    pub answer_text: Option<String>,
    /// Host decision.
    pub verdict: Verdict,
    /// When this client processed the judgment.
    pub judged_at: SystemTime,
}
