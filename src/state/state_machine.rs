use thiserror::Error;

/// Top-level stage of the room, changed only through [`GameStateMachine::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// No quiz is running.
    Lobby,
    /// A quiz (or a Free Mode round) is in progress.
    Active,
    /// The rotation is over; the scoreboard is shown.
    Finished,
}

/// Sub-phase of an active round, derived from the round state rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Nobody has buzzed yet.
    AwaitingBuzz,
    /// The queue head may answer.
    Responding,
    /// An answer was submitted and awaits the host verdict.
    Submitted,
    /// The canonical answer has been revealed.
    Judged,
}

/// Phase exposed to presentation: the stage, refined by the round sub-phase while active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// No quiz is running.
    Lobby,
    /// A round is in progress.
    Active(RoundPhase),
    /// Final scoreboard.
    Finished,
}

impl GamePhase {
    /// Combine a stage with the derived round sub-phase.
    pub fn from_parts(stage: Stage, round: RoundPhase) -> Self {
        match stage {
            Stage::Lobby => GamePhase::Lobby,
            Stage::Active => GamePhase::Active(round),
            Stage::Finished => GamePhase::Finished,
        }
    }
}

/// Why the rotation moved to the final scoreboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// The host asked for a next quiz and none was left.
    RotationExhausted,
    /// The server announced the end of the game.
    Announced,
}

/// Events that move the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEvent {
    /// `quiz-started`; supersedes whatever was in flight.
    QuizStarted,
    /// `free-mode-started`.
    FreeModeStarted,
    /// `free-mode-reset`: a fresh round under the same synthetic quiz.
    RoundReset,
    /// `reveal-answer`.
    Reveal,
    /// `quiz-ended` or a local end.
    QuizEnded,
    /// Switch to the final scoreboard.
    Finish(FinishReason),
}

/// Error returned when an event cannot be applied from the current stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Stage the machine was in.
    pub from: Stage,
    /// Rejected event.
    pub event: StageEvent,
}

/// State machine implementing the room flow `Lobby → Active → Finished → Lobby`.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    stage: Stage,
    version: usize,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self {
            stage: Stage::Lobby,
            version: 0,
        }
    }
}

impl GameStateMachine {
    /// Create a new state machine in the lobby.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Number of accepted transitions.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Validate and apply `event`, returning the new stage.
    pub fn apply(&mut self, event: StageEvent) -> Result<Stage, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.stage = next;
        self.version += 1;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: StageEvent) -> Result<Stage, InvalidTransition> {
        let next = match (self.stage, event) {
            (_, StageEvent::QuizStarted) => Stage::Active,
            (_, StageEvent::FreeModeStarted) => Stage::Active,
            (Stage::Active, StageEvent::RoundReset) => Stage::Active,
            (Stage::Active, StageEvent::Reveal) => Stage::Active,
            (Stage::Active | Stage::Finished, StageEvent::QuizEnded) => Stage::Lobby,
            (Stage::Lobby | Stage::Active, StageEvent::Finish(_)) => Stage::Finished,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_lobby() {
        let sm = GameStateMachine::new();
        assert_eq!(sm.stage(), Stage::Lobby);
        assert_eq!(sm.version(), 0);
    }

    #[test]
    fn full_happy_path_through_rotation() {
        let mut sm = GameStateMachine::new();

        assert_eq!(sm.apply(StageEvent::QuizStarted), Ok(Stage::Active));
        assert_eq!(sm.apply(StageEvent::Reveal), Ok(Stage::Active));
        assert_eq!(sm.apply(StageEvent::QuizStarted), Ok(Stage::Active));
        assert_eq!(
            sm.apply(StageEvent::Finish(FinishReason::RotationExhausted)),
            Ok(Stage::Finished)
        );
        assert_eq!(sm.apply(StageEvent::QuizEnded), Ok(Stage::Lobby));
        assert_eq!(sm.version(), 5);
    }

    #[test]
    fn later_quiz_start_supersedes_any_stage() {
        for event in [StageEvent::QuizStarted, StageEvent::FreeModeStarted] {
            let mut sm = GameStateMachine::new();
            assert_eq!(sm.apply(event), Ok(Stage::Active));
            sm.apply(StageEvent::Finish(FinishReason::Announced)).unwrap();
            assert_eq!(sm.apply(event), Ok(Stage::Active));
        }
    }

    #[test]
    fn round_events_require_active_stage() {
        let mut sm = GameStateMachine::new();
        for event in [
            StageEvent::Reveal,
            StageEvent::RoundReset,
            StageEvent::QuizEnded,
        ] {
            let err = sm.apply(event).unwrap_err();
            assert_eq!(err.from, Stage::Lobby);
            assert_eq!(err.event, event);
        }
        assert_eq!(sm.version(), 0);
    }

    #[test]
    fn finished_only_leaves_through_end_or_new_quiz() {
        let mut sm = GameStateMachine::new();
        sm.apply(StageEvent::QuizStarted).unwrap();
        sm.apply(StageEvent::Finish(FinishReason::RotationExhausted))
            .unwrap();

        assert!(sm.apply(StageEvent::Reveal).is_err());
        assert!(
            sm.apply(StageEvent::Finish(FinishReason::RotationExhausted))
                .is_err()
        );
        assert_eq!(sm.stage(), Stage::Finished);
        assert_eq!(sm.version(), 2);
    }

    #[test]
    fn lobby_can_jump_to_final_scoreboard() {
        let mut sm = GameStateMachine::new();
        assert_eq!(
            sm.apply(StageEvent::Finish(FinishReason::RotationExhausted)),
            Ok(Stage::Finished)
        );
    }

    #[test]
    fn phase_combines_stage_and_round() {
        assert_eq!(
            GamePhase::from_parts(Stage::Active, RoundPhase::Submitted),
            GamePhase::Active(RoundPhase::Submitted)
        );
        assert_eq!(
            GamePhase::from_parts(Stage::Lobby, RoundPhase::Judged),
            GamePhase::Lobby
        );
    }
}
