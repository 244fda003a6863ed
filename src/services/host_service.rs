use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dto::events::OutboundEvent,
    error::{ActionOutcome, IgnoreReason},
    services::outbound::emit_or_notify,
    state::{
        ClientState,
        game::{ParticipantId, Quiz, Verdict},
        rotation::NextQuiz,
        state_machine::Stage,
    },
};

/// Ask the room to start a quiz from the catalog. Local state changes on the echo.
pub fn start_quiz(client: &ClientState, quiz_id: Uuid) -> ActionOutcome {
    if let Err(reason) = ensure_host(client) {
        return ignored("start_quiz", reason);
    }
    if client.read_room(|room| room.rotation().find(quiz_id).is_none()) {
        return ignored(
            "start_quiz",
            IgnoreReason::InvalidInput(format!("quiz {quiz_id} is not in the catalog")),
        );
    }
    emitted(client, &OutboundEvent::RequestStartQuiz { quiz_id })
}

/// Ask for the quiz after the current one, or finish the rotation when none is left.
///
/// Exhaustion is applied locally and announced with `end-quiz{finished: true}` so every
/// client reaches the final scoreboard with the same score table.
pub fn next_quiz(client: &ClientState) -> ActionOutcome {
    if let Err(reason) = ensure_host(client) {
        return ignored("next_quiz", reason);
    }

    match client.read_room(|room| room.rotation().next()) {
        NextQuiz::Next(quiz) => {
            emitted(client, &OutboundEvent::RequestNextQuiz { quiz_id: quiz.id })
        }
        NextQuiz::Exhausted => {
            let exhausted =
                client.with_room_mut(|room| room.exhaust().map(|()| room.round_seq()));
            let round = match exhausted {
                Ok(round) => round,
                Err(reason) => return ignored("next_quiz", reason),
            };
            info!(round, "quiz rotation exhausted; showing final scoreboard");
            emitted(
                client,
                &OutboundEvent::EndQuiz {
                    finished: true,
                    round,
                },
            )
        }
    }
}

/// Judge the answer of `participant_id`.
///
/// Emits `apply-judgment`, then `request-reveal-answer` only if the judgment left the client.
/// The queue and the current answer are cleared locally whatever happened on the wire; the
/// score itself changes when the judgment echo arrives.
pub fn judge(
    client: &ClientState,
    participant_id: &ParticipantId,
    verdict: Verdict,
) -> ActionOutcome {
    if let Err(reason) = ensure_host(client) {
        return ignored("judge", reason);
    }
    if !client.roster().contains(participant_id) {
        return ignored("judge", IgnoreReason::StaleParticipant(participant_id.clone()));
    }

    let context = client.read_room(|room| {
        if room.stage() != Stage::Active {
            return Err(IgnoreReason::InvalidTransition(
                "nothing to judge outside an active round".into(),
            ));
        }
        Ok((room.round_seq(), room.rotation().current().cloned()))
    });
    let (round, quiz) = match context {
        Ok(context) => context,
        Err(reason) => return ignored("judge", reason),
    };

    let points_delta = client.config().points_for(verdict, quiz.as_ref());
    let judged = emit_or_notify(
        client,
        &OutboundEvent::ApplyJudgment {
            participant_id: participant_id.clone(),
            correct: verdict.is_correct(),
            points_delta,
            round,
        },
    );
    let revealed = judged && emit_or_notify(client, &OutboundEvent::RequestRevealAnswer { round });

    client.with_room_mut(|room| room.clear_after_judgment());

    if judged && revealed {
        ActionOutcome::Applied
    } else {
        ActionOutcome::EmitFailed
    }
}

/// Ask the room to reveal the canonical answer without judging.
pub fn reveal_answer(client: &ClientState) -> ActionOutcome {
    if let Err(reason) = ensure_host(client) {
        return ignored("reveal_answer", reason);
    }
    let round = client.read_room(|room| match (room.stage(), room.round().is_revealed()) {
        (Stage::Active, false) => Ok(room.round_seq()),
        (Stage::Active, true) => Err(IgnoreReason::DuplicateEvent("answer already revealed")),
        (stage, _) => Err(IgnoreReason::InvalidTransition(format!(
            "cannot reveal while {stage:?}"
        ))),
    });
    match round {
        Ok(round) => emitted(client, &OutboundEvent::RequestRevealAnswer { round }),
        Err(reason) => ignored("reveal_answer", reason),
    }
}

/// Return to the lobby locally, then tell the room.
pub fn end_quiz(client: &ClientState) -> ActionOutcome {
    if let Err(reason) = ensure_host(client) {
        return ignored("end_quiz", reason);
    }
    let ended = client.with_room_mut(|room| {
        let round = room.round_seq();
        room.end_quiz(false, Some(round)).map(|_| round)
    });
    let round = match ended {
        Ok(round) => round,
        Err(reason) => return ignored("end_quiz", reason),
    };
    info!(round, "quiz ended by host");
    emitted(
        client,
        &OutboundEvent::EndQuiz {
            finished: false,
            round,
        },
    )
}

/// Start a Free Mode round with a freshly synthesized quiz.
///
/// Applied locally first (every participant gets a score entry), then announced with the quiz so
/// all clients converge on the same id.
pub fn start_free_mode(client: &ClientState) -> ActionOutcome {
    if let Err(reason) = ensure_host(client) {
        return ignored("start_free_mode", reason);
    }
    let quiz = Quiz::free(client.config().free_mode_prompt.clone());
    let participants = client.roster().participants();

    let started = client.with_room_mut(|room| {
        room.begin_free_mode(quiz.clone(), None, &participants)
            .map(|()| room.round_seq())
    });
    let round = match started {
        Ok(round) => round,
        Err(reason) => return ignored("start_free_mode", reason),
    };

    info!(quiz_id = %quiz.id, round, "free mode started by host");
    emitted(client, &OutboundEvent::StartFreeMode { quiz, round })
}

/// Start a new Free Mode round: queue and answers reset, scores untouched.
pub fn reset_free_mode_round(client: &ClientState) -> ActionOutcome {
    if let Err(reason) = ensure_host(client) {
        return ignored("reset_free_mode_round", reason);
    }
    match client.with_room_mut(|room| room.reset_free_mode_round(None)) {
        Ok(round) => emitted(client, &OutboundEvent::ResetFreeModeRound { round }),
        Err(reason) => ignored("reset_free_mode_round", reason),
    }
}

/// Shuffle the catalog before the first quiz is requested.
pub fn shuffle_catalog(client: &ClientState) -> ActionOutcome {
    if let Err(reason) = ensure_host(client) {
        return ignored("shuffle_catalog", reason);
    }
    if client.with_room_mut(|room| room.rotation_mut().shuffle()) {
        ActionOutcome::Applied
    } else {
        ignored(
            "shuffle_catalog",
            IgnoreReason::InvalidTransition("rotation already started".into()),
        )
    }
}

fn ensure_host(client: &ClientState) -> Result<(), IgnoreReason> {
    if client.session().is_host() {
        Ok(())
    } else {
        Err(IgnoreReason::NotHost)
    }
}

fn emitted(client: &ClientState, event: &OutboundEvent) -> ActionOutcome {
    if emit_or_notify(client, event) {
        ActionOutcome::Applied
    } else {
        ActionOutcome::EmitFailed
    }
}

fn ignored(action: &str, reason: IgnoreReason) -> ActionOutcome {
    debug!(action, reason = %reason, "ignored host action");
    ActionOutcome::Ignored(reason)
}
