use std::{rc::Rc, time::SystemTime};

use tracing::{debug, info};

use crate::{
    dto::events::{InboundEvent, InboundKind},
    error::IgnoreReason,
    state::{ClientState, SharedClient, game::ParticipantId},
    transport::EventHandler,
};

/// Subscribe `client` to every inbound event kind.
///
/// Handlers hold a weak reference: dropping the last [`SharedClient`] silently turns them into
/// no-ops.
pub fn attach(client: &SharedClient) {
    for kind in InboundKind::ALL {
        let weak = Rc::downgrade(client);
        let handler: EventHandler = Rc::new(move |event: &InboundEvent| {
            if let Some(client) = weak.upgrade() {
                let _ = handle_inbound(&client, event);
            }
        });
        let id = client.channel().subscribe(kind, handler);
        client.track_subscription(kind, id);
    }
}

/// Remove every subscription registered by [`attach`]. Returns how many were removed.
pub fn detach(client: &ClientState) -> usize {
    client
        .take_subscriptions()
        .into_iter()
        .filter(|(kind, id)| client.channel().unsubscribe(*kind, *id))
        .count()
}

/// Apply one inbound event to the room state.
///
/// Ignored events leave the state untouched and are only logged at debug level.
pub fn handle_inbound(client: &ClientState, event: &InboundEvent) -> Result<(), IgnoreReason> {
    let result = match event {
        InboundEvent::QuizStarted { quiz, round } => client
            .with_room_mut(|room| room.start_quiz(quiz.clone(), *round))
            .map(|()| info!(quiz_id = %quiz.id, round = ?round, "quiz started")),
        InboundEvent::QuizEnded { finished, round } => client
            .with_room_mut(|room| room.end_quiz(*finished, *round))
            .map(|stage| info!(?stage, round = ?round, "quiz ended")),
        InboundEvent::Buzz {
            participant_id,
            round,
        } => {
            let participant = client.roster().get(participant_id);
            client
                .with_room_mut(|room| {
                    room.observe_buzz(participant_id, participant.as_ref(), *round)
                })
                .map(|rank| debug!(participant_id = %participant_id, rank, "buzz observed"))
        }
        InboundEvent::AnswerSubmitted {
            participant_id,
            text,
            round,
        } => ensure_known(client, participant_id).and_then(|()| {
            client.with_room_mut(|room| {
                room.observe_answer(participant_id, text, *round, SystemTime::now())
            })
        }),
        InboundEvent::JudgmentApplied {
            participant_id,
            correct,
            points_delta,
            round,
        } => ensure_known(client, participant_id).and_then(|()| {
            client
                .with_room_mut(|room| {
                    room.observe_judgment(
                        participant_id,
                        (*correct).into(),
                        *points_delta,
                        *round,
                        SystemTime::now(),
                    )
                })
                .map(|total| {
                    info!(participant_id = %participant_id, correct, total, "judgment applied")
                })
        }),
        InboundEvent::RevealAnswer { round } => {
            client.with_room_mut(|room| room.observe_reveal(*round))
        }
        InboundEvent::FreeModeStarted { quiz, round } => {
            let participants = client.roster().participants();
            client
                .with_room_mut(|room| room.begin_free_mode(quiz.clone(), *round, &participants))
                .map(|()| info!(quiz_id = %quiz.id, "free mode started"))
        }
        InboundEvent::FreeModeReset { round } => client
            .with_room_mut(|room| room.reset_free_mode_round(*round))
            .map(|seq| info!(round = seq, "free mode round reset")),
    };

    if let Err(reason) = &result {
        debug!(event = event.kind().name(), reason = %reason, "ignored inbound event");
    }
    result
}

fn ensure_known(client: &ClientState, participant_id: &ParticipantId) -> Result<(), IgnoreReason> {
    if client.roster().contains(participant_id) {
        Ok(())
    } else {
        Err(IgnoreReason::StaleParticipant(participant_id.clone()))
    }
}
