use std::time::SystemTime;

use tracing::debug;

use crate::{
    dto::events::OutboundEvent,
    error::{ActionOutcome, IgnoreReason},
    services::outbound::emit_or_notify,
    state::ClientState,
};

/// Buzz for the local participant.
///
/// The entry is queued optimistically before `request-buzz` is emitted. If the emission fails
/// the entry is withdrawn again so the user can retry.
pub fn request_buzz(client: &ClientState) -> ActionOutcome {
    let local = client.local_participant().id.clone();
    let participant = client.roster().get(&local);

    let admitted = client.with_room_mut(|room| {
        room.observe_buzz(&local, participant.as_ref(), None)
            .map(|_| room.round_seq())
    });
    let round = match admitted {
        Ok(round) => round,
        Err(reason) => return ignored("buzz", reason),
    };

    let event = OutboundEvent::RequestBuzz {
        participant_id: local.clone(),
        round,
    };
    if emit_or_notify(client, &event) {
        ActionOutcome::Applied
    } else {
        client.with_room_mut(|room| room.withdraw_buzz(&local));
        ActionOutcome::EmitFailed
    }
}

/// Submit an answer for the local participant, who must be the active responder.
///
/// The answer slot is locked before `submit-answer` is emitted, so a second submit in the same
/// round is a no-op even when the first emission failed.
pub fn submit_answer(client: &ClientState, text: &str) -> ActionOutcome {
    let local = client.local_participant().id.clone();
    let max_len = client.config().max_answer_len;

    let prepared = client.with_room_mut(|room| {
        room.begin_submit(&local, text, max_len, SystemTime::now())
            .map(|text| (text, room.round_seq()))
    });
    let (text, round) = match prepared {
        Ok(prepared) => prepared,
        Err(reason) => return ignored("submit", reason),
    };

    let event = OutboundEvent::SubmitAnswer {
        participant_id: local,
        text,
        round,
    };
    if emit_or_notify(client, &event) {
        ActionOutcome::Applied
    } else {
        ActionOutcome::EmitFailed
    }
}

fn ignored(action: &str, reason: IgnoreReason) -> ActionOutcome {
    debug!(action, reason = %reason, "ignored player action");
    ActionOutcome::Ignored(reason)
}
