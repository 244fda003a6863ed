use tracing::{debug, warn};

use crate::{
    dto::events::OutboundEvent,
    state::{ClientState, NoticeLevel},
};

/// Emit `event`, turning a transport failure into a warning and a transient notice.
///
/// Returns whether the event left the client. Must not be called while the room is borrowed.
pub fn emit_or_notify(client: &ClientState, event: &OutboundEvent) -> bool {
    match client.channel().emit(event) {
        Ok(()) => {
            debug!(event = event.name(), "emitted event");
            true
        }
        Err(err) => {
            warn!(event = event.name(), error = %err, "failed to emit event");
            client.notices().raise(
                NoticeLevel::Error,
                format!("Could not send {}: {err}", event.name()),
            );
            false
        }
    }
}
