use thiserror::Error;

use crate::state::{game::ParticipantId, state_machine::InvalidTransition};

/// Errors raised by an event channel when talking to the transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying connection is gone; nothing can be sent any more.
    #[error("event channel closed")]
    Closed,
    /// The transport refused the payload.
    #[error("send failed: {0}")]
    Send(String),
    /// An outbound event could not be serialized.
    #[error("failed to encode outbound event")]
    Encode(#[source] serde_json::Error),
    /// An inbound frame is not a known event.
    #[error("failed to decode inbound event")]
    Decode(#[source] serde_json::Error),
}

/// Errors raised while parsing the client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON for the expected shape.
    #[error("failed to parse config")]
    Parse(#[source] serde_json::Error),
    /// A value is out of its accepted range.
    #[error("invalid config: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Reasons an inbound event or a user action is dropped without effect.
///
/// None of these are fatal: the core stays in its last good state and the caller decides
/// whether the reason is worth logging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IgnoreReason {
    /// Attempted in a phase that does not allow it (usually a UI race).
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    /// The participant is not (or no longer) part of the room roster.
    #[error("stale participant `{0}`")]
    StaleParticipant(ParticipantId),
    /// The idempotency key of this event has already been observed.
    #[error("duplicate event: {0}")]
    DuplicateEvent(&'static str),
    /// The event belongs to a round that has since been superseded.
    #[error("stale round {event_round} (current round {current_round})")]
    StaleRound {
        /// Round carried by the event.
        event_round: u64,
        /// Round the client is currently in.
        current_round: u64,
    },
    /// The action is reserved to the host.
    #[error("action requires the host role")]
    NotHost,
    /// The action input failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<InvalidTransition> for IgnoreReason {
    fn from(err: InvalidTransition) -> Self {
        IgnoreReason::InvalidTransition(err.to_string())
    }
}

/// Result of a user action routed through the client core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action was applied locally and every emission succeeded.
    Applied,
    /// The action was a no-op.
    Ignored(IgnoreReason),
    /// Local effects were applied but at least one emission failed; a notice was raised.
    EmitFailed,
}

impl ActionOutcome {
    /// Whether the action had any local effect.
    pub fn is_applied(&self) -> bool {
        !matches!(self, ActionOutcome::Ignored(_))
    }
}

impl From<IgnoreReason> for ActionOutcome {
    fn from(reason: IgnoreReason) -> Self {
        ActionOutcome::Ignored(reason)
    }
}
