use std::cell::{Cell, RefCell};

use tracing::debug;

use crate::{
    dto::events::{InboundEvent, InboundKind, OutboundEvent},
    error::TransportError,
    transport::{EventChannel, EventHandler, SubscriberRegistry, SubscriptionId},
};

/// In-memory channel: records emissions and lets the caller inject inbound events.
///
/// Emission can be forced to fail to exercise the notice path.
#[derive(Default)]
pub struct LocalChannel {
    registry: SubscriberRegistry,
    emitted: RefCell<Vec<OutboundEvent>>,
    failing: Cell<bool>,
}

impl LocalChannel {
    /// Create a channel with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an inbound event to the subscribers of its kind.
    pub fn deliver(&self, event: &InboundEvent) -> usize {
        self.registry.deliver(event)
    }

    /// Decode and deliver a raw JSON frame.
    pub fn deliver_json(&self, frame: &str) -> Result<usize, TransportError> {
        let event = InboundEvent::from_json_str(frame)?;
        Ok(self.deliver(&event))
    }

    /// Every successful emission so far.
    pub fn emitted(&self) -> Vec<OutboundEvent> {
        self.emitted.borrow().clone()
    }

    /// Drain the recorded emissions.
    pub fn take_emitted(&self) -> Vec<OutboundEvent> {
        self.emitted.take()
    }

    /// Make every following emission fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    /// Number of subscribers for `kind`.
    pub fn subscriber_count(&self, kind: InboundKind) -> usize {
        self.registry.count(kind)
    }
}

impl EventChannel for LocalChannel {
    fn subscribe(&self, kind: InboundKind, handler: EventHandler) -> SubscriptionId {
        self.registry.insert(kind, handler)
    }

    fn unsubscribe(&self, kind: InboundKind, id: SubscriptionId) -> bool {
        self.registry.remove(kind, id)
    }

    fn emit(&self, event: &OutboundEvent) -> Result<(), TransportError> {
        if self.failing.get() {
            return Err(TransportError::Send("local channel set to fail".into()));
        }
        debug!(event = event.name(), "local emit");
        self.emitted.borrow_mut().push(event.clone());
        Ok(())
    }
}
