//! Event channel abstraction between the client core and the room transport.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

use crate::{
    dto::events::{InboundEvent, InboundKind, OutboundEvent},
    error::TransportError,
};

pub mod local;
pub mod mpsc;

pub use self::{local::LocalChannel, mpsc::MpscChannel};

/// Callback invoked for every delivered inbound event of the subscribed kind.
pub type EventHandler = Rc<dyn Fn(&InboundEvent)>;

/// Handle returned by [`EventChannel::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Named-event pub/sub transport used by the client core.
///
/// Implementations may deliver inbound events synchronously from inside [`emit`]; handlers
/// must therefore never be invoked while the caller holds a borrow on shared state.
///
/// [`emit`]: EventChannel::emit
pub trait EventChannel {
    /// Register `handler` for every inbound event of `kind`.
    fn subscribe(&self, kind: InboundKind, handler: EventHandler) -> SubscriptionId;

    /// Remove a subscription. Returns whether it existed.
    fn unsubscribe(&self, kind: InboundKind, id: SubscriptionId) -> bool;

    /// Send one outbound event.
    fn emit(&self, event: &OutboundEvent) -> Result<(), TransportError>;
}

/// Handler table shared by the channel implementations.
#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: Cell<u64>,
    handlers: RefCell<HashMap<InboundKind, Vec<(SubscriptionId, EventHandler)>>>,
}

impl SubscriberRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler and return its id.
    pub fn insert(&self, kind: InboundKind, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push((id, handler));
        id
    }

    /// Remove a handler.
    pub fn remove(&self, kind: InboundKind, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let Some(list) = handlers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        before != list.len()
    }

    /// Number of handlers registered for `kind`.
    pub fn count(&self, kind: InboundKind) -> usize {
        self.handlers.borrow().get(&kind).map_or(0, Vec::len)
    }

    /// Invoke every handler for the event's kind, returning how many ran.
    ///
    /// The table is not borrowed while handlers run, so they may subscribe or unsubscribe.
    pub fn deliver(&self, event: &InboundEvent) -> usize {
        let targets: Vec<EventHandler> = self
            .handlers
            .borrow()
            .get(&event.kind())
            .map(|list| list.iter().map(|(_, handler)| handler.clone()).collect())
            .unwrap_or_default();

        for handler in &targets {
            handler(event);
        }
        targets.len()
    }
}
