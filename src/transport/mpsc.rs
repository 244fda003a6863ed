use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::{
    dto::events::{InboundEvent, InboundKind, OutboundEvent},
    error::TransportError,
    transport::{EventChannel, EventHandler, SubscriberRegistry, SubscriptionId},
};

/// Channel bridging serialized JSON frames over Tokio unbounded queues.
///
/// Outbound events are encoded and pushed to `outbound`; inbound frames are fed through
/// [`pump`] or [`MpscChannel::dispatch_frame`].
pub struct MpscChannel {
    registry: SubscriberRegistry,
    outbound: UnboundedSender<String>,
}

impl MpscChannel {
    /// Wrap the sending half of the connection writer.
    pub fn new(outbound: UnboundedSender<String>) -> Self {
        Self {
            registry: SubscriberRegistry::new(),
            outbound,
        }
    }

    /// Decode one inbound frame and hand it to the subscribers of its kind.
    pub fn dispatch_frame(&self, frame: &str) -> Result<usize, TransportError> {
        let event = InboundEvent::from_json_str(frame)?;
        debug!(event = event.kind().name(), "inbound frame");
        Ok(self.registry.deliver(&event))
    }
}

impl EventChannel for MpscChannel {
    fn subscribe(&self, kind: InboundKind, handler: EventHandler) -> SubscriptionId {
        self.registry.insert(kind, handler)
    }

    fn unsubscribe(&self, kind: InboundKind, id: SubscriptionId) -> bool {
        self.registry.remove(kind, id)
    }

    fn emit(&self, event: &OutboundEvent) -> Result<(), TransportError> {
        let frame = event.to_json_string()?;
        self.outbound
            .send(frame)
            .map_err(|_| TransportError::Closed)
    }
}

/// Feed inbound frames to `channel` until the sender side closes.
///
/// Undecodable frames are logged and skipped. Returns the number of frames dispatched.
pub async fn pump(channel: &MpscChannel, mut inbound: UnboundedReceiver<String>) -> usize {
    let mut dispatched = 0;
    while let Some(frame) = inbound.recv().await {
        match channel.dispatch_frame(&frame) {
            Ok(_) => dispatched += 1,
            Err(err) => warn!(error = %err, "dropping undecodable inbound frame"),
        }
    }
    dispatched
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use tokio::sync::mpsc::unbounded_channel;

    use super::*;

    #[tokio::test]
    async fn pump_dispatches_decodable_frames() {
        let (out_tx, _out_rx) = unbounded_channel();
        let channel = MpscChannel::new(out_tx);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        channel.subscribe(
            InboundKind::Buzz,
            Rc::new(move |event: &InboundEvent| sink.borrow_mut().push(event.clone())),
        );

        let (in_tx, in_rx) = unbounded_channel();
        in_tx
            .send(r#"{"type":"buzz","participant_id":"a"}"#.to_string())
            .unwrap();
        in_tx.send("garbage".to_string()).unwrap();
        in_tx
            .send(r#"{"type":"buzz","participant_id":"b","round":1}"#.to_string())
            .unwrap();
        drop(in_tx);

        assert_eq!(pump(&channel, in_rx).await, 2);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[tokio::test]
    async fn emit_encodes_frames_and_reports_closed_writer() {
        let (out_tx, mut out_rx) = unbounded_channel();
        let channel = MpscChannel::new(out_tx);
        channel
            .emit(&OutboundEvent::RequestRevealAnswer { round: 4 })
            .unwrap();

        let frame = out_rx.recv().await.unwrap();
        assert_eq!(frame, r#"{"type":"request-reveal-answer","round":4}"#);

        drop(out_rx);
        assert!(matches!(
            channel.emit(&OutboundEvent::EndQuiz {
                finished: true,
                round: 4,
            }),
            Err(TransportError::Closed)
        ));
    }
}
