pub mod answer;
pub mod buzz_queue;
pub mod game;
pub mod ledger;
pub mod notices;
pub mod room;
pub mod rotation;
pub mod session;
pub mod state_machine;

use std::{
    cell::RefCell,
    rc::Rc,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::{
    config::ClientConfig,
    dto::{events::InboundKind, snapshot::GameSnapshot},
    transport::{EventChannel, SubscriptionId},
};

pub use self::notices::{Notice, NoticeHub, NoticeLevel};
use self::{
    game::{Participant, Quiz},
    room::RoomState,
    session::{Roster, Session},
};

/// Handle to the client core. Not `Send`: the core lives on the UI/event thread.
pub type SharedClient = Rc<ClientState>;

/// Capacity of the notice broadcast channel.
const NOTICE_CAPACITY: usize = 16;

/// Client-side synchronization core for one room session.
///
/// Every mutation happens synchronously inside an inbound handler or a user action. Handlers
/// reach the room through this single cell, so a long-lived subscription always reads the
/// current state.
pub struct ClientState {
    session: Session,
    roster: Arc<dyn Roster>,
    config: Arc<ClientConfig>,
    channel: Rc<dyn EventChannel>,
    room: RefCell<RoomState>,
    snapshots: watch::Sender<GameSnapshot>,
    notices: NoticeHub,
    subscriptions: RefCell<Vec<(InboundKind, SubscriptionId)>>,
}

impl ClientState {
    /// Construct the core for `session` wrapped in an [`Rc`].
    ///
    /// Inbound handlers are not registered yet; see [`crate::services::dispatch::attach`].
    pub fn new(
        session: Session,
        roster: Arc<dyn Roster>,
        channel: Rc<dyn EventChannel>,
        catalog: Vec<Quiz>,
        config: Arc<ClientConfig>,
    ) -> SharedClient {
        let room = RoomState::new(catalog);
        let initial = GameSnapshot::build(&room, &session, roster.as_ref(), &config);
        let (snapshots, _rx) = watch::channel(initial);
        let notices = NoticeHub::new(NOTICE_CAPACITY, config.notice_ttl());

        Rc::new(Self {
            session,
            roster,
            config,
            channel,
            room: RefCell::new(room),
            snapshots,
            notices,
            subscriptions: RefCell::new(Vec::new()),
        })
    }

    /// Identity of the local participant.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Local participant.
    pub fn local_participant(&self) -> &Participant {
        self.session.participant()
    }

    /// Room roster.
    pub fn roster(&self) -> &dyn Roster {
        self.roster.as_ref()
    }

    /// Runtime configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Transport used for emissions and subscriptions.
    pub fn channel(&self) -> &Rc<dyn EventChannel> {
        &self.channel
    }

    /// Run `f` against the current room state.
    pub fn read_room<R>(&self, f: impl FnOnce(&RoomState) -> R) -> R {
        f(&self.room.borrow())
    }

    /// Mutate the room state, then publish a fresh snapshot.
    ///
    /// The borrow ends before anything is published; never emit from inside `f`.
    pub fn with_room_mut<R>(&self, f: impl FnOnce(&mut RoomState) -> R) -> R {
        let result = {
            let mut room = self.room.borrow_mut();
            f(&mut room)
        };
        self.publish_snapshot();
        result
    }

    /// Recompute the snapshot and notify watchers if it changed.
    pub fn publish_snapshot(&self) {
        let next = self.read_room(|room| {
            GameSnapshot::build(room, &self.session, self.roster.as_ref(), &self.config)
        });
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> GameSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Subscribe to snapshot updates.
    pub fn subscribe_snapshots(&self) -> watch::Receiver<GameSnapshot> {
        self.snapshots.subscribe()
    }

    /// Snapshot updates as a stream, starting with the current one.
    pub fn snapshot_stream(&self) -> WatchStream<GameSnapshot> {
        WatchStream::new(self.snapshots.subscribe())
    }

    /// Transient notice hub.
    pub fn notices(&self) -> &NoticeHub {
        &self.notices
    }

    /// Notices that have not expired yet.
    pub fn active_notices(&self) -> Vec<Notice> {
        self.notices.active(Instant::now())
    }

    /// Lifetime configured for notices.
    pub fn notice_ttl(&self) -> Duration {
        self.config.notice_ttl()
    }

    /// Replace the quiz catalog supplied by the host application.
    pub fn replace_catalog(&self, catalog: Vec<Quiz>) {
        self.with_room_mut(|room| room.rotation_mut().replace_catalog(catalog));
    }

    /// Forget everything about the room, scores included, e.g. after rejoining.
    pub fn reset_session(&self) {
        self.with_room_mut(RoomState::reset_session);
        self.notices.clear();
    }

    pub(crate) fn track_subscription(&self, kind: InboundKind, id: SubscriptionId) {
        self.subscriptions.borrow_mut().push((kind, id));
    }

    pub(crate) fn take_subscriptions(&self) -> Vec<(InboundKind, SubscriptionId)> {
        self.subscriptions.take()
    }
}
