use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    time::{Duration, Instant},
};

use tokio::sync::broadcast;

/// Maximum number of notices kept for late readers.
const RECENT_CAPACITY: usize = 16;

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Informational message.
    Info,
    /// Something failed but the game goes on.
    Error,
}

/// Transient, auto-expiring message for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Monotonic identifier, unique per hub.
    pub id: u64,
    /// Severity.
    pub level: NoticeLevel,
    /// Human readable text.
    pub message: String,
    /// Instant after which the notice should no longer be shown.
    pub expires_at: Instant,
}

impl Notice {
    /// Whether the notice should be hidden at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Broadcast hub fanning notices out to presentation subscribers.
pub struct NoticeHub {
    sender: broadcast::Sender<Notice>,
    recent: RefCell<VecDeque<Notice>>,
    next_id: Cell<u64>,
    ttl: Duration,
}

impl NoticeHub {
    /// Construct a hub whose notices live for `ttl`.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self {
            sender,
            recent: RefCell::new(VecDeque::new()),
            next_id: Cell::new(0),
            ttl,
        }
    }

    /// Register a new subscriber that will receive subsequent notices.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    /// Publish a notice, ignoring delivery errors.
    pub fn raise(&self, level: NoticeLevel, message: impl Into<String>) -> Notice {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let notice = Notice {
            id,
            level,
            message: message.into(),
            expires_at: Instant::now() + self.ttl,
        };

        {
            let mut recent = self.recent.borrow_mut();
            if recent.len() == RECENT_CAPACITY {
                recent.pop_front();
            }
            recent.push_back(notice.clone());
        }

        let _ = self.sender.send(notice.clone());
        notice
    }

    /// Notices still visible at `now`; expired ones are pruned.
    pub fn active(&self, now: Instant) -> Vec<Notice> {
        let mut recent = self.recent.borrow_mut();
        recent.retain(|notice| !notice.is_expired(now));
        recent.iter().cloned().collect()
    }

    /// Drop every pending notice.
    pub fn clear(&self) {
        self.recent.borrow_mut().clear();
    }
}
