//! Query-cache invalidation keys and the local cache facade.
//!
//! The actual query store lives in the UI layer; this module only marks
//! keys stale and maintains the unread-message counter. Consumers watch
//! the stale set and refetch on their own schedule.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use tracing::debug;

/// Opaque invalidation keys understood by the query cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The orders list view.
    OrdersList,
    /// A single order by id.
    Order(i64),
    /// The dashboard summary.
    Dashboard,
    /// The conversations list view.
    MessagesList,
    /// A single conversation by id.
    Conversation(i64),
    /// The notifications list view.
    NotificationsList,
    /// Shipment tracking data.
    Tracking,
    /// The tenders list view.
    Tenders,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrdersList => write!(f, "orders-list"),
            Self::Order(id) => write!(f, "order-{id}"),
            Self::Dashboard => write!(f, "dashboard"),
            Self::MessagesList => write!(f, "messages-list"),
            Self::Conversation(id) => write!(f, "conversation-{id}"),
            Self::NotificationsList => write!(f, "notifications-list"),
            Self::Tracking => write!(f, "tracking"),
            Self::Tenders => write!(f, "tenders"),
        }
    }
}

/// Receiver of cache invalidations.
pub trait InvalidationSink: Send + Sync {
    /// Mark the data behind a key as stale.
    fn invalidate(&self, key: &CacheKey);
}

/// Local stand-in for the app's query cache.
///
/// Tracks which keys have been marked stale and the unread-message
/// counter. The counter is adjusted with deltas applied at delivery time,
/// so back-to-back events never clobber each other's increments.
#[derive(Debug, Default)]
pub struct QueryCache {
    stale: Mutex<Vec<CacheKey>>,
    unread: AtomicI64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a delta to the unread-message counter and return the new value.
    pub fn apply_unread_delta(&self, delta: i64) -> i64 {
        let updated = self.unread.fetch_add(delta, Ordering::SeqCst) + delta;
        debug!("unread counter: {updated:+} after delta {delta}");
        updated
    }

    /// Current unread-message count.
    pub fn unread_count(&self) -> i64 {
        self.unread.load(Ordering::SeqCst)
    }

    /// Overwrite the unread counter, e.g. after a full refetch.
    pub fn set_unread_count(&self, value: i64) {
        self.unread.store(value, Ordering::SeqCst);
    }

    /// Keys marked stale since the last `take_stale`, in invalidation order.
    pub fn stale_keys(&self) -> Vec<CacheKey> {
        self.stale.lock().unwrap().clone()
    }

    /// Drain the stale set, handing the keys to the refetching layer.
    pub fn take_stale(&self) -> Vec<CacheKey> {
        std::mem::take(&mut *self.stale.lock().unwrap())
    }

    /// Whether a key is currently marked stale.
    pub fn is_stale(&self, key: &CacheKey) -> bool {
        self.stale.lock().unwrap().contains(key)
    }
}

impl InvalidationSink for QueryCache {
    fn invalidate(&self, key: &CacheKey) {
        debug!("cache invalidate: {key}");
        let mut stale = self.stale.lock().unwrap();
        if !stale.contains(key) {
            stale.push(key.clone());
        }
    }
}
