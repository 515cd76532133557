//! Cargoline synchronization layer.
//!
//! Consumes server events from `cl-realtime` and turns them into local
//! side effects: query-cache invalidations, the unread-message counter,
//! and user-facing notices. The `SyncSession` ties the whole pipeline to
//! a logical user identity with symmetric setup and teardown.

pub mod cache;
pub mod notify;
pub mod router;
pub mod session;

pub use cache::{CacheKey, InvalidationSink, QueryCache};
pub use notify::{BroadcastNotifier, Notifier, RecordingNotifier};
pub use router::{route, EventRouter, RouterOutcome};
pub use session::{Identity, SyncSession};
