//! User-facing notice delivery.
//!
//! The router raises short informational notices ("Order status: in
//! transit"); how they surface (toast, system notification) is up to the
//! consuming layer. The broadcast variant lets any number of UI listeners
//! subscribe.

use std::sync::Mutex;

use tokio::sync::broadcast;
use tracing::debug;

/// Receiver of user-facing notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, text: &str);
}

/// Fans notices out to any number of subscribers over a broadcast channel.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<String>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, text: &str) {
        debug!("notice: {text}");
        // Errors only mean no subscriber is currently listening.
        let _ = self.tx.send(text.to_string());
    }
}

/// Records notices in memory for assertions in tests and the simulator.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, text: &str) {
        self.notices.lock().unwrap().push(text.to_string());
    }
}
