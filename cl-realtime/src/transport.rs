//! Transport abstraction over the persistent server connection.
//!
//! The realtime client never talks to a socket directly; it drives a
//! `Transport`, which models a WebSocket-style protocol client: an auth
//! handshake on open, subscribe/unsubscribe control messages, and named
//! server events delivered back through the client's `handle_*` callbacks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use cl_core::error::{ClError, ClResult};

/// Client-to-server control messages for channel membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    /// Join a logical channel.
    Subscribe { channel: String },
    /// Leave a logical channel.
    Unsubscribe { channel: String },
}

/// The underlying persistent connection.
///
/// The transport's internal listener table is a derived, disposable cache;
/// the client replays subscriptions and bindings onto it after every
/// (re)connect. Implementations report connection lifecycle back to the
/// client (`handle_open`, `handle_closed`, `handle_retry`, `handle_event`)
/// from whatever event loop they run on.
pub trait Transport: Send + Sync {
    /// Start the physical connection, presenting the bearer token in the
    /// auth handshake.
    fn open(&self, token: &str) -> ClResult<()>;

    /// Close the physical connection. Idempotent.
    fn close(&self);

    /// Send a channel control message. Fails when the connection is closed.
    fn send(&self, msg: ControlMessage) -> ClResult<()>;

    /// Ask the connection to deliver the named server event.
    fn bind(&self, event: &str) -> ClResult<()>;

    /// Stop delivery of the named server event.
    fn unbind(&self, event: &str) -> ClResult<()>;

    /// Whether the physical connection is currently open.
    fn is_open(&self) -> bool;
}

#[derive(Debug, Default)]
struct MemoryLog {
    tokens: Vec<String>,
    sent: Vec<ControlMessage>,
    bound: Vec<String>,
}

/// In-process transport used by tests and the CLI simulator.
///
/// Records every operation so callers can assert on the exact sequence of
/// control messages and bindings the client produced.
#[derive(Default)]
pub struct MemoryTransport {
    open: AtomicBool,
    log: Mutex<MemoryLog>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens presented across all opens, in order.
    pub fn auth_tokens(&self) -> Vec<String> {
        self.log.lock().unwrap().tokens.clone()
    }

    /// All control messages sent, in order.
    pub fn sent_messages(&self) -> Vec<ControlMessage> {
        self.log.lock().unwrap().sent.clone()
    }

    /// Currently bound event names, in bind order.
    pub fn bound_events(&self) -> Vec<String> {
        self.log.lock().unwrap().bound.clone()
    }

    /// Number of Subscribe messages sent for a channel.
    pub fn subscribe_count(&self, channel: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .sent
            .iter()
            .filter(|m| matches!(m, ControlMessage::Subscribe { channel: c } if c == channel))
            .count()
    }

    /// Number of Unsubscribe messages sent for a channel.
    pub fn unsubscribe_count(&self, channel: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .sent
            .iter()
            .filter(|m| matches!(m, ControlMessage::Unsubscribe { channel: c } if c == channel))
            .count()
    }

    /// Drop the recorded message/bind history, keeping the open state.
    ///
    /// Simulates the fresh listener table of a new physical connection
    /// after a reconnect.
    pub fn reset_log(&self) {
        let mut log = self.log.lock().unwrap();
        log.sent.clear();
        log.bound.clear();
    }
}

impl Transport for MemoryTransport {
    fn open(&self, token: &str) -> ClResult<()> {
        self.log.lock().unwrap().tokens.push(token.to_string());
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    fn send(&self, msg: ControlMessage) -> ClResult<()> {
        if !self.is_open() {
            return Err(ClError::TransportClosed);
        }
        self.log.lock().unwrap().sent.push(msg);
        Ok(())
    }

    fn bind(&self, event: &str) -> ClResult<()> {
        let mut log = self.log.lock().unwrap();
        if !log.bound.iter().any(|e| e == event) {
            log.bound.push(event.to_string());
        }
        Ok(())
    }

    fn unbind(&self, event: &str) -> ClResult<()> {
        self.log.lock().unwrap().bound.retain(|e| e != event);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_records_token() {
        let t = MemoryTransport::new();
        assert!(!t.is_open());
        t.open("token-1").unwrap();
        assert!(t.is_open());
        assert_eq!(t.auth_tokens(), vec!["token-1"]);
    }

    #[test]
    fn test_send_requires_open() {
        let t = MemoryTransport::new();
        let err = t
            .send(ControlMessage::Subscribe {
                channel: "user.1".into(),
            })
            .unwrap_err();
        assert!(matches!(err, ClError::TransportClosed));

        t.open("tok").unwrap();
        t.send(ControlMessage::Subscribe {
            channel: "user.1".into(),
        })
        .unwrap();
        assert_eq!(t.subscribe_count("user.1"), 1);
    }

    #[test]
    fn test_bind_is_deduplicated() {
        let t = MemoryTransport::new();
        t.bind("order.status").unwrap();
        t.bind("order.status").unwrap();
        assert_eq!(t.bound_events(), vec!["order.status"]);

        t.unbind("order.status").unwrap();
        assert!(t.bound_events().is_empty());
    }

    #[test]
    fn test_reset_log_keeps_open_state() {
        let t = MemoryTransport::new();
        t.open("tok").unwrap();
        t.bind("order.status").unwrap();
        t.reset_log();
        assert!(t.is_open());
        assert!(t.bound_events().is_empty());
        assert_eq!(t.auth_tokens().len(), 1);
    }
}
