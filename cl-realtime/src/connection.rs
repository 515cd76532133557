//! Realtime connection manager.
//!
//! Owns the single multiplexed connection to the Cargoline server: the
//! auth handshake, the connection state machine, bounded reconnection with
//! backoff, and the mandatory resync of channel subscriptions and event
//! listeners onto the transport after every (re)connect.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use cl_core::config::RealtimeConfig;

use crate::channels::ChannelRegistry;
use crate::events::ServerEvent;
use crate::listeners::{Handler, HandlerId, ListenerMultiplexer};
use crate::transport::{ControlMessage, Transport};

/// Connection state for the realtime client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected and not trying to connect.
    Disconnected,
    /// Attempting to establish the initial connection.
    Connecting,
    /// Connected and receiving events.
    Connected,
    /// Connection lost, transport is attempting to reconnect.
    Reconnecting,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Reconnecting => write!(f, "reconnecting"),
        }
    }
}

/// Configuration for reconnection behavior.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// Base delay between reconnection attempts.
    pub base_delay: Duration,
    /// Maximum delay cap for the backoff curve.
    pub max_delay: Duration,
    /// Maximum number of reconnection attempts before giving up.
    pub max_attempts: u32,
    /// Jitter factor (0.0 to 1.0) applied below the cap. Values above 1.0
    /// would break the monotone non-decreasing delay guarantee.
    pub jitter_factor: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_attempts: 10,
            jitter_factor: 0.3,
        }
    }
}

impl From<&RealtimeConfig> for ReconnectPolicy {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
            max_attempts: config.max_reconnect_attempts,
            jitter_factor: config.jitter_factor,
        }
    }
}

/// The declarative replay applied to a fresh transport after (re)connect.
///
/// Built as a pure function over current registry and multiplexer state,
/// so the resync step can be tested without a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResyncPlan {
    /// Channels to re-subscribe, in insertion order.
    pub subscribes: Vec<String>,
    /// Event names to re-bind, in first-registration order.
    pub binds: Vec<String>,
}

impl ResyncPlan {
    /// Compute the replay for the current registry and multiplexer state.
    pub fn build(channels: &ChannelRegistry, listeners: &ListenerMultiplexer) -> Self {
        Self {
            subscribes: channels.active(),
            binds: listeners.event_names(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subscribes.is_empty() && self.binds.is_empty()
    }
}

/// Realtime connection manager.
///
/// A single process-wide instance is shared by all screens. It is
/// constructed explicitly (no module-level global) so tests can create
/// independent instances. State transitions are driven by transport
/// lifecycle callbacks (`handle_open`, `handle_closed`, `handle_retry`,
/// `handle_event`) and by explicit `connect`/`disconnect` calls; all of
/// them are non-blocking.
pub struct RealtimeClient {
    transport: Arc<dyn Transport>,
    policy: ReconnectPolicy,
    /// Current connection state.
    state: Arc<Mutex<ConnectionState>>,
    /// Watch channel for state change notifications.
    state_tx: watch::Sender<ConnectionState>,
    /// Bearer token presented at connect time. None while logged out.
    auth_token: Arc<RwLock<Option<String>>>,
    /// Consecutive failed reconnection attempts, reset on success.
    reconnect_attempts: Arc<Mutex<u32>>,
    /// Reference-counted channel membership.
    channels: Arc<Mutex<ChannelRegistry>>,
    /// Registered event handlers, replayed onto the transport on resync.
    listeners: Arc<Mutex<ListenerMultiplexer>>,
}

impl RealtimeClient {
    /// Create a new client over the given transport.
    pub fn new(transport: Arc<dyn Transport>, policy: ReconnectPolicy) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            transport,
            policy,
            state: Arc::new(Mutex::new(ConnectionState::Disconnected)),
            state_tx,
            auth_token: Arc::new(RwLock::new(None)),
            reconnect_attempts: Arc::new(Mutex::new(0)),
            channels: Arc::new(Mutex::new(ChannelRegistry::new())),
            listeners: Arc::new(Mutex::new(ListenerMultiplexer::new())),
        }
    }

    /// Subscribe to connection state changes.
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Get the current connection state.
    pub async fn state(&self) -> ConnectionState {
        *self.state.lock().await
    }

    /// Replace the stored auth token. Takes effect on the next connect.
    pub async fn set_auth_token(&self, token: Option<String>) {
        *self.auth_token.write().await = token;
    }

    /// Update the connection state and notify watchers.
    async fn set_state(&self, new_state: ConnectionState) {
        let mut state = self.state.lock().await;
        if *state != new_state {
            info!("realtime state: {} -> {}", *state, new_state);
            *state = new_state;
            let _ = self.state_tx.send(new_state);
        }
    }

    /// Start the connection.
    ///
    /// No-op when already Connected or Connecting. Without an auth token
    /// this silently stays Disconnected: a deliberate "not logged in"
    /// quiescent state, not an error. Completion is observed via the state
    /// watch channel, not a return value.
    pub async fn connect(&self) {
        let current = self.state().await;
        if current == ConnectionState::Connected || current == ConnectionState::Connecting {
            debug!("already {current}, skipping connect");
            return;
        }

        let token = self.auth_token.read().await.clone();
        let Some(token) = token else {
            debug!("no auth token available, staying disconnected");
            return;
        };

        self.set_state(ConnectionState::Connecting).await;
        *self.reconnect_attempts.lock().await = 0;

        if let Err(e) = self.transport.open(&token) {
            // Transport-level reconnection is automatic; never thrown to the caller.
            warn!("transport open failed: {e}");
            self.set_state(ConnectionState::Reconnecting).await;
        }
    }

    /// Close the connection and stop any reconnection cycle. Idempotent.
    pub async fn disconnect(&self) {
        self.transport.close();
        *self.reconnect_attempts.lock().await = 0;
        self.set_state(ConnectionState::Disconnected).await;
    }

    /// Transport reported an open connection (initial connect or reconnect).
    ///
    /// Only honored while Connecting or Reconnecting; a late open callback
    /// arriving after an explicit `disconnect()` must not revive the
    /// connection. Resyncs channels and listeners onto the fresh transport
    /// before any buffered inbound events are delivered.
    pub async fn handle_open(&self) {
        let current = self.state().await;
        if current != ConnectionState::Connecting && current != ConnectionState::Reconnecting {
            debug!("transport open while {current}, ignoring");
            return;
        }
        *self.reconnect_attempts.lock().await = 0;
        self.set_state(ConnectionState::Connected).await;
        self.resync().await;
    }

    /// Transport reported the connection closed or errored.
    pub async fn handle_closed(&self) {
        let current = self.state().await;
        if current == ConnectionState::Disconnected {
            debug!("transport closed after explicit disconnect, ignoring");
            return;
        }
        warn!("connection lost, entering reconnect cycle");
        self.set_state(ConnectionState::Reconnecting).await;
    }

    /// Transport reported a failed reconnection attempt.
    ///
    /// Returns whether the transport should keep retrying. After the
    /// configured maximum the client settles in Disconnected; the next
    /// explicit `connect()` (e.g. on app foreground) restarts the cycle.
    pub async fn handle_retry(&self) -> bool {
        if self.state().await != ConnectionState::Reconnecting {
            return false;
        }

        let attempt = {
            let mut attempts = self.reconnect_attempts.lock().await;
            *attempts += 1;
            *attempts
        };

        if attempt >= self.policy.max_attempts {
            error!(
                "max reconnection attempts ({}) reached, giving up",
                self.policy.max_attempts
            );
            self.set_state(ConnectionState::Disconnected).await;
            return false;
        }

        let delay = self.reconnect_delay(attempt);
        warn!(
            "reconnection attempt {attempt}/{} failed, next in {:.1}s",
            self.policy.max_attempts,
            delay.as_secs_f64()
        );
        true
    }

    /// Deliver an inbound event envelope to all matching handlers.
    pub async fn handle_event(&self, name: &str, payload: serde_json::Value) {
        let event = ServerEvent::new(name, payload);
        let fired = self.listeners.lock().await.dispatch(&event);
        debug!("event {name}: {fired} handler(s)");
    }

    /// Join a logical channel.
    ///
    /// Emits a subscribe message only on the 0 -> 1 refcount transition and
    /// only while Connected; otherwise the membership is picked up by the
    /// resync on the next connect.
    pub async fn join(&self, channel: &str) {
        let emit = self.channels.lock().await.join(channel);
        if emit && self.state().await == ConnectionState::Connected {
            if let Err(e) = self.transport.send(ControlMessage::Subscribe {
                channel: channel.to_string(),
            }) {
                warn!("subscribe {channel} failed: {e}");
            }
        }
    }

    /// Leave a logical channel. Emits an unsubscribe only on 1 -> 0.
    pub async fn leave(&self, channel: &str) {
        let emit = self.channels.lock().await.leave(channel);
        if emit && self.state().await == ConnectionState::Connected {
            if let Err(e) = self.transport.send(ControlMessage::Unsubscribe {
                channel: channel.to_string(),
            }) {
                warn!("unsubscribe {channel} failed: {e}");
            }
        }
    }

    /// Register a handler for a named event. Binds the event on the live
    /// transport when it is the first handler for that name.
    pub async fn on(&self, event: &str, handler: Handler) -> HandlerId {
        let reg = self.listeners.lock().await.on(event, handler);
        if reg.first_for_event && self.state().await == ConnectionState::Connected {
            if let Err(e) = self.transport.bind(event) {
                warn!("bind {event} failed: {e}");
            }
        }
        reg.id
    }

    /// Remove a handler by its token. Unknown tokens are a no-op.
    pub async fn off(&self, id: HandlerId) {
        let removal = self.listeners.lock().await.off(id);
        if let Some(removal) = removal {
            if removal.last_for_event && self.state().await == ConnectionState::Connected {
                if let Err(e) = self.transport.unbind(&removal.event) {
                    warn!("unbind {} failed: {e}", removal.event);
                }
            }
        }
    }

    /// Currently joined channels, in insertion order.
    pub async fn joined_channels(&self) -> Vec<String> {
        self.channels.lock().await.active()
    }

    /// Reference count for a channel.
    pub async fn channel_ref_count(&self, channel: &str) -> u32 {
        self.channels.lock().await.ref_count(channel)
    }

    /// Number of handlers registered for an event name.
    pub async fn handler_count(&self, event: &str) -> usize {
        self.listeners.lock().await.handler_count(event)
    }

    /// Total registered handlers across all event names.
    pub async fn total_handlers(&self) -> usize {
        self.listeners.lock().await.total_handlers()
    }

    /// Replay current channel subscriptions and event bindings onto the
    /// transport.
    async fn resync(&self) {
        let plan = {
            let channels = self.channels.lock().await;
            let listeners = self.listeners.lock().await;
            ResyncPlan::build(&channels, &listeners)
        };

        if plan.is_empty() {
            debug!("resync: nothing to replay");
            return;
        }

        info!(
            "resync: {} channel(s), {} event binding(s)",
            plan.subscribes.len(),
            plan.binds.len()
        );

        for channel in &plan.subscribes {
            if let Err(e) = self.transport.send(ControlMessage::Subscribe {
                channel: channel.clone(),
            }) {
                warn!("resync subscribe {channel} failed: {e}");
            }
        }
        for event in &plan.binds {
            if let Err(e) = self.transport.bind(event) {
                warn!("resync bind {event} failed: {e}");
            }
        }
    }

    /// Calculate the delay before a reconnection attempt.
    ///
    /// Exponential backoff from the base delay, capped at the maximum.
    /// Positive-only jitter below the cap keeps the curve monotonically
    /// non-decreasing for jitter factors up to 1.0.
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let base = self.policy.base_delay.as_secs_f64();
        let max = self.policy.max_delay.as_secs_f64();

        let exponential = (base * 2.0_f64.powi(attempt as i32)).min(max);
        let jitter = rand::random::<f64>() * self.policy.jitter_factor * exponential;

        Duration::from_secs_f64((exponential + jitter).min(max))
    }
}
