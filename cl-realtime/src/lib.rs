//! Cargoline Realtime - the event-synchronization client.
//!
//! Maintains a single multiplexed connection to the Cargoline server,
//! survives network flaps with bounded reconnection, re-establishes channel
//! subscriptions and event listeners transparently after reconnect, and fans
//! out server events to registered handlers.

pub mod channels;
pub mod connection;
pub mod events;
pub mod listeners;
pub mod transport;

pub use channels::ChannelRegistry;
pub use connection::{ConnectionState, RealtimeClient, ReconnectPolicy, ResyncPlan};
pub use events::{ServerEvent, ServerEventKind};
pub use listeners::{Handler, HandlerId, ListenerMultiplexer};
pub use transport::{ControlMessage, MemoryTransport, Transport};
