//! Listener multiplexer for named server events.
//!
//! Application code registers callbacks per event name and receives a
//! `HandlerId` token for removal. Registrations are the source of truth;
//! the transport's listener table is rebuilt from this multiplexer after
//! every reconnect. Handlers for an event fire in registration order and
//! no handler can suppress delivery to the ones after it.

use std::sync::Arc;

use crate::events::ServerEvent;

/// Callback invoked with each matching server event.
pub type Handler = Arc<dyn Fn(&ServerEvent) + Send + Sync>;

/// Opaque token identifying a registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct ListenerEntry {
    event: String,
    id: HandlerId,
    handler: Handler,
}

/// Result of registering a handler.
#[derive(Debug, Clone, Copy)]
pub struct Registration {
    /// Token for later removal.
    pub id: HandlerId,
    /// Whether this is the first handler for its event name, i.e. the
    /// event should be bound on the live transport.
    pub first_for_event: bool,
}

/// Result of removing a handler.
#[derive(Debug, Clone)]
pub struct Removal {
    /// The event name the handler was registered for.
    pub event: String,
    /// Whether this was the last handler for its event name, i.e. the
    /// event can be unbound from the live transport.
    pub last_for_event: bool,
}

/// Mapping from event name to an ordered set of callbacks.
#[derive(Default)]
pub struct ListenerMultiplexer {
    entries: Vec<ListenerEntry>,
    next_id: u64,
}

impl ListenerMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler for an event name.
    pub fn on(&mut self, event: &str, handler: Handler) -> Registration {
        let first_for_event = !self.entries.iter().any(|e| e.event == event);
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.entries.push(ListenerEntry {
            event: event.to_string(),
            id,
            handler,
        });
        Registration { id, first_for_event }
    }

    /// Remove a handler by its token. Unknown tokens are a no-op.
    pub fn off(&mut self, id: HandlerId) -> Option<Removal> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        let entry = self.entries.remove(pos);
        let last_for_event = !self.entries.iter().any(|e| e.event == entry.event);
        Some(Removal {
            event: entry.event,
            last_for_event,
        })
    }

    /// Fire all handlers registered for the event's name, in registration
    /// order. Returns the number of handlers invoked.
    pub fn dispatch(&self, event: &ServerEvent) -> usize {
        let name = event.kind.name();
        let mut fired = 0;
        for entry in &self.entries {
            if entry.event == name {
                (entry.handler)(event);
                fired += 1;
            }
        }
        fired
    }

    /// Distinct registered event names in first-registration order, for
    /// rebinding on the transport after reconnect.
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !names.iter().any(|n| n == &entry.event) {
                names.push(entry.event.clone());
            }
        }
        names
    }

    /// Number of handlers registered for an event name.
    pub fn handler_count(&self, event: &str) -> usize {
        self.entries.iter().filter(|e| e.event == event).count()
    }

    /// Total number of registered handlers across all event names.
    pub fn total_handlers(&self) -> usize {
        self.entries.len()
    }
}
