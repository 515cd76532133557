//! Server event types and the event envelope.
//!
//! Defines the named events streamed from the Cargoline server and typed
//! accessors for their payloads. Payloads are not schema-validated beyond
//! what each named handler expects.

use serde::{Deserialize, Serialize};

use cl_core::constants::events as names;

/// All server event kinds the client knows about.
///
/// These map 1:1 to the server's broadcast event names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerEventKind {
    /// An order changed status (`order.status`).
    OrderStatus,
    /// A new chat message arrived (`message.new`).
    MessageNew,
    /// A server-composed notification (`notification`).
    Notification,
    /// Shipment tracking data changed (`tracking.update`).
    TrackingUpdate,
    /// A tender was created or updated (`tender.update`).
    TenderUpdate,
    /// Unknown/unhandled event name.
    Unknown(String),
}

impl ServerEventKind {
    /// Parse an event name string from the server.
    pub fn from_name(s: &str) -> Self {
        match s {
            names::ORDER_STATUS => Self::OrderStatus,
            names::MESSAGE_NEW => Self::MessageNew,
            names::NOTIFICATION => Self::Notification,
            names::TRACKING_UPDATE => Self::TrackingUpdate,
            names::TENDER_UPDATE => Self::TenderUpdate,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The server event name for this kind.
    pub fn name(&self) -> &str {
        match self {
            Self::OrderStatus => names::ORDER_STATUS,
            Self::MessageNew => names::MESSAGE_NEW,
            Self::Notification => names::NOTIFICATION,
            Self::TrackingUpdate => names::TRACKING_UPDATE,
            Self::TenderUpdate => names::TENDER_UPDATE,
            Self::Unknown(s) => s.as_str(),
        }
    }

    /// All event names the client should bind on the transport.
    pub fn all_names() -> &'static [&'static str] {
        names::ALL
    }
}

/// Typed payload for `order.status` events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusPayload {
    /// The order that changed.
    pub order_id: i64,
    /// The new status, snake_cased (e.g. "in_transit").
    pub status: String,
}

/// Typed payload for `message.new` events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageNewPayload {
    /// The conversation the message belongs to.
    pub conversation_id: i64,
}

/// Typed payload for `notification` events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// The notification title to surface to the user.
    pub title: String,
}

/// An event envelope as received from the transport.
#[derive(Debug, Clone)]
pub struct ServerEvent {
    /// The kind of event.
    pub kind: ServerEventKind,
    /// The event payload from the server, kept opaque.
    pub payload: serde_json::Value,
}

impl ServerEvent {
    /// Build an envelope from a raw event name and payload.
    pub fn new(name: &str, payload: serde_json::Value) -> Self {
        Self {
            kind: ServerEventKind::from_name(name),
            payload,
        }
    }

    /// Try to parse the payload as an OrderStatusPayload.
    pub fn as_order_status(&self) -> Option<OrderStatusPayload> {
        if self.kind == ServerEventKind::OrderStatus {
            serde_json::from_value(self.payload.clone()).ok()
        } else {
            None
        }
    }

    /// Try to parse the payload as a MessageNewPayload.
    pub fn as_message_new(&self) -> Option<MessageNewPayload> {
        if self.kind == ServerEventKind::MessageNew {
            serde_json::from_value(self.payload.clone()).ok()
        } else {
            None
        }
    }

    /// Try to parse the payload as a NotificationPayload.
    pub fn as_notification(&self) -> Option<NotificationPayload> {
        if self.kind == ServerEventKind::Notification {
            serde_json::from_value(self.payload.clone()).ok()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_parsing() {
        assert_eq!(
            ServerEventKind::from_name("order.status"),
            ServerEventKind::OrderStatus
        );
        assert_eq!(
            ServerEventKind::from_name("message.new"),
            ServerEventKind::MessageNew
        );
        assert_eq!(
            ServerEventKind::from_name("notification"),
            ServerEventKind::Notification
        );
        assert_eq!(
            ServerEventKind::from_name("foo.bar"),
            ServerEventKind::Unknown("foo.bar".into())
        );
    }

    #[test]
    fn test_event_kind_roundtrip() {
        for name in ServerEventKind::all_names() {
            let kind = ServerEventKind::from_name(name);
            assert_eq!(kind.name(), *name);
            assert!(!matches!(kind, ServerEventKind::Unknown(_)));
        }
    }

    #[test]
    fn test_order_status_typed_access() {
        let event = ServerEvent::new(
            "order.status",
            serde_json::json!({"order_id": 42, "status": "in_transit"}),
        );
        let payload = event.as_order_status().unwrap();
        assert_eq!(payload.order_id, 42);
        assert_eq!(payload.status, "in_transit");

        // Wrong kind should return None
        assert!(event.as_message_new().is_none());
    }

    #[test]
    fn test_malformed_payload_returns_none() {
        let event = ServerEvent::new("order.status", serde_json::json!({"nope": true}));
        assert!(event.as_order_status().is_none());
    }
}
