//! Event router: fixed mapping from server events to local side effects.
//!
//! `route` is a pure function from an event envelope to the set of cache
//! keys to invalidate, an optional notice, and an unread-counter delta.
//! `EventRouter` applies an outcome against the actual cache and notifier.
//! No route performs network calls; invalidation triggers the consuming
//! layer's own refetch outside this subsystem.

use std::sync::Arc;

use tracing::{debug, warn};

use cl_realtime::events::{ServerEvent, ServerEventKind};

use crate::cache::{CacheKey, InvalidationSink, QueryCache};
use crate::notify::Notifier;

/// The local side effects a single server event maps to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterOutcome {
    /// Cache keys to mark stale, in order.
    pub invalidations: Vec<CacheKey>,
    /// Notice text to surface to the user, if any.
    pub notice: Option<String>,
    /// Delta to apply to the unread-message counter.
    pub unread_delta: i64,
}

impl RouterOutcome {
    pub fn is_empty(&self) -> bool {
        self.invalidations.is_empty() && self.notice.is_none() && self.unread_delta == 0
    }
}

/// Map a server event to its local side effects.
///
/// Same envelope in, same outcome out. Unknown event names and payloads
/// that fail to parse produce an empty outcome.
pub fn route(event: &ServerEvent) -> RouterOutcome {
    match &event.kind {
        ServerEventKind::OrderStatus => {
            let Some(payload) = event.as_order_status() else {
                return RouterOutcome::default();
            };
            RouterOutcome {
                invalidations: vec![
                    CacheKey::OrdersList,
                    CacheKey::Order(payload.order_id),
                    CacheKey::Dashboard,
                ],
                notice: Some(format!(
                    "Order status: {}",
                    payload.status.replace('_', " ")
                )),
                unread_delta: 0,
            }
        }
        ServerEventKind::MessageNew => {
            let Some(payload) = event.as_message_new() else {
                return RouterOutcome::default();
            };
            RouterOutcome {
                invalidations: vec![
                    CacheKey::MessagesList,
                    CacheKey::Conversation(payload.conversation_id),
                ],
                notice: None,
                // Optimistic local increment, not a refetch.
                unread_delta: 1,
            }
        }
        ServerEventKind::Notification => {
            let Some(payload) = event.as_notification() else {
                return RouterOutcome::default();
            };
            RouterOutcome {
                invalidations: vec![CacheKey::NotificationsList],
                notice: Some(payload.title),
                unread_delta: 0,
            }
        }
        ServerEventKind::TrackingUpdate => RouterOutcome {
            invalidations: vec![CacheKey::Tracking],
            notice: None,
            unread_delta: 0,
        },
        ServerEventKind::TenderUpdate => RouterOutcome {
            invalidations: vec![CacheKey::Tenders],
            notice: None,
            unread_delta: 0,
        },
        ServerEventKind::Unknown(name) => {
            debug!("ignoring unknown event: {name}");
            RouterOutcome::default()
        }
    }
}

/// Applies routed outcomes against the query cache and notifier.
pub struct EventRouter {
    cache: Arc<QueryCache>,
    notifier: Arc<dyn Notifier>,
}

impl EventRouter {
    pub fn new(cache: Arc<QueryCache>, notifier: Arc<dyn Notifier>) -> Self {
        Self { cache, notifier }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Route an event and apply its side effects.
    pub fn apply(&self, event: &ServerEvent) {
        let outcome = route(event);
        if outcome.is_empty() {
            if !matches!(event.kind, ServerEventKind::Unknown(_)) {
                warn!("event {} carried an unusable payload", event.kind.name());
            }
            return;
        }

        for key in &outcome.invalidations {
            self.cache.invalidate(key);
        }
        if outcome.unread_delta != 0 {
            self.cache.apply_unread_delta(outcome.unread_delta);
        }
        if let Some(text) = &outcome.notice {
            self.notifier.notify(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use serde_json::json;

    #[test]
    fn test_order_status_route() {
        let event = ServerEvent::new(
            "order.status",
            json!({"order_id": 42, "status": "in_transit"}),
        );
        let outcome = route(&event);
        assert_eq!(
            outcome.invalidations,
            vec![CacheKey::OrdersList, CacheKey::Order(42), CacheKey::Dashboard]
        );
        assert_eq!(outcome.notice.as_deref(), Some("Order status: in transit"));
        assert_eq!(outcome.unread_delta, 0);
    }

    #[test]
    fn test_route_is_pure() {
        let event = ServerEvent::new(
            "order.status",
            json!({"order_id": 42, "status": "in_transit"}),
        );
        assert_eq!(route(&event), route(&event));
    }

    #[test]
    fn test_message_new_route() {
        let event = ServerEvent::new("message.new", json!({"conversation_id": 7}));
        let outcome = route(&event);
        assert_eq!(
            outcome.invalidations,
            vec![CacheKey::MessagesList, CacheKey::Conversation(7)]
        );
        assert!(outcome.notice.is_none());
        assert_eq!(outcome.unread_delta, 1);
    }

    #[test]
    fn test_notification_route() {
        let event = ServerEvent::new("notification", json!({"title": "Tender awarded"}));
        let outcome = route(&event);
        assert_eq!(outcome.invalidations, vec![CacheKey::NotificationsList]);
        assert_eq!(outcome.notice.as_deref(), Some("Tender awarded"));
    }

    #[test]
    fn test_tracking_and_tender_routes_are_silent() {
        let tracking = route(&ServerEvent::new("tracking.update", json!({})));
        assert_eq!(tracking.invalidations, vec![CacheKey::Tracking]);
        assert!(tracking.notice.is_none());

        let tender = route(&ServerEvent::new("tender.update", json!({})));
        assert_eq!(tender.invalidations, vec![CacheKey::Tenders]);
        assert!(tender.notice.is_none());
    }

    #[test]
    fn test_unknown_event_is_ignored() {
        let outcome = route(&ServerEvent::new("foo.bar", json!({"anything": 1})));
        assert!(outcome.is_empty());
    }

    #[test]
    fn test_malformed_payload_yields_empty_outcome() {
        let outcome = route(&ServerEvent::new("order.status", json!({"nope": true})));
        assert!(outcome.is_empty());
    }

    #[test]
    fn test_apply_marks_cache_and_notifies() {
        let cache = Arc::new(QueryCache::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let router = EventRouter::new(Arc::clone(&cache), Arc::clone(&notifier) as _);

        router.apply(&ServerEvent::new(
            "order.status",
            json!({"order_id": 9, "status": "delivered"}),
        ));

        assert!(cache.is_stale(&CacheKey::Order(9)));
        assert!(cache.is_stale(&CacheKey::Dashboard));
        assert_eq!(notifier.notices(), vec!["Order status: delivered"]);
    }

    #[test]
    fn test_two_messages_increment_unread_by_two() {
        let cache = Arc::new(QueryCache::new());
        cache.set_unread_count(10);
        let router = EventRouter::new(Arc::clone(&cache), Arc::new(RecordingNotifier::new()));

        router.apply(&ServerEvent::new("message.new", json!({"conversation_id": 1})));
        router.apply(&ServerEvent::new("message.new", json!({"conversation_id": 2})));

        assert_eq!(cache.unread_count(), 12);
    }
}
