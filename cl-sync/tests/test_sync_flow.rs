//! End-to-end synchronization flow integration tests.
//!
//! Tests the complete pipeline: transport event -> RealtimeClient ->
//! ListenerMultiplexer -> EventRouter -> QueryCache/Notifier, plus the
//! session lifecycle across connects, reconnects, and identity changes.

use std::sync::Arc;

use serde_json::json;

use cl_realtime::{
    ConnectionState, MemoryTransport, RealtimeClient, ReconnectPolicy, Transport,
};
use cl_sync::{CacheKey, EventRouter, Identity, QueryCache, RecordingNotifier, SyncSession};

struct TestStack {
    transport: Arc<MemoryTransport>,
    client: Arc<RealtimeClient>,
    router: Arc<EventRouter>,
    cache: Arc<QueryCache>,
    notifier: Arc<RecordingNotifier>,
}

async fn build_stack() -> TestStack {
    let transport = Arc::new(MemoryTransport::new());
    let client = Arc::new(RealtimeClient::new(
        Arc::clone(&transport) as Arc<dyn Transport>,
        ReconnectPolicy::default(),
    ));
    client.set_auth_token(Some("test-token".into())).await;

    let cache = Arc::new(QueryCache::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let router = Arc::new(EventRouter::new(
        Arc::clone(&cache),
        Arc::clone(&notifier) as _,
    ));

    TestStack {
        transport,
        client,
        router,
        cache,
        notifier,
    }
}

// ---- Full inbound event pipeline ----

#[tokio::test]
async fn e2e_order_status_invalidates_and_notifies() {
    let stack = build_stack().await;
    let session = SyncSession::mount(
        Arc::clone(&stack.client),
        Arc::clone(&stack.router),
        Identity::new(12, Some(4)),
    )
    .await;
    stack.client.handle_open().await;

    stack
        .client
        .handle_event("order.status", json!({"order_id": 42, "status": "in_transit"}))
        .await;

    assert_eq!(
        stack.cache.stale_keys(),
        vec![CacheKey::OrdersList, CacheKey::Order(42), CacheKey::Dashboard]
    );
    assert_eq!(stack.notifier.notices(), vec!["Order status: in transit"]);

    session.unmount().await;
}

#[tokio::test]
async fn e2e_two_messages_bump_unread_by_two_without_refetch() {
    let stack = build_stack().await;
    stack.cache.set_unread_count(3);
    let _session = SyncSession::mount(
        Arc::clone(&stack.client),
        Arc::clone(&stack.router),
        Identity::new(12, None),
    )
    .await;
    stack.client.handle_open().await;

    stack
        .client
        .handle_event("message.new", json!({"conversation_id": 7}))
        .await;
    stack
        .client
        .handle_event("message.new", json!({"conversation_id": 8}))
        .await;

    assert_eq!(stack.cache.unread_count(), 5);
    assert!(stack.cache.is_stale(&CacheKey::Conversation(7)));
    assert!(stack.cache.is_stale(&CacheKey::Conversation(8)));
}

#[tokio::test]
async fn e2e_unknown_event_is_tolerated() {
    let stack = build_stack().await;
    let _session = SyncSession::mount(
        Arc::clone(&stack.client),
        Arc::clone(&stack.router),
        Identity::new(12, None),
    )
    .await;
    stack.client.handle_open().await;

    stack
        .client
        .handle_event("foo.bar", json!({"whatever": true}))
        .await;

    assert!(stack.cache.stale_keys().is_empty());
    assert!(stack.notifier.notices().is_empty());
}

// ---- Session lifecycle ----

#[tokio::test]
async fn session_mount_joins_channels_and_binds_events() {
    let stack = build_stack().await;
    let session = SyncSession::mount(
        Arc::clone(&stack.client),
        Arc::clone(&stack.router),
        Identity::new(12, Some(4)),
    )
    .await;
    stack.client.handle_open().await;

    assert_eq!(stack.client.joined_channels().await, vec!["user.12", "company.4"]);
    assert_eq!(stack.transport.subscribe_count("user.12"), 1);
    assert_eq!(stack.transport.subscribe_count("company.4"), 1);
    assert_eq!(stack.transport.bound_events().len(), 5);

    session.unmount().await;
}

#[tokio::test]
async fn session_teardown_is_symmetric() {
    let stack = build_stack().await;

    // Rapid mount/unmount cycles must leave no residue
    for _ in 0..3 {
        let session = SyncSession::mount(
            Arc::clone(&stack.client),
            Arc::clone(&stack.router),
            Identity::new(12, Some(4)),
        )
        .await;
        session.unmount().await;
    }

    assert!(stack.client.joined_channels().await.is_empty());
    assert_eq!(stack.client.total_handlers().await, 0);
}

#[tokio::test]
async fn session_unmount_keeps_connection_open() {
    let stack = build_stack().await;
    let session = SyncSession::mount(
        Arc::clone(&stack.client),
        Arc::clone(&stack.router),
        Identity::new(12, None),
    )
    .await;
    stack.client.handle_open().await;

    session.unmount().await;

    assert_eq!(stack.client.state().await, ConnectionState::Connected);
    assert!(stack.transport.is_open());
}

#[tokio::test]
async fn overlapping_sessions_share_channel_refcounts() {
    let stack = build_stack().await;
    let first = SyncSession::mount(
        Arc::clone(&stack.client),
        Arc::clone(&stack.router),
        Identity::new(12, None),
    )
    .await;
    stack.client.handle_open().await;
    let second = SyncSession::mount(
        Arc::clone(&stack.client),
        Arc::clone(&stack.router),
        Identity::new(12, None),
    )
    .await;

    assert_eq!(stack.client.channel_ref_count("user.12").await, 2);
    assert_eq!(stack.transport.subscribe_count("user.12"), 1);

    first.unmount().await;
    assert!(stack.client.joined_channels().await.contains(&"user.12".to_string()));
    assert_eq!(stack.transport.unsubscribe_count("user.12"), 0);

    second.unmount().await;
    assert_eq!(stack.transport.unsubscribe_count("user.12"), 1);
}

// ---- Reconnection and resync ----

#[tokio::test]
async fn reconnect_replays_subscriptions_and_bindings_before_events() {
    let stack = build_stack().await;
    let _session = SyncSession::mount(
        Arc::clone(&stack.client),
        Arc::clone(&stack.router),
        Identity::new(12, Some(4)),
    )
    .await;
    stack.client.handle_open().await;

    // Connection drops; the new physical connection starts blank
    stack.client.handle_closed().await;
    assert_eq!(stack.client.state().await, ConnectionState::Reconnecting);
    stack.transport.reset_log();

    stack.client.handle_open().await;
    assert_eq!(stack.client.state().await, ConnectionState::Connected);
    assert_eq!(stack.transport.subscribe_count("user.12"), 1);
    assert_eq!(stack.transport.subscribe_count("company.4"), 1);
    assert_eq!(stack.transport.bound_events().len(), 5);

    // Events flow through the re-bound handlers
    stack
        .client
        .handle_event("tender.update", json!({}))
        .await;
    assert!(stack.cache.is_stale(&CacheKey::Tenders));
}

#[tokio::test]
async fn reconnection_gives_up_after_ten_attempts() {
    let stack = build_stack().await;
    stack.client.connect().await;
    stack.client.handle_open().await;
    stack.client.handle_closed().await;

    let mut attempts = 0;
    while stack.client.handle_retry().await {
        attempts += 1;
    }
    // The final failed attempt is the one that settles in Disconnected
    assert_eq!(attempts + 1, 10);
    assert_eq!(stack.client.state().await, ConnectionState::Disconnected);
}

#[tokio::test]
async fn connect_without_token_is_silent_noop() {
    let stack = build_stack().await;
    stack.client.set_auth_token(None).await;
    stack.client.connect().await;

    assert_eq!(stack.client.state().await, ConnectionState::Disconnected);
    assert!(stack.transport.auth_tokens().is_empty());
}

// ---- Identity replacement ----

#[tokio::test]
async fn identity_switch_moves_channels() {
    let stack = build_stack().await;
    let session = SyncSession::mount(
        Arc::clone(&stack.client),
        Arc::clone(&stack.router),
        Identity::new(12, Some(4)),
    )
    .await;
    stack.client.handle_open().await;

    session.unmount().await;
    let _next = SyncSession::mount(
        Arc::clone(&stack.client),
        Arc::clone(&stack.router),
        Identity::new(99, None),
    )
    .await;

    assert_eq!(stack.client.joined_channels().await, vec!["user.99"]);
    assert_eq!(stack.transport.unsubscribe_count("user.12"), 1);
    assert_eq!(stack.transport.unsubscribe_count("company.4"), 1);
    assert_eq!(stack.transport.subscribe_count("user.99"), 1);
}
