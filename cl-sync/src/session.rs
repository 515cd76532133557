//! Session lifecycle: binds a logical identity to the realtime pipeline.
//!
//! `SyncSession::mount` wires the whole stack for one identity: starts the
//! connection, joins the identity's channels, and registers a routed
//! handler for every known event. `unmount` tears down exactly what mount
//! set up. The connection itself is process-scoped and outlives sessions,
//! so unmount never disconnects.

use std::sync::Arc;

use tracing::info;

use cl_core::constants::{channels, events};
use cl_realtime::{HandlerId, RealtimeClient};

use crate::router::EventRouter;

/// The logical identity a session synchronizes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    /// Present for users attached to a company account.
    pub company_id: Option<i64>,
}

impl Identity {
    pub fn new(user_id: i64, company_id: Option<i64>) -> Self {
        Self { user_id, company_id }
    }

    /// The channels this identity listens on.
    pub fn channels(&self) -> Vec<String> {
        let mut list = vec![channels::user_channel(self.user_id)];
        if let Some(company_id) = self.company_id {
            list.push(channels::company_channel(company_id));
        }
        list
    }
}

/// A mounted synchronization session for one identity.
///
/// Holds the handler tokens and channel names acquired at mount so the
/// teardown is exactly symmetric, keeping reference counts balanced
/// across rapid mount/unmount cycles.
pub struct SyncSession {
    client: Arc<RealtimeClient>,
    identity: Identity,
    channels: Vec<String>,
    handlers: Vec<HandlerId>,
}

impl SyncSession {
    /// Wire the pipeline for an identity.
    pub async fn mount(
        client: Arc<RealtimeClient>,
        router: Arc<EventRouter>,
        identity: Identity,
    ) -> Self {
        info!(
            "mounting sync session for user {} (company: {:?})",
            identity.user_id, identity.company_id
        );

        client.connect().await;

        let channels = identity.channels();
        for channel in &channels {
            client.join(channel).await;
        }

        let mut handlers = Vec::with_capacity(events::ALL.len());
        for event in events::ALL {
            let router = Arc::clone(&router);
            let id = client
                .on(event, Arc::new(move |event| router.apply(event)))
                .await;
            handlers.push(id);
        }

        Self {
            client,
            identity,
            channels,
            handlers,
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Tear down exactly what mount set up. The shared connection stays
    /// open for the next identity.
    pub async fn unmount(self) {
        info!("unmounting sync session for user {}", self.identity.user_id);

        for id in self.handlers {
            self.client.off(id).await;
        }
        for channel in &self.channels {
            self.client.leave(channel).await;
        }
    }
}
