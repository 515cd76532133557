//! Event-script replay through the full sync pipeline.
//!
//! Wires a real client stack over the in-process transport, mounts a
//! session for the given identity, and replays a scripted sequence of
//! server events. Useful for inspecting routing behavior and the resync
//! path without a live server.

use std::sync::Arc;

use comfy_table::{presets::UTF8_FULL, Table};
use console::style;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use cl_core::config::ConfigHandle;
use cl_core::error::{ClError, ClResult};
use cl_realtime::{MemoryTransport, RealtimeClient, ReconnectPolicy, Transport};
use cl_sync::{EventRouter, Identity, QueryCache, RecordingNotifier, SyncSession};

use crate::OutputFormat;

/// One scripted server event.
#[derive(Debug, Deserialize)]
struct ScriptStep {
    event: String,
    #[serde(default)]
    payload: serde_json::Value,
}

fn load_script(path: Option<&str>) -> ClResult<Vec<ScriptStep>> {
    match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)?;
            serde_json::from_str(&contents)
                .map_err(|e| ClError::Config(format!("invalid event script: {e}")))
        }
        None => Ok(demo_script()),
    }
}

/// Built-in script covering every routed event plus an unknown one.
fn demo_script() -> Vec<ScriptStep> {
    let steps = [
        ("order.status", json!({"order_id": 42, "status": "in_transit"})),
        ("message.new", json!({"conversation_id": 7})),
        ("message.new", json!({"conversation_id": 7})),
        ("notification", json!({"title": "Tender awarded"})),
        ("tracking.update", json!({})),
        ("tender.update", json!({})),
        ("order.status", json!({"order_id": 42, "status": "delivered"})),
        ("some.unknown", json!({"ignored": true})),
    ];
    steps
        .into_iter()
        .map(|(event, payload)| ScriptStep {
            event: event.to_string(),
            payload,
        })
        .collect()
}

pub async fn run(
    config: ConfigHandle,
    user: i64,
    company: Option<i64>,
    script_path: Option<&str>,
    drop_connection: bool,
    format: OutputFormat,
) -> ClResult<()> {
    let script = load_script(script_path)?;

    let policy = ReconnectPolicy::from(&config.read().await.realtime);
    let transport = Arc::new(MemoryTransport::new());
    let client = Arc::new(RealtimeClient::new(
        Arc::clone(&transport) as Arc<dyn Transport>,
        policy,
    ));
    client.set_auth_token(Some("simulated-token".into())).await;

    let cache = Arc::new(QueryCache::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let router = Arc::new(EventRouter::new(
        Arc::clone(&cache),
        Arc::clone(&notifier) as _,
    ));

    let identity = Identity::new(user, company);
    let session = SyncSession::mount(Arc::clone(&client), router, identity).await;
    client.handle_open().await;

    info!("replaying {} scripted event(s)", script.len());

    let drop_at = drop_connection.then(|| script.len() / 2);
    for (index, step) in script.iter().enumerate() {
        if drop_at == Some(index) {
            info!("simulating connection loss at step {index}");
            client.handle_closed().await;
            client.handle_retry().await;
            // The reconnected transport starts with a blank listener table
            transport.reset_log();
            client.handle_open().await;
        }
        client.handle_event(&step.event, step.payload.clone()).await;
    }

    let stale = cache.stale_keys();
    let notices = notifier.notices();
    let unread = cache.unread_count();
    let state = client.state().await;

    match format {
        OutputFormat::Json => {
            let summary = json!({
                "identity": {"user_id": user, "company_id": company},
                "events_replayed": script.len(),
                "connection_state": state.to_string(),
                "stale_keys": stale.iter().map(|k| k.to_string()).collect::<Vec<_>>(),
                "notices": notices,
                "unread_count": unread,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Text => {
            println!(
                "{} ({} event(s), connection {})",
                style("Simulation complete").bold().green(),
                script.len(),
                state
            );

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Stale cache keys"]);
            for key in &stale {
                table.add_row(vec![key.to_string()]);
            }
            println!("{table}");

            if notices.is_empty() {
                println!("No notices raised.");
            } else {
                println!("{}", style("Notices").bold());
                for notice in &notices {
                    println!("  - {notice}");
                }
            }
            println!("Unread counter: {unread}");
        }
    }

    session.unmount().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_script_parses_known_and_unknown_events() {
        let script = demo_script();
        assert_eq!(script.len(), 8);
        assert_eq!(script[0].event, "order.status");
        assert_eq!(script.last().unwrap().event, "some.unknown");
    }

    #[test]
    fn test_load_script_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("script.json");
        std::fs::write(
            &path,
            r#"[{"event": "message.new", "payload": {"conversation_id": 1}}, {"event": "tender.update"}]"#,
        )
        .unwrap();

        let script = load_script(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script[0].event, "message.new");
        assert_eq!(script[1].payload, serde_json::Value::Null);
    }

    #[test]
    fn test_load_script_rejects_malformed_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("script.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(load_script(Some(path.to_str().unwrap())).is_err());
    }

    #[tokio::test]
    async fn test_simulation_runs_end_to_end() {
        let config = ConfigHandle::new(cl_core::config::AppConfig::default());
        run(config, 1, Some(4), None, true, OutputFormat::Json)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_simulation_honors_configured_reconnect_policy() {
        let mut app_config = cl_core::config::AppConfig::default();
        app_config.realtime.max_reconnect_attempts = 3;
        app_config.realtime.base_delay_ms = 100;
        let config = ConfigHandle::new(app_config);

        run(config, 1, None, None, true, OutputFormat::Json)
            .await
            .unwrap();
    }
}
