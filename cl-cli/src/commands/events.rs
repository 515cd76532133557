//! Routed event catalog command.

use comfy_table::{presets::UTF8_FULL, Table};
use console::style;
use serde_json::json;

use cl_core::error::ClResult;
use cl_realtime::events::ServerEvent;
use cl_sync::route;

use crate::OutputFormat;

/// Representative payloads used to render each route's effects.
fn sample_payload(name: &str) -> serde_json::Value {
    match name {
        "order.status" => json!({"order_id": 42, "status": "in_transit"}),
        "message.new" => json!({"conversation_id": 7}),
        "notification" => json!({"title": "Tender awarded"}),
        _ => json!({}),
    }
}

pub fn run(format: OutputFormat) -> ClResult<()> {
    let names = cl_core::constants::events::ALL;

    match format {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = names
                .iter()
                .map(|name| {
                    let outcome = route(&ServerEvent::new(name, sample_payload(name)));
                    json!({
                        "event": name,
                        "invalidates": outcome
                            .invalidations
                            .iter()
                            .map(|k| k.to_string())
                            .collect::<Vec<_>>(),
                        "notice": outcome.notice,
                        "unread_delta": outcome.unread_delta,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            println!("{}", style("Routed server events").bold());
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Event", "Invalidates", "Notice", "Unread"]);
            for name in names {
                let outcome = route(&ServerEvent::new(name, sample_payload(name)));
                let invalidates = outcome
                    .invalidations
                    .iter()
                    .map(|k| k.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                table.add_row(vec![
                    name.to_string(),
                    invalidates,
                    outcome.notice.unwrap_or_else(|| "-".into()),
                    format!("{:+}", outcome.unread_delta),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}
