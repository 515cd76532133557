//! Configuration commands.

use std::path::Path;

use clap::Subcommand;
use console::style;

use cl_core::config::{AppConfig, ConfigHandle};
use cl_core::error::{ClError, ClResult};

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show all configuration values.
    Show,
    /// Write a default configuration file.
    Init,
    /// Get a specific value by key path (e.g., "server.base_url").
    Get {
        /// Setting key path.
        key: String,
    },
    /// Set a specific value by key path.
    Set {
        /// Setting key path.
        key: String,
        /// New value.
        value: String,
    },
    /// Print the configuration file path.
    Path,
}

pub async fn run(
    config: ConfigHandle,
    config_path: Option<&Path>,
    action: ConfigAction,
    format: OutputFormat,
) -> ClResult<()> {
    match action {
        ConfigAction::Show => show(&config, format).await,
        ConfigAction::Init => init(config_path).await,
        ConfigAction::Get { key } => get(&config, &key).await,
        ConfigAction::Set { key, value } => set(config, config_path, &key, &value).await,
        ConfigAction::Path => {
            println!("{}", AppConfig::default_config_path()?.display());
            Ok(())
        }
    }
}

/// Resolve a dot-separated key path to a display value. Secrets are masked.
fn get_value(cfg: &AppConfig, key: &str) -> Option<String> {
    match key {
        "server.base_url" => Some(cfg.server.base_url.clone()),
        "server.auth_token" => Some(mask_token(cfg.server.auth_token.as_deref())),
        "realtime.max_reconnect_attempts" => Some(cfg.realtime.max_reconnect_attempts.to_string()),
        "realtime.base_delay_ms" => Some(cfg.realtime.base_delay_ms.to_string()),
        "realtime.max_delay_ms" => Some(cfg.realtime.max_delay_ms.to_string()),
        "realtime.jitter_factor" => Some(cfg.realtime.jitter_factor.to_string()),
        "logging.level" => Some(cfg.logging.level.clone()),
        "logging.directory" => Some(cfg.logging.directory.clone()),
        "logging.json_output" => Some(cfg.logging.json_output.to_string()),
        _ => None,
    }
}

fn mask_token(token: Option<&str>) -> String {
    match token {
        Some(_) => "********".to_string(),
        None => "(not set)".to_string(),
    }
}

const ALL_KEYS: &[&str] = &[
    "server.base_url",
    "server.auth_token",
    "realtime.max_reconnect_attempts",
    "realtime.base_delay_ms",
    "realtime.max_delay_ms",
    "realtime.jitter_factor",
    "logging.level",
    "logging.directory",
    "logging.json_output",
];

async fn show(config: &ConfigHandle, format: OutputFormat) -> ClResult<()> {
    let cfg = config.read().await;

    match format {
        OutputFormat::Json => {
            let mut map = serde_json::Map::new();
            for key in ALL_KEYS {
                if let Some(value) = get_value(&cfg, key) {
                    map.insert(key.to_string(), serde_json::Value::String(value));
                }
            }
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
        OutputFormat::Text => {
            println!("{}", style("Cargoline configuration").bold());
            for key in ALL_KEYS {
                if let Some(value) = get_value(&cfg, key) {
                    println!("  {} = {}", style(key).cyan(), value);
                }
            }
        }
    }
    Ok(())
}

async fn init(config_path: Option<&Path>) -> ClResult<()> {
    let config = AppConfig::default();
    let path = match config_path {
        Some(path) => {
            config.save_to_file(path)?;
            path.to_path_buf()
        }
        None => {
            config.save_default()?;
            AppConfig::default_config_path()?
        }
    };
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

async fn get(config: &ConfigHandle, key: &str) -> ClResult<()> {
    let cfg = config.read().await;
    match get_value(&cfg, key) {
        Some(value) => {
            println!("{value}");
            Ok(())
        }
        None => Err(ClError::Config(format!("unknown setting: {key}"))),
    }
}

async fn set(
    config: ConfigHandle,
    config_path: Option<&Path>,
    key: &str,
    value: &str,
) -> ClResult<()> {
    {
        let mut cfg = config.write().await;
        match key {
            "server.base_url" => cfg.server.base_url = AppConfig::sanitize_base_url(value),
            "server.auth_token" => {
                cfg.server.auth_token = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            "realtime.max_reconnect_attempts" => {
                cfg.realtime.max_reconnect_attempts = parse(key, value)?
            }
            "realtime.base_delay_ms" => cfg.realtime.base_delay_ms = parse(key, value)?,
            "realtime.max_delay_ms" => cfg.realtime.max_delay_ms = parse(key, value)?,
            "realtime.jitter_factor" => {
                let factor: f64 = parse(key, value)?;
                if !(0.0..=1.0).contains(&factor) {
                    return Err(ClError::Config(
                        "jitter_factor must be between 0.0 and 1.0".into(),
                    ));
                }
                cfg.realtime.jitter_factor = factor;
            }
            "logging.level" => cfg.logging.level = value.to_string(),
            "logging.directory" => cfg.logging.directory = value.to_string(),
            "logging.json_output" => cfg.logging.json_output = parse(key, value)?,
            _ => return Err(ClError::Config(format!("unknown setting: {key}"))),
        }
    }

    match config_path {
        Some(path) => config.read().await.save_to_file(path)?,
        None => config.save().await?,
    }
    println!("Updated {key}");
    Ok(())
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> ClResult<T> {
    value
        .parse()
        .map_err(|_| ClError::Config(format!("invalid value for {key}: {value}")))
}
