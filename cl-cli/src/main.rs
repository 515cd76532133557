//! Cargoline CLI - command-line tooling for the realtime sync client.
//!
//! Drives the synchronization pipeline from the terminal: inspect and edit
//! configuration, list the routed event catalog, and replay event scripts
//! through the full client stack for debugging without a live server.

mod commands;

use std::path::Path;

use clap::{Parser, Subcommand};
use tracing::info;

use cl_core::config::{AppConfig, ConfigHandle};
use cl_core::error::ClResult;
use cl_core::logging;

/// Cargoline - logistics marketplace realtime sync client.
#[derive(Parser)]
#[command(
    name = "cargoline",
    version,
    about = "Cargoline realtime sync CLI",
    long_about = "Command-line tooling for the Cargoline realtime synchronization client.\n\
                  Inspect configuration, list routed events, and replay event scripts\n\
                  through the full pipeline for debugging."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json).
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for scripting.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// View and modify configuration.
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// List the server events the client routes and their local effects.
    Events,
    /// Replay an event script through the full sync pipeline.
    Simulate {
        /// User id to mount the session for.
        #[arg(short, long, default_value = "1")]
        user: i64,
        /// Optional company id for the session.
        #[arg(long)]
        company: Option<i64>,
        /// Path to a JSON event script; omit for the built-in demo script.
        #[arg(short, long)]
        script: Option<String>,
        /// Drop the connection mid-script to exercise resync.
        #[arg(long)]
        drop_connection: bool,
    },
}

#[tokio::main]
async fn main() -> ClResult<()> {
    let cli = Cli::parse();

    let config_path = cli.config.as_deref().map(Path::new);
    let config = if let Some(path) = config_path {
        AppConfig::load_from_file(path)?
    } else {
        AppConfig::load_default()?
    };

    let log_level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let log_dir = config.effective_log_dir()?;
    let _guard = logging::init_logging(log_level, &log_dir, config.logging.json_output)?;

    let config_handle = ConfigHandle::new(config);

    info!("Cargoline CLI v{}", cl_core::constants::APP_VERSION);

    match cli.command {
        Commands::Config { action } => {
            commands::config::run(config_handle, config_path, action, cli.format).await
        }
        Commands::Events => commands::events::run(cli.format),
        Commands::Simulate {
            user,
            company,
            script,
            drop_connection,
        } => {
            commands::simulate::run(
                config_handle,
                user,
                company,
                script.as_deref(),
                drop_connection,
                cli.format,
            )
            .await
        }
    }
}
