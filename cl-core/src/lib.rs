//! Cargoline Core - Foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by all other Cargoline crates:
//! - Application configuration (server URL, auth token, realtime parameters)
//! - Global error types covering all error categories
//! - Structured logging with tracing
//! - Common constants and type aliases

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;

// Re-export commonly used items at the crate root
pub use config::AppConfig;
pub use error::{ClError, ClResult};
pub use logging::init_logging;
