//! Application-wide constants.

/// Application name.
pub const APP_NAME: &str = "Cargoline";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum number of reconnection attempts before the client gives up.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Base reconnection delay in milliseconds.
pub const DEFAULT_RECONNECT_BASE_DELAY_MS: u64 = 1_000;

/// Maximum reconnection delay cap in milliseconds.
pub const DEFAULT_RECONNECT_MAX_DELAY_MS: u64 = 10_000;

/// Channel name construction.
pub mod channels {
    /// Prefix for per-user private channels.
    pub const USER_PREFIX: &str = "user.";

    /// Prefix for per-company channels.
    pub const COMPANY_PREFIX: &str = "company.";

    /// Build the private channel name for a user.
    pub fn user_channel(user_id: i64) -> String {
        format!("{USER_PREFIX}{user_id}")
    }

    /// Build the channel name for a company.
    pub fn company_channel(company_id: i64) -> String {
        format!("{COMPANY_PREFIX}{company_id}")
    }
}

/// Server-to-client event name constants.
pub mod events {
    pub const ORDER_STATUS: &str = "order.status";
    pub const MESSAGE_NEW: &str = "message.new";
    pub const NOTIFICATION: &str = "notification";
    pub const TRACKING_UPDATE: &str = "tracking.update";
    pub const TENDER_UPDATE: &str = "tender.update";

    /// All event names the client listens for.
    pub const ALL: &[&str] = &[
        ORDER_STATUS,
        MESSAGE_NEW,
        NOTIFICATION,
        TRACKING_UPDATE,
        TENDER_UPDATE,
    ];
}
