// =============================================================================
// Rendezvous Backend Constants
// =============================================================================
// This file contains all constants used throughout the backend to enable
// easy tuning and configuration from a single location.

// =============================================================================
// MATCH REGISTRY
// =============================================================================

/// Separator placed between the two sorted user ids of a match id
pub const MATCH_ID_SEPARATOR: &str = "_";

// =============================================================================
// DATE CARD LIFECYCLE
// =============================================================================

/// How long before the scheduled time the date details are revealed
pub const REVEAL_LEAD_MINUTES: i64 = 10;

/// Maximum characters kept from a decline reason
pub const MAX_DECLINE_REASON_CHARS: usize = 500;

/// How many times a card mutation re-reads the card after losing a version race
pub const MAX_UPDATE_ATTEMPTS: usize = 5;

/// Time zone used when a proposal does not name one
pub const DEFAULT_TIME_ZONE: &str = "UTC";

// =============================================================================
// BACKGROUND JOBS
// =============================================================================

/// How often the reveal sweep runs
pub const REVEAL_INTERVAL_SECS: u64 = 30;

/// How often the expiry sweep runs
pub const EXPIRY_INTERVAL_SECS: u64 = 300;

/// Back-off after a failed background iteration
pub const BACKGROUND_RETRY_DELAY_SECS: u64 = 5;

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// In-app anchor for everything date related
pub const DATES_ANCHOR: &str = "/dates";

/// In-app anchor for the matches tab
pub const MATCHES_ANCHOR: &str = "/matches";

/// Timeout for webhook notification delivery
pub const WEBHOOK_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// SERVER CONFIGURATION
// =============================================================================

/// Default server port if not specified in environment
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Default database pool size
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Seconds to wait for a pooled connection before failing the request
pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// LOGGING
// =============================================================================

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str =
    "rendezvous=info,tower_http=debug,server=debug,date_card_worker=debug,maintenance=info,migrate=info";
