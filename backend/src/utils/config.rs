use anyhow::Result;
use chrono_tz::Tz;
use std::env;
use std::str::FromStr;
use crate::constants::{
    DEFAULT_SERVER_PORT, DEFAULT_TIME_ZONE, EXPIRY_INTERVAL_SECS, REVEAL_INTERVAL_SECS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow::anyhow!("Unknown STORE_BACKEND: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    /// The backend's own in-app inbox
    Store,
    Log,
    Webhook,
}

impl FromStr for NotifierKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "store" => Ok(NotifierKind::Store),
            "log" => Ok(NotifierKind::Log),
            "webhook" => Ok(NotifierKind::Webhook),
            other => Err(anyhow::anyhow!("Unknown NOTIFIER: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub notifier: NotifierKind,
    pub notify_webhook_url: Option<String>,
    pub default_time_zone: Tz,
    pub run_background_jobs: bool,
    pub reveal_interval_secs: u64,
    pub expiry_interval_secs: u64,
    pub allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            port: DEFAULT_SERVER_PORT,
            store_backend: StoreBackend::Memory,
            notifier: NotifierKind::Store,
            notify_webhook_url: None,
            default_time_zone: Tz::UTC,
            run_background_jobs: false,
            reveal_interval_secs: REVEAL_INTERVAL_SECS,
            expiry_interval_secs: EXPIRY_INTERVAL_SECS,
            allowed_origins: Vec::new(),
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend: StoreBackend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;

        let database_url = env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(anyhow::anyhow!("DATABASE_URL must be set"));
        }

        let notifier: NotifierKind = env::var("NOTIFIER")
            .unwrap_or_else(|_| "store".to_string())
            .parse()?;

        let notify_webhook_url = env::var("NOTIFY_WEBHOOK_URL").ok();
        if notifier == NotifierKind::Webhook && notify_webhook_url.is_none() {
            return Err(anyhow::anyhow!("NOTIFY_WEBHOOK_URL must be set when NOTIFIER=webhook"));
        }

        let zone_name = env::var("DEFAULT_TIME_ZONE").unwrap_or_else(|_| DEFAULT_TIME_ZONE.to_string());
        let default_time_zone = zone_name
            .trim()
            .parse::<Tz>()
            .map_err(|_| anyhow::anyhow!("DEFAULT_TIME_ZONE {:?} is not a known time zone", zone_name))?;

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url,
            port: parse_or("PORT", DEFAULT_SERVER_PORT),
            store_backend,
            notifier,
            notify_webhook_url,
            default_time_zone,
            run_background_jobs: parse_or("RUN_BACKGROUND_JOBS", false),
            reveal_interval_secs: parse_or("REVEAL_INTERVAL_SECS", REVEAL_INTERVAL_SECS).max(1),
            expiry_interval_secs: parse_or("EXPIRY_INTERVAL_SECS", EXPIRY_INTERVAL_SECS).max(1),
            allowed_origins,
        })
    }
}
