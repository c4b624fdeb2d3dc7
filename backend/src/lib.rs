pub mod constants;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;
pub mod worker;

pub use db::{DateCardStore, get_db_pool};
pub use error::DateCardError;
pub use services::DateCardService;
pub use state::AppState;
pub use utils::config::Config;

// Re-export common types
pub use anyhow::Result;
pub use chrono::{DateTime, Utc};
pub use uuid::Uuid;
