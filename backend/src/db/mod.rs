pub mod connection;
pub mod date_cards;
pub mod matches;
pub mod memory;
pub mod migrations;
pub mod notifications;
pub mod postgres;
pub mod store;

pub use connection::{get_db_pool, DatabaseConfig};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::DateCardStore;
