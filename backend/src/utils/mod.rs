pub mod config;
pub mod logging;

pub use config::{Config, NotifierKind, StoreBackend};
pub use logging::init_logging;
