use anyhow::Result;
use std::sync::Arc;

use crate::db::{DatabaseConfig, DateCardStore, MemoryStore, PgStore, get_db_pool, migrations};
use crate::services::notifier::Notifier;
use crate::services::{
    DateCardService, LogNotifier, MemoryNotifier, NotificationInbox, PgNotifier, WebhookNotifier,
};
use crate::utils::{Config, NotifierKind, StoreBackend};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: DateCardService,
    pub inbox: Arc<dyn NotificationInbox>,
    pub config: Config,
}

impl AppState {
    /// Connects the configured backend and notifier. Runs migrations for postgres.
    pub async fn from_config(config: Config) -> Result<Self> {
        let (store, inbox) = match config.store_backend {
            StoreBackend::Postgres => {
                let db_config = DatabaseConfig::from_env()?;
                let pool = get_db_pool(&db_config).await?;
                migrations::run_migrations(&pool).await?;
                let store: Arc<dyn DateCardStore> = Arc::new(PgStore::new(pool.clone()));
                let inbox: Arc<dyn InboxNotifier> = Arc::new(PgNotifier::new(pool));
                (store, inbox)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; data is lost on restart");
                let store: Arc<dyn DateCardStore> = Arc::new(MemoryStore::new());
                let inbox: Arc<dyn InboxNotifier> = Arc::new(MemoryNotifier::new());
                (store, inbox)
            }
        };

        let notifier: Arc<dyn Notifier> = match config.notifier {
            NotifierKind::Store => inbox.clone().as_notifier(),
            NotifierKind::Log => Arc::new(LogNotifier),
            NotifierKind::Webhook => {
                let url = config
                    .notify_webhook_url
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("NOTIFY_WEBHOOK_URL must be set"))?;
                Arc::new(WebhookNotifier::new(url)?)
            }
        };

        Ok(Self {
            service: DateCardService::new(store, notifier, config.default_time_zone),
            inbox: inbox.as_inbox(),
            config,
        })
    }

    /// Memory-backed state whose notifier doubles as the inbox.
    pub fn in_memory(config: Config) -> (Self, Arc<MemoryStore>, Arc<MemoryNotifier>) {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(MemoryNotifier::new());
        let state = Self {
            service: DateCardService::new(store.clone(), notifier.clone(), config.default_time_zone),
            inbox: notifier.clone(),
            config,
        };
        (state, store, notifier)
    }
}

/// A sink that also serves the inbox it writes to.
trait InboxNotifier: Notifier + NotificationInbox {
    fn as_notifier(self: Arc<Self>) -> Arc<dyn Notifier>;
    fn as_inbox(self: Arc<Self>) -> Arc<dyn NotificationInbox>;
}

impl<T: Notifier + NotificationInbox + 'static> InboxNotifier for T {
    fn as_notifier(self: Arc<Self>) -> Arc<dyn Notifier> {
        self
    }

    fn as_inbox(self: Arc<Self>) -> Arc<dyn NotificationInbox> {
        self
    }
}
