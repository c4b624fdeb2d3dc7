use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

use crate::constants::WEBHOOK_TIMEOUT_SECS;
use crate::db::notifications;
use crate::models::{Notification, NotificationPayload};

/// Fire-and-forget delivery of user-facing alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, user_id: &str, payload: &NotificationPayload) -> Result<()>;
}

/// Read side of the in-app notification inbox.
#[async_trait]
pub trait NotificationInbox: Send + Sync {
    async fn list_for_user(&self, user_id: &str) -> crate::error::Result<Vec<Notification>>;

    async fn mark_read(&self, user_id: &str, id: Uuid) -> crate::error::Result<bool>;
}

/// Sends and swallows failures. Delivery is at-most-once.
pub async fn notify_best_effort(notifier: &dyn Notifier, user_id: &str, payload: NotificationPayload) {
    if let Err(e) = notifier.send(user_id, &payload).await {
        tracing::warn!(
            "Failed to deliver {} notification to {}: {}",
            payload.kind.as_str(),
            user_id,
            e
        );
    }
}

/// Writes notifications into the `notifications` table.
#[derive(Debug, Clone)]
pub struct PgNotifier {
    pool: PgPool,
}

impl PgNotifier {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Notifier for PgNotifier {
    async fn send(&self, user_id: &str, payload: &NotificationPayload) -> Result<()> {
        let notification = Notification::from_payload(user_id, payload.clone(), Utc::now());
        notifications::insert_notification(&self.pool, &notification).await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationInbox for PgNotifier {
    async fn list_for_user(&self, user_id: &str) -> crate::error::Result<Vec<Notification>> {
        notifications::list_notifications_for_user(&self.pool, user_id).await
    }

    async fn mark_read(&self, user_id: &str, id: Uuid) -> crate::error::Result<bool> {
        notifications::mark_notification_read(&self.pool, user_id, id).await
    }
}

/// Keeps notifications in memory. Used by tests and the memory backend.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
    fail_sends: bool,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every send fails, for exercising best-effort delivery.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_sends: true,
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn sent_to(&self, user_id: &str) -> Vec<Notification> {
        self.sent()
            .into_iter()
            .filter(|n| n.user_id == user_id)
            .collect()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, user_id: &str, payload: &NotificationPayload) -> Result<()> {
        if self.fail_sends {
            anyhow::bail!("notification sink unavailable");
        }
        let notification = Notification::from_payload(user_id, payload.clone(), Utc::now());
        self.sent
            .lock()
            .map_err(|_| anyhow::anyhow!("notification buffer poisoned"))?
            .push(notification);
        Ok(())
    }
}

#[async_trait]
impl NotificationInbox for MemoryNotifier {
    async fn list_for_user(&self, user_id: &str) -> crate::error::Result<Vec<Notification>> {
        let mut found = self.sent_to(user_id);
        found.reverse();
        Ok(found)
    }

    async fn mark_read(&self, user_id: &str, id: Uuid) -> crate::error::Result<bool> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| crate::error::DateCardError::StoreUnavailable("notification buffer poisoned".into()))?;
        match sent.iter_mut().find(|n| n.id == id && n.user_id == user_id) {
            Some(n) => {
                n.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Only logs. Useful when no delivery channel is configured.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, user_id: &str, payload: &NotificationPayload) -> Result<()> {
        tracing::info!("🔔 [{}] {} -> {}: {}", payload.kind.as_str(), user_id, payload.title, payload.body);
        Ok(())
    }
}

/// Posts each notification as JSON to an external push service.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, user_id: &str, payload: &NotificationPayload) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({
                "userId": user_id,
                "title": payload.title,
                "body": payload.body,
                "type": payload.kind,
                "anchor": payload.anchor,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("webhook responded with {}", response.status());
        }
        Ok(())
    }
}
