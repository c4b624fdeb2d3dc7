use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{DateCardError, Result};
use crate::models::Notification;

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: String,
    title: String,
    body: String,
    kind: String,
    anchor: Option<String>,
    read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = DateCardError;

    fn try_from(row: NotificationRow) -> Result<Self> {
        let kind = row.kind.parse().map_err(|e: String| {
            DateCardError::StoreUnavailable(format!("malformed notification row {}: {}", row.id, e))
        })?;

        Ok(Notification {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            body: row.body,
            kind,
            anchor: row.anchor,
            read: row.read,
            created_at: row.created_at,
        })
    }
}

pub async fn insert_notification(pool: &PgPool, notification: &Notification) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO notifications (id, user_id, title, body, kind, anchor, read, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(notification.id)
    .bind(&notification.user_id)
    .bind(&notification.title)
    .bind(&notification.body)
    .bind(notification.kind.as_str())
    .bind(&notification.anchor)
    .bind(notification.read)
    .bind(notification.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_notifications_for_user(pool: &PgPool, user_id: &str) -> Result<Vec<Notification>> {
    let rows = sqlx::query_as::<_, NotificationRow>(
        r#"
        SELECT id, user_id, title, body, kind, anchor, read, created_at
        FROM notifications
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Notification::try_from).collect()
}

pub async fn mark_notification_read(pool: &PgPool, user_id: &str, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE notifications
        SET read = TRUE
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
