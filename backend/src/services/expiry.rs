use chrono::{DateTime, Utc};

use super::DateCardService;
use crate::constants::DATES_ANCHOR;
use crate::error::Result;
use crate::models::{DateCard, DateCardStatus, NotificationKind, NotificationPayload};

fn lapsed_payload(card: &DateCard) -> NotificationPayload {
    NotificationPayload::new(
        NotificationKind::DateExpired,
        "Date Expired",
        format!(
            "The date proposed for {} passed before both of you responded.",
            card.scheduled_time.with_timezone(&card.zone()).format("%b %-d")
        ),
    )
    .with_anchor(DATES_ANCHOR)
}

impl DateCardService {
    /// Deletes cards whose local calendar day has ended, for one user or for everyone.
    ///
    /// Cards still pending when they lapse are deleted like any other, and
    /// both participants are told the proposal expired.
    pub async fn sweep_expired(&self, user_id: Option<&str>, now: DateTime<Utc>) -> Result<usize> {
        let candidates = self.store.list_scheduled_before(now, user_id).await?;
        let mut removed = 0;

        for card in candidates.into_iter().filter(|c| c.is_expired(now)) {
            match self.store.delete_date_card(card.id, None).await {
                Ok(true) => {
                    removed += 1;
                    tracing::debug!("🧹 Removed expired date card {} ({})", card.id, card.status);
                    if card.status == DateCardStatus::Pending {
                        for participant in &card.participants {
                            self.notify(participant, lapsed_payload(&card)).await;
                        }
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!("❌ Failed to remove expired date card {}: {}", card.id, e);
                }
            }
        }

        if removed > 0 {
            tracing::info!(
                "🧹 Cleaned up {} expired date cards{}",
                removed,
                user_id.map(|u| format!(" for {}", u)).unwrap_or_default()
            );
        }
        Ok(removed)
    }
}
