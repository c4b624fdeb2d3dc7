use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::DateCardService;
use crate::constants::{DATES_ANCHOR, MAX_UPDATE_ATTEMPTS};
use crate::error::{DateCardError, Result};
use crate::models::{DateCard, DateCardPatch, DateCardStatus, NotificationKind, NotificationPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RevealOutcome {
    Revealed,
    NotDue,
    AlreadyRevealed,
    NotConfirmed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RevealSummary {
    pub checked: usize,
    pub revealed: usize,
    pub failed: usize,
}

fn revealed_payload(card: &DateCard) -> NotificationPayload {
    NotificationPayload::new(
        NotificationKind::DateRevealed,
        "Date Details Revealed",
        format!("Your date is about to start. Meet at {}.", card.location),
    )
    .with_anchor(DATES_ANCHOR)
}

impl DateCardService {
    /// Flips `is_revealed` once the card is confirmed and its reveal instant
    /// has passed. Idempotent: only the false to true transition notifies.
    pub async fn reveal_if_due(&self, card_id: Uuid, now: DateTime<Utc>) -> Result<(RevealOutcome, DateCard)> {
        for _ in 0..MAX_UPDATE_ATTEMPTS {
            let card = self.get_date_card(card_id).await?;

            if card.status != DateCardStatus::Confirmed || card.is_superseded() {
                return Ok((RevealOutcome::NotConfirmed, card));
            }
            if card.is_revealed {
                return Ok((RevealOutcome::AlreadyRevealed, card));
            }
            if now < card.reveal_at {
                return Ok((RevealOutcome::NotDue, card));
            }

            let patch = DateCardPatch {
                is_revealed: Some(true),
                ..Default::default()
            };
            match self
                .store
                .update_date_card(card_id, &patch, Some(card.version), now)
                .await
            {
                Ok(updated) => {
                    tracing::info!("🔓 Revealed date card {}", card_id);
                    for user_id in &updated.participants {
                        self.notify(user_id, revealed_payload(&updated)).await;
                    }
                    return Ok((RevealOutcome::Revealed, updated));
                }
                Err(DateCardError::Conflict(_)) => {
                    tracing::debug!("Date card {} changed during reveal, re-reading", card_id);
                }
                Err(e) => return Err(e),
            }
        }

        Err(DateCardError::Conflict(card_id.to_string()))
    }

    /// One pass of the reveal scheduler. Failures are logged per card and skipped.
    pub async fn reveal_due_cards(&self, now: DateTime<Utc>) -> Result<RevealSummary> {
        let due = self.store.list_reveal_due(now).await?;
        let mut summary = RevealSummary::default();

        for card in due {
            summary.checked += 1;
            match self.reveal_if_due(card.id, now).await {
                Ok((RevealOutcome::Revealed, _)) => summary.revealed += 1,
                Ok(_) | Err(DateCardError::NotFound(_)) => {}
                Err(e) => {
                    tracing::error!("❌ Failed to reveal date card {}: {}", card.id, e);
                    summary.failed += 1;
                }
            }
        }

        if summary.checked > 0 {
            tracing::info!(
                "🔓 Reveal sweep: {} checked, {} revealed, {} failed",
                summary.checked,
                summary.revealed,
                summary.failed
            );
        }
        Ok(summary)
    }
}
