use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use super::DateCardService;
use crate::error::{DateCardError, Result};
use crate::models::{DateCard, DateCardPatch, DateProposal, MatchStatus};

impl DateCardService {
    /// Proposes a date for an active match. Both responses start pending.
    pub async fn create_date_card(
        &self,
        match_id: &str,
        proposal: DateProposal,
        now: DateTime<Utc>,
    ) -> Result<DateCard> {
        let record = self
            .store
            .get_match(match_id)
            .await?
            .ok_or_else(|| DateCardError::MatchNotFound(match_id.to_string()))?;

        if record.status != MatchStatus::Active {
            return Err(DateCardError::MatchInactive(record.id));
        }

        if proposal.scheduled_time <= now {
            return Err(DateCardError::InvalidSchedule(format!(
                "scheduled time {} is not in the future",
                proposal.scheduled_time.to_rfc3339()
            )));
        }

        let zone = self.resolve_zone(proposal.time_zone.as_deref())?;
        let card = DateCard::new(&record.id, record.participants.clone(), proposal, zone, now);
        self.store.insert_date_card(&card).await?;

        tracing::info!(
            "📅 Created date card {} for match {} at {} ({})",
            card.id,
            card.match_id,
            card.scheduled_time.to_rfc3339(),
            card.time_zone
        );
        Ok(card)
    }

    pub async fn get_date_card(&self, id: Uuid) -> Result<DateCard> {
        self.store
            .get_date_card(id)
            .await?
            .ok_or_else(|| DateCardError::NotFound(format!("Date card {}", id)))
    }

    /// Every card the user participates in, soonest first, after removing the
    /// user's expired cards. A failed sweep does not hide the listing.
    pub async fn get_date_cards_for_user(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<DateCard>> {
        if let Err(e) = self.sweep_expired(Some(user_id), now).await {
            tracing::warn!("Expiry sweep for {} failed before listing: {}", user_id, e);
        }
        self.store.list_date_cards_for_user(user_id).await
    }

    /// Partial update through the store's atomic primitive. Fails with
    /// `Conflict` if the card moved past `expected_version`.
    pub async fn update_date_card(
        &self,
        id: Uuid,
        patch: &DateCardPatch,
        expected_version: i64,
        now: DateTime<Utc>,
    ) -> Result<DateCard> {
        self.store
            .update_date_card(id, patch, Some(expected_version), now)
            .await
    }

    pub(crate) fn resolve_zone(&self, requested: Option<&str>) -> Result<Tz> {
        match requested.map(str::trim).filter(|z| !z.is_empty()) {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| DateCardError::InvalidSchedule(format!("unknown time zone {:?}", name))),
            None => Ok(self.default_zone),
        }
    }
}
