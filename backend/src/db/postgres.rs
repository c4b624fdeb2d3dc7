use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{date_cards, matches, store::DateCardStore};
use crate::error::Result;
use crate::models::{DateCard, DateCardPatch, Match, MatchStatus};

/// `DateCardStore` backed by the `matches` and `date_cards` tables.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DateCardStore for PgStore {
    async fn insert_match(&self, record: &Match) -> Result<(Match, bool)> {
        matches::insert_match(&self.pool, record).await
    }

    async fn get_match(&self, id: &str) -> Result<Option<Match>> {
        matches::get_match(&self.pool, id).await
    }

    async fn set_match_status(&self, id: &str, status: MatchStatus, now: DateTime<Utc>) -> Result<Match> {
        matches::set_match_status(&self.pool, id, status, now).await
    }

    async fn list_matches_for_user(&self, user_id: &str) -> Result<Vec<Match>> {
        matches::list_matches_for_user(&self.pool, user_id).await
    }

    async fn insert_date_card(&self, card: &DateCard) -> Result<()> {
        date_cards::insert_date_card(&self.pool, card).await
    }

    async fn get_date_card(&self, id: Uuid) -> Result<Option<DateCard>> {
        date_cards::get_date_card(&self.pool, id).await
    }

    async fn list_date_cards_for_user(&self, user_id: &str) -> Result<Vec<DateCard>> {
        date_cards::list_date_cards_for_user(&self.pool, user_id).await
    }

    async fn update_date_card(
        &self,
        id: Uuid,
        patch: &DateCardPatch,
        expected_version: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<DateCard> {
        date_cards::update_date_card(&self.pool, id, patch, expected_version, now).await
    }

    async fn list_reveal_due(&self, now: DateTime<Utc>) -> Result<Vec<DateCard>> {
        date_cards::list_reveal_due(&self.pool, now).await
    }

    async fn list_scheduled_before(
        &self,
        cutoff: DateTime<Utc>,
        user_id: Option<&str>,
    ) -> Result<Vec<DateCard>> {
        date_cards::list_scheduled_before(&self.pool, cutoff, user_id).await
    }

    async fn delete_date_card(&self, id: Uuid, expected_version: Option<i64>) -> Result<bool> {
        date_cards::delete_date_card(&self.pool, id, expected_version).await
    }

    async fn replace_date_card(
        &self,
        previous_id: Uuid,
        expected_version: i64,
        replacement: &DateCard,
    ) -> Result<()> {
        date_cards::replace_date_card(&self.pool, previous_id, expected_version, replacement).await
    }
}
