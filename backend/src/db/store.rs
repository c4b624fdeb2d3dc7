use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{DateCard, DateCardPatch, Match, MatchStatus};

/// Durable storage for matches and date cards.
///
/// `update_date_card` is the only way a stored card changes. Implementations
/// must apply the patch atomically and, when `expected_version` is given, only
/// if the stored version still matches (returning `DateCardError::Conflict`
/// otherwise). Every successful update bumps `version` and `updated_at`.
#[async_trait]
pub trait DateCardStore: Send + Sync {
    /// Inserts the match unless a record with the same id exists.
    /// Returns the stored record and whether this call created it.
    async fn insert_match(&self, record: &Match) -> Result<(Match, bool)>;

    async fn get_match(&self, id: &str) -> Result<Option<Match>>;

    async fn set_match_status(&self, id: &str, status: MatchStatus, now: DateTime<Utc>) -> Result<Match>;

    async fn list_matches_for_user(&self, user_id: &str) -> Result<Vec<Match>>;

    async fn insert_date_card(&self, card: &DateCard) -> Result<()>;

    async fn get_date_card(&self, id: Uuid) -> Result<Option<DateCard>>;

    /// All cards the user participates in, ordered by scheduled time ascending.
    async fn list_date_cards_for_user(&self, user_id: &str) -> Result<Vec<DateCard>>;

    async fn update_date_card(
        &self,
        id: Uuid,
        patch: &DateCardPatch,
        expected_version: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<DateCard>;

    /// Confirmed, not yet revealed cards whose reveal instant has passed.
    async fn list_reveal_due(&self, now: DateTime<Utc>) -> Result<Vec<DateCard>>;

    /// Cards scheduled strictly before `cutoff`, optionally limited to one participant.
    async fn list_scheduled_before(
        &self,
        cutoff: DateTime<Utc>,
        user_id: Option<&str>,
    ) -> Result<Vec<DateCard>>;

    /// Deletes the card. Returns false when it was already gone or its version moved on.
    async fn delete_date_card(&self, id: Uuid, expected_version: Option<i64>) -> Result<bool>;

    /// Atomically removes `previous_id` and stores `replacement` in its place.
    /// Nothing is written unless the stored card is still at `expected_version`:
    /// a moved version yields `Conflict`, a missing card `NotFound`.
    async fn replace_date_card(
        &self,
        previous_id: Uuid,
        expected_version: i64,
        replacement: &DateCard,
    ) -> Result<()>;
}
