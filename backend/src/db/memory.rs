use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::DateCardStore;
use crate::error::{DateCardError, Result};
use crate::models::{DateCard, DateCardPatch, DateCardStatus, Match, MatchStatus};

#[derive(Debug, Default)]
struct Collections {
    matches: HashMap<String, Match>,
    date_cards: HashMap<Uuid, DateCard>,
}

/// In-process `DateCardStore` for tests and local development.
///
/// A single lock guards both collections, so every update is a linearizable
/// read-modify-write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn date_card_count(&self) -> usize {
        self.inner.read().await.date_cards.len()
    }
}

fn sorted_by_schedule(mut cards: Vec<DateCard>) -> Vec<DateCard> {
    cards.sort_by(|a, b| {
        a.scheduled_time
            .cmp(&b.scheduled_time)
            .then(a.created_at.cmp(&b.created_at))
    });
    cards
}

#[async_trait]
impl DateCardStore for MemoryStore {
    async fn insert_match(&self, record: &Match) -> Result<(Match, bool)> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.matches.get(&record.id) {
            return Ok((existing.clone(), false));
        }
        inner.matches.insert(record.id.clone(), record.clone());
        Ok((record.clone(), true))
    }

    async fn get_match(&self, id: &str) -> Result<Option<Match>> {
        Ok(self.inner.read().await.matches.get(id).cloned())
    }

    async fn set_match_status(&self, id: &str, status: MatchStatus, now: DateTime<Utc>) -> Result<Match> {
        let mut inner = self.inner.write().await;
        let record = inner
            .matches
            .get_mut(id)
            .ok_or_else(|| DateCardError::MatchNotFound(id.to_string()))?;
        record.status = status;
        record.updated_at = now;
        Ok(record.clone())
    }

    async fn list_matches_for_user(&self, user_id: &str) -> Result<Vec<Match>> {
        let inner = self.inner.read().await;
        let mut found: Vec<Match> = inner
            .matches
            .values()
            .filter(|m| m.is_participant(user_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn insert_date_card(&self, card: &DateCard) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.date_cards.contains_key(&card.id) {
            return Err(DateCardError::Conflict(card.id.to_string()));
        }
        inner.date_cards.insert(card.id, card.clone());
        Ok(())
    }

    async fn get_date_card(&self, id: Uuid) -> Result<Option<DateCard>> {
        Ok(self.inner.read().await.date_cards.get(&id).cloned())
    }

    async fn list_date_cards_for_user(&self, user_id: &str) -> Result<Vec<DateCard>> {
        let inner = self.inner.read().await;
        let cards = inner
            .date_cards
            .values()
            .filter(|c| c.is_participant(user_id))
            .cloned()
            .collect();
        Ok(sorted_by_schedule(cards))
    }

    async fn update_date_card(
        &self,
        id: Uuid,
        patch: &DateCardPatch,
        expected_version: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<DateCard> {
        let mut inner = self.inner.write().await;
        let card = inner
            .date_cards
            .get_mut(&id)
            .ok_or_else(|| DateCardError::NotFound(format!("Date card {}", id)))?;

        if expected_version.is_some_and(|v| v != card.version) {
            return Err(DateCardError::Conflict(id.to_string()));
        }

        patch.apply_to(card, now);
        Ok(card.clone())
    }

    async fn list_reveal_due(&self, now: DateTime<Utc>) -> Result<Vec<DateCard>> {
        let inner = self.inner.read().await;
        let mut due: Vec<DateCard> = inner
            .date_cards
            .values()
            .filter(|c| c.status == DateCardStatus::Confirmed && !c.is_revealed && c.reveal_at <= now)
            .cloned()
            .collect();
        due.sort_by_key(|c| c.reveal_at);
        Ok(due)
    }

    async fn list_scheduled_before(
        &self,
        cutoff: DateTime<Utc>,
        user_id: Option<&str>,
    ) -> Result<Vec<DateCard>> {
        let inner = self.inner.read().await;
        let cards = inner
            .date_cards
            .values()
            .filter(|c| c.scheduled_time < cutoff)
            .filter(|c| user_id.is_none_or(|u| c.is_participant(u)))
            .cloned()
            .collect();
        Ok(sorted_by_schedule(cards))
    }

    async fn delete_date_card(&self, id: Uuid, expected_version: Option<i64>) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let matches_version = match inner.date_cards.get(&id) {
            Some(card) => expected_version.is_none_or(|v| v == card.version),
            None => return Ok(false),
        };
        if matches_version {
            inner.date_cards.remove(&id);
        }
        Ok(matches_version)
    }

    async fn replace_date_card(
        &self,
        previous_id: Uuid,
        expected_version: i64,
        replacement: &DateCard,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.date_cards.get(&previous_id) {
            None => return Err(DateCardError::NotFound(format!("Date card {}", previous_id))),
            Some(card) if card.version != expected_version => {
                return Err(DateCardError::Conflict(previous_id.to_string()));
            }
            Some(_) => {}
        }
        if inner.date_cards.contains_key(&replacement.id) {
            return Err(DateCardError::Conflict(replacement.id.to_string()));
        }
        inner.date_cards.remove(&previous_id);
        inner.date_cards.insert(replacement.id, replacement.clone());
        Ok(())
    }
}
