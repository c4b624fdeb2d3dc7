use chrono::{DateTime, Utc};

use super::DateCardService;
use crate::constants::{MATCHES_ANCHOR, MATCH_ID_SEPARATOR};
use crate::error::{DateCardError, Result};
use crate::models::{Match, MatchOrigin, MatchStatus, NotificationKind, NotificationPayload};

/// Deterministic match id: the sorted pair joined by the separator.
pub fn match_id_for(user_a: &str, user_b: &str) -> String {
    let mut pair = [user_a, user_b];
    pair.sort_unstable();
    pair.join(MATCH_ID_SEPARATOR)
}

fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty() {
        return Err(DateCardError::InvalidParticipants("user id must not be empty".to_string()));
    }
    if user_id.contains(MATCH_ID_SEPARATOR) {
        return Err(DateCardError::InvalidParticipants(format!(
            "user id {:?} must not contain {:?}",
            user_id, MATCH_ID_SEPARATOR
        )));
    }
    Ok(())
}

fn new_match_payload() -> NotificationPayload {
    NotificationPayload::new(
        NotificationKind::Match,
        "New Match!",
        "You've matched with someone new.",
    )
    .with_anchor(MATCHES_ANCHOR)
}

impl DateCardService {
    /// Idempotent: the same pair, in either order, always resolves to one record.
    pub async fn create_match(
        &self,
        user_a: &str,
        user_b: &str,
        created_by: MatchOrigin,
        now: DateTime<Utc>,
    ) -> Result<Match> {
        let (user_a, user_b) = (user_a.trim(), user_b.trim());
        validate_user_id(user_a)?;
        validate_user_id(user_b)?;
        if user_a == user_b {
            return Err(DateCardError::InvalidParticipants(format!(
                "cannot match user {} with themselves",
                user_a
            )));
        }

        let mut participants = [user_a.to_string(), user_b.to_string()];
        participants.sort();
        let candidate = Match {
            id: match_id_for(user_a, user_b),
            participants,
            status: MatchStatus::Active,
            created_by,
            created_at: now,
            updated_at: now,
        };

        let (stored, created) = self.store.insert_match(&candidate).await?;
        if created {
            tracing::info!("💞 Created match {}", stored.id);
            self.notify_new_match(&stored).await;
            return Ok(stored);
        }

        match stored.status {
            MatchStatus::Active => {
                tracing::debug!("Match {} already active, returning existing record", stored.id);
                Ok(stored)
            }
            MatchStatus::Ended => {
                let reopened = self
                    .store
                    .set_match_status(&stored.id, MatchStatus::Active, now)
                    .await?;
                tracing::info!("🔁 Reactivated ended match {}", reopened.id);
                self.notify_new_match(&reopened).await;
                Ok(reopened)
            }
            MatchStatus::Blocked => Err(DateCardError::MatchInactive(stored.id)),
        }
    }

    pub async fn get_match(&self, id: &str) -> Result<Match> {
        self.store
            .get_match(id)
            .await?
            .ok_or_else(|| DateCardError::MatchNotFound(id.to_string()))
    }

    pub async fn get_matches_for_user(&self, user_id: &str) -> Result<Vec<Match>> {
        self.store.list_matches_for_user(user_id).await
    }

    async fn notify_new_match(&self, record: &Match) {
        for user_id in &record.participants {
            self.notify(user_id, new_match_payload()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_id_is_order_independent() {
        assert_eq!(match_id_for("alice", "bob"), "alice_bob");
        assert_eq!(match_id_for("bob", "alice"), "alice_bob");
    }

    #[test]
    fn test_validate_user_id_rejects_separator_and_empty() {
        assert!(validate_user_id("abc123").is_ok());
        assert!(matches!(
            validate_user_id(""),
            Err(DateCardError::InvalidParticipants(_))
        ));
        assert!(matches!(
            validate_user_id("a_b"),
            Err(DateCardError::InvalidParticipants(_))
        ));
    }
}
