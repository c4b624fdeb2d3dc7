use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rendezvous::db::MemoryStore;
use rendezvous::error::{DateCardError, Result};
use rendezvous::models::{
    AppealDecision, AppealStatus, DateCard, DateCardPatch, DateProposal, Decision, Match,
    MatchOrigin, MatchStatus,
};
use rendezvous::services::{AppealOutcome, MemoryNotifier, reconcile};
use rendezvous::{DateCardService, DateCardStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

fn at(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

const CREATED: &str = "2025-05-01T12:00:00Z";
const RESOLVED: &str = "2025-05-02T12:00:00Z";

/// Memory store whose card replacement can be made to fail, or can have the
/// other participant respond to the old card right before the swap.
#[derive(Default)]
struct SwapControlledStore {
    inner: MemoryStore,
    fail_replace: AtomicBool,
    respond_before_replace: AtomicBool,
}

#[async_trait]
impl DateCardStore for SwapControlledStore {
    async fn insert_match(&self, record: &Match) -> Result<(Match, bool)> {
        self.inner.insert_match(record).await
    }

    async fn get_match(&self, id: &str) -> Result<Option<Match>> {
        self.inner.get_match(id).await
    }

    async fn set_match_status(&self, id: &str, status: MatchStatus, now: DateTime<Utc>) -> Result<Match> {
        self.inner.set_match_status(id, status, now).await
    }

    async fn list_matches_for_user(&self, user_id: &str) -> Result<Vec<Match>> {
        self.inner.list_matches_for_user(user_id).await
    }

    async fn insert_date_card(&self, card: &DateCard) -> Result<()> {
        self.inner.insert_date_card(card).await
    }

    async fn get_date_card(&self, id: Uuid) -> Result<Option<DateCard>> {
        self.inner.get_date_card(id).await
    }

    async fn list_date_cards_for_user(&self, user_id: &str) -> Result<Vec<DateCard>> {
        self.inner.list_date_cards_for_user(user_id).await
    }

    async fn update_date_card(
        &self,
        id: Uuid,
        patch: &DateCardPatch,
        expected_version: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<DateCard> {
        self.inner.update_date_card(id, patch, expected_version, now).await
    }

    async fn list_reveal_due(&self, now: DateTime<Utc>) -> Result<Vec<DateCard>> {
        self.inner.list_reveal_due(now).await
    }

    async fn list_scheduled_before(
        &self,
        cutoff: DateTime<Utc>,
        user_id: Option<&str>,
    ) -> Result<Vec<DateCard>> {
        self.inner.list_scheduled_before(cutoff, user_id).await
    }

    async fn delete_date_card(&self, id: Uuid, expected_version: Option<i64>) -> Result<bool> {
        self.inner.delete_date_card(id, expected_version).await
    }

    async fn replace_date_card(
        &self,
        previous_id: Uuid,
        expected_version: i64,
        replacement: &DateCard,
    ) -> Result<()> {
        if self.fail_replace.load(Ordering::SeqCst) {
            return Err(DateCardError::StoreUnavailable("connection reset".to_string()));
        }
        if self.respond_before_replace.swap(false, Ordering::SeqCst) {
            let card = self.inner.get_date_card(previous_id).await?.unwrap();
            let patch = reconcile(&card, "u2", Decision::Accept, None, at(RESOLVED))?;
            self.inner
                .update_date_card(previous_id, &patch, None, at(RESOLVED))
                .await?;
        }
        self.inner
            .replace_date_card(previous_id, expected_version, replacement)
            .await
    }
}

/// A pending card for u1/u2 with a pending reschedule requested by u1.
async fn appealed_card(store: Arc<SwapControlledStore>) -> (DateCardService, Uuid) {
    let service = DateCardService::new(store, Arc::new(MemoryNotifier::new()), Tz::UTC);
    let record = service
        .create_match("u1", "u2", MatchOrigin::Admin, at(CREATED))
        .await
        .unwrap();
    let card = service
        .create_date_card(
            &record.id,
            DateProposal {
                scheduled_time: at("2025-06-01T19:00:00Z"),
                time_zone: None,
                location: "Cafe X".to_string(),
                description: "Coffee".to_string(),
                special_instructions: None,
            },
            at(CREATED),
        )
        .await
        .unwrap();
    service
        .request_appeal(card.id, "u1", at("2025-06-05T18:00:00Z"), None, at(CREATED))
        .await
        .unwrap();
    (service, card.id)
}

#[tokio::test]
async fn failed_swap_leaves_the_appeal_open_for_a_retry() {
    let store = Arc::new(SwapControlledStore::default());
    let (service, card_id) = appealed_card(store.clone()).await;

    store.fail_replace.store(true, Ordering::SeqCst);
    let err = service
        .resolve_appeal(card_id, "u2", AppealDecision::Accept, at(RESOLVED))
        .await
        .unwrap_err();
    assert!(matches!(err, DateCardError::StoreUnavailable(_)));

    let untouched = service.get_date_card(card_id).await.unwrap();
    assert_eq!(untouched.appeal_request.unwrap().status, AppealStatus::Pending);
    assert_eq!(store.inner.date_card_count().await, 1);

    store.fail_replace.store(false, Ordering::SeqCst);
    let outcome = service
        .resolve_appeal(card_id, "u2", AppealDecision::Accept, at(RESOLVED))
        .await
        .unwrap();
    let AppealOutcome::Rescheduled(replacement) = outcome else {
        panic!("expected a rescheduled card");
    };
    assert_eq!(replacement.previous_card_id, Some(card_id));

    let live = store.list_date_cards_for_user("u1").await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].id, replacement.id);
}

#[tokio::test]
async fn response_racing_the_swap_never_leaves_two_cards() {
    let store = Arc::new(SwapControlledStore::default());
    let (service, card_id) = appealed_card(store.clone()).await;

    store.respond_before_replace.store(true, Ordering::SeqCst);
    let outcome = service
        .resolve_appeal(card_id, "u2", AppealDecision::Accept, at(RESOLVED))
        .await
        .unwrap();
    let replacement = outcome.into_card();

    let live = store.list_date_cards_for_user("u1").await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].id, replacement.id);
    assert!(store.get_date_card(card_id).await.unwrap().is_none());

    let err = service
        .respond(card_id, "u1", Decision::Accept, None, at(RESOLVED))
        .await
        .unwrap_err();
    assert!(matches!(err, DateCardError::NotFound(_)));
}

#[tokio::test]
async fn replace_refuses_a_stale_version() {
    let store = MemoryStore::new();
    let proposal = DateProposal {
        scheduled_time: at("2025-06-01T19:00:00Z"),
        time_zone: None,
        location: "Cafe X".to_string(),
        description: "Coffee".to_string(),
        special_instructions: None,
    };
    let participants = ["u1".to_string(), "u2".to_string()];
    let original = DateCard::new("u1_u2", participants.clone(), proposal.clone(), Tz::UTC, at(CREATED));
    store.insert_date_card(&original).await.unwrap();

    let replacement = DateCard::new("u1_u2", participants, proposal, Tz::UTC, at(CREATED));
    let err = store
        .replace_date_card(original.id, original.version + 1, &replacement)
        .await
        .unwrap_err();
    assert!(matches!(err, DateCardError::Conflict(_)));
    assert!(store.get_date_card(replacement.id).await.unwrap().is_none());

    let err = store
        .replace_date_card(Uuid::new_v4(), 1, &replacement)
        .await
        .unwrap_err();
    assert!(matches!(err, DateCardError::NotFound(_)));

    store
        .replace_date_card(original.id, original.version, &replacement)
        .await
        .unwrap();
    assert!(store.get_date_card(original.id).await.unwrap().is_none());
    assert_eq!(store.date_card_count().await, 1);
}
