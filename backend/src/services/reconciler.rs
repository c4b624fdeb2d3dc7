use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::DateCardService;
use crate::constants::{DATES_ANCHOR, MAX_DECLINE_REASON_CHARS, MAX_UPDATE_ATTEMPTS};
use crate::error::{DateCardError, Result};
use crate::models::{
    DateCard, DateCardPatch, DateCardStatus, Decision, MatchStatus, NotificationKind,
    NotificationPayload, ParticipantResponse, ResponseStatus,
};

/// Derives the patch produced by `user_id` deciding on `card`.
///
/// This is the only place the overall status is computed from responses:
/// a decline cancels the card outright, and an accept confirms it only when
/// the other participant has already accepted.
pub fn reconcile(
    card: &DateCard,
    user_id: &str,
    decision: Decision,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<DateCardPatch> {
    let other = card
        .other_participant(user_id)
        .ok_or_else(|| DateCardError::NotAuthorized {
            card_id: card.id.to_string(),
            user_id: user_id.to_string(),
        })?;

    if card.is_resolved() || card.is_superseded() {
        return Err(DateCardError::AlreadyResolved(card.id.to_string()));
    }

    let mut responses = card.responses.clone();
    responses.retain(|participant, _| card.is_participant(participant));
    responses.insert(
        user_id.to_string(),
        ParticipantResponse {
            status: decision.response_status(),
            responded_at: Some(now),
            decline_reason: match decision {
                Decision::Decline => reason.map(str::to_string),
                Decision::Accept => None,
            },
        },
    );

    let mut patch = DateCardPatch {
        responses: Some(responses),
        ..Default::default()
    };

    match decision {
        Decision::Decline => {
            patch.status = Some(DateCardStatus::Cancelled);
            patch.cancelled_at = Some(now);
        }
        Decision::Accept => {
            if card.response_status(other) == ResponseStatus::Accepted {
                patch.status = Some(DateCardStatus::Confirmed);
                patch.confirmed_at = Some(now);
            }
        }
    }

    Ok(patch)
}

/// Trims the reason, drops it when empty, and caps its length.
fn normalize_reason(reason: Option<String>) -> Option<String> {
    let trimmed = reason?.trim().to_string();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_DECLINE_REASON_CHARS).collect())
}

fn response_payload(card: &DateCard, decision: Decision, reason: Option<&str>) -> NotificationPayload {
    let payload = match (decision, card.status) {
        (Decision::Decline, _) => NotificationPayload::new(
            NotificationKind::DateDeclined,
            "Date Response",
            match reason {
                Some(reason) => format!("Your match declined the date: \"{}\"", reason),
                None => "Your match declined the date.".to_string(),
            },
        ),
        (Decision::Accept, DateCardStatus::Confirmed) => NotificationPayload::new(
            NotificationKind::DateConfirmed,
            "Date Confirmed!",
            "Your date is confirmed. Details unlock shortly before you meet.",
        ),
        (Decision::Accept, _) => NotificationPayload::new(
            NotificationKind::DateAccepted,
            "Date Accepted!",
            "Your match accepted the date! Check your dates tab.",
        ),
    };
    payload.with_anchor(DATES_ANCHOR)
}

impl DateCardService {
    /// Applies a participant's accept/decline and recomputes the card status.
    ///
    /// The write is a compare-and-swap on the card version. Losing a race
    /// re-reads and re-validates the card, so a concurrent accept from the
    /// other side is always observed and a resolved card is never rewritten.
    pub async fn respond(
        &self,
        card_id: Uuid,
        user_id: &str,
        decision: Decision,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<DateCard> {
        let reason = normalize_reason(reason);
        let mut match_checked = false;

        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let card = self.get_date_card(card_id).await?;

            let patch = match reconcile(&card, user_id, decision, reason.as_deref(), now) {
                Ok(patch) => patch,
                Err(e @ DateCardError::NotAuthorized { .. }) => {
                    tracing::warn!("🚫 Rejected response from non-participant: {}", e);
                    return Err(e);
                }
                Err(e) => return Err(e),
            };

            if !match_checked {
                self.ensure_match_open(&card.match_id).await?;
                match_checked = true;
            }

            match self
                .store
                .update_date_card(card_id, &patch, Some(card.version), now)
                .await
            {
                Ok(updated) => {
                    tracing::info!(
                        "💌 {} {:?} date card {} -> {}",
                        user_id,
                        decision,
                        card_id,
                        updated.status
                    );
                    if let Some(other) = updated.other_participant(user_id) {
                        self.notify(other, response_payload(&updated, decision, reason.as_deref()))
                            .await;
                    }
                    return Ok(updated);
                }
                Err(DateCardError::Conflict(_)) => {
                    tracing::debug!(
                        "Date card {} changed under response from {} (attempt {}), re-reading",
                        card_id,
                        user_id,
                        attempt
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(DateCardError::Conflict(card_id.to_string()))
    }

    /// A missing match record does not block responses; a blocked one does.
    pub(super) async fn ensure_match_open(&self, match_id: &str) -> Result<()> {
        match self.store.get_match(match_id).await? {
            Some(record) if record.status == MatchStatus::Blocked => {
                Err(DateCardError::MatchInactive(record.id))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppealRequest, AppealStatus, DateProposal};

    fn now() -> DateTime<Utc> {
        "2025-05-01T12:00:00Z".parse().unwrap()
    }

    fn pending_card() -> DateCard {
        DateCard::new(
            "u1_u2",
            ["u1".to_string(), "u2".to_string()],
            DateProposal {
                scheduled_time: "2025-06-01T19:00:00Z".parse().unwrap(),
                time_zone: None,
                location: "Cafe X".to_string(),
                description: "Coffee".to_string(),
                special_instructions: None,
            },
            chrono_tz::Tz::UTC,
            now(),
        )
    }

    fn applied(card: &mut DateCard, user: &str, decision: Decision, reason: Option<&str>) {
        let patch = reconcile(card, user, decision, reason, now()).unwrap();
        patch.apply_to(card, now());
    }

    #[test]
    fn test_single_accept_stays_pending() {
        let mut card = pending_card();
        applied(&mut card, "u1", Decision::Accept, None);

        assert_eq!(card.status, DateCardStatus::Pending);
        assert_eq!(card.response_status("u1"), ResponseStatus::Accepted);
        assert_eq!(card.response_status("u2"), ResponseStatus::Pending);
        assert!(card.confirmed_at.is_none());
    }

    #[test]
    fn test_both_accepts_confirm() {
        let mut card = pending_card();
        applied(&mut card, "u1", Decision::Accept, None);
        applied(&mut card, "u2", Decision::Accept, None);

        assert_eq!(card.status, DateCardStatus::Confirmed);
        assert_eq!(card.confirmed_at, Some(now()));
    }

    #[test]
    fn test_decline_vetoes_regardless_of_other_response() {
        for other_first in [None, Some(Decision::Accept)] {
            let mut card = pending_card();
            if let Some(decision) = other_first {
                applied(&mut card, "u1", decision, None);
            }
            applied(&mut card, "u2", Decision::Decline, Some("schedule conflict"));

            assert_eq!(card.status, DateCardStatus::Cancelled);
            assert_eq!(card.cancelled_at, Some(now()));
            assert_eq!(
                card.responses["u2"].decline_reason.as_deref(),
                Some("schedule conflict")
            );
        }
    }

    #[test]
    fn test_resolved_card_rejects_responses() {
        let mut card = pending_card();
        applied(&mut card, "u2", Decision::Decline, None);

        let err = reconcile(&card, "u1", Decision::Accept, None, now()).unwrap_err();
        assert!(matches!(err, DateCardError::AlreadyResolved(_)));
    }

    #[test]
    fn test_non_participant_is_not_authorized() {
        let card = pending_card();
        let err = reconcile(&card, "intruder", Decision::Accept, None, now()).unwrap_err();
        assert!(matches!(err, DateCardError::NotAuthorized { .. }));
    }

    #[test]
    fn test_second_call_from_same_user_wins_while_pending() {
        let mut card = pending_card();
        applied(&mut card, "u1", Decision::Accept, None);
        applied(&mut card, "u1", Decision::Decline, None);

        assert_eq!(card.status, DateCardStatus::Cancelled);
        assert_eq!(card.response_status("u1"), ResponseStatus::Declined);
    }

    #[test]
    fn test_accept_drops_reason() {
        let card = pending_card();
        let patch = reconcile(&card, "u1", Decision::Accept, Some("ignored"), now()).unwrap();
        let responses = patch.responses.unwrap();
        assert!(responses["u1"].decline_reason.is_none());
        assert_eq!(responses.len(), 2);
    }

    #[test]
    fn test_superseded_card_rejects_responses() {
        let mut card = pending_card();
        card.appeal_request = Some(AppealRequest {
            requested_by: "u1".to_string(),
            proposed_time: "2025-06-05T19:00:00Z".parse().unwrap(),
            proposed_location: None,
            status: AppealStatus::Accepted,
            created_at: now(),
        });

        let err = reconcile(&card, "u2", Decision::Accept, None, now()).unwrap_err();
        assert!(matches!(err, DateCardError::AlreadyResolved(_)));
    }

    #[test]
    fn test_normalize_reason() {
        assert_eq!(normalize_reason(None), None);
        assert_eq!(normalize_reason(Some("   ".to_string())), None);
        assert_eq!(normalize_reason(Some("  busy ".to_string())), Some("busy".to_string()));
        let long = "x".repeat(MAX_DECLINE_REASON_CHARS + 20);
        assert_eq!(
            normalize_reason(Some(long)).map(|r| r.chars().count()),
            Some(MAX_DECLINE_REASON_CHARS)
        );
    }
}
