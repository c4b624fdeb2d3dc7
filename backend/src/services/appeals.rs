use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::DateCardService;
use crate::constants::{DATES_ANCHOR, MAX_UPDATE_ATTEMPTS};
use crate::error::{DateCardError, Result};
use crate::models::{
    AppealDecision, AppealRequest, AppealStatus, DateCard, DateCardPatch, DateCardStatus,
    DateProposal, NotificationKind, NotificationPayload,
};

/// Result of resolving a reschedule request.
#[derive(Debug, Clone, PartialEq)]
pub enum AppealOutcome {
    /// The original card, with the request marked rejected.
    Rejected(DateCard),
    /// The replacement card. The original has been removed.
    Rescheduled(DateCard),
}

impl AppealOutcome {
    pub fn into_card(self) -> DateCard {
        match self {
            AppealOutcome::Rejected(card) | AppealOutcome::Rescheduled(card) => card,
        }
    }
}

fn not_authorized(card: &DateCard, user_id: &str) -> DateCardError {
    DateCardError::NotAuthorized {
        card_id: card.id.to_string(),
        user_id: user_id.to_string(),
    }
}

fn appeal_payload(kind: NotificationKind, title: &str, body: &str) -> NotificationPayload {
    NotificationPayload::new(kind, title, body).with_anchor(DATES_ANCHOR)
}

impl DateCardService {
    /// Attaches a reschedule proposal to a pending or confirmed card.
    pub async fn request_appeal(
        &self,
        card_id: Uuid,
        user_id: &str,
        proposed_time: DateTime<Utc>,
        proposed_location: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<DateCard> {
        let proposed_location = proposed_location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());

        for _ in 0..MAX_UPDATE_ATTEMPTS {
            let card = self.get_date_card(card_id).await?;

            if !card.is_participant(user_id) {
                tracing::warn!("🚫 {} tried to reschedule date card {} they are not part of", user_id, card_id);
                return Err(not_authorized(&card, user_id));
            }
            if !matches!(card.status, DateCardStatus::Pending | DateCardStatus::Confirmed) {
                return Err(DateCardError::AlreadyResolved(card_id.to_string()));
            }
            if card.has_pending_appeal() {
                return Err(DateCardError::AppealPending(card_id.to_string()));
            }
            if proposed_time <= now {
                return Err(DateCardError::InvalidSchedule(format!(
                    "proposed time {} is not in the future",
                    proposed_time.to_rfc3339()
                )));
            }

            let patch = DateCardPatch {
                appeal_request: Some(AppealRequest {
                    requested_by: user_id.to_string(),
                    proposed_time,
                    proposed_location: proposed_location.clone(),
                    status: AppealStatus::Pending,
                    created_at: now,
                }),
                ..Default::default()
            };

            match self
                .store
                .update_date_card(card_id, &patch, Some(card.version), now)
                .await
            {
                Ok(updated) => {
                    tracing::info!("🗓️ {} requested to reschedule date card {}", user_id, card_id);
                    if let Some(other) = updated.other_participant(user_id) {
                        self.notify(
                            other,
                            appeal_payload(
                                NotificationKind::DateAppeal,
                                "Reschedule Requested",
                                "Your match proposed a new time for your date.",
                            ),
                        )
                        .await;
                    }
                    return Ok(updated);
                }
                Err(DateCardError::Conflict(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(DateCardError::Conflict(card_id.to_string()))
    }

    /// Accepts or rejects the pending reschedule request. Only the participant
    /// who did not make the request may resolve it. Accepting replaces the
    /// card with a fresh one at the proposed time, with both responses pending.
    pub async fn resolve_appeal(
        &self,
        card_id: Uuid,
        user_id: &str,
        decision: AppealDecision,
        now: DateTime<Utc>,
    ) -> Result<AppealOutcome> {
        for _ in 0..MAX_UPDATE_ATTEMPTS {
            let card = self.get_date_card(card_id).await?;

            if !card.is_participant(user_id) {
                tracing::warn!("🚫 {} tried to resolve a reschedule on date card {}", user_id, card_id);
                return Err(not_authorized(&card, user_id));
            }
            let appeal = match &card.appeal_request {
                Some(appeal) if appeal.status == AppealStatus::Pending => appeal.clone(),
                _ => {
                    return Err(DateCardError::InvalidAppeal(format!(
                        "date card {} has no pending reschedule request",
                        card_id
                    )));
                }
            };
            if appeal.requested_by == user_id {
                return Err(not_authorized(&card, user_id));
            }
            if decision == AppealDecision::Accept {
                if appeal.proposed_time <= now {
                    return Err(DateCardError::InvalidSchedule(format!(
                        "proposed time {} has already passed",
                        appeal.proposed_time.to_rfc3339()
                    )));
                }
                self.ensure_match_open(&card.match_id).await?;

                match self.replace_with_appeal(&card, &appeal, now).await {
                    Ok(replacement) => return Ok(AppealOutcome::Rescheduled(replacement)),
                    Err(DateCardError::Conflict(_)) => continue,
                    Err(e) => return Err(e),
                }
            }

            let patch = DateCardPatch {
                appeal_request: Some(AppealRequest {
                    status: AppealStatus::Rejected,
                    ..appeal.clone()
                }),
                ..Default::default()
            };
            let rejected = match self
                .store
                .update_date_card(card_id, &patch, Some(card.version), now)
                .await
            {
                Ok(updated) => updated,
                Err(DateCardError::Conflict(_)) => continue,
                Err(e) => return Err(e),
            };

            tracing::info!("🗓️ {} rejected reschedule of date card {}", user_id, card_id);
            self.notify(
                &appeal.requested_by,
                appeal_payload(
                    NotificationKind::DateAppealResolved,
                    "Reschedule Declined",
                    "Your match kept the original date time.",
                ),
            )
            .await;
            return Ok(AppealOutcome::Rejected(rejected));
        }

        Err(DateCardError::Conflict(card_id.to_string()))
    }

    /// Swaps `previous` for a fresh card at the proposed time. The swap only
    /// lands if `previous` is unchanged since it was read.
    async fn replace_with_appeal(
        &self,
        previous: &DateCard,
        appeal: &AppealRequest,
        now: DateTime<Utc>,
    ) -> Result<DateCard> {
        let proposal = DateProposal {
            scheduled_time: appeal.proposed_time,
            time_zone: Some(previous.time_zone.clone()),
            location: appeal
                .proposed_location
                .clone()
                .unwrap_or_else(|| previous.location.clone()),
            description: previous.description.clone(),
            special_instructions: previous.special_instructions.clone(),
        };

        let mut replacement = DateCard::new(
            &previous.match_id,
            previous.participants.clone(),
            proposal,
            previous.zone(),
            now,
        );
        replacement.previous_card_id = Some(previous.id);

        self.store
            .replace_date_card(previous.id, previous.version, &replacement)
            .await?;

        tracing::info!(
            "🗓️ Rescheduled date card {} as {} at {}",
            previous.id,
            replacement.id,
            replacement.scheduled_time.to_rfc3339()
        );
        self.notify(
            &appeal.requested_by,
            appeal_payload(
                NotificationKind::DateAppealResolved,
                "Reschedule Accepted",
                "Your match accepted the new time. Please confirm the updated date.",
            ),
        )
        .await;

        Ok(replacement)
    }
}
