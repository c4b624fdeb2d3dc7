use chrono::{DateTime, Duration, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::constants::REVEAL_LEAD_MINUTES;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateCardStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl DateCardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateCardStatus::Pending => "pending",
            DateCardStatus::Confirmed => "confirmed",
            DateCardStatus::Cancelled => "cancelled",
            DateCardStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for DateCardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateCardStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DateCardStatus::Pending),
            "confirmed" => Ok(DateCardStatus::Confirmed),
            "cancelled" => Ok(DateCardStatus::Cancelled),
            "completed" => Ok(DateCardStatus::Completed),
            other => Err(format!("unknown date card status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

/// A participant's decision on a date card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Decline,
}

impl Decision {
    pub fn response_status(&self) -> ResponseStatus {
        match self {
            Decision::Accept => ResponseStatus::Accepted,
            Decision::Decline => ResponseStatus::Declined,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantResponse {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decline_reason: Option<String>,
}

impl ParticipantResponse {
    pub fn pending() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppealStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppealDecision {
    Accept,
    Reject,
}

/// A reschedule proposal attached to a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppealRequest {
    pub requested_by: String,
    pub proposed_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_location: Option<String>,
    pub status: AppealStatus,
    pub created_at: DateTime<Utc>,
}

/// Details of a proposed date, as supplied by the match-creation flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateProposal {
    pub scheduled_time: DateTime<Utc>,
    #[serde(default)]
    pub time_zone: Option<String>,
    pub location: String,
    pub description: String,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

/// A proposed date between the two participants of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateCard {
    pub id: Uuid,
    pub match_id: String,
    pub participants: [String; 2],
    pub scheduled_time: DateTime<Utc>,
    pub time_zone: String,
    pub location: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    pub responses: BTreeMap<String, ParticipantResponse>,
    pub status: DateCardStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub reveal_at: DateTime<Utc>,
    pub is_revealed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appeal_request: Option<AppealRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_card_id: Option<Uuid>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DateCard {
    /// Builds a fresh card with both responses pending.
    pub fn new(
        match_id: &str,
        participants: [String; 2],
        proposal: DateProposal,
        time_zone: Tz,
        now: DateTime<Utc>,
    ) -> Self {
        let responses = participants
            .iter()
            .map(|p| (p.clone(), ParticipantResponse::pending()))
            .collect();

        Self {
            id: Uuid::new_v4(),
            match_id: match_id.to_string(),
            participants,
            reveal_at: reveal_instant(proposal.scheduled_time),
            scheduled_time: proposal.scheduled_time,
            time_zone: time_zone.name().to_string(),
            location: proposal.location,
            description: proposal.description,
            special_instructions: proposal.special_instructions,
            responses,
            status: DateCardStatus::Pending,
            confirmed_at: None,
            cancelled_at: None,
            is_revealed: false,
            appeal_request: None,
            previous_card_id: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }

    pub fn other_participant(&self, user_id: &str) -> Option<&str> {
        if !self.is_participant(user_id) {
            return None;
        }
        self.participants
            .iter()
            .find(|p| p.as_str() != user_id)
            .map(String::as_str)
    }

    /// Absent entries count as pending.
    pub fn response_status(&self, user_id: &str) -> ResponseStatus {
        self.responses
            .get(user_id)
            .map(|r| r.status)
            .unwrap_or_default()
    }

    pub fn is_resolved(&self) -> bool {
        self.status != DateCardStatus::Pending
    }

    pub fn has_pending_appeal(&self) -> bool {
        self.appeal_request
            .as_ref()
            .is_some_and(|a| a.status == AppealStatus::Pending)
    }

    /// True once an accepted reschedule has replaced this card.
    pub fn is_superseded(&self) -> bool {
        self.appeal_request
            .as_ref()
            .is_some_and(|a| a.status == AppealStatus::Accepted)
    }

    /// Falls back to UTC for zones that no longer parse.
    pub fn zone(&self) -> Tz {
        self.time_zone.parse::<Tz>().unwrap_or(Tz::UTC)
    }

    /// Instant after which the card is swept: the start of the next local day.
    pub fn expires_at(&self) -> DateTime<Utc> {
        end_of_local_day(self.scheduled_time, self.zone())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    pub fn is_reveal_due(&self, now: DateTime<Utc>) -> bool {
        self.status == DateCardStatus::Confirmed && !self.is_revealed && now >= self.reveal_at
    }
}

pub fn reveal_instant(scheduled_time: DateTime<Utc>) -> DateTime<Utc> {
    scheduled_time - Duration::minutes(REVEAL_LEAD_MINUTES)
}

/// First instant of the calendar day following `instant` in `zone`.
pub fn end_of_local_day(instant: DateTime<Utc>, zone: Tz) -> DateTime<Utc> {
    let local = instant.with_timezone(&zone);
    let Some(next_day) = local.date_naive().succ_opt() else {
        return DateTime::<Utc>::MAX_UTC;
    };
    let midnight = next_day.and_time(NaiveTime::MIN);

    match zone.from_local_datetime(&midnight).earliest() {
        Some(start) => start.with_timezone(&Utc),
        // Midnight falls in a DST gap; keep the offset in force at `instant`.
        None => {
            let offset = local.offset().fix().local_minus_utc();
            Utc.from_utc_datetime(&(midnight - Duration::seconds(i64::from(offset))))
        }
    }
}

/// Partial update applied by the store's versioned update primitive.
/// `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateCardPatch {
    pub responses: Option<BTreeMap<String, ParticipantResponse>>,
    pub status: Option<DateCardStatus>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub is_revealed: Option<bool>,
    pub appeal_request: Option<AppealRequest>,
}

impl DateCardPatch {
    pub fn is_empty(&self) -> bool {
        *self == DateCardPatch::default()
    }

    /// Applies the patch in memory, bumping bookkeeping fields.
    pub fn apply_to(&self, card: &mut DateCard, now: DateTime<Utc>) {
        if let Some(responses) = &self.responses {
            card.responses = responses.clone();
        }
        if let Some(status) = self.status {
            card.status = status;
        }
        if let Some(at) = self.confirmed_at {
            card.confirmed_at = Some(at);
        }
        if let Some(at) = self.cancelled_at {
            card.cancelled_at = Some(at);
        }
        if let Some(revealed) = self.is_revealed {
            card.is_revealed = revealed;
        }
        if let Some(appeal) = &self.appeal_request {
            card.appeal_request = Some(appeal.clone());
        }
        card.version += 1;
        card.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(at: &str) -> DateProposal {
        DateProposal {
            scheduled_time: at.parse().unwrap(),
            time_zone: None,
            location: "Cafe X".to_string(),
            description: "Coffee".to_string(),
            special_instructions: None,
        }
    }

    fn card(at: &str, zone: Tz) -> DateCard {
        DateCard::new(
            "u1_u2",
            ["u1".to_string(), "u2".to_string()],
            proposal(at),
            zone,
            "2025-05-01T00:00:00Z".parse().unwrap(),
        )
    }

    #[test]
    fn test_new_card_starts_pending_with_reveal_ten_minutes_early() {
        let card = card("2025-06-01T19:00:00Z", Tz::UTC);

        assert_eq!(card.status, DateCardStatus::Pending);
        assert_eq!(card.reveal_at, "2025-06-01T18:50:00Z".parse::<DateTime<Utc>>().unwrap());
        assert!(card.reveal_at <= card.scheduled_time);
        assert_eq!(card.responses.len(), 2);
        assert_eq!(card.response_status("u1"), ResponseStatus::Pending);
        assert!(!card.is_revealed);
    }

    #[test]
    fn test_other_participant() {
        let card = card("2025-06-01T19:00:00Z", Tz::UTC);

        assert_eq!(card.other_participant("u1"), Some("u2"));
        assert_eq!(card.other_participant("u2"), Some("u1"));
        assert_eq!(card.other_participant("stranger"), None);
    }

    #[test]
    fn test_expiry_is_end_of_local_day() {
        let card = card("2025-06-01T20:00:00Z", Tz::UTC);

        assert_eq!(card.expires_at(), "2025-06-02T00:00:00Z".parse::<DateTime<Utc>>().unwrap());
        assert!(!card.is_expired("2025-06-01T23:00:00Z".parse().unwrap()));
        assert!(!card.is_expired("2025-06-01T23:59:59.999Z".parse().unwrap()));
        assert!(card.is_expired("2025-06-02T00:30:00Z".parse().unwrap()));
    }

    #[test]
    fn test_expiry_follows_card_time_zone() {
        // 20:00 in Kolkata is 14:30 UTC; the local day ends at 18:30 UTC.
        let card = card("2025-06-01T14:30:00Z", chrono_tz::Asia::Kolkata);

        assert_eq!(card.expires_at(), "2025-06-01T18:30:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn test_reveal_due_only_for_confirmed_unrevealed_cards() {
        let mut card = card("2025-06-01T19:00:00Z", Tz::UTC);
        let at_reveal: DateTime<Utc> = "2025-06-01T18:50:00Z".parse().unwrap();

        assert!(!card.is_reveal_due(at_reveal));
        card.status = DateCardStatus::Confirmed;
        assert!(!card.is_reveal_due(at_reveal - Duration::seconds(1)));
        assert!(card.is_reveal_due(at_reveal));
        card.is_revealed = true;
        assert!(!card.is_reveal_due(at_reveal));
    }

    #[test]
    fn test_patch_bumps_version_and_keeps_untouched_fields() {
        let mut card = card("2025-06-01T19:00:00Z", Tz::UTC);
        let now: DateTime<Utc> = "2025-05-02T00:00:00Z".parse().unwrap();

        DateCardPatch {
            is_revealed: Some(true),
            ..Default::default()
        }
        .apply_to(&mut card, now);

        assert!(card.is_revealed);
        assert_eq!(card.status, DateCardStatus::Pending);
        assert_eq!(card.version, 2);
        assert_eq!(card.updated_at, now);
    }
}
