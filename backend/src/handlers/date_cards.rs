use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DateCardError;
use crate::models::{AppealDecision, DateCard, DateProposal, Decision};
use crate::services::RevealOutcome;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDateCardRequest {
    pub match_id: String,
    #[serde(flatten)]
    pub proposal: DateProposal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondRequest {
    pub user_id: String,
    pub decision: Decision,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppealBody {
    pub user_id: String,
    pub proposed_time: DateTime<Utc>,
    #[serde(default)]
    pub proposed_location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveAppealBody {
    pub user_id: String,
    pub decision: AppealDecision,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealCheckResponse {
    pub outcome: RevealOutcome,
    pub revealed: bool,
    pub card: DateCard,
}

pub async fn create_date_card(
    State(state): State<AppState>,
    Json(req): Json<CreateDateCardRequest>,
) -> Result<(StatusCode, Json<DateCard>), DateCardError> {
    let card = state
        .service
        .create_date_card(&req.match_id, req.proposal, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn get_date_card(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
) -> Result<Json<DateCard>, DateCardError> {
    Ok(Json(state.service.get_date_card(card_id).await?))
}

/// Sweeps the user's expired cards before listing.
pub async fn list_user_date_cards(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<DateCard>>, DateCardError> {
    Ok(Json(
        state
            .service
            .get_date_cards_for_user(&user_id, Utc::now())
            .await?,
    ))
}

/// 409 means the card was already decided: refetch rather than retry.
pub async fn respond_to_date_card(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
    Json(req): Json<RespondRequest>,
) -> Result<Json<DateCard>, DateCardError> {
    let card = state
        .service
        .respond(card_id, &req.user_id, req.decision, req.reason, Utc::now())
        .await?;

    Ok(Json(card))
}

pub async fn request_appeal(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
    Json(req): Json<AppealBody>,
) -> Result<Json<DateCard>, DateCardError> {
    let card = state
        .service
        .request_appeal(
            card_id,
            &req.user_id,
            req.proposed_time,
            req.proposed_location,
            Utc::now(),
        )
        .await?;

    Ok(Json(card))
}

/// On accept the response carries the replacement card.
pub async fn resolve_appeal(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
    Json(req): Json<ResolveAppealBody>,
) -> Result<Json<DateCard>, DateCardError> {
    let outcome = state
        .service
        .resolve_appeal(card_id, &req.user_id, req.decision, Utc::now())
        .await?;

    Ok(Json(outcome.into_card()))
}

pub async fn reveal_check(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
) -> Result<Json<RevealCheckResponse>, DateCardError> {
    let (outcome, card) = state.service.reveal_if_due(card_id, Utc::now()).await?;

    Ok(Json(RevealCheckResponse {
        revealed: card.is_revealed,
        outcome,
        card,
    }))
}
