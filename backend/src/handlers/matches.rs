use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::error::DateCardError;
use crate::models::{Match, MatchOrigin};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    pub user_a: String,
    pub user_b: String,
    #[serde(default)]
    pub created_by: MatchOrigin,
}

/// Returns the existing match for the pair when one is already active.
pub async fn create_match(
    State(state): State<AppState>,
    Json(req): Json<CreateMatchRequest>,
) -> Result<Json<Match>, DateCardError> {
    let record = state
        .service
        .create_match(&req.user_a, &req.user_b, req.created_by, Utc::now())
        .await?;

    Ok(Json(record))
}

pub async fn get_match(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Json<Match>, DateCardError> {
    Ok(Json(state.service.get_match(&match_id).await?))
}

pub async fn list_user_matches(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Match>>, DateCardError> {
    Ok(Json(state.service.get_matches_for_user(&user_id).await?))
}
