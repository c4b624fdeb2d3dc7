use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::DateCardError;
use crate::services::RevealSummary;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub removed: usize,
}

pub async fn reveal_due(State(state): State<AppState>) -> Result<Json<RevealSummary>, DateCardError> {
    Ok(Json(state.service.reveal_due_cards(Utc::now()).await?))
}

pub async fn sweep_expired(
    State(state): State<AppState>,
    Query(query): Query<SweepQuery>,
) -> Result<Json<SweepResponse>, DateCardError> {
    let removed = state
        .service
        .sweep_expired(query.user_id.as_deref(), Utc::now())
        .await?;

    Ok(Json(SweepResponse { removed }))
}
