pub mod date_cards;
pub mod maintenance;
pub mod matches;
pub mod notifications;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub use date_cards::{
    create_date_card, get_date_card, list_user_date_cards, request_appeal, resolve_appeal,
    respond_to_date_card, reveal_check,
};
pub use maintenance::{reveal_due, sweep_expired};
pub use matches::{create_match, get_match, list_user_matches};
pub use notifications::{list_notifications, mark_notification_read};

/// All API routes, without transport layers (CORS, tracing).
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Match registry
        .route("/matches", post(create_match))
        .route("/matches/{match_id}", get(get_match))
        .route("/users/{user_id}/matches", get(list_user_matches))
        // Date cards
        .route("/date-cards", post(create_date_card))
        .route("/date-cards/{card_id}", get(get_date_card))
        .route("/date-cards/{card_id}/respond", post(respond_to_date_card))
        .route("/date-cards/{card_id}/appeal", post(request_appeal))
        .route("/date-cards/{card_id}/appeal/resolve", post(resolve_appeal))
        .route("/date-cards/{card_id}/reveal-check", post(reveal_check))
        .route("/users/{user_id}/date-cards", get(list_user_date_cards))
        // Inbox
        .route("/users/{user_id}/notifications", get(list_notifications))
        .route(
            "/users/{user_id}/notifications/{notification_id}/read",
            post(mark_notification_read),
        )
        // Internal / cron
        .route("/maintenance/reveal-due", post(reveal_due))
        .route("/maintenance/sweep-expired", post(sweep_expired))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
