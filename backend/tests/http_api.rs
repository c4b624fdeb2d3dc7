use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use rendezvous::{AppState, Config, handlers::api_router};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    let (state, _, _) = AppState::in_memory(Config::default());
    api_router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn card_for_u1_u2(app: &Router) -> String {
    let (status, record) = send(
        app,
        "POST",
        "/matches",
        Some(json!({ "userA": "u2", "userB": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["id"], "u1_u2");

    let scheduled = (Utc::now() + Duration::days(3)).to_rfc3339();
    let (status, card) = send(
        app,
        "POST",
        "/date-cards",
        Some(json!({
            "matchId": "u1_u2",
            "scheduledTime": scheduled,
            "location": "Cafe X",
            "description": "Coffee",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(card["status"], "pending");
    card["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_check_responds() {
    let app = app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn respond_maps_domain_errors_to_statuses() {
    let app = app();
    let card_id = card_for_u1_u2(&app).await;
    let respond = format!("/date-cards/{}/respond", card_id);

    let (status, body) = send(
        &app,
        "POST",
        &respond,
        Some(json!({ "userId": "u3", "decision": "accept" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "NotAuthorized");

    let (status, body) = send(
        &app,
        "POST",
        &respond,
        Some(json!({ "userId": "u2", "decision": "decline", "reason": "schedule conflict" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
    assert_eq!(body["responses"]["u2"]["declineReason"], "schedule conflict");

    let (status, body) = send(
        &app,
        "POST",
        &respond,
        Some(json!({ "userId": "u1", "decision": "accept" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "AlreadyResolved");
}

#[tokio::test]
async fn unknown_resources_are_404() {
    let app = app();
    let (status, body) = send(&app, "GET", "/matches/a_b", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "MatchNotFound");

    let uri = format!("/date-cards/{}", uuid::Uuid::new_v4());
    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
async fn past_schedule_is_rejected() {
    let app = app();
    send(&app, "POST", "/matches", Some(json!({ "userA": "u1", "userB": "u2" }))).await;

    let (status, body) = send(
        &app,
        "POST",
        "/date-cards",
        Some(json!({
            "matchId": "u1_u2",
            "scheduledTime": (Utc::now() - Duration::hours(1)).to_rfc3339(),
            "location": "Cafe X",
            "description": "Coffee",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidSchedule");
}

#[tokio::test]
async fn both_accepts_confirm_and_reach_the_inbox() {
    let app = app();
    let card_id = card_for_u1_u2(&app).await;
    let respond = format!("/date-cards/{}/respond", card_id);

    for user in ["u1", "u2"] {
        let (status, _) = send(
            &app,
            "POST",
            &respond,
            Some(json!({ "userId": user, "decision": "accept" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, card) = send(&app, "GET", &format!("/date-cards/{}", card_id), None).await;
    assert_eq!(card["status"], "confirmed");
    assert_eq!(card["isRevealed"], false);

    let (_, listed) = send(&app, "GET", "/users/u1/date-cards", None).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let (status, inbox) = send(&app, "GET", "/users/u1/notifications", None).await;
    assert_eq!(status, StatusCode::OK);
    let newest = &inbox[0];
    assert_eq!(newest["type"], "date_confirmed");
    assert_eq!(newest["read"], false);

    let read_uri = format!(
        "/users/u1/notifications/{}/read",
        newest["id"].as_str().unwrap()
    );
    let (status, _) = send(&app, "POST", &read_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, inbox) = send(&app, "GET", "/users/u1/notifications", None).await;
    assert_eq!(inbox[0]["read"], true);
}

#[tokio::test]
async fn reveal_check_reports_not_due() {
    let app = app();
    let card_id = card_for_u1_u2(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/date-cards/{}/reveal-check", card_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "notConfirmed");
    assert_eq!(body["revealed"], false);
}

#[tokio::test]
async fn maintenance_endpoints_summarize_work() {
    let app = app();
    card_for_u1_u2(&app).await;

    let (status, body) = send(&app, "POST", "/maintenance/reveal-due", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checked"], 0);

    let (status, body) = send(&app, "POST", "/maintenance/sweep-expired?userId=u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], 0);
}

#[tokio::test]
async fn appeal_flow_over_http() {
    let app = app();
    let card_id = card_for_u1_u2(&app).await;
    let proposed = (Utc::now() + Duration::days(5)).to_rfc3339();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/date-cards/{}/appeal", card_id),
        Some(json!({ "userId": "u1", "proposedTime": proposed, "proposedLocation": "Park" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appealRequest"]["status"], "pending");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/date-cards/{}/appeal/resolve", card_id),
        Some(json!({ "userId": "u2", "decision": "accept" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["previousCardId"], card_id.as_str());
    assert_eq!(body["location"], "Park");

    let (status, _) = send(&app, "GET", &format!("/date-cards/{}", card_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
