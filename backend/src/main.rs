use axum::Router;
use axum::http::{HeaderValue, Method};
use rendezvous::{
    AppState, Config, handlers, utils,
    worker::{WorkerSchedule, run_background_jobs},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging();

    let config = Config::from_env()?;
    let state = AppState::from_config(config.clone()).await?;

    if config.run_background_jobs {
        let schedule = WorkerSchedule::from_secs(config.reveal_interval_secs, config.expiry_interval_secs);
        tokio::spawn(run_background_jobs(state.service.clone(), schedule));
    }

    let port = config.port;
    let app = create_router(state, &config);

    let listener = tokio::net::TcpListener::bind(&format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Server running on port {}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(state: AppState, config: &Config) -> Router {
    handlers::api_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(create_cors_layer(config))
}

fn create_cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(false);

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        // Default to permissive for development
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    }
}
