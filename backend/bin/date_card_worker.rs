use rendezvous::{
    AppState,
    utils::{config::Config, init_logging},
    worker::{WorkerSchedule, run_background_jobs},
};
use anyhow::Result;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("🎯 Starting date card worker...");

    let config = Config::from_env()?;
    let schedule = WorkerSchedule::from_secs(config.reveal_interval_secs, config.expiry_interval_secs);
    let state = AppState::from_config(config).await?;

    tokio::select! {
        _ = run_background_jobs(state.service.clone(), schedule) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("🛑 Shutting down date card worker");
        }
    }

    Ok(())
}
