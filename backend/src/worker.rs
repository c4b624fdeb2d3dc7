use chrono::Utc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info};

use crate::constants::BACKGROUND_RETRY_DELAY_SECS;
use crate::services::DateCardService;

/// Intervals for the two periodic sweeps.
#[derive(Debug, Clone, Copy)]
pub struct WorkerSchedule {
    pub reveal_every: Duration,
    pub expiry_every: Duration,
}

impl WorkerSchedule {
    pub fn from_secs(reveal_secs: u64, expiry_secs: u64) -> Self {
        Self {
            reveal_every: Duration::from_secs(reveal_secs),
            expiry_every: Duration::from_secs(expiry_secs),
        }
    }
}

/// Runs the reveal and expiry sweeps forever.
///
/// Every pass re-reads the store, so a restart picks up whatever came due
/// while the process was down.
pub async fn run_background_jobs(service: DateCardService, schedule: WorkerSchedule) {
    let mut reveal_tick = time::interval(schedule.reveal_every);
    let mut expiry_tick = time::interval(schedule.expiry_every);
    reveal_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    expiry_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        "⏱️ Background jobs started (reveal every {:?}, expiry every {:?})",
        schedule.reveal_every, schedule.expiry_every
    );

    loop {
        tokio::select! {
            _ = reveal_tick.tick() => {
                if let Err(e) = service.reveal_due_cards(Utc::now()).await {
                    error!("❌ Reveal sweep failed: {}", e);
                    time::sleep(Duration::from_secs(BACKGROUND_RETRY_DELAY_SECS)).await;
                }
            }
            _ = expiry_tick.tick() => {
                if let Err(e) = service.sweep_expired(None, Utc::now()).await {
                    error!("❌ Expiry sweep failed: {}", e);
                    time::sleep(Duration::from_secs(BACKGROUND_RETRY_DELAY_SECS)).await;
                }
            }
        }
    }
}
