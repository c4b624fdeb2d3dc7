use anyhow::Result;
use chrono::Utc;
use clap::{Arg, Command};
use rendezvous::{
    AppState,
    services::RevealOutcome,
    utils::{config::Config, init_logging},
};
use tracing::{info, warn};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let matches = Command::new("maintenance")
        .about("One-off date card maintenance tasks")
        .subcommand_required(true)
        .subcommand(
            Command::new("sweep-expired")
                .about("Delete date cards whose local day has ended")
                .arg(
                    Arg::new("user")
                        .long("user")
                        .value_name("USER_ID")
                        .help("Only sweep cards this user participates in"),
                ),
        )
        .subcommand(Command::new("reveal-due").about("Reveal every confirmed card that is due"))
        .subcommand(
            Command::new("reveal")
                .about("Reveal a single card if it is due")
                .arg(Arg::new("card-id").required(true).value_name("CARD_ID")),
        )
        .get_matches();

    let config = Config::from_env()?;
    let state = AppState::from_config(config).await?;
    let service = state.service;
    let now = Utc::now();

    match matches.subcommand() {
        Some(("sweep-expired", args)) => {
            let user = args.get_one::<String>("user").map(String::as_str);
            let removed = service.sweep_expired(user, now).await?;
            info!("✅ Removed {} expired date cards", removed);
        }
        Some(("reveal-due", _)) => {
            let summary = service.reveal_due_cards(now).await?;
            info!(
                "✅ Checked {} cards, revealed {}, {} failed",
                summary.checked, summary.revealed, summary.failed
            );
        }
        Some(("reveal", args)) => {
            let raw = args
                .get_one::<String>("card-id")
                .ok_or_else(|| anyhow::anyhow!("card id is required"))?;
            let card_id: Uuid = raw.parse()?;
            let (outcome, card) = service.reveal_if_due(card_id, now).await?;
            match outcome {
                RevealOutcome::Revealed => info!("✅ Revealed date card {}", card.id),
                other => warn!("⚠️  Date card {} not revealed: {:?}", card.id, other),
            }
        }
        _ => unreachable!("subcommand_required is set"),
    }

    Ok(())
}
