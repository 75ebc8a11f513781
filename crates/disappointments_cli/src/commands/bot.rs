use std::sync::Arc;

use disappointments_core::{BotConfig, db::Db, scheduler};
use disappointments_discord::{DiscordError, DiscordNotifier, create_client, run as run_client};
use miette::Result;
use owo_colors::OwoColorize;
use tracing::info;

use crate::output::Output;

/// Serve the roster over Discord until the gateway closes or Ctrl-C
pub async fn run(db: Db, config: &BotConfig) -> Result<()> {
    let output = Output::new();

    let token = config
        .discord
        .token
        .clone()
        .ok_or(DiscordError::MissingToken)?;

    let notifier = Arc::new(DiscordNotifier::from_token(&token));
    let handler = super::handler(db, config, notifier).await?;

    let users = handler.registry().all().await?;
    output.section("Starting disappointments bot");
    output.kv("Users", &users.len().to_string().bright_white().to_string());
    output.kv(
        "Quota reset",
        &format!(
            "every {}h to {} points",
            config.quota.reset_interval_hours, config.quota.reset_amount
        ),
    );
    output.kv("Report", &config.report.path.display().to_string());
    if users.is_empty() {
        output.warning("The roster is empty, nobody will be able to use the bot");
    }
    println!();

    let resets = scheduler::spawn_quota_resets(
        handler.quota().clone(),
        handler.sessions(),
        config.quota.reset_interval_hours,
    );

    let mut client = create_client(&token, handler).await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down Discord bot");
            shard_manager.shutdown_all().await;
        }
    });

    let result = run_client(&mut client).await;
    resets.abort();
    result?;

    output.success("Bot stopped");
    Ok(())
}
