use disappointments_core::{BotConfig, db::Db};
use miette::Result;
use owo_colors::OwoColorize;

use crate::output::Output;

/// List registered users
pub async fn list(db: Db, config: &BotConfig) -> Result<()> {
    let output = Output::new();
    let handler = super::offline_handler(db, config).await?;

    let users = handler.registry().all().await?;
    if users.is_empty() {
        output.status("No users registered yet");
        output.status("Add [[roster]] entries to your configuration");
        return Ok(());
    }

    output.section(&format!("Users ({})", users.len()));
    for user in users {
        let received = handler.ledger().count_received(user.id).await?;
        output.list_item(&format!(
            "{} {} points left, {} received (external id {})",
            user.name.bright_cyan(),
            user.quota.to_string().bright_white(),
            received,
            user.external_id.to_string().dimmed()
        ));
    }
    Ok(())
}
