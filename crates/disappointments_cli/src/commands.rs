pub mod bot;
pub mod config;
pub mod export;
pub mod quota;
pub mod users;

use std::sync::Arc;

use disappointments_core::{
    BotConfig, InteractionHandler, Notifier, db::Db, notify::SilentNotifier,
};
use miette::Result;

/// Wire the core components and register the configured roster
pub async fn handler(
    db: Db,
    config: &BotConfig,
    notifier: Arc<dyn Notifier>,
) -> Result<InteractionHandler> {
    let handler = InteractionHandler::from_config(db, config, notifier).await?;
    let seeded = handler.registry().seed(&config.roster).await?;
    if seeded > 0 {
        tracing::info!("Registered {} new roster members", seeded);
    }
    Ok(handler)
}

/// Handler for commands that never message anyone
pub async fn offline_handler(db: Db, config: &BotConfig) -> Result<InteractionHandler> {
    handler(db, config, Arc::new(SilentNotifier)).await
}
