use std::path::Path;

use disappointments_core::{BotConfig, db::Db};
use miette::Result;

use crate::output::Output;

/// Write the whole ledger to a spreadsheet
pub async fn export(db: Db, config: &BotConfig, out: Option<&Path>) -> Result<()> {
    let output = Output::new();
    let handler = super::offline_handler(db, config).await?;

    let entries = handler.ledger().get_all().await?;
    let path = match out {
        Some(path) => {
            handler.exporter().export_to(&entries, path)?;
            path.to_path_buf()
        }
        None => handler.exporter().export(&entries)?,
    };

    output.success(&format!(
        "Exported {} disappointments to {}",
        entries.len(),
        path.display()
    ));
    Ok(())
}
