use disappointments_core::{BotConfig, config::config_paths};
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;

use crate::output::Output;

/// Show the effective configuration with the token masked
pub fn show(config: &BotConfig) -> Result<()> {
    let output = Output::new();

    output.section("Current Configuration");
    println!();

    let mut shown = config.clone();
    shown.discord.token = shown.discord.token.as_ref().map(|_| "********".to_string());

    let toml_str = toml::to_string_pretty(&shown).into_diagnostic()?;
    println!("{}", toml_str);

    Ok(())
}

/// Print where configuration is looked for, in order
pub fn paths() {
    let output = Output::new();

    output.section("Configuration locations");
    for path in config_paths() {
        let marker = if path.exists() {
            "found".bright_green().to_string()
        } else {
            "missing".dimmed().to_string()
        };
        output.info(&path.display().to_string(), &marker);
    }
}
