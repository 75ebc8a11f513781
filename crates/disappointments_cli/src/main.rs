mod commands;
mod output;

use clap::{Parser, Subcommand};
use disappointments_core::{
    config,
    db::{DatabaseConfig, client},
};
use miette::Result;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "disappointments-bot")]
#[command(about = "Peer-to-peer disappointment ledger with a chat front end")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Database file path (overrides config)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and serve the roster (default)
    Run,
    /// Write every disappointment to a spreadsheet
    Export {
        /// Destination file (defaults to the configured report path)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },
    /// Reset every user's quota now
    ResetQuotas {
        /// Points to reset to (defaults to the configured reset amount)
        #[arg(long)]
        amount: Option<i64>,
    },
    /// List registered users with their quotas
    Users,
    /// Configuration management
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Print the standard config file locations
    Paths,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .rgb_colors(miette::RgbColors::Preferred)
                .with_cause_chain()
                .with_syntax_highlighting(miette::highlighters::SyntectHighlighter::default())
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let cli = Cli::parse();

    use tracing_subscriber::{EnvFilter, fmt};

    // RUST_LOG wins over --debug when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new(
                "disappointments_core=debug,disappointments_discord=debug,disappointments_bot=debug,warn",
            )
        } else {
            EnvFilter::new(
                "disappointments_core=info,disappointments_discord=info,disappointments_bot=info,warn",
            )
        }
    });

    fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_timer(tracing_subscriber::fmt::time::LocalTime::rfc_3339())
        .compact()
        .init();

    let mut config = if let Some(config_path) = &cli.config {
        info!("Loading config from: {:?}", config_path);
        config::load_config(config_path).await?
    } else {
        info!("Loading config from standard locations");
        config::load_config_from_standard_locations().await?
    };
    config.apply_env_overrides()?;

    if let Some(db_path) = &cli.db_path {
        info!("Overriding database path with: {:?}", db_path);
        config.database = DatabaseConfig::Embedded {
            path: db_path.to_string_lossy().to_string(),
        };
    }

    tracing::debug!("Using database config: {:?}", config.database);

    let command = cli.command.unwrap_or(Commands::Run);

    // Config commands don't touch the database
    if let Commands::Config { cmd } = &command {
        match cmd {
            ConfigCommands::Show => commands::config::show(&config)?,
            ConfigCommands::Paths => commands::config::paths(),
        }
        return Ok(());
    }

    let db = client::connect(config.database.clone()).await?;

    match command {
        Commands::Run => commands::bot::run(db, &config).await?,
        Commands::Export { out } => commands::export::export(db, &config, out.as_deref()).await?,
        Commands::ResetQuotas { amount } => commands::quota::reset(db, &config, amount).await?,
        Commands::Users => commands::users::list(db, &config).await?,
        Commands::Config { .. } => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_is_the_default() {
        let cli = Cli::try_parse_from(["disappointments-bot", "--debug"]).unwrap();
        assert!(cli.debug);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_maintenance_flags() {
        let cli = Cli::try_parse_from(["disappointments-bot", "reset-quotas", "--amount", "5"])
            .unwrap();
        assert!(matches!(cli.command, Some(Commands::ResetQuotas { amount: Some(5) })));

        let cli = Cli::try_parse_from(["disappointments-bot", "export", "-o", "out.xlsx"]).unwrap();
        match cli.command {
            Some(Commands::Export { out: Some(path) }) => {
                assert_eq!(path, PathBuf::from("out.xlsx"))
            }
            _ => panic!("expected export"),
        }
    }
}
