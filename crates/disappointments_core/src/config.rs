//! Configuration for the bot
//!
//! A single TOML file with one section per component plus the static
//! roster. Every section has defaults, so an absent file is a valid
//! (if rosterless) configuration. A few scalars can be overridden from the
//! environment after the file is read.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    CoreError, Result,
    db::DatabaseConfig,
    error::ConfigError,
    users::{DEFAULT_QUOTA, RosterEntry},
};

/// Resolve a path relative to a base directory
/// If the path is absolute, return it as-is
fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub quota: QuotaConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub discord: DiscordConfig,

    /// Participants registered at startup
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roster: Vec<RosterEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Quota given to newly registered users
    #[serde(default = "default_quota")]
    pub default_quota: i64,

    /// Quota every user is reset to on schedule
    #[serde(default = "default_quota")]
    pub reset_amount: i64,

    #[serde(default = "default_reset_interval")]
    pub reset_interval_hours: u32,
}

fn default_quota() -> i64 {
    DEFAULT_QUOTA
}

fn default_reset_interval() -> u32 {
    3
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            default_quota: default_quota(),
            reset_amount: default_quota(),
            reset_interval_hours: default_reset_interval(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Where the spreadsheet is written; overwritten on every export
    #[serde(default = "default_report_path")]
    pub path: PathBuf,

    /// Hours added to stored UTC timestamps in reports and detail views
    #[serde(default = "default_utc_offset")]
    pub utc_offset_hours: i64,
}

fn default_report_path() -> PathBuf {
    PathBuf::from("./disappointments-report.xlsx")
}

fn default_utc_offset() -> i64 {
    6
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: default_report_path(),
            utc_offset_hours: default_utc_offset(),
        }
    }
}

impl ReportConfig {
    pub fn utc_offset(&self) -> chrono::Duration {
        chrono::Duration::hours(self.utc_offset_hours)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds of inactivity after which a half-finished submission is dropped
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_idle_timeout() -> u64 {
    3600
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token; `DISCORD_TOKEN` takes precedence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl BotConfig {
    /// Load configuration from standard locations
    pub async fn load() -> Result<Self> {
        load_config_from_standard_locations().await
    }

    /// Load configuration from a specific file
    pub async fn load_from(path: &Path) -> Result<Self> {
        load_config(path).await
    }

    /// Apply `DISCORD_TOKEN`, `POINTS_AMOUNT` and `REPORT_FILE_PATH`
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides("environment", |key| std::env::var(key).ok())
    }

    /// Apply overrides from any key/value source
    pub fn apply_overrides(
        &mut self,
        source: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        if let Some(token) = lookup("DISCORD_TOKEN").filter(|t| !t.is_empty()) {
            self.discord.token = Some(token);
        }

        if let Some(amount) = lookup("POINTS_AMOUNT") {
            self.quota.reset_amount =
                amount
                    .trim()
                    .parse()
                    .map_err(|_| CoreError::ConfigurationError {
                        config_path: source.to_string(),
                        field: "POINTS_AMOUNT".to_string(),
                        expected: "integer".to_string(),
                        cause: ConfigError::InvalidValue(amount.clone()),
                    })?;
        }

        if let Some(path) = lookup("REPORT_FILE_PATH").filter(|p| !p.is_empty()) {
            self.report.path = PathBuf::from(path);
        }

        self.validate(source)
    }

    /// Reject values the components can't work with
    pub fn validate(&self, source: &str) -> Result<()> {
        let invalid = |field: &str, expected: &str, value: String| CoreError::ConfigurationError {
            config_path: source.to_string(),
            field: field.to_string(),
            expected: expected.to_string(),
            cause: ConfigError::InvalidValue(value),
        };

        if self.quota.reset_amount < 0 {
            return Err(invalid(
                "quota.reset_amount",
                "non-negative integer",
                self.quota.reset_amount.to_string(),
            ));
        }
        if self.quota.default_quota < 0 {
            return Err(invalid(
                "quota.default_quota",
                "non-negative integer",
                self.quota.default_quota.to_string(),
            ));
        }
        if !(-14..=14).contains(&self.report.utc_offset_hours) {
            return Err(invalid(
                "report.utc_offset_hours",
                "hours between -14 and 14",
                self.report.utc_offset_hours.to_string(),
            ));
        }
        if !(1..=24).contains(&self.quota.reset_interval_hours) {
            return Err(invalid(
                "quota.reset_interval_hours",
                "hours between 1 and 24",
                self.quota.reset_interval_hours.to_string(),
            ));
        }

        Ok(())
    }
}

/// Load configuration from a TOML file
pub async fn load_config(path: &Path) -> Result<BotConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "file".to_string(),
            expected: "readable TOML file".to_string(),
            cause: ConfigError::Io(e.to_string()),
        })?;

    let mut config = parse_config(&content, &path.display().to_string())?;

    // Relative paths are relative to the config file
    let base_dir = path.parent().unwrap_or(Path::new("."));
    let DatabaseConfig::Embedded { path: db_path } = &mut config.database;
    if !db_path.is_empty() {
        *db_path = resolve_path(base_dir, Path::new(db_path.as_str()))
            .display()
            .to_string();
    }
    config.report.path = resolve_path(base_dir, &config.report.path);

    Ok(config)
}

/// Parse TOML text; `source` names the origin in errors
pub fn parse_config(content: &str, source: &str) -> Result<BotConfig> {
    let config: BotConfig =
        toml::from_str(content).map_err(|e| CoreError::ConfigurationError {
            config_path: source.to_string(),
            field: "content".to_string(),
            expected: "valid TOML configuration".to_string(),
            cause: ConfigError::TomlParse(e.to_string()),
        })?;
    config.validate(source)?;
    Ok(config)
}

/// Standard config file locations
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("disappointments.toml")];

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("disappointments").join("config.toml"));
    }

    paths
}

/// Load configuration from the first standard location that exists
pub async fn load_config_from_standard_locations() -> Result<BotConfig> {
    for path in config_paths() {
        if path.exists() {
            tracing::info!("Loading configuration from {}", path.display());
            return load_config(&path).await;
        }
    }

    tracing::info!("No configuration file found, using defaults");
    Ok(BotConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ExternalId;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
        [database]
        type = "embedded"
        path = "data/bot.db"

        [quota]
        reset_amount = 5

        [report]
        path = "out/report.xlsx"

        [[roster]]
        name = "Dinaiym"
        external_id = 5093311685

        [[roster]]
        name = "Eldos"
        external_id = 896678539
    "#;

    #[test]
    fn test_defaults() {
        let config = BotConfig::default();
        assert_eq!(config.quota.default_quota, 3);
        assert_eq!(config.quota.reset_amount, 3);
        assert_eq!(config.quota.reset_interval_hours, 3);
        assert_eq!(config.report.utc_offset_hours, 6);
        assert_eq!(config.session.idle_timeout_secs, 3600);
        assert!(config.roster.is_empty());
        config.validate("defaults").unwrap();
    }

    #[test]
    fn test_parse_sample() {
        let config = parse_config(SAMPLE, "sample").unwrap();
        assert_eq!(config.quota.reset_amount, 5);
        assert_eq!(config.quota.default_quota, 3);
        assert_eq!(config.roster.len(), 2);
        assert_eq!(config.roster[0].external_id, ExternalId(5093311685));
    }

    #[test]
    fn test_invalid_interval_is_rejected() {
        let err = parse_config("[quota]\nreset_interval_hours = 0\n", "inline").unwrap_err();
        match err {
            CoreError::ConfigurationError { field, .. } => {
                assert_eq!(field, "quota.reset_interval_hours")
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_offset_is_rejected() {
        for offset in [15, -15, i64::MAX] {
            let content = format!("[report]\nutc_offset_hours = {offset}\n");
            match parse_config(&content, "inline").unwrap_err() {
                CoreError::ConfigurationError { field, .. } => {
                    assert_eq!(field, "report.utc_offset_hours")
                }
                other => panic!("unexpected error {other:?}"),
            }
        }

        let config = parse_config("[report]\nutc_offset_hours = -14\n", "inline").unwrap();
        assert_eq!(config.report.utc_offset_hours, -14);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("DISCORD_TOKEN", "secret"),
            ("POINTS_AMOUNT", "4"),
            ("REPORT_FILE_PATH", "/tmp/report.xlsx"),
        ]
        .into_iter()
        .collect();

        let mut config = BotConfig::default();
        config
            .apply_overrides("test", |key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.discord.token.as_deref(), Some("secret"));
        assert_eq!(config.quota.reset_amount, 4);
        assert_eq!(config.report.path, PathBuf::from("/tmp/report.xlsx"));
    }

    #[test]
    fn test_bad_points_override() {
        let mut config = BotConfig::default();
        let err = config
            .apply_overrides("test", |key| {
                (key == "POINTS_AMOUNT").then(|| "lots".to_string())
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::ConfigurationError { .. }));
    }

    #[tokio::test]
    async fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disappointments.toml");
        tokio::fs::write(&path, SAMPLE).await.unwrap();

        let config = load_config(&path).await.unwrap();
        assert_eq!(config.report.path, dir.path().join("out/report.xlsx"));
        assert_eq!(
            config.database,
            DatabaseConfig::Embedded {
                path: dir.path().join("data/bot.db").display().to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ConfigurationError { .. }));
    }
}
