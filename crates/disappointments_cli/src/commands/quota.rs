use disappointments_core::{BotConfig, CoreError, db::Db, error::ConfigError};
use miette::Result;

use crate::output::Output;

/// Reset every quota outside the schedule
pub async fn reset(db: Db, config: &BotConfig, amount: Option<i64>) -> Result<()> {
    let output = Output::new();
    let amount = reset_amount(config, amount)?;
    let handler = super::offline_handler(db, config).await?;

    let count = handler.quota().reset_all_to(amount).await?;
    output.success(&format!("Reset {} users to {} points", count, amount));
    Ok(())
}

/// The `--amount` override, or the configured reset amount
fn reset_amount(config: &BotConfig, amount: Option<i64>) -> std::result::Result<i64, CoreError> {
    let amount = amount.unwrap_or(config.quota.reset_amount);
    if amount < 0 {
        return Err(CoreError::ConfigurationError {
            config_path: "command line".to_string(),
            field: "--amount".to_string(),
            expected: "non-negative integer".to_string(),
            cause: ConfigError::InvalidValue(amount.to_string()),
        });
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_defaults_to_config() {
        let config = BotConfig::default();
        assert_eq!(reset_amount(&config, None).unwrap(), 3);
        assert_eq!(reset_amount(&config, Some(0)).unwrap(), 0);
    }

    #[test]
    fn test_negative_amount_is_an_error() {
        let err = reset_amount(&BotConfig::default(), Some(-1)).unwrap_err();
        match err {
            CoreError::ConfigurationError { field, .. } => assert_eq!(field, "--amount"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
