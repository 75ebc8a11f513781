use miette::Diagnostic;
use thiserror::Error;

use crate::{
    db::DatabaseError,
    id::{DisappointmentId, ExternalId, UserId},
};

#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("User not found: {reference}")]
    #[diagnostic(
        code(disappointments::core::user_not_found),
        help("Only members of the configured roster can use the bot")
    )]
    UserNotFound { reference: String },

    #[error("Disappointment not found: {id}")]
    #[diagnostic(
        code(disappointments::core::disappointment_not_found),
        help("The disappointment may already have been deleted")
    )]
    DisappointmentNotFound { id: DisappointmentId },

    #[error("User {user} has no quota left ({quota})")]
    #[diagnostic(
        code(disappointments::core::insufficient_quota),
        help("Quotas are replenished on a fixed schedule")
    )]
    InsufficientQuota { user: UserId, quota: i64 },

    #[error("Invalid reason: {reason}")]
    #[diagnostic(code(disappointments::core::invalid_reason))]
    InvalidReason { reason: &'static str },

    #[error("Only the author may delete disappointment {id}")]
    #[diagnostic(code(disappointments::core::not_author))]
    NotAuthor { id: DisappointmentId },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    #[error("Report export failed")]
    #[diagnostic(
        code(disappointments::core::report_failed),
        help("Check that the report path {path} is writable")
    )]
    ReportFailed {
        path: String,
        #[source]
        cause: rust_xlsxwriter::XlsxError,
    },

    #[error("Configuration error in {config_path}: expected {expected} for field '{field}'")]
    #[diagnostic(
        code(disappointments::core::configuration_error),
        help("Fix the configuration file or remove it to fall back to defaults")
    )]
    ConfigurationError {
        config_path: String,
        field: String,
        expected: String,
        #[source]
        cause: ConfigError,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl CoreError {
    pub fn unknown_external(external_id: ExternalId) -> Self {
        Self::UserNotFound {
            reference: format!("external id {}", external_id),
        }
    }

    pub fn unknown_user(id: UserId) -> Self {
        Self::UserNotFound {
            reference: format!("user {}", id),
        }
    }

    /// Both flavours of the "does not exist" failure
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound { .. } | Self::DisappointmentNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
