//! Persistence on SurrealDB
//!
//! - Connection management (embedded file store or in-memory)
//! - Schema definitions and versioned migrations
//!
//! Record-level queries live next to the component that owns them
//! (registry, ledger, quota policy).

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use surrealdb::{Surreal, engine::any::Any};
use thiserror::Error;

pub mod client;
pub mod migration;
pub mod schema;

/// Handle shared by every component; cloning is cheap
pub type Db = Surreal<Any>;

/// Core database error type
#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("Connection failed")]
    #[diagnostic(
        code(disappointments::db::connection_failed),
        help("Check the [database] section of your configuration")
    )]
    ConnectionFailed(#[source] surrealdb::Error),

    #[error("Query failed")]
    #[diagnostic(
        code(disappointments::db::query_failed),
        help("Check the query syntax and table schema")
    )]
    QueryFailed(#[source] surrealdb::Error),

    #[error("{0}")]
    #[diagnostic(code(disappointments::db::other))]
    Other(String),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Configuration for the backing store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DatabaseConfig {
    /// Embedded SurrealKV store; an empty path keeps everything in memory
    Embedded {
        #[serde(default = "default_db_path")]
        path: String,
    },
}

fn default_db_path() -> String {
    "./disappointments.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig::Embedded {
            path: default_db_path(),
        }
    }
}

impl DatabaseConfig {
    pub fn in_memory() -> Self {
        DatabaseConfig::Embedded {
            path: String::new(),
        }
    }
}
