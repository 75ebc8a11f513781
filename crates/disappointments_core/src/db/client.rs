//! Direct SurrealDB client setup

use surrealdb::engine::any;

use crate::db::{DatabaseConfig, DatabaseError, Db, Result, migration::MigrationRunner};

const NAMESPACE: &str = "disappointments";
const DATABASE: &str = "disappointments";

/// Create a fresh in-memory database with migrations applied
pub async fn create_test_db() -> Result<Db> {
    connect(DatabaseConfig::in_memory()).await
}

/// Connect to the configured store and bring its schema up to date
pub async fn connect(config: DatabaseConfig) -> Result<Db> {
    let DatabaseConfig::Embedded { path } = config;

    let endpoint = if path.is_empty() {
        "memory".to_string()
    } else {
        // Ensure parent directory exists for file-based storage
        if let Some(parent) = std::path::Path::new(&path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DatabaseError::Other(format!("Failed to create database directory: {}", e))
                })?;
            }
        }
        format!("surrealkv://{}", path)
    };

    tracing::info!("Connecting to database at: {}", endpoint);
    let connect_start = std::time::Instant::now();
    let db = any::connect(endpoint)
        .await
        .map_err(DatabaseError::ConnectionFailed)?;
    tracing::info!(
        "Database connection established in {:?}",
        connect_start.elapsed()
    );

    db.use_ns(NAMESPACE)
        .use_db(DATABASE)
        .await
        .map_err(DatabaseError::ConnectionFailed)?;

    MigrationRunner::run(&db).await?;

    Ok(db)
}

/// Check if the database is healthy
pub async fn health_check(db: &Db) -> Result<()> {
    db.health().await.map_err(DatabaseError::ConnectionFailed)
}
