//! Simplified database migration system for schema versioning

use super::{DatabaseError, Db, Result};
use crate::db::schema::Schema;

/// Database migration runner
pub struct MigrationRunner;

impl MigrationRunner {
    /// Run all pending migrations
    pub async fn run(db: &Db) -> Result<()> {
        let current_version = Self::get_schema_version(db).await?;

        if current_version < 1 {
            tracing::info!("Running migration v1: Initial schema");
            Self::migrate_v1(db).await?;
            Self::update_schema_version(db, 1).await?;
        }

        Ok(())
    }

    /// Migration v1: users and ledger tables
    async fn migrate_v1(db: &Db) -> Result<()> {
        for table in Schema::tables() {
            db.query(&table.schema)
                .await
                .and_then(|response| response.check())
                .map_err(DatabaseError::QueryFailed)?;

            for index in &table.indexes {
                db.query(index)
                    .await
                    .and_then(|response| response.check())
                    .map_err(DatabaseError::QueryFailed)?;
            }
            tracing::debug!("Defined table {}", table.name);
        }

        Ok(())
    }

    /// Get schema version, 0 for a fresh store
    pub(crate) async fn get_schema_version(db: &Db) -> Result<u32> {
        #[derive(serde::Deserialize)]
        struct SchemaVersion {
            schema_version: u32,
        }

        let versions: Vec<SchemaVersion> = db
            .query("SELECT schema_version FROM system_metadata LIMIT 1")
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .unwrap_or_default();

        Ok(versions.first().map(|v| v.schema_version).unwrap_or(0))
    }

    /// Update schema version
    async fn update_schema_version(db: &Db, version: u32) -> Result<()> {
        let updated: Vec<serde_json::Value> = db
            .query("UPDATE system_metadata SET schema_version = $version, updated_at = time::now()")
            .bind(("version", version))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .unwrap_or_default();

        // If no record was updated, create a new one
        if updated.is_empty() {
            db.query(
                "CREATE system_metadata SET schema_version = $version, created_at = time::now(), updated_at = time::now()",
            )
            .bind(("version", version))
            .await
            .and_then(|response| response.check())
            .map_err(DatabaseError::QueryFailed)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::client;

    #[tokio::test]
    async fn test_migration_runner() {
        // Connecting runs migrations
        let db = client::create_test_db().await.unwrap();

        let version = MigrationRunner::get_schema_version(&db).await.unwrap();
        assert_eq!(version, 1);

        // Running migrations again should be idempotent
        MigrationRunner::run(&db).await.unwrap();
        let version = MigrationRunner::get_schema_version(&db).await.unwrap();
        assert_eq!(version, 1);
    }
}
