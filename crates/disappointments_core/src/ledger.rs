//! Disappointment Ledger and listing queries
//!
//! Entries are written once and only ever removed by their author. Every read
//! joins both user records so a [`Disappointment`] always carries resolved
//! users.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    CoreError, Result,
    db::{DatabaseError, Db},
    disappointment::Disappointment,
    id::{DisappointmentId, ExternalId, UserId},
    users::User,
};

const DISAPPOINTMENT_FIELDS: &str = "record::id(id) AS id, reason, created_at, \
     record::id(from_user) AS from_id, from_user.name AS from_name, \
     from_user.external_id AS from_external_id, from_user.quota AS from_quota, \
     record::id(to_user) AS to_id, to_user.name AS to_name, \
     to_user.external_id AS to_external_id, to_user.quota AS to_quota";

/// Flat row as returned by the joined projection
#[derive(Debug, Deserialize)]
struct DisappointmentRow {
    id: DisappointmentId,
    reason: String,
    created_at: i64,
    from_id: UserId,
    from_name: String,
    from_external_id: i64,
    from_quota: i64,
    to_id: UserId,
    to_name: String,
    to_external_id: i64,
    to_quota: i64,
}

impl TryFrom<DisappointmentRow> for Disappointment {
    type Error = CoreError;

    fn try_from(row: DisappointmentRow) -> Result<Self> {
        let created_at = DateTime::<Utc>::from_timestamp_millis(row.created_at).ok_or_else(|| {
            DatabaseError::Other(format!(
                "Disappointment {} has an out of range timestamp {}",
                row.id, row.created_at
            ))
        })?;

        Ok(Disappointment {
            id: row.id,
            reason: row.reason,
            from_user: User {
                id: row.from_id,
                name: row.from_name,
                external_id: ExternalId(row.from_external_id),
                quota: row.from_quota,
            },
            to_user: User {
                id: row.to_id,
                name: row.to_name,
                external_id: ExternalId(row.to_external_id),
                quota: row.to_quota,
            },
            created_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CountRow {
    count: usize,
}

#[derive(Clone)]
pub struct Ledger {
    db: Db,
}

impl Ledger {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Append a new entry. The reason is stored as given.
    pub async fn create(&self, from: &User, to: &User, reason: &str) -> Result<Disappointment> {
        let disappointment = Disappointment {
            id: DisappointmentId::generate(),
            reason: reason.to_string(),
            from_user: from.clone(),
            to_user: to.clone(),
            created_at: Utc::now(),
        };

        self.db
            .query(
                "CREATE type::thing('disappointments', $id) SET \
                 reason = $reason, \
                 from_user = type::thing('users', $from_user), \
                 to_user = type::thing('users', $to_user), \
                 created_at = $created_at",
            )
            .bind(("id", disappointment.id.key()))
            .bind(("reason", disappointment.reason.clone()))
            .bind(("from_user", from.id.key()))
            .bind(("to_user", to.id.key()))
            .bind(("created_at", disappointment.created_at.timestamp_millis()))
            .await
            .and_then(|response| response.check())
            .map_err(DatabaseError::QueryFailed)?;

        Ok(disappointment)
    }

    /// Every entry, oldest first
    pub async fn get_all(&self) -> Result<Vec<Disappointment>> {
        self.select(
            format!("SELECT {DISAPPOINTMENT_FIELDS} FROM disappointments ORDER BY created_at ASC"),
            None,
        )
        .await
    }

    pub async fn get_by_id(&self, id: DisappointmentId) -> Result<Disappointment> {
        let rows: Vec<DisappointmentRow> = self
            .db
            .query(format!(
                "SELECT {DISAPPOINTMENT_FIELDS} FROM type::thing('disappointments', $id)"
            ))
            .bind(("id", id.key()))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        match rows.into_iter().next() {
            Some(row) => row.try_into(),
            None => Err(CoreError::DisappointmentNotFound { id }),
        }
    }

    /// Entries submitted by `user`, oldest first
    pub async fn get_by_requester(&self, user: UserId) -> Result<Vec<Disappointment>> {
        self.select(
            format!(
                "SELECT {DISAPPOINTMENT_FIELDS} FROM disappointments \
                 WHERE from_user = type::thing('users', $user_id) ORDER BY created_at ASC"
            ),
            Some(user),
        )
        .await
    }

    /// Entries about `user`, oldest first
    pub async fn get_by_recipient(&self, user: UserId) -> Result<Vec<Disappointment>> {
        self.select(
            format!(
                "SELECT {DISAPPOINTMENT_FIELDS} FROM disappointments \
                 WHERE to_user = type::thing('users', $user_id) ORDER BY created_at ASC"
            ),
            Some(user),
        )
        .await
    }

    /// Number of entries about `user`
    pub async fn count_received(&self, user: UserId) -> Result<usize> {
        let counts: Vec<CountRow> = self
            .db
            .query(
                "SELECT count() FROM disappointments \
                 WHERE to_user = type::thing('users', $user_id) GROUP ALL",
            )
            .bind(("user_id", user.key()))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        Ok(counts.first().map(|c| c.count).unwrap_or(0))
    }

    /// Total number of entries
    pub async fn len(&self) -> Result<usize> {
        let counts: Vec<CountRow> = self
            .db
            .query("SELECT count() FROM disappointments GROUP ALL")
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        Ok(counts.first().map(|c| c.count).unwrap_or(0))
    }

    /// Remove an entry, returning it as it was before deletion
    pub async fn delete(&self, id: DisappointmentId) -> Result<Disappointment> {
        let existing = self.get_by_id(id).await?;

        self.db
            .query("DELETE type::thing('disappointments', $id)")
            .bind(("id", id.key()))
            .await
            .and_then(|response| response.check())
            .map_err(DatabaseError::QueryFailed)?;

        tracing::info!(
            "Deleted disappointment {} from {} to {}",
            id,
            existing.from_user.name,
            existing.to_user.name
        );
        Ok(existing)
    }

    async fn select(&self, query: String, user: Option<UserId>) -> Result<Vec<Disappointment>> {
        let mut request = self.db.query(query);
        if let Some(user) = user {
            request = request.bind(("user_id", user.key()));
        }

        let rows: Vec<DisappointmentRow> = request
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        rows.into_iter().map(Disappointment::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::client, registry::UserRegistry, users::RosterEntry};
    use pretty_assertions::assert_eq;

    async fn setup() -> (Ledger, User, User) {
        let db = client::create_test_db().await.unwrap();
        let registry = UserRegistry::load(db.clone(), 3).await.unwrap();
        let eldos = registry
            .register(&RosterEntry::new("Eldos", 896678539))
            .await
            .unwrap();
        let rustam = registry
            .register(&RosterEntry::new("Rustam", 756995300))
            .await
            .unwrap();
        (Ledger::new(db), eldos, rustam)
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let (ledger, eldos, rustam) = setup().await;
        let created = ledger.create(&eldos, &rustam, "late again").await.unwrap();

        let fetched = ledger.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched.reason, "late again");
        assert_eq!(fetched.from_user, eldos);
        assert_eq!(fetched.to_user, rustam);
        assert_eq!(
            fetched.created_at.timestamp_millis(),
            created.created_at.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn test_missing_entry() {
        let (ledger, _, _) = setup().await;
        let err = ledger
            .get_by_id(DisappointmentId::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::DisappointmentNotFound { .. }));
    }

    #[tokio::test]
    async fn test_recipient_listing_and_count() {
        let (ledger, eldos, rustam) = setup().await;
        ledger.create(&eldos, &rustam, "one").await.unwrap();
        // Distinct millisecond timestamps keep the ordering deterministic
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        ledger.create(&eldos, &rustam, "two").await.unwrap();
        ledger.create(&rustam, &eldos, "three").await.unwrap();

        let received = ledger.get_by_recipient(rustam.id).await.unwrap();
        let reasons: Vec<_> = received.iter().map(|d| d.reason.as_str()).collect();
        assert_eq!(reasons, vec!["one", "two"]);

        assert_eq!(ledger.count_received(rustam.id).await.unwrap(), 2);
        assert_eq!(ledger.count_received(eldos.id).await.unwrap(), 1);
        assert_eq!(ledger.len().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_counts_on_empty_ledger() {
        let (ledger, eldos, _) = setup().await;
        assert_eq!(ledger.count_received(eldos.id).await.unwrap(), 0);
        assert_eq!(ledger.len().await.unwrap(), 0);
        assert!(ledger.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_self_targeting_is_recorded() {
        let (ledger, eldos, _) = setup().await;
        let entry = ledger.create(&eldos, &eldos, "talking to myself").await.unwrap();
        let fetched = ledger.get_by_id(entry.id).await.unwrap();
        assert_eq!(fetched.from_user.id, fetched.to_user.id);
    }
}
