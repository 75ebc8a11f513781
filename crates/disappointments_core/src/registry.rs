//! User Registry
//!
//! The fixed roster of participants. Besides record lookups the registry
//! keeps an in-process set of known external identities so the transport can
//! reject strangers without a database round trip. The set is rebuilt after
//! every mutation made through the registry.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{
    CoreError, Result,
    db::{DatabaseError, Db},
    id::{ExternalId, UserId},
    users::{RosterEntry, User},
};

/// Projection shared by every user query
pub(crate) const USER_FIELDS: &str = "record::id(id) AS id, name, external_id, quota";

#[derive(Clone)]
pub struct UserRegistry {
    db: Db,
    known: Arc<RwLock<HashSet<ExternalId>>>,
    default_quota: i64,
}

impl UserRegistry {
    /// Build the registry and populate the identity cache
    pub async fn load(db: Db, default_quota: i64) -> Result<Self> {
        let registry = Self {
            db,
            known: Arc::new(RwLock::new(HashSet::new())),
            default_quota,
        };
        registry.reload().await?;
        Ok(registry)
    }

    /// Rebuild the identity cache from the store
    pub async fn reload(&self) -> Result<()> {
        let users = self.all().await?;
        let ids: HashSet<ExternalId> = users.iter().map(|u| u.external_id).collect();
        let count = ids.len();
        *self.known.write() = ids;
        tracing::debug!("User identity cache holds {} entries", count);
        Ok(())
    }

    pub fn is_known(&self, external_id: ExternalId) -> bool {
        self.known.read().contains(&external_id)
    }

    /// Insert every roster entry whose identity isn't registered yet.
    ///
    /// Returns how many users were created. Existing users are left as they
    /// are, quota included.
    pub async fn seed(&self, roster: &[RosterEntry]) -> Result<usize> {
        let mut created = 0;
        for entry in roster {
            match self.find_by_external(entry.external_id).await? {
                Some(_) => {
                    tracing::debug!(
                        "Name: {} external id {} already exists",
                        entry.name,
                        entry.external_id
                    );
                }
                None => {
                    self.insert(entry).await?;
                    tracing::info!(
                        "Registered {} (external id {})",
                        entry.name,
                        entry.external_id
                    );
                    created += 1;
                }
            }
        }
        self.reload().await?;
        Ok(created)
    }

    /// Register a single participant, returning the existing record if the
    /// identity is already known
    pub async fn register(&self, entry: &RosterEntry) -> Result<User> {
        let user = match self.find_by_external(entry.external_id).await? {
            Some(existing) => existing,
            None => self.insert(entry).await?,
        };
        self.reload().await?;
        Ok(user)
    }

    async fn insert(&self, entry: &RosterEntry) -> Result<User> {
        let user = User {
            id: UserId::generate(),
            name: entry.name.clone(),
            external_id: entry.external_id,
            quota: self.default_quota,
        };

        self.db
            .query(
                "CREATE type::thing('users', $id) SET name = $name, external_id = $external_id, quota = $quota",
            )
            .bind(("id", user.id.key()))
            .bind(("name", user.name.clone()))
            .bind(("external_id", user.external_id.0))
            .bind(("quota", user.quota))
            .await
            .and_then(|response| response.check())
            .map_err(DatabaseError::QueryFailed)?;

        Ok(user)
    }

    /// Every registered user, ordered by name
    pub async fn all(&self) -> Result<Vec<User>> {
        let users: Vec<User> = self
            .db
            .query(format!(
                "SELECT {USER_FIELDS} FROM users ORDER BY name ASC"
            ))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;
        Ok(users)
    }

    /// Look a user up by record id, failing with `UserNotFound`
    pub async fn get(&self, id: UserId) -> Result<User> {
        let users: Vec<User> = self
            .db
            .query(format!("SELECT {USER_FIELDS} FROM type::thing('users', $id)"))
            .bind(("id", id.key()))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        users
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::unknown_user(id))
    }

    /// Look a user up by transport identity, failing with `UserNotFound`
    pub async fn get_by_external(&self, external_id: ExternalId) -> Result<User> {
        self.find_by_external(external_id)
            .await?
            .ok_or_else(|| CoreError::unknown_external(external_id))
    }

    async fn find_by_external(&self, external_id: ExternalId) -> Result<Option<User>> {
        let users: Vec<User> = self
            .db
            .query(format!(
                "SELECT {USER_FIELDS} FROM users WHERE external_id = $external_id LIMIT 1"
            ))
            .bind(("external_id", external_id.0))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;
        Ok(users.into_iter().next())
    }
}
