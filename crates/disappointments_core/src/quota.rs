//! Quota Policy
//!
//! Every submission costs its author one point. The debit is a single
//! conditional update so two concurrent submissions can never spend the
//! same point; the scheduled reset puts every user back at a fixed amount.

use serde::Deserialize;

use crate::{
    CoreError, Result,
    db::{DatabaseError, Db},
    id::UserId,
    users::User,
};

#[derive(Debug, Deserialize)]
struct QuotaRow {
    quota: i64,
}

#[derive(Clone)]
pub struct QuotaPolicy {
    db: Db,
    reset_amount: i64,
}

impl QuotaPolicy {
    pub fn new(db: Db, reset_amount: i64) -> Self {
        Self { db, reset_amount }
    }

    pub fn reset_amount(&self) -> i64 {
        self.reset_amount
    }

    /// Fail with `InsufficientQuota` when the user has nothing left to spend
    pub fn check(&self, user: &User) -> Result<()> {
        if user.has_quota() {
            Ok(())
        } else {
            Err(CoreError::InsufficientQuota {
                user: user.id,
                quota: user.quota,
            })
        }
    }

    /// Debit one point, returning the remaining quota.
    ///
    /// The check and the decrement happen in the same statement; if the
    /// stored quota is already exhausted nothing is written.
    pub async fn spend(&self, user: UserId) -> Result<i64> {
        let rows: Vec<QuotaRow> = self
            .db
            .query("UPDATE type::thing('users', $id) SET quota -= 1 WHERE quota > 0 RETURN quota")
            .bind(("id", user.key()))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        match rows.into_iter().next() {
            Some(row) => Ok(row.quota),
            None => {
                let quota = self.current(user).await?;
                Err(CoreError::InsufficientQuota { user, quota })
            }
        }
    }

    /// Give back a point taken by [`spend`](Self::spend)
    pub async fn refund(&self, user: UserId) -> Result<i64> {
        let rows: Vec<QuotaRow> = self
            .db
            .query("UPDATE type::thing('users', $id) SET quota += 1 RETURN quota")
            .bind(("id", user.key()))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        rows.into_iter()
            .next()
            .map(|row| row.quota)
            .ok_or_else(|| CoreError::unknown_user(user))
    }

    /// Stored quota of a single user
    pub async fn current(&self, user: UserId) -> Result<i64> {
        let rows: Vec<QuotaRow> = self
            .db
            .query("SELECT quota FROM type::thing('users', $id)")
            .bind(("id", user.key()))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        rows.into_iter()
            .next()
            .map(|row| row.quota)
            .ok_or_else(|| CoreError::unknown_user(user))
    }

    /// Set every user's quota to the configured reset amount
    pub async fn reset_all(&self) -> Result<usize> {
        self.reset_all_to(self.reset_amount).await
    }

    /// Set every user's quota to `amount`, returning how many users were touched
    pub async fn reset_all_to(&self, amount: i64) -> Result<usize> {
        let rows: Vec<QuotaRow> = self
            .db
            .query("UPDATE users SET quota = $amount RETURN quota")
            .bind(("amount", amount))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        tracing::info!("Quota reset to {} for {} users", amount, rows.len());
        Ok(rows.len())
    }
}
