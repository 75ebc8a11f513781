use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{id::DisappointmentId, users::User};

/// Longest reason the ledger accepts, in characters
pub const MAX_REASON_CHARS: usize = 255;

/// A recorded complaint from one user about another
///
/// Both user references are resolved: ledger queries always join the
/// `users` table so callers never see a dangling link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disappointment {
    pub id: DisappointmentId,
    pub reason: String,
    pub from_user: User,
    pub to_user: User,
    pub created_at: DateTime<Utc>,
}

impl Disappointment {
    pub fn is_authored_by(&self, user: &User) -> bool {
        self.from_user.id == user.id
    }
}
