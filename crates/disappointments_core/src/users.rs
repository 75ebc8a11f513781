use serde::{Deserialize, Serialize};

use crate::id::{ExternalId, UserId};

/// Quota a user starts with unless configured otherwise
pub const DEFAULT_QUOTA: i64 = 3;

/// A registered participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,

    /// Display name shown in menus, listings and reports
    pub name: String,

    /// Identity on the chat transport, unique across the registry
    pub external_id: ExternalId,

    /// Remaining disappointments this user may submit before the next reset
    pub quota: i64,
}

impl User {
    pub fn has_quota(&self) -> bool {
        self.quota > 0
    }
}

/// One `[[roster]]` entry: a participant known at bootstrap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    pub external_id: ExternalId,
}

impl RosterEntry {
    pub fn new(name: impl Into<String>, external_id: i64) -> Self {
        Self {
            name: name.into(),
            external_id: ExternalId(external_id),
        }
    }
}
