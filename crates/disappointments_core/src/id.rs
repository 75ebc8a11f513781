//! Type-safe record identifiers
//!
//! Every persisted record is keyed by a UUID. The key is rendered in its
//! compact hyphen-less form, which is what ends up in button payloads and
//! `/disappointment_{id}` commands.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;
use uuid::Uuid;

/// A type-safe ID bound to the table it keys
pub struct Id<T> {
    uuid: Uuid,
    _phantom: PhantomData<T>,
}

/// Trait for types that can be used as ID markers
pub trait IdType: Send + Sync + 'static {
    /// Table the ID keys records of
    const TABLE: &'static str;
}

/// Errors that can occur when parsing IDs
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum IdError {
    #[error("Invalid {table} id: {input:?}")]
    #[diagnostic(
        code(disappointments::id::invalid),
        help("IDs are 32 hexadecimal characters, as shown by the bot")
    )]
    Invalid {
        table: &'static str,
        input: String,
        #[source]
        cause: uuid::Error,
    },
}

impl<T: IdType> Id<T> {
    /// Create a new ID with a generated UUID
    pub fn generate() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self {
            uuid,
            _phantom: PhantomData,
        }
    }

    pub fn parse(s: &str) -> Result<Self, IdError> {
        Uuid::parse_str(s.trim())
            .map(Self::from_uuid)
            .map_err(|cause| IdError::Invalid {
                table: T::TABLE,
                input: s.to_string(),
                cause,
            })
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Key of the record in its table
    pub fn key(&self) -> String {
        self.uuid.simple().to_string()
    }

    pub fn table(&self) -> &'static str {
        T::TABLE
    }
}

// Manual impls so the marker type doesn't need to implement anything.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

impl<T: IdType> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", T::TABLE, self.uuid.simple())
    }
}

impl<T: IdType> Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uuid.simple())
    }
}

impl<T: IdType> FromStr for Id<T> {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<T: IdType> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key())
    }
}

impl<'de, T: IdType> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor<T>(PhantomData<T>);

        impl<T: IdType> Visitor<'_> for IdVisitor<T> {
            type Value = Id<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a {} record key", T::TABLE)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Id::parse(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(IdVisitor(PhantomData))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserIdType;

impl IdType for UserIdType {
    const TABLE: &'static str = "users";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisappointmentIdType;

impl IdType for DisappointmentIdType {
    const TABLE: &'static str = "disappointments";
}

pub type UserId = Id<UserIdType>;
pub type DisappointmentId = Id<DisappointmentIdType>;

/// Identity of a participant on the chat transport (a Discord user id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(pub i64);

impl Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ExternalId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_compact_hex() {
        let id = DisappointmentId::generate();
        let key = id.key();
        assert_eq!(key.len(), 32);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id.to_string(), key);
    }

    #[test]
    fn test_parse_accepts_both_forms() {
        let id = UserId::generate();
        assert_eq!(UserId::parse(&id.key()).unwrap(), id);
        assert_eq!(UserId::parse(&id.uuid().to_string()).unwrap(), id);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = DisappointmentId::parse("not-an-id").unwrap_err();
        assert!(err.to_string().contains("disappointments"));
    }

    #[test]
    fn test_serde_uses_key() {
        let id = UserId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.key()));
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
