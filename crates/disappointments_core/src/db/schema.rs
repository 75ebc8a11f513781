//! Database schema definitions

/// SQL schema definitions for the database
pub struct Schema;

/// A table and the indexes defined on it
#[derive(Debug, Clone)]
pub struct TableDefinition {
    pub name: String,
    pub schema: String,
    pub indexes: Vec<String>,
}

impl Schema {
    /// Get all table definitions
    pub fn tables() -> Vec<TableDefinition> {
        vec![Self::system_metadata(), Self::users(), Self::disappointments()]
    }

    /// System metadata table
    pub fn system_metadata() -> TableDefinition {
        TableDefinition {
            name: "system_metadata".to_string(),
            schema: r#"
                DEFINE TABLE system_metadata SCHEMAFULL;
                DEFINE FIELD schema_version ON system_metadata TYPE int;
                DEFINE FIELD created_at ON system_metadata TYPE datetime;
                DEFINE FIELD updated_at ON system_metadata TYPE datetime;
            "#
            .to_string(),
            indexes: vec![],
        }
    }

    /// Registered participants
    pub fn users() -> TableDefinition {
        TableDefinition {
            name: "users".to_string(),
            schema: r#"
                DEFINE TABLE users SCHEMAFULL;
                DEFINE FIELD name ON users TYPE string;
                DEFINE FIELD external_id ON users TYPE int;
                DEFINE FIELD quota ON users TYPE int DEFAULT 3;
            "#
            .to_string(),
            indexes: vec![
                "DEFINE INDEX users_external_id ON users FIELDS external_id UNIQUE".to_string(),
            ],
        }
    }

    /// The ledger. `created_at` holds unix milliseconds so ordering is numeric.
    pub fn disappointments() -> TableDefinition {
        TableDefinition {
            name: "disappointments".to_string(),
            schema: r#"
                DEFINE TABLE disappointments SCHEMAFULL;
                DEFINE FIELD reason ON disappointments TYPE string;
                DEFINE FIELD from_user ON disappointments TYPE record<users>;
                DEFINE FIELD to_user ON disappointments TYPE record<users>;
                DEFINE FIELD created_at ON disappointments TYPE int;
            "#
            .to_string(),
            indexes: vec![
                "DEFINE INDEX disappointments_from ON disappointments FIELDS from_user"
                    .to_string(),
                "DEFINE INDEX disappointments_to ON disappointments FIELDS to_user".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_defines_itself() {
        for table in Schema::tables() {
            assert!(
                table
                    .schema
                    .contains(&format!("DEFINE TABLE {} SCHEMAFULL", table.name)),
                "{} schema does not define its own table",
                table.name
            );
            for index in &table.indexes {
                assert!(index.contains(&format!("ON {}", table.name)));
            }
        }
    }
}
