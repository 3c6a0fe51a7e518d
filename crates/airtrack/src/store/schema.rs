//! `SQLite` schema definitions for the record store.
//!
//! The store keeps each logical collection in a single row of the
//! `collections` table, keyed by a fixed name and holding the whole
//! serialized JSON array. Writes are whole-collection replace.

/// SQL statement to create the collections table.
pub const CREATE_COLLECTIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS collections (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[CREATE_COLLECTIONS_TABLE, CREATE_METADATA_TABLE];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_collections_table_structure() {
        assert!(CREATE_COLLECTIONS_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_COLLECTIONS_TABLE.contains("value TEXT NOT NULL"));
    }

    #[test]
    fn test_metadata_table_structure() {
        assert!(CREATE_METADATA_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_METADATA_TABLE.contains("value TEXT NOT NULL"));
    }
}
