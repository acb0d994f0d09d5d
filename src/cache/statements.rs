//! SQL Statements Module
//!
//! Validated table names and the parameterized statement text for one table.
//! Only the table identifier is spliced into SQL; every value is a bound
//! parameter.

use std::fmt;

use crate::error::{CacheError, Result};

/// Longest accepted table identifier.
pub const MAX_TABLE_NAME_LENGTH: usize = 63;

/// Liveness predicate shared by every read. Binds one parameter: `now`.
const LIVE: &str = "(expires_at IS NULL OR expires_at > ?)";

// == Table Name ==
/// A table identifier that is safe to splice into statement text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Validates `name` as `[A-Za-z_][A-Za-z0-9_]*`, at most 63 characters.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let mut chars = name.chars();
        let valid_head = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);
        let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !valid_head || !valid_tail || name.len() > MAX_TABLE_NAME_LENGTH {
            return Err(CacheError::InvalidTableName(name));
        }
        Ok(Self(name))
    }

    /// Returns the bare identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Statements ==
/// Statement text for every operation against one table, built once.
#[derive(Debug, Clone)]
pub struct Statements {
    /// Head of the batch read; the caller appends the bound key list and
    /// the liveness predicate.
    pub select_in_prefix: String,
    pub select_live_value: String,
    pub select_row: String,
    pub insert: String,
    pub update: String,
    pub update_value: String,
    pub claim: String,
    pub delete: String,
    pub delete_expired_key: String,
    pub soft_delete: String,
    pub purge_expired: String,
    pub flush: String,
    pub stats: String,
    pub create_table: String,
    pub create_key_index: String,
    pub create_expiry_index: String,
    pub drop_table: String,
}

impl Statements {
    /// Builds the statement set for `table`.
    pub fn for_table(table: &TableName) -> Self {
        let t = format!("\"{}\"", table.as_str());

        Self {
            select_in_prefix: format!("SELECT key, value FROM {t} WHERE key IN "),
            select_live_value: format!("SELECT value FROM {t} WHERE key = ? AND {LIVE}"),
            select_row: format!(
                "SELECT key, value, updated_at, expires_at FROM {t} WHERE key = ?"
            ),
            insert: format!(
                "INSERT INTO {t} (key, value, updated_at, expires_at) VALUES (?, ?, ?, ?)"
            ),
            update: format!(
                "UPDATE {t} SET value = ?, updated_at = ?, expires_at = ? WHERE key = ?"
            ),
            update_value: format!("UPDATE {t} SET value = ?, updated_at = ? WHERE key = ?"),
            // Takes the write lock without changing anything
            claim: format!("UPDATE {t} SET updated_at = updated_at WHERE key = ?"),
            delete: format!("DELETE FROM {t} WHERE key = ?"),
            delete_expired_key: format!(
                "DELETE FROM {t} WHERE key = ? AND expires_at IS NOT NULL AND expires_at <= ?"
            ),
            soft_delete: format!("UPDATE {t} SET expires_at = ? WHERE key = ? AND {LIVE}"),
            purge_expired: format!(
                "DELETE FROM {t} WHERE expires_at IS NOT NULL AND expires_at <= ?"
            ),
            flush: format!("DELETE FROM {t}"),
            stats: format!(
                "SELECT COUNT(*) AS total_rows, \
                 COALESCE(SUM(CASE WHEN expires_at IS NOT NULL AND expires_at <= ? \
                 THEN 1 ELSE 0 END), 0) AS expired_entries FROM {t}"
            ),
            create_table: format!(
                "CREATE TABLE IF NOT EXISTS {t} (\
                 key TEXT NOT NULL, \
                 value TEXT NOT NULL, \
                 expires_at INTEGER, \
                 updated_at INTEGER NOT NULL)"
            ),
            create_key_index: format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS \"{name}_key_idx\" ON {t} (key)",
                name = table.as_str()
            ),
            create_expiry_index: format!(
                "CREATE INDEX IF NOT EXISTS \"{name}_expires_at_idx\" ON {t} (expires_at)",
                name = table.as_str()
            ),
            drop_table: format!("DROP TABLE IF EXISTS {t}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_accepts_identifiers() {
        assert!(TableName::new("cache").is_ok());
        assert!(TableName::new("_cache_2").is_ok());
        assert!(TableName::new("a".repeat(MAX_TABLE_NAME_LENGTH)).is_ok());
    }

    #[test]
    fn test_table_name_rejects_injection() {
        for bad in ["", "1cache", "cache; DROP TABLE x", "ca-che", "c\"x", "cache entries"] {
            assert!(
                matches!(TableName::new(bad), Err(CacheError::InvalidTableName(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(TableName::new("a".repeat(MAX_TABLE_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_statements_quote_table() {
        let table = TableName::new("entries").unwrap();
        let stmts = Statements::for_table(&table);

        assert!(stmts.insert.starts_with("INSERT INTO \"entries\""));
        assert!(stmts.create_key_index.contains("\"entries_key_idx\""));
        assert!(stmts.select_live_value.contains("expires_at > ?"));
    }

    #[test]
    fn test_statements_bind_every_value() {
        let table = TableName::new("entries").unwrap();
        let stmts = Statements::for_table(&table);

        assert_eq!(stmts.insert.matches('?').count(), 4);
        assert_eq!(stmts.update.matches('?').count(), 4);
        assert_eq!(stmts.soft_delete.matches('?').count(), 3);
        assert_eq!(stmts.delete_expired_key.matches('?').count(), 2);
    }
}
