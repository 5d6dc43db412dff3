//! Statement builder
//!
//! One parameterized statement per datastore primitive. The SQL text is
//! built once per datastore from the validated table name; keys and values
//! are always bound, never formatted into the text.

use crate::config::TableName;
use crate::dialect::Dialect;
use crate::value::SqlValue;
use sqlds_core::Key;
use std::fmt;

/// SQL text plus its bound parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<SqlValue>,
}

impl Statement {
    /// Statement with parameters
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Statement {
            sql: sql.into(),
            params,
        }
    }

    /// SQL text
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound parameters, in placeholder order
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Split into text and parameters
    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.params)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Prepared SQL text for one table and dialect
#[derive(Debug, Clone)]
pub struct Statements {
    dialect: Dialect,
    table: TableName,
    get: String,
    has: String,
    size: String,
    put: String,
    delete: String,
}

impl Statements {
    /// Build every primitive's SQL for `table`
    pub fn new(dialect: Dialect, table: TableName) -> Self {
        let p1 = dialect.placeholder(1);
        let p2 = dialect.placeholder(2);
        let t = table.as_str();
        Statements {
            get: format!("SELECT data FROM {} WHERE key = {}", t, p1),
            has: format!("SELECT EXISTS(SELECT 1 FROM {} WHERE key = {})", t, p1),
            size: format!(
                "SELECT {} FROM {} WHERE key = {}",
                dialect.byte_length(),
                t,
                p1
            ),
            put: format!(
                "INSERT INTO {} (key, data) VALUES ({}, {}) \
                 ON CONFLICT (key) DO UPDATE SET data = excluded.data",
                t, p1, p2
            ),
            delete: format!("DELETE FROM {} WHERE key = {}", t, p1),
            dialect,
            table,
        }
    }

    /// Dialect the text was built for
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Table the text refers to
    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// Read one value
    pub fn get(&self, key: &Key) -> Statement {
        Statement::new(self.get.clone(), vec![key.as_str().into()])
    }

    /// Test for a row
    pub fn has(&self, key: &Key) -> Statement {
        Statement::new(self.has.clone(), vec![key.as_str().into()])
    }

    /// Read one value's byte length
    pub fn size(&self, key: &Key) -> Statement {
        Statement::new(self.size.clone(), vec![key.as_str().into()])
    }

    /// Insert or replace one value
    pub fn put(&self, key: &Key, value: &[u8]) -> Statement {
        Statement::new(self.put.clone(), vec![key.as_str().into(), value.into()])
    }

    /// Remove one row
    pub fn delete(&self, key: &Key) -> Statement {
        Statement::new(self.delete.clone(), vec![key.as_str().into()])
    }

    /// Create the table if it does not exist
    pub fn create_table(&self) -> Statement {
        Statement::new(
            format!(
                "CREATE TABLE IF NOT EXISTS {} (key {} PRIMARY KEY, data {})",
                self.table,
                self.dialect.key_type(),
                self.dialect.blob_type()
            ),
            Vec::new(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statements(dialect: Dialect) -> Statements {
        Statements::new(dialect, TableName::parse("blocks").unwrap())
    }

    #[test]
    fn test_postgres_text() {
        let s = statements(Dialect::Postgres);
        let key = Key::new("/a/b");
        assert_eq!(s.get(&key).sql(), "SELECT data FROM blocks WHERE key = $1");
        assert_eq!(
            s.has(&key).sql(),
            "SELECT EXISTS(SELECT 1 FROM blocks WHERE key = $1)"
        );
        assert_eq!(
            s.size(&key).sql(),
            "SELECT octet_length(data) FROM blocks WHERE key = $1"
        );
        assert_eq!(
            s.put(&key, b"v").sql(),
            "INSERT INTO blocks (key, data) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET data = excluded.data"
        );
        assert_eq!(s.delete(&key).sql(), "DELETE FROM blocks WHERE key = $1");
        assert_eq!(
            s.create_table().sql(),
            "CREATE TABLE IF NOT EXISTS blocks (key TEXT COLLATE \"C\" PRIMARY KEY, data BYTEA)"
        );
    }

    #[test]
    fn test_sqlite_text() {
        let s = statements(Dialect::Sqlite);
        let key = Key::new("/a");
        assert_eq!(s.get(&key).sql(), "SELECT data FROM blocks WHERE key = ?1");
        assert_eq!(
            s.size(&key).sql(),
            "SELECT length(data) FROM blocks WHERE key = ?1"
        );
        assert!(s.put(&key, b"v").sql().contains("VALUES (?1, ?2)"));
        assert!(s.create_table().sql().ends_with("data BLOB)"));
    }

    #[test]
    fn test_keys_and_values_are_bound() {
        let s = statements(Dialect::Postgres);
        let key = Key::new("/it's/a key");
        let put = s.put(&key, b"'; DROP TABLE blocks; --");
        assert!(!put.sql().contains("it's"));
        assert_eq!(
            put.params(),
            &[
                SqlValue::Text("/it's/a key".to_string()),
                SqlValue::Blob(b"'; DROP TABLE blocks; --".to_vec())
            ]
        );
    }

    #[test]
    fn test_keys_are_canonical() {
        let s = statements(Dialect::Sqlite);
        let get = s.get(&Key::new("a//b/"));
        assert_eq!(get.params(), &[SqlValue::Text("/a/b".to_string())]);
    }

    #[test]
    fn test_schema_qualified_table() {
        let s = Statements::new(Dialect::Postgres, TableName::parse("ipfs.blocks").unwrap());
        assert_eq!(
            s.delete(&Key::new("/a")).sql(),
            "DELETE FROM ipfs.blocks WHERE key = $1"
        );
    }
}
