//! SQL dialect differences
//!
//! Everything the statement builder and translator emit is standard SQL
//! except for the handful of fragments below.

use std::fmt;

/// Target SQL engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// PostgreSQL (`$n` placeholders, `BYTEA`, `LIKE ... ESCAPE`)
    Postgres,
    /// SQLite (`?n` placeholders, `BLOB`, `GLOB`)
    Sqlite,
}

impl Dialect {
    /// Placeholder for the `index`th bound parameter (1-based)
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            Dialect::Sqlite => format!("?{}", index),
        }
    }

    /// Byte length of the `data` column
    pub fn byte_length(self) -> &'static str {
        match self {
            Dialect::Postgres => "octet_length(data)",
            Dialect::Sqlite => "length(data)",
        }
    }

    /// Column type for keys
    ///
    /// Postgres compares text under the database collation unless told
    /// otherwise; the `C` collation makes `ORDER BY key` bytewise as it is on
    /// SQLite.
    pub fn key_type(self) -> &'static str {
        match self {
            Dialect::Postgres => "TEXT COLLATE \"C\"",
            Dialect::Sqlite => "TEXT",
        }
    }

    /// Column type for values
    pub fn blob_type(self) -> &'static str {
        match self {
            Dialect::Postgres => "BYTEA",
            Dialect::Sqlite => "BLOB",
        }
    }

    /// `WHERE` clause matching keys that start with the bound pattern
    pub fn prefix_clause(self, placeholder: &str) -> String {
        match self {
            Dialect::Postgres => format!("key LIKE {} ESCAPE '\\'", placeholder),
            Dialect::Sqlite => format!("key GLOB {}", placeholder),
        }
    }

    /// Pattern matching every key that starts with `prefix` literally
    ///
    /// SQLite's `LIKE` is case-insensitive for ASCII, so the SQLite dialect
    /// uses `GLOB` and bracket-escapes its wildcards instead.
    pub fn prefix_pattern(self, prefix: &str) -> String {
        let mut pattern = String::with_capacity(prefix.len() + 2);
        match self {
            Dialect::Postgres => {
                for c in prefix.chars() {
                    if matches!(c, '\\' | '%' | '_') {
                        pattern.push('\\');
                    }
                    pattern.push(c);
                }
                pattern.push('%');
            }
            Dialect::Sqlite => {
                for c in prefix.chars() {
                    match c {
                        '*' => pattern.push_str("[*]"),
                        '?' => pattern.push_str("[?]"),
                        '[' => pattern.push_str("[[]"),
                        c => pattern.push(c),
                    }
                }
                pattern.push('*');
            }
        }
        pattern
    }

    /// Whether `OFFSET` must be preceded by a `LIMIT`
    pub fn offset_requires_limit(self) -> bool {
        matches!(self, Dialect::Sqlite)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Postgres => f.write_str("postgres"),
            Dialect::Sqlite => f.write_str("sqlite"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(Dialect::Postgres.placeholder(1), "$1");
        assert_eq!(Dialect::Sqlite.placeholder(2), "?2");
    }

    #[test]
    fn test_postgres_prefix_pattern_escapes_like_wildcards() {
        assert_eq!(Dialect::Postgres.prefix_pattern("/a/"), "/a/%");
        assert_eq!(
            Dialect::Postgres.prefix_pattern("/100%_off\\x/"),
            "/100\\%\\_off\\\\x/%"
        );
    }

    #[test]
    fn test_sqlite_prefix_pattern_escapes_glob_wildcards() {
        assert_eq!(Dialect::Sqlite.prefix_pattern("/a/"), "/a/*");
        assert_eq!(Dialect::Sqlite.prefix_pattern("/what?/[x]*/"), "/what[?]/[[]x][*]/*");
        // LIKE wildcards are literal under GLOB
        assert_eq!(Dialect::Sqlite.prefix_pattern("/a_b%/"), "/a_b%/*");
    }

    #[test]
    fn test_prefix_clause() {
        assert_eq!(Dialect::Postgres.prefix_clause("$1"), "key LIKE $1 ESCAPE '\\'");
        assert_eq!(Dialect::Sqlite.prefix_clause("?1"), "key GLOB ?1");
    }

    #[test]
    fn test_engine_specific_fragments() {
        assert_eq!(Dialect::Postgres.byte_length(), "octet_length(data)");
        assert_eq!(Dialect::Sqlite.byte_length(), "length(data)");
        assert_eq!(Dialect::Postgres.key_type(), "TEXT COLLATE \"C\"");
        assert_eq!(Dialect::Sqlite.key_type(), "TEXT");
        assert_eq!(Dialect::Postgres.blob_type(), "BYTEA");
        assert_eq!(Dialect::Sqlite.blob_type(), "BLOB");
        assert!(Dialect::Sqlite.offset_requires_limit());
        assert!(!Dialect::Postgres.offset_requires_limit());
    }
}
