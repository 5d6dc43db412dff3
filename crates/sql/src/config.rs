//! Datastore configuration
//!
//! A datastore is opened from one connection string plus a handful of named
//! options, each with a default. The configuration can be built in code or
//! loaded from a TOML file:
//!
//! ```toml
//! url = "sqlite:///var/lib/blocks.db"
//! table = "blocks"
//! max_connections = 10
//! connection_timeout_ms = 30000
//! busy_timeout_ms = 5000
//! create_table = false
//! ```
//!
//! `postgres://` and `postgresql://` connection strings select the Postgres
//! engine; everything else names a SQLite database.
//!
//! The table name is the only identifier ever formatted into SQL text, so it
//! is validated here, once, against a strict identifier allow-list.

use serde::{Deserialize, Serialize};
use sqlds_core::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Table used when none is configured.
pub const DEFAULT_TABLE: &str = "blocks";

/// Maximum length of one identifier part (Postgres `NAMEDATALEN - 1`).
pub const MAX_IDENTIFIER_LEN: usize = 63;

const POSTGRES_SCHEMES: [&str; 2] = ["postgres://", "postgresql://"];

/// Whole milliseconds, saturating for durations that do not fit
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_connection_timeout_ms() -> u64 {
    30_000
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// Datastore configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlConfig {
    /// Connection string: `postgres://...`, `sqlite:<path>`,
    /// `sqlite://<path>`, a bare path, or `sqlite::memory:`
    pub url: String,
    /// Table holding `(key, data)` rows (default: `blocks`)
    #[serde(default = "default_table")]
    pub table: String,
    /// Pool size (default: 10)
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// How long to wait for a pooled connection (default: 30000)
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
    /// How long SQLite waits on a locked database (default: 5000)
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Run `CREATE TABLE IF NOT EXISTS` when opening (default: false)
    #[serde(default)]
    pub create_table: bool,
}

impl SqlConfig {
    /// Configuration with defaults for everything but the connection string
    pub fn new(url: impl Into<String>) -> Self {
        SqlConfig {
            url: url.into(),
            table: default_table(),
            max_connections: default_max_connections(),
            connection_timeout_ms: default_connection_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            create_table: false,
        }
    }

    /// Use another table
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Set the pool size
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Set the pool checkout timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout_ms = millis(timeout);
        self
    }

    /// Set the SQLite busy timeout
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = millis(timeout);
        self
    }

    /// Create the table on open if it does not exist
    pub fn with_create_table(mut self, create_table: bool) -> Self {
        self.create_table = create_table;
        self
    }

    /// Pool checkout timeout
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    /// SQLite busy timeout
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Validated table name
    ///
    /// # Errors
    ///
    /// Returns an error if the configured name is not a plain identifier.
    pub fn table_name(&self) -> Result<TableName> {
        TableName::parse(&self.table)
    }

    /// Which engine the connection string names
    ///
    /// # Errors
    ///
    /// Returns an error for empty or unrecognized connection strings.
    pub fn target(&self) -> Result<Target> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(Error::InvalidConfig("connection string is empty".to_string()));
        }
        if POSTGRES_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
            return Ok(Target::Postgres(url.to_string()));
        }
        let path = if let Some(rest) = url.strip_prefix("sqlite://") {
            rest
        } else if let Some(rest) = url.strip_prefix("sqlite:") {
            rest
        } else if url.contains("://") {
            return Err(Error::InvalidConfig(format!(
                "unsupported connection string '{}': expected a postgres:// url, a sqlite: url or a file path",
                url
            )));
        } else {
            url
        };
        match path {
            "" => Err(Error::InvalidConfig(format!(
                "connection string '{}' has no database path",
                url
            ))),
            ":memory:" => Ok(Target::Sqlite(SqliteTarget::Memory)),
            path => Ok(Target::Sqlite(SqliteTarget::File(PathBuf::from(path)))),
        }
    }

    /// Where the SQLite database lives
    ///
    /// # Errors
    ///
    /// Returns an error unless the connection string names a SQLite database.
    pub fn sqlite_target(&self) -> Result<SqliteTarget> {
        match self.target()? {
            Target::Sqlite(target) => Ok(target),
            Target::Postgres(url) => Err(Error::InvalidConfig(format!(
                "connection string '{}' names a Postgres server, not a SQLite database",
                url
            ))),
        }
    }

    /// Check every option
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid option.
    pub fn validate(&self) -> Result<()> {
        self.table_name()?;
        self.target()?;
        if self.max_connections == 0 {
            return Err(Error::InvalidConfig(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be parsed or is invalid.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: SqlConfig = toml::from_str(content)
            .map_err(|e| Error::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML config file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Serialize to TOML
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::InvalidConfig(format!("Failed to serialize config: {}", e)))
    }
}

/// Engine and location named by a connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A SQLite database
    Sqlite(SqliteTarget),
    /// A Postgres server, with its connection string
    Postgres(String),
}

/// Location of a SQLite database
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqliteTarget {
    /// Private in-memory database
    Memory,
    /// Database file
    File(PathBuf),
}

/// A table name that is safe to format into SQL
///
/// Accepts `name` or `schema.name`, where each part matches
/// `[A-Za-z_][A-Za-z0-9_]*` and is at most 63 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Validate a table name
    ///
    /// # Errors
    ///
    /// Returns an error if any part is empty, too long, or contains
    /// characters outside the identifier allow-list.
    pub fn parse(name: &str) -> Result<Self> {
        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() > 2 {
            return Err(Error::InvalidConfig(format!(
                "table name '{}' has too many parts",
                name
            )));
        }
        for part in parts {
            validate_identifier(part).map_err(|reason| {
                Error::InvalidConfig(format!("table name '{}' {}", name, reason))
            })?;
        }
        Ok(TableName(name.to_string()))
    }

    /// The validated name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TableName {
    fn default() -> Self {
        TableName(DEFAULT_TABLE.to_string())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_identifier(part: &str) -> std::result::Result<(), &'static str> {
    let mut chars = part.chars();
    match chars.next() {
        None => return Err("has an empty part"),
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        Some(_) => return Err("must start with a letter or underscore"),
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("may only contain letters, digits and underscores");
    }
    if part.len() > MAX_IDENTIFIER_LEN {
        return Err("is longer than 63 bytes");
    }
    Ok(())
}
