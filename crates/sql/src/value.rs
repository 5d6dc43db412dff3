//! Bound parameters and decoded rows
//!
//! Statements carry their parameters as [`SqlValue`]s and backends hand rows
//! back as [`Row`]s, so the statement builder and translator never depend on
//! a particular driver's value types.

use crate::error::SqlError;

/// A bound parameter or a decoded column
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL
    Null,
    /// Boolean (Postgres `bool`)
    Bool(bool),
    /// 64-bit integer
    Integer(i64),
    /// Floating point
    Real(f64),
    /// Text
    Text(String),
    /// Bytes
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Name of the value's type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "bool",
            SqlValue::Integer(_) => "integer",
            SqlValue::Real(_) => "real",
            SqlValue::Text(_) => "text",
            SqlValue::Blob(_) => "blob",
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&[u8]> for SqlValue {
    fn from(value: &[u8]) -> Self {
        SqlValue::Blob(value.to_vec())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Blob(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

/// One result row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row(Vec<SqlValue>);

impl Row {
    /// Row from its columns
    pub fn new(columns: Vec<SqlValue>) -> Self {
        Row(columns)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a row without columns
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw columns
    pub fn columns(&self) -> &[SqlValue] {
        &self.0
    }

    fn column(&self, index: usize) -> Result<&SqlValue, SqlError> {
        self.0.get(index).ok_or_else(|| SqlError::Column {
            index,
            message: format!("row has only {} columns", self.0.len()),
        })
    }

    fn mismatch(index: usize, expected: &str, found: &SqlValue) -> SqlError {
        SqlError::Column {
            index,
            message: format!("expected {}, found {}", expected, found.type_name()),
        }
    }

    /// Text column
    pub fn text(&self, index: usize) -> Result<String, SqlError> {
        match self.column(index)? {
            SqlValue::Text(s) => Ok(s.clone()),
            other => Err(Self::mismatch(index, "text", other)),
        }
    }

    /// Bytes column; NULL reads as empty
    pub fn blob(&self, index: usize) -> Result<Vec<u8>, SqlError> {
        match self.column(index)? {
            SqlValue::Blob(b) => Ok(b.clone()),
            SqlValue::Null => Ok(Vec::new()),
            other => Err(Self::mismatch(index, "blob", other)),
        }
    }

    /// Integer column
    pub fn integer(&self, index: usize) -> Result<i64, SqlError> {
        match self.column(index)? {
            SqlValue::Integer(i) => Ok(*i),
            other => Err(Self::mismatch(index, "integer", other)),
        }
    }

    /// Byte length column; NULL reads as zero, matching [`Row::blob`]
    pub fn size(&self, index: usize) -> Result<usize, SqlError> {
        match self.column(index)? {
            SqlValue::Integer(i) => usize::try_from(*i).map_err(|_| SqlError::Column {
                index,
                message: format!("negative size {}", i),
            }),
            SqlValue::Null => Ok(0),
            other => Err(Self::mismatch(index, "integer", other)),
        }
    }

    /// Boolean column; SQLite reports booleans as integers
    pub fn boolean(&self, index: usize) -> Result<bool, SqlError> {
        match self.column(index)? {
            SqlValue::Bool(b) => Ok(*b),
            SqlValue::Integer(i) => Ok(*i != 0),
            other => Err(Self::mismatch(index, "bool", other)),
        }
    }

    /// Take ownership of the columns
    pub fn into_columns(self) -> Vec<SqlValue> {
        self.0
    }
}

impl From<Vec<SqlValue>> for Row {
    fn from(columns: Vec<SqlValue>) -> Self {
        Row(columns)
    }
}
