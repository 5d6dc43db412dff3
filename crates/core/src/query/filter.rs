//! Filter predicates
//!
//! Filters are caller-supplied logic, so they always run in memory over the
//! entries a backend returns; no backend tries to translate them.

use super::Entry;
use std::cmp::Ordering;
use std::fmt;

/// A predicate over query entries
pub trait Filter: fmt::Debug + Send + Sync {
    /// True if the entry should be kept
    fn filter(&self, entry: &Entry) -> bool;
}

/// Comparison operator used by the stock filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
}

impl Op {
    /// Does `ordering` (left compared to right) satisfy the operator
    pub fn matches(self, ordering: Ordering) -> bool {
        match self {
            Op::Equal => ordering == Ordering::Equal,
            Op::NotEqual => ordering != Ordering::Equal,
            Op::GreaterThan => ordering == Ordering::Greater,
            Op::GreaterThanOrEqual => ordering != Ordering::Less,
            Op::LessThan => ordering == Ordering::Less,
            Op::LessThanOrEqual => ordering != Ordering::Greater,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Op::Equal => "=",
            Op::NotEqual => "!=",
            Op::GreaterThan => ">",
            Op::GreaterThanOrEqual => ">=",
            Op::LessThan => "<",
            Op::LessThanOrEqual => "<=",
        };
        f.write_str(s)
    }
}

/// Compare the entry value against fixed bytes
///
/// Entries without a value (keys-only queries) compare as empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterValueCompare {
    /// Operator, entry value on the left
    pub op: Op,
    /// Right-hand side
    pub value: Vec<u8>,
}

impl FilterValueCompare {
    /// `value <op> rhs`
    pub fn new(op: Op, value: impl Into<Vec<u8>>) -> Self {
        FilterValueCompare {
            op,
            value: value.into(),
        }
    }
}

impl Filter for FilterValueCompare {
    fn filter(&self, entry: &Entry) -> bool {
        self.op
            .matches(entry.value_bytes().cmp(self.value.as_slice()))
    }
}

/// Compare the entry key against a fixed key string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterKeyCompare {
    /// Operator, entry key on the left
    pub op: Op,
    /// Right-hand side
    pub key: String,
}

impl FilterKeyCompare {
    /// `key <op> rhs`
    pub fn new(op: Op, key: impl Into<String>) -> Self {
        FilterKeyCompare {
            op,
            key: key.into(),
        }
    }
}

impl Filter for FilterKeyCompare {
    fn filter(&self, entry: &Entry) -> bool {
        self.op.matches(entry.key.as_str().cmp(self.key.as_str()))
    }
}

/// Keep entries whose key string starts with a raw prefix
///
/// This is a plain string prefix; `/a` keeps `/ab`. Use the query prefix for
/// path-aware matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterKeyPrefix {
    /// Required key prefix
    pub prefix: String,
}

impl FilterKeyPrefix {
    /// Keep keys starting with `prefix`
    pub fn new(prefix: impl Into<String>) -> Self {
        FilterKeyPrefix {
            prefix: prefix.into(),
        }
    }
}

impl Filter for FilterKeyPrefix {
    fn filter(&self, entry: &Entry) -> bool {
        entry.key.starts_with(&self.prefix)
    }
}

/// Wrap a closure as a filter
pub struct FilterFn<F>(pub F);

impl<F> Filter for FilterFn<F>
where
    F: Fn(&Entry) -> bool + Send + Sync,
{
    fn filter(&self, entry: &Entry) -> bool {
        (self.0)(entry)
    }
}

impl<F> fmt::Debug for FilterFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FilterFn")
    }
}
