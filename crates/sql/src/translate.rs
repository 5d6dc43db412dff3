//! Query translator
//!
//! Turns a [`Query`] into one `SELECT` plus a residual plan of naive stages.
//!
//! What goes into SQL:
//! - the projection (`key`, `key` + byte length, or `key` + `data`)
//! - a prefix match on `canonical_prefix + "/"`, followed by `ORDER BY key`
//! - `LIMIT`/`OFFSET`, but only when the query has no filters and no orders
//!
//! Filters and orders are opaque predicates and comparators, so they always
//! run in memory. When any are present, offset and limit run in memory too,
//! after them.

use crate::statement::{Statement, Statements};
use crate::value::SqlValue;
use sqlds_core::key::{Key, SEPARATOR};
use sqlds_core::query::{naive_filter, naive_limit, naive_offset, naive_order, Filter, Order};
use sqlds_core::{Error, Query, Result, Results};
use std::sync::Arc;

/// Columns selected by a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// `key`
    Keys,
    /// `key`, byte length of `data`
    KeysAndSizes,
    /// `key`, `data`; `sizes` fills the entry size from the value
    KeysAndValues {
        /// Whether entries carry their value's size
        sizes: bool,
    },
}

impl Projection {
    /// Projection a query asks for
    pub fn of(query: &Query) -> Self {
        match (query.keys_only, query.returns_sizes) {
            (true, true) => Projection::KeysAndSizes,
            (true, false) => Projection::Keys,
            (false, sizes) => Projection::KeysAndValues { sizes },
        }
    }

    /// Number of columns in each row
    pub fn columns(self) -> usize {
        match self {
            Projection::Keys => 1,
            Projection::KeysAndSizes | Projection::KeysAndValues { .. } => 2,
        }
    }
}

/// In-memory stages left over after translation
#[derive(Debug, Clone, Default)]
pub struct Residual {
    /// Predicates, applied in order
    pub filters: Vec<Arc<dyn Filter>>,
    /// Sort comparators
    pub orders: Vec<Arc<dyn Order>>,
    /// Entries to skip after filtering and sorting
    pub offset: usize,
    /// Entries to return after filtering and sorting (0 = unbounded)
    pub limit: usize,
}

impl Residual {
    /// True when the SQL answers the query on its own
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.orders.is_empty() && self.offset == 0 && self.limit == 0
    }

    /// Stack the stages over `results`: filter, order, offset, limit
    pub fn apply(&self, results: Results) -> Results {
        let mut results = results;
        for filter in &self.filters {
            results = naive_filter(results, Arc::clone(filter));
        }
        results = naive_order(results, &self.orders);
        if self.offset != 0 {
            results = naive_offset(results, self.offset);
        }
        if self.limit != 0 {
            results = naive_limit(results, self.limit);
        }
        results
    }
}

/// A translated query
#[derive(Debug, Clone)]
pub struct QueryPlan {
    /// The `SELECT` to run
    pub statement: Statement,
    /// Shape of its rows
    pub projection: Projection,
    /// Stages to run over the decoded entries
    pub residual: Residual,
}

impl QueryPlan {
    /// True when limit and offset are part of the SQL
    pub fn pushes_down_pagination(&self) -> bool {
        self.residual.offset == 0 && self.residual.limit == 0
    }
}

fn bound_count(what: &str, n: usize) -> Result<SqlValue> {
    i64::try_from(n)
        .map(SqlValue::Integer)
        .map_err(|_| Error::InvalidQuery(format!("{} {} does not fit in a 64-bit integer", what, n)))
}

/// Translate `query` against `statements`' table and dialect
///
/// # Errors
///
/// [`Error::InvalidQuery`] if a limit or offset cannot be bound as a signed
/// 64-bit integer.
pub fn translate(statements: &Statements, query: &Query) -> Result<QueryPlan> {
    let dialect = statements.dialect();
    let projection = Projection::of(query);
    let mut params = Vec::new();

    let mut sql = match projection {
        Projection::Keys => "SELECT key".to_string(),
        Projection::KeysAndSizes => format!("SELECT key, {}", dialect.byte_length()),
        Projection::KeysAndValues { .. } => "SELECT key, data".to_string(),
    };
    sql.push_str(" FROM ");
    sql.push_str(statements.table().as_str());

    if !query.prefix.is_empty() {
        let prefix = Key::new(&query.prefix);
        if !prefix.is_root() {
            params.push(SqlValue::Text(
                dialect.prefix_pattern(&format!("{}{}", prefix, SEPARATOR)),
            ));
            sql.push_str(" WHERE ");
            sql.push_str(&dialect.prefix_clause(&dialect.placeholder(params.len())));
            sql.push_str(" ORDER BY key");
        }
    }

    let mut residual = Residual {
        filters: query.filters.clone(),
        orders: query.orders.clone(),
        offset: 0,
        limit: 0,
    };

    if query.needs_naive_pagination() {
        residual.offset = query.offset;
        residual.limit = query.limit;
    } else {
        if query.limit != 0 {
            params.push(bound_count("limit", query.limit)?);
            sql.push_str(" LIMIT ");
            sql.push_str(&dialect.placeholder(params.len()));
        } else if query.offset != 0 && dialect.offset_requires_limit() {
            sql.push_str(" LIMIT -1");
        }
        if query.offset != 0 {
            params.push(bound_count("offset", query.offset)?);
            sql.push_str(" OFFSET ");
            sql.push_str(&dialect.placeholder(params.len()));
        }
    }

    Ok(QueryPlan {
        statement: Statement::new(sql, params),
        projection,
        residual,
    })
}
