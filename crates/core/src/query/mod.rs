//! Query descriptors and result sequences
//!
//! A [`Query`] describes what a caller wants back from a datastore:
//! - `prefix`: only keys strictly below this key (empty = everything)
//! - `keys_only` / `returns_sizes`: projection of each [`Entry`]
//! - `filters`: predicates, all of which must accept an entry
//! - `orders`: comparators applied as a stable multi-key sort
//! - `offset` / `limit`: pagination, `0` meaning "no skip" / "unbounded"
//!
//! Query execution yields [`Results`], a lazy single-pass sequence of
//! entries. The [`naive`] module holds the in-memory stages that apply
//! filters, orders and pagination when a backend cannot.

pub mod filter;
pub mod naive;
pub mod order;
pub mod results;

pub use filter::{Filter, FilterFn, FilterKeyCompare, FilterKeyPrefix, FilterValueCompare, Op};
pub use naive::{naive_filter, naive_limit, naive_offset, naive_order, naive_query_apply};
pub use order::{
    OrderByFunction, OrderByKey, OrderByKeyDescending, OrderByValue, OrderByValueDescending,
    Order,
};
pub use results::{ResultIter, Results};

use std::fmt;
use std::sync::Arc;

/// One key/value pair produced by a query
///
/// Which fields are set depends on the projection:
/// - keys only: `value` and `size` are `None`
/// - keys only with sizes: `size` is set, `value` is `None`
/// - full: `value` is set, and `size` too when the query asked for sizes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Entry {
    /// Canonical key string
    pub key: String,
    /// Stored bytes
    pub value: Option<Vec<u8>>,
    /// Length of the stored bytes
    pub size: Option<usize>,
}

impl Entry {
    /// Entry carrying key and value
    pub fn new(key: impl Into<String>, value: Vec<u8>) -> Self {
        Entry {
            key: key.into(),
            value: Some(value),
            size: None,
        }
    }

    /// Entry carrying only a key
    pub fn key_only(key: impl Into<String>) -> Self {
        Entry {
            key: key.into(),
            value: None,
            size: None,
        }
    }

    /// Entry carrying a key and the size of its value
    pub fn key_with_size(key: impl Into<String>, size: usize) -> Self {
        Entry {
            key: key.into(),
            value: None,
            size: Some(size),
        }
    }

    /// Value bytes, empty when the projection dropped them
    pub fn value_bytes(&self) -> &[u8] {
        self.value.as_deref().unwrap_or(&[])
    }
}

/// Immutable description of a query
///
/// ```
/// use std::sync::Arc;
/// use sqlds_core::query::{FilterKeyCompare, Op, OrderByKeyDescending, Query};
///
/// let query = Query::new()
///     .with_prefix("/blocks")
///     .with_filter(Arc::new(FilterKeyCompare::new(Op::GreaterThan, "/blocks/m")))
///     .with_order(Arc::new(OrderByKeyDescending))
///     .with_limit(10);
/// assert!(query.needs_naive_pagination());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Only return keys below this prefix; empty means no restriction
    pub prefix: String,
    /// Predicates applied in order, AND semantics
    pub filters: Vec<Arc<dyn Filter>>,
    /// Comparators applied in order as a stable multi-key sort
    pub orders: Vec<Arc<dyn Order>>,
    /// Maximum entries to return, 0 = unbounded
    pub limit: usize,
    /// Entries to skip, 0 = none
    pub offset: usize,
    /// Do not return values
    pub keys_only: bool,
    /// Return value sizes
    pub returns_sizes: bool,
}

impl Query {
    /// Query matching everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to keys below `prefix`
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Add a filter predicate
    pub fn with_filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add a sort comparator
    pub fn with_order(mut self, order: Arc<dyn Order>) -> Self {
        self.orders.push(order);
        self
    }

    /// Return at most `limit` entries (0 = unbounded)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Skip the first `offset` entries
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Do not return values
    pub fn keys_only(mut self) -> Self {
        self.keys_only = true;
        self
    }

    /// Return value sizes
    pub fn returns_sizes(mut self) -> Self {
        self.returns_sizes = true;
        self
    }

    /// True when offset and limit must run in memory after filters/orders
    ///
    /// Filters and orders need to see the whole row stream, so a backend may
    /// only push offset/limit down when there are none of them.
    pub fn needs_naive_pagination(&self) -> bool {
        !self.filters.is_empty() || !self.orders.is_empty()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let projection = match (self.keys_only, self.returns_sizes) {
            (true, true) => "keys,size",
            (true, false) => "keys",
            (false, true) => "keys,vals,size",
            (false, false) => "keys,vals",
        };
        write!(f, "SELECT {}", projection)?;
        if !self.prefix.is_empty() {
            write!(f, " FROM {:?}", self.prefix)?;
        }
        if !self.filters.is_empty() {
            write!(f, " FILTER [")?;
            for (i, filter) in self.filters.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{:?}", filter)?;
            }
            write!(f, "]")?;
        }
        if !self.orders.is_empty() {
            write!(f, " ORDER [")?;
            for (i, order) in self.orders.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{:?}", order)?;
            }
            write!(f, "]")?;
        }
        if self.offset > 0 {
            write!(f, " OFFSET {}", self.offset)?;
        }
        if self.limit > 0 {
            write!(f, " LIMIT {}", self.limit)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_constructors() {
        let full = Entry::new("/a", b"abc".to_vec());
        assert_eq!(full.value_bytes(), b"abc");
        assert_eq!(full.size, None);

        let key = Entry::key_only("/a");
        assert_eq!(key.value, None);
        assert!(key.value_bytes().is_empty());

        let sized = Entry::key_with_size("/a", 3);
        assert_eq!(sized.size, Some(3));
        assert_eq!(sized.value, None);
    }

    #[test]
    fn test_default_query_is_unbounded() {
        let query = Query::new();
        assert!(query.prefix.is_empty());
        assert_eq!(query.limit, 0);
        assert_eq!(query.offset, 0);
        assert!(!query.keys_only);
        assert!(!query.returns_sizes);
        assert!(!query.needs_naive_pagination());
    }

    #[test]
    fn test_needs_naive_pagination() {
        let filtered = Query::new().with_filter(Arc::new(FilterKeyPrefix::new("/a")));
        assert!(filtered.needs_naive_pagination());

        let ordered = Query::new().with_order(Arc::new(OrderByKey));
        assert!(ordered.needs_naive_pagination());

        let paginated = Query::new().with_limit(5).with_offset(2);
        assert!(!paginated.needs_naive_pagination());
    }

    #[test]
    fn test_query_display() {
        let query = Query::new()
            .with_prefix("/blocks")
            .keys_only()
            .returns_sizes()
            .with_order(Arc::new(OrderByKey))
            .with_offset(3)
            .with_limit(7);
        let text = query.to_string();
        assert_eq!(
            text,
            "SELECT keys,size FROM \"/blocks\" ORDER [OrderByKey] OFFSET 3 LIMIT 7"
        );
    }

    #[test]
    fn test_query_display_minimal() {
        assert_eq!(Query::new().to_string(), "SELECT keys,vals");
    }
}
