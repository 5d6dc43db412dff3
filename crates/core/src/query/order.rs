//! Sort comparators
//!
//! Orders are applied in memory by [`naive_order`](super::naive_order); the
//! first comparator that does not report `Equal` decides.

use super::Entry;
use std::cmp::Ordering;
use std::fmt;

/// A comparator over query entries
pub trait Order: fmt::Debug + Send + Sync {
    /// Compare two entries
    fn compare(&self, a: &Entry, b: &Entry) -> Ordering;
}

/// Ascending by key string
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderByKey;

impl Order for OrderByKey {
    fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        a.key.cmp(&b.key)
    }
}

/// Descending by key string
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderByKeyDescending;

impl Order for OrderByKeyDescending {
    fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        b.key.cmp(&a.key)
    }
}

/// Ascending by value bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderByValue;

impl Order for OrderByValue {
    fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        a.value_bytes().cmp(b.value_bytes())
    }
}

/// Descending by value bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderByValueDescending;

impl Order for OrderByValueDescending {
    fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        b.value_bytes().cmp(a.value_bytes())
    }
}

/// Wrap a closure as a comparator
pub struct OrderByFunction<F>(pub F);

impl<F> Order for OrderByFunction<F>
where
    F: Fn(&Entry, &Entry) -> Ordering + Send + Sync,
{
    fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        (self.0)(a, b)
    }
}

impl<F> fmt::Debug for OrderByFunction<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OrderByFunction")
    }
}

/// Apply `orders` in sequence; the first non-equal comparison wins
pub fn compare_entries<O>(orders: &[O], a: &Entry, b: &Entry) -> Ordering
where
    O: AsRef<dyn Order>,
{
    orders
        .iter()
        .map(|order| order.as_ref().compare(a, b))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}
