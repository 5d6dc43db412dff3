//! Naive in-memory query stages
//!
//! Each stage wraps a [`Results`] in another lazy [`Results`]. Backends use
//! them for whatever part of a [`Query`] they could not push down:
//!
//! - [`naive_filter`]: drops entries a predicate rejects
//! - [`naive_order`]: stable sort; **buffers the whole upstream** before
//!   yielding anything, so it is only installed when orders are present
//! - [`naive_offset`] / [`naive_limit`]: pagination
//!
//! Errors from upstream pass through every stage unchanged and end the
//! sequence; no stage swallows or retries them.

use super::order::compare_entries;
use super::{Entry, Filter, FilterKeyPrefix, Order, Query, Results};
use crate::error::Result;
use crate::key::{Key, SEPARATOR};
use std::sync::Arc;

/// Keep only entries accepted by `filter`
pub fn naive_filter(results: Results, filter: Arc<dyn Filter>) -> Results {
    results.wrap(move |upstream| {
        upstream.filter(move |item| match item {
            Ok(entry) => filter.filter(entry),
            Err(_) => true,
        })
    })
}

/// Sort entries by `orders`; returns `results` untouched when empty
pub fn naive_order(results: Results, orders: &[Arc<dyn Order>]) -> Results {
    if orders.is_empty() {
        return results;
    }
    let orders = orders.to_vec();
    results.wrap(move |upstream| Sorted {
        upstream: Some(upstream),
        orders,
        sorted: Vec::new().into_iter(),
    })
}

/// Skip the first `offset` entries
pub fn naive_offset(results: Results, offset: usize) -> Results {
    results.wrap(move |upstream| Offset {
        upstream,
        remaining: offset,
    })
}

/// Yield at most `limit` entries; `0` means unbounded
pub fn naive_limit(results: Results, limit: usize) -> Results {
    if limit == 0 {
        return results;
    }
    results.wrap(move |upstream| Limit {
        upstream,
        remaining: limit,
    })
}

/// Apply an entire query in memory
///
/// Used by stores with no query engine of their own. The input is expected
/// to contain every entry of the store with values; prefix, projection,
/// filters, orders, offset and limit are applied here, in that order.
pub fn naive_query_apply(query: &Query, results: Results) -> Results {
    let mut results = results;

    if !query.prefix.is_empty() {
        let prefix = Key::new(&query.prefix);
        if !prefix.is_root() {
            let pattern = format!("{}{}", prefix, SEPARATOR);
            results = naive_filter(results, Arc::new(FilterKeyPrefix::new(pattern)));
        }
    }
    for filter in &query.filters {
        results = naive_filter(results, Arc::clone(filter));
    }
    results = naive_order(results, &query.orders);
    if query.offset != 0 {
        results = naive_offset(results, query.offset);
    }
    if query.limit != 0 {
        results = naive_limit(results, query.limit);
    }

    let keys_only = query.keys_only;
    let returns_sizes = query.returns_sizes;
    results.wrap(move |upstream| {
        upstream.map(move |item| {
            item.map(|mut entry| {
                if returns_sizes {
                    entry.size = Some(entry.value_bytes().len());
                }
                if keys_only {
                    entry.value = None;
                }
                entry
            })
        })
    })
}

/// Sorting stage: drains upstream on first pull
struct Sorted {
    upstream: Option<Results>,
    orders: Vec<Arc<dyn Order>>,
    sorted: std::vec::IntoIter<Entry>,
}

impl Iterator for Sorted {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(upstream) = self.upstream.take() {
            let mut entries = Vec::new();
            for item in upstream {
                match item {
                    Ok(entry) => entries.push(entry),
                    // Partial input cannot be ordered; surface the failure alone.
                    Err(e) => return Some(Err(e)),
                }
            }
            // sort_by is stable: ties keep arrival order
            entries.sort_by(|a, b| compare_entries(&self.orders, a, b));
            self.sorted = entries.into_iter();
        }
        self.sorted.next().map(Ok)
    }
}

/// Offset stage
struct Offset {
    upstream: Results,
    remaining: usize,
}

impl Iterator for Offset {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 {
            match self.upstream.next()? {
                Ok(_) => self.remaining -= 1,
                Err(e) => return Some(Err(e)),
            }
        }
        self.upstream.next()
    }
}

/// Limit stage
struct Limit {
    upstream: Results,
    remaining: usize,
}

impl Iterator for Limit {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            // Release the cursor as soon as the limit is reached
            self.upstream.close();
            return None;
        }
        let item = self.upstream.next()?;
        if item.is_ok() {
            self.remaining -= 1;
        }
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::query::{FilterFn, OrderByKeyDescending, OrderByValue};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn entries(n: usize) -> Vec<Entry> {
        (0..n)
            .map(|i| Entry::new(format!("/k/{:02}", i), vec![i as u8]))
            .collect()
    }

    fn keys(results: Results) -> Vec<String> {
        results.map(|r| r.unwrap().key).collect()
    }

    fn source(n: usize) -> Results {
        Results::from_entries(Query::new(), entries(n))
    }

    /// Source that fails after `ok` entries and counts pulls
    fn failing_source(ok: usize, pulls: Arc<AtomicUsize>) -> Results {
        let iter = (0..).map_while(move |i| {
            pulls.fetch_add(1, Ordering::SeqCst);
            if i < ok {
                Some(Ok(Entry::new(format!("/k/{:02}", i), vec![i as u8])))
            } else if i == ok {
                Some(Err(Error::Decode("cursor broke".to_string())))
            } else {
                None
            }
        });
        Results::new(Query::new(), iter)
    }

    fn even_index() -> Arc<dyn Filter> {
        Arc::new(FilterFn(|e: &Entry| e.value_bytes()[0] % 2 == 0))
    }

    // === Filter ===

    #[test]
    fn test_filter_keeps_matching() {
        let results = naive_filter(source(6), even_index());
        assert_eq!(keys(results), vec!["/k/00", "/k/02", "/k/04"]);
    }

    #[test]
    fn test_stacked_filters_are_anded() {
        let results = naive_filter(source(10), even_index());
        let results = naive_filter(
            results,
            Arc::new(FilterFn(|e: &Entry| e.value_bytes()[0] > 4)),
        );
        assert_eq!(keys(results), vec!["/k/06", "/k/08"]);
    }

    #[test]
    fn test_filter_passes_errors_through() {
        let pulls = Arc::new(AtomicUsize::new(0));
        let results = naive_filter(
            failing_source(2, Arc::clone(&pulls)),
            Arc::new(FilterFn(|_: &Entry| false)),
        );
        let items: Vec<_> = results.collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(Error::Decode(_))));
    }

    // === Order ===

    #[test]
    fn test_order_without_orders_is_identity() {
        let results = naive_order(source(3), &[]);
        assert_eq!(keys(results), vec!["/k/00", "/k/01", "/k/02"]);
    }

    #[test]
    fn test_order_sorts() {
        let results = naive_order(source(3), &[Arc::new(OrderByKeyDescending)]);
        assert_eq!(keys(results), vec!["/k/02", "/k/01", "/k/00"]);
    }

    #[test]
    fn test_order_is_stable() {
        let input = vec![
            Entry::new("/b", b"x".to_vec()),
            Entry::new("/a", b"x".to_vec()),
            Entry::new("/c", b"a".to_vec()),
        ];
        let results = naive_order(
            Results::from_entries(Query::new(), input),
            &[Arc::new(OrderByValue)],
        );
        assert_eq!(keys(results), vec!["/c", "/b", "/a"]);
    }

    #[test]
    fn test_order_surfaces_upstream_error() {
        let pulls = Arc::new(AtomicUsize::new(0));
        let mut results = naive_order(
            failing_source(3, Arc::clone(&pulls)),
            &[Arc::new(OrderByKeyDescending)],
        );
        assert!(matches!(results.next(), Some(Err(Error::Decode(_)))));
        assert!(results.next().is_none());
    }

    // === Offset / Limit ===

    #[test]
    fn test_offset_skips() {
        assert_eq!(keys(naive_offset(source(4), 2)), vec!["/k/02", "/k/03"]);
    }

    #[test]
    fn test_offset_past_end_is_empty() {
        assert!(keys(naive_offset(source(2), 5)).is_empty());
    }

    #[test]
    fn test_offset_passes_errors_through() {
        let pulls = Arc::new(AtomicUsize::new(0));
        let mut results = naive_offset(failing_source(1, Arc::clone(&pulls)), 3);
        assert!(matches!(results.next(), Some(Err(Error::Decode(_)))));
    }

    #[test]
    fn test_limit_truncates() {
        assert_eq!(keys(naive_limit(source(5), 2)), vec!["/k/00", "/k/01"]);
    }

    #[test]
    fn test_limit_zero_is_unbounded() {
        assert_eq!(keys(naive_limit(source(5), 0)).len(), 5);
    }

    #[test]
    fn test_limit_stops_pulling_upstream() {
        let pulls = Arc::new(AtomicUsize::new(0));
        let results = naive_limit(failing_source(10, Arc::clone(&pulls)), 2);
        assert_eq!(keys(results).len(), 2);
        assert_eq!(pulls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_filter_then_limit_counts_survivors() {
        let results = naive_limit(naive_filter(source(10), even_index()), 2);
        assert_eq!(keys(results), vec!["/k/00", "/k/02"]);
    }

    // === Full application ===

    #[test]
    fn test_query_apply_prefix_is_path_aware() {
        let input = vec![
            Entry::new("/a/1", b"x".to_vec()),
            Entry::new("/ab", b"y".to_vec()),
            Entry::new("/a", b"z".to_vec()),
        ];
        let query = Query::new().with_prefix("/a");
        let results = naive_query_apply(&query, Results::from_entries(query.clone(), input));
        assert_eq!(keys(results), vec!["/a/1"]);
    }

    #[test]
    fn test_query_apply_root_prefix_matches_all() {
        let query = Query::new().with_prefix("/");
        let results = naive_query_apply(&query, source(3));
        assert_eq!(keys(results).len(), 3);
    }

    #[test]
    fn test_query_apply_runs_stages_in_order() {
        let query = Query::new()
            .with_filter(even_index())
            .with_order(Arc::new(OrderByKeyDescending))
            .with_offset(1)
            .with_limit(2);
        let results = naive_query_apply(&query, source(10));
        assert_eq!(keys(results), vec!["/k/06", "/k/04"]);
    }

    #[test]
    fn test_query_apply_projection() {
        let query = Query::new().keys_only().returns_sizes();
        let input = vec![Entry::new("/a", b"hello".to_vec())];
        let entries = naive_query_apply(&query, Results::from_entries(query.clone(), input))
            .rest()
            .unwrap();
        assert_eq!(entries, vec![Entry::key_with_size("/a", 5)]);
    }
}
