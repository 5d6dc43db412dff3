//! Lazy result sequences
//!
//! [`Results`] is what every query returns: a forward-only, single-pass
//! iterator of `Result<Entry>`. The iterator it wraps may own a database
//! cursor (and the pooled connection behind it), so:
//!
//! - draining the sequence to the end releases the cursor
//! - an error is yielded once, as the last item, and also releases it
//! - [`Results::close`] releases it early; calling it again is a no-op
//! - dropping the sequence releases it as well
//!
//! After any of these the sequence only returns `None`.

use super::{Entry, Query};
use crate::error::Result;
use std::fmt;

/// Boxed entry iterator behind a [`Results`]
///
/// `Send` so a sequence can be drained on another thread than the one that
/// ran the query.
pub type ResultIter = Box<dyn Iterator<Item = Result<Entry>> + Send>;

/// Lazy, single-pass sequence of query entries
pub struct Results {
    query: Query,
    inner: Option<ResultIter>,
}

impl Results {
    /// Wrap an entry iterator for `query`
    pub fn new<I>(query: Query, iter: I) -> Self
    where
        I: Iterator<Item = Result<Entry>> + Send + 'static,
    {
        Results {
            query,
            inner: Some(Box::new(iter)),
        }
    }

    /// Sequence over already materialized entries
    pub fn from_entries(query: Query, entries: Vec<Entry>) -> Self {
        Results::new(query, entries.into_iter().map(Ok))
    }

    /// The query this sequence answers
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Release the underlying cursor; idempotent
    pub fn close(&mut self) {
        self.inner = None;
    }

    /// True once the sequence is exhausted, failed or closed
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Drain the remaining entries, stopping at the first error
    pub fn rest(self) -> Result<Vec<Entry>> {
        self.collect()
    }

    /// Wrap this sequence in another stage, keeping the query
    pub(crate) fn wrap<F, I>(self, stage: F) -> Results
    where
        F: FnOnce(Results) -> I,
        I: Iterator<Item = Result<Entry>> + Send + 'static,
    {
        let query = self.query.clone();
        Results::new(query, stage(self))
    }
}

impl Iterator for Results {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.as_mut()?.next();
        match item {
            Some(Ok(entry)) => Some(Ok(entry)),
            Some(Err(e)) => {
                self.close();
                Some(Err(e))
            }
            None => {
                self.close();
                None
            }
        }
    }
}

impl fmt::Debug for Results {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Results")
            .field("query", &self.query)
            .field("closed", &self.is_closed())
            .finish()
    }
}
