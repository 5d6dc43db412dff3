//! Row decoding
//!
//! [`EntryRows`] pulls one row at a time from a backend cursor and decodes
//! it into an [`Entry`] according to the query's projection. The first
//! error, from the cursor or from decoding, is yielded once and the cursor
//! is dropped right away so its connection goes back to the pool.

use crate::error::SqlError;
use crate::translate::Projection;
use crate::value::Row;
use sqlds_core::{Entry, Error, Result};

/// Lazy decoder from backend rows to entries
#[derive(Debug)]
pub struct EntryRows<C> {
    cursor: Option<C>,
    projection: Projection,
}

impl<C> EntryRows<C>
where
    C: Iterator<Item = std::result::Result<Row, SqlError>>,
{
    /// Decode `cursor`'s rows as `projection`
    pub fn new(cursor: C, projection: Projection) -> Self {
        EntryRows {
            cursor: Some(cursor),
            projection,
        }
    }

    fn finish(&mut self) {
        self.cursor = None;
    }
}

/// Decode one row for `projection`
pub fn decode_entry(row: &Row, projection: Projection) -> std::result::Result<Entry, SqlError> {
    if row.len() != projection.columns() {
        return Err(SqlError::Column {
            index: row.len(),
            message: format!(
                "expected {} columns, found {}",
                projection.columns(),
                row.len()
            ),
        });
    }
    let key = row.text(0)?;
    match projection {
        Projection::Keys => Ok(Entry::key_only(key)),
        Projection::KeysAndSizes => {
            let size = row.size(1)?;
            Ok(Entry::key_with_size(key, size))
        }
        Projection::KeysAndValues { sizes } => {
            let value = row.blob(1)?;
            let mut entry = Entry::new(key, value);
            if sizes {
                entry.size = Some(entry.value_bytes().len());
            }
            Ok(entry)
        }
    }
}

impl<C> Iterator for EntryRows<C>
where
    C: Iterator<Item = std::result::Result<Row, SqlError>>,
{
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.cursor.as_mut()?.next();
        let decoded = match item {
            None => {
                self.finish();
                return None;
            }
            Some(row) => row.and_then(|row| decode_entry(&row, self.projection)),
        };
        match decoded {
            Ok(entry) => Some(Ok(entry)),
            Err(e) => {
                self.finish();
                Some(Err(Error::from(e)))
            }
        }
    }
}
