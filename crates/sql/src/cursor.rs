//! Streaming row cursors
//!
//! Driver row streams borrow the statement and connection they came from,
//! so they cannot be handed out on their own. A [`StreamingCursor`] moves
//! the checked-out connection onto a reader thread instead. The reader runs
//! the statement and pushes decoded rows through a bounded channel, blocking
//! whenever [`READ_AHEAD`] rows are waiting, so a large result is never
//! materialized ahead of the consumer.
//!
//! The reader hands the connection back when it returns, and the cursor
//! keeps it until the last row has been taken or the cursor is dropped, so
//! an open cursor always holds exactly one connection. Setup errors
//! (prepare, bind, first execution) are reported before
//! [`StreamingCursor::spawn`] returns. Dropping the cursor closes the
//! channel and joins the reader, which stops at its next send; the
//! connection is back in its pool before the drop completes.

use crate::error::SqlError;
use crate::value::Row;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::warn;

/// Rows the reader may decode ahead of the consumer
pub const READ_AHEAD: usize = 64;

type RowResult = Result<Row, SqlError>;

/// Reader-side end of a [`StreamingCursor`]
pub struct RowSink {
    rows: SyncSender<RowResult>,
    ready: Option<SyncSender<Result<(), SqlError>>>,
    rows_read: Arc<AtomicUsize>,
}

impl RowSink {
    /// Report that the statement is running
    ///
    /// Errors returned by the producer after this point are streamed to the
    /// consumer instead of failing [`StreamingCursor::spawn`]. Called
    /// implicitly by the first [`RowSink::send`].
    pub fn ready(&mut self) {
        if let Some(ready) = self.ready.take() {
            // spawn() is blocked on this channel until the reader reports
            let _ = ready.send(Ok(()));
        }
    }

    /// Push one decoded row; false once the cursor has been dropped
    pub fn send(&mut self, row: Row) -> bool {
        self.ready();
        self.rows_read.fetch_add(1, Ordering::Relaxed);
        self.rows.send(Ok(row)).is_ok()
    }

    fn fail(&mut self, error: SqlError) {
        match self.ready.take() {
            Some(ready) => {
                let _ = ready.send(Err(error));
            }
            None => {
                let _ = self.rows.send(Err(error));
            }
        }
    }
}

/// Row cursor fed by a reader thread that owns the connection
pub struct StreamingCursor {
    rows: Option<Receiver<RowResult>>,
    reader: Option<JoinHandle<Box<dyn Send>>>,
    rows_read: Arc<AtomicUsize>,
}

impl StreamingCursor {
    /// Run `produce` on a new reader thread and stream what it sends
    ///
    /// `resource` (typically a pooled connection) moves to the reader and is
    /// lent to `produce`; it is released when the cursor is drained or
    /// dropped. `produce` should call [`RowSink::ready`] once the statement
    /// is executing, then [`RowSink::send`] each row, and return as soon as
    /// a send reports the cursor gone.
    ///
    /// # Errors
    ///
    /// Returns the producer's error if it fails before signalling ready,
    /// [`SqlError::Spawn`] if no thread could be started, or
    /// [`SqlError::ReaderPanicked`] if the reader died during setup.
    pub fn spawn<R, F>(resource: R, produce: F) -> Result<Self, SqlError>
    where
        R: Send + 'static,
        F: FnOnce(&mut R, &mut RowSink) -> Result<(), SqlError> + Send + 'static,
    {
        let (rows_tx, rows_rx) = mpsc::sync_channel(READ_AHEAD);
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let rows_read = Arc::new(AtomicUsize::new(0));
        let mut sink = RowSink {
            rows: rows_tx,
            ready: Some(ready_tx),
            rows_read: Arc::clone(&rows_read),
        };

        let reader = thread::Builder::new()
            .name("sqlds-cursor".to_string())
            .spawn(move || {
                let mut resource = resource;
                match produce(&mut resource, &mut sink) {
                    Ok(()) => sink.ready(),
                    Err(e) => sink.fail(e),
                }
                // Disconnect the consumer but keep the resource for it
                drop(sink);
                Box::new(resource) as Box<dyn Send>
            })
            .map_err(SqlError::Spawn)?;

        let mut cursor = StreamingCursor {
            rows: Some(rows_rx),
            reader: Some(reader),
            rows_read,
        };
        match ready_rx.recv() {
            Ok(Ok(())) => Ok(cursor),
            Ok(Err(e)) => {
                cursor.rows = None;
                cursor.join()?;
                Err(e)
            }
            Err(_) => {
                cursor.rows = None;
                cursor.join()?;
                Err(SqlError::ReaderPanicked)
            }
        }
    }

    /// Rows decoded by the reader so far, consumed or not
    pub fn rows_read(&self) -> usize {
        self.rows_read.load(Ordering::Relaxed)
    }

    /// True once the reader is done and every row has been taken
    pub fn is_finished(&self) -> bool {
        self.rows.is_none()
    }

    /// Wait for the reader and release the resource it hands back
    fn join(&mut self) -> Result<(), SqlError> {
        match self.reader.take() {
            Some(reader) => match reader.join() {
                Ok(resource) => {
                    drop(resource);
                    Ok(())
                }
                Err(_) => Err(SqlError::ReaderPanicked),
            },
            None => Ok(()),
        }
    }
}

impl Iterator for StreamingCursor {
    type Item = RowResult;

    fn next(&mut self) -> Option<Self::Item> {
        match self.rows.as_ref()?.recv() {
            Ok(item) => Some(item),
            Err(_) => {
                // Reader has returned and dropped its sender
                self.rows = None;
                self.join().err().map(Err)
            }
        }
    }
}

impl Drop for StreamingCursor {
    fn drop(&mut self) {
        // Closing the receiver first unblocks a reader waiting on a full channel
        self.rows = None;
        if let Err(e) = self.join() {
            warn!(target: "sqlds::query", error = %e, "Cursor reader failed");
        }
    }
}

impl fmt::Debug for StreamingCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingCursor")
            .field("rows_read", &self.rows_read())
            .field("finished", &self.is_finished())
            .finish()
    }
}
