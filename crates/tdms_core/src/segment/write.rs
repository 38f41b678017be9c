//! Provider-backed pending segments for the write path.

use crate::error::{CoreError, CoreResult};
use crate::source::{RowSource, ValueSource};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tdms_codec::{TdsType, Value};

/// State shared by all channels participating in one interleaved write.
///
/// The row source can only be drained once, so the segment owning
/// channel index 0 does the draining and records the row count here;
/// every other participant reads the recorded count instead of touching
/// the source.
pub struct InterleavedShared {
    source: Box<dyn RowSource>,
    types: Vec<TdsType>,
    drained_rows: Option<u64>,
}

impl InterleavedShared {
    /// Creates the shared state for an interleaved write across channels
    /// with the given types, in channel-index order.
    pub fn new(source: Box<dyn RowSource>, types: Vec<TdsType>) -> Self {
        Self {
            source,
            types,
            drained_rows: None,
        }
    }

    /// The participating channel types in channel-index order.
    #[must_use]
    pub fn types(&self) -> &[TdsType] {
        &self.types
    }

    /// Total row count if known up front or already drained.
    #[must_use]
    pub fn known_len(&self) -> Option<u64> {
        self.drained_rows.or_else(|| self.source.known_len())
    }

    /// Row count recorded by the draining channel, if the drain has
    /// happened.
    #[must_use]
    pub fn drained_rows(&self) -> Option<u64> {
        self.drained_rows
    }

    /// Pulls the next row from the source. Only the owning channel's
    /// drain calls this.
    pub fn next_row(&mut self) -> Option<Vec<Value>> {
        self.source.next_row()
    }

    /// Records the final row count after the owning channel's drain.
    pub fn record_drained(&mut self, rows: u64) {
        self.drained_rows = Some(rows);
    }
}

impl fmt::Debug for InterleavedShared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterleavedShared")
            .field("types", &self.types)
            .field("drained_rows", &self.drained_rows)
            .finish_non_exhaustive()
    }
}

/// A pending, not-yet-drained data segment attached to a channel.
pub enum WriteSegment {
    /// A single-channel segment backed by its own value source.
    Single {
        /// The one-shot provider to drain.
        source: Box<dyn ValueSource>,
    },
    /// One channel's share of an interleaved write.
    Interleaved {
        /// State shared by all participating channels.
        shared: Arc<Mutex<InterleavedShared>>,
        /// This channel's position within a row.
        channel_index: usize,
    },
}

impl WriteSegment {
    /// Creates a single-channel pending segment.
    pub fn single(source: Box<dyn ValueSource>) -> Self {
        Self::Single { source }
    }

    /// Creates one channel's share of an interleaved pending segment.
    pub fn interleaved(shared: Arc<Mutex<InterleavedShared>>, channel_index: usize) -> Self {
        Self::Interleaved {
            shared,
            channel_index,
        }
    }

    /// Whether this pending segment holds interleaved data.
    #[must_use]
    pub fn is_interleaved(&self) -> bool {
        matches!(self, Self::Interleaved { .. })
    }

    /// Element count if known before draining.
    ///
    /// Array-backed sources know their length up front; streaming
    /// sources do not until the writer has drained them.
    #[must_use]
    pub fn known_len(&self) -> Option<u64> {
        match self {
            Self::Single { source } => source.known_len(),
            Self::Interleaved { shared, .. } => shared.lock().known_len(),
        }
    }

    /// Element count.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidState`] for a streaming segment that
    /// has not been drained yet.
    pub fn len(&self) -> CoreResult<u64> {
        self.known_len().ok_or_else(|| {
            CoreError::invalid_state("size of a streaming segment is unknown before draining")
        })
    }
}

impl fmt::Debug for WriteSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single { source } => f
                .debug_struct("WriteSegment::Single")
                .field("known_len", &source.known_len())
                .finish_non_exhaustive(),
            Self::Interleaved {
                shared,
                channel_index,
            } => f
                .debug_struct("WriteSegment::Interleaved")
                .field("channel_index", channel_index)
                .field("known_len", &shared.lock().known_len())
                .finish_non_exhaustive(),
        }
    }
}
