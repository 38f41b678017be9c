//! Segment models.
//!
//! A segment is one self-contained chunk of a TDMS file: a 28-byte
//! lead-in, object metadata, and an optional raw-data area. The read side
//! exposes lazy, randomly-addressable views over already-written data;
//! the write side wraps forward-only value providers that have not been
//! drained yet.

mod lead_in;
mod read;
mod write;

pub use lead_in::{LeadIn, Toc, FORMAT_VERSION, LEAD_IN_SIZE, SEGMENT_TAG};
pub use lead_in::{RAW_INDEX_MATCHES_PREVIOUS, RAW_INDEX_NO_DATA};
pub use read::ReadSegment;
pub use write::{InterleavedShared, WriteSegment};
