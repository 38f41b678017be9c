//! # TDMS Core
//!
//! Segment-based engine for TDMS measurement files: the object model,
//! the segment scanner, and the incremental writer.
//!
//! A file is a chain of self-describing segments, each opening with a
//! 28-byte lead-in followed by object metadata and an optional raw-data
//! area. One channel's data may be spread over many segments; reading
//! concatenates them in file order.
//!
//! The engine is lazy on the read side and incremental on the write
//! side: opening a file parses only lead-ins and metadata, and writing
//! appends segments for exactly the entities and pending data that
//! changed since the last write.
//!
//! ## Usage
//!
//! ```
//! use tdms_core::{TdmsReader, TdmsWriter, Value};
//! use tdms_storage::InMemoryBackend;
//!
//! let mut writer = TdmsWriter::new(InMemoryBackend::new());
//! let channel = writer.file_mut().group("measurements").channel("voltage");
//! channel.append_values(vec![Value::F64(1.25), Value::F64(-0.5)])?;
//! writer.write()?;
//!
//! let reader = writer.into_reader();
//! assert_eq!(reader.value("measurements", "voltage", 1)?, Value::F64(-0.5));
//! # Ok::<(), tdms_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod model;
mod reader;
mod segment;
mod source;
mod writer;

pub use error::{CoreError, CoreResult};
pub use model::{Channel, Group, Properties, TdmsFile};
pub use reader::{ChannelValues, TdmsReader};
pub use segment::{
    InterleavedShared, LeadIn, ReadSegment, Toc, WriteSegment, FORMAT_VERSION, LEAD_IN_SIZE,
    SEGMENT_TAG,
};
pub use source::{IterSource, RowSource, ValueSource, VecRowSource, VecSource};
pub use writer::TdmsWriter;

pub use tdms_codec::{TdsType, Timestamp, Value};
