//! Lazy read-side views over already-written raw data.

use crate::error::{CoreError, CoreResult};
use tdms_codec::{Decoder, TdsType, Value};
use tdms_storage::StorageBackend;

/// A lazy, randomly-addressable view over one channel's data in one
/// segment.
///
/// No data is read when a segment is registered during the scan; every
/// element access is a positioned read against the backing storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadSegment {
    /// Fixed-width values stored back to back.
    Contiguous {
        /// Absolute byte position of the first element.
        start: u64,
        /// Element type.
        ty: TdsType,
        /// Element count.
        len: u64,
    },
    /// Strings stored as an offset table plus a concatenated blob.
    ///
    /// The table holds `len` 4-byte cumulative end offsets, relative to
    /// the start of the blob (which follows the table immediately);
    /// string `i` spans `[offset[i-1] or 0, offset[i])`.
    StringIndexed {
        /// Absolute byte position of the offset table.
        start: u64,
        /// String count.
        len: u64,
        /// Total byte length of the concatenated blob.
        blob_len: u64,
    },
    /// Fixed-width values stored row-major across several channels
    /// sharing one block.
    Interleaved {
        /// Absolute byte position of the shared block.
        block_start: u64,
        /// Byte size of one full row (all channels).
        row_size: u64,
        /// This channel's byte offset within a row.
        column_offset: u64,
        /// Element type.
        ty: TdsType,
        /// Row count.
        rows: u64,
    },
}

impl ReadSegment {
    /// Element count of this segment.
    #[must_use]
    pub fn len(&self) -> u64 {
        match self {
            Self::Contiguous { len, .. } | Self::StringIndexed { len, .. } => *len,
            Self::Interleaved { rows, .. } => *rows,
        }
    }

    /// Whether the segment holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element type.
    #[must_use]
    pub fn data_type(&self) -> TdsType {
        match self {
            Self::Contiguous { ty, .. } | Self::Interleaved { ty, .. } => *ty,
            Self::StringIndexed { .. } => TdsType::String,
        }
    }

    /// First byte after this segment's data.
    ///
    /// Most headers carry only element counts, so the byte extent has to
    /// be derived from the layout.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedHeader`] when the declared counts
    /// put the extent past `u64::MAX`; a scanned header is untrusted
    /// input and can claim any count it likes.
    pub fn end_position(&self) -> CoreResult<u64> {
        let end = match self {
            Self::Contiguous { start, ty, len } => len
                .checked_mul(ty.fixed_size().unwrap_or(0) as u64)
                .and_then(|bytes| start.checked_add(bytes)),
            Self::StringIndexed {
                start,
                len,
                blob_len,
            } => len
                .checked_mul(4)
                .and_then(|table| start.checked_add(table))
                .and_then(|blob_start| blob_start.checked_add(*blob_len)),
            Self::Interleaved {
                block_start,
                row_size,
                rows,
                ..
            } => row_size
                .checked_mul(*rows)
                .and_then(|bytes| block_start.checked_add(bytes)),
        };
        end.ok_or_else(|| {
            CoreError::malformed("declared element count puts the segment extent past u64::MAX")
        })
    }

    /// Decodes element `index` from the backing storage.
    ///
    /// Contiguous and interleaved elements cost one positioned read;
    /// string elements cost two small reads into the offset table plus
    /// the payload read.
    ///
    /// # Errors
    ///
    /// Returns an error on an out-of-range index or an I/O failure.
    pub fn value_at(&self, backend: &dyn StorageBackend, index: u64) -> CoreResult<Value> {
        if index >= self.len() {
            return Err(CoreError::invalid_state(format!(
                "element index {index} out of range for segment of {}",
                self.len()
            )));
        }
        match self {
            Self::Contiguous { start, ty, .. } => {
                let width = ty.fixed_size().ok_or_else(|| {
                    CoreError::invalid_state("contiguous segment with variable-width type")
                })? as u64;
                let bytes = backend.read_at(start + index * width, width as usize)?;
                let mut decoder = Decoder::new(&bytes);
                Ok(decoder.scalar(*ty)?)
            }
            Self::StringIndexed { start, len, .. } => {
                let begin = if index == 0 {
                    0
                } else {
                    read_u32(backend, start + (index - 1) * 4)?
                };
                let end = read_u32(backend, start + index * 4)?;
                if end < begin {
                    return Err(CoreError::malformed(format!(
                        "string offset table not monotonic at index {index}"
                    )));
                }
                let blob_start = start + 4 * len;
                let bytes =
                    backend.read_at(blob_start + u64::from(begin), (end - begin) as usize)?;
                let text = String::from_utf8(bytes)
                    .map_err(|_| CoreError::Codec(tdms_codec::CodecError::InvalidUtf8))?;
                Ok(Value::String(text))
            }
            Self::Interleaved {
                block_start,
                row_size,
                column_offset,
                ty,
                ..
            } => {
                let width = ty.fixed_size().ok_or_else(|| {
                    CoreError::invalid_state("interleaved segment with variable-width type")
                })? as u64;
                let position = block_start + index * row_size + column_offset;
                let bytes = backend.read_at(position, width as usize)?;
                let mut decoder = Decoder::new(&bytes);
                Ok(decoder.scalar(*ty)?)
            }
        }
    }
}

fn read_u32(backend: &dyn StorageBackend, position: u64) -> CoreResult<u32> {
    let bytes = backend.read_at(position, 4)?;
    let mut decoder = Decoder::new(&bytes);
    Ok(decoder.u32()?)
}
