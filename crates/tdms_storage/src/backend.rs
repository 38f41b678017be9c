//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level storage backend for TDMS files.
///
/// Storage backends are **opaque byte stores**. They provide simple
/// operations for reading, appending, and patching data. The core crate
/// owns all file format interpretation - backends do not understand
/// lead-ins, segments, or channels.
///
/// # Invariants
///
/// - `append` returns the offset where data was written
/// - `read_at` returns exactly the bytes previously written at that offset
/// - `write_at` only patches bytes that have already been written
/// - `flush` ensures all writes are durable
/// - Backends must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The read would extend beyond the current size
    /// - An I/O error occurs
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends data to the end of the storage.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Overwrites already-written bytes starting at `offset`.
    ///
    /// The segment writer reserves header fields (offsets, element counts)
    /// with zero bytes and patches them here once the payload has been
    /// produced. The write must lie entirely within the current size;
    /// `write_at` never grows the storage.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The write would extend beyond the current size
    /// - An I/O error occurs
    fn write_at(&mut self, offset: u64, data: &[u8]) -> StorageResult<()>;

    /// Flushes all pending writes to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the current size of the storage in bytes.
    ///
    /// This is the offset where the next `append` will write.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// This is a stronger guarantee than `flush` - it ensures that file
    /// metadata (size, timestamps) is also durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;
}
