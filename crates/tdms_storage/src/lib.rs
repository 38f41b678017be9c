//! # TDMS Storage
//!
//! Storage backend trait and implementations for the TDMS engine.
//!
//! This crate provides the lowest-level storage abstraction beneath the
//! segment reader and writer. Backends are **opaque byte stores** - they
//! do not interpret lead-ins, segments, or channel data.
//!
//! ## Design Principles
//!
//! - Backends are simple byte stores (positioned read, append, patch)
//! - No knowledge of the TDMS segment format
//! - Must be `Send + Sync`
//! - The core crate owns all format interpretation
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral use
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use tdms_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"hello world").unwrap();
//! let data = backend.read_at(offset, 11).unwrap();
//! assert_eq!(&data, b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
