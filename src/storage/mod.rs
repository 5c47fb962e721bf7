//! Storage layer - byte-addressable stores beneath the cache.
//!
//! - [`BackingStore`] - The read-at/write-at contract the cache consumes
//! - [`FileStore`] - Positional I/O over a persistent file
//! - [`MemoryStore`] - Volatile store for tests and scratch pools

mod backing_store;
mod file_store;
mod memory_store;

pub use backing_store::BackingStore;
pub use file_store::FileStore;
pub use memory_store::MemoryStore;
