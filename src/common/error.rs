//! Error types for the page cache.

use std::path::PathBuf;

use thiserror::Error;

use crate::common::{FrameId, PageOffset};

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors returned by the page cache.
///
/// Every failure is local to the operation that produced it. The pool stays
/// usable afterwards.
#[derive(Debug, Error)]
pub enum Error {
    /// The backing file could not be opened or created.
    #[error("backing store {path} unavailable: {source}")]
    BackingStoreUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rejected configuration (zero page size, zero frames).
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// Underlying I/O failure, propagated unmodified.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing store returned fewer bytes than a page.
    #[error("short read at {offset}: expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: PageOffset,
        expected: usize,
        actual: usize,
    },

    /// The backing store accepted fewer bytes than a page.
    #[error("short write at {offset}: expected {expected} bytes, wrote {actual}")]
    ShortWrite {
        offset: PageOffset,
        expected: usize,
        actual: usize,
    },

    /// Every frame is referenced or pinned, nothing can be evicted.
    ///
    /// This is backpressure: the caller decides whether to retry.
    #[error("no evictable frame available")]
    EvictionExhausted,

    /// No frame currently holds the requested offset.
    #[error("{0} is not resident")]
    UnknownPage(PageOffset),

    /// Frame index outside the frame table.
    #[error("{0} does not exist")]
    UnknownFrame(FrameId),

    /// Released a page whose reference count is already zero.
    ///
    /// This indicates a bug - every release must match a read.
    #[error("{0} released more often than it was acquired")]
    NegativeReference(PageOffset),

    /// The translation table already maps this offset.
    #[error("{0} is already mapped")]
    DuplicateOffset(PageOffset),

    /// Unpinned a page that was not pinned.
    #[error("{0} is not pinned")]
    NotPinned(PageOffset),

    /// The page is referenced or pinned and cannot be released.
    #[error("{0} is in use")]
    PageInUse(PageOffset),

    /// Caller buffer is not exactly one page long.
    #[error("buffer is {actual} bytes, page size is {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Offset is not a multiple of the page size.
    #[error("{offset} is not aligned to page size {page_size}")]
    MisalignedOffset { offset: PageOffset, page_size: usize },
}
