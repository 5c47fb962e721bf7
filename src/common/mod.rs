//! Common types shared across the page cache.
//!
//! - Configuration ([`config::PageCacheConfig`] and defaults)
//! - Error types
//! - Identifiers ([`PageOffset`], [`FrameId`])

pub mod config;
pub mod error;
mod frame_id;
mod page_offset;

pub use error::{Error, Result};
pub use frame_id::FrameId;
pub use page_offset::PageOffset;
