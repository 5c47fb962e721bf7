//! Page offset type.

use std::fmt;

/// Identifies a page in the backing store by its absolute byte offset.
///
/// Offsets are always multiples of the page size; page `n` lives at
/// `n × page_size`.
///
/// # Example
/// ```
/// use pagecache::PageOffset;
///
/// let offset = PageOffset::from_page_index(3, 4096);
/// assert_eq!(offset.0, 12288);
/// assert!(offset.is_aligned(4096));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageOffset(pub u64);

impl PageOffset {
    /// Create a new PageOffset from a raw byte offset.
    #[inline]
    pub fn new(offset: u64) -> Self {
        PageOffset(offset)
    }

    /// Offset of the `index`-th page.
    ///
    /// # Panics
    /// If the offset does not fit in a `u64`. Use
    /// [`PageOffset::checked_from_page_index`] for untrusted indices.
    #[inline]
    pub fn from_page_index(index: u64, page_size: usize) -> Self {
        match Self::checked_from_page_index(index, page_size) {
            Some(offset) => offset,
            None => panic!("page {index} of {page_size} bytes overflows a u64 offset"),
        }
    }

    /// Offset of the `index`-th page, or `None` on overflow.
    #[inline]
    pub fn checked_from_page_index(index: u64, page_size: usize) -> Option<Self> {
        let page_size = u64::try_from(page_size).ok()?;
        index.checked_mul(page_size).map(PageOffset)
    }

    /// Check whether the offset sits on a page boundary.
    #[inline]
    pub fn is_aligned(&self, page_size: usize) -> bool {
        page_size != 0 && self.0 % page_size as u64 == 0
    }

    /// Index of the page this offset starts.
    #[inline]
    pub fn page_index(&self, page_size: usize) -> u64 {
        self.0 / page_size as u64
    }
}

impl fmt::Display for PageOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Offset({})", self.0)
    }
}
