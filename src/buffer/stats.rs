//! Page cache statistics.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the page cache.
///
/// All fields are atomic and updated with `Ordering::Relaxed`: each counter
/// only needs to be exact on its own, not consistent with the others.
///
/// # Example
/// ```
/// use pagecache::PageCacheStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = PageCacheStats::new();
/// stats.hits.fetch_add(3, Ordering::Relaxed);
/// stats.misses.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.snapshot().hit_rate(), 0.75);
/// ```
#[derive(Debug, Default)]
pub struct PageCacheStats {
    /// Reads and writes served by a resident frame.
    pub hits: AtomicU64,

    /// Reads and writes that had to claim a frame.
    pub misses: AtomicU64,

    /// Frames reclaimed from one page for another (or explicitly released).
    pub evictions: AtomicU64,

    /// Pages loaded from the backing store.
    pub pages_read: AtomicU64,

    /// Pages written to the backing store (write-through or write-back).
    pub pages_written: AtomicU64,
}

impl PageCacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the counters out.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            pages_read: self.pages_read.load(Ordering::Relaxed),
            pages_written: self.pages_written.load(Ordering::Relaxed),
        }
    }

    /// Zero every counter.
    pub fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.evictions,
            &self.pages_read,
            &self.pages_written,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// A point-in-time copy of [`PageCacheStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub pages_read: u64,
    pub pages_written: u64,
}

impl StatsSnapshot {
    /// Fraction of requests served from memory (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits={} misses={} evictions={} reads={} writes={} hit_rate={:.2}%",
            self.hits,
            self.misses,
            self.evictions,
            self.pages_read,
            self.pages_written,
            self.hit_rate() * 100.0
        )
    }
}
