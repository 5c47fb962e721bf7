//! Indexed binary min-heap over frame priorities.
//!
//! The priority structure behind every replacement policy. An auxiliary
//! position index (frame id → slot) makes `update` and `remove`
//! O(log n) instead of a linear scan.

use crate::common::FrameId;

/// One heap slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeapEntry<P> {
    priority: P,
    key: FrameId,
}

impl<P: Ord> HeapEntry<P> {
    /// Order by priority, then by frame index so ties pick the lowest frame.
    #[inline]
    fn precedes(&self, other: &Self) -> bool {
        (&self.priority, self.key) < (&other.priority, other.key)
    }
}

/// Array-backed binary min-heap keyed by [`FrameId`].
///
/// # Layout
/// Children of node `i` live at `2i + 1` and `2i + 2`; its parent at
/// `(i - 1) / 2`. Every node's priority is ≤ both children's.
///
/// Each key appears at most once. Inserting a key that is already present
/// updates its priority.
///
/// # Example
/// ```
/// use pagecache::{FrameId, MinHeap};
///
/// let mut heap = MinHeap::new();
/// heap.insert(FrameId::new(0), 30u64);
/// heap.insert(FrameId::new(1), 10);
/// heap.insert(FrameId::new(2), 20);
///
/// assert_eq!(heap.extract_min(), Some((FrameId::new(1), 10)));
/// assert_eq!(heap.peek(), Some((FrameId::new(2), 20)));
/// ```
#[derive(Debug, Clone)]
pub struct MinHeap<P> {
    entries: Vec<HeapEntry<P>>,
    /// `positions[key]` is the slot holding `key`, if present.
    positions: Vec<Option<usize>>,
}

impl<P: Ord + Copy> MinHeap<P> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: Vec::new(),
        }
    }

    /// Heap pre-sized for keys `0..capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: vec![None; capacity],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn contains(&self, key: FrameId) -> bool {
        self.position(key).is_some()
    }

    /// Current priority of `key`.
    pub fn priority_of(&self, key: FrameId) -> Option<P> {
        self.position(key).map(|pos| self.entries[pos].priority)
    }

    /// The minimum entry, without removing it.
    pub fn peek(&self) -> Option<(FrameId, P)> {
        self.entries.first().map(|e| (e.key, e.priority))
    }

    /// Insert `key`, or update its priority if already present. O(log n).
    pub fn insert(&mut self, key: FrameId, priority: P) {
        if self.update(key, priority) {
            return;
        }

        if key.index() >= self.positions.len() {
            self.positions.resize(key.index() + 1, None);
        }

        let pos = self.entries.len();
        self.entries.push(HeapEntry { priority, key });
        self.positions[key.index()] = Some(pos);
        self.sift_up(pos);
    }

    /// Change the priority of `key`. O(log n).
    ///
    /// Returns `false` if the key is not in the heap.
    pub fn update(&mut self, key: FrameId, priority: P) -> bool {
        let Some(pos) = self.position(key) else {
            return false;
        };

        self.entries[pos].priority = priority;
        let pos = self.sift_up(pos);
        self.sift_down(pos);
        true
    }

    /// Remove and return the minimum entry. O(log n).
    pub fn extract_min(&mut self) -> Option<(FrameId, P)> {
        let root = self.entries.first()?.key;
        self.remove(root).map(|priority| (root, priority))
    }

    /// Remove `key` wherever it sits, returning its priority. O(log n).
    pub fn remove(&mut self, key: FrameId) -> Option<P> {
        let pos = self.position(key)?;
        let last = self.entries.len() - 1;

        self.swap(pos, last);
        let removed = self.entries.pop()?;
        self.positions[key.index()] = None;

        if pos < self.entries.len() {
            let pos = self.sift_up(pos);
            self.sift_down(pos);
        }

        Some(removed.priority)
    }

    /// Find the minimum key satisfying `eligible`, leaving the heap intact.
    ///
    /// Entries are examined in priority order; ineligible ones are set aside
    /// and pushed back afterwards. Costs O(k log n) for k skipped entries.
    pub fn find_min_where<F>(&mut self, mut eligible: F) -> Option<FrameId>
    where
        F: FnMut(FrameId) -> bool,
    {
        let mut skipped = Vec::new();
        let mut found = None;

        while let Some((key, priority)) = self.extract_min() {
            skipped.push((key, priority));
            if eligible(key) {
                found = Some(key);
                break;
            }
        }

        for (key, priority) in skipped {
            self.insert(key, priority);
        }

        found
    }

    /// Remove every entry, returning them in ascending order.
    pub fn drain_sorted(&mut self) -> Vec<(FrameId, P)> {
        let mut out = Vec::with_capacity(self.len());
        while let Some(entry) = self.extract_min() {
            out.push(entry);
        }
        out
    }

    // ========================================================================
    // Internal: Heap maintenance
    // ========================================================================

    #[inline]
    fn position(&self, key: FrameId) -> Option<usize> {
        self.positions.get(key.index()).copied().flatten()
    }

    #[inline]
    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.entries.swap(a, b);
        self.positions[self.entries[a].key.index()] = Some(a);
        self.positions[self.entries[b].key.index()] = Some(b);
    }

    /// Move the entry at `pos` toward the root; returns its final slot.
    fn sift_up(&mut self, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.entries[pos].precedes(&self.entries[parent]) {
                self.swap(pos, parent);
                pos = parent;
            } else {
                break;
            }
        }
        pos
    }

    /// Move the entry at `pos` toward the leaves.
    fn sift_down(&mut self, mut pos: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * pos + 1;
            let right = 2 * pos + 2;
            let mut smallest = pos;

            if left < len && self.entries[left].precedes(&self.entries[smallest]) {
                smallest = left;
            }
            if right < len && self.entries[right].precedes(&self.entries[smallest]) {
                smallest = right;
            }
            if smallest == pos {
                return;
            }

            self.swap(pos, smallest);
            pos = smallest;
        }
    }

    #[cfg(test)]
    fn is_valid(&self) -> bool {
        let ordered = (1..self.entries.len())
            .all(|i| !self.entries[i].precedes(&self.entries[(i - 1) / 2]));
        let indexed = self
            .entries
            .iter()
            .enumerate()
            .all(|(pos, e)| self.positions[e.key.index()] == Some(pos));
        let count = self.positions.iter().filter(|p| p.is_some()).count();
        ordered && indexed && count == self.entries.len()
    }
}

impl<P: Ord + Copy> Default for MinHeap<P> {
    fn default() -> Self {
        Self::new()
    }
}
