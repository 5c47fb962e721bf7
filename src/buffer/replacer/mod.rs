//! Eviction policy implementations (replacers).
//!
//! A [`Replacer`] pairs an [`EvictionPolicy`], which turns accesses into a
//! priority per frame, with a [`MinHeap`] that finds the lowest priority in
//! O(log n). Lower priority means more evictable.
//!
//! Policies:
//! - [`LruPolicy`] - least recently used, by logical clock
//! - [`LfuPolicy`] - least frequently used, by access count
//! - [`FifoPolicy`] - oldest load first
//!
//! Eligibility (referenced, pinned) is not tracked here. Frames stay in the
//! heap while in use and are filtered when a victim is selected, so pinning
//! and releasing never touch the heap.

mod fifo;
mod heap;
mod lfu;
mod lru;

pub use fifo::FifoPolicy;
pub use heap::MinHeap;
pub use lfu::LfuPolicy;
pub use lru::LruPolicy;

use std::fmt;

use crate::common::FrameId;

/// What happened to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// A page was just loaded into the frame.
    Load,
    /// A resident page was read or written.
    Hit,
}

/// Turns frame accesses into eviction priorities.
pub trait EvictionPolicy: Send {
    /// Short lowercase name, for logs.
    fn name(&self) -> &'static str;

    /// Record an access to `frame_id`.
    fn record(&mut self, frame_id: FrameId, access: Access);

    /// Current priority of `frame_id`; lower is evicted first.
    fn priority(&self, frame_id: FrameId) -> u64;

    /// Drop all state for `frame_id` (the frame was evicted).
    fn forget(&mut self, frame_id: FrameId);

    /// Take over `frame_id` from a previous policy at position `rank`
    /// (0 is evicted first). Called once per frame, in rank order.
    ///
    /// The default records a load, which keeps the order for any policy
    /// whose loads advance a clock.
    fn seed(&mut self, frame_id: FrameId, rank: u64) {
        let _ = rank;
        self.record(frame_id, Access::Load);
    }
}

/// Selects a built-in policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    #[default]
    Lru,
    Lfu,
    Fifo,
}

impl PolicyKind {
    /// Build the policy for a pool of `capacity` frames.
    pub fn build(self, capacity: usize) -> Box<dyn EvictionPolicy> {
        match self {
            PolicyKind::Lru => Box::new(LruPolicy::new(capacity)),
            PolicyKind::Lfu => Box::new(LfuPolicy::new(capacity)),
            PolicyKind::Fifo => Box::new(FifoPolicy::new(capacity)),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyKind::Lru => "lru",
            PolicyKind::Lfu => "lfu",
            PolicyKind::Fifo => "fifo",
        };
        f.write_str(name)
    }
}

/// Per-frame slot in a policy's state vector, growing it on demand.
fn slot(values: &mut Vec<u64>, frame_id: FrameId) -> &mut u64 {
    if frame_id.index() >= values.len() {
        values.resize(frame_id.index() + 1, 0);
    }
    &mut values[frame_id.index()]
}

/// Ranks resident frames and picks eviction victims.
///
/// The heap holds exactly the frames that currently own a page.
pub struct Replacer {
    heap: MinHeap<u64>,
    policy: Box<dyn EvictionPolicy>,
    kind: PolicyKind,
    capacity: usize,
}

impl Replacer {
    pub fn new(kind: PolicyKind, capacity: usize) -> Self {
        Self {
            heap: MinHeap::with_capacity(capacity),
            policy: kind.build(capacity),
            kind,
            capacity,
        }
    }

    /// The active policy.
    pub fn kind(&self) -> PolicyKind {
        self.kind
    }

    /// Record an access and re-rank the frame.
    ///
    /// A hit on a frame that is no longer tracked is ignored: the frame was
    /// evicted between the caller's lookup and this call.
    pub fn record_access(&mut self, frame_id: FrameId, access: Access) {
        if access == Access::Hit && !self.heap.contains(frame_id) {
            return;
        }
        self.policy.record(frame_id, access);
        self.heap.insert(frame_id, self.policy.priority(frame_id));
    }

    /// The lowest-priority frame for which `eligible` holds.
    ///
    /// The frame stays tracked; call [`Replacer::remove`] once it is
    /// actually reclaimed.
    pub fn select_victim<F>(&mut self, eligible: F) -> Option<FrameId>
    where
        F: FnMut(FrameId) -> bool,
    {
        self.heap.find_min_where(eligible)
    }

    /// Stop tracking a frame.
    pub fn remove(&mut self, frame_id: FrameId) {
        self.heap.remove(frame_id);
        self.policy.forget(frame_id);
    }

    /// Swap the policy, keeping the current ranking as the starting order.
    pub fn set_policy(&mut self, kind: PolicyKind) {
        let ranked = self.heap.drain_sorted();
        self.policy = kind.build(self.capacity);
        self.kind = kind;

        for (rank, (frame_id, _)) in ranked.into_iter().enumerate() {
            self.policy.seed(frame_id, rank as u64);
            self.heap.insert(frame_id, self.policy.priority(frame_id));
        }
    }

    pub fn contains(&self, frame_id: FrameId) -> bool {
        self.heap.contains(frame_id)
    }

    /// Number of tracked frames.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl fmt::Debug for Replacer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replacer")
            .field("policy", &self.policy.name())
            .field("tracked", &self.heap.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
