//! Entity identifiers and allocation.
//!
//! An [`EntityId`] is a flat 32-bit handle. The allocator hands out indices
//! monotonically and recycles destroyed ones through a LIFO free-list
//! stack: allocation pops the free-list if non-empty, otherwise mints a
//! new index from the running counter, which starts at 1.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A 32-bit entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Allocates and recycles [`EntityId`]s via a monotonic counter plus a LIFO
/// free-list stack.
#[derive(Debug, Clone, Default)]
pub struct EntityAllocator {
    next_id: u32,
    free_stack: Vec<u32>,
}

impl EntityAllocator {
    /// Create a fresh allocator. The first allocated ID is `1`.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            free_stack: Vec::new(),
        }
    }

    /// Allocate a new [`EntityId`], preferring a recycled index.
    pub fn allocate(&mut self) -> EntityId {
        if let Some(id) = self.free_stack.pop() {
            return EntityId(id);
        }
        let id = self.next_id;
        self.next_id += 1;
        EntityId(id)
    }

    /// Push a destroyed entity's ID onto the free-list stack for reuse.
    pub fn recycle(&mut self, id: EntityId) {
        self.free_stack.push(id.0);
    }

    /// Snapshot the allocator's internal state for serialization.
    pub fn snapshot(&self) -> AllocatorSnapshot {
        AllocatorSnapshot {
            next_id: self.next_id,
            free_stack: self.free_stack.clone(),
        }
    }

    /// Restore the allocator from a previously captured snapshot.
    pub fn restore(snapshot: AllocatorSnapshot) -> Self {
        Self {
            next_id: snapshot.next_id,
            free_stack: snapshot.free_stack,
        }
    }
}

/// Serializable allocator state, used by [`crate::snapshot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatorSnapshot {
    pub next_id: u32,
    pub free_stack: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_id_is_one() {
        let mut alloc = EntityAllocator::new();
        assert_eq!(alloc.allocate(), EntityId(1));
    }

    #[test]
    fn ids_are_monotonic_without_recycling() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        let c = alloc.allocate();
        assert_eq!((a.0, b.0, c.0), (1, 2, 3));
    }

    #[test]
    fn recycled_ids_are_reused_lifo() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        alloc.recycle(a);
        alloc.recycle(b);
        // LIFO: b was recycled last, so it comes back first.
        assert_eq!(alloc.allocate(), b);
        assert_eq!(alloc.allocate(), a);
        // Free list exhausted: falls back to the monotonic counter.
        assert_eq!(alloc.allocate(), EntityId(3));
    }

    #[test]
    fn snapshot_roundtrip() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let _b = alloc.allocate();
        alloc.recycle(a);
        let snap = alloc.snapshot();
        let restored = EntityAllocator::restore(snap);
        let mut restored = restored;
        assert_eq!(restored.allocate(), a);
    }
}
