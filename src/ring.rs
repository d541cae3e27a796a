//! Slot Ring: a fixed-size array of independently locked buffer pairs.
//!
//! The `ready` flag lives inside the mutex-guarded `SlotData`, never beside
//! it, so it is impossible to observe or mutate `ready` without first
//! holding the slot's lock.

use std::sync::{Mutex, TryLockError};

/// One slot's buffers and ready flag, always accessed through its `Mutex`.
pub struct SlotData {
    pub ready: bool,
    pub imagery: Vec<u8>,
    pub label: Option<Vec<u8>>,
}

/// Fixed-size ring of `M` independently-locked slots.
///
/// Decouples `N`-way production from 1-way consumption and bounds memory.
/// Locks are non-reentrant `std::sync::Mutex`; every public operation on a
/// slot holds at most one slot lock at a time.
pub struct SlotRing {
    slots: Vec<Mutex<SlotData>>,
}

impl SlotRing {
    /// Allocates `m` slots, each with an imagery buffer of `imagery_len`
    /// bytes and, if `label_len` is `Some`, a label buffer of that many
    /// bytes. All slots start `Empty`.
    pub fn new(m: usize, imagery_len: usize, label_len: Option<usize>) -> Self {
        let slots = (0..m)
            .map(|_| {
                Mutex::new(SlotData {
                    ready: false,
                    imagery: vec![0u8; imagery_len],
                    label: label_len.map(|n| vec![0u8; n]),
                })
            })
            .collect();
        Self { slots }
    }

    /// Number of slots (`M`).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Non-blocking attempt to lock slot `idx`. `None` means the slot is
    /// currently held by another thread; contended slots are skipped
    /// immediately rather than waited on.
    ///
    /// # Panics
    /// Panics if `idx >= self.len()` or if the mutex was poisoned by a
    /// panicking holder — a poisoned slot indicates a bug elsewhere in the
    /// crate and should not be silently treated as "still locked".
    pub fn try_lock(&self, idx: usize) -> Option<std::sync::MutexGuard<'_, SlotData>> {
        match self.slots[idx].try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::WouldBlock) => None,
            Err(TryLockError::Poisoned(e)) => panic!("slot {idx} mutex poisoned: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ring_starts_empty() {
        let ring = SlotRing::new(4, 16, Some(4));
        for i in 0..4 {
            let guard = ring.try_lock(i).expect("uncontended lock should succeed");
            assert!(!guard.ready);
            assert_eq!(guard.imagery.len(), 16);
            assert_eq!(guard.label.as_ref().map(Vec::len), Some(4));
        }
    }

    #[test]
    fn without_label_dataset_no_label_buffer_allocated() {
        let ring = SlotRing::new(1, 16, None);
        let guard = ring.try_lock(0).unwrap();
        assert!(guard.label.is_none());
    }

    #[test]
    fn held_lock_blocks_trylock() {
        let ring = SlotRing::new(2, 8, None);
        let _guard = ring.try_lock(0).unwrap();
        assert!(ring.try_lock(0).is_none());
        assert!(ring.try_lock(1).is_some());
    }
}
