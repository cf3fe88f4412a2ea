//! Slot pool implementation

use super::bitmap::SlotBitmap;
use super::config::PoolConfig;
use super::guard::SlotGuard;
use super::slot::{SlotId, SlotState};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Fixed-capacity pool of reusable slot identifiers
///
/// Identifiers come from `[0, capacity)`. `acquire` and `release` may be
/// called from any number of threads; each runs entirely under one mutex
/// guarding the bitmap and scan cursor, and neither ever waits for
/// another caller's release. Share the pool via `Arc` or by reference.
pub struct SlotPool {
    capacity: usize,
    state: Mutex<PoolState>,
}

struct PoolState {
    /// One bit per slot, set = allocated
    bitmap: SlotBitmap,
    /// Where the next scan begins, always in `[0, capacity)`
    cursor: usize,
    /// Number of set bits in `bitmap`
    allocated: usize,
    /// Per-slot acquisition count, bumped on every acquire
    generations: Vec<u64>,
}

impl SlotPool {
    /// Create a pool with every slot free
    ///
    /// Fails with `InvalidCapacity` when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        let bitmap = SlotBitmap::with_bits(capacity)?;
        let mut generations = Vec::new();
        generations
            .try_reserve_exact(capacity)
            .map_err(|_| Error::InvalidCapacity { capacity })?;
        generations.resize(capacity, 0);
        debug!(
            capacity,
            words = bitmap.word_count(),
            "Initialized slot pool"
        );

        Ok(Self {
            capacity,
            state: Mutex::new(PoolState {
                bitmap,
                cursor: 0,
                allocated: 0,
                generations,
            }),
        })
    }

    /// Create a pool from a loaded configuration
    pub fn from_config(config: &PoolConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.capacity)
    }

    /// Claim the next free slot at or after the scan cursor
    ///
    /// The scan wraps at `capacity` and probes each slot at most once.
    /// Returns `PoolExhausted` immediately when every slot is held.
    pub fn acquire(&self) -> Result<SlotId> {
        self.acquire_tagged().map(|(id, _)| id)
    }

    /// Acquire, also returning the slot's generation for this hold
    fn acquire_tagged(&self) -> Result<(SlotId, u64)> {
        let mut state = self.state.lock();

        let Some(index) = state.bitmap.next_clear_from(state.cursor) else {
            trace!(capacity = self.capacity, "Slot pool exhausted");
            return Err(Error::PoolExhausted {
                capacity: self.capacity,
            });
        };

        state.bitmap.set(index);
        state.allocated += 1;
        state.cursor = (index + 1) % self.capacity;
        let generation = state.generations[index].wrapping_add(1);
        state.generations[index] = generation;

        let id = SlotId::new(index);
        trace!(slot = %id, allocated = state.allocated, "Acquired slot");
        Ok((id, generation))
    }

    /// Claim a slot wrapped in a guard that releases it on drop
    pub fn acquire_guard(&self) -> Result<SlotGuard<'_>> {
        let (id, generation) = self.acquire_tagged()?;
        Ok(SlotGuard::new(self, id, generation))
    }

    /// Return a slot to the pool
    ///
    /// Releasing a slot that is already free succeeds and changes nothing.
    /// Out-of-range ids fail with `InvalidSlot` and leave the pool as is.
    ///
    /// A slot held through a [`SlotGuard`] should be returned by dropping
    /// the guard, or released here only after [`SlotGuard::detach`].
    /// Releasing it here while the guard is live ends the guard's hold;
    /// the guard's drop then leaves the slot alone.
    pub fn release(&self, id: impl Into<SlotId>) -> Result<()> {
        let id = id.into();
        self.check_bounds(id)?;
        self.free_slot(id);
        Ok(())
    }

    /// Clear the bit for an id already known to be in range
    fn free_slot(&self, id: SlotId) {
        let mut state = self.state.lock();
        Self::clear_locked(&mut state, id);
    }

    /// Release on behalf of a guard, only if the slot is still the hold
    /// that guard was issued for
    pub(crate) fn release_generation(&self, id: SlotId, generation: u64) {
        let mut state = self.state.lock();
        if state.generations[id.index()] == generation {
            Self::clear_locked(&mut state, id);
        } else {
            trace!(slot = %id, "Guard dropped after its slot was reissued");
        }
    }

    fn clear_locked(state: &mut PoolState, id: SlotId) {
        if state.bitmap.clear(id.index()) {
            state.allocated -= 1;
            trace!(slot = %id, allocated = state.allocated, "Released slot");
        } else {
            trace!(slot = %id, "Released slot that was already free");
        }
    }

    /// Current state of one slot
    pub fn state(&self, id: impl Into<SlotId>) -> Result<SlotState> {
        let id = id.into();
        self.check_bounds(id)?;
        let state = self.state.lock();
        Ok(SlotState::from_bit(state.bitmap.get(id.index())))
    }

    /// Whether `id` is currently held; false for out-of-range ids
    pub fn is_allocated(&self, id: impl Into<SlotId>) -> bool {
        matches!(self.state(id), Ok(SlotState::Allocated))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently held
    pub fn allocated(&self) -> usize {
        self.state.lock().allocated
    }

    /// Number of slots currently free
    pub fn available(&self) -> usize {
        self.capacity - self.allocated()
    }

    pub fn is_exhausted(&self) -> bool {
        self.allocated() == self.capacity
    }

    /// Consistent snapshot of the pool counters
    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        debug_assert_eq!(state.bitmap.count_ones(), state.allocated);
        PoolStats {
            capacity: self.capacity,
            allocated: state.allocated,
            available: self.capacity - state.allocated,
            cursor: state.cursor,
        }
    }

    fn check_bounds(&self, id: SlotId) -> Result<()> {
        if id.index() >= self.capacity {
            return Err(Error::InvalidSlot {
                slot: id.index(),
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for SlotPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("SlotPool")
            .field("capacity", &stats.capacity)
            .field("allocated", &stats.allocated)
            .field("cursor", &stats.cursor)
            .finish()
    }
}

/// Statistics for the slot pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub capacity: usize,
    pub allocated: usize,
    pub available: usize,
    pub cursor: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_zero_capacity() {
        assert!(matches!(
            SlotPool::new(0),
            Err(Error::InvalidCapacity { capacity: 0 })
        ));
    }

    #[test]
    fn test_pool_sequential_acquire() -> Result<()> {
        let pool = SlotPool::new(8)?;

        for expected in 0..8 {
            assert_eq!(pool.acquire()?.index(), expected);
        }
        assert_eq!(pool.allocated(), 8);
        assert!(pool.is_exhausted());
        Ok(())
    }

    #[test]
    fn test_pool_round_robin() -> Result<()> {
        let pool = SlotPool::new(4)?;

        assert_eq!(pool.acquire()?.index(), 0);
        assert_eq!(pool.acquire()?.index(), 1);
        assert_eq!(pool.acquire()?.index(), 2);

        pool.release(0)?;

        // The cursor continues past the freed slot before wrapping
        assert_eq!(pool.acquire()?.index(), 3);
        assert_eq!(pool.acquire()?.index(), 0);
        Ok(())
    }

    #[test]
    fn test_pool_exhaustion() -> Result<()> {
        let pool = SlotPool::new(3)?;
        for _ in 0..3 {
            pool.acquire()?;
        }

        let err = pool.acquire().unwrap_err();
        assert!(matches!(err, Error::PoolExhausted { capacity: 3 }));
        assert!(err.is_recoverable());

        // State untouched by the failed scan
        let stats = pool.stats();
        assert_eq!(stats.allocated, 3);
        assert_eq!(stats.cursor, 0);

        pool.release(1)?;
        assert_eq!(pool.acquire()?.index(), 1);
        assert!(pool.acquire().is_err());
        Ok(())
    }

    #[test]
    fn test_pool_acquire_release_never_exhausts() -> Result<()> {
        let pool = SlotPool::new(5)?;
        for round in 0..5 {
            let id = pool.acquire()?;
            assert_eq!(id.index(), round);
            pool.release(id)?;
        }
        assert_eq!(pool.allocated(), 0);
        Ok(())
    }

    #[test]
    fn test_pool_idempotent_release() -> Result<()> {
        let pool = SlotPool::new(1)?;

        let id = pool.acquire()?;
        pool.release(id)?;
        pool.release(id)?;
        assert_eq!(pool.allocated(), 0);

        assert_eq!(pool.acquire()?, id);
        assert_eq!(pool.allocated(), 1);
        Ok(())
    }

    #[test]
    fn test_pool_release_out_of_range() -> Result<()> {
        let pool = SlotPool::new(4)?;
        pool.acquire()?;
        let before = pool.stats();

        for bad in [4, 5, usize::MAX] {
            assert!(matches!(
                pool.release(bad),
                Err(Error::InvalidSlot { slot, capacity: 4 }) if slot == bad
            ));
        }
        assert_eq!(pool.stats(), before);
        Ok(())
    }

    #[test]
    fn test_pool_release_keeps_cursor() -> Result<()> {
        let pool = SlotPool::new(10)?;
        let a = pool.acquire()?;
        pool.acquire()?;
        pool.release(a)?;
        assert_eq!(pool.stats().cursor, 2);
        Ok(())
    }

    #[test]
    fn test_pool_slot_state() -> Result<()> {
        let pool = SlotPool::new(2)?;
        let id = pool.acquire()?;

        assert_eq!(pool.state(id)?, SlotState::Allocated);
        assert_eq!(pool.state(1)?, SlotState::Free);
        assert!(pool.state(2).is_err());

        assert!(pool.is_allocated(id));
        assert!(!pool.is_allocated(1));
        assert!(!pool.is_allocated(99));
        Ok(())
    }

    #[test]
    fn test_pool_stats() -> Result<()> {
        let pool = SlotPool::new(6)?;
        pool.acquire()?;
        pool.acquire()?;

        let stats = pool.stats();
        assert_eq!(
            stats,
            PoolStats {
                capacity: 6,
                allocated: 2,
                available: 4,
                cursor: 2,
            }
        );
        assert_eq!(pool.available(), 4);
        Ok(())
    }

    #[test]
    fn test_pool_from_config() -> Result<()> {
        let pool = SlotPool::from_config(&PoolConfig::new(12))?;
        assert_eq!(pool.capacity(), 12);

        assert!(SlotPool::from_config(&PoolConfig::new(0)).is_err());
        Ok(())
    }

    #[test]
    fn test_independent_pools() -> Result<()> {
        let a = SlotPool::new(2)?;
        let b = SlotPool::new(2)?;

        a.acquire()?;
        a.acquire()?;
        assert!(a.acquire().is_err());
        assert_eq!(b.acquire()?.index(), 0);
        Ok(())
    }
}
