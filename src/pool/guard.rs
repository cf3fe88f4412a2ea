//! RAII slot handle

use super::allocator::SlotPool;
use super::slot::SlotId;
use std::fmt;

/// A slot that returns itself to its pool when dropped
///
/// Obtained from [`SlotPool::acquire_guard`]. The guard remembers which
/// acquisition of its slot it owns, so dropping it never frees a slot that
/// was released by hand and then handed to someone else.
pub struct SlotGuard<'a> {
    pool: &'a SlotPool,
    id: SlotId,
    generation: u64,
    armed: bool,
}

impl<'a> SlotGuard<'a> {
    pub(crate) fn new(pool: &'a SlotPool, id: SlotId, generation: u64) -> Self {
        Self {
            pool,
            id,
            generation,
            armed: true,
        }
    }

    /// Id of the guarded slot
    ///
    /// Return the slot by dropping the guard. Pass this id to
    /// [`SlotPool::release`] only after [`detach`](Self::detach).
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Keep the slot allocated and hand back its id
    ///
    /// The caller becomes responsible for calling [`SlotPool::release`].
    pub fn detach(mut self) -> SlotId {
        self.armed = false;
        self.id
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.pool.release_generation(self.id, self.generation);
        }
    }
}

impl fmt::Debug for SlotGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotGuard")
            .field("id", &self.id)
            .field("armed", &self.armed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;

    #[test]
    fn test_guard_releases_on_drop() -> Result<()> {
        let pool = SlotPool::new(2)?;
        {
            let guard = pool.acquire_guard()?;
            assert_eq!(guard.id().index(), 0);
            assert!(pool.is_allocated(guard.id()));
        }
        assert_eq!(pool.allocated(), 0);
        Ok(())
    }

    #[test]
    fn test_guard_detach() -> Result<()> {
        let pool = SlotPool::new(2)?;
        let id = pool.acquire_guard()?.detach();

        assert!(pool.is_allocated(id));
        pool.release(id)?;
        assert!(!pool.is_allocated(id));
        Ok(())
    }

    #[test]
    fn test_guard_exhaustion() -> Result<()> {
        let pool = SlotPool::new(1)?;
        let held = pool.acquire_guard()?;
        assert!(pool.acquire_guard().is_err());

        drop(held);
        assert!(pool.acquire_guard().is_ok());
        Ok(())
    }

    #[test]
    fn test_guard_drop_spares_reissued_slot() -> Result<()> {
        let pool = SlotPool::new(1)?;
        let guard = pool.acquire_guard()?;

        // Released by hand while the guard is live, then handed out again
        pool.release(guard.id())?;
        let other = pool.acquire()?;
        assert_eq!(other, guard.id());

        drop(guard);

        // The new holder keeps the slot
        assert!(pool.is_allocated(other));
        assert_eq!(pool.allocated(), 1);
        assert!(matches!(
            pool.acquire(),
            Err(crate::error::Error::PoolExhausted { capacity: 1 })
        ));

        pool.release(other)?;
        assert_eq!(pool.allocated(), 0);
        Ok(())
    }

    #[test]
    fn test_guard_drop_spares_slot_reissued_to_guard() -> Result<()> {
        let pool = SlotPool::new(1)?;
        let first = pool.acquire_guard()?;
        pool.release(first.id())?;
        let second = pool.acquire_guard()?;

        drop(first);
        assert!(pool.is_allocated(second.id()));

        drop(second);
        assert_eq!(pool.allocated(), 0);
        Ok(())
    }
}
