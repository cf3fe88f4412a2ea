//! Slot identifiers and per-slot state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a slot handed out by a [`SlotPool`](super::SlotPool)
///
/// Always lies in `[0, capacity)` for the pool that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(usize);

impl SlotId {
    /// Create a slot ID from a raw index
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Raw index of this slot
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for SlotId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl From<SlotId> for usize {
    fn from(id: SlotId) -> Self {
        id.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

/// Occupancy of a single slot
///
/// Slots start `Free`, move to `Allocated` on acquire and back to `Free`
/// on release. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotState {
    Free,
    Allocated,
}

impl SlotState {
    pub(crate) fn from_bit(bit: bool) -> Self {
        if bit {
            SlotState::Allocated
        } else {
            SlotState::Free
        }
    }
}
