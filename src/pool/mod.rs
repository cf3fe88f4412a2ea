//! Slot Pool
//!
//! Hands out small integer identifiers ("slots") from a fixed range
//! `[0, capacity)` to concurrent workers, and takes them back in any order.
//!
//! # Architecture
//!
//! ```text
//! SlotPool
//!   └─→ Mutex<PoolState>
//!        ├─→ SlotBitmap  [1,1,0,1,0,0,...]  (1 bit per slot, ceil(N/64) words)
//!        ├─→ cursor      → where the next scan begins
//!        ├─→ allocated   → number of set bits
//!        └─→ generations → per-slot acquire count (guards release only their own hold)
//!
//! acquire():  scan forward from cursor, wrap at N, stop after N probes
//! release(i): clear bit i (cursor untouched)
//! ```
//!
//! Allocation is "next sequential available": after handing out slot `i`
//! the next search starts at `i + 1`, so freed slots are reused in
//! round-robin order instead of always recycling the lowest id.

pub mod allocator;
pub(crate) mod bitmap;
pub mod config;
pub mod guard;
pub mod simulation;
pub mod slot;

pub use allocator::{PoolStats, SlotPool};
pub use config::PoolConfig;
pub use guard::SlotGuard;
pub use simulation::{run_simulation, SimulationReport};
pub use slot::{SlotId, SlotState};
