// slotpool - Concurrency-safe slot identifier allocator
// Hands out small reusable integer handles from a fixed range

#![warn(rust_2018_idioms)]

pub mod pool;

// Re-exports for convenience
pub use error::{Error, Result};
pub use pool::{
    run_simulation, PoolConfig, PoolStats, SimulationReport, SlotGuard, SlotId, SlotPool, SlotState,
};

/// slotpool error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid capacity: {capacity} (pool capacity must be at least 1)")]
        InvalidCapacity { capacity: usize },

        #[error("Pool exhausted: all {capacity} slots are allocated")]
        PoolExhausted { capacity: usize },

        #[error("Invalid slot: {slot} is outside [0, {capacity})")]
        InvalidSlot { slot: usize, capacity: usize },

        #[error("Configuration error: {0}")]
        Config(String),

        #[error("Internal error: {0}")]
        Internal(String),

        #[error("I/O error: {0}")]
        Io(#[from] std::io::Error),
    }

    impl Error {
        /// Whether the caller may retry the failed operation later.
        ///
        /// Only exhaustion is transient: it clears as soon as another
        /// holder releases a slot.
        pub fn is_recoverable(&self) -> bool {
            matches!(self, Error::PoolExhausted { .. })
        }
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
