//! Parallel load driver for a slot pool
//!
//! Runs acquire/release cycles from a dedicated rayon thread pool and
//! records how often the pool ran dry and whether any id was ever handed
//! to two holders at once.

use super::allocator::{PoolStats, SlotPool};
use crate::error::{Error, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// Outcome of a simulation run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub workers: usize,
    pub rounds: u64,
    pub batch: usize,
    /// Successful acquires
    pub acquired: u64,
    /// Acquires that hit `PoolExhausted`
    pub exhausted: u64,
    /// Acquires that returned an id someone else still held
    pub duplicates: u64,
    pub elapsed_ms: u128,
    /// Pool counters after every worker finished
    pub stats: PoolStats,
}

/// Drive `pool` from `workers` threads for `rounds` cycles each
///
/// A cycle acquires up to `batch` slots, then releases all it got.
pub fn run_simulation(
    pool: &SlotPool,
    workers: NonZeroUsize,
    rounds: u64,
    batch: usize,
) -> Result<SimulationReport> {
    let workers = workers.get();
    info!(
        capacity = pool.capacity(),
        workers, rounds, batch, "Starting simulation"
    );

    // One marker per slot; a worker that finds its fresh slot already
    // marked has been handed a duplicate
    let held: Vec<AtomicBool> = (0..pool.capacity()).map(|_| AtomicBool::new(false)).collect();
    let acquired = AtomicU64::new(0);
    let exhausted = AtomicU64::new(0);
    let duplicates = AtomicU64::new(0);

    let threads = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| Error::Internal(format!("Failed to start simulation workers: {}", e)))?;

    let start = Instant::now();
    threads.install(|| {
        (0..workers).into_par_iter().for_each(|_| {
            let mut mine = Vec::with_capacity(batch);
            for _ in 0..rounds {
                for _ in 0..batch {
                    match pool.acquire() {
                        Ok(id) => {
                            if held[id.index()].swap(true, Ordering::AcqRel) {
                                duplicates.fetch_add(1, Ordering::Relaxed);
                            }
                            acquired.fetch_add(1, Ordering::Relaxed);
                            mine.push(id);
                        }
                        Err(Error::PoolExhausted { .. }) => {
                            exhausted.fetch_add(1, Ordering::Relaxed);
                            std::thread::yield_now();
                        }
                        Err(e) => warn!("Unexpected acquire error: {}", e),
                    }
                }
                for id in mine.drain(..) {
                    held[id.index()].store(false, Ordering::Release);
                    if let Err(e) = pool.release(id) {
                        warn!("Unexpected release error: {}", e);
                    }
                }
            }
        });
    });

    let report = SimulationReport {
        workers,
        rounds,
        batch,
        acquired: acquired.into_inner(),
        exhausted: exhausted.into_inner(),
        duplicates: duplicates.into_inner(),
        elapsed_ms: start.elapsed().as_millis(),
        stats: pool.stats(),
    };

    if report.duplicates > 0 {
        warn!(duplicates = report.duplicates, "Duplicate slot ids observed");
    }
    info!(elapsed_ms = report.elapsed_ms, "Simulation finished");

    Ok(report)
}
