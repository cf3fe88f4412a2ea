//! Pool configuration and sizing

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Slot pool configuration
///
/// Loadable from TOML:
///
/// ```toml
/// capacity = 6000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// Number of slots; ids are drawn from `[0, capacity)`
    pub capacity: usize,
}

impl PoolConfig {
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Size a pool for a workload
    ///
    /// Uses `2 × throughput × mean hold time`, which keeps the pool about
    /// half empty in steady state. 1000 ids/s held for 3 s gives 6000.
    pub fn for_workload(throughput_per_sec: f64, mean_hold: Duration) -> Self {
        let wanted = (2.0 * throughput_per_sec * mean_hold.as_secs_f64()).ceil();
        // NaN and negatives collapse to 1; float-to-int casts saturate
        let capacity = wanted.max(1.0) as usize;
        Self { capacity }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)
            .map_err(|e| Error::Config(format!("Failed to parse pool config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to render pool config: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidCapacity {
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
