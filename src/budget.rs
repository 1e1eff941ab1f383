//! Free-space sampling and the budget arithmetic built on it.
//!
//! Every admission, archive and batch decision goes through a
//! [`StorageBudget`], which reports free bytes on one volume at the moment it
//! is asked. [`BudgetPolicy`] turns that into the space a request may use
//! (free minus a safety margin) and estimates how much space converting a
//! file will take.

use std::io;
use std::path::{Path, PathBuf};

/// Source of free-space readings for one volume.
///
/// Implementations must sample fresh on every call; callers never cache the
/// value across batches.
pub trait StorageBudget: Send + Sync {
    fn free_bytes(&self) -> u64;
}

/// Budget backed by the filesystem containing `path`.
#[derive(Debug, Clone)]
pub struct VolumeBudget {
    path: PathBuf,
}

impl VolumeBudget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Query the volume, surfacing the OS error.
    pub fn query(&self) -> io::Result<u64> {
        free_space(&self.path)
    }
}

impl StorageBudget for VolumeBudget {
    /// Free bytes available to unprivileged writers, or 0 when the volume
    /// cannot be queried.
    fn free_bytes(&self) -> u64 {
        match self.query() {
            Ok(bytes) => {
                tracing::debug!("{:?}: {} bytes free", self.path, bytes);
                bytes
            }
            Err(e) => {
                tracing::warn!("Cannot query free space for {:?}: {}", self.path, e);
                0
            }
        }
    }
}

#[cfg(unix)]
fn free_space(path: &Path) -> io::Result<u64> {
    let stat = nix::sys::statvfs::statvfs(path).map_err(io::Error::from)?;
    #[allow(clippy::unnecessary_cast)]
    let bytes = (stat.blocks_available() as u64).saturating_mul(stat.fragment_size() as u64);
    Ok(bytes)
}

#[cfg(not(unix))]
fn free_space(path: &Path) -> io::Result<u64> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("free-space query not supported on this platform ({path:?})"),
    ))
}

/// Budget that always reports the same number of free bytes.
#[derive(Debug, Clone, Copy)]
pub struct FixedBudget(pub u64);

impl StorageBudget for FixedBudget {
    fn free_bytes(&self) -> u64 {
        self.0
    }
}

/// Safety margin and output-size estimate shared by every budget check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetPolicy {
    /// Bytes always left free on a volume.
    pub safety_margin: u64,
    /// Estimated output-plus-scratch size as a multiple of the input size.
    pub output_multiplier: f64,
}

impl BudgetPolicy {
    pub const DEFAULT_SAFETY_MARGIN: u64 = 512 * 1024 * 1024;
    pub const DEFAULT_OUTPUT_MULTIPLIER: f64 = 2.0;

    /// Create a policy. Multipliers below 1.0 (or NaN) are raised to 1.0.
    pub fn new(safety_margin: u64, output_multiplier: f64) -> Self {
        let output_multiplier = if output_multiplier >= 1.0 {
            output_multiplier
        } else {
            1.0
        };
        Self {
            safety_margin,
            output_multiplier,
        }
    }

    /// Usable bytes given a free-space reading. Never underflows.
    pub fn available(&self, free: u64) -> u64 {
        free.saturating_sub(self.safety_margin)
    }

    /// Sample `budget` and apply the margin.
    pub fn sample(&self, budget: &dyn StorageBudget) -> u64 {
        self.available(budget.free_bytes())
    }

    /// Estimated peak footprint of converting a file of `size` bytes.
    pub fn footprint(&self, size: u64) -> u64 {
        let estimate = (size as f64 * self.output_multiplier).ceil();
        if estimate >= u64::MAX as f64 {
            u64::MAX
        } else {
            (estimate as u64).max(size)
        }
    }
}

impl Default for BudgetPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SAFETY_MARGIN, Self::DEFAULT_OUTPUT_MULTIPLIER)
    }
}
