//! Walk statistics and timing.

use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

/// Counters collected during one walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    /// Nodes charged (records + arrays)
    pub nodes: u64,
    pub records: u64,
    pub arrays: u64,
    /// Nodes excluded by a skip rule
    pub skipped: u64,
    /// Pops of a node that was already visited
    pub revisits: u64,
    /// Non-null references followed
    pub references: u64,
    /// Fields charged 0 because they could not be read
    pub inaccessible_fields: u64,
    /// Deepest the work list got
    pub max_pending: usize,
}

impl WalkStats {
    /// Distinct nodes reached, charged or skipped
    pub fn reached(&self) -> u64 {
        self.nodes + self.skipped
    }
}

/// Result of one estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Footprint {
    /// Estimated bytes
    pub bytes: u64,
    pub stats: WalkStats,
    /// Wall time spent walking
    pub elapsed: Duration,
}

impl Footprint {
    /// Footprint of the null reference
    pub fn zero() -> Self {
        Self {
            bytes: 0,
            stats: WalkStats::default(),
            elapsed: Duration::ZERO,
        }
    }

    /// Whole kilobytes (1024 bytes), rounded down
    pub fn kilobytes(&self) -> u64 {
        self.bytes / 1024
    }
}

impl fmt::Display for Footprint {
    /// `"<bytes> (<kb>kb)"`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}kb)", self.bytes, self.kilobytes())
    }
}

/// Timer for walks and probe workloads
pub struct WalkTimer {
    start: Instant,
}

impl WalkTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for WalkTimer {
    fn default() -> Self {
        Self::new()
    }
}
