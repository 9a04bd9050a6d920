//! Probe - memory and timing report for one object graph
//!
//! Combines a footprint estimate with averaged wall-clock timings of
//! arbitrary workloads (layout passes, repaints, ...) and a per-part size
//! breakdown sorted largest first.
//!
//! # Examples
//!
//! ```rust
//! use memsize::{MemoryCounter, Probe};
//!
//! let counter = MemoryCounter::default();
//! let rows: Vec<String> = (0..10).map(|i| format!("row {}", i)).collect();
//!
//! let probe = Probe::new(&counter).repetitions(3);
//! let mut report = probe.report(&rows)?;
//! report.add_timing("sort", probe.time(|| {
//!     let mut copy = rows.clone();
//!     copy.sort();
//! }));
//!
//! assert!(report.memory.bytes > 0);
//! assert!(report.timing_summary("sort").is_some());
//! # Ok::<(), memsize::MemsizeError>(())
//! ```

use crate::error::Result;
use crate::logging::{log_event, WalkEvent};
use crate::reflect::Reflect;
use crate::stats::{Footprint, WalkTimer};
use crate::walker::MemoryCounter;
use indexmap::IndexMap;
use serde::Serialize;
use std::time::Duration;

/// Runs each timed workload this many times by default
pub const DEFAULT_REPETITIONS: u32 = 4;

/// Measurement helper bound to a counter
#[derive(Debug, Clone, Copy)]
pub struct Probe<'c> {
    counter: &'c MemoryCounter,
    repetitions: u32,
}

impl<'c> Probe<'c> {
    pub fn new(counter: &'c MemoryCounter) -> Self {
        Self {
            counter,
            repetitions: DEFAULT_REPETITIONS,
        }
    }

    /// Number of runs averaged by [`time`](Self::time); at least 1
    pub fn repetitions(mut self, repetitions: u32) -> Self {
        self.repetitions = repetitions.max(1);
        self
    }

    /// Footprint of `root`
    pub fn footprint(&self, root: &dyn Reflect) -> Result<Footprint> {
        self.counter.try_estimate(Some(root))
    }

    /// Average wall time of `workload` over the configured repetitions
    pub fn time<F: FnMut()>(&self, mut workload: F) -> Duration {
        let timer = WalkTimer::new();
        for _ in 0..self.repetitions {
            workload();
        }
        timer.elapsed() / self.repetitions
    }

    /// Footprint of each part, measured independently, largest first
    ///
    /// Parts sharing a subgraph each include it.
    pub fn breakdown<'g, I, S>(&self, parts: I) -> Result<Vec<PartSize>>
    where
        I: IntoIterator<Item = (S, &'g dyn Reflect)>,
        S: Into<String>,
    {
        let mut sizes = Vec::new();
        for (name, root) in parts {
            sizes.push(PartSize {
                name: name.into(),
                bytes: self.footprint(root)?.bytes,
            });
        }
        sizes.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.name.cmp(&b.name)));
        Ok(sizes)
    }

    /// Start a report with the footprint of `root`
    pub fn report(&self, root: &dyn Reflect) -> Result<ProbeReport> {
        Ok(ProbeReport {
            root_type: root.type_name().to_string(),
            memory: self.footprint(root)?,
            repetitions: self.repetitions,
            timings: IndexMap::new(),
            parts: Vec::new(),
        })
    }
}

/// Size of one named part of a graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartSize {
    pub name: String,
    pub bytes: u64,
}

/// Collected measurements
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub root_type: String,
    pub memory: Footprint,
    pub repetitions: u32,
    /// Averaged timings in insertion order
    pub timings: IndexMap<String, Duration>,
    /// Part sizes, largest first
    pub parts: Vec<PartSize>,
}

impl ProbeReport {
    /// Record an averaged timing; a repeated label replaces the old value
    pub fn add_timing(&mut self, label: impl Into<String>, average: Duration) {
        let label = label.into();
        log_event(WalkEvent::ProbeTiming {
            label: label.clone(),
            avg_ns: average.as_nanos() as u64,
            repetitions: self.repetitions,
        });
        self.timings.insert(label, average);
    }

    /// `"<bytes> (<kb>kb)"`
    pub fn memory_summary(&self) -> String {
        self.memory.to_string()
    }

    /// `"<ns> (<ms>ms)"` for a recorded timing
    pub fn timing_summary(&self, label: &str) -> Option<String> {
        self.timings.get(label).map(|average| {
            let nanos = average.as_nanos();
            format!("{} ({}ms)", nanos, nanos / 1_000_000)
        })
    }

    /// Render as JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
