//! Walk Logging
//!
//! Structured events for estimates, useful for:
//! - Finding which rule excluded a subgraph
//! - Spotting fields that were charged nothing
//! - Comparing walk cost across graphs
//!
//! Events are only produced by counters built with `verbose: true`; the
//! per-node `log::trace!` output of the walker is independent of this.
//!
//! Log Levels:
//! - WARN: Inaccessible fields
//! - INFO: Walk start/end, probe timings
//! - DEBUG: Skipped nodes

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Log level for walk events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Walk event types
#[derive(Debug, Clone, PartialEq)]
pub enum WalkEvent {
    /// Estimate started
    WalkStart { root_type: String },

    /// Estimate finished
    WalkEnd {
        root_type: String,
        bytes: u64,
        nodes: u64,
        duration_us: u64,
    },

    /// Node excluded by a skip rule
    NodeSkipped { type_name: String, rule: String },

    /// Field charged 0 because it could not be read
    FieldInaccessible { owner: String, field: String },

    /// Averaged workload timing from a probe
    ProbeTiming {
        label: String,
        avg_ns: u64,
        repetitions: u32,
    },
}

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Minimum log level
    pub level: LogLevel,

    /// Print events to stdout
    pub console: bool,

    /// Forward events to the `log` facade
    pub forward: bool,

    /// Enable JSON format for console output
    pub json: bool,

    /// Enable timestamps for console output
    pub timestamps: bool,

    /// Maximum number of events kept in memory
    pub max_events: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            console: false,
            forward: true,
            json: false,
            timestamps: true,
            max_events: 10_000,
        }
    }
}

/// Walk logger - collects and prints walk events
pub struct WalkLogger {
    config: LoggerConfig,
    events: Mutex<Vec<(Instant, WalkEvent)>>,
    enabled: AtomicBool,
}

impl WalkLogger {
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            config,
            events: Mutex::new(Vec::new()),
            enabled: AtomicBool::new(true),
        }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Log a walk event
    pub fn log(&self, event: WalkEvent) {
        if !self.is_enabled() {
            return;
        }

        let level = Self::event_level(&event);
        if level > self.config.level {
            return;
        }

        if self.config.forward {
            log::log!(target: "memsize", log::Level::from(level), "{}", Self::describe(&event));
        }

        if self.config.console {
            self.output_console(&event);
        }

        if let Ok(mut events) = self.events.lock() {
            if events.len() < self.config.max_events {
                events.push((Instant::now(), event));
            }
        }
    }

    fn event_level(event: &WalkEvent) -> LogLevel {
        match event {
            WalkEvent::FieldInaccessible { .. } => LogLevel::Warn,
            WalkEvent::WalkStart { .. }
            | WalkEvent::WalkEnd { .. }
            | WalkEvent::ProbeTiming { .. } => LogLevel::Info,
            WalkEvent::NodeSkipped { .. } => LogLevel::Debug,
        }
    }

    fn output_console(&self, event: &WalkEvent) {
        if self.config.timestamps {
            let now = chrono::Local::now();
            print!("[{}] ", now.format("%Y-%m-%d %H:%M:%S%.3f"));
        }

        if self.config.json {
            if let Ok(line) = serde_json::to_string(&Self::to_json(event)) {
                println!("{}", line);
            }
        } else {
            println!("[memsize] {}", Self::describe(event));
        }
    }

    /// Human-readable form
    fn describe(event: &WalkEvent) -> String {
        match event {
            WalkEvent::WalkStart { root_type } => format!("walk started at {}", root_type),
            WalkEvent::WalkEnd {
                root_type,
                bytes,
                nodes,
                duration_us,
            } => format!(
                "walk of {} finished: {} bytes in {} nodes ({}us)",
                root_type, bytes, nodes, duration_us
            ),
            WalkEvent::NodeSkipped { type_name, rule } => {
                format!("skipped {} ({})", type_name, rule)
            },
            WalkEvent::FieldInaccessible { owner, field } => {
                format!("{}.{} is not accessible, charged 0 bytes", owner, field)
            },
            WalkEvent::ProbeTiming {
                label,
                avg_ns,
                repetitions,
            } => format!(
                "{}: {}ns avg over {} runs",
                label, avg_ns, repetitions
            ),
        }
    }

    fn to_json(event: &WalkEvent) -> serde_json::Value {
        match event {
            WalkEvent::WalkStart { root_type } => serde_json::json!({
                "type": "walk_start",
                "root_type": root_type
            }),
            WalkEvent::WalkEnd {
                root_type,
                bytes,
                nodes,
                duration_us,
            } => serde_json::json!({
                "type": "walk_end",
                "root_type": root_type,
                "bytes": bytes,
                "nodes": nodes,
                "duration_us": duration_us
            }),
            WalkEvent::NodeSkipped { type_name, rule } => serde_json::json!({
                "type": "node_skipped",
                "type_name": type_name,
                "rule": rule
            }),
            WalkEvent::FieldInaccessible { owner, field } => serde_json::json!({
                "type": "field_inaccessible",
                "owner": owner,
                "field": field
            }),
            WalkEvent::ProbeTiming {
                label,
                avg_ns,
                repetitions,
            } => serde_json::json!({
                "type": "probe_timing",
                "label": label,
                "avg_ns": avg_ns,
                "repetitions": repetitions
            }),
        }
    }

    pub fn get_events(&self) -> Vec<(Instant, WalkEvent)> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(_) => Vec::new(),
        }
    }

    pub fn clear_events(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    pub fn event_count(&self) -> usize {
        match self.events.lock() {
            Ok(events) => events.len(),
            Err(_) => 0,
        }
    }
}

impl Default for WalkLogger {
    fn default() -> Self {
        Self::new(LoggerConfig::default())
    }
}

lazy_static::lazy_static! {
    static ref GLOBAL_LOGGER: Mutex<WalkLogger> = Mutex::new(WalkLogger::default());
}

/// Log an event to the global logger
pub fn log_event(event: WalkEvent) {
    if let Ok(logger) = GLOBAL_LOGGER.lock() {
        logger.log(event);
    }
}

/// Replace the global logger configuration; stored events are dropped
pub fn configure_logger(config: LoggerConfig) {
    if let Ok(mut logger) = GLOBAL_LOGGER.lock() {
        *logger = WalkLogger::new(config);
    }
}

/// Number of events held by the global logger
pub fn get_event_count() -> usize {
    match GLOBAL_LOGGER.lock() {
        Ok(logger) => logger.event_count(),
        Err(_) => 0,
    }
}

/// Snapshot of the global logger's events
pub fn get_events() -> Vec<WalkEvent> {
    match GLOBAL_LOGGER.lock() {
        Ok(logger) => logger.get_events().into_iter().map(|(_, event)| event).collect(),
        Err(_) => Vec::new(),
    }
}
