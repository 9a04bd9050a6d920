//! # memsize - Object Graph Footprint Estimator
//!
//! memsize estimates how many bytes an object graph occupies by walking
//! everything reachable from a root and charging each distinct node once
//! under a configurable size model.
//!
//! ## Overview
//!
//! - **Size Model**: byte widths for scalars, references, object headers and
//!   array headers, plus the alignment every node is rounded to
//! - **Graph Walker**: identity-keyed visited set and an explicit work list,
//!   so cycles terminate and deep graphs never recurse
//! - **Skip Rules**: interned values and opaque types are excluded from the
//!   total while the references to them are still charged
//! - **Probe**: memory plus averaged workload timings for one graph
//!
//! The result is an estimate under the model, not a measurement of any
//! particular allocator.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//!
//! struct Style {
//!     fg: u32,
//!     bg: u32,
//! }
//!
//! struct Label {
//!     text: String,
//!     style: Rc<Style>,
//! }
//!
//! memsize::reflect_record!(Style { fg, bg });
//! memsize::reflect_record!(Label { text, style });
//!
//! fn main() -> Result<(), memsize::MemsizeError> {
//!     let counter = memsize::init()?;
//!
//!     let style = Rc::new(Style { fg: 0, bg: 0xffffff });
//!     let ok = Label { text: "OK".into(), style: style.clone() };
//!     let cancel = Label { text: "Cancel".into(), style };
//!
//!     // Each label: record 16 + text 24 + style 16
//!     assert_eq!(counter.estimate_of(&ok), 56);
//!     assert_eq!(counter.estimate_of(&cancel), 56);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   shape()    ┌──────────────────────────────┐
//! │ Reflect impl │ ───────────► │ MemoryCounter                │
//! └──────────────┘              │  ├─ WorkList   (pending)     │
//!                               │  ├─ VisitedSet (identities)  │
//!        ┌────────────────────► │  ├─ SkipRuleSet              │
//!        │ EstimatorConfig      │  └─ SizeModel ──► align()    │
//!        │                      └──────────────┬───────────────┘
//!        │                                     │ Footprint
//!        │                                     ▼
//!        │                              ┌─────────────┐
//!        └───────────────────────────── │ Probe       │
//!                                       └─────────────┘
//! ```
//!
//! ## Describing types
//!
//! Types opt in through [`Reflect`] (nodes) and [`FieldType`](reflect::FieldType)
//! (storage). [`reflect_record!`] covers plain structs; hand-written impls can
//! mark fields static, weak or inaccessible. Standard containers are covered:
//!
//! | Stored as                         | Charged                                 |
//! |-----------------------------------|-----------------------------------------|
//! | `bool`, integers, floats, `char`  | scalar width                            |
//! | `Box`, `Rc`, `Arc`, `&T`          | pointer; target walked                  |
//! | `rc::Weak`, `sync::Weak`          | pointer; target not walked              |
//! | `String`, `Vec<T>`                | pointer; array node walked              |
//! | `[T; N]`, `RefCell<T>`, records   | in place, no extra header               |
//! | records inside `Vec` or `[T; N]`  | in place, no extra header               |
//! | `usize`, `isize`                  | pointer width unless overridden         |
//! | `Option<T>`                       | as `T`; `None` is a null slot           |
//!
//! ## Thread Safety
//!
//! [`MemoryCounter`] is `Send + Sync`. Concurrent estimates on one counter
//! are serialized; nested estimates on the same thread fail with
//! [`MemsizeError::Reentrant`].

pub mod config;
pub mod error;

// Layout and introspection
pub mod model;
pub mod reflect;
pub mod skip;

// Estimation
pub mod probe;
pub mod walker;

// Monitoring
pub mod logging;
pub mod stats;

pub use config::{ConfigError, EstimatorConfig};
pub use error::{MemsizeError, Result};
pub use model::{ScalarKind, SizeModel};
pub use probe::{PartSize, Probe, ProbeReport};
pub use reflect::{Identity, Reflect, Shape, Slot};
pub use skip::{SkipRule, SkipRuleSet};
pub use stats::{Footprint, WalkStats};
pub use walker::MemoryCounter;

/// memsize version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Counter configured from the environment
///
/// Reads the `MEMSIZE_*` variables described on
/// [`EstimatorConfig::from_env`].
///
/// # Errors
///
/// Returns `Config` or `UnknownScalar` if the resulting configuration is
/// invalid.
pub fn init() -> Result<MemoryCounter> {
    MemoryCounter::new(&EstimatorConfig::from_env())
}

/// Counter with an explicit configuration
///
/// # Examples
///
/// ```rust
/// let counter = memsize::init_with_config(memsize::EstimatorConfig::wide())?;
/// assert_eq!(counter.sizes().pointer_width(), 8);
/// # Ok::<(), memsize::MemsizeError>(())
/// ```
pub fn init_with_config(config: EstimatorConfig) -> Result<MemoryCounter> {
    MemoryCounter::new(&config)
}
