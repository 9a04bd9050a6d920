//! Graph Walker - estimates the bytes reachable from a root
//!
//! # Algorithm
//!
//! ```text
//! push root
//! while pop node:
//!     node visited?            -> 0
//!     node matched by a rule?  -> mark visited, 0
//!     mark visited
//!     Record: header + Σ field slots     (embedded values flattened)
//!     Array:  header + Σ element slots   (embedded values flattened)
//!     total += align(subtotal)
//!     push every non-null, non-weak reference
//! ```
//!
//! Values stored by value (records, fixed arrays, cell contents) are not
//! nodes: they are charged inside their owner without a header. Skip rules
//! still apply to them, so an opaque record stored inline costs nothing.
//!
//! Each node is charged at most once per walk no matter how many references
//! lead to it, so cycles terminate and shared subgraphs are counted once.
//! Reference slots are charged a pointer in their owner whether or not the
//! target ends up charged.
//!
//! # Borrows
//!
//! `RefCell` contents are read under shared borrows that the walk holds
//! until it finishes. Code running during the walk cannot mutably borrow a
//! cell the walk has already read.
//!
//! # Concurrency
//!
//! A counter holds one visited set, protected by a reentrant mutex.
//! Estimates from different threads are serialized. An estimate started
//! from inside a walk on the same thread (a `Reflect` impl or skip rule
//! calling back into the counter) is rejected with
//! [`MemsizeError::Reentrant`].

pub mod visited;
pub mod work_list;

pub use visited::VisitedSet;
pub use work_list::WorkList;

use crate::config::EstimatorConfig;
use crate::error::{MemsizeError, Result};
use crate::logging::{log_event, WalkEvent};
use crate::model::{ScalarKind, SizeModel};
use crate::reflect::{BorrowGuard, Elements, Field, Identity, Reflect, Shape, Slot, Storage};
use crate::skip::{SkipRule, SkipRuleSet};
use crate::stats::{Footprint, WalkStats, WalkTimer};
use parking_lot::ReentrantMutex;
use static_assertions::assert_impl_all;
use std::cell::RefCell;

/// Nesting limit for values embedded inside values
///
/// Well-formed types nest only as deep as their declarations. A descriptor
/// that embeds itself would otherwise never finish.
const MAX_EMBED_DEPTH: usize = 256;

/// Footprint estimator
///
/// # Examples
///
/// ```rust
/// use memsize::{EstimatorConfig, MemoryCounter};
///
/// struct Cell {
///     row: u32,
///     col: u32,
///     text: String,
/// }
///
/// memsize::reflect_record!(Cell { row, col, text });
///
/// let counter = MemoryCounter::new(&EstimatorConfig::default())?;
/// let cell = Cell { row: 1, col: 2, text: "abc".to_string() };
///
/// // record: align(8 + 4 + 4 + 4) = 24, string: align(16 + 3) = 24
/// assert_eq!(counter.estimate_of(&cell), 48);
/// assert_eq!(counter.estimate(None), 0);
/// # Ok::<(), memsize::MemsizeError>(())
/// ```
pub struct MemoryCounter {
    sizes: SizeModel,
    rules: SkipRuleSet,
    verbose: bool,
    state: ReentrantMutex<RefCell<VisitedSet>>,
}

assert_impl_all!(MemoryCounter: Send, Sync);

impl MemoryCounter {
    /// Build a counter from configuration
    pub fn new(config: &EstimatorConfig) -> Result<Self> {
        let sizes = SizeModel::from_config(config)?;
        let rules = SkipRuleSet::from_config(config);
        Ok(Self::with_parts(sizes, rules).verbose(config.verbose))
    }

    /// Build a counter from an existing model and rule set
    pub fn with_parts(sizes: SizeModel, rules: SkipRuleSet) -> Self {
        Self {
            sizes,
            rules,
            verbose: false,
            state: ReentrantMutex::new(RefCell::new(VisitedSet::new())),
        }
    }

    /// Emit walk events to the global logger
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Add a skip rule after the configured ones
    pub fn add_rule(&mut self, rule: impl SkipRule + 'static) {
        self.rules.push(rule);
    }

    pub fn sizes(&self) -> &SizeModel {
        &self.sizes
    }

    pub fn rules(&self) -> &SkipRuleSet {
        &self.rules
    }

    /// Estimated bytes reachable from `root`; `None` is 0
    ///
    /// Called from inside a walk of this same counter, logs an error and
    /// returns 0. Use [`try_estimate`](Self::try_estimate) to get the error
    /// instead.
    pub fn estimate(&self, root: Option<&dyn Reflect>) -> u64 {
        match self.try_estimate(root) {
            Ok(footprint) => footprint.bytes,
            Err(err) => {
                log::error!("estimate failed: {}", err);
                0
            },
        }
    }

    /// [`estimate`](Self::estimate) for a non-null root
    pub fn estimate_of<T: Reflect>(&self, root: &T) -> u64 {
        self.estimate(Some(root))
    }

    /// Estimate with walk statistics
    ///
    /// # Errors
    ///
    /// - `Reentrant` if this counter is already walking on the current thread
    pub fn try_estimate(&self, root: Option<&dyn Reflect>) -> Result<Footprint> {
        let Some(root) = root else {
            return Ok(Footprint::zero());
        };

        let guard = self.state.lock();
        let mut visited = guard.try_borrow_mut().map_err(|_| MemsizeError::Reentrant)?;

        // A walk that unwound out of a panicking descriptor may have left
        // entries behind.
        visited.clear();

        let root_type = root.type_name();
        if self.verbose {
            log_event(WalkEvent::WalkStart {
                root_type: root_type.to_string(),
            });
        }

        let timer = WalkTimer::new();
        let walk = Walk {
            sizes: &self.sizes,
            rules: &self.rules,
            verbose: self.verbose,
            visited: &mut *visited,
            pending: WorkList::new(),
            guards: Vec::new(),
            stats: WalkStats::default(),
        };
        let (bytes, stats) = walk.run(root);
        visited.clear();

        let footprint = Footprint {
            bytes,
            stats,
            elapsed: timer.elapsed(),
        };

        log::debug!(
            "{}: {} over {} nodes ({} skipped)",
            root_type,
            footprint,
            stats.nodes,
            stats.skipped
        );

        if self.verbose {
            log_event(WalkEvent::WalkEnd {
                root_type: root_type.to_string(),
                bytes,
                nodes: stats.nodes,
                duration_us: footprint.elapsed.as_micros() as u64,
            });
        }

        Ok(footprint)
    }
}

impl Default for MemoryCounter {
    /// Compact layout with canonical values skipped
    fn default() -> Self {
        Self::with_parts(SizeModel::default(), SkipRuleSet::from_config(&EstimatorConfig::default()))
    }
}

impl std::fmt::Debug for MemoryCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCounter")
            .field("sizes", &self.sizes)
            .field("rules", &self.rules)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

/// State of one walk
struct Walk<'a, 'g> {
    sizes: &'a SizeModel,
    rules: &'a SkipRuleSet,
    verbose: bool,
    visited: &'a mut VisitedSet,
    pending: WorkList<'g>,
    /// Borrows backing references into `RefCell` contents; released when
    /// the walk is dropped
    guards: Vec<BorrowGuard<'g>>,
    stats: WalkStats,
}

impl<'a, 'g> Walk<'a, 'g> {
    fn run(mut self, root: &'g dyn Reflect) -> (u64, WalkStats) {
        let mut total: u64 = 0;
        self.pending.push(root);

        while let Some(node) = self.pending.pop() {
            total = total.saturating_add(self.measure(node) as u64);
        }

        self.stats.max_pending = self.pending.high_water();
        (total, self.stats)
    }

    /// Charge one node; 0 if already visited or skipped
    fn measure(&mut self, node: &'g dyn Reflect) -> usize {
        let identity = node.identity();
        if self.visited.contains(identity) {
            self.stats.revisits += 1;
            return 0;
        }

        if let Some(rule) = self.rules.matching(node, identity) {
            self.visited.insert(identity);
            self.skipped(identity, rule);
            return 0;
        }

        self.visited.insert(identity);
        self.stats.nodes += 1;

        let subtotal = match node.shape() {
            Shape::Record(fields) => {
                self.stats.records += 1;
                self.sizes
                    .object_header_width()
                    .saturating_add(self.charge_fields(identity.type_name(), fields))
            },
            Shape::Array(elements) => {
                self.stats.arrays += 1;
                self.sizes
                    .array_header_width()
                    .saturating_add(self.charge_elements(identity.type_name(), elements))
            },
        };

        let bytes = self.sizes.align(subtotal);
        log::trace!("{} = {} bytes", identity, bytes);
        bytes
    }

    /// Sum the instance fields of a record, flattening embedded values
    fn charge_fields(&mut self, owner: &'static str, fields: Vec<Field<'g>>) -> usize {
        let mut bytes: usize = 0;
        let mut frames = vec![fields.into_iter()];

        while let Some(frame) = frames.last_mut() {
            let Some(field) = frame.next() else {
                frames.pop();
                continue;
            };

            if field.storage == Storage::Static {
                continue;
            }

            let charged = match field.slot {
                Slot::Scalar(kind) => self.scalar(kind),
                Slot::Ref(target) => {
                    if let Some(target) = target {
                        self.follow(target);
                    }
                    self.sizes.pointer_width()
                },
                Slot::Weak => self.sizes.pointer_width(),
                Slot::Inaccessible => {
                    self.inaccessible(owner, field.name);
                    0
                },
                Slot::Borrowed(borrowed) => {
                    let (slot, guard) = borrowed.into_parts();
                    self.guards.push(guard);
                    frames.push(vec![Field::instance(field.name, slot)].into_iter());
                    0
                },
                Slot::Embedded(_) if frames.len() >= MAX_EMBED_DEPTH => {
                    log::warn!(
                        "{}.{}: embedding deeper than {} levels, charged 0 bytes",
                        owner,
                        field.name,
                        MAX_EMBED_DEPTH
                    );
                    self.inaccessible(owner, field.name);
                    0
                },
                Slot::Embedded(inner) => {
                    let identity = inner.identity();
                    if let Some(rule) = self.rules.matching(inner, identity) {
                        self.skipped(identity, rule);
                        continue;
                    }

                    match inner.shape() {
                        Shape::Record(inner_fields) => {
                            frames.push(inner_fields.into_iter());
                            0
                        },
                        Shape::Array(Elements::Scalars { kind, len }) => {
                            len.saturating_mul(self.scalar(kind))
                        },
                        Shape::Array(Elements::Slots(items)) => {
                            frames.push(element_fields(items).into_iter());
                            0
                        },
                    }
                },
            };

            bytes = bytes.saturating_add(charged);
        }

        bytes
    }

    /// Sum the element slots of an array; the header is charged by the caller
    fn charge_elements(&mut self, owner: &'static str, elements: Elements<'g>) -> usize {
        match elements {
            Elements::Scalars { kind, len } => len.saturating_mul(self.scalar(kind)),
            Elements::Slots(items) => self.charge_fields(owner, element_fields(items)),
        }
    }

    #[inline]
    fn scalar(&self, kind: ScalarKind) -> usize {
        self.sizes.scalar_width(kind)
    }

    #[inline]
    fn follow(&mut self, target: &'g dyn Reflect) {
        self.stats.references += 1;
        if !self.visited.contains(target.identity()) {
            self.pending.push(target);
        }
    }

    fn skipped(&mut self, identity: Identity, rule: &'static str) {
        self.stats.skipped += 1;
        log::trace!("skipping {} ({})", identity, rule);
        if self.verbose {
            log_event(WalkEvent::NodeSkipped {
                type_name: identity.type_name().to_string(),
                rule: rule.to_string(),
            });
        }
    }

    fn inaccessible(&mut self, owner: &'static str, field: &'static str) {
        self.stats.inaccessible_fields += 1;
        log::debug!("{}.{} is not accessible, charged 0 bytes", owner, field);
        if self.verbose {
            log_event(WalkEvent::FieldInaccessible {
                owner: owner.to_string(),
                field: field.to_string(),
            });
        }
    }
}

/// Array elements as unnamed instance fields
fn element_fields(items: Vec<Slot<'_>>) -> Vec<Field<'_>> {
    items
        .into_iter()
        .map(|slot| Field::instance("[]", slot))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::Record;
    use std::rc::Rc;

    struct Pair {
        left: u32,
        right: u32,
    }

    crate::reflect_record!(Pair { left, right });

    struct Looping;

    impl Reflect for Looping {
        fn type_name(&self) -> &'static str {
            "tests::Looping"
        }

        fn shape(&self) -> Shape<'_> {
            Record::new().slot("again", Slot::Embedded(self)).build()
        }
    }

    #[test]
    fn test_null_root() {
        let counter = MemoryCounter::default();
        assert_eq!(counter.estimate(None), 0);
        assert_eq!(counter.try_estimate(None).unwrap(), Footprint::zero());
    }

    #[test]
    fn test_scalar_record() {
        let counter = MemoryCounter::default();
        // align(8 + 4 + 4)
        assert_eq!(counter.estimate_of(&Pair { left: 1, right: 2 }), 16);
    }

    #[test]
    fn test_shared_reference_counted_once() {
        let counter = MemoryCounter::default();
        let shared = Rc::new(Pair { left: 0, right: 0 });
        let list = vec![Some(shared.clone()), Some(shared.clone()), None];

        let footprint = counter.try_estimate(Some(&list)).unwrap();
        // array align(16 + 3 * 4) = 32, pair 16
        assert_eq!(footprint.bytes, 48);
        assert_eq!(footprint.stats.nodes, 2);
        assert_eq!(footprint.stats.references, 2);
    }

    #[test]
    fn test_self_embedding_terminates() {
        let counter = MemoryCounter::default();
        let footprint = counter.try_estimate(Some(&Looping)).unwrap();
        assert_eq!(footprint.bytes, 8);
        assert_eq!(footprint.stats.inaccessible_fields, 1);
    }

    #[test]
    fn test_visited_set_empty_after_walk() {
        let counter = MemoryCounter::default();
        counter.estimate_of(&Pair { left: 1, right: 2 });
        assert!(counter.state.lock().borrow().is_empty());
    }

    #[test]
    fn test_reentrant_call_rejected() {
        let counter = MemoryCounter::default();
        let guard = counter.state.lock();
        let _held = guard.borrow_mut();
        let pair = Pair { left: 1, right: 2 };
        assert!(matches!(
            counter.try_estimate(Some(&pair)),
            Err(MemsizeError::Reentrant)
        ));
        assert_eq!(counter.try_estimate(None).unwrap().bytes, 0);
        assert_eq!(counter.estimate_of(&pair), 0);
    }

    #[test]
    fn test_cell_borrows_released_after_walk() {
        let counter = MemoryCounter::default();
        let cell = std::cell::RefCell::new(Pair { left: 1, right: 2 });

        // align(8 + 4 + 4 + 4)
        assert_eq!(counter.estimate_of(&cell), 24);
        assert!(cell.try_borrow_mut().is_ok());
    }

    #[test]
    fn test_records_in_array_charged_in_place() {
        let counter = MemoryCounter::default();
        let pairs = vec![Pair { left: 0, right: 0 }, Pair { left: 1, right: 1 }];

        let footprint = counter.try_estimate(Some(&pairs)).unwrap();
        // align(16 + 2 * 8)
        assert_eq!(footprint.bytes, 32);
        assert_eq!(footprint.stats.nodes, 1);
    }
}
