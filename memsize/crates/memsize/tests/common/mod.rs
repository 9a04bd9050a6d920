//! Test Utilities for the memsize Integration Suite
//!
//! Sample object graphs with hand-computed footprints. Every expected value
//! in the suite is derived from the compact model:
//!
//! ```text
//! pointer 4, object header 8, array header 16, alignment 8
//! bool/byte 1, short/char 2, int/float 4, long/double 8, word = pointer
//! ```
//!
//! Assertions are exact. An estimator that is "close" is wrong.

#![allow(dead_code)]

use memsize::{EstimatorConfig, Footprint, MemoryCounter, Reflect};
use memsize_util::Atom;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

pub const POINTER: u64 = 4;
/// Pointer-sized scalar, e.g. a `RefCell` borrow flag
pub const WORD: u64 = POINTER;
pub const OBJECT_HEADER: u64 = 8;
pub const ARRAY_HEADER: u64 = 16;
pub const ALIGNMENT: u64 = 8;

/// Round up to the compact alignment
pub fn align(bytes: u64) -> u64 {
    bytes.div_ceil(ALIGNMENT) * ALIGNMENT
}

/// Expected footprint of a `String` node of `len` bytes
pub fn string_bytes(len: usize) -> u64 {
    align(ARRAY_HEADER + len as u64)
}

/// ============================================================================
/// COUNTER FIXTURE
/// ============================================================================

/// Counter plus the configuration it was built from
pub struct CounterFixture {
    pub counter: MemoryCounter,
    pub config: EstimatorConfig,
}

impl CounterFixture {
    /// Compact layout, canonical values skipped
    ///
    /// **Bug this finds:** Default configuration that fails its own validation
    pub fn compact() -> Self {
        Self::with_config(EstimatorConfig::compact())
    }

    /// Compact layout with extra settings applied
    pub fn with_config(config: EstimatorConfig) -> Self {
        let counter = MemoryCounter::new(&config)
            .expect("counter should build from a valid configuration");
        Self { counter, config }
    }

    /// Estimate a root, failing the test on error
    pub fn footprint(&self, root: &dyn Reflect) -> Footprint {
        self.counter
            .try_estimate(Some(root))
            .expect("estimate should not fail for a well-formed graph")
    }

    pub fn bytes(&self, root: &dyn Reflect) -> u64 {
        self.footprint(root).bytes
    }
}

/// ============================================================================
/// SAMPLE GRAPHS
/// ============================================================================

/// Two ints: align(8 + 4 + 4) = 16
#[derive(Debug, Clone, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

memsize::reflect_record!(Point { x, y });

/// One field of every scalar width: 1+1+2+2+4+4+8+8 = 30, align(8 + 30) = 40
#[derive(Debug, Default)]
pub struct AllScalars {
    pub flag: bool,
    pub tiny: i8,
    pub small: i16,
    pub letter: char,
    pub int: i32,
    pub ratio: f32,
    pub big: i64,
    pub precise: f64,
}

memsize::reflect_record!(AllScalars {
    flag,
    tiny,
    small,
    letter,
    int,
    ratio,
    big,
    precise,
});

/// Two reference fields that may share a target
pub struct Segment {
    pub start: Rc<Point>,
    pub end: Rc<Point>,
}

memsize::reflect_record!(Segment { start, end });

/// Node of a possibly cyclic list
#[derive(Default)]
pub struct ListNode {
    pub value: i32,
    pub next: Option<Rc<RefCell<ListNode>>>,
}

memsize::reflect_record!(ListNode { value, next });

/// Base record embedded by value
#[derive(Debug, Default)]
pub struct Component {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

memsize::reflect_record!(Component { x, y, width, height });

/// Extends `Component`: 16 + 1 + 4 = 21, align(8 + 21) = 32, plus the label
#[derive(Debug, Default)]
pub struct Button {
    pub base: Component,
    pub pressed: bool,
    pub label: String,
}

memsize::reflect_record!(Button {
    base,
    pressed,
    label,
});

/// Record whose references point at interned atoms
pub struct StyleKeys {
    pub primary: &'static Atom,
    pub fallback: &'static Atom,
}

memsize::reflect_record!(StyleKeys { primary, fallback });

/// Back reference that must not be followed
pub struct Child {
    pub id: u32,
    pub parent: Weak<Point>,
}

memsize::reflect_record!(Child { id, parent });

pub mod toolkit {
    /// Prefix shared by every type in this module
    pub const PREFIX: &str = module_path!();

    /// Large shared resource bundle
    #[derive(Default)]
    pub struct Resources {
        pub entries: Vec<String>,
    }

    memsize::reflect_record!(Resources { entries });

    impl Resources {
        pub fn with_entries(count: usize) -> Self {
            Self {
                entries: (0..count).map(|i| format!("resource-{}", i)).collect(),
            }
        }
    }

    #[derive(Default)]
    pub struct UiBuilder {
        pub depth: u32,
        pub scratch: Vec<u64>,
    }

    memsize::reflect_record!(UiBuilder { depth, scratch });
}

/// Root that holds opaque toolkit objects
pub struct Form {
    pub title: String,
    pub resources: Box<toolkit::Resources>,
    pub builder: Option<Box<toolkit::UiBuilder>>,
}

memsize::reflect_record!(Form {
    title,
    resources,
    builder,
});

impl Form {
    pub fn new(title: &str, resource_count: usize) -> Self {
        Self {
            title: title.to_string(),
            resources: Box::new(toolkit::Resources::with_entries(resource_count)),
            builder: Some(Box::new(toolkit::UiBuilder {
                depth: 3,
                scratch: vec![0; 32],
            })),
        }
    }
}

/// Thread-shareable graph
pub struct Scene {
    pub points: Vec<Arc<Point>>,
    pub name: String,
}

memsize::reflect_record!(Scene { points, name });

impl Scene {
    /// `count` points, every third one shared with its predecessor
    pub fn new(count: usize) -> Self {
        let mut points: Vec<Arc<Point>> = Vec::with_capacity(count);
        for i in 0..count {
            let point = match points.last() {
                Some(previous) if i % 3 == 0 => previous.clone(),
                _ => Arc::new(Point {
                    x: i as i32,
                    y: -(i as i32),
                }),
            };
            points.push(point);
        }
        Self {
            points,
            name: "scene".to_string(),
        }
    }

    pub fn distinct_points(&self) -> usize {
        let mut distinct = 0;
        for (i, point) in self.points.iter().enumerate() {
            if i == 0 || !Arc::ptr_eq(point, &self.points[i - 1]) {
                distinct += 1;
            }
        }
        distinct
    }

    /// Footprint computed by hand
    pub fn expected_bytes(&self) -> u64 {
        let record = align(OBJECT_HEADER + 2 * POINTER);
        let array = align(ARRAY_HEADER + POINTER * self.points.len() as u64);
        let points = self.distinct_points() as u64 * 16;
        record + array + points + string_bytes(self.name.len())
    }
}
