//! Atom table implementation using DashMap for concurrent access.
//!
//! - Lock-free concurrent access via DashMap
//! - Fast hashing with ahash
//! - Hit/miss statistics for profiling
//!
//! Atoms are boxed and leaked so the table can hand out `&'static Atom`.
//! Entries are never removed.

use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use static_assertions::assert_impl_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::LazyLock;

use super::{Atom, InternerStats};

/// Global atom table
pub static ATOM_TABLE: LazyLock<AtomTable> = LazyLock::new(AtomTable::new);

/// Thread-safe table of canonical atoms
pub struct AtomTable {
    map: DashMap<Box<str>, &'static Atom, RandomState>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

assert_impl_all!(AtomTable: Send, Sync);
assert_impl_all!(Atom: Send, Sync);

impl AtomTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            map: DashMap::with_capacity_and_hasher(256, RandomState::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Intern `text`, returning the canonical atom
    ///
    /// Concurrent callers interning the same text all receive the same atom:
    /// the entry API holds the shard lock while the atom is created.
    pub fn intern(&self, text: &str) -> &'static Atom {
        if let Some(existing) = self.map.get(text) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return *existing.value();
        }

        match self.map.entry(Box::from(text)) {
            Entry::Occupied(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                *entry.get()
            },
            Entry::Vacant(entry) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                let atom: &'static Atom = Box::leak(Box::new(Atom {
                    text: Box::from(text),
                }));
                *entry.insert(atom)
            },
        }
    }

    /// Canonical atom for `text`, if interned
    pub fn lookup(&self, text: &str) -> Option<&'static Atom> {
        self.map.get(text).map(|entry| *entry.value())
    }

    /// Number of distinct atoms
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if no atom was interned yet
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Snapshot of the table statistics
    pub fn stats(&self) -> InternerStats {
        InternerStats {
            atoms: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for AtomTable {
    fn default() -> Self {
        Self::new()
    }
}
