//! Symbol module - canonical interned strings.
//!
//! An [`Atom`] is the single shared copy of a piece of text. Style keys,
//! property names and theme constants are interned once and then referenced
//! from many places, so the memory they occupy belongs to the table and not
//! to any one object graph that happens to point at them.
//!
//! # Examples
//!
//! ```
//! use memsize_util::symbol::Atom;
//!
//! let key = Atom::intern("Form.bgImage");
//! assert_eq!(key.as_str(), "Form.bgImage");
//! assert!(key.is_canonical());
//! assert!(std::ptr::eq(key, Atom::lookup("Form.bgImage").unwrap()));
//! ```

pub mod interner;

pub use interner::{AtomTable, ATOM_TABLE};

use std::fmt;
use std::hash::{Hash, Hasher};

/// Canonical interned string
///
/// Only [`AtomTable`] creates atoms and it never frees them, so every atom
/// lives for the rest of the program and equality is pointer equality.
pub struct Atom {
    text: Box<str>,
}

impl Atom {
    /// Intern `text` in the global table
    pub fn intern(text: &str) -> &'static Atom {
        ATOM_TABLE.intern(text)
    }

    /// Find the canonical atom for `text` without interning it
    pub fn lookup(text: &str) -> Option<&'static Atom> {
        ATOM_TABLE.lookup(text)
    }

    /// The interned text
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length of the text in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if the text is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Check whether this atom is the one the global table hands out for
    /// its text.
    pub fn is_canonical(&self) -> bool {
        Self::lookup(self.as_str()).is_some_and(|canonical| std::ptr::eq(canonical, self))
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for Atom {}

impl Hash for Atom {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self as *const Atom as usize).hash(state);
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({:?})", self.as_str())
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interner statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InternerStats {
    /// Distinct atoms in the table
    pub atoms: usize,
    /// Interning calls that found an existing atom
    pub hits: usize,
    /// Interning calls that created a new atom
    pub misses: usize,
}

impl InternerStats {
    /// Fraction of interning calls served from the table
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
