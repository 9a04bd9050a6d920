//! Identity set of nodes already charged or skipped.

use crate::reflect::Identity;
use rustc_hash::FxHashSet;

/// Nodes seen during the current walk
///
/// Lives inside the counter so its allocation is reused across walks; it is
/// cleared before and after every walk.
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: FxHashSet<Identity>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `identity`; returns false if it was already present
    #[inline]
    pub fn insert(&mut self, identity: Identity) -> bool {
        self.seen.insert(identity)
    }

    #[inline]
    pub fn contains(&self, identity: Identity) -> bool {
        self.seen.contains(&identity)
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_clear() {
        let mut visited = VisitedSet::new();
        let id = Identity::from_parts(0x1000, "demo::Node");

        assert!(visited.insert(id));
        assert!(!visited.insert(id));
        assert!(visited.contains(id));
        assert!(!visited.contains(Identity::from_parts(0x1000, "demo::Other")));

        visited.clear();
        assert!(visited.is_empty());
    }
}
