//! Pending nodes of one walk.
//!
//! An explicit LIFO stack replaces recursion, so graph depth (a linked list
//! of a million nodes, say) never touches the call stack.

use crate::reflect::Reflect;

/// Nodes discovered but not yet measured
pub struct WorkList<'g> {
    data: Vec<&'g dyn Reflect>,
    high_water: usize,
}

impl<'g> WorkList<'g> {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            high_water: 0,
        }
    }

    /// Push a node; duplicates are allowed and filtered when popped
    #[inline]
    pub fn push(&mut self, node: &'g dyn Reflect) {
        self.data.push(node);
        self.high_water = self.high_water.max(self.data.len());
    }

    #[inline]
    pub fn pop(&mut self) -> Option<&'g dyn Reflect> {
        self.data.pop()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Largest number of pending nodes seen
    pub fn high_water(&self) -> usize {
        self.high_water
    }
}

impl Default for WorkList<'_> {
    fn default() -> Self {
        Self::new()
    }
}
