//! Per-traversal caches with counted begin/end scoping
//!
//! Nested traversals share one set of maps. Only the outermost `end` clears
//! them, so an inner call never drops an outer call's in-progress cache.

use crate::dom_utils::ComputedStyle;
use crate::types::NodeId;
use ahash::AHashMap;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct TraversalCaches {
    depth: usize,
    pub(crate) style: Option<AHashMap<NodeId, Option<Rc<ComputedStyle>>>>,
    pub(crate) accessible_name: Option<AHashMap<NodeId, String>>,
    pub(crate) is_hidden: Option<AHashMap<NodeId, bool>>,
    pub(crate) pointer_events: Option<AHashMap<NodeId, bool>>,
}

impl TraversalCaches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) {
        self.depth += 1;
        self.style.get_or_insert_with(AHashMap::new);
        self.accessible_name.get_or_insert_with(AHashMap::new);
        self.is_hidden.get_or_insert_with(AHashMap::new);
        self.pointer_events.get_or_insert_with(AHashMap::new);
    }

    pub fn end(&mut self) {
        debug_assert!(self.depth > 0, "unbalanced TraversalCaches::end");
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.style = None;
            self.accessible_name = None;
            self.is_hidden = None;
            self.pointer_events = None;
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_active(&self) -> bool {
        self.depth > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_scopes_keep_outer_cache() {
        let mut caches = TraversalCaches::new();
        assert!(!caches.is_active());

        caches.begin();
        caches.accessible_name.as_mut().unwrap().insert(7, "Save".into());

        caches.begin();
        assert_eq!(caches.depth(), 2);
        caches.end();

        // inner end leaves the outer traversal's entries alone
        assert_eq!(
            caches.accessible_name.as_ref().unwrap().get(&7).map(String::as_str),
            Some("Save")
        );

        caches.end();
        assert!(caches.accessible_name.is_none());
        assert!(caches.style.is_none());
    }
}
