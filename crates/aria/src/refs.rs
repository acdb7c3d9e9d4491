//! Ref registry and the last-ref memo
//!
//! The registry maps every ref handed out by the latest snapshot to its
//! element and is replaced wholesale by each snapshot. The memo remembers, per
//! element identity, the (role, name) a ref was minted for so an unchanged
//! element keeps its ref across snapshots. Both key on `backend_node_id`, which
//! survives re-ingestion of the same page, and neither keeps nodes alive.

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::{BackendNodeId, NodeId};
use ahash::AHashMap;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
struct MemoEntry {
    role: &'static str,
    name: String,
    aria_ref: String,
}

/// Last ref assigned to each element, with the role and name it was minted for
#[derive(Debug, Default)]
pub struct RefMemo {
    entries: AHashMap<BackendNodeId, MemoEntry>,
}

impl RefMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ref previously minted for this element, if its role and name still match
    pub fn lookup(&self, backend_id: BackendNodeId, role: &str, name: &str) -> Option<&str> {
        self.entries
            .get(&backend_id)
            .filter(|entry| entry.role == role && entry.name == name)
            .map(|entry| entry.aria_ref.as_str())
    }

    pub fn remember(
        &mut self,
        backend_id: BackendNodeId,
        role: &'static str,
        name: String,
        aria_ref: String,
    ) {
        self.entries.insert(
            backend_id,
            MemoEntry {
                role,
                name,
                aria_ref,
            },
        );
    }

    /// Forget identities that no longer exist in `dom`
    pub fn retain_live(&mut self, dom: &DomArena) {
        self.entries
            .retain(|backend_id, _| dom.get_node_id_by_backend(*backend_id).is_some());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One selectable ref from the latest snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefEntry {
    #[serde(rename = "ref")]
    pub ref_id: String,
    pub node_id: NodeId,
    pub backend_node_id: BackendNodeId,
}

/// Ref → element mapping of the latest snapshot
#[derive(Debug, Default)]
pub struct RefRegistry {
    /// `None` until the first snapshot
    entries: Option<Vec<RefEntry>>,
    index: AHashMap<String, usize>,
}

impl RefRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole mapping with the refs of a new snapshot
    pub fn replace(&mut self, dom: &DomArena, elements: &[(String, NodeId)]) {
        let mut entries = Vec::with_capacity(elements.len());
        self.index.clear();
        for (ref_id, node_id) in elements {
            let Some(node) = dom.node(*node_id) else {
                continue;
            };
            self.index.insert(ref_id.clone(), entries.len());
            entries.push(RefEntry {
                ref_id: ref_id.clone(),
                node_id: *node_id,
                backend_node_id: node.backend_node_id,
            });
        }
        debug!("Ref registry replaced with {} refs", entries.len());
        self.entries = Some(entries);
    }

    /// Element bound to `ref_id` in `dom`
    ///
    /// The binding goes through the backend id, so a document re-ingested
    /// since the snapshot still resolves as long as the element is connected.
    pub fn resolve(&self, dom: &DomArena, ref_id: &str) -> Result<NodeId> {
        let Some(entries) = &self.entries else {
            return Err(DomError::NoSnapshot {
                ref_id: ref_id.to_string(),
            });
        };
        let Some(&position) = self.index.get(ref_id) else {
            return Err(DomError::RefNotFound {
                ref_id: ref_id.to_string(),
                available: self.available(),
            });
        };
        let entry = &entries[position];
        dom.get_node_id_by_backend(entry.backend_node_id)
            .filter(|node_id| dom.is_connected(*node_id))
            .ok_or_else(|| DomError::StaleRef {
                ref_id: ref_id.to_string(),
            })
    }

    /// Refs of the latest snapshot, comma separated, in snapshot order
    pub fn available(&self) -> String {
        self.entries()
            .iter()
            .map(|entry| entry.ref_id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn entries(&self) -> &[RefEntry] {
        self.entries.as_deref().unwrap_or(&[])
    }

    pub fn has_snapshot(&self) -> bool {
        self.entries.is_some()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestDoc;
    use crate::types::{DomNode, NodeType};

    #[test]
    fn test_resolve_before_any_snapshot() {
        let doc = TestDoc::new();
        let registry = RefRegistry::new();
        let err = registry.resolve(&doc.dom, "e1").unwrap_err();
        assert!(matches!(err, DomError::NoSnapshot { ref ref_id } if ref_id == "e1"));
        assert!(!registry.has_snapshot());
    }

    #[test]
    fn test_unknown_ref_lists_available() {
        let mut doc = TestDoc::new();
        let a = doc.el(doc.body, "button", &[]);
        let b = doc.el(doc.body, "a", &[("href", "/")]);
        let mut registry = RefRegistry::new();
        registry.replace(&doc.dom, &[("e1".into(), a), ("e2".into(), b)]);

        assert_eq!(registry.resolve(&doc.dom, "e2").unwrap(), b);
        let err = registry.resolve(&doc.dom, "e9").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Ref \"e9\" not found. Available refs: e1, e2"
        );
    }

    #[test]
    fn test_replace_drops_previous_refs() {
        let mut doc = TestDoc::new();
        let a = doc.el(doc.body, "button", &[]);
        let mut registry = RefRegistry::new();
        registry.replace(&doc.dom, &[("e1".into(), a)]);
        registry.replace(&doc.dom, &[]);

        assert!(registry.is_empty());
        assert!(matches!(
            registry.resolve(&doc.dom, "e1"),
            Err(DomError::RefNotFound { ref available, .. }) if available.is_empty()
        ));
    }

    #[test]
    fn test_detached_element_is_stale() {
        let mut doc = TestDoc::new();
        let button = doc.el(doc.body, "button", &[]);
        let mut registry = RefRegistry::new();
        registry.replace(&doc.dom, &[("e1".into(), button)]);

        doc.dom.remove_child(doc.body, button).unwrap();
        assert!(matches!(
            registry.resolve(&doc.dom, "e1"),
            Err(DomError::StaleRef { .. })
        ));
    }

    #[test]
    fn test_rebinds_through_backend_id() {
        let mut first = TestDoc::new();
        let button = first.el(first.body, "button", &[]);
        let mut registry = RefRegistry::new();
        registry.replace(&first.dom, &[("e1".into(), button)]);

        // same page ingested again, with an extra node shifting arena indices
        let mut second = DomArena::new();
        second.add_node(DomNode::new(900, NodeType::Comment, "#comment"));
        for node in first.dom.iter() {
            let mut node = node.clone();
            node.parent_id = node.parent_id.map(|id| id + 1);
            node.children_ids = node.children_ids.iter().map(|id| id + 1).collect();
            second.add_node(node);
        }
        let rebound = registry.resolve(&second, "e1").unwrap();
        assert_eq!(rebound, button + 1);
    }

    #[test]
    fn test_memo_matches_role_and_name() {
        let mut doc = TestDoc::new();
        let button = doc.el(doc.body, "button", &[]);
        let backend_id = doc.dom.node(button).unwrap().backend_node_id;

        let mut memo = RefMemo::new();
        memo.remember(backend_id, "button", "Save".into(), "e4".into());
        assert_eq!(memo.lookup(backend_id, "button", "Save"), Some("e4"));
        assert_eq!(memo.lookup(backend_id, "button", "Saved"), None);
        assert_eq!(memo.lookup(backend_id, "link", "Save"), None);

        memo.remember(9999, "link", "Gone".into(), "e5".into());
        memo.retain_live(&doc.dom);
        assert_eq!(memo.len(), 1);
    }
}
