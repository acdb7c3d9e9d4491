//! Arena-based host document
//!
//! Every element handle the engine works with is a `NodeId` into this arena.
//! The engine only reads the arena; hosts build it from CDP responses
//! (see `service`) or through the construction API below.
//!
//! ## Memory Layout
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Node0][Node1][Node2]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```
//!
//! Shadow roots are `DocumentFragment` nodes whose `parent_id` is their host
//! but which never appear in the host's `children_ids`. Pseudo elements hang
//! off `pseudo_element_ids` the same way.

use crate::error::{DomError, Result};
use crate::types::{BackendNodeId, DomNode, DomRect, FormState, NodeId, NodeType, PseudoType};
use ahash::AHashMap;
use smallvec::SmallVec;

/// Arena allocator for DOM nodes
///
/// Design:
/// - Single Vec<DomNode> for sequential allocation
/// - HashMap for backend_node_id → NodeId lookup (CDP uses backend IDs)
/// - No Rc/Arc: use indices everywhere
#[derive(Debug)]
pub struct DomArena {
    /// All nodes stored sequentially (cache-friendly)
    nodes: Vec<DomNode>,

    /// Backend node ID → NodeId lookup (for CDP integration)
    backend_id_map: AHashMap<BackendNodeId, NodeId>,

    /// Root node ID (if set)
    root_id: Option<NodeId>,

    /// Focused element of the document
    active_element: Option<NodeId>,

    next_backend_id: BackendNodeId,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self::with_capacity(1024) // Pre-allocate for typical page
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            backend_id_map: AHashMap::with_capacity(capacity),
            root_id: None,
            active_element: None,
            next_backend_id: 1,
        }
    }

    /// Add a node to the arena, returns its ID
    pub fn add_node(&mut self, mut node: DomNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        node.node_id = node_id;
        self.backend_id_map.insert(node.backend_node_id, node_id);
        self.next_backend_id = self.next_backend_id.max(node.backend_node_id.saturating_add(1));
        self.nodes.push(node);
        node_id
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Infallible lookup for traversal code that must never abort
    pub fn node(&self, node_id: NodeId) -> Option<&DomNode> {
        self.nodes.get(node_id as usize)
    }

    /// Get node by backend node ID (from CDP)
    pub fn get_by_backend_id(&self, backend_id: BackendNodeId) -> Result<&DomNode> {
        let node_id = self
            .backend_id_map
            .get(&backend_id)
            .ok_or(DomError::NodeNotFound(backend_id))?;
        self.get(*node_id)
    }

    /// Get node ID by backend node ID
    pub fn get_node_id_by_backend(&self, backend_id: BackendNodeId) -> Option<NodeId> {
        self.backend_id_map.get(&backend_id).copied()
    }

    /// Set root node
    pub fn set_root(&mut self, node_id: NodeId) -> Result<()> {
        // Verify node exists
        self.get(node_id)?;
        self.root_id = Some(node_id);
        Ok(())
    }

    /// Get root node ID
    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }

    pub fn set_active_element(&mut self, node_id: Option<NodeId>) -> Result<()> {
        if let Some(id) = node_id {
            self.get(id)?;
        }
        self.active_element = node_id;
        Ok(())
    }

    /// Total number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterator over all nodes
    pub fn iter(&self) -> impl Iterator<Item = &DomNode> {
        self.nodes.iter()
    }

    /// Traverse the light-DOM subtree depth-first (iterative, no recursion)
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// First light-DOM descendant of `root` (tree order, root excluded)
    /// matching the predicate. Does not enter shadow roots.
    pub fn find_descendant<F>(&self, root: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        let mut stack: Vec<NodeId> = match self.node(root) {
            Some(node) => node.children_ids.iter().rev().copied().collect(),
            None => return None,
        };
        while let Some(node_id) = stack.pop() {
            let node = self.node(node_id)?;
            if predicate(node) {
                return Some(node_id);
            }
            stack.extend(node.children_ids.iter().rev().copied());
        }
        None
    }

    /// Clear arena (reuse allocation)
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.backend_id_map.clear();
        self.root_id = None;
        self.active_element = None;
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}

// Construction API

impl DomArena {
    fn allocate(&mut self, node_type: NodeType, node_name: &str) -> NodeId {
        let backend_id = self.next_backend_id;
        self.add_node(DomNode::new(backend_id, node_type, node_name))
    }

    /// Create a document node; the first one becomes the root
    pub fn create_document(&mut self) -> NodeId {
        let id = self.allocate(NodeType::Document, "#document");
        if self.root_id.is_none() {
            self.root_id = Some(id);
        }
        id
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.allocate(NodeType::Element, tag)
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        let id = self.allocate(NodeType::Text, "#text");
        self.nodes[id as usize].node_value = text.to_string();
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.get(child)?;
        self.get_mut(parent)?.children_ids.push(child);
        self.get_mut(child)?.parent_id = Some(parent);
        Ok(())
    }

    /// Detach a node from its light-DOM parent
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let node = self.get_mut(parent)?;
        let before = node.children_ids.len();
        node.children_ids.retain(|id| *id != child);
        if node.children_ids.len() == before {
            return Err(DomError::NodeNotFound(child));
        }
        self.get_mut(child)?.parent_id = None;
        Ok(())
    }

    /// Attach an open shadow root to `host`, returns the root fragment
    pub fn attach_shadow(&mut self, host: NodeId) -> Result<NodeId> {
        self.get(host)?;
        let root = self.allocate(NodeType::DocumentFragment, "#document-fragment");
        self.nodes[root as usize].parent_id = Some(host);
        self.get_mut(host)?
            .shadow_root_ids
            .get_or_insert_with(SmallVec::new)
            .push(root);
        Ok(root)
    }

    /// Assign a light-DOM node to a `<slot>`
    pub fn assign_slot(&mut self, node: NodeId, slot: NodeId) -> Result<()> {
        self.get(node)?;
        self.get_mut(slot)?
            .assigned_nodes
            .get_or_insert_with(SmallVec::new)
            .push(node);
        self.get_mut(node)?.assigned_slot = Some(slot);
        Ok(())
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.get_mut(node)?
            .attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<()> {
        self.get_mut(node)?.node_value = text.to_string();
        Ok(())
    }

    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<()> {
        self.get_mut(node)?
            .snapshot_node
            .get_or_insert_with(Default::default)
            .computed_styles
            .get_or_insert_with(Default::default)
            .insert(property.to_string(), value.to_string());
        Ok(())
    }

    pub fn set_bounds(&mut self, node: NodeId, rect: DomRect) -> Result<()> {
        self.get_mut(node)?
            .snapshot_node
            .get_or_insert_with(Default::default)
            .bounds = Some(rect);
        Ok(())
    }

    /// Set a style value on the `::before` / `::after` pseudo element of `node`,
    /// creating the pseudo element on first use
    pub fn set_pseudo_style(
        &mut self,
        node: NodeId,
        pseudo: PseudoType,
        property: &str,
        value: &str,
    ) -> Result<()> {
        let pseudo_id = match self.pseudo_element(node, pseudo) {
            Some(id) => id,
            None => {
                self.get(node)?;
                let id = self.allocate(NodeType::Element, pseudo.node_name());
                let pseudo_node = &mut self.nodes[id as usize];
                pseudo_node.pseudo_type = Some(pseudo);
                pseudo_node.parent_id = Some(node);
                self.get_mut(node)?
                    .pseudo_element_ids
                    .get_or_insert_with(SmallVec::new)
                    .push(id);
                id
            }
        };
        self.set_style(pseudo_id, property, value)
    }

    pub fn form_state_mut(&mut self, node: NodeId) -> Result<&mut FormState> {
        let state = self.get_mut(node)?.form_state.get_or_insert_with(Default::default);
        Ok(&mut **state)
    }
}

// Structural navigation

impl DomArena {
    /// Upper-cased tag name, empty for non-elements
    pub fn tag(&self, node: NodeId) -> &str {
        self.node(node)
            .and_then(|n| n.tag_name())
            .unwrap_or("")
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node).and_then(|n| n.attr(name))
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.node(node).is_some_and(|n| n.has_attr(name))
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(|n| n.is_element())
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node)
            .map(|n| n.children_ids.as_slice())
            .unwrap_or(&[])
    }

    /// First attached shadow root
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.node(host)?.shadow_root_ids.as_ref()?.first().copied()
    }

    pub fn is_shadow_root(&self, node: NodeId) -> bool {
        self.shadow_host(node).is_some()
    }

    /// Host of a shadow root fragment
    pub fn shadow_host(&self, root: NodeId) -> Option<NodeId> {
        let node = self.node(root)?;
        if node.node_type != NodeType::DocumentFragment {
            return None;
        }
        let host = node.parent_id?;
        let attached = self
            .node(host)?
            .shadow_root_ids
            .as_ref()
            .is_some_and(|roots| roots.contains(&root));
        attached.then_some(host)
    }

    pub fn pseudo_element(&self, node: NodeId, pseudo: PseudoType) -> Option<NodeId> {
        self.node(node)?
            .pseudo_element_ids
            .as_ref()?
            .iter()
            .copied()
            .find(|id| self.node(*id).and_then(|n| n.pseudo_type) == Some(pseudo))
    }

    /// Nodes assigned to a `<slot>`, empty for anything else
    pub fn assigned_nodes(&self, slot: NodeId) -> &[NodeId] {
        self.node(slot)
            .and_then(|n| n.assigned_nodes.as_ref())
            .map(|nodes| nodes.as_slice())
            .unwrap_or(&[])
    }

    pub fn assigned_slot(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.assigned_slot
    }

    /// DOM `parentNode`: shadow roots, documents and pseudo elements have none
    pub fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        let n = self.node(node)?;
        match n.node_type {
            NodeType::Document | NodeType::DocumentFragment => None,
            _ if n.pseudo_type.is_some() => None,
            _ => n.parent_id,
        }
    }

    /// DOM `parentElement`
    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent_node(node).filter(|p| self.is_element(*p))
    }

    /// Light-DOM parent element, or the host when `node` sits directly in a
    /// shadow root
    pub fn parent_element_or_shadow_host(&self, node: NodeId) -> Option<NodeId> {
        if let Some(parent) = self.parent_element(node) {
            return Some(parent);
        }
        let parent = self.parent_node(node)?;
        self.shadow_host(parent)
    }

    /// The shadow root or document at the top of `node`'s tree
    pub fn enclosing_shadow_root_or_document(&self, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        while let Some(parent) = self.parent_node(current) {
            current = parent;
        }
        match self.node(current)?.node_type {
            NodeType::DocumentFragment | NodeType::Document => Some(current),
            _ => None,
        }
    }

    /// Walk to the top light-DOM ancestor, then hop to its shadow host
    pub fn enclosing_shadow_host(&self, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        while let Some(parent) = self.parent_element(current) {
            current = parent;
        }
        self.parent_element_or_shadow_host(current)
    }

    /// Document owning `node`, crossing shadow boundaries
    pub fn owner_document(&self, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        loop {
            if let Some(parent) = self.parent_node(current) {
                current = parent;
                continue;
            }
            let n = self.node(current)?;
            if n.node_type == NodeType::Document {
                return Some(current);
            }
            if n.pseudo_type.is_some() {
                current = n.parent_id?;
                continue;
            }
            current = self.shadow_host(current)?;
        }
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.owner_document(node).is_some()
    }

    /// Inclusive light-DOM containment (`Node.contains`)
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent_node(id);
        }
        false
    }

    /// `Element.closest` with a predicate: inclusive, light DOM only
    pub fn closest<F>(&self, node: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&DomArena, NodeId) -> bool,
    {
        let mut current = Some(node).filter(|id| self.is_element(*id));
        while let Some(id) = current {
            if predicate(self, id) {
                return Some(id);
            }
            current = self.parent_element(id);
        }
        None
    }

    /// `closest` that continues through enclosing shadow hosts. A match that
    /// is not `scope` but contains it counts as no match.
    pub fn closest_cross_shadow<F>(
        &self,
        node: NodeId,
        predicate: F,
        scope: Option<NodeId>,
    ) -> Option<NodeId>
    where
        F: Fn(&DomArena, NodeId) -> bool,
    {
        let mut current = Some(node);
        while let Some(id) = current {
            let closest = self.closest(id, &predicate);
            if let (Some(scope), Some(found)) = (scope, closest) {
                if found != scope && self.contains(found, scope) {
                    return None;
                }
            }
            if closest.is_some() {
                return closest;
            }
            current = self.enclosing_shadow_host(id);
        }
        None
    }

    /// First element with the given id inside `root`, tree order
    pub fn element_by_id_in(&self, root: NodeId, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.find_descendant(root, |n| n.is_element() && n.attr("id") == Some(id))
    }

    /// Resolve a space-separated id reference list within `node`'s own tree
    /// (shadow root or document), dropping unknown ids and duplicates
    pub fn id_refs(&self, node: NodeId, reference: Option<&str>) -> SmallVec<[NodeId; 2]> {
        let mut result = SmallVec::new();
        let Some(reference) = reference else {
            return result;
        };
        let Some(root) = self.enclosing_shadow_root_or_document(node) else {
            return result;
        };
        for id in reference.split(' ').filter(|id| !id.is_empty()) {
            if let Some(found) = self.element_by_id_in(root, id) {
                if !result.contains(&found) {
                    result.push(found);
                }
            }
        }
        result
    }

    /// Light-DOM `textContent`
    pub fn text_content(&self, node: NodeId) -> String {
        let mut text = String::new();
        let _ = self.traverse_df(node, |n| {
            if n.is_text() {
                text.push_str(&n.node_value);
            }
            Ok(())
        });
        text
    }

    /// `document.body` of the root document, falling back to the document
    /// element
    pub fn body(&self) -> Option<NodeId> {
        let root = self.root_id?;
        let html = self
            .children(root)
            .iter()
            .copied()
            .find(|id| self.is_element(*id))?;
        self.children(html)
            .iter()
            .copied()
            .find(|id| self.tag(*id) == "BODY")
            .or(Some(html))
    }
}

// Element properties (the parts of the HTML DOM the role engine reads)

const KNOWN_INPUT_TYPES: &[&str] = &[
    "button",
    "checkbox",
    "color",
    "date",
    "datetime-local",
    "email",
    "file",
    "hidden",
    "image",
    "month",
    "number",
    "password",
    "radio",
    "range",
    "reset",
    "search",
    "submit",
    "tel",
    "text",
    "time",
    "url",
    "week",
];

const LABELABLE_TAGS: &[&str] = &[
    "BUTTON", "INPUT", "METER", "OUTPUT", "PROGRESS", "SELECT", "TEXTAREA",
];

impl DomArena {
    /// `HTMLInputElement.type`: lower-cased, unknown values become "text"
    pub fn input_type(&self, node: NodeId) -> &'static str {
        let raw = self.attr(node, "type").unwrap_or("").to_ascii_lowercase();
        KNOWN_INPUT_TYPES
            .iter()
            .copied()
            .find(|t| *t == raw)
            .unwrap_or("text")
    }

    fn form_state(&self, node: NodeId) -> Option<&FormState> {
        self.node(node)?.form_state.as_deref()
    }

    /// Current value of an input or textarea
    pub fn value(&self, node: NodeId) -> String {
        if let Some(value) = self.form_state(node).and_then(|s| s.value.as_ref()) {
            return value.clone();
        }
        if self.tag(node) == "TEXTAREA" {
            return self.text_content(node);
        }
        if let Some(value) = self.attr(node, "value") {
            return value.to_string();
        }
        if self.tag(node) == "INPUT" {
            match self.input_type(node) {
                "range" => {
                    let bound = |name: &str, default: f64| {
                        self.attr(node, name)
                            .and_then(|v| v.trim().parse::<f64>().ok())
                            .unwrap_or(default)
                    };
                    let (min, max) = (bound("min", 0.0), bound("max", 100.0));
                    let mid = if max < min { min } else { min + (max - min) / 2.0 };
                    return format_number(mid);
                }
                "color" => return "#000000".to_string(),
                _ => {}
            }
        }
        String::new()
    }

    pub fn checked(&self, node: NodeId) -> bool {
        self.form_state(node)
            .and_then(|s| s.checked)
            .unwrap_or_else(|| self.has_attr(node, "checked"))
    }

    pub fn indeterminate(&self, node: NodeId) -> bool {
        self.form_state(node).is_some_and(|s| s.indeterminate)
    }

    pub fn selected(&self, node: NodeId) -> bool {
        self.form_state(node)
            .and_then(|s| s.selected)
            .unwrap_or_else(|| self.has_attr(node, "selected"))
    }

    /// `HTMLDetailsElement.open`
    pub fn open(&self, node: NodeId) -> bool {
        self.has_attr(node, "open")
    }

    /// `HTMLSelectElement.size`, 0 when absent or unparsable
    pub fn select_size(&self, node: NodeId) -> u32 {
        let raw = self.attr(node, "size").unwrap_or("").trim_start();
        let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().unwrap_or(0)
    }

    fn is_labelable(&self, node: NodeId) -> bool {
        let tag = self.tag(node);
        LABELABLE_TAGS.contains(&tag) && !(tag == "INPUT" && self.input_type(node) == "hidden")
    }

    /// `labels` of a labelable element, in tree order
    pub fn labels(&self, node: NodeId) -> SmallVec<[NodeId; 2]> {
        let mut labels = SmallVec::new();
        if !self.is_labelable(node) {
            return labels;
        }
        let Some(root) = self.enclosing_shadow_root_or_document(node) else {
            return labels;
        };
        let own_id = self.attr(node, "id");
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            stack.extend(self.children(id).iter().rev().copied());
            if self.tag(id) != "LABEL" {
                continue;
            }
            let control = match self.attr(id, "for") {
                Some(target) => {
                    if own_id != Some(target) {
                        continue;
                    }
                    self.element_by_id_in(root, target)
                }
                None => self.find_descendant(id, |n| n.is_element() && self.is_labelable(n.node_id)),
            };
            if control == Some(node) {
                labels.push(id);
            }
        }
        labels
    }
}

/// Render a number the way JavaScript's `String(number)` does for the
/// values we produce (integers without a fractional part)
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> (DomArena, NodeId) {
        let mut arena = DomArena::new();
        let doc = arena.create_document();
        let html = arena.create_element("html");
        arena.append_child(doc, html).unwrap();
        let body = arena.create_element("body");
        arena.append_child(html, body).unwrap();
        (arena, body)
    }

    #[test]
    fn test_arena_basic() {
        let mut arena = DomArena::new();

        let id = arena.add_node(DomNode::new(100, NodeType::Element, "div"));
        assert_eq!(id, 0);

        let retrieved = arena.get(id).unwrap();
        assert_eq!(retrieved.node_name, "DIV");
        assert_eq!(retrieved.backend_node_id, 100);
        assert_eq!(arena.get_by_backend_id(100).unwrap().node_id, 0);
    }

    #[test]
    fn test_traverse_df() {
        let (mut arena, body) = document();
        let first = arena.create_element("span");
        let second = arena.create_element("p");
        arena.append_child(body, first).unwrap();
        arena.append_child(body, second).unwrap();

        let mut visited = Vec::new();
        arena
            .traverse_df(body, |node| {
                visited.push(node.node_name.clone());
                Ok(())
            })
            .unwrap();

        assert_eq!(visited, vec!["BODY", "SPAN", "P"]);
        assert_eq!(arena.body(), Some(body));
    }

    #[test]
    fn test_shadow_navigation() {
        let (mut arena, body) = document();
        let host = arena.create_element("div");
        arena.append_child(body, host).unwrap();
        let root = arena.attach_shadow(host).unwrap();
        let inner = arena.create_element("span");
        arena.append_child(root, inner).unwrap();
        let deep = arena.create_element("b");
        arena.append_child(inner, deep).unwrap();

        assert_eq!(arena.parent_element(inner), None);
        assert_eq!(arena.parent_node(root), None);
        assert_eq!(arena.parent_element_or_shadow_host(inner), Some(host));
        assert_eq!(arena.enclosing_shadow_root_or_document(deep), Some(root));
        assert_eq!(arena.enclosing_shadow_host(deep), Some(host));
        assert_eq!(arena.enclosing_shadow_host(host), None);
        assert!(arena.is_connected(deep));
        assert!(!arena.contains(host, deep));
    }

    #[test]
    fn test_closest_cross_shadow_respects_scope() {
        let (mut arena, body) = document();
        let nav = arena.create_element("nav");
        arena.append_child(body, nav).unwrap();
        let host = arena.create_element("div");
        arena.append_child(nav, host).unwrap();
        let root = arena.attach_shadow(host).unwrap();
        let header = arena.create_element("header");
        arena.append_child(root, header).unwrap();

        let is_nav = |dom: &DomArena, id: NodeId| dom.tag(id) == "NAV";
        assert_eq!(arena.closest_cross_shadow(header, is_nav, None), Some(nav));
        // nav contains the scope and is not the scope itself
        assert_eq!(arena.closest_cross_shadow(header, is_nav, Some(host)), None);
        assert_eq!(arena.closest_cross_shadow(header, is_nav, Some(nav)), Some(nav));
    }

    #[test]
    fn test_id_refs_stay_inside_tree() {
        let (mut arena, body) = document();
        let label = arena.create_element("span");
        arena.set_attribute(label, "id", "lbl").unwrap();
        arena.append_child(body, label).unwrap();
        let host = arena.create_element("div");
        arena.append_child(body, host).unwrap();
        let root = arena.attach_shadow(host).unwrap();
        let inner = arena.create_element("button");
        arena.append_child(root, inner).unwrap();

        assert_eq!(arena.id_refs(host, Some("lbl lbl  missing")).as_slice(), &[label]);
        assert!(arena.id_refs(inner, Some("lbl")).is_empty());
        assert!(arena.id_refs(host, None).is_empty());
    }

    #[test]
    fn test_labels() {
        let (mut arena, body) = document();
        let input = arena.create_element("input");
        arena.set_attribute(input, "id", "name").unwrap();
        arena.append_child(body, input).unwrap();
        let by_for = arena.create_element("label");
        arena.set_attribute(by_for, "for", "name").unwrap();
        arena.append_child(body, by_for).unwrap();

        let wrapping = arena.create_element("label");
        arena.append_child(body, wrapping).unwrap();
        let nested = arena.create_element("textarea");
        arena.append_child(wrapping, nested).unwrap();

        assert_eq!(arena.labels(input).as_slice(), &[by_for]);
        assert_eq!(arena.labels(nested).as_slice(), &[wrapping]);
        assert!(arena.labels(body).is_empty());
    }

    #[test]
    fn test_element_properties() {
        let (mut arena, body) = document();
        let range = arena.create_element("input");
        arena.set_attribute(range, "type", "RANGE").unwrap();
        arena.append_child(body, range).unwrap();
        assert_eq!(arena.input_type(range), "range");
        assert_eq!(arena.value(range), "50");

        let odd = arena.create_element("input");
        arena.set_attribute(odd, "type", "bogus").unwrap();
        assert_eq!(arena.input_type(odd), "text");

        let area = arena.create_element("textarea");
        let text = arena.create_text("draft");
        arena.append_child(area, text).unwrap();
        assert_eq!(arena.value(area), "draft");
        arena.form_state_mut(area).unwrap().value = Some("typed".into());
        assert_eq!(arena.value(area), "typed");

        let select = arena.create_element("select");
        arena.set_attribute(select, "size", " 4x").unwrap();
        assert_eq!(arena.select_size(select), 4);
    }
}
