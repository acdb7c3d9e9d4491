//! DOM Service - Main entry point for snapshot operations
//!
//! This handles:
//! - CDP integration (parsing `DOM.getDocument` responses into the arena)
//! - Merging `DOMSnapshot.captureSnapshot` layout and style data
//! - Taking accessibility snapshots and resolving their refs

use crate::arena::DomArena;
use crate::aria_tree::{AriaSnapshot, AriaTreeOptions};
use crate::error::{DomError, Result};
use crate::serializer::{RenderOptions, SnapshotOutput};
use crate::session::SnapshotSession;
use crate::types::*;
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Style properties requested from `DOMSnapshot.captureSnapshot`
pub const DEFAULT_COMPUTED_STYLES: &[&str] =
    &["display", "visibility", "cursor", "pointer-events", "content"];

/// Configuration for DOM service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomServiceConfig {
    pub tree: AriaTreeOptions,
    pub render: RenderOptions,
    /// Must match the `computedStyles` list the snapshot was captured with
    pub computed_styles: Vec<String>,
}

impl Default for DomServiceConfig {
    fn default() -> Self {
        Self {
            tree: AriaTreeOptions::default(),
            render: RenderOptions::default(),
            computed_styles: DEFAULT_COMPUTED_STYLES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Main DOM service
pub struct DomService {
    config: DomServiceConfig,
    arena: DomArena,
    session: SnapshotSession,
}

impl DomService {
    /// Create new DOM service with default config
    pub fn new() -> Self {
        Self::with_config(DomServiceConfig::default())
    }

    /// Create DOM service with custom config
    pub fn with_config(config: DomServiceConfig) -> Self {
        Self {
            config,
            arena: DomArena::new(),
            session: SnapshotSession::new(),
        }
    }

    pub fn config(&self) -> &DomServiceConfig {
        &self.config
    }

    /// Get reference to internal arena
    pub fn arena(&self) -> &DomArena {
        &self.arena
    }

    /// Get mutable reference to internal arena
    pub fn arena_mut(&mut self) -> &mut DomArena {
        &mut self.arena
    }

    pub fn session(&self) -> &SnapshotSession {
        &self.session
    }

    /// Parse CDP DOM tree response and build arena
    ///
    /// Input format matches CDP's `DOM.getDocument` response taken with
    /// `depth: -1, pierce: true`:
    /// ```json
    /// {
    ///   "root": {
    ///     "nodeId": 1,
    ///     "backendNodeId": 1,
    ///     "nodeType": 9,
    ///     "nodeName": "#document",
    ///     "children": [...]
    ///   }
    /// }
    /// ```
    ///
    /// Refs handed out before re-ingestion keep resolving as long as their
    /// backend node still exists.
    pub fn parse_cdp_dom_tree(&mut self, cdp_response: &Value) -> Result<NodeId> {
        let root = cdp_response
            .get("root")
            .ok_or_else(|| DomError::CdpError("Missing 'root' in CDP response".to_string()))?;

        self.arena.clear();
        let mut slots = SlotAssignments::default();
        let root_id = self.parse_node(root, None, &mut slots)?;
        self.arena.set_root(root_id)?;
        self.assign_slots(slots);

        debug!("Parsed CDP DOM tree: {} nodes", self.arena.len());
        Ok(root_id)
    }

    /// Recursively parse a CDP node
    fn parse_node(
        &mut self,
        cdp_node: &Value,
        parent_id: Option<NodeId>,
        slots: &mut SlotAssignments,
    ) -> Result<NodeId> {
        cdp_node["nodeId"]
            .as_u64()
            .ok_or_else(|| DomError::CdpError("Missing nodeId".to_string()))?;

        let backend_node_id = cdp_node["backendNodeId"]
            .as_u64()
            .ok_or_else(|| DomError::CdpError("Missing backendNodeId".to_string()))?
            as BackendNodeId;

        let node_type_val = cdp_node["nodeType"]
            .as_u64()
            .ok_or_else(|| DomError::CdpError("Missing nodeType".to_string()))?;

        let node_type = u8::try_from(node_type_val)
            .ok()
            .and_then(NodeType::from_u8)
            .ok_or_else(|| DomError::InvalidNodeType {
                expected: "valid NodeType".to_string(),
                actual: format!("{}", node_type_val),
            })?;

        let node_name = cdp_node["nodeName"].as_str().unwrap_or("");

        // Parse attributes
        let mut attributes = HashMap::new();
        if let Some(attrs) = cdp_node["attributes"].as_array() {
            for pair in attrs.chunks_exact(2) {
                if let (Some(key), Some(value)) = (pair[0].as_str(), pair[1].as_str()) {
                    attributes.insert(key.to_ascii_lowercase(), value.to_string());
                }
            }
        }

        let mut node = DomNode::new(backend_node_id, node_type, node_name);
        node.node_value = cdp_node["nodeValue"].as_str().unwrap_or("").to_string();
        node.attributes = attributes;
        node.parent_id = parent_id;
        node.frame_id = cdp_node["frameId"].as_str().map(String::from);
        node.pseudo_type = cdp_node["pseudoType"].as_str().and_then(PseudoType::from_cdp);

        let current_node_id = self.arena.add_node(node);
        trace!(
            "Ingested node {} (backend {}) {}",
            current_node_id,
            backend_node_id,
            node_name
        );

        // Slot assignments resolve by backend id once the whole tree exists
        if let Some(slot) = cdp_node["assignedSlot"]["backendNodeId"].as_u64() {
            slots.by_node.push((current_node_id, slot as BackendNodeId));
        }
        if let Some(distributed) = cdp_node["distributedNodes"].as_array() {
            let backend_ids = distributed
                .iter()
                .filter_map(|n| n["backendNodeId"].as_u64())
                .map(|id| id as BackendNodeId)
                .collect();
            slots.by_slot.push((current_node_id, backend_ids));
        }

        // Parse children
        if let Some(children) = cdp_node["children"].as_array() {
            let mut child_ids = smallvec::SmallVec::new();
            for child in children {
                child_ids.push(self.parse_node(child, Some(current_node_id), slots)?);
            }
            self.arena.get_mut(current_node_id)?.children_ids = child_ids;
        }

        // Parse content document (iframe)
        if let Some(content_doc) = cdp_node.get("contentDocument") {
            let doc_id = self.parse_node(content_doc, Some(current_node_id), slots)?;
            self.arena.get_mut(current_node_id)?.content_document_id = Some(doc_id);
        }

        // Parse shadow roots
        if let Some(shadow_roots) = cdp_node["shadowRoots"].as_array() {
            let mut shadow_ids = smallvec::SmallVec::new();
            for shadow in shadow_roots {
                shadow_ids.push(self.parse_node(shadow, Some(current_node_id), slots)?);
            }
            self.arena.get_mut(current_node_id)?.shadow_root_ids = Some(shadow_ids);
        }

        // ::before / ::after only; other pseudo elements carry no content
        if let Some(pseudo_elements) = cdp_node["pseudoElements"].as_array() {
            let mut pseudo_ids = smallvec::SmallVec::new();
            for pseudo in pseudo_elements {
                let kind = pseudo["pseudoType"].as_str().and_then(PseudoType::from_cdp);
                if kind.is_some() {
                    pseudo_ids.push(self.parse_node(pseudo, Some(current_node_id), slots)?);
                }
            }
            if !pseudo_ids.is_empty() {
                self.arena.get_mut(current_node_id)?.pseudo_element_ids = Some(pseudo_ids);
            }
        }

        Ok(current_node_id)
    }

    fn assign_slots(&mut self, slots: SlotAssignments) {
        let mut seen = AHashSet::new();
        let from_slots = slots.by_slot.into_iter().flat_map(|(slot, nodes)| {
            nodes.into_iter().map(move |node| (node, Some(slot)))
        });
        let from_nodes = slots
            .by_node
            .into_iter()
            .map(|(node, slot)| (node, self.arena.get_node_id_by_backend(slot)));

        let resolved: Vec<(Option<NodeId>, Option<NodeId>)> = from_slots
            .map(|(backend, slot)| (self.arena.get_node_id_by_backend(backend), slot))
            .chain(from_nodes.map(|(node, slot)| (Some(node), slot)))
            .collect();
        for pair in resolved {
            let (Some(node), Some(slot)) = pair else {
                warn!("Skipping slot assignment with unknown node: {:?}", pair);
                continue;
            };
            if !seen.insert(node) {
                continue;
            }
            if let Err(err) = self.arena.assign_slot(node, slot) {
                warn!("Failed to assign node {} to slot {}: {}", node, slot, err);
            }
        }
    }

    /// Merge snapshot data from `DOMSnapshot.captureSnapshot`
    ///
    /// The snapshot must have been captured with `computedStyles` set to the
    /// configured `computed_styles` list. Bounds are divided by
    /// `device_pixel_ratio` to get CSS pixels.
    pub fn merge_snapshot(&mut self, snapshot: &Value, device_pixel_ratio: f64) -> Result<()> {
        let strings: Vec<&str> = snapshot["strings"]
            .as_array()
            .ok_or_else(|| DomError::CdpError("Missing 'strings' in snapshot".to_string()))?
            .iter()
            .map(|s| s.as_str().unwrap_or(""))
            .collect();
        let documents = snapshot["documents"]
            .as_array()
            .ok_or_else(|| DomError::CdpError("Missing 'documents' in snapshot".to_string()))?;

        for document in documents {
            self.merge_snapshot_document(document, &strings, device_pixel_ratio)?;
        }
        debug!("Merged layout data for {} documents", documents.len());
        Ok(())
    }

    fn merge_snapshot_document(
        &mut self,
        document: &Value,
        strings: &[&str],
        device_pixel_ratio: f64,
    ) -> Result<()> {
        let nodes = &document["nodes"];
        let backend_ids = nodes["backendNodeId"]
            .as_array()
            .ok_or_else(|| DomError::CdpError("Missing 'nodes.backendNodeId'".to_string()))?;
        let parent_index = index_list(&nodes["parentIndex"]);

        let layout = &document["layout"];
        let layout_nodes = index_list(&layout["nodeIndex"]);
        let styles = layout["styles"].as_array().map(Vec::as_slice).unwrap_or(&[]);
        let bounds = layout["bounds"].as_array().map(Vec::as_slice).unwrap_or(&[]);

        let mut layout_of: AHashMap<usize, usize> = AHashMap::with_capacity(layout_nodes.len());
        let mut has_laid_out_descendant = vec![false; backend_ids.len()];
        for (layout_index, node_index) in layout_nodes.iter().enumerate() {
            let Some(node_index) = *node_index else {
                continue;
            };
            if node_index >= backend_ids.len() {
                warn!("Layout entry {} points past the node table", layout_index);
                continue;
            }
            layout_of.entry(node_index).or_insert(layout_index);
            let mut ancestor = parent_index.get(node_index).copied().flatten();
            while let Some(index) = ancestor.filter(|i| *i < has_laid_out_descendant.len()) {
                if has_laid_out_descendant[index] {
                    break;
                }
                has_laid_out_descendant[index] = true;
                ancestor = parent_index.get(index).copied().flatten();
            }
        }

        let mut node_ids = Vec::with_capacity(backend_ids.len());
        for (index, backend_id) in backend_ids.iter().enumerate() {
            let node_id = backend_id
                .as_u64()
                .and_then(|id| self.arena.get_node_id_by_backend(id as BackendNodeId));
            node_ids.push(node_id);
            let Some(node_id) = node_id else {
                continue;
            };
            let node_type = self.arena.get(node_id)?.node_type;

            match (node_type, layout_of.get(&index)) {
                (NodeType::Element, Some(&layout_index)) => {
                    let values = styles.get(layout_index).and_then(Value::as_array);
                    for (property, value) in self.config.computed_styles.iter().zip(
                        values.map(Vec::as_slice).unwrap_or(&[]),
                    ) {
                        if let Some(value) = string_at(strings, value) {
                            self.arena.set_style(node_id, property, value)?;
                        }
                    }
                    if let Some(rect) = bounds.get(layout_index).and_then(parse_rect) {
                        self.arena.set_bounds(node_id, rect.scale(device_pixel_ratio))?;
                    }
                }
                (NodeType::Element, None) => {
                    // display:contents boxes are absent from layout but their
                    // content is not
                    let display = if has_laid_out_descendant[index] {
                        "contents"
                    } else {
                        "none"
                    };
                    self.arena.set_style(node_id, "display", display)?;
                }
                (NodeType::Text, Some(&layout_index)) => {
                    if let Some(rect) = bounds.get(layout_index).and_then(parse_rect) {
                        self.arena.set_bounds(node_id, rect.scale(device_pixel_ratio))?;
                    }
                }
                (NodeType::Text, None) => self.arena.set_bounds(node_id, DomRect::zero())?,
                _ => {}
            }
        }

        self.merge_form_state(nodes, strings, &node_ids)
    }

    fn merge_form_state(
        &mut self,
        nodes: &Value,
        strings: &[&str],
        node_ids: &[Option<NodeId>],
    ) -> Result<()> {
        let input_value = &nodes["inputValue"];
        let values = input_value["value"].as_array().map(Vec::as_slice).unwrap_or(&[]);
        for (index, value) in index_list(&input_value["index"]).into_iter().zip(values) {
            let Some(node_id) = index.and_then(|i| node_ids.get(i).copied().flatten()) else {
                continue;
            };
            if let Some(value) = string_at(strings, value) {
                self.arena.form_state_mut(node_id)?.value = Some(value.to_string());
            }
        }

        let checked: AHashSet<usize> = index_list(&nodes["inputChecked"]["index"])
            .into_iter()
            .flatten()
            .collect();
        let selected: AHashSet<usize> = index_list(&nodes["optionSelected"]["index"])
            .into_iter()
            .flatten()
            .collect();
        for (index, node_id) in node_ids.iter().enumerate() {
            let Some(node_id) = *node_id else {
                continue;
            };
            let toggle = self.arena.tag(node_id) == "INPUT"
                && matches!(self.arena.input_type(node_id), "checkbox" | "radio");
            if toggle {
                self.arena.form_state_mut(node_id)?.checked = Some(checked.contains(&index));
            } else if self.arena.tag(node_id) == "OPTION" {
                self.arena.form_state_mut(node_id)?.selected = Some(selected.contains(&index));
            }
        }
        Ok(())
    }

    /// Record the focused element (from `DOM.describeNode` on
    /// `document.activeElement`); `None` clears focus
    pub fn set_focused_backend_node(&mut self, backend_id: Option<BackendNodeId>) -> Result<()> {
        let node_id = match backend_id {
            Some(backend_id) => Some(
                self.arena
                    .get_node_id_by_backend(backend_id)
                    .ok_or(DomError::NodeNotFound(backend_id))?,
            ),
            None => None,
        };
        self.arena.set_active_element(node_id)
    }

    fn snapshot_root(&self) -> Result<NodeId> {
        self.arena.body().ok_or(DomError::NoRoot)
    }

    /// Accessibility tree of the document body, without publishing refs
    pub fn generate_aria_tree(&mut self) -> Result<AriaSnapshot> {
        let root = self.snapshot_root()?;
        Ok(self
            .session
            .generate_aria_tree(&self.arena, root, &self.config.tree))
    }

    /// Snapshot text of the document body with the configured options
    pub fn snapshot(&mut self) -> Result<String> {
        let tree = self.config.tree.clone();
        let render = self.config.render.clone();
        Ok(self.snapshot_with(&tree, &render)?.text)
    }

    /// Snapshot with explicit options; refs of the result replace the
    /// previous snapshot's refs
    pub fn snapshot_with(
        &mut self,
        tree: &AriaTreeOptions,
        render: &RenderOptions,
    ) -> Result<SnapshotOutput> {
        let root = self.snapshot_root()?;
        Ok(self.session.snapshot(&self.arena, root, tree, render))
    }

    /// Element behind a ref of the latest snapshot
    pub fn select_ref(&self, ref_id: &str) -> Result<NodeId> {
        self.session.resolve_ref(&self.arena, ref_id)
    }
}

impl Default for DomService {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct SlotAssignments {
    /// (node, backend id of its `assignedSlot`)
    by_node: Vec<(NodeId, BackendNodeId)>,
    /// (slot, backend ids of its `distributedNodes`)
    by_slot: Vec<(NodeId, Vec<BackendNodeId>)>,
}

/// Integer array where negative entries stand for "none"
fn index_list(value: &Value) -> Vec<Option<usize>> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| item.as_i64().and_then(|i| usize::try_from(i).ok()))
                .collect()
        })
        .unwrap_or_default()
}

/// Entry of the shared string table; -1 means "no string"
fn string_at<'s>(strings: &[&'s str], index: &Value) -> Option<&'s str> {
    let index = usize::try_from(index.as_i64()?).ok()?;
    strings.get(index).copied()
}

fn parse_rect(value: &Value) -> Option<DomRect> {
    match value.as_array()?.as_slice() {
        [x, y, width, height, ..] => Some(DomRect::new(
            x.as_f64()?,
            y.as_f64()?,
            width.as_f64()?,
            height.as_f64()?,
        )),
        _ => {
            warn!("Malformed layout bounds: {}", value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page_dom() -> Value {
        json!({
            "root": {
                "nodeId": 1, "backendNodeId": 1, "nodeType": 9,
                "nodeName": "#document", "nodeValue": "",
                "children": [{
                    "nodeId": 2, "backendNodeId": 2, "nodeType": 1,
                    "nodeName": "HTML", "nodeValue": "", "attributes": [],
                    "children": [{
                        "nodeId": 3, "backendNodeId": 3, "nodeType": 1,
                        "nodeName": "BODY", "nodeValue": "", "attributes": [],
                        "children": [
                            {
                                "nodeId": 4, "backendNodeId": 4, "nodeType": 1,
                                "nodeName": "BUTTON", "nodeValue": "", "attributes": [],
                                "children": [{
                                    "nodeId": 5, "backendNodeId": 5, "nodeType": 3,
                                    "nodeName": "#text", "nodeValue": "Submit"
                                }]
                            },
                            {
                                "nodeId": 6, "backendNodeId": 6, "nodeType": 1,
                                "nodeName": "INPUT", "nodeValue": "",
                                "attributes": ["type", "checkbox", "aria-label", "Agree"]
                            },
                            {
                                "nodeId": 7, "backendNodeId": 7, "nodeType": 1,
                                "nodeName": "DIV", "nodeValue": "", "attributes": [],
                                "children": [{
                                    "nodeId": 8, "backendNodeId": 8, "nodeType": 3,
                                    "nodeName": "#text", "nodeValue": "secret"
                                }]
                            }
                        ]
                    }]
                }]
            }
        })
    }

    fn page_snapshot() -> Value {
        json!({
            "strings": [
                "#document", "HTML", "BODY", "BUTTON", "#text", "INPUT", "DIV",
                "block", "visible", "auto", "inline-block", "pointer", "normal"
            ],
            "documents": [{
                "nodes": {
                    "parentIndex": [-1, 0, 1, 2, 3, 2, 2, 6],
                    "nodeType": [9, 1, 1, 1, 3, 1, 1, 3],
                    "nodeName": [0, 1, 2, 3, 4, 5, 6, 4],
                    "backendNodeId": [1, 2, 3, 4, 5, 6, 7, 8],
                    "inputChecked": { "index": [5] }
                },
                "layout": {
                    "nodeIndex": [1, 2, 3, 4, 5],
                    "styles": [
                        [7, 8, 9, 9, 12],
                        [7, 8, 9, 9, 12],
                        [10, 8, 11, 9, 12],
                        [],
                        [10, 8, 9, 9, 12]
                    ],
                    "bounds": [
                        [0, 0, 1600, 1200],
                        [0, 0, 1600, 1200],
                        [20, 40, 200, 80],
                        [24, 44, 100, 40],
                        [20, 200, 40, 40]
                    ]
                }
            }]
        })
    }

    fn loaded_service() -> DomService {
        let mut service = DomService::new();
        service.parse_cdp_dom_tree(&page_dom()).unwrap();
        service.merge_snapshot(&page_snapshot(), 2.0).unwrap();
        service
    }

    fn node_by_backend(service: &DomService, backend_id: BackendNodeId) -> NodeId {
        service.arena().get_node_id_by_backend(backend_id).unwrap()
    }

    #[test]
    fn test_parse_simple_dom() {
        let mut service = DomService::new();
        let root_id = service.parse_cdp_dom_tree(&page_dom()).unwrap();

        assert_eq!(root_id, 0);
        assert_eq!(service.arena().len(), 8);
        let body = service.arena().body().unwrap();
        assert_eq!(service.arena().tag(body), "BODY");
        let input = node_by_backend(&service, 6);
        assert_eq!(service.arena().attr(input, "aria-label"), Some("Agree"));
    }

    #[test]
    fn test_parse_rejects_malformed_nodes() {
        let mut service = DomService::new();
        let missing = json!({ "root": { "nodeId": 1, "nodeType": 9 } });
        assert!(matches!(
            service.parse_cdp_dom_tree(&missing),
            Err(DomError::CdpError(_))
        ));

        let bad_type = json!({ "root": { "nodeId": 1, "backendNodeId": 1, "nodeType": 42 } });
        assert!(matches!(
            service.parse_cdp_dom_tree(&bad_type),
            Err(DomError::InvalidNodeType { .. })
        ));

        assert!(matches!(
            service.parse_cdp_dom_tree(&json!({})),
            Err(DomError::CdpError(_))
        ));
    }

    #[test]
    fn test_parse_shadow_slots_and_pseudo_elements() {
        let dom = json!({
            "root": {
                "nodeId": 1, "backendNodeId": 1, "nodeType": 9, "nodeName": "#document",
                "children": [{
                    "nodeId": 2, "backendNodeId": 2, "nodeType": 1, "nodeName": "BODY",
                    "children": [{
                        "nodeId": 3, "backendNodeId": 3, "nodeType": 1, "nodeName": "X-CARD",
                        "shadowRoots": [{
                            "nodeId": 4, "backendNodeId": 4, "nodeType": 11,
                            "nodeName": "#document-fragment", "shadowRootType": "open",
                            "children": [{
                                "nodeId": 5, "backendNodeId": 5, "nodeType": 1,
                                "nodeName": "SLOT",
                                "distributedNodes": [{ "backendNodeId": 6, "nodeType": 1, "nodeName": "SPAN" }]
                            }]
                        }],
                        "children": [{
                            "nodeId": 6, "backendNodeId": 6, "nodeType": 1, "nodeName": "SPAN",
                            "assignedSlot": { "backendNodeId": 5, "nodeType": 1, "nodeName": "SLOT" },
                            "pseudoElements": [
                                { "nodeId": 7, "backendNodeId": 7, "nodeType": 1,
                                  "nodeName": "::before", "pseudoType": "before" },
                                { "nodeId": 8, "backendNodeId": 8, "nodeType": 1,
                                  "nodeName": "::marker", "pseudoType": "marker" }
                            ]
                        }]
                    }]
                }]
            }
        });
        let mut service = DomService::new();
        service.parse_cdp_dom_tree(&dom).unwrap();
        let arena = service.arena();

        let host = node_by_backend(&service, 3);
        let slot = node_by_backend(&service, 5);
        let span = node_by_backend(&service, 6);
        let shadow = arena.shadow_root(host).unwrap();
        assert_eq!(arena.shadow_host(shadow), Some(host));
        assert!(!arena.children(host).contains(&shadow));

        // listed by both the slot and the node, assigned once
        assert_eq!(arena.assigned_nodes(slot), &[span]);
        assert_eq!(arena.assigned_slot(span), Some(slot));

        let before = arena.pseudo_element(span, PseudoType::Before).unwrap();
        assert_eq!(arena.node(before).unwrap().backend_node_id, 7);
        assert!(arena.get_node_id_by_backend(8).is_none());
        assert!(arena.is_connected(before));
    }

    #[test]
    fn test_merge_snapshot_styles_bounds_and_form_state() {
        let service = loaded_service();
        let arena = service.arena();

        let button = node_by_backend(&service, 4);
        let node = arena.node(button).unwrap();
        assert_eq!(node.style_value("display"), Some("inline-block"));
        assert_eq!(node.style_value("cursor"), Some("pointer"));
        assert_eq!(node.bounds(), Some(DomRect::new(10.0, 20.0, 100.0, 40.0)));

        let hidden = node_by_backend(&service, 7);
        assert_eq!(arena.node(hidden).unwrap().style_value("display"), Some("none"));
        let hidden_text = node_by_backend(&service, 8);
        assert_eq!(arena.node(hidden_text).unwrap().bounds(), Some(DomRect::zero()));

        let checkbox = node_by_backend(&service, 6);
        assert!(arena.checked(checkbox));
    }

    #[test]
    fn test_merge_marks_unboxed_wrappers_as_contents() {
        let dom = json!({
            "root": {
                "nodeId": 1, "backendNodeId": 1, "nodeType": 9, "nodeName": "#document",
                "children": [{
                    "nodeId": 2, "backendNodeId": 2, "nodeType": 1, "nodeName": "DIV",
                    "children": [{
                        "nodeId": 3, "backendNodeId": 3, "nodeType": 1, "nodeName": "BUTTON"
                    }]
                }]
            }
        });
        let snapshot = json!({
            "strings": ["inline-block", "visible", "auto", "normal"],
            "documents": [{
                "nodes": {
                    "parentIndex": [-1, 0, 1],
                    "backendNodeId": [1, 2, 3]
                },
                "layout": {
                    "nodeIndex": [2],
                    "styles": [[0, 1, 2, 2, 3]],
                    "bounds": [[0, 0, 50, 20]]
                }
            }]
        });
        let mut service = DomService::new();
        service.parse_cdp_dom_tree(&dom).unwrap();
        service.merge_snapshot(&snapshot, 1.0).unwrap();

        let wrapper = node_by_backend(&service, 2);
        assert_eq!(
            service.arena().node(wrapper).unwrap().style_value("display"),
            Some("contents")
        );
    }

    #[test]
    fn test_merge_requires_string_table() {
        let mut service = DomService::new();
        service.parse_cdp_dom_tree(&page_dom()).unwrap();
        assert!(matches!(
            service.merge_snapshot(&json!({ "documents": [] }), 1.0),
            Err(DomError::CdpError(_))
        ));
    }

    #[test]
    fn test_snapshot_and_select_ref() {
        let mut service = loaded_service();
        assert!(matches!(
            service.select_ref("e1"),
            Err(DomError::NoSnapshot { .. })
        ));

        let text = service.snapshot().unwrap();
        assert!(text.contains("button \"Submit\" [ref=e2] [cursor=pointer]"));
        assert!(text.contains("checkbox \"Agree\" [checked] [ref=e3]"));
        assert!(!text.contains("secret"));

        assert_eq!(service.select_ref("e1").unwrap(), service.arena().body().unwrap());
        assert_eq!(service.select_ref("e2").unwrap(), node_by_backend(&service, 4));
        let err = service.select_ref("e7").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Ref \"e7\" not found. Available refs: e1, e2, e3"
        );
    }

    #[test]
    fn test_refs_survive_reingestion() {
        let mut service = loaded_service();
        service.snapshot().unwrap();

        service.parse_cdp_dom_tree(&page_dom()).unwrap();
        service.merge_snapshot(&page_snapshot(), 2.0).unwrap();
        assert_eq!(service.select_ref("e2").unwrap(), node_by_backend(&service, 4));

        let output = service
            .snapshot_with(&AriaTreeOptions::default(), &RenderOptions::default())
            .unwrap();
        assert_eq!(output.items[1].ref_id, "e2");
        assert_eq!(service.session().last_ref(), 3);
    }

    #[test]
    fn test_focus_marks_active() {
        let mut service = loaded_service();
        service.set_focused_backend_node(Some(4)).unwrap();
        let text = service.snapshot().unwrap();
        assert!(text.contains("button \"Submit\" [active] [ref=e2]"));

        assert!(matches!(
            service.set_focused_backend_node(Some(99)),
            Err(DomError::NodeNotFound(99))
        ));
        service.set_focused_backend_node(None).unwrap();
        assert_eq!(service.arena().active_element(), None);
    }

    #[test]
    fn test_empty_document_has_no_root() {
        let mut service = DomService::new();
        assert!(matches!(service.snapshot(), Err(DomError::NoRoot)));
    }

    #[test]
    fn test_config_from_json() {
        let config: DomServiceConfig = serde_json::from_value(json!({
            "tree": { "ref_prefix": "f1" },
            "render": { "format": "list", "max_items": 5 }
        }))
        .unwrap();
        assert_eq!(config.tree.ref_prefix, "f1");
        assert_eq!(config.render.format, crate::serializer::SnapshotFormat::List);
        assert_eq!(config.render.max_items, 5);
        assert_eq!(config.computed_styles.len(), DEFAULT_COMPUTED_STYLES.len());
    }
}
