//! Core type definitions for the host document and the role tables
//!
//! Key design principles:
//! 1. Use u32 for indices (4 bytes vs 8 bytes pointer)
//! 2. Use SmallVec for small arrays (avoid heap allocation)
//! 3. Use Option<Box<T>> for large optional fields (reduce struct size)
//! 4. Roles are `&'static str` drawn from `VALID_ROLES`, never owned strings

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Node identifier (index into arena)
/// u32 allows 4 billion nodes, enough for any webpage
pub type NodeId = u32;

/// Backend node identifier from CDP, stable across re-ingestion
pub type BackendNodeId = u32;

/// Frame identifier from CDP
pub type FrameId = String;

/// DOM `Node.nodeType` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Element = 1,
    Attribute = 2,
    Text = 3,
    CdataSection = 4,
    EntityReference = 5,
    Entity = 6,
    ProcessingInstruction = 7,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
    DocumentFragment = 11,
    Notation = 12,
}

impl NodeType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(NodeType::Element),
            2 => Some(NodeType::Attribute),
            3 => Some(NodeType::Text),
            4 => Some(NodeType::CdataSection),
            5 => Some(NodeType::EntityReference),
            6 => Some(NodeType::Entity),
            7 => Some(NodeType::ProcessingInstruction),
            8 => Some(NodeType::Comment),
            9 => Some(NodeType::Document),
            10 => Some(NodeType::DocumentType),
            11 => Some(NodeType::DocumentFragment),
            12 => Some(NodeType::Notation),
            _ => None,
        }
    }
}

/// Generated-content pseudo elements the snapshot reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PseudoType {
    Before,
    After,
}

impl PseudoType {
    /// Parse CDP's `pseudoType` value
    pub fn from_cdp(value: &str) -> Option<Self> {
        match value {
            "before" => Some(PseudoType::Before),
            "after" => Some(PseudoType::After),
            _ => None,
        }
    }

    pub fn node_name(self) -> &'static str {
        match self {
            PseudoType::Before => "::before",
            PseudoType::After => "::after",
        }
    }
}

/// Rectangle with coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DomRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Non-empty in both dimensions
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Scale device pixels down to CSS pixels
    pub fn scale(&self, device_pixel_ratio: f64) -> Self {
        if device_pixel_ratio <= 0.0 || device_pixel_ratio == 1.0 {
            return *self;
        }
        Self::new(
            self.x / device_pixel_ratio,
            self.y / device_pixel_ratio,
            self.width / device_pixel_ratio,
            self.height / device_pixel_ratio,
        )
    }
}

/// Layout data for one node, from DOMSnapshot.captureSnapshot or set by the host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotNode {
    /// Bounding client rect in CSS pixels
    pub bounds: Option<DomRect>,
    /// Style values (property name → value). Absent properties fall back to
    /// inheritance or user-agent defaults.
    pub computed_styles: Option<HashMap<String, String>>,
}

/// Live form-control state that attributes don't reflect
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    pub value: Option<String>,
    pub checked: Option<bool>,
    pub indeterminate: bool,
    pub selected: Option<bool>,
}

/// The host document node
///
/// Design philosophy:
/// - Small fixed-size fields first (better packing)
/// - Use indices instead of pointers
/// - Use Option<Box<T>> for large optional data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomNode {
    // IDs
    pub node_id: NodeId,
    pub backend_node_id: BackendNodeId,
    pub node_type: NodeType,

    // Navigation indices
    pub parent_id: Option<NodeId>,
    pub children_ids: SmallVec<[NodeId; 4]>, // Most nodes have <4 children

    /// Upper-cased for elements ("BUTTON"), `#text` etc. otherwise
    pub node_name: String,
    pub node_value: String,
    pub attributes: HashMap<String, String>,

    pub frame_id: Option<FrameId>,

    // Special DOM structures
    pub content_document_id: Option<NodeId>,
    pub shadow_root_ids: Option<SmallVec<[NodeId; 2]>>,
    pub pseudo_type: Option<PseudoType>,
    pub pseudo_element_ids: Option<SmallVec<[NodeId; 2]>>,
    pub assigned_slot: Option<NodeId>,
    pub assigned_nodes: Option<SmallVec<[NodeId; 4]>>,

    // Enhanced data (boxed to reduce struct size)
    pub snapshot_node: Option<Box<SnapshotNode>>,
    pub form_state: Option<Box<FormState>>,
}

impl DomNode {
    /// Create a new node with required fields
    pub fn new(backend_node_id: BackendNodeId, node_type: NodeType, node_name: &str) -> Self {
        let node_name = if node_type == NodeType::Element {
            node_name.to_ascii_uppercase()
        } else {
            node_name.to_string()
        };
        Self {
            node_id: 0,
            backend_node_id,
            node_type,
            node_name,
            node_value: String::new(),
            attributes: HashMap::new(),
            parent_id: None,
            children_ids: SmallVec::new(),
            frame_id: None,
            content_document_id: None,
            shadow_root_ids: None,
            pseudo_type: None,
            pseudo_element_ids: None,
            assigned_slot: None,
            assigned_nodes: None,
            snapshot_node: None,
            form_state: None,
        }
    }

    /// Get tag name for element nodes
    pub fn tag_name(&self) -> Option<&str> {
        if self.node_type == NodeType::Element {
            Some(&self.node_name)
        } else {
            None
        }
    }

    /// Check if node is an element
    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    /// Check if node is text
    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    /// Get attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Declared or computed style value from the layout data
    pub fn style_value(&self, property: &str) -> Option<&str> {
        self.snapshot_node
            .as_ref()
            .and_then(|s| s.computed_styles.as_ref())
            .and_then(|styles| styles.get(property))
            .map(|s| s.as_str())
    }

    pub fn bounds(&self) -> Option<DomRect> {
        self.snapshot_node.as_ref().and_then(|s| s.bounds)
    }
}

/// Closed vocabulary of ARIA roles an explicit `role` attribute may name
pub const VALID_ROLES: &[&str] = &[
    "alert",
    "alertdialog",
    "application",
    "article",
    "banner",
    "blockquote",
    "button",
    "caption",
    "cell",
    "checkbox",
    "code",
    "columnheader",
    "combobox",
    "complementary",
    "contentinfo",
    "definition",
    "deletion",
    "dialog",
    "directory",
    "document",
    "emphasis",
    "feed",
    "figure",
    "form",
    "generic",
    "grid",
    "gridcell",
    "group",
    "heading",
    "img",
    "insertion",
    "link",
    "list",
    "listbox",
    "listitem",
    "log",
    "main",
    "mark",
    "marquee",
    "math",
    "meter",
    "menu",
    "menubar",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "navigation",
    "none",
    "note",
    "option",
    "paragraph",
    "presentation",
    "progressbar",
    "radio",
    "radiogroup",
    "region",
    "row",
    "rowgroup",
    "rowheader",
    "scrollbar",
    "search",
    "searchbox",
    "separator",
    "slider",
    "spinbutton",
    "status",
    "strong",
    "subscript",
    "superscript",
    "switch",
    "tab",
    "table",
    "tablist",
    "tabpanel",
    "term",
    "textbox",
    "time",
    "timer",
    "toolbar",
    "tooltip",
    "tree",
    "treegrid",
    "treeitem",
];

/// Intern a role token into the static vocabulary
pub fn valid_role(token: &str) -> Option<&'static str> {
    VALID_ROLES.iter().copied().find(|role| *role == token)
}

/// Roles whose accessible name is never computed
pub const NAME_PROHIBITED_ROLES: &[&str] = &[
    "caption",
    "code",
    "definition",
    "deletion",
    "emphasis",
    "generic",
    "insertion",
    "mark",
    "paragraph",
    "presentation",
    "strong",
    "subscript",
    "suggestion",
    "superscript",
    "term",
    "time",
];

/// Roles that take their name from descendant content
pub const NAME_FROM_CONTENT_ROLES: &[&str] = &[
    "button",
    "cell",
    "checkbox",
    "columnheader",
    "gridcell",
    "heading",
    "link",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "option",
    "radio",
    "row",
    "rowheader",
    "switch",
    "tab",
    "tooltip",
    "treeitem",
];

pub const ARIA_CHECKED_ROLES: &[&str] = &[
    "checkbox",
    "menuitemcheckbox",
    "option",
    "radio",
    "switch",
    "menuitemradio",
    "treeitem",
];

pub const ARIA_DISABLED_ROLES: &[&str] = &[
    "application",
    "button",
    "composite",
    "gridcell",
    "group",
    "input",
    "link",
    "menuitem",
    "scrollbar",
    "separator",
    "tab",
    "checkbox",
    "columnheader",
    "combobox",
    "grid",
    "listbox",
    "menu",
    "menubar",
    "menuitemcheckbox",
    "menuitemradio",
    "option",
    "radio",
    "radiogroup",
    "row",
    "rowheader",
    "searchbox",
    "select",
    "slider",
    "spinbutton",
    "switch",
    "tablist",
    "textbox",
    "toolbar",
    "tree",
    "treegrid",
    "treeitem",
];

pub const ARIA_EXPANDED_ROLES: &[&str] = &[
    "application",
    "button",
    "checkbox",
    "combobox",
    "gridcell",
    "link",
    "listbox",
    "menuitem",
    "row",
    "rowheader",
    "tab",
    "treeitem",
    "columnheader",
    "menuitemcheckbox",
    "menuitemradio",
    "switch",
];

pub const ARIA_LEVEL_ROLES: &[&str] = &["heading", "listitem", "row", "treeitem"];

pub const ARIA_PRESSED_ROLES: &[&str] = &["button"];

pub const ARIA_SELECTED_ROLES: &[&str] = &[
    "gridcell",
    "option",
    "row",
    "tab",
    "rowheader",
    "columnheader",
    "treeitem",
];

/// Roles that name-prohibit `aria-label` / `aria-labelledby`
const LABEL_PROHIBITED_ROLES: &[&str] = &[
    "caption",
    "code",
    "deletion",
    "emphasis",
    "generic",
    "insertion",
    "paragraph",
    "presentation",
    "strong",
    "subscript",
    "superscript",
];

/// Global ARIA attributes and the roles on which each is prohibited
pub const GLOBAL_ARIA_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("aria-atomic", &[]),
    ("aria-busy", &[]),
    ("aria-controls", &[]),
    ("aria-current", &[]),
    ("aria-describedby", &[]),
    ("aria-details", &[]),
    ("aria-dropeffect", &[]),
    ("aria-flowto", &[]),
    ("aria-grabbed", &[]),
    ("aria-hidden", &[]),
    ("aria-keyshortcuts", &[]),
    ("aria-label", LABEL_PROHIBITED_ROLES),
    ("aria-labelledby", LABEL_PROHIBITED_ROLES),
    ("aria-live", &[]),
    ("aria-owns", &[]),
    ("aria-relevant", &[]),
    ("aria-roledescription", &["generic"]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_role_interning() {
        assert_eq!(valid_role("button"), Some("button"));
        assert_eq!(valid_role("Button"), None);
        assert_eq!(valid_role("fragment"), None);
    }

    #[test]
    fn test_element_names_are_uppercased() {
        let node = DomNode::new(1, NodeType::Element, "section");
        assert_eq!(node.tag_name(), Some("SECTION"));
        let text = DomNode::new(2, NodeType::Text, "#text");
        assert_eq!(text.node_name, "#text");
        assert_eq!(text.tag_name(), None);
    }

    #[test]
    fn test_rect_scale() {
        let rect = DomRect::new(10.0, 20.0, 200.0, 40.0).scale(2.0);
        assert_eq!(rect, DomRect::new(5.0, 10.0, 100.0, 20.0));
        assert!(rect.has_area());
        assert!(!DomRect::zero().has_area());
    }
}
