//! Snapshot builder
//!
//! One depth-first walk from a root element produces an `AriaNode` tree:
//!
//! ```text
//! visit(node) ─┬─ text    → string child of the current output node
//!              └─ element → visibility policy → to_aria_node → process_element
//!                                                   (children, shadow, slots,
//!                                                    aria-owns, ::before/::after)
//! ```
//!
//! followed by two normalization passes: merging adjacent string runs and
//! flattening unnamed `generic` wrappers around a single ref-bearing node.

use crate::dom_utils::{is_js_whitespace, normalize_white_space, AriaContext, ElementBox};
use crate::refs::RefMemo;
use crate::roles::{
    aria_checked, aria_disabled, aria_expanded, aria_level, aria_pressed, aria_role,
    aria_selected, AriaTristate,
};
use crate::types::{
    NodeId, PseudoType, ARIA_CHECKED_ROLES, ARIA_DISABLED_ROLES, ARIA_EXPANDED_ROLES,
    ARIA_LEVEL_ROLES, ARIA_PRESSED_ROLES, ARIA_SELECTED_ROLES,
};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use tracing::trace;

/// Role of the synthetic root that holds the top-level nodes
pub const FRAGMENT_ROLE: &str = "fragment";
/// Role of the placeholder emitted for `<iframe>` elements
pub const IFRAME_ROLE: &str = "iframe";

/// Which elements produce nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    /// Not hidden for assistive technology; hidden subtrees are skipped
    Aria,
    /// Not hidden for assistive technology, or rendered with a box
    #[default]
    AriaOrVisible,
    /// Both of the above
    AriaAndVisible,
}

/// Which nodes get a ref
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RefPolicy {
    None,
    /// Visible nodes that receive pointer events
    #[default]
    Interactable,
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AriaTreeOptions {
    pub visibility: Visibility,
    pub refs: RefPolicy,
    pub ref_prefix: String,
    /// Emit `generic` for elements without a role instead of skipping them
    pub include_generic_role: bool,
}

impl Default for AriaTreeOptions {
    fn default() -> Self {
        Self {
            visibility: Visibility::AriaOrVisible,
            refs: RefPolicy::Interactable,
            ref_prefix: String::new(),
            include_generic_role: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AriaChild {
    Text(String),
    Node(AriaNode),
}

impl AriaChild {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AriaChild::Text(text) => Some(text),
            AriaChild::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&AriaNode> {
        match self {
            AriaChild::Node(node) => Some(node),
            AriaChild::Text(_) => None,
        }
    }
}

/// One node of the accessibility snapshot
///
/// State fields are `Some` only when the role supports that state.
#[derive(Debug, Clone, PartialEq)]
pub struct AriaNode {
    pub role: &'static str,
    pub name: String,
    pub children: Vec<AriaChild>,
    /// Extra rendered properties (`url`, `placeholder`)
    pub props: BTreeMap<String, String>,
    pub element: NodeId,
    pub element_box: ElementBox,
    pub receives_pointer_events: bool,
    pub active: bool,
    pub aria_ref: Option<String>,
    pub checked: Option<AriaTristate>,
    pub disabled: Option<bool>,
    pub expanded: Option<bool>,
    pub level: Option<u32>,
    pub pressed: Option<AriaTristate>,
    pub selected: Option<bool>,
}

impl AriaNode {
    pub fn new(role: &'static str, name: String, element: NodeId, element_box: ElementBox) -> Self {
        Self {
            role,
            name,
            children: Vec::new(),
            props: BTreeMap::new(),
            element,
            element_box,
            receives_pointer_events: true,
            active: false,
            aria_ref: None,
            checked: None,
            disabled: None,
            expanded: None,
            level: None,
            pressed: None,
            selected: None,
        }
    }

    /// Empty synthetic root
    pub fn fragment(element: NodeId) -> Self {
        Self::new(FRAGMENT_ROLE, String::new(), element, ElementBox::default())
    }

    fn single_text_child_equals_name(&self) -> bool {
        matches!(self.children.as_slice(), [AriaChild::Text(text)] if *text == self.name)
    }

    /// Depth-first pre-order walk over this node and its descendants
    pub fn walk<'n>(&'n self, visit: &mut impl FnMut(&'n AriaNode)) {
        visit(self);
        for child in &self.children {
            if let AriaChild::Node(node) = child {
                node.walk(visit);
            }
        }
    }
}

/// Output of one snapshot walk
#[derive(Debug, Clone)]
pub struct AriaSnapshot {
    pub root: AriaNode,
    /// Ref → element, in the order refs were encountered
    pub elements: Vec<(String, NodeId)>,
    /// Refs of `<iframe>` placeholders, for callers that snapshot frames
    pub iframe_refs: Vec<String>,
}

impl AriaSnapshot {
    pub fn element_for_ref(&self, aria_ref: &str) -> Option<NodeId> {
        self.elements
            .iter()
            .find(|(r, _)| r == aria_ref)
            .map(|(_, element)| *element)
    }

    pub fn ref_for_element(&self, element: NodeId) -> Option<&str> {
        self.elements
            .iter()
            .find(|(_, e)| *e == element)
            .map(|(r, _)| r.as_str())
    }
}

/// Walk state for one snapshot
pub struct TreeBuilder<'a> {
    ctx: AriaContext<'a>,
    options: &'a AriaTreeOptions,
    memo: &'a mut RefMemo,
    last_ref: &'a mut u32,
    root_element: NodeId,
    visited: AHashSet<NodeId>,
    elements: Vec<(String, NodeId)>,
    iframe_refs: Vec<String>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(
        ctx: AriaContext<'a>,
        options: &'a AriaTreeOptions,
        memo: &'a mut RefMemo,
        last_ref: &'a mut u32,
    ) -> Self {
        Self {
            ctx,
            options,
            memo,
            last_ref,
            root_element: 0,
            visited: AHashSet::new(),
            elements: Vec::new(),
            iframe_refs: Vec::new(),
        }
    }

    /// Walk the subtree of `root_element` inside one cache scope and
    /// normalize the result
    pub fn build(mut self, root_element: NodeId) -> AriaSnapshot {
        self.root_element = root_element;
        self.ctx.caches.begin();
        let mut root = AriaNode::fragment(root_element);
        root.element_box = self.ctx.compute_box(root_element);
        self.visit(&mut root, root_element, true);
        self.ctx.caches.end();

        normalize_string_children(&mut root);
        normalize_generic_roles(&mut root);
        AriaSnapshot {
            root,
            elements: self.elements,
            iframe_refs: self.iframe_refs,
        }
    }

    fn visit(&mut self, parent: &mut AriaNode, node: NodeId, parent_visible: bool) {
        if !self.visited.insert(node) {
            return;
        }
        let dom = self.ctx.dom;
        let Some(n) = dom.node(node) else {
            return;
        };
        if n.is_text() && !n.node_value.is_empty() {
            if parent_visible && parent.role != "textbox" {
                parent.children.push(AriaChild::Text(n.node_value.clone()));
            }
            return;
        }
        if !n.is_element() {
            return;
        }

        let visible_for_aria = !self.ctx.is_hidden_for_aria(node);
        let visible = match self.options.visibility {
            Visibility::Aria => visible_for_aria,
            Visibility::AriaOrVisible => visible_for_aria || self.ctx.is_element_visible(node),
            Visibility::AriaAndVisible => visible_for_aria && self.ctx.is_element_visible(node),
        };
        let is_iframe = dom.tag(node) == "IFRAME";
        if self.options.visibility == Visibility::Aria && !visible && !is_iframe {
            return;
        }

        let owned = self.owned_elements(node);
        match (visible || is_iframe)
            .then(|| self.to_aria_node(node))
            .flatten()
        {
            Some(mut child) => {
                if let Some(aria_ref) = &child.aria_ref {
                    self.elements.push((aria_ref.clone(), node));
                    if child.role == IFRAME_ROLE {
                        self.iframe_refs.push(aria_ref.clone());
                    }
                }
                self.process_element(&mut child, node, &owned, visible);
                parent.children.push(AriaChild::Node(child));
            }
            None => self.process_element(parent, node, &owned, visible),
        }
    }

    /// `aria-owns` targets, looked up document-wide
    fn owned_elements(&self, element: NodeId) -> SmallVec<[NodeId; 2]> {
        let dom = self.ctx.dom;
        let mut owned = SmallVec::new();
        let Some(ids) = dom.attr(element, "aria-owns") else {
            return owned;
        };
        let Some(document) = dom.owner_document(self.root_element) else {
            return owned;
        };
        for id in ids.split(is_js_whitespace).filter(|id| !id.is_empty()) {
            if let Some(target) = dom.element_by_id_in(document, id) {
                owned.push(target);
            }
        }
        owned
    }

    fn process_element(
        &mut self,
        aria_node: &mut AriaNode,
        element: NodeId,
        owned: &[NodeId],
        parent_visible: bool,
    ) {
        let dom = self.ctx.dom;
        let block = self.ctx.display(element) != "inline" || dom.tag(element) == "BR";
        if block {
            aria_node.children.push(AriaChild::Text(" ".to_string()));
        }
        let before = self.ctx.css_content(element, Some(PseudoType::Before));
        aria_node.children.push(AriaChild::Text(before.unwrap_or_default()));

        let assigned: &[NodeId] = if dom.tag(element) == "SLOT" {
            dom.assigned_nodes(element)
        } else {
            &[]
        };
        if !assigned.is_empty() {
            for &child in assigned {
                self.visit(aria_node, child, parent_visible);
            }
        } else {
            for &child in dom.children(element) {
                if dom.assigned_slot(child).is_none() {
                    self.visit(aria_node, child, parent_visible);
                }
            }
            if let Some(shadow_root) = dom.shadow_root(element) {
                for &child in dom.children(shadow_root) {
                    self.visit(aria_node, child, parent_visible);
                }
            }
        }
        for &child in owned {
            self.visit(aria_node, child, parent_visible);
        }

        let after = self.ctx.css_content(element, Some(PseudoType::After));
        aria_node.children.push(AriaChild::Text(after.unwrap_or_default()));
        if block {
            aria_node.children.push(AriaChild::Text(" ".to_string()));
        }

        if aria_node.single_text_child_equals_name() {
            aria_node.children.clear();
        }
        if aria_node.role == "link" {
            if let Some(href) = dom.attr(element, "href") {
                aria_node.props.insert("url".to_string(), href.to_string());
            }
        }
        if aria_node.role == "textbox" {
            if let Some(placeholder) = dom.attr(element, "placeholder") {
                if placeholder != aria_node.name {
                    aria_node
                        .props
                        .insert("placeholder".to_string(), placeholder.to_string());
                }
            }
        }
    }

    fn to_aria_node(&mut self, element: NodeId) -> Option<AriaNode> {
        let dom = self.ctx.dom;
        let active = dom.active_element() == Some(element);

        if dom.tag(element) == "IFRAME" {
            let element_box = self.ctx.compute_box(element);
            let mut node = AriaNode::new(IFRAME_ROLE, String::new(), element, element_box);
            node.active = active;
            self.compute_aria_ref(&mut node);
            return Some(node);
        }

        let fallback = self.options.include_generic_role.then_some("generic");
        let role = aria_role(dom, element).or(fallback)?;
        if matches!(role, "presentation" | "none") {
            return None;
        }
        let name = normalize_white_space(&self.ctx.accessible_name(element, false));
        // Boxless wrappers hand their content straight to the parent
        if role == "generic" && name.is_empty() && self.ctx.display(element) == "contents" {
            return None;
        }
        let receives_pointer_events = self.ctx.receives_pointer_events(element);
        let element_box = self.ctx.compute_box(element);

        let only_text_child = matches!(
            dom.children(element),
            [child] if dom.node(*child).is_some_and(|n| n.is_text())
        );
        if role == "generic" && element_box.inline && only_text_child {
            return None;
        }

        let mut node = AriaNode::new(role, name, element, element_box);
        node.receives_pointer_events = receives_pointer_events;
        node.active = active;
        self.compute_aria_ref(&mut node);

        if ARIA_CHECKED_ROLES.contains(&role) {
            node.checked = Some(aria_checked(dom, element));
        }
        if ARIA_DISABLED_ROLES.contains(&role) {
            node.disabled = Some(aria_disabled(dom, element));
        }
        if ARIA_EXPANDED_ROLES.contains(&role) {
            node.expanded = aria_expanded(dom, element);
        }
        if ARIA_LEVEL_ROLES.contains(&role) {
            node.level = Some(aria_level(dom, element));
        }
        if ARIA_PRESSED_ROLES.contains(&role) {
            node.pressed = Some(aria_pressed(dom, element));
        }
        if ARIA_SELECTED_ROLES.contains(&role) {
            node.selected = Some(aria_selected(dom, element));
        }

        let text_entry = match dom.tag(element) {
            "INPUT" => !matches!(dom.input_type(element), "checkbox" | "radio" | "file"),
            "TEXTAREA" => true,
            _ => false,
        };
        if text_entry {
            node.children = vec![AriaChild::Text(dom.value(element))];
        }
        Some(node)
    }

    fn compute_aria_ref(&mut self, node: &mut AriaNode) {
        match self.options.refs {
            RefPolicy::None => return,
            RefPolicy::Interactable
                if !node.element_box.visible || !node.receives_pointer_events =>
            {
                return
            }
            _ => {}
        }
        let Some(backend_id) = self.ctx.dom.node(node.element).map(|n| n.backend_node_id) else {
            return;
        };

        if let Some(aria_ref) = self.memo.lookup(backend_id, node.role, &node.name) {
            trace!("Reusing ref {} for {} {:?}", aria_ref, node.role, node.name);
            node.aria_ref = Some(aria_ref.to_string());
            return;
        }

        *self.last_ref += 1;
        let aria_ref = format!("{}e{}", self.options.ref_prefix, self.last_ref);
        trace!("Minted ref {} for {} {:?}", aria_ref, node.role, node.name);
        self.memo
            .remember(backend_id, node.role, node.name.clone(), aria_ref.clone());
        node.aria_ref = Some(aria_ref);
    }
}

/// Merge adjacent string children into single normalized strings and drop a
/// lone string child that repeats the node's name
pub fn normalize_string_children(node: &mut AriaNode) {
    fn flush(buffer: &mut String, out: &mut Vec<AriaChild>) {
        if buffer.is_empty() {
            return;
        }
        let text = normalize_white_space(buffer);
        buffer.clear();
        if !text.is_empty() {
            out.push(AriaChild::Text(text));
        }
    }

    let mut normalized = Vec::with_capacity(node.children.len());
    let mut buffer = String::new();
    for child in std::mem::take(&mut node.children) {
        match child {
            AriaChild::Text(text) => buffer.push_str(&text),
            AriaChild::Node(mut inner) => {
                flush(&mut buffer, &mut normalized);
                normalize_string_children(&mut inner);
                normalized.push(AriaChild::Node(inner));
            }
        }
    }
    flush(&mut buffer, &mut normalized);
    node.children = normalized;
    if node.single_text_child_equals_name() {
        node.children.clear();
    }
}

/// Splice out unnamed `generic` nodes whose flattened content is at most one
/// ref-bearing node
pub fn normalize_generic_roles(root: &mut AriaNode) {
    fn flatten(child: AriaChild) -> Vec<AriaChild> {
        let AriaChild::Node(mut node) = child else {
            return vec![child];
        };
        let children: Vec<AriaChild> = std::mem::take(&mut node.children)
            .into_iter()
            .flat_map(flatten)
            .collect();
        let remove_self = node.role == "generic"
            && node.name.is_empty()
            && children.len() <= 1
            && children
                .iter()
                .all(|c| c.as_node().is_some_and(|n| n.aria_ref.is_some()));
        if remove_self {
            return children;
        }
        node.children = children;
        vec![AriaChild::Node(node)]
    }

    root.children = std::mem::take(&mut root.children)
        .into_iter()
        .flat_map(flatten)
        .collect();
}
