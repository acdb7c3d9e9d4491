//! Role resolution engine
//!
//! Computes, for a single element:
//! - its ARIA role (explicit `role` token, else the implicit role of its tag,
//!   with presentation conflict resolution)
//! - its accessible name (a subset of the accessible-name computation with a
//!   visited set guarding `aria-labelledby` cycles)
//! - ARIA states: checked, disabled, expanded, level, pressed, selected
//! - whether it receives pointer events and its `::before`/`::after` text
//!
//! Role and state readers only look at the document; everything touching
//! styles goes through `AriaContext` so it shares the traversal caches.

use crate::arena::DomArena;
use crate::dom_utils::{is_js_whitespace, js_number, normalize_white_space, AriaContext};
use crate::types::{
    valid_role, NodeId, NodeType, PseudoType, ARIA_CHECKED_ROLES, ARIA_DISABLED_ROLES,
    ARIA_EXPANDED_ROLES, ARIA_LEVEL_ROLES, ARIA_PRESSED_ROLES, ARIA_SELECTED_ROLES,
    GLOBAL_ARIA_ATTRIBUTES, NAME_FROM_CONTENT_ROLES, NAME_PROHIBITED_ROLES,
};
use ahash::AHashSet;
use serde::{Serialize, Serializer};
use smallvec::SmallVec;

/// Value of `aria-checked` / `aria-pressed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AriaTristate {
    False,
    True,
    Mixed,
}

impl From<bool> for AriaTristate {
    fn from(value: bool) -> Self {
        if value {
            AriaTristate::True
        } else {
            AriaTristate::False
        }
    }
}

impl Serialize for AriaTristate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AriaTristate::False => serializer.serialize_bool(false),
            AriaTristate::True => serializer.serialize_bool(true),
            AriaTristate::Mixed => serializer.serialize_str("mixed"),
        }
    }
}

fn is_blank(text: &str) -> bool {
    text.trim_matches(is_js_whitespace).is_empty()
}

fn has_explicit_accessible_name(dom: &DomArena, element: NodeId) -> bool {
    dom.has_attr(element, "aria-label") || dom.has_attr(element, "aria-labelledby")
}

/// Containers that keep a nested header/footer from becoming a landmark
fn prevents_landmark(dom: &DomArena, element: NodeId) -> bool {
    let bare_sectioning = matches!(
        dom.tag(element),
        "ARTICLE" | "ASIDE" | "MAIN" | "NAV" | "SECTION"
    ) && !dom.has_attr(element, "role");
    bare_sectioning
        || matches!(
            dom.attr(element, "role"),
            Some("article" | "complementary" | "main" | "navigation" | "region")
        )
}

pub fn has_global_aria_attribute(dom: &DomArena, element: NodeId, for_role: Option<&str>) -> bool {
    let for_role = for_role.unwrap_or("");
    GLOBAL_ARIA_ATTRIBUTES
        .iter()
        .any(|(attr, prohibited)| !prohibited.contains(&for_role) && dom.has_attr(element, attr))
}

pub fn has_tab_index(dom: &DomArena, element: NodeId) -> bool {
    dom.attr(element, "tabindex")
        .is_some_and(|value| js_number(value).is_some())
}

pub fn is_focusable(dom: &DomArena, element: NodeId) -> bool {
    !is_natively_disabled(dom, element)
        && (is_natively_focusable(dom, element) || has_tab_index(dom, element))
}

fn is_natively_focusable(dom: &DomArena, element: NodeId) -> bool {
    match dom.tag(element) {
        "BUTTON" | "DETAILS" | "SELECT" | "TEXTAREA" => true,
        "A" | "AREA" => dom.has_attr(element, "href"),
        "INPUT" => !dom.has_attr(element, "hidden"),
        _ => false,
    }
}

fn is_natively_disabled(dom: &DomArena, element: NodeId) -> bool {
    let form_control = matches!(
        dom.tag(element),
        "BUTTON" | "INPUT" | "SELECT" | "TEXTAREA" | "OPTION" | "OPTGROUP"
    );
    form_control
        && (dom.has_attr(element, "disabled") || belongs_to_disabled_fieldset(dom, element))
}

fn belongs_to_disabled_fieldset(dom: &DomArena, element: NodeId) -> bool {
    let fieldset = dom.closest(element, |d, id| {
        d.tag(id) == "FIELDSET" && d.has_attr(id, "disabled")
    });
    let Some(fieldset) = fieldset else {
        return false;
    };
    let legend = dom
        .children(fieldset)
        .iter()
        .copied()
        .find(|id| dom.tag(*id) == "LEGEND");
    legend.map_or(true, |legend| !dom.contains(legend, element))
}

pub fn is_ignored_for_aria(dom: &DomArena, element: NodeId) -> bool {
    matches!(dom.tag(element), "STYLE" | "SCRIPT" | "NOSCRIPT" | "TEMPLATE")
}

fn aria_boolean(attr: Option<&str>) -> Option<bool> {
    attr.map(|value| value.eq_ignore_ascii_case("true"))
}

/// First valid token of the `role` attribute
pub fn explicit_role(dom: &DomArena, element: NodeId) -> Option<&'static str> {
    dom.attr(element, "role")?
        .split(' ')
        .map(|token| token.trim_matches(is_js_whitespace))
        .find_map(valid_role)
}

/// Role implied by the tag name
pub fn implicit_role(dom: &DomArena, element: NodeId) -> Option<&'static str> {
    let role = match dom.tag(element) {
        "A" | "AREA" => {
            if !dom.has_attr(element, "href") {
                return None;
            }
            "link"
        }
        "ARTICLE" => "article",
        "ASIDE" => "complementary",
        "BLOCKQUOTE" => "blockquote",
        "BUTTON" => "button",
        "CAPTION" => "caption",
        "CODE" => "code",
        "DATALIST" => "listbox",
        "DD" => "definition",
        "DEL" => "deletion",
        "DETAILS" | "FIELDSET" | "OPTGROUP" => "group",
        "DFN" | "DT" => "term",
        "DIALOG" => "dialog",
        "EM" => "emphasis",
        "FIGURE" => "figure",
        "FOOTER" | "HEADER" => {
            if dom
                .closest_cross_shadow(element, prevents_landmark, None)
                .is_some()
            {
                return None;
            }
            if dom.tag(element) == "HEADER" {
                "banner"
            } else {
                "contentinfo"
            }
        }
        "FORM" | "SECTION" => {
            if !has_explicit_accessible_name(dom, element) {
                return None;
            }
            if dom.tag(element) == "FORM" {
                "form"
            } else {
                "region"
            }
        }
        "H1" | "H2" | "H3" | "H4" | "H5" | "H6" => "heading",
        "HR" => "separator",
        "HTML" => "document",
        "IMG" => {
            let presentational = dom.attr(element, "alt") == Some("")
                && dom.attr(element, "title").unwrap_or("").is_empty()
                && !has_global_aria_attribute(dom, element, None)
                && !has_tab_index(dom, element);
            if presentational {
                "presentation"
            } else {
                "img"
            }
        }
        "INPUT" => return input_role(dom, element),
        "INS" => "insertion",
        "LI" => "listitem",
        "MAIN" => "main",
        "MARK" => "mark",
        "MATH" => "math",
        "MENU" | "OL" | "UL" => "list",
        "METER" => "meter",
        "NAV" => "navigation",
        "OPTION" => "option",
        "OUTPUT" => "status",
        "P" => "paragraph",
        "PROGRESS" => "progressbar",
        "SEARCH" => "search",
        "SELECT" => {
            if dom.has_attr(element, "multiple") || dom.select_size(element) > 1 {
                "listbox"
            } else {
                "combobox"
            }
        }
        "STRONG" => "strong",
        "SUB" => "subscript",
        "SUP" => "superscript",
        "SVG" => "img",
        "TABLE" => "table",
        "TBODY" | "TFOOT" | "THEAD" => "rowgroup",
        "TD" => {
            let table = dom.closest_cross_shadow(element, |d, id| d.tag(id) == "TABLE", None);
            match table.and_then(|table| explicit_role(dom, table)) {
                Some("grid" | "treegrid") => "gridcell",
                _ => "cell",
            }
        }
        "TEXTAREA" => "textbox",
        "TH" => match dom.attr(element, "scope") {
            Some("row" | "rowgroup") => "rowheader",
            _ => "columnheader",
        },
        "TIME" => "time",
        "TR" => "row",
        _ => return None,
    };
    Some(role)
}

fn input_role(dom: &DomArena, element: NodeId) -> Option<&'static str> {
    let role = match dom.input_type(element) {
        "search" => {
            if dom.has_attr(element, "list") {
                "combobox"
            } else {
                "searchbox"
            }
        }
        "email" | "tel" | "text" | "url" => {
            let list = dom.id_refs(element, dom.attr(element, "list")).first().copied();
            if list.is_some_and(|list| dom.tag(list) == "DATALIST") {
                "combobox"
            } else {
                "textbox"
            }
        }
        "hidden" => return None,
        "button" | "file" | "image" | "reset" | "submit" => "button",
        "checkbox" => "checkbox",
        "number" => "spinbutton",
        "radio" => "radio",
        "range" => "slider",
        _ => "textbox",
    };
    Some(role)
}

/// Explicit role, falling back to the implicit one. `none`/`presentation`
/// yields to the implicit role on focusable elements or ones carrying a
/// global ARIA attribute.
pub fn aria_role(dom: &DomArena, element: NodeId) -> Option<&'static str> {
    let Some(explicit) = explicit_role(dom, element) else {
        return implicit_role(dom, element);
    };
    if matches!(explicit, "none" | "presentation") {
        let implicit = implicit_role(dom, element);
        if has_global_aria_attribute(dom, element, implicit) || is_focusable(dom, element) {
            return implicit;
        }
    }
    Some(explicit)
}

fn role_in(dom: &DomArena, element: NodeId, roles: &[&str]) -> bool {
    roles.contains(&aria_role(dom, element).unwrap_or(""))
}

pub fn aria_checked(dom: &DomArena, element: NodeId) -> AriaTristate {
    let is_input = dom.tag(element) == "INPUT";
    if is_input && dom.indeterminate(element) {
        return AriaTristate::Mixed;
    }
    if is_input && matches!(dom.input_type(element), "checkbox" | "radio") {
        return dom.checked(element).into();
    }
    if role_in(dom, element, ARIA_CHECKED_ROLES) {
        return match dom.attr(element, "aria-checked") {
            Some("true") => AriaTristate::True,
            Some("mixed") => AriaTristate::Mixed,
            _ => AriaTristate::False,
        };
    }
    AriaTristate::False
}

pub fn aria_disabled(dom: &DomArena, element: NodeId) -> bool {
    is_natively_disabled(dom, element) || has_explicit_aria_disabled(dom, element)
}

/// `aria-disabled` on the element (if its role supports it) or, once that
/// is absent, on the nearest ancestor that sets it
fn has_explicit_aria_disabled(dom: &DomArena, element: NodeId) -> bool {
    if !role_in(dom, element, ARIA_DISABLED_ROLES) {
        return false;
    }
    let mut current = Some(element);
    while let Some(id) = current {
        match dom
            .attr(id, "aria-disabled")
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            Some("true") => return true,
            Some("false") => return false,
            _ => current = dom.parent_element_or_shadow_host(id),
        }
    }
    false
}

pub fn aria_expanded(dom: &DomArena, element: NodeId) -> Option<bool> {
    if dom.tag(element) == "DETAILS" {
        return Some(dom.open(element));
    }
    if role_in(dom, element, ARIA_EXPANDED_ROLES) {
        return dom.attr(element, "aria-expanded").map(|v| v == "true");
    }
    None
}

/// Heading level or positive `aria-level`; 0 when neither applies
pub fn aria_level(dom: &DomArena, element: NodeId) -> u32 {
    let native = match dom.tag(element) {
        "H1" => 1,
        "H2" => 2,
        "H3" => 3,
        "H4" => 4,
        "H5" => 5,
        "H6" => 6,
        _ => 0,
    };
    if native > 0 {
        return native;
    }
    if role_in(dom, element, ARIA_LEVEL_ROLES) {
        let value = dom.attr(element, "aria-level").and_then(js_number);
        // Levels past u32 read as absent
        if let Some(value) =
            value.filter(|v| v.fract() == 0.0 && (1.0..=f64::from(u32::MAX)).contains(v))
        {
            return value as u32;
        }
    }
    0
}

pub fn aria_pressed(dom: &DomArena, element: NodeId) -> AriaTristate {
    if role_in(dom, element, ARIA_PRESSED_ROLES) {
        match dom.attr(element, "aria-pressed") {
            Some("true") => return AriaTristate::True,
            Some("mixed") => return AriaTristate::Mixed,
            _ => {}
        }
    }
    AriaTristate::False
}

pub fn aria_selected(dom: &DomArena, element: NodeId) -> bool {
    if dom.tag(element) == "OPTION" {
        return dom.selected(element);
    }
    if role_in(dom, element, ARIA_SELECTED_ROLES) {
        return aria_boolean(dom.attr(element, "aria-selected")) == Some(true);
    }
    false
}

/// Elements referenced by `aria-labelledby`, `None` when nothing resolves
fn aria_labelled_by_elements(dom: &DomArena, element: NodeId) -> Option<SmallVec<[NodeId; 2]>> {
    let reference = dom.attr(element, "aria-labelledby")?;
    let refs = dom.id_refs(element, Some(reference));
    (!refs.is_empty()).then_some(refs)
}

#[derive(Debug, Clone, Copy)]
struct ReferenceEmbedding {
    /// The directly referenced label element is itself hidden
    hidden: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetEmbedding {
    Itself,
    Descendant,
}

#[derive(Debug, Clone, Copy)]
struct NameOptions {
    include_hidden: bool,
    embedded_in_labelled_by: Option<ReferenceEmbedding>,
    embedded_in_label: Option<ReferenceEmbedding>,
    embedded_in_target: Option<TargetEmbedding>,
}

impl<'a> AriaContext<'a> {
    pub fn is_hidden_for_aria(&mut self, element: NodeId) -> bool {
        let dom = self.dom;
        if is_ignored_for_aria(dom, element) {
            return true;
        }
        let style = self.computed_style(element);
        let is_slot = dom.tag(element) == "SLOT";

        if style.as_ref().is_some_and(|s| s.display == "contents") && !is_slot {
            for &child in dom.children(element) {
                match dom.node(child).map(|n| n.node_type) {
                    Some(NodeType::Element) if !self.is_hidden_for_aria(child) => return false,
                    Some(NodeType::Text) if self.is_visible_text_node(child) => return false,
                    _ => {}
                }
            }
            return true;
        }

        let option_inside_select = dom.tag(element) == "OPTION"
            && dom.closest(element, |d, id| d.tag(id) == "SELECT").is_some();
        if !option_inside_select
            && !is_slot
            && !self.is_style_visibility_visible(element, style.as_deref())
        {
            return true;
        }
        self.belongs_to_hidden_subtree(element)
    }

    /// `display:none`, `aria-hidden=true`, unslotted, or any of those on a
    /// flat-tree ancestor
    fn belongs_to_hidden_subtree(&mut self, element: NodeId) -> bool {
        if let Some(&hidden) = self.caches.is_hidden.as_ref().and_then(|c| c.get(&element)) {
            return hidden;
        }
        let dom = self.dom;
        let mut hidden = dom
            .parent_element(element)
            .is_some_and(|parent| dom.shadow_root(parent).is_some())
            && dom.assigned_slot(element).is_none();
        if !hidden {
            let style = self.computed_style(element);
            hidden = style.map_or(true, |s| s.display == "none")
                || aria_boolean(dom.attr(element, "aria-hidden")) == Some(true);
        }
        if !hidden {
            if let Some(parent) = dom.parent_element_or_shadow_host(element) {
                hidden = self.belongs_to_hidden_subtree(parent);
            }
        }
        if let Some(cache) = self.caches.is_hidden.as_mut() {
            cache.insert(element, hidden);
        }
        hidden
    }

    /// Normalized accessible name; empty for roles that prohibit naming
    pub fn accessible_name(&mut self, element: NodeId, include_hidden: bool) -> String {
        if let Some(cached) = self
            .caches
            .accessible_name
            .as_ref()
            .and_then(|c| c.get(&element))
        {
            return cached.clone();
        }

        let role = aria_role(self.dom, element).unwrap_or("");
        let name = if NAME_PROHIBITED_ROLES.contains(&role) {
            String::new()
        } else {
            let options = NameOptions {
                include_hidden,
                embedded_in_labelled_by: None,
                embedded_in_label: None,
                embedded_in_target: Some(TargetEmbedding::Itself),
            };
            let mut visited = AHashSet::new();
            normalize_white_space(&self.text_alternative(element, options, &mut visited))
        };

        if let Some(cache) = self.caches.accessible_name.as_mut() {
            cache.insert(element, name.clone());
        }
        name
    }

    fn text_alternative(
        &mut self,
        element: NodeId,
        options: NameOptions,
        visited: &mut AHashSet<NodeId>,
    ) -> String {
        if visited.contains(&element) {
            return String::new();
        }
        let dom = self.dom;
        let child_options = NameOptions {
            embedded_in_target: match options.embedded_in_target {
                Some(TargetEmbedding::Itself) => Some(TargetEmbedding::Descendant),
                other => other,
            },
            ..options
        };

        if !options.include_hidden {
            let in_hidden_reference = options.embedded_in_labelled_by.is_some_and(|e| e.hidden)
                || options.embedded_in_label.is_some_and(|e| e.hidden);
            if is_ignored_for_aria(dom, element)
                || (!in_hidden_reference && self.is_hidden_for_aria(element))
            {
                visited.insert(element);
                return String::new();
            }
        }

        let labelled_by = aria_labelled_by_elements(dom, element);
        if options.embedded_in_labelled_by.is_none() {
            if let Some(refs) = &labelled_by {
                let mut parts = Vec::with_capacity(refs.len());
                for &reference in refs {
                    let hidden = self.is_hidden_for_aria(reference);
                    let reference_options = NameOptions {
                        embedded_in_labelled_by: Some(ReferenceEmbedding { hidden }),
                        embedded_in_label: None,
                        embedded_in_target: None,
                        ..options
                    };
                    parts.push(self.text_alternative(reference, reference_options, visited));
                }
                let name = parts.join(" ");
                if !name.is_empty() {
                    return name;
                }
            }
        }

        let role = aria_role(dom, element).unwrap_or("");
        let tag = dom.tag(element);

        let aria_label = dom.attr(element, "aria-label").unwrap_or("");
        if !is_blank(aria_label) {
            visited.insert(element);
            return aria_label.to_string();
        }

        if !matches!(role, "presentation" | "none") {
            if tag == "INPUT" {
                let input_type = dom.input_type(element);
                if matches!(input_type, "button" | "submit" | "reset") {
                    visited.insert(element);
                    let value = dom.value(element);
                    if !is_blank(&value) {
                        return value;
                    }
                    return match input_type {
                        "submit" => "Submit".to_string(),
                        "reset" => "Reset".to_string(),
                        _ => dom.attr(element, "title").unwrap_or("").to_string(),
                    };
                }
                if input_type == "image" {
                    visited.insert(element);
                    for attr in ["alt", "title"] {
                        let text = dom.attr(element, attr).unwrap_or("");
                        if !is_blank(text) {
                            return text.to_string();
                        }
                    }
                    return "Submit".to_string();
                }
            }
            if tag == "IMG" {
                visited.insert(element);
                let alt = dom.attr(element, "alt").unwrap_or("");
                if !is_blank(alt) {
                    return alt.to_string();
                }
                return dom.attr(element, "title").unwrap_or("").to_string();
            }
            if labelled_by.is_none() && matches!(tag, "BUTTON" | "INPUT" | "TEXTAREA" | "SELECT") {
                let labels = dom.labels(element);
                if !labels.is_empty() {
                    visited.insert(element);
                    let mut names = Vec::with_capacity(labels.len());
                    for label in labels {
                        let hidden = self.is_hidden_for_aria(label);
                        let label_options = NameOptions {
                            embedded_in_label: Some(ReferenceEmbedding { hidden }),
                            embedded_in_labelled_by: None,
                            embedded_in_target: None,
                            ..options
                        };
                        let name = self.text_alternative(label, label_options, visited);
                        if !name.is_empty() {
                            names.push(name);
                        }
                    }
                    return names.join(" ");
                }
            }
        }

        let name_from_content = NAME_FROM_CONTENT_ROLES.contains(&role)
            || options.embedded_in_labelled_by.is_some()
            || options.embedded_in_label.is_some();
        if name_from_content {
            visited.insert(element);
            let text = self.inner_accumulated_text(element, child_options, visited);
            let significant = if options.embedded_in_target == Some(TargetEmbedding::Itself) {
                !is_blank(&text)
            } else {
                !text.is_empty()
            };
            if significant {
                return text;
            }
        }

        if !matches!(role, "presentation" | "none") || tag == "IFRAME" {
            visited.insert(element);
            let title = dom.attr(element, "title").unwrap_or("");
            if !is_blank(title) {
                return title.to_string();
            }
        }

        visited.insert(element);
        String::new()
    }

    /// Descendant text: slot-assigned nodes for a `<slot>`, otherwise light
    /// children (minus slotted ones) followed by the shadow root's children.
    /// Block-level children are padded with spaces.
    fn inner_accumulated_text(
        &mut self,
        element: NodeId,
        options: NameOptions,
        visited: &mut AHashSet<NodeId>,
    ) -> String {
        let dom = self.dom;
        let mut text = String::new();
        let assigned: &[NodeId] = if dom.tag(element) == "SLOT" {
            dom.assigned_nodes(element)
        } else {
            &[]
        };

        if !assigned.is_empty() {
            for &child in assigned {
                self.accumulate(child, false, options, visited, &mut text);
            }
        } else {
            for &child in dom.children(element) {
                self.accumulate(child, true, options, visited, &mut text);
            }
            if let Some(root) = dom.shadow_root(element) {
                for &child in dom.children(root) {
                    self.accumulate(child, true, options, visited, &mut text);
                }
            }
        }
        text
    }

    fn accumulate(
        &mut self,
        node: NodeId,
        skip_slotted: bool,
        options: NameOptions,
        visited: &mut AHashSet<NodeId>,
        out: &mut String,
    ) {
        let dom = self.dom;
        if skip_slotted && dom.assigned_slot(node).is_some() {
            return;
        }
        let Some(n) = dom.node(node) else {
            return;
        };
        match n.node_type {
            NodeType::Element => {
                let block = self.display(node) != "inline" || dom.tag(node) == "BR";
                let token = self.text_alternative(node, options, visited);
                if block {
                    out.push(' ');
                    out.push_str(&token);
                    out.push(' ');
                } else {
                    out.push_str(&token);
                }
            }
            NodeType::Text => out.push_str(&n.node_value),
            _ => {}
        }
    }

    /// First explicit `pointer-events` on the element or its flat-tree
    /// ancestors decides; every element walked caches the answer
    pub fn receives_pointer_events(&mut self, element: NodeId) -> bool {
        let dom = self.dom;
        let mut walked = SmallVec::<[NodeId; 8]>::new();
        let mut result = None;
        let mut current = Some(element);
        while let Some(id) = current {
            if let Some(&cached) = self.caches.pointer_events.as_ref().and_then(|c| c.get(&id)) {
                result = Some(cached);
                break;
            }
            walked.push(id);
            let Some(style) = self.computed_style(id) else {
                result = Some(true);
                break;
            };
            if let Some(value) = style.pointer_events.as_deref().filter(|v| !v.is_empty()) {
                result = Some(value != "none");
                break;
            }
            current = dom.parent_element_or_shadow_host(id);
        }
        let result = result.unwrap_or(true);
        if let Some(cache) = self.caches.pointer_events.as_mut() {
            for id in walked {
                cache.insert(id, result);
            }
        }
        result
    }

    /// Literal string `content` of the element or one of its pseudo
    /// elements. Non-inline pseudo content is padded with spaces.
    pub fn css_content(&mut self, element: NodeId, pseudo: Option<PseudoType>) -> Option<String> {
        let style = match pseudo {
            Some(pseudo) => self.pseudo_style(element, pseudo)?,
            None => (*self.computed_style(element)?).clone(),
        };
        let content = style.content.as_deref()?;
        if content.is_empty() || content == "none" || content == "normal" {
            return None;
        }
        if style.display == "none" || style.visibility == "hidden" {
            return None;
        }
        let inner = content.strip_prefix('"')?.strip_suffix('"')?;
        if inner.contains(['\n', '\r', '\u{2028}', '\u{2029}']) {
            return None;
        }
        let text = inner.replace("\\\"", "\"");
        if pseudo.is_some() && style.display != "inline" {
            return Some(format!(" {} ", text));
        }
        Some(text)
    }
}
