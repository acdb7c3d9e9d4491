//! Snapshot serializer - Convert an `AriaSnapshot` to LLM-friendly text
//!
//! This module handles:
//! - The indented YAML-like tree (`- role "name" [state] [ref=eN]:`)
//! - YAML scalar quoting for keys and values
//! - The flat list of ref-bearing nodes grouped by heading
//! - Interactive-only pruning and output truncation

use crate::aria_tree::{AriaChild, AriaNode, AriaSnapshot, FRAGMENT_ROLE};
use crate::dom_utils::{is_js_whitespace, js_number};
use crate::roles::AriaTristate;
use serde::{Deserialize, Serialize};

/// Names longer than this (in UTF-16 units) are left out of the rendered key
const MAX_RENDERED_NAME_LENGTH: usize = 900;

pub const DEFAULT_MAX_ITEMS: usize = 80;

/// Output cap used by [`RenderOptions::compact`]
pub const DEFAULT_MAX_CHARS: usize = 8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    #[default]
    Tree,
    List,
}

/// Serializer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub render_active: bool,
    pub render_cursor_pointer: bool,
    pub format: SnapshotFormat,
    /// Tree format only: drop text and every subtree without a ref
    pub interactive_only: bool,
    /// Keep named headings when pruning; group list items under them
    pub include_headings: bool,
    pub max_items: usize,
    pub max_chars: Option<usize>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            render_active: true,
            render_cursor_pointer: true,
            format: SnapshotFormat::Tree,
            interactive_only: false,
            include_headings: true,
            max_items: DEFAULT_MAX_ITEMS,
            max_chars: None,
        }
    }
}

impl RenderOptions {
    /// Interactive-only ref list capped at [`DEFAULT_MAX_CHARS`], the shape
    /// agent tools ask for
    pub fn compact() -> Self {
        Self {
            format: SnapshotFormat::List,
            interactive_only: true,
            max_chars: Some(DEFAULT_MAX_CHARS),
            ..Self::default()
        }
    }

    fn item_limit(&self) -> usize {
        if self.max_items == 0 {
            DEFAULT_MAX_ITEMS
        } else {
            self.max_items
        }
    }

    fn char_limit(&self) -> Option<usize> {
        self.max_chars.filter(|limit| *limit > 0)
    }
}

/// A ref-bearing node in flat form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotItem {
    #[serde(rename = "ref")]
    pub ref_id: String,
    pub role: String,
    pub name: Option<String>,
    /// Most recent named heading before this node
    pub heading: Option<String>,
    pub disabled: bool,
    #[serde(
        default,
        serialize_with = "serialize_tristate",
        deserialize_with = "deserialize_tristate"
    )]
    pub checked: Option<AriaTristate>,
    pub expanded: bool,
    pub selected: bool,
    #[serde(
        default,
        serialize_with = "serialize_tristate",
        deserialize_with = "deserialize_tristate"
    )]
    pub pressed: Option<AriaTristate>,
    pub active: bool,
    pub cursor_pointer: bool,
}

fn serialize_tristate<S: serde::Serializer>(
    value: &Option<AriaTristate>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(state) => state.serialize(serializer),
        None => serializer.serialize_none(),
    }
}

fn deserialize_tristate<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<AriaTristate>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(true)) => Some(AriaTristate::True),
        Some(serde_json::Value::Bool(false)) => Some(AriaTristate::False),
        Some(serde_json::Value::String(s)) if s == "mixed" => Some(AriaTristate::Mixed),
        _ => None,
    })
}

/// Rendered snapshot plus its ref-bearing nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotOutput {
    pub text: String,
    pub items: Vec<SnapshotItem>,
}

/// Render a snapshot in the configured format
pub fn render_snapshot(snapshot: &AriaSnapshot, options: &RenderOptions) -> SnapshotOutput {
    let items = collect_items(&snapshot.root, options);
    let text = match options.format {
        SnapshotFormat::List => {
            let truncated = items.len() >= options.item_limit();
            build_list_yaml(&items, options, truncated)
        }
        SnapshotFormat::Tree if options.interactive_only => {
            let pruned = prune_interactive(snapshot.root.clone(), options.include_headings)
                .unwrap_or_else(|| AriaNode::fragment(snapshot.root.element));
            truncate(render_aria_tree(&pruned, options), options.char_limit())
        }
        SnapshotFormat::Tree => {
            truncate(render_aria_tree(&snapshot.root, options), options.char_limit())
        }
    };
    SnapshotOutput { text, items }
}

/// Render the tree; a fragment root renders only its children
pub fn render_aria_tree(root: &AriaNode, options: &RenderOptions) -> String {
    let mut lines = Vec::new();
    if root.role == FRAGMENT_ROLE {
        for child in &root.children {
            match child {
                AriaChild::Text(text) => render_text(text, "", &mut lines),
                AriaChild::Node(node) => {
                    render_node(node, "", options.render_cursor_pointer, options, &mut lines)
                }
            }
        }
    } else {
        render_node(root, "", options.render_cursor_pointer, options, &mut lines);
    }
    lines.join("\n")
}

fn render_text(text: &str, indent: &str, lines: &mut Vec<String>) {
    lines.push(format!("{}- text: {}", indent, yaml_escape_value_if_needed(text)));
}

fn render_node(
    node: &AriaNode,
    indent: &str,
    render_cursor_pointer: bool,
    options: &RenderOptions,
    lines: &mut Vec<String>,
) {
    let key = format!(
        "{}- {}",
        indent,
        yaml_escape_key_if_needed(&create_key(node, render_cursor_pointer, options))
    );

    if node.children.is_empty() && node.props.is_empty() {
        lines.push(key);
        return;
    }
    if let ([AriaChild::Text(text)], true) = (node.children.as_slice(), node.props.is_empty()) {
        lines.push(format!("{}: {}", key, yaml_escape_value_if_needed(text)));
        return;
    }

    lines.push(format!("{}:", key));
    for (name, value) in &node.props {
        lines.push(format!(
            "{}  - /{}: {}",
            indent,
            name,
            yaml_escape_value_if_needed(value)
        ));
    }
    let child_indent = format!("{}  ", indent);
    let in_cursor_pointer =
        node.aria_ref.is_some() && render_cursor_pointer && node.element_box.has_pointer_cursor();
    for child in &node.children {
        match child {
            AriaChild::Text(text) => render_text(text, &child_indent, lines),
            AriaChild::Node(child) => render_node(
                child,
                &child_indent,
                render_cursor_pointer && !in_cursor_pointer,
                options,
                lines,
            ),
        }
    }
}

fn create_key(node: &AriaNode, render_cursor_pointer: bool, options: &RenderOptions) -> String {
    let mut key = node.role.to_string();
    if !node.name.is_empty() && node.name.encode_utf16().count() <= MAX_RENDERED_NAME_LENGTH {
        key.push(' ');
        if node.name.starts_with('/') && node.name.ends_with('/') {
            key.push_str(&node.name);
        } else {
            key.push_str(&json_quote(&node.name));
        }
    }
    match node.checked {
        Some(AriaTristate::Mixed) => key.push_str(" [checked=mixed]"),
        Some(AriaTristate::True) => key.push_str(" [checked]"),
        _ => {}
    }
    if node.disabled == Some(true) {
        key.push_str(" [disabled]");
    }
    if node.expanded == Some(true) {
        key.push_str(" [expanded]");
    }
    if node.active && options.render_active {
        key.push_str(" [active]");
    }
    if let Some(level) = node.level.filter(|level| *level > 0) {
        key.push_str(&format!(" [level={}]", level));
    }
    match node.pressed {
        Some(AriaTristate::Mixed) => key.push_str(" [pressed=mixed]"),
        Some(AriaTristate::True) => key.push_str(" [pressed]"),
        _ => {}
    }
    if node.selected == Some(true) {
        key.push_str(" [selected]");
    }
    if let Some(aria_ref) = &node.aria_ref {
        key.push_str(&format!(" [ref={}]", aria_ref));
        if render_cursor_pointer && node.element_box.has_pointer_cursor() {
            key.push_str(" [cursor=pointer]");
        }
    }
    key
}

fn json_quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

/// Ref-bearing nodes in document order, at most `max_items`
pub fn collect_items(root: &AriaNode, options: &RenderOptions) -> Vec<SnapshotItem> {
    let limit = options.item_limit();
    let mut items = Vec::new();
    let mut heading: Option<&str> = None;

    let mut stack: Vec<&AriaNode> = if root.role == FRAGMENT_ROLE {
        root.children.iter().rev().filter_map(AriaChild::as_node).collect()
    } else {
        vec![root]
    };
    while let Some(node) = stack.pop() {
        if options.include_headings && node.role == "heading" && !node.name.is_empty() {
            heading = Some(node.name.as_str());
        }
        if let Some(aria_ref) = &node.aria_ref {
            items.push(SnapshotItem {
                ref_id: aria_ref.clone(),
                role: node.role.to_string(),
                name: (!node.name.is_empty()).then(|| node.name.clone()),
                heading: heading.map(str::to_string),
                disabled: node.disabled == Some(true),
                checked: node.checked,
                expanded: node.expanded == Some(true),
                selected: node.selected == Some(true),
                pressed: node.pressed,
                active: node.active,
                cursor_pointer: node.element_box.has_pointer_cursor(),
            });
            if items.len() >= limit {
                break;
            }
        }
        stack.extend(node.children.iter().rev().filter_map(AriaChild::as_node));
    }
    items
}

/// Flat list rendering, items grouped under `- heading "…"` lines
pub fn build_list_yaml(items: &[SnapshotItem], options: &RenderOptions, truncated: bool) -> String {
    let mut lines = Vec::with_capacity(items.len() + 1);
    let mut current_heading: Option<&str> = None;

    for item in items {
        if let Some(heading) = item.heading.as_deref().filter(|h| !h.is_empty()) {
            if current_heading != Some(heading) {
                lines.push(format!("- heading {}", json_quote(heading)));
                current_heading = Some(heading);
            }
        }
        let indent = if current_heading.is_some() { "  " } else { "" };
        let name = match item.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => format!(" name={}", json_quote(name)),
            None => String::new(),
        };

        let mut suffix = format!(" [ref={}]", item.ref_id);
        if item.disabled {
            suffix.push_str(" [disabled]");
        }
        match item.checked {
            Some(AriaTristate::Mixed) => suffix.push_str(" [checked=mixed]"),
            Some(AriaTristate::True) => suffix.push_str(" [checked]"),
            _ => {}
        }
        if item.expanded {
            suffix.push_str(" [expanded]");
        }
        if item.selected {
            suffix.push_str(" [selected]");
        }
        match item.pressed {
            Some(AriaTristate::Mixed) => suffix.push_str(" [pressed=mixed]"),
            Some(AriaTristate::True) => suffix.push_str(" [pressed]"),
            _ => {}
        }
        if item.active {
            suffix.push_str(" [active]");
        }
        if item.cursor_pointer {
            suffix.push_str(" [cursor=pointer]");
        }
        lines.push(format!("{}- {}{}{}", indent, item.role, name, suffix));
    }
    if truncated {
        lines.push(format!(
            "- [...] truncated (max_items={})",
            options.item_limit()
        ));
    }

    let text = lines.join("\n");
    match options.char_limit() {
        Some(limit) if utf16_len(&text) > limit => format!(
            "{}\n- [...] truncated (max_chars={})",
            utf16_prefix(&text, limit.saturating_sub(40)),
            limit
        ),
        _ => text,
    }
}

/// Drop text and every node that has no ref, no surviving child and is not
/// a named heading (when headings are kept)
pub fn prune_interactive(mut node: AriaNode, include_headings: bool) -> Option<AriaNode> {
    node.children = std::mem::take(&mut node.children)
        .into_iter()
        .filter_map(|child| match child {
            AriaChild::Node(inner) => prune_interactive(inner, include_headings).map(AriaChild::Node),
            AriaChild::Text(_) => None,
        })
        .collect();
    let keep = node.aria_ref.is_some()
        || !node.children.is_empty()
        || (include_headings && node.role == "heading" && !node.name.is_empty());
    keep.then_some(node)
}

/// Cut `text` so that, with the truncation marker, it fits `max_chars`
pub fn truncate(text: String, max_chars: Option<usize>) -> String {
    let Some(limit) = max_chars else {
        return text;
    };
    if utf16_len(&text) <= limit {
        return text;
    }
    let suffix = format!("\n- [...] truncated (max_chars={})", limit);
    let keep = limit.saturating_sub(suffix.len());
    format!("{}{}", utf16_prefix(&text, keep), suffix)
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Longest prefix of `text` that is at most `units` UTF-16 units long
fn utf16_prefix(text: &str, units: usize) -> &str {
    let mut used = 0;
    for (index, c) in text.char_indices() {
        used += c.len_utf16();
        if used > units {
            return &text[..index];
        }
    }
    text
}

/// Whether a scalar must be quoted to read back as the same string
pub fn yaml_string_needs_quotes(text: &str) -> bool {
    let Some(first) = text.chars().next() else {
        return true;
    };
    if is_js_whitespace(first) || text.chars().last().is_some_and(is_js_whitespace) {
        return true;
    }
    let has_control = text.chars().any(|c| {
        matches!(c, '\u{00}'..='\u{08}' | '\u{0b}' | '\u{0c}' | '\u{0e}'..='\u{1f}' | '\u{7f}'..='\u{9f}')
    });
    if has_control || first == '-' {
        return true;
    }

    let chars: Vec<char> = text.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        let next = chars.get(i + 1).copied();
        if matches!(c, '\n' | ':') && next.map_or(true, is_js_whitespace) {
            return true;
        }
        if is_js_whitespace(*c) && next == Some('#') {
            return true;
        }
    }

    if text.contains(['\n', '\r', '{', '}', '`']) {
        return true;
    }
    if matches!(
        first,
        '&' | '*' | ']' | ',' | '?' | '!' | '>' | '|' | '@' | '"' | '\'' | '#' | '%' | '['
    ) {
        return true;
    }
    if js_number(text).is_some() {
        return true;
    }
    matches!(
        text.to_lowercase().as_str(),
        "y" | "n" | "yes" | "no" | "true" | "false" | "on" | "off" | "null"
    )
}

/// Single-quote a key, doubling embedded single quotes
pub fn yaml_escape_key_if_needed(text: &str) -> String {
    if !yaml_string_needs_quotes(text) {
        return text.to_string();
    }
    format!("'{}'", text.replace('\'', "''"))
}

/// Double-quote a value with backslash escapes
pub fn yaml_escape_value_if_needed(text: &str) -> String {
    if !yaml_string_needs_quotes(text) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{00}'..='\u{1f}' | '\u{7f}'..='\u{9f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32))
            }
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
