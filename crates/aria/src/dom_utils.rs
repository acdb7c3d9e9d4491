//! DOM adapter and visibility oracle
//!
//! Style resolution, box/visibility computation and the string helpers the
//! role engine builds on. All style lookups go through `AriaContext` so they
//! share the traversal caches.

use crate::arena::DomArena;
use crate::cache::TraversalCaches;
use crate::types::{DomRect, NodeId, PseudoType};
use std::rc::Rc;

/// Resolved style of one element
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub display: String,
    /// Inherited
    pub visibility: String,
    /// Inherited
    pub cursor: String,
    /// The element's own value; inheritance is resolved by walking ancestors
    pub pointer_events: Option<String>,
    pub content: Option<String>,
}

/// Geometry-derived visibility of an element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementBox {
    pub visible: bool,
    pub inline: bool,
    pub cursor: Option<String>,
    pub rect: Option<DomRect>,
}

impl ElementBox {
    pub fn has_pointer_cursor(&self) -> bool {
        self.cursor.as_deref() == Some("pointer")
    }
}

/// A borrowed document plus the traversal caches; the role engine and the
/// snapshot builder are methods on this type.
pub struct AriaContext<'a> {
    pub dom: &'a DomArena,
    pub(crate) caches: &'a mut TraversalCaches,
}

impl<'a> AriaContext<'a> {
    pub fn new(dom: &'a DomArena, caches: &'a mut TraversalCaches) -> Self {
        Self { dom, caches }
    }

    /// Run `f` inside a (possibly nested) cache scope
    pub fn with_caches<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.caches.begin();
        let result = f(self);
        self.caches.end();
        result
    }

    /// Computed style of an element, `None` when it has no stylable context
    /// (not an element, or not attached to a document)
    pub fn computed_style(&mut self, element: NodeId) -> Option<Rc<ComputedStyle>> {
        if let Some(cached) = self.caches.style.as_ref().and_then(|c| c.get(&element)) {
            return cached.clone();
        }
        let style = self.resolve_style(element).map(Rc::new);
        if let Some(cache) = self.caches.style.as_mut() {
            cache.insert(element, style.clone());
        }
        style
    }

    fn resolve_style(&mut self, element: NodeId) -> Option<ComputedStyle> {
        let dom = self.dom;
        let node = dom.node(element).filter(|n| n.is_element())?;
        dom.owner_document(element)?;

        let parent = dom
            .assigned_slot(element)
            .or_else(|| dom.parent_element_or_shadow_host(element))
            .and_then(|p| self.computed_style(p));
        let own = |property: &str| node.style_value(property).map(str::to_string);

        Some(ComputedStyle {
            display: own("display").unwrap_or_else(|| default_display(dom, element).to_string()),
            visibility: own("visibility")
                .or_else(|| parent.as_ref().map(|p| p.visibility.clone()))
                .unwrap_or_else(|| "visible".to_string()),
            cursor: own("cursor")
                .or_else(|| parent.as_ref().map(|p| p.cursor.clone()))
                .unwrap_or_else(|| "auto".to_string()),
            pointer_events: own("pointer-events"),
            content: own("content"),
        })
    }

    /// Style of a `::before` / `::after` pseudo element; always computed fresh
    pub fn pseudo_style(&mut self, element: NodeId, pseudo: PseudoType) -> Option<ComputedStyle> {
        let base = self.computed_style(element)?;
        let dom = self.dom;
        let pseudo_node = dom.pseudo_element(element, pseudo).and_then(|id| dom.node(id));
        let own = |property: &str| {
            pseudo_node
                .and_then(|n| n.style_value(property))
                .map(str::to_string)
        };
        Some(ComputedStyle {
            display: own("display").unwrap_or_else(|| "inline".to_string()),
            visibility: own("visibility").unwrap_or_else(|| base.visibility.clone()),
            cursor: own("cursor").unwrap_or_else(|| base.cursor.clone()),
            pointer_events: own("pointer-events"),
            content: own("content"),
        })
    }

    /// `display` or "inline" when the element has no style
    pub fn display(&mut self, element: NodeId) -> String {
        self.computed_style(element)
            .map(|s| s.display.clone())
            .unwrap_or_else(|| "inline".to_string())
    }

    pub fn compute_box(&mut self, element: NodeId) -> ElementBox {
        let Some(style) = self.computed_style(element) else {
            return ElementBox {
                visible: true,
                inline: false,
                cursor: None,
                rect: None,
            };
        };
        let cursor = Some(style.cursor.clone());
        let dom = self.dom;

        if style.display == "contents" {
            for &child in dom.children(element) {
                if dom.is_element(child) && self.is_element_visible(child) {
                    return ElementBox {
                        visible: true,
                        inline: false,
                        cursor,
                        rect: None,
                    };
                }
                if dom.node(child).is_some_and(|n| n.is_text()) && self.is_visible_text_node(child) {
                    return ElementBox {
                        visible: true,
                        inline: true,
                        cursor,
                        rect: None,
                    };
                }
            }
            return ElementBox {
                visible: false,
                inline: false,
                cursor,
                rect: None,
            };
        }

        if !self.is_style_visibility_visible(element, Some(&*style)) {
            return ElementBox {
                visible: false,
                inline: false,
                cursor,
                rect: None,
            };
        }

        let rect = dom.node(element).and_then(|n| n.bounds());
        let visible = match rect {
            Some(rect) => rect.has_area(),
            None => self.has_layout_box(element),
        };
        ElementBox {
            visible,
            inline: style.display == "inline",
            cursor,
            rect,
        }
    }

    pub fn is_element_visible(&mut self, element: NodeId) -> bool {
        self.compute_box(element).visible
    }

    /// `visibility: visible` and not inside a closed `<details>` (other than
    /// through its `<summary>`)
    pub fn is_style_visibility_visible(
        &mut self,
        element: NodeId,
        style: Option<&ComputedStyle>,
    ) -> bool {
        let computed;
        let style = match style {
            Some(style) => style,
            None => {
                computed = self.computed_style(element);
                match computed.as_deref() {
                    Some(style) => style,
                    None => return true,
                }
            }
        };
        if style.visibility != "visible" {
            return false;
        }
        let dom = self.dom;
        let details_or_summary =
            dom.closest(element, |d, id| matches!(d.tag(id), "DETAILS" | "SUMMARY"));
        match details_or_summary {
            Some(found) if found != element && dom.tag(found) == "DETAILS" => dom.open(found),
            _ => true,
        }
    }

    /// Whether a text node renders with a non-empty box
    pub fn is_visible_text_node(&mut self, text: NodeId) -> bool {
        let dom = self.dom;
        let Some(node) = dom.node(text) else {
            return false;
        };
        match node.bounds() {
            Some(rect) => rect.has_area(),
            None => {
                node.node_value.chars().any(|c| !is_js_whitespace(c)) && self.has_layout_box(text)
            }
        }
    }

    /// Fallback when no geometry was recorded: the node gets a box unless it
    /// or a flat-tree ancestor is `display:none` or it is an unslotted child
    /// of a shadow host
    fn has_layout_box(&mut self, node: NodeId) -> bool {
        let dom = self.dom;
        let mut current = Some(node);
        while let Some(id) = current {
            let unslotted = dom
                .parent_element(id)
                .is_some_and(|parent| dom.shadow_root(parent).is_some())
                && dom.assigned_slot(id).is_none();
            if unslotted {
                return false;
            }
            if dom.is_element(id)
                && self
                    .computed_style(id)
                    .is_some_and(|style| style.display == "none")
            {
                return false;
            }
            current = dom
                .assigned_slot(id)
                .or_else(|| dom.parent_element_or_shadow_host(id));
        }
        true
    }
}

/// User-agent stylesheet `display` for an element without a declared value
fn default_display(dom: &DomArena, element: NodeId) -> &'static str {
    if dom.has_attr(element, "hidden") {
        return "none";
    }
    match dom.tag(element) {
        "AREA" | "BASE" | "BASEFONT" | "DATALIST" | "HEAD" | "LINK" | "META" | "NOEMBED"
        | "NOFRAMES" | "NOSCRIPT" | "PARAM" | "RP" | "SCRIPT" | "STYLE" | "TEMPLATE"
        | "TITLE" => "none",
        "DIALOG" if !dom.has_attr(element, "open") => "none",
        "INPUT" if dom.input_type(element) == "hidden" => "none",
        "HTML" | "BODY" | "ADDRESS" | "ARTICLE" | "ASIDE" | "BLOCKQUOTE" | "CENTER"
        | "DD" | "DETAILS" | "DIALOG" | "DIR" | "DIV" | "DL" | "DT" | "FIELDSET"
        | "FIGCAPTION" | "FIGURE" | "FOOTER" | "FORM" | "H1" | "H2" | "H3" | "H4" | "H5"
        | "H6" | "HEADER" | "HGROUP" | "HR" | "LEGEND" | "LISTING" | "MAIN" | "MENU"
        | "NAV" | "OL" | "OPTGROUP" | "OPTION" | "P" | "PLAINTEXT" | "PRE" | "SEARCH"
        | "SECTION" | "SUMMARY" | "UL" | "XMP" => "block",
        "LI" => "list-item",
        "TABLE" => "table",
        "CAPTION" => "table-caption",
        "COLGROUP" => "table-column-group",
        "COL" => "table-column",
        "THEAD" => "table-header-group",
        "TBODY" => "table-row-group",
        "TFOOT" => "table-footer-group",
        "TR" => "table-row",
        "TD" | "TH" => "table-cell",
        "BUTTON" | "INPUT" | "METER" | "PROGRESS" | "SELECT" | "TEXTAREA" => "inline-block",
        "SLOT" => "contents",
        _ => "inline",
    }
}

/// JavaScript's `\s` class
pub fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\u{0b}'
            | '\u{0c}'
            | '\r'
            | ' '
            | '\u{a0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200a}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202f}'
            | '\u{205f}'
            | '\u{3000}'
            | '\u{feff}'
    )
}

/// Collapse whitespace inside each non-breaking-space delimited chunk, drop
/// zero-width space and soft hyphen, keep the non-breaking spaces themselves,
/// trim the ends.
pub fn normalize_white_space(text: &str) -> String {
    let chunks: Vec<String> = text
        .split('\u{a0}')
        .map(|chunk| {
            let chunk = chunk.replace("\r\n", "\n");
            let mut out = String::with_capacity(chunk.len());
            let mut in_space = false;
            for c in chunk.chars() {
                if c == '\u{200b}' || c == '\u{ad}' {
                    continue;
                }
                if is_js_whitespace(c) {
                    if !in_space {
                        out.push(' ');
                        in_space = true;
                    }
                } else {
                    out.push(c);
                    in_space = false;
                }
            }
            out
        })
        .collect();
    chunks
        .join("\u{a0}")
        .trim_matches(is_js_whitespace)
        .to_string()
}

/// `Number(text)` as JavaScript evaluates it; `None` stands for NaN
pub fn js_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_matches(is_js_whitespace);
    if trimmed.is_empty() {
        return Some(0.0);
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            if digits.is_empty() {
                return None;
            }
            return digits.chars().try_fold(0f64, |acc, c| {
                c.to_digit(radix).map(|d| acc * radix as f64 + d as f64)
            });
        }
    }

    let (sign, body) = match trimmed.as_bytes()[0] {
        b'+' => (1.0, &trimmed[1..]),
        b'-' => (-1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    if body == "Infinity" {
        return Some(sign * f64::INFINITY);
    }
    if !is_decimal_literal(body) {
        return None;
    }
    body.parse::<f64>().ok().map(|value| sign * value)
}

/// `digits [. digits] [e [+-] digits]` with at least one mantissa digit
fn is_decimal_literal(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    let mut mantissa_digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        mantissa_digits += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            mantissa_digits += 1;
        }
    }
    if mantissa_digits == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exponent_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exponent_start {
            return false;
        }
    }
    i == bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestDoc;

    #[test]
    fn test_normalize_white_space() {
        assert_eq!(normalize_white_space("  a \n\t b  "), "a b");
        assert_eq!(normalize_white_space("a\r\n\r\nb"), "a b");
        assert_eq!(normalize_white_space("soft\u{ad}hy\u{200b}phen"), "softhyphen");
        // non-breaking spaces survive, whitespace around them collapses per chunk
        assert_eq!(
            normalize_white_space("a\u{a0}\u{a0} b\n\nc"),
            "a\u{a0}\u{a0} b c"
        );
        assert_eq!(normalize_white_space("\u{a0}x\u{a0}"), "x");
    }

    #[test]
    fn test_js_number() {
        assert_eq!(js_number(""), Some(0.0));
        assert_eq!(js_number("  12 "), Some(12.0));
        assert_eq!(js_number("-1.5e2"), Some(-150.0));
        assert_eq!(js_number(".5"), Some(0.5));
        assert_eq!(js_number("5."), Some(5.0));
        assert_eq!(js_number("0x1F"), Some(31.0));
        assert_eq!(js_number("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(js_number("inf"), None);
        assert_eq!(js_number("NaN"), None);
        assert_eq!(js_number("-0x10"), None);
        assert_eq!(js_number("1e"), None);
        assert_eq!(js_number("hello"), None);
        assert_eq!(js_number("null"), None);
    }

    #[test]
    fn test_style_inheritance_and_defaults() {
        let mut doc = TestDoc::new();
        let div = doc.el(doc.body, "div", &[]);
        let span = doc.el(div, "span", &[]);
        doc.style(div, "visibility", "hidden");
        doc.style(div, "cursor", "pointer");

        let mut caches = TraversalCaches::new();
        let mut ctx = AriaContext::new(&doc.dom, &mut caches);
        let style = ctx.computed_style(span).unwrap();
        assert_eq!(style.display, "inline");
        assert_eq!(style.visibility, "hidden");
        assert_eq!(style.cursor, "pointer");
        assert_eq!(style.pointer_events, None);
        assert_eq!(ctx.display(div), "block");

        let detached = doc.dom.create_element("div");
        let mut ctx = AriaContext::new(&doc.dom, &mut caches);
        assert!(ctx.computed_style(detached).is_none());
        let detached_box = ctx.compute_box(detached);
        assert!(detached_box.visible);
        assert!(!detached_box.inline);
    }

    #[test]
    fn test_compute_box() {
        let mut doc = TestDoc::new();
        let shown = doc.el(doc.body, "span", &[]);
        doc.text(shown, "hi");
        let zero = doc.el(doc.body, "div", &[]);
        doc.bounds(zero, DomRect::zero());
        let gone = doc.el(doc.body, "div", &[]);
        doc.style(gone, "display", "none");
        let inside_gone = doc.el(gone, "p", &[]);
        let details = doc.el(doc.body, "details", &[]);
        let summary = doc.el(details, "summary", &[]);
        let body_text = doc.el(details, "p", &[]);

        let mut caches = TraversalCaches::new();
        let mut ctx = AriaContext::new(&doc.dom, &mut caches);
        let shown_box = ctx.compute_box(shown);
        assert!(shown_box.visible);
        assert!(shown_box.inline);
        assert_eq!(shown_box.cursor.as_deref(), Some("auto"));
        assert!(!ctx.compute_box(zero).visible);
        assert!(!ctx.compute_box(gone).visible);
        assert!(!ctx.compute_box(inside_gone).visible);
        assert!(ctx.compute_box(summary).visible);
        assert!(!ctx.compute_box(body_text).visible);
    }

    #[test]
    fn test_display_contents_box() {
        let mut doc = TestDoc::new();
        let empty = doc.el(doc.body, "div", &[]);
        doc.style(empty, "display", "contents");
        let with_text = doc.el(doc.body, "div", &[]);
        doc.style(with_text, "display", "contents");
        doc.text(with_text, "words");
        let with_child = doc.el(doc.body, "div", &[]);
        doc.style(with_child, "display", "contents");
        doc.el(with_child, "button", &[]);

        let mut caches = TraversalCaches::new();
        let mut ctx = AriaContext::new(&doc.dom, &mut caches);
        assert!(!ctx.compute_box(empty).visible);
        let text_box = ctx.compute_box(with_text);
        assert!(text_box.visible && text_box.inline);
        let child_box = ctx.compute_box(with_child);
        assert!(child_box.visible && !child_box.inline);
    }

    #[test]
    fn test_style_cache_only_lives_inside_scope() {
        let mut doc = TestDoc::new();
        let div = doc.el(doc.body, "div", &[]);
        let mut caches = TraversalCaches::new();
        {
            let mut ctx = AriaContext::new(&doc.dom, &mut caches);
            ctx.with_caches(|ctx| {
                ctx.computed_style(div);
                assert!(ctx.caches.style.as_ref().unwrap().contains_key(&div));
            });
        }
        assert!(caches.style.is_none());
    }

    #[test]
    fn test_pseudo_style_inherits_visibility() {
        let mut doc = TestDoc::new();
        let div = doc.el(doc.body, "div", &[]);
        doc.style(div, "visibility", "hidden");
        doc.dom
            .set_pseudo_style(div, PseudoType::Before, "content", "\"x\"")
            .unwrap();

        let mut caches = TraversalCaches::new();
        let mut ctx = AriaContext::new(&doc.dom, &mut caches);
        let before = ctx.pseudo_style(div, PseudoType::Before).unwrap();
        assert_eq!(before.display, "inline");
        assert_eq!(before.visibility, "hidden");
        assert_eq!(before.content.as_deref(), Some("\"x\""));
        let after = ctx.pseudo_style(div, PseudoType::After).unwrap();
        assert_eq!(after.content, None);
    }
}
