//! Snapshot session - the state that outlives a single snapshot
//!
//! Holds the traversal caches, the ref counter, the last-ref memo and the
//! registry of the latest snapshot. One session serves one document host.

use crate::arena::DomArena;
use crate::aria_tree::{AriaSnapshot, AriaTreeOptions, TreeBuilder};
use crate::cache::TraversalCaches;
use crate::dom_utils::AriaContext;
use crate::error::Result;
use crate::refs::{RefMemo, RefRegistry};
use crate::serializer::{render_snapshot, RenderOptions, SnapshotOutput};
use crate::types::NodeId;
use tracing::debug;

#[derive(Debug, Default)]
pub struct SnapshotSession {
    caches: TraversalCaches,
    last_ref: u32,
    memo: RefMemo,
    registry: RefRegistry,
}

impl SnapshotSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the accessibility tree of `root`
    ///
    /// Refs minted here continue the session's counter; the registry is left
    /// untouched.
    pub fn generate_aria_tree(
        &mut self,
        dom: &DomArena,
        root: NodeId,
        options: &AriaTreeOptions,
    ) -> AriaSnapshot {
        self.memo.retain_live(dom);
        let ctx = AriaContext::new(dom, &mut self.caches);
        TreeBuilder::new(ctx, options, &mut self.memo, &mut self.last_ref).build(root)
    }

    /// Build, render and publish a snapshot; its refs replace the registry
    pub fn snapshot(
        &mut self,
        dom: &DomArena,
        root: NodeId,
        tree_options: &AriaTreeOptions,
        render_options: &RenderOptions,
    ) -> SnapshotOutput {
        let snapshot = self.generate_aria_tree(dom, root, tree_options);
        self.registry.replace(dom, &snapshot.elements);
        let output = render_snapshot(&snapshot, render_options);
        debug!(
            "Snapshot complete: {} refs, {} items, {} chars",
            snapshot.elements.len(),
            output.items.len(),
            output.text.len()
        );
        output
    }

    /// Element behind a ref of the latest snapshot
    pub fn resolve_ref(&self, dom: &DomArena, ref_id: &str) -> Result<NodeId> {
        self.registry.resolve(dom, ref_id)
    }

    pub fn registry(&self) -> &RefRegistry {
        &self.registry
    }

    pub fn last_ref(&self) -> u32 {
        self.last_ref
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomError;
    use crate::test_support::TestDoc;

    fn login_form() -> (TestDoc, NodeId, NodeId) {
        let mut doc = TestDoc::new();
        let heading = doc.el(doc.body, "h1", &[]);
        doc.text(heading, "Sign in");
        let input = doc.el(doc.body, "input", &[("aria-label", "Email")]);
        let button = doc.el(doc.body, "button", &[]);
        doc.text(button, "Go");
        (doc, input, button)
    }

    #[test]
    fn test_repeated_snapshots_are_identical() {
        let (doc, _, _) = login_form();
        let mut session = SnapshotSession::new();
        let tree = AriaTreeOptions::default();
        let render = RenderOptions::default();

        let first = session.snapshot(&doc.dom, doc.body, &tree, &render);
        let second = session.snapshot(&doc.dom, doc.body, &tree, &render);
        assert_eq!(first, second);
        assert_eq!(session.last_ref(), session.registry().len() as u32);
    }

    #[test]
    fn test_body_is_first_ref_and_refs_resolve() {
        let (doc, input, button) = login_form();
        let mut session = SnapshotSession::new();
        let output = session.snapshot(
            &doc.dom,
            doc.body,
            &AriaTreeOptions::default(),
            &RenderOptions::default(),
        );

        assert_eq!(session.resolve_ref(&doc.dom, "e1").unwrap(), doc.body);
        let textbox = output.items.iter().find(|item| item.role == "textbox").unwrap();
        assert_eq!(textbox.name.as_deref(), Some("Email"));
        assert_eq!(session.resolve_ref(&doc.dom, &textbox.ref_id).unwrap(), input);

        let go = output.items.iter().find(|item| item.role == "button").unwrap();
        assert_eq!(go.heading.as_deref(), Some("Sign in"));
        assert_eq!(session.resolve_ref(&doc.dom, &go.ref_id).unwrap(), button);
        assert!(output.text.contains(&format!("button \"Go\" [ref={}]", go.ref_id)));
    }

    #[test]
    fn test_contents_wrapper_leaves_no_line() {
        let mut doc = TestDoc::new();
        let wrapper = doc.el(doc.body, "div", &[]);
        doc.style(wrapper, "display", "contents");
        let span = doc.el(wrapper, "span", &[]);
        doc.text(span, "hi");

        let mut session = SnapshotSession::new();
        let output = session.snapshot(
            &doc.dom,
            doc.body,
            &AriaTreeOptions::default(),
            &RenderOptions::default(),
        );
        assert_eq!(output.text, "- generic [ref=e1]: hi");
        assert_eq!(session.registry().len(), 1);
    }

    #[test]
    fn test_generate_does_not_publish_refs() {
        let (doc, _, _) = login_form();
        let mut session = SnapshotSession::new();
        let snapshot = session.generate_aria_tree(&doc.dom, doc.body, &AriaTreeOptions::default());

        assert!(!snapshot.elements.is_empty());
        assert!(matches!(
            session.resolve_ref(&doc.dom, "e1"),
            Err(DomError::NoSnapshot { .. })
        ));
    }

    #[test]
    fn test_removed_element_releases_its_ref() {
        let (mut doc, _, button) = login_form();
        let mut session = SnapshotSession::new();
        let tree = AriaTreeOptions::default();
        let render = RenderOptions::default();

        session.snapshot(&doc.dom, doc.body, &tree, &render);
        let go_ref = session
            .registry()
            .entries()
            .iter()
            .find(|entry| entry.node_id == button)
            .map(|entry| entry.ref_id.clone())
            .unwrap();

        doc.dom.remove_child(doc.body, button).unwrap();
        assert!(matches!(
            session.resolve_ref(&doc.dom, &go_ref),
            Err(DomError::StaleRef { .. })
        ));

        session.snapshot(&doc.dom, doc.body, &tree, &render);
        assert!(matches!(
            session.resolve_ref(&doc.dom, &go_ref),
            Err(DomError::RefNotFound { .. })
        ));
    }
}
