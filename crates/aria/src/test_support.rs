//! Fixture builder for unit tests: a document with `<html><body>` ready to
//! append to.

use crate::arena::DomArena;
use crate::types::{DomRect, NodeId};

pub(crate) struct TestDoc {
    pub dom: DomArena,
    pub body: NodeId,
}

impl TestDoc {
    pub fn new() -> Self {
        let mut dom = DomArena::new();
        let document = dom.create_document();
        let html = dom.create_element("html");
        dom.append_child(document, html).unwrap();
        let body = dom.create_element("body");
        dom.append_child(html, body).unwrap();
        Self { dom, body }
    }

    pub fn el(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = self.dom.create_element(tag);
        for (name, value) in attrs {
            self.dom.set_attribute(id, name, value).unwrap();
        }
        self.dom.append_child(parent, id).unwrap();
        id
    }

    pub fn text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.dom.create_text(text);
        self.dom.append_child(parent, id).unwrap();
        id
    }

    pub fn style(&mut self, node: NodeId, property: &str, value: &str) {
        self.dom.set_style(node, property, value).unwrap();
    }

    pub fn bounds(&mut self, node: NodeId, rect: DomRect) {
        self.dom.set_bounds(node, rect).unwrap();
    }

    pub fn shadow(&mut self, host: NodeId) -> NodeId {
        self.dom.attach_shadow(host).unwrap()
    }

    pub fn slot(&mut self, node: NodeId, slot: NodeId) {
        self.dom.assign_slot(node, slot).unwrap();
    }
}
