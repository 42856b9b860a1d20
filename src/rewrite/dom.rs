//! Narrow DOM capability used by the link rewriters
//!
//! The rewriters only ever select elements, read and write attributes, replace the
//! text of `<style>` blocks, append to `<head>` and serialize. Keeping that surface
//! behind a trait leaves them independent of the parser backing it.

use kuchiki::traits::TendrilSink;
use kuchiki::{ElementData, NodeDataRef, NodeRef};

/// A parsed, mutable HTML document
pub trait HtmlDocument {
    type Element: HtmlElement;

    /// Returns every element matching a CSS selector, in document order
    ///
    /// An invalid selector matches nothing.
    fn select(&self, selector: &str) -> Vec<Self::Element>;

    /// Parses `html` and appends the resulting nodes to `<head>`
    ///
    /// Returns false when the document has no head.
    fn append_to_head(&self, html: &str) -> bool;

    /// Serializes the document back to HTML
    fn serialize(&self) -> String;
}

/// An element of an [`HtmlDocument`]
pub trait HtmlElement {
    /// Returns an attribute value
    fn attr(&self, name: &str) -> Option<String>;

    /// Sets (or adds) an attribute value
    fn set_attr(&self, name: &str, value: &str);

    /// Returns the concatenated text content
    fn text(&self) -> String;

    /// Replaces all children with a single text node
    fn set_text(&self, text: &str);
}

/// [`HtmlDocument`] backed by kuchiki
pub struct KuchikiDocument {
    root: NodeRef,
}

impl KuchikiDocument {
    /// Parses a complete HTML document
    pub fn parse(html: &str) -> Self {
        Self {
            root: kuchiki::parse_html().one(html),
        }
    }
}

impl HtmlDocument for KuchikiDocument {
    type Element = KuchikiElement;

    fn select(&self, selector: &str) -> Vec<Self::Element> {
        match self.root.select(selector) {
            Ok(matches) => matches.map(KuchikiElement).collect(),
            Err(()) => {
                tracing::warn!("Ignoring invalid selector: {}", selector);
                Vec::new()
            }
        }
    }

    fn append_to_head(&self, html: &str) -> bool {
        let Some(head) = self.select("head").into_iter().next() else {
            return false;
        };

        let fragment = kuchiki::parse_html().one(html);
        let nodes: Vec<NodeRef> = fragment
            .select("head > *, body > *")
            .map(|matches| matches.map(|m| m.as_node().clone()).collect())
            .unwrap_or_default();

        for node in nodes {
            head.0.as_node().append(node);
        }
        true
    }

    fn serialize(&self) -> String {
        let mut output = Vec::new();
        match self.root.serialize(&mut output) {
            Ok(()) => String::from_utf8_lossy(&output).into_owned(),
            Err(e) => {
                tracing::warn!("Failed to serialize document: {}", e);
                String::new()
            }
        }
    }
}

/// Element handle of a [`KuchikiDocument`]
pub struct KuchikiElement(NodeDataRef<ElementData>);

impl HtmlElement for KuchikiElement {
    fn attr(&self, name: &str) -> Option<String> {
        self.0.attributes.borrow().get(name).map(str::to_string)
    }

    fn set_attr(&self, name: &str, value: &str) {
        self.0
            .attributes
            .borrow_mut()
            .insert(name, value.to_string());
    }

    fn text(&self) -> String {
        self.0.text_contents()
    }

    fn set_text(&self, text: &str) {
        let node = self.0.as_node();
        let children: Vec<NodeRef> = node.children().collect();
        for child in children {
            child.detach();
        }
        node.append(NodeRef::new_text(text));
    }
}
