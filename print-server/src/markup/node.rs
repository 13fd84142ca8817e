//! Markup document tree
//!
//! Parsed once from XML text and immutable afterwards. Whitespace-only text
//! between elements is dropped at parse time, so every `Text` node carries
//! printable content.

use std::collections::BTreeMap;

use super::MarkupError;

/// A node of the markup tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Element(MarkupElement),
    Text(String),
}

impl MarkupNode {
    pub fn as_element(&self) -> Option<&MarkupElement> {
        match self {
            MarkupNode::Element(e) => Some(e),
            MarkupNode::Text(_) => None,
        }
    }

    fn from_xml(node: roxmltree::Node<'_, '_>) -> Option<Self> {
        if node.is_element() {
            return Some(MarkupNode::Element(MarkupElement::from_xml(node)));
        }
        if node.is_text() {
            let text = node.text().unwrap_or_default();
            if !text.trim().is_empty() {
                return Some(MarkupNode::Text(text.to_string()));
            }
        }
        None
    }
}

/// Named element with string attributes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkupElement {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<MarkupNode>,
}

impl MarkupElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style attribute setter
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    /// Builder-style child element
    pub fn child(mut self, child: MarkupElement) -> Self {
        self.children.push(MarkupNode::Element(child));
        self
    }

    /// Builder-style text child
    pub fn text(mut self, text: &str) -> Self {
        self.children.push(MarkupNode::Text(text.to_string()));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Child elements, skipping text
    pub fn elements(&self) -> impl Iterator<Item = &MarkupElement> {
        self.children.iter().filter_map(MarkupNode::as_element)
    }

    /// First text child, trimmed; empty when there is none
    pub fn inner_text(&self) -> &str {
        self.children
            .iter()
            .find_map(|c| match c {
                MarkupNode::Text(t) => Some(t.trim()),
                MarkupNode::Element(_) => None,
            })
            .unwrap_or("")
    }

    fn from_xml(node: roxmltree::Node<'_, '_>) -> Self {
        Self {
            name: node.tag_name().name().to_string(),
            attributes: node
                .attributes()
                .map(|a| (a.name().to_string(), a.value().to_string()))
                .collect(),
            children: node.children().filter_map(MarkupNode::from_xml).collect(),
        }
    }
}

/// A whole markup document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkupDocument {
    nodes: Vec<MarkupNode>,
}

impl MarkupDocument {
    /// Document from already-built top-level nodes
    pub fn new(nodes: Vec<MarkupNode>) -> Self {
        Self { nodes }
    }

    /// Parse XML text
    pub fn parse(xml: &str) -> Result<Self, MarkupError> {
        if xml.trim().is_empty() {
            return Ok(Self::default());
        }

        let doc = match roxmltree::Document::parse(xml) {
            Ok(doc) => doc,
            Err(roxmltree::Error::NoRootNode) => return Ok(Self::default()),
            Err(e) => return Err(MarkupError::Malformed(e.to_string())),
        };

        Ok(Self {
            nodes: vec![MarkupNode::Element(MarkupElement::from_xml(
                doc.root_element(),
            ))],
        })
    }

    /// First top-level element
    pub fn root(&self) -> Option<&MarkupElement> {
        self.nodes.iter().find_map(MarkupNode::as_element)
    }
}

impl From<MarkupElement> for MarkupDocument {
    fn from(root: MarkupElement) -> Self {
        Self::new(vec![MarkupNode::Element(root)])
    }
}
