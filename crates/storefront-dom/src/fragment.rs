//! Detached markup snapshots.

use crate::html;
use crate::DomError;

/// A node of a detached fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentNode {
    /// An element with its attributes and children.
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<FragmentNode>,
    },
    /// A text run (unescaped).
    Text(String),
}

impl FragmentNode {
    /// Element node without children.
    pub fn element(tag: impl Into<String>) -> Self {
        Self::Element {
            tag: tag.into().to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Builder: add an attribute (element nodes only).
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Self::Element { attrs, .. } = &mut self {
            attrs.push((name.into(), value.into()));
        }
        self
    }

    /// Builder: append a child (element nodes only).
    pub fn with_child(mut self, child: FragmentNode) -> Self {
        if let Self::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }
}

/// An ordered list of detached nodes, the unit of `innerHTML` save/restore.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment {
    pub nodes: Vec<FragmentNode>,
}

impl Fragment {
    /// Empty fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse markup into a fragment.
    pub fn parse(markup: &str) -> Result<Self, DomError> {
        html::parse(markup)
    }

    /// Builder: append a node.
    pub fn with(mut self, node: FragmentNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Serialize back to markup.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            html::write_fragment_node(node, &mut out);
        }
        out
    }

    /// Whether the fragment has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
