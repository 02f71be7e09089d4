//! The page: an element arena rooted at a synthetic document node.

use crate::fragment::{Fragment, FragmentNode};
use crate::html;
use crate::node::{ElementData, Node, NodeData, NodeId};
use crate::selector::{Combinator, Compound, Selector};
use crate::{CookieJar, DomError};

const DOCUMENT_TAG: &str = "#document";

/// A rendered page the controller reads from and writes to.
#[derive(Debug, Clone)]
pub struct Page {
    nodes: Vec<Node>,
    document: NodeId,
    cookies: CookieJar,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    /// Empty page holding only the document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Element(ElementData::new(DOCUMENT_TAG)))],
            document: NodeId(0),
            cookies: CookieJar::new(),
        }
    }

    /// Build a page from server-rendered markup.
    pub fn from_html(markup: &str) -> Result<Self, DomError> {
        let fragment = Fragment::parse(markup)?;
        let mut page = Self::new();
        let document = page.document;
        for node in &fragment.nodes {
            page.materialize(document, node);
        }
        Ok(page)
    }

    /// Builder: attach a cookie string (`document.cookie`).
    pub fn with_cookies(mut self, cookies: &str) -> Self {
        self.cookies = CookieJar::parse(cookies);
        self
    }

    pub fn document(&self) -> NodeId {
        self.document
    }

    /// The `<body>` element, or the document node for body-less fragments.
    pub fn body(&self) -> NodeId {
        self.descendants(self.document)
            .into_iter()
            .find(|&id| self.tag(id) == Some("body"))
            .unwrap_or(self.document)
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn cookies_mut(&mut self) -> &mut CookieJar {
        &mut self.cookies
    }

    // --- tree structure -------------------------------------------------

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(data));
        id
    }

    fn materialize(&mut self, parent: NodeId, node: &FragmentNode) -> NodeId {
        match node {
            FragmentNode::Text(text) => {
                let id = self.create_text(text.clone());
                self.append_child(parent, id);
                id
            }
            FragmentNode::Element {
                tag,
                attrs,
                children,
            } => {
                let id = self.push(NodeData::Element(ElementData {
                    tag: tag.clone(),
                    attrs: attrs.clone(),
                }));
                self.append_child(parent, id);
                for child in children {
                    self.materialize(id, child);
                }
                id
            }
        }
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(ElementData::new(tag)))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    /// Append `child` to `parent`, detaching it from any previous parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    /// Remove a node (and its subtree) from the document.
    pub fn remove(&mut self, node: NodeId) {
        self.detach(node);
    }

    /// Whether the node is reachable from the document.
    pub fn is_connected(&self, node: NodeId) -> bool {
        node == self.document || self.ancestors(node).last() == Some(&self.document)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Ancestors of `node`, nearest first.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(node);
        while let Some(id) = current {
            out.push(id);
            current = self.parent(id);
        }
        out
    }

    /// Descendants of `scope` in document order, excluding `scope`.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    // --- element data ---------------------------------------------------

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        self.nodes.get(node.0)?.element()
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        self.nodes.get_mut(node.0)?.element_mut()
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|el| el.tag.as_str())
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attr(name)
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.attr(node, name).is_some()
    }

    /// Set an attribute; ignored on text nodes.
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        if let Some(el) = self.element_mut(node) {
            el.set_attr(name, value);
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> Option<String> {
        self.element_mut(node)?.remove_attr(name)
    }

    /// Form control value (`value` attribute).
    pub fn value(&self, node: NodeId) -> Option<&str> {
        self.attr(node, "value")
    }

    pub fn set_value(&mut self, node: NodeId, value: impl Into<String>) {
        self.set_attr(node, "value", value);
    }

    pub fn is_checked(&self, node: NodeId) -> bool {
        self.has_attr(node, "checked")
    }

    /// Check or uncheck an input. Checking a radio unchecks the other radios
    /// sharing its `name`.
    pub fn set_checked(&mut self, node: NodeId, checked: bool) {
        if !checked {
            self.remove_attr(node, "checked");
            return;
        }
        let is_radio = self.attr(node, "type") == Some("radio");
        if let (true, Some(name)) = (is_radio, self.attr(node, "name").map(str::to_string)) {
            let group: Vec<NodeId> = self
                .descendants(self.document)
                .into_iter()
                .filter(|&id| {
                    id != node
                        && self.attr(id, "type") == Some("radio")
                        && self.attr(id, "name") == Some(name.as_str())
                })
                .collect();
            for other in group {
                self.remove_attr(other, "checked");
            }
        }
        self.set_attr(node, "checked", "");
    }

    // --- classes --------------------------------------------------------

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node).is_some_and(|el| el.has_class(class))
    }

    /// Class list of an element.
    pub fn classes(&self, node: NodeId) -> Vec<&str> {
        self.element(node)
            .map(|el| el.classes().collect())
            .unwrap_or_default()
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        self.toggle_class(node, class, true);
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        self.toggle_class(node, class, false);
    }

    /// `classList.toggle(class, force)`.
    pub fn toggle_class(&mut self, node: NodeId, class: &str, on: bool) {
        let Some(el) = self.element_mut(node) else {
            return;
        };
        let mut classes: Vec<String> = el.classes().map(str::to_string).collect();
        let present = classes.iter().any(|c| c == class);
        match (on, present) {
            (true, false) => classes.push(class.to_string()),
            (false, true) => classes.retain(|c| c != class),
            _ => return,
        }
        if classes.is_empty() {
            el.remove_attr("class");
        } else {
            el.set_attr("class", classes.join(" "));
        }
    }

    // --- text and markup ------------------------------------------------

    /// Concatenated text of the subtree.
    pub fn text_content(&self, node: NodeId) -> String {
        if let Some(NodeData::Text(text)) = self.nodes.get(node.0).map(|n| &n.data) {
            return text.clone();
        }
        self.descendants(node)
            .into_iter()
            .filter_map(|id| match &self.nodes[id.0].data {
                NodeData::Text(text) => Some(text.as_str()),
                NodeData::Element(_) => None,
            })
            .collect()
    }

    /// Replace the children of `node` with a single text node.
    pub fn set_text_content(&mut self, node: NodeId, text: impl Into<String>) {
        if let Some(Node {
            data: NodeData::Text(existing),
            ..
        }) = self.nodes.get_mut(node.0)
        {
            *existing = text.into();
            return;
        }
        self.clear_children(node);
        let text = self.create_text(text);
        self.append_child(node, text);
    }

    fn clear_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.nodes[node.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Snapshot of the children of `node`.
    pub fn fragment(&self, node: NodeId) -> Fragment {
        Fragment {
            nodes: self
                .children(node)
                .iter()
                .map(|&child| self.snapshot(child))
                .collect(),
        }
    }

    fn snapshot(&self, node: NodeId) -> FragmentNode {
        match &self.nodes[node.0].data {
            NodeData::Text(text) => FragmentNode::Text(text.clone()),
            NodeData::Element(el) => FragmentNode::Element {
                tag: el.tag.clone(),
                attrs: el.attrs.clone(),
                children: self
                    .children(node)
                    .iter()
                    .map(|&c| self.snapshot(c))
                    .collect(),
            },
        }
    }

    /// Replace the children of `node` with a copy of `fragment`.
    pub fn replace_children(&mut self, node: NodeId, fragment: &Fragment) {
        self.clear_children(node);
        for child in &fragment.nodes {
            self.materialize(node, child);
        }
    }

    /// `element.innerHTML = markup`.
    pub fn set_inner_html(&mut self, node: NodeId, markup: &str) -> Result<(), DomError> {
        let fragment = Fragment::parse(markup)?;
        self.replace_children(node, &fragment);
        Ok(())
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(node) {
            self.write_node(child, &mut out);
        }
        out
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    fn write_node(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].data {
            NodeData::Text(text) => html::escape_text(text, out),
            NodeData::Element(el) if el.tag == DOCUMENT_TAG => {
                for &child in self.children(node) {
                    self.write_node(child, out);
                }
            }
            NodeData::Element(el) => {
                html::write_open_tag(&el.tag, &el.attrs, out);
                if html::is_void(&el.tag) {
                    return;
                }
                for &child in self.children(node) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }

    // --- queries --------------------------------------------------------

    /// `document.getElementById`.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.document)
            .into_iter()
            .find(|&n| self.attr(n, "id") == Some(id))
    }

    /// Whether `node` matches `selector`.
    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        self.matches_at(node, &selector.parts, selector.parts.len() - 1)
    }

    fn matches_at(&self, node: NodeId, parts: &[(Combinator, Compound)], idx: usize) -> bool {
        let Some(el) = self.element(node) else {
            return false;
        };
        let (combinator, compound) = &parts[idx];
        if !compound.matches(el) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match combinator {
            Combinator::Child => self
                .parent(node)
                .is_some_and(|p| self.matches_at(p, parts, idx - 1)),
            Combinator::Descendant => self
                .ancestors(node)
                .into_iter()
                .any(|a| self.matches_at(a, parts, idx - 1)),
        }
    }

    /// First descendant of `scope` matching a parsed selector.
    pub fn select(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&n| self.matches(n, selector))
    }

    /// All descendants of `scope` matching a parsed selector.
    pub fn select_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| self.matches(n, selector))
            .collect()
    }

    /// `document.querySelector`.
    pub fn query(&self, selector: &str) -> Result<Option<NodeId>, DomError> {
        self.query_in(self.document, selector)
    }

    /// `document.querySelectorAll`.
    pub fn query_all(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        self.query_all_in(self.document, selector)
    }

    /// `element.querySelector`.
    pub fn query_in(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>, DomError> {
        Ok(self.select(scope, &Selector::parse(selector)?))
    }

    /// `element.querySelectorAll`.
    pub fn query_all_in(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>, DomError> {
        Ok(self.select_all(scope, &Selector::parse(selector)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body class="modal-open">
          <div id="productCarousel-7" class="carousel">
            <div class="carousel-item active"><img src="a.jpg"></div>
            <div class="carousel-item"><img src="b.jpg"></div>
            <img class="thumbnail active" src="a.jpg">
            <img class="thumbnail" src="b.jpg">
          </div>
          <form class="add-to-cart-form">
            <input type="hidden" name="csrfmiddlewaretoken" value="tok">
            <input type="number" name="quantity" value="2">
            <button class="btn btn-primary add-to-cart-detail" data-product-id="7">Ajouter au panier</button>
          </form>
          <span class="cart-count">0</span>
        </body></html>"#;

    #[test]
    fn test_query_descendant() {
        let page = Page::from_html(PAGE).unwrap();
        let thumbs = page.query_all("#productCarousel-7 .thumbnail").unwrap();
        assert_eq!(thumbs.len(), 2);
        assert!(page.has_class(thumbs[0], "active"));
    }

    #[test]
    fn test_query_in_scope() {
        let page = Page::from_html(PAGE).unwrap();
        let form = page.query(".add-to-cart-form").unwrap().unwrap();
        let qty = page
            .query_in(form, r#"input[name="quantity"]"#)
            .unwrap()
            .unwrap();
        assert_eq!(page.value(qty), Some("2"));
    }

    #[test]
    fn test_child_combinator() {
        let page = Page::from_html(PAGE).unwrap();
        assert_eq!(page.query_all("#productCarousel-7 > img").unwrap().len(), 2);
        assert_eq!(page.query_all("#productCarousel-7 img").unwrap().len(), 4);
    }

    #[test]
    fn test_class_toggle() {
        let mut page = Page::from_html(PAGE).unwrap();
        let button = page.query(".add-to-cart-detail").unwrap().unwrap();
        page.remove_class(button, "btn-primary");
        page.add_class(button, "btn-success");
        page.add_class(button, "btn-success");
        assert_eq!(page.classes(button), vec!["btn", "add-to-cart-detail", "btn-success"]);
    }

    #[test]
    fn test_inner_html_snapshot_restore() {
        let mut page = Page::from_html(PAGE).unwrap();
        let button = page.query(".add-to-cart-detail").unwrap().unwrap();
        let original = page.fragment(button);

        page.set_inner_html(button, r#"<i class="fas fa-check me-2"></i>Ajouté !"#)
            .unwrap();
        assert_eq!(page.text_content(button), "Ajouté !");
        assert_eq!(page.inner_html(button), r#"<i class="fas fa-check me-2"></i>Ajouté !"#);

        page.replace_children(button, &original);
        assert_eq!(page.inner_html(button), "Ajouter au panier");
    }

    #[test]
    fn test_remove_disconnects() {
        let mut page = Page::from_html(PAGE).unwrap();
        let count = page.query(".cart-count").unwrap().unwrap();
        assert!(page.is_connected(count));
        page.remove(count);
        assert!(!page.is_connected(count));
        assert!(page.query(".cart-count").unwrap().is_none());
    }

    #[test]
    fn test_body() {
        let page = Page::from_html(PAGE).unwrap();
        assert_eq!(page.tag(page.body()), Some("body"));
        let bare = Page::from_html("<div></div>").unwrap();
        assert_eq!(bare.body(), bare.document());
    }

    #[test]
    fn test_set_checked_radio_group() {
        let mut page = Page::from_html(
            r#"<input type="radio" name="rating" value="1" checked><input type="radio" name="rating" value="2">"#,
        )
        .unwrap();
        let radios = page.query_all("input").unwrap();
        page.set_checked(radios[1], true);
        assert!(!page.is_checked(radios[0]));
        assert!(page.is_checked(radios[1]));
    }

    #[test]
    fn test_set_text_content() {
        let mut page = Page::from_html(PAGE).unwrap();
        let count = page.query(".cart-count").unwrap().unwrap();
        page.set_text_content(count, "5");
        assert_eq!(page.text_content(count), "5");
        assert_eq!(page.outer_html(count), r#"<span class="cart-count">5</span>"#);
    }

    #[test]
    fn test_invalid_selector() {
        let page = Page::new();
        assert!(matches!(
            page.query("a["),
            Err(DomError::InvalidSelector { .. })
        ));
    }
}
