//! Minimal in-memory markup tree
//!
//! Page content travels through the core as a [`Fragment`]. The core only
//! needs to find elements by tag or id, read and write attributes, remove
//! subtrees and unwrap wrappers, so that is all this tree supports. Parsing
//! and real DOM access belong to the [`crate::Document`] implementation.

use std::fmt;

/// A node of a fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// An element with ordered attributes and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Sets an attribute (builder)
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Appends a child (builder)
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Appends a text child (builder)
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Tag comparison is ASCII case-insensitive, as in HTML
    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(n, _)| n == name)?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    pub fn set_children(&mut self, children: Vec<Node>) {
        self.children = children;
    }

    pub fn take_children(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.children)
    }

    /// Direct element children
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Concatenated text of all descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

/// An ordered list of top-level nodes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment {
    nodes: Vec<Node>,
}

impl Fragment {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn with_node(mut self, node: impl Into<Node>) -> Self {
        self.nodes.push(node.into());
        self
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut Vec<Node> {
        &mut self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All descendant elements with the given tag, in document order
    pub fn find_by_tag(&self, tag: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        find_by_tag(&self.nodes, tag, &mut found);
        found
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        find_by_id(&self.nodes, id)
    }

    /// First element in document order satisfying `pred`
    pub fn find(&self, pred: impl Fn(&Element) -> bool) -> Option<&Element> {
        find(&self.nodes, &pred)
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        find_by_id_mut(&mut self.nodes, id)
    }

    /// Removes every element with `tag` (and its subtree), returning them
    pub fn remove_by_tag(&mut self, tag: &str) -> Vec<Element> {
        let mut removed = Vec::new();
        remove_by_tag(&mut self.nodes, tag, &mut removed);
        removed
    }

    /// Replaces every element with `tag` by its own children
    pub fn unwrap_by_tag(&mut self, tag: &str) {
        let nodes = std::mem::take(&mut self.nodes);
        self.nodes = unwrap_by_tag(nodes, tag);
    }

    /// Visits every element in document order, stopping at the first error
    pub fn try_for_each_element_mut<E>(
        &mut self,
        f: &mut impl FnMut(&mut Element) -> Result<(), E>,
    ) -> Result<(), E> {
        try_for_each_element_mut(&mut self.nodes, f)
    }
}

impl From<Vec<Node>> for Fragment {
    fn from(nodes: Vec<Node>) -> Self {
        Self::new(nodes)
    }
}

// ============================================================================
// Tree helpers
// ============================================================================

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(&e.children, out),
        }
    }
}

fn find_by_tag<'a>(nodes: &'a [Node], tag: &str, found: &mut Vec<&'a Element>) {
    for element in nodes.iter().filter_map(Node::as_element) {
        if element.is(tag) {
            found.push(element);
        }
        find_by_tag(&element.children, tag, found);
    }
}

fn find_by_id<'a>(nodes: &'a [Node], id: &str) -> Option<&'a Element> {
    nodes.iter().filter_map(Node::as_element).find_map(|element| {
        if element.id() == Some(id) {
            Some(element)
        } else {
            find_by_id(&element.children, id)
        }
    })
}

fn find<'a>(nodes: &'a [Node], pred: &impl Fn(&Element) -> bool) -> Option<&'a Element> {
    nodes.iter().filter_map(Node::as_element).find_map(|element| {
        if pred(element) {
            Some(element)
        } else {
            find(&element.children, pred)
        }
    })
}

fn find_by_id_mut<'a>(nodes: &'a mut [Node], id: &str) -> Option<&'a mut Element> {
    for node in nodes {
        if let Node::Element(element) = node {
            if element.id() == Some(id) {
                return Some(element);
            }
            if let Some(found) = find_by_id_mut(&mut element.children, id) {
                return Some(found);
            }
        }
    }
    None
}

fn remove_by_tag(nodes: &mut Vec<Node>, tag: &str, removed: &mut Vec<Element>) {
    let mut i = 0;
    while i < nodes.len() {
        let hit = matches!(&nodes[i], Node::Element(e) if e.is(tag));
        if hit {
            if let Node::Element(element) = nodes.remove(i) {
                removed.push(element);
            }
            continue;
        }
        if let Node::Element(element) = &mut nodes[i] {
            remove_by_tag(&mut element.children, tag, removed);
        }
        i += 1;
    }
}

fn unwrap_by_tag(nodes: Vec<Node>, tag: &str) -> Vec<Node> {
    nodes
        .into_iter()
        .flat_map(|node| match node {
            Node::Element(mut element) => {
                let children = unwrap_by_tag(element.take_children(), tag);
                if element.is(tag) {
                    children
                } else {
                    element.children = children;
                    vec![Node::Element(element)]
                }
            }
            text => vec![text],
        })
        .collect()
}

fn try_for_each_element_mut<E>(
    nodes: &mut [Node],
    f: &mut impl FnMut(&mut Element) -> Result<(), E>,
) -> Result<(), E> {
    for node in nodes {
        if let Node::Element(element) = node {
            f(element)?;
            try_for_each_element_mut(&mut element.children, f)?;
        }
    }
    Ok(())
}

// ============================================================================
// Rendering
// ============================================================================

fn escape(text: &str, quote: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quote => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(t) => write!(f, "{}", escape(t, false)),
            Node::Element(e) => write!(f, "{}", e),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (name, value) in &self.attrs {
            write!(f, " {}=\"{}\"", name, escape(value, true))?;
        }
        write!(f, ">")?;
        for child in &self.children {
            write!(f, "{}", child)?;
        }
        write!(f, "</{}>", self.tag)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}
