//! Metadata documents
//!
//! Cartridge descriptions are trees of named nodes, each carrying a free-text
//! value and ordered children. The textual form is BML: one node per line,
//! nesting by indentation, with `key=value` attributes written inline.
//!
//! ```text
//! board type=LOROM region=NTSC
//!   rom name=program.rom size=0x80000
//!   ram name=save.ram size=0x2000
//! information
//!   title:  Example
//!   sha256: 9f86d081...
//! ```
//!
//! Nodes live in a flat arena addressed by [`NodeId`]; children are index
//! lists. Traversals walk explicit stacks instead of recursing, so a deeply
//! nested document cannot exhaust the call stack.

mod parser;
mod writer;

use crate::error::Result;

/// Index of a node inside a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NodeData {
    name: String,
    value: String,
    /// Written inline on the parent's line (`key=value`)
    attribute: bool,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(name: String, value: String, attribute: bool) -> Self {
        NodeData {
            name,
            value,
            attribute,
            children: Vec::new(),
        }
    }
}

/// Arena-backed metadata tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// The unnamed root every top-level node hangs from
    pub const ROOT: NodeId = NodeId(0);

    /// Create an empty document
    pub fn new() -> Self {
        Document {
            nodes: vec![NodeData::new(String::new(), String::new(), false)],
        }
    }

    /// Parse BML text
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Markup` with the offending line number for
    /// malformed input.
    pub fn parse(text: &str) -> Result<Self> {
        parser::parse(text)
    }

    /// Serialize the whole document to BML
    pub fn to_markup(&self) -> String {
        writer::write_children(self, Self::ROOT)
    }

    /// Serialize the children of `id` as a standalone document
    pub fn subtree_markup(&self, id: NodeId) -> String {
        writer::write_children(self, id)
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the document has no nodes besides the root
    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    pub fn root(&self) -> Node<'_> {
        self.node(Self::ROOT)
    }

    /// View a node
    ///
    /// `id` must come from this document.
    pub fn node(&self, id: NodeId) -> Node<'_> {
        Node { doc: self, id }
    }

    /// Append a child line under `parent`
    pub fn append(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> NodeId {
        self.push(parent, NodeData::new(name.into(), value.into(), false))
    }

    /// Append an inline attribute under `parent`
    pub fn append_attribute(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> NodeId {
        self.push(parent, NodeData::new(name.into(), value.into(), true))
    }

    fn push(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Replace a node's value
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) {
        self.nodes[id.0].value = value.into();
    }

    pub(crate) fn push_value_line(&mut self, id: NodeId, line: &str) {
        let value = &mut self.nodes[id.0].value;
        if !value.is_empty() {
            value.push('\n');
        }
        value.push_str(line);
    }

    /// First node along a `/`-separated path of child names
    pub fn find_id(&self, from: NodeId, path: &str) -> Option<NodeId> {
        let mut current = from;
        for name in path.split('/').filter(|s| !s.is_empty()) {
            current = *self.nodes[current.0]
                .children
                .iter()
                .find(|child| self.nodes[child.0].name == name)?;
        }
        Some(current)
    }

    /// Set the value at `path` below `from`, creating missing nodes
    ///
    /// Existing nodes keep their position; only the value is overwritten.
    pub fn set(&mut self, from: NodeId, path: &str, value: impl Into<String>) -> NodeId {
        let mut current = from;
        for name in path.split('/').filter(|s| !s.is_empty()) {
            current = match self.find_id(current, name) {
                Some(id) => id,
                None => self.append(current, name, ""),
            };
        }
        self.set_value(current, value);
        current
    }

    /// Copy the children of `source_parent` in `other` under `parent`
    pub fn graft(&mut self, parent: NodeId, other: &Document, source_parent: NodeId) {
        let mut pending: Vec<(NodeId, NodeId)> = other.nodes[source_parent.0]
            .children
            .iter()
            .rev()
            .map(|&child| (parent, child))
            .collect();

        while let Some((target, source)) = pending.pop() {
            let data = &other.nodes[source.0];
            let copied = self.push(
                target,
                NodeData::new(data.name.clone(), data.value.clone(), data.attribute),
            );
            pending.extend(data.children.iter().rev().map(|&child| (copied, child)));
        }
    }

    /// Pre-order list of every node below `from` (excluding `from`)
    pub fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[from.0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev());
        }
        order
    }
}

/// Borrowed view of one node
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> Node<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        &self.doc.nodes[self.id.0].name
    }

    /// Raw value, untrimmed
    pub fn value(&self) -> &'a str {
        &self.doc.nodes[self.id.0].value
    }

    /// Value with surrounding whitespace removed
    pub fn text(&self) -> &'a str {
        self.value().trim()
    }

    /// Value as an unsigned integer
    ///
    /// Accepts `0x`, `0b` and `0o` prefixes as well as plain decimal.
    /// Absent or malformed values read as 0.
    pub fn natural(&self) -> u64 {
        parse_natural(self.text()).unwrap_or(0)
    }

    pub fn is_attribute(&self) -> bool {
        self.doc.nodes[self.id.0].attribute
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let doc = self.doc;
        doc.nodes[self.id.0]
            .children
            .iter()
            .map(move |&id| Node { doc, id })
    }

    pub fn has_children(&self) -> bool {
        !self.doc.nodes[self.id.0].children.is_empty()
    }

    /// First node along a `/`-separated path
    pub fn find(&self, path: &str) -> Option<Node<'a>> {
        self.doc.find_id(self.id, path).map(|id| Node { doc: self.doc, id })
    }

    /// Trimmed text at `path`, or "" when absent
    pub fn get(&self, path: &str) -> &'a str {
        self.find(path).map(|node| node.text()).unwrap_or("")
    }
}

/// Parse an unsigned integer with an optional radix prefix
pub fn parse_natural(text: &str) -> Option<u64> {
    let text = text.trim();
    let hex = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"));
    let (digits, radix) = if let Some(rest) = hex {
        (rest, 16)
    } else if let Some(rest) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        (rest, 2)
    } else if let Some(rest) = text.strip_prefix("0o").or_else(|| text.strip_prefix("0O")) {
        (rest, 8)
    } else {
        (text, 10)
    };
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}
