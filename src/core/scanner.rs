//! ROM segment extraction from a manifest's board tree

use crate::core::markup::Document;
use std::path::{Component, Path};

/// Suffix marking a node as a ROM segment
pub const SEGMENT_SUFFIX: &str = ".rom";

/// One named, sized chunk of a cartridge image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub size: u64,
}

impl Segment {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Segment {
            name: name.into(),
            size,
        }
    }

    /// Program and data ROM always come from the assembled buffer
    pub fn is_program_or_data(&self) -> bool {
        self.name == "program.rom" || self.name == "data.rom"
    }

    /// True when the name is one file name with no directory part
    ///
    /// Absolute names, `..` and separators would place the file outside the
    /// package.
    pub fn has_plain_name(&self) -> bool {
        if self.name.contains('\\') {
            return false;
        }
        let mut components = Path::new(&self.name).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        )
    }
}

/// Collect the segments below the document's `board` node
///
/// Walks the board subtree in document order, at any depth. A node is a
/// segment when its `name` child ends in `.rom`; its `size` child is read as
/// a natural number (0 when absent or malformed). Documents without a board
/// yield no segments.
pub fn scan(document: &Document) -> Vec<Segment> {
    let board = match document.find_id(Document::ROOT, "board") {
        Some(board) => board,
        None => return Vec::new(),
    };

    let mut segments = Vec::new();
    let mut stack = vec![board];
    while let Some(id) = stack.pop() {
        let node = document.node(id);
        let name = node.get("name");
        if name.ends_with(SEGMENT_SUFFIX) {
            let size = node.find("size").map(|size| size.natural()).unwrap_or(0);
            segments.push(Segment::new(name, size));
        }
        // Reversed so the leftmost child is visited first
        let children: Vec<_> = node.children().map(|child| child.id()).collect();
        stack.extend(children.into_iter().rev());
    }
    segments
}
