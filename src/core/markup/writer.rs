//! BML serialization

use super::{Document, Node, NodeId};

const INDENT: &str = "  ";

/// Serialize the children of `parent`, starting at column 0
pub(super) fn write_children(doc: &Document, parent: NodeId) -> String {
    let mut out = String::new();
    let mut stack: Vec<(NodeId, usize)> = doc
        .node(parent)
        .children()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .map(|child| (child.id(), 0))
        .collect();

    while let Some((id, depth)) = stack.pop() {
        let node = doc.node(id);
        let nested = write_line(&mut out, node, depth);
        stack.extend(nested.into_iter().rev().map(|child| (child, depth + 1)));
    }

    out
}

/// Write one node's line (plus value continuations); returns the children
/// that still need their own lines
fn write_line(out: &mut String, node: Node<'_>, depth: usize) -> Vec<NodeId> {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(node.name());

    let value = node.value();
    let multiline = value.contains('\n');

    let mut inline: Vec<Node<'_>> = node.children().filter(|child| can_inline(*child)).collect();
    let colon_form = !multiline && !value.is_empty() && (inline.is_empty() || value.contains('"'));
    if colon_form && value.contains('"') {
        inline.clear();
    }

    if !value.is_empty() && !multiline {
        if colon_form {
            out.push_str(": ");
            out.push_str(value);
        } else {
            out.push('=');
            push_inline_value(out, value);
        }
    }

    if !colon_form {
        for attribute in &inline {
            out.push(' ');
            out.push_str(attribute.name());
            if !attribute.value().is_empty() {
                out.push('=');
                push_inline_value(out, attribute.value());
            }
        }
    }
    out.push('\n');

    if multiline {
        for line in value.split('\n') {
            for _ in 0..=depth {
                out.push_str(INDENT);
            }
            out.push(':');
            if !line.is_empty() {
                out.push(' ');
                out.push_str(line);
            }
            out.push('\n');
        }
    }

    let written: Vec<NodeId> = if colon_form {
        Vec::new()
    } else {
        inline.iter().map(|n| n.id()).collect()
    };
    node.children()
        .map(|child| child.id())
        .filter(|id| !written.contains(id))
        .collect()
}

fn can_inline(node: Node<'_>) -> bool {
    node.is_attribute()
        && !node.has_children()
        && !node.value().contains('\n')
        && !node.value().contains('"')
}

fn is_bare(value: &str) -> bool {
    !value.is_empty() && !value.chars().any(|c| c.is_whitespace() || c == '"')
}

fn push_inline_value(out: &mut String, value: &str) {
    if is_bare(value) {
        out.push_str(value);
    } else {
        out.push('"');
        out.push_str(value);
        out.push('"');
    }
}

#[cfg(test)]
mod tests {
    use super::super::Document;

    #[test]
    fn test_attributes_inline() {
        let mut doc = Document::new();
        let rom = doc.append(Document::ROOT, "rom", "");
        doc.append_attribute(rom, "name", "program.rom");
        doc.append_attribute(rom, "size", "0x8000");
        let map = doc.append(rom, "map", "");
        doc.append_attribute(map, "address", "00-7f,80-ff:8000-ffff");

        assert_eq!(
            doc.to_markup(),
            "rom name=program.rom size=0x8000\n  map address=00-7f,80-ff:8000-ffff\n"
        );
    }

    #[test]
    fn test_block_values_use_colon() {
        let mut doc = Document::new();
        let info = doc.append(Document::ROOT, "information", "");
        doc.append(info, "title", "Some Game");
        doc.append(info, "note", "heuristically generated");

        assert_eq!(
            doc.to_markup(),
            "information\n  title: Some Game\n  note: heuristically generated\n"
        );
    }

    #[test]
    fn test_quoted_attribute() {
        let mut doc = Document::new();
        let board = doc.append(Document::ROOT, "board", "");
        doc.append_attribute(board, "label", "two words");

        assert_eq!(doc.to_markup(), "board label=\"two words\"\n");
    }

    #[test]
    fn test_multiline_value() {
        let mut doc = Document::new();
        doc.append(Document::ROOT, "note", "first\nsecond");

        assert_eq!(doc.to_markup(), "note\n  : first\n  : second\n");
    }

    #[test]
    fn test_round_trip_preserves_tree() {
        let text = "board type=LOROM region=NTSC\n  rom name=program.rom size=0x80000\n    map address=00-7f,80-ff:8000-ffff mask=0x8000\n  necdsp model=uPD7725 frequency=8000000\n    rom name=dsp1b.program.rom size=0x1800\ninformation\n  title: A \"quoted\" title\n  note\n    : line one\n    : line two\n";
        let doc = Document::parse(text).unwrap();
        let reparsed = Document::parse(&doc.to_markup()).unwrap();

        assert_eq!(doc, reparsed);
        assert_eq!(reparsed.root().get("information/title"), "A \"quoted\" title");
        assert_eq!(reparsed.root().get("information/note"), "line one\nline two");
    }
}
