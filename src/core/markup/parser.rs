//! BML parsing
//!
//! Grammar, per line:
//! - `name` optionally followed by `=value`, `="quoted value"` or `: rest of line`
//! - then inline attributes `key`, `key=value`, `key="quoted value"`
//! - `: text` on a deeper line continues the previous node's value
//! - `//` starts a comment (whole line, or after the attributes)
//!
//! Indentation (spaces or tabs) decides nesting.

use super::{Document, NodeId};
use crate::error::{ImportError, Result};

/// One parsed line before it is attached to the tree
#[derive(Debug, Default, PartialEq, Eq)]
struct Line<'a> {
    name: &'a str,
    value: String,
    attributes: Vec<(&'a str, String)>,
}

pub(super) fn parse(text: &str) -> Result<Document> {
    let mut doc = Document::new();
    // (indent, node) for the chain of currently open nodes
    let mut open: Vec<(usize, NodeId)> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim_end();
        let content = line.trim_start_matches([' ', '\t']);
        if content.is_empty() || content.starts_with("//") {
            continue;
        }
        let indent = line.len() - content.len();

        if let Some(rest) = content.strip_prefix(':') {
            let &(owner_indent, owner) = open
                .last()
                .ok_or_else(|| ImportError::markup(line_no, "value continuation without a node"))?;
            if indent <= owner_indent {
                return Err(ImportError::markup(
                    line_no,
                    "value continuation must be indented below its node",
                ));
            }
            doc.push_value_line(owner, rest.strip_prefix(' ').unwrap_or(rest));
            continue;
        }

        while open.last().is_some_and(|&(open_indent, _)| open_indent >= indent) {
            open.pop();
        }
        let parent = open.last().map(|&(_, id)| id).unwrap_or(Document::ROOT);

        let parsed = parse_line(content).map_err(|reason| ImportError::markup(line_no, reason))?;
        let node = doc.append(parent, parsed.name, parsed.value);
        for (name, value) in parsed.attributes {
            doc.append_attribute(node, name, value);
        }
        open.push((indent, node));
    }

    Ok(doc)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '+')
}

fn take_name(input: &str) -> (&str, &str) {
    let end = input.find(|c: char| !is_name_char(c)).unwrap_or(input.len());
    input.split_at(end)
}

/// Parse a value following `=`; returns the value and the remaining input
fn take_value(input: &str) -> std::result::Result<(String, &str), String> {
    if let Some(quoted) = input.strip_prefix('"') {
        let end = quoted
            .find('"')
            .ok_or_else(|| "unterminated quoted value".to_string())?;
        Ok((quoted[..end].to_string(), &quoted[end + 1..]))
    } else {
        let end = input.find(char::is_whitespace).unwrap_or(input.len());
        Ok((input[..end].to_string(), &input[end..]))
    }
}

fn parse_line(content: &str) -> std::result::Result<Line<'_>, String> {
    let (name, mut rest) = take_name(content);
    if name.is_empty() {
        return Err(format!("invalid node name near '{}'", content));
    }
    let mut line = Line {
        name,
        ..Line::default()
    };

    if let Some(after) = rest.strip_prefix(':') {
        line.value = after.trim().to_string();
        return Ok(line);
    }
    if let Some(after) = rest.strip_prefix('=') {
        let (value, remaining) = take_value(after)?;
        line.value = value;
        rest = remaining;
    }

    loop {
        let trimmed = rest.trim_start();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            break;
        }
        if trimmed.len() == rest.len() {
            return Err(format!("expected whitespace before '{}'", trimmed));
        }

        let (key, after) = take_name(trimmed);
        if key.is_empty() {
            return Err(format!("invalid attribute name near '{}'", trimmed));
        }

        if let Some(after) = after.strip_prefix(':') {
            line.attributes.push((key, after.trim().to_string()));
            break;
        } else if let Some(after) = after.strip_prefix('=') {
            let (value, remaining) = take_value(after)?;
            line.attributes.push((key, value));
            rest = remaining;
        } else {
            line.attributes.push((key, String::new()));
            rest = after;
        }
    }

    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_forms() {
        let line = parse_line("rom name=program.rom size=0x8000").unwrap();
        assert_eq!(line.name, "rom");
        assert_eq!(line.value, "");
        assert_eq!(
            line.attributes,
            vec![("name", "program.rom".to_string()), ("size", "0x8000".to_string())]
        );

        let line = parse_line("title:   Some Game  ").unwrap();
        assert_eq!(line.value, "Some Game");
        assert!(line.attributes.is_empty());

        let line = parse_line("board=\"two words\" battery").unwrap();
        assert_eq!(line.value, "two words");
        assert_eq!(line.attributes, vec![("battery", String::new())]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_line("=value").is_err());
        assert!(parse_line("rom name=\"open").is_err());
        assert!(parse_line("rom name=a\"b\"c").is_ok());
        assert!(parse_line("rom \"x\"").is_err());
        assert!(parse_line("rom name=\"a\"b").is_err());
    }

    #[test]
    fn test_nesting_by_indent() {
        let doc = parse(
            "board type=LOROM\n  rom name=program.rom\n    map address=00-3f:8000-ffff\n  ram name=save.ram\ninformation\n\ttitle: Tabbed\n",
        )
        .unwrap();
        let root = doc.root();

        let top: Vec<&str> = root.children().map(|n| n.name()).collect();
        assert_eq!(top, vec!["board", "information"]);
        assert_eq!(root.get("board/rom/map/address"), "00-3f:8000-ffff");
        assert_eq!(root.get("board/ram/name"), "save.ram");
        assert_eq!(root.get("information/title"), "Tabbed");
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let doc = parse(
            "// header comment\n\nboard type=HIROM // trailing\n\n  rom name=program.rom\n",
        )
        .unwrap();
        assert_eq!(doc.root().get("board/type"), "HIROM");
        assert_eq!(doc.root().get("board/rom/name"), "program.rom");
    }

    #[test]
    fn test_continuation_lines() {
        let doc = parse("note: first\n  : second\n  :\n  : fourth\n").unwrap();
        assert_eq!(doc.root().get("note"), "first\nsecond\n\nfourth");
    }

    #[test]
    fn test_continuation_errors() {
        let err = parse(": orphan\n").unwrap_err();
        assert!(matches!(err, ImportError::Markup { line: 1, .. }));

        let err = parse("note\n: not indented\n").unwrap_err();
        assert!(matches!(err, ImportError::Markup { line: 2, .. }));
    }
}
