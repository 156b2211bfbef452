//! Tree-sitter parser integration for Python
//!
//! The extractor never defines a grammar itself; it consumes the
//! declaration, parameter and annotation nodes of the tree-sitter-python tree.

use crate::core::SourceSpan;
use crate::errors::{ExtractError, Result};
use tree_sitter::{Language, Node, Parser, Tree};

/// Node kinds that confine a syntax error to a single definition
const DEFINITION_KINDS: &[&str] = &["function_definition", "class_definition", "decorated_definition"];

/// Parse Python source code into a tree-sitter tree
pub fn parse_source(content: &str, unit: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    let language: Language = tree_sitter_python::LANGUAGE.into();
    parser.set_language(&language)?;

    parser
        .parse(content, None)
        .ok_or_else(|| ExtractError::parse(unit, 1, 1, "parser produced no syntax tree"))
}

/// Reject trees whose module-level structure could not be recovered.
///
/// Syntax errors inside a top-level function or class definition are left to
/// the scanner, which skips only the affected declaration. Any other error
/// means the unit has no trustworthy structure.
pub fn check_module_structure(tree: &Tree, unit: &str) -> Result<()> {
    let root = tree.root_node();
    if root.is_error() {
        return Err(error_at(&root, unit));
    }
    if !root.has_error() {
        return Ok(());
    }

    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        let confined = DEFINITION_KINDS.contains(&child.kind()) && !child.is_error();
        if child.is_missing() || (!confined && (child.is_error() || child.has_error())) {
            let culprit = first_error(&child).unwrap_or(child);
            return Err(error_at(&culprit, unit));
        }
    }

    Ok(())
}

fn error_at(node: &Node, unit: &str) -> ExtractError {
    let message = if node.is_missing() {
        format!("missing `{}`", node.kind())
    } else {
        "invalid syntax".to_string()
    };
    ExtractError::parse(unit, node_line(node), node_column(node), message)
}

/// Find the first ERROR or MISSING node at or below `node`, in source order
pub fn first_error<'tree>(node: &Node<'tree>) -> Option<Node<'tree>> {
    if node.is_error() || node.is_missing() {
        return Some(*node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    let mut depth = 0usize;
    loop {
        let current = cursor.node();
        if current.is_error() || current.is_missing() {
            return Some(current);
        }
        if current.has_error() && cursor.goto_first_child() {
            depth += 1;
            continue;
        }
        loop {
            if depth == 0 {
                return None;
            }
            if cursor.goto_next_sibling() {
                break;
            }
            cursor.goto_parent();
            depth -= 1;
        }
    }
}

/// Get text for a tree-sitter node
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    let start = node.start_byte();
    let end = node.end_byte();
    &source[start..end]
}

/// Get the line number for a tree-sitter node (1-indexed)
pub fn node_line(node: &Node) -> usize {
    node.start_position().row + 1
}

/// Get the column number for a tree-sitter node (1-indexed)
pub fn node_column(node: &Node) -> usize {
    node.start_position().column + 1
}

/// Full 1-indexed span of a node
pub fn node_span(node: &Node) -> SourceSpan {
    let end = node.end_position();
    SourceSpan::new(node_line(node), node_column(node), end.row + 1, end.column + 1)
}

/// Node text with comments removed and whitespace collapsed
pub fn code_text(node: &Node, source: &str) -> String {
    let text = node_text(node, source);
    if !text.contains('#') {
        return collapse_whitespace(text);
    }

    let mut kept = String::with_capacity(text.len());
    let mut position = node.start_byte();
    let mut cursor = node.walk();
    let mut depth = 0usize;
    loop {
        let current = cursor.node();
        if current.kind() == "comment" {
            kept.push_str(&source[position..current.start_byte()]);
            position = current.end_byte();
        } else if cursor.goto_first_child() {
            depth += 1;
            continue;
        }
        loop {
            if depth == 0 {
                kept.push_str(&source[position..node.end_byte()]);
                return collapse_whitespace(&kept);
            }
            if cursor.goto_next_sibling() {
                break;
            }
            cursor.goto_parent();
            depth -= 1;
        }
    }
}

/// Collapse runs of whitespace (including newlines) into single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
