//! Syntax-tree provider for Python source units
//!
//! Wraps tree-sitter-python: parsing, node text/position helpers, literal
//! decoding and docstring lookup.

pub mod literals;
pub mod parser;

pub use literals::{decode_string_literal, literal_to_json, number_value, string_value};
pub use parser::{
    check_module_structure, code_text, collapse_whitespace, first_error, node_column, node_line,
    node_span, node_text, parse_source,
};

use tree_sitter::Node;

/// The docstring of a `block` node: its first statement, if that statement is
/// a bare string literal
pub fn block_docstring(block: &Node, source: &str) -> Option<String> {
    let mut cursor = block.walk();
    let first = block
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment")?;
    if first.kind() != "expression_statement" || first.named_child_count() != 1 {
        return None;
    }
    let literal = first.named_child(0)?;
    string_value(&literal, source)
}

/// Render a decorator or base-class expression as a dotted path.
///
/// Calls are unwrapped to their callee (`mcp.tool()` → `mcp.tool`); anything
/// that is not a name or attribute chain yields `None`.
pub fn dotted_path(node: &Node, source: &str) -> Option<String> {
    let mut segments = Vec::new();
    let mut current = *node;
    loop {
        match current.kind() {
            "identifier" => {
                segments.push(node_text(&current, source));
                break;
            }
            "attribute" => {
                segments.push(node_text(&current.child_by_field_name("attribute")?, source));
                current = current.child_by_field_name("object")?;
            }
            "call" => current = current.child_by_field_name("function")?,
            // Subscripted bases such as `Generic[T]`
            "subscript" => current = current.child_by_field_name("value")?,
            _ => return None,
        }
    }
    segments.reverse();
    Some(segments.join("."))
}
