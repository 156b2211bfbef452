//! Decoding of Python literal expressions without evaluating them

use super::parser::node_text;
use serde_json::{Map, Number, Value};
use std::iter::Peekable;
use std::str::Chars;
use tree_sitter::Node;

/// Nesting limit for container literals
const MAX_LITERAL_DEPTH: usize = 64;

/// Decode the value of a Python string literal.
///
/// Handles `r`/`u`/`b` prefixes, single and triple quotes, and the Python
/// escape sequences. `\N{...}` and invalid escapes are kept verbatim.
/// f-strings return `None` because their value depends on runtime state.
pub fn decode_string_literal(text: &str) -> Option<String> {
    let prefix_len = text
        .find(|c: char| c == '"' || c == '\'')
        .filter(|&i| text[..i].chars().all(|c| "rRuUbBfF".contains(c)))?;
    let prefix = &text[..prefix_len];
    if prefix.contains(['f', 'F']) {
        return None;
    }
    let raw = prefix.contains(['r', 'R']);
    let bytes = prefix.contains(['b', 'B']);

    let quoted = &text[prefix_len..];
    let body = ["\"\"\"", "'''", "\"", "'"].iter().find_map(|quote| {
        quoted
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
            .filter(|_| quoted.len() >= 2 * quote.len())
    })?;

    if raw {
        Some(body.to_string())
    } else {
        Some(unescape(body, bytes))
    }
}

fn unescape(body: &str, bytes: bool) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escape) = chars.next() else {
            out.push('\\');
            break;
        };
        let decoded = match escape {
            // Line continuation inside the literal
            '\n' => continue,
            '\r' => {
                chars.next_if_eq(&'\n');
                continue;
            }
            '\\' | '\'' | '"' => Some(escape),
            'a' => Some('\u{07}'),
            'b' => Some('\u{08}'),
            'f' => Some('\u{0c}'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'v' => Some('\u{0b}'),
            '0'..='7' => {
                let mut value = escape.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                if bytes {
                    value &= 0xFF;
                }
                char::from_u32(value)
            }
            'x' => hex_escape(&mut chars, 2),
            'u' if !bytes => hex_escape(&mut chars, 4),
            'U' if !bytes => hex_escape(&mut chars, 8),
            _ => None,
        };
        match decoded {
            Some(decoded) => out.push(decoded),
            None => {
                out.push('\\');
                out.push(escape);
            }
        }
    }
    out
}

/// Exactly `width` hex digits naming a scalar value. Nothing is consumed
/// when the digits are missing or name a surrogate.
fn hex_escape(chars: &mut Peekable<Chars>, width: usize) -> Option<char> {
    let mut lookahead = chars.clone();
    let digits: String = lookahead.by_ref().take(width).collect();
    if digits.len() != width || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let decoded = u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32)?;
    *chars = lookahead;
    Some(decoded)
}

/// Decode the string value of a `string` or `concatenated_string` node
pub fn string_value(node: &Node, source: &str) -> Option<String> {
    match node.kind() {
        "string" => decode_string_literal(node_text(node, source)),
        "concatenated_string" => {
            let mut cursor = node.walk();
            let parts: Option<Vec<String>> = node
                .named_children(&mut cursor)
                .filter(|child| child.kind() == "string")
                .map(|child| decode_string_literal(node_text(&child, source)))
                .collect();
            parts.map(|parts| parts.concat())
        }
        _ => None,
    }
}

/// Convert a plain literal expression into JSON.
///
/// Returns `None` for anything that would need evaluation (names, calls,
/// arithmetic, comprehensions).
pub fn literal_to_json(node: &Node, source: &str) -> Option<Value> {
    literal_at(node, source, 0)
}

fn literal_at(node: &Node, source: &str, depth: usize) -> Option<Value> {
    if depth > MAX_LITERAL_DEPTH {
        return None;
    }
    match node.kind() {
        "string" | "concatenated_string" => string_value(node, source).map(Value::String),
        "integer" => parse_integer(node_text(node, source)).map(Value::from),
        "float" => parse_float(node_text(node, source)),
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        "none" => Some(Value::Null),
        "unary_operator" => {
            let operator = node.child_by_field_name("operator")?;
            let argument = node.child_by_field_name("argument")?;
            if node_text(&operator, source) != "-" {
                return None;
            }
            match argument.kind() {
                "integer" => parse_integer(node_text(&argument, source))
                    .and_then(i64::checked_neg)
                    .map(Value::from),
                "float" => parse_float(&format!("-{}", node_text(&argument, source))),
                _ => None,
            }
        }
        "parenthesized_expression" => {
            let inner = node.named_child(0)?;
            literal_at(&inner, source, depth + 1)
        }
        "list" | "tuple" => {
            let mut cursor = node.walk();
            let items: Option<Vec<Value>> = node
                .named_children(&mut cursor)
                .filter(|child| child.kind() != "comment")
                .map(|child| literal_at(&child, source, depth + 1))
                .collect();
            items.map(Value::Array)
        }
        "dictionary" => {
            let mut cursor = node.walk();
            let mut map = Map::new();
            for pair in node
                .named_children(&mut cursor)
                .filter(|child| child.kind() != "comment")
            {
                if pair.kind() != "pair" {
                    return None;
                }
                let key = pair.child_by_field_name("key")?;
                let value = pair.child_by_field_name("value")?;
                map.insert(
                    string_value(&key, source)?,
                    literal_at(&value, source, depth + 1)?,
                );
            }
            Some(Value::Object(map))
        }
        _ => None,
    }
}

/// JSON number for numeric literal text such as `-1`, `0x1F` or `2.5`
pub fn number_value(text: &str) -> Option<Value> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if let Some(integer) = parse_integer(digits) {
        let integer = if negative { integer.checked_neg()? } else { integer };
        return Some(Value::from(integer));
    }
    if negative {
        parse_float(&format!("-{digits}"))
    } else {
        parse_float(digits)
    }
}

fn parse_integer(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()
    } else {
        lower.parse().ok()
    }
}

fn parse_float(text: &str) -> Option<Value> {
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    let value: f64 = digits.parse().ok()?;
    Number::from_f64(value).map(Value::Number)
}
