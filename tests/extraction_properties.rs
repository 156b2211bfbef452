//! Property-based tests for extraction
//!
//! These tests verify invariants that should hold for all inputs:
//! - Extraction never panics, whatever the source text
//! - Parameters come out in declaration order with correct required flags
//! - Repeated extraction of the same unit is identical
//! - Optional spellings normalize alike
//! - Nesting depth, comments and string escapes never break extraction

use proptest::prelude::*;
use serde_json::json;
use std::collections::HashSet;
use toolmap::{extract, normalize_type, SourceUnit, TypeSchema};

/// Python keywords to avoid
const PYTHON_KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield", "None",
    "True", "False", "match", "case", "type", "print", "exec",
];

const ANNOTATIONS: &[&str] = &[
    "str",
    "int",
    "float",
    "bool",
    "List[str]",
    "Dict[str, int]",
    "Optional[int]",
    "int | None",
    "Set[float]",
    "Tuple[int, ...]",
    "Literal['a', 'b']",
];

/// Generate valid Python identifier (avoiding keywords)
fn python_identifier() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,12}".prop_filter("not a keyword", |s| !PYTHON_KEYWORDS.contains(&s.as_str()))
}

/// A parameter: name, annotation index and whether it has a default
fn parameter() -> impl Strategy<Value = (String, usize, bool)> {
    (python_identifier(), 0..ANNOTATIONS.len(), any::<bool>())
}

fn render_tool(name: &str, params: &[(String, usize, bool)]) -> String {
    let rendered: Vec<String> = params
        .iter()
        .map(|(param, annotation, has_default)| {
            let mut text = format!("{param}: {}", ANNOTATIONS[*annotation]);
            if *has_default {
                text.push_str(" = None");
            }
            text
        })
        .collect();
    format!(
        "@mcp.tool()\ndef {name}({}) -> str:\n    \"\"\"Generated tool.\"\"\"\n    return ''\n",
        rendered.join(", ")
    )
}

/// Drop repeated names and move defaulted parameters last, as Python requires
fn valid_parameters(mut params: Vec<(String, usize, bool)>) -> Vec<(String, usize, bool)> {
    let mut seen = HashSet::new();
    params.retain(|(name, _, _)| seen.insert(name.clone()));
    params.sort_by_key(|(_, _, has_default)| *has_default);
    params
}

proptest! {
    /// Property: arbitrary text yields a report or a parse error, never a panic
    #[test]
    fn prop_extraction_never_panics(text in "[ -~\n\t]{0,200}") {
        let unit = SourceUnit::new("fuzz.py", text);
        let _ = extract(&unit);
    }

    /// Property: parameters keep declaration order, and only parameters
    /// without a default are required
    #[test]
    fn prop_parameters_follow_signature(
        name in python_identifier(),
        params in prop::collection::vec(parameter(), 0..6)
    ) {
        let params = valid_parameters(params);
        let unit = SourceUnit::new("gen.py", render_tool(&name, &params));
        let report = extract(&unit).unwrap();

        prop_assert_eq!(report.descriptors.len(), 1);
        let descriptor = &report.descriptors[0];
        prop_assert_eq!(&descriptor.name, &name);
        prop_assert_eq!(descriptor.parameters.len(), params.len());
        for (param, (expected, annotation, has_default)) in descriptor.parameters.iter().zip(&params) {
            prop_assert_eq!(&param.name, expected);
            prop_assert_eq!(param.required, !has_default);
            prop_assert_eq!(param.annotation.as_deref(), Some(ANNOTATIONS[*annotation]));
            prop_assert!(!param.schema.is_unknown());
        }
        prop_assert_eq!(report.errors().count(), 0);
    }

    /// Property: extraction is deterministic
    #[test]
    fn prop_extraction_is_deterministic(
        name in python_identifier(),
        params in prop::collection::vec(parameter(), 0..4)
    ) {
        let params = valid_parameters(params);
        let unit = SourceUnit::new("gen.py", render_tool(&name, &params));
        prop_assert_eq!(extract(&unit).unwrap(), extract(&unit).unwrap());
    }

    /// Property: `Optional[T]`, `T | None` and `Union[T, None]` agree
    #[test]
    fn prop_optional_spellings_agree(index in 0..ANNOTATIONS.len()) {
        let inner = ANNOTATIONS[index];
        let optional = normalize_type(&format!("Optional[{inner}]")).schema;
        prop_assert_eq!(&optional, &normalize_type(&format!("{inner} | None")).schema);
        prop_assert_eq!(&optional, &normalize_type(&format!("Union[{inner}, None]")).schema);
        let is_optional = matches!(optional, TypeSchema::Optional { .. });
        prop_assert!(is_optional);
    }

    /// Property: any nesting depth yields a report; past the limit the
    /// annotation degrades to a single warning
    #[test]
    fn prop_nesting_depth_never_aborts(depth in 0usize..400) {
        let annotation = format!("{}int{}", "List[".repeat(depth), "]".repeat(depth));
        let unit = SourceUnit::new(
            "deep.py",
            format!("@mcp.tool()\ndef f(x: {annotation}) -> str:\n    pass\n"),
        );
        let report = extract(&unit).unwrap();

        prop_assert_eq!(report.descriptors.len(), 1);
        prop_assert_eq!(report.errors().count(), 0);
        if depth < 64 {
            prop_assert!(report.diagnostics.is_empty());
            prop_assert!(!report.descriptors[0].parameters[0].schema.is_unknown());
        } else {
            prop_assert_eq!(report.diagnostics.len(), 1);
        }
    }

    /// Property: a comment inside a bracketed annotation changes nothing
    #[test]
    fn prop_comments_in_annotations_are_ignored(index in 0..ANNOTATIONS.len()) {
        let annotation = ANNOTATIONS[index];
        prop_assume!(annotation.contains('['));
        let commented = annotation.replacen('[', "[  # note\n    ", 1);
        let unit = SourceUnit::new(
            "commented.py",
            format!("@mcp.tool()\ndef f(x: {commented}) -> str:\n    pass\n"),
        );
        let report = extract(&unit).unwrap();

        prop_assert!(report.diagnostics.is_empty());
        prop_assert_eq!(
            &report.descriptors[0].parameters[0].schema,
            &normalize_type(annotation).schema
        );
    }

    /// Property: `\U` escapes in defaults decode to the character they name
    #[test]
    fn prop_unicode_escapes_decode(c in any::<char>()) {
        let unit = SourceUnit::new(
            "escape.py",
            format!(
                "@mcp.tool()\ndef f(x: str = \"\\U{:08x}\") -> str:\n    pass\n",
                c as u32
            ),
        );
        let report = extract(&unit).unwrap();
        prop_assert_eq!(
            &report.descriptors[0].parameters[0].default_value,
            &Some(json!(c.to_string()))
        );
    }
}
