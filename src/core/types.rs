//! Common type definitions used across the extraction pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

use super::schema::TypeSchema;

/// One analyzable source file, already loaded by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    /// Unit identifier (usually a path or module name)
    pub id: String,
    /// Raw UTF-8 source text
    pub text: String,
}

impl SourceUnit {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Location in source code (1-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpan {
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl SourceSpan {
    pub fn new(line: usize, column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            line,
            column,
            end_line,
            end_column,
        }
    }

    /// A zero-width span at a single position
    pub fn point(line: usize, column: usize) -> Self {
        Self::new(line, column, line, column)
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Marker classification of a selected declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Tool,
    Resource,
    Prompt,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Tool => "tool",
            DeclarationKind::Resource => "resource",
            DeclarationKind::Prompt => "prompt",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a parameter binds arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ParameterKind {
    /// Regular parameter: `x`, `x: int`, `x: int = 1`
    #[default]
    Positional,
    /// Parameter after a bare `*` or `*args`
    KeywordOnly,
    /// `*args`
    VarPositional,
    /// `**kwargs`
    VarKeyword,
}

impl ParameterKind {
    pub fn is_variadic(&self) -> bool {
        matches!(self, ParameterKind::VarPositional | ParameterKind::VarKeyword)
    }
}

/// A parameter of a tool, resource or prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
    /// Declared annotation exactly as written in the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    /// Resolved type schema
    #[serde(rename = "type")]
    pub schema: TypeSchema,
    pub required: bool,
    /// Default expression captured verbatim, never evaluated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Decoded default when the expression is a plain literal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    pub description: String,
}

impl Parameter {
    /// Create a parameter without annotation or default
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Positional,
            annotation: None,
            schema: TypeSchema::Unknown,
            required: true,
            default: None,
            default_value: None,
            description: String::new(),
        }
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_kind_serializes_lowercase() {
        let json = serde_json::to_string(&DeclarationKind::Resource).unwrap();
        assert_eq!(json, "\"resource\"");
        assert_eq!(DeclarationKind::Tool.to_string(), "tool");
    }

    #[test]
    fn test_parameter_serializes_type_key() {
        let param = Parameter::new("location");
        let value = serde_json::to_value(&param).unwrap();
        assert_eq!(value["name"], "location");
        assert_eq!(value["type"]["kind"], "unknown");
        assert_eq!(value["required"], true);
        assert!(value.get("default").is_none());
    }

    #[test]
    fn test_variadic_kinds() {
        assert!(ParameterKind::VarPositional.is_variadic());
        assert!(ParameterKind::VarKeyword.is_variadic());
        assert!(!ParameterKind::KeywordOnly.is_variadic());
    }

    #[test]
    fn test_span_display() {
        assert_eq!(SourceSpan::point(3, 5).to_string(), "3:5");
    }
}
