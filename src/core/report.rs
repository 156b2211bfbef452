//! Extraction output: descriptors and diagnostics for one source unit

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

use super::schema::TypeSchema;
use super::types::{DeclarationKind, Parameter, SourceSpan};

/// Return value of a descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Returns {
    #[serde(rename = "type")]
    pub schema: TypeSchema,
    pub description: String,
}

/// Normalized metadata for one tool, resource or prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub kind: DeclarationKind,
    pub name: String,
    pub description: String,
    pub parameters: Vec<Parameter>,
    pub returns: Returns,
    /// Resource URI (or URI template) given to the marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    pub is_async: bool,
    /// Signature line as written, whitespace collapsed
    pub signature: String,
    pub location: SourceSpan,
}

impl Descriptor {
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|p| p.required)
    }

    /// MCP `inputSchema` for this descriptor.
    ///
    /// Variadic parameters are left out: they have no named slot in a JSON
    /// arguments object.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in self.parameters.iter().filter(|p| !p.kind.is_variadic()) {
            let mut property = param.schema.to_json_schema();
            if let Value::Object(ref mut fields) = property {
                if !param.description.is_empty() {
                    fields.insert(
                        "description".to_string(),
                        Value::String(param.description.clone()),
                    );
                }
                if let Some(default) = &param.default_value {
                    fields.insert("default".to_string(), default.clone());
                }
            }
            properties.insert(param.name.clone(), property);
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Non-fatal issue found while extracting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<SourceSpan>,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            declaration_name: None,
            span: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            declaration_name: None,
            span: None,
        }
    }

    pub fn for_declaration(mut self, name: impl Into<String>) -> Self {
        self.declaration_name = Some(name.into());
        self
    }

    pub fn at(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(span) = &self.span {
            write!(f, " [{span}]")?;
        }
        if let Some(name) = &self.declaration_name {
            write!(f, " {name}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Complete output of one extraction call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    pub unit: String,
    /// Descriptors in source declaration order
    pub descriptors: Vec<Descriptor>,
    pub diagnostics: Vec<Diagnostic>,
    /// Imported modules whose name mentions `mcp`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mcp_imports: Vec<String>,
}

impl ExtractionReport {
    pub fn descriptor(&self, name: &str) -> Option<&Descriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn tools(&self) -> impl Iterator<Item = &Descriptor> {
        self.of_kind(DeclarationKind::Tool)
    }

    pub fn resources(&self) -> impl Iterator<Item = &Descriptor> {
        self.of_kind(DeclarationKind::Resource)
    }

    pub fn prompts(&self) -> impl Iterator<Item = &Descriptor> {
        self.of_kind(DeclarationKind::Prompt)
    }

    fn of_kind(&self, kind: DeclarationKind) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.iter().filter(move |d| d.kind == kind)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ParameterKind;

    fn sample_descriptor() -> Descriptor {
        let mut location = Parameter::new("location");
        location.schema = TypeSchema::string();
        location.description = "The location".into();

        let mut units = Parameter::new("units");
        units.schema = TypeSchema::string();
        units.required = false;
        units.default = Some("\"celsius\"".into());
        units.default_value = Some(json!("celsius"));

        let mut rest = Parameter::new("extra");
        rest.kind = ParameterKind::VarKeyword;
        rest.required = false;

        Descriptor {
            kind: DeclarationKind::Tool,
            name: "get_weather".into(),
            description: "Get weather.".into(),
            parameters: vec![location, units, rest],
            returns: Returns::default(),
            uri: None,
            examples: vec![],
            is_async: false,
            signature: "def get_weather(location: str, units: str = \"celsius\")".into(),
            location: SourceSpan::new(1, 1, 3, 10),
        }
    }

    #[test]
    fn test_input_schema() {
        let schema = sample_descriptor().input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["location"]));
        assert_eq!(schema["properties"]["location"]["description"], "The location");
        assert_eq!(schema["properties"]["units"]["default"], "celsius");
        assert!(schema["properties"].get("extra").is_none());
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic::warning("duplicate declaration name 'dup'")
            .for_declaration("dup")
            .at(SourceSpan::point(4, 1));
        assert_eq!(
            diagnostic.to_string(),
            "warning [4:1] dup: duplicate declaration name 'dup'"
        );
    }

    #[test]
    fn test_report_filters() {
        let report = ExtractionReport {
            unit: "server.py".into(),
            descriptors: vec![sample_descriptor()],
            diagnostics: vec![Diagnostic::error("declaration skipped")],
            mcp_imports: vec![],
        };
        assert_eq!(report.tools().count(), 1);
        assert_eq!(report.resources().count(), 0);
        assert!(report.has_errors());
        assert_eq!(report.warnings().count(), 0);
        assert!(report.descriptor("get_weather").is_some());
    }

    #[test]
    fn test_diagnostic_serializes_declaration_name() {
        let value = serde_json::to_value(Diagnostic::warning("x").for_declaration("dup")).unwrap();
        assert_eq!(value["severity"], "warning");
        assert_eq!(value["declarationName"], "dup");
    }
}
