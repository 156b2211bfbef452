use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Root configuration structure for toolmap
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ToolmapConfig {
    /// Decorator names that select declarations
    #[serde(default)]
    pub markers: MarkerConfig,

    /// Docstring section headers and style
    #[serde(default)]
    pub docstring: DocstringConfig,

    /// Declaration selection options
    #[serde(default)]
    pub scan: ScanConfig,
}

impl ToolmapConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.markers.validate()?;
        self.docstring.validate()
    }
}

/// Marker vocabulary.
///
/// A marker without a dot matches the last segment of the decorator path
/// (`tool` matches `@mcp.tool()` and `@tool`); a dotted marker must match the
/// whole path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarkerConfig {
    #[serde(default = "default_tool_markers")]
    pub tool: Vec<String>,

    #[serde(default = "default_resource_markers")]
    pub resource: Vec<String>,

    #[serde(default = "default_prompt_markers")]
    pub prompt: Vec<String>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            tool: default_tool_markers(),
            resource: default_resource_markers(),
            prompt: default_prompt_markers(),
        }
    }
}

impl MarkerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let sets = [
            ("tool", &self.tool),
            ("resource", &self.resource),
            ("prompt", &self.prompt),
        ];

        for (label, names) in sets {
            if names.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "markers.{label} must name at least one marker"
                )));
            }
            if let Some(blank) = names.iter().find(|n| n.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "markers.{label} contains a blank marker name {blank:?}"
                )));
            }
        }

        for (i, (label, names)) in sets.iter().enumerate() {
            for (other_label, other) in &sets[i + 1..] {
                if let Some(shared) = names.iter().find(|n| other.contains(n)) {
                    return Err(ConfigError::Invalid(format!(
                        "marker '{shared}' is listed for both {label} and {other_label}"
                    )));
                }
            }
        }

        Ok(())
    }
}

pub fn default_tool_markers() -> Vec<String> {
    vec!["tool".to_string()]
}

pub fn default_resource_markers() -> Vec<String> {
    vec!["resource".to_string()]
}

pub fn default_prompt_markers() -> Vec<String> {
    vec!["prompt".to_string()]
}

/// Declared docstring convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocstringStyle {
    /// Detect per docstring
    #[default]
    Auto,
    Google,
    Numpy,
    Sphinx,
}

/// Docstring section headers, matched case-insensitively without the colon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocstringConfig {
    #[serde(default)]
    pub style: DocstringStyle,

    #[serde(default = "default_parameter_headers")]
    pub parameter_headers: Vec<String>,

    #[serde(default = "default_returns_headers")]
    pub returns_headers: Vec<String>,

    #[serde(default = "default_example_headers")]
    pub example_headers: Vec<String>,

    /// Headers whose sections are recognized but not extracted
    #[serde(default = "default_ignored_headers")]
    pub ignored_headers: Vec<String>,
}

impl Default for DocstringConfig {
    fn default() -> Self {
        Self {
            style: DocstringStyle::default(),
            parameter_headers: default_parameter_headers(),
            returns_headers: default_returns_headers(),
            example_headers: default_example_headers(),
            ignored_headers: default_ignored_headers(),
        }
    }
}

impl DocstringConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.parameter_headers.is_empty() {
            return Err(ConfigError::Invalid(
                "docstring.parameter_headers must not be empty".to_string(),
            ));
        }
        if self.returns_headers.is_empty() {
            return Err(ConfigError::Invalid(
                "docstring.returns_headers must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn default_parameter_headers() -> Vec<String> {
    vec!["Args".to_string(), "Parameters".to_string()]
}

pub fn default_returns_headers() -> Vec<String> {
    vec!["Returns".to_string()]
}

pub fn default_example_headers() -> Vec<String> {
    vec!["Example".to_string(), "Examples".to_string()]
}

pub fn default_ignored_headers() -> Vec<String> {
    [
        "Raises",
        "Yields",
        "Note",
        "Notes",
        "Attributes",
        "Warning",
        "Warnings",
        "See Also",
        "References",
        "Todo",
        "Keyword Args",
        "Other Parameters",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Declaration selection options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanConfig {
    /// Keep marked definitions whose name starts with `_`
    #[serde(default = "default_include_private")]
    pub include_private: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include_private: default_include_private(),
        }
    }
}

pub fn default_include_private() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ToolmapConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.markers.tool, vec!["tool"]);
        assert_eq!(config.markers.resource, vec!["resource"]);
        assert_eq!(config.docstring.parameter_headers, vec!["Args", "Parameters"]);
        assert_eq!(config.docstring.style, DocstringStyle::Auto);
    }

    #[test]
    fn test_overlapping_markers_rejected() {
        let mut config = ToolmapConfig::default();
        config.markers.resource.push("tool".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("both tool and resource"));
    }

    #[test]
    fn test_empty_marker_set_rejected() {
        let mut config = ToolmapConfig::default();
        config.markers.prompt.clear();
        assert!(config.validate().is_err());
    }
}
