//! Docstring parsing
//!
//! Three conventions are understood: Google (`Args:` sections), NumPy
//! (underlined `Parameters` sections) and Sphinx (`:param x:` fields). With
//! [`DocstringStyle::Auto`] the convention is detected per docstring.

pub mod clean;
mod google;
mod numpy;
mod sphinx;

pub use clean::cleandoc;

use crate::config::{DocstringConfig, DocstringStyle};
use crate::syntax::collapse_whitespace;
use crate::types::parse_type_expr;
use std::collections::HashMap;
use tracing::trace;

/// One documented parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocParam {
    /// Name with `*`/`**` stripped
    pub name: String,
    /// Type written in the docstring, informational only
    pub type_hint: Option<String>,
    pub description: String,
}

/// Documented return value
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocReturns {
    pub type_hint: Option<String>,
    pub description: String,
}

/// Structured content of one docstring
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedDocstring {
    /// Convention the docstring was parsed with
    pub style: Option<DocstringStyle>,
    pub description: String,
    pub params: Vec<DocParam>,
    pub returns: Option<DocReturns>,
    pub examples: Vec<String>,
    pub warnings: Vec<String>,
}

impl ParsedDocstring {
    pub fn param(&self, name: &str) -> Option<&DocParam> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Record a parameter entry; the first entry for a name wins
    pub(crate) fn push_param(&mut self, mut param: DocParam) {
        param.name = param.name.trim_start_matches('*').to_string();
        param.description = collapse_whitespace(&param.description);
        if self.param(&param.name).is_some() {
            self.warnings.push(format!(
                "parameter `{}` is documented more than once; keeping the first entry",
                param.name
            ));
            return;
        }
        self.params.push(param);
    }

    pub(crate) fn set_description(&mut self, lines: &[&str]) {
        self.description = collapse_whitespace(&lines.join(" "));
    }

    pub(crate) fn push_example(&mut self, lines: &[&str]) {
        let text = lines.join("\n");
        let text = cleandoc(&text);
        if !text.is_empty() {
            self.examples.push(text);
        }
    }
}

/// Section kinds shared by all conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Section {
    Description,
    Parameters,
    Returns,
    Examples,
    Ignored,
}

/// Classifies section titles against the configured headers
#[derive(Debug, Clone, Copy)]
pub(crate) struct Headers<'a> {
    config: &'a DocstringConfig,
}

impl<'a> Headers<'a> {
    pub(crate) fn new(config: &'a DocstringConfig) -> Self {
        Self { config }
    }

    pub(crate) fn classify(&self, title: &str) -> Option<Section> {
        let title = title.trim();
        let matches = |headers: &[String]| headers.iter().any(|h| h.eq_ignore_ascii_case(title));
        if matches(&self.config.parameter_headers) {
            Some(Section::Parameters)
        } else if matches(&self.config.returns_headers) {
            Some(Section::Returns)
        } else if matches(&self.config.example_headers) {
            Some(Section::Examples)
        } else if matches(&self.config.ignored_headers) {
            Some(Section::Ignored)
        } else {
            None
        }
    }
}

/// Split `Type: text` when `Type` parses as a type expression
pub(crate) fn split_typed_text(text: &str) -> (Option<String>, String) {
    if let Some((prefix, rest)) = text.split_once(':') {
        let prefix = prefix.trim();
        if !prefix.is_empty() && parse_type_expr(prefix).is_ok() {
            return (Some(prefix.to_string()), rest.trim().to_string());
        }
    }
    (None, text.trim().to_string())
}

/// Pick the convention of a cleaned docstring
pub fn detect_style(cleaned: &str) -> DocstringStyle {
    let lines: Vec<&str> = cleaned.lines().collect();
    let underlined = lines.windows(2).any(|pair| {
        let underline = pair[1].trim();
        !pair[0].trim().is_empty() && underline.len() >= 3 && underline.chars().all(|c| c == '-')
    });
    if underlined {
        return DocstringStyle::Numpy;
    }
    let sphinx = lines.iter().any(|line| {
        let line = line.trim_start();
        [":param", ":return", ":rtype", ":type"]
            .iter()
            .any(|field| line.starts_with(field))
    });
    if sphinx {
        DocstringStyle::Sphinx
    } else {
        DocstringStyle::Google
    }
}

/// Parses docstrings according to the configured convention
pub struct DocstringParser<'a> {
    config: &'a DocstringConfig,
}

impl<'a> DocstringParser<'a> {
    pub fn new(config: &'a DocstringConfig) -> Self {
        Self { config }
    }

    /// Parse a raw docstring. An absent or blank docstring yields empty
    /// content and no warnings.
    pub fn parse(&self, raw: Option<&str>) -> ParsedDocstring {
        let cleaned = raw.map(cleandoc).unwrap_or_default();
        if cleaned.is_empty() {
            return ParsedDocstring::default();
        }

        let style = match self.config.style {
            DocstringStyle::Auto => detect_style(&cleaned),
            declared => declared,
        };
        let headers = Headers::new(self.config);
        let mut parsed = match style {
            DocstringStyle::Numpy => numpy::parse(&cleaned, headers),
            DocstringStyle::Sphinx => sphinx::parse(&cleaned, headers),
            DocstringStyle::Google | DocstringStyle::Auto => google::parse(&cleaned, headers),
        };
        parsed.style = Some(style);
        trace!(
            ?style,
            params = parsed.params.len(),
            examples = parsed.examples.len(),
            "Parsed docstring"
        );
        parsed
    }
}

/// Documented parameters matched against the signature
#[derive(Debug, Clone, Default)]
pub struct ParameterDocs<'d> {
    by_name: HashMap<&'d str, &'d DocParam>,
    pub warnings: Vec<String>,
}

impl<'d> ParameterDocs<'d> {
    pub fn get(&self, name: &str) -> Option<&'d DocParam> {
        self.by_name.get(name).copied()
    }
}

/// Pair documented parameters with signature names. Documented names that
/// are not in the signature are dropped with a warning; undocumented
/// parameters are silent.
pub fn match_parameters<'d>(parsed: &'d ParsedDocstring, names: &[&str]) -> ParameterDocs<'d> {
    let mut docs = ParameterDocs::default();
    for param in &parsed.params {
        if names.contains(&param.name.as_str()) {
            docs.by_name.insert(param.name.as_str(), param);
        } else {
            docs.warnings.push(format!(
                "documented parameter `{}` not in signature",
                param.name
            ));
        }
    }
    docs
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn parse(raw: &str) -> ParsedDocstring {
        let config = DocstringConfig::default();
        DocstringParser::new(&config).parse(Some(raw))
    }

    #[test]
    fn test_absent_docstring() {
        let config = DocstringConfig::default();
        let parser = DocstringParser::new(&config);
        assert_eq!(parser.parse(None), ParsedDocstring::default());
        assert_eq!(parser.parse(Some("  \n  ")), ParsedDocstring::default());
    }

    #[test]
    fn test_detect_style() {
        assert_eq!(detect_style("Summary.\n\nArgs:\n    x: y"), DocstringStyle::Google);
        assert_eq!(
            detect_style("Summary.\n\nParameters\n----------\nx : int"),
            DocstringStyle::Numpy
        );
        assert_eq!(detect_style("Summary.\n\n:param x: y"), DocstringStyle::Sphinx);
        assert_eq!(detect_style("Just text."), DocstringStyle::Google);
    }

    #[test]
    fn test_declared_style_overrides_detection() {
        let config = DocstringConfig {
            style: DocstringStyle::Google,
            ..DocstringConfig::default()
        };
        let parsed = DocstringParser::new(&config).parse(Some("Text.\n\n:param x: the x"));
        assert_eq!(parsed.style, Some(DocstringStyle::Google));
        assert!(parsed.params.is_empty());
    }

    #[test]
    fn test_split_typed_text() {
        assert_eq!(
            split_typed_text("Dict[str, Any]: Weather information"),
            (Some("Dict[str, Any]".into()), "Weather information".into())
        );
        assert_eq!(
            split_typed_text("List of search results with title and URL"),
            (None, "List of search results with title and URL".into())
        );
        assert_eq!(
            split_typed_text("The result: a value"),
            (None, "The result: a value".into())
        );
    }

    #[test]
    fn test_duplicate_documentation_keeps_first() {
        let parsed = parse(indoc! {"
            Summary.

            Args:
                x: First.
                x: Second.
        "});
        assert_eq!(parsed.params.len(), 1);
        assert_eq!(parsed.params[0].description, "First.");
        assert_eq!(parsed.warnings.len(), 1);
    }

    #[test]
    fn test_match_parameters() {
        let parsed = parse(indoc! {"
            Summary.

            Args:
                query: Search query.
                ghost: Not a parameter.
        "});
        let docs = match_parameters(&parsed, &["query", "limit"]);
        assert_eq!(docs.get("query").map(|d| d.description.as_str()), Some("Search query."));
        assert!(docs.get("limit").is_none());
        assert_eq!(
            docs.warnings,
            vec!["documented parameter `ghost` not in signature".to_string()]
        );
    }
}
