//! Schema assembly
//!
//! Merges an interpreted signature with its parsed docstring into one
//! [`Descriptor`]. The signature is authoritative for types; the docstring
//! only contributes descriptions and examples.

use crate::config::DocstringConfig;
use crate::core::{DeclarationKind, Descriptor, Diagnostic, Returns, TypeSchema};
use crate::docstring::{match_parameters, DocstringParser};
use crate::scanner::Declaration;
use crate::signature::Signature;
use crate::types::TypeNormalizer;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

/// `{name}` and `{name*}` placeholders of a URI template
static URI_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(\w+)\*?\}").unwrap());

/// A descriptor plus the warnings raised while building it
#[derive(Debug, Clone)]
pub struct Assembly {
    pub descriptor: Descriptor,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct SchemaAssembler<'a> {
    normalizer: &'a TypeNormalizer<'a>,
    docstrings: DocstringParser<'a>,
}

impl<'a> SchemaAssembler<'a> {
    pub fn new(normalizer: &'a TypeNormalizer<'a>, docstring: &'a DocstringConfig) -> Self {
        Self {
            normalizer,
            docstrings: DocstringParser::new(docstring),
        }
    }

    pub fn assemble(&self, declaration: &Declaration, signature: Signature) -> Assembly {
        let name = declaration.descriptor_name().to_string();
        let mut warnings: Vec<String> = signature.warnings;

        let parsed = self.docstrings.parse(declaration.docstring.as_deref());
        warnings.extend(parsed.warnings.iter().cloned());

        let owned_names: Vec<String> = signature.parameters.iter().map(|p| p.name.clone()).collect();
        let names: Vec<&str> = owned_names.iter().map(String::as_str).collect();
        let docs = match_parameters(&parsed, &names);
        warnings.extend(docs.warnings.iter().cloned());

        let mut parameters = signature.parameters;
        for param in &mut parameters {
            let Some(doc) = docs.get(&param.name) else {
                continue;
            };
            param.description = doc.description.clone();
            if param.kind.is_variadic() {
                continue;
            }
            if let (Some(hint), Some(annotation)) = (&doc.type_hint, &param.annotation) {
                if self.conflicts(hint, &param.schema) {
                    warnings.push(format!(
                        "docstring type `{hint}` for parameter `{}` conflicts with annotation `{annotation}`; using the annotation",
                        param.name
                    ));
                }
            }
        }

        let doc_returns = parsed.returns.clone().unwrap_or_default();
        if let (Some(hint), Some(annotation)) = (&doc_returns.type_hint, &signature.return_annotation) {
            if self.conflicts(hint, &signature.returns) {
                warnings.push(format!(
                    "docstring return type `{hint}` conflicts with annotation `{annotation}`; using the annotation"
                ));
            }
        }

        let description = declaration
            .marker
            .description
            .clone()
            .unwrap_or_else(|| parsed.description.clone());

        let uri = declaration.marker.uri.clone();
        if declaration.kind == DeclarationKind::Resource {
            if let Some(template) = &uri {
                for caps in URI_PLACEHOLDER.captures_iter(template) {
                    let placeholder = &caps[1];
                    if !names.contains(&placeholder) {
                        warnings.push(format!(
                            "URI placeholder `{{{placeholder}}}` has no matching parameter"
                        ));
                    }
                }
            }
        }

        let descriptor = Descriptor {
            kind: declaration.kind,
            name: name.clone(),
            description,
            parameters,
            returns: Returns {
                schema: signature.returns,
                description: doc_returns.description,
            },
            uri,
            examples: parsed.examples,
            is_async: declaration.is_async,
            signature: signature.text,
            location: declaration.span,
        };

        trace!(
            name = %descriptor.name,
            warnings = warnings.len(),
            "Assembled descriptor"
        );

        let diagnostics = warnings
            .into_iter()
            .map(|message| {
                Diagnostic::warning(message)
                    .for_declaration(name.as_str())
                    .at(declaration.span)
            })
            .collect();

        Assembly {
            descriptor,
            diagnostics,
        }
    }

    /// A docstring type conflicts when its schema disagrees structurally
    /// with the annotation's. Unknown parts and optionality never conflict.
    fn conflicts(&self, hint: &str, annotated: &TypeSchema) -> bool {
        let documented = self.normalizer.normalize(Some(hint)).schema;
        !documented.is_compatible_with(annotated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolmapConfig;
    use crate::scanner::DeclarationScanner;
    use crate::signature::SignatureInterpreter;
    use crate::syntax::parse_source;
    use crate::types::ModelRegistry;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn assemble_first(source: &str) -> Assembly {
        let tree = parse_source(source, "server.py").unwrap();
        let root = tree.root_node();
        let config = ToolmapConfig::default();
        let outcome = DeclarationScanner::new(&config).scan(&root, source);
        let models = ModelRegistry::collect(&root, source);
        let normalizer = TypeNormalizer::new(&models);
        let signature = SignatureInterpreter::new(&normalizer)
            .interpret(&outcome.declarations[0], source)
            .unwrap();
        SchemaAssembler::new(&normalizer, &config.docstring)
            .assemble(&outcome.declarations[0], signature)
    }

    #[test]
    fn test_descriptions_merge_into_parameters() {
        let assembly = assemble_first(indoc! {r#"
            @mcp.tool()
            def search_web(query: str, limit: int = 10) -> List[Dict[str, str]]:
                """Search the web for information.

                Args:
                    query: Search query string
                    limit: Maximum number of results to return

                Returns:
                    List of search results with title and URL
                """
        "#});
        let descriptor = assembly.descriptor;
        assert!(assembly.diagnostics.is_empty());
        assert_eq!(descriptor.description, "Search the web for information.");
        assert_eq!(descriptor.parameters[0].description, "Search query string");
        assert_eq!(
            descriptor.parameters[1].description,
            "Maximum number of results to return"
        );
        assert_eq!(
            descriptor.returns.description,
            "List of search results with title and URL"
        );
        assert_eq!(
            descriptor.returns.schema,
            TypeSchema::list(TypeSchema::map(TypeSchema::string(), TypeSchema::string()))
        );
    }

    #[test]
    fn test_docstring_type_conflict_keeps_annotation() {
        let assembly = assemble_first(indoc! {r#"
            @mcp.tool()
            def f(count: str):
                """Count things.

                Args:
                    count (int): How many.
                """
        "#});
        assert_eq!(assembly.descriptor.parameters[0].schema, TypeSchema::string());
        assert_eq!(assembly.diagnostics.len(), 1);
        assert!(assembly.diagnostics[0].message.contains("conflicts with annotation `str`"));
    }

    #[test]
    fn test_optional_docstring_type_is_not_a_conflict() {
        let assembly = assemble_first(indoc! {r#"
            @mcp.tool()
            def f(limit: Optional[int] = None):
                """Limit things.

                Args:
                    limit (int, optional): Upper bound.
                """
        "#});
        assert!(assembly.diagnostics.is_empty());
    }

    #[test]
    fn test_bare_container_annotations_accept_specific_docstring_types() {
        let assembly = assemble_first(indoc! {r#"
            @mcp.tool()
            def f(data: dict) -> list:
                """Transform data.

                Args:
                    data (Dict[str, Any]): Input record.

                Returns:
                    List[str]: Output lines.
                """
        "#});
        assert!(
            assembly.diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            assembly.diagnostics
        );
        assert_eq!(
            assembly.descriptor.parameters[0].schema,
            TypeSchema::map(TypeSchema::Unknown, TypeSchema::Unknown)
        );
    }

    #[test]
    fn test_nested_docstring_type_mismatch_still_conflicts() {
        let assembly = assemble_first(indoc! {r#"
            @mcp.tool()
            def f(ids: List[int]):
                """Look up ids.

                Args:
                    ids (List[str]): Identifiers.
                """
        "#});
        assert_eq!(assembly.diagnostics.len(), 1);
        assert!(assembly.diagnostics[0].message.contains("conflicts with annotation `List[int]`"));
    }

    #[test]
    fn test_marker_overrides() {
        let assembly = assemble_first(indoc! {r#"
            @mcp.tool(name="fetch_page", description="Fetch a URL")
            def fetch(url: str) -> str:
                """Docstring summary."""
        "#});
        assert_eq!(assembly.descriptor.name, "fetch_page");
        assert_eq!(assembly.descriptor.description, "Fetch a URL");
    }

    #[test]
    fn test_unmatched_uri_placeholder_warns() {
        let assembly = assemble_first(indoc! {r#"
            @mcp.resource("users://{user_id}/posts/{post_id}")
            def post(user_id: str) -> str:
                return ""
        "#});
        assert_eq!(
            assembly.descriptor.uri.as_deref(),
            Some("users://{user_id}/posts/{post_id}")
        );
        let messages: Vec<&str> = assembly
            .diagnostics
            .iter()
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(
            messages,
            vec!["URI placeholder `{post_id}` has no matching parameter"]
        );
    }
}
