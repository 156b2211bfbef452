//! Signature interpretation
//!
//! Turns the parameter list and return annotation of a [`Declaration`] into
//! typed [`Parameter`]s. Annotation nodes are resolved through the
//! [`TypeNormalizer`]; defaults are kept verbatim and decoded when they are
//! plain literals.

use crate::core::{Parameter, ParameterKind, SourceSpan, TypeSchema};
use crate::scanner::{Declaration, ParameterSource};
use crate::syntax::{code_text, first_error, literal_to_json, node_span, node_text};
use crate::types::{class_fields, Normalized, TypeNormalizer};
use std::collections::HashSet;
use thiserror::Error;
use tracing::trace;
use tree_sitter::Node;

/// Why a declaration cannot be turned into a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("duplicate parameter name `{name}`")]
    DuplicateParameter { name: String, span: SourceSpan },

    #[error("syntax error in {part}")]
    Syntax { part: &'static str, span: SourceSpan },
}

impl SkipReason {
    pub fn span(&self) -> SourceSpan {
        match self {
            SkipReason::DuplicateParameter { span, .. } | SkipReason::Syntax { span, .. } => *span,
        }
    }
}

/// Interpreted signature of one declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub parameters: Vec<Parameter>,
    pub return_annotation: Option<String>,
    pub returns: TypeSchema,
    /// Signature line with whitespace collapsed
    pub text: String,
    /// Type normalization problems, already prefixed with their subject
    pub warnings: Vec<String>,
}

/// Raw parameter pieces before normalization
struct RawParameter<'tree> {
    name: String,
    kind: ParameterKind,
    annotation: Option<Node<'tree>>,
    default: Option<Node<'tree>>,
    node: Node<'tree>,
}

pub struct SignatureInterpreter<'n> {
    normalizer: &'n TypeNormalizer<'n>,
}

impl<'n> SignatureInterpreter<'n> {
    pub fn new(normalizer: &'n TypeNormalizer<'n>) -> Self {
        Self { normalizer }
    }

    pub fn interpret(
        &self,
        declaration: &Declaration,
        source: &str,
    ) -> Result<Signature, SkipReason> {
        check_header_syntax(declaration)?;

        let raw = match declaration.parameters {
            ParameterSource::Parameters {
                node,
                skip_receiver,
            } => raw_parameters(&node, skip_receiver, source)?,
            ParameterSource::ClassFields(body) => class_fields(&body, source)
                .into_iter()
                .map(|field| RawParameter {
                    name: field.name,
                    kind: ParameterKind::Positional,
                    annotation: Some(field.annotation),
                    default: field.default,
                    node: field.node,
                })
                .collect(),
        };

        let mut seen = HashSet::new();
        for param in &raw {
            if !seen.insert(param.name.as_str()) {
                return Err(SkipReason::DuplicateParameter {
                    name: param.name.clone(),
                    span: node_span(&param.node),
                });
            }
        }

        let mut warnings = Vec::new();
        let parameters: Vec<Parameter> = raw
            .into_iter()
            .map(|raw| self.build_parameter(raw, source, &mut warnings))
            .collect();

        let return_annotation = declaration
            .return_type
            .map(|node| code_text(&node, source));
        let returns = if declaration.is_class {
            self.normalizer
                .model_schema(&declaration.name)
                .map(|normalized| {
                    warnings.extend(normalized.issues);
                    normalized.schema
                })
                .unwrap_or_default()
        } else {
            let normalized = match declaration.return_type {
                Some(node) => self.normalizer.normalize_node(&node, source),
                None => Normalized::unknown(),
            };
            warnings.extend(
                normalized
                    .issues
                    .into_iter()
                    .map(|issue| format!("return type: {issue}")),
            );
            normalized.schema
        };

        let text = signature_text(declaration, &parameters, return_annotation.as_deref(), source);
        trace!(
            name = %declaration.name,
            parameters = parameters.len(),
            "Interpreted signature"
        );

        Ok(Signature {
            parameters,
            return_annotation,
            returns,
            text,
            warnings,
        })
    }

    fn build_parameter(
        &self,
        raw: RawParameter,
        source: &str,
        warnings: &mut Vec<String>,
    ) -> Parameter {
        let normalized = match raw.annotation {
            Some(node) => self.normalizer.normalize_node(&node, source),
            None => Normalized::unknown(),
        };
        warnings.extend(
            normalized
                .issues
                .into_iter()
                .map(|issue| format!("parameter `{}`: {issue}", raw.name)),
        );
        let schema = match raw.kind {
            ParameterKind::VarPositional => TypeSchema::list(normalized.schema),
            ParameterKind::VarKeyword => TypeSchema::map(TypeSchema::string(), normalized.schema),
            _ => normalized.schema,
        };

        let mut param = Parameter::new(raw.name);
        param.kind = raw.kind;
        param.annotation = raw.annotation.map(|node| code_text(&node, source));
        param.schema = schema;
        param.required = raw.default.is_none() && !raw.kind.is_variadic();
        if let Some(default) = raw.default {
            param.default = Some(code_text(&default, source));
            param.default_value = literal_to_json(&default, source);
        }
        param
    }
}

/// Syntax errors in the parameter list or return annotation, or between the
/// two, make the declaration unusable
fn check_header_syntax(declaration: &Declaration) -> Result<(), SkipReason> {
    let syntax_error = |node: &Node, part: &'static str| SkipReason::Syntax {
        part,
        span: node_span(&first_error(node).unwrap_or(*node)),
    };

    match declaration.parameters {
        ParameterSource::Parameters { node, .. } if node.has_error() || node.is_missing() => {
            return Err(syntax_error(&node, "parameter list"));
        }
        ParameterSource::ClassFields(body) => {
            let mut cursor = body.walk();
            let broken = body
                .named_children(&mut cursor)
                .find(|statement| statement.kind() == "expression_statement" && statement.has_error());
            if let Some(statement) = broken {
                return Err(syntax_error(&statement, "class fields"));
            }
        }
        _ => {}
    }

    if let Some(return_type) = declaration.return_type {
        if return_type.has_error() || return_type.is_missing() {
            return Err(syntax_error(&return_type, "return annotation"));
        }
    }

    if !declaration.is_class {
        let mut cursor = declaration.node.walk();
        let stray = declaration.node.children(&mut cursor).find(|child| {
            declaration.node.child_by_field_name("body") != Some(*child)
                && (child.is_error() || child.is_missing())
        });
        if let Some(stray) = stray {
            return Err(syntax_error(&stray, "function signature"));
        }
    }

    Ok(())
}

fn raw_parameters<'tree>(
    parameters: &Node<'tree>,
    skip_receiver: bool,
    source: &str,
) -> Result<Vec<RawParameter<'tree>>, SkipReason> {
    let mut raw = Vec::new();
    let mut keyword_only = false;
    let mut receiver_pending = skip_receiver;

    let mut cursor = parameters.walk();
    let children: Vec<Node<'tree>> = parameters.named_children(&mut cursor).collect();
    for child in children {
        let regular = if keyword_only {
            ParameterKind::KeywordOnly
        } else {
            ParameterKind::Positional
        };

        let param = match child.kind() {
            "comment" | "positional_separator" => continue,
            "keyword_separator" => {
                keyword_only = true;
                continue;
            }
            "identifier" => RawParameter {
                name: node_text(&child, source).to_string(),
                kind: regular,
                annotation: None,
                default: None,
                node: child,
            },
            "list_splat_pattern" | "dictionary_splat_pattern" => {
                let kind = splat_kind(&child);
                keyword_only = true;
                RawParameter {
                    name: splat_name(&child, source)?,
                    kind,
                    annotation: None,
                    default: None,
                    node: child,
                }
            }
            "typed_parameter" => {
                let target = child.named_child(0).ok_or_else(|| malformed(&child))?;
                let (name, kind) = match target.kind() {
                    "identifier" => (node_text(&target, source).to_string(), regular),
                    "list_splat_pattern" | "dictionary_splat_pattern" => {
                        keyword_only = true;
                        (splat_name(&target, source)?, splat_kind(&target))
                    }
                    _ => return Err(malformed(&child)),
                };
                RawParameter {
                    name,
                    kind,
                    annotation: child.child_by_field_name("type"),
                    default: None,
                    node: child,
                }
            }
            "default_parameter" | "typed_default_parameter" => {
                let name = child
                    .child_by_field_name("name")
                    .filter(|n| n.kind() == "identifier")
                    .ok_or_else(|| malformed(&child))?;
                RawParameter {
                    name: node_text(&name, source).to_string(),
                    kind: regular,
                    annotation: child.child_by_field_name("type"),
                    default: child.child_by_field_name("value"),
                    node: child,
                }
            }
            _ => return Err(malformed(&child)),
        };

        if receiver_pending {
            receiver_pending = false;
            if param.kind == ParameterKind::Positional {
                continue;
            }
        }
        raw.push(param);
    }

    Ok(raw)
}

fn malformed(node: &Node) -> SkipReason {
    SkipReason::Syntax {
        part: "parameter list",
        span: node_span(node),
    }
}

fn splat_kind(node: &Node) -> ParameterKind {
    if node.kind() == "dictionary_splat_pattern" {
        ParameterKind::VarKeyword
    } else {
        ParameterKind::VarPositional
    }
}

fn splat_name(node: &Node, source: &str) -> Result<String, SkipReason> {
    node.named_child(0)
        .filter(|n| n.kind() == "identifier")
        .map(|n| node_text(&n, source).to_string())
        .ok_or_else(|| malformed(node))
}

/// `async def name(params) -> ret` for functions, `class Name(params)` for
/// marked classes
fn signature_text(
    declaration: &Declaration,
    parameters: &[Parameter],
    return_annotation: Option<&str>,
    source: &str,
) -> String {
    if declaration.is_class {
        let rendered: Vec<String> = parameters.iter().map(render_parameter).collect();
        return format!("class {}({})", declaration.name, rendered.join(", "));
    }

    let params = match declaration.parameters {
        ParameterSource::Parameters { node, .. } => code_text(&node, source),
        ParameterSource::ClassFields(_) => "()".to_string(),
    };
    let mut text = String::new();
    if declaration.is_async {
        text.push_str("async ");
    }
    text.push_str("def ");
    text.push_str(&declaration.name);
    text.push_str(&params);
    if let Some(ret) = return_annotation {
        text.push_str(" -> ");
        text.push_str(ret);
    }
    text
}

fn render_parameter(param: &Parameter) -> String {
    let prefix = match param.kind {
        ParameterKind::VarPositional => "*",
        ParameterKind::VarKeyword => "**",
        _ => "",
    };
    let mut out = format!("{prefix}{}", param.name);
    if let Some(annotation) = &param.annotation {
        out.push_str(": ");
        out.push_str(annotation);
    }
    if let Some(default) = &param.default {
        out.push_str(" = ");
        out.push_str(default);
    }
    out
}
