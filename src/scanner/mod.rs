//! Declaration scanner
//!
//! Walks the module-level statements of a parsed unit (and the top level of
//! class bodies) looking for definitions decorated with a configured marker.
//! Nested definitions and definitions under `if`/`try` blocks are never
//! visited.

pub mod markers;

pub use markers::{marker_args, marker_matches, MarkerArgs, MarkerMatch, MarkerSet};

use crate::config::ToolmapConfig;
use crate::core::{DeclarationKind, Diagnostic, SourceSpan};
use crate::syntax::{block_docstring, dotted_path, node_span, node_text};
use tracing::{debug, trace};
use tree_sitter::Node;

/// Where a declaration's parameters come from
#[derive(Debug, Clone, Copy)]
pub enum ParameterSource<'tree> {
    /// A `parameters` node; `skip_receiver` drops the leading `self`/`cls`
    Parameters {
        node: Node<'tree>,
        skip_receiver: bool,
    },
    /// Annotated fields of a marked class body without `__init__`
    ClassFields(Node<'tree>),
}

/// A marked definition, ready for signature interpretation
#[derive(Debug, Clone)]
pub struct Declaration<'tree> {
    pub kind: DeclarationKind,
    /// Name of the definition as written
    pub name: String,
    pub marker: MarkerArgs,
    pub parameters: ParameterSource<'tree>,
    /// Return annotation node of a function
    pub return_type: Option<Node<'tree>>,
    pub docstring: Option<String>,
    pub is_async: bool,
    pub is_class: bool,
    pub span: SourceSpan,
    /// The `function_definition` or `class_definition` node
    pub node: Node<'tree>,
}

impl Declaration<'_> {
    /// Published name: the marker's `name=` override or the definition name
    pub fn descriptor_name(&self) -> &str {
        self.marker.name.as_deref().unwrap_or(&self.name)
    }
}

/// Declarations of one unit in source order plus scanner diagnostics
#[derive(Debug, Default)]
pub struct ScanOutcome<'tree> {
    pub declarations: Vec<Declaration<'tree>>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct DeclarationScanner<'a> {
    markers: MarkerSet<'a>,
    include_private: bool,
}

impl<'a> DeclarationScanner<'a> {
    pub fn new(config: &'a ToolmapConfig) -> Self {
        Self {
            markers: MarkerSet::new(&config.markers),
            include_private: config.scan.include_private,
        }
    }

    pub fn scan<'tree>(&self, root: &Node<'tree>, source: &str) -> ScanOutcome<'tree> {
        let mut outcome = ScanOutcome::default();
        let mut cursor = root.walk();
        for statement in root.named_children(&mut cursor) {
            self.visit_statement(&statement, source, false, &mut outcome);
        }
        debug!(
            declarations = outcome.declarations.len(),
            diagnostics = outcome.diagnostics.len(),
            "Scanned unit for marked definitions"
        );
        outcome
    }

    fn visit_statement<'tree>(
        &self,
        statement: &Node<'tree>,
        source: &str,
        in_class: bool,
        outcome: &mut ScanOutcome<'tree>,
    ) {
        match statement.kind() {
            "decorated_definition" => {
                let decorators = decorators_of(statement);
                let matches = self.markers.matches(&decorators, source);
                let Some(definition) = statement.child_by_field_name("definition") else {
                    if let Some(first) = matches.first() {
                        let span = node_span(statement);
                        outcome.diagnostics.push(
                            Diagnostic::error(format!(
                                "@{} at {span} is not followed by a readable definition",
                                first.path
                            ))
                            .at(span),
                        );
                    }
                    return;
                };
                if let Some(first) = matches.first() {
                    if let Some(other) = matches.iter().find(|m| m.kind != first.kind) {
                        let name = definition_name(&definition, source).unwrap_or_default();
                        outcome.diagnostics.push(
                            Diagnostic::warning(format!(
                                "`{name}` carries both @{} and @{}; treated as {}",
                                first.path, other.path, first.kind
                            ))
                            .for_declaration(name.as_str())
                            .at(node_span(&other.decorator)),
                        );
                    }
                    let is_static = decorators.iter().any(|decorator| {
                        decorator_path(decorator, source)
                            .is_some_and(|path| path.rsplit('.').next() == Some("staticmethod"))
                    });
                    self.declare(first, &definition, source, in_class && !is_static, outcome);
                } else if definition.kind() == "class_definition" && !in_class {
                    self.visit_class_body(&definition, source, outcome);
                }
            }
            "class_definition" if !in_class => self.visit_class_body(statement, source, outcome),
            _ => {}
        }
    }

    /// Look for marked methods at the top level of an unmarked class
    fn visit_class_body<'tree>(
        &self,
        class: &Node<'tree>,
        source: &str,
        outcome: &mut ScanOutcome<'tree>,
    ) {
        let Some(body) = class.child_by_field_name("body") else {
            return;
        };
        let mut cursor = body.walk();
        for statement in body.named_children(&mut cursor) {
            self.visit_statement(&statement, source, true, outcome);
        }
    }

    fn declare<'tree>(
        &self,
        marker: &MarkerMatch<'tree>,
        definition: &Node<'tree>,
        source: &str,
        is_method: bool,
        outcome: &mut ScanOutcome<'tree>,
    ) {
        let span = node_span(definition);
        let Some(name) = definition_name(definition, source) else {
            outcome.diagnostics.push(
                Diagnostic::warning(format!(
                    "marked definition at {span} has no readable name; skipped"
                ))
                .at(span),
            );
            return;
        };

        if !self.include_private && name.starts_with('_') {
            trace!(name = %name, "Skipping private declaration");
            return;
        }

        let body = definition.child_by_field_name("body");
        if body.is_some_and(|b| b.has_error()) {
            outcome.diagnostics.push(
                Diagnostic::warning(format!("syntax error in the body of `{name}`"))
                    .for_declaration(name.as_str())
                    .at(span),
            );
        }

        let declaration = match definition.kind() {
            "function_definition" => {
                let Some(parameters) = definition.child_by_field_name("parameters") else {
                    outcome.diagnostics.push(
                        Diagnostic::error(format!("`{name}` has no readable parameter list"))
                            .for_declaration(name.as_str())
                            .at(span),
                    );
                    return;
                };
                Declaration {
                    kind: marker.kind,
                    marker: marker.args.clone(),
                    parameters: ParameterSource::Parameters {
                        node: parameters,
                        skip_receiver: is_method,
                    },
                    return_type: definition.child_by_field_name("return_type"),
                    docstring: body.and_then(|b| block_docstring(&b, source)),
                    is_async: is_async(definition),
                    is_class: false,
                    span,
                    node: *definition,
                    name,
                }
            }
            "class_definition" => {
                let init = body.and_then(|b| find_init(&b, source));
                let class_doc = body.and_then(|b| block_docstring(&b, source));
                let (parameters, docstring) = match (init, body) {
                    (Some(init), _) => {
                        let Some(parameters) = init.child_by_field_name("parameters") else {
                            outcome.diagnostics.push(
                                Diagnostic::error(format!(
                                    "`__init__` of `{name}` has no readable parameter list"
                                ))
                                .for_declaration(name.as_str())
                                .at(node_span(&init)),
                            );
                            return;
                        };
                        let init_doc = init
                            .child_by_field_name("body")
                            .and_then(|b| block_docstring(&b, source));
                        (
                            ParameterSource::Parameters {
                                node: parameters,
                                skip_receiver: true,
                            },
                            class_doc.or(init_doc),
                        )
                    }
                    (None, Some(body)) => (ParameterSource::ClassFields(body), class_doc),
                    (None, None) => {
                        outcome.diagnostics.push(
                            Diagnostic::error(format!("class `{name}` has no readable body"))
                                .for_declaration(name.as_str())
                                .at(span),
                        );
                        return;
                    }
                };
                Declaration {
                    kind: marker.kind,
                    marker: marker.args.clone(),
                    parameters,
                    return_type: None,
                    docstring,
                    is_async: false,
                    is_class: true,
                    span,
                    node: *definition,
                    name,
                }
            }
            other => {
                trace!(kind = other, "Marker on unsupported definition kind");
                return;
            }
        };

        trace!(
            name = %declaration.name,
            kind = %declaration.kind,
            line = span.line,
            "Found marked declaration"
        );
        outcome.declarations.push(declaration);
    }
}

fn decorators_of<'tree>(decorated: &Node<'tree>) -> Vec<Node<'tree>> {
    let mut cursor = decorated.walk();
    decorated
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "decorator")
        .collect()
}

fn decorator_path(decorator: &Node, source: &str) -> Option<String> {
    let expression = decorator.named_child(0)?;
    dotted_path(&expression, source)
}

fn definition_name(definition: &Node, source: &str) -> Option<String> {
    let name = definition.child_by_field_name("name")?;
    if name.is_missing() || name.has_error() || name.kind() != "identifier" {
        return None;
    }
    Some(node_text(&name, source).to_string())
}

fn is_async(definition: &Node) -> bool {
    definition
        .child(0)
        .is_some_and(|first| first.kind() == "async")
}

/// The `__init__` method of a class body
fn find_init<'tree>(body: &Node<'tree>, source: &str) -> Option<Node<'tree>> {
    let mut cursor = body.walk();
    let found = body.named_children(&mut cursor).find_map(|statement| {
        let function = match statement.kind() {
            "function_definition" => statement,
            "decorated_definition" => statement.child_by_field_name("definition")?,
            _ => return None,
        };
        (function.kind() == "function_definition"
            && definition_name(&function, source).as_deref() == Some("__init__"))
        .then_some(function)
    });
    found
}
