//! Decorator matching against the configured marker vocabulary

use crate::config::MarkerConfig;
use crate::core::DeclarationKind;
use crate::syntax::{dotted_path, node_text, string_value};
use tree_sitter::Node;

/// Arguments given to a marker decorator call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerArgs {
    /// `name=` override
    pub name: Option<String>,
    /// `description=` override
    pub description: Option<String>,
    /// Resource URI template
    pub uri: Option<String>,
}

/// A decorator that matched a marker
#[derive(Debug, Clone)]
pub struct MarkerMatch<'tree> {
    pub kind: DeclarationKind,
    /// Dotted callee path as written, e.g. `mcp.tool`
    pub path: String,
    pub args: MarkerArgs,
    pub decorator: Node<'tree>,
}

/// Classifies decorators by marker name
#[derive(Debug, Clone, Copy)]
pub struct MarkerSet<'a> {
    config: &'a MarkerConfig,
}

impl<'a> MarkerSet<'a> {
    pub fn new(config: &'a MarkerConfig) -> Self {
        Self { config }
    }

    /// Declaration kind for a rendered decorator path
    pub fn classify(&self, path: &str) -> Option<DeclarationKind> {
        let lists = [
            (DeclarationKind::Tool, &self.config.tool),
            (DeclarationKind::Resource, &self.config.resource),
            (DeclarationKind::Prompt, &self.config.prompt),
        ];
        lists.into_iter().find_map(|(kind, markers)| {
            markers
                .iter()
                .any(|marker| marker_matches(marker, path))
                .then_some(kind)
        })
    }

    /// Every decorator of a definition that matches a marker, top to bottom
    pub fn matches<'tree>(&self, decorators: &[Node<'tree>], source: &str) -> Vec<MarkerMatch<'tree>> {
        decorators
            .iter()
            .filter_map(|decorator| {
                let expression = decorator.named_child(0)?;
                let path = dotted_path(&expression, source)?;
                let kind = self.classify(&path)?;
                Some(MarkerMatch {
                    kind,
                    args: marker_args(&expression, kind, source),
                    path,
                    decorator: *decorator,
                })
            })
            .collect()
    }
}

/// A marker without a dot matches the last segment of the path; a dotted
/// marker must match the whole path.
pub fn marker_matches(marker: &str, path: &str) -> bool {
    if marker.contains('.') {
        path == marker
    } else {
        path.rsplit('.').next() == Some(marker)
    }
}

/// Read `name=`, `description=` and URI arguments of a marker call.
///
/// The first positional string is the URI of a resource and the name of a
/// tool or prompt. Non-literal arguments are ignored.
pub fn marker_args(expression: &Node, kind: DeclarationKind, source: &str) -> MarkerArgs {
    let mut args = MarkerArgs::default();
    if expression.kind() != "call" {
        return args;
    }
    let Some(arguments) = expression.child_by_field_name("arguments") else {
        return args;
    };

    let mut positional_seen = false;
    let mut cursor = arguments.walk();
    for argument in arguments.named_children(&mut cursor) {
        match argument.kind() {
            "keyword_argument" => {
                let (Some(key), Some(value)) = (
                    argument.child_by_field_name("name"),
                    argument.child_by_field_name("value"),
                ) else {
                    continue;
                };
                let value = string_value(&value, source);
                match node_text(&key, source) {
                    "name" => args.name = value.or(args.name),
                    "description" => args.description = value.or(args.description),
                    "uri" => args.uri = value.or(args.uri),
                    _ => {}
                }
            }
            "comment" => {}
            _ if !positional_seen => {
                positional_seen = true;
                let value = string_value(&argument, source);
                match kind {
                    DeclarationKind::Resource => args.uri = args.uri.take().or(value),
                    DeclarationKind::Tool | DeclarationKind::Prompt => {
                        args.name = args.name.take().or(value)
                    }
                }
            }
            _ => {}
        }
    }
    args
}
