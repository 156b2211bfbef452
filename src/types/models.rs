//! Record-like classes declared in the same source unit
//!
//! `TypedDict`, pydantic `BaseModel`, `NamedTuple` and `@dataclass` classes
//! are turned into object schemas when a parameter names them. `Enum`
//! subclasses map to their value type.

use super::expr::{TypeExpr, TypeExprError};
use crate::core::Primitive;
use crate::syntax::{code_text, dotted_path, node_text};
use std::collections::BTreeMap;
use tracing::trace;
use tree_sitter::Node;

const RECORD_BASES: &[&str] = &["TypedDict", "BaseModel", "NamedTuple"];
const STRING_ENUM_BASES: &[&str] = &["Enum", "StrEnum"];
const INTEGER_ENUM_BASES: &[&str] = &["IntEnum", "IntFlag", "Flag"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelKind {
    Record,
    Enum(Primitive),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelField {
    pub name: String,
    /// Annotation text without comments
    pub annotation: String,
    pub expr: Result<TypeExpr, TypeExprError>,
    pub has_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDef {
    pub name: String,
    pub kind: ModelKind,
    pub fields: Vec<ModelField>,
    /// `TypedDict(..., total=False)` makes every field optional by default
    pub total: bool,
}

/// Models declared at module level, keyed by class name
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, ModelDef>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect model classes from the module-level statements of `root`.
    ///
    /// Classes are visited in source order, so a model may extend a model
    /// declared above it and inherit its fields.
    pub fn collect(root: &Node, source: &str) -> Self {
        let mut registry = Self::new();
        let mut cursor = root.walk();
        for statement in root.named_children(&mut cursor) {
            let (class, decorators) = match statement.kind() {
                "class_definition" => (statement, Vec::new()),
                "decorated_definition" => {
                    let Some(definition) = statement.child_by_field_name("definition") else {
                        continue;
                    };
                    if definition.kind() != "class_definition" {
                        continue;
                    }
                    let mut inner = statement.walk();
                    let decorators: Vec<Node> = statement
                        .named_children(&mut inner)
                        .filter(|child| child.kind() == "decorator")
                        .collect();
                    (definition, decorators)
                }
                _ => continue,
            };
            if class.has_error() {
                continue;
            }
            if let Some(model) = registry.model_from_class(&class, &decorators, source) {
                trace!(model = %model.name, fields = model.fields.len(), "Registered model class");
                registry.insert(model);
            }
        }
        registry
    }

    pub fn insert(&mut self, model: ModelDef) {
        self.models.insert(model.name.clone(), model);
    }

    pub fn get(&self, name: &str) -> Option<&ModelDef> {
        self.models.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    fn model_from_class(&self, class: &Node, decorators: &[Node], source: &str) -> Option<ModelDef> {
        let name = node_text(&class.child_by_field_name("name")?, source).to_string();

        let is_dataclass = decorators.iter().any(|decorator| {
            decorator
                .named_child(0)
                .and_then(|expr| dotted_path(&expr, source))
                .is_some_and(|path| path.rsplit('.').next() == Some("dataclass"))
        });

        let mut kind = is_dataclass.then_some(ModelKind::Record);
        let mut total = true;
        let mut inherited: Vec<ModelField> = Vec::new();

        if let Some(bases) = class.child_by_field_name("superclasses") {
            let mut cursor = bases.walk();
            for base in bases.named_children(&mut cursor) {
                if base.kind() == "keyword_argument" {
                    let keyword = base
                        .child_by_field_name("name")
                        .map(|n| node_text(&n, source));
                    let value = base
                        .child_by_field_name("value")
                        .map(|v| node_text(&v, source));
                    if keyword == Some("total") && value == Some("False") {
                        total = false;
                    }
                    continue;
                }
                let Some(path) = dotted_path(&base, source) else {
                    continue;
                };
                let simple = path.rsplit('.').next().unwrap_or(&path);
                if RECORD_BASES.contains(&simple) {
                    kind.get_or_insert(ModelKind::Record);
                } else if INTEGER_ENUM_BASES.contains(&simple) {
                    kind = Some(ModelKind::Enum(Primitive::Integer));
                } else if STRING_ENUM_BASES.contains(&simple) {
                    kind.get_or_insert(ModelKind::Enum(Primitive::String));
                } else if let Some(parent) = self.get(&path) {
                    kind.get_or_insert(parent.kind.clone());
                    inherited.extend(parent.fields.iter().cloned());
                }
            }
        }

        let kind = kind?;
        let mut fields = inherited;
        if kind == ModelKind::Record {
            if let Some(body) = class.child_by_field_name("body") {
                for field in class_fields(&body, source) {
                    let field = ModelField {
                        name: field.name,
                        annotation: code_text(&field.annotation, source),
                        expr: TypeExpr::from_node(&field.annotation, source),
                        has_default: field.default.is_some(),
                    };
                    // A redeclared field overrides the inherited one in place
                    match fields.iter_mut().find(|f| f.name == field.name) {
                        Some(existing) => *existing = field,
                        None => fields.push(field),
                    }
                }
            }
        }

        Some(ModelDef {
            name,
            kind,
            fields,
            total,
        })
    }
}

/// Annotated assignment (`name: T` or `name: T = value`) in a class body
#[derive(Debug, Clone)]
pub struct ClassField<'tree> {
    pub name: String,
    /// The `type` node of the assignment
    pub annotation: Node<'tree>,
    pub default: Option<Node<'tree>>,
    pub node: Node<'tree>,
}

/// Annotated assignments of a class body in declaration order.
///
/// `ClassVar` annotations and dunder names are not fields.
pub fn class_fields<'tree>(body: &Node<'tree>, source: &str) -> Vec<ClassField<'tree>> {
    let mut fields = Vec::new();
    let mut cursor = body.walk();
    for statement in body.named_children(&mut cursor) {
        if statement.kind() != "expression_statement" {
            continue;
        }
        let Some(assignment) = statement.named_child(0) else {
            continue;
        };
        if assignment.kind() != "assignment" {
            continue;
        }
        let (Some(left), Some(annotation)) = (
            assignment.child_by_field_name("left"),
            assignment.child_by_field_name("type"),
        ) else {
            continue;
        };
        if left.kind() != "identifier" {
            continue;
        }
        let name = node_text(&left, source);
        let is_class_var = node_text(&annotation, source)
            .split('[')
            .next()
            .is_some_and(|head| head.trim().rsplit('.').next() == Some("ClassVar"));
        if is_class_var || (name.starts_with("__") && name.ends_with("__")) {
            continue;
        }
        fields.push(ClassField {
            name: name.to_string(),
            annotation,
            default: assignment.child_by_field_name("right"),
            node: assignment,
        });
    }
    fields
}
