//! Mapping of annotations onto the canonical [`TypeSchema`]

use super::expr::{parse_type_expr, TypeExpr, TypeExprError, MAX_TYPE_DEPTH};
use super::models::{ModelDef, ModelField, ModelKind, ModelRegistry};
use crate::core::{ObjectField, Primitive, TypeSchema};
use crate::syntax::{code_text, number_value};
use serde_json::Value;
use tracing::trace;
use tree_sitter::Node;

/// Longest annotation quoted verbatim in an issue
const QUOTED_ANNOTATION_LIMIT: usize = 80;

/// Result of normalizing one annotation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Normalized {
    pub schema: TypeSchema,
    /// Problems worth reporting as warnings
    pub issues: Vec<String>,
}

impl Normalized {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    List,
    Tuple,
    Set,
    Map,
    Counter,
}

fn scalar(name: &str) -> Option<TypeSchema> {
    let schema = match name {
        "str" | "bytes" | "bytearray" | "LiteralString" | "AnyStr" => TypeSchema::string(),
        "datetime" | "date" | "time" | "UUID" | "Path" | "PurePath" | "EmailStr" | "HttpUrl" => {
            TypeSchema::string()
        }
        "int" => TypeSchema::integer(),
        "float" | "Decimal" => TypeSchema::number(),
        "bool" => TypeSchema::boolean(),
        "None" | "NoneType" => TypeSchema::null(),
        "Any" | "object" | "Callable" | "Type" | "type" => TypeSchema::Unknown,
        _ => return None,
    };
    Some(schema)
}

fn container(name: &str) -> Option<Container> {
    let family = match name {
        "list" | "List" | "Sequence" | "MutableSequence" | "Iterable" | "Iterator"
        | "Collection" | "AsyncIterable" | "AsyncIterator" | "Deque" | "deque" => Container::List,
        "tuple" | "Tuple" => Container::Tuple,
        "set" | "Set" | "frozenset" | "FrozenSet" | "AbstractSet" | "MutableSet" => Container::Set,
        "dict" | "Dict" | "Mapping" | "MutableMapping" | "OrderedDict" | "DefaultDict"
        | "defaultdict" | "ChainMap" => Container::Map,
        "Counter" => Container::Counter,
        _ => return None,
    };
    Some(family)
}

/// Wrappers whose first argument carries the whole type
const TRANSPARENT_WRAPPERS: &[&str] = &[
    "Annotated",
    "Required",
    "NotRequired",
    "ReadOnly",
    "Final",
    "ClassVar",
    "Awaitable",
];

/// Maps annotations to [`TypeSchema`], resolving model classes of one unit
pub struct TypeNormalizer<'a> {
    models: &'a ModelRegistry,
}

impl<'a> TypeNormalizer<'a> {
    pub fn new(models: &'a ModelRegistry) -> Self {
        Self { models }
    }

    /// Normalize optional annotation text. A missing annotation is `Unknown`
    /// without any issue.
    pub fn normalize(&self, annotation: Option<&str>) -> Normalized {
        let Some(text) = annotation.map(str::trim).filter(|t| !t.is_empty()) else {
            return Normalized::unknown();
        };
        match parse_type_expr(text) {
            Ok(expr) => self.normalize_expr(&expr),
            Err(err) => unparsable(text, &err),
        }
    }

    /// Normalize an annotation node of the unit's syntax tree
    pub fn normalize_node(&self, node: &Node, source: &str) -> Normalized {
        match TypeExpr::from_node(node, source) {
            Ok(expr) => self.normalize_expr(&expr),
            Err(err) => unparsable(&code_text(node, source), &err),
        }
    }

    pub fn normalize_expr(&self, expr: &TypeExpr) -> Normalized {
        let mut resolution = Resolution::new(self.models);
        let schema = resolution.resolve(expr);
        Normalized {
            schema,
            issues: resolution.issues,
        }
    }

    /// Object schema for a model class, used when a marked class exposes its
    /// fields as parameters
    pub fn model_schema(&self, name: &str) -> Option<Normalized> {
        let model = self.models.get(name)?;
        let mut resolution = Resolution::new(self.models);
        let schema = resolution.resolve_model(model);
        Some(Normalized {
            schema,
            issues: resolution.issues,
        })
    }
}

fn unparsable(text: &str, err: &TypeExprError) -> Normalized {
    trace!(annotation = text, error = %err, "Unparsable annotation");
    Normalized {
        schema: TypeSchema::Unknown,
        issues: vec![format!(
            "unparsable type annotation `{}`: {err}",
            abbreviate(text)
        )],
    }
}

fn abbreviate(text: &str) -> String {
    match text.char_indices().nth(QUOTED_ANNOTATION_LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Normalize one annotation with no model classes in scope
pub fn normalize_type(annotation: &str) -> Normalized {
    let models = ModelRegistry::default();
    TypeNormalizer::new(&models).normalize(Some(annotation))
}

struct Resolution<'a> {
    models: &'a ModelRegistry,
    /// Models currently being expanded
    stack: Vec<String>,
    issues: Vec<String>,
    depth: usize,
    truncated: bool,
}

impl<'a> Resolution<'a> {
    fn new(models: &'a ModelRegistry) -> Self {
        Self {
            models,
            stack: Vec::new(),
            issues: Vec::new(),
            depth: 0,
            truncated: false,
        }
    }

    fn resolve(&mut self, expr: &TypeExpr) -> TypeSchema {
        if self.depth >= MAX_TYPE_DEPTH {
            if !self.truncated {
                self.truncated = true;
                self.issues.push(format!(
                    "type nested deeper than {MAX_TYPE_DEPTH} levels treated as unknown"
                ));
            }
            return TypeSchema::Unknown;
        }
        self.depth += 1;
        let schema = self.resolve_expr(expr);
        self.depth -= 1;
        schema
    }

    fn resolve_expr(&mut self, expr: &TypeExpr) -> TypeSchema {
        match expr {
            TypeExpr::Name(path) => self.resolve_name(path),
            TypeExpr::Subscript { base, args } => self.resolve_subscript(base, args),
            TypeExpr::Union(items) => {
                let variants: Vec<TypeSchema> = items.iter().map(|item| self.resolve(item)).collect();
                TypeSchema::union_of(variants)
            }
            TypeExpr::Str(forward) => match parse_type_expr(forward) {
                Ok(inner) => self.resolve(&inner),
                Err(err) => {
                    self.issues.push(format!(
                        "unparsable forward reference \"{}\": {err}",
                        abbreviate(forward)
                    ));
                    TypeSchema::Unknown
                }
            },
            TypeExpr::Number(_) | TypeExpr::Ellipsis | TypeExpr::List(_) | TypeExpr::Call(_) => {
                self.issues.push(format!("`{expr}` is not a type"));
                TypeSchema::Unknown
            }
        }
    }

    fn resolve_name(&mut self, path: &str) -> TypeSchema {
        let simple = TypeExpr::simple_name(path);
        if let Some(schema) = scalar(simple) {
            return schema;
        }
        if let Some(family) = container(simple) {
            return match family {
                Container::List | Container::Tuple => TypeSchema::list(TypeSchema::Unknown),
                Container::Set => TypeSchema::set(TypeSchema::Unknown),
                Container::Map => TypeSchema::map(TypeSchema::Unknown, TypeSchema::Unknown),
                Container::Counter => TypeSchema::map(TypeSchema::Unknown, TypeSchema::integer()),
            };
        }
        if simple == "Optional" {
            return TypeSchema::optional(TypeSchema::Unknown);
        }
        if let Some(model) = self.models.get(path) {
            return self.resolve_model(model);
        }
        trace!(name = path, "Unresolved type name");
        TypeSchema::Unknown
    }

    fn arity_mismatch(&mut self, base: &str, expected: &str, found: usize) -> TypeSchema {
        self.issues.push(format!(
            "`{base}` expects {expected} type argument{}, found {found}",
            if expected == "1" { "" } else { "s" }
        ));
        TypeSchema::Unknown
    }

    fn resolve_subscript(&mut self, base: &str, args: &[TypeExpr]) -> TypeSchema {
        let simple = TypeExpr::simple_name(base);

        if let Some(family) = container(simple) {
            return match (family, args) {
                (Container::List, [item]) => TypeSchema::list(self.resolve(item)),
                (Container::Set, [item]) => TypeSchema::set(self.resolve(item)),
                (Container::Map, [key, value]) => {
                    TypeSchema::map(self.resolve(key), self.resolve(value))
                }
                (Container::Counter, [key]) => {
                    TypeSchema::map(self.resolve(key), TypeSchema::integer())
                }
                (Container::Tuple, [item, TypeExpr::Ellipsis]) => {
                    TypeSchema::list(self.resolve(item))
                }
                // `Tuple[()]`
                (Container::Tuple, [TypeExpr::List(items)]) if items.is_empty() => {
                    TypeSchema::list(TypeSchema::Unknown)
                }
                (Container::Tuple, items) => {
                    let variants: Vec<TypeSchema> =
                        items.iter().map(|item| self.resolve(item)).collect();
                    TypeSchema::list(TypeSchema::union_of(variants))
                }
                (Container::Map, _) => self.arity_mismatch(base, "2", args.len()),
                _ => self.arity_mismatch(base, "1", args.len()),
            };
        }

        match simple {
            "Optional" => match args {
                [inner] => TypeSchema::optional(self.resolve(inner)),
                _ => self.arity_mismatch(base, "1", args.len()),
            },
            "Union" => {
                let variants: Vec<TypeSchema> = args.iter().map(|arg| self.resolve(arg)).collect();
                TypeSchema::union_of(variants)
            }
            "Literal" => literal_schema(args),
            name if TRANSPARENT_WRAPPERS.contains(&name) => match args.first() {
                Some(inner) => self.resolve(inner),
                None => TypeSchema::Unknown,
            },
            "Callable" | "Type" | "type" => TypeSchema::Unknown,
            _ => match self.models.get(base) {
                // Generic model classes ignore their type arguments
                Some(model) => self.resolve_model(model),
                None => {
                    trace!(name = base, "Unresolved generic type");
                    TypeSchema::Unknown
                }
            },
        }
    }

    fn resolve_model(&mut self, model: &ModelDef) -> TypeSchema {
        match model.kind {
            ModelKind::Enum(primitive) => TypeSchema::primitive(primitive),
            ModelKind::Record => {
                if self.stack.iter().any(|name| name == &model.name) {
                    self.issues.push(format!(
                        "recursive reference to `{}` treated as unknown",
                        model.name
                    ));
                    return TypeSchema::Unknown;
                }
                self.stack.push(model.name.clone());
                let fields = model
                    .fields
                    .iter()
                    .map(|field| self.resolve_field(model, field))
                    .collect();
                self.stack.pop();
                TypeSchema::object(Some(model.name.clone()), fields)
            }
        }
    }

    fn resolve_field(&mut self, model: &ModelDef, field: &ModelField) -> ObjectField {
        let mut required = model.total && !field.has_default;
        let schema = match &field.expr {
            Ok(expr) => {
                if let TypeExpr::Subscript { base, .. } = expr {
                    match TypeExpr::simple_name(base) {
                        "Required" => required = !field.has_default,
                        "NotRequired" => required = false,
                        _ => {}
                    }
                }
                self.resolve(expr)
            }
            Err(err) => {
                self.issues.push(format!(
                    "unparsable annotation `{}` on field `{}.{}`: {err}",
                    abbreviate(&field.annotation),
                    model.name,
                    field.name
                ));
                TypeSchema::Unknown
            }
        };
        ObjectField {
            name: field.name.clone(),
            schema,
            required,
        }
    }
}

/// `Literal[...]` as an enumeration of its values; `None` makes it optional.
///
/// Values that are not plain constants, such as enum members, leave the
/// schema unknown.
fn literal_schema(args: &[TypeExpr]) -> TypeSchema {
    let mut values = Vec::new();
    let mut nullable = false;
    let mut pending: Vec<&TypeExpr> = args.iter().rev().collect();
    while let Some(arg) = pending.pop() {
        match arg {
            // Nested `Literal[...]` flattens
            TypeExpr::Subscript { base, args } if TypeExpr::simple_name(base) == "Literal" => {
                pending.extend(args.iter().rev());
            }
            TypeExpr::Name(name) if name == "None" => nullable = true,
            other => match literal_value(other) {
                Some(value) => values.push(value),
                None => {
                    trace!(value = %other, "Literal value is not a constant");
                    return TypeSchema::Unknown;
                }
            },
        }
    }

    let schema = if values.is_empty() {
        TypeSchema::null()
    } else {
        TypeSchema::enumeration(values)
    };
    if nullable {
        TypeSchema::optional(schema)
    } else {
        schema
    }
}

fn literal_value(expr: &TypeExpr) -> Option<Value> {
    match expr {
        TypeExpr::Str(value) => Some(Value::String(value.clone())),
        TypeExpr::Number(text) => number_value(text),
        TypeExpr::Name(name) if name == "True" => Some(Value::Bool(true)),
        TypeExpr::Name(name) if name == "False" => Some(Value::Bool(false)),
        _ => None,
    }
}

/// Primitive of a scalar schema, if it is one
pub fn primitive_of(schema: &TypeSchema) -> Option<Primitive> {
    match schema {
        TypeSchema::Primitive { primitive } => Some(*primitive),
        _ => None,
    }
}
