//! Canonical, language-neutral type schema
//!
//! Every parameter and return value resolves to exactly one [`TypeSchema`]
//! node. The tree renders to JSON Schema through [`TypeSchema::to_json_schema`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Primitive value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    String,
    Integer,
    Number,
    Boolean,
    Null,
}

impl Primitive {
    /// JSON Schema `type` keyword for this primitive
    pub fn json_type(&self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Integer => "integer",
            Primitive::Number => "number",
            Primitive::Boolean => "boolean",
            Primitive::Null => "null",
        }
    }
}

/// Named field of an object schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectField {
    pub name: String,
    #[serde(rename = "type")]
    pub schema: TypeSchema,
    pub required: bool,
}

/// Canonical type tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeSchema {
    Primitive {
        primitive: Primitive,
    },
    /// Ordered list of `items`; `unique` marks set-like containers
    List {
        items: Box<TypeSchema>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        unique: bool,
    },
    /// Mapping with unique keys
    Map {
        key: Box<TypeSchema>,
        value: Box<TypeSchema>,
    },
    Union {
        variants: Vec<TypeSchema>,
    },
    /// Nullable wrapper
    Optional {
        inner: Box<TypeSchema>,
    },
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        fields: Vec<ObjectField>,
    },
    /// Closed set of constant values, as in `Literal["a", "b"]`
    Enum {
        values: Vec<Value>,
    },
    #[default]
    Unknown,
}

impl TypeSchema {
    pub fn primitive(primitive: Primitive) -> Self {
        TypeSchema::Primitive { primitive }
    }

    pub fn string() -> Self {
        Self::primitive(Primitive::String)
    }

    pub fn integer() -> Self {
        Self::primitive(Primitive::Integer)
    }

    pub fn number() -> Self {
        Self::primitive(Primitive::Number)
    }

    pub fn boolean() -> Self {
        Self::primitive(Primitive::Boolean)
    }

    pub fn null() -> Self {
        Self::primitive(Primitive::Null)
    }

    pub fn list(items: TypeSchema) -> Self {
        TypeSchema::List {
            items: Box::new(items),
            unique: false,
        }
    }

    pub fn set(items: TypeSchema) -> Self {
        TypeSchema::List {
            items: Box::new(items),
            unique: true,
        }
    }

    pub fn map(key: TypeSchema, value: TypeSchema) -> Self {
        TypeSchema::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// Wrap in `Optional`, never nesting optionals
    pub fn optional(inner: TypeSchema) -> Self {
        match inner {
            TypeSchema::Optional { .. } => inner,
            TypeSchema::Primitive {
                primitive: Primitive::Null,
            } => inner,
            other => TypeSchema::Optional {
                inner: Box::new(other),
            },
        }
    }

    pub fn object(name: Option<String>, fields: Vec<ObjectField>) -> Self {
        TypeSchema::Object { name, fields }
    }

    /// Enumeration of distinct values, first occurrence first
    pub fn enumeration(values: impl IntoIterator<Item = Value>) -> Self {
        let mut distinct: Vec<Value> = Vec::new();
        for value in values {
            if !distinct.contains(&value) {
                distinct.push(value);
            }
        }
        TypeSchema::Enum { values: distinct }
    }

    /// Build the canonical form of a union of alternatives.
    ///
    /// Nested unions are flattened and duplicates removed (first occurrence
    /// wins). A `null` alternative, directly or through an `Optional`, turns
    /// the result into `Optional` of the remaining alternatives. A single
    /// remaining alternative is returned as is.
    pub fn union_of(variants: impl IntoIterator<Item = TypeSchema>) -> Self {
        let mut flat: Vec<TypeSchema> = Vec::new();
        let mut nullable = false;

        let mut pending: Vec<TypeSchema> = variants.into_iter().collect();
        pending.reverse();
        while let Some(variant) = pending.pop() {
            match variant {
                TypeSchema::Union { variants } => {
                    pending.extend(variants.into_iter().rev());
                }
                TypeSchema::Optional { inner } => {
                    nullable = true;
                    pending.push(*inner);
                }
                TypeSchema::Primitive {
                    primitive: Primitive::Null,
                } => nullable = true,
                other => {
                    if !flat.contains(&other) {
                        flat.push(other);
                    }
                }
            }
        }

        let core = match flat.len() {
            0 => return TypeSchema::null(),
            1 => flat.remove(0),
            _ => TypeSchema::Union { variants: flat },
        };

        if nullable {
            TypeSchema::optional(core)
        } else {
            core
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, TypeSchema::Unknown)
    }

    pub fn is_nullable(&self) -> bool {
        matches!(
            self,
            TypeSchema::Optional { .. }
                | TypeSchema::Primitive {
                    primitive: Primitive::Null
                }
        )
    }

    /// The schema with one level of `Optional` removed
    pub fn without_optional(&self) -> &TypeSchema {
        match self {
            TypeSchema::Optional { inner } => inner,
            other => other,
        }
    }

    /// Structural agreement of two schemas.
    ///
    /// `Unknown` at any depth agrees with anything, optionality is ignored,
    /// and an enumeration agrees with the primitive all of its values share.
    pub fn is_compatible_with(&self, other: &TypeSchema) -> bool {
        match (self.without_optional(), other.without_optional()) {
            (TypeSchema::Unknown, _) | (_, TypeSchema::Unknown) => true,
            (TypeSchema::Primitive { primitive: a }, TypeSchema::Primitive { primitive: b }) => {
                a == b
            }
            (
                TypeSchema::List {
                    items: a,
                    unique: unique_a,
                },
                TypeSchema::List {
                    items: b,
                    unique: unique_b,
                },
            ) => unique_a == unique_b && a.is_compatible_with(b),
            (
                TypeSchema::Map {
                    key: key_a,
                    value: value_a,
                },
                TypeSchema::Map {
                    key: key_b,
                    value: value_b,
                },
            ) => key_a.is_compatible_with(key_b) && value_a.is_compatible_with(value_b),
            (TypeSchema::Union { variants: a }, TypeSchema::Union { variants: b }) => {
                let covered = |from: &[TypeSchema], to: &[TypeSchema]| {
                    from.iter()
                        .all(|variant| to.iter().any(|other| variant.is_compatible_with(other)))
                };
                covered(a.as_slice(), b.as_slice()) && covered(b.as_slice(), a.as_slice())
            }
            (
                TypeSchema::Object {
                    name: name_a,
                    fields: a,
                },
                TypeSchema::Object {
                    name: name_b,
                    fields: b,
                },
            ) => {
                name_a == name_b
                    && a.len() == b.len()
                    && a.iter().zip(b).all(|(field_a, field_b)| {
                        field_a.name == field_b.name
                            && field_a.schema.is_compatible_with(&field_b.schema)
                    })
            }
            (TypeSchema::Enum { values: a }, TypeSchema::Enum { values: b }) => {
                a.len() == b.len() && a.iter().all(|value| b.contains(value))
            }
            (TypeSchema::Enum { values }, TypeSchema::Primitive { primitive })
            | (TypeSchema::Primitive { primitive }, TypeSchema::Enum { values }) => {
                shared_primitive(values) == Some(*primitive)
            }
            _ => false,
        }
    }

    /// Render as a JSON Schema fragment
    pub fn to_json_schema(&self) -> Value {
        match self {
            TypeSchema::Primitive { primitive } => json!({ "type": primitive.json_type() }),
            TypeSchema::List { items, unique } => {
                let mut schema = json!({ "type": "array", "items": items.to_json_schema() });
                if *unique {
                    schema["uniqueItems"] = Value::Bool(true);
                }
                schema
            }
            // JSON object keys are always strings; the declared key type is
            // kept in the canonical tree only.
            TypeSchema::Map { value, .. } => json!({
                "type": "object",
                "additionalProperties": value.to_json_schema(),
            }),
            TypeSchema::Union { variants } => json!({
                "anyOf": variants.iter().map(TypeSchema::to_json_schema).collect::<Vec<_>>(),
            }),
            TypeSchema::Optional { inner } => json!({
                "anyOf": [inner.to_json_schema(), { "type": "null" }],
            }),
            TypeSchema::Object { name, fields } => {
                let mut properties = Map::new();
                let mut required = Vec::new();
                for field in fields {
                    properties.insert(field.name.clone(), field.schema.to_json_schema());
                    if field.required {
                        required.push(Value::String(field.name.clone()));
                    }
                }
                let mut schema = json!({ "type": "object", "properties": properties });
                if !required.is_empty() {
                    schema["required"] = Value::Array(required);
                }
                if let Some(name) = name {
                    schema["title"] = Value::String(name.clone());
                }
                schema
            }
            TypeSchema::Enum { values } => {
                let mut schema = json!({ "enum": values });
                if let Some(primitive) = shared_primitive(values) {
                    schema["type"] = Value::String(primitive.json_type().to_string());
                }
                schema
            }
            TypeSchema::Unknown => json!({}),
        }
    }
}

/// Primitive common to every value of an enumeration
fn shared_primitive(values: &[Value]) -> Option<Primitive> {
    let of = |value: &Value| match value {
        Value::String(_) => Some(Primitive::String),
        Value::Bool(_) => Some(Primitive::Boolean),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(Primitive::Integer),
        Value::Number(_) => Some(Primitive::Number),
        _ => None,
    };
    let mut kinds = values.iter().map(of);
    let first = kinds.next()??;
    kinds.try_fold(first, |shared, kind| match (shared, kind?) {
        (a, b) if a == b => Some(a),
        (Primitive::Integer, Primitive::Number) | (Primitive::Number, Primitive::Integer) => {
            Some(Primitive::Number)
        }
        _ => None,
    })
}

impl fmt::Display for TypeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSchema::Primitive { primitive } => f.write_str(primitive.json_type()),
            TypeSchema::List { items, unique } => {
                let name = if *unique { "set" } else { "list" };
                write!(f, "{name}<{items}>")
            }
            TypeSchema::Map { key, value } => write!(f, "map<{key}, {value}>"),
            TypeSchema::Union { variants } => {
                for (i, variant) in variants.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{variant}")?;
                }
                Ok(())
            }
            TypeSchema::Optional { inner } => write!(f, "optional<{inner}>"),
            TypeSchema::Object { name: Some(name), .. } => write!(f, "object {name}"),
            TypeSchema::Object { name: None, .. } => f.write_str("object"),
            TypeSchema::Enum { values } => {
                f.write_str("enum<")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str(">")
            }
            TypeSchema::Unknown => f.write_str("unknown"),
        }
    }
}
