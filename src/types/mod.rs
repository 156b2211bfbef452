//! Type normalization
//!
//! Annotation nodes are read into a [`TypeExpr`], then mapped onto the
//! canonical [`TypeSchema`](crate::core::TypeSchema). Record-like classes
//! declared in the same unit are resolved through a [`ModelRegistry`].

pub mod expr;
pub mod models;
pub mod normalize;

pub use expr::{parse_type_expr, TypeExpr, TypeExprError, MAX_TYPE_DEPTH};
pub use models::{class_fields, ClassField, ModelDef, ModelField, ModelKind, ModelRegistry};
pub use normalize::{normalize_type, primitive_of, Normalized, TypeNormalizer};
