//! Core data model shared by every extraction stage

pub mod report;
pub mod schema;
pub mod types;

pub use report::{Descriptor, Diagnostic, ExtractionReport, Returns, Severity};
pub use schema::{ObjectField, Primitive, TypeSchema};
pub use types::{DeclarationKind, Parameter, ParameterKind, SourceSpan, SourceUnit};
