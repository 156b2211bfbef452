//! Static metadata extraction for Python MCP servers.
//!
//! Reads FastMCP-style server source without executing it and produces a
//! descriptor for every function or class marked as a tool, resource or
//! prompt: name, description, parameters with JSON-schema types, return
//! type, examples and source location.

pub mod assembler;
pub mod config;
pub mod core;
pub mod docstring;
pub mod errors;
pub mod extraction;
pub mod scanner;
pub mod signature;
pub mod syntax;
pub mod types;

// Re-export commonly used types
pub use crate::core::{
    DeclarationKind, Descriptor, Diagnostic, ExtractionReport, ObjectField, Parameter,
    ParameterKind, Primitive, Returns, Severity, SourceSpan, SourceUnit, TypeSchema,
};

pub use crate::config::{
    load_config, load_config_from, load_config_near, DocstringConfig, DocstringStyle,
    MarkerConfig, ScanConfig, ToolmapConfig,
};

pub use crate::errors::{ConfigError, ErrorCode, ExtractError, Result};

pub use crate::extraction::{extract, Extractor};

pub use crate::types::{normalize_type, parse_type_expr, TypeExpr};
