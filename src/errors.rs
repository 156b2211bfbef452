//! Error types for toolmap operations.
//!
//! Only failures that prevent a report from being produced surface as
//! errors. Everything recoverable is collected as a
//! [`Diagnostic`](crate::core::Diagnostic) instead.
//!
//! # Error Codes
//!
//! - E010-E019: Parse errors
//! - E020-E029: Configuration errors

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Structured error code for documentation and programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ErrorCode(&'static str);

impl ErrorCode {
    /// Parse error - source could not be parsed into a syntax tree
    pub const PARSE_SYNTAX: ErrorCode = ErrorCode("E010");
    /// Parse error - grammar could not be loaded
    pub const PARSE_GRAMMAR: ErrorCode = ErrorCode("E011");

    /// Config error - invalid value
    pub const CONFIG_INVALID: ErrorCode = ErrorCode("E020");
    /// Config error - malformed TOML
    pub const CONFIG_MALFORMED: ErrorCode = ErrorCode("E021");
    /// Config error - file could not be read
    pub const CONFIG_UNREADABLE: ErrorCode = ErrorCode("E022");

    /// Get the error code string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fatal extraction failure: no partial report is produced
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Source text could not be parsed into a syntax tree
    #[error("Parse error in {unit}:{line}:{column}: {message}")]
    Parse {
        unit: String,
        line: usize,
        column: usize,
        message: String,
    },

    /// The tree-sitter grammar is incompatible with the linked runtime
    #[error("Failed to load Python grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),
}

impl ExtractError {
    /// Create a parse error with location
    pub fn parse(
        unit: impl Into<String>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Parse {
            unit: unit.into(),
            line,
            column,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ExtractError::Parse { .. } => ErrorCode::PARSE_SYNTAX,
            ExtractError::Grammar(_) => ErrorCode::PARSE_GRAMMAR,
        }
    }
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::Read { .. } => ErrorCode::CONFIG_UNREADABLE,
            ConfigError::Toml(_) => ErrorCode::CONFIG_MALFORMED,
            ConfigError::Invalid(_) => ErrorCode::CONFIG_INVALID,
        }
    }
}

/// Result type alias for extraction
pub type Result<T> = std::result::Result<T, ExtractError>;
