//! Per-unit extraction pipeline
//!
//! Parses a source unit once and drives every stage over the resulting tree.
//! The free function [`extract`] uses the default configuration;
//! [`Extractor`] carries a loaded [`ToolmapConfig`](crate::config::ToolmapConfig)
//! and also fans out over many units with rayon.

pub mod extractor;
pub mod imports;
pub mod report;

pub use extractor::{extract, Extractor};
pub use imports::collect_mcp_imports;
pub use report::ReportBuilder;
