// Test utility module for toolmap integration tests
#![allow(dead_code)]

use std::path::PathBuf;
use toolmap::{Descriptor, ExtractionReport, SourceUnit};

/// Path of a file under `tests/fixtures`
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Load a fixture as a source unit identified by its file name
pub fn load_fixture(name: &str) -> SourceUnit {
    let text = std::fs::read_to_string(fixture_path(name)).expect("Failed to read fixture");
    SourceUnit::new(name, text)
}

/// Extract an inline snippet with the default configuration
pub fn extract_snippet(code: &str) -> ExtractionReport {
    toolmap::extract(&SourceUnit::new("snippet.py", code)).expect("Snippet should parse")
}

pub fn descriptor_names(report: &ExtractionReport) -> Vec<&str> {
    report.descriptors.iter().map(|d| d.name.as_str()).collect()
}

pub fn parameter_names(descriptor: &Descriptor) -> Vec<&str> {
    descriptor.parameters.iter().map(|p| p.name.as_str()).collect()
}

pub fn diagnostic_messages(report: &ExtractionReport) -> Vec<&str> {
    report.diagnostics.iter().map(|d| d.message.as_str()).collect()
}
