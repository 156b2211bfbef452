//! Single-pass extraction of one source unit.
//!
//! `Extractor` parses a unit exactly once and runs every stage over the same
//! tree: declaration scan, signature interpretation, docstring parsing, type
//! normalization and assembly. The tree is dropped when the call returns.
//!
//! # Usage
//!
//! ```rust,ignore
//! use toolmap::{Extractor, SourceUnit};
//!
//! let unit = SourceUnit::new("server.py", std::fs::read_to_string("server.py")?);
//! let report = Extractor::default().extract(&unit)?;
//!
//! for tool in report.tools() {
//!     println!("{} ({} parameters)", tool.name, tool.parameters.len());
//! }
//! ```

use super::imports::collect_mcp_imports;
use super::report::ReportBuilder;
use crate::assembler::SchemaAssembler;
use crate::config::ToolmapConfig;
use crate::core::{Diagnostic, ExtractionReport, SourceUnit};
use crate::errors::Result;
use crate::scanner::DeclarationScanner;
use crate::signature::SignatureInterpreter;
use crate::syntax::{check_module_structure, parse_source};
use crate::types::{ModelRegistry, TypeNormalizer};
use rayon::prelude::*;
use tracing::{debug, debug_span};

/// Extracts tool, resource and prompt descriptors from Python source units
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ToolmapConfig,
}

impl Extractor {
    pub fn new(config: ToolmapConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToolmapConfig {
        &self.config
    }

    /// Extract every marked declaration of one unit.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Parse`](crate::errors::ExtractError::Parse)
    /// when the unit's module structure cannot be recovered, and
    /// [`ExtractError::Grammar`](crate::errors::ExtractError::Grammar) when
    /// the Python grammar cannot be loaded. Problems confined to a single
    /// declaration are reported as diagnostics instead.
    pub fn extract(&self, unit: &SourceUnit) -> Result<ExtractionReport> {
        let _span = debug_span!("extract_unit", unit = %unit.id).entered();

        let tree = parse_source(&unit.text, &unit.id)?;
        check_module_structure(&tree, &unit.id)?;

        let root = tree.root_node();
        let source = unit.text.as_str();

        let models = ModelRegistry::collect(&root, source);
        let normalizer = TypeNormalizer::new(&models);
        let interpreter = SignatureInterpreter::new(&normalizer);
        let assembler = SchemaAssembler::new(&normalizer, &self.config.docstring);

        let scan = DeclarationScanner::new(&self.config).scan(&root, source);

        let mut builder = ReportBuilder::new(unit.id.as_str());
        builder.set_mcp_imports(collect_mcp_imports(&root, source));
        builder.extend_diagnostics(scan.diagnostics);

        for declaration in &scan.declarations {
            match interpreter.interpret(declaration, source) {
                Ok(signature) => {
                    let assembly = assembler.assemble(declaration, signature);
                    builder.extend_diagnostics(assembly.diagnostics);
                    builder.add_descriptor(assembly.descriptor);
                }
                Err(reason) => {
                    let name = declaration.descriptor_name();
                    debug!(name, reason = %reason, "Skipping declaration");
                    builder.add_diagnostic(
                        Diagnostic::error(format!("declaration skipped: {reason}"))
                            .for_declaration(name)
                            .at(reason.span()),
                    );
                }
            }
        }

        let report = builder.finish();
        debug!(
            models = models.len(),
            descriptors = report.descriptors.len(),
            diagnostics = report.diagnostics.len(),
            "Extracted unit"
        );
        Ok(report)
    }

    /// Extract many units in parallel. Results keep the order of `units`;
    /// each unit succeeds or fails on its own.
    pub fn extract_all(&self, units: &[SourceUnit]) -> Vec<Result<ExtractionReport>> {
        units.par_iter().map(|unit| self.extract(unit)).collect()
    }

    /// Extract in parallel, `batch_size` units at a time
    pub fn extract_batch(
        &self,
        units: &[SourceUnit],
        batch_size: usize,
    ) -> Vec<(String, Result<ExtractionReport>)> {
        let mut results = Vec::with_capacity(units.len());

        for batch in units.chunks(batch_size.max(1)) {
            let batch_results: Vec<_> = batch
                .par_iter()
                .map(|unit| (unit.id.clone(), self.extract(unit)))
                .collect();
            results.extend(batch_results);
        }

        results
    }
}

/// Extract one unit with the default configuration
pub fn extract(unit: &SourceUnit) -> Result<ExtractionReport> {
    Extractor::default().extract(unit)
}
