//! Report accumulation for one unit

use crate::core::{Descriptor, Diagnostic, ExtractionReport};
use std::collections::BTreeMap;
use tracing::debug;

/// Collects descriptors and diagnostics while a unit is processed.
///
/// Descriptor names are unique per unit: a later declaration with an already
/// used name replaces the earlier one, which is reported as a warning.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    unit: String,
    slots: Vec<Option<Descriptor>>,
    by_name: BTreeMap<String, usize>,
    diagnostics: Vec<Diagnostic>,
    mcp_imports: Vec<String>,
}

impl ReportBuilder {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            ..Self::default()
        }
    }

    pub fn add_descriptor(&mut self, descriptor: Descriptor) {
        if let Some(&index) = self.by_name.get(&descriptor.name) {
            if let Some(earlier) = self.slots[index].take() {
                debug!(
                    name = %descriptor.name,
                    earlier = %earlier.location,
                    later = %descriptor.location,
                    "Duplicate declaration name"
                );
                self.diagnostics.push(
                    Diagnostic::warning(format!(
                        "duplicate declaration name `{}`: the {} at {} replaces the {} at {}",
                        descriptor.name,
                        descriptor.kind,
                        descriptor.location,
                        earlier.kind,
                        earlier.location
                    ))
                    .for_declaration(descriptor.name.as_str())
                    .at(earlier.location),
                );
            }
        }
        self.by_name.insert(descriptor.name.clone(), self.slots.len());
        self.slots.push(Some(descriptor));
    }

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub fn set_mcp_imports(&mut self, imports: Vec<String>) {
        self.mcp_imports = imports;
    }

    /// Finish the report. Diagnostics are ordered by source position;
    /// diagnostics without a span keep their relative order at the end.
    pub fn finish(self) -> ExtractionReport {
        let mut diagnostics = self.diagnostics;
        diagnostics.sort_by_key(|d| match d.span {
            Some(span) => (0, span.line, span.column),
            None => (1, 0, 0),
        });

        ExtractionReport {
            unit: self.unit,
            descriptors: self.slots.into_iter().flatten().collect(),
            diagnostics,
            mcp_imports: self.mcp_imports,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DeclarationKind, Returns, SourceSpan};
    use pretty_assertions::assert_eq;

    fn descriptor(name: &str, line: usize) -> Descriptor {
        Descriptor {
            kind: DeclarationKind::Tool,
            name: name.to_string(),
            description: String::new(),
            parameters: Vec::new(),
            returns: Returns::default(),
            uri: None,
            examples: Vec::new(),
            is_async: false,
            signature: format!("def {name}()"),
            location: SourceSpan::new(line, 1, line + 1, 1),
        }
    }

    #[test]
    fn test_later_duplicate_wins_in_its_own_position() {
        let mut builder = ReportBuilder::new("server.py");
        builder.add_descriptor(descriptor("dup", 1));
        builder.add_descriptor(descriptor("other", 5));
        builder.add_descriptor(descriptor("dup", 9));
        let report = builder.finish();

        let survivors: Vec<(&str, usize)> = report
            .descriptors
            .iter()
            .map(|d| (d.name.as_str(), d.location.line))
            .collect();
        assert_eq!(survivors, vec![("other", 5), ("dup", 9)]);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0]
            .message
            .starts_with("duplicate declaration name `dup`"));
        assert_eq!(report.diagnostics[0].span, Some(SourceSpan::new(1, 1, 2, 1)));
    }

    #[test]
    fn test_diagnostics_sorted_by_position() {
        let mut builder = ReportBuilder::new("server.py");
        builder.add_diagnostic(Diagnostic::warning("late").at(SourceSpan::point(10, 1)));
        builder.add_diagnostic(Diagnostic::warning("unplaced"));
        builder.add_diagnostic(Diagnostic::warning("early").at(SourceSpan::point(2, 5)));
        let report = builder.finish();
        let messages: Vec<&str> = report.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["early", "late", "unplaced"]);
    }
}
