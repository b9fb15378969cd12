use super::log_failure;
use crate::registry::AnalyzerRegistry;
use crate::service::ServiceDiagnostic;
use lsp_types::DiagnosticSeverity;
use mdx_compiler::{VirtualDocument, VirtualFile};
use std::ops::Range as ByteRange;

/// Source reported for MDX syntax errors.
pub const PARSE_ERROR_SOURCE: &str = "mdx";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdxRelatedInformation {
    pub range: ByteRange<usize>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdxDiagnostic {
    pub range: ByteRange<usize>,
    pub severity: DiagnosticSeverity,
    pub code: Option<String>,
    pub message: String,
    pub source: String,
    pub related: Vec<MdxRelatedInformation>,
}

/// Diagnostics for the whole file, in source coordinates.
///
/// A file that does not parse gets exactly one diagnostic: the parse error. Otherwise every
/// service diagnostic whose range maps back is reported; related entries that do not map
/// back are dropped from it.
pub fn diagnostics(file: &VirtualFile, registry: &AnalyzerRegistry) -> Vec<MdxDiagnostic> {
    if let Some(error) = file.error() {
        return vec![MdxDiagnostic {
            range: error.span.clone(),
            severity: DiagnosticSeverity::ERROR,
            code: None,
            message: error.message.clone(),
            source: PARSE_ERROR_SOURCE.to_string(),
            related: Vec::new(),
        }];
    }

    let mut found = Vec::new();
    for document in file.all_documents() {
        let Some(service) = registry.service(document.language_tag()) else {
            continue;
        };
        let Some(reported) = log_failure(service.diagnostics(document), "diagnostics") else {
            continue;
        };
        for diagnostic in reported {
            match translate(document, diagnostic) {
                Some(diagnostic) => found.push(diagnostic),
                None => tracing::trace!(document = document.id(), "dropped unmapped diagnostic"),
            }
        }
    }
    found.sort_by_key(|diagnostic| (diagnostic.range.start, diagnostic.range.end));
    found
}

fn translate(document: &VirtualDocument, diagnostic: ServiceDiagnostic) -> Option<MdxDiagnostic> {
    let range = document.to_source_range(diagnostic.range)?;
    let related = diagnostic
        .related
        .into_iter()
        .filter_map(|info| {
            Some(MdxRelatedInformation {
                range: document.to_source_range(info.range)?,
                message: info.message,
            })
        })
        .collect();
    Some(MdxDiagnostic {
        range,
        severity: diagnostic.severity,
        code: diagnostic.code,
        message: diagnostic.message,
        source: diagnostic.source,
        related,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::{file, offset_of, registry, sample_file, SAMPLE};
    use crate::service::{LanguageService, RelatedInformation, ServiceResult};
    use mdx_compiler::LanguageTag;

    #[test]
    fn test_sample_reports_unused_import_and_unknown_component() {
        let diagnostics = diagnostics(&sample_file(), &registry());
        let reported: Vec<_> = diagnostics
            .iter()
            .map(|d| (d.code.as_deref().unwrap_or(""), &SAMPLE[d.range.clone()]))
            .collect();
        assert_eq!(
            reported,
            vec![("unused-import", "Unused"), ("undefined-component", "Callout")]
        );
        let callout = offset_of(SAMPLE, "Callout", 0);
        assert_eq!(diagnostics[1].range, callout..callout + "Callout".len());
    }

    #[test]
    fn test_parse_error_is_the_only_diagnostic() {
        let diagnostics = diagnostics(&file("import {Unused} from 'x'\n\n<"), &registry());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].source, PARSE_ERROR_SOURCE);
        assert_eq!(diagnostics[0].severity, DiagnosticSeverity::ERROR);
        assert_eq!(diagnostics[0].range.len(), 1);
    }

    struct Scaffolding;

    impl LanguageService for Scaffolding {
        fn language(&self) -> LanguageTag {
            LanguageTag::Script
        }

        fn diagnostics(&self, document: &VirtualDocument) -> ServiceResult<Vec<ServiceDiagnostic>> {
            let text = document.text();
            let component = text.find("MDXContent").unwrap();
            let tag = text.rfind("Box").unwrap();
            let diagnostic = |range: ByteRange<usize>| ServiceDiagnostic {
                range,
                severity: DiagnosticSeverity::ERROR,
                code: None,
                message: "bad".into(),
                source: "test".into(),
                related: vec![
                    RelatedInformation {
                        range: tag..tag + 3,
                        message: "mapped".into(),
                    },
                    RelatedInformation {
                        range: component..component + 3,
                        message: "scaffold".into(),
                    },
                ],
            };
            Ok(vec![diagnostic(component..component + 10), diagnostic(tag..tag + 3)])
        }
    }

    #[test]
    fn test_unmapped_diagnostics_and_related_entries_are_dropped() {
        let mut registry = registry();
        registry.register(Scaffolding);
        let source = "<Box />\n";
        let diagnostics = diagnostics(&file(source), &registry);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].range, 1..4);
        assert_eq!(diagnostics[0].related.len(), 1);
        assert_eq!(diagnostics[0].related[0].range, 1..4);
        assert_eq!(diagnostics[0].related[0].message, "mapped");
    }
}
