use super::{documents_at, log_failure};
use crate::registry::AnalyzerRegistry;
use lsp_types::CompletionItemKind;
use mdx_compiler::VirtualFile;
use std::ops::Range as ByteRange;

/// A completion candidate in source coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdxCompletion {
    pub label: String,
    pub kind: CompletionItemKind,
    pub detail: Option<String>,
    /// Source text the label replaces.
    pub edit_range: Option<ByteRange<usize>>,
}

/// Completions at the source cursor from the first document that offers any.
///
/// Candidates whose replacement range does not map back are dropped.
pub fn completions(
    file: &VirtualFile,
    registry: &AnalyzerRegistry,
    offset: usize,
) -> Vec<MdxCompletion> {
    documents_at(file, registry, offset)
        .find_map(|(service, document, generated)| {
            let items = log_failure(service.completions(document, generated), "completion")?;
            let translated: Vec<_> = items
                .into_iter()
                .filter_map(|item| {
                    let edit_range = match item.edit_range {
                        Some(range) => Some(document.to_source_range(range)?),
                        None => None,
                    };
                    Some(MdxCompletion {
                        label: item.label,
                        kind: item.kind,
                        detail: item.detail,
                        edit_range,
                    })
                })
                .collect();
            (!translated.is_empty()).then_some(translated)
        })
        .unwrap_or_default()
}
