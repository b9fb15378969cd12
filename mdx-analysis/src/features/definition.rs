use super::{documents_at, log_failure};
use crate::registry::AnalyzerRegistry;
use mdx_compiler::VirtualFile;
use std::ops::Range as ByteRange;

/// Source ranges of the declarations the identifier at `offset` refers to.
pub fn definition(
    file: &VirtualFile,
    registry: &AnalyzerRegistry,
    offset: usize,
) -> Vec<ByteRange<usize>> {
    documents_at(file, registry, offset)
        .find_map(|(service, document, generated)| {
            let targets: Vec<_> = log_failure(service.definition(document, generated), "definition")?
                .into_iter()
                .filter_map(|range| document.to_source_range(range))
                .collect();
            (!targets.is_empty()).then_some(targets)
        })
        .unwrap_or_default()
}
