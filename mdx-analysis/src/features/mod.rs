//! Mapping-dependent editor features
//!
//!     Each feature takes a compiled [VirtualFile], the [AnalyzerRegistry] and positions as
//!     byte offsets into the MDX source. It asks the services about the virtual documents in
//!     generated coordinates and translates every answer back to source byte ranges.
//!     Anything that does not map back is dropped. Conversion to editor positions happens in
//!     the server.

pub mod completion;
pub mod definition;
pub mod diagnostics;
pub mod document_symbols;
pub mod folding_ranges;
pub mod hover;
pub mod rename;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

use crate::registry::AnalyzerRegistry;
use crate::service::{LanguageService, ServiceResult};
use mdx_compiler::{VirtualDocument, VirtualFile};

/// Documents whose mapping covers the source cursor, with their service and the cursor in
/// generated coordinates. Top-level documents come before their embedded ones.
pub(crate) fn documents_at<'a>(
    file: &'a VirtualFile,
    registry: &'a AnalyzerRegistry,
    offset: usize,
) -> impl Iterator<Item = (&'a dyn LanguageService, &'a VirtualDocument, usize)> + 'a {
    file.all_documents().filter_map(move |document| {
        let generated = document.to_generated_cursor(offset)?;
        let service = registry.service(document.language_tag())?;
        Some((service, document, generated))
    })
}

/// Log a failed service call and carry on without its answer.
pub(crate) fn log_failure<T>(result: ServiceResult<T>, feature: &str) -> Option<T> {
    result
        .map_err(|error| tracing::warn!(%error, feature, "language service request failed"))
        .ok()
}
