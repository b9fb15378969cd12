use super::log_failure;
use crate::registry::AnalyzerRegistry;
use crate::service::ServiceSymbol;
use lsp_types::SymbolKind;
use mdx_compiler::{VirtualDocument, VirtualFile};
use std::ops::Range as ByteRange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdxDocumentSymbol {
    pub name: String,
    pub detail: Option<String>,
    pub kind: SymbolKind,
    pub range: ByteRange<usize>,
    pub selection_range: ByteRange<usize>,
    pub children: Vec<MdxDocumentSymbol>,
}

/// Outline of the file: every service's symbols, translated and ordered by position.
pub fn document_symbols(file: &VirtualFile, registry: &AnalyzerRegistry) -> Vec<MdxDocumentSymbol> {
    let mut symbols: Vec<MdxDocumentSymbol> = file
        .all_documents()
        .filter_map(|document| {
            let service = registry.service(document.language_tag())?;
            let found = log_failure(service.document_symbols(document), "document symbols")?;
            Some(
                found
                    .into_iter()
                    .filter_map(|symbol| translate(document, symbol))
                    .collect::<Vec<_>>(),
            )
        })
        .flatten()
        .collect();
    symbols.sort_by_key(|symbol| symbol.range.start);
    symbols
}

/// Symbol ranges may span generated scaffolding, so they translate to the enclosing range.
fn translate(document: &VirtualDocument, symbol: ServiceSymbol) -> Option<MdxDocumentSymbol> {
    let range = document.to_source_range_enclosing(symbol.range)?;
    let selection_range = document
        .to_source_range_enclosing(symbol.selection_range)
        .filter(|selection| selection.start >= range.start && selection.end <= range.end)
        .unwrap_or_else(|| range.clone());
    Some(MdxDocumentSymbol {
        name: symbol.name,
        detail: symbol.detail,
        kind: symbol.kind,
        range,
        selection_range,
        children: symbol
            .children
            .into_iter()
            .filter_map(|child| translate(document, child))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::{file, offset_of, registry, sample_file, SAMPLE};

    #[test]
    fn test_outline_merges_bindings_and_headings() {
        let symbols = document_symbols(&sample_file(), &registry());
        let names: Vec<_> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Chart", "Unused", "year", "Results for"]);

        let results = &symbols[3];
        assert_eq!(results.children.len(), 1);
        assert_eq!(results.children[0].name, "Appendix");
        assert_eq!(results.selection_range.start, offset_of(SAMPLE, "# Results", 0));
        assert_eq!(symbols[2].kind, SymbolKind::CONSTANT);
    }

    #[test]
    fn test_selection_is_inside_range() {
        fn check(symbol: &MdxDocumentSymbol) {
            assert!(symbol.selection_range.start >= symbol.range.start);
            assert!(symbol.selection_range.end <= symbol.range.end);
            symbol.children.iter().for_each(check);
        }
        document_symbols(&sample_file(), &registry())
            .iter()
            .for_each(check);
    }

    #[test]
    fn test_broken_file_has_no_symbols() {
        assert!(document_symbols(&file("# Title\n\n<"), &registry()).is_empty());
    }
}
