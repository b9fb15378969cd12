use super::log_failure;
use crate::registry::AnalyzerRegistry;
use lsp_types::FoldingRangeKind;
use mdx_compiler::VirtualFile;
use mdx_parser::{walk, NodeKind, SourceLocation};
use std::ops::Range as ByteRange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdxFoldingRange {
    pub start_line: u32,
    pub end_line: u32,
    pub kind: Option<FoldingRangeKind>,
}

fn fold_kind(kind: &NodeKind) -> Option<FoldingRangeKind> {
    match kind {
        NodeKind::ModuleBlock => Some(FoldingRangeKind::Imports),
        NodeKind::Frontmatter { .. }
        | NodeKind::BlockElement(_)
        | NodeKind::BlockExpression(_)
        | NodeKind::Code { .. }
        | NodeKind::Math => Some(FoldingRangeKind::Region),
        _ => None,
    }
}

fn line_range(
    location: &SourceLocation<'_>,
    span: &ByteRange<usize>,
    kind: Option<FoldingRangeKind>,
) -> Option<MdxFoldingRange> {
    if span.is_empty() {
        return None;
    }
    let start_line = location.byte_to_position(span.start).line as u32;
    let end_line = location.byte_to_position(span.end - 1).line as u32;
    (end_line > start_line).then_some(MdxFoldingRange {
        start_line,
        end_line,
        kind,
    })
}

/// Line-based folding ranges from the tree and from the services, deduplicated.
pub fn folding_ranges(file: &VirtualFile, registry: &AnalyzerRegistry) -> Vec<MdxFoldingRange> {
    let location = SourceLocation::new(file.source());
    let mut ranges = Vec::new();

    if let Some(ast) = file.ast() {
        walk(
            ast,
            &mut |node| {
                let (Some(kind), Some(span)) = (fold_kind(&node.kind), node.span.as_ref()) else {
                    return;
                };
                ranges.extend(line_range(&location, span, Some(kind)));
            },
            &mut |_| {},
        );
    }

    for document in file.all_documents() {
        let Some(service) = registry.service(document.language_tag()) else {
            continue;
        };
        for fold in log_failure(service.folding_ranges(document), "folding").unwrap_or_default() {
            if let Some(span) = document.to_source_range_enclosing(fold.range) {
                ranges.extend(line_range(&location, &span, fold.kind));
            }
        }
    }

    ranges.sort_by_key(|range| (range.start_line, range.end_line));
    ranges.dedup_by(|later, earlier| {
        later.start_line == earlier.start_line && later.end_line == earlier.end_line
    });
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::{file, registry, sample_file};

    fn lines(ranges: &[MdxFoldingRange]) -> Vec<(u32, u32)> {
        ranges.iter().map(|r| (r.start_line, r.end_line)).collect()
    }

    #[test]
    fn test_sample_folds() {
        let ranges = folding_ranges(&sample_file(), &registry());
        let found = lines(&ranges);
        for expected in [(0, 2), (4, 6), (12, 16), (20, 22), (18, 22)] {
            assert!(found.contains(&expected), "missing {expected:?} in {found:?}");
        }
        let imports = ranges.iter().find(|r| r.start_line == 4).unwrap();
        assert_eq!(imports.kind, Some(FoldingRangeKind::Imports));
    }

    #[test]
    fn test_folds_are_sorted_and_unique() {
        let ranges = lines(&folding_ranges(&sample_file(), &registry()));
        let mut sorted = ranges.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(ranges, sorted);
    }

    #[test]
    fn test_single_line_constructs_do_not_fold() {
        let ranges = folding_ranges(&file("<Box />\n\n# Title\n"), &registry());
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_parse_failure_has_no_folds() {
        let ranges = folding_ranges(&file("<Box>\n  text\n"), &registry());
        assert!(ranges.is_empty());
    }
}
