use super::{documents_at, log_failure};
use crate::registry::AnalyzerRegistry;
use mdx_compiler::VirtualFile;
use std::ops::Range as ByteRange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdxHover {
    pub range: Option<ByteRange<usize>>,
    /// Markdown
    pub contents: String,
}

/// Hover for the source offset, from the first document that answers.
pub fn hover(file: &VirtualFile, registry: &AnalyzerRegistry, offset: usize) -> Option<MdxHover> {
    documents_at(file, registry, offset).find_map(|(service, document, generated)| {
        let hover = log_failure(service.hover(document, generated), "hover")??;
        let range = match hover.range {
            Some(range) => Some(document.to_source_range(range)?),
            None => None,
        };
        Some(MdxHover {
            range,
            contents: hover.contents,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::{file, offset_of, registry, sample_file, SAMPLE};

    #[test]
    fn test_hover_on_component_shows_import() {
        let usage = offset_of(SAMPLE, "Chart", 1);
        let result = hover(&sample_file(), &registry(), usage + 1).unwrap();
        assert!(result.contents.contains("import {Chart} from './chart.js'"));
        assert_eq!(result.range, Some(usage..usage + 5));
    }

    #[test]
    fn test_hover_at_end_of_identifier() {
        let usage = offset_of(SAMPLE, "{year}", 0) + 1;
        let result = hover(&sample_file(), &registry(), usage + 4).unwrap();
        assert!(result.contents.contains("export const year = 2024"));
    }

    #[test]
    fn test_no_hover_in_prose_or_on_parse_failure() {
        let prose = offset_of(SAMPLE, "Revenue", 0);
        assert_eq!(hover(&sample_file(), &registry(), prose), None);

        let broken = file("import {Chart} from './chart.js'\n\n<Chart");
        assert_eq!(hover(&broken, &registry(), 9), None);
    }
}
