use super::documents_at;
use crate::registry::AnalyzerRegistry;
use crate::service::ServiceResult;
use mdx_compiler::VirtualFile;
use std::ops::Range as ByteRange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdxTextEdit {
    pub range: ByteRange<usize>,
    pub new_text: String,
}

/// Edits renaming the binding at `offset`, in source coordinates.
///
/// Service errors (an invalid name) are returned to the caller. Edits that land in
/// generated text are dropped.
pub fn rename(
    file: &VirtualFile,
    registry: &AnalyzerRegistry,
    offset: usize,
    new_name: &str,
) -> ServiceResult<Vec<MdxTextEdit>> {
    for (service, document, generated) in documents_at(file, registry, offset) {
        let edits = service.rename(document, generated, new_name)?;
        if edits.is_empty() {
            continue;
        }
        return Ok(edits
            .into_iter()
            .filter_map(|edit| {
                Some(MdxTextEdit {
                    range: document.to_source_range(edit.range)?,
                    new_text: edit.new_text,
                })
            })
            .collect());
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::{offset_of, registry, sample_file, SAMPLE};
    use crate::service::ServiceError;
    use pretty_assertions::assert_eq;

    fn apply(source: &str, mut edits: Vec<MdxTextEdit>) -> String {
        edits.sort_by_key(|edit| std::cmp::Reverse(edit.range.start));
        let mut text = source.to_string();
        for edit in edits {
            text.replace_range(edit.range, &edit.new_text);
        }
        text
    }

    #[test]
    fn test_rename_export_updates_every_expression() {
        let usage = offset_of(SAMPLE, "{year}", 0) + 1;
        let edits = rename(&sample_file(), &registry(), usage, "fiscalYear").unwrap();
        assert_eq!(edits.len(), 3);
        let renamed = apply(SAMPLE, edits);
        assert!(renamed.contains("export const fiscalYear = 2024"));
        assert!(renamed.contains("# Results for {fiscalYear}"));
        assert!(renamed.contains("Ask finance for {fiscalYear} details."));
    }

    #[test]
    fn test_rename_import_adds_alias() {
        let usage = offset_of(SAMPLE, "Chart", 1);
        let renamed = apply(
            SAMPLE,
            rename(&sample_file(), &registry(), usage, "Graph").unwrap(),
        );
        assert!(renamed.contains("import {Chart as Graph} from './chart.js'"));
        assert!(renamed.contains("See the <Graph data={[1, 2, 3]} /> below."));
    }

    #[test]
    fn test_invalid_name_is_an_error() {
        let usage = offset_of(SAMPLE, "Chart", 1);
        assert_eq!(
            rename(&sample_file(), &registry(), usage, "2fast"),
            Err(ServiceError::InvalidName("2fast".into()))
        );
    }
}
