//! Source mappings
//!
//!     A [Mapping] relates byte ranges of the original MDX text to byte ranges of one generated
//!     document. Entry `i` states that `source[s_i..s_i + l_i]` appears verbatim at
//!     `generated[g_i..g_i + l_i]`. Entries never overlap in either space and an entry that
//!     continues the previous one in both spaces is merged into it, so the table is as small as
//!     the text allows.
//!
//!     Generated documents are written left to right, so entries arrive in ascending generated
//!     order. A second index keeps them in source order, which makes both lookup directions a
//!     binary search. That index is sorted once when the mapping is finished, not per entry.
//!
//!     [MappedText] couples the generated text with its mapping. Its `push_source` is the only
//!     way mapped content enters a generated document.

use std::ops::Range as ByteRange;

/// One `(source, generated, length)` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingEntry {
    pub source: usize,
    pub generated: usize,
    pub length: usize,
}

impl MappingEntry {
    pub fn source_range(&self) -> ByteRange<usize> {
        self.source..self.source + self.length
    }

    pub fn generated_range(&self) -> ByteRange<usize> {
        self.generated..self.generated + self.length
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    source_offsets: Vec<usize>,
    generated_offsets: Vec<usize>,
    lengths: Vec<usize>,
    /// Entry indices ordered by source offset once `index_sources` has run.
    by_source: Vec<usize>,
    /// Some entry was pushed with a source offset below its predecessor's.
    unsorted: bool,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping from `(source, generated, length)` entries in ascending generated order.
    pub fn from_entries(entries: impl IntoIterator<Item = (usize, usize, usize)>) -> Self {
        let mut mapping = Self::new();
        for (source, generated, length) in entries {
            mapping.push(source, generated, length);
        }
        mapping.index_sources();
        mapping
    }

    /// Record that `length` bytes at `source` appear at `generated`.
    ///
    /// Zero-length entries are ignored. Entries must be pushed in ascending generated order,
    /// and lookups by source need `index_sources` afterwards.
    pub(crate) fn push(&mut self, source: usize, generated: usize, length: usize) {
        if length == 0 {
            return;
        }

        if let Some(last) = self.lengths.len().checked_sub(1) {
            let last_length = self.lengths[last];
            debug_assert!(
                self.generated_offsets[last] + last_length <= generated,
                "mapping entries must be pushed in generated order"
            );
            if self.source_offsets[last] + last_length == source
                && self.generated_offsets[last] + last_length == generated
            {
                self.lengths[last] += length;
                return;
            }
        }

        let index = self.lengths.len();
        self.source_offsets.push(source);
        self.generated_offsets.push(generated);
        self.lengths.push(length);

        if let Some(&previous) = self.by_source.last() {
            self.unsorted |= self.source_offsets[previous] > source;
        }
        self.by_source.push(index);
    }

    /// Order the source index. Stable, so equal sources stay in generated order.
    pub(crate) fn index_sources(&mut self) {
        if self.unsorted {
            let offsets = &self.source_offsets;
            self.by_source.sort_by_key(|&entry| offsets[entry]);
            self.unsorted = false;
        }
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    pub fn source_offsets(&self) -> &[usize] {
        &self.source_offsets
    }

    pub fn generated_offsets(&self) -> &[usize] {
        &self.generated_offsets
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn entry(&self, index: usize) -> Option<MappingEntry> {
        Some(MappingEntry {
            source: *self.source_offsets.get(index)?,
            generated: self.generated_offsets[index],
            length: self.lengths[index],
        })
    }

    /// Entries in generated order.
    pub fn entries(&self) -> impl Iterator<Item = MappingEntry> + '_ {
        (0..self.len()).filter_map(|index| self.entry(index))
    }

    fn generated_entry_at(&self, offset: usize, cursor: bool) -> Option<usize> {
        let index = self
            .generated_offsets
            .partition_point(|&start| start <= offset)
            .checked_sub(1)?;
        let end = self.generated_offsets[index] + self.lengths[index];
        (offset < end || (cursor && offset == end)).then_some(index)
    }

    fn source_entry_at(&self, offset: usize, cursor: bool) -> Option<usize> {
        let position = self
            .by_source
            .partition_point(|&entry| self.source_offsets[entry] <= offset)
            .checked_sub(1)?;
        let index = self.by_source[position];
        let end = self.source_offsets[index] + self.lengths[index];
        (offset < end || (cursor && offset == end)).then_some(index)
    }

    /// Translate a source offset; `None` when no entry contains it.
    pub fn to_generated(&self, offset: usize) -> Option<usize> {
        let index = self.source_entry_at(offset, false)?;
        Some(self.generated_offsets[index] + offset - self.source_offsets[index])
    }

    /// Translate a generated offset; `None` when no entry contains it.
    pub fn to_source(&self, offset: usize) -> Option<usize> {
        let index = self.generated_entry_at(offset, false)?;
        Some(self.source_offsets[index] + offset - self.generated_offsets[index])
    }

    /// Like [`Mapping::to_generated`], but a cursor right after an entry still maps.
    pub fn to_generated_cursor(&self, offset: usize) -> Option<usize> {
        let index = self.source_entry_at(offset, true)?;
        Some(self.generated_offsets[index] + offset - self.source_offsets[index])
    }

    /// Like [`Mapping::to_source`], but a cursor right after an entry still maps.
    pub fn to_source_cursor(&self, offset: usize) -> Option<usize> {
        let index = self.generated_entry_at(offset, true)?;
        Some(self.source_offsets[index] + offset - self.generated_offsets[index])
    }

    /// Translate a generated range whose first and last bytes both map.
    ///
    /// Empty ranges are treated as cursors.
    pub fn to_source_range(&self, range: ByteRange<usize>) -> Option<ByteRange<usize>> {
        if range.is_empty() {
            let offset = self.to_source_cursor(range.start)?;
            return Some(offset..offset);
        }
        let start = self.to_source(range.start)?;
        let last = self.to_source(range.end - 1)?;
        (start <= last).then(|| start..last + 1)
    }

    /// Translate a source range whose first and last bytes both map.
    pub fn to_generated_range(&self, range: ByteRange<usize>) -> Option<ByteRange<usize>> {
        if range.is_empty() {
            let offset = self.to_generated_cursor(range.start)?;
            return Some(offset..offset);
        }
        let start = self.to_generated(range.start)?;
        let last = self.to_generated(range.end - 1)?;
        (start <= last).then(|| start..last + 1)
    }

    /// Translate the mapped parts of a generated range to the smallest enclosing source range.
    ///
    /// Used for ranges that legitimately cover unmapped scaffold text, such as a folding range
    /// spanning a whole element.
    pub fn to_source_range_enclosing(&self, range: ByteRange<usize>) -> Option<ByteRange<usize>> {
        if range.is_empty() {
            return self.to_source_range(range);
        }
        let mut enclosing: Option<ByteRange<usize>> = None;
        for entry in self.entries() {
            let generated = entry.generated_range();
            let start = generated.start.max(range.start);
            let end = generated.end.min(range.end);
            if start >= end {
                continue;
            }
            let source_start = entry.source + (start - entry.generated);
            let source_end = entry.source + (end - entry.generated);
            enclosing = Some(match enclosing {
                Some(found) => found.start.min(source_start)..found.end.max(source_end),
                None => source_start..source_end,
            });
        }
        enclosing
    }
}

/// Generated text and its mapping, built together.
#[derive(Debug, Clone)]
pub struct MappedText<'s> {
    source: &'s str,
    text: String,
    mapping: Mapping,
}

impl<'s> MappedText<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            text: String::with_capacity(source.len()),
            mapping: Mapping::new(),
        }
    }

    /// Copy `source[range]` and map it.
    pub fn push_source(&mut self, range: ByteRange<usize>) {
        let generated = self.text.len();
        self.text.push_str(&self.source[range.clone()]);
        self.mapping.push(range.start, generated, range.len());
    }

    /// Append text with no source counterpart.
    pub fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn finish(mut self) -> (String, Mapping) {
        self.mapping.index_sources();
        (self.text, self.mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(entries: &[(usize, usize, usize)]) -> Mapping {
        Mapping::from_entries(entries.iter().copied())
    }

    #[test]
    fn test_contiguous_entries_coalesce() {
        let mapping = mapping(&[(0, 10, 3), (3, 13, 2), (8, 15, 1)]);
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.lengths(), &[5, 1]);
    }

    #[test]
    fn test_contiguous_in_one_space_only_stays_separate() {
        let mapping = mapping(&[(0, 0, 3), (3, 4, 2)]);
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn test_zero_length_entries_are_ignored() {
        let mapping = mapping(&[(0, 0, 0), (4, 4, 0)]);
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_lookups_are_half_open() {
        let mapping = mapping(&[(5, 100, 4)]);
        assert_eq!(mapping.to_generated(4), None);
        assert_eq!(mapping.to_generated(5), Some(100));
        assert_eq!(mapping.to_generated(8), Some(103));
        assert_eq!(mapping.to_generated(9), None);
        assert_eq!(mapping.to_source(103), Some(8));
        assert_eq!(mapping.to_source(104), None);
    }

    #[test]
    fn test_cursor_lookups_accept_entry_end() {
        let mapping = mapping(&[(5, 100, 4)]);
        assert_eq!(mapping.to_generated_cursor(9), Some(104));
        assert_eq!(mapping.to_source_cursor(104), Some(9));
        assert_eq!(mapping.to_source_cursor(105), None);
    }

    #[test]
    fn test_source_lookup_with_out_of_order_sources() {
        // Module text first, then component markup that appears earlier in the source.
        let mapping = mapping(&[(20, 50, 5), (0, 80, 4)]);
        assert_eq!(mapping.to_generated(2), Some(82));
        assert_eq!(mapping.to_generated(22), Some(52));
        assert_eq!(mapping.to_generated(10), None);
    }

    #[test]
    fn test_source_index_over_two_ascending_parts() {
        // Two passes over the same source, like the module and code parts of a script.
        let source = "x".repeat(2000);
        let mut text = MappedText::new(&source);
        for pass in 0..2 {
            for start in (pass..2000).step_by(4) {
                text.push_str(" ");
                text.push_source(start..start + 1);
            }
        }
        let (generated, mapping) = text.finish();
        assert_eq!(mapping.len(), 1000);

        assert_eq!(mapping.to_generated(0), Some(1));
        assert_eq!(mapping.to_generated(1), Some(generated.len() / 2 + 1));
        assert_eq!(mapping.to_generated(2), None);
        for entry in mapping.entries() {
            assert_eq!(mapping.to_generated(entry.source), Some(entry.generated));
        }
    }

    #[test]
    fn test_range_translation() {
        let mapping = mapping(&[(0, 10, 4), (6, 20, 4)]);
        assert_eq!(mapping.to_source_range(11..13), Some(1..3));
        assert_eq!(mapping.to_source_range(12..14), Some(2..4));
        assert_eq!(mapping.to_source_range(13..16), None);
        assert_eq!(mapping.to_source_range(13..21), Some(3..7));
        assert_eq!(mapping.to_source_range(14..14), Some(4..4));
        assert_eq!(mapping.to_generated_range(6..10), Some(20..24));
    }

    #[test]
    fn test_enclosing_range_skips_scaffold() {
        let mapping = mapping(&[(0, 10, 4), (6, 20, 4)]);
        assert_eq!(mapping.to_source_range_enclosing(0..30), Some(0..10));
        assert_eq!(mapping.to_source_range_enclosing(12..22), Some(2..8));
        assert_eq!(mapping.to_source_range_enclosing(14..20), None);
    }

    #[test]
    fn test_mapped_text_records_pushes() {
        let source = "abc def";
        let mut text = MappedText::new(source);
        text.push_str("<<");
        text.push_source(0..3);
        text.push_str(" ");
        text.push_source(4..7);
        let (generated, mapping) = text.finish();

        assert_eq!(generated, "<<abc def");
        assert_eq!(mapping.len(), 2);
        for entry in mapping.entries() {
            assert_eq!(
                &generated[entry.generated_range()],
                &source[entry.source_range()]
            );
        }
    }
}
