//! Shadow documents
//!
//! A shadow is the source text with every byte outside one classification blanked out.
//! Whitespace is copied into every shadow so lines and columns stay where they were, and each
//! blanked character becomes one space per UTF-8 byte, so a shadow always has exactly the
//! source's byte length.

use crate::classify::RangeSet;
use std::ops::Range as ByteRange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shadows {
    pub module: String,
    pub code: String,
}

/// Walks a sorted, non-overlapping range list in step with a left-to-right sweep.
struct Cursor<'r> {
    ranges: &'r [ByteRange<usize>],
    index: usize,
}

impl<'r> Cursor<'r> {
    fn new(ranges: &'r [ByteRange<usize>]) -> Self {
        Self { ranges, index: 0 }
    }

    /// Offsets must be queried in ascending order.
    fn covers(&mut self, offset: usize) -> bool {
        while self
            .ranges
            .get(self.index)
            .is_some_and(|range| range.end <= offset)
        {
            self.index += 1;
        }
        self.ranges
            .get(self.index)
            .is_some_and(|range| range.start <= offset)
    }
}

fn push_blank(shadow: &mut String, ch: char) {
    for _ in 0..ch.len_utf8() {
        shadow.push(' ');
    }
}

/// Build the module and code shadows of `source` in one sweep.
pub fn synthesize(source: &str, module: &RangeSet, code: &RangeSet) -> Shadows {
    let mut shadows = Shadows {
        module: String::with_capacity(source.len()),
        code: String::with_capacity(source.len()),
    };
    let mut in_module = Cursor::new(module.merged());
    let mut in_code = Cursor::new(code.merged());

    for (offset, ch) in source.char_indices() {
        if ch.is_whitespace() {
            shadows.module.push(ch);
            shadows.code.push(ch);
            continue;
        }

        if in_module.covers(offset) {
            shadows.module.push(ch);
        } else {
            push_blank(&mut shadows.module, ch);
        }

        if in_code.covers(offset) {
            shadows.code.push(ch);
        } else {
            push_blank(&mut shadows.code, ch);
        }
    }

    shadows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_characters_survive() {
        let source = "ab cd\nef";
        let shadows = synthesize(
            source,
            &RangeSet::new(vec![0..2]),
            &RangeSet::new(vec![3..5, 7..8]),
        );
        assert_eq!(shadows.module, "ab   \n  ");
        assert_eq!(shadows.code, "   cd\n f");
    }

    #[test]
    fn test_multibyte_characters_keep_byte_length() {
        let source = "é{x}😀";
        let shadows = synthesize(source, &RangeSet::default(), &RangeSet::new(vec![2..5]));
        assert_eq!(shadows.module.len(), source.len());
        assert_eq!(shadows.code, "  {x}    ");
    }

    #[test]
    fn test_unicode_whitespace_is_preserved() {
        let source = "a\u{a0}b\tc";
        let shadows = synthesize(source, &RangeSet::default(), &RangeSet::default());
        assert_eq!(shadows.code, " \u{a0} \t ");
        assert_eq!(shadows.code.len(), source.len());
    }
}
