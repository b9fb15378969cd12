//! Position and location tracking for source code locations
//!
//! This module defines the data structures for representing positions and locations in MDX
//! sources, as well as utilities for converting byte offsets to line/column positions.
//!
//! ## Types
//!
//! - [`Position`] - A line:column position in source code
//! - [`Range`] - A source code range with start/end positions and byte span
//! - [`SourceLocation`] - Utility for converting between byte offsets and positions
//!
//! ## Key Design
//!
//! - **Byte offsets are canonical**: the tree, the compiler and every mapping table speak
//!   byte offsets. Line/column pairs only exist at the edges.
//! - **Two column units**: byte columns for internal display, UTF-16 columns for the editor
//!   protocol, which counts UTF-16 code units by default.
//! - **Efficient conversion**: O(log n) binary search over precomputed line starts.

use std::fmt;
use std::ops::Range as ByteRange;

/// Represents a position in source code (line and column, both zero-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Represents a location in source code (start and end positions)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Range {
    pub span: ByteRange<usize>,
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(span: ByteRange<usize>, start: Position, end: Position) -> Self {
        Self { span, start, end }
    }

    /// Check if a position is contained within this location
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Whether the range covers more than one line.
    pub fn is_multiline(&self) -> bool {
        self.end.line > self.start.line
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::new(0..0, Position::default(), Position::default())
    }
}

/// Provides fast conversion between byte offsets and line/column positions
#[derive(Debug, Clone)]
pub struct SourceLocation<'a> {
    source: &'a str,
    /// Byte offsets where each line starts
    line_starts: Vec<usize>,
}

impl<'a> SourceLocation<'a> {
    /// Create a new SourceLocation from source code
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];

        for (byte_pos, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(byte_pos + 1);
            }
        }

        Self {
            source,
            line_starts,
        }
    }

    fn line_of(&self, byte_offset: usize) -> usize {
        self.line_starts
            .binary_search(&byte_offset)
            .unwrap_or_else(|i| i - 1)
    }

    fn line_end(&self, line: usize) -> usize {
        self.line_starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.source.len())
    }

    /// Convert a byte offset to a line/column position with a byte column
    pub fn byte_to_position(&self, byte_offset: usize) -> Position {
        let byte_offset = byte_offset.min(self.source.len());
        let line = self.line_of(byte_offset);
        Position::new(line, byte_offset - self.line_starts[line])
    }

    /// Convert a byte offset to a position whose column counts UTF-16 code units
    pub fn offset_to_utf16_position(&self, byte_offset: usize) -> Position {
        let byte_offset = self.floor_char_boundary(byte_offset.min(self.source.len()));
        let line = self.line_of(byte_offset);
        let column = self.source[self.line_starts[line]..byte_offset]
            .chars()
            .map(char::len_utf16)
            .sum();
        Position::new(line, column)
    }

    /// Convert a UTF-16 position back to a byte offset.
    ///
    /// Lines past the end clamp to the end of the source, columns past the end of their line
    /// clamp to the line end (before the newline).
    pub fn utf16_position_to_offset(&self, position: Position) -> usize {
        let Some(&line_start) = self.line_starts.get(position.line) else {
            return self.source.len();
        };
        let line_end = self.line_end(position.line);
        let mut remaining = position.column;
        for (idx, ch) in self.source[line_start..line_end].char_indices() {
            if remaining == 0 {
                return line_start + idx;
            }
            remaining = remaining.saturating_sub(ch.len_utf16());
        }
        line_end
    }

    /// Convert a byte range to a location
    pub fn byte_range_to_ast_range(&self, range: &ByteRange<usize>) -> Range {
        Range::new(
            range.clone(),
            self.byte_to_position(range.start),
            self.byte_to_position(range.end),
        )
    }

    /// Convert a byte range to a location with UTF-16 columns
    pub fn byte_range_to_utf16_range(&self, range: &ByteRange<usize>) -> Range {
        Range::new(
            range.clone(),
            self.offset_to_utf16_position(range.start),
            self.offset_to_utf16_position(range.end),
        )
    }

    /// Get the total number of lines in the source
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Get the byte offset for the start of a line
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    fn floor_char_boundary(&self, mut offset: usize) -> usize {
        while offset > 0 && !self.source.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_comparison() {
        let pos1 = Position::new(1, 5);
        let pos2 = Position::new(1, 5);
        let pos3 = Position::new(2, 3);

        assert_eq!(pos1, pos2);
        assert_ne!(pos1, pos3);
        assert!(pos1 < pos3);
    }

    #[test]
    fn test_location_contains_multiline() {
        let location = Range::new(0..0, Position::new(1, 5), Position::new(2, 10));

        assert!(!location.contains(Position::new(1, 4)));
        assert!(location.contains(Position::new(1, 5)));
        assert!(location.contains(Position::new(2, 0)));
        assert!(location.contains(Position::new(2, 10)));
        assert!(!location.contains(Position::new(2, 11)));
        assert!(location.is_multiline());
    }

    #[test]
    fn test_location_display() {
        let location = Range::new(0..0, Position::new(1, 0), Position::new(2, 5));
        assert_eq!(format!("{}", location), "1:0..2:5");
    }

    #[test]
    fn test_byte_to_position_multiline() {
        let loc = SourceLocation::new("Hello\nworld\ntest");

        assert_eq!(loc.byte_to_position(0), Position::new(0, 0));
        assert_eq!(loc.byte_to_position(5), Position::new(0, 5));
        assert_eq!(loc.byte_to_position(6), Position::new(1, 0));
        assert_eq!(loc.byte_to_position(10), Position::new(1, 4));
        assert_eq!(loc.byte_to_position(12), Position::new(2, 0));
        assert_eq!(loc.byte_to_position(15), Position::new(2, 3));
    }

    #[test]
    fn test_utf16_columns_count_code_units() {
        // "é" is 2 bytes / 1 UTF-16 unit, "😀" is 4 bytes / 2 UTF-16 units
        let source = "é😀x\nab";
        let loc = SourceLocation::new(source);
        let x = source.find('x').unwrap();

        assert_eq!(loc.byte_to_position(x), Position::new(0, 6));
        assert_eq!(loc.offset_to_utf16_position(x), Position::new(0, 3));
        assert_eq!(loc.utf16_position_to_offset(Position::new(0, 3)), x);
    }

    #[test]
    fn test_utf16_position_to_offset_clamps() {
        let loc = SourceLocation::new("abc\nde");
        assert_eq!(loc.utf16_position_to_offset(Position::new(0, 99)), 3);
        assert_eq!(loc.utf16_position_to_offset(Position::new(1, 1)), 5);
        assert_eq!(loc.utf16_position_to_offset(Position::new(7, 0)), 6);
    }

    #[test]
    fn test_utf16_round_trip_at_line_end() {
        let source = "ab\ncd";
        let loc = SourceLocation::new(source);
        for offset in 0..=source.len() {
            let position = loc.offset_to_utf16_position(offset);
            assert_eq!(loc.utf16_position_to_offset(position), offset);
        }
    }

    #[test]
    fn test_range_to_location_multiline() {
        let loc = SourceLocation::new("Hello\nWorld\nTest");
        let location = loc.byte_range_to_ast_range(&(6..12));

        assert_eq!(location.start, Position::new(1, 0));
        assert_eq!(location.end, Position::new(2, 0));
    }

    #[test]
    fn test_line_start() {
        let loc = SourceLocation::new("Hello\nWorld\nTest");

        assert_eq!(loc.line_count(), 3);
        assert_eq!(loc.line_start(0), Some(0));
        assert_eq!(loc.line_start(1), Some(6));
        assert_eq!(loc.line_start(2), Some(12));
        assert_eq!(loc.line_start(3), None);
    }
}
