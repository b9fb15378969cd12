//! Error types for MDX parsing

use std::ops::Range as ByteRange;
use thiserror::Error;

/// A fatal parse failure.
///
/// MDX has no error recovery: a document either parses completely or not at all. The span
/// points at the offending bytes; constructs that run off the end of the input report the
/// delimiter that opened them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: ByteRange<usize>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: ByteRange<usize>) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    /// Build an error covering the single character starting at `offset`.
    pub fn at_char(message: impl Into<String>, source: &str, offset: usize) -> Self {
        let width = source[offset..]
            .chars()
            .next()
            .map(char::len_utf8)
            .unwrap_or(0);
        Self::new(message, offset..offset + width)
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn len(&self) -> usize {
        self.span.end - self.span.start
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }
}

/// Type alias for parser results
pub type ParseResult<T> = Result<T, ParseError>;

/// Format source code context around an error location
///
/// Shows 2 lines before the error, the error line with >> marker, and 2 lines after.
/// All lines are numbered for easy reference.
pub fn format_source_context(source: &str, error: &ParseError) -> String {
    let error_line = source[..error.span.start.min(source.len())]
        .matches('\n')
        .count();
    let lines: Vec<&str> = source.lines().collect();

    let start_line = error_line.saturating_sub(2);
    let end_line = (error_line + 3).min(lines.len());

    let mut context = String::new();
    for (line_num, line) in lines.iter().enumerate().take(end_line).skip(start_line) {
        let marker = if line_num == error_line { ">>" } else { "  " };
        context.push_str(&format!("{} {:3} | {}\n", marker, line_num + 1, line));
    }
    context
}
