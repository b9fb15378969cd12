//! Script tokenizer
//!
//!     MDX defers embedded JavaScript to a real JavaScript toolchain, but the parser still has
//!     to know where an `{expression}` or an ESM block ends. That needs only a coarse view of
//!     the language: strings, template literals and comments can hide braces, everything else
//!     is opaque words and punctuation. This module provides that view with a logos lexer.
//!
//!     Template literals are lexed as one token, so `${...}` holes never count as braces.

use super::ast::ParseError;
use logos::{Lexer, Logos};
use std::ops::Range as ByteRange;

/// Coarse JavaScript tokens
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptToken {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    DoubleQuoted,

    #[regex(r"'([^'\\\n]|\\.)*'")]
    SingleQuoted,

    #[regex(r"`([^`\\]|\\(.|\n))*`")]
    Template,

    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token("/")]
    Slash,

    // Everything else up to the next delimiter
    #[regex(r#"[^{}()\[\]"'`/ \t\r\n\f]+"#)]
    Word,
}

/// Consume a block comment up to its `*/`; an unclosed comment is a lexing error.
fn block_comment(lex: &mut Lexer<ScriptToken>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => false,
    }
}

impl ScriptToken {
    /// Whitespace and comments carry no code.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            ScriptToken::Whitespace | ScriptToken::LineComment | ScriptToken::BlockComment
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(
            self,
            ScriptToken::DoubleQuoted | ScriptToken::SingleQuoted | ScriptToken::Template
        )
    }

    fn closer(&self) -> Option<ScriptToken> {
        match self {
            ScriptToken::OpenBrace => Some(ScriptToken::CloseBrace),
            ScriptToken::OpenParen => Some(ScriptToken::CloseParen),
            ScriptToken::OpenBracket => Some(ScriptToken::CloseBracket),
            _ => None,
        }
    }

    fn is_closer(&self) -> bool {
        matches!(
            self,
            ScriptToken::CloseBrace | ScriptToken::CloseParen | ScriptToken::CloseBracket
        )
    }
}

/// Tokenize `text`, yielding tokens with absolute byte ranges starting at `base`.
///
/// Unterminated strings, templates and stray quotes come out as `Err(())`.
pub fn tokenize(
    text: &str,
    base: usize,
) -> impl Iterator<Item = (Result<ScriptToken, ()>, ByteRange<usize>)> + '_ {
    ScriptToken::lexer(text)
        .spanned()
        .map(move |(token, span)| (token, base + span.start..base + span.end))
}

/// Result of scanning a braced expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BraceScan {
    /// Offset of the closing `}`.
    pub close: usize,
    /// True when only whitespace and comments sit between the braces.
    pub is_empty: bool,
}

/// Find the `}` matching the `{` at `open`.
pub fn find_closing_brace(source: &str, open: usize) -> Result<BraceScan, ParseError> {
    let mut depth = 0usize;
    let mut is_empty = true;

    for (token, span) in tokenize(&source[open..], open) {
        match token {
            Ok(ScriptToken::OpenBrace) => {
                if depth > 0 {
                    is_empty = false;
                }
                depth += 1;
            }
            Ok(ScriptToken::CloseBrace) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(BraceScan {
                        close: span.start,
                        is_empty,
                    });
                }
                is_empty = false;
            }
            Ok(token) if token.is_trivia() => {}
            Ok(_) => is_empty = false,
            Err(()) => {
                return Err(ParseError::at_char(
                    "Could not parse expression: unterminated string, template or comment",
                    source,
                    span.start,
                ))
            }
        }
    }

    Err(ParseError::new(
        "Unexpected end of file in expression, expected a corresponding closing brace for `{`",
        open..open + 1,
    ))
}

/// Check that brackets in `source[range]` are balanced and strings are terminated.
pub fn check_balanced(source: &str, range: ByteRange<usize>) -> Result<(), ParseError> {
    let mut stack: Vec<(ScriptToken, usize)> = Vec::new();

    for (token, span) in tokenize(&source[range.clone()], range.start) {
        let token = token.map_err(|()| {
            ParseError::at_char(
                "Could not parse import/exports: unterminated string, template or comment",
                source,
                span.start,
            )
        })?;
        if let Some(closer) = token.closer() {
            stack.push((closer, span.start));
        } else if token.is_closer() {
            match stack.pop() {
                Some((expected, _)) if expected == token => {}
                _ => {
                    return Err(ParseError::at_char(
                        "Could not parse import/exports: unexpected closing bracket",
                        source,
                        span.start,
                    ))
                }
            }
        }
    }

    match stack.last() {
        Some(&(_, open)) => Err(ParseError::at_char(
            "Could not parse import/exports: unclosed bracket",
            source,
            open,
        )),
        None => Ok(()),
    }
}

/// An identifier occurring in code (outside strings and comments).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier<'a> {
    pub name: &'a str,
    pub span: ByteRange<usize>,
    /// Preceded by `.`, i.e. a property access rather than a binding reference.
    pub is_property: bool,
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

/// Collect identifiers from `text`; spans are relative to `text`.
///
/// Lexing errors are skipped over: the generated script may contain half-typed code and
/// callers only want a best-effort index.
pub fn identifiers(text: &str) -> Vec<Identifier<'_>> {
    let mut found = Vec::new();
    for (token, span) in tokenize(text, 0) {
        if token != Ok(ScriptToken::Word) {
            continue;
        }
        let word = &text[span.clone()];
        let mut chars = word.char_indices().peekable();
        let mut previous: Option<char> = None;
        while let Some((idx, ch)) = chars.next() {
            if is_identifier_start(ch) && !previous.is_some_and(is_identifier_char) {
                let mut end = idx + ch.len_utf8();
                while let Some(&(next_idx, next)) = chars.peek() {
                    if !is_identifier_char(next) {
                        break;
                    }
                    end = next_idx + next.len_utf8();
                    chars.next();
                }
                found.push(Identifier {
                    name: &word[idx..end],
                    span: span.start + idx..span.start + end,
                    is_property: previous == Some('.'),
                });
                previous = word[..end].chars().next_back();
            } else {
                previous = Some(ch);
            }
        }
    }
    found
}
