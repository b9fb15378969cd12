//! Parsing module for MDX
//!
//!     Turns MDX source text into a [`Node`] tree. The parser works in two layers:
//!
//!         Flow (block) parsing:
//!             Line based. Each line is classified by its first non-blank characters:
//!             front-matter fences at the very top, ESM (`import`/`export`) at column 0 of the
//!             top level, fenced code and math, ATX headings, thematic breaks, JSX tags that
//!             stand alone on their line, `{expressions}` that stand alone on their line, and
//!             paragraphs for everything else. A JSX tag on its own line opens a container
//!             whose children are flow content up to the matching closing tag line.
//!             See [flow].
//!
//!         Inline (text) parsing:
//!             Paragraph and heading content is scanned for escapes, code spans, inline math,
//!             `{expressions}` and JSX tags. Whatever is left over becomes text.
//!             See [inline] and [jsx].
//!
//!     Embedded JavaScript is never parsed. The [lexing](crate::mdx::lexing) module provides
//!     a coarse tokenizer that is just enough to find where expressions and ESM end.
//!
//! Errors
//!
//!     MDX has no error recovery. The first problem found aborts the parse with a
//!     [`ParseError`] whose span points at the offending bytes.

pub mod flow;
pub mod inline;
pub mod jsx;

use super::ast::{FrontmatterDialect, Node, NodeKind, ParseResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Optional syntax that changes how documents are split into regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SyntaxExtension {
    Frontmatter(FrontmatterDialect),
    Math,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown syntax extension `{0}` (expected frontmatter-yaml, frontmatter-toml or math)")]
pub struct UnknownExtension(pub String);

impl FromStr for SyntaxExtension {
    type Err = UnknownExtension;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "frontmatter-yaml" => Ok(SyntaxExtension::Frontmatter(FrontmatterDialect::Yaml)),
            "frontmatter-toml" => Ok(SyntaxExtension::Frontmatter(FrontmatterDialect::Toml)),
            "math" => Ok(SyntaxExtension::Math),
            other => Err(UnknownExtension(other.to_string())),
        }
    }
}

impl fmt::Display for SyntaxExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxExtension::Frontmatter(dialect) => write!(f, "frontmatter-{}", dialect.as_str()),
            SyntaxExtension::Math => f.write_str("math"),
        }
    }
}

impl TryFrom<String> for SyntaxExtension {
    type Error = UnknownExtension;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SyntaxExtension> for String {
    fn from(value: SyntaxExtension) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    pub extensions: Vec<SyntaxExtension>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            extensions: vec![
                SyntaxExtension::Frontmatter(FrontmatterDialect::Yaml),
                SyntaxExtension::Frontmatter(FrontmatterDialect::Toml),
            ],
        }
    }
}

impl ParseOptions {
    /// Options with no syntax extensions at all.
    pub fn plain() -> Self {
        Self {
            extensions: Vec::new(),
        }
    }

    pub fn with_extension(mut self, extension: SyntaxExtension) -> Self {
        if !self.extensions.contains(&extension) {
            self.extensions.push(extension);
        }
        self
    }

    pub fn frontmatter_dialects(&self) -> impl Iterator<Item = FrontmatterDialect> + '_ {
        self.extensions.iter().filter_map(|extension| match extension {
            SyntaxExtension::Frontmatter(dialect) => Some(*dialect),
            SyntaxExtension::Math => None,
        })
    }

    pub fn math(&self) -> bool {
        self.extensions.contains(&SyntaxExtension::Math)
    }
}

/// Parse an MDX document into a tree rooted at [`NodeKind::Root`].
pub fn parse_document(source: &str, options: &ParseOptions) -> ParseResult<Node> {
    let parser = Parser { source, options };
    let children = parser.parse_root()?;
    Ok(Node::new(NodeKind::Root, 0..source.len()).with_children(children))
}

/// Shared parsing state: the source and the enabled extensions.
pub(crate) struct Parser<'a> {
    source: &'a str,
    options: &'a ParseOptions,
}

impl<'a> Parser<'a> {
    fn byte(&self, pos: usize) -> Option<u8> {
        self.source.as_bytes().get(pos).copied()
    }

    fn char_at(&self, pos: usize) -> Option<char> {
        self.source.get(pos..).and_then(|rest| rest.chars().next())
    }

    /// Offset of the `\n` ending the line that contains `pos`, or the end of input.
    fn line_end(&self, pos: usize) -> usize {
        self.source[pos..]
            .find('\n')
            .map(|idx| pos + idx)
            .unwrap_or(self.source.len())
    }

    /// Offset of the line following the one that contains `pos`.
    fn next_line(&self, pos: usize) -> usize {
        let end = self.line_end(pos);
        if end < self.source.len() {
            end + 1
        } else {
            end
        }
    }

    /// Width of the spaces and tabs starting at `pos`.
    fn indent_at(&self, pos: usize) -> usize {
        self.source[pos..]
            .bytes()
            .take_while(|b| *b == b' ' || *b == b'\t')
            .count()
    }

    fn is_blank(&self, range: std::ops::Range<usize>) -> bool {
        self.source[range].trim().is_empty()
    }

    /// End of `range` with trailing whitespace removed.
    fn trim_end(&self, start: usize, end: usize) -> usize {
        start + self.source[start..end].trim_end().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_names_round_trip() {
        for name in ["frontmatter-yaml", "frontmatter-toml", "math"] {
            let extension: SyntaxExtension = name.parse().unwrap();
            assert_eq!(extension.to_string(), name);
        }
        assert!("gfm".parse::<SyntaxExtension>().is_err());
    }

    #[test]
    fn test_default_options_enable_both_frontmatter_dialects() {
        let options = ParseOptions::default();
        let dialects: Vec<_> = options.frontmatter_dialects().collect();
        assert_eq!(
            dialects,
            vec![FrontmatterDialect::Yaml, FrontmatterDialect::Toml]
        );
        assert!(!options.math());
        assert!(ParseOptions::plain().with_extension(SyntaxExtension::Math).math());
    }

    #[test]
    fn test_extensions_deserialize_from_strings() {
        let options: ParseOptions =
            serde_json::from_str(r#"{"extensions": ["math", "frontmatter-toml"]}"#).unwrap();
        assert_eq!(
            options.extensions,
            vec![
                SyntaxExtension::Math,
                SyntaxExtension::Frontmatter(FrontmatterDialect::Toml)
            ]
        );
    }
}
