//! JSX tag parsing
//!
//!     Parses a single tag (`<Name attr="x" {...rest}>`, `</Name>`, `<>`, `</>`, `<Name />`).
//!     Pairing opening and closing tags is the job of the flow and inline parsers; this module
//!     only reads one tag and reports where it ends. Whitespace, including line endings, may
//!     appear anywhere between the parts of a tag.

use super::Parser;
use crate::mdx::ast::{Attribute, AttributeKind, AttributeValue, ParseError, ParseResult};
use crate::mdx::lexing::find_closing_brace;
use std::ops::Range as ByteRange;

/// One parsed tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub closing: bool,
    /// `None` for fragments.
    pub name: Option<String>,
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
    pub span: ByteRange<usize>,
}

impl Tag {
    pub fn display(&self) -> String {
        let slash = if self.closing { "/" } else { "" };
        format!("<{slash}{}>", self.name.as_deref().unwrap_or(""))
    }
}

pub(crate) fn is_name_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '$' || ch == '_'
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '$' | '_' | '-' | '.' | ':')
}

fn describe(ch: char) -> String {
    format!("`{}` (U+{:04X})", ch, ch as u32)
}

impl<'a> Parser<'a> {
    /// True when the character after a `<` at `lt` can begin a tag.
    pub(crate) fn starts_tag(&self, lt: usize) -> bool {
        match self.char_at(lt + 1) {
            Some(ch) => is_name_start(ch) || ch == '>' || ch == '/',
            None => false,
        }
    }

    fn skip_whitespace(&self, mut pos: usize) -> usize {
        while let Some(ch) = self.char_at(pos) {
            if !ch.is_whitespace() {
                break;
            }
            pos += ch.len_utf8();
        }
        pos
    }

    fn read_name(&self, start: usize) -> usize {
        let mut pos = start;
        while let Some(ch) = self.char_at(pos) {
            if !is_name_char(ch) {
                break;
            }
            pos += ch.len_utf8();
        }
        pos
    }

    fn eof_in_tag(&self, lt: usize, expected: &str) -> ParseError {
        ParseError::new(
            format!("Unexpected end of file {expected}"),
            lt..lt + 1,
        )
    }

    /// Parse the tag whose `<` sits at `lt`.
    pub(crate) fn parse_tag(&self, lt: usize) -> ParseResult<Tag> {
        let mut pos = self.skip_whitespace(lt + 1);
        let mut closing = false;

        if self.byte(pos) == Some(b'/') {
            closing = true;
            pos = self.skip_whitespace(pos + 1);
        }

        let name = match self.char_at(pos) {
            Some('>') => None,
            Some(ch) if is_name_start(ch) => {
                let end = self.read_name(pos);
                let name = self.source[pos..end].to_string();
                pos = self.skip_whitespace(end);
                Some(name)
            }
            Some('!') => {
                return Err(ParseError::at_char(
                    format!(
                        "Unexpected character {} before name, expected a character that can start a name, such as a letter, `$`, or `_` (note: to create a comment in MDX, use `{{/* text */}}`)",
                        describe('!')
                    ),
                    self.source,
                    pos,
                ))
            }
            Some(ch) => {
                return Err(ParseError::at_char(
                    format!(
                        "Unexpected character {} before name, expected a character that can start a name, such as a letter, `$`, or `_`",
                        describe(ch)
                    ),
                    self.source,
                    pos,
                ))
            }
            None => {
                return Err(self.eof_in_tag(
                    lt,
                    "before name, expected a character that can start a name, such as a letter, `$`, or `_`",
                ))
            }
        };

        let mut tag = Tag {
            closing,
            name,
            attributes: Vec::new(),
            self_closing: false,
            span: lt..lt,
        };

        if tag.name.is_none() || tag.closing {
            return match self.char_at(pos) {
                Some('>') => {
                    tag.span = lt..pos + 1;
                    Ok(tag)
                }
                Some(ch) => Err(ParseError::at_char(
                    format!(
                        "Unexpected character {} in {}, expected `>`",
                        describe(ch),
                        if tag.closing { "closing tag" } else { "fragment" }
                    ),
                    self.source,
                    pos,
                )),
                None => Err(self.eof_in_tag(lt, "in tag, expected `>`")),
            };
        }

        loop {
            pos = self.skip_whitespace(pos);
            match self.char_at(pos) {
                Some('>') => {
                    tag.span = lt..pos + 1;
                    return Ok(tag);
                }
                Some('/') => {
                    let after = self.skip_whitespace(pos + 1);
                    if self.byte(after) != Some(b'>') {
                        return match self.char_at(after) {
                            Some(ch) => Err(ParseError::at_char(
                                format!(
                                    "Unexpected character {} after self-closing slash, expected `>` to end the tag",
                                    describe(ch)
                                ),
                                self.source,
                                after,
                            )),
                            None => Err(self.eof_in_tag(lt, "after self-closing slash, expected `>`")),
                        };
                    }
                    tag.self_closing = true;
                    tag.span = lt..after + 1;
                    return Ok(tag);
                }
                Some('{') => {
                    let scan = find_closing_brace(self.source, pos)?;
                    let body = self.source[pos + 1..scan.close].trim_start();
                    if !body.starts_with("...") {
                        return Err(ParseError::new(
                            "Unexpected attribute expression, expected a spread such as `{...props}`",
                            pos..scan.close + 1,
                        ));
                    }
                    tag.attributes.push(Attribute {
                        kind: AttributeKind::Spread(pos..scan.close + 1),
                        span: pos..scan.close + 1,
                    });
                    pos = scan.close + 1;
                }
                Some(ch) if is_name_start(ch) => {
                    let (attribute, end) = self.parse_attribute(lt, pos)?;
                    tag.attributes.push(attribute);
                    pos = end;
                }
                Some(ch) => {
                    return Err(ParseError::at_char(
                        format!(
                            "Unexpected character {} in tag, expected an attribute name, `/`, or `>`",
                            describe(ch)
                        ),
                        self.source,
                        pos,
                    ))
                }
                None => return Err(self.eof_in_tag(lt, "in tag, expected `>`")),
            }
        }
    }

    fn parse_attribute(&self, lt: usize, start: usize) -> ParseResult<(Attribute, usize)> {
        let name_end = self.read_name(start);
        let name = self.source[start..name_end].to_string();
        let after_name = self.skip_whitespace(name_end);

        if self.byte(after_name) != Some(b'=') {
            let attribute = Attribute {
                kind: AttributeKind::Named { name, value: None },
                span: start..name_end,
            };
            return Ok((attribute, name_end));
        }

        let value_start = self.skip_whitespace(after_name + 1);
        let (value, end) = match self.char_at(value_start) {
            Some(quote @ ('"' | '\'')) => {
                let body_start = value_start + 1;
                let Some(len) = self.source[body_start..].find(quote) else {
                    return Err(ParseError::new(
                        format!("Unexpected end of file in attribute value, expected a corresponding closing quote `{quote}`"),
                        value_start..value_start + 1,
                    ));
                };
                let literal = self.source[body_start..body_start + len].to_string();
                (AttributeValue::Literal(literal), body_start + len + 1)
            }
            Some('{') => {
                let scan = find_closing_brace(self.source, value_start)?;
                (
                    AttributeValue::Expression(value_start..scan.close + 1),
                    scan.close + 1,
                )
            }
            Some(ch) => {
                return Err(ParseError::at_char(
                    format!(
                        "Unexpected character {} before attribute value, expected a character that can start an attribute value, such as `\"`, `'`, or `{{`",
                        describe(ch)
                    ),
                    self.source,
                    value_start,
                ))
            }
            None => return Err(self.eof_in_tag(lt, "before attribute value")),
        };

        let attribute = Attribute {
            kind: AttributeKind::Named {
                name,
                value: Some(value),
            },
            span: start..end,
        };
        Ok((attribute, end))
    }
}
