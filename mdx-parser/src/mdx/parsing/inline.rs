//! Inline (text) parsing
//!
//!     Scans paragraph and heading content for the constructs that matter to MDX:
//!     backslash escapes, code spans, inline math, `{expressions}` and JSX tags. Everything
//!     else is left as text; emphasis, links and the rest of markdown's inline syntax are
//!     prose and stay inside text nodes.
//!
//!     Expressions and tags inside a paragraph may run over several lines. When one ends past
//!     the paragraph's current end, the paragraph grows to swallow it. Headings are a single
//!     line and cannot grow.

use super::flow::Container;
use super::jsx::Tag;
use super::Parser;
use crate::mdx::ast::{Expression, JsxElement, Node, NodeKind, ParseError, ParseResult};
use crate::mdx::lexing::find_closing_brace;
use std::ops::Range as ByteRange;

/// Marks inline content as belonging to a paragraph that may grow.
#[derive(Clone, Copy)]
pub(crate) struct ParagraphScope<'c> {
    pub(crate) container: Option<&'c Container<'c>>,
}

impl<'a> Parser<'a> {
    /// Parse `[start, *end)` as inline content.
    ///
    /// With a paragraph scope `*end` may move forward; without one the range is fixed.
    pub(crate) fn parse_inline(
        &self,
        start: usize,
        end: &mut usize,
        scope: Option<ParagraphScope<'_>>,
    ) -> ParseResult<Vec<Node>> {
        let mut pos = start;
        let (nodes, _) = self.parse_inline_until(&mut pos, end, scope, None)?;
        Ok(nodes)
    }

    fn parse_inline_until(
        &self,
        pos: &mut usize,
        end: &mut usize,
        scope: Option<ParagraphScope<'_>>,
        open: Option<&Tag>,
    ) -> ParseResult<(Vec<Node>, Option<ByteRange<usize>>)> {
        let mut nodes = Vec::new();
        let mut text_start = *pos;

        while *pos < *end {
            let Some(ch) = self.char_at(*pos) else {
                break;
            };
            match ch {
                '\\' => {
                    let escaped = self
                        .char_at(*pos + 1)
                        .is_some_and(|next| next.is_ascii_punctuation());
                    *pos += if escaped { 2 } else { 1 };
                }
                '`' => {
                    let (run, close) = self.span_end(*pos, b'`', *end);
                    match close {
                        Some(close) => {
                            push_text(&mut nodes, text_start..*pos);
                            nodes.push(Node::new(NodeKind::InlineCode, *pos..close));
                            *pos = close;
                            text_start = close;
                        }
                        None => *pos += run,
                    }
                }
                '$' if self.options.math() => {
                    let (run, close) = self.span_end(*pos, b'$', *end);
                    match close {
                        Some(close) => {
                            push_text(&mut nodes, text_start..*pos);
                            nodes.push(Node::new(NodeKind::InlineMath, *pos..close));
                            *pos = close;
                            text_start = close;
                        }
                        None => *pos += run,
                    }
                }
                '{' => {
                    let scan = find_closing_brace(self.source, *pos)?;
                    let close = scan.close + 1;
                    self.reach(*pos, close, end, scope)?;
                    push_text(&mut nodes, text_start..*pos);
                    let expression = Expression {
                        body: *pos + 1..scan.close,
                        is_empty: scan.is_empty,
                    };
                    nodes.push(Node::new(NodeKind::InlineExpression(expression), *pos..close));
                    *pos = close;
                    text_start = close;
                }
                '<' if self.char_at(*pos + 1).is_some_and(char::is_whitespace) => {
                    *pos += 1;
                }
                '<' => {
                    let lt = *pos;
                    let tag = self.parse_tag(lt)?;
                    self.reach(lt, tag.span.end, end, scope)?;

                    if tag.closing {
                        return match open {
                            Some(open) if open.name == tag.name => {
                                push_text(&mut nodes, text_start..lt);
                                *pos = tag.span.end;
                                Ok((nodes, Some(tag.span)))
                            }
                            Some(open) => Err(ParseError::new(
                                format!(
                                    "Unexpected closing tag `{}`, expected corresponding closing tag for `{}`",
                                    tag.display(),
                                    open.display()
                                ),
                                tag.span,
                            )),
                            None => Err(ParseError::new(
                                format!(
                                    "Unexpected closing tag `{}`, expected an open tag first",
                                    tag.display()
                                ),
                                tag.span,
                            )),
                        };
                    }

                    push_text(&mut nodes, text_start..lt);
                    let element = JsxElement {
                        name: tag.name.clone(),
                        attributes: tag.attributes.clone(),
                        self_closing: tag.self_closing,
                    };
                    *pos = tag.span.end;

                    if tag.self_closing {
                        nodes.push(Node::new(NodeKind::InlineElement(element), tag.span.clone()));
                    } else {
                        let (children, closing) =
                            self.parse_inline_until(pos, end, scope, Some(&tag))?;
                        let Some(closing) = closing else {
                            let within = if scope.is_some() { "paragraph" } else { "heading" };
                            return Err(ParseError::new(
                                format!(
                                    "Expected a closing tag for `{}` before the end of `{within}`",
                                    tag.display()
                                ),
                                lt..lt + 1,
                            ));
                        };
                        nodes.push(
                            Node::new(NodeKind::InlineElement(element), lt..closing.end)
                                .with_children(children),
                        );
                    }
                    text_start = *pos;
                }
                _ => *pos += ch.len_utf8(),
            }
        }

        push_text(&mut nodes, text_start..(*pos).min(*end));
        Ok((nodes, None))
    }

    /// Make sure a construct opened at `start` and ending at `construct_end` fits.
    fn reach(
        &self,
        start: usize,
        construct_end: usize,
        end: &mut usize,
        scope: Option<ParagraphScope<'_>>,
    ) -> ParseResult<()> {
        if construct_end <= *end {
            return Ok(());
        }
        match scope {
            Some(scope) => {
                *end = self
                    .paragraph_end_from(construct_end, scope.container)
                    .max(construct_end);
                Ok(())
            }
            None => Err(ParseError::new(
                "Unexpected line ending in heading, expected the expression or tag to close on the same line",
                start..start + 1,
            )),
        }
    }

    /// Length of the `marker` run at `start` and the end of the matching closing run.
    fn span_end(&self, start: usize, marker: u8, end: usize) -> (usize, Option<usize>) {
        let bytes = self.source.as_bytes();
        let run_at = |from: usize| {
            bytes[from..end]
                .iter()
                .take_while(|b| **b == marker)
                .count()
        };

        let run = run_at(start);
        let mut idx = start + run;
        while idx < end {
            if bytes[idx] == marker {
                let closing = run_at(idx);
                if closing == run {
                    return (run, Some(idx + closing));
                }
                idx += closing;
            } else {
                idx += 1;
            }
        }
        (run, None)
    }
}

fn push_text(nodes: &mut Vec<Node>, range: ByteRange<usize>) {
    if !range.is_empty() {
        nodes.push(Node::new(NodeKind::Text, range));
    }
}
