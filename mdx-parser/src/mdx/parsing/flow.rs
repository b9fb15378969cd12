//! Flow (block) parsing
//!
//!     The flow parser walks the document line by line. A line is classified by its first
//!     non-blank characters and each construct consumes whole lines:
//!
//!         front-matter      `---` / `+++` fences, only at offset 0
//!         ESM               `import` / `export` at column 0 of the top level, up to a blank line
//!         fenced code/math  ``` / ~~~ / `$$`, up to the closing fence
//!         heading           1-6 `#` followed by whitespace
//!         thematic break    three or more `*`, `-` or `_`
//!         JSX container     a tag alone on its line; children run to the matching closing tag
//!         expression        `{...}` alone on its line
//!         paragraph         anything else
//!
//!     Containers nest: the children of a JSX element are parsed by the same loop with the
//!     element as the enclosing container, and a line holding the container's closing tag ends
//!     it. Unclosed fences end at the document end or at the enclosing container's closing line.

use super::jsx::Tag;
use super::Parser;
use super::inline::ParagraphScope;
use crate::mdx::ast::{Expression, JsxElement, Node, NodeKind, ParseError, ParseResult};
use crate::mdx::lexing::{check_balanced, find_closing_brace};

/// The JSX element whose children are being parsed.
pub(crate) struct Container<'t> {
    pub(crate) tag: &'t Tag,
}

impl Container<'_> {
    fn matches(&self, closing: &Tag) -> bool {
        self.tag.name == closing.name
    }
}

const ESM_KEYWORDS: [&str; 2] = ["import", "export"];

impl<'a> Parser<'a> {
    pub(crate) fn parse_root(&self) -> ParseResult<Vec<Node>> {
        let mut children = Vec::new();
        let mut pos = 0;

        if let Some((frontmatter, next)) = self.parse_frontmatter() {
            children.push(frontmatter);
            pos = next;
        }

        let end = self.parse_flow(pos, None, &mut children)?;
        debug_assert!(end.is_none());
        Ok(children)
    }

    fn parse_frontmatter(&self) -> Option<(Node, usize)> {
        let first_end = self.line_end(0);
        let dialect = self
            .options
            .frontmatter_dialects()
            .find(|dialect| dialect.is_fence(&self.source[..first_end]))?;

        let value_start = self.next_line(0);
        let mut line = value_start;
        while line < self.source.len() {
            let line_end = self.line_end(line);
            if dialect.is_fence(&self.source[line..line_end]) {
                let value_end = line.saturating_sub(1).max(value_start);
                let node = Node::new(
                    NodeKind::Frontmatter {
                        dialect,
                        value: value_start..value_end,
                    },
                    0..self.trim_end(line, line_end),
                );
                return Some((node, self.next_line(line)));
            }
            line = self.next_line(line);
        }
        None
    }

    /// Parse flow content starting at the line beginning at `pos`.
    ///
    /// Returns the closing tag span when `container` is set and its closing line was found.
    fn parse_flow(
        &self,
        mut pos: usize,
        container: Option<&Container<'_>>,
        children: &mut Vec<Node>,
    ) -> ParseResult<Option<std::ops::Range<usize>>> {
        while pos < self.source.len() {
            let line_end = self.line_end(pos);
            let start = pos + self.indent_at(pos);

            if start == line_end {
                pos = self.next_line(pos);
                continue;
            }

            if self.source[start..].starts_with("</") {
                let closing = self.parse_tag(start)?;
                return match container {
                    Some(container) if container.matches(&closing) => {
                        self.expect_line_end(closing.span.end, "closing tag")?;
                        Ok(Some(closing.span))
                    }
                    Some(container) => Err(ParseError::new(
                        format!(
                            "Unexpected closing tag `{}`, expected corresponding closing tag for `{}`",
                            closing.display(),
                            container.tag.display()
                        ),
                        closing.span,
                    )),
                    None => Err(ParseError::new(
                        format!(
                            "Unexpected closing tag `{}`, expected an open tag first",
                            closing.display()
                        ),
                        closing.span,
                    )),
                };
            }

            let (node, next) = if container.is_none() && start == pos && self.is_esm_start(pos) {
                self.parse_esm(pos)?
            } else if let Some(fence) = self.fence_at(start) {
                self.parse_fenced(start, fence, container)?
            } else if let Some(depth) = self.heading_depth(start) {
                self.parse_heading(start, depth)?
            } else if self.is_thematic_break(start, line_end) {
                let node = Node::new(NodeKind::ThematicBreak, start..self.trim_end(start, line_end));
                (node, self.next_line(pos))
            } else if let Some(tag) = self.flow_tag_at(start)? {
                self.parse_flow_element(tag)?
            } else if let Some(found) = self.flow_expression_at(start)? {
                found
            } else {
                self.parse_paragraph(start, container)?
            };

            children.push(node);
            pos = next;
        }

        match container {
            Some(container) => Err(ParseError::new(
                format!(
                    "Expected a closing tag for `{}` before the end of the document",
                    container.tag.display()
                ),
                container.tag.span.start..container.tag.span.start + 1,
            )),
            None => Ok(None),
        }
    }

    /// Require that only whitespace follows `pos` on its line.
    fn expect_line_end(&self, pos: usize, after: &str) -> ParseResult<()> {
        let line_end = self.line_end(pos);
        match self.source[pos..line_end].find(|ch: char| !ch.is_whitespace()) {
            None => Ok(()),
            Some(idx) => Err(ParseError::at_char(
                format!("Unexpected content after {after}, expected the end of the line"),
                self.source,
                pos + idx,
            )),
        }
    }

    fn is_esm_start(&self, pos: usize) -> bool {
        let rest = &self.source[pos..];
        ESM_KEYWORDS.iter().any(|keyword| {
            rest.starts_with(keyword)
                && !rest[keyword.len()..]
                    .chars()
                    .next()
                    .is_some_and(|ch| ch.is_alphanumeric() || ch == '_' || ch == '$')
        })
    }

    /// A run of ESM lines up to the next blank line, split into statements at keyword lines.
    fn parse_esm(&self, start: usize) -> ParseResult<(Node, usize)> {
        let mut statement_starts = vec![start];
        let mut block_end = self.line_end(start);
        let mut next = self.next_line(start);

        while next < self.source.len() {
            let line_end = self.line_end(next);
            if self.is_blank(next..line_end) {
                break;
            }
            if self.is_esm_start(next) {
                statement_starts.push(next);
            }
            block_end = line_end;
            next = self.next_line(next);
        }

        let block_end = self.trim_end(start, block_end);
        check_balanced(self.source, start..block_end)?;

        let statements = statement_starts
            .iter()
            .enumerate()
            .map(|(idx, &statement_start)| {
                let limit = statement_starts.get(idx + 1).copied().unwrap_or(block_end);
                let end = self.trim_end(statement_start, limit);
                Node::new(NodeKind::ModuleStatement, statement_start..end)
            })
            .collect();

        let block = Node::new(NodeKind::ModuleBlock, start..block_end).with_children(statements);
        Ok((block, next))
    }

    /// The fence opening a code or math block at `start`, if any.
    fn fence_at(&self, start: usize) -> Option<&'a str> {
        let rest = &self.source[start..self.line_end(start)];
        for marker in ['`', '~'] {
            let count = rest.chars().take_while(|ch| *ch == marker).count();
            if count >= 3 {
                if marker == '`' && rest[count..].contains('`') {
                    return None;
                }
                return Some(&self.source[start..start + count]);
            }
        }
        if self.options.math() && rest.starts_with("$$") {
            let count = rest.chars().take_while(|ch| *ch == '$').count();
            return Some(&self.source[start..start + count]);
        }
        None
    }

    fn closes_fence(&self, line: usize, fence: &str) -> bool {
        let start = line + self.indent_at(line);
        let rest = self.source[start..self.line_end(line)].trim_end();
        let Some(marker) = fence.chars().next() else {
            return false;
        };
        rest.len() >= fence.len() && rest.chars().all(|ch| ch == marker)
    }

    fn closes_container(&self, line: usize, container: Option<&Container<'_>>) -> bool {
        let Some(container) = container else {
            return false;
        };
        let start = line + self.indent_at(line);
        self.source[start..].starts_with("</")
            && self
                .parse_tag(start)
                .map(|tag| container.matches(&tag))
                .unwrap_or(false)
    }

    fn parse_fenced(
        &self,
        start: usize,
        fence: &str,
        container: Option<&Container<'_>>,
    ) -> ParseResult<(Node, usize)> {
        let opening_end = self.line_end(start);
        let info = self.source[start + fence.len()..opening_end].trim();
        let kind = if fence.starts_with('$') {
            NodeKind::Math
        } else {
            NodeKind::Code {
                lang: info
                    .split_whitespace()
                    .next()
                    .map(|lang| lang.to_string()),
            }
        };

        let mut end = self.trim_end(start, opening_end);
        let mut line = self.next_line(start);
        while line < self.source.len() {
            if self.closes_container(line, container) {
                return Ok((Node::new(kind, start..end), line));
            }
            let line_end = self.line_end(line);
            if self.closes_fence(line, fence) {
                let close = self.trim_end(line, line_end);
                return Ok((Node::new(kind, start..close), self.next_line(line)));
            }
            if !self.is_blank(line..line_end) {
                end = line_end;
            }
            line = self.next_line(line);
        }
        Ok((Node::new(kind, start..end), line))
    }

    fn heading_depth(&self, start: usize) -> Option<u8> {
        let rest = &self.source[start..self.line_end(start)];
        let depth = rest.bytes().take_while(|b| *b == b'#').count();
        let followed_by_space = rest[depth..]
            .chars()
            .next()
            .map_or(true, |ch| ch == ' ' || ch == '\t');
        ((1..=6).contains(&depth) && followed_by_space).then_some(depth as u8)
    }

    fn parse_heading(&self, start: usize, depth: u8) -> ParseResult<(Node, usize)> {
        let line_end = self.line_end(start);
        let end = self.trim_end(start, line_end);
        let content_start = start + depth as usize;
        let content_start = content_start + self.indent_at(content_start);

        // Optional closing sequence: trailing `#`s preceded by whitespace.
        let mut content_end = end.max(content_start);
        let trimmed = self.source[content_start..content_end].trim_end_matches('#');
        if trimmed.is_empty() || trimmed.ends_with([' ', '\t']) {
            content_end = self.trim_end(content_start, content_start + trimmed.len());
        }

        let mut inline_end = content_end;
        let children = self.parse_inline(content_start, &mut inline_end, None)?;
        let node = Node::new(NodeKind::Heading { depth }, start..end).with_children(children);
        Ok((node, self.next_line(start)))
    }

    fn is_thematic_break(&self, start: usize, line_end: usize) -> bool {
        let rest = self.source[start..line_end].trim_end();
        let Some(marker) = rest.chars().next() else {
            return false;
        };
        matches!(marker, '*' | '-' | '_')
            && rest.chars().filter(|ch| *ch == marker).count() >= 3
            && rest.chars().all(|ch| ch == marker || ch == ' ' || ch == '\t')
    }

    /// A JSX tag standing alone on its line.
    fn flow_tag_at(&self, start: usize) -> ParseResult<Option<Tag>> {
        if self.byte(start) != Some(b'<') || !self.starts_tag(start) {
            return Ok(None);
        }
        let tag = self.parse_tag(start)?;
        let end = tag.span.end;
        if self.is_blank(end..self.line_end(end)) {
            Ok(Some(tag))
        } else {
            Ok(None)
        }
    }

    fn parse_flow_element(&self, tag: Tag) -> ParseResult<(Node, usize)> {
        let element = |tag: &Tag| JsxElement {
            name: tag.name.clone(),
            attributes: tag.attributes.clone(),
            self_closing: tag.self_closing,
        };

        if tag.self_closing {
            let node = Node::new(NodeKind::BlockElement(element(&tag)), tag.span.clone());
            return Ok((node, self.next_line(tag.span.end)));
        }

        let mut children = Vec::new();
        let container = Container { tag: &tag };
        let closing = self
            .parse_flow(self.next_line(tag.span.end), Some(&container), &mut children)?
            .unwrap_or(tag.span.clone());

        let node = Node::new(
            NodeKind::BlockElement(element(&tag)),
            tag.span.start..closing.end,
        )
        .with_children(children);
        Ok((node, self.next_line(closing.end)))
    }

    /// An `{expression}` standing alone on its line(s).
    fn flow_expression_at(&self, start: usize) -> ParseResult<Option<(Node, usize)>> {
        if self.byte(start) != Some(b'{') {
            return Ok(None);
        }
        let scan = find_closing_brace(self.source, start)?;
        let end = scan.close + 1;
        if !self.is_blank(end..self.line_end(end)) {
            return Ok(None);
        }
        let expression = Expression {
            body: start + 1..scan.close,
            is_empty: scan.is_empty,
        };
        let node = Node::new(NodeKind::BlockExpression(expression), start..end);
        Ok(Some((node, self.next_line(end))))
    }

    /// Whether the line at `line` ends a paragraph that precedes it.
    fn interrupts_paragraph(&self, line: usize, container: Option<&Container<'_>>) -> bool {
        let line_end = self.line_end(line);
        let start = line + self.indent_at(line);
        if start == line_end {
            return true;
        }
        if container.is_some() && self.source[start..].starts_with("</") {
            return true;
        }
        self.fence_at(start).is_some()
            || self.heading_depth(start).is_some()
            || self.is_thematic_break(start, line_end)
            || matches!(self.flow_tag_at(start), Ok(Some(_)))
    }

    /// Content end of the paragraph whose last known content sits on the line containing
    /// `pos`: following lines join until a blank line or an interrupting construct.
    pub(crate) fn paragraph_end_from(
        &self,
        pos: usize,
        container: Option<&Container<'_>>,
    ) -> usize {
        let mut end = self.line_end(pos);
        let mut line = self.next_line(pos);
        while line < self.source.len() && !self.interrupts_paragraph(line, container) {
            end = self.line_end(line);
            line = self.next_line(line);
        }
        self.trim_end(pos, end)
    }

    fn parse_paragraph(
        &self,
        start: usize,
        container: Option<&Container<'_>>,
    ) -> ParseResult<(Node, usize)> {
        let mut end = self.paragraph_end_from(start, container);
        let children = self.parse_inline(start, &mut end, Some(ParagraphScope { container }))?;
        let node = Node::new(NodeKind::Paragraph, start..end).with_children(children);
        Ok((node, self.next_line(end)))
    }
}

#[cfg(test)]
mod tests {
    use crate::mdx::ast::{Node, NodeKind};
    use crate::mdx::parsing::{parse_document, ParseOptions, SyntaxExtension};

    fn parse(source: &str) -> Node {
        parse_document(source, &ParseOptions::default()).unwrap()
    }

    fn kinds(node: &Node) -> Vec<&'static str> {
        node.children.iter().map(|child| child.kind.name()).collect()
    }

    #[test]
    fn test_blocks_in_order() {
        let source = "import A from './a'\n\n# Title\n\nSome *text*.\n\n---\n\n```js\nlet x = {\n```\n";
        let root = parse(source);
        assert_eq!(
            kinds(&root),
            vec!["ModuleBlock", "Heading", "Paragraph", "ThematicBreak", "Code"]
        );
        let code = &root.children[4];
        assert_eq!(
            code.kind,
            NodeKind::Code {
                lang: Some("js".into())
            }
        );
    }

    #[test]
    fn test_frontmatter_value_excludes_fences() {
        let source = "---\ntitle: Hi\n---\n\n# Doc\n";
        let root = parse(source);
        let NodeKind::Frontmatter { value, .. } = &root.children[0].kind else {
            panic!("expected front-matter, got {:?}", root.children[0].kind);
        };
        assert_eq!(&source[value.clone()], "title: Hi");
        assert_eq!(root.children[0].span, Some(0..17));
        assert_eq!(root.children[1].kind.name(), "Heading");
    }

    #[test]
    fn test_frontmatter_requires_enabled_dialect() {
        let source = "+++\na = 1\n+++\n";
        let root = parse_document(source, &ParseOptions::plain()).unwrap();
        assert!(root
            .children
            .iter()
            .all(|child| !matches!(child.kind, NodeKind::Frontmatter { .. })));
    }

    #[test]
    fn test_unclosed_frontmatter_is_not_frontmatter() {
        let root = parse("---\ntitle: Hi\n");
        assert_eq!(root.children[0].kind, NodeKind::ThematicBreak);
    }

    #[test]
    fn test_esm_statements_split_at_keywords() {
        let source = "import a from 'a'\nimport {\n  b\n} from 'b'\nexport const c = 1\n\ntext\n";
        let root = parse(source);
        let block = &root.children[0];
        assert_eq!(block.kind, NodeKind::ModuleBlock);
        let statements: Vec<_> = block
            .children
            .iter()
            .map(|statement| statement.text(source).unwrap())
            .collect();
        assert_eq!(
            statements,
            vec![
                "import a from 'a'",
                "import {\n  b\n} from 'b'",
                "export const c = 1"
            ]
        );
    }

    #[test]
    fn test_esm_with_block_comments() {
        let source = "import a from 'a' /* x */\nexport const b = /* { */ 1\n\ntext\n";
        let root = parse(source);
        assert_eq!(kinds(&root), vec!["ModuleBlock", "Paragraph"]);
        let statements: Vec<_> = root.children[0]
            .children
            .iter()
            .map(|statement| statement.text(source).unwrap())
            .collect();
        assert_eq!(
            statements,
            vec!["import a from 'a' /* x */", "export const b = /* { */ 1"]
        );
    }

    #[test]
    fn test_unclosed_esm_comment_is_an_error() {
        let error =
            parse_document("import a from 'a' /* x\n", &ParseOptions::default()).unwrap_err();
        assert_eq!(error.span, 18..19);
    }

    #[test]
    fn test_unbalanced_esm_is_an_error() {
        let error = parse_document("import {a from 'a'\n", &ParseOptions::default()).unwrap_err();
        assert_eq!(error.span, 7..8);
    }

    #[test]
    fn test_esm_is_top_level_only() {
        let source = "<Box>\nimport x from 'y'\n</Box>\n";
        let root = parse(source);
        let element = &root.children[0];
        assert_eq!(element.children[0].kind, NodeKind::Paragraph);
    }

    #[test]
    fn test_block_element_children() {
        let source = "<Note kind=\"tip\">\n  # Heads up\n\n  Body\n</Note>\n";
        let root = parse(source);
        let note = &root.children[0];
        assert_eq!(note.kind.name(), "BlockElement");
        assert_eq!(note.span, Some(0..source.len() - 1));
        assert_eq!(kinds(note), vec!["Heading", "Paragraph"]);
        assert_eq!(note.children[1].text(source), Some("Body"));
    }

    #[test]
    fn test_nested_fragments() {
        let source = "<>\n<Inner>\nx\n</Inner>\n</>\n";
        let root = parse(source);
        assert_eq!(root.children.len(), 1);
        assert_eq!(kinds(&root.children[0]), vec!["BlockElement"]);
    }

    #[test]
    fn test_self_closing_block_element() {
        let root = parse("<div />");
        let div = &root.children[0];
        assert_eq!(div.span, Some(0..7));
        assert!(div.kind.element().unwrap().self_closing);
        assert!(div.children.is_empty());
    }

    #[test]
    fn test_missing_closing_tag() {
        let error = parse_document("text\n\n<Box>\nbody\n", &ParseOptions::default()).unwrap_err();
        assert_eq!(error.span, 6..7);
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let source = "<A>\nx\n</B>\n";
        let error = parse_document(source, &ParseOptions::default()).unwrap_err();
        assert_eq!(error.span, 6..10);
        assert!(error.message.contains("</B>"));
    }

    #[test]
    fn test_stray_closing_tag() {
        let error = parse_document("</A>\n", &ParseOptions::default()).unwrap_err();
        assert_eq!(error.span, 0..4);
    }

    #[test]
    fn test_block_expression() {
        let source = "{\n  items.map(i => i)\n}\n\n{}\n";
        let root = parse(source);
        let expressions: Vec<_> = root
            .children
            .iter()
            .map(|child| child.kind.expression().unwrap().is_empty)
            .collect();
        assert_eq!(expressions, vec![false, true]);
    }

    #[test]
    fn test_unclosed_code_fence_stops_at_container_close() {
        let source = "<Box>\n```\ncode\n</Box>\n";
        let root = parse(source);
        let the_box = &root.children[0];
        assert_eq!(kinds(the_box), vec!["Code"]);
        assert_eq!(the_box.children[0].text(source), Some("```\ncode"));
    }

    #[test]
    fn test_math_blocks_are_gated() {
        let source = "$$\nx^2\n$$\n";
        let plain = parse(source);
        assert_eq!(kinds(&plain), vec!["Paragraph"]);

        let options = ParseOptions::default().with_extension(SyntaxExtension::Math);
        let with_math = parse_document(source, &options).unwrap();
        assert_eq!(kinds(&with_math), vec!["Math"]);
    }

    #[test]
    fn test_heading_closing_sequence() {
        let source = "## Title ##\n";
        let root = parse(source);
        let heading = &root.children[0];
        assert_eq!(heading.kind, NodeKind::Heading { depth: 2 });
        assert_eq!(heading.children[0].text(source), Some("Title"));
    }

    #[test]
    fn test_paragraph_interrupted_by_standalone_tag() {
        let source = "Intro line\n<Box>\ninside\n</Box>\n";
        let root = parse(source);
        assert_eq!(kinds(&root), vec!["Paragraph", "BlockElement"]);
        assert_eq!(root.children[0].text(source), Some("Intro line"));
    }
}
