//! Tree nodes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range as ByteRange;

/// Front-matter flavours recognised by the syntax extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrontmatterDialect {
    Yaml,
    Toml,
}

impl FrontmatterDialect {
    /// The fence line delimiting the block.
    pub fn fence(&self) -> &'static str {
        match self {
            FrontmatterDialect::Yaml => "---",
            FrontmatterDialect::Toml => "+++",
        }
    }

    /// Whether `line` is this dialect's fence (trailing whitespace allowed).
    pub fn is_fence(&self, line: &str) -> bool {
        line.trim_end() == self.fence()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FrontmatterDialect::Yaml => "yaml",
            FrontmatterDialect::Toml => "toml",
        }
    }
}

/// An `{expression}` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    /// Byte range between the braces.
    pub body: ByteRange<usize>,
    /// True when the body holds only whitespace and comments.
    pub is_empty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// A quoted string; the value is stored without its quotes.
    Literal(String),
    /// `{...}`; the range covers the braces.
    Expression(ByteRange<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeKind {
    Named {
        name: String,
        value: Option<AttributeValue>,
    },
    /// `{...props}`; the range covers the braces.
    Spread(ByteRange<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub kind: AttributeKind,
    pub span: ByteRange<usize>,
}

impl Attribute {
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            AttributeKind::Named { name, .. } => Some(name),
            AttributeKind::Spread(_) => None,
        }
    }
}

/// A JSX element as written in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsxElement {
    /// `None` for fragments (`<>...</>`).
    pub name: Option<String>,
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
}

impl JsxElement {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => format!("<{name}>"),
            None => "<>".to_string(),
        }
    }
}

/// The closed vocabulary of MDX nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Frontmatter {
        dialect: FrontmatterDialect,
        /// The value between the fences, excluding the fence lines.
        value: ByteRange<usize>,
    },
    /// A run of ESM lines; its children are [`NodeKind::ModuleStatement`]s.
    ModuleBlock,
    ModuleStatement,
    BlockElement(JsxElement),
    InlineElement(JsxElement),
    BlockExpression(Expression),
    InlineExpression(Expression),
    Heading {
        depth: u8,
    },
    Paragraph,
    Code {
        lang: Option<String>,
    },
    InlineCode,
    Math,
    InlineMath,
    ThematicBreak,
    Text,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Root => "Root",
            NodeKind::Frontmatter { .. } => "Frontmatter",
            NodeKind::ModuleBlock => "ModuleBlock",
            NodeKind::ModuleStatement => "ModuleStatement",
            NodeKind::BlockElement(_) => "BlockElement",
            NodeKind::InlineElement(_) => "InlineElement",
            NodeKind::BlockExpression(_) => "BlockExpression",
            NodeKind::InlineExpression(_) => "InlineExpression",
            NodeKind::Heading { .. } => "Heading",
            NodeKind::Paragraph => "Paragraph",
            NodeKind::Code { .. } => "Code",
            NodeKind::InlineCode => "InlineCode",
            NodeKind::Math => "Math",
            NodeKind::InlineMath => "InlineMath",
            NodeKind::ThematicBreak => "ThematicBreak",
            NodeKind::Text => "Text",
        }
    }

    pub fn element(&self) -> Option<&JsxElement> {
        match self {
            NodeKind::BlockElement(element) | NodeKind::InlineElement(element) => Some(element),
            _ => None,
        }
    }

    pub fn expression(&self) -> Option<&Expression> {
        match self {
            NodeKind::BlockExpression(expression) | NodeKind::InlineExpression(expression) => {
                Some(expression)
            }
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Option<ByteRange<usize>>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind, span: ByteRange<usize>) -> Self {
        Self {
            kind,
            span: Some(span),
            children: Vec::new(),
        }
    }

    /// A node with no source position, as injected by syntax extensions.
    pub fn synthetic(kind: NodeKind) -> Self {
        Self {
            kind,
            span: None,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn start(&self) -> Option<usize> {
        self.span.as_ref().map(|span| span.start)
    }

    pub fn end(&self) -> Option<usize> {
        self.span.as_ref().map(|span| span.end)
    }

    /// The byte range spanned by positioned children, if any.
    pub fn children_span(&self) -> Option<ByteRange<usize>> {
        let start = self.children.iter().find_map(Node::start)?;
        let end = self.children.iter().rev().find_map(Node::end)?;
        Some(start..end)
    }

    /// Slice the node's text out of the source.
    pub fn text<'a>(&self, source: &'a str) -> Option<&'a str> {
        self.span.as_ref().and_then(|span| source.get(span.clone()))
    }

    /// Depth-first search for nodes matching `predicate`.
    pub fn descendants_matching<'a>(&'a self, predicate: impl Fn(&Node) -> bool) -> Vec<&'a Node> {
        let mut found = Vec::new();
        super::walk(
            self,
            &mut |node: &'a Node| {
                if predicate(node) {
                    found.push(node);
                }
            },
            &mut |_| {},
        );
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_span_skips_unpositioned_children() {
        let node = Node::new(NodeKind::Paragraph, 0..20).with_children(vec![
            Node::synthetic(NodeKind::Text),
            Node::new(NodeKind::Text, 3..8),
            Node::new(NodeKind::Text, 9..12),
            Node::synthetic(NodeKind::Text),
        ]);
        assert_eq!(node.children_span(), Some(3..12));
    }

    #[test]
    fn test_children_span_without_children() {
        let node = Node::new(NodeKind::Paragraph, 0..20);
        assert_eq!(node.children_span(), None);
    }

    #[test]
    fn test_display_name_for_fragment() {
        let fragment = JsxElement {
            name: None,
            attributes: Vec::new(),
            self_closing: false,
        };
        assert_eq!(fragment.display_name(), "<>");
    }
}
