//! Region classification
//!
//!     One pre-order walk over the tree sorts every byte of the document into a destination:
//!
//!         front-matter   the value between the fences, extracted as its own document
//!         module         ESM statements, plus the inside of empty `{}` expressions
//!         code           JSX tags (not their content) and non-empty `{expressions}`
//!         prose          everything else, by complement
//!
//!     Module and code ranges come from different node kinds and never overlap. An element
//!     contributes only its own markup: with children, the bytes before the first child and
//!     after the last child. Its content is classified by its children.
//!
//!     Nodes without a span (injected by extensions) are skipped together with their subtree.

use mdx_parser::mdx::ast::{FrontmatterDialect, Node, NodeKind};
use mdx_parser::walk;
use std::cell::{Cell, RefCell};
use std::ops::Range as ByteRange;

/// Sorted, deduplicated byte ranges of one classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSet {
    /// As recorded, ordered by `(start, end)`.
    ranges: Vec<ByteRange<usize>>,
    /// Non-empty, non-overlapping, non-adjacent cover of `ranges`.
    merged: Vec<ByteRange<usize>>,
}

impl RangeSet {
    pub fn new(mut ranges: Vec<ByteRange<usize>>) -> Self {
        ranges.sort_by_key(|range| (range.start, range.end));
        ranges.dedup();

        let mut merged: Vec<ByteRange<usize>> = Vec::with_capacity(ranges.len());
        for range in ranges.iter().filter(|range| !range.is_empty()) {
            match merged.last_mut() {
                Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
                _ => merged.push(range.clone()),
            }
        }

        Self { ranges, merged }
    }

    pub fn ranges(&self) -> &[ByteRange<usize>] {
        &self.ranges
    }

    pub fn merged(&self) -> &[ByteRange<usize>] {
        &self.merged
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn contains(&self, offset: usize) -> bool {
        let index = self.merged.partition_point(|range| range.start <= offset);
        index
            .checked_sub(1)
            .is_some_and(|index| offset < self.merged[index].end)
    }

    /// Union with another set.
    pub fn union(&self, other: &RangeSet) -> RangeSet {
        RangeSet::new(self.ranges.iter().chain(&other.ranges).cloned().collect())
    }

    /// Whether any byte belongs to both sets.
    pub fn intersects(&self, other: &RangeSet) -> bool {
        let (mut left, mut right) = (self.merged.iter().peekable(), other.merged.iter().peekable());
        while let (Some(a), Some(b)) = (left.peek(), right.peek()) {
            if a.start < b.end && b.start < a.end {
                return true;
            }
            if a.end <= b.end {
                left.next();
            } else {
                right.next();
            }
        }
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontmatterRegion {
    pub dialect: FrontmatterDialect,
    /// The whole block, fences included.
    pub span: ByteRange<usize>,
    /// The value between the fences.
    pub value: ByteRange<usize>,
}

/// Classification result for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Regions {
    pub frontmatter: Vec<FrontmatterRegion>,
    pub module: RangeSet,
    pub code: RangeSet,
    /// Content of block elements; lines starting here are dedented in the prose document.
    pub embedded_content: RangeSet,
}

impl Regions {
    /// Everything that is not prose: module, code and whole front-matter blocks.
    pub fn non_prose(&self) -> RangeSet {
        let frontmatter = RangeSet::new(
            self.frontmatter
                .iter()
                .map(|region| region.span.clone())
                .collect(),
        );
        self.module.union(&self.code).union(&frontmatter)
    }
}

#[derive(Default)]
struct Collected {
    frontmatter: Vec<FrontmatterRegion>,
    module: Vec<ByteRange<usize>>,
    code: Vec<ByteRange<usize>>,
    embedded_content: Vec<ByteRange<usize>>,
}

impl Collected {
    fn visit(&mut self, node: &Node, span: ByteRange<usize>) {
        match &node.kind {
            NodeKind::Frontmatter { dialect, value } => {
                self.frontmatter.push(FrontmatterRegion {
                    dialect: *dialect,
                    span,
                    value: value.clone(),
                });
            }
            NodeKind::ModuleStatement => self.module.push(span),
            NodeKind::BlockElement(_) | NodeKind::InlineElement(_) => {
                match node.children_span() {
                    Some(content) => {
                        self.code.push(span.start..content.start);
                        self.code.push(content.end..span.end);
                        if matches!(node.kind, NodeKind::BlockElement(_)) {
                            self.embedded_content.push(content);
                        }
                    }
                    None => self.code.push(span),
                }
            }
            NodeKind::BlockExpression(expression) | NodeKind::InlineExpression(expression) => {
                if expression.is_empty {
                    self.code.push(span.start..expression.body.start);
                    self.module.push(expression.body.clone());
                    self.code.push(expression.body.end..span.end);
                } else {
                    self.code.push(span);
                }
            }
            _ => {}
        }
    }
}

/// Classify every positioned node of `root`.
pub fn classify(root: &Node) -> Regions {
    let collected = RefCell::new(Collected::default());
    // Depth inside a skipped (unpositioned) subtree.
    let skipping = Cell::new(0usize);

    walk(
        root,
        &mut |node| {
            if skipping.get() > 0 {
                skipping.set(skipping.get() + 1);
                return;
            }
            match &node.span {
                Some(span) => collected.borrow_mut().visit(node, span.clone()),
                None => skipping.set(1),
            }
        },
        &mut |_| {
            if skipping.get() > 0 {
                skipping.set(skipping.get() - 1);
            }
        },
    );

    let collected = collected.into_inner();
    Regions {
        frontmatter: collected.frontmatter,
        module: RangeSet::new(collected.module),
        code: RangeSet::new(collected.code),
        embedded_content: RangeSet::new(collected.embedded_content),
    }
}
