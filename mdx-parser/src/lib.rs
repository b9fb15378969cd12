//! # mdx-parser
//!
//! A parser for MDX hybrid documents: markdown prose interleaved with front-matter,
//! ESM `import`/`export` statements and embedded JSX.
//!
//! File Layout
//!
//!     src/mdx
//!       ├── ast        Node tree, byte ranges, position conversion, errors
//!       ├── lexing     Script tokenizer used to balance braces inside embedded code
//!       └── parsing    Flow (line based) and inline parsers producing the tree
//!
//! The parser only understands as much JavaScript as it needs to find where an embedded
//! fragment ends. Everything it produces carries byte offsets into the original text so the
//! virtual-code compiler can slice and map them.

pub mod mdx;

pub use mdx::ast::{
    walk, FrontmatterDialect, Node, NodeKind, ParseError, Position, Range, SourceLocation,
};
pub use mdx::parsing::{parse_document, ParseOptions, SyntaxExtension};
