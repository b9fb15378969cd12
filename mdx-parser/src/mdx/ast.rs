//! AST definitions and utilities for MDX documents
//!
//!     An MDX document is one text file in which four sub-languages share the same lines:
//!     front-matter, ESM statements, JSX (elements and `{expressions}`) and markdown prose.
//!     The tree produced here keeps only what the virtual-code compiler needs to tell those
//!     apart: a closed set of node kinds and the byte span of every node.
//!
//! Nodes and Spans
//!
//!     Every [Node] carries `span: Option<ByteRange<usize>>`. Spans are half-open byte ranges
//!     into the original text. The parser always fills them; `None` exists for nodes injected
//!     by syntax extensions that have no source position, and consumers skip such nodes.
//!
//!     Children nest within their parent and siblings appear in document order without
//!     overlapping. Element nodes only list their content as children; tag delimiters and
//!     attributes are part of the element span but belong to no child.
//!
//! Locations
//!
//!     Byte offsets are converted to line/column positions with [SourceLocation], which offers
//!     both byte columns and UTF-16 columns (the editor protocol default).

pub mod error;
pub mod node;
pub mod range;
pub mod visit;

pub use error::{format_source_context, ParseError, ParseResult};
pub use node::{
    Attribute, AttributeKind, AttributeValue, Expression, FrontmatterDialect, JsxElement, Node,
    NodeKind,
};
pub use range::{Position, Range, SourceLocation};
pub use visit::walk;
