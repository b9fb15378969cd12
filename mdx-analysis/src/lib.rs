//! Editor intelligence for MDX on top of virtual documents.
//!
//!     The compiler splits an MDX file into single-language virtual documents. This crate
//!     holds the two halves that make those documents useful to an editor:
//!
//!         Services ([service], [registry]):
//!             Analyzers that each read one kind of virtual document, in that document's own
//!             coordinates. Two are built in: [markdown::MarkdownService] for the prose and
//!             [script::ScriptBindingsService] for the generated script.
//!
//!         Features ([features]):
//!             Diagnostics, hover, completion, definition, rename, folding and outline for a
//!             whole file. They route requests to the documents that cover a source offset and
//!             translate the answers back through the mappings.
//!
//!     Nothing here knows about the editor protocol wire format beyond the kind enums borrowed
//!     from lsp-types; positions are byte offsets into the MDX source.

pub mod features;
pub mod markdown;
pub mod registry;
pub mod script;
pub mod service;

pub use registry::AnalyzerRegistry;
pub use service::{LanguageService, ServiceError, ServiceResult};
