//! Language Server Protocol (LSP) implementation for MDX
//!
//!     MDX mixes three languages in one file: Markdown prose, JSX/ESM script and an optional
//!     front-matter block. Rather than teaching one analyzer all three, the compiler splits each
//!     file into single-language virtual documents with byte mappings back to the source, and
//!     this crate serves the editor features computed over them.
//!
//! Feature Set
//!
//!     1. Diagnostics (textDocument/publishDiagnostics):
//!         - The parse error when a file does not parse, and nothing else
//!         - Unused imports, components used without a binding, duplicate bindings
//!
//!     2. Hover, Completion, Go to Definition, Rename:
//!         - Answered over the script document for bindings declared in ESM blocks
//!         - Completion triggers on `<`, `{` and `.`
//!
//!     3. Document Symbols and Folding Ranges:
//!         - Heading outline from the prose, bindings from the script
//!         - Folds for front matter, ESM blocks, JSX blocks and fenced code
//!
//! Architecture
//!
//!     LSP Layer (tower-lsp):
//!         - JSON-RPC, capability negotiation and request routing
//!
//!     Server Layer (this crate):
//!         - Implements the LanguageServer trait
//!         - Keeps one compiled file per open URI and converts UTF-16 positions to byte offsets
//!         - Thin tests asserting the right features are called and their results converted
//!
//!     Feature Layer (mdx-analysis):
//!         - Works on byte offsets into the MDX source
//!         - All logic and dense unit tests
//!
//! Configuration
//!
//!     Settings come from the embedded defaults, an optional `--config` TOML file, and finally
//!     the client's `initializationOptions`, which mirror the TOML tables:
//!
//!         {"compiler": {"jsx_import_source": "preact"}, "diagnostics": {"unused_imports": false}}
//!
//! Usage
//!
//!     $ mdx-lsp --config mdx.toml
//!     Starts the language server on stdin/stdout. Logs go to stderr, filtered by `MDX_LSP_LOG`
//!     or `RUST_LOG`.

pub mod logging;
pub mod server;

pub use server::MdxLanguageServer;
