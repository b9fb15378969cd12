//! # mdx-compiler
//!
//! Compiles one MDX document into virtual documents that single-language analyzers can read,
//! with exact byte mappings back to the MDX source.
//!
//! Pipeline
//!
//!     text ─▶ parse ─▶ classify ─▶ shadows ─┬─▶ script document   (javascriptreact)
//!                                            └─▶ prose document    (markdown)
//!                                                  └─▶ front-matter (yaml / toml)
//!
//!     - [classify]: sort the tree's byte ranges into module, code, front-matter and prose.
//!     - [shadow]: blank everything outside module (resp. code) ranges, keeping length.
//!     - [script]: wrap the two shadows in a component scaffold.
//!     - [prose]: keep the prose, replace the rest with placeholders, line by line.
//!     - [mapping]: the offset tables and the builder every generated text goes through.
//!     - [virtual_code]: the documents and the per-file container.
//!
//!     [compile] is pure: same text and options, same output. It does no I/O.
//!
//! Parse failures
//!
//!     MDX either parses or it does not. On failure the script document is a fixed empty
//!     component, the prose document is the raw text, neither has mappings, and the error is
//!     returned so the caller can report it as the only diagnostic.

pub mod classify;
pub mod mapping;
pub mod prose;
pub mod script;
pub mod shadow;
pub mod virtual_code;

pub use classify::{classify, RangeSet, Regions};
pub use mapping::{MappedText, Mapping, MappingEntry};
pub use mdx_parser::{FrontmatterDialect, Node, ParseError, SyntaxExtension};
pub use virtual_code::{LanguageTag, VirtualDocument, VirtualFile};

use mdx_parser::{parse_document, ParseOptions};
use serde::{Deserialize, Serialize};

pub const SCRIPT_DOCUMENT_ID: &str = "jsx";
pub const MARKDOWN_DOCUMENT_ID: &str = "md";
pub const FRONTMATTER_DOCUMENT_ID: &str = "frontmatter";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Prepend `// @ts-check` to the script document.
    pub check_js: bool,
    /// Module the JSX runtime pragma imports from.
    pub jsx_import_source: String,
    pub extensions: Vec<SyntaxExtension>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            check_js: false,
            jsx_import_source: "react".to_string(),
            extensions: ParseOptions::default().extensions,
        }
    }
}

impl CompileOptions {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            extensions: self.extensions.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutput {
    /// The tree, when the document parsed.
    pub ast: Option<Node>,
    pub error: Option<ParseError>,
    /// Script document first, then the prose document (which embeds front-matter).
    pub virtual_documents: Vec<VirtualDocument>,
}

/// Compile `source` into its virtual documents.
pub fn compile(source: &str, options: &CompileOptions) -> CompileOutput {
    let ast = match parse_document(source, &options.parse_options()) {
        Ok(ast) => ast,
        Err(error) => {
            tracing::debug!(
                error = %error,
                start = error.span.start,
                end = error.span.end,
                "mdx parse failed, using fallback documents"
            );
            return CompileOutput {
                ast: None,
                error: Some(error),
                virtual_documents: fallback_documents(source),
            };
        }
    };

    let regions = classify(&ast);
    let shadows = shadow::synthesize(source, &regions.module, &regions.code);

    let (script_text, script_mapping) = script::assemble_script(
        source,
        &shadows,
        &regions.module,
        &regions.code,
        options.check_js,
        &options.jsx_import_source,
    );
    let script = VirtualDocument::new(
        SCRIPT_DOCUMENT_ID,
        LanguageTag::Script,
        script_text,
        script_mapping,
    );

    let (prose_text, prose_mapping) =
        prose::assemble_prose(source, &regions.non_prose(), &regions.embedded_content);
    let frontmatter = regions
        .frontmatter
        .iter()
        .map(|region| {
            let mut mapped = MappedText::new(source);
            mapped.push_source(region.value.clone());
            let (text, mapping) = mapped.finish();
            let language = match region.dialect {
                FrontmatterDialect::Yaml => LanguageTag::Yaml,
                FrontmatterDialect::Toml => LanguageTag::Toml,
            };
            VirtualDocument::new(FRONTMATTER_DOCUMENT_ID, language, text, mapping)
        })
        .collect();
    let markdown = VirtualDocument::new(
        MARKDOWN_DOCUMENT_ID,
        LanguageTag::Markdown,
        prose_text,
        prose_mapping,
    )
    .with_embedded(frontmatter);

    tracing::debug!(
        bytes = source.len(),
        script_mappings = script.mapping().len(),
        prose_mappings = markdown.mapping().len(),
        "compiled mdx document"
    );

    CompileOutput {
        ast: Some(ast),
        error: None,
        virtual_documents: vec![script, markdown],
    }
}

fn fallback_documents(source: &str) -> Vec<VirtualDocument> {
    vec![
        VirtualDocument::new(
            SCRIPT_DOCUMENT_ID,
            LanguageTag::Script,
            script::FALLBACK_SCRIPT.to_string(),
            Mapping::new(),
        ),
        VirtualDocument::new(
            MARKDOWN_DOCUMENT_ID,
            LanguageTag::Markdown,
            source.to_string(),
            Mapping::new(),
        ),
    ]
}
