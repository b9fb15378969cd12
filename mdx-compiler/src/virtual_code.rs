//! Virtual documents
//!
//!     A [VirtualDocument] is one generated view of an MDX file, addressed by an id and tagged
//!     with the language of the analyzer that should read it. It owns its text and mapping and
//!     translates offsets between itself and the MDX source. Documents can carry embedded
//!     documents; front-matter is embedded in the markdown document.
//!
//!     [VirtualFile] is the per-file container kept by the language server. Its identity is
//!     stable across edits; everything derived from the text is recompiled and replaced on
//!     every update.

use crate::mapping::Mapping;
use crate::{compile, CompileOptions, CompileOutput};
use mdx_parser::{Node, ParseError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range as ByteRange;

/// Which analyzer a virtual document is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    Script,
    Markdown,
    Yaml,
    Toml,
}

impl LanguageTag {
    /// Editor protocol language id.
    pub fn language_id(&self) -> &'static str {
        match self {
            LanguageTag::Script => "javascriptreact",
            LanguageTag::Markdown => "markdown",
            LanguageTag::Yaml => "yaml",
            LanguageTag::Toml => "toml",
        }
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.language_id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualDocument {
    id: String,
    language: LanguageTag,
    text: String,
    mapping: Mapping,
    embedded: Vec<VirtualDocument>,
}

impl VirtualDocument {
    pub fn new(
        id: impl Into<String>,
        language: LanguageTag,
        text: String,
        mapping: Mapping,
    ) -> Self {
        Self {
            id: id.into(),
            language,
            text,
            mapping,
            embedded: Vec::new(),
        }
    }

    pub fn with_embedded(mut self, embedded: Vec<VirtualDocument>) -> Self {
        self.embedded = embedded;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn language_tag(&self) -> LanguageTag {
        self.language
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn embedded_documents(&self) -> &[VirtualDocument] {
        &self.embedded
    }

    /// This document followed by its embedded documents, depth first.
    pub fn iter(&self) -> impl Iterator<Item = &VirtualDocument> + '_ {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let document = stack.pop()?;
            stack.extend(document.embedded.iter().rev());
            Some(document)
        })
    }

    pub fn to_generated_offset(&self, source_offset: usize) -> Option<usize> {
        self.mapping.to_generated(source_offset)
    }

    pub fn to_source_offset(&self, generated_offset: usize) -> Option<usize> {
        self.mapping.to_source(generated_offset)
    }

    /// Cursor variant: the position right after a mapped token also maps.
    pub fn to_generated_cursor(&self, source_offset: usize) -> Option<usize> {
        self.mapping.to_generated_cursor(source_offset)
    }

    pub fn to_source_cursor(&self, generated_offset: usize) -> Option<usize> {
        self.mapping.to_source_cursor(generated_offset)
    }

    pub fn to_source_range(&self, range: ByteRange<usize>) -> Option<ByteRange<usize>> {
        self.mapping.to_source_range(range)
    }

    pub fn to_generated_range(&self, range: ByteRange<usize>) -> Option<ByteRange<usize>> {
        self.mapping.to_generated_range(range)
    }

    pub fn to_source_range_enclosing(&self, range: ByteRange<usize>) -> Option<ByteRange<usize>> {
        self.mapping.to_source_range_enclosing(range)
    }
}

/// The compiled state of one MDX file.
#[derive(Debug, Clone)]
pub struct VirtualFile {
    id: String,
    source: String,
    options: CompileOptions,
    output: CompileOutput,
    version: u64,
}

impl VirtualFile {
    pub fn new(id: impl Into<String>, source: impl Into<String>, options: CompileOptions) -> Self {
        let source = source.into();
        let output = compile(&source, &options);
        Self {
            id: id.into(),
            source,
            options,
            output,
            version: 0,
        }
    }

    /// Replace the text and recompile everything derived from it.
    pub fn update(&mut self, source: impl Into<String>) {
        self.source = source.into();
        self.output = compile(&self.source, &self.options);
        self.version += 1;
    }

    /// Recompile with new options, keeping the text.
    pub fn reconfigure(&mut self, options: CompileOptions) {
        self.options = options;
        self.output = compile(&self.source, &self.options);
        self.version += 1;
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Number of updates applied since creation.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn ast(&self) -> Option<&Node> {
        self.output.ast.as_ref()
    }

    pub fn error(&self) -> Option<&ParseError> {
        self.output.error.as_ref()
    }

    /// Top-level documents.
    pub fn documents(&self) -> &[VirtualDocument] {
        &self.output.virtual_documents
    }

    /// Every document, embedded ones included.
    pub fn all_documents(&self) -> impl Iterator<Item = &VirtualDocument> + '_ {
        self.output
            .virtual_documents
            .iter()
            .flat_map(|document| document.iter())
    }

    pub fn find(&self, language: LanguageTag) -> Option<&VirtualDocument> {
        self.all_documents()
            .find(|document| document.language_tag() == language)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&VirtualDocument> {
        self.all_documents().find(|document| document.id() == id)
    }

    pub fn script(&self) -> Option<&VirtualDocument> {
        self.find(LanguageTag::Script)
    }

    pub fn markdown(&self) -> Option<&VirtualDocument> {
        self.find(LanguageTag::Markdown)
    }
}
