//! Analyzer service contract
//!
//!     A [LanguageService] answers questions about one virtual document. Everything it takes
//!     and returns is in that document's generated coordinates: byte offsets into
//!     [VirtualDocument::text]. Translating back to the MDX source is the job of
//!     [features](crate::features), which is the only place that touches mappings.
//!
//!     Every method has an empty default so a service only implements what its language
//!     supports.

use lsp_types::{CompletionItemKind, DiagnosticSeverity, FoldingRangeKind, SymbolKind};
use mdx_compiler::{LanguageTag, VirtualDocument};
use std::ops::Range as ByteRange;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{service} service cannot analyze a {found} document")]
    WrongLanguage {
        service: LanguageTag,
        found: LanguageTag,
    },
    #[error("offset {offset} is outside a document of {len} bytes")]
    OutOfBounds { offset: usize, len: usize },
    #[error("`{0}` is not a valid identifier")]
    InvalidName(String),
}

impl ServiceError {
    /// Check that `offset` addresses `document`, end of text included.
    pub fn check_offset(document: &VirtualDocument, offset: usize) -> ServiceResult<()> {
        let len = document.text().len();
        if offset > len {
            return Err(ServiceError::OutOfBounds { offset, len });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInformation {
    pub range: ByteRange<usize>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDiagnostic {
    pub range: ByteRange<usize>,
    pub severity: DiagnosticSeverity,
    pub code: Option<String>,
    pub message: String,
    /// Analyzer name shown by the editor.
    pub source: String,
    pub related: Vec<RelatedInformation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHover {
    pub range: Option<ByteRange<usize>>,
    /// Markdown
    pub contents: String,
}

/// A completion candidate; `edit_range` is the text the label replaces, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCompletion {
    pub label: String,
    pub kind: CompletionItemKind,
    pub detail: Option<String>,
    pub edit_range: Option<ByteRange<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEdit {
    pub range: ByteRange<usize>,
    pub new_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFold {
    pub range: ByteRange<usize>,
    pub kind: Option<FoldingRangeKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSymbol {
    pub name: String,
    pub detail: Option<String>,
    pub kind: SymbolKind,
    pub range: ByteRange<usize>,
    pub selection_range: ByteRange<usize>,
    pub children: Vec<ServiceSymbol>,
}

pub trait LanguageService: Send + Sync {
    /// The document language this service reads.
    fn language(&self) -> LanguageTag;

    fn diagnostics(&self, _document: &VirtualDocument) -> ServiceResult<Vec<ServiceDiagnostic>> {
        Ok(Vec::new())
    }

    fn hover(
        &self,
        _document: &VirtualDocument,
        _offset: usize,
    ) -> ServiceResult<Option<ServiceHover>> {
        Ok(None)
    }

    fn completions(
        &self,
        _document: &VirtualDocument,
        _offset: usize,
    ) -> ServiceResult<Vec<ServiceCompletion>> {
        Ok(Vec::new())
    }

    /// Ranges of the declarations the identifier at `offset` refers to.
    fn definition(
        &self,
        _document: &VirtualDocument,
        _offset: usize,
    ) -> ServiceResult<Vec<ByteRange<usize>>> {
        Ok(Vec::new())
    }

    fn rename(
        &self,
        _document: &VirtualDocument,
        _offset: usize,
        _new_name: &str,
    ) -> ServiceResult<Vec<ServiceEdit>> {
        Ok(Vec::new())
    }

    fn folding_ranges(&self, _document: &VirtualDocument) -> ServiceResult<Vec<ServiceFold>> {
        Ok(Vec::new())
    }

    fn document_symbols(&self, _document: &VirtualDocument) -> ServiceResult<Vec<ServiceSymbol>> {
        Ok(Vec::new())
    }
}

/// Reject documents of another language.
pub(crate) fn expect_language(
    service: &dyn LanguageService,
    document: &VirtualDocument,
) -> ServiceResult<()> {
    if document.language_tag() != service.language() {
        return Err(ServiceError::WrongLanguage {
            service: service.language(),
            found: document.language_tag(),
        });
    }
    Ok(())
}
