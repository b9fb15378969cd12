//! Lexical script analyzer
//!
//!     A stand-in for a real JavaScript language service. It reads the generated script
//!     document, collects the bindings introduced by top-level `import` and `export`
//!     statements, and resolves identifiers by name. There is no scope analysis: a name is
//!     either bound by the module or it is not.
//!
//!     What it answers:
//!         - hover and go-to-definition on bound identifiers
//!         - rename of a binding and every reference to it
//!         - completion of bound names (components only after `<`)
//!         - outline symbols for bindings
//!         - diagnostics: unused imports, capitalized JSX tags with no binding, and names
//!           bound twice
//!
//!     Identifiers come from the script tokenizer, so strings and comments never count.

use crate::service::{
    expect_language, LanguageService, RelatedInformation, ServiceCompletion, ServiceDiagnostic,
    ServiceEdit, ServiceError, ServiceHover, ServiceResult, ServiceSymbol,
};
use lsp_types::{CompletionItemKind, DiagnosticSeverity, SymbolKind};
use mdx_compiler::{LanguageTag, VirtualDocument};
use mdx_config::DiagnosticsConfig;
use mdx_parser::mdx::lexing::{identifiers, Identifier};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::ops::Range as ByteRange;

pub const SOURCE: &str = "mdx-script";

static IMPORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^import\s+(?P<clause>[^;'"]*?)\s*from\s*['"](?P<source>[^'"\n]*)['"]"#)
        .unwrap()
});

static EXPORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^export\s+(?:default\s+)?(?:async\s+)?(?P<keyword>const|let|var|function\*?|class)\s+(?P<name>[\p{L}_$][\p{L}\p{N}_$]*)",
    )
    .unwrap()
});

static IDENTIFIER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}_$][\p{L}\p{N}_$]*").unwrap());

static VALID_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}_$][\p{L}\p{N}_$]*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingKind {
    Import {
        source: String,
        /// `{name}` without `as`: renaming must keep the imported name.
        needs_alias: bool,
    },
    Export {
        keyword: String,
    },
}

/// A name bound at module level, in generated coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub span: ByteRange<usize>,
    pub statement: ByteRange<usize>,
    pub kind: BindingKind,
}

impl Binding {
    fn detail(&self) -> String {
        match &self.kind {
            BindingKind::Import { source, .. } => format!("import from '{source}'"),
            BindingKind::Export { keyword } => format!("export {keyword}"),
        }
    }

    fn is_import(&self) -> bool {
        matches!(self.kind, BindingKind::Import { .. })
    }

    fn symbol_kind(&self) -> SymbolKind {
        match &self.kind {
            BindingKind::Import { .. } => SymbolKind::MODULE,
            BindingKind::Export { keyword } if keyword.starts_with("function") => {
                SymbolKind::FUNCTION
            }
            BindingKind::Export { keyword } if keyword == "class" => SymbolKind::CLASS,
            BindingKind::Export { keyword } if keyword == "const" => SymbolKind::CONSTANT,
            BindingKind::Export { .. } => SymbolKind::VARIABLE,
        }
    }
}

fn import_bindings(captures: &Captures<'_>, found: &mut Vec<Binding>) {
    let (Some(statement), Some(clause), Some(source)) = (
        captures.get(0),
        captures.name("clause"),
        captures.name("source"),
    ) else {
        return;
    };
    let braces = clause
        .as_str()
        .find('{')
        .map(|open| {
            let close = clause.as_str().find('}').unwrap_or(clause.as_str().len());
            clause.start() + open..clause.start() + close
        });

    let mut piece_start = clause.start();
    for piece in clause.as_str().split(',') {
        let words: Vec<_> = IDENTIFIER_REGEX.find_iter(piece).collect();
        if let Some(local) = words.last() {
            let span = piece_start + local.start()..piece_start + local.end();
            let named = braces
                .as_ref()
                .is_some_and(|braces| braces.start < span.start && span.end <= braces.end);
            found.push(Binding {
                name: local.as_str().to_string(),
                span,
                statement: statement.range(),
                kind: BindingKind::Import {
                    source: source.as_str().to_string(),
                    needs_alias: named && words.len() == 1,
                },
            });
        }
        piece_start += piece.len() + 1;
    }
}

/// Bindings introduced by top-level imports and exports, in text order.
pub fn bindings(text: &str) -> Vec<Binding> {
    let mut found = Vec::new();
    for captures in IMPORT_REGEX.captures_iter(text) {
        import_bindings(&captures, &mut found);
    }
    for captures in EXPORT_REGEX.captures_iter(text) {
        let (Some(statement), Some(name), Some(keyword)) =
            (captures.get(0), captures.name("name"), captures.name("keyword"))
        else {
            continue;
        };
        let line_end = text[statement.start()..]
            .find('\n')
            .map(|idx| statement.start() + idx)
            .unwrap_or(text.len());
        found.push(Binding {
            name: name.as_str().to_string(),
            span: name.range(),
            statement: statement.start()..line_end,
            kind: BindingKind::Export {
                keyword: keyword.as_str().to_string(),
            },
        });
    }
    found.sort_by_key(|binding| binding.span.start);
    found
}

fn identifier_at(identifiers: &[Identifier<'_>], offset: usize) -> Option<usize> {
    identifiers
        .iter()
        .position(|id| id.span.start <= offset && offset <= id.span.end)
}

fn preceding_byte(text: &str, offset: usize) -> Option<u8> {
    offset.checked_sub(1).map(|idx| text.as_bytes()[idx])
}

/// References to `binding`: same-named identifiers that are not property accesses.
fn references<'t>(
    identifiers: &'t [Identifier<'t>],
    binding: &'t Binding,
) -> impl Iterator<Item = &'t Identifier<'t>> + 't {
    identifiers.iter().filter(move |id| {
        !id.is_property && id.name == binding.name && id.span != binding.span
    })
}

/// The analysis of one script document.
///
/// Declarations with no source, like the generated component wrapper, are not bindings.
struct Analysis<'t> {
    text: &'t str,
    bindings: Vec<Binding>,
    identifiers: Vec<Identifier<'t>>,
}

impl<'t> Analysis<'t> {
    fn new(document: &'t VirtualDocument) -> Self {
        let text = document.text();
        Self {
            text,
            bindings: bindings(text)
                .into_iter()
                .filter(|binding| document.to_source_offset(binding.span.start).is_some())
                .collect(),
            identifiers: identifiers(text),
        }
    }

    fn binding_named(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().find(|binding| binding.name == name)
    }

    /// The identifier at `offset` and the binding it resolves to.
    fn resolve(&self, offset: usize) -> Option<(&Identifier<'t>, &Binding)> {
        let identifier = &self.identifiers[identifier_at(&self.identifiers, offset)?];
        if identifier.is_property {
            return None;
        }
        let binding = self
            .bindings
            .iter()
            .find(|binding| binding.span == identifier.span)
            .or_else(|| self.binding_named(identifier.name))?;
        Some((identifier, binding))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScriptBindingsService {
    config: DiagnosticsConfig,
}

impl ScriptBindingsService {
    pub fn new(config: DiagnosticsConfig) -> Self {
        Self { config }
    }

    fn diagnostic(
        &self,
        range: ByteRange<usize>,
        severity: DiagnosticSeverity,
        code: &str,
        message: String,
    ) -> ServiceDiagnostic {
        ServiceDiagnostic {
            range,
            severity,
            code: Some(code.to_string()),
            message,
            source: SOURCE.to_string(),
            related: Vec::new(),
        }
    }
}

impl LanguageService for ScriptBindingsService {
    fn language(&self) -> LanguageTag {
        LanguageTag::Script
    }

    fn diagnostics(&self, document: &VirtualDocument) -> ServiceResult<Vec<ServiceDiagnostic>> {
        expect_language(self, document)?;
        let analysis = Analysis::new(document);
        let mut diagnostics = Vec::new();

        let mut seen: Vec<&Binding> = Vec::new();
        for binding in &analysis.bindings {
            match seen.iter().find(|first| first.name == binding.name) {
                Some(first) => {
                    let mut diagnostic = self.diagnostic(
                        binding.span.clone(),
                        DiagnosticSeverity::WARNING,
                        "duplicate-binding",
                        format!("`{}` is declared more than once", binding.name),
                    );
                    diagnostic.related.push(RelatedInformation {
                        range: first.span.clone(),
                        message: format!("`{}` is first declared here", first.name),
                    });
                    diagnostics.push(diagnostic);
                }
                None => seen.push(binding),
            }
        }

        if self.config.unused_imports {
            for binding in analysis.bindings.iter().filter(|b| b.is_import()) {
                if references(&analysis.identifiers, binding).next().is_none() {
                    diagnostics.push(self.diagnostic(
                        binding.span.clone(),
                        DiagnosticSeverity::HINT,
                        "unused-import",
                        format!("`{}` is imported but never used", binding.name),
                    ));
                }
            }
        }

        if self.config.undefined_components {
            let bound: HashSet<&str> = analysis.bindings.iter().map(|b| b.name.as_str()).collect();
            for identifier in &analysis.identifiers {
                let is_tag = preceding_byte(analysis.text, identifier.span.start) == Some(b'<');
                let is_component = identifier.name.starts_with(char::is_uppercase);
                if is_tag && is_component && !bound.contains(identifier.name) {
                    diagnostics.push(self.diagnostic(
                        identifier.span.clone(),
                        DiagnosticSeverity::WARNING,
                        "undefined-component",
                        format!(
                            "`{}` is not imported or exported in this document",
                            identifier.name
                        ),
                    ));
                }
            }
        }

        diagnostics.sort_by_key(|diagnostic| diagnostic.range.start);
        Ok(diagnostics)
    }

    fn hover(&self, document: &VirtualDocument, offset: usize) -> ServiceResult<Option<ServiceHover>> {
        expect_language(self, document)?;
        ServiceError::check_offset(document, offset)?;
        let analysis = Analysis::new(document);
        Ok(analysis.resolve(offset).map(|(identifier, binding)| ServiceHover {
            range: Some(identifier.span.clone()),
            contents: format!(
                "```javascript\n{}\n```\n{}",
                &analysis.text[binding.statement.clone()],
                binding.detail()
            ),
        }))
    }

    fn completions(
        &self,
        document: &VirtualDocument,
        offset: usize,
    ) -> ServiceResult<Vec<ServiceCompletion>> {
        expect_language(self, document)?;
        ServiceError::check_offset(document, offset)?;
        let analysis = Analysis::new(document);

        let prefix = analysis
            .identifiers
            .iter()
            .find(|id| id.span.start < offset && id.span.end == offset);
        let word_start = prefix.map(|id| id.span.start).unwrap_or(offset);
        let before = preceding_byte(analysis.text, word_start);
        if before == Some(b'.') {
            return Ok(Vec::new());
        }
        let tag_only = before == Some(b'<');

        let mut labels = HashSet::new();
        Ok(analysis
            .bindings
            .iter()
            .filter(|binding| !tag_only || binding.name.starts_with(char::is_uppercase))
            .filter(|binding| labels.insert(binding.name.clone()))
            .map(|binding| ServiceCompletion {
                label: binding.name.clone(),
                kind: if binding.name.starts_with(char::is_uppercase) {
                    CompletionItemKind::CLASS
                } else {
                    CompletionItemKind::VARIABLE
                },
                detail: Some(binding.detail()),
                edit_range: prefix.map(|id| id.span.clone()),
            })
            .collect())
    }

    fn definition(
        &self,
        document: &VirtualDocument,
        offset: usize,
    ) -> ServiceResult<Vec<ByteRange<usize>>> {
        expect_language(self, document)?;
        ServiceError::check_offset(document, offset)?;
        let analysis = Analysis::new(document);
        Ok(analysis
            .resolve(offset)
            .map(|(_, binding)| vec![binding.span.clone()])
            .unwrap_or_default())
    }

    fn rename(
        &self,
        document: &VirtualDocument,
        offset: usize,
        new_name: &str,
    ) -> ServiceResult<Vec<ServiceEdit>> {
        expect_language(self, document)?;
        ServiceError::check_offset(document, offset)?;
        if !VALID_NAME_REGEX.is_match(new_name) {
            return Err(ServiceError::InvalidName(new_name.to_string()));
        }
        let analysis = Analysis::new(document);
        let Some((_, binding)) = analysis.resolve(offset) else {
            return Ok(Vec::new());
        };

        let declaration = match &binding.kind {
            BindingKind::Import {
                needs_alias: true, ..
            } => format!("{} as {}", binding.name, new_name),
            _ => new_name.to_string(),
        };
        let mut edits = vec![ServiceEdit {
            range: binding.span.clone(),
            new_text: declaration,
        }];
        edits.extend(
            references(&analysis.identifiers, binding).map(|identifier| ServiceEdit {
                range: identifier.span.clone(),
                new_text: new_name.to_string(),
            }),
        );
        edits.sort_by_key(|edit| edit.range.start);
        Ok(edits)
    }

    fn document_symbols(&self, document: &VirtualDocument) -> ServiceResult<Vec<ServiceSymbol>> {
        expect_language(self, document)?;
        Ok(Analysis::new(document)
            .bindings
            .into_iter()
            .map(|binding| ServiceSymbol {
                name: binding.name.clone(),
                detail: Some(binding.detail()),
                kind: binding.symbol_kind(),
                range: binding.statement.clone(),
                selection_range: binding.span.clone(),
                children: Vec::new(),
            })
            .collect())
    }
}
