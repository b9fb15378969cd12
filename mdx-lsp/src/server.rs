//! Main language server implementation

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::ops::Range as ByteRange;
use std::sync::{Arc, PoisonError, RwLock as SyncRwLock};

use mdx_analysis::features::completion::{completions as collect_completions, MdxCompletion};
use mdx_analysis::features::definition::definition as collect_definition;
use mdx_analysis::features::diagnostics::{diagnostics as collect_diagnostics, MdxDiagnostic};
use mdx_analysis::features::document_symbols::{
    document_symbols as collect_document_symbols, MdxDocumentSymbol,
};
use mdx_analysis::features::folding_ranges::{
    folding_ranges as collect_folding_ranges, MdxFoldingRange,
};
use mdx_analysis::features::hover::{hover as compute_hover, MdxHover};
use mdx_analysis::features::rename::{rename as compute_rename, MdxTextEdit};
use mdx_analysis::{AnalyzerRegistry, ServiceResult};
use mdx_compiler::{CompileOptions, VirtualFile};
use mdx_config::{Loader, MdxConfig, SettingsError};
use mdx_parser::{Position as AstPosition, SourceLocation};
use serde_json::Value;
use tokio::sync::RwLock;
use tower_lsp::async_trait;
use tower_lsp::jsonrpc::{Error as RpcError, Result};
use tower_lsp::lsp_types::{
    CompletionItem, CompletionOptions, CompletionParams, CompletionResponse, CompletionTextEdit,
    Diagnostic, DiagnosticRelatedInformation, DiagnosticTag, DidChangeTextDocumentParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, DocumentSymbol, DocumentSymbolParams,
    DocumentSymbolResponse, FoldingRange, FoldingRangeParams, FoldingRangeProviderCapability,
    GotoDefinitionParams, GotoDefinitionResponse, Hover, HoverContents, HoverParams,
    HoverProviderCapability, InitializeParams, InitializeResult, InitializedParams, Location,
    MarkupContent, MarkupKind, NumberOrString, OneOf, Position, Range, RenameParams,
    ServerCapabilities, ServerInfo, TextDocumentItem, TextDocumentSyncCapability,
    TextDocumentSyncKind, TextEdit, Url, WorkspaceEdit,
};
use tower_lsp::Client;

/// The part of the client the server talks back to.
#[async_trait]
pub trait LspClient: Send + Sync + Clone + 'static {
    async fn publish_diagnostics(
        &self,
        uri: Url,
        diagnostics: Vec<Diagnostic>,
        version: Option<i32>,
    );
}

#[async_trait]
impl LspClient for Client {
    async fn publish_diagnostics(
        &self,
        uri: Url,
        diagnostics: Vec<Diagnostic>,
        version: Option<i32>,
    ) {
        Client::publish_diagnostics(self, uri, diagnostics, version).await;
    }
}

pub trait FeatureProvider: Send + Sync + 'static {
    /// Apply new settings.
    fn configure(&self, config: &MdxConfig);
    fn diagnostics(&self, file: &VirtualFile) -> Vec<MdxDiagnostic>;
    fn hover(&self, file: &VirtualFile, offset: usize) -> Option<MdxHover>;
    fn completions(&self, file: &VirtualFile, offset: usize) -> Vec<MdxCompletion>;
    fn definition(&self, file: &VirtualFile, offset: usize) -> Vec<ByteRange<usize>>;
    fn rename(
        &self,
        file: &VirtualFile,
        offset: usize,
        new_name: &str,
    ) -> ServiceResult<Vec<MdxTextEdit>>;
    fn folding_ranges(&self, file: &VirtualFile) -> Vec<MdxFoldingRange>;
    fn document_symbols(&self, file: &VirtualFile) -> Vec<MdxDocumentSymbol>;
}

/// Features backed by the built-in analyzer registry.
pub struct DefaultFeatureProvider {
    registry: SyncRwLock<AnalyzerRegistry>,
}

impl DefaultFeatureProvider {
    pub fn new(config: &MdxConfig) -> Self {
        Self {
            registry: SyncRwLock::new(AnalyzerRegistry::with_defaults(config)),
        }
    }

    fn with_registry<T>(&self, f: impl FnOnce(&AnalyzerRegistry) -> T) -> T {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        f(&registry)
    }
}

impl FeatureProvider for DefaultFeatureProvider {
    fn configure(&self, config: &MdxConfig) {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        *registry = AnalyzerRegistry::with_defaults(config);
    }

    fn diagnostics(&self, file: &VirtualFile) -> Vec<MdxDiagnostic> {
        self.with_registry(|registry| collect_diagnostics(file, registry))
    }

    fn hover(&self, file: &VirtualFile, offset: usize) -> Option<MdxHover> {
        self.with_registry(|registry| compute_hover(file, registry, offset))
    }

    fn completions(&self, file: &VirtualFile, offset: usize) -> Vec<MdxCompletion> {
        self.with_registry(|registry| collect_completions(file, registry, offset))
    }

    fn definition(&self, file: &VirtualFile, offset: usize) -> Vec<ByteRange<usize>> {
        self.with_registry(|registry| collect_definition(file, registry, offset))
    }

    fn rename(
        &self,
        file: &VirtualFile,
        offset: usize,
        new_name: &str,
    ) -> ServiceResult<Vec<MdxTextEdit>> {
        self.with_registry(|registry| compute_rename(file, registry, offset, new_name))
    }

    fn folding_ranges(&self, file: &VirtualFile) -> Vec<MdxFoldingRange> {
        self.with_registry(|registry| collect_folding_ranges(file, registry))
    }

    fn document_symbols(&self, file: &VirtualFile) -> Vec<MdxDocumentSymbol> {
        self.with_registry(|registry| collect_document_symbols(file, registry))
    }
}

/// One compiled container per open document.
///
/// Requests work on an `Arc` snapshot; an edit replaces the stored container, so a request
/// never sees a half-updated file.
#[derive(Default)]
struct DocumentStore {
    entries: RwLock<HashMap<Url, Arc<VirtualFile>>>,
}

impl DocumentStore {
    async fn open(&self, uri: Url, text: String, options: &CompileOptions) -> Arc<VirtualFile> {
        let file = Arc::new(VirtualFile::new(uri.as_str(), text, options.clone()));
        self.entries.write().await.insert(uri, file.clone());
        file
    }

    async fn change(&self, uri: Url, text: String, options: &CompileOptions) -> Arc<VirtualFile> {
        let mut entries = self.entries.write().await;
        match entries.entry(uri) {
            Entry::Occupied(mut entry) => {
                Arc::make_mut(entry.get_mut()).update(text);
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let file = Arc::new(VirtualFile::new(
                    entry.key().as_str(),
                    text,
                    options.clone(),
                ));
                entry.insert(file).clone()
            }
        }
    }

    async fn reconfigure(&self, options: &CompileOptions) {
        for file in self.entries.write().await.values_mut() {
            Arc::make_mut(file).reconfigure(options.clone());
        }
    }

    async fn get(&self, uri: &Url) -> Option<Arc<VirtualFile>> {
        self.entries.read().await.get(uri).cloned()
    }

    async fn remove(&self, uri: &Url) {
        self.entries.write().await.remove(uri);
    }
}

pub struct MdxLanguageServer<C = Client, P = DefaultFeatureProvider> {
    client: C,
    documents: DocumentStore,
    features: Arc<P>,
    /// Defaults plus the configuration file, before editor overrides.
    loader: Loader,
    settings: RwLock<MdxConfig>,
}

impl MdxLanguageServer<Client, DefaultFeatureProvider> {
    pub fn new(client: Client) -> Self {
        Self::with_settings(client, Loader::new(), MdxConfig::default())
    }

    pub fn with_settings(client: Client, loader: Loader, config: MdxConfig) -> Self {
        let features = Arc::new(DefaultFeatureProvider::new(&config));
        Self::with_features(client, features, loader, config)
    }
}

impl<C, P> MdxLanguageServer<C, P>
where
    C: LspClient,
    P: FeatureProvider,
{
    pub fn with_features(client: C, features: Arc<P>, loader: Loader, config: MdxConfig) -> Self {
        Self {
            client,
            documents: DocumentStore::default(),
            features,
            loader,
            settings: RwLock::new(config),
        }
    }

    async fn compile_options(&self) -> CompileOptions {
        self.settings.read().await.compile_options()
    }

    async fn document(&self, uri: &Url) -> Option<Arc<VirtualFile>> {
        self.documents.get(uri).await
    }

    async fn publish(&self, uri: Url, file: &VirtualFile, version: Option<i32>) {
        let location = SourceLocation::new(file.source());
        let diagnostics = self
            .features
            .diagnostics(file)
            .iter()
            .map(|diagnostic| to_lsp_diagnostic(&uri, &location, diagnostic))
            .collect();
        self.client
            .publish_diagnostics(uri, diagnostics, version)
            .await;
    }

    async fn apply_initialization_options(&self, options: Option<Value>) {
        let Some(options) = options else {
            return;
        };
        match settings_from_options(self.loader.clone(), &options) {
            Ok(config) => {
                tracing::info!(?config, "applied initialization options");
                self.features.configure(&config);
                *self.settings.write().await = config;
                let options = self.compile_options().await;
                self.documents.reconfigure(&options).await;
            }
            Err(error) => tracing::warn!(%error, "ignoring invalid initialization options"),
        }
    }
}

/// Layer the editor's `initializationOptions` (an object mirroring the TOML tables) over
/// `loader`.
pub fn settings_from_options(loader: Loader, options: &Value) -> std::result::Result<MdxConfig, SettingsError> {
    let loader = match options {
        Value::Object(_) => apply_options(loader, "", options)?,
        _ => loader,
    };
    loader.build()
}

fn apply_options(loader: Loader, key: &str, value: &Value) -> std::result::Result<Loader, SettingsError> {
    match value {
        Value::Object(map) => map.iter().try_fold(loader, |loader, (name, value)| {
            let key = if key.is_empty() {
                name.clone()
            } else {
                format!("{key}.{name}")
            };
            apply_options(loader, &key, value)
        }),
        Value::Bool(flag) => loader.set_override(key, *flag),
        Value::String(text) => loader.set_override(key, text.as_str()),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => loader.set_override(key, integer),
            None => loader.set_override(key, number.as_f64().unwrap_or_default()),
        },
        Value::Array(items) => loader.set_override(
            key,
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect::<Vec<_>>(),
        ),
        Value::Null => Ok(loader),
    }
}

fn to_lsp_position(position: &AstPosition) -> Position {
    Position::new(position.line as u32, position.column as u32)
}

fn to_lsp_range(location: &SourceLocation<'_>, range: &ByteRange<usize>) -> Range {
    let range = location.byte_range_to_utf16_range(range);
    Range {
        start: to_lsp_position(&range.start),
        end: to_lsp_position(&range.end),
    }
}

fn from_lsp_position(location: &SourceLocation<'_>, position: Position) -> usize {
    location.utf16_position_to_offset(AstPosition::new(
        position.line as usize,
        position.character as usize,
    ))
}

fn to_lsp_diagnostic(
    uri: &Url,
    location: &SourceLocation<'_>,
    diagnostic: &MdxDiagnostic,
) -> Diagnostic {
    let related: Vec<_> = diagnostic
        .related
        .iter()
        .map(|info| DiagnosticRelatedInformation {
            location: Location::new(uri.clone(), to_lsp_range(location, &info.range)),
            message: info.message.clone(),
        })
        .collect();
    Diagnostic {
        range: to_lsp_range(location, &diagnostic.range),
        severity: Some(diagnostic.severity),
        code: diagnostic.code.clone().map(NumberOrString::String),
        code_description: None,
        source: Some(diagnostic.source.clone()),
        message: diagnostic.message.clone(),
        related_information: (!related.is_empty()).then_some(related),
        tags: (diagnostic.code.as_deref() == Some("unused-import"))
            .then(|| vec![DiagnosticTag::UNNECESSARY]),
        data: None,
    }
}

fn to_completion_item(location: &SourceLocation<'_>, item: &MdxCompletion) -> CompletionItem {
    CompletionItem {
        label: item.label.clone(),
        kind: Some(item.kind),
        detail: item.detail.clone(),
        text_edit: item.edit_range.as_ref().map(|range| {
            CompletionTextEdit::Edit(TextEdit::new(
                to_lsp_range(location, range),
                item.label.clone(),
            ))
        }),
        ..CompletionItem::default()
    }
}

#[allow(deprecated)]
fn to_document_symbol(location: &SourceLocation<'_>, symbol: &MdxDocumentSymbol) -> DocumentSymbol {
    DocumentSymbol {
        name: symbol.name.clone(),
        detail: symbol.detail.clone(),
        kind: symbol.kind,
        deprecated: None,
        range: to_lsp_range(location, &symbol.range),
        selection_range: to_lsp_range(location, &symbol.selection_range),
        children: if symbol.children.is_empty() {
            None
        } else {
            Some(
                symbol
                    .children
                    .iter()
                    .map(|child| to_document_symbol(location, child))
                    .collect(),
            )
        },
        tags: None,
    }
}

fn to_lsp_folding_range(range: &MdxFoldingRange) -> FoldingRange {
    FoldingRange {
        start_line: range.start_line,
        start_character: None,
        end_line: range.end_line,
        end_character: None,
        kind: range.kind.clone(),
        collapsed_text: None,
    }
}

#[async_trait]
impl<C, P> tower_lsp::LanguageServer for MdxLanguageServer<C, P>
where
    C: LspClient,
    P: FeatureProvider,
{
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        self.apply_initialization_options(params.initialization_options)
            .await;

        let capabilities = ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            completion_provider: Some(CompletionOptions {
                trigger_characters: Some(vec!["<".into(), "{".into(), ".".into()]),
                ..CompletionOptions::default()
            }),
            definition_provider: Some(OneOf::Left(true)),
            rename_provider: Some(OneOf::Left(true)),
            document_symbol_provider: Some(OneOf::Left(true)),
            folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
            ..ServerCapabilities::default()
        };

        Ok(InitializeResult {
            capabilities,
            server_info: Some(ServerInfo {
                name: "mdx-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!("mdx language server initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let TextDocumentItem {
            uri, text, version, ..
        } = params.text_document;
        let options = self.compile_options().await;
        let file = self.documents.open(uri.clone(), text, &options).await;
        tracing::debug!(%uri, version, "opened document");
        self.publish(uri, &file, Some(version)).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        let uri = params.text_document.uri;
        let options = self.compile_options().await;
        let file = self.documents.change(uri.clone(), change.text, &options).await;
        self.publish(uri, &file, Some(params.text_document.version))
            .await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.remove(&uri).await;
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position = params.text_document_position_params;
        let Some(file) = self.document(&position.text_document.uri).await else {
            return Ok(None);
        };
        let location = SourceLocation::new(file.source());
        let offset = from_lsp_position(&location, position.position);
        Ok(self.features.hover(&file, offset).map(|result| Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: result.contents,
            }),
            range: result.range.map(|range| to_lsp_range(&location, &range)),
        }))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let position = params.text_document_position;
        let Some(file) = self.document(&position.text_document.uri).await else {
            return Ok(None);
        };
        let location = SourceLocation::new(file.source());
        let offset = from_lsp_position(&location, position.position);
        let items: Vec<_> = self
            .features
            .completions(&file, offset)
            .iter()
            .map(|item| to_completion_item(&location, item))
            .collect();
        Ok((!items.is_empty()).then_some(CompletionResponse::Array(items)))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let position = params.text_document_position_params;
        let uri = position.text_document.uri;
        let Some(file) = self.document(&uri).await else {
            return Ok(None);
        };
        let location = SourceLocation::new(file.source());
        let offset = from_lsp_position(&location, position.position);
        let targets: Vec<_> = self
            .features
            .definition(&file, offset)
            .iter()
            .map(|range| Location::new(uri.clone(), to_lsp_range(&location, range)))
            .collect();
        Ok((!targets.is_empty()).then_some(GotoDefinitionResponse::Array(targets)))
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let position = params.text_document_position;
        let uri = position.text_document.uri;
        let Some(file) = self.document(&uri).await else {
            return Ok(None);
        };
        let location = SourceLocation::new(file.source());
        let offset = from_lsp_position(&location, position.position);
        let edits = self
            .features
            .rename(&file, offset, &params.new_name)
            .map_err(|error| RpcError::invalid_params(error.to_string()))?;
        if edits.is_empty() {
            return Ok(None);
        }
        let edits: Vec<TextEdit> = edits
            .iter()
            .map(|edit| TextEdit::new(to_lsp_range(&location, &edit.range), edit.new_text.clone()))
            .collect();
        Ok(Some(WorkspaceEdit::new(HashMap::from([(uri, edits)]))))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let Some(file) = self.document(&params.text_document.uri).await else {
            return Ok(None);
        };
        let location = SourceLocation::new(file.source());
        let symbols = self
            .features
            .document_symbols(&file)
            .iter()
            .map(|symbol| to_document_symbol(&location, symbol))
            .collect();
        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }

    async fn folding_range(&self, params: FoldingRangeParams) -> Result<Option<Vec<FoldingRange>>> {
        let Some(file) = self.document(&params.text_document.uri).await else {
            return Ok(None);
        };
        Ok(Some(
            self.features
                .folding_ranges(&file)
                .iter()
                .map(to_lsp_folding_range)
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdx_analysis::features::test_support::SAMPLE;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tower_lsp::lsp_types::{
        DiagnosticSeverity, TextDocumentContentChangeEvent, TextDocumentIdentifier,
        TextDocumentPositionParams, VersionedTextDocumentIdentifier,
    };
    use tower_lsp::LanguageServer;

    type Published = Arc<Mutex<Vec<(Url, Vec<Diagnostic>, Option<i32>)>>>;

    #[derive(Clone, Default)]
    struct RecordingClient {
        published: Published,
    }

    #[async_trait]
    impl LspClient for RecordingClient {
        async fn publish_diagnostics(
            &self,
            uri: Url,
            diagnostics: Vec<Diagnostic>,
            version: Option<i32>,
        ) {
            self.published
                .lock()
                .unwrap()
                .push((uri, diagnostics, version));
        }
    }

    impl RecordingClient {
        fn last(&self) -> (Url, Vec<Diagnostic>, Option<i32>) {
            self.published.lock().unwrap().last().cloned().unwrap()
        }
    }

    fn server() -> (
        MdxLanguageServer<RecordingClient, DefaultFeatureProvider>,
        RecordingClient,
    ) {
        let client = RecordingClient::default();
        let config = MdxConfig::default();
        let features = Arc::new(DefaultFeatureProvider::new(&config));
        let server = MdxLanguageServer::with_features(client.clone(), features, Loader::new(), config);
        (server, client)
    }

    fn uri() -> Url {
        Url::parse("file:///sample.mdx").unwrap()
    }

    async fn open<C: LspClient, P: FeatureProvider>(server: &MdxLanguageServer<C, P>, text: &str) {
        server
            .did_open(DidOpenTextDocumentParams {
                text_document: TextDocumentItem {
                    uri: uri(),
                    language_id: "mdx".into(),
                    version: 1,
                    text: text.to_string(),
                },
            })
            .await;
    }

    fn position_params(line: u32, character: u32) -> TextDocumentPositionParams {
        TextDocumentPositionParams {
            text_document: TextDocumentIdentifier { uri: uri() },
            position: Position::new(line, character),
        }
    }

    fn hover_params(line: u32, character: u32) -> HoverParams {
        HoverParams {
            text_document_position_params: position_params(line, character),
            work_done_progress_params: Default::default(),
        }
    }

    #[tokio::test]
    async fn open_publishes_mapped_diagnostics() {
        let (server, client) = server();
        open(&server, SAMPLE).await;

        let (published_uri, diagnostics, version) = client.last();
        assert_eq!(published_uri, uri());
        assert_eq!(version, Some(1));
        let codes: Vec<_> = diagnostics
            .iter()
            .map(|d| d.code.clone().unwrap())
            .collect();
        assert_eq!(
            codes,
            vec![
                NumberOrString::String("unused-import".into()),
                NumberOrString::String("undefined-component".into())
            ]
        );
        assert_eq!(diagnostics[0].tags, Some(vec![DiagnosticTag::UNNECESSARY]));
        // `<Callout` opens line 12
        assert_eq!(diagnostics[1].range.start, Position::new(12, 1));
        assert_eq!(diagnostics[1].range.end, Position::new(12, 8));
    }

    #[tokio::test]
    async fn parse_error_is_the_only_diagnostic() {
        let (server, client) = server();
        open(&server, "import {Unused} from 'x'\n\n<").await;

        let (_, diagnostics, _) = client.last();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].source.as_deref(), Some("mdx"));
        assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diagnostics[0].range.start, Position::new(2, 0));
        assert_eq!(diagnostics[0].range.end, Position::new(2, 1));
    }

    #[tokio::test]
    async fn change_replaces_document_and_close_clears() {
        let (server, client) = server();
        open(&server, "# Hello\n").await;
        assert!(client.last().1.is_empty());

        server
            .did_change(DidChangeTextDocumentParams {
                text_document: VersionedTextDocumentIdentifier {
                    uri: uri(),
                    version: 2,
                },
                content_changes: vec![TextDocumentContentChangeEvent {
                    range: None,
                    range_length: None,
                    text: "<Missing />\n".into(),
                }],
            })
            .await;
        let (_, diagnostics, version) = client.last();
        assert_eq!(version, Some(2));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(server.document(&uri()).await.unwrap().version(), 1);

        server
            .did_close(DidCloseTextDocumentParams {
                text_document: TextDocumentIdentifier { uri: uri() },
            })
            .await;
        assert!(client.last().1.is_empty());
        assert!(server.document(&uri()).await.is_none());
    }

    #[tokio::test]
    async fn hover_converts_utf16_positions() {
        let (server, _) = server();
        let text = "import {Chart} from './chart.js'\n\n😀 café <Chart />\n";
        open(&server, text).await;

        // 😀 is two UTF-16 units: `<` sits at column 8, `Chart` at 9..14
        let hover = server.hover(hover_params(2, 10)).await.unwrap().unwrap();
        assert_eq!(
            hover.range,
            Some(Range::new(Position::new(2, 9), Position::new(2, 14)))
        );
        let HoverContents::Markup(markup) = hover.contents else {
            panic!("expected markup hover");
        };
        assert!(markup.value.contains("import {Chart} from './chart.js'"));
    }

    #[tokio::test]
    async fn completion_returns_text_edits() {
        let (server, _) = server();
        open(&server, "import {Chart} from './chart.js'\n\n<Ch />\n").await;

        let response = server
            .completion(CompletionParams {
                text_document_position: position_params(2, 3),
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
                context: None,
            })
            .await
            .unwrap()
            .unwrap();
        let CompletionResponse::Array(items) = response else {
            panic!("expected completion array");
        };
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].text_edit,
            Some(CompletionTextEdit::Edit(TextEdit::new(
                Range::new(Position::new(2, 1), Position::new(2, 3)),
                "Chart".into()
            )))
        );
    }

    #[tokio::test]
    async fn definition_and_rename() {
        let (server, _) = server();
        open(&server, "import {Chart} from './chart.js'\n\n<Chart />\n").await;

        let definition = server
            .goto_definition(GotoDefinitionParams {
                text_document_position_params: position_params(2, 2),
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
            })
            .await
            .unwrap()
            .unwrap();
        let GotoDefinitionResponse::Array(targets) = definition else {
            panic!("expected location array");
        };
        assert_eq!(
            targets[0].range,
            Range::new(Position::new(0, 8), Position::new(0, 13))
        );

        let rename = |new_name: &str| RenameParams {
            text_document_position: position_params(2, 2),
            new_name: new_name.to_string(),
            work_done_progress_params: Default::default(),
        };
        let edit = server.rename(rename("Graph")).await.unwrap().unwrap();
        assert_eq!(edit.changes.unwrap()[&uri()].len(), 2);
        assert!(server.rename(rename("no way")).await.is_err());
    }

    #[tokio::test]
    async fn initialization_options_override_settings() {
        let (server, client) = server();
        let result = server
            .initialize(InitializeParams {
                initialization_options: Some(json!({
                    "diagnostics": {"unused_imports": false},
                    "compiler": {"jsx_import_source": "preact"}
                })),
                ..InitializeParams::default()
            })
            .await
            .unwrap();
        let triggers = result
            .capabilities
            .completion_provider
            .unwrap()
            .trigger_characters
            .unwrap();
        assert_eq!(triggers, vec!["<", "{", "."]);

        open(&server, "import {Unused} from 'x'\n\n# Title\n").await;
        assert!(client.last().1.is_empty());
        let file = server.document(&uri()).await.unwrap();
        assert!(file
            .script()
            .unwrap()
            .text()
            .contains("@jsxImportSource preact"));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let result = settings_from_options(
            Loader::new(),
            &json!({"compiler": {"extensions": ["nope"]}}),
        );
        assert!(result.is_err());
        let config = settings_from_options(Loader::new(), &json!("ignored")).unwrap();
        assert_eq!(config, MdxConfig::default());
    }

    #[derive(Default)]
    struct CountingProvider {
        folding_called: AtomicUsize,
        last_hover_offset: Mutex<Option<usize>>,
    }

    impl FeatureProvider for CountingProvider {
        fn configure(&self, _: &MdxConfig) {}

        fn diagnostics(&self, _: &VirtualFile) -> Vec<MdxDiagnostic> {
            Vec::new()
        }

        fn hover(&self, _: &VirtualFile, offset: usize) -> Option<MdxHover> {
            *self.last_hover_offset.lock().unwrap() = Some(offset);
            None
        }

        fn completions(&self, _: &VirtualFile, _: usize) -> Vec<MdxCompletion> {
            Vec::new()
        }

        fn definition(&self, _: &VirtualFile, _: usize) -> Vec<ByteRange<usize>> {
            Vec::new()
        }

        fn rename(&self, _: &VirtualFile, _: usize, _: &str) -> ServiceResult<Vec<MdxTextEdit>> {
            Ok(Vec::new())
        }

        fn folding_ranges(&self, _: &VirtualFile) -> Vec<MdxFoldingRange> {
            self.folding_called.fetch_add(1, Ordering::SeqCst);
            vec![MdxFoldingRange {
                start_line: 0,
                end_line: 2,
                kind: None,
            }]
        }

        fn document_symbols(&self, _: &VirtualFile) -> Vec<MdxDocumentSymbol> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn requests_reach_the_feature_provider() {
        let provider = Arc::new(CountingProvider::default());
        let server = MdxLanguageServer::with_features(
            RecordingClient::default(),
            provider.clone(),
            Loader::new(),
            MdxConfig::default(),
        );
        open(&server, "Größe\n\nnext\n").await;

        let ranges = server
            .folding_range(FoldingRangeParams {
                text_document: TextDocumentIdentifier { uri: uri() },
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ranges.len(), 1);
        assert_eq!(provider.folding_called.load(Ordering::SeqCst), 1);

        // column 3 in UTF-16 is after `Grö`, byte offset 4
        assert!(server.hover(hover_params(0, 3)).await.unwrap().is_none());
        assert_eq!(*provider.last_hover_offset.lock().unwrap(), Some(4));
    }

    #[tokio::test]
    async fn requests_without_document_return_none() {
        let (server, _) = server();
        assert!(server.hover(hover_params(0, 0)).await.unwrap().is_none());
        assert!(server
            .folding_range(FoldingRangeParams {
                text_document: TextDocumentIdentifier { uri: uri() },
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
            })
            .await
            .unwrap()
            .is_none());
    }
}
