use crate::markdown::MarkdownService;
use crate::script::ScriptBindingsService;
use crate::service::LanguageService;
use mdx_compiler::LanguageTag;
use mdx_config::MdxConfig;
use std::collections::BTreeMap;

/// The analyzers available to the feature layer, one per document language.
///
/// Built once at startup and shared by reference; registering a second service for a
/// language replaces the first.
#[derive(Default)]
pub struct AnalyzerRegistry {
    services: BTreeMap<LanguageTag, Box<dyn LanguageService>>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in markdown and script services.
    pub fn with_defaults(config: &MdxConfig) -> Self {
        let mut registry = Self::new();
        registry.register(MarkdownService::new());
        registry.register(ScriptBindingsService::new(config.diagnostics));
        registry
    }

    pub fn register(&mut self, service: impl LanguageService + 'static) {
        self.services.insert(service.language(), Box::new(service));
    }

    pub fn service(&self, language: LanguageTag) -> Option<&dyn LanguageService> {
        self.services.get(&language).map(|service| service.as_ref())
    }

    pub fn languages(&self) -> impl Iterator<Item = LanguageTag> + '_ {
        self.services.keys().copied()
    }
}

impl std::fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.services.keys()).finish()
    }
}
