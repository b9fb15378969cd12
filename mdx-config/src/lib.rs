//! Shared configuration loader for the MDX language tools.
//!
//! `defaults/mdx.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files and
//! editor-supplied overrides on top of those defaults via [`Loader`] before
//! deserializing into [`MdxConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use mdx_compiler::{CompileOptions, SyntaxExtension};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

const DEFAULT_TOML: &str = include_str!("../defaults/mdx.default.toml");

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("invalid configuration value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Top-level configuration consumed by the MDX tools.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MdxConfig {
    pub compiler: CompilerConfig,
    pub diagnostics: DiagnosticsConfig,
}

/// Knobs passed straight to the virtual-document compiler.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompilerConfig {
    pub check_js: bool,
    pub jsx_import_source: String,
    pub extensions: Vec<SyntaxExtension>,
}

/// Toggles for the diagnostics produced by the built-in script service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DiagnosticsConfig {
    pub unused_imports: bool,
    pub undefined_components: bool,
}

impl MdxConfig {
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            check_js: self.compiler.check_js,
            jsx_import_source: self.compiler.jsx_import_source.clone(),
            extensions: self.compiler.extensions.clone(),
        }
    }

    fn validate(self) -> Result<Self, SettingsError> {
        let source = self.compiler.jsx_import_source.trim();
        if source.is_empty() || source.contains(char::is_whitespace) || source.contains("*/") {
            return Err(SettingsError::Invalid {
                key: "compiler.jsx_import_source",
                reason: format!("`{}` is not a module specifier", self.compiler.jsx_import_source),
            });
        }
        Ok(self)
    }
}

impl Default for MdxConfig {
    fn default() -> Self {
        let options = CompileOptions::default();
        Self {
            compiler: CompilerConfig {
                check_js: options.check_js,
                jsx_import_source: options.jsx_import_source,
                extensions: options.extensions,
            },
            diagnostics: DiagnosticsConfig {
                unused_imports: true,
                undefined_components: true,
            },
        }
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer TOML text, e.g. settings sent by an editor.
    pub fn with_toml(mut self, text: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(text, FileFormat::Toml));
        self
    }

    /// Apply a single key/value override (useful for CLI and editor settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, SettingsError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder, deserialize and validate the resulting configuration.
    pub fn build(self) -> Result<MdxConfig, SettingsError> {
        let config: MdxConfig = self.builder.build()?.try_deserialize()?;
        config.validate()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<MdxConfig, SettingsError> {
    Loader::new().build()
}
