//! Logging setup for the language server.
//!
//! stdout carries the protocol, so logs always go to stderr.
//!
//! ## Environment Variables
//!
//! 1. **`MDX_LSP_LOG`** (highest priority) - a level applied to the MDX crates, or a full
//!    filter when it contains `=`, `:` or `,`
//! 2. **`RUST_LOG`** - standard tracing filter, used as-is
//! 3. **Default** - `warn` globally, `info` for the MDX crates

use std::env;
use tracing_subscriber::{fmt, EnvFilter};

const CRATES: &[&str] = &["mdx_lsp", "mdx_analysis", "mdx_compiler", "mdx_config"];

/// Initialize the global subscriber.
///
/// Safe to call more than once; later calls report the error and change nothing.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let directives = filter_directives(env::var("MDX_LSP_LOG").ok(), env::var("RUST_LOG").ok());
    fmt()
        .with_env_filter(EnvFilter::new(directives))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
}

/// Build the filter string following the priority described in the module docs.
fn filter_directives(mdx_log: Option<String>, rust_log: Option<String>) -> String {
    if let Some(level) = mdx_log {
        if level.contains('=') || level.contains(':') || level.contains(',') {
            return level;
        }
        return expand(&level);
    }
    if let Some(rust_log) = rust_log {
        return rust_log;
    }
    expand("info")
}

fn expand(level: &str) -> String {
    let mut directives = String::from("warn");
    for name in CRATES {
        directives.push_str(&format!(",{name}={level}"));
    }
    directives
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_warn_with_info_for_our_crates() {
        let directives = filter_directives(None, None);
        assert!(directives.starts_with("warn,"));
        assert!(directives.contains("mdx_lsp=info"));
        assert!(directives.contains("mdx_compiler=info"));
    }

    #[test]
    fn mdx_log_level_beats_rust_log() {
        let directives = filter_directives(Some("debug".into()), Some("trace".into()));
        assert!(directives.contains("mdx_analysis=debug"));
        assert!(!directives.contains("trace"));
    }

    #[test]
    fn advanced_values_pass_through() {
        assert_eq!(
            filter_directives(Some("mdx_compiler=trace".into()), None),
            "mdx_compiler=trace"
        );
        assert_eq!(filter_directives(None, Some("error".into())), "error");
    }
}
