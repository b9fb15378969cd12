use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mdx_config::Loader;
use mdx_lsp::{logging, MdxLanguageServer};
use tokio::io::{stdin, stdout};
use tower_lsp::{LspService, Server};

/// Language server for MDX documents.
#[derive(Debug, Parser)]
#[command(name = "mdx-lsp", version, about)]
struct Args {
    /// TOML file layered over the built-in defaults
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Communicate over stdin/stdout (the only transport; accepted for editor compatibility)
    #[arg(long)]
    stdio: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(error) = logging::init() {
        eprintln!("mdx-lsp: failed to initialize logging: {error}");
    }

    let mut loader = Loader::new();
    if let Some(path) = &args.config {
        loader = loader.with_file(path);
    }
    let config = match loader.clone().build() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(%error, "invalid configuration");
            eprintln!("mdx-lsp: {error}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(config = ?args.config, stdio = args.stdio, "starting mdx-lsp");

    let (service, socket) = LspService::new(move |client| {
        MdxLanguageServer::with_settings(client, loader.clone(), config.clone())
    });
    Server::new(stdin(), stdout(), socket).serve(service).await;
    ExitCode::SUCCESS
}
