use anyhow::Result;
use clap::Parser;
use log::info;
use tower_lsp::{LspService, Server};

use php_fast_lsp::server::PhpLanguageServer;

/// A fast Language Server Protocol implementation for PHP.
#[derive(Parser, Debug)]
#[command(name = "php-fast-lsp", version, about)]
struct Args {
    /// Communicate over stdio (the only supported transport).
    #[arg(long, default_value_t = true)]
    stdio: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting PHP Fast LSP server");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(PhpLanguageServer::new);

    info!("PHP LSP server initialized, waiting for client connections");

    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
