mod aggregate;
mod analyze;
mod cms;
mod config;
mod demo;
mod error;
mod fields;
mod model;
mod parser;
mod rerank;
mod search;
mod server;
mod session;
mod sources;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use genie_common::algolia::AlgoliaClient;
use genie_common::gemini::GeminiClient;
use genie_common::storyblok::StoryblokClient;

use analyze::ContentAnalyzer;
use config::Config;
use rerank::Reranker;
use server::GenieServer;
use sources::SourceLoader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting a11y-genie MCP server");

    let config = Config::from_env()?;
    info!(
        model = %config.gemini.model,
        search_index = config.algolia.is_some(),
        cms = config.storyblok.is_some(),
        demo_mode = ?config.demo_mode,
        "configuration loaded"
    );
    if !config.has_external_sources() {
        info!("no search index or cms configured, serving the demo corpus");
    }

    let gemini = Arc::new(GeminiClient::new(config.gemini)?);
    let index = config.algolia.map(AlgoliaClient::new).transpose()?;
    let cms = config.storyblok.map(StoryblokClient::new).transpose()?;

    let server = GenieServer::new(
        Arc::new(ContentAnalyzer::new(Arc::clone(&gemini))),
        Arc::new(SourceLoader::new(index, cms, config.demo_mode)),
        Arc::new(Reranker::new(gemini)),
    );

    if let Ok(addr) = std::env::var("MCP_TCP_LISTEN_ADDR") {
        let listener = TcpListener::bind(&addr).await?;
        info!(listen_addr = %addr, "MCP server ready, serving on TCP");
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = server.clone();
            tokio::spawn(async move {
                info!(peer = %peer, "MCP client connected");
                let service = server.serve(stream).await.inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
                service.waiting().await?;
                info!(peer = %peer, "MCP client disconnected");
                Ok::<(), anyhow::Error>(())
            });
        }
    } else {
        info!("MCP server ready, serving on stdio");
        let service = server.serve(stdio()).await.inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;
        service.waiting().await?;
        info!("MCP server shut down");
    }
    Ok(())
}
