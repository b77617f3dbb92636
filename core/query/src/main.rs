use anyhow::{Context, Result};
use kg_loader_graph::HttpGraphService;
use kg_loader_query::{router, QueryFlow};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Knowledge Graph Query Service v0.1.0");

    let graph = HttpGraphService::from_env().context("failed to set up graph service client")?;
    info!("Graph service: {}", graph.config().base_url);

    let app = router(Arc::new(QueryFlow::new(Arc::new(graph))));

    // Start HTTP server
    let http_addr = std::env::var("QUERY_ADDR").unwrap_or_else(|_| "127.0.0.1:21957".to_string());
    info!("Starting HTTP server on http://{}", http_addr);
    info!("Search endpoint: http://{}/v1/search", http_addr);

    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("failed to bind {}", http_addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
