/// Bootstrap Binary - Prepares the graph service schema before the first ingestion run
///
/// Usage:
///   cargo run --bin kg-bootstrap [--reset]
///
/// Options:
///   --reset: Clear all existing graph data before building indices and constraints

use anyhow::{Context, Result};
use clap::Parser;
use kg_loader_graph::{GraphService, HttpGraphService};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kg-bootstrap")]
#[command(about = "Build graph indices and constraints, optionally clearing all data first")]
struct Args {
    /// Clear all existing graph data before creating indices/constraints
    #[arg(long)]
    reset: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();

    let service = HttpGraphService::from_env().context("failed to set up graph service client")?;
    info!("Graph service: {}", service.config().base_url);

    if args.reset {
        warn!("Clearing all existing graph data...");
        service
            .clear_all()
            .await
            .context("failed to clear graph data")?;
    }

    info!("Building indices and constraints...");
    service
        .build_indices_and_constraints()
        .await
        .context("failed to build indices and constraints")?;

    info!("✓ Graph schema ready");
    Ok(())
}
