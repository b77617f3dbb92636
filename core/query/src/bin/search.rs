/// Search Binary - Runs the two-phase fact search once and prints the results
///
/// Usage:
///   cargo run --bin kg-search -- "What was the customer_id" [--rerank-query "show customers"] [--no-rerank] [--bullets]

use anyhow::{Context, Result};
use clap::Parser;
use kg_loader_graph::HttpGraphService;
use kg_loader_query::{facts_to_bullets, render_outcome, QueryFlow, QueryOutcome, QueryRequest};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kg-search")]
#[command(about = "Search the knowledge graph and re-rank around the top hit")]
struct Args {
    /// Free-text query
    query: String,

    /// Query for the graph-distance re-rank (defaults to the main query)
    #[arg(long)]
    rerank_query: Option<String>,

    /// Skip the re-rank pass
    #[arg(long)]
    no_rerank: bool,

    /// Print only the fact texts as a bullet list
    #[arg(long)]
    bullets: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let graph = HttpGraphService::from_env().context("failed to set up graph service client")?;
    let flow = QueryFlow::new(Arc::new(graph));

    let request = QueryRequest {
        query: args.query,
        rerank_query: args.rerank_query,
        rerank: !args.no_rerank,
    };
    let outcome = flow.run(&request).await.context("search failed")?;

    if args.bullets {
        match &outcome {
            QueryOutcome::Found {
                reranked: Some(facts),
                ..
            }
            | QueryOutcome::Found { facts, .. } => println!("{}", facts_to_bullets(facts)),
            QueryOutcome::NoResults => println!("No results."),
        }
    } else {
        print!("{}", render_outcome(&outcome));
    }

    Ok(())
}
