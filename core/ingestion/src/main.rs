use anyhow::{Context, Result};
use clap::Parser;
use kg_loader_graph::{GraphService, HttpGraphService, RecordingGraphService};
use kg_loader_ingestion::{
    AdapterRegistry, ContractAdapter, IngestConfig, IngestionPipeline, Pacer, ReferenceAnchor,
    RunOutcome, SourceErrorPolicy, SourceSpec,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kg-ingest")]
#[command(about = "Load contract, price and conversation datasets into the knowledge graph as episodes")]
struct Args {
    /// TOML run configuration (chunk size, delay, sources)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Extra source as TYPE=PATH, appended after the configured ones (repeatable)
    #[arg(long = "source", short = 's')]
    sources: Vec<SourceSpec>,

    /// Episodes per bulk submission
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Seconds to wait between chunk submissions
    #[arg(long)]
    delay_secs: Option<u64>,

    /// Leave out sources that fail to load instead of aborting the run
    #[arg(long)]
    skip_failed_sources: bool,

    /// Log episodes instead of sending them to the graph service
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Knowledge Graph Episode Loader v0.1.0");

    let args = Args::parse();
    let config = resolve_config(&args)?;

    if config.sources.is_empty() {
        anyhow::bail!("No sources configured; pass --config or --source TYPE=PATH");
    }

    info!("Chunk size: {}", config.chunk_size);
    info!("Delay between chunks: {:?}", config.delay);
    for spec in &config.sources {
        info!("  Source: {} <- {}", spec.source_type, spec.location.display());
    }

    let registry = AdapterRegistry::with_builtins();
    if config.contract_anchor == ReferenceAnchor::StartDate {
        registry.register("contract", || {
            Box::new(ContractAdapter::with_anchor(ReferenceAnchor::StartDate))
        });
    }

    let graph: Arc<dyn GraphService> = if args.dry_run {
        info!("Dry run: episodes are logged, nothing is sent");
        Arc::new(RecordingGraphService::new())
    } else {
        let service = HttpGraphService::from_env().context("failed to set up graph service client")?;
        info!("Graph service: {}", service.config().base_url);
        Arc::new(service)
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received; stopping after the current chunk");
                cancel.cancel();
            }
        });
    }

    let mut pipeline = IngestionPipeline::new(
        Arc::new(registry),
        graph,
        Pacer::with_interval(config.delay),
        config.pipeline_options(),
    );

    let report = match pipeline.run(&config.sources, &cancel).await {
        Ok(report) => report,
        Err(e) => {
            error!("Ingestion failed: {}", e);
            return Err(e.into());
        }
    };

    info!("─────────────────────────────────────────────────");
    info!("Run {}", report.run_id);
    info!("  Sources loaded:      {}", report.sources_loaded);
    info!("  Sources skipped:     {}", report.skipped_sources.len());
    info!("  Episodes:            {}", report.episodes_total);
    info!(
        "  Chunks submitted:    {}/{}",
        report.chunks_submitted, report.chunks_total
    );
    info!("  Episodes submitted:  {}", report.episodes_submitted);

    for skipped in &report.skipped_sources {
        warn!(
            "  skipped {}:{} - {}",
            skipped.source.source_type,
            skipped.source.location.display(),
            skipped.reason
        );
    }

    if report.outcome == RunOutcome::Cancelled {
        warn!("Run was cancelled; remaining chunks were not submitted");
    }

    Ok(())
}

fn resolve_config(args: &Args) -> Result<IngestConfig> {
    let mut config = match &args.config {
        Some(path) => IngestConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => IngestConfig::default(),
    };

    config.apply_env()?;

    if let Some(size) = args.chunk_size {
        config.set_chunk_size(size)?;
    }
    if let Some(secs) = args.delay_secs {
        config.delay = Duration::from_secs(secs);
    }
    if args.skip_failed_sources {
        config.on_source_error = SourceErrorPolicy::Skip;
    }
    config.sources.extend(args.sources.iter().cloned());

    Ok(config)
}
