use kg_loader_graph::GraphService;
use kg_loader_schemas::{generate_run_id, Episode, RunId};
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::error::PipelineError;
use crate::pacing::Pacer;
use crate::registry::AdapterRegistry;

/// One `(source type, location)` pair of a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceSpec {
    #[serde(rename = "type")]
    pub source_type: String,
    pub location: PathBuf,
}

impl SourceSpec {
    pub fn new(source_type: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            source_type: source_type.into(),
            location: location.into(),
        }
    }
}

impl FromStr for SourceSpec {
    type Err = String;

    /// Parses `TYPE=PATH`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((ty, path)) if !ty.trim().is_empty() && !path.trim().is_empty() => {
                Ok(SourceSpec::new(ty.trim(), path.trim()))
            }
            _ => Err(format!("expected TYPE=PATH, got {:?}", s)),
        }
    }
}

/// What to do when one source cannot be read or normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorPolicy {
    /// Fail the whole run before anything is submitted.
    #[default]
    Abort,
    /// Log the failure, leave the source out and continue.
    Skip,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub chunk_size: NonZeroUsize,
    pub on_source_error: SourceErrorPolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            chunk_size: NonZeroUsize::MIN,
            on_source_error: SourceErrorPolicy::Abort,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSource {
    pub source: SourceSpec,
    pub reason: String,
}

/// Episodes gathered from all sources, in submission order.
#[derive(Debug, Default)]
pub struct Collection {
    pub episodes: Vec<Episode>,
    pub sources_loaded: usize,
    pub skipped_sources: Vec<SkippedSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// Stopped at a chunk boundary; chunks already accepted stay committed.
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub sources_loaded: usize,
    pub skipped_sources: Vec<SkippedSource>,
    pub episodes_total: usize,
    pub chunks_total: usize,
    pub chunks_submitted: usize,
    pub episodes_submitted: usize,
    pub pacing_delays: usize,
    pub outcome: RunOutcome,
}

/// Drives configured sources through their adapters and feeds the resulting
/// episodes to the graph service in paced, fixed-size chunks.
pub struct IngestionPipeline {
    registry: Arc<AdapterRegistry>,
    graph: Arc<dyn GraphService>,
    pacer: Pacer,
    options: PipelineOptions,
}

impl IngestionPipeline {
    pub fn new(
        registry: Arc<AdapterRegistry>,
        graph: Arc<dyn GraphService>,
        pacer: Pacer,
        options: PipelineOptions,
    ) -> Self {
        Self {
            registry,
            graph,
            pacer,
            options,
        }
    }

    /// Load and normalize every source, in order.
    ///
    /// All source types are resolved before any file is opened, so a typo in
    /// the configuration fails the run without touching the disk.
    pub fn collect(&self, sources: &[SourceSpec]) -> Result<Collection, PipelineError> {
        let mut adapters = Vec::with_capacity(sources.len());
        for spec in sources {
            adapters.push(self.registry.create(&spec.source_type)?);
        }

        let mut collection = Collection::default();
        for (spec, mut adapter) in sources.iter().zip(adapters) {
            let episodes = adapter
                .load(&spec.location)
                .and_then(|_| adapter.to_episodes());

            match episodes {
                Ok(episodes) => {
                    info!(
                        "Source {}:{} produced {} episodes",
                        spec.source_type,
                        spec.location.display(),
                        episodes.len()
                    );
                    collection.sources_loaded += 1;
                    collection.episodes.extend(episodes);
                }
                Err(error) if self.options.on_source_error == SourceErrorPolicy::Skip => {
                    warn!(
                        "Skipping source {}:{}: {}",
                        spec.source_type,
                        spec.location.display(),
                        error
                    );
                    collection.skipped_sources.push(SkippedSource {
                        source: spec.clone(),
                        reason: error.to_string(),
                    });
                }
                Err(error) => {
                    return Err(PipelineError::Source {
                        source_type: spec.source_type.clone(),
                        location: spec.location.clone(),
                        error,
                    });
                }
            }
        }

        Ok(collection)
    }

    /// Collect all sources, then submit their episodes.
    pub async fn run(
        &mut self,
        sources: &[SourceSpec],
        cancel: &CancellationToken,
    ) -> Result<RunReport, PipelineError> {
        let run_id = generate_run_id();
        let span = info_span!("ingest_run", run_id = %run_id);

        async move {
            info!("Starting ingestion run over {} sources", sources.len());
            let collection = self.collect(sources)?;

            let mut report = self
                .submit_chunks(run_id, &collection.episodes, cancel)
                .await?;
            report.sources_loaded = collection.sources_loaded;
            report.skipped_sources = collection.skipped_sources;
            Ok::<_, PipelineError>(report)
        }
        .instrument(span)
        .await
    }

    /// Submit already-collected episodes without loading any source.
    pub async fn submit(
        &mut self,
        episodes: &[Episode],
        cancel: &CancellationToken,
    ) -> Result<RunReport, PipelineError> {
        let run_id = generate_run_id();
        let span = info_span!("ingest_run", run_id = %run_id);
        self.submit_chunks(run_id, episodes, cancel)
            .instrument(span)
            .await
    }

    async fn submit_chunks(
        &mut self,
        run_id: RunId,
        episodes: &[Episode],
        cancel: &CancellationToken,
    ) -> Result<RunReport, PipelineError> {
        let chunk_size = self.options.chunk_size.get();
        let mut report = RunReport {
            run_id,
            sources_loaded: 0,
            skipped_sources: Vec::new(),
            episodes_total: episodes.len(),
            chunks_total: episodes.len().div_ceil(chunk_size),
            chunks_submitted: 0,
            episodes_submitted: 0,
            pacing_delays: 0,
            outcome: RunOutcome::Completed,
        };

        info!(
            "Submitting {} episodes in {} chunks of up to {} (pacing {:?})",
            report.episodes_total,
            report.chunks_total,
            chunk_size,
            self.pacer.interval()
        );

        self.pacer.reset();
        for (chunk_index, chunk) in episodes.chunks(chunk_size).enumerate() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {}
                paced = self.pacer.ready() => {
                    if paced {
                        report.pacing_delays += 1;
                    }
                }
            }

            if cancel.is_cancelled() {
                warn!(
                    "Run cancelled before chunk {}; {} of {} chunks were submitted",
                    chunk_index, report.chunks_submitted, report.chunks_total
                );
                report.outcome = RunOutcome::Cancelled;
                return Ok(report);
            }

            debug!(
                "Submitting chunk {}/{} ({} episodes, first: {})",
                chunk_index + 1,
                report.chunks_total,
                chunk.len(),
                chunk[0].name
            );

            if let Err(error) = self.graph.submit_episodes_bulk(chunk).await {
                return Err(PipelineError::Submission {
                    run_id: report.run_id,
                    chunk_index,
                    chunks_submitted: report.chunks_submitted,
                    episodes_submitted: report.episodes_submitted,
                    error,
                });
            }

            report.chunks_submitted += 1;
            report.episodes_submitted += chunk.len();
        }

        info!(
            "Run complete: {} episodes in {} chunks",
            report.episodes_submitted, report.chunks_submitted
        );
        Ok(report)
    }
}
