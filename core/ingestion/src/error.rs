//! Error types for source loading and pipeline runs.

use kg_loader_graph::ServiceError;
use kg_loader_schemas::RunId;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while reading or normalizing one configured source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read source {}: {reason}", location.display())]
    SourceRead { location: PathBuf, reason: String },

    #[error("record #{index} ({record}) cannot be normalized: {reason}")]
    Normalization {
        index: usize,
        record: String,
        reason: String,
    },
}

impl SourceError {
    pub(crate) fn read(location: impl Into<PathBuf>, reason: impl ToString) -> Self {
        SourceError::SourceRead {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn normalization(
        index: usize,
        record: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        SourceError::Normalization {
            index,
            record: record.into(),
            reason: reason.to_string(),
        }
    }
}

/// A configured source type has no registered adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown source type: {0}")]
pub struct UnknownSourceType(pub String);

/// Failure of an ingestion run, with enough context to see how far it got.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown source type {source_type:?} in run configuration")]
    UnknownSourceType { source_type: String },

    #[error("source {source_type}:{} failed: {error}", location.display())]
    Source {
        source_type: String,
        location: PathBuf,
        #[source]
        error: SourceError,
    },

    #[error(
        "run {run_id}: chunk {chunk_index} rejected after {chunks_submitted} chunk(s) / \
         {episodes_submitted} episode(s) were accepted: {error}"
    )]
    Submission {
        run_id: RunId,
        chunk_index: usize,
        chunks_submitted: usize,
        episodes_submitted: usize,
        #[source]
        error: ServiceError,
    },
}

impl From<UnknownSourceType> for PipelineError {
    fn from(e: UnknownSourceType) -> Self {
        PipelineError::UnknownSourceType { source_type: e.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn submission_error_reports_progress() {
        let e = PipelineError::Submission {
            run_id: RunId("run_test".into()),
            chunk_index: 2,
            chunks_submitted: 2,
            episodes_submitted: 4,
            error: ServiceError::RateLimited {
                retry_after_secs: None,
            },
        };
        let msg = e.to_string();
        assert!(msg.contains("chunk 2"));
        assert!(msg.contains("4 episode(s)"));
        assert!(e.source().is_some());
    }

    #[test]
    fn source_error_names_location() {
        let e = PipelineError::Source {
            source_type: "price".into(),
            location: PathBuf::from("data/prices.json"),
            error: SourceError::read("data/prices.json", "not found"),
        };
        assert!(e.to_string().contains("price:data/prices.json"));
    }

    #[test]
    fn unknown_type_converts() {
        let e: PipelineError = UnknownSourceType("invoice".into()).into();
        assert!(e.to_string().contains("invoice"));
    }
}
