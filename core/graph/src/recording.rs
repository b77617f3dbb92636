use async_trait::async_trait;
use kg_loader_schemas::{Episode, FactResult, NodeId};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

use crate::error::ServiceError;
use crate::service::GraphService;

/// In-process graph service that records every call instead of talking to a
/// real store. Backs `--dry-run` and the pipeline/query tests.
#[derive(Default)]
pub struct RecordingGraphService {
    bulk_calls: Mutex<Vec<Vec<Episode>>>,
    bulk_attempts: Mutex<usize>,
    searches: Mutex<Vec<(String, Option<NodeId>)>>,
    scripted: Mutex<VecDeque<Vec<FactResult>>>,
    fail_bulk_call: Option<usize>,
    index_builds: Mutex<usize>,
    clears: Mutex<usize>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingGraphService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue search responses; each `search` call consumes one, then empty results.
    pub fn with_search_results(self, results: Vec<Vec<FactResult>>) -> Self {
        *lock(&self.scripted) = results.into();
        self
    }

    /// Make the bulk attempt with this zero-based index fail with a rate-limit
    /// rejection. Later attempts succeed again.
    pub fn failing_bulk_call(mut self, index: usize) -> Self {
        self.fail_bulk_call = Some(index);
        self
    }

    /// Successfully accepted batches, in submission order.
    pub fn bulk_calls(&self) -> Vec<Vec<Episode>> {
        lock(&self.bulk_calls).clone()
    }

    /// Every bulk call made, accepted or not.
    pub fn bulk_attempts(&self) -> usize {
        *lock(&self.bulk_attempts)
    }

    pub fn submitted_episodes(&self) -> Vec<Episode> {
        lock(&self.bulk_calls).iter().flatten().cloned().collect()
    }

    pub fn searches(&self) -> Vec<(String, Option<NodeId>)> {
        lock(&self.searches).clone()
    }

    pub fn index_builds(&self) -> usize {
        *lock(&self.index_builds)
    }

    pub fn clears(&self) -> usize {
        *lock(&self.clears)
    }
}

#[async_trait]
impl GraphService for RecordingGraphService {
    async fn submit_episodes_bulk(&self, episodes: &[Episode]) -> Result<(), ServiceError> {
        let attempt = {
            let mut attempts = lock(&self.bulk_attempts);
            *attempts += 1;
            *attempts - 1
        };
        if self.fail_bulk_call == Some(attempt) {
            return Err(ServiceError::RateLimited {
                retry_after_secs: None,
            });
        }

        for episode in episodes {
            info!(
                "[dry-run] episode {} ({} bytes, group {:?}, at {})",
                episode.name,
                episode.content.len(),
                episode.group_id,
                episode.reference_time.to_rfc3339()
            );
        }
        lock(&self.bulk_calls).push(episodes.to_vec());
        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        center_node: Option<&NodeId>,
    ) -> Result<Vec<FactResult>, ServiceError> {
        lock(&self.searches).push((query.to_string(), center_node.cloned()));
        Ok(lock(&self.scripted).pop_front().unwrap_or_default())
    }

    async fn build_indices_and_constraints(&self) -> Result<(), ServiceError> {
        *lock(&self.index_builds) += 1;
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), ServiceError> {
        *lock(&self.clears) += 1;
        Ok(())
    }
}
