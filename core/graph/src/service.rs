use async_trait::async_trait;
use kg_loader_schemas::{Episode, FactResult, NodeId};

use crate::error::ServiceError;

/// Temporal knowledge-graph service as seen by the loader.
///
/// Extraction, indexing, temporal resolution and ranking all happen on the
/// other side of this trait.
#[async_trait]
pub trait GraphService: Send + Sync {
    /// Accept an ordered batch of episodes in a single call.
    async fn submit_episodes_bulk(&self, episodes: &[Episode]) -> Result<(), ServiceError>;

    /// Free-text fact search, optionally biased by graph distance from `center_node`.
    async fn search(
        &self,
        query: &str,
        center_node: Option<&NodeId>,
    ) -> Result<Vec<FactResult>, ServiceError>;

    async fn build_indices_and_constraints(&self) -> Result<(), ServiceError>;

    /// Destructive reset of the whole graph.
    async fn clear_all(&self) -> Result<(), ServiceError>;
}

#[async_trait]
impl<T: GraphService + ?Sized> GraphService for std::sync::Arc<T> {
    async fn submit_episodes_bulk(&self, episodes: &[Episode]) -> Result<(), ServiceError> {
        (**self).submit_episodes_bulk(episodes).await
    }

    async fn search(
        &self,
        query: &str,
        center_node: Option<&NodeId>,
    ) -> Result<Vec<FactResult>, ServiceError> {
        (**self).search(query, center_node).await
    }

    async fn build_indices_and_constraints(&self) -> Result<(), ServiceError> {
        (**self).build_indices_and_constraints().await
    }

    async fn clear_all(&self) -> Result<(), ServiceError> {
        (**self).clear_all().await
    }
}
