use kg_loader_graph::{GraphService, ServiceError};
use kg_loader_schemas::{FactResult, NodeId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

fn default_rerank() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    /// Query for the centered pass; the broad query is reused when absent.
    #[serde(default)]
    pub rerank_query: Option<String>,
    #[serde(default = "default_rerank")]
    pub rerank: bool,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            rerank_query: None,
            rerank: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// The broad search matched nothing; no re-rank was attempted.
    NoResults,
    Found {
        facts: Vec<FactResult>,
        /// Originating node of the top fact, used as the re-rank center.
        center: NodeId,
        reranked: Option<Vec<FactResult>>,
    },
}

/// Broad fact search followed by an optional graph-distance re-rank around
/// the top hit.
pub struct QueryFlow {
    graph: Arc<dyn GraphService>,
}

impl QueryFlow {
    pub fn new(graph: Arc<dyn GraphService>) -> Self {
        Self { graph }
    }

    pub async fn run(&self, request: &QueryRequest) -> Result<QueryOutcome, ServiceError> {
        info!("Searching: {:?}", request.query);
        let facts = self.graph.search(&request.query, None).await?;

        let Some(top) = facts.first() else {
            info!("No facts matched {:?}", request.query);
            return Ok(QueryOutcome::NoResults);
        };
        let center = top.source_node_uuid.clone();
        debug!("{} facts, top fact {} from node {}", facts.len(), top.uuid, center);

        let reranked = if request.rerank {
            let query = request.rerank_query.as_deref().unwrap_or(&request.query);
            info!("Reranking {:?} around node {}", query, center);
            Some(self.graph.search(query, Some(&center)).await?)
        } else {
            None
        };

        Ok(QueryOutcome::Found {
            facts,
            center,
            reranked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kg_loader_graph::RecordingGraphService;
    use kg_loader_schemas::FactId;

    fn fact(id: &str, node: &str) -> FactResult {
        FactResult {
            uuid: FactId(id.to_string()),
            fact: format!("fact {}", id),
            source_node_uuid: NodeId(node.to_string()),
            target_node_uuid: None,
            valid_at: None,
            invalid_at: None,
        }
    }

    #[tokio::test]
    async fn test_empty_search_skips_rerank() {
        let graph = Arc::new(RecordingGraphService::new());
        let flow = QueryFlow::new(graph.clone());

        let outcome = flow.run(&QueryRequest::new("What was the customer_id")).await.unwrap();
        assert_eq!(outcome, QueryOutcome::NoResults);
        assert_eq!(graph.searches().len(), 1);
    }

    #[tokio::test]
    async fn test_rerank_centers_on_top_hit() {
        let graph = Arc::new(RecordingGraphService::new().with_search_results(vec![
            vec![fact("f1", "node-a"), fact("f2", "node-b")],
            vec![fact("f3", "node-c")],
        ]));
        let flow = QueryFlow::new(graph.clone());

        let request = QueryRequest {
            query: "What was the customer_id".to_string(),
            rerank_query: Some("show customers".to_string()),
            rerank: true,
        };
        let outcome = flow.run(&request).await.unwrap();

        match outcome {
            QueryOutcome::Found {
                facts,
                center,
                reranked,
            } => {
                assert_eq!(facts.len(), 2);
                assert_eq!(center, NodeId("node-a".to_string()));
                assert_eq!(reranked.unwrap()[0].uuid, FactId("f3".to_string()));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let searches = graph.searches();
        assert_eq!(searches[0], ("What was the customer_id".to_string(), None));
        assert_eq!(
            searches[1],
            ("show customers".to_string(), Some(NodeId("node-a".to_string())))
        );
    }

    #[tokio::test]
    async fn test_rerank_reuses_query_by_default() {
        let graph = Arc::new(
            RecordingGraphService::new().with_search_results(vec![vec![fact("f1", "node-a")]]),
        );
        let flow = QueryFlow::new(graph.clone());

        flow.run(&QueryRequest::new("prices in dk1")).await.unwrap();
        assert_eq!(graph.searches()[1].0, "prices in dk1");
    }

    #[tokio::test]
    async fn test_rerank_can_be_disabled() {
        let graph = Arc::new(
            RecordingGraphService::new().with_search_results(vec![vec![fact("f1", "node-a")]]),
        );
        let flow = QueryFlow::new(graph.clone());

        let mut request = QueryRequest::new("prices");
        request.rerank = false;
        let outcome = flow.run(&request).await.unwrap();

        assert!(matches!(outcome, QueryOutcome::Found { reranked: None, .. }));
        assert_eq!(graph.searches().len(), 1);
    }

    #[test]
    fn test_request_defaults_from_json() {
        let request: QueryRequest = serde_json::from_str(r#"{"query":"show customers"}"#).unwrap();
        assert!(request.rerank);
        assert!(request.rerank_query.is_none());
    }
}
