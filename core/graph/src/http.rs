use async_trait::async_trait;
use kg_loader_schemas::{Episode, FactResult, NodeId};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ServiceError;
use crate::service::GraphService;

/// Connection settings for the graph service REST API
#[derive(Debug, Clone)]
pub struct GraphServiceConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub search_limit: usize,
}

impl Default for GraphServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_key: None,
            timeout_secs: 60,
            search_limit: 10,
        }
    }
}

impl GraphServiceConfig {
    /// Create config from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = std::env::var("GRAPH_SERVICE_URL").unwrap_or(defaults.base_url);
        let api_key = std::env::var("GRAPH_SERVICE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout_secs: env_number("GRAPH_SERVICE_TIMEOUT_SECS", defaults.timeout_secs),
            search_limit: env_number("GRAPH_SEARCH_LIMIT", defaults.search_limit),
        }
    }
}

fn env_number<T: std::str::FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring {}={:?}: not a number, using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[derive(Serialize)]
struct BulkRequest<'a> {
    episodes: &'a [Episode],
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    center_node_uuid: Option<&'a NodeId>,
    num_results: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    facts: Vec<FactResult>,
}

/// Graph service reached over its JSON/HTTP API
pub struct HttpGraphService {
    config: GraphServiceConfig,
    client: Client,
}

impl HttpGraphService {
    pub fn new(config: GraphServiceConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Connectivity(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn from_env() -> Result<Self, ServiceError> {
        Self::new(GraphServiceConfig::from_env())
    }

    pub fn config(&self) -> &GraphServiceConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, ServiceError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_success() {
            return Ok(response);
        }

        Err(status_error(response).await)
    }
}

fn transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_decode() {
        ServiceError::Decode(e.to_string())
    } else {
        ServiceError::Connectivity(e.to_string())
    }
}

async fn status_error(response: Response) -> ServiceError {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        return ServiceError::RateLimited { retry_after_secs };
    }

    let message = response.text().await.unwrap_or_default();
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ServiceError::Validation(message)
        }
        _ => ServiceError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl GraphService for HttpGraphService {
    async fn submit_episodes_bulk(&self, episodes: &[Episode]) -> Result<(), ServiceError> {
        debug!("POST episodes/bulk ({} episodes)", episodes.len());
        let request = self
            .client
            .post(self.url("/episodes/bulk"))
            .json(&BulkRequest { episodes });
        self.send(request).await?;
        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        center_node: Option<&NodeId>,
    ) -> Result<Vec<FactResult>, ServiceError> {
        debug!("POST search: {:?} (center: {:?})", query, center_node);
        let request = self.client.post(self.url("/search")).json(&SearchRequest {
            query,
            center_node_uuid: center_node,
            num_results: self.config.search_limit,
        });

        let body: SearchResponse = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;

        Ok(body.facts)
    }

    async fn build_indices_and_constraints(&self) -> Result<(), ServiceError> {
        self.send(self.client.post(self.url("/indices"))).await?;
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), ServiceError> {
        self.send(self.client.delete(self.url("/graph"))).await?;
        Ok(())
    }
}
