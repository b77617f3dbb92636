use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::flow::{QueryFlow, QueryRequest};

#[derive(Clone)]
struct AppState {
    flow: Arc<QueryFlow>,
}

/// HTTP routes of the query service.
pub fn router(flow: Arc<QueryFlow>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/v1/search", post(search))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { flow })
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "query",
        "status": "healthy",
        "version": "0.1.0"
    }))
}

async fn search(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if request.query.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "query must not be empty".to_string()));
    }

    info!("Search request: {:?} (rerank: {})", request.query, request.rerank);

    let outcome = state.flow.run(&request).await.map_err(|e| {
        error!("Search failed: {}", e);
        (StatusCode::BAD_GATEWAY, e.to_string())
    })?;

    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use kg_loader_graph::RecordingGraphService;
    use kg_loader_schemas::{FactId, FactResult, NodeId};
    use serde_json::Value;
    use tower::ServiceExt;

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/search")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(Arc::new(QueryFlow::new(Arc::new(RecordingGraphService::new()))));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["service"], "query");
    }

    #[tokio::test]
    async fn test_no_results() {
        let app = router(Arc::new(QueryFlow::new(Arc::new(RecordingGraphService::new()))));
        let response = app
            .oneshot(post_json(r#"{"query":"show customers"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "no_results");
    }

    #[tokio::test]
    async fn test_found_with_rerank() {
        let fact = FactResult {
            uuid: FactId("f1".into()),
            fact: "CUST001 holds CTR-9F2C11AB".into(),
            source_node_uuid: NodeId("node-cust001".into()),
            target_node_uuid: None,
            valid_at: None,
            invalid_at: None,
        };
        let graph = RecordingGraphService::new()
            .with_search_results(vec![vec![fact.clone()], vec![fact]]);
        let app = router(Arc::new(QueryFlow::new(Arc::new(graph))));

        let response = app
            .oneshot(post_json(r#"{"query":"show customers"}"#))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["status"], "found");
        assert_eq!(body["center"], "node-cust001");
        assert_eq!(body["reranked"][0]["uuid"], "f1");
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let app = router(Arc::new(QueryFlow::new(Arc::new(RecordingGraphService::new()))));
        let response = app.oneshot(post_json(r#"{"query":"  "}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
