pub mod health;

use std::any::Any;

use axum::{
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;

use crate::analysis::handlers;
use crate::errors::error_response;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/analyze", post(handlers::handle_analyze))
        .route("/api/provider/models", get(handlers::handle_list_models))
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// Last-resort boundary: a panicking handler becomes a generic 500.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!("Handler panicked: {detail}");

    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal server error occurred",
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::analysis::handlers::MODEL_HEADER;
    use crate::analysis::response::fixtures::REFUND_RESPONSE;
    use crate::analysis::service::testing::ScriptedProvider;
    use crate::analysis::service::AnalysisService;
    use crate::config::Config;
    use crate::llm_client::candidates::CandidateList;
    use crate::llm_client::GeminiClient;

    fn test_state(provider: Arc<ScriptedProvider>, strict_integrity: bool) -> AppState {
        let candidates = CandidateList::new(["m1", "m2"]).unwrap();
        let config = Config {
            gemini_api_key: None,
            gemini_base_url: "http://127.0.0.1:9".to_string(),
            candidates: candidates.clone(),
            gemini_timeout_secs: 1,
            strict_integrity,
            port: 0,
            rust_log: "info".to_string(),
        };
        let llm = GeminiClient::new(None, &config.gemini_base_url, Duration::from_secs(1)).unwrap();
        AppState {
            analysis: Arc::new(AnalysisService::new(provider, candidates)),
            llm,
            config,
        }
    }

    fn analyze_request(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    fn refund_body() -> String {
        json!({
            "category": "Consumer",
            "city": "Pune",
            "state": "Maharashtra",
            "department": "",
            "description": "Mera refund 2 mahine se nahi mila"
        })
        .to_string()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(test_state(Arc::new(ScriptedProvider::new()), false));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_analyze_returns_schema_json_and_model_header() {
        let provider = Arc::new(ScriptedProvider::new().succeed("m1", REFUND_RESPONSE));
        let app = build_router(test_state(provider.clone(), false));

        let response = app.oneshot(analyze_request(refund_body())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[MODEL_HEADER], "m1");

        let body = body_json(response).await;
        let expected: Value = serde_json::from_str(REFUND_RESPONSE).unwrap();
        assert_eq!(body, expected);

        let action_id = body["recommendation"]["actionId"].as_str().unwrap();
        assert!(body["actions"]
            .as_array()
            .unwrap()
            .iter()
            .any(|a| a["id"] == action_id));
        assert_eq!(provider.calls(), vec!["m1"]);
    }

    #[tokio::test]
    async fn test_missing_description_is_rejected_without_provider_call() {
        let provider = Arc::new(ScriptedProvider::new().succeed("m1", REFUND_RESPONSE));
        let app = build_router(test_state(provider.clone(), false));

        let body = json!({"category": "Consumer", "city": "Pune"}).to_string();
        let response = app.oneshot(analyze_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "INVALID_INPUT");
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_description_is_rejected_without_provider_call() {
        let provider = Arc::new(ScriptedProvider::new().succeed("m1", REFUND_RESPONSE));
        let app = build_router(test_state(provider.clone(), false));

        let body = json!({"category": "Consumer", "description": ""}).to_string();
        let response = app.oneshot(analyze_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_body_is_invalid_input() {
        let provider = Arc::new(ScriptedProvider::new());
        let app = build_router(test_state(provider.clone(), false));

        let response = app
            .oneshot(analyze_request("{not json".to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "INVALID_INPUT");
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_all_models_failing_is_503() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .fail("m1", "quota exceeded")
                .fail("m2", "quota exceeded"),
        );
        let app = build_router(test_state(provider.clone(), false));

        let response = app.oneshot(analyze_request(refund_body())).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_json(response).await["error"]["code"],
            "PROVIDER_UNAVAILABLE"
        );
        assert_eq!(provider.calls(), vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn test_malformed_model_output_is_500_without_raw_text() {
        let provider = Arc::new(ScriptedProvider::new().succeed("m1", "I cannot help with that"));
        let app = build_router(test_state(provider.clone(), false));

        let response = app.oneshot(analyze_request(refund_body())).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "MALFORMED_RESPONSE");
        assert!(!body.to_string().contains("I cannot help with that"));
        assert_eq!(provider.calls(), vec!["m1"]);
    }

    fn dangling_response() -> String {
        let mut value: Value = serde_json::from_str(REFUND_RESPONSE).unwrap();
        value["recommendation"]["actionId"] = json!("ombudsman");
        value.to_string()
    }

    #[tokio::test]
    async fn test_dangling_action_id_passes_through_by_default() {
        let provider = Arc::new(ScriptedProvider::new().succeed("m1", &dangling_response()));
        let app = build_router(test_state(provider, false));

        let response = app.oneshot(analyze_request(refund_body())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["recommendation"]["actionId"],
            "ombudsman"
        );
    }

    #[tokio::test]
    async fn test_dangling_action_id_rejected_in_strict_mode() {
        let provider = Arc::new(ScriptedProvider::new().succeed("m1", &dangling_response()));
        let app = build_router(test_state(provider, true));

        let response = app.oneshot(analyze_request(refund_body())).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["error"]["code"],
            "MALFORMED_RESPONSE"
        );
    }
}
