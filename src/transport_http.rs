use axum::{
    body::Body,
    extract::{Request, State},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::json;

use crate::dispatcher::Dispatcher;
use crate::request::McpRequest;

/// Create an Axum router serving the dispatcher at `/mcp`.
///
/// Every HTTP method is routed to the dispatcher, which applies the
/// configured method policy itself.
pub fn http_router(dispatcher: Dispatcher) -> Router {
    Router::new()
        .route("/mcp", any(handle_mcp))
        .route("/healthz", get(handle_healthz))
        .with_state(dispatcher)
}

/// Axum handler for mounting the dispatcher on a route of your own.
pub async fn handle_mcp(State(dispatcher): State<Dispatcher>, req: Request<Body>) -> Response {
    let limit = dispatcher.config().max_body_bytes();
    let request = match McpRequest::from_axum(req, limit).await {
        Ok(r) => r,
        Err(e) => return e.to_response().into_response(),
    };

    dispatcher.handle(request).await.into_response()
}

async fn handle_healthz() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_router(config: Configuration) -> Router {
        http_router(Dispatcher::new(config))
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = test_router(Configuration::default());
        let req = Request::builder()
            .method("GET")
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_reaches_method_gate() {
        let app = test_router(Configuration::default());
        let req = Request::builder()
            .method("GET")
            .uri("/mcp")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_oversized_body_is_413() {
        let app = test_router(Configuration::builder().max_body_bytes(8).build());
        let req = Request::builder()
            .method("POST")
            .uri("/mcp")
            .body(Body::from(r#"{"jsonrpc":"2.0","method":"ping","id":1}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_broken_body_stream_is_400() {
        let chunks: Vec<Result<&'static str, std::io::Error>> = vec![
            Ok("{\"jsonrpc\":"),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let app = test_router(Configuration::default());
        let req = Request::builder()
            .method("POST")
            .uri("/mcp")
            .body(Body::from_stream(futures::stream::iter(chunks)))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        assert_eq!(body.as_ref(), br#"{"error":"Invalid request body"}"#);
    }
}
