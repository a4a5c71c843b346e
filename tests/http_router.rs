//! Drives the axum integration end to end with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use mcpdispatch::{
    http_router, parse_tools, text_result, Configuration, Dispatcher, FnToolHandler,
    RegisteredTool, RequestContext,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn router() -> axum::Router {
    let tool = parse_tools(
        br#"[{"name":"whoami","inputSchema":{"type":"object","properties":{}}}]"#,
    )
    .unwrap()
    .remove(0);

    http_router(Dispatcher::new(
        Configuration::builder()
            .authenticate_with(|req| req.bearer_token() == Some("s3cret"))
            .build_context_with(|req| json!({"user": req.header("x-user")}))
            .tools(vec![RegisteredTool::new(
                tool,
                FnToolHandler::new(|_args: Value, ctx: RequestContext| async move {
                    let user = ctx
                        .get("user")
                        .and_then(Value::as_str)
                        .unwrap_or("anonymous")
                        .to_string();
                    Ok(text_result(user))
                }),
            )])
            .build(),
    ))
}

fn mcp_post() -> axum::http::request::Builder {
    Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn unauthenticated_post_is_401() {
    let body = r#"{"jsonrpc":"2.0","method":"ping","id":1}"#;
    let req = mcp_post().body(Body::from(body)).unwrap();
    let resp = router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await, json!({"error": "Unauthorized"}));
}

#[tokio::test]
async fn authenticated_tool_call_sees_context() {
    let body = json!({
        "jsonrpc": "2.0",
        "method": "tools/call",
        "params": {"name": "whoami", "arguments": {}},
        "id": 5
    })
    .to_string();
    let req = mcp_post()
        .header("authorization", "Bearer s3cret")
        .header("x-user", "ferris")
        .body(Body::from(body))
        .unwrap();

    let resp = router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/json");
    let body = body_json(resp).await;
    assert_eq!(body["id"], 5);
    assert_eq!(body["result"]["content"][0]["text"], "ferris");
}

#[tokio::test]
async fn malformed_json_is_400() {
    let req = mcp_post()
        .header("authorization", "Bearer s3cret")
        .body(Body::from("{oops"))
        .unwrap();
    let resp = router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await, json!({"error": "Invalid JSON"}));
}

#[tokio::test]
async fn notification_is_accepted_without_body() {
    let body = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
    let req = mcp_post()
        .header("authorization", "Bearer s3cret")
        .body(Body::from(body))
        .unwrap();
    let resp = router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn unknown_route_is_404() {
    let req = Request::builder()
        .method("POST")
        .uri("/nope")
        .body(Body::empty())
        .unwrap();
    let resp = router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
