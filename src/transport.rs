//! Pluggable transports and the body normalization applied to their output.
//!
//! A transport sits between the raw HTTP request and the [`Engine`]. It is
//! third-party code, so the body it returns may come in several shapes;
//! [`TransportBody::into_bytes`] folds all of them into one byte string.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use serde_json::Value;

use crate::engine::Engine;
use crate::request::McpRequest;
use crate::response::HttpResponse;
use crate::types::McpError;

/// Mediates one HTTP request for one engine instance.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn handle_request(&self, request: &McpRequest) -> Result<TransportResponse, McpError>;
}

/// Builds a [`Transport`] around the per-request engine.
pub trait TransportFactory: Send + Sync {
    fn build(&self, engine: Arc<Engine>) -> Box<dyn Transport>;

    /// Whether transports from this factory actually handle requests.
    ///
    /// Factories answering `false` are treated as legacy and the dispatcher
    /// falls back to direct JSON-RPC handling. Checked once, when the
    /// configuration is built.
    fn handles_requests(&self) -> bool {
        true
    }
}

/// Wraps a closure into a TransportFactory.
pub struct FnTransportFactory<F> {
    f: F,
}

impl<F> FnTransportFactory<F>
where
    F: Fn(Arc<Engine>) -> Box<dyn Transport> + Send + Sync + 'static,
{
    pub fn new(f: F) -> Arc<dyn TransportFactory> {
        Arc::new(Self { f })
    }
}

impl<F> TransportFactory for FnTransportFactory<F>
where
    F: Fn(Arc<Engine>) -> Box<dyn Transport> + Send + Sync + 'static,
{
    fn build(&self, engine: Arc<Engine>) -> Box<dyn Transport> {
        (self.f)(engine)
    }
}

/// The (status, headers, body) a transport hands back.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: TransportBody,
}

impl TransportResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<TransportBody>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Normalize the body and produce the canonical response.
    pub fn into_http(self) -> HttpResponse {
        HttpResponse::new(self.status, self.headers, self.body.into_bytes())
    }
}

/// Every body shape a transport may produce.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportBody {
    /// No body at all.
    Empty,
    /// A single chunk of text.
    Text(String),
    /// A sequence of chunks, some possibly missing.
    Parts(Vec<Option<String>>),
    /// Raw binary content.
    Binary(Bytes),
    /// An arbitrary JSON value.
    Json(Value),
}

impl TransportBody {
    /// Fold the body into bytes.
    ///
    /// Missing chunks are dropped and the rest concatenated in order. A JSON
    /// value follows the same rules: null is empty, a string is its text, an
    /// array is the concatenation of its non-null elements, and anything
    /// else is its JSON text.
    pub fn into_bytes(self) -> Bytes {
        match self {
            TransportBody::Empty => Bytes::new(),
            TransportBody::Text(s) => Bytes::from(s),
            TransportBody::Parts(parts) => Bytes::from(parts.into_iter().flatten().collect::<String>()),
            TransportBody::Binary(b) => b,
            TransportBody::Json(value) => Bytes::from(json_text(value)),
        }
    }
}

fn json_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Array(items) => items
            .into_iter()
            .filter(|v| !v.is_null())
            .map(|v| match v {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        other => other.to_string(),
    }
}

impl From<Option<String>> for TransportBody {
    fn from(body: Option<String>) -> Self {
        body.map_or(TransportBody::Empty, TransportBody::Text)
    }
}

impl From<String> for TransportBody {
    fn from(body: String) -> Self {
        TransportBody::Text(body)
    }
}

impl From<&str> for TransportBody {
    fn from(body: &str) -> Self {
        TransportBody::Text(body.to_string())
    }
}

impl From<Vec<Option<String>>> for TransportBody {
    fn from(parts: Vec<Option<String>>) -> Self {
        TransportBody::Parts(parts)
    }
}

impl From<Vec<String>> for TransportBody {
    fn from(parts: Vec<String>) -> Self {
        TransportBody::Parts(parts.into_iter().map(Some).collect())
    }
}

impl From<Bytes> for TransportBody {
    fn from(body: Bytes) -> Self {
        TransportBody::Binary(body)
    }
}

impl From<Value> for TransportBody {
    fn from(body: Value) -> Self {
        TransportBody::Json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(body: TransportBody) -> String {
        String::from_utf8(body.into_bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(text(TransportBody::Empty), "");
        assert_eq!(text(TransportBody::from(None::<String>)), "");
        assert_eq!(text(TransportBody::Json(Value::Null)), "");
    }

    #[test]
    fn test_text_body() {
        assert_eq!(text("abc".into()), "abc");
        assert_eq!(text(TransportBody::Json(json!("abc"))), "abc");
    }

    #[test]
    fn test_parts_drop_missing_chunks() {
        let body = TransportBody::Parts(vec![Some("a".into()), None, Some("b".into())]);
        assert_eq!(text(body), "ab");
        assert_eq!(text(TransportBody::Json(json!(["a", null, "b"]))), "ab");
    }

    #[test]
    fn test_other_values_become_json_text() {
        assert_eq!(
            text(TransportBody::Json(json!({"result": "x"}))),
            r#"{"result":"x"}"#
        );
        assert_eq!(text(TransportBody::Json(json!(42))), "42");
        assert_eq!(text(TransportBody::Json(json!([{"a": 1}, null, 2]))), r#"{"a":1}2"#);
    }

    #[test]
    fn test_into_http_keeps_status_and_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-session", "s1".parse().unwrap());
        let resp = TransportResponse::new(StatusCode::ACCEPTED, headers, None::<String>).into_http();
        assert_eq!(resp.status, StatusCode::ACCEPTED);
        assert_eq!(resp.headers["x-session"], "s1");
        assert!(resp.body.is_empty());
    }
}
