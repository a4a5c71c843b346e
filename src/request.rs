//! The inbound request as seen by every extension point.
//!
//! The body is buffered once when the request enters the adapter, so the
//! authenticator, context builder, transport and engine all read the same
//! bytes without any rewinding.

use axum::body::{Body, Bytes};
use axum::http::{request::Parts, HeaderMap, Method, Request, Uri};
use http_body_util::{BodyExt, LengthLimitError, Limited};

use crate::error::DispatchError;

/// A fully buffered HTTP request.
#[derive(Debug)]
pub struct McpRequest {
    parts: Parts,
    body: Bytes,
}

impl McpRequest {
    /// Assemble a request from already-split parts and a buffered body.
    pub fn from_parts(parts: Parts, body: Bytes) -> Self {
        Self { parts, body }
    }

    /// Buffer an axum request body, refusing bodies longer than `limit` bytes.
    ///
    /// Fails with [`DispatchError::PayloadTooLarge`] past the limit and with
    /// [`DispatchError::InvalidBody`] when the body stream itself fails.
    pub async fn from_axum(req: Request<Body>, limit: usize) -> Result<Self, DispatchError> {
        let (parts, body) = req.into_parts();
        let collected = Limited::new(body, limit).collect().await.map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                tracing::warn!(limit, "request body exceeds limit");
                DispatchError::PayloadTooLarge
            } else {
                tracing::warn!(error = %e, "failed to read request body");
                DispatchError::InvalidBody
            }
        })?;
        Ok(Self {
            parts,
            body: collected.to_bytes(),
        })
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Bearer token from the `Authorization` header.
    pub fn bearer_token(&self) -> Option<&str> {
        self.header("authorization")
            .and_then(|v| v.strip_prefix("Bearer "))
    }

    /// Request extensions, e.g. values inserted by upstream middleware.
    pub fn extensions(&self) -> &axum::http::Extensions {
        &self.parts.extensions
    }

    /// The complete request body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

impl<B: Into<Bytes>> From<Request<B>> for McpRequest {
    fn from(req: Request<B>) -> Self {
        let (parts, body) = req.into_parts();
        Self {
            parts,
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let req: McpRequest = Request::builder()
            .method("POST")
            .uri("/mcp?x=1")
            .header("authorization", "Bearer abc")
            .body("{}")
            .unwrap()
            .into();
        assert_eq!(req.method(), &Method::POST);
        assert_eq!(req.path(), "/mcp");
        assert_eq!(req.bearer_token(), Some("abc"));
        assert_eq!(req.body().as_ref(), b"{}");
    }

    #[test]
    fn test_bearer_token_requires_scheme() {
        let req: McpRequest = Request::builder()
            .header("authorization", "Basic abc")
            .body("")
            .unwrap()
            .into();
        assert_eq!(req.bearer_token(), None);
    }

    #[tokio::test]
    async fn test_from_axum_enforces_limit() {
        let req = Request::builder()
            .method("POST")
            .body(Body::from(vec![b'x'; 64]))
            .unwrap();
        assert_eq!(
            McpRequest::from_axum(req, 16).await.unwrap_err(),
            DispatchError::PayloadTooLarge
        );

        let req = Request::builder()
            .method("POST")
            .body(Body::from("small"))
            .unwrap();
        let req = McpRequest::from_axum(req, 16).await.unwrap();
        assert_eq!(req.body().as_ref(), b"small");
    }

    #[tokio::test]
    async fn test_from_axum_stream_error_is_invalid_body() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"{\"jsonrpc\"")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let req = Request::builder()
            .method("POST")
            .body(Body::from_stream(futures::stream::iter(chunks)))
            .unwrap();
        assert_eq!(
            McpRequest::from_axum(req, 1024).await.unwrap_err(),
            DispatchError::InvalidBody
        );
    }
}
