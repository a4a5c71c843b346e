//! Failure classes of the dispatch pipeline and their HTTP rendering.
//!
//! Every variant renders as a JSON object with a single `error` field; the
//! status code carries the failure class.

use axum::http::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::response::HttpResponse;

/// Why a request did not produce a protocol response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The authenticator refused the request.
    #[error("Unauthorized")]
    Unauthorized,

    /// The method policy rejected the HTTP method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The request body is not valid JSON.
    #[error("Invalid JSON")]
    InvalidJson,

    /// The request body exceeded the configured limit.
    #[error("Payload too large")]
    PayloadTooLarge,

    /// The request body could not be read.
    #[error("Invalid request body")]
    InvalidBody,

    /// The engine or transport failed while processing the request.
    #[error("{0}")]
    Engine(String),

    /// No dispatch path produced a response.
    #[error("Internal server error")]
    Internal,
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::Unauthorized => StatusCode::UNAUTHORIZED,
            DispatchError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            DispatchError::InvalidJson | DispatchError::InvalidBody => StatusCode::BAD_REQUEST,
            DispatchError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            DispatchError::Engine(_) | DispatchError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Render as `{"error": <message>}` with the matching status.
    pub fn to_response(&self) -> HttpResponse {
        HttpResponse::json(self.status(), &json!({ "error": self.to_string() }))
    }
}

impl From<DispatchError> for HttpResponse {
    fn from(err: DispatchError) -> Self {
        err.to_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(DispatchError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            DispatchError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(DispatchError::InvalidJson.status(), StatusCode::BAD_REQUEST);
        assert_eq!(DispatchError::InvalidBody.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            DispatchError::PayloadTooLarge.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            DispatchError::Engine("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_body_shapes() {
        let resp = DispatchError::Unauthorized.to_response();
        assert_eq!(resp.body_text(), r#"{"error":"Unauthorized"}"#);

        let resp = DispatchError::Engine("Transport error occurred".into()).to_response();
        assert_eq!(resp.body_json().unwrap()["error"], "Transport error occurred");

        let resp = DispatchError::Internal.to_response();
        assert_eq!(resp.body_text(), r#"{"error":"Internal server error"}"#);
    }
}
