use std::sync::Arc;

use serde_json::{Map, Value};

use crate::request::McpRequest;

/// Key under which the inbound request is always present.
pub const REQUEST_KEY: &str = "request";

/// Per-request ambient data handed to every tool, prompt and resource call.
///
/// Always holds the inbound request; anything else comes from the
/// configured context builder.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request: Arc<McpRequest>,
    extra: Map<String, Value>,
}

impl RequestContext {
    /// A context holding only the request.
    pub fn new(request: Arc<McpRequest>) -> Self {
        Self {
            request,
            extra: Map::new(),
        }
    }

    /// Merge the output of a context builder.
    ///
    /// Only JSON objects are merged; any other value leaves the context
    /// untouched. A `request` entry never replaces the inbound request.
    pub fn merge(&mut self, custom: Value) {
        let Value::Object(entries) = custom else {
            tracing::debug!("context builder returned a non-object value, ignoring");
            return;
        };

        for (key, value) in entries {
            if key == REQUEST_KEY {
                tracing::warn!("context builder tried to override the request entry, ignoring");
                continue;
            }
            self.extra.insert(key, value);
        }
    }

    pub fn request(&self) -> &McpRequest {
        &self.request
    }

    /// Value supplied by the context builder for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        key == REQUEST_KEY || self.extra.contains_key(key)
    }

    /// All keys, `request` first.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(REQUEST_KEY).chain(self.extra.keys().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        1 + self.extra.len()
    }

    /// Never true: the request entry is always present.
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use serde_json::json;

    fn ctx() -> RequestContext {
        let req: McpRequest = Request::builder().method("POST").body("").unwrap().into();
        RequestContext::new(Arc::new(req))
    }

    #[test]
    fn test_seeded_with_request_only() {
        let ctx = ctx();
        assert_eq!(ctx.keys().collect::<Vec<_>>(), vec!["request"]);
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_merge_object() {
        let mut ctx = ctx();
        ctx.merge(json!({"user": {"id": 1}, "org": "acme"}));
        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.get("user"), Some(&json!({"id": 1})));
        assert!(ctx.contains_key("org"));
    }

    #[test]
    fn test_merge_non_object_is_ignored() {
        let mut ctx = ctx();
        ctx.merge(json!("not a map"));
        ctx.merge(json!([1, 2]));
        ctx.merge(Value::Null);
        assert_eq!(ctx.keys().collect::<Vec<_>>(), vec!["request"]);
    }

    #[test]
    fn test_request_entry_cannot_be_replaced() {
        let mut ctx = ctx();
        ctx.merge(json!({"request": "spoofed", "tenant": 7}));
        assert_eq!(ctx.len(), 2);
        assert!(ctx.get("request").is_none());
        assert_eq!(ctx.request().method(), "POST");
    }
}
