//! `mcpdispatch` — an HTTP dispatch adapter for MCP (Model Context Protocol) servers.
//!
//! Sits between an HTTP server and the protocol engine: authenticates the
//! request, builds a per-request context, instantiates the engine with the
//! configured tool/prompt/resource catalogs, invokes it directly or through a
//! pluggable transport, normalizes the body and hands the response to an
//! optional post-processor. Every request gets exactly one well-formed
//! response, whatever the extensions do.
//!
//! # Quick start
//!
//! ```rust
//! use axum::http::Request;
//! use mcpdispatch::{Configuration, Dispatcher, McpRequest};
//! use serde_json::json;
//!
//! # async fn example() {
//! let dispatcher = Dispatcher::new(
//!     Configuration::builder()
//!         .authenticate_with(|req| req.bearer_token() == Some("secret"))
//!         .build_context_with(|req| json!({"tenant": req.header("x-tenant")}))
//!         .build(),
//! );
//!
//! let req: McpRequest = Request::builder()
//!     .method("POST")
//!     .header("authorization", "Bearer secret")
//!     .body(r#"{"jsonrpc":"2.0","method":"ping","id":1}"#)
//!     .unwrap()
//!     .into();
//! let resp = dispatcher.handle(req).await;
//! assert_eq!(resp.status, 200);
//!
//! // Or serve it with axum:
//! let app = mcpdispatch::http_router(dispatcher);
//! # let _ = app;
//! # }
//! ```

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod loader;
pub mod request;
pub mod response;
pub mod transport;
pub mod transport_http;
pub mod types;
mod validate;

/// Server name reported by `initialize` unless configured otherwise.
pub const SERVER_NAME: &str = "mcpdispatch";
/// Server version reported by `initialize` unless configured otherwise.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export the most commonly used items at the crate root.
pub use config::{
    AuthenticateFn, BuildContextFn, Catalog, Configuration, ConfigurationBuilder, MethodPolicy,
    ResponseHandlerFn,
};
pub use context::RequestContext;
pub use dispatcher::Dispatcher;
pub use engine::{
    Engine, FnPromptHandler, FnResourcesReadHandler, FnToolHandler, PromptHandler,
    RegisteredPrompt, RegisteredTool, ResourcesReadHandler, ToolHandler,
};
pub use error::DispatchError;
pub use loader::{
    load_prompts, load_resources, load_tools, parse_prompts, parse_resources, parse_tools,
};
pub use request::McpRequest;
pub use response::HttpResponse;
pub use transport::{
    FnTransportFactory, Transport, TransportBody, TransportFactory, TransportResponse,
};
pub use transport_http::{handle_mcp, http_router};
pub use types::{
    error_result, new_error_response, text_result, user_prompt, ContentBlock, JsonRpcRequest,
    JsonRpcResponse, McpError, Prompt, PromptArgument, PromptMessage, PromptResult, Resource,
    ResourceContent, ResourceReadParams, RpcError, Tool, ToolResult, PROTOCOL_VERSION,
};
