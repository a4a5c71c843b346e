//! The protocol engine the dispatcher instantiates once per request.
//!
//! An [`Engine`] owns the catalogs resolved for one request plus that
//! request's [`RequestContext`], routes JSON-RPC methods and hands the
//! context to every tool, prompt and resource-read handler it calls.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::RequestContext;
use crate::types::*;

/// Handler trait for MCP tools. Implement this or use [`FnToolHandler`].
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value, context: &RequestContext) -> Result<ToolResult, McpError>;
}

/// Handler trait for MCP prompts.
#[async_trait]
pub trait PromptHandler: Send + Sync {
    async fn get(&self, args: Value, context: &RequestContext) -> Result<PromptResult, McpError>;
}

/// Handler for `resources/read` calls, shared by every resource.
#[async_trait]
pub trait ResourcesReadHandler: Send + Sync {
    async fn read(
        &self,
        params: &ResourceReadParams,
        context: &RequestContext,
    ) -> Result<Vec<ResourceContent>, McpError>;
}

/// Wraps an async closure into a ToolHandler.
pub struct FnToolHandler<F> {
    f: F,
}

impl<F, Fut> FnToolHandler<F>
where
    F: Fn(Value, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ToolResult, McpError>> + Send + 'static,
{
    pub fn new(f: F) -> Arc<dyn ToolHandler> {
        Arc::new(Self { f })
    }
}

#[async_trait]
impl<F, Fut> ToolHandler for FnToolHandler<F>
where
    F: Fn(Value, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ToolResult, McpError>> + Send + 'static,
{
    async fn call(&self, args: Value, context: &RequestContext) -> Result<ToolResult, McpError> {
        (self.f)(args, context.clone()).await
    }
}

/// Wraps an async closure into a PromptHandler.
pub struct FnPromptHandler<F> {
    f: F,
}

impl<F, Fut> FnPromptHandler<F>
where
    F: Fn(Value, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<PromptResult, McpError>> + Send + 'static,
{
    pub fn new(f: F) -> Arc<dyn PromptHandler> {
        Arc::new(Self { f })
    }
}

#[async_trait]
impl<F, Fut> PromptHandler for FnPromptHandler<F>
where
    F: Fn(Value, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<PromptResult, McpError>> + Send + 'static,
{
    async fn get(&self, args: Value, context: &RequestContext) -> Result<PromptResult, McpError> {
        (self.f)(args, context.clone()).await
    }
}

/// Wraps an async closure into a ResourcesReadHandler.
pub struct FnResourcesReadHandler<F> {
    f: F,
}

impl<F, Fut> FnResourcesReadHandler<F>
where
    F: Fn(ResourceReadParams, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<ResourceContent>, McpError>> + Send + 'static,
{
    pub fn new(f: F) -> Arc<dyn ResourcesReadHandler> {
        Arc::new(Self { f })
    }
}

#[async_trait]
impl<F, Fut> ResourcesReadHandler for FnResourcesReadHandler<F>
where
    F: Fn(ResourceReadParams, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<ResourceContent>, McpError>> + Send + 'static,
{
    async fn read(
        &self,
        params: &ResourceReadParams,
        context: &RequestContext,
    ) -> Result<Vec<ResourceContent>, McpError> {
        (self.f)(params.clone(), context.clone()).await
    }
}

/// A tool descriptor paired with the handler that executes it.
#[derive(Clone)]
pub struct RegisteredTool {
    pub tool: Tool,
    pub handler: Arc<dyn ToolHandler>,
}

impl RegisteredTool {
    pub fn new(tool: Tool, handler: Arc<dyn ToolHandler>) -> Self {
        Self { tool, handler }
    }
}

/// A prompt descriptor paired with the handler that renders it.
#[derive(Clone)]
pub struct RegisteredPrompt {
    pub prompt: Prompt,
    pub handler: Arc<dyn PromptHandler>,
}

impl RegisteredPrompt {
    pub fn new(prompt: Prompt, handler: Arc<dyn PromptHandler>) -> Self {
        Self { prompt, handler }
    }
}

/// One engine instance, scoped to a single HTTP request.
pub struct Engine {
    server_name: String,
    server_version: String,
    tools: Vec<RegisteredTool>,
    prompts: Vec<RegisteredPrompt>,
    resources: Vec<Resource>,
    context: RequestContext,
    resources_read_handler: Option<Arc<dyn ResourcesReadHandler>>,
}

impl Engine {
    /// Create a new engine builder for a request context.
    pub fn builder(context: RequestContext) -> EngineBuilder {
        EngineBuilder {
            context,
            server_name: None,
            server_version: None,
            tools: Vec::new(),
            prompts: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// Register the handler used for `resources/read`.
    pub fn set_resources_read_handler(&mut self, handler: Arc<dyn ResourcesReadHandler>) {
        self.resources_read_handler = Some(handler);
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Handle a raw JSON-RPC body: a single request or a batch.
    ///
    /// Returns `Ok(None)` when nothing needs to be sent back (notifications).
    /// Fails with [`McpError::Parse`] when the body is not JSON at all.
    pub async fn handle_json(&self, body: &[u8]) -> Result<Option<String>, McpError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| McpError::Parse(e.to_string()))?;

        match value {
            Value::Array(items) if items.is_empty() => {
                let resp = new_error_response(None, ERR_CODE_INVALID_REQ, "empty batch");
                Ok(Some(serde_json::to_string(&resp)?))
            }
            Value::Array(items) => {
                let mut responses = Vec::with_capacity(items.len());
                for item in items {
                    let resp = self.handle_value(item).await;
                    if !resp.is_notification() {
                        responses.push(resp);
                    }
                }
                if responses.is_empty() {
                    return Ok(None);
                }
                Ok(Some(serde_json::to_string(&responses)?))
            }
            single => {
                let resp = self.handle_value(single).await;
                if resp.is_notification() {
                    return Ok(None);
                }
                Ok(Some(serde_json::to_string(&resp)?))
            }
        }
    }

    async fn handle_value(&self, value: Value) -> JsonRpcResponse {
        let id = value.get("id").cloned().filter(|v| !v.is_null());
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(req) => self.handle(req).await,
            Err(e) => new_error_response(
                id,
                ERR_CODE_INVALID_REQ,
                format!("invalid request: {}", e),
            ),
        }
    }

    /// Route a JSON-RPC request to the appropriate MCP handler.
    pub async fn handle(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        if req.jsonrpc != "2.0" {
            return new_error_response(req.id, ERR_CODE_INVALID_REQ, "jsonrpc must be '2.0'");
        }

        match req.method.as_str() {
            "initialize" => self.handle_initialize(req),
            "ping" => new_ok_response(req.id, json!({})),
            m if m.starts_with("notifications/") => notification_response(),
            "tools/list" => self.handle_tools_list(req),
            "tools/call" => self.handle_tools_call(req).await,
            "prompts/list" => self.handle_prompts_list(req),
            "prompts/get" => self.handle_prompts_get(req).await,
            "resources/list" => self.handle_resources_list(req),
            "resources/read" => self.handle_resources_read(req).await,
            _ => new_error_response(
                req.id,
                ERR_CODE_NO_METHOD,
                format!("Method not found: {}", req.method),
            ),
        }
    }

    fn handle_initialize(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        if let Some(params) = &req.params {
            if let Ok(p) = serde_json::from_value::<InitializeParams>(params.clone()) {
                let client_name = p.client_info.as_ref().map_or("", |c| c.name.as_str());
                let client_version = p.client_info.as_ref().map_or("", |c| c.version.as_str());
                tracing::info!(
                    client_name,
                    client_version,
                    protocol_version = ?p.protocol_version,
                    "initialize"
                );
            }
        }

        let result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {"listChanged": false},
                "prompts": {"listChanged": false},
                "resources": {"subscribe": false, "listChanged": false},
            },
            "serverInfo": {
                "name": self.server_name,
                "version": self.server_version,
            },
        });

        new_ok_response(req.id, result)
    }

    fn handle_tools_list(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let tools: Vec<&Tool> = self.tools.iter().map(|t| &t.tool).collect();
        new_ok_response(req.id, json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let params: ToolCallParams = match parse_params(&req) {
            Ok(p) => p,
            Err(resp) => return resp,
        };

        let args = if params.arguments.is_null() {
            json!({})
        } else {
            params.arguments
        };

        let entry = match self.tools.iter().find(|t| t.tool.name == params.name) {
            Some(t) => t,
            None => {
                return new_error_response(
                    req.id,
                    ERR_CODE_NO_METHOD,
                    format!("Unknown tool: {}", params.name),
                )
            }
        };

        if let Err(e) = entry.tool.validate_arguments(&args) {
            return new_error_response(req.id, ERR_CODE_BAD_PARAMS, e);
        }

        tracing::debug!(tool = %params.name, "tools/call");
        let result = match entry.handler.call(args, &self.context).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(tool = %params.name, error = %e, "tool handler failed");
                error_result(e.to_string())
            }
        };

        let result_value = serde_json::to_value(&result).unwrap_or(json!(null));
        new_ok_response(req.id, result_value)
    }

    fn handle_prompts_list(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let prompts: Vec<&Prompt> = self.prompts.iter().map(|p| &p.prompt).collect();
        new_ok_response(req.id, json!({ "prompts": prompts }))
    }

    async fn handle_prompts_get(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let params: PromptGetParams = match parse_params(&req) {
            Ok(p) => p,
            Err(resp) => return resp,
        };

        let args = if params.arguments.is_null() {
            json!({})
        } else {
            params.arguments
        };

        let entry = match self.prompts.iter().find(|p| p.prompt.name == params.name) {
            Some(p) => p,
            None => {
                return new_error_response(
                    req.id,
                    ERR_CODE_BAD_PARAMS,
                    format!("Unknown prompt: {}", params.name),
                )
            }
        };

        if let Err(e) = entry.prompt.validate_arguments(&args) {
            return new_error_response(req.id, ERR_CODE_BAD_PARAMS, e);
        }

        match entry.handler.get(args, &self.context).await {
            Ok(result) => {
                let value = serde_json::to_value(&result).unwrap_or(json!(null));
                new_ok_response(req.id, value)
            }
            Err(e) => new_error_response(
                req.id,
                ERR_CODE_INTERNAL,
                format!("get prompt: {}", e),
            ),
        }
    }

    fn handle_resources_list(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        new_ok_response(req.id, json!({ "resources": self.resources }))
    }

    async fn handle_resources_read(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let params: ResourceReadParams = match parse_params(&req) {
            Ok(p) => p,
            Err(resp) => return resp,
        };

        if params.name.is_none() && params.uri.is_none() {
            return new_error_response(
                req.id,
                ERR_CODE_BAD_PARAMS,
                "either name or uri must be provided",
            );
        }

        // A read handler owns the whole URI space, listed or not.
        if let Some(handler) = &self.resources_read_handler {
            return match handler.read(&params, &self.context).await {
                Ok(contents) => new_ok_response(req.id, json!({ "contents": contents })),
                Err(e) => new_error_response(
                    req.id,
                    ERR_CODE_INTERNAL,
                    format!("read resource: {}", e),
                ),
            };
        }

        let target = match (&params.name, &params.uri) {
            (Some(name), _) => self.resources.iter().find(|r| &r.name == name),
            (None, Some(uri)) => self.resources.iter().find(|r| &r.uri == uri),
            (None, None) => None,
        };

        match target {
            // Without a read handler only metadata is available.
            Some(t) => new_ok_response(
                req.id,
                json!({
                    "contents": [{
                        "uri": t.uri,
                        "mimeType": t.mime_type,
                        "text": "",
                    }],
                }),
            ),
            None => new_error_response(req.id, ERR_CODE_BAD_PARAMS, "resource not found"),
        }
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(req: &JsonRpcRequest) -> Result<T, JsonRpcResponse> {
    let Some(params) = req.params.as_ref() else {
        return Err(new_error_response(
            req.id.clone(),
            ERR_CODE_BAD_PARAMS,
            "params required",
        ));
    };
    serde_json::from_value(params.clone()).map_err(|e| {
        new_error_response(
            req.id.clone(),
            ERR_CODE_BAD_PARAMS,
            format!("invalid params: {}", e),
        )
    })
}

/// Builder for a per-request [`Engine`].
pub struct EngineBuilder {
    context: RequestContext,
    server_name: Option<String>,
    server_version: Option<String>,
    tools: Vec<RegisteredTool>,
    prompts: Vec<RegisteredPrompt>,
    resources: Vec<Resource>,
}

impl EngineBuilder {
    /// Set server name and version.
    pub fn server_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self.server_version = Some(version.into());
        self
    }

    pub fn tools(mut self, tools: Vec<RegisteredTool>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn prompts(mut self, prompts: Vec<RegisteredPrompt>) -> Self {
        self.prompts.extend(prompts);
        self
    }

    pub fn resources(mut self, resources: Vec<Resource>) -> Self {
        self.resources.extend(resources);
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            server_name: self.server_name.unwrap_or_else(|| crate::SERVER_NAME.into()),
            server_version: self
                .server_version
                .unwrap_or_else(|| crate::SERVER_VERSION.into()),
            tools: self.tools,
            prompts: self.prompts,
            resources: self.resources,
            context: self.context,
            resources_read_handler: None,
        }
    }
}
