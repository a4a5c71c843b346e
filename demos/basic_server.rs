//! Basic dispatch example.
//!
//! Run with: `cargo run --example basic_server`
//! Then test with:
//!   curl -X POST http://localhost:3000/mcp \
//!     -H "Authorization: Bearer demo-token" \
//!     -H "X-User: ferris" \
//!     -d '{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"greet","arguments":{"style":"formal"}}}'

use std::sync::Arc;

use async_trait::async_trait;
use mcpdispatch::{
    http_router, parse_resources, parse_tools, text_result, Configuration, Dispatcher,
    FnResourcesReadHandler, FnToolHandler, McpError, RegisteredTool, RequestContext,
    ResourceContent, ResourceReadParams, ToolHandler, ToolResult,
};
use serde_json::{json, Value};

const TOOLS: &str = r#"[
  {
    "name": "echo",
    "description": "Echo a message back",
    "inputSchema": {
      "type": "object",
      "properties": { "message": { "type": "string" } },
      "required": ["message"]
    }
  },
  {
    "name": "greet",
    "description": "Greet the authenticated user",
    "inputSchema": {
      "type": "object",
      "properties": { "style": { "type": "string", "enum": ["casual", "formal"] } }
    }
  }
]"#;

const RESOURCES: &str = r#"[
  {
    "uri": "config://app",
    "name": "config",
    "description": "Application configuration",
    "mimeType": "application/json"
  }
]"#;

/// A struct-based tool handler for the "echo" tool.
struct EchoHandler;

#[async_trait]
impl ToolHandler for EchoHandler {
    async fn call(&self, args: Value, _context: &RequestContext) -> Result<ToolResult, McpError> {
        let message = args
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("(empty)");
        Ok(text_result(format!("echo: {}", message)))
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let mut tools = parse_tools(TOOLS.as_bytes()).unwrap().into_iter();
    let echo = tools.next().unwrap();
    let greet = tools.next().unwrap();

    let config = Configuration::builder()
        .server_info("example-server", "0.1.0")
        .authenticate_with(|req| req.bearer_token() == Some("demo-token"))
        .build_context_with(|req| {
            json!({
                "user": req.header("x-user").unwrap_or("anonymous"),
                "path": req.path(),
            })
        })
        .tools(vec![
            RegisteredTool::new(echo, Arc::new(EchoHandler)),
            RegisteredTool::new(
                greet,
                // Closure-based handler reading the per-request context.
                FnToolHandler::new(|args: Value, ctx: RequestContext| async move {
                    let name = ctx
                        .get("user")
                        .and_then(|v| v.as_str())
                        .unwrap_or("world")
                        .to_string();
                    let greeting = match args.get("style").and_then(|v| v.as_str()) {
                        Some("formal") => format!("Good day, {}.", name),
                        _ => format!("Hey, {}!", name),
                    };
                    Ok(text_result(greeting))
                }),
            ),
        ])
        .resources(parse_resources(RESOURCES.as_bytes()).unwrap())
        .resources_read_handler(FnResourcesReadHandler::new(
            |params: ResourceReadParams, _ctx: RequestContext| async move {
                let uri = params.uri.unwrap_or_else(|| "config://app".into());
                Ok(vec![ResourceContent {
                    uri,
                    mime_type: Some("application/json".into()),
                    text: Some(r#"{"debug": false, "version": "1.0"}"#.into()),
                    blob: None,
                }])
            },
        ))
        .response_handler(|resp, _req| {
            let mut resp = resp.clone();
            resp.headers.insert("x-served-by", "mcpdispatch".parse().ok()?);
            Some(resp)
        })
        .build();

    let app = http_router(Dispatcher::new(config));
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    println!("MCP dispatcher listening on http://localhost:3000");
    println!("  POST /mcp     MCP JSON-RPC endpoint (Bearer demo-token)");
    println!("  GET  /healthz health check");
    axum::serve(listener, app).await.unwrap();
}
