//! Dispatcher configuration.
//!
//! A [`Configuration`] is assembled once with [`ConfigurationBuilder`] before
//! serving starts and is read-only afterwards. Every extension point is a
//! single-method capability: a function value or a small trait object.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::engine::{RegisteredPrompt, RegisteredTool, ResourcesReadHandler};
use crate::request::McpRequest;
use crate::response::HttpResponse;
use crate::transport::TransportFactory;
use crate::types::Resource;

/// Decides whether a request may proceed.
pub type AuthenticateFn = Arc<dyn Fn(&McpRequest) -> bool + Send + Sync>;

/// Produces extra context entries for a request. Only JSON objects are merged.
pub type BuildContextFn = Arc<dyn Fn(&McpRequest) -> Value + Send + Sync>;

/// Post-processes the final response. `None` keeps the response as is.
pub type ResponseHandlerFn =
    Arc<dyn Fn(&HttpResponse, &McpRequest) -> Option<HttpResponse> + Send + Sync>;

/// Default cap on buffered request bodies.
pub const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// A capability catalog: fixed at setup, or produced fresh per request.
pub enum Catalog<T> {
    Static(Vec<T>),
    Provider(Arc<dyn Fn() -> Vec<T> + Send + Sync>),
}

impl<T: Clone> Catalog<T> {
    /// The concrete list for the current request.
    pub fn resolve(&self) -> Vec<T> {
        match self {
            Catalog::Static(items) => items.clone(),
            Catalog::Provider(produce) => produce(),
        }
    }
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Catalog::Static(Vec::new())
    }
}

impl<T> fmt::Debug for Catalog<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Catalog::Static(items) => write!(f, "Static({} items)", items.len()),
            Catalog::Provider(_) => f.write_str("Provider"),
        }
    }
}

/// Which HTTP methods reach the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodPolicy {
    /// Anything but POST is answered with 405.
    #[default]
    PostOnly,
    /// Every method is passed on; the transport decides.
    Any,
}

/// How the engine is invoked, settled once when the configuration is built.
#[derive(Clone)]
pub(crate) enum DispatchMode {
    Transport(Arc<dyn TransportFactory>),
    Direct,
    Unavailable,
}

/// Immutable dispatcher configuration.
pub struct Configuration {
    pub(crate) authenticate_with: Option<AuthenticateFn>,
    pub(crate) build_context_with: Option<BuildContextFn>,
    pub(crate) tools: Catalog<RegisteredTool>,
    pub(crate) prompts: Catalog<RegisteredPrompt>,
    pub(crate) resources: Catalog<Resource>,
    pub(crate) resources_read_handler: Option<Arc<dyn ResourcesReadHandler>>,
    pub(crate) response_handler: Option<ResponseHandlerFn>,
    pub(crate) method_policy: MethodPolicy,
    pub(crate) mode: DispatchMode,
    pub(crate) server_name: String,
    pub(crate) server_version: String,
    pub(crate) max_body_bytes: usize,
}

impl Configuration {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    pub fn method_policy(&self) -> MethodPolicy {
        self.method_policy
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// True when requests go through a transport rather than direct JSON-RPC.
    pub fn uses_transport(&self) -> bool {
        matches!(self.mode, DispatchMode::Transport(_))
    }
}

impl Default for Configuration {
    fn default() -> Self {
        ConfigurationBuilder::default().build()
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            DispatchMode::Transport(_) => "transport",
            DispatchMode::Direct => "direct",
            DispatchMode::Unavailable => "unavailable",
        };
        f.debug_struct("Configuration")
            .field("authenticate_with", &self.authenticate_with.is_some())
            .field("build_context_with", &self.build_context_with.is_some())
            .field("tools", &self.tools)
            .field("prompts", &self.prompts)
            .field("resources", &self.resources)
            .field("resources_read_handler", &self.resources_read_handler.is_some())
            .field("response_handler", &self.response_handler.is_some())
            .field("method_policy", &self.method_policy)
            .field("mode", &mode)
            .field("server_name", &self.server_name)
            .field("server_version", &self.server_version)
            .finish()
    }
}

/// Builder for [`Configuration`].
pub struct ConfigurationBuilder {
    authenticate_with: Option<AuthenticateFn>,
    build_context_with: Option<BuildContextFn>,
    tools: Catalog<RegisteredTool>,
    prompts: Catalog<RegisteredPrompt>,
    resources: Catalog<Resource>,
    resources_read_handler: Option<Arc<dyn ResourcesReadHandler>>,
    transport: Option<Arc<dyn TransportFactory>>,
    response_handler: Option<ResponseHandlerFn>,
    method_policy: MethodPolicy,
    direct_jsonrpc: bool,
    server_name: Option<String>,
    server_version: Option<String>,
    max_body_bytes: usize,
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self {
            authenticate_with: None,
            build_context_with: None,
            tools: Catalog::default(),
            prompts: Catalog::default(),
            resources: Catalog::default(),
            resources_read_handler: None,
            transport: None,
            response_handler: None,
            method_policy: MethodPolicy::default(),
            direct_jsonrpc: true,
            server_name: None,
            server_version: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ConfigurationBuilder {
    /// Gate every request on `f`; `false` answers 401.
    pub fn authenticate_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&McpRequest) -> bool + Send + Sync + 'static,
    {
        self.authenticate_with = Some(Arc::new(f));
        self
    }

    /// Add per-request context entries from `f`.
    pub fn build_context_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&McpRequest) -> Value + Send + Sync + 'static,
    {
        self.build_context_with = Some(Arc::new(f));
        self
    }

    pub fn tools(mut self, tools: Vec<RegisteredTool>) -> Self {
        self.tools = Catalog::Static(tools);
        self
    }

    /// Produce the tool catalog fresh for every request.
    pub fn tools_with<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Vec<RegisteredTool> + Send + Sync + 'static,
    {
        self.tools = Catalog::Provider(Arc::new(f));
        self
    }

    pub fn prompts(mut self, prompts: Vec<RegisteredPrompt>) -> Self {
        self.prompts = Catalog::Static(prompts);
        self
    }

    /// Produce the prompt catalog fresh for every request.
    pub fn prompts_with<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Vec<RegisteredPrompt> + Send + Sync + 'static,
    {
        self.prompts = Catalog::Provider(Arc::new(f));
        self
    }

    pub fn resources(mut self, resources: Vec<Resource>) -> Self {
        self.resources = Catalog::Static(resources);
        self
    }

    /// Produce the resource catalog fresh for every request.
    pub fn resources_with<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Vec<Resource> + Send + Sync + 'static,
    {
        self.resources = Catalog::Provider(Arc::new(f));
        self
    }

    pub fn resources_read_handler(mut self, handler: Arc<dyn ResourcesReadHandler>) -> Self {
        self.resources_read_handler = Some(handler);
        self
    }

    /// Route requests through transports built by `factory`.
    pub fn transport(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.transport = Some(factory);
        self
    }

    /// Post-process every response produced past the auth and method gates.
    pub fn response_handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&HttpResponse, &McpRequest) -> Option<HttpResponse> + Send + Sync + 'static,
    {
        self.response_handler = Some(Arc::new(f));
        self
    }

    pub fn method_policy(mut self, policy: MethodPolicy) -> Self {
        self.method_policy = policy;
        self
    }

    /// Allow or forbid direct JSON-RPC handling when no transport is usable.
    pub fn direct_jsonrpc(mut self, enabled: bool) -> Self {
        self.direct_jsonrpc = enabled;
        self
    }

    /// Set server name and version reported by `initialize`.
    pub fn server_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self.server_version = Some(version.into());
        self
    }

    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Build the configuration, settling the dispatch mode.
    pub fn build(self) -> Configuration {
        let mode = match self.transport {
            Some(factory) if factory.handles_requests() => {
                DispatchMode::Transport(factory)
            }
            Some(_) if self.direct_jsonrpc => {
                tracing::info!("transport does not handle requests, using direct JSON-RPC");
                DispatchMode::Direct
            }
            None if self.direct_jsonrpc => DispatchMode::Direct,
            _ => {
                tracing::warn!("no transport and direct JSON-RPC disabled, requests will fail");
                DispatchMode::Unavailable
            }
        };

        Configuration {
            authenticate_with: self.authenticate_with,
            build_context_with: self.build_context_with,
            tools: self.tools,
            prompts: self.prompts,
            resources: self.resources,
            resources_read_handler: self.resources_read_handler,
            response_handler: self.response_handler,
            method_policy: self.method_policy,
            mode,
            server_name: self.server_name.unwrap_or_else(|| crate::SERVER_NAME.into()),
            server_version: self
                .server_version
                .unwrap_or_else(|| crate::SERVER_VERSION.into()),
            max_body_bytes: self.max_body_bytes,
        }
    }
}
