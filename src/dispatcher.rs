//! The per-request dispatch pipeline.
//!
//! auth gate → method gate → context assembly → engine instantiation →
//! invocation (transport or direct JSON-RPC) → body normalization →
//! response post-processing.
//!
//! Every path ends in exactly one [`HttpResponse`]. Errors from the engine
//! or transport are rendered as JSON error bodies, and a panicking extension
//! yields a 500.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use futures::FutureExt;

use crate::config::{Configuration, DispatchMode, MethodPolicy};
use crate::context::RequestContext;
use crate::engine::Engine;
use crate::error::DispatchError;
use crate::request::McpRequest;
use crate::response::HttpResponse;
use crate::types::McpError;

/// Entry point for every inbound HTTP request.
///
/// Cheap to clone; all clones share one immutable [`Configuration`].
#[derive(Clone, Debug)]
pub struct Dispatcher {
    config: Arc<Configuration>,
}

impl Dispatcher {
    pub fn new(config: Configuration) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Dispatch one request. Never fails.
    ///
    /// The pipeline runs inline, so dropping the returned future cancels any
    /// tool or transport work still in flight.
    pub async fn handle(&self, request: McpRequest) -> HttpResponse {
        let request = Arc::new(request);
        tracing::debug!(method = %request.method(), path = request.path(), "dispatching request");

        match panic::catch_unwind(AssertUnwindSafe(|| self.check_gates(&request))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(method = %request.method(), path = request.path(), error = %e, "request rejected");
                return e.to_response();
            }
            Err(_) => {
                tracing::error!("authenticator panicked");
                return DispatchError::Internal.to_response();
            }
        }

        let response = match AssertUnwindSafe(self.process(&request)).catch_unwind().await {
            Ok(response) => response,
            Err(_) => {
                tracing::error!("dispatch pipeline panicked");
                DispatchError::Internal.to_response()
            }
        };

        let response =
            match panic::catch_unwind(AssertUnwindSafe(|| self.post_process(response, &request))) {
                Ok(response) => response,
                Err(_) => {
                    tracing::error!("response handler panicked");
                    DispatchError::Internal.to_response()
                }
            };

        tracing::debug!(status = response.status.as_u16(), "request dispatched");
        response
    }

    /// Context, engine and invocation. Errors are rendered, never returned.
    async fn process(&self, request: &Arc<McpRequest>) -> HttpResponse {
        let context = self.build_context(request);
        self.invoke(request, context).await.unwrap_or_else(|e| {
            if let DispatchError::Engine(message) = &e {
                tracing::error!(error = %message, "engine failed");
            }
            e.to_response()
        })
    }

    /// Authentication first, then the method policy.
    fn check_gates(&self, request: &McpRequest) -> Result<(), DispatchError> {
        if let Some(authenticate) = &self.config.authenticate_with {
            if !authenticate(request) {
                return Err(DispatchError::Unauthorized);
            }
        }

        if self.config.method_policy == MethodPolicy::PostOnly && request.method() != Method::POST
        {
            return Err(DispatchError::MethodNotAllowed);
        }

        Ok(())
    }

    fn build_context(&self, request: &Arc<McpRequest>) -> RequestContext {
        let mut context = RequestContext::new(Arc::clone(request));
        if let Some(build) = &self.config.build_context_with {
            context.merge(build(request));
        }
        context
    }

    fn build_engine(&self, context: RequestContext) -> Engine {
        let mut engine = Engine::builder(context)
            .server_info(&self.config.server_name, &self.config.server_version)
            .tools(self.config.tools.resolve())
            .prompts(self.config.prompts.resolve())
            .resources(self.config.resources.resolve())
            .build();

        if let Some(handler) = &self.config.resources_read_handler {
            engine.set_resources_read_handler(Arc::clone(handler));
        }
        engine
    }

    async fn invoke(
        &self,
        request: &McpRequest,
        context: RequestContext,
    ) -> Result<HttpResponse, DispatchError> {
        match &self.config.mode {
            DispatchMode::Transport(factory) => {
                let engine = Arc::new(self.build_engine(context));
                let transport = factory.build(engine);
                let response = transport
                    .handle_request(request)
                    .await
                    .map_err(|e| DispatchError::Engine(e.to_string()))?;
                Ok(response.into_http())
            }
            DispatchMode::Direct => {
                let engine = self.build_engine(context);
                match engine.handle_json(request.body()).await {
                    Ok(Some(json)) => Ok(HttpResponse::json_text(StatusCode::OK, json)),
                    Ok(None) => Ok(HttpResponse::empty(StatusCode::ACCEPTED)),
                    Err(McpError::Parse(details)) => {
                        tracing::debug!(%details, "request body is not JSON");
                        Err(DispatchError::InvalidJson)
                    }
                    Err(e) => Err(DispatchError::Engine(e.to_string())),
                }
            }
            DispatchMode::Unavailable => Err(DispatchError::Internal),
        }
    }

    fn post_process(&self, response: HttpResponse, request: &McpRequest) -> HttpResponse {
        match &self.config.response_handler {
            Some(handler) => handler(&response, request).unwrap_or(response),
            None => response,
        }
    }
}
