//! HTTP host adapter for odata-mcp.
//!
//! Feeds request paths to the route table and answers Info, Tools and
//! `ToolInfo` commands from the per-namespace tool catalog.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Json, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use odata_core::generator::ToolDefinition;
use odata_core::routing::{McpCommand, RouteEntry, RouteTable};
use odata_core::services::{CatalogError, ToolBatch, ToolCatalog};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};

/// Configuration for the gateway HTTP server.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub addr: SocketAddr,
    pub request_timeout: Duration,
}

impl GatewayConfig {
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            request_timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 4020)))
    }
}

/// HTTP gateway wrapper.
pub struct GatewayServer {
    config: GatewayConfig,
    state: AppState,
}

impl GatewayServer {
    #[must_use]
    pub const fn new(routes: Arc<RouteTable>, catalog: ToolCatalog, config: GatewayConfig) -> Self {
        let state = AppState {
            routes,
            catalog,
            request_timeout: config.request_timeout,
        };
        Self { config, state }
    }

    #[must_use]
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Runs the HTTP server until shutdown.
    ///
    /// # Errors
    /// Returns any listener or server error.
    pub async fn serve(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = self.config.addr;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let app = build_router(self.state);

        info!("odata-gateway listening on {addr}");
        axum::serve(listener, app).await?;
        Ok(())
    }
}

#[derive(Clone)]
struct AppState {
    routes: Arc<RouteTable>,
    catalog: ToolCatalog,
    request_timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn not_implemented(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_IMPLEMENTED,
            message: message.into(),
        }
    }

    fn timeout() -> Self {
        Self {
            status: StatusCode::REQUEST_TIMEOUT,
            message: "tool generation timed out".to_string(),
        }
    }

    fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }

    fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: message.into(),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnknownNamespace(_) => Self::not_found(err.to_string()),
            CatalogError::LoadFailed(_) | CatalogError::Metadata(_) => {
                Self::bad_gateway(err.to_string())
            }
            CatalogError::CapacityReached { .. } => Self::unavailable(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = Json(ErrorResponse { error: self.message });
        (self.status, payload).into_response()
    }
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .fallback(dispatch)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn dispatch(State(state): State<AppState>, uri: Uri) -> Result<Response, ApiError> {
    let path = uri.path();
    let Some(found) = state.routes.try_match(path) else {
        debug!(path, "no namespace matched");
        return Err(ApiError::not_found(format!("no namespace serves {path}")));
    };

    match found.command {
        McpCommand::Info => {
            let cached = state.catalog.cached(&found.entry.name).await;
            Ok(Json(info_payload(&found.entry, cached.as_deref())).into_response())
        }
        McpCommand::Tools => {
            let batch = batch_for(&state, &found.entry).await?;
            Ok(Json(tools_payload(&batch)).into_response())
        }
        McpCommand::ToolInfo(name) => {
            let batch = batch_for(&state, &found.entry).await?;
            let tool: &ToolDefinition = batch.tool(name).ok_or_else(|| {
                ApiError::not_found(format!("unknown tool {name} in {}", found.entry.name))
            })?;
            Ok(Json(tool).into_response())
        }
        McpCommand::ToolsExecute => Err(ApiError::not_implemented(
            "tool execution is handled by an external client",
        )),
        McpCommand::Unknown(command) => {
            debug!(path, command, "unknown command");
            Err(ApiError::not_found(format!("unknown command: {command}")))
        }
    }
}

async fn batch_for(state: &AppState, entry: &Arc<RouteEntry>) -> Result<Arc<ToolBatch>, ApiError> {
    let batch = tokio::time::timeout(state.request_timeout, state.catalog.get_or_generate(entry))
        .await
        .map_err(|_| ApiError::timeout())??;
    Ok(batch)
}

fn info_payload(entry: &RouteEntry, batch: Option<&ToolBatch>) -> Value {
    json!({
        "name": entry.name,
        "prefix": entry.source_prefix,
        "mountPath": entry.mount_path,
        "metadata": entry.metadata,
        "endpoints": {
            "info": entry.url("info"),
            "tools": entry.url("tools"),
            "execute": entry.url("tools/execute"),
        },
        "toolCount": batch.map(|batch| batch.tools().len()),
        "generatedAt": batch.map(|batch| batch.generated_at),
    })
}

fn tools_payload(batch: &ToolBatch) -> Value {
    json!({
        "namespace": batch.namespace,
        "tools": batch.listings(),
        "skipped": batch.report.skipped,
        "truncated": batch.report.truncated,
    })
}
