//! Daemon entry point for the OData MCP gateway.
//!
//! Loads configuration from the environment, registers the configured
//! namespaces, and serves their generated tool sets over HTTP.

mod config;
mod registry;

use std::sync::Arc;

use odata_core::routing::RouteTable;
use odata_gateway::GatewayServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::DaemonConfig;
use crate::registry::{build_catalog, build_routes};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = DaemonConfig::from_args()?;
    let namespaces = config.load_namespaces()?;
    let registry = build_routes(&namespaces)?;
    info!(
        namespaces = registry.len(),
        file = %config.namespaces_file.display(),
        "registered namespaces"
    );

    let routes = Arc::new(RouteTable::from_registry(&registry));
    let catalog = build_catalog(&config);
    GatewayServer::new(routes, catalog, config.gateway_config())
        .serve()
        .await
}
