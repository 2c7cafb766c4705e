use std::path::PathBuf;
use std::sync::Arc;

use odata_core::routing::{RouteConflict, RouteEntry, RouteRegistry};
use odata_core::services::{
    CatalogError,
    LoadMetadataFn,
    LoadMetadataFuture,
    ToolCatalog,
    ToolCatalogConfig,
};

use crate::config::{DaemonConfig, NamespaceConfig};

/// Route entry metadata key holding the metadata document path.
pub const METADATA_PATH_KEY: &str = "metadata_path";

pub fn build_routes(namespaces: &[NamespaceConfig]) -> Result<RouteRegistry, RouteConflict> {
    let mut registry = RouteRegistry::new();
    for namespace in namespaces {
        let mut entry = RouteEntry::new(namespace.name.clone(), &namespace.prefix);
        for (key, value) in &namespace.metadata_map {
            entry = entry.with_metadata(key.clone(), value.clone());
        }
        entry = entry.with_metadata(METADATA_PATH_KEY, namespace.metadata.display().to_string());
        registry.register(entry)?;
    }
    Ok(registry)
}

pub fn build_catalog(config: &DaemonConfig) -> ToolCatalog {
    let load: LoadMetadataFn = Arc::new(|entry: Arc<RouteEntry>| {
        Box::pin(async move {
            let path = entry
                .metadata
                .get(METADATA_PATH_KEY)
                .map(PathBuf::from)
                .ok_or_else(|| CatalogError::UnknownNamespace(entry.name.clone()))?;
            tokio::fs::read_to_string(&path).await.map_err(|err| {
                let path_display = path.display();
                CatalogError::LoadFailed(format!("{path_display}: {err}"))
            })
        }) as LoadMetadataFuture
    });

    let mut catalog_config =
        ToolCatalogConfig::new(load).with_options(config.generation.clone());
    if let Some(max_entries) = config.catalog_max {
        catalog_config = catalog_config.with_max_entries(max_entries);
    }
    ToolCatalog::new(catalog_config)
}
