use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use odata_model::SchemaModel;
use serde_json::Value;
use tokio::sync::{OnceCell, RwLock};
use tracing::{info, warn};

use crate::generator::{GenerationOptions, GenerationReport, ToolDefinition, generate};
use crate::parsers::{CsdlXmlParser, MetadataError};
use crate::routing::RouteEntry;

pub type LoadMetadataFuture =
    Pin<Box<dyn Future<Output = Result<String, CatalogError>> + Send + 'static>>;
pub type LoadMetadataFn =
    Arc<dyn Fn(Arc<RouteEntry>) -> LoadMetadataFuture + Send + Sync + 'static>;

/// Configuration for the tool catalog cache and its metadata loader.
#[derive(Clone)]
pub struct ToolCatalogConfig {
    pub options: GenerationOptions,
    pub max_entries: Option<usize>,
    pub load_metadata: LoadMetadataFn,
}

impl ToolCatalogConfig {
    pub fn new(load_metadata: LoadMetadataFn) -> Self {
        Self {
            options: GenerationOptions::default(),
            max_entries: None,
            load_metadata,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub const fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }
}

#[derive(Debug)]
pub enum CatalogError {
    UnknownNamespace(String),
    LoadFailed(String),
    Metadata(MetadataError),
    CapacityReached { max: usize },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNamespace(namespace) => write!(f, "unknown namespace: {namespace}"),
            Self::LoadFailed(message) => write!(f, "failed to load metadata: {message}"),
            Self::Metadata(err) => write!(f, "invalid metadata: {err}"),
            Self::CapacityReached { max } => {
                write!(f, "tool catalog capacity reached (max {max})")
            }
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Metadata(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MetadataError> for CatalogError {
    fn from(err: MetadataError) -> Self {
        Self::Metadata(err)
    }
}

impl From<tokio::task::JoinError> for CatalogError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::LoadFailed(err.to_string())
    }
}

/// Generated tools for one namespace, with the model they came from.
#[derive(Debug)]
pub struct ToolBatch {
    pub namespace: String,
    pub model: Arc<SchemaModel>,
    pub report: GenerationReport,
    pub generated_at: DateTime<Utc>,
}

impl ToolBatch {
    #[must_use]
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.report.tools
    }

    #[must_use]
    pub fn tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.report.tool(name)
    }

    /// Name, description and input schema of every tool.
    #[must_use]
    pub fn listings(&self) -> Vec<Value> {
        self.report.tools.iter().map(ToolDefinition::to_listing).collect()
    }
}

/// Per-namespace cache of generated tool batches.
///
/// Concurrent first callers for a namespace share one load and generation.
#[derive(Clone)]
pub struct ToolCatalog {
    inner: Arc<ToolCatalogInner>,
}

struct ToolCatalogInner {
    entries: RwLock<HashMap<String, Arc<CatalogEntry>>>,
    config: ToolCatalogConfig,
}

struct CatalogEntry {
    batch: OnceCell<Arc<ToolBatch>>,
}

impl ToolCatalog {
    pub fn new(config: ToolCatalogConfig) -> Self {
        Self {
            inner: Arc::new(ToolCatalogInner {
                entries: RwLock::new(HashMap::new()),
                config,
            }),
        }
    }

    #[must_use]
    pub fn options(&self) -> &GenerationOptions {
        &self.inner.config.options
    }

    /// Returns the cached batch for `entry`, loading and generating it on first use.
    ///
    /// # Errors
    /// Returns `CatalogError` when the catalog is full, the metadata cannot be
    /// loaded, or the document does not parse. Failed generations are not
    /// cached.
    pub async fn get_or_generate(
        &self,
        entry: &Arc<RouteEntry>,
    ) -> Result<Arc<ToolBatch>, CatalogError> {
        let slot = {
            let map = self.inner.entries.read().await;
            map.get(&entry.name).cloned()
        };

        let slot = match slot {
            Some(slot) => slot,
            None => {
                let mut map = self.inner.entries.write().await;
                if let Some(slot) = map.get(&entry.name).cloned() {
                    slot
                } else {
                    if let Some(max_entries) = self.inner.config.max_entries
                        && map.len() >= max_entries
                    {
                        return Err(CatalogError::CapacityReached { max: max_entries });
                    }
                    let slot = Arc::new(CatalogEntry {
                        batch: OnceCell::new(),
                    });
                    map.insert(entry.name.clone(), Arc::clone(&slot));
                    slot
                }
            }
        };

        if let Some(batch) = slot.batch.get() {
            return Ok(Arc::clone(batch));
        }

        // Generation runs detached so a caller that stops waiting does not
        // cancel it; later callers pick up the filled slot.
        let catalog = self.clone();
        let entry = Arc::clone(entry);
        tokio::spawn(async move { catalog.fill(slot, entry).await }).await?
    }

    /// Cached batch for a namespace, without triggering generation.
    pub async fn cached(&self, namespace: &str) -> Option<Arc<ToolBatch>> {
        let map = self.inner.entries.read().await;
        map.get(namespace)
            .and_then(|slot| slot.batch.get())
            .cloned()
    }

    /// Drops the cached batch for a namespace. Returns whether one was present.
    pub async fn invalidate(&self, namespace: &str) -> bool {
        let mut map = self.inner.entries.write().await;
        let removed = map.remove(namespace).is_some();
        if removed {
            info!(namespace, "invalidated tool batch");
        }
        removed
    }

    pub async fn invalidate_all(&self) -> usize {
        let mut map = self.inner.entries.write().await;
        let removed = map.len();
        map.clear();
        info!(removed, "invalidated all tool batches");
        removed
    }

    /// Namespaces with a generated batch, sorted by name.
    pub async fn cached_namespaces(&self) -> Vec<String> {
        let map = self.inner.entries.read().await;
        let mut names: Vec<String> = map
            .iter()
            .filter(|(_, slot)| slot.batch.initialized())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    async fn fill(
        &self,
        slot: Arc<CatalogEntry>,
        entry: Arc<RouteEntry>,
    ) -> Result<Arc<ToolBatch>, CatalogError> {
        let result = slot
            .batch
            .get_or_try_init(|| self.build(Arc::clone(&entry)))
            .await
            .map(Arc::clone);

        if result.is_err() {
            let mut map = self.inner.entries.write().await;
            let stale = map.get(&entry.name).is_some_and(|current| {
                Arc::ptr_eq(current, &slot) && !current.batch.initialized()
            });
            if stale {
                map.remove(&entry.name);
            }
        }
        result
    }

    async fn build(&self, entry: Arc<RouteEntry>) -> Result<Arc<ToolBatch>, CatalogError> {
        let started = Instant::now();
        let namespace = entry.name.clone();
        let load_metadata = Arc::clone(&self.inner.config.load_metadata);
        let text = (load_metadata)(entry).await.inspect_err(|err| {
            warn!(namespace = %namespace, error = %err, "metadata load failed");
        })?;

        let options = self.inner.config.options.clone();
        let (model, report) = tokio::task::spawn_blocking(move || {
            let model = CsdlXmlParser::parse(&text)?;
            let report = generate(&model, &options);
            Ok::<_, MetadataError>((model, report))
        })
        .await?
        .inspect_err(|err| {
            warn!(namespace = %namespace, error = %err, "metadata parse failed");
        })?;

        info!(
            namespace = %namespace,
            tools = report.tools.len(),
            skipped = report.skipped.len(),
            truncated = report.truncated,
            warnings = model.warnings.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "generated tool batch"
        );
        Ok(Arc::new(ToolBatch {
            namespace,
            model: Arc::new(model),
            report,
            generated_at: Utc::now(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures::future::join_all;

    const METADATA: &str = r#"<Schema Namespace="Demo">
  <EntityType Name="Product">
    <Key><PropertyRef Name="Id"/></Key>
    <Property Name="Id" Type="Edm.Int32" Nullable="false"/>
  </EntityType>
  <EntityContainer Name="Service">
    <EntitySet Name="Products" EntityType="Demo.Product"/>
  </EntityContainer>
</Schema>"#;

    fn build_test_catalog(calls: Arc<AtomicUsize>, text: &'static str) -> ToolCatalog {
        build_slow_catalog(calls, text, Duration::from_millis(10))
    }

    fn build_slow_catalog(
        calls: Arc<AtomicUsize>,
        text: &'static str,
        delay: Duration,
    ) -> ToolCatalog {
        let load = Arc::new(move |_entry: Arc<RouteEntry>| {
            let calls = calls.clone();
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                Ok::<_, CatalogError>(text.to_string())
            }) as LoadMetadataFuture
        });
        ToolCatalog::new(ToolCatalogConfig::new(load))
    }

    fn entry(name: &str) -> Arc<RouteEntry> {
        Arc::new(RouteEntry::new(name, name))
    }

    #[tokio::test]
    async fn catalog_single_flight() {
        let calls = Arc::new(AtomicUsize::new(0));
        let catalog = build_test_catalog(calls.clone(), METADATA);
        let alpha = entry("alpha");

        let results = join_all((0..8).map(|_| {
            let catalog = catalog.clone();
            let alpha = alpha.clone();
            async move { catalog.get_or_generate(&alpha).await }
        }))
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let batches: Vec<Arc<ToolBatch>> = results
            .into_iter()
            .map(|result| result.expect("generation succeeds"))
            .collect();
        assert!(batches.iter().all(|batch| Arc::ptr_eq(batch, &batches[0])));
        assert!(batches[0].tool("Products_get").is_some());
    }

    #[tokio::test]
    async fn namespaces_generate_independently() {
        let calls = Arc::new(AtomicUsize::new(0));
        let catalog = build_test_catalog(calls.clone(), METADATA);

        let alpha = entry("alpha");
        let beta = entry("beta");
        let (left, right) = tokio::join!(
            catalog.get_or_generate(&alpha),
            catalog.get_or_generate(&beta)
        );
        assert!(left.is_ok());
        assert!(right.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(catalog.cached_namespaces().await, ["alpha", "beta"]);
    }

    #[tokio::test]
    async fn invalidation_forces_regeneration() {
        let calls = Arc::new(AtomicUsize::new(0));
        let catalog = build_test_catalog(calls.clone(), METADATA);
        let alpha = entry("alpha");

        let first = catalog.get_or_generate(&alpha).await.expect("first");
        assert!(catalog.invalidate("alpha").await);
        assert!(!catalog.invalidate("alpha").await);
        assert!(catalog.cached("alpha").await.is_none());

        let second = catalog.get_or_generate(&alpha).await.expect("second");
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(catalog.invalidate_all().await, 1);
    }

    #[tokio::test]
    async fn parse_failures_are_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let catalog = build_test_catalog(calls.clone(), "<Schema");
        let alpha = entry("alpha");

        let err = catalog.get_or_generate(&alpha).await.unwrap_err();
        assert!(matches!(err, CatalogError::Metadata(MetadataError::Schema(_))));
        assert!(catalog.get_or_generate(&alpha).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(catalog.cached_namespaces().await.is_empty());
    }

    #[tokio::test]
    async fn capacity_is_enforced() {
        let load = Arc::new(|_entry: Arc<RouteEntry>| {
            Box::pin(async { Ok::<_, CatalogError>(METADATA.to_string()) }) as LoadMetadataFuture
        });
        let catalog = ToolCatalog::new(ToolCatalogConfig::new(load).with_max_entries(1));

        assert!(catalog.get_or_generate(&entry("alpha")).await.is_ok());
        assert!(catalog.get_or_generate(&entry("alpha")).await.is_ok());
        let err = catalog.get_or_generate(&entry("beta")).await.unwrap_err();
        assert!(matches!(err, CatalogError::CapacityReached { max: 1 }));
    }

    #[tokio::test]
    async fn failed_namespaces_release_capacity() {
        let load = Arc::new(|entry: Arc<RouteEntry>| {
            Box::pin(async move {
                if entry.name == "broken" {
                    Ok::<_, CatalogError>("<Schema".to_string())
                } else {
                    Ok(METADATA.to_string())
                }
            }) as LoadMetadataFuture
        });
        let catalog = ToolCatalog::new(ToolCatalogConfig::new(load).with_max_entries(1));

        let err = catalog.get_or_generate(&entry("broken")).await.unwrap_err();
        assert!(matches!(err, CatalogError::Metadata(_)));
        assert!(catalog.cached_namespaces().await.is_empty());

        let good = catalog.get_or_generate(&entry("good")).await;
        assert!(good.is_ok(), "unexpected error: {:?}", good.err());
        assert_eq!(catalog.cached_namespaces().await, ["good"]);
        assert_eq!(catalog.invalidate_all().await, 1);
    }

    #[tokio::test]
    async fn abandoned_callers_do_not_cancel_generation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let catalog = build_slow_catalog(calls.clone(), METADATA, Duration::from_millis(100));
        let alpha = entry("alpha");

        for _ in 0..3 {
            let attempt = tokio::time::timeout(
                Duration::from_millis(20),
                catalog.get_or_generate(&alpha),
            )
            .await;
            assert!(attempt.is_err(), "caller should stop waiting");
        }

        let batch = catalog.get_or_generate(&alpha).await.expect("generation completes");
        assert!(batch.tool("Products_get").is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(catalog.cached("alpha").await.is_some());
    }
}
