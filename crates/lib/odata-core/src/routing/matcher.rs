use std::{collections::HashMap, sync::Arc};

use arc_swap::ArcSwap;
use tracing::info;

use super::parser::{McpCommand, parse_route};
use super::registry::{RouteEntry, RouteRegistry, normalize_prefix};

/// Lookup keys up to this length are case-folded without allocating.
const FOLD_BUFFER_LEN: usize = 128;

/// A resolved route: the registered entry and the classified command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'p> {
    pub entry: Arc<RouteEntry>,
    pub command: McpCommand<'p>,
}

/// Immutable lookup tables built once from a registry snapshot.
#[derive(Debug, Default)]
pub struct RouteMatcher {
    by_prefix: HashMap<Box<str>, Arc<RouteEntry>>,
    by_mount_path: HashMap<Box<str>, Arc<RouteEntry>>,
    root: Option<Arc<RouteEntry>>,
    entries: Vec<Arc<RouteEntry>>,
}

impl RouteMatcher {
    #[must_use]
    pub fn build(registry: &RouteRegistry) -> Self {
        let mut matcher = Self::default();
        for entry in registry.entries() {
            if entry.is_root() {
                matcher.root = Some(Arc::clone(entry));
            } else {
                matcher.by_prefix.insert(
                    entry.source_prefix.to_ascii_lowercase().into_boxed_str(),
                    Arc::clone(entry),
                );
            }
            matcher.by_mount_path.insert(
                entry.mount_path.to_ascii_lowercase().into_boxed_str(),
                Arc::clone(entry),
            );
            matcher.entries.push(Arc::clone(entry));
        }
        info!(routes = matcher.entries.len(), "built route matcher");
        matcher
    }

    /// Resolves a request path to an entry and command.
    ///
    /// An empty namespace resolves to the root entry. Lookups are ASCII
    /// case-insensitive.
    #[must_use]
    pub fn try_match<'p>(&self, path: &'p str) -> Option<RouteMatch<'p>> {
        let route = parse_route(path)?;
        let entry = if route.is_root() {
            self.root.as_ref()?
        } else {
            with_folded(route.namespace, |key| self.by_prefix.get(key))?
        };
        Some(RouteMatch {
            entry: Arc::clone(entry),
            command: route.classify(),
        })
    }

    #[must_use]
    pub fn by_prefix(&self, prefix: &str) -> Option<&Arc<RouteEntry>> {
        let prefix = normalize_prefix(prefix);
        if prefix.is_empty() {
            return self.root.as_ref();
        }
        with_folded(&prefix, |key| self.by_prefix.get(key))
    }

    #[must_use]
    pub fn by_mount_path(&self, mount_path: &str) -> Option<&Arc<RouteEntry>> {
        let mount_path = mount_path.trim_end_matches('/');
        with_folded(mount_path, |key| self.by_mount_path.get(key))
    }

    #[must_use]
    pub fn entries(&self) -> &[Arc<RouteEntry>] {
        &self.entries
    }

    #[must_use]
    pub fn root(&self) -> Option<&Arc<RouteEntry>> {
        self.root.as_ref()
    }
}

/// Runs `lookup` with `key` ASCII-lowercased and repeated `/` collapsed,
/// building the key on the stack when it fits.
fn with_folded<R>(key: &str, lookup: impl FnOnce(&str) -> R) -> R {
    if !key.bytes().any(|byte| byte.is_ascii_uppercase()) && !key.contains("//") {
        return lookup(key);
    }
    if key.len() <= FOLD_BUFFER_LEN {
        let mut buffer = [0_u8; FOLD_BUFFER_LEN];
        let len = buffer
            .iter_mut()
            .zip(folded_bytes(key))
            .fold(0, |len, (slot, byte)| {
                *slot = byte;
                len + 1
            });
        if let Ok(folded) = std::str::from_utf8(&buffer[..len]) {
            return lookup(folded);
        }
    }
    match String::from_utf8(folded_bytes(key).collect()) {
        Ok(folded) => lookup(&folded),
        Err(_) => lookup(key),
    }
}

fn folded_bytes(key: &str) -> impl Iterator<Item = u8> + '_ {
    let bytes = key.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|&(index, &byte)| !(byte == b'/' && index > 0 && bytes[index - 1] == b'/'))
        .map(|(_, byte)| byte.to_ascii_lowercase())
}

/// Shared, atomically swappable matcher snapshot.
///
/// Readers never block; a reconfiguration builds a new matcher and swaps it in
/// whole.
#[derive(Debug)]
pub struct RouteTable {
    current: ArcSwap<RouteMatcher>,
}

impl RouteTable {
    #[must_use]
    pub fn new(matcher: RouteMatcher) -> Self {
        Self {
            current: ArcSwap::from_pointee(matcher),
        }
    }

    #[must_use]
    pub fn from_registry(registry: &RouteRegistry) -> Self {
        Self::new(RouteMatcher::build(registry))
    }

    /// Current snapshot.
    #[must_use]
    pub fn load(&self) -> Arc<RouteMatcher> {
        self.current.load_full()
    }

    /// Swaps in a new snapshot and returns the previous one.
    pub fn replace(&self, matcher: RouteMatcher) -> Arc<RouteMatcher> {
        self.current.swap(Arc::new(matcher))
    }

    pub fn rebuild(&self, registry: &RouteRegistry) -> Arc<RouteMatcher> {
        self.replace(RouteMatcher::build(registry))
    }

    #[must_use]
    pub fn try_match<'p>(&self, path: &'p str) -> Option<RouteMatch<'p>> {
        self.current.load().try_match(path)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(RouteMatcher::default())
    }
}
