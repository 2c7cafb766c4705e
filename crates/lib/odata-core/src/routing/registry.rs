use std::{borrow::Cow, collections::BTreeMap, error::Error, fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::parser::{MCP_SEGMENT, parse_route};

/// A backend namespace and the mount path its tools are served under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub name: String,
    /// Normalized source prefix; empty for the root namespace.
    pub source_prefix: String,
    pub mount_path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl RouteEntry {
    pub fn new(name: impl Into<String>, source_prefix: &str) -> Self {
        let source_prefix = normalize_prefix(source_prefix).into_owned();
        let mount_path = build_url(&source_prefix, "");
        Self {
            name: name.into(),
            source_prefix,
            mount_path,
            metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.source_prefix.is_empty()
    }

    /// Endpoint URL for a command under this entry's mount path.
    #[must_use]
    pub fn url(&self, command: &str) -> String {
        build_url(&self.source_prefix, command)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteConflict {
    DuplicatePrefix { prefix: String, existing: String },
    DuplicateName(String),
    DuplicateRoot { existing: String },
    /// The prefix contains an `mcp` segment and could never be matched.
    ReservedSegment { prefix: String },
}

impl fmt::Display for RouteConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicatePrefix { prefix, existing } => {
                write!(f, "prefix {prefix} is already registered by {existing}")
            }
            Self::DuplicateName(name) => write!(f, "namespace {name} is already registered"),
            Self::DuplicateRoot { existing } => {
                write!(f, "root namespace is already registered by {existing}")
            }
            Self::ReservedSegment { prefix } => {
                write!(f, "prefix {prefix} contains the reserved {MCP_SEGMENT} segment")
            }
        }
    }
}

impl Error for RouteConflict {}

/// A route exposed by a hosting framework, translated by `extend_from_host`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRoute {
    pub name: String,
    pub path: String,
}

/// Insertion-ordered set of route entries, unique by normalized prefix and name.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    entries: Vec<Arc<RouteEntry>>,
}

impl RouteRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entry.
    ///
    /// # Errors
    /// Returns `RouteConflict` when the name, the prefix (compared ASCII
    /// case-insensitively) or the root slot is already taken, or when the
    /// prefix contains an `mcp` segment.
    pub fn register(&mut self, entry: RouteEntry) -> Result<Arc<RouteEntry>, RouteConflict> {
        if entry
            .source_prefix
            .split('/')
            .any(|segment| segment.eq_ignore_ascii_case(MCP_SEGMENT))
        {
            return Err(RouteConflict::ReservedSegment {
                prefix: entry.source_prefix,
            });
        }
        if self.get(&entry.name).is_some() {
            return Err(RouteConflict::DuplicateName(entry.name));
        }
        if let Some(existing) = self
            .entries
            .iter()
            .find(|existing| existing.source_prefix.eq_ignore_ascii_case(&entry.source_prefix))
        {
            return Err(if entry.is_root() {
                RouteConflict::DuplicateRoot {
                    existing: existing.name.clone(),
                }
            } else {
                RouteConflict::DuplicatePrefix {
                    prefix: entry.source_prefix,
                    existing: existing.name.clone(),
                }
            });
        }

        debug!(name = %entry.name, mount = %entry.mount_path, "registered route");
        let entry = Arc::new(entry);
        self.entries.push(Arc::clone(&entry));
        Ok(entry)
    }

    /// Registers every host route that contains an `mcp` segment, using the
    /// part before it as the source prefix. Other routes are ignored.
    ///
    /// # Errors
    /// Stops at the first `RouteConflict`; entries registered before it stay.
    pub fn extend_from_host<I>(&mut self, routes: I) -> Result<usize, RouteConflict>
    where
        I: IntoIterator<Item = HostRoute>,
    {
        let mut added = 0;
        for route in routes {
            let Some(parsed) = parse_route(&route.path) else {
                debug!(path = %route.path, "host route has no mcp segment");
                continue;
            };
            let entry = RouteEntry::new(route.name.clone(), parsed.namespace)
                .with_metadata("host_path", route.path.clone());
            self.register(entry)?;
            added += 1;
        }
        Ok(added)
    }

    #[must_use]
    pub fn entries(&self) -> &[Arc<RouteEntry>] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<RouteEntry>> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    #[must_use]
    pub fn root(&self) -> Option<&Arc<RouteEntry>> {
        self.entries.iter().find(|entry| entry.is_root())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Trims whitespace and path separators from a prefix and collapses repeated
/// separators inside it.
#[must_use]
pub fn normalize_prefix(prefix: &str) -> Cow<'_, str> {
    let trimmed = prefix.trim().trim_matches('/');
    if !trimmed.contains("//") {
        return Cow::Borrowed(trimmed);
    }
    Cow::Owned(
        trimmed
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/"),
    )
}

/// Builds `/<prefix>/mcp[/<command>]`, or `/mcp[/<command>]` for an empty prefix.
#[must_use]
pub fn build_url(prefix: &str, command: &str) -> String {
    let prefix = normalize_prefix(prefix);
    let command = command.trim().trim_matches('/');
    let mut url = String::with_capacity(prefix.len() + command.len() + MCP_SEGMENT.len() + 3);
    if !prefix.is_empty() {
        url.push('/');
        url.push_str(&prefix);
    }
    url.push('/');
    url.push_str(MCP_SEGMENT);
    if !command.is_empty() {
        url.push('/');
        url.push_str(command);
    }
    url
}
