use clap::{Parser, builder::BoolishValueParser};
use odata_core::generator::{GenerationOptions, NamingPattern, naming::DEFAULT_NAMING_PATTERN};
use odata_gateway::GatewayConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:4020";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_TOOL_COUNT: usize = odata_core::generator::DEFAULT_MAX_TOOL_COUNT;

#[derive(Parser, Debug)]
#[command(name = "odata-mcpd", version, about = "OData MCP gateway daemon.")]
#[allow(clippy::struct_excessive_bools)]
struct CliArgs {
    #[arg(long, env = "ODATA_HTTP_ADDR", default_value = DEFAULT_HTTP_ADDR)]
    http_addr: SocketAddr,

    /// TOML file listing `[[namespace]]` tables.
    #[arg(long, env = "ODATA_NAMESPACES")]
    namespaces: Option<PathBuf>,

    #[arg(
        long,
        env = "ODATA_REQUEST_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
    )]
    request_timeout_secs: u64,

    #[arg(long, env = "ODATA_MAX_TOOL_COUNT", default_value_t = DEFAULT_MAX_TOOL_COUNT)]
    max_tool_count: usize,

    #[arg(long, env = "ODATA_NAMING_PATTERN", default_value = DEFAULT_NAMING_PATTERN)]
    naming_pattern: String,

    #[arg(long, env = "ODATA_CATALOG_MAX")]
    catalog_max: Option<usize>,

    #[arg(
        long,
        env = "ODATA_CRUD_TOOLS",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    crud_tools: bool,

    #[arg(
        long,
        env = "ODATA_QUERY_TOOLS",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    query_tools: bool,

    #[arg(
        long,
        env = "ODATA_NAVIGATION_TOOLS",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    navigation_tools: bool,

    #[arg(
        long,
        env = "ODATA_OPERATION_TOOLS",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    operation_tools: bool,

    #[arg(
        long,
        env = "ODATA_INCLUDE_EXAMPLES",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    include_examples: bool,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub http_addr: SocketAddr,
    pub namespaces_file: PathBuf,
    pub request_timeout: Duration,
    pub catalog_max: Option<usize>,
    pub generation: GenerationOptions,
}

/// One `[[namespace]]` table of the namespaces file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamespaceConfig {
    pub name: String,
    #[serde(default)]
    pub prefix: String,
    /// Metadata document path; relative paths resolve against the file's directory.
    pub metadata: PathBuf,
    #[serde(default)]
    pub metadata_map: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct NamespacesFile {
    #[serde(default, rename = "namespace")]
    namespaces: Vec<NamespaceConfig>,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingSetting(&'static str),
    InvalidSetting { name: &'static str, value: String },
    Io { path: PathBuf, source: std::io::Error },
    Toml(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting(name) => write!(f, "missing required setting: {name}"),
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
            Self::Io { path, source } => {
                let path_display = path.display();
                write!(f, "failed to read {path_display}: {source}")
            }
            Self::Toml(err) => write!(f, "invalid namespaces file: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Toml(err) => Some(err),
            Self::MissingSetting(_) | Self::InvalidSetting { .. } => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::Toml(err)
    }
}

impl DaemonConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::new(self.http_addr).with_request_timeout(self.request_timeout)
    }

    /// Reads and validates the namespaces file.
    pub fn load_namespaces(&self) -> Result<Vec<NamespaceConfig>, ConfigError> {
        let text = std::fs::read_to_string(&self.namespaces_file).map_err(|source| {
            ConfigError::Io {
                path: self.namespaces_file.clone(),
                source,
            }
        })?;
        let base_dir = self
            .namespaces_file
            .parent()
            .unwrap_or_else(|| Path::new("."));
        parse_namespaces(&text, base_dir)
    }
}

impl TryFrom<CliArgs> for DaemonConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let namespaces_file = args
            .namespaces
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or(ConfigError::MissingSetting("ODATA_NAMESPACES"))?;

        if args.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "ODATA_REQUEST_TIMEOUT_SECS",
                value: args.request_timeout_secs.to_string(),
            });
        }
        if args.max_tool_count == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "ODATA_MAX_TOOL_COUNT",
                value: args.max_tool_count.to_string(),
            });
        }
        let naming_pattern =
            NamingPattern::new(args.naming_pattern.trim()).map_err(|err| {
                ConfigError::InvalidSetting {
                    name: "ODATA_NAMING_PATTERN",
                    value: format!("{} ({err})", args.naming_pattern),
                }
            })?;

        let generation = GenerationOptions::default()
            .with_crud_tools(args.crud_tools)
            .with_query_tools(args.query_tools)
            .with_navigation_tools(args.navigation_tools)
            .with_operation_tools(args.operation_tools)
            .with_examples(args.include_examples)
            .with_max_tool_count(args.max_tool_count)
            .with_naming_pattern(naming_pattern);

        Ok(Self {
            http_addr: args.http_addr,
            namespaces_file,
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            catalog_max: args.catalog_max,
            generation,
        })
    }
}

/// Parses a namespaces file, resolving relative metadata paths against `base_dir`.
pub fn parse_namespaces(text: &str, base_dir: &Path) -> Result<Vec<NamespaceConfig>, ConfigError> {
    let file: NamespacesFile = toml::from_str(text)?;
    if file.namespaces.is_empty() {
        return Err(ConfigError::MissingSetting("namespace"));
    }

    file.namespaces
        .into_iter()
        .map(|mut namespace| {
            namespace.name = namespace.name.trim().to_string();
            if namespace.name.is_empty() {
                return Err(ConfigError::InvalidSetting {
                    name: "namespace.name",
                    value: namespace.name,
                });
            }
            if namespace.metadata.is_relative() {
                namespace.metadata = base_dir.join(&namespace.metadata);
            }
            Ok(namespace)
        })
        .collect()
}
