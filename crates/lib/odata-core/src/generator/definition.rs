use std::fmt;

use odata_model::QualifiedName;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::contract::InputContract;

/// Kind of operation a generated tool performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Query,
    Get,
    Create,
    Update,
    Delete,
    Navigate,
    Action,
    Function,
}

impl ToolKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Navigate => "navigate",
            Self::Action => "action",
            Self::Function => "function",
        }
    }

    #[must_use]
    pub const fn method(self) -> HttpMethod {
        match self {
            Self::Query | Self::Get | Self::Navigate | Self::Function => HttpMethod::Get,
            Self::Create | Self::Action => HttpMethod::Post,
            Self::Update => HttpMethod::Patch,
            Self::Delete => HttpMethod::Delete,
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP method an executor uses to call the backend for a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

/// A self-describing callable operation derived from the schema model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub kind: ToolKind,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_set: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<QualifiedName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<QualifiedName>,
    pub method: HttpMethod,
    /// Service-relative path with `{Field}` placeholders for key values.
    pub path_template: String,
    pub input: InputContract,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,
}

impl ToolDefinition {
    /// JSON Schema of the tool's input contract.
    #[must_use]
    pub fn input_schema(&self) -> Value {
        self.input.to_json_schema()
    }

    /// Protocol-facing summary: name, description and input schema.
    #[must_use]
    pub fn to_listing(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema(),
        })
    }
}

/// Why a candidate tool was not emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Another tool in the batch already carries this name.
    NamingConflict { name: String },
    /// The entity type has no resolvable key.
    MissingKey { entity_type: QualifiedName },
    /// A navigation or binding target did not resolve.
    UnresolvedTarget { reference: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamingConflict { name } => write!(f, "tool name {name} is already taken"),
            Self::MissingKey { entity_type } => {
                write!(f, "entity type {entity_type} has no resolvable key")
            }
            Self::UnresolvedTarget { reference } => {
                write!(f, "target {reference} did not resolve")
            }
        }
    }
}

/// A candidate tool that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTool {
    /// Entity set, navigation path or operation the tool would have covered.
    pub subject: String,
    pub kind: ToolKind,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Result of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub tools: Vec<ToolDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedTool>,
    /// Number of candidate tools dropped after the batch reached its cap.
    #[serde(default)]
    pub truncated: usize,
}

impl GenerationReport {
    #[must_use]
    pub fn tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.truncated > 0
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|tool| tool.name.as_str())
    }
}
