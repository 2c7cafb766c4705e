use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::PrimitiveType;

/// Namespace-qualified name of a declared schema element (`Namespace.Name`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct QualifiedName {
    pub namespace: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Splits `Namespace.Name` on the last dot. Namespaces may contain dots.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let (namespace, name) = value.trim().rsplit_once('.')?;
        if namespace.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(namespace, name))
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

impl From<QualifiedName> for String {
    fn from(value: QualifiedName) -> Self {
        value.to_string()
    }
}

#[derive(Debug)]
pub struct InvalidQualifiedName(pub String);

impl fmt::Display for InvalidQualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid qualified name: {}", self.0)
    }
}

impl Error for InvalidQualifiedName {}

impl TryFrom<String> for QualifiedName {
    type Error = InvalidQualifiedName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(InvalidQualifiedName(value))
    }
}

/// Reference from a property, parameter or return type to its type.
///
/// Declared types are referenced by name only; resolving the name against the
/// owning [`SchemaModel`] is an explicit step, so cyclic schemas never form
/// reference cycles in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "type", rename_all = "snake_case")]
pub enum TypeRef {
    Primitive(PrimitiveType),
    Named(QualifiedName),
    /// A reference that did not resolve during parsing. Holds the raw text.
    Unknown(String),
}

impl TypeRef {
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }

    #[must_use]
    pub const fn as_named(&self) -> Option<&QualifiedName> {
        match self {
            Self::Named(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(primitive) => f.write_str(primitive.edm_name()),
            Self::Named(name) => write!(f, "{name}"),
            Self::Unknown(raw) => write!(f, "{raw} (unresolved)"),
        }
    }
}

/// Structural property of an entity or complex type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub type_ref: TypeRef,
    pub nullable: bool,
    pub is_collection: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

/// Cardinality of a navigation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Multiplicity {
    One,
    ZeroOrOne,
    Many,
}

impl Multiplicity {
    /// Parses association end multiplicity (`1`, `0..1`, `*`).
    #[must_use]
    pub fn from_association_end(value: &str) -> Option<Self> {
        match value.trim() {
            "1" => Some(Self::One),
            "0..1" => Some(Self::ZeroOrOne),
            "*" => Some(Self::Many),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_collection(self) -> bool {
        matches!(self, Self::Many)
    }
}

/// Typed relationship to another declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationProperty {
    pub name: String,
    pub target: TypeRef,
    pub multiplicity: Multiplicity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    pub name: QualifiedName,
    /// Effective key, inherited from the base chain when not declared locally.
    /// Empty when the key could not be resolved.
    pub key: Vec<String>,
    pub properties: Vec<Property>,
    pub navigation_properties: Vec<NavigationProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_type: Option<QualifiedName>,
    #[serde(default)]
    pub is_abstract: bool,
}

impl EntityType {
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|property| property.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexType {
    pub name: QualifiedName,
    pub properties: Vec<Property>,
    pub navigation_properties: Vec<NavigationProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_type: Option<QualifiedName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumType {
    pub name: QualifiedName,
    pub members: Vec<EnumMember>,
    #[serde(default)]
    pub is_flags: bool,
}

/// Binding of a navigation property path to the entity set it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationBinding {
    pub path: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySet {
    pub name: String,
    pub entity_type: QualifiedName,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub navigation_bindings: Vec<NavigationBinding>,
}

/// Container-level import exposing a declared operation as a service root call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationImport {
    pub name: String,
    pub operation: QualifiedName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_set: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityContainer {
    pub name: QualifiedName,
    /// Entity sets keyed by name.
    pub entity_sets: BTreeMap<String, EntitySet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operation_imports: Vec<OperationImport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Action,
    Function,
}

impl OperationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Function => "function",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_ref: TypeRef,
    pub nullable: bool,
    pub is_collection: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnType {
    pub type_ref: TypeRef,
    pub is_collection: bool,
    pub nullable: bool,
}

/// Binding of an operation to an entity type (first parameter of a bound operation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationBinding {
    pub parameter: String,
    pub entity_type: QualifiedName,
    pub is_collection: bool,
}

/// Action or function declared in a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub name: QualifiedName,
    pub kind: OperationKind,
    /// Parameters excluding the binding parameter.
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<ReturnType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding: Option<OperationBinding>,
    #[serde(default)]
    pub is_composable: bool,
}

/// Schema namespace declared by a `Schema` element.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaNamespace {
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// Non-fatal diagnostics recorded while parsing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum ParseWarning {
    UnresolvedType {
        owner: String,
        member: String,
        reference: String,
    },
    UnresolvedBaseType {
        owner: String,
        reference: String,
    },
    BaseTypeCycle {
        owner: String,
    },
    InvalidKey {
        owner: String,
        reason: String,
    },
    NullableKey {
        owner: String,
        property: String,
    },
    UnresolvedOperation {
        owner: String,
        reference: String,
    },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedType {
                owner,
                member,
                reference,
            } => write!(f, "{owner}.{member}: unresolved type reference {reference}"),
            Self::UnresolvedBaseType { owner, reference } => {
                write!(f, "{owner}: unresolved base type {reference}")
            }
            Self::BaseTypeCycle { owner } => write!(f, "{owner}: base type chain is cyclic"),
            Self::InvalidKey { owner, reason } => write!(f, "{owner}: invalid key ({reason})"),
            Self::NullableKey { owner, property } => {
                write!(f, "{owner}.{property}: key property declared nullable")
            }
            Self::UnresolvedOperation { owner, reference } => {
                write!(f, "{owner}: unresolved operation {reference}")
            }
        }
    }
}

/// A declared type resolved from the model's name index.
#[derive(Debug, Clone, Copy)]
pub enum DeclaredType<'a> {
    Entity(&'a EntityType),
    Complex(&'a ComplexType),
    Enum(&'a EnumType),
}

/// Root of a parsed metadata document.
///
/// Declared types live in flat tables keyed by qualified name. Built once per
/// parse and shared read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaModel {
    pub namespaces: BTreeSet<SchemaNamespace>,
    pub entity_types: BTreeMap<QualifiedName, EntityType>,
    pub complex_types: BTreeMap<QualifiedName, ComplexType>,
    pub enum_types: BTreeMap<QualifiedName, EnumType>,
    /// Operations keyed by name; overloads share a key.
    pub operations: BTreeMap<QualifiedName, Vec<Operation>>,
    pub containers: BTreeMap<QualifiedName, EntityContainer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ParseWarning>,
}

impl SchemaModel {
    #[must_use]
    pub fn entity_type(&self, name: &QualifiedName) -> Option<&EntityType> {
        self.entity_types.get(name)
    }

    #[must_use]
    pub fn complex_type(&self, name: &QualifiedName) -> Option<&ComplexType> {
        self.complex_types.get(name)
    }

    #[must_use]
    pub fn enum_type(&self, name: &QualifiedName) -> Option<&EnumType> {
        self.enum_types.get(name)
    }

    #[must_use]
    pub fn resolve(&self, name: &QualifiedName) -> Option<DeclaredType<'_>> {
        if let Some(entity) = self.entity_types.get(name) {
            return Some(DeclaredType::Entity(entity));
        }
        if let Some(complex) = self.complex_types.get(name) {
            return Some(DeclaredType::Complex(complex));
        }
        self.enum_types.get(name).map(DeclaredType::Enum)
    }

    /// Iterates every entity set in container order, then set-name order.
    pub fn entity_sets(&self) -> impl Iterator<Item = (&EntityContainer, &EntitySet)> {
        self.containers
            .values()
            .flat_map(|container| container.entity_sets.values().map(move |set| (container, set)))
    }

    #[must_use]
    pub fn entity_set(&self, name: &str) -> Option<&EntitySet> {
        self.entity_sets()
            .map(|(_, set)| set)
            .find(|set| set.name == name)
    }

    /// Entity type followed by its ancestors, stopping at cycles or unresolved bases.
    #[must_use]
    pub fn base_chain(&self, name: &QualifiedName) -> Vec<&EntityType> {
        let mut chain: Vec<&EntityType> = Vec::new();
        let mut current = self.entity_types.get(name);
        while let Some(entity) = current {
            if chain.iter().any(|seen| seen.name == entity.name) {
                break;
            }
            chain.push(entity);
            current = entity
                .base_type
                .as_ref()
                .and_then(|base| self.entity_types.get(base));
        }
        chain
    }

    /// Declared and inherited properties, ancestors first.
    #[must_use]
    pub fn all_properties(&self, name: &QualifiedName) -> Vec<&Property> {
        self.base_chain(name)
            .into_iter()
            .rev()
            .flat_map(|entity| entity.properties.iter())
            .collect()
    }

    /// Declared and inherited navigation properties, ancestors first.
    #[must_use]
    pub fn all_navigation_properties(&self, name: &QualifiedName) -> Vec<&NavigationProperty> {
        self.base_chain(name)
            .into_iter()
            .rev()
            .flat_map(|entity| entity.navigation_properties.iter())
            .collect()
    }

    /// Whether `derived` is `base` or inherits from it.
    #[must_use]
    pub fn is_assignable(&self, derived: &QualifiedName, base: &QualifiedName) -> bool {
        self.base_chain(derived)
            .iter()
            .any(|entity| &entity.name == base)
    }

    /// Every operation, ordered by qualified name then declaration order.
    pub fn all_operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.values().flatten()
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
