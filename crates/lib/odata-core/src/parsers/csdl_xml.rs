use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::{error::Error, fmt, path::Path};

use odata_model::schema::{
    ELEMENT_ACTION,
    ELEMENT_ACTION_IMPORT,
    ELEMENT_ASSOCIATION,
    ELEMENT_COMPLEX_TYPE,
    ELEMENT_ENTITY_CONTAINER,
    ELEMENT_ENTITY_SET,
    ELEMENT_ENTITY_TYPE,
    ELEMENT_ENUM_TYPE,
    ELEMENT_FUNCTION,
    ELEMENT_FUNCTION_IMPORT,
    ELEMENT_SCHEMA,
    ELEMENT_TYPE_DEFINITION,
    split_collection,
};
use odata_model::{
    ComplexType,
    EntityContainer,
    EntitySet,
    EntityType,
    EnumMember,
    EnumType,
    Multiplicity,
    NavigationBinding,
    NavigationProperty,
    Operation,
    OperationBinding,
    OperationImport,
    OperationKind,
    Parameter,
    ParseWarning,
    PrimitiveType,
    Property,
    QualifiedName,
    ReturnType,
    SchemaModel,
    SchemaNamespace,
    TypeRef,
};
use roxmltree::{Document, Node};
use tracing::{debug, warn};

/// Error type for metadata parse failures. No partial model accompanies an error.
#[derive(Debug)]
pub enum MetadataError {
    /// The document is not well-formed markup.
    Schema(String),
    /// The document parsed but lacks required constructs.
    Validation(String),
    /// The document could not be read.
    Io(String),
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(message) => write!(f, "malformed metadata document: {message}"),
            Self::Validation(message) => write!(f, "invalid metadata document: {message}"),
            Self::Io(message) => write!(f, "failed to read metadata document: {message}"),
        }
    }
}

impl Error for MetadataError {}

impl From<roxmltree::Error> for MetadataError {
    fn from(err: roxmltree::Error) -> Self {
        Self::Schema(err.to_string())
    }
}

impl From<std::io::Error> for MetadataError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<tokio::task::JoinError> for MetadataError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Io(err.to_string())
    }
}

/// Parser for CSDL (`$metadata`) XML documents, versions 2.0 through 4.01.
pub struct CsdlXmlParser;

impl CsdlXmlParser {
    /// Parses a metadata document into a schema model.
    ///
    /// Pass 1 indexes every declared type name per namespace; pass 2
    /// materializes types, operations and containers against that index, so
    /// forward and cross-namespace references resolve. Unresolved references
    /// degrade to [`TypeRef::Unknown`] and are recorded as warnings.
    ///
    /// # Errors
    /// Returns `MetadataError::Schema` if the XML is malformed and
    /// `MetadataError::Validation` if no namespace or container is declared,
    /// a type, container or entity set name is declared twice, or an entity set
    /// names an undeclared type.
    pub fn parse(xml: &str) -> Result<SchemaModel, MetadataError> {
        let doc = Document::parse(xml)?;
        let schemas: Vec<Node<'_, '_>> = doc
            .descendants()
            .filter(|node| node.is_element() && node.has_tag_name(ELEMENT_SCHEMA))
            .collect();
        if schemas.is_empty() {
            return Err(MetadataError::Validation(
                "no schema namespace declared".to_string(),
            ));
        }

        let index = TypeIndex::build(&schemas)?;
        let mut builder = ModelBuilder::new(&index);

        for schema in &schemas {
            builder.add_types(*schema);
        }
        for schema in &schemas {
            builder.add_operations(*schema);
        }
        for schema in &schemas {
            builder.add_containers(*schema)?;
        }

        let model = builder.finish()?;
        debug!(
            namespaces = model.namespaces.len(),
            entity_types = model.entity_types.len(),
            complex_types = model.complex_types.len(),
            containers = model.containers.len(),
            warnings = model.warnings.len(),
            "parsed metadata document"
        );
        Ok(model)
    }

    /// Parses metadata asynchronously using a blocking task.
    ///
    /// # Errors
    /// Returns `MetadataError` if parsing fails or the task panics.
    pub async fn parse_async(xml: String) -> Result<SchemaModel, MetadataError> {
        tokio::task::spawn_blocking(move || Self::parse(&xml)).await?
    }

    /// Parses metadata from a file path asynchronously.
    ///
    /// # Errors
    /// Returns `MetadataError` if the file cannot be read or the XML cannot be parsed.
    pub async fn parse_file(path: impl AsRef<Path>) -> Result<SchemaModel, MetadataError> {
        let xml = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::parse_async(xml).await
    }
}

#[derive(Debug, Clone, Copy)]
enum IndexedType {
    Entity,
    Complex,
    Enum,
    Definition(PrimitiveType),
}

#[derive(Debug)]
struct AssociationEnd {
    role: String,
    type_name: String,
    multiplicity: Multiplicity,
}

/// Pass 1: every declared type name, schema aliases and CSDL 2 associations.
#[derive(Debug, Default)]
struct TypeIndex {
    aliases: HashMap<String, String>,
    declared: HashMap<QualifiedName, IndexedType>,
    associations: HashMap<QualifiedName, Vec<AssociationEnd>>,
}

impl TypeIndex {
    fn build(schemas: &[Node<'_, '_>]) -> Result<Self, MetadataError> {
        let mut index = Self::default();
        for schema in schemas {
            let namespace = schema_namespace(*schema)?;
            if let Some(alias) = schema.attribute("Alias") {
                index.aliases.insert(alias.to_string(), namespace.to_string());
            }

            for child in schema.children().filter(Node::is_element) {
                let Some(name) = child.attribute("Name") else {
                    continue;
                };
                let qualified = QualifiedName::new(namespace, name);
                let kind = match child.tag_name().name() {
                    ELEMENT_ENTITY_TYPE => IndexedType::Entity,
                    ELEMENT_COMPLEX_TYPE => IndexedType::Complex,
                    ELEMENT_ENUM_TYPE => IndexedType::Enum,
                    ELEMENT_TYPE_DEFINITION => {
                        let Some(underlying) = child
                            .attribute("UnderlyingType")
                            .and_then(PrimitiveType::from_edm_name)
                        else {
                            continue;
                        };
                        IndexedType::Definition(underlying)
                    }
                    ELEMENT_ASSOCIATION => {
                        index.associations.insert(qualified, association_ends(child));
                        continue;
                    }
                    _ => continue,
                };
                if index.declared.insert(qualified.clone(), kind).is_some() {
                    return Err(MetadataError::Validation(format!(
                        "type {qualified} is declared more than once"
                    )));
                }
            }
        }
        Ok(index)
    }

    /// Rewrites `Alias.Name` to `Namespace.Name`.
    fn qualify(&self, raw: &str) -> Option<QualifiedName> {
        let mut name = QualifiedName::parse(raw)?;
        if let Some(namespace) = self.aliases.get(&name.namespace) {
            name.namespace.clone_from(namespace);
        }
        Some(name)
    }

    /// Resolves a non-collection type name. `None` when nothing matches.
    fn resolve(&self, raw: &str) -> Option<TypeRef> {
        if let Some(primitive) = PrimitiveType::from_edm_name(raw) {
            return Some(TypeRef::Primitive(primitive));
        }
        let name = self.qualify(raw)?;
        match self.declared.get(&name)? {
            IndexedType::Definition(primitive) => Some(TypeRef::Primitive(*primitive)),
            IndexedType::Entity | IndexedType::Complex | IndexedType::Enum => {
                Some(TypeRef::Named(name))
            }
        }
    }

    fn resolve_entity(&self, raw: &str) -> Option<QualifiedName> {
        let name = self.qualify(raw)?;
        matches!(self.declared.get(&name), Some(IndexedType::Entity)).then_some(name)
    }

    fn resolve_complex(&self, raw: &str) -> Option<QualifiedName> {
        let name = self.qualify(raw)?;
        matches!(self.declared.get(&name), Some(IndexedType::Complex)).then_some(name)
    }
}

/// Pass 2: materializes declarations against the index.
struct ModelBuilder<'i> {
    index: &'i TypeIndex,
    model: SchemaModel,
    warnings: Vec<ParseWarning>,
}

impl<'i> ModelBuilder<'i> {
    fn new(index: &'i TypeIndex) -> Self {
        Self {
            index,
            model: SchemaModel::default(),
            warnings: Vec::new(),
        }
    }

    fn add_types(&mut self, schema: Node<'_, '_>) {
        let Ok(namespace) = schema_namespace(schema) else {
            return;
        };
        self.model.namespaces.insert(SchemaNamespace {
            namespace: namespace.to_string(),
            alias: schema.attribute("Alias").map(str::to_string),
        });

        for child in schema.children().filter(Node::is_element) {
            let Some(name) = child.attribute("Name") else {
                continue;
            };
            let qualified = QualifiedName::new(namespace, name);
            match child.tag_name().name() {
                ELEMENT_ENTITY_TYPE => {
                    let entity = self.entity_type(qualified, child);
                    self.model.entity_types.insert(entity.name.clone(), entity);
                }
                ELEMENT_COMPLEX_TYPE => {
                    let complex = self.complex_type(qualified, child);
                    self.model.complex_types.insert(complex.name.clone(), complex);
                }
                ELEMENT_ENUM_TYPE => {
                    let enumeration = enum_type(qualified, child);
                    self.model.enum_types.insert(enumeration.name.clone(), enumeration);
                }
                _ => {}
            }
        }
    }

    fn add_operations(&mut self, schema: Node<'_, '_>) {
        let Ok(namespace) = schema_namespace(schema) else {
            return;
        };
        for child in schema.children().filter(Node::is_element) {
            let kind = match child.tag_name().name() {
                ELEMENT_ACTION => OperationKind::Action,
                ELEMENT_FUNCTION => OperationKind::Function,
                _ => continue,
            };
            let Some(name) = child.attribute("Name") else {
                continue;
            };
            let operation = self.operation(QualifiedName::new(namespace, name), kind, child);
            self.model
                .operations
                .entry(operation.name.clone())
                .or_default()
                .push(operation);
        }
    }

    fn add_containers(&mut self, schema: Node<'_, '_>) -> Result<(), MetadataError> {
        let Ok(namespace) = schema_namespace(schema) else {
            return Ok(());
        };
        for node in schema
            .children()
            .filter(|child| child.is_element() && child.has_tag_name(ELEMENT_ENTITY_CONTAINER))
        {
            let Some(name) = node.attribute("Name") else {
                continue;
            };
            let qualified = QualifiedName::new(namespace, name);
            if self.model.containers.contains_key(&qualified) {
                return Err(MetadataError::Validation(format!(
                    "entity container {qualified} is declared more than once"
                )));
            }
            let container = self.container(qualified, node)?;
            self.model.containers.insert(container.name.clone(), container);
        }
        Ok(())
    }

    fn entity_type(&mut self, name: QualifiedName, node: Node<'_, '_>) -> EntityType {
        let owner = name.to_string();
        let mut key: Vec<String> = Vec::new();
        for key_name in node
            .children()
            .filter(|child| child.has_tag_name("Key"))
            .flat_map(|key| key.children().filter(|child| child.has_tag_name("PropertyRef")))
            .filter_map(|property_ref| property_ref.attribute("Name"))
        {
            if key.iter().any(|existing| existing == key_name) {
                self.warn(ParseWarning::InvalidKey {
                    owner: owner.clone(),
                    reason: format!("key property {key_name} is listed more than once"),
                });
            } else {
                key.push(key_name.to_string());
            }
        }
        let base_type = node.attribute("BaseType").and_then(|raw| {
            let resolved = self.index.resolve_entity(raw);
            if resolved.is_none() {
                self.warn(ParseWarning::UnresolvedBaseType {
                    owner: owner.clone(),
                    reference: raw.to_string(),
                });
            }
            resolved
        });

        EntityType {
            key,
            properties: self.properties(&owner, node),
            navigation_properties: self.navigation_properties(&owner, node),
            base_type,
            is_abstract: node.attribute("Abstract") == Some("true"),
            name,
        }
    }

    fn complex_type(&mut self, name: QualifiedName, node: Node<'_, '_>) -> ComplexType {
        let owner = name.to_string();
        let base_type = node.attribute("BaseType").and_then(|raw| {
            let resolved = self.index.resolve_complex(raw);
            if resolved.is_none() {
                self.warn(ParseWarning::UnresolvedBaseType {
                    owner: owner.clone(),
                    reference: raw.to_string(),
                });
            }
            resolved
        });

        ComplexType {
            properties: self.properties(&owner, node),
            navigation_properties: self.navigation_properties(&owner, node),
            base_type,
            name,
        }
    }

    fn properties(&mut self, owner: &str, node: Node<'_, '_>) -> Vec<Property> {
        let mut properties = Vec::new();
        for child in node.children().filter(|child| child.has_tag_name("Property")) {
            let Some(name) = child.attribute("Name") else {
                continue;
            };
            let (type_ref, is_collection) =
                self.type_ref(owner, name, child.attribute("Type").unwrap_or_default());
            properties.push(Property {
                name: name.to_string(),
                type_ref,
                nullable: is_nullable(child),
                is_collection,
                max_length: child
                    .attribute("MaxLength")
                    .and_then(|value| value.trim().parse().ok()),
            });
        }
        properties
    }

    fn navigation_properties(&mut self, owner: &str, node: Node<'_, '_>) -> Vec<NavigationProperty> {
        let mut navigation = Vec::new();
        for child in node
            .children()
            .filter(|child| child.has_tag_name("NavigationProperty"))
        {
            let Some(name) = child.attribute("Name") else {
                continue;
            };
            let property = if let Some(raw) = child.attribute("Type") {
                let (target, is_collection) = self.type_ref(owner, name, raw);
                let multiplicity = if is_collection {
                    Multiplicity::Many
                } else if is_nullable(child) {
                    Multiplicity::ZeroOrOne
                } else {
                    Multiplicity::One
                };
                NavigationProperty {
                    name: name.to_string(),
                    target,
                    multiplicity,
                    partner: child.attribute("Partner").map(str::to_string),
                }
            } else {
                self.association_navigation(owner, name, child)
            };
            navigation.push(property);
        }
        navigation
    }

    /// CSDL 2 navigation: target and multiplicity come from the association end named by `ToRole`.
    fn association_navigation(
        &mut self,
        owner: &str,
        name: &str,
        node: Node<'_, '_>,
    ) -> NavigationProperty {
        let index = self.index;
        let relationship = node.attribute("Relationship").unwrap_or_default();
        let to_role = node.attribute("ToRole").unwrap_or_default();
        let ends = index
            .qualify(relationship)
            .and_then(|association| index.associations.get(&association));
        let end = ends.and_then(|ends| ends.iter().find(|end| end.role == to_role));

        let Some(end) = end else {
            let reference = format!("{relationship}/{to_role}");
            self.warn(ParseWarning::UnresolvedType {
                owner: owner.to_string(),
                member: name.to_string(),
                reference: reference.clone(),
            });
            return NavigationProperty {
                name: name.to_string(),
                target: TypeRef::Unknown(reference),
                multiplicity: Multiplicity::ZeroOrOne,
                partner: None,
            };
        };

        let (target, _) = self.type_ref(owner, name, &end.type_name);
        let partner = node
            .attribute("FromRole")
            .filter(|from_role| ends.is_some_and(|ends| ends.iter().any(|end| end.role == *from_role)))
            .map(str::to_string);
        NavigationProperty {
            name: name.to_string(),
            target,
            multiplicity: end.multiplicity,
            partner,
        }
    }

    fn operation(&mut self, name: QualifiedName, kind: OperationKind, node: Node<'_, '_>) -> Operation {
        let owner = name.to_string();
        let mut parameters = self.parameters(&owner, node);
        let binding = if node.attribute("IsBound") == Some("true") && !parameters.is_empty() {
            let binding_parameter = parameters.remove(0);
            match binding_parameter.type_ref {
                TypeRef::Named(entity_type) if self.model.entity_types.contains_key(&entity_type) => {
                    Some(OperationBinding {
                        parameter: binding_parameter.name,
                        entity_type,
                        is_collection: binding_parameter.is_collection,
                    })
                }
                // Unresolved binding types were already reported by `type_ref`.
                TypeRef::Unknown(_) => None,
                other => {
                    self.warn(ParseWarning::UnresolvedType {
                        owner: owner.clone(),
                        member: binding_parameter.name,
                        reference: other.to_string(),
                    });
                    None
                }
            }
        } else {
            None
        };

        let return_type = node
            .children()
            .find(|child| child.has_tag_name("ReturnType"))
            .and_then(|child| {
                let raw = child.attribute("Type")?;
                let (type_ref, is_collection) = self.type_ref(&owner, "ReturnType", raw);
                Some(ReturnType {
                    type_ref,
                    is_collection,
                    nullable: is_nullable(child),
                })
            });

        Operation {
            name,
            kind,
            parameters,
            return_type,
            binding,
            is_composable: node.attribute("IsComposable") == Some("true"),
        }
    }

    fn parameters(&mut self, owner: &str, node: Node<'_, '_>) -> Vec<Parameter> {
        let mut parameters = Vec::new();
        for child in node.children().filter(|child| child.has_tag_name("Parameter")) {
            let Some(name) = child.attribute("Name") else {
                continue;
            };
            let (type_ref, is_collection) =
                self.type_ref(owner, name, child.attribute("Type").unwrap_or_default());
            parameters.push(Parameter {
                name: name.to_string(),
                type_ref,
                nullable: is_nullable(child),
                is_collection,
            });
        }
        parameters
    }

    fn container(
        &mut self,
        name: QualifiedName,
        node: Node<'_, '_>,
    ) -> Result<EntityContainer, MetadataError> {
        let owner = name.to_string();
        let mut container = EntityContainer {
            name,
            entity_sets: BTreeMap::new(),
            operation_imports: Vec::new(),
        };

        for child in node.children().filter(Node::is_element) {
            let Some(set_name) = child.attribute("Name") else {
                continue;
            };
            match child.tag_name().name() {
                ELEMENT_ENTITY_SET => {
                    if container.entity_sets.contains_key(set_name) {
                        return Err(MetadataError::Validation(format!(
                            "entity set {owner}/{set_name} is declared more than once"
                        )));
                    }
                    let raw = child.attribute("EntityType").unwrap_or_default();
                    let Some(entity_type) = self.index.resolve_entity(raw) else {
                        return Err(MetadataError::Validation(format!(
                            "entity set {owner}/{set_name} references undeclared entity type '{raw}'"
                        )));
                    };
                    let navigation_bindings = child
                        .children()
                        .filter(|binding| binding.has_tag_name("NavigationPropertyBinding"))
                        .filter_map(|binding| {
                            Some(NavigationBinding {
                                path: binding.attribute("Path")?.to_string(),
                                target: binding.attribute("Target")?.to_string(),
                            })
                        })
                        .collect();
                    container.entity_sets.insert(
                        set_name.to_string(),
                        EntitySet {
                            name: set_name.to_string(),
                            entity_type,
                            navigation_bindings,
                        },
                    );
                }
                ELEMENT_ACTION_IMPORT | ELEMENT_FUNCTION_IMPORT => {
                    if let Some(import) = self.operation_import(&container.name, child) {
                        container.operation_imports.push(import);
                    }
                }
                _ => {}
            }
        }

        Ok(container)
    }

    fn operation_import(
        &mut self,
        container: &QualifiedName,
        node: Node<'_, '_>,
    ) -> Option<OperationImport> {
        let name = node.attribute("Name")?;
        let entity_set = node.attribute("EntitySet").map(str::to_string);
        let reference = node
            .attribute("Action")
            .or_else(|| node.attribute("Function"));

        let Some(reference) = reference else {
            // CSDL 2 imports declare the operation inline.
            let operation = self.inline_import(container, name, node);
            let import = OperationImport {
                name: name.to_string(),
                operation: operation.name.clone(),
                entity_set,
            };
            self.model
                .operations
                .entry(operation.name.clone())
                .or_default()
                .push(operation);
            return Some(import);
        };

        match self.index.qualify(reference) {
            Some(operation) if self.model.operations.contains_key(&operation) => {
                Some(OperationImport {
                    name: name.to_string(),
                    operation,
                    entity_set,
                })
            }
            _ => {
                self.warn(ParseWarning::UnresolvedOperation {
                    owner: format!("{container}/{name}"),
                    reference: reference.to_string(),
                });
                None
            }
        }
    }

    fn inline_import(&mut self, container: &QualifiedName, name: &str, node: Node<'_, '_>) -> Operation {
        let operation_name = QualifiedName::new(container.namespace.clone(), name);
        let owner = operation_name.to_string();
        let kind = match local_attribute(node, "HttpMethod") {
            Some(method) if method.eq_ignore_ascii_case("GET") => OperationKind::Function,
            Some(_) => OperationKind::Action,
            None if node.has_tag_name(ELEMENT_ACTION_IMPORT) => OperationKind::Action,
            None => OperationKind::Function,
        };
        let return_type = node.attribute("ReturnType").map(|raw| {
            let (type_ref, is_collection) = self.type_ref(&owner, "ReturnType", raw);
            ReturnType {
                type_ref,
                is_collection,
                nullable: true,
            }
        });
        Operation {
            parameters: self.parameters(&owner, node),
            name: operation_name,
            kind,
            return_type,
            binding: None,
            is_composable: false,
        }
    }

    /// Resolves a possibly collection-wrapped type, recording unresolved references.
    fn type_ref(&mut self, owner: &str, member: &str, raw: &str) -> (TypeRef, bool) {
        let (inner, is_collection) = split_collection(raw);
        if let Some(resolved) = self.index.resolve(inner) {
            return (resolved, is_collection);
        }
        self.warn(ParseWarning::UnresolvedType {
            owner: owner.to_string(),
            member: member.to_string(),
            reference: raw.to_string(),
        });
        (TypeRef::Unknown(raw.to_string()), is_collection)
    }

    fn warn(&mut self, warning: ParseWarning) {
        warn!(%warning, "metadata warning");
        self.warnings.push(warning);
    }

    fn finish(mut self) -> Result<SchemaModel, MetadataError> {
        if self.model.containers.is_empty() {
            return Err(MetadataError::Validation(
                "no entity container declared".to_string(),
            ));
        }
        self.resolve_keys();
        self.warnings.sort();
        self.warnings.dedup();
        self.model.warnings = self.warnings;
        Ok(self.model)
    }

    /// Explicit resolution step: inherits keys down base chains and validates
    /// them against declared and inherited properties.
    fn resolve_keys(&mut self) {
        let names: Vec<QualifiedName> = self.model.entity_types.keys().cloned().collect();
        let mut effective = Vec::with_capacity(names.len());
        let mut nullable_keys = BTreeSet::new();
        let mut warnings = Vec::new();

        for name in names {
            let chain = self.model.base_chain(&name);
            let owner = name.to_string();
            let cyclic = chain.last().is_some_and(|last| {
                last.base_type
                    .as_ref()
                    .is_some_and(|base| chain.iter().any(|entity| &entity.name == base))
            });
            if cyclic {
                warnings.push(ParseWarning::BaseTypeCycle {
                    owner: owner.clone(),
                });
            }

            let key: Vec<String> = chain
                .iter()
                .map(|entity| &entity.key)
                .find(|key| !key.is_empty())
                .cloned()
                .unwrap_or_default();
            if key.is_empty() {
                if !chain.first().is_some_and(|entity| entity.is_abstract) {
                    warnings.push(ParseWarning::InvalidKey {
                        owner,
                        reason: "no key declared".to_string(),
                    });
                }
                effective.push((name, Vec::new()));
                continue;
            }

            let mut valid = true;
            for key_name in &key {
                let declared = chain
                    .iter()
                    .find_map(|entity| entity.property(key_name).map(|property| (*entity, property)));
                match declared {
                    None => {
                        valid = false;
                        warnings.push(ParseWarning::InvalidKey {
                            owner: owner.clone(),
                            reason: format!("key property {key_name} is not declared"),
                        });
                    }
                    Some((_, property)) if property.type_ref.is_unknown() || property.is_collection => {
                        valid = false;
                        warnings.push(ParseWarning::InvalidKey {
                            owner: owner.clone(),
                            reason: format!("key property {key_name} has an unusable type"),
                        });
                    }
                    Some((entity, property)) => {
                        if property.nullable {
                            nullable_keys.insert((entity.name.clone(), key_name.clone()));
                        }
                    }
                }
            }
            effective.push((name, if valid { key } else { Vec::new() }));
        }

        // Key properties are non-nullable regardless of the declaration.
        for (declaring, property_name) in nullable_keys {
            if let Some(property) = self
                .model
                .entity_types
                .get_mut(&declaring)
                .and_then(|entity| {
                    entity
                        .properties
                        .iter_mut()
                        .find(|property| property.name == property_name)
                })
            {
                property.nullable = false;
            }
            warnings.push(ParseWarning::NullableKey {
                owner: declaring.to_string(),
                property: property_name,
            });
        }

        for (name, key) in effective {
            if let Some(entity) = self.model.entity_types.get_mut(&name) {
                entity.key = key;
            }
        }
        for warning in warnings {
            self.warn(warning);
        }
    }
}

fn schema_namespace<'a>(schema: Node<'a, '_>) -> Result<&'a str, MetadataError> {
    schema
        .attribute("Namespace")
        .map(str::trim)
        .filter(|namespace| !namespace.is_empty())
        .ok_or_else(|| MetadataError::Validation("Schema element without Namespace".to_string()))
}

fn association_ends(node: Node<'_, '_>) -> Vec<AssociationEnd> {
    node.children()
        .filter(|child| child.has_tag_name("End"))
        .filter_map(|end| {
            Some(AssociationEnd {
                role: end.attribute("Role")?.to_string(),
                type_name: end.attribute("Type")?.to_string(),
                multiplicity: Multiplicity::from_association_end(end.attribute("Multiplicity")?)?,
            })
        })
        .collect()
}

fn enum_type(name: QualifiedName, node: Node<'_, '_>) -> EnumType {
    let members = node
        .children()
        .filter(|child| child.has_tag_name("Member"))
        .filter_map(|member| {
            Some(EnumMember {
                name: member.attribute("Name")?.to_string(),
                value: member
                    .attribute("Value")
                    .and_then(|value| value.trim().parse().ok()),
            })
        })
        .collect();
    EnumType {
        name,
        members,
        is_flags: node.attribute("IsFlags") == Some("true"),
    }
}

fn is_nullable(node: Node<'_, '_>) -> bool {
    node.attribute("Nullable") != Some("false")
}

/// Attribute lookup by local name, ignoring any namespace prefix (`m:HttpMethod`).
fn local_attribute<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attributes()
        .find(|attribute| attribute.name() == name)
        .map(|attribute| attribute.value())
}
