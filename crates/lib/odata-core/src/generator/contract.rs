use std::collections::HashSet;

use odata_model::{
    ComplexType,
    DeclaredType,
    Parameter,
    PrimitiveFamily,
    Property,
    QualifiedName,
    SchemaModel,
    TypeRef,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

pub const FIELD_FILTER: &str = "filter";
pub const FIELD_ORDER_BY: &str = "orderby";
pub const FIELD_SELECT: &str = "select";
pub const FIELD_TOP: &str = "top";
pub const FIELD_SKIP: &str = "skip";
pub const FIELD_COUNT: &str = "count";

/// Type of one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    String {
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_length: Option<u32>,
    },
    Integer,
    Number,
    Boolean,
    Enum {
        values: Vec<String>,
    },
    Array {
        items: Box<FieldType>,
    },
    /// Object with known fields; empty for free-form objects.
    Object {
        fields: Vec<FieldSpec>,
    },
    Any,
}

impl FieldType {
    const fn plain_string() -> Self {
        Self::String {
            format: None,
            max_length: None,
        }
    }

    fn to_json_schema(&self) -> Value {
        match self {
            Self::String { format, max_length } => {
                let mut schema = Map::new();
                schema.insert("type".to_string(), json!("string"));
                if let Some(format) = format {
                    schema.insert("format".to_string(), json!(format));
                }
                if let Some(max_length) = max_length {
                    schema.insert("maxLength".to_string(), json!(max_length));
                }
                Value::Object(schema)
            }
            Self::Integer => json!({ "type": "integer" }),
            Self::Number => json!({ "type": "number" }),
            Self::Boolean => json!({ "type": "boolean" }),
            Self::Enum { values } => json!({ "type": "string", "enum": values }),
            Self::Array { items } => json!({ "type": "array", "items": items.to_json_schema() }),
            Self::Object { fields } => object_schema(fields),
            Self::Any => json!({}),
        }
    }
}

/// One named field of an input contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(flatten)]
    pub field_type: FieldType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType, required: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            required,
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Typed tree of required and optional input fields for a tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputContract {
    pub fields: Vec<FieldSpec>,
}

impl InputContract {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        object_schema(&self.fields)
    }
}

fn object_schema(fields: &[FieldSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in fields {
        let mut schema = field.field_type.to_json_schema();
        if let (Some(description), Value::Object(map)) = (&field.description, &mut schema) {
            map.insert("description".to_string(), json!(description));
        }
        properties.insert(field.name.clone(), schema);
        if field.required {
            required.push(json!(field.name));
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// OData system query options shared by query and collection navigation tools.
#[must_use]
pub fn query_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(FIELD_FILTER, FieldType::plain_string(), false)
            .with_description("OData $filter expression, e.g. Price gt 10"),
        FieldSpec::new(FIELD_ORDER_BY, FieldType::plain_string(), false)
            .with_description("OData $orderby expression, e.g. Name desc"),
        FieldSpec::new(FIELD_SELECT, FieldType::plain_string(), false)
            .with_description("Comma-separated list of properties to return"),
        FieldSpec::new(FIELD_TOP, FieldType::Integer, false)
            .with_description("Maximum number of results"),
        FieldSpec::new(FIELD_SKIP, FieldType::Integer, false)
            .with_description("Number of results to skip"),
        FieldSpec::new(FIELD_COUNT, FieldType::Boolean, false)
            .with_description("Include the total match count"),
    ]
}

/// Maps schema types onto contract field types.
pub struct ContractBuilder<'m> {
    model: &'m SchemaModel,
}

impl<'m> ContractBuilder<'m> {
    #[must_use]
    pub const fn new(model: &'m SchemaModel) -> Self {
        Self { model }
    }

    #[must_use]
    pub fn property_field(&self, property: &Property, required: bool) -> FieldSpec {
        let mut visiting = HashSet::new();
        self.property_field_inner(property, required, &mut visiting)
    }

    #[must_use]
    pub fn parameter_field(&self, parameter: &Parameter) -> FieldSpec {
        let mut visiting = HashSet::new();
        let field_type =
            self.field_type(&parameter.type_ref, parameter.is_collection, None, &mut visiting);
        FieldSpec::new(parameter.name.clone(), field_type, !parameter.nullable)
            .with_description(describe(&parameter.type_ref, parameter.is_collection))
    }

    fn property_field_inner(
        &self,
        property: &Property,
        required: bool,
        visiting: &mut HashSet<QualifiedName>,
    ) -> FieldSpec {
        let field_type = self.field_type(
            &property.type_ref,
            property.is_collection,
            property.max_length,
            visiting,
        );
        FieldSpec::new(property.name.clone(), field_type, required)
            .with_description(describe(&property.type_ref, property.is_collection))
    }

    fn field_type(
        &self,
        type_ref: &TypeRef,
        is_collection: bool,
        max_length: Option<u32>,
        visiting: &mut HashSet<QualifiedName>,
    ) -> FieldType {
        let item = match type_ref {
            TypeRef::Primitive(primitive) => match primitive.family() {
                PrimitiveFamily::Integer => FieldType::Integer,
                PrimitiveFamily::Decimal => FieldType::Number,
                PrimitiveFamily::Boolean => FieldType::Boolean,
                PrimitiveFamily::Spatial => FieldType::Object { fields: Vec::new() },
                PrimitiveFamily::String | PrimitiveFamily::Temporal | PrimitiveFamily::Binary => {
                    FieldType::String {
                        format: primitive.json_format().map(str::to_string),
                        max_length,
                    }
                }
            },
            TypeRef::Named(name) => match self.model.resolve(name) {
                Some(DeclaredType::Complex(complex)) => {
                    if visiting.insert(name.clone()) {
                        let fields = self.complex_fields(complex, visiting);
                        visiting.remove(name);
                        FieldType::Object { fields }
                    } else {
                        FieldType::Object { fields: Vec::new() }
                    }
                }
                Some(DeclaredType::Enum(enumeration)) => FieldType::Enum {
                    values: enumeration
                        .members
                        .iter()
                        .map(|member| member.name.clone())
                        .collect(),
                },
                Some(DeclaredType::Entity(_)) => FieldType::Object { fields: Vec::new() },
                None => FieldType::Any,
            },
            TypeRef::Unknown(_) => FieldType::Any,
        };

        if is_collection {
            FieldType::Array {
                items: Box::new(item),
            }
        } else {
            item
        }
    }

    /// Fields of a complex type including those inherited from its base chain.
    fn complex_fields(
        &self,
        complex: &ComplexType,
        visiting: &mut HashSet<QualifiedName>,
    ) -> Vec<FieldSpec> {
        let mut chain = vec![complex];
        let mut current = complex.base_type.as_ref();
        while let Some(base) = current {
            let Some(parent) = self.model.complex_type(base) else {
                break;
            };
            if chain.iter().any(|seen| seen.name == parent.name) {
                break;
            }
            chain.push(parent);
            current = parent.base_type.as_ref();
        }

        chain
            .into_iter()
            .rev()
            .flat_map(|complex| complex.properties.iter())
            .map(|property| self.property_field_inner(property, !property.nullable, visiting))
            .collect()
    }
}

fn describe(type_ref: &TypeRef, is_collection: bool) -> String {
    if is_collection {
        format!("Collection({type_ref})")
    } else {
        type_ref.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odata_model::{EnumMember, EnumType, PrimitiveType};

    fn property(name: &str, type_ref: TypeRef, nullable: bool) -> Property {
        Property {
            name: name.to_string(),
            type_ref,
            nullable,
            is_collection: false,
            max_length: None,
        }
    }

    #[test]
    fn complex_types_expand_and_guard_cycles() {
        let node = QualifiedName::new("Demo", "Node");
        let mut model = SchemaModel::default();
        model.complex_types.insert(
            node.clone(),
            ComplexType {
                name: node.clone(),
                properties: vec![
                    property("Label", TypeRef::Primitive(PrimitiveType::String), false),
                    property("Next", TypeRef::Named(node.clone()), true),
                ],
                navigation_properties: Vec::new(),
                base_type: None,
            },
        );

        let builder = ContractBuilder::new(&model);
        let field = builder.property_field(&property("Head", TypeRef::Named(node), true), false);
        let FieldType::Object { fields } = &field.field_type else {
            panic!("complex property should map to an object");
        };
        assert_eq!(fields.len(), 2);
        assert!(fields[0].required);
        assert_eq!(
            fields[1].field_type,
            FieldType::Object { fields: Vec::new() },
            "self reference stops at one level"
        );
    }

    #[test]
    fn enums_and_collections_map_to_schema() {
        let tier = QualifiedName::new("Demo", "Tier");
        let mut model = SchemaModel::default();
        model.enum_types.insert(
            tier.clone(),
            EnumType {
                name: tier.clone(),
                members: vec![
                    EnumMember {
                        name: "Bronze".to_string(),
                        value: Some(0),
                    },
                    EnumMember {
                        name: "Gold".to_string(),
                        value: Some(1),
                    },
                ],
                is_flags: false,
            },
        );
        let builder = ContractBuilder::new(&model);
        let mut tiers = property("Tiers", TypeRef::Named(tier), true);
        tiers.is_collection = true;
        let contract = InputContract {
            fields: vec![builder.property_field(&tiers, true)],
        };

        let schema = contract.to_json_schema();
        assert_eq!(schema["required"], json!(["Tiers"]));
        assert_eq!(schema["properties"]["Tiers"]["type"], "array");
        assert_eq!(
            schema["properties"]["Tiers"]["items"]["enum"],
            json!(["Bronze", "Gold"])
        );
    }

    #[test]
    fn unknown_types_accept_any_value() {
        let model = SchemaModel::default();
        let builder = ContractBuilder::new(&model);
        let field = builder.property_field(
            &property("Shape", TypeRef::Unknown("Vendor.Shape".to_string()), true),
            false,
        );
        assert_eq!(field.field_type, FieldType::Any);
    }
}
