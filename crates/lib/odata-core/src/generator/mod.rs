//! Tool generation from a parsed schema model.
//!
//! Generation walks containers in qualified-name order, entity sets in name
//! order, and emits tools per set in a fixed kind order (query, get, create,
//! update, delete, navigation, bound operations), followed by the container's
//! operation imports. The walk is deterministic, so a capped batch is always
//! the same prefix of the uncapped one.

pub mod contract;
pub mod definition;
pub mod examples;
pub mod naming;

use std::collections::HashSet;

use odata_model::{
    EntityContainer,
    EntitySet,
    EntityType,
    NavigationProperty,
    Operation,
    OperationImport,
    OperationKind,
    SchemaModel,
    TypeRef,
};
use tracing::{debug, info};

pub use contract::{FieldSpec, FieldType, InputContract};
pub use definition::{GenerationReport, HttpMethod, SkipReason, SkippedTool, ToolDefinition, ToolKind};
pub use naming::{NameParts, NamingPattern, PatternError};

use contract::{ContractBuilder, query_fields};
use examples::example_payload;

pub const DEFAULT_MAX_TOOL_COUNT: usize = 256;

/// Switches and limits for one generation run.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct GenerationOptions {
    pub generate_crud_tools: bool,
    pub generate_query_tools: bool,
    pub generate_navigation_tools: bool,
    pub generate_operation_tools: bool,
    pub include_examples: bool,
    pub max_tool_count: usize,
    pub naming_pattern: NamingPattern,
}

impl GenerationOptions {
    #[must_use]
    pub const fn with_crud_tools(mut self, enabled: bool) -> Self {
        self.generate_crud_tools = enabled;
        self
    }

    #[must_use]
    pub const fn with_query_tools(mut self, enabled: bool) -> Self {
        self.generate_query_tools = enabled;
        self
    }

    #[must_use]
    pub const fn with_navigation_tools(mut self, enabled: bool) -> Self {
        self.generate_navigation_tools = enabled;
        self
    }

    #[must_use]
    pub const fn with_operation_tools(mut self, enabled: bool) -> Self {
        self.generate_operation_tools = enabled;
        self
    }

    #[must_use]
    pub const fn with_examples(mut self, enabled: bool) -> Self {
        self.include_examples = enabled;
        self
    }

    #[must_use]
    pub const fn with_max_tool_count(mut self, max_tool_count: usize) -> Self {
        self.max_tool_count = max_tool_count;
        self
    }

    #[must_use]
    pub fn with_naming_pattern(mut self, naming_pattern: NamingPattern) -> Self {
        self.naming_pattern = naming_pattern;
        self
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            generate_crud_tools: true,
            generate_query_tools: true,
            generate_navigation_tools: true,
            generate_operation_tools: true,
            include_examples: true,
            max_tool_count: DEFAULT_MAX_TOOL_COUNT,
            naming_pattern: NamingPattern::default(),
        }
    }
}

/// Generates the tool batch for a model. Pure; performs no I/O.
#[must_use]
pub fn generate(model: &SchemaModel, options: &GenerationOptions) -> GenerationReport {
    ToolGenerator::new(model, options).run()
}

/// Per-entity-set values shared by every tool generated for the set.
struct SetScope<'a> {
    container: &'a EntityContainer,
    set: &'a EntitySet,
    entity: &'a EntityType,
    key_fields: Option<Vec<FieldSpec>>,
    key_segment: String,
}

impl SetScope<'_> {
    fn parts<'p>(&'p self, operation: &'p str) -> NameParts<'p> {
        NameParts {
            namespace: &self.container.name.namespace,
            container: &self.container.name.name,
            entity: &self.set.name,
            type_name: &self.entity.name.name,
            operation,
        }
    }
}

struct ToolGenerator<'m> {
    model: &'m SchemaModel,
    options: &'m GenerationOptions,
    contracts: ContractBuilder<'m>,
    names: HashSet<String>,
    report: GenerationReport,
}

impl<'m> ToolGenerator<'m> {
    fn new(model: &'m SchemaModel, options: &'m GenerationOptions) -> Self {
        Self {
            model,
            options,
            contracts: ContractBuilder::new(model),
            names: HashSet::new(),
            report: GenerationReport::default(),
        }
    }

    fn run(mut self) -> GenerationReport {
        let model = self.model;
        for container in model.containers.values() {
            for set in container.entity_sets.values() {
                self.entity_set_tools(container, set);
            }
            if self.options.generate_operation_tools {
                for import in &container.operation_imports {
                    self.import_tools(container, import);
                }
            }
        }

        info!(
            tools = self.report.tools.len(),
            skipped = self.report.skipped.len(),
            truncated = self.report.truncated,
            "generated tool batch"
        );
        self.report
    }

    fn entity_set_tools(&mut self, container: &'m EntityContainer, set: &'m EntitySet) {
        let model = self.model;
        let Some(entity) = model.entity_type(&set.entity_type) else {
            self.skip(&set.name, ToolKind::Query, SkipReason::UnresolvedTarget {
                reference: set.entity_type.to_string(),
            });
            return;
        };
        let scope = self.scope(container, set, entity);

        if self.options.generate_query_tools {
            self.query_tool(&scope);
        }
        if self.options.generate_crud_tools {
            self.crud_tools(&scope);
        }
        if self.options.generate_navigation_tools {
            for navigation in model.all_navigation_properties(&entity.name) {
                self.navigation_tool(&scope, navigation);
            }
        }
        if self.options.generate_operation_tools {
            let bound: Vec<&Operation> = model
                .all_operations()
                .filter(|operation| {
                    operation.binding.as_ref().is_some_and(|binding| {
                        model.is_assignable(&entity.name, &binding.entity_type)
                    })
                })
                .collect();
            for operation in bound {
                self.bound_operation_tool(&scope, operation);
            }
        }
    }

    fn scope(
        &self,
        container: &'m EntityContainer,
        set: &'m EntitySet,
        entity: &'m EntityType,
    ) -> SetScope<'m> {
        let properties = self.model.all_properties(&entity.name);
        let key_fields: Vec<FieldSpec> = entity
            .key
            .iter()
            .filter_map(|key| properties.iter().find(|property| &property.name == key))
            .map(|property| self.contracts.property_field(property, true))
            .collect();
        let key_fields =
            (!entity.key.is_empty() && key_fields.len() == entity.key.len()).then_some(key_fields);
        let key_segment = match entity.key.as_slice() {
            [single] => format!("({{{single}}})"),
            keys => {
                let pairs: Vec<String> = keys.iter().map(|key| format!("{key}={{{key}}}")).collect();
                format!("({})", pairs.join(","))
            }
        };
        SetScope {
            container,
            set,
            entity,
            key_fields,
            key_segment,
        }
    }

    fn query_tool(&mut self, scope: &SetScope<'_>) {
        let kind = ToolKind::Query;
        let tool = self.definition(
            scope,
            kind,
            kind.as_str(),
            format!(
                "Query {} ({}) with optional $filter, $orderby, $select, $top, $skip and $count.",
                scope.set.name, scope.entity.name
            ),
            scope.set.name.clone(),
            query_fields(),
        );
        self.emit(tool, &scope.set.name);
    }

    fn crud_tools(&mut self, scope: &SetScope<'_>) {
        let Some(key_fields) = scope.key_fields.clone() else {
            for kind in [ToolKind::Get, ToolKind::Create, ToolKind::Update, ToolKind::Delete] {
                self.skip(&scope.set.name, kind, SkipReason::MissingKey {
                    entity_type: scope.entity.name.clone(),
                });
            }
            return;
        };

        let set = &scope.set.name;
        let entity = &scope.entity.name;
        let keyed_path = format!("{set}{}", scope.key_segment);
        let non_key: Vec<FieldSpec> = self
            .model
            .all_properties(entity)
            .into_iter()
            .filter(|property| !scope.entity.key.contains(&property.name))
            .map(|property| {
                self.contracts
                    .property_field(property, !property.nullable && !property.is_collection)
            })
            .collect();
        let optional: Vec<FieldSpec> = non_key
            .iter()
            .cloned()
            .map(|mut field| {
                field.required = false;
                field
            })
            .collect();

        let get = self.definition(
            scope,
            ToolKind::Get,
            ToolKind::Get.as_str(),
            format!("Get a single {entity} from {set} by key."),
            keyed_path.clone(),
            key_fields.clone(),
        );
        self.emit(get, set);

        let create = self.definition(
            scope,
            ToolKind::Create,
            ToolKind::Create.as_str(),
            format!("Create a new {entity} in {set}."),
            set.clone(),
            non_key,
        );
        self.emit(create, set);

        let update = self.definition(
            scope,
            ToolKind::Update,
            ToolKind::Update.as_str(),
            format!("Update an existing {entity} in {set}; only supplied properties change."),
            keyed_path.clone(),
            key_fields.iter().cloned().chain(optional).collect(),
        );
        self.emit(update, set);

        let delete = self.definition(
            scope,
            ToolKind::Delete,
            ToolKind::Delete.as_str(),
            format!("Delete a {entity} from {set} by key."),
            keyed_path,
            key_fields,
        );
        self.emit(delete, set);
    }

    fn navigation_tool(&mut self, scope: &SetScope<'_>, navigation: &NavigationProperty) {
        let subject = format!("{}/{}", scope.set.name, navigation.name);
        let Some(key_fields) = scope.key_fields.clone() else {
            self.skip(&subject, ToolKind::Navigate, SkipReason::MissingKey {
                entity_type: scope.entity.name.clone(),
            });
            return;
        };
        let target = match &navigation.target {
            TypeRef::Named(target) if self.model.resolve(target).is_some() => target,
            other => {
                self.skip(&subject, ToolKind::Navigate, SkipReason::UnresolvedTarget {
                    reference: other.to_string(),
                });
                return;
            }
        };

        let is_collection = navigation.multiplicity.is_collection();
        let mut fields = key_fields;
        if is_collection {
            fields.extend(query_fields());
        }
        let description = if is_collection {
            format!(
                "List the {target} entities related to a {} through {}.",
                scope.entity.name, navigation.name
            )
        } else {
            format!(
                "Get the {target} related to a {} through {}.",
                scope.entity.name, navigation.name
            )
        };
        let operation = format!("get_{}", navigation.name);
        let tool = self.definition(
            scope,
            ToolKind::Navigate,
            &operation,
            description,
            format!("{}{}/{}", scope.set.name, scope.key_segment, navigation.name),
            fields,
        );
        self.emit(tool, &subject);
    }

    fn bound_operation_tool(&mut self, scope: &SetScope<'_>, operation: &Operation) {
        let Some(binding) = &operation.binding else {
            return;
        };
        let kind = operation_tool_kind(operation.kind);
        let subject = format!("{}/{}", scope.set.name, operation.name);

        let mut fields = Vec::new();
        let path_template = if binding.is_collection {
            format!("{}/{}", scope.set.name, operation.name)
        } else {
            let Some(key_fields) = scope.key_fields.clone() else {
                self.skip(&subject, kind, SkipReason::MissingKey {
                    entity_type: scope.entity.name.clone(),
                });
                return;
            };
            fields.extend(key_fields);
            format!("{}{}/{}", scope.set.name, scope.key_segment, operation.name)
        };
        fields.extend(
            operation
                .parameters
                .iter()
                .map(|parameter| self.contracts.parameter_field(parameter)),
        );

        let target = if binding.is_collection {
            format!("the {} collection", scope.set.name)
        } else {
            format!("a single {} in {}", scope.entity.name, scope.set.name)
        };
        let mut tool = self.definition(
            scope,
            kind,
            &operation.name.name,
            format!(
                "Invoke the {} {} bound to {target}.{}",
                operation.name,
                operation.kind.as_str(),
                describe_return(operation)
            ),
            path_template,
            fields,
        );
        tool.operation = Some(operation.name.clone());
        self.emit(tool, &subject);
    }

    fn import_tools(&mut self, container: &EntityContainer, import: &OperationImport) {
        let model = self.model;
        let Some(overloads) = model.operations.get(&import.operation) else {
            return;
        };
        for operation in overloads.iter().filter(|operation| operation.binding.is_none()) {
            let kind = operation_tool_kind(operation.kind);
            let parts = NameParts {
                namespace: &container.name.namespace,
                container: &container.name.name,
                entity: &container.name.name,
                type_name: "",
                operation: &import.name,
            };
            let fields = operation
                .parameters
                .iter()
                .map(|parameter| self.contracts.parameter_field(parameter))
                .collect();
            let tool = ToolDefinition {
                name: self.options.naming_pattern.render(&parts),
                description: format!(
                    "Invoke the {} {} exposed by {}.{}",
                    import.name,
                    operation.kind.as_str(),
                    container.name,
                    describe_return(operation)
                ),
                kind,
                namespace: container.name.namespace.clone(),
                entity_set: import.entity_set.clone(),
                entity_type: None,
                operation: Some(operation.name.clone()),
                method: kind.method(),
                path_template: import.name.clone(),
                input: InputContract { fields },
                examples: Vec::new(),
            };
            let subject = format!("{}/{}", container.name, import.name);
            self.emit(tool, &subject);
        }
    }

    fn definition(
        &self,
        scope: &SetScope<'_>,
        kind: ToolKind,
        operation: &str,
        description: String,
        path_template: String,
        fields: Vec<FieldSpec>,
    ) -> ToolDefinition {
        ToolDefinition {
            name: self.options.naming_pattern.render(&scope.parts(operation)),
            description,
            kind,
            namespace: scope.container.name.namespace.clone(),
            entity_set: Some(scope.set.name.clone()),
            entity_type: Some(scope.entity.name.clone()),
            operation: None,
            method: kind.method(),
            path_template,
            input: InputContract { fields },
            examples: Vec::new(),
        }
    }

    fn emit(&mut self, mut tool: ToolDefinition, subject: &str) {
        if self.report.tools.len() >= self.options.max_tool_count {
            self.report.truncated += 1;
            return;
        }
        if !self.names.insert(tool.name.clone()) {
            self.skip(subject, tool.kind, SkipReason::NamingConflict { name: tool.name });
            return;
        }
        if self.options.include_examples {
            tool.examples.push(example_payload(tool.kind, &tool.input));
        }
        self.report.tools.push(tool);
    }

    fn skip(&mut self, subject: &str, kind: ToolKind, reason: SkipReason) {
        debug!(subject, %kind, %reason, "skipped tool");
        self.report.skipped.push(SkippedTool {
            subject: subject.to_string(),
            kind,
            reason,
        });
    }
}

const fn operation_tool_kind(kind: OperationKind) -> ToolKind {
    match kind {
        OperationKind::Action => ToolKind::Action,
        OperationKind::Function => ToolKind::Function,
    }
}

fn describe_return(operation: &Operation) -> String {
    operation.return_type.as_ref().map_or_else(String::new, |returns| {
        if returns.is_collection {
            format!(" Returns a collection of {}.", returns.type_ref)
        } else {
            format!(" Returns {}.", returns.type_ref)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::CsdlXmlParser;

    const CATALOG: &str = r#"<edmx:Edmx Version="4.0" xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx">
  <edmx:DataServices>
    <Schema Namespace="Demo" xmlns="http://docs.oasis-open.org/odata/ns/edm">
      <EntityType Name="Product">
        <Key><PropertyRef Name="Id"/></Key>
        <Property Name="Id" Type="Edm.Int32" Nullable="false"/>
        <Property Name="Name" Type="Edm.String" Nullable="false" MaxLength="40"/>
        <Property Name="Price" Type="Edm.Decimal"/>
        <NavigationProperty Name="Supplier" Type="Demo.Supplier"/>
        <NavigationProperty Name="Reviews" Type="Collection(Demo.Review)"/>
      </EntityType>
      <EntityType Name="Supplier">
        <Key><PropertyRef Name="Id"/></Key>
        <Property Name="Id" Type="Edm.Int32" Nullable="false"/>
      </EntityType>
      <EntityType Name="Review">
        <Key>
          <PropertyRef Name="ProductId"/>
          <PropertyRef Name="Author"/>
        </Key>
        <Property Name="ProductId" Type="Edm.Int32" Nullable="false"/>
        <Property Name="Author" Type="Edm.String" Nullable="false"/>
        <Property Name="Text" Type="Edm.String"/>
      </EntityType>
      <EntityType Name="LogLine">
        <Property Name="Message" Type="Edm.String"/>
      </EntityType>
      <Action Name="Discontinue" IsBound="true">
        <Parameter Name="product" Type="Demo.Product"/>
        <Parameter Name="Reason" Type="Edm.String" Nullable="false"/>
      </Action>
      <Function Name="Cheapest" IsBound="true">
        <Parameter Name="products" Type="Collection(Demo.Product)"/>
        <ReturnType Type="Demo.Product"/>
      </Function>
      <Function Name="Ping">
        <ReturnType Type="Edm.Boolean"/>
      </Function>
      <EntityContainer Name="Service">
        <EntitySet Name="Logs" EntityType="Demo.LogLine"/>
        <EntitySet Name="Products" EntityType="Demo.Product"/>
        <EntitySet Name="Reviews" EntityType="Demo.Review"/>
        <EntitySet Name="Suppliers" EntityType="Demo.Supplier"/>
        <FunctionImport Name="Ping" Function="Demo.Ping"/>
      </EntityContainer>
    </Schema>
  </edmx:DataServices>
</edmx:Edmx>"#;

    fn model() -> SchemaModel {
        CsdlXmlParser::parse(CATALOG).expect("fixture parses")
    }

    #[test]
    fn entity_set_gets_query_and_crud_tools() {
        let report = generate(&model(), &GenerationOptions::default());
        for name in [
            "Products_query",
            "Products_get",
            "Products_create",
            "Products_update",
            "Products_delete",
        ] {
            assert!(report.tool(name).is_some(), "missing {name}");
        }

        let get = report.tool("Products_get").expect("get tool");
        assert_eq!(get.input.names().collect::<Vec<_>>(), ["Id"]);
        assert_eq!(get.input.required_names().collect::<Vec<_>>(), ["Id"]);
        assert_eq!(get.input.fields[0].field_type, FieldType::Integer);
        assert_eq!(get.method, HttpMethod::Get);
        assert_eq!(get.path_template, "Products({Id})");
    }

    #[test]
    fn create_and_update_contracts_follow_key_and_nullability() {
        let report = generate(&model(), &GenerationOptions::default());

        let create = report.tool("Products_create").expect("create tool");
        assert_eq!(create.input.names().collect::<Vec<_>>(), ["Name", "Price"]);
        assert_eq!(create.input.required_names().collect::<Vec<_>>(), ["Name"]);
        assert_eq!(create.method, HttpMethod::Post);

        let update = report.tool("Products_update").expect("update tool");
        assert_eq!(update.input.names().collect::<Vec<_>>(), ["Id", "Name", "Price"]);
        assert_eq!(update.input.required_names().collect::<Vec<_>>(), ["Id"]);
        assert_eq!(update.method, HttpMethod::Patch);

        let delete = report.tool("Products_delete").expect("delete tool");
        assert_eq!(delete.input.names().collect::<Vec<_>>(), ["Id"]);
        assert_eq!(delete.method, HttpMethod::Delete);
    }

    #[test]
    fn composite_keys_shape_paths() {
        let report = generate(&model(), &GenerationOptions::default());
        let get = report.tool("Reviews_get").expect("review get");
        assert_eq!(get.path_template, "Reviews(ProductId={ProductId},Author={Author})");
        assert_eq!(get.input.required_names().count(), 2);
    }

    #[test]
    fn keyless_sets_only_get_query_tools() {
        let report = generate(&model(), &GenerationOptions::default());
        assert!(report.tool("Logs_query").is_some());
        assert!(report.tool("Logs_get").is_none());
        let skipped: Vec<ToolKind> = report
            .skipped
            .iter()
            .filter(|skipped| skipped.subject == "Logs")
            .map(|skipped| skipped.kind)
            .collect();
        assert_eq!(
            skipped,
            [ToolKind::Get, ToolKind::Create, ToolKind::Update, ToolKind::Delete]
        );
        assert!(
            report
                .skipped
                .iter()
                .all(|skipped| matches!(skipped.reason, SkipReason::MissingKey { .. }))
        );
    }

    #[test]
    fn navigation_tools_add_query_fields_for_collections() {
        let report = generate(&model(), &GenerationOptions::default());

        let supplier = report.tool("Products_get_Supplier").expect("single navigation");
        assert_eq!(supplier.input.names().collect::<Vec<_>>(), ["Id"]);
        assert_eq!(supplier.path_template, "Products({Id})/Supplier");

        let reviews = report.tool("Products_get_Reviews").expect("collection navigation");
        assert!(reviews.input.field(contract::FIELD_FILTER).is_some());
        assert!(reviews.input.field(contract::FIELD_TOP).is_some());
        assert_eq!(reviews.kind, ToolKind::Navigate);
    }

    #[test]
    fn bound_and_unbound_operations_become_tools() {
        let report = generate(&model(), &GenerationOptions::default());

        let discontinue = report.tool("Products_Discontinue").expect("bound action");
        assert_eq!(discontinue.kind, ToolKind::Action);
        assert_eq!(discontinue.method, HttpMethod::Post);
        assert_eq!(discontinue.input.required_names().collect::<Vec<_>>(), ["Id", "Reason"]);
        assert_eq!(discontinue.path_template, "Products({Id})/Demo.Discontinue");

        let cheapest = report.tool("Products_Cheapest").expect("collection-bound function");
        assert!(cheapest.input.fields.is_empty());
        assert_eq!(cheapest.path_template, "Products/Demo.Cheapest");

        let ping = report.tool("Service_Ping").expect("function import");
        assert_eq!(ping.kind, ToolKind::Function);
        assert_eq!(ping.path_template, "Ping");
        assert_eq!(ping.entity_set, None);
    }

    #[test]
    fn switches_disable_tool_families() {
        let options = GenerationOptions::default()
            .with_crud_tools(false)
            .with_navigation_tools(false)
            .with_operation_tools(false);
        let report = generate(&model(), &options);
        assert!(report.tools.iter().all(|tool| tool.kind == ToolKind::Query));
        assert_eq!(report.tools.len(), 4);
    }

    #[test]
    fn cap_truncates_deterministically() {
        let model = model();
        let full = generate(&model, &GenerationOptions::default());
        let capped = generate(&model, &GenerationOptions::default().with_max_tool_count(3));

        assert_eq!(capped.tools.len(), 3);
        assert_eq!(capped.truncated, full.tools.len() - 3);
        assert!(capped.is_truncated());
        assert_eq!(
            capped.names().collect::<Vec<_>>(),
            full.names().take(3).collect::<Vec<_>>()
        );
        assert_eq!(capped, generate(&model, &GenerationOptions::default().with_max_tool_count(3)));
    }

    #[test]
    fn colliding_names_are_skipped() {
        let pattern = NamingPattern::new("{type}_{operation}").expect("valid pattern");
        let mut model = model();
        let container = model
            .containers
            .values_mut()
            .next()
            .expect("one container");
        let mut duplicate = container.entity_sets["Products"].clone();
        duplicate.name = "Catalog".to_string();
        container.entity_sets.insert(duplicate.name.clone(), duplicate);

        let report = generate(&model, &GenerationOptions::default().with_naming_pattern(pattern));
        let names: HashSet<&str> = report.names().collect();
        assert_eq!(names.len(), report.tools.len());
        assert!(report.skipped.iter().any(|skipped| {
            skipped.subject == "Products"
                && matches!(&skipped.reason, SkipReason::NamingConflict { name } if name == "Product_query")
        }));
    }

    #[test]
    fn examples_follow_options() {
        let with = generate(&model(), &GenerationOptions::default());
        let get = with.tool("Products_get").expect("get tool");
        assert_eq!(get.examples, [serde_json::json!({ "Id": 1 })]);

        let without = generate(&model(), &GenerationOptions::default().with_examples(false));
        assert!(without.tools.iter().all(|tool| tool.examples.is_empty()));
    }

    #[test]
    fn unresolved_navigation_targets_are_skipped() {
        let xml = r#"<Schema Namespace="Shop">
            <EntityType Name="Widget">
                <Key><PropertyRef Name="Id"/></Key>
                <Property Name="Id" Type="Edm.Int32" Nullable="false"/>
                <NavigationProperty Name="Maker" Type="Vendor.Missing"/>
                <NavigationProperty Name="Parts" Type="Collection(Shop.Widget)"/>
            </EntityType>
            <EntityContainer Name="Service"><EntitySet Name="Widgets" EntityType="Shop.Widget"/></EntityContainer>
        </Schema>"#;
        let model = CsdlXmlParser::parse(xml).expect("metadata should parse");
        assert!(model.has_warnings());

        let report = generate(&model, &GenerationOptions::default());
        assert_eq!(report.skipped.len(), 1);
        let skipped = &report.skipped[0];
        assert_eq!(skipped.subject, "Widgets/Maker");
        assert_eq!(skipped.kind, ToolKind::Navigate);
        assert!(matches!(
            &skipped.reason,
            SkipReason::UnresolvedTarget { reference } if reference.contains("Vendor.Missing")
        ));

        for name in [
            "Widgets_query",
            "Widgets_get",
            "Widgets_create",
            "Widgets_update",
            "Widgets_delete",
            "Widgets_get_Parts",
        ] {
            assert!(report.tool(name).is_some(), "missing tool {name}");
        }
        assert!(report.tool("Widgets_get_Maker").is_none());
    }
}
