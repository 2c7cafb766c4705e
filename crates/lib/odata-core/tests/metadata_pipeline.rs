use std::path::PathBuf;
use std::sync::Arc;

use odata_core::generator::{
    FieldType,
    GenerationOptions,
    HttpMethod,
    NamingPattern,
    ToolKind,
    generate,
};
use odata_core::parsers::CsdlXmlParser;
use odata_core::routing::{McpCommand, RouteEntry, RouteRegistry, RouteTable};
use odata_core::services::{
    CatalogError,
    LoadMetadataFuture,
    ToolCatalog,
    ToolCatalogConfig,
};
use odata_model::{QualifiedName, SchemaModel};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn load_fixture(name: &str) -> String {
    let path = fixture_path(name);
    std::fs::read_to_string(&path).unwrap_or_else(|err| {
        let path_display = path.display();
        panic!("failed to read metadata fixture at {path_display}: {err}")
    })
}

fn parse_fixture(name: &str) -> SchemaModel {
    CsdlXmlParser::parse(&load_fixture(name))
        .unwrap_or_else(|err| panic!("failed to parse metadata fixture {name}: {err}"))
}

#[tokio::test]
async fn parses_fixture_from_disk() {
    let model = CsdlXmlParser::parse_file(fixture_path("trippin.xml"))
        .await
        .expect("fixture should parse");

    assert!(!model.has_warnings(), "unexpected warnings: {:?}", model.warnings);
    assert_eq!(model.entity_types.len(), 4);
    assert_eq!(model.namespaces.len(), 2);

    let people = model.entity_set("People").expect("people set");
    assert_eq!(
        people.entity_type,
        QualifiedName::new("Trippin.Model", "Person"),
        "alias declared in a later schema resolves"
    );
    assert_eq!(people.navigation_bindings.len(), 2);
}

#[test]
fn reordered_documents_yield_equal_models() {
    let forward = parse_fixture("trippin.xml");
    let reordered = parse_fixture("trippin_reordered.xml");
    assert_eq!(forward, reordered);
    assert_eq!(forward, parse_fixture("trippin.xml"));
}

#[test]
fn product_set_yields_crud_and_query_tools() {
    let model = parse_fixture("trippin.xml");
    let report = generate(&model, &GenerationOptions::default());

    for name in [
        "Products_query",
        "Products_get",
        "Products_create",
        "Products_update",
        "Products_delete",
    ] {
        assert!(report.tool(name).is_some(), "missing tool {name}");
    }

    let get = report.tool("Products_get").expect("get tool");
    assert_eq!(get.input.fields.len(), 1);
    assert_eq!(get.input.fields[0].name, "Id");
    assert!(get.input.fields[0].required);
    assert_eq!(get.input.fields[0].field_type, FieldType::Integer);
    assert_eq!(
        get.input_schema()["properties"]["Id"]["type"],
        serde_json::json!("integer")
    );
}

#[test]
fn contracts_follow_keys_for_every_set() {
    let model = parse_fixture("trippin.xml");
    let report = generate(&model, &GenerationOptions::default());

    for (_, set) in model.entity_sets() {
        let entity = model.entity_type(&set.entity_type).expect("declared type");
        let properties = model.all_properties(&entity.name);

        let get = report
            .tool(&format!("{}_get", set.name))
            .expect("get tool");
        assert_eq!(get.input.required_names().collect::<Vec<_>>(), entity.key);

        let delete = report
            .tool(&format!("{}_delete", set.name))
            .expect("delete tool");
        assert_eq!(delete.input.names().collect::<Vec<_>>(), entity.key);

        let create = report
            .tool(&format!("{}_create", set.name))
            .expect("create tool");
        let expected: Vec<&str> = properties
            .iter()
            .filter(|property| !entity.key.contains(&property.name))
            .map(|property| property.name.as_str())
            .collect();
        assert_eq!(create.input.names().collect::<Vec<_>>(), expected);
    }
}

#[test]
fn structured_properties_expand_in_contracts() {
    let model = parse_fixture("trippin.xml");
    let report = generate(&model, &GenerationOptions::default());

    let create = report.tool("People_create").expect("people create");
    let schema = create.input_schema();
    assert_eq!(
        schema["properties"]["Gender"]["enum"],
        serde_json::json!(["Male", "Female", "Unknown"])
    );
    assert_eq!(
        schema["properties"]["HomeAddress"]["properties"]["City"]["properties"]["Region"]["type"],
        "string"
    );
    assert_eq!(schema["properties"]["Emails"]["type"], "array");
    assert_eq!(schema["required"], serde_json::json!(["FirstName"]));

    let get = report.tool("People_get").expect("people get");
    assert_eq!(
        get.input_schema()["properties"]["UserName"]["maxLength"],
        64
    );
}

#[test]
fn operations_and_navigation_have_paths() {
    let model = parse_fixture("trippin.xml");
    let report = generate(&model, &GenerationOptions::default());

    let trips = report.tool("People_get_Trips").expect("trips navigation");
    assert_eq!(trips.path_template, "People({UserName})/Trips");
    assert!(trips.input.field("filter").is_some());

    let traveller = report.tool("Trips_get_Traveller").expect("traveller navigation");
    assert!(traveller.input.field("filter").is_none());

    let share = report.tool("People_ShareTrip").expect("bound action");
    assert_eq!(share.method, HttpMethod::Post);
    assert_eq!(
        share.input.names().collect::<Vec<_>>(),
        ["UserName", "userName", "tripId"]
    );

    let nearest = report
        .tool("Container_GetNearestAirport")
        .expect("function import");
    assert_eq!(nearest.kind, ToolKind::Function);
    assert_eq!(nearest.method, HttpMethod::Get);
    assert_eq!(nearest.entity_set.as_deref(), Some("Airports"));

    let reset = report.tool("Container_ResetDataSource").expect("action import");
    assert_eq!(reset.kind, ToolKind::Action);
    assert!(reset.input.fields.is_empty());
}

#[test]
fn truncation_is_deterministic_for_every_cap() {
    let model = parse_fixture("trippin.xml");
    let full = generate(&model, &GenerationOptions::default().with_max_tool_count(usize::MAX));
    assert!(!full.is_truncated());

    for cap in [0, 1, 7, full.tools.len()] {
        let options = GenerationOptions::default().with_max_tool_count(cap);
        let first = generate(&model, &options);
        let second = generate(&model, &options);
        assert_eq!(first, second);
        assert_eq!(first.tools.len(), cap);
        assert_eq!(first.tools.as_slice(), &full.tools[..cap]);
        assert_eq!(first.truncated, full.tools.len() - cap);
    }
}

#[test]
fn naming_pattern_applies_to_every_tool() {
    let model = parse_fixture("trippin.xml");
    let pattern = NamingPattern::new("{namespace}.{entity}.{operation}").expect("valid pattern");
    let report = generate(&model, &GenerationOptions::default().with_naming_pattern(pattern));
    assert!(report.tool("Trippin.Service.Products.get").is_some());
    assert!(report.names().all(|name| name.starts_with("Trippin.Service.")));
}

fn file_catalog() -> ToolCatalog {
    let load = Arc::new(|entry: Arc<RouteEntry>| {
        Box::pin(async move {
            let file = entry
                .metadata
                .get("metadata")
                .ok_or_else(|| CatalogError::UnknownNamespace(entry.name.clone()))?;
            tokio::fs::read_to_string(fixture_path(file))
                .await
                .map_err(|err| CatalogError::LoadFailed(err.to_string()))
        }) as LoadMetadataFuture
    });
    ToolCatalog::new(ToolCatalogConfig::new(load))
}

#[tokio::test]
async fn routed_paths_reach_generated_tools() {
    let mut registry = RouteRegistry::new();
    registry
        .register(RouteEntry::new("trippin", "/api/trippin/").with_metadata("metadata", "trippin.xml"))
        .expect("register trippin");
    registry
        .register(RouteEntry::new("ghost", "ghost"))
        .expect("register ghost");
    let table = RouteTable::from_registry(&registry);
    let catalog = file_catalog();

    let found = table
        .try_match("/API/Trippin/MCP/tools/People_get")
        .expect("route resolves");
    assert_eq!(found.command, McpCommand::ToolInfo("People_get"));
    let batch = catalog
        .get_or_generate(&found.entry)
        .await
        .expect("batch generates");
    assert!(batch.tool("People_get").is_some());
    assert_eq!(batch.listings().len(), batch.tools().len());

    let ghost = table.try_match("/ghost/mcp").expect("ghost route");
    let err = catalog.get_or_generate(&ghost.entry).await.unwrap_err();
    assert!(matches!(err, CatalogError::UnknownNamespace(name) if name == "ghost"));
    assert_eq!(catalog.cached_namespaces().await, ["trippin"]);
}
