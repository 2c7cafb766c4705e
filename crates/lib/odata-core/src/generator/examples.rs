use serde_json::{Map, Value, json};

use super::contract::{FIELD_COUNT, FIELD_TOP, FieldSpec, FieldType, InputContract};
use super::definition::ToolKind;

/// Builds a sample argument payload for a tool.
///
/// Create and update tools get every field, query tools a paging sample,
/// everything else only the required fields.
#[must_use]
pub fn example_payload(kind: ToolKind, contract: &InputContract) -> Value {
    let mut payload = Map::new();
    for field in &contract.fields {
        let include = match kind {
            ToolKind::Create | ToolKind::Update => true,
            ToolKind::Query => field.name == FIELD_TOP || field.name == FIELD_COUNT,
            _ => field.required || field.name == FIELD_TOP,
        };
        if include {
            payload.insert(field.name.clone(), sample_for(field));
        }
    }
    Value::Object(payload)
}

fn sample_for(field: &FieldSpec) -> Value {
    match field.name.as_str() {
        FIELD_TOP => json!(10),
        FIELD_COUNT => json!(true),
        _ => sample_value(&field.field_type),
    }
}

fn sample_value(field_type: &FieldType) -> Value {
    match field_type {
        FieldType::String { format, max_length } => {
            let sample = match format.as_deref() {
                Some("uuid") => "00000000-0000-0000-0000-000000000000",
                Some("date") => "2024-01-31",
                Some("date-time") => "2024-01-31T12:00:00Z",
                Some("time") => "12:00:00",
                Some("duration") => "PT1H",
                Some("byte") => "AA==",
                _ => "example",
            };
            let limit = max_length.map_or(sample.len(), |max| max as usize);
            json!(sample.get(..limit.min(sample.len())).unwrap_or(sample))
        }
        FieldType::Integer => json!(1),
        FieldType::Number => json!(1.5),
        FieldType::Boolean => json!(true),
        FieldType::Enum { values } => values.first().map_or(Value::Null, |value| json!(value)),
        FieldType::Array { items } => json!([sample_value(items)]),
        FieldType::Object { fields } => {
            let object: Map<String, Value> = fields
                .iter()
                .map(|field| (field.name.clone(), sample_value(&field.field_type)))
                .collect();
            Value::Object(object)
        }
        FieldType::Any => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::contract::query_fields;

    #[test]
    fn query_examples_only_page() {
        let contract = InputContract {
            fields: query_fields(),
        };
        assert_eq!(
            example_payload(ToolKind::Query, &contract),
            json!({ "top": 10, "count": true })
        );
    }

    #[test]
    fn get_examples_carry_required_fields() {
        let contract = InputContract {
            fields: vec![
                FieldSpec::new("Id", FieldType::Integer, true),
                FieldSpec::new(
                    "Code",
                    FieldType::String {
                        format: None,
                        max_length: Some(3),
                    },
                    true,
                ),
                FieldSpec::new("Note", FieldType::Boolean, false),
            ],
        };
        assert_eq!(
            example_payload(ToolKind::Get, &contract),
            json!({ "Id": 1, "Code": "exa" })
        );
    }
}
