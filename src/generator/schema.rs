use serde_json::{Map, Value, json};

/// Build a placeholder value that conforms to a JSON schema: objects get
/// every declared property, arrays one element, enums their first variant.
pub fn sample(schema: &Value) -> Value {
    if let Some(value) = schema.get("const") {
        return value.clone();
    }
    if let Some(first) = schema
        .get("enum")
        .and_then(Value::as_array)
        .and_then(|v| v.first())
    {
        return first.clone();
    }
    if let Some(value) = schema.get("default") {
        return value.clone();
    }
    for key in ["anyOf", "oneOf", "allOf"] {
        if let Some(first) = schema
            .get(key)
            .and_then(Value::as_array)
            .and_then(|v| v.first())
        {
            return sample(first);
        }
    }

    match schema_type(schema) {
        "object" => {
            let mut map = Map::new();
            if let Some(props) = schema.get("properties").and_then(Value::as_object) {
                for (name, prop) in props {
                    map.insert(name.clone(), sample(prop));
                }
            }
            Value::Object(map)
        }
        "array" => Value::Array(schema.get("items").map(|i| vec![sample(i)]).unwrap_or_default()),
        "integer" => json!(0),
        "number" => json!(0.0),
        "boolean" => json!(false),
        "null" => Value::Null,
        _ => json!("string"),
    }
}

fn schema_type(schema: &Value) -> &str {
    match schema.get("type") {
        Some(Value::String(t)) => t.as_str(),
        // ["string", "null"] style unions take the first non-null type
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .unwrap_or("null"),
        _ if schema.get("properties").is_some() => "object",
        _ => "string",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_schema() {
        let schema = json!({
            "type": "object",
            "properties": {
                "city": {"type": "string"},
                "unit": {"type": "string", "enum": ["celsius", "fahrenheit"]},
                "days": {"type": "integer"},
                "tags": {"type": "array", "items": {"type": "boolean"}},
                "note": {"type": ["null", "number"]}
            },
            "required": ["city"]
        });
        assert_eq!(
            sample(&schema),
            json!({
                "city": "string",
                "unit": "celsius",
                "days": 0,
                "tags": [false],
                "note": 0.0
            })
        );
    }

    #[test]
    fn test_untyped_schema_is_string() {
        assert_eq!(sample(&json!({})), json!("string"));
        assert_eq!(sample(&json!({"anyOf": [{"type": "integer"}]})), json!(0));
    }
}
