//! YAML documents → JSON value trees.

use serde_json::{Map, Value};

/// Parse a YAML document; accept it only as a non-empty mapping.
pub(crate) fn parse_mapping(text: &str) -> Option<Map<String, Value>> {
    match parse(text) {
        Ok(Value::Object(map)) if !map.is_empty() => Some(map),
        Ok(_) => None,
        Err(e) => {
            tracing::trace!(error = %e, "YAML parse failed");
            None
        }
    }
}

pub(crate) fn parse(text: &str) -> Result<Value, serde_yaml::Error> {
    serde_yaml::from_str::<serde_yaml::Value>(text).map(to_json)
}

fn to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(items.into_iter().map(to_json).collect()),
        serde_yaml::Value::Mapping(mapping) => Value::Object(
            mapping
                .into_iter()
                .map(|(key, value)| (key_string(key), to_json(value)))
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => to_json(tagged.value),
    }
}

/// Mapping keys become strings: `1: x` is keyed `"1"`.
fn key_string(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_structures_convert() {
        let value = parse("Title: Hi\nCount: 3\nRatio: 0.5\nTags:\n  - a\n  - b\nAuthor:\n  Name: Ann\n").unwrap();
        assert_eq!(
            value,
            json!({"Title": "Hi", "Count": 3, "Ratio": 0.5, "Tags": ["a", "b"], "Author": {"Name": "Ann"}})
        );
    }

    #[test]
    fn non_string_keys_are_stringified() {
        let map = parse_mapping("1: one\ntrue: yes\n").unwrap();
        assert_eq!(map.get("1"), Some(&json!("one")));
        assert_eq!(map.get("true"), Some(&json!("yes")));
    }

    #[test]
    fn key_order_is_preserved() {
        let map = parse_mapping("Zed: 1\nAlpha: 2\n").unwrap();
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Zed", "Alpha"]);
    }

    #[test]
    fn scalars_and_empty_mappings_are_rejected() {
        assert!(parse_mapping("just words").is_none());
        assert!(parse_mapping("{}").is_none());
        assert!(parse_mapping("- a\n- b").is_none());
    }
}
