use crate::core::model::{FlatMetadata, MetadataValue};
use serde_json::Value;

/// Recursively flatten a nested JSON object into a single-level map keyed by
/// `_`-joined paths. Lists and nested arrays are stringified (losslessly, via
/// their JSON rendering) rather than dropped — every input key survives in
/// some form, which is what makes this projection total.
pub fn flatten_metadata(metadata: &serde_json::Map<String, Value>) -> FlatMetadata {
    let mut out = FlatMetadata::new();
    flatten_into(metadata, "", &mut out);
    out
}

fn flatten_into(map: &serde_json::Map<String, Value>, prefix: &str, out: &mut FlatMetadata) {
    for (key, value) in map {
        let new_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}_{}", prefix, key)
        };
        insert_value(&new_key, value, out);
    }
}

fn insert_value(key: &str, value: &Value, out: &mut FlatMetadata) {
    match value {
        Value::Object(nested) => flatten_into(nested, key, out),
        Value::Array(_) => {
            out.insert(key.to_string(), MetadataValue::Str(value.to_string()));
        }
        Value::String(s) => {
            out.insert(key.to_string(), MetadataValue::Str(s.clone()));
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                out.insert(key.to_string(), MetadataValue::Int(i));
            } else if let Some(f) = n.as_f64() {
                out.insert(key.to_string(), MetadataValue::Float(f));
            }
        }
        Value::Bool(b) => {
            out.insert(key.to_string(), MetadataValue::Bool(*b));
        }
        Value::Null => {
            out.insert(key.to_string(), MetadataValue::Str(String::new()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_nested_object_with_underscore_join() {
        let input = json!({
            "structural_info": { "titles_count": 2, "tables_count": 0 },
            "source": "manual.pdf"
        });
        let flat = flatten_metadata(input.as_object().unwrap());
        assert_eq!(flat.get("structural_info_titles_count"), Some(&MetadataValue::Int(2)));
        assert_eq!(flat.get("source"), Some(&MetadataValue::Str("manual.pdf".to_string())));
    }

    #[test]
    fn arrays_are_stringified_not_dropped() {
        let input = json!({ "tags": ["a", "b", "c"] });
        let flat = flatten_metadata(input.as_object().unwrap());
        assert!(matches!(flat.get("tags"), Some(MetadataValue::Str(_))));
    }

    #[test]
    fn every_top_level_key_survives() {
        let input = json!({ "a": 1, "b": "x", "c": true, "d": null });
        let flat = flatten_metadata(input.as_object().unwrap());
        assert_eq!(flat.len(), 4);
    }
}
