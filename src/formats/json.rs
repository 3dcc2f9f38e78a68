use std::path::Path;

use toml::{Table, Value};

use crate::error::ScopefigError;
use crate::types::FormatKind;

pub fn decode(content: &str, path: &Path) -> Result<Table, ScopefigError> {
    if content.trim().is_empty() {
        return Ok(Table::new());
    }
    let doc: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| ScopefigError::parse(path, FormatKind::Json, e))?;
    super::expect_table(to_toml(doc), FormatKind::Json, path)
}

/// Convert a JSON value. `null` has no TOML counterpart and is dropped,
/// both as a map entry and as an array element.
fn to_toml(value: serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(Value::Boolean(b)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Float)),
        serde_json::Value::String(s) => Some(Value::String(s)),
        serde_json::Value::Array(items) => {
            Some(Value::Array(items.into_iter().filter_map(to_toml).collect()))
        }
        serde_json::Value::Object(map) => Some(Value::Table(
            map.into_iter()
                .filter_map(|(k, v)| to_toml(v).map(|v| (k, v)))
                .collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_nested_object() {
        let t = decode(
            r#"{"port": 8080, "database": {"url": "pg://", "ratio": 0.5}}"#,
            Path::new("a.json"),
        )
        .unwrap();
        assert_eq!(t["port"].as_integer(), Some(8080));
        assert_eq!(t["database"]["ratio"].as_float(), Some(0.5));
    }

    #[test]
    fn nulls_are_dropped() {
        let t = decode(r#"{"url": null, "tags": ["a", null]}"#, Path::new("a.json")).unwrap();
        assert!(!t.contains_key("url"));
        assert_eq!(t["tags"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn top_level_array_is_rejected() {
        let err = decode("[1, 2]", Path::new("a.json")).unwrap_err();
        assert!(matches!(
            err,
            ScopefigError::InvalidDocument {
                kind: FormatKind::Json,
                ..
            }
        ));
    }

    #[test]
    fn empty_file_is_empty_table() {
        assert!(decode("  \n", Path::new("a.json")).unwrap().is_empty());
    }
}
