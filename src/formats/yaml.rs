use std::path::Path;

use toml::{Table, Value};

use crate::error::ScopefigError;
use crate::types::FormatKind;

pub fn decode(content: &str, path: &Path) -> Result<Table, ScopefigError> {
    let doc: serde_yaml::Value = serde_yaml::from_str(content)
        .map_err(|e| ScopefigError::parse(path, FormatKind::Yaml, e))?;
    super::expect_table(to_toml(doc), FormatKind::Yaml, path)
}

/// Convert a YAML value. Nulls are dropped, tags are stripped, and non-string
/// mapping keys are rendered to strings.
fn to_toml(value: serde_yaml::Value) -> Option<Value> {
    match value {
        serde_yaml::Value::Null => None,
        serde_yaml::Value::Bool(b) => Some(Value::Boolean(b)),
        serde_yaml::Value::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Float)),
        serde_yaml::Value::String(s) => Some(Value::String(s)),
        serde_yaml::Value::Sequence(items) => {
            Some(Value::Array(items.into_iter().filter_map(to_toml).collect()))
        }
        serde_yaml::Value::Mapping(map) => Some(Value::Table(
            map.into_iter()
                .filter_map(|(k, v)| Some((key_string(k)?, to_toml(v)?)))
                .collect(),
        )),
        serde_yaml::Value::Tagged(tagged) => to_toml(tagged.value),
    }
}

fn key_string(key: serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
