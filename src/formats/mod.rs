//! Per-format decoders. Each one turns file text into a `toml::Table`, the
//! common tree every parser works on before imports are expanded and the
//! tree is flattened into directives.

use std::path::Path;

use toml::{Table, Value};

use crate::error::ScopefigError;
use crate::types::FormatKind;

mod ini;
mod json;
mod native;
#[cfg(feature = "xml")]
mod xml;
#[cfg(feature = "yaml")]
mod yaml;

/// Whether a decoder for `kind` is compiled in.
pub fn is_available(kind: FormatKind) -> bool {
    match kind {
        FormatKind::Yaml => cfg!(feature = "yaml"),
        FormatKind::Xml => cfg!(feature = "xml"),
        FormatKind::Ini | FormatKind::Toml | FormatKind::Json => true,
        FormatKind::Closure => false,
    }
}

/// Decode `content` read from `path` as `kind`.
pub fn decode(kind: FormatKind, content: &str, path: &Path) -> Result<Table, ScopefigError> {
    match kind {
        #[cfg(feature = "yaml")]
        FormatKind::Yaml => yaml::decode(content, path),
        #[cfg(feature = "xml")]
        FormatKind::Xml => xml::decode(content, path),
        FormatKind::Ini => ini::decode(content, path),
        FormatKind::Toml => native::decode(content, path),
        FormatKind::Json => json::decode(content, path),
        other => Err(ScopefigError::UnsupportedFormat(other.name().to_string())),
    }
}

/// Type an untyped scalar from a text format.
///
/// Tries: quoted string → bool → integer → float → string. Floats require a
/// `.` so that `inf` / `NaN` stay strings.
pub(crate) fn parse_scalar(raw: &str) -> Value {
    let s = raw.trim();
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        return Value::String(s[1..s.len() - 1].to_string());
    }
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => return Value::Boolean(true),
        "false" | "no" | "off" => return Value::Boolean(false),
        _ => {}
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if s.contains('.')
        && let Ok(f) = s.parse::<f64>()
    {
        return Value::Float(f);
    }
    Value::String(s.to_string())
}

/// Require a decoded document to be a mapping at the top level.
fn expect_table(value: Option<Value>, kind: FormatKind, path: &Path) -> Result<Table, ScopefigError> {
    match value {
        None => Ok(Table::new()),
        Some(Value::Table(t)) => Ok(t),
        Some(other) => Err(ScopefigError::InvalidDocument {
            path: path.to_path_buf(),
            kind,
            reason: format!("expected a mapping at the top level, found {}", other.type_str()),
        }),
    }
}
