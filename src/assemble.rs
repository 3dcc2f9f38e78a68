//! Materialize directives into a typed configuration struct.
//!
//! Directives are folded into one table (later entries win), optionally checked
//! for keys the struct does not define, deserialized into `C::Layer` (every
//! field optional), and handed to confique, which fills `#[config(default)]`
//! values and fails on missing required fields.

use confique::Config;
use serde::Deserialize;
use toml::{Table, Value};

use crate::directive::Directives;
use crate::error::ScopefigError;

/// Build a `C` from `directives`.
///
/// With `strict`, any key that `C` does not define fails the build with
/// [`ScopefigError::UnknownKeys`], each entry naming the file that set it.
pub fn assemble<C: Config>(directives: &Directives, strict: bool) -> Result<C, ScopefigError>
where
    C::Layer: for<'de> Deserialize<'de>,
{
    let table = directives.to_table();
    if strict {
        validate_unknown_keys::<C>(&table, directives)?;
    }

    let layer: C::Layer = Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| ScopefigError::InvalidValue {
            key: "<merged>".into(),
            reason: e.to_string(),
        })?;

    C::builder()
        .preloaded(layer)
        .load()
        .map_err(ScopefigError::from)
}

/// Uses `serde_ignored` to find keys that `C::Layer` does not consume.
fn validate_unknown_keys<C: Config>(table: &Table, directives: &Directives) -> Result<(), ScopefigError>
where
    C::Layer: for<'de> Deserialize<'de>,
{
    let mut unknown: Vec<String> = Vec::new();
    let _layer: C::Layer = serde_ignored::deserialize(Value::Table(table.clone()), |path| {
        unknown.push(path.to_string());
    })
    .map_err(|e: toml::de::Error| ScopefigError::InvalidValue {
        key: "<merged>".into(),
        reason: e.to_string(),
    })?;

    if unknown.is_empty() {
        return Ok(());
    }

    let errors = unknown
        .into_iter()
        .map(|key| {
            let origin = directives.last_for(&key).and_then(|d| d.origin.clone());
            ScopefigError::UnknownKey { key, origin }
        })
        .collect();
    Err(ScopefigError::UnknownKeys(errors))
}
