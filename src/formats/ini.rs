//! INI decoding.
//!
//! ```ini
//! ; comment
//! name = app
//!
//! [database]
//! url = "postgres://localhost"
//! replicas[] = db1
//! replicas[] = db2
//! ```
//!
//! Keys before the first section land at the top level. `key[]` appends to an
//! array. A `;` after a value starts a comment unless it sits inside quotes. Values are typed with [`parse_scalar`](super::parse_scalar).

use std::path::Path;

use toml::{Table, Value};

use crate::error::ScopefigError;

pub fn decode(content: &str, path: &Path) -> Result<Table, ScopefigError> {
    let mut root = Table::new();
    let mut section: Option<String> = None;

    for (i, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        let err = |reason: &str| ScopefigError::IniError {
            path: path.to_path_buf(),
            line: i + 1,
            reason: reason.to_string(),
        };

        if let Some(rest) = line.strip_prefix('[') {
            let name = strip_comment(rest)
                .trim_end()
                .strip_suffix(']')
                .ok_or_else(|| err("unterminated section header"))?
                .trim();
            if name.is_empty() {
                return Err(err("empty section name"));
            }
            root.entry(name)
                .or_insert_with(|| Value::Table(Table::new()));
            section = Some(name.to_string());
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| err("expected 'key = value'"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(err("empty key"));
        }

        let target = match &section {
            Some(name) => match root.get_mut(name) {
                Some(Value::Table(t)) => t,
                _ => return Err(err("section collides with a top-level key")),
            },
            None => &mut root,
        };

        let value = super::parse_scalar(strip_comment(value));
        match key.strip_suffix("[]") {
            Some(array_key) => {
                let slot = target
                    .entry(array_key.trim())
                    .or_insert_with(|| Value::Array(Vec::new()));
                match slot {
                    Value::Array(items) => items.push(value),
                    _ => return Err(err("cannot append to a non-array key")),
                }
            }
            None => {
                target.insert(key.to_string(), value);
            }
        }
    }

    Ok(root)
}

/// Drop a trailing `; comment`. A `;` inside a leading quoted string is kept.
fn strip_comment(raw: &str) -> &str {
    let value = raw.trim_start();
    if let Some(quote) = value.chars().next().filter(|c| matches!(*c, '"' | '\''))
        && let Some(end) = value[1..].find(quote)
    {
        return &value[..end + 2];
    }
    value.split_once(';').map_or(value, |(v, _)| v)
}
