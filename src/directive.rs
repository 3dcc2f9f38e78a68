//! Directives: the flat, ordered output of parsing a resource.
//!
//! Every parser produces a sequence of `(dotted key, value)` entries. Order is
//! significant: when the sequence is folded back into a nested table with
//! [`Directives::to_table`], later entries override earlier ones key-by-key.
//! Imported files contribute their directives before the importing file's own,
//! so the importer always wins.

use std::path::{Path, PathBuf};

use toml::{Table, Value};

/// One configuration entry contributed by a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Dotted key path, e.g. `database.url`.
    pub key: String,
    pub value: Value,
    /// File the entry came from. `None` for entries produced by closures.
    pub origin: Option<PathBuf>,
}

/// Ordered sequence of [`Directive`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Directives {
    entries: Vec<Directive>,
}

impl Directives {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten a nested table into directives tagged with `origin`.
    ///
    /// Tables are recursed into; arrays and scalars become leaves. An empty
    /// table is kept as a leaf so that declaring a section is not lost.
    pub fn from_table(table: Table, origin: Option<&Path>) -> Self {
        let mut out = Self::new();
        flatten_into(&mut out.entries, String::new(), table, origin);
        out
    }

    /// Append an entry without an origin. Used by closure resources.
    pub fn set<V: Into<Value>>(&mut self, key: &str, value: V) -> &mut Self {
        self.entries.push(Directive {
            key: key.to_string(),
            value: value.into(),
            origin: None,
        });
        self
    }

    pub fn push(&mut self, directive: Directive) {
        self.entries.push(directive);
    }

    pub fn extend(&mut self, other: Directives) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Directive> {
        self.entries.iter()
    }

    /// The effective value of `key`: the last directive that sets it exactly.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .rev()
            .find(|d| d.key == key)
            .map(|d| &d.value)
    }

    /// The last directive whose key is `key` or nested beneath it.
    pub fn last_for(&self, key: &str) -> Option<&Directive> {
        self.entries.iter().rev().find(|d| {
            d.key == key
                || d.key
                    .strip_prefix(key)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    /// Fold all directives into one nested table. Later entries win.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        for d in &self.entries {
            set_nested(&mut table, &d.key, d.value.clone());
        }
        table
    }
}

impl IntoIterator for Directives {
    type Item = Directive;
    type IntoIter = std::vec::IntoIter<Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Directives {
    type Item = &'a Directive;
    type IntoIter = std::slice::Iter<'a, Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn flatten_into(out: &mut Vec<Directive>, prefix: String, table: Table, origin: Option<&Path>) {
    for (key, value) in table {
        let path = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Table(sub) if !sub.is_empty() => flatten_into(out, path, sub, origin),
            leaf => out.push(Directive {
                key: path,
                value: leaf,
                origin: origin.map(Path::to_path_buf),
            }),
        }
    }
}

/// Insert `value` at a dotted key, creating intermediate tables as needed.
/// A scalar in the way of an intermediate table is replaced. A table value
/// landing on an existing table is merged into it rather than replacing it.
fn set_nested(table: &mut Table, dotted_key: &str, value: Value) {
    let mut segments = dotted_key.split('.');
    let Some(leaf) = segments.next_back() else {
        return;
    };

    let mut current = table;
    for segment in segments {
        let slot = current
            .entry(segment)
            .or_insert_with(|| Value::Table(Table::new()));
        if !slot.is_table() {
            *slot = Value::Table(Table::new());
        }
        let Value::Table(next) = slot else {
            unreachable!("slot was just made a table");
        };
        current = next;
    }

    match (current.remove(leaf), value) {
        (Some(Value::Table(base)), Value::Table(overlay)) => {
            current.insert(leaf.to_string(), Value::Table(deep_merge(base, overlay)));
        }
        (_, value) => {
            current.insert(leaf.to_string(), value);
        }
    }
}

fn deep_merge(mut base: Table, overlay: Table) -> Table {
    for (key, overlay_val) in overlay {
        match (base.remove(&key), overlay_val) {
            (Some(Value::Table(base_tbl)), Value::Table(overlay_tbl)) => {
                base.insert(key, Value::Table(deep_merge(base_tbl, overlay_tbl)));
            }
            (_, overlay_val) => {
                base.insert(key, overlay_val);
            }
        }
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(toml_str: &str) -> Table {
        toml_str.parse::<Table>().unwrap()
    }

    #[test]
    fn flatten_nested_table_to_dotted_keys() {
        let d = Directives::from_table(
            table(
                r#"
                host = "localhost"
                [database]
                url = "pg://"
                pool_size = 5
                "#,
            ),
            Some(Path::new("/etc/app/config.toml")),
        );
        assert_eq!(d.len(), 3);
        assert_eq!(d.get("host").unwrap().as_str(), Some("localhost"));
        assert_eq!(d.get("database.pool_size").unwrap().as_integer(), Some(5));
        let origin = d.last_for("database.url").unwrap().origin.clone();
        assert_eq!(origin, Some(PathBuf::from("/etc/app/config.toml")));
    }

    #[test]
    fn arrays_are_leaves() {
        let d = Directives::from_table(table("hosts = [\"a\", \"b\"]"), None);
        assert_eq!(d.len(), 1);
        assert!(d.get("hosts").unwrap().is_array());
    }

    #[test]
    fn empty_section_is_kept() {
        let d = Directives::from_table(table("[features]"), None);
        assert_eq!(d.len(), 1);
        assert_eq!(d.to_table(), table("[features]"));
    }

    #[test]
    fn later_directive_wins_when_folded() {
        let mut d = Directives::new();
        d.set("port", 8080).set("host", "a").set("port", 3000);
        let t = d.to_table();
        assert_eq!(t["port"].as_integer(), Some(3000));
        assert_eq!(t["host"].as_str(), Some("a"));
        assert_eq!(d.get("port").unwrap().as_integer(), Some(3000));
    }

    #[test]
    fn fold_keeps_sibling_keys_from_earlier_files() {
        let mut d = Directives::from_table(
            table("[database]\nurl = \"pg://base\"\npool_size = 5\n"),
            Some(Path::new("base.toml")),
        );
        d.extend(Directives::from_table(
            table("[database]\npool_size = 50\n"),
            Some(Path::new("local.toml")),
        ));
        let t = d.to_table();
        assert_eq!(t["database"]["url"].as_str(), Some("pg://base"));
        assert_eq!(t["database"]["pool_size"].as_integer(), Some(50));
    }

    #[test]
    fn empty_section_does_not_erase_earlier_values() {
        let mut d = Directives::from_table(table("[database]\nurl = \"x\"\n"), None);
        d.extend(Directives::from_table(table("[database]"), None));
        assert_eq!(d.to_table()["database"]["url"].as_str(), Some("x"));
    }

    #[test]
    fn nested_key_replaces_earlier_scalar() {
        let mut d = Directives::new();
        d.set("database", "flat").set("database.url", "pg://");
        let t = d.to_table();
        assert_eq!(t["database"]["url"].as_str(), Some("pg://"));
    }

    #[test]
    fn last_for_matches_nested_keys_only_on_segment_boundary() {
        let mut d = Directives::new();
        d.set("database.url", "a").set("databases", "b");
        assert_eq!(d.last_for("database").unwrap().key, "database.url");
        assert!(d.get("database").is_none());
    }
}
