//! XML decoding.
//!
//! The root element's name is ignored; its children become top-level keys.
//! Elements with children (or attributes) become tables, text-only elements
//! become typed scalars, and repeated sibling elements collect into an array.
//!
//! ```xml
//! <config>
//!   <imports>
//!     <import resource="base.yml"/>
//!     <import resource="local.xml" ignore-errors="not_found"/>
//!   </imports>
//!   <database pool_size="5">
//!     <url>postgres://localhost</url>
//!   </database>
//! </config>
//! ```

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use toml::{Table, Value};

use crate::error::ScopefigError;
use crate::types::FormatKind;

struct Frame {
    name: String,
    table: Table,
    text: String,
}

pub fn decode(content: &str, path: &Path) -> Result<Table, ScopefigError> {
    let xml_err = |e: quick_xml::Error| ScopefigError::parse(path, FormatKind::Xml, e);

    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<Table> = None;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => {
                let table = attributes(&e).map_err(xml_err)?;
                stack.push(Frame {
                    name: element_name(&e),
                    table,
                    text: String::new(),
                });
            }
            Event::Empty(e) => {
                let table = attributes(&e).map_err(xml_err)?;
                let name = element_name(&e);
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.table, name, Value::Table(table)),
                    None => root = Some(table),
                }
            }
            Event::Text(t) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&t.unescape().map_err(xml_err)?);
                }
            }
            Event::CData(c) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                let Some(frame) = stack.pop() else {
                    continue;
                };
                let value = frame_value(frame.table, &frame.text);
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.table, frame.name, value),
                    None => {
                        root = Some(match value {
                            Value::Table(t) => t,
                            _ => Table::new(),
                        });
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ScopefigError::InvalidDocument {
            path: path.to_path_buf(),
            kind: FormatKind::Xml,
            reason: format!("unclosed element <{}>", open.name),
        });
    }

    let mut root = root.unwrap_or_default();
    normalize_imports(&mut root);
    Ok(root)
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attributes(e: &BytesStart<'_>) -> Result<Table, quick_xml::Error> {
    let mut table = Table::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?;
        table.insert(key, super::parse_scalar(&value));
    }
    Ok(table)
}

fn frame_value(mut table: Table, text: &str) -> Value {
    let text = text.trim();
    if table.is_empty() {
        return super::parse_scalar(text);
    }
    if !text.is_empty() {
        table.insert("value".to_string(), super::parse_scalar(text));
    }
    Value::Table(table)
}

fn insert_child(table: &mut Table, name: String, value: Value) {
    match table.remove(&name) {
        None => {
            table.insert(name, value);
        }
        Some(Value::Array(mut items)) => {
            items.push(value);
            table.insert(name, Value::Array(items));
        }
        Some(existing) => {
            table.insert(name, Value::Array(vec![existing, value]));
        }
    }
}

/// `<imports><import .../></imports>` decodes to `imports = { import = ... }`;
/// reshape it into the plain list every other format uses.
fn normalize_imports(root: &mut Table) {
    let Some(Value::Table(imports)) = root.get_mut("imports") else {
        return;
    };
    let list = match imports.remove("import") {
        Some(Value::Array(items)) => items,
        Some(single) => vec![single],
        None => Vec::new(),
    };
    root.insert("imports".to_string(), Value::Array(list));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_elements_become_tables() {
        let t = decode(
            "<config><host>localhost</host><database><pool_size>5</pool_size></database></config>",
            Path::new("a.xml"),
        )
        .unwrap();
        assert_eq!(t["host"].as_str(), Some("localhost"));
        assert_eq!(t["database"]["pool_size"].as_integer(), Some(5));
    }

    #[test]
    fn attributes_are_keys() {
        let t = decode(
            r#"<config><database pool_size="7"><url>pg://</url></database></config>"#,
            Path::new("a.xml"),
        )
        .unwrap();
        assert_eq!(t["database"]["pool_size"].as_integer(), Some(7));
        assert_eq!(t["database"]["url"].as_str(), Some("pg://"));
    }

    #[test]
    fn repeated_siblings_collect_into_array() {
        let t = decode(
            "<config><host>a</host><host>b</host><host>c</host></config>",
            Path::new("a.xml"),
        )
        .unwrap();
        let hosts = t["host"].as_array().unwrap();
        assert_eq!(hosts.len(), 3);
        assert_eq!(hosts[2].as_str(), Some("c"));
    }

    #[test]
    fn escaped_text_is_unescaped() {
        let t = decode("<config><q>a &amp; b</q></config>", Path::new("a.xml")).unwrap();
        assert_eq!(t["q"].as_str(), Some("a & b"));
    }

    #[test]
    fn imports_are_reshaped_into_a_list() {
        let t = decode(
            r#"<config><imports><import resource="base.yml"/></imports></config>"#,
            Path::new("a.xml"),
        )
        .unwrap();
        let imports = t["imports"].as_array().unwrap();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0]["resource"].as_str(), Some("base.yml"));
    }

    #[test]
    fn empty_document_is_empty_table() {
        assert!(decode("", Path::new("a.xml")).unwrap().is_empty());
        assert!(decode("<config/>", Path::new("a.xml")).unwrap().is_empty());
    }

    #[test]
    fn mismatched_tags_are_errors() {
        let err = decode("<config><a>1</b></config>", Path::new("/cfg/bad.xml")).unwrap_err();
        assert!(matches!(
            err,
            ScopefigError::ParseError {
                kind: FormatKind::Xml,
                ..
            }
        ));
    }

    #[test]
    fn unclosed_root_is_invalid() {
        let err = decode("<config><a>1</a>", Path::new("a.xml")).unwrap_err();
        assert!(matches!(
            err,
            ScopefigError::InvalidDocument { .. } | ScopefigError::ParseError { .. }
        ));
    }
}
