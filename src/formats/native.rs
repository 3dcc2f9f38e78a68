use std::path::Path;

use toml::Table;

use crate::error::ScopefigError;
use crate::types::FormatKind;

pub fn decode(content: &str, path: &Path) -> Result<Table, ScopefigError> {
    toml::from_str(content).map_err(|e| ScopefigError::parse(path, FormatKind::Toml, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_sections() {
        let t = decode("port = 1\n[database]\nurl = \"pg://\"\n", Path::new("a.toml")).unwrap();
        assert_eq!(t["port"].as_integer(), Some(1));
        assert_eq!(t["database"]["url"].as_str(), Some("pg://"));
    }

    #[test]
    fn syntax_error_names_file() {
        let err = decode("port = = 1", Path::new("/cfg/bad.toml")).unwrap_err();
        assert!(matches!(
            err,
            ScopefigError::ParseError {
                kind: FormatKind::Toml,
                ..
            }
        ));
        assert!(err.to_string().contains("/cfg/bad.toml"));
    }
}
