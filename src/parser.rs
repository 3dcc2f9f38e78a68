//! Format parsers and the closed kind→constructor table.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use toml::Value;
use tracing::debug;

use crate::directive::Directives;
use crate::error::ScopefigError;
use crate::formats;
use crate::registry::{FormatRegistry, ImportErrors};
use crate::types::{FormatKind, Resource};

/// A collaborator able to turn one kind of [`Resource`] into [`Directives`].
///
/// `parse` receives the registry that resolved the parser, so a parser can
/// resolve nested resources (imports) through the same scope. A parser that
/// reads a file should do so inside [`FormatRegistry::parsing`] so its own
/// imports are found next to it and cycles through it are caught.
pub trait FormatParser: fmt::Debug + Send + Sync {
    /// Short name for diagnostics.
    fn name(&self) -> &str;

    fn supports(&self, resource: &Resource, type_hint: Option<&str>) -> bool;

    fn parse(
        &self,
        resource: &Resource,
        type_hint: Option<&str>,
        registry: &mut FormatRegistry,
    ) -> Result<Directives, ScopefigError>;
}

/// Construct the built-in parser for `kind`, or `None` when the kind has no
/// decoder compiled in.
pub fn create_parser(kind: FormatKind) -> Option<Arc<dyn FormatParser>> {
    match kind {
        FormatKind::Closure => Some(Arc::new(ClosureParser)),
        file_kind if formats::is_available(file_kind) => Some(Arc::new(FileParser::new(file_kind))),
        _ => None,
    }
}

/// Parser for file-backed formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileParser {
    kind: FormatKind,
}

impl FileParser {
    pub fn new(kind: FormatKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> FormatKind {
        self.kind
    }

    fn parse_file(&self, path: &Path, registry: &mut FormatRegistry) -> Result<Directives, ScopefigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ScopefigError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut table = formats::decode(self.kind, &content, path)?;

        let mut out = Directives::new();
        if let Some(imports) = table.remove("imports") {
            for import in parse_imports(imports, self.kind, path)? {
                let imported = registry.import(
                    &import.resource,
                    import.type_hint.as_deref(),
                    import.errors,
                )?;
                out.extend(imported);
            }
        }
        out.extend(Directives::from_table(table, Some(path)));
        Ok(out)
    }
}

impl FormatParser for FileParser {
    fn name(&self) -> &str {
        self.kind.name()
    }

    /// Without a hint, the extension decides; with one, only the hint does.
    fn supports(&self, resource: &Resource, type_hint: Option<&str>) -> bool {
        if resource.is_closure() {
            return false;
        }
        match type_hint {
            Some(hint) => self.kind.matches_hint(hint),
            None => self.kind.extensions().contains(&resource.extension()),
        }
    }

    fn parse(
        &self,
        resource: &Resource,
        _type_hint: Option<&str>,
        registry: &mut FormatRegistry,
    ) -> Result<Directives, ScopefigError> {
        let Some(name) = resource.as_path() else {
            return Err(ScopefigError::LoadError {
                resource: resource.identity(),
                kind: self.kind.name().to_string(),
            });
        };
        let path = registry.locate(name)?;
        debug!(path = %path.display(), format = %self.kind, "parsing config file");

        registry.parsing(&path, |registry| self.parse_file(&path, registry))
    }
}

/// Parser for in-memory callables.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosureParser;

impl FormatParser for ClosureParser {
    fn name(&self) -> &str {
        FormatKind::Closure.name()
    }

    fn supports(&self, resource: &Resource, type_hint: Option<&str>) -> bool {
        resource.is_closure() && type_hint.is_none_or(|hint| FormatKind::Closure.matches_hint(hint))
    }

    fn parse(
        &self,
        resource: &Resource,
        _type_hint: Option<&str>,
        _registry: &mut FormatRegistry,
    ) -> Result<Directives, ScopefigError> {
        let Resource::Closure(closure) = resource else {
            return Err(ScopefigError::LoadError {
                resource: resource.identity(),
                kind: FormatKind::Closure.name().to_string(),
            });
        };
        let mut out = Directives::new();
        closure.call(&mut out)?;
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Import {
    resource: String,
    type_hint: Option<String>,
    errors: ImportErrors,
}

/// Read an `imports` entry: a list of resource strings or
/// `{ resource, type?, ignore_errors? }` tables.
fn parse_imports(value: Value, kind: FormatKind, path: &Path) -> Result<Vec<Import>, ScopefigError> {
    let invalid = |reason: String| ScopefigError::InvalidDocument {
        path: path.to_path_buf(),
        kind,
        reason,
    };

    let Value::Array(items) = value else {
        return Err(invalid(format!(
            "'imports' must be a list, found {}",
            value.type_str()
        )));
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::String(resource) => Ok(Import {
                resource,
                type_hint: None,
                errors: ImportErrors::Fail,
            }),
            Value::Table(mut t) => {
                let resource = match t.remove("resource") {
                    Some(Value::String(r)) => r,
                    _ => return Err(invalid("import is missing a 'resource' string".into())),
                };
                let type_hint = match t.remove("type") {
                    None => None,
                    Some(Value::String(s)) => Some(s),
                    Some(other) => {
                        return Err(invalid(format!(
                            "import 'type' must be a string, found {}",
                            other.type_str()
                        )));
                    }
                };
                let flag = t.remove("ignore_errors").or_else(|| t.remove("ignore-errors"));
                let errors = match flag {
                    None | Some(Value::Boolean(false)) => ImportErrors::Fail,
                    Some(Value::Boolean(true)) => ImportErrors::Ignore,
                    Some(Value::String(s)) if s == "not_found" => ImportErrors::IgnoreMissing,
                    Some(other) => {
                        return Err(invalid(format!(
                            "import 'ignore_errors' must be true, false or \"not_found\", found {other}"
                        )));
                    }
                };
                Ok(Import {
                    resource,
                    type_hint,
                    errors,
                })
            }
            other => Err(invalid(format!(
                "import entries must be strings or tables, found {}",
                other.type_str()
            ))),
        })
        .collect()
}
