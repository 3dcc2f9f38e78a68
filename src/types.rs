use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use crate::directive::Directives;
use crate::error::ScopefigError;

/// The closed set of formats a registry knows how to construct a parser for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Yaml,
    Xml,
    Ini,
    /// An in-memory callable producing directives.
    Closure,
    /// The crate-native format (TOML).
    Toml,
    Json,
}

impl FormatKind {
    pub const ALL: [FormatKind; 6] = [
        FormatKind::Yaml,
        FormatKind::Xml,
        FormatKind::Ini,
        FormatKind::Closure,
        FormatKind::Toml,
        FormatKind::Json,
    ];

    /// Look a kind up by type hint or file extension. Matching is exact:
    /// `"yml"` and `"yaml"` both name [`FormatKind::Yaml`], `"YML"` names nothing.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "yaml" | "yml" => Some(FormatKind::Yaml),
            "xml" => Some(FormatKind::Xml),
            "ini" => Some(FormatKind::Ini),
            "closure" => Some(FormatKind::Closure),
            "toml" => Some(FormatKind::Toml),
            "json" => Some(FormatKind::Json),
            _ => None,
        }
    }

    /// Canonical name, used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            FormatKind::Yaml => "yaml",
            FormatKind::Xml => "xml",
            FormatKind::Ini => "ini",
            FormatKind::Closure => "closure",
            FormatKind::Toml => "toml",
            FormatKind::Json => "json",
        }
    }

    /// File extensions recognised for this kind. Empty for [`FormatKind::Closure`].
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            FormatKind::Yaml => &["yaml", "yml"],
            FormatKind::Xml => &["xml"],
            FormatKind::Ini => &["ini"],
            FormatKind::Closure => &[],
            FormatKind::Toml => &["toml"],
            FormatKind::Json => &["json"],
        }
    }

    /// Whether `type_hint` names this kind.
    pub fn matches_hint(self, type_hint: &str) -> bool {
        FormatKind::from_name(type_hint) == Some(self)
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FormatKind {
    type Err = ScopefigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatKind::from_name(s).ok_or_else(|| ScopefigError::UnsupportedFormat(s.to_string()))
    }
}

type ClosureFn = dyn Fn(&mut Directives) -> Result<(), ScopefigError> + Send + Sync;

/// A callable that contributes directives when loaded.
#[derive(Clone)]
pub struct ClosureResource(Arc<ClosureFn>);

impl ClosureResource {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Directives) -> Result<(), ScopefigError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, sink: &mut Directives) -> Result<(), ScopefigError> {
        (self.0)(sink)
    }
}

impl fmt::Debug for ClosureResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClosureResource(..)")
    }
}

/// A reference to configuration content.
#[derive(Debug, Clone)]
pub enum Resource {
    Path(PathBuf),
    Closure(ClosureResource),
}

impl Resource {
    pub fn closure<F>(f: F) -> Self
    where
        F: Fn(&mut Directives) -> Result<(), ScopefigError> + Send + Sync + 'static,
    {
        Resource::Closure(ClosureResource::new(f))
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Resource::Path(p) => Some(p),
            Resource::Closure(_) => None,
        }
    }

    pub fn is_closure(&self) -> bool {
        matches!(self, Resource::Closure(_))
    }

    /// The file extension, or `""` when there is none (or for closures).
    pub fn extension(&self) -> &str {
        self.as_path()
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .unwrap_or("")
    }

    /// Human-readable identity used in errors and logs.
    pub fn identity(&self) -> String {
        match self {
            Resource::Path(p) => p.display().to_string(),
            Resource::Closure(_) => "<closure>".to_string(),
        }
    }
}

impl From<PathBuf> for Resource {
    fn from(path: PathBuf) -> Self {
        Resource::Path(path)
    }
}

impl From<&Path> for Resource {
    fn from(path: &Path) -> Self {
        Resource::Path(path.to_path_buf())
    }
}

impl From<&str> for Resource {
    fn from(path: &str) -> Self {
        Resource::Path(PathBuf::from(path))
    }
}

impl From<String> for Resource {
    fn from(path: String) -> Self {
        Resource::Path(PathBuf::from(path))
    }
}

impl From<ClosureResource> for Resource {
    fn from(closure: ClosureResource) -> Self {
        Resource::Closure(closure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip_through_from_name() {
        for kind in FormatKind::ALL {
            assert_eq!(FormatKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn yml_is_an_alias_for_yaml() {
        assert_eq!(FormatKind::from_name("yml"), Some(FormatKind::Yaml));
        assert!(FormatKind::Yaml.matches_hint("yml"));
        assert!(!FormatKind::Xml.matches_hint("yml"));
    }

    #[test]
    fn unknown_name_fails_from_str() {
        let err = "unknownext".parse::<FormatKind>().unwrap_err();
        assert!(matches!(err, ScopefigError::UnsupportedFormat(ref k) if k == "unknownext"));
    }

    #[test]
    fn closure_has_no_extensions() {
        assert!(FormatKind::Closure.extensions().is_empty());
    }

    #[test]
    fn resource_extension_and_identity() {
        let r = Resource::from("conf/app.yml");
        assert_eq!(r.extension(), "yml");
        assert_eq!(r.identity(), "conf/app.yml");

        let bare = Resource::from("Makefile");
        assert_eq!(bare.extension(), "");

        let c = Resource::closure(|_| Ok(()));
        assert!(c.is_closure());
        assert_eq!(c.extension(), "");
        assert_eq!(c.identity(), "<closure>");
    }
}
