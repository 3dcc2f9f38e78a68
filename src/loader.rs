use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::directive::Directives;
use crate::error::ScopefigError;
use crate::locator::normalize;
use crate::registry::{FormatRegistry, derive_kind};
use crate::types::Resource;

/// Loads resources through registries scoped to each resource's directory.
///
/// Absolute paths are routed to the registry for their containing directory
/// and handed to the parser by file name only. Everything else (relative
/// paths, closures) goes through the default registry, rooted at the base
/// directory. Registries are created on first use and kept for the lifetime
/// of the loader.
#[derive(Debug)]
pub struct ScopedLoader {
    base_dir: PathBuf,
    fallback_paths: Vec<PathBuf>,
    default: Option<FormatRegistry>,
    scopes: HashMap<PathBuf, FormatRegistry>,
}

impl ScopedLoader {
    /// A loader whose default scope is the process working directory.
    pub fn new() -> Result<Self, ScopefigError> {
        ScopedLoaderBuilder::default().build()
    }

    pub fn builder() -> ScopedLoaderBuilder {
        ScopedLoaderBuilder::default()
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Parse `resource` and return its directives.
    ///
    /// Fails with [`ScopefigError::LoadError`] when no parser supports the
    /// resource. Errors raised by the parser itself are returned unchanged.
    pub fn load(
        &mut self,
        resource: impl Into<Resource>,
        type_hint: Option<&str>,
    ) -> Result<Directives, ScopefigError> {
        let original = resource.into();
        let (registry, scoped) = self.route(&original);

        let Some(parser) = registry.resolve(&scoped, type_hint) else {
            return Err(ScopefigError::LoadError {
                resource: original.identity(),
                kind: derive_kind(&original, type_hint).to_string(),
            });
        };

        debug!(
            resource = %original.identity(),
            scope = %registry.dir().display(),
            parser = parser.name(),
            "loading"
        );
        parser.parse(&scoped, type_hint, registry)
    }

    /// Whether `resource` can be loaded. Never fails.
    ///
    /// Like [`load`](Self::load), this creates the scope's registry and may
    /// construct and register a parser, so a `supports` call warms the cache
    /// for a later `load`. Repeating the call gives the same answer and
    /// registers nothing new.
    pub fn supports(&mut self, resource: impl Into<Resource>, type_hint: Option<&str>) -> bool {
        let original = resource.into();
        let (registry, scoped) = self.route(&original);
        registry.resolve(&scoped, type_hint).is_some()
    }

    /// The registry used for relative paths and closures.
    pub fn default_registry(&mut self) -> &mut FormatRegistry {
        let base_dir = &self.base_dir;
        let fallbacks = &self.fallback_paths;
        self.default.get_or_insert_with(|| {
            debug!(dir = %base_dir.display(), "creating default scope");
            FormatRegistry::with_paths(base_dir.clone(), fallbacks.clone())
        })
    }

    /// The registry for `path`. If `path` is not a directory, its parent is
    /// used instead.
    pub fn registry_for_path(&mut self, path: &Path) -> &mut FormatRegistry {
        let key = scope_key(path);
        let fallbacks = &self.fallback_paths;
        self.scopes.entry(key).or_insert_with_key(|key| {
            debug!(dir = %key.display(), "creating scope");
            FormatRegistry::with_paths(key.clone(), fallbacks.clone())
        })
    }

    /// The registry `resource` would be loaded through.
    pub fn registry_for_resource(&mut self, resource: &Resource) -> &mut FormatRegistry {
        self.route(resource).0
    }

    /// Directories with a scoped registry, in no particular order. The
    /// default registry is not included.
    pub fn scopes(&self) -> impl Iterator<Item = &Path> {
        self.scopes.keys().map(PathBuf::as_path)
    }

    /// Pick the registry for `resource` and the resource as the parser should
    /// see it.
    fn route(&mut self, resource: &Resource) -> (&mut FormatRegistry, Resource) {
        if let Some(path) = resource.as_path()
            && path.is_absolute()
        {
            let dir = path.parent().unwrap_or(path);
            let scoped = match path.file_name() {
                Some(name) => Resource::Path(PathBuf::from(name)),
                None => resource.clone(),
            };
            return (self.registry_for_path(dir), scoped);
        }
        (self.default_registry(), resource.clone())
    }
}

/// Normalize a directory for use as a cache key, stepping up to the parent
/// when `path` is not a directory (a file, or nothing at all).
fn scope_key(path: &Path) -> PathBuf {
    let dir = if !path.is_dir() {
        path.parent().unwrap_or(path)
    } else {
        path
    };
    normalize(dir)
}

/// Builder for [`ScopedLoader`].
#[derive(Debug, Default)]
pub struct ScopedLoaderBuilder {
    base_dir: Option<PathBuf>,
    fallback_paths: Vec<PathBuf>,
}

impl ScopedLoaderBuilder {
    /// Root of the default scope (default: the process working directory).
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Add a directory searched after a scope's own directory, in every scope.
    pub fn fallback_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_paths.push(dir.into());
        self
    }

    /// Replace the fallback directories.
    pub fn fallback_paths(mut self, dirs: Vec<PathBuf>) -> Self {
        self.fallback_paths = dirs;
        self
    }

    pub fn build(self) -> Result<ScopedLoader, ScopefigError> {
        let base_dir = match self.base_dir {
            Some(dir) => dir,
            None => std::env::current_dir().map_err(|e| ScopefigError::IoError {
                path: PathBuf::from("."),
                source: e,
            })?,
        };
        Ok(ScopedLoader {
            base_dir: normalize(&base_dir),
            fallback_paths: self.fallback_paths,
            default: None,
            scopes: HashMap::new(),
        })
    }
}
