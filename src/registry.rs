//! Per-directory parser registry.
//!
//! A [`FormatRegistry`] is bound to one directory scope. It keeps the parsers
//! it has constructed in registration order and resolves a resource to one of
//! them, building missing parsers on demand from the closed kind→constructor
//! table in [`parser`](crate::parser).
//!
//! # Resolution order
//!
//! Every registered parser is asked whether it supports the resource and the
//! **last** one that does wins. Registering a parser therefore overrides any
//! earlier parser for the resources both support. Only when no registered
//! parser matches is a new one constructed, from the type hint, the `closure`
//! kind for callables, or the file extension, in that order. The new parser is
//! kept only if it supports the resource itself (a `closure` hint on a file
//! path yields nothing), and is appended before it is returned, so the next
//! lookup finds it in the list.
//!
//! # Imports
//!
//! Parsers resolve nested resources through [`FormatRegistry::import`]. The
//! registry tracks the files currently being parsed: relative imports are
//! located next to the importing file first, and a file that imports itself,
//! directly or transitively, fails with [`ScopefigError::ImportCycle`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::directive::Directives;
use crate::error::ScopefigError;
use crate::locator::{FileLocator, normalize};
use crate::parser::{FormatParser, create_parser};
use crate::types::{FormatKind, Resource};

/// How errors from a nested import are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportErrors {
    /// Propagate every error.
    #[default]
    Fail,
    /// Skip the import if the file does not exist; propagate anything else.
    IgnoreMissing,
    /// Skip the import on any error except an import cycle.
    Ignore,
}

#[derive(Debug)]
pub struct FormatRegistry {
    dir: PathBuf,
    locator: FileLocator,
    parsers: Vec<Arc<dyn FormatParser>>,
    loading: Vec<PathBuf>,
}

impl FormatRegistry {
    /// An empty registry rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_paths(dir, Vec::new())
    }

    /// An empty registry rooted at `dir` that also searches `fallbacks`, in
    /// order, when locating files.
    pub fn with_paths(dir: impl Into<PathBuf>, fallbacks: Vec<PathBuf>) -> Self {
        let dir = normalize(&dir.into());
        let mut paths = Vec::with_capacity(fallbacks.len() + 1);
        paths.push(dir.clone());
        paths.extend(fallbacks);
        Self {
            dir,
            locator: FileLocator::new(paths),
            parsers: Vec::new(),
            loading: Vec::new(),
        }
    }

    /// The directory this registry is scoped to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn locator(&self) -> &FileLocator {
        &self.locator
    }

    /// Register a parser. It takes precedence over every parser registered
    /// before it.
    pub fn add_parser(&mut self, parser: Arc<dyn FormatParser>) -> &mut Self {
        trace!(dir = %self.dir.display(), parser = parser.name(), "registering parser");
        self.parsers.push(parser);
        self
    }

    /// Registered parsers in registration order.
    pub fn parsers(&self) -> &[Arc<dyn FormatParser>] {
        &self.parsers
    }

    /// Resolve a parser for `resource`. See the [module docs](self) for the
    /// order. Returns `None` when no parser exists or can be constructed.
    pub fn resolve(
        &mut self,
        resource: &Resource,
        type_hint: Option<&str>,
    ) -> Option<Arc<dyn FormatParser>> {
        let mut resolved = None;
        for parser in &self.parsers {
            if parser.supports(resource, type_hint) {
                resolved = Some(parser);
            }
        }
        if let Some(parser) = resolved {
            return Some(Arc::clone(parser));
        }

        let kind_name = derive_kind(resource, type_hint);
        let parser = FormatKind::from_name(kind_name)
            .and_then(create_parser)
            .filter(|p| p.supports(resource, type_hint));
        match &parser {
            Some(p) => {
                debug!(
                    dir = %self.dir.display(),
                    kind = kind_name,
                    "constructed parser"
                );
                self.add_parser(Arc::clone(p));
            }
            None => {
                debug!(
                    resource = %resource.identity(),
                    kind = kind_name,
                    "no parser for format"
                );
            }
        }
        parser
    }

    /// Whether a parser exists or can be constructed for `resource`. May
    /// register a parser as a side effect, exactly as [`resolve`](Self::resolve) does.
    pub fn supports(&mut self, resource: &Resource, type_hint: Option<&str>) -> bool {
        self.resolve(resource, type_hint).is_some()
    }

    /// Resolve and parse `resource` within this scope.
    pub fn load(
        &mut self,
        resource: &Resource,
        type_hint: Option<&str>,
    ) -> Result<Directives, ScopefigError> {
        let parser = self
            .resolve(resource, type_hint)
            .ok_or_else(|| ScopefigError::LoadError {
                resource: resource.identity(),
                kind: derive_kind(resource, type_hint).to_string(),
            })?;
        parser.parse(resource, type_hint, self)
    }

    /// Load a nested resource on behalf of a parser.
    pub fn import(
        &mut self,
        resource: &str,
        type_hint: Option<&str>,
        errors: ImportErrors,
    ) -> Result<Directives, ScopefigError> {
        debug!(resource, ?type_hint, ?errors, "importing");
        match self.load(&Resource::from(resource), type_hint) {
            Ok(directives) => Ok(directives),
            Err(e @ ScopefigError::ImportCycle { .. }) => Err(e),
            Err(e) if errors == ImportErrors::Ignore
                || (errors == ImportErrors::IgnoreMissing && e.is_not_found()) =>
            {
                debug!(resource, error = %e, "ignoring failed import");
                Ok(Directives::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Locate a file for a parser: next to the file being parsed, then in
    /// this registry's directories.
    pub fn locate(&self, name: &Path) -> Result<PathBuf, ScopefigError> {
        let current_dir = self.loading.last().and_then(|p| p.parent());
        self.locator.locate(name, current_dir)
    }

    /// Run `f` with `path` marked as the file being parsed.
    ///
    /// While `f` runs, [`locate`](Self::locate) looks next to `path` first and
    /// any attempt to parse `path` again fails with
    /// [`ScopefigError::ImportCycle`]. The mark is removed when `f` returns,
    /// whether or not it succeeded. Custom parsers that read files and import
    /// others should wrap their work in this.
    pub fn parsing<T>(
        &mut self,
        path: &Path,
        f: impl FnOnce(&mut Self) -> Result<T, ScopefigError>,
    ) -> Result<T, ScopefigError> {
        if self.loading.iter().any(|p| p == path) {
            let mut chain = self.loading.clone();
            chain.push(path.to_path_buf());
            return Err(ScopefigError::ImportCycle { chain });
        }
        self.loading.push(path.to_path_buf());
        let result = f(self);
        self.loading.pop();
        result
    }
}

/// The kind name to construct when no registered parser matches.
pub(crate) fn derive_kind<'a>(resource: &'a Resource, type_hint: Option<&'a str>) -> &'a str {
    match type_hint {
        Some(hint) => hint,
        None if resource.is_closure() => FormatKind::Closure.name(),
        None => resource.extension(),
    }
}
