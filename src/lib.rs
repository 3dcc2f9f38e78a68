//! Directory-scoped, format-resolving configuration loading.
//!
//! Scopefig answers one question for a configuration bootstrap: *given this
//! resource, which parser reads it, and relative to which directory?*
//!
//! ```ignore
//! let mut loader = ScopedLoader::new()?;
//! let directives = loader.load("/etc/myapp/config.yml", None)?;
//! let config: AppConfig = scopefig::assemble(&directives, true)?;
//! ```
//!
//! # Scopes
//!
//! Every directory a resource is loaded from gets its own [`FormatRegistry`].
//! An absolute path such as `/etc/myapp/config.yml` is routed to the registry
//! for `/etc/myapp` and handed to the parser as `config.yml`; the parser finds
//! it through that registry's [`FileLocator`](locator::FileLocator). Relative
//! paths and closures go through the default registry, rooted at the process
//! working directory (or the builder's [`base_dir`](ScopedLoaderBuilder::base_dir)).
//!
//! Registries are created on first use and live as long as the
//! [`ScopedLoader`]. Two resources in the same directory always share one
//! registry; resources in different directories never do. There is no global
//! state, so independent loaders have independent caches.
//!
//! # Resolution
//!
//! Inside a registry, parsers are kept in registration order. To resolve a
//! resource, every parser is asked whether it supports it and the **last**
//! match wins, so a parser registered later overrides earlier ones. If nothing
//! matches, the registry derives a format kind (type hint, then `closure` for
//! callables, then the file extension) and constructs the built-in parser for
//! it:
//!
//! | Kind | Names / extensions |
//! |------|--------------------|
//! | YAML | `yaml`, `yml` |
//! | XML | `xml` |
//! | INI | `ini` |
//! | TOML (native) | `toml` |
//! | JSON | `json` |
//! | Closure | `closure` (in-memory callables) |
//!
//! An unknown kind resolves to nothing: [`ScopedLoader::supports`] returns
//! `false` and [`ScopedLoader::load`] fails with [`ScopefigError::LoadError`].
//!
//! `supports` is not side-effect free: it creates the scope's registry and
//! may construct a parser, exactly like `load`. Calling it ahead of time warms
//! the cache; calling it twice changes nothing.
//!
//! # Directives and imports
//!
//! Parsing produces [`Directives`]: ordered `(dotted key, value, origin)`
//! entries. A file may list other resources under `imports`:
//!
//! ```yaml
//! imports:
//!   - base.toml
//!   - { resource: local.xml, ignore_errors: not_found }
//! database:
//!   pool_size: 20
//! ```
//!
//! Imports resolve through the same registry, located next to the importing
//! file first. Their directives come before the importer's own, so the
//! importer wins. Import cycles are reported as [`ScopefigError::ImportCycle`].
//!
//! # Typed configuration
//!
//! [`assemble`] folds directives into a [confique](https://docs.rs/confique)
//! config struct: defaults from `#[config(default)]`, required fields
//! enforced, and (in strict mode) unknown keys reported with the file that
//! set them.
//!
//! # Errors
//!
//! Every fallible operation returns [`ScopefigError`]. Errors raised while a
//! parser reads its resource are returned unchanged by `load`.

pub mod error;
pub mod locator;
pub mod types;

mod assemble;
mod directive;
mod formats;
mod loader;
mod parser;
mod registry;

#[cfg(test)]
mod fixtures;

pub use assemble::assemble;
pub use directive::{Directive, Directives};
pub use error::ScopefigError;
pub use loader::{ScopedLoader, ScopedLoaderBuilder};
pub use parser::{ClosureParser, FileParser, FormatParser, create_parser};
pub use registry::{FormatRegistry, ImportErrors};
pub use types::{ClosureResource, FormatKind, Resource};
