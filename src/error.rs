use std::path::PathBuf;

use thiserror::Error;

use crate::types::FormatKind;

#[derive(Debug, Error)]
pub enum ScopefigError {
    #[error("Unsupported format '{0}'")]
    UnsupportedFormat(String),

    #[error("Cannot load resource '{resource}': no parser supports format '{kind}'")]
    LoadError { resource: String, kind: String },

    #[error("Resource '{name}' not found (searched {})", display_paths(.searched))]
    NotFound { name: String, searched: Vec<PathBuf> },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path} as {kind}: {source}")]
    ParseError {
        path: PathBuf,
        kind: FormatKind,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to parse {path} (line {line}): {reason}")]
    IniError {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Invalid {kind} document {path}: {reason}")]
    InvalidDocument {
        path: PathBuf,
        kind: FormatKind,
        reason: String,
    },

    #[error("Circular import: {}", display_paths(.chain))]
    ImportCycle { chain: Vec<PathBuf> },

    #[error("Unknown key '{key}'{}", display_origin(.origin.as_ref()))]
    UnknownKey {
        key: String,
        origin: Option<PathBuf>,
    },

    #[error("Unknown keys in configuration")]
    UnknownKeys(Vec<ScopefigError>),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] confique::Error),
}

impl ScopefigError {
    pub(crate) fn parse(
        path: &std::path::Path,
        kind: FormatKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ScopefigError::ParseError {
            path: path.to_path_buf(),
            kind,
            source: Box::new(source),
        }
    }

    /// Whether this error means a resource could not be located on disk.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ScopefigError::NotFound { .. })
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn display_origin(origin: Option<&PathBuf>) -> String {
    match origin {
        Some(path) => format!(" in {}", path.display()),
        None => String::new(),
    }
}
