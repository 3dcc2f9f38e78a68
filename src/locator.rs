//! File location for parsers.
//!
//! A [`FileLocator`] holds an ordered list of directories. The first directory
//! is the scope the owning registry is bound to; any further ones are
//! fallbacks. Names are resolved in this order:
//!
//! 1. the directory of the file currently being parsed (nested imports only),
//! 2. each locator directory, in order.
//!
//! The first existing candidate wins. Absolute names bypass the search and are
//! only checked for existence.

use std::path::{Component, Path, PathBuf};

use crate::error::ScopefigError;

#[derive(Debug, Clone, PartialEq)]
pub struct FileLocator {
    paths: Vec<PathBuf>,
}

impl FileLocator {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths: paths.iter().map(|p| normalize(p)).collect(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Locate `name`, trying `current_dir` before the locator's own directories.
    pub fn locate(&self, name: &Path, current_dir: Option<&Path>) -> Result<PathBuf, ScopefigError> {
        if name.is_absolute() {
            if name.exists() {
                return Ok(normalize(name));
            }
            return Err(ScopefigError::NotFound {
                name: name.display().to_string(),
                searched: Vec::new(),
            });
        }

        let mut searched = Vec::new();
        for dir in current_dir.into_iter().chain(self.paths.iter().map(PathBuf::as_path)) {
            if searched.iter().any(|s: &PathBuf| s == dir) {
                continue;
            }
            let candidate = dir.join(name);
            if candidate.exists() {
                return Ok(normalize(&candidate));
            }
            searched.push(dir.to_path_buf());
        }

        Err(ScopefigError::NotFound {
            name: name.display().to_string(),
            searched,
        })
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. Does not touch the filesystem, so symlinks are kept
/// and non-existent paths normalize fine.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(normalize(Path::new("/etc/./app/../app")), PathBuf::from("/etc/app"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("a/../..")), PathBuf::from(".."));
        assert_eq!(normalize(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn locate_in_first_directory_that_has_it() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        fs::write(b.path().join("app.yml"), "").unwrap();

        let locator = FileLocator::new(vec![a.path().to_path_buf(), b.path().to_path_buf()]);
        let found = locator.locate(Path::new("app.yml"), None).unwrap();
        assert_eq!(found, normalize(&b.path().join("app.yml")));
    }

    #[test]
    fn current_dir_takes_precedence() {
        let scope = TempDir::new().unwrap();
        let nested = scope.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(scope.path().join("db.yml"), "").unwrap();
        fs::write(nested.join("db.yml"), "").unwrap();

        let locator = FileLocator::new(vec![scope.path().to_path_buf()]);
        let found = locator.locate(Path::new("db.yml"), Some(&nested)).unwrap();
        assert_eq!(found, normalize(&nested.join("db.yml")));
    }

    #[test]
    fn missing_file_lists_searched_directories() {
        let a = TempDir::new().unwrap();
        let locator = FileLocator::new(vec![a.path().to_path_buf()]);
        let err = locator.locate(Path::new("nope.toml"), None).unwrap_err();
        match err {
            ScopefigError::NotFound { name, searched } => {
                assert_eq!(name, "nope.toml");
                assert_eq!(searched, vec![normalize(a.path())]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn absolute_names_skip_the_search() {
        let a = TempDir::new().unwrap();
        let file = a.path().join("abs.toml");
        fs::write(&file, "").unwrap();

        let locator = FileLocator::new(vec![PathBuf::from("/definitely/not/here")]);
        assert_eq!(locator.locate(&file, None).unwrap(), normalize(&file));
        assert!(locator.locate(&a.path().join("missing.toml"), None).is_err());
    }
}
