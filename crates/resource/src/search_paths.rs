//! Ordered, deduplicated search paths.
use std::path::{Path, PathBuf};

/// Returns the filesystem identity of a path: symlinks resolved and, on
/// case-insensitive platforms, case folded.
///
/// A path that does not exist cannot be canonicalized; it is made absolute
/// against the current directory instead.
pub fn path_identity(path: &Path) -> PathBuf {
    let resolved = path
        .canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf());
    normalize_case(resolved)
}

// Windows and macOS volumes are case-insensitive by default. A case-sensitive
// APFS volume will see two spellings of one directory as the same path.
#[cfg(any(windows, target_os = "macos"))]
fn normalize_case(path: PathBuf) -> PathBuf {
    PathBuf::from(path.to_string_lossy().to_lowercase())
}

#[cfg(not(any(windows, target_os = "macos")))]
fn normalize_case(path: PathBuf) -> PathBuf {
    path
}

#[derive(Debug, Clone)]
struct SearchPath {
    path: PathBuf,
    identity: PathBuf,
}

/// Search paths in insertion order, without filesystem-identical duplicates.
#[derive(Debug, Clone, Default)]
pub struct SearchPaths {
    entries: Vec<SearchPath>,
}

impl SearchPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `path` unless an existing entry refers to the same directory.
    ///
    /// Returns `true` if the path was added. A duplicate is not an error.
    pub fn add(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        let identity = path_identity(&path);
        if self.entries.iter().any(|e| e.identity == identity) {
            log::debug!("Search path '{}' already present, skipping", path.display());
            return false;
        }
        log::debug!("Added search path '{}'", path.display());
        self.entries.push(SearchPath { path, identity });
        true
    }

    /// The paths as given, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|e| e.path.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: Into<PathBuf>> Extend<P> for SearchPaths {
    fn extend<T: IntoIterator<Item = P>>(&mut self, iter: T) {
        for path in iter {
            self.add(path);
        }
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for SearchPaths {
    fn from_iter<T: IntoIterator<Item = P>>(iter: T) -> Self {
        let mut paths = SearchPaths::new();
        paths.extend(iter);
        paths
    }
}

/// Parameters for reading one document: where to look for its external references.
#[derive(Debug, Clone, Default)]
pub struct ReadParam {
    paths: SearchPaths,
}

impl ReadParam {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_path(&mut self, path: impl Into<PathBuf>) -> bool {
        self.paths.add(path)
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.add(path);
        self
    }

    pub fn paths(&self) -> &SearchPaths {
        &self.paths
    }
}
