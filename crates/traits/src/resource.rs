//! EntityResolver trait for satisfying external references.
//!
//! Documents and stylesheets refer to DTDs, schemas and included modules by
//! relative URIs. The XML engine asks an `EntityResolver` to turn such a
//! reference into a concrete file; when no resolver answers, the engine falls
//! back to its own default resolution.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for reading a resolved file.
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    #[error("Failed to read '{path}': {message}")]
    ReadFailed { path: String, message: String },

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ResolveError {
    fn from(err: std::io::Error) -> Self {
        ResolveError::Io(err.to_string())
    }
}

/// A regular file that satisfies a reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedFile {
    path: PathBuf,
}

impl ResolvedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }

    /// Reads the raw bytes; decoding is up to the caller.
    pub fn read_bytes(&self) -> Result<Vec<u8>, ResolveError> {
        std::fs::read(&self.path).map_err(|e| ResolveError::ReadFailed {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// A trait for answering "which file satisfies this reference?".
///
/// # Implementations
///
/// - `SearchPathResolver` (maxe-resource): probes an ordered list of search paths
/// - `BaseDirResolver` (maxe-resource): probes a single base directory
/// - [`ResolverChain`]: tries several resolvers in order
pub trait EntityResolver: Send + Sync + Debug {
    /// Resolves `reference` to a file.
    ///
    /// `None` is a normal outcome: the caller should fall back to its own
    /// resolution chain.
    fn resolve(&self, reference: &str) -> Option<ResolvedFile>;

    /// Returns a human-readable name for this resolver (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// Tries each resolver in turn and returns the first answer.
#[derive(Debug, Default)]
pub struct ResolverChain {
    resolvers: Vec<Box<dyn EntityResolver>>,
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resolver: impl EntityResolver + 'static) -> Self {
        self.push(resolver);
        self
    }

    pub fn push(&mut self, resolver: impl EntityResolver + 'static) {
        self.resolvers.push(Box::new(resolver));
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl EntityResolver for ResolverChain {
    fn resolve(&self, reference: &str) -> Option<ResolvedFile> {
        self.resolvers.iter().find_map(|r| {
            let found = r.resolve(reference);
            if found.is_none() {
                log::trace!("{} could not resolve '{}'", r.name(), reference);
            }
            found
        })
    }

    fn name(&self) -> &'static str {
        "ResolverChain"
    }
}
