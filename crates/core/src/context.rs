//! The XML processing context.
//!
//! Processing XML means finding external documents (DTDs, schemas,
//! stylesheet modules), resolving namespace prefixes and calling extensions.
//! A `ProcessingContext` collects all of that in one place. The driver builds
//! it during setup; parsing and compiling only read it.

use crate::error::ContextError;
use maxe_extension::{Extension, ExtensionRegistry};
use maxe_resource::{ReadParam, ResolvedFile, SearchPathResolver, SearchPaths};
use maxe_types::{Namespace, NamespacePrefix, SymbolTable};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ProcessingContext {
    symbols: Arc<SymbolTable>,
    paths: SearchPaths,
    prefixes: Vec<NamespacePrefix>,
    extensions: Vec<Extension>,
}

impl ProcessingContext {
    /// Creates a context with no paths or prefixes and a snapshot of every
    /// extension currently in `registry`.
    pub fn new(registry: &ExtensionRegistry) -> Self {
        let extensions = registry.snapshot();
        log::debug!("New processing context with {} extension(s)", extensions.len());
        Self {
            symbols: Arc::clone(registry.symbols()),
            paths: SearchPaths::new(),
            prefixes: Vec::new(),
            extensions,
        }
    }

    /// Appends a resource search path unless the same directory is already listed.
    pub fn add_path(&mut self, path: impl Into<PathBuf>) -> bool {
        self.paths.add(path)
    }

    /// Binds `prefix` to `ns`.
    ///
    /// Binding a prefix again to the same namespace does nothing; binding it
    /// to a different namespace fails.
    pub fn add_namespace_prefix(&mut self, ns: &Namespace, prefix: &str) -> Result<(), ContextError> {
        if let Some(existing) = self.prefixes.iter().find(|p| p.prefix() == prefix) {
            if existing.namespace() == ns {
                return Ok(());
            }
            return Err(ContextError::ConflictingPrefix {
                prefix: prefix.to_string(),
                bound: existing.namespace().uri().to_string(),
                requested: ns.uri().to_string(),
            });
        }
        log::debug!("Bound prefix '{}' to '{}'", prefix, ns);
        self.prefixes.push(NamespacePrefix::new(ns.clone(), prefix));
        Ok(())
    }

    pub fn namespace_for_prefix(&self, prefix: &str) -> Option<&Namespace> {
        self.prefixes
            .iter()
            .find(|p| p.prefix() == prefix)
            .map(NamespacePrefix::namespace)
    }

    pub fn symbols(&self) -> &Arc<SymbolTable> {
        &self.symbols
    }

    pub fn paths(&self) -> &SearchPaths {
        &self.paths
    }

    pub fn prefixes(&self) -> &[NamespacePrefix] {
        &self.prefixes
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    /// Resolves a relative reference against the search paths, in order.
    pub fn resolve(&self, reference: &str) -> Option<ResolvedFile> {
        maxe_resource::resolve(reference, &self.paths)
    }

    pub fn resolver(&self) -> SearchPathResolver {
        SearchPathResolver::new(self.paths.clone())
    }

    /// Read parameters for one document: `current_dir` first (when given),
    /// then the context's search paths.
    pub fn read_param(&self, current_dir: Option<&Path>) -> ReadParam {
        let mut param = ReadParam::new();
        if let Some(dir) = current_dir {
            param.add_path(dir);
        }
        for path in self.paths.iter() {
            param.add_path(path);
        }
        param
    }
}
