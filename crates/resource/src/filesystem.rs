//! Filesystem resolvers.
//!
//! A reference such as `dtd/book.dtd` is split on `/` and `\` and joined
//! onto each candidate directory in order; the first join that names a
//! regular file wins. The probe has no side effects, so the same paths always
//! give the same answer.
//!
//! `file:` URIs are reduced to their path first. Any other URI is not a
//! filesystem reference and never resolves here.

use crate::search_paths::SearchPaths;
use maxe_traits::{EntityResolver, ResolvedFile};
use std::path::{Path, PathBuf};

/// What a reference names once its scheme, if any, has been looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    /// A local path, absolute or relative. `file:` URIs end up here.
    Path(&'a str),
    /// A URI with any scheme other than `file`.
    Uri(&'a str),
}

impl<'a> Reference<'a> {
    pub fn parse(reference: &'a str) -> Self {
        let Some((scheme, rest)) = reference.split_once(':') else {
            return Reference::Path(reference);
        };
        // One letter before the colon is a drive, not a scheme.
        let is_scheme = scheme.len() > 1
            && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !is_scheme {
            return Reference::Path(reference);
        }
        if !scheme.eq_ignore_ascii_case("file") {
            return Reference::Uri(reference);
        }
        // file://host/path and file:///path keep only the path.
        match rest.strip_prefix("//") {
            Some(authority_and_path) => Reference::Path(
                authority_and_path
                    .find('/')
                    .map_or("", |start| &authority_and_path[start..]),
            ),
            None => Reference::Path(rest),
        }
    }
}

fn segments(reference: &str) -> impl Iterator<Item = &str> {
    let path = match Reference::parse(reference) {
        Reference::Path(path) => path,
        Reference::Uri(_) => "",
    };
    path.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
}

fn probe(dir: &Path, reference: &str) -> Option<ResolvedFile> {
    let mut candidate = dir.to_path_buf();
    for segment in segments(reference) {
        candidate.push(segment);
    }
    if candidate.is_file() {
        log::debug!("Resolved '{}' to '{}'", reference, candidate.display());
        Some(ResolvedFile::new(candidate))
    } else {
        log::trace!("'{}' not found in '{}'", reference, dir.display());
        None
    }
}

/// Probes `paths` in order for `reference`.
///
/// `None` means no search path satisfies the reference; the caller falls
/// back to its own resolution.
pub fn resolve(reference: &str, paths: &SearchPaths) -> Option<ResolvedFile> {
    if segments(reference).next().is_none() {
        return None;
    }
    paths.iter().find_map(|dir| probe(dir, reference))
}

/// A resolver over an ordered list of search paths.
#[derive(Debug, Clone, Default)]
pub struct SearchPathResolver {
    paths: SearchPaths,
}

impl SearchPathResolver {
    pub fn new(paths: SearchPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &SearchPaths {
        &self.paths
    }
}

impl EntityResolver for SearchPathResolver {
    fn resolve(&self, reference: &str) -> Option<ResolvedFile> {
        resolve(reference, &self.paths)
    }

    fn name(&self) -> &'static str {
        "SearchPathResolver"
    }
}

/// A resolver relative to one directory, typically the referring document's.
#[derive(Debug, Clone)]
pub struct BaseDirResolver {
    base: PathBuf,
}

impl BaseDirResolver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// A resolver for the directory holding `file`, if it has one.
    pub fn for_file(file: &Path) -> Option<Self> {
        file.parent().map(Self::new)
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl EntityResolver for BaseDirResolver {
    fn resolve(&self, reference: &str) -> Option<ResolvedFile> {
        if segments(reference).next().is_none() {
            return None;
        }
        probe(&self.base, reference)
    }

    fn name(&self) -> &'static str {
        "BaseDirResolver"
    }
}
