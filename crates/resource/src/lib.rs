//! Search paths and resolvers for the Maxe XML layer.
//!
//! This crate provides the filesystem implementations of the
//! `EntityResolver` trait from maxe-traits.
//!
//! ## Available Resolvers
//!
//! - [`SearchPathResolver`]: Probes an ordered list of search paths
//! - [`BaseDirResolver`]: Probes a single directory, e.g. the one holding the referring document
//!
//! ## Re-exports
//!
//! For convenience, we also re-export the resolver chain from maxe-traits:
//! - [`ResolverChain`]: Tries several resolvers in order

mod filesystem;
mod search_paths;

pub use filesystem::{BaseDirResolver, Reference, SearchPathResolver, resolve};
pub use search_paths::{ReadParam, SearchPaths, path_identity};

pub use maxe_traits::{EntityResolver, ResolvedFile, ResolverChain};
