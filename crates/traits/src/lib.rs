pub mod resource;

pub use resource::{EntityResolver, ResolveError, ResolvedFile, ResolverChain};
