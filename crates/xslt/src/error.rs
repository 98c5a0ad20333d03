use maxe_core::{DocumentError, SerializationError};
use maxe_extension::ExtensionError;
use maxe_traits::ResolveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XsltError {
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Serialization config error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("Extension error: {0}")]
    Extension(#[from] ExtensionError),

    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Not an XSLT stylesheet: root element is '{root}'")]
    NotAStylesheet { root: String },

    #[error("Cannot resolve module '{href}' referenced from '{referrer}'")]
    UnresolvedModule { href: String, referrer: String },

    #[error("Expected NAME=VALUE, got '{arg}'")]
    InvalidParam { arg: String },

    #[error("Parameter '{name}' is already defined")]
    DuplicateParam { name: String },
}
