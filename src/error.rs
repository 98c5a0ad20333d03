use crate::ext::BuiltinError;
use maxe_core::{ContextError, DocumentError, SerializationError};
use maxe_extension::ExtensionError;
use maxe_traits::ResolveError;
use maxe_xslt::XsltError;
use thiserror::Error;

/// Every failure a Maxe run can end with.
#[derive(Error, Debug)]
pub enum MaxeError {
    #[error("Extension error: {0}")]
    Extension(#[from] ExtensionError),

    #[error("Reader error: {0}")]
    Builtin(#[from] BuiltinError),

    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Serialization config error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("Stylesheet error: {0}")]
    Xslt(#[from] XsltError),

    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("'{0}' not found in any search path")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
