//! Error types for context construction, document reading and output configuration.

use maxe_traits::ResolveError;
use maxe_types::XmlKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("Prefix '{prefix}' is already bound to namespace '{bound}', cannot bind it to '{requested}'")]
    ConflictingPrefix {
        prefix: String,
        bound: String,
        requested: String,
    },
}

/// An `<xsl:output>` literal outside the accepted set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializationError {
    #[error("Unsupported value '{value}' for output attribute '{field}'")]
    UnsupportedValue { field: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("XML parsing error: {0}")]
    XmlParse(#[from] roxmltree::Error),

    #[error("XML prolog error: {0}")]
    Prolog(String),

    #[error("Unknown encoding '{0}' in XML declaration")]
    UnknownEncoding(String),

    #[error("Input is not valid {encoding}")]
    Decode { encoding: String },

    #[error("Cannot get the qualified name of a {0}")]
    Unnamed(XmlKind),

    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 string error: {0}")]
    Utf8Str(#[from] std::str::Utf8Error),
}

impl From<quick_xml::Error> for DocumentError {
    fn from(e: quick_xml::Error) -> Self {
        DocumentError::Prolog(e.to_string())
    }
}
