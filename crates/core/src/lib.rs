//! # maxe-core
//!
//! The bridging layer between an XML engine and the rest of Maxe:
//! - **context**: search paths, namespace prefixes and the extension snapshot
//! - **decode**: byte order marks and declared encodings
//! - **document**: parsed documents, their prolog and DTD resolution
//! - **serialization**: output configuration and the rules that combine its sources

pub mod context;
pub mod decode;
pub mod document;
pub mod error;
pub mod prolog;
pub mod serialization;

// Re-export foundation crates
pub use maxe_extension as extension;
pub use maxe_resource as resource;
pub use maxe_traits as traits;
pub use maxe_types as types;

pub use context::ProcessingContext;
pub use decode::{decode_xml, read_xml};
pub use document::{Document, XmlNode};
pub use error::{ContextError, DocumentError, SerializationError};
pub use prolog::{Doctype, DocumentInfo};
pub use serialization::{OutputDirective, OutputMethod, SerializationConfig, locale_encoding};
