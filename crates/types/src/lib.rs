//! Foundation types shared by every Maxe crate.
//!
//! - [`SymbolTable`] interns namespace URIs and qualified names so that each
//!   `(namespace, local-name)` pair is represented by exactly one live object.
//! - [`XmlKind`] and [`XmlItem`] describe the heterogeneous XML objects
//!   (documents, elements, attributes, text, processing instructions and
//!   comments) behind one model.

pub mod node;
pub mod symbols;

pub use node::{XmlItem, XmlKind};
pub use symbols::{Namespace, NamespacePrefix, QName, SymbolTable, clark_name};
