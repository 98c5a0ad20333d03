//! Extension functions (XPath) and extension directives (XSLT) for Maxe.
//!
//! Feature areas register their callables in an [`ExtensionRegistry`] at
//! startup. A processing context takes a snapshot of the registry, and a
//! compiled stylesheet turns that snapshot into an [`ExtensionTable`] keyed
//! the way the XML engine expects.

pub mod error;
pub mod registry;
pub mod table;
pub mod value;

pub use error::ExtensionError;
pub use registry::{
    Callable, CallContext, DirectiveCall, DirectiveFn, Extension, ExtensionKind,
    ExtensionRegistry, FunctionFn,
};
pub use table::{DirectiveAdapter, ExtensionTable, XsltExtension};
pub use value::XPathArg;
