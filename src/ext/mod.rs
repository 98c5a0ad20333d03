//! Built-in extension functions.
//!
//! Registered under [`MAXE_EXT_NAMESPACE`] when a [`Maxe`](crate::Maxe)
//! instance is created:
//!
//! - `get-path-stat(path)`, `list-directory(path)`, `scan-directory(path)`
//! - `read-file(path, format?, param?)`, `read-text(text, format, param?)`
//!
//! A failure inside a function is returned as
//! `<maxe:error type="..." message="..."/>` instead of aborting the
//! transform, so a stylesheet can test for it. A call with the wrong number
//! of arguments is still an error.

mod path;
mod read;

pub use read::{Reader, Readers, xml_reader};

use maxe_core::DocumentError;
use maxe_extension::{Callable, ExtensionError, ExtensionRegistry, XPathArg};
use maxe_types::{SymbolTable, XmlItem};
use std::ops::RangeInclusive;
use std::sync::Arc;
use thiserror::Error;

pub const MAXE_NAMESPACE: &str = "urn:onegasoft:Maxe";
pub const MAXE_EXT_NAMESPACE: &str = "urn:onegasoft:Maxe/Ext";

/// Why a built-in function gave up.
#[derive(Error, Debug)]
pub enum BuiltinError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Argument(#[from] ExtensionError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("Failed to find a reader for '{0}'")]
    UnknownFormat(String),

    #[error("There already exists a reader for '{0}'")]
    DuplicateFormat(String),

    #[error("The {reader} reader does not support {operation}")]
    Unsupported { reader: String, operation: &'static str },
}

impl BuiltinError {
    /// The value of the `type` attribute on `maxe:error`.
    pub fn type_name(&self) -> String {
        match self {
            BuiltinError::Io(e) => format!("{:?}", e.kind()),
            BuiltinError::Argument(_) => "ArgumentError".to_string(),
            BuiltinError::Document(_) => "DocumentError".to_string(),
            BuiltinError::UnknownFormat(_) => "UnknownFormat".to_string(),
            BuiltinError::DuplicateFormat(_) => "DuplicateFormat".to_string(),
            BuiltinError::Unsupported { .. } => "Unsupported".to_string(),
        }
    }

    pub fn to_item(&self, symbols: &SymbolTable) -> XmlItem {
        XmlItem::element(symbols.qname_in(MAXE_NAMESPACE, "error"), "")
            .with_attribute(symbols.qname_in("", "type"), self.type_name())
            .with_attribute(symbols.qname_in("", "message"), self.to_string())
    }
}

/// Turns the outcome of a built-in into the node-set handed back to the engine.
fn node_set(symbols: &SymbolTable, result: Result<Vec<XmlItem>, BuiltinError>) -> XPathArg {
    match result {
        Ok(items) => XPathArg::NodeSet(items),
        Err(e) => {
            log::debug!("Built-in extension failed: {}", e);
            XPathArg::NodeSet(vec![e.to_item(symbols)])
        }
    }
}

fn check_arity(function: &str, args: &[XPathArg], accepted: RangeInclusive<usize>) -> Result<(), ExtensionError> {
    if accepted.contains(&args.len()) {
        return Ok(());
    }
    let expected = if accepted.start() == accepted.end() {
        accepted.start().to_string()
    } else {
        format!("{} to {}", accepted.start(), accepted.end())
    };
    Err(ExtensionError::Function {
        function: function.to_string(),
        message: format!("expected {} argument(s), got {}", expected, args.len()),
    })
}

pub fn register_builtin_extensions(registry: &ExtensionRegistry, readers: &Arc<Readers>) -> Result<(), ExtensionError> {
    let for_file = Arc::clone(readers);
    let for_text = Arc::clone(readers);
    registry.register(
        MAXE_EXT_NAMESPACE,
        [
            ("get-path-stat", Callable::function(path::get_path_stat)),
            ("list-directory", Callable::function(path::list_directory)),
            ("scan-directory", Callable::function(path::scan_directory)),
            (
                "read-file",
                Callable::function(move |ctx, args| read::read_file(&for_file, ctx, args)),
            ),
            (
                "read-text",
                Callable::function(move |ctx, args| read::read_text(&for_text, ctx, args)),
            ),
        ],
    )
}
