use crate::registry::ExtensionKind;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ExtensionError {
    #[error("Extension '{name}' is already registered")]
    DuplicateExtension { name: String },

    #[error("Unknown extension '{name}'")]
    UnknownExtension { name: String },

    #[error("Extension '{name}' is not an extension {expected}")]
    KindMismatch { name: String, expected: ExtensionKind },

    #[error("Argument type error: {0}")]
    ArgumentType(String),

    #[error("Function '{function}' error: {message}")]
    Function { function: String, message: String },
}
