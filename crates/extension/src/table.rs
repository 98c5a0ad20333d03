//! The engine-facing extension table and its dispatch.
//!
//! The XML engine keys extensions by `(namespace-uri, local-name)` and expects
//! directives to be stateful objects with an `execute` capability. The
//! registry stores plain callables, so directives are wrapped in a
//! [`DirectiveAdapter`] when the table is built.

use crate::error::ExtensionError;
use crate::registry::{CallContext, Callable, DirectiveCall, DirectiveFn, Extension, ExtensionKind, FunctionFn};
use crate::value::XPathArg;
use maxe_types::{QName, XmlItem, clark_name};
use std::collections::HashMap;
use std::fmt;

/// The shape an XSLT engine requires of an extension instruction.
pub trait XsltExtension: Send + Sync {
    /// Runs the instruction, appending whatever it produces to `output`.
    fn execute(&self, call: &DirectiveCall<'_>, output: &mut Vec<XmlItem>) -> Result<(), ExtensionError>;
}

/// Minimal adapter giving a registered directive callable the engine's shape.
pub struct DirectiveAdapter {
    name: QName,
    callable: DirectiveFn,
}

impl DirectiveAdapter {
    pub fn new(name: QName, callable: DirectiveFn) -> Self {
        Self { name, callable }
    }

    pub fn name(&self) -> &QName {
        &self.name
    }
}

impl XsltExtension for DirectiveAdapter {
    fn execute(&self, call: &DirectiveCall<'_>, output: &mut Vec<XmlItem>) -> Result<(), ExtensionError> {
        let produced = (self.callable)(call)?;
        log::trace!("Directive '{}' produced {} item(s)", self.name, produced.len());
        output.extend(produced);
        Ok(())
    }
}

enum TableEntry {
    Function(FunctionFn),
    Directive(Box<dyn XsltExtension>),
}

impl TableEntry {
    fn kind(&self) -> ExtensionKind {
        match self {
            TableEntry::Function(_) => ExtensionKind::Function,
            TableEntry::Directive(_) => ExtensionKind::Directive,
        }
    }
}

/// Extensions keyed by `(namespace-uri, local-name)`.
#[derive(Default)]
pub struct ExtensionTable {
    entries: HashMap<(String, String), TableEntry>,
}

impl ExtensionTable {
    pub fn from_extensions(extensions: &[Extension]) -> Self {
        let entries = extensions
            .iter()
            .map(|ext| {
                let name = ext.name();
                let key = (name.namespace_uri().to_string(), name.local_name().to_string());
                let entry = match ext.callable() {
                    Callable::Function(f) => TableEntry::Function(f.clone()),
                    Callable::Directive(d) => {
                        TableEntry::Directive(Box::new(DirectiveAdapter::new(name.clone(), d.clone())))
                    }
                };
                (key, entry)
            })
            .collect();
        Self { entries }
    }

    fn lookup(&self, uri: &str, local: &str) -> Result<&TableEntry, ExtensionError> {
        self.entries
            .get(&(uri.to_string(), local.to_string()))
            .ok_or_else(|| ExtensionError::UnknownExtension {
                name: clark_name(uri, local),
            })
    }

    pub fn kind_of(&self, uri: &str, local: &str) -> Option<ExtensionKind> {
        self.lookup(uri, local).ok().map(TableEntry::kind)
    }

    /// Dispatches an XPath extension function call.
    pub fn call_function(
        &self,
        uri: &str,
        local: &str,
        ctx: &CallContext<'_>,
        args: Vec<XPathArg>,
    ) -> Result<XPathArg, ExtensionError> {
        match self.lookup(uri, local)? {
            TableEntry::Function(f) => f(ctx, args),
            TableEntry::Directive(_) => Err(ExtensionError::KindMismatch {
                name: clark_name(uri, local),
                expected: ExtensionKind::Function,
            }),
        }
    }

    /// Executes an XSLT extension directive.
    pub fn execute_directive(
        &self,
        uri: &str,
        local: &str,
        call: &DirectiveCall<'_>,
    ) -> Result<Vec<XmlItem>, ExtensionError> {
        match self.lookup(uri, local)? {
            TableEntry::Directive(d) => {
                let mut output = Vec::new();
                d.execute(call, &mut output)?;
                Ok(output)
            }
            TableEntry::Function(_) => Err(ExtensionError::KindMismatch {
                name: clark_name(uri, local),
                expected: ExtensionKind::Directive,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ExtensionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self
            .entries
            .iter()
            .map(|((uri, local), e)| format!("{} ({})", clark_name(uri, local), e.kind()))
            .collect();
        names.sort();
        f.debug_struct("ExtensionTable").field("entries", &names).finish()
    }
}
