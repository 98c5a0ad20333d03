//! The process-wide extension registry.
//!
//! The registry is write-once per name and read-many: feature areas register
//! their extensions at startup, then contexts take snapshots of it. Registering
//! the same qualified name twice is a configuration error, never an overwrite.

use crate::error::ExtensionError;
use crate::value::XPathArg;
use maxe_types::{QName, SymbolTable, XmlItem};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Whether an extension is called from XPath or executed as an XSLT instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionKind {
    Function,
    Directive,
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionKind::Function => f.write_str("function"),
            ExtensionKind::Directive => f.write_str("directive"),
        }
    }
}

/// The evaluation context an extension function is called in.
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    pub symbols: &'a SymbolTable,
    /// The XPath context item, if the engine exposes one.
    pub context_item: Option<&'a XmlItem>,
    /// 1-based context position.
    pub position: usize,
    pub size: usize,
}

impl<'a> CallContext<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self {
            symbols,
            context_item: None,
            position: 1,
            size: 1,
        }
    }

    pub fn with_item(mut self, item: &'a XmlItem) -> Self {
        self.context_item = Some(item);
        self
    }
}

/// One execution of an extension directive inside a template.
#[derive(Debug, Clone, Copy)]
pub struct DirectiveCall<'a> {
    pub symbols: &'a SymbolTable,
    /// The extension element as it appears in the stylesheet.
    pub instruction: &'a XmlItem,
    /// Attributes of the extension element.
    pub attributes: &'a [XmlItem],
    /// The node being processed when the directive runs.
    pub context_item: Option<&'a XmlItem>,
}

pub type FunctionFn =
    Arc<dyn Fn(&CallContext<'_>, Vec<XPathArg>) -> Result<XPathArg, ExtensionError> + Send + Sync>;

pub type DirectiveFn =
    Arc<dyn Fn(&DirectiveCall<'_>) -> Result<Vec<XmlItem>, ExtensionError> + Send + Sync>;

/// A registered callable, tagged by the capability it provides.
#[derive(Clone)]
pub enum Callable {
    Function(FunctionFn),
    Directive(DirectiveFn),
}

impl Callable {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&CallContext<'_>, Vec<XPathArg>) -> Result<XPathArg, ExtensionError>
            + Send
            + Sync
            + 'static,
    {
        Callable::Function(Arc::new(f))
    }

    pub fn directive<F>(f: F) -> Self
    where
        F: Fn(&DirectiveCall<'_>) -> Result<Vec<XmlItem>, ExtensionError> + Send + Sync + 'static,
    {
        Callable::Directive(Arc::new(f))
    }

    pub fn kind(&self) -> ExtensionKind {
        match self {
            Callable::Function(_) => ExtensionKind::Function,
            Callable::Directive(_) => ExtensionKind::Directive,
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable::{:?}", self.kind())
    }
}

/// A qualified name bound to a callable.
#[derive(Debug, Clone)]
pub struct Extension {
    name: QName,
    callable: Callable,
}

impl Extension {
    pub fn new(name: QName, callable: Callable) -> Self {
        Self { name, callable }
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn kind(&self) -> ExtensionKind {
        self.callable.kind()
    }

    pub fn callable(&self) -> &Callable {
        &self.callable
    }
}

#[derive(Default)]
struct Entries {
    ordered: Vec<Extension>,
    names: HashSet<QName>,
}

/// Registered extensions, in registration order.
pub struct ExtensionRegistry {
    symbols: Arc<SymbolTable>,
    entries: Mutex<Entries>,
}

impl ExtensionRegistry {
    pub fn new(symbols: Arc<SymbolTable>) -> Self {
        Self {
            symbols,
            entries: Mutex::new(Entries::default()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn symbols(&self) -> &Arc<SymbolTable> {
        &self.symbols
    }

    /// Registers a batch of extensions in the namespace `uri`.
    ///
    /// The batch is checked as a whole before anything is inserted: if any
    /// name is already registered (or repeated within the batch) the call
    /// fails with [`ExtensionError::DuplicateExtension`] and the registry is
    /// left unchanged.
    pub fn register<'n, I>(&self, uri: &str, extensions: I) -> Result<(), ExtensionError>
    where
        I: IntoIterator<Item = (&'n str, Callable)>,
    {
        let ns = self.symbols.namespace(uri);
        let batch: Vec<Extension> = extensions
            .into_iter()
            .map(|(local, callable)| Extension::new(self.symbols.qname(&ns, local), callable))
            .collect();

        let mut entries = self.entries();
        let mut seen = HashSet::with_capacity(batch.len());
        for ext in &batch {
            if entries.names.contains(ext.name()) || !seen.insert(ext.name().clone()) {
                return Err(ExtensionError::DuplicateExtension {
                    name: ext.name().clark().to_string(),
                });
            }
        }

        for ext in batch {
            log::debug!("Registered extension {} '{}'", ext.kind(), ext.name());
            entries.names.insert(ext.name().clone());
            entries.ordered.push(ext);
        }
        Ok(())
    }

    /// Registers a single extension function.
    pub fn register_function<F>(&self, uri: &str, local: &str, f: F) -> Result<(), ExtensionError>
    where
        F: Fn(&CallContext<'_>, Vec<XPathArg>) -> Result<XPathArg, ExtensionError>
            + Send
            + Sync
            + 'static,
    {
        self.register(uri, [(local, Callable::function(f))])
    }

    /// Registers a single extension directive.
    pub fn register_directive<F>(&self, uri: &str, local: &str, f: F) -> Result<(), ExtensionError>
    where
        F: Fn(&DirectiveCall<'_>) -> Result<Vec<XmlItem>, ExtensionError> + Send + Sync + 'static,
    {
        self.register(uri, [(local, Callable::directive(f))])
    }

    /// All registered extensions, in registration order.
    ///
    /// The snapshot shares the callables and never changes the registry.
    pub fn snapshot(&self) -> Vec<Extension> {
        self.entries().ordered.clone()
    }

    pub fn get(&self, name: &QName) -> Option<Extension> {
        self.entries()
            .ordered
            .iter()
            .find(|ext| ext.name() == name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries().ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("extensions", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double() -> Callable {
        Callable::function(|_, args| {
            let x = args
                .first()
                .ok_or_else(|| ExtensionError::ArgumentType("expected 1 argument".to_string()))?
                .as_number()?;
            Ok(XPathArg::Number(x * 2.0))
        })
    }

    fn registry() -> ExtensionRegistry {
        ExtensionRegistry::new(Arc::new(SymbolTable::new()))
    }

    #[test]
    fn test_register_and_snapshot() {
        let registry = registry();
        registry
            .register("example-uri", [("double", double())])
            .unwrap();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name().clark(), "{example-uri}double");
        assert_eq!(snapshot[0].kind(), ExtensionKind::Function);
    }

    #[test]
    fn test_duplicate_registration_fails_and_keeps_first() {
        let registry = registry();
        registry.register("urn:x", [("f", double())]).unwrap();

        let err = registry
            .register_directive("urn:x", "f", |_| Ok(vec![]))
            .unwrap_err();
        assert!(matches!(err, ExtensionError::DuplicateExtension { ref name } if name == "{urn:x}f"));

        assert_eq!(registry.len(), 1);
        let name = registry.symbols().qname_in("urn:x", "f");
        assert_eq!(registry.get(&name).unwrap().kind(), ExtensionKind::Function);
    }

    #[test]
    fn test_batch_with_duplicate_leaves_registry_unchanged() {
        let registry = registry();
        registry.register("urn:x", [("taken", double())]).unwrap();

        let result = registry.register("urn:x", [("fresh", double()), ("taken", double())]);
        assert!(result.is_err());
        assert_eq!(registry.len(), 1);

        let repeated = registry.register("urn:y", [("twice", double()), ("twice", double())]);
        assert!(repeated.is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_same_local_name_in_different_namespaces() {
        let registry = registry();
        registry.register("urn:a", [("f", double())]).unwrap();
        registry.register("urn:b", [("f", double())]).unwrap();
        registry.register("", [("f", double())]).unwrap();
        let names: Vec<_> = registry
            .snapshot()
            .iter()
            .map(|e| e.name().clark().to_string())
            .collect();
        assert_eq!(names, vec!["{urn:a}f", "{urn:b}f", "f"]);
    }

    #[test]
    fn test_snapshot_is_detached_from_later_registrations() {
        let registry = registry();
        registry.register("urn:x", [("a", double())]).unwrap();
        let snapshot = registry.snapshot();
        registry.register("urn:x", [("b", double())]).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_kind_display_and_serde() {
        assert_eq!(ExtensionKind::Directive.to_string(), "directive");
        assert_eq!(
            serde_json::to_string(&ExtensionKind::Function).unwrap(),
            "\"function\""
        );
    }
}
