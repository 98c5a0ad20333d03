//! Interning of namespace URIs and qualified names.
//!
//! Every `(namespace, local-name)` pair is represented by exactly one live
//! [`QName`], and every URI by exactly one live [`Namespace`]. Equality and
//! hashing of both types are by reference identity, so they can be compared
//! and used as map keys without touching the underlying strings.
//!
//! A namespace keeps only weak references to its names: a [`QName`] that
//! nobody holds any more is dropped and re-created on the next request. Two
//! objects for the same pair are therefore never alive at the same time.

use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// The maps guarded here are append-only (or replace dead weak entries), so a
/// panic in another thread cannot leave them inconsistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Builds the canonical wire form of a qualified name (James Clark notation).
///
/// The empty namespace URI is omitted: `("", "foo")` is `foo`, while
/// `("urn:x", "foo")` is `{urn:x}foo`.
pub fn clark_name(uri: &str, local_name: &str) -> String {
    if uri.is_empty() {
        local_name.to_string()
    } else {
        let mut s = String::with_capacity(uri.len() + local_name.len() + 2);
        s.push('{');
        s.push_str(uri);
        s.push('}');
        s.push_str(local_name);
        s
    }
}

struct NamespaceData {
    uri: Arc<str>,
    names: Mutex<HashMap<Arc<str>, Weak<QNameData>>>,
}

/// An XML namespace, identified by its URI. The empty URI is "no namespace".
#[derive(Clone)]
pub struct Namespace(Arc<NamespaceData>);

impl Namespace {
    fn new(uri: Arc<str>) -> Self {
        Self(Arc::new(NamespaceData {
            uri,
            names: Mutex::new(HashMap::new()),
        }))
    }

    /// Returns the namespace URI.
    pub fn uri(&self) -> &str {
        &self.0.uri
    }

    /// True for the "no namespace" namespace.
    pub fn is_empty(&self) -> bool {
        self.0.uri.is_empty()
    }

    /// Returns the unique name for `local_name` in this namespace.
    ///
    /// The lookup and the insert happen under the namespace's lock, so
    /// concurrent callers asking for the same name get the same object.
    fn intern(&self, local_name: &str) -> QName {
        let mut names = lock(&self.0.names);
        if let Some(existing) = names.get(local_name).and_then(Weak::upgrade) {
            return QName(existing);
        }

        let local: Arc<str> = Arc::from(local_name);
        let data = Arc::new(QNameData {
            clark: clark_name(&self.0.uri, local_name).into_boxed_str(),
            namespace: self.clone(),
            local_name: Arc::clone(&local),
        });
        names.insert(local, Arc::downgrade(&data));
        QName(data)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Namespace {}

impl Hash for Namespace {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Namespace").field(&self.uri()).finish()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri())
    }
}

impl Serialize for Namespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.uri())
    }
}

struct QNameData {
    namespace: Namespace,
    local_name: Arc<str>,
    clark: Box<str>,
}

/// A qualified name: an interned `(namespace, local-name)` pair.
///
/// The canonical form is computed once when the name is first interned.
#[derive(Clone)]
pub struct QName(Arc<QNameData>);

impl QName {
    pub fn namespace(&self) -> &Namespace {
        &self.0.namespace
    }

    pub fn namespace_uri(&self) -> &str {
        self.0.namespace.uri()
    }

    pub fn local_name(&self) -> &str {
        &self.0.local_name
    }

    /// The canonical wire form, `{uri}local` or just `local` in no namespace.
    pub fn clark(&self) -> &str {
        &self.0.clark
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("QName").field(&self.clark()).finish()
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.clark())
    }
}

impl Serialize for QName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.clark())
    }
}

/// A namespace prefix binding, e.g. `xsl` -> `http://www.w3.org/1999/XSL/Transform`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespacePrefix {
    namespace: Namespace,
    prefix: Arc<str>,
}

impl NamespacePrefix {
    pub fn new(namespace: Namespace, prefix: impl Into<Arc<str>>) -> Self {
        Self {
            namespace,
            prefix: prefix.into(),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Interning table for namespaces and qualified names.
///
/// One table is created at process start and shared by reference with every
/// component that needs names. All operations are infallible and safe to call
/// from several threads.
#[derive(Default)]
pub struct SymbolTable {
    namespaces: Mutex<HashMap<Arc<str>, Namespace>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the unique namespace for `uri`, creating it on first request.
    pub fn namespace(&self, uri: &str) -> Namespace {
        let mut namespaces = lock(&self.namespaces);
        if let Some(ns) = namespaces.get(uri) {
            return ns.clone();
        }
        let key: Arc<str> = Arc::from(uri);
        let ns = Namespace::new(Arc::clone(&key));
        namespaces.insert(key, ns.clone());
        log::trace!("Interned namespace '{}'", uri);
        ns
    }

    /// Returns the unique qualified name for `(ns, local_name)`.
    pub fn qname(&self, ns: &Namespace, local_name: &str) -> QName {
        ns.intern(local_name)
    }

    /// Shorthand for `qname(&namespace(uri), local_name)`.
    pub fn qname_in(&self, uri: &str, local_name: &str) -> QName {
        self.namespace(uri).intern(local_name)
    }

    /// Interns a name written in Clark notation (`{uri}local` or `local`).
    ///
    /// Returns `None` for a string that opens a brace without closing it, or
    /// that has an empty local part.
    pub fn parse_clark(&self, s: &str) -> Option<QName> {
        match s.strip_prefix('{') {
            Some(rest) => {
                let (uri, local) = rest.split_once('}')?;
                if local.is_empty() {
                    return None;
                }
                Some(self.qname_in(uri, local))
            }
            None if s.is_empty() => None,
            None => Some(self.qname_in("", s)),
        }
    }

    /// Number of interned namespaces.
    pub fn namespace_count(&self) -> usize {
        lock(&self.namespaces).len()
    }
}

impl fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolTable")
            .field("namespaces", &self.namespace_count())
            .finish()
    }
}
