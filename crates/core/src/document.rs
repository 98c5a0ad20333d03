//! A parsed XML document and the unified object model over its nodes.

use crate::error::DocumentError;
use crate::prolog::DocumentInfo;
use maxe_resource::{BaseDirResolver, EntityResolver, ReadParam, ResolverChain, SearchPathResolver};
use maxe_types::{QName, SymbolTable, XmlItem, XmlKind};
use roxmltree::NodeType;
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};

/// Any object of a parsed tree.
///
/// `roxmltree` keeps attributes apart from nodes; this enum puts both behind
/// one handle so callers can ask any object for its kind, name and value.
#[derive(Clone, Copy)]
pub enum XmlNode<'a, 'input: 'a> {
    Node(roxmltree::Node<'a, 'input>),
    Attribute {
        attr: roxmltree::Attribute<'a, 'input>,
        parent: roxmltree::Node<'a, 'input>,
    },
}

impl Debug for XmlNode<'_, '_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            XmlNode::Node(n) => n.fmt(f),
            XmlNode::Attribute { attr, .. } => attr.fmt(f),
        }
    }
}

impl<'a, 'input: 'a> From<roxmltree::Node<'a, 'input>> for XmlNode<'a, 'input> {
    fn from(node: roxmltree::Node<'a, 'input>) -> Self {
        XmlNode::Node(node)
    }
}

impl<'a, 'input: 'a> XmlNode<'a, 'input> {
    pub fn kind(&self) -> XmlKind {
        match self {
            XmlNode::Attribute { .. } => XmlKind::Attribute,
            XmlNode::Node(n) => match n.node_type() {
                NodeType::Root => XmlKind::Document,
                NodeType::Element => XmlKind::Element,
                NodeType::Text => XmlKind::Text,
                NodeType::PI => XmlKind::ProcessingInstruction,
                NodeType::Comment => XmlKind::Comment,
            },
        }
    }

    /// The node's string value: descendant text for documents and elements,
    /// the literal content for everything else.
    pub fn string_value(&self) -> String {
        match self {
            XmlNode::Attribute { attr, .. } => attr.value().to_string(),
            XmlNode::Node(n) => match n.node_type() {
                NodeType::Root | NodeType::Element => n
                    .descendants()
                    .filter(|d| d.is_text())
                    .filter_map(|d| d.text())
                    .collect(),
                NodeType::PI => n.pi().and_then(|pi| pi.value).unwrap_or_default().to_string(),
                NodeType::Text | NodeType::Comment => n.text().unwrap_or_default().to_string(),
            },
        }
    }

    /// The attributes of an element, empty for every other kind.
    pub fn attributes(&self) -> Vec<XmlNode<'a, 'input>> {
        match self {
            XmlNode::Node(n) if n.is_element() => {
                let parent = *n;
                n.attributes()
                    .map(|attr| XmlNode::Attribute { attr, parent })
                    .collect()
            }
            _ => Vec::new(),
        }
    }
}

/// A parsed document together with what its prolog declared.
pub struct Document<'input> {
    doc: roxmltree::Document<'input>,
    info: DocumentInfo,
    url: Option<PathBuf>,
    dtd_path: Option<PathBuf>,
}

impl<'input> Document<'input> {
    /// Parses `text`. `url` is where the text came from, when known; it is
    /// the fallback base for resolving the DTD after `param`'s search paths.
    pub fn parse(text: &'input str, url: Option<&Path>, param: &ReadParam) -> Result<Self, DocumentError> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let doc = roxmltree::Document::parse_with_options(text, options)?;
        let info = DocumentInfo::scan(text)?;

        let mut document = Document {
            doc,
            info,
            url: url.map(Path::to_path_buf),
            dtd_path: None,
        };
        document.dtd_path = document.resolve_dtd(param);
        Ok(document)
    }

    fn resolve_dtd(&self, param: &ReadParam) -> Option<PathBuf> {
        let system_id = self.info.doctype.as_ref()?.system_id.as_deref()?;
        let mut chain = ResolverChain::new().with(SearchPathResolver::new(param.paths().clone()));
        if let Some(base) = self.url.as_deref().and_then(BaseDirResolver::for_file) {
            chain.push(base);
        }
        match chain.resolve(system_id) {
            Some(found) => Some(found.into_path()),
            None => {
                log::warn!("Could not resolve DTD '{}'", system_id);
                None
            }
        }
    }

    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    pub fn url(&self) -> Option<&Path> {
        self.url.as_deref()
    }

    /// The file that satisfied the DOCTYPE's SYSTEM id, if any did.
    pub fn dtd_path(&self) -> Option<&Path> {
        self.dtd_path.as_deref()
    }

    /// The interned name the DOCTYPE declares for the root element.
    ///
    /// A prefix is looked up among the root element's namespace bindings;
    /// an unprefixed name takes the root element's default namespace. A
    /// prefix the root element does not bind leaves the name as written, in
    /// no namespace.
    pub fn doctype_root(&self, symbols: &SymbolTable) -> Option<QName> {
        let name = self.info.doctype.as_ref()?.root_name.as_str();
        let (prefix, local) = match name.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, name),
        };
        match (prefix, self.doc.root_element().lookup_namespace_uri(prefix)) {
            (_, Some(uri)) => Some(symbols.qname_in(uri, local)),
            (None, None) => Some(symbols.qname_in("", local)),
            (Some(prefix), None) => {
                log::warn!("DOCTYPE prefix '{}' is not bound on the root element", prefix);
                Some(symbols.qname_in("", name))
            }
        }
    }

    /// The document node.
    pub fn root<'a>(&'a self) -> XmlNode<'a, 'input> {
        XmlNode::Node(self.doc.root())
    }

    pub fn root_element<'a>(&'a self) -> roxmltree::Node<'a, 'input> {
        self.doc.root_element()
    }

    pub fn tree(&self) -> &roxmltree::Document<'input> {
        &self.doc
    }

    pub fn kind_of(&self, node: XmlNode<'_, 'input>) -> XmlKind {
        node.kind()
    }

    /// The interned qualified name of an element or attribute. A document
    /// answers with the name of its root element.
    pub fn qname_of(&self, node: XmlNode<'_, 'input>, symbols: &SymbolTable) -> Result<QName, DocumentError> {
        match node {
            XmlNode::Attribute { attr, .. } => Ok(symbols.qname_in(attr.namespace().unwrap_or(""), attr.name())),
            XmlNode::Node(n) if n.is_root() => self.qname_of(XmlNode::Node(self.doc.root_element()), symbols),
            XmlNode::Node(n) if n.is_element() => {
                let tag = n.tag_name();
                Ok(symbols.qname_in(tag.namespace().unwrap_or(""), tag.name()))
            }
            other => Err(DocumentError::Unnamed(other.kind())),
        }
    }

    /// An owned snapshot of `node`, with its attributes and subtree.
    pub fn item(&self, node: XmlNode<'_, 'input>, symbols: &SymbolTable) -> XmlItem {
        let kind = node.kind();
        let name = if kind.is_named() {
            self.qname_of(node, symbols).ok()
        } else {
            None
        };
        match node {
            XmlNode::Node(n) if n.is_root() || n.is_element() => {
                let mut item = XmlItem::new(kind, name, "");
                item.attributes = node.attributes().into_iter().map(|a| self.item(a, symbols)).collect();
                for child in n.children() {
                    item.push_child(self.item(child.into(), symbols));
                }
                item
            }
            _ => XmlItem::new(kind, name, node.string_value()),
        }
    }

    /// Looks up an attribute of an element by its interned name.
    pub fn attribute<'a>(&'a self, node: XmlNode<'a, 'input>, name: &QName) -> Option<&'a str> {
        let XmlNode::Node(n) = node else {
            return None;
        };
        if name.namespace_uri().is_empty() {
            n.attribute(name.local_name())
        } else {
            n.attribute((name.namespace_uri(), name.local_name()))
        }
    }
}

impl Debug for Document<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.doc.root_element().tag_name().name())
            .field("info", &self.info)
            .field("url", &self.url)
            .field("dtd_path", &self.dtd_path)
            .finish()
    }
}
