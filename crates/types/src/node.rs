//! The unified object model for XML values.
use crate::symbols::QName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of an XML object, whatever engine produced it.
///
/// The result tree of a transform is a `Document` as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum XmlKind {
    Document,
    Element,
    Attribute,
    Text,
    ProcessingInstruction,
    Comment,
}

impl XmlKind {
    /// True for the kinds that carry a qualified name.
    pub fn is_named(self) -> bool {
        matches!(self, XmlKind::Element | XmlKind::Attribute)
    }

    /// True for the kinds whose string value may be passed where a string is expected.
    pub fn is_stringable(self) -> bool {
        matches!(self, XmlKind::Element | XmlKind::Attribute | XmlKind::Text)
    }
}

impl fmt::Display for XmlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            XmlKind::Document => "document",
            XmlKind::Element => "element",
            XmlKind::Attribute => "attribute",
            XmlKind::Text => "text",
            XmlKind::ProcessingInstruction => "processing-instruction",
            XmlKind::Comment => "comment",
        };
        f.write_str(s)
    }
}

/// An owned snapshot of one XML object, detached from the tree it came from.
///
/// This is what extension functions receive in node-sets and return to the
/// engine. Documents and elements carry their subtree, so an extension can
/// build a whole result fragment out of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlItem {
    pub kind: XmlKind,
    /// Interned name for elements and attributes.
    pub name: Option<QName>,
    /// The XPath string value of the object.
    pub value: String,
    /// Attributes of an element, in document order.
    pub attributes: Vec<XmlItem>,
    /// Children of a document or element, in document order.
    pub children: Vec<XmlItem>,
}

impl XmlItem {
    pub fn new(kind: XmlKind, name: Option<QName>, value: impl Into<String>) -> Self {
        Self {
            kind,
            name,
            value: value.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn document() -> Self {
        Self::new(XmlKind::Document, None, "")
    }

    pub fn element(name: QName, text: impl Into<String>) -> Self {
        Self::new(XmlKind::Element, Some(name), text)
    }

    pub fn attribute(name: QName, value: impl Into<String>) -> Self {
        Self::new(XmlKind::Attribute, Some(name), value)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(XmlKind::Text, None, value)
    }

    /// Adds an attribute, replacing one with the same name.
    pub fn with_attribute(mut self, name: QName, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn set_attribute(&mut self, name: QName, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name.as_ref() == Some(&name)) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(XmlItem::attribute(name, value)),
        }
    }

    pub fn get_attribute(&self, name: &QName) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.as_ref() == Some(name))
            .map(|a| a.value.as_str())
    }

    pub fn with_child(mut self, child: XmlItem) -> Self {
        self.push_child(child);
        self
    }

    /// Appends `child`. Element and text children extend the string value,
    /// comments and processing instructions do not.
    pub fn push_child(&mut self, child: XmlItem) {
        if matches!(child.kind, XmlKind::Element | XmlKind::Text) {
            self.value.push_str(&child.value);
        }
        self.children.push(child);
    }

    /// Child elements, skipping text and other node kinds.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlItem> {
        self.children.iter().filter(|c| c.kind == XmlKind::Element)
    }
}
