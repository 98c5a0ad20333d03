//! Values passed to and returned from extension functions.
use crate::error::ExtensionError;
use maxe_types::{XmlItem, XmlKind};
use std::fmt;
use std::path::PathBuf;

/// An argument an XPath extension function may receive, or the value it returns.
#[derive(Debug, Clone, PartialEq)]
pub enum XPathArg {
    NodeSet(Vec<XmlItem>),
    Boolean(bool),
    Number(f64),
    String(String),
}

impl XPathArg {
    pub fn type_name(&self) -> &'static str {
        match self {
            XPathArg::NodeSet(_) => "node-set",
            XPathArg::Boolean(_) => "boolean",
            XPathArg::Number(_) => "number",
            XPathArg::String(_) => "string",
        }
    }

    /// Converts the argument to a string.
    ///
    /// An empty node-set is the empty string. A node-set must otherwise hold a
    /// single element, attribute or text node; anything else is ambiguous and
    /// fails.
    pub fn as_string(&self) -> Result<String, ExtensionError> {
        match self {
            XPathArg::NodeSet(items) => match items.as_slice() {
                [] => Ok(String::new()),
                [item] if item.kind.is_stringable() => Ok(item.value.clone()),
                [item] => Err(ExtensionError::ArgumentType(format!(
                    "cannot convert a {} to a string",
                    item.kind
                ))),
                _ => Err(ExtensionError::ArgumentType(
                    "expected a string, an attribute, or a single element".to_string(),
                )),
            },
            XPathArg::Boolean(b) => Ok(b.to_string()),
            XPathArg::Number(n) => Ok(format_number(*n)),
            XPathArg::String(s) => Ok(s.clone()),
        }
    }

    /// Converts the argument to a filesystem path via [`as_string`](Self::as_string).
    pub fn as_path(&self) -> Result<PathBuf, ExtensionError> {
        self.as_string().map(PathBuf::from)
    }

    /// Converts the argument to a number (XPath 1.0 `number()` rules).
    pub fn as_number(&self) -> Result<f64, ExtensionError> {
        match self {
            XPathArg::Number(n) => Ok(*n),
            XPathArg::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            other => Ok(other.as_string()?.trim().parse().unwrap_or(f64::NAN)),
        }
    }

    /// Returns the node-set items, failing for scalar values.
    pub fn as_node_set(&self) -> Result<&[XmlItem], ExtensionError> {
        match self {
            XPathArg::NodeSet(items) => Ok(items),
            other => Err(ExtensionError::ArgumentType(format!(
                "expected a node-set, got a {}",
                other.type_name()
            ))),
        }
    }

    /// The kind of the single item in a one-item node-set.
    pub fn single_kind(&self) -> Option<XmlKind> {
        match self {
            XPathArg::NodeSet(items) if items.len() == 1 => Some(items[0].kind),
            _ => None,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        s.to_string()
    } else if n == n.trunc() && n.abs() < 1e15 {
        // Also folds -0 into "0".
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl fmt::Display for XPathArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_string() {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "[{}]", self.type_name()),
        }
    }
}

impl From<String> for XPathArg {
    fn from(s: String) -> Self {
        XPathArg::String(s)
    }
}

impl From<&str> for XPathArg {
    fn from(s: &str) -> Self {
        XPathArg::String(s.to_string())
    }
}

impl From<f64> for XPathArg {
    fn from(n: f64) -> Self {
        XPathArg::Number(n)
    }
}

impl From<bool> for XPathArg {
    fn from(b: bool) -> Self {
        XPathArg::Boolean(b)
    }
}

impl From<Vec<XmlItem>> for XPathArg {
    fn from(items: Vec<XmlItem>) -> Self {
        XPathArg::NodeSet(items)
    }
}
