//! Top-level stylesheet parameters.

use crate::error::XsltError;
use serde::{Serialize, Serializer};

/// How a parameter value is handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XsltParamKind {
    /// The value is an XPath expression, evaluated by the engine.
    XPath,
    /// The value is a plain string.
    String,
}

/// Quotes `value` as an XPath 1.0 string literal.
///
/// XPath 1.0 has no escape syntax, so a value containing both quote
/// characters is assembled with `concat()`.
pub fn string_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }
    let mut parts = Vec::new();
    for (i, piece) in value.split('\'').enumerate() {
        if i > 0 {
            parts.push("\"'\"".to_string());
        }
        if !piece.is_empty() {
            parts.push(format!("'{}'", piece));
        }
    }
    format!("concat({})", parts.join(", "))
}

/// Splits a `NAME=VALUE` command-line argument. The value may contain `=`.
pub fn split_assignment(arg: &str) -> Result<(&str, &str), XsltError> {
    match arg.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
        _ => Err(XsltError::InvalidParam { arg: arg.to_string() }),
    }
}

/// Named parameters as XPath expressions, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct XsltParams {
    entries: Vec<(String, String)>,
}

impl XsltParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, kind: XsltParamKind, value: &str) -> Result<(), XsltError> {
        if self.get(name).is_some() {
            return Err(XsltError::DuplicateParam { name: name.to_string() });
        }
        let expression = match kind {
            XsltParamKind::XPath => value.to_string(),
            XsltParamKind::String => string_literal(value),
        };
        log::debug!("Stylesheet parameter {} = {}", name, expression);
        self.entries.push((name.to_string(), expression));
        Ok(())
    }

    /// The XPath expression bound to `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, expr)| expr.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Serializes as a map from name to expression, in insertion order.
impl Serialize for XsltParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}
