//! Scans the XML prolog (declaration and DOCTYPE).
//!
//! roxmltree validates the whole document but does not expose the XML
//! declaration or the DOCTYPE identifiers, so those are read with a
//! quick-xml pass that stops at the first element.

use crate::error::DocumentError;
use quick_xml::Reader;
use quick_xml::events::Event as XmlEvent;
use serde::Serialize;

/// The `<!DOCTYPE ...>` identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Doctype {
    pub root_name: String,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

/// What a document's prolog declares about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DocumentInfo {
    /// `version` from the XML declaration, `None` without a declaration.
    pub xml_version: Option<String>,
    pub encoding: Option<String>,
    pub standalone: Option<bool>,
    pub doctype: Option<Doctype>,
}

impl DocumentInfo {
    pub fn scan(text: &str) -> Result<Self, DocumentError> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);
        let mut info = DocumentInfo::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                XmlEvent::Decl(decl) => {
                    let version = decl.version().map_err(|e| DocumentError::Prolog(e.to_string()))?;
                    info.xml_version = Some(std::str::from_utf8(&version)?.to_string());
                    if let Some(encoding) = decl.encoding() {
                        let encoding = encoding.map_err(|e| DocumentError::Prolog(e.to_string()))?;
                        info.encoding = Some(std::str::from_utf8(&encoding)?.to_string());
                    }
                    if let Some(standalone) = decl.standalone() {
                        let standalone = standalone.map_err(|e| DocumentError::Prolog(e.to_string()))?;
                        info.standalone = Some(parse_standalone(std::str::from_utf8(&standalone)?)?);
                    }
                }
                XmlEvent::DocType(content) => {
                    info.doctype = Some(parse_doctype(std::str::from_utf8(&content)?)?);
                }
                XmlEvent::Start(_) | XmlEvent::Empty(_) | XmlEvent::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        Ok(info)
    }
}

fn parse_standalone(value: &str) -> Result<bool, DocumentError> {
    match value {
        "yes" => Ok(true),
        "no" => Ok(false),
        other => Err(DocumentError::Prolog(format!("invalid standalone value '{}'", other))),
    }
}

/// Splits DOCTYPE content into bare words and quoted literals, stopping at
/// the internal subset.
fn tokens(content: &str) -> Result<Vec<&str>, DocumentError> {
    let mut out = Vec::new();
    let mut rest = content.trim_start();
    while let Some(c) = rest.chars().next() {
        match c {
            '[' => break,
            '"' | '\'' => {
                let body = &rest[1..];
                let end = body
                    .find(c)
                    .ok_or_else(|| DocumentError::Prolog("unterminated literal in DOCTYPE".to_string()))?;
                out.push(&body[..end]);
                rest = &body[end + 1..];
            }
            _ => {
                let end = rest
                    .find(|ch: char| ch.is_whitespace() || matches!(ch, '"' | '\'' | '['))
                    .unwrap_or(rest.len());
                out.push(&rest[..end]);
                rest = &rest[end..];
            }
        }
        rest = rest.trim_start();
    }
    Ok(out)
}

fn parse_doctype(content: &str) -> Result<Doctype, DocumentError> {
    let tokens = tokens(content)?;
    let (root_name, external) = tokens
        .split_first()
        .ok_or_else(|| DocumentError::Prolog("DOCTYPE without a root name".to_string()))?;

    let mut doctype = Doctype {
        root_name: root_name.to_string(),
        ..Default::default()
    };
    match external {
        ["SYSTEM", system, ..] => doctype.system_id = Some(system.to_string()),
        ["PUBLIC", public, system, ..] => {
            doctype.public_id = Some(public.to_string());
            doctype.system_id = Some(system.to_string());
        }
        ["PUBLIC", ..] => return Err(DocumentError::Prolog("PUBLIC DOCTYPE without a system id".to_string())),
        _ => {}
    }
    Ok(doctype)
}
