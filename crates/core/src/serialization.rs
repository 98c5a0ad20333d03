//! Serialization configuration and the rules that derive it.
//!
//! A configuration can come from three places: a parsed document's prolog,
//! the `<xsl:output>` directives of a stylesheet, and fixed programmatic
//! defaults. Every field is independently unset or set, and combining
//! sources never overwrites a field that is already set.

use crate::document::Document;
use crate::error::SerializationError;
use maxe_types::{Namespace, QName, SymbolTable};
use serde::Serialize;
use std::fmt;

pub const DEFAULT_ENCODING: &str = "utf-8";
pub const DEFAULT_MEDIA_TYPE: &str = "application/xml";
pub const DEFAULT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMethod {
    Xml,
    Html,
    Text,
}

impl OutputMethod {
    /// Parses an `<xsl:output method>` literal. Qualified method names are
    /// rejected along with everything else outside `xml`, `html` and `text`.
    pub fn parse(value: &str) -> Result<Self, SerializationError> {
        match value {
            "xml" => Ok(OutputMethod::Xml),
            "html" => Ok(OutputMethod::Html),
            "text" => Ok(OutputMethod::Text),
            other => Err(SerializationError::UnsupportedValue {
                field: "method",
                value: other.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMethod::Xml => "xml",
            OutputMethod::Html => "html",
            OutputMethod::Text => "text",
        }
    }
}

impl fmt::Display for OutputMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The raw attributes of one `<xsl:output>` element.
///
/// Values are kept as written; validation happens only when a value is
/// actually taken into a configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputDirective {
    pub method: Option<String>,
    pub encoding: Option<String>,
    pub indent: Option<String>,
    pub omit_xml_declaration: Option<String>,
    pub standalone: Option<String>,
    pub doctype_public: Option<String>,
    pub doctype_system: Option<String>,
    pub media_type: Option<String>,
    pub version: Option<String>,
    pub cdata_section_elements: Option<String>,
}

impl OutputDirective {
    /// Builds a directive from `(attribute-name, value)` pairs. Unknown and
    /// namespace-qualified attributes are ignored.
    pub fn from_attributes<'s>(attributes: impl IntoIterator<Item = (&'s str, &'s str)>) -> Self {
        let mut directive = OutputDirective::default();
        for (name, value) in attributes {
            let slot = match name {
                "method" => &mut directive.method,
                "encoding" => &mut directive.encoding,
                "indent" => &mut directive.indent,
                "omit-xml-declaration" => &mut directive.omit_xml_declaration,
                "standalone" => &mut directive.standalone,
                "doctype-public" => &mut directive.doctype_public,
                "doctype-system" => &mut directive.doctype_system,
                "media-type" => &mut directive.media_type,
                "version" => &mut directive.version,
                "cdata-section-elements" => &mut directive.cdata_section_elements,
                _ => continue,
            };
            *slot = Some(value.to_string());
        }
        directive
    }
}

/// Every output-affecting switch; `None` means no source has said anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SerializationConfig {
    pub method: Option<OutputMethod>,
    pub encoding: Option<String>,
    pub indent: Option<bool>,
    /// Whether to emit the XML declaration.
    pub declaration: Option<bool>,
    pub standalone: Option<bool>,
    pub doctype_public: Option<String>,
    pub doctype_system: Option<String>,
    pub doctype_root: Option<QName>,
    pub media_type: Option<String>,
    pub url: Option<String>,
    pub version: Option<String>,

    // Canonicalization switches. No source sets them yet.
    pub canonical: Option<bool>,
    pub canonical_comments: Option<bool>,
    pub canonical_exclusive: Option<bool>,
    pub canonical_inclusive_ns: Option<Vec<Namespace>>,
    pub canonical_text: Option<bool>,
}

/// Writes `value` into `slot` unless `slot` is already set.
fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

/// `yes`/`no` literals; anything else is rejected.
fn parse_yes_no(field: &'static str, value: &str) -> Result<bool, SerializationError> {
    match value {
        "yes" => Ok(true),
        "no" => Ok(false),
        other => Err(SerializationError::UnsupportedValue {
            field,
            value: other.to_string(),
        }),
    }
}

/// Treats an attribute written as the empty string the same as an absent one.
fn given(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl SerializationConfig {
    /// The configuration intrinsic to a parsed document.
    ///
    /// Method, declaration and indentation take fixed defaults; the version
    /// falls back to `1.0` when the document has no XML declaration.
    pub fn from_document(doc: &Document<'_>, symbols: &SymbolTable) -> Self {
        let info = doc.info();
        let doctype = info.doctype.as_ref();
        SerializationConfig {
            method: Some(OutputMethod::Xml),
            declaration: Some(true),
            indent: Some(false),
            encoding: info.encoding.clone(),
            standalone: info.standalone,
            version: Some(info.xml_version.clone().unwrap_or_else(|| DEFAULT_VERSION.to_string())),
            url: doc.url().map(|p| p.display().to_string()),
            doctype_public: doctype.and_then(|d| d.public_id.clone()),
            doctype_system: doctype.and_then(|d| d.system_id.clone()),
            doctype_root: doc.doctype_root(symbols),
            ..Default::default()
        }
    }

    /// Folds `<xsl:output>` directives in discovery order.
    ///
    /// The first directive that gives a field a non-empty value decides that
    /// field. A later value for a field already decided is skipped without
    /// being validated. Method, declaration and indentation are defaulted at
    /// the end, so they are always set on success.
    pub fn from_output_directives<'d>(
        directives: impl IntoIterator<Item = &'d OutputDirective>,
    ) -> Result<Self, SerializationError> {
        let mut cfg = SerializationConfig::default();

        for directive in directives {
            if let Some(method) = given(&directive.method) {
                if cfg.method.is_none() {
                    cfg.method = Some(OutputMethod::parse(method)?);
                } else {
                    log::debug!("Ignoring method '{}', already decided", method);
                }
            }
            if let Some(indent) = given(&directive.indent) {
                if cfg.indent.is_none() {
                    // Stored as the complement of the literal: "yes" disables
                    // indentation, "no" enables it. Kept for compatibility
                    // with existing stylesheets.
                    cfg.indent = Some(!parse_yes_no("indent", indent)?);
                }
            }
            if let Some(omit) = given(&directive.omit_xml_declaration) {
                if cfg.declaration.is_none() {
                    cfg.declaration = Some(!parse_yes_no("omit-xml-declaration", omit)?);
                }
            }
            if let Some(standalone) = given(&directive.standalone) {
                if cfg.standalone.is_none() {
                    cfg.standalone = Some(parse_yes_no("standalone", standalone)?);
                }
            }
            if given(&directive.cdata_section_elements).is_some() {
                log::warn!("cdata-section-elements is not supported and will be ignored");
            }
            fill(&mut cfg.encoding, given(&directive.encoding).map(str::to_string));
            fill(&mut cfg.doctype_public, given(&directive.doctype_public).map(str::to_string));
            fill(&mut cfg.doctype_system, given(&directive.doctype_system).map(str::to_string));
            fill(&mut cfg.media_type, given(&directive.media_type).map(str::to_string));
            fill(&mut cfg.version, given(&directive.version).map(str::to_string));
        }

        fill(&mut cfg.method, Some(OutputMethod::Xml));
        fill(&mut cfg.declaration, Some(true));
        fill(&mut cfg.indent, Some(false));
        Ok(cfg)
    }

    /// The fixed defaults a driver supplies when nothing else decides.
    pub fn programmatic_defaults() -> Self {
        SerializationConfig {
            method: Some(OutputMethod::Xml),
            encoding: Some(DEFAULT_ENCODING.to_string()),
            indent: Some(false),
            declaration: Some(true),
            media_type: Some(DEFAULT_MEDIA_TYPE.to_string()),
            version: Some(DEFAULT_VERSION.to_string()),
            ..Default::default()
        }
    }

    /// Field-wise combination where `base` wins every field it has set.
    pub fn merge(base: &SerializationConfig, overlay: &SerializationConfig) -> SerializationConfig {
        let mut out = base.clone();
        fill(&mut out.method, overlay.method);
        fill(&mut out.encoding, overlay.encoding.clone());
        fill(&mut out.indent, overlay.indent);
        fill(&mut out.declaration, overlay.declaration);
        fill(&mut out.standalone, overlay.standalone);
        fill(&mut out.doctype_public, overlay.doctype_public.clone());
        fill(&mut out.doctype_system, overlay.doctype_system.clone());
        fill(&mut out.doctype_root, overlay.doctype_root.clone());
        fill(&mut out.media_type, overlay.media_type.clone());
        fill(&mut out.url, overlay.url.clone());
        fill(&mut out.version, overlay.version.clone());
        fill(&mut out.canonical, overlay.canonical);
        fill(&mut out.canonical_comments, overlay.canonical_comments);
        fill(&mut out.canonical_exclusive, overlay.canonical_exclusive);
        fill(&mut out.canonical_inclusive_ns, overlay.canonical_inclusive_ns.clone());
        fill(&mut out.canonical_text, overlay.canonical_text);
        out
    }

    /// The encoding to write with: the configured one, else the first
    /// non-empty fallback, else `utf-8`.
    pub fn resolve_encoding<'a>(&'a self, fallbacks: &[Option<&'a str>]) -> &'a str {
        self.encoding
            .as_deref()
            .filter(|e| !e.is_empty())
            .or_else(|| fallbacks.iter().flatten().copied().find(|e| !e.is_empty()))
            .unwrap_or(DEFAULT_ENCODING)
    }
}

/// The codeset of the user's locale, from `LC_ALL`, `LC_CTYPE` or `LANG`.
pub fn locale_encoding() -> Option<String> {
    ["LC_ALL", "LC_CTYPE", "LANG"]
        .into_iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
        .and_then(|locale| codeset(&locale))
}

/// `en_US.UTF-8@euro` -> `UTF-8`. Locales without a codeset give `None`.
fn codeset(locale: &str) -> Option<String> {
    let (_, rest) = locale.split_once('.')?;
    let codeset = rest.split('@').next().unwrap_or(rest);
    (!codeset.is_empty()).then(|| codeset.to_string())
}
