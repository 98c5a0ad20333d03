//! `read-file` and `read-text`, and the readers behind them.
//!
//! A [`Reader`] turns a file or a string in some format into an XML tree.
//! Readers are looked up by format name, file extension (with its dot) or
//! MIME type, case-insensitively.

use super::{BuiltinError, check_arity, node_set};
use maxe_core::{Document, read_xml};
use maxe_extension::{CallContext, ExtensionError, XPathArg};
use maxe_resource::ReadParam;
use maxe_types::{SymbolTable, XmlItem};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type ReadFileFn = Arc<dyn Fn(&Path, &ReadParam, &SymbolTable) -> Result<XmlItem, BuiltinError> + Send + Sync>;
pub type ReadTextFn = Arc<dyn Fn(&str, &ReadParam, &SymbolTable) -> Result<XmlItem, BuiltinError> + Send + Sync>;
pub type ReadParamFn = Arc<dyn Fn(&XPathArg) -> Result<ReadParam, BuiltinError> + Send + Sync>;

/// One input format.
#[derive(Clone)]
pub struct Reader {
    name: String,
    read_file: Option<ReadFileFn>,
    read_text: Option<ReadTextFn>,
    read_param: Option<ReadParamFn>,
}

impl Reader {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            read_file: None,
            read_text: None,
            read_param: None,
        }
    }

    pub fn with_file_reader<F>(mut self, f: F) -> Self
    where
        F: Fn(&Path, &ReadParam, &SymbolTable) -> Result<XmlItem, BuiltinError> + Send + Sync + 'static,
    {
        self.read_file = Some(Arc::new(f));
        self
    }

    pub fn with_text_reader<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &ReadParam, &SymbolTable) -> Result<XmlItem, BuiltinError> + Send + Sync + 'static,
    {
        self.read_text = Some(Arc::new(f));
        self
    }

    /// Accepts the optional third argument of `read-file`/`read-text`.
    /// Without this, passing one is an error.
    pub fn with_param_reader<F>(mut self, f: F) -> Self
    where
        F: Fn(&XPathArg) -> Result<ReadParam, BuiltinError> + Send + Sync + 'static,
    {
        self.read_param = Some(Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn unsupported(&self, operation: &'static str) -> BuiltinError {
        BuiltinError::Unsupported {
            reader: self.name.clone(),
            operation,
        }
    }

    fn param(&self, arg: Option<&XPathArg>) -> Result<ReadParam, BuiltinError> {
        match (arg, &self.read_param) {
            (None, _) => Ok(ReadParam::new()),
            (Some(arg), Some(read_param)) => read_param(arg),
            (Some(_), None) => Err(self.unsupported("parameters")),
        }
    }

    pub fn read_file(&self, path: &Path, param: &ReadParam, symbols: &SymbolTable) -> Result<XmlItem, BuiltinError> {
        let read = self.read_file.as_ref().ok_or_else(|| self.unsupported("file reading"))?;
        read(path, param, symbols)
    }

    pub fn read_text(&self, text: &str, param: &ReadParam, symbols: &SymbolTable) -> Result<XmlItem, BuiltinError> {
        let read = self.read_text.as_ref().ok_or_else(|| self.unsupported("text reading"))?;
        read(text, param, symbols)
    }
}

impl fmt::Debug for Reader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("name", &self.name)
            .field("reads_files", &self.read_file.is_some())
            .field("reads_text", &self.read_text.is_some())
            .field("takes_param", &self.read_param.is_some())
            .finish()
    }
}

/// The XML reader. Its parameter, when given, is one more search path for
/// the document's DTD.
pub fn xml_reader() -> Reader {
    fn parse(text: &str, url: Option<&Path>, param: &ReadParam, symbols: &SymbolTable) -> Result<XmlItem, BuiltinError> {
        let doc = Document::parse(text, url, param)?;
        Ok(doc.item(doc.root(), symbols))
    }

    Reader::new("XML")
        .with_file_reader(|path, param, symbols| parse(&read_xml(path)?, Some(path), param, symbols))
        .with_text_reader(|text, param, symbols| parse(text, None, param, symbols))
        .with_param_reader(|arg| {
            let path = arg.as_string()?;
            let mut param = ReadParam::new();
            if !path.is_empty() {
                param.add_path(path);
            }
            Ok(param)
        })
}

/// Readers by lower-cased format name, extension and MIME type.
#[derive(Default)]
pub struct Readers {
    by_format: Mutex<HashMap<String, Arc<Reader>>>,
}

impl Readers {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the XML reader under `xml`, `.xml` and `text/xml`.
    pub fn with_builtin_readers() -> Result<Self, BuiltinError> {
        let readers = Self::new();
        readers.register(xml_reader(), [".xml", "text/xml"])?;
        Ok(readers)
    }

    fn by_format(&self) -> MutexGuard<'_, HashMap<String, Arc<Reader>>> {
        self.by_format.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `reader` under its name and every alias.
    ///
    /// Nothing is registered if any of those formats is already taken.
    pub fn register<'a>(&self, reader: Reader, aliases: impl IntoIterator<Item = &'a str>) -> Result<(), BuiltinError> {
        let mut formats = vec![reader.name().to_lowercase()];
        formats.extend(aliases.into_iter().map(str::to_lowercase));

        let mut by_format = self.by_format();
        for (i, format) in formats.iter().enumerate() {
            if by_format.contains_key(format) || formats[..i].contains(format) {
                return Err(BuiltinError::DuplicateFormat(format.clone()));
            }
        }
        let reader = Arc::new(reader);
        for format in formats {
            log::debug!("Registered {} reader for '{}'", reader.name(), format);
            by_format.insert(format, Arc::clone(&reader));
        }
        Ok(())
    }

    pub fn get(&self, format: &str) -> Result<Arc<Reader>, BuiltinError> {
        self.by_format()
            .get(&format.to_lowercase())
            .cloned()
            .ok_or_else(|| BuiltinError::UnknownFormat(format.to_string()))
    }

    /// Every registered format, sorted.
    pub fn formats(&self) -> Vec<String> {
        let mut formats: Vec<_> = self.by_format().keys().cloned().collect();
        formats.sort();
        formats
    }
}

impl fmt::Debug for Readers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Readers").field("formats", &self.formats()).finish()
    }
}

/// `read-file(path, format?, param?)`. Without a format, or with an empty
/// one, the path's extension picks the reader.
pub(super) fn read_file(readers: &Readers, ctx: &CallContext<'_>, args: Vec<XPathArg>) -> Result<XPathArg, ExtensionError> {
    check_arity("read-file", &args, 1..=3)?;
    let read = || -> Result<Vec<XmlItem>, BuiltinError> {
        let path = args[0].as_path()?;
        let format = match args.get(1).map(XPathArg::as_string).transpose()? {
            Some(format) if !format.is_empty() => format,
            _ => path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default(),
        };
        let reader = readers.get(&format)?;
        let param = reader.param(args.get(2))?;
        Ok(vec![reader.read_file(&path, &param, ctx.symbols)?])
    };
    Ok(node_set(ctx.symbols, read()))
}

/// `read-text(text, format, param?)`.
pub(super) fn read_text(readers: &Readers, ctx: &CallContext<'_>, args: Vec<XPathArg>) -> Result<XPathArg, ExtensionError> {
    check_arity("read-text", &args, 2..=3)?;
    let read = || -> Result<Vec<XmlItem>, BuiltinError> {
        let text = args[0].as_string()?;
        let reader = readers.get(&args[1].as_string()?)?;
        let param = reader.param(args.get(2))?;
        Ok(vec![reader.read_text(&text, &param, ctx.symbols)?])
    };
    Ok(node_set(ctx.symbols, read()))
}

#[cfg(test)]
mod tests {
    use super::super::MAXE_EXT_NAMESPACE;
    use super::super::tests::table;
    use super::*;
    use maxe_types::XmlKind;
    use std::fs;
    use tempfile::tempdir;

    fn error_type(symbols: &SymbolTable, result: &XPathArg) -> Option<String> {
        let item = &result.as_node_set().ok()?[0];
        (item.name.as_ref()?.local_name() == "error")
            .then(|| item.get_attribute(&symbols.qname_in("", "type")).map(str::to_string))
            .flatten()
    }

    #[test]
    fn test_read_file_by_extension() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("data.xml");
        fs::write(&file, b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><r a=\"1\">caf\xE9<!-- c --></r>").unwrap();
        let (symbols, table) = table();
        let ctx = CallContext::new(&symbols);

        let arg = XPathArg::from(file.display().to_string());
        let result = table.call_function(MAXE_EXT_NAMESPACE, "read-file", &ctx, vec![arg]).unwrap();
        let doc = &result.as_node_set().unwrap()[0];
        assert_eq!(doc.kind, XmlKind::Document);
        assert_eq!(doc.value, "caf\u{e9}");
        let root = doc.child_elements().next().unwrap();
        assert_eq!(root.name.as_ref().unwrap().local_name(), "r");
        assert_eq!(root.get_attribute(&symbols.qname_in("", "a")), Some("1"));
        assert_eq!(root.children.len(), 2);
    }

    #[test]
    fn test_read_file_with_explicit_format_and_param() {
        let dir = tempdir().unwrap();
        let dtds = tempdir().unwrap();
        fs::write(dtds.path().join("r.dtd"), b"<!ELEMENT r ANY>").unwrap();
        let file = dir.path().join("data.txt");
        fs::write(&file, b"<!DOCTYPE r SYSTEM \"r.dtd\"><r/>").unwrap();
        let (symbols, table) = table();
        let ctx = CallContext::new(&symbols);

        let args = vec![
            XPathArg::from(file.display().to_string()),
            XPathArg::from("text/XML"),
            XPathArg::from(dtds.path().display().to_string()),
        ];
        let result = table.call_function(MAXE_EXT_NAMESPACE, "read-file", &ctx, args).unwrap();
        assert_eq!(error_type(&symbols, &result), None);
        assert_eq!(result.as_node_set().unwrap()[0].kind, XmlKind::Document);

        let arg = XPathArg::from(file.display().to_string());
        let result = table.call_function(MAXE_EXT_NAMESPACE, "read-file", &ctx, vec![arg]).unwrap();
        assert_eq!(error_type(&symbols, &result).as_deref(), Some("UnknownFormat"));
    }

    #[test]
    fn test_read_file_failures_become_error_elements() {
        let dir = tempdir().unwrap();
        let broken = dir.path().join("broken.xml");
        fs::write(&broken, b"<a><b></a>").unwrap();
        let (symbols, table) = table();
        let ctx = CallContext::new(&symbols);

        let arg = XPathArg::from(broken.display().to_string());
        let result = table.call_function(MAXE_EXT_NAMESPACE, "read-file", &ctx, vec![arg]).unwrap();
        assert_eq!(error_type(&symbols, &result).as_deref(), Some("DocumentError"));

        let arg = XPathArg::from(dir.path().join("missing.xml").display().to_string());
        let result = table.call_function(MAXE_EXT_NAMESPACE, "read-file", &ctx, vec![arg]).unwrap();
        assert_eq!(error_type(&symbols, &result).as_deref(), Some("DocumentError"));
    }

    #[test]
    fn test_read_text() {
        let (symbols, table) = table();
        let ctx = CallContext::new(&symbols);

        let args = vec![XPathArg::from("<p xmlns='urn:x'>hi</p>"), XPathArg::from("xml")];
        let result = table.call_function(MAXE_EXT_NAMESPACE, "read-text", &ctx, args).unwrap();
        let doc = &result.as_node_set().unwrap()[0];
        assert_eq!(doc.child_elements().next().unwrap().name.as_ref().unwrap().clark(), "{urn:x}p");

        let args = vec![XPathArg::from("# title"), XPathArg::from("rst")];
        let result = table.call_function(MAXE_EXT_NAMESPACE, "read-text", &ctx, args).unwrap();
        assert_eq!(error_type(&symbols, &result).as_deref(), Some("UnknownFormat"));
    }

    #[test]
    fn test_register_is_atomic_and_case_insensitive() {
        let readers = Readers::with_builtin_readers().unwrap();
        assert_eq!(readers.formats(), vec![".xml", "text/xml", "xml"]);

        let err = readers.register(Reader::new("Markdown"), [".md", ".XML"]).unwrap_err();
        assert!(matches!(err, BuiltinError::DuplicateFormat(ref f) if f == ".xml"));
        assert!(readers.get("markdown").is_err());

        readers.register(Reader::new("Markdown"), [".md"]).unwrap();
        assert_eq!(readers.get("MARKDOWN").unwrap().name(), "Markdown");
    }

    #[test]
    fn test_reader_without_capabilities() {
        let symbols = SymbolTable::new();
        let reader = Reader::new("Plain");
        let err = reader.read_text("x", &ReadParam::new(), &symbols).unwrap_err();
        assert!(matches!(err, BuiltinError::Unsupported { operation: "text reading", .. }));
        let err = reader.param(Some(&XPathArg::from("p"))).unwrap_err();
        assert!(matches!(err, BuiltinError::Unsupported { operation: "parameters", .. }));
        assert!(reader.param(None).unwrap().paths().is_empty());
    }
}
