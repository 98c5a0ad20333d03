//! Stylesheet compilation and `<xsl:output>` discovery.

use crate::error::XsltError;
use crate::params::XsltParams;
use maxe_core::{Document, OutputDirective, ProcessingContext, SerializationConfig, decode_xml};
use maxe_extension::ExtensionTable;
use maxe_resource::{BaseDirResolver, EntityResolver, Reference, ResolvedFile, path_identity};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const XSLT_NAMESPACE: &str = "http://www.w3.org/1999/XSL/Transform";

/// A stylesheet ready to be handed to an XSLT engine.
#[derive(Debug)]
pub struct Stylesheet {
    url: Option<PathBuf>,
    modules: Vec<PathBuf>,
    deferred: Vec<String>,
    declared_params: Vec<String>,
    directives: Vec<OutputDirective>,
    extensions: ExtensionTable,
    params: XsltParams,
    config: OnceCell<SerializationConfig>,
}

fn is_xslt(node: roxmltree::Node<'_, '_>, local: &str) -> bool {
    node.is_element() && node.tag_name().namespace() == Some(XSLT_NAMESPACE) && node.tag_name().name() == local
}

fn check_root(doc: &Document<'_>) -> Result<(), XsltError> {
    let root = doc.root_element();
    if is_xslt(root, "stylesheet") || is_xslt(root, "transform") {
        return Ok(());
    }
    let tag = root.tag_name();
    Err(XsltError::NotAStylesheet {
        root: maxe_types::clark_name(tag.namespace().unwrap_or(""), tag.name()),
    })
}

/// Walks a stylesheet and its imported and included modules.
struct Discovery<'c> {
    ctx: &'c ProcessingContext,
    visited: HashSet<PathBuf>,
    modules: Vec<PathBuf>,
    deferred: Vec<String>,
    declared_params: Vec<String>,
    directives: Vec<OutputDirective>,
}

impl Discovery<'_> {
    /// Collects the top-level `<xsl:output>` and `<xsl:param>` elements of
    /// `doc`, then descends into its `xsl:import`/`xsl:include` modules in
    /// reference order.
    fn visit(&mut self, doc: &Document<'_>) -> Result<(), XsltError> {
        check_root(doc)?;
        let top_level: Vec<_> = doc.root_element().children().filter(|n| n.is_element()).collect();

        for output in top_level.iter().filter(|n| is_xslt(**n, "output")) {
            let attributes = output
                .attributes()
                .filter(|a| a.namespace().is_none())
                .map(|a| (a.name(), a.value()));
            self.directives.push(OutputDirective::from_attributes(attributes));
        }

        for name in top_level
            .iter()
            .filter(|n| is_xslt(**n, "param"))
            .filter_map(|n| n.attribute("name"))
        {
            if !self.declared_params.iter().any(|p| p == name) {
                self.declared_params.push(name.to_string());
            }
        }

        let hrefs: Vec<&str> = top_level
            .iter()
            .filter(|n| is_xslt(**n, "import") || is_xslt(**n, "include"))
            .filter_map(|n| n.attribute("href"))
            .collect();
        for href in hrefs {
            let Some(module) = self.resolve_module(href, doc.url())? else {
                log::info!("Module '{}' is not a local file, leaving it to the engine", href);
                self.deferred.push(href.to_string());
                continue;
            };
            if !self.visited.insert(path_identity(module.path())) {
                log::debug!("Module '{}' already visited, skipping", module.path().display());
                continue;
            }
            let text = decode_xml(&module.read_bytes()?)?;
            let module_doc = Document::parse(&text, Some(module.path()), &self.ctx.read_param(None))?;
            self.modules.push(module.path().to_path_buf());
            self.visit(&module_doc)?;
        }
        Ok(())
    }

    /// Resolves `href` relative to the referring module, then through the
    /// context's search paths. A URI with a scheme other than `file` gives
    /// `Ok(None)`.
    fn resolve_module(&self, href: &str, referrer: Option<&Path>) -> Result<Option<ResolvedFile>, XsltError> {
        let path = match Reference::parse(href) {
            Reference::Path(path) => path,
            Reference::Uri(_) => return Ok(None),
        };
        let as_path = Path::new(path);
        let found = if as_path.is_absolute() {
            as_path.is_file().then(|| ResolvedFile::new(as_path))
        } else {
            referrer
                .and_then(BaseDirResolver::for_file)
                .and_then(|base| base.resolve(path))
                .or_else(|| self.ctx.resolve(path))
        };
        found.map(Some).ok_or_else(|| XsltError::UnresolvedModule {
            href: href.to_string(),
            referrer: referrer.map_or_else(|| "<input>".to_string(), |p| p.display().to_string()),
        })
    }
}

impl Stylesheet {
    /// Compiles the stylesheet in `text`, read from `url` when known.
    pub fn compile(text: &str, url: Option<&Path>, ctx: &ProcessingContext) -> Result<Self, XsltError> {
        let doc = Document::parse(text, url, &ctx.read_param(None))?;

        let mut discovery = Discovery {
            ctx,
            visited: HashSet::new(),
            modules: Vec::new(),
            deferred: Vec::new(),
            declared_params: Vec::new(),
            directives: Vec::new(),
        };
        if let Some(url) = url {
            discovery.visited.insert(path_identity(url));
        }
        discovery.visit(&doc)?;

        let extensions = ExtensionTable::from_extensions(ctx.extensions());
        log::info!(
            "Compiled stylesheet with {} module(s), {} output directive(s), {} extension(s)",
            discovery.modules.len() + 1,
            discovery.directives.len(),
            extensions.len()
        );
        Ok(Stylesheet {
            url: url.map(Path::to_path_buf),
            modules: discovery.modules,
            deferred: discovery.deferred,
            declared_params: discovery.declared_params,
            directives: discovery.directives,
            extensions,
            params: XsltParams::new(),
            config: OnceCell::new(),
        })
    }

    /// Reads and compiles the stylesheet at `path`.
    pub fn open(path: &Path, ctx: &ProcessingContext) -> Result<Self, XsltError> {
        log::info!("Reading stylesheet from {}", path.display());
        let text = maxe_core::read_xml(path)?;
        Self::compile(&text, Some(path), ctx)
    }

    /// Binds the parameters the transform will be run with.
    ///
    /// A parameter the stylesheet never declares is kept; the engine ignores
    /// it, so it is only reported.
    pub fn with_params(mut self, params: XsltParams) -> Self {
        for (name, _) in params.iter() {
            if !self.declared_params.iter().any(|p| p == name) {
                log::warn!("Parameter '{}' is not declared by the stylesheet", name);
            }
        }
        self.params = params;
        self
    }

    pub fn params(&self) -> &XsltParams {
        &self.params
    }

    /// Names of the top-level `<xsl:param>` elements across all modules.
    pub fn declared_params(&self) -> &[String] {
        &self.declared_params
    }

    pub fn url(&self) -> Option<&Path> {
        self.url.as_deref()
    }

    /// Imported and included modules, in discovery order.
    pub fn modules(&self) -> &[PathBuf] {
        &self.modules
    }

    /// `href`s that name remote URIs. The engine resolves those itself.
    pub fn deferred_modules(&self) -> &[String] {
        &self.deferred
    }

    /// Every `<xsl:output>` found, in discovery order.
    pub fn output_directives(&self) -> &[OutputDirective] {
        &self.directives
    }

    pub fn extensions(&self) -> &ExtensionTable {
        &self.extensions
    }

    /// The serialization configuration the stylesheet asks for. Computed on
    /// first access and cached.
    pub fn serialization_config(&self) -> Result<&SerializationConfig, XsltError> {
        self.config
            .get_or_try_init(|| SerializationConfig::from_output_directives(&self.directives))
            .map_err(XsltError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::XsltParamKind;
    use maxe_core::{OutputMethod, SerializationError};
    use maxe_extension::{ExtensionKind, ExtensionRegistry, XPathArg};
    use maxe_types::SymbolTable;
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn context() -> ProcessingContext {
        let registry = ExtensionRegistry::new(Arc::new(SymbolTable::new()));
        registry
            .register_function("example-uri", "double", |_, args| {
                Ok(XPathArg::Number(args[0].as_number()? * 2.0))
            })
            .unwrap();
        ProcessingContext::new(&registry)
    }

    fn xsl(body: &str) -> String {
        format!(
            r#"<xsl:stylesheet version="1.0" xmlns:xsl="{}">{}</xsl:stylesheet>"#,
            XSLT_NAMESPACE, body
        )
    }

    #[test]
    fn test_compile_collects_directives_and_extensions() {
        let ctx = context();
        let text = xsl(r#"<xsl:output method="html" encoding="ISO-8859-1"/><xsl:template match="/"/>"#);
        let sheet = Stylesheet::compile(&text, None, &ctx).unwrap();

        assert_eq!(sheet.output_directives().len(), 1);
        assert_eq!(sheet.extensions().kind_of("example-uri", "double"), Some(ExtensionKind::Function));

        let cfg = sheet.serialization_config().unwrap();
        assert_eq!(cfg.method, Some(OutputMethod::Html));
        assert_eq!(cfg.encoding.as_deref(), Some("ISO-8859-1"));
        assert_eq!(cfg.declaration, Some(true));
        assert!(std::ptr::eq(cfg, sheet.serialization_config().unwrap()));
    }

    #[test]
    fn test_transform_root_is_accepted() {
        let text = format!(r#"<xsl:transform version="1.0" xmlns:xsl="{}"/>"#, XSLT_NAMESPACE);
        assert!(Stylesheet::compile(&text, None, &context()).is_ok());
    }

    #[test]
    fn test_not_a_stylesheet() {
        let err = Stylesheet::compile("<html xmlns='urn:x'/>", None, &context()).unwrap_err();
        assert!(matches!(err, XsltError::NotAStylesheet { ref root } if root == "{urn:x}html"));
    }

    #[test]
    fn test_invalid_method_fails_on_config() {
        let sheet = Stylesheet::compile(&xsl(r#"<xsl:output method="svg"/>"#), None, &context()).unwrap();
        let err = sheet.serialization_config().unwrap_err();
        assert!(matches!(
            err,
            XsltError::Serialization(SerializationError::UnsupportedValue { field: "method", .. })
        ));
    }

    #[test]
    fn test_imports_are_discovered_after_main_module() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(
            dir.path().join("lib").join("base.xsl"),
            xsl(r#"<xsl:include href="leaf.xsl"/><xsl:output method="text" media-type="text/plain"/>"#),
        )
        .unwrap();
        fs::write(
            dir.path().join("lib").join("leaf.xsl"),
            xsl(r#"<xsl:output standalone="yes" encoding="utf-16"/>"#),
        )
        .unwrap();
        let main = dir.path().join("main.xsl");
        let text = xsl(r#"<xsl:import href="lib/base.xsl"/><xsl:output method="xml"/>"#);
        fs::write(&main, &text).unwrap();

        let sheet = Stylesheet::compile(&text, Some(&main), &context()).unwrap();
        assert_eq!(
            sheet.modules(),
            &[dir.path().join("lib").join("base.xsl"), dir.path().join("lib").join("leaf.xsl")]
        );
        let methods: Vec<_> = sheet.output_directives().iter().map(|d| d.method.clone()).collect();
        assert_eq!(methods, vec![Some("xml".to_string()), Some("text".to_string()), None]);

        let cfg = sheet.serialization_config().unwrap();
        assert_eq!(cfg.method, Some(OutputMethod::Xml));
        assert_eq!(cfg.media_type.as_deref(), Some("text/plain"));
        assert_eq!(cfg.standalone, Some(true));
        assert_eq!(cfg.encoding.as_deref(), Some("utf-16"));
    }

    #[test]
    fn test_import_cycle_is_visited_once() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.xsl");
        let b = dir.path().join("b.xsl");
        fs::write(&a, xsl(r#"<xsl:import href="b.xsl"/><xsl:output indent="yes"/>"#)).unwrap();
        fs::write(&b, xsl(r#"<xsl:import href="a.xsl"/><xsl:output indent="no"/>"#)).unwrap();

        let text = fs::read_to_string(&a).unwrap();
        let sheet = Stylesheet::compile(&text, Some(&a), &context()).unwrap();
        assert_eq!(sheet.modules(), &[b.clone()]);
        assert_eq!(sheet.output_directives().len(), 2);
        assert_eq!(sheet.serialization_config().unwrap().indent, Some(false));
    }

    #[test]
    fn test_module_from_search_path() {
        let shared = tempdir().unwrap();
        fs::write(shared.path().join("common.xsl"), xsl(r#"<xsl:output version="1.1"/>"#)).unwrap();
        let mut ctx = context();
        ctx.add_path(shared.path());

        let sheet = Stylesheet::compile(&xsl(r#"<xsl:include href="common.xsl"/>"#), None, &ctx).unwrap();
        assert_eq!(sheet.serialization_config().unwrap().version.as_deref(), Some("1.1"));
    }

    #[test]
    fn test_latin1_module_is_decoded() {
        let dir = tempdir().unwrap();
        let mut module = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>".to_vec();
        let body = xsl(r#"<xsl:output media-type="text/caf@"/>"#);
        module.extend(body.bytes().map(|b| if b == b'@' { 0xE9 } else { b }));
        fs::write(dir.path().join("latin.xsl"), &module).unwrap();

        let text = xsl(r#"<xsl:include href="latin.xsl"/>"#);
        let main = dir.path().join("main.xsl");
        let sheet = Stylesheet::compile(&text, Some(&main), &context()).unwrap();
        assert_eq!(
            sheet.serialization_config().unwrap().media_type.as_deref(),
            Some("text/caf\u{e9}")
        );
    }

    #[test]
    fn test_file_uri_and_remote_hrefs() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("base.xsl");
        fs::write(&base, xsl(r#"<xsl:output method="text"/>"#)).unwrap();
        let body = format!(
            r#"<xsl:import href="http://example.com/remote.xsl"/><xsl:import href="file://{}"/>"#,
            base.display()
        );

        let sheet = Stylesheet::compile(&xsl(&body), None, &context()).unwrap();
        assert_eq!(sheet.deferred_modules(), &["http://example.com/remote.xsl".to_string()]);
        assert_eq!(sheet.modules(), &[base]);
        assert_eq!(sheet.serialization_config().unwrap().method, Some(OutputMethod::Text));
    }

    #[test]
    fn test_params_are_bound_and_declarations_collected() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("common.xsl"), xsl(r#"<xsl:param name="year"/>"#)).unwrap();
        let main = dir.path().join("main.xsl");
        let text = xsl(r#"<xsl:include href="common.xsl"/><xsl:param name="title" select="'Report'"/>"#);

        let mut params = XsltParams::new();
        params.add("title", XsltParamKind::String, "Q3 'draft'").unwrap();
        params.add("unused", XsltParamKind::XPath, "1").unwrap();
        let sheet = Stylesheet::compile(&text, Some(&main), &context()).unwrap().with_params(params);

        assert_eq!(sheet.declared_params(), &["title".to_string(), "year".to_string()]);
        assert_eq!(sheet.params().get("title"), Some("\"Q3 'draft'\""));
        assert_eq!(sheet.params().len(), 2);
    }

    #[test]
    fn test_unresolved_module() {
        let err = Stylesheet::compile(&xsl(r#"<xsl:import href="missing.xsl"/>"#), None, &context()).unwrap_err();
        assert!(matches!(err, XsltError::UnresolvedModule { ref href, .. } if href == "missing.xsl"));
    }
}
