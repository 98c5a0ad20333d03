//! # maxe
//!
//! Makes an XML engine extensible and configurable in one uniform way.
//!
//! A [`Maxe`] instance owns the process-wide symbol table and extension
//! registry. Drivers build a [`ProcessingContext`] from it, read documents
//! and stylesheets through that context, and finally ask for the
//! [`SerializationConfig`] to write the result with.

pub mod error;
pub mod ext;

// Re-export workspace crates
pub use maxe_extension as extension;
pub use maxe_resource as resource;
pub use maxe_traits as traits;
pub use maxe_types as types;
pub use maxe_xslt as xslt;

pub use error::MaxeError;
pub use ext::{BuiltinError, Readers};
pub use maxe_core::{
    ContextError, Document, DocumentError, OutputMethod, ProcessingContext, SerializationConfig, SerializationError,
};
pub use maxe_extension::{ExtensionKind, ExtensionRegistry};
pub use maxe_types::{QName, SymbolTable};
pub use maxe_xslt::{Stylesheet, XsltParams};

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The configuration a run will serialize with, plus the encoding it
/// settled on and the parameters the stylesheet is applied with.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputPlan {
    pub config: SerializationConfig,
    pub output_encoding: String,
    #[serde(skip_serializing_if = "XsltParams::is_empty")]
    pub params: XsltParams,
}

pub struct Maxe {
    registry: ExtensionRegistry,
    readers: Arc<Readers>,
}

impl Maxe {
    /// A fresh symbol table, reader registry and extension registry, with
    /// the built-in readers and extensions registered.
    pub fn new() -> Result<Self, MaxeError> {
        let registry = ExtensionRegistry::new(Arc::new(SymbolTable::new()));
        let readers = Arc::new(Readers::with_builtin_readers()?);
        ext::register_builtin_extensions(&registry, &readers)?;
        Ok(Self { registry, readers })
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// The readers behind `read-file` and `read-text`. Readers registered
    /// here are visible to those functions immediately.
    pub fn readers(&self) -> &Readers {
        &self.readers
    }

    pub fn symbols(&self) -> &Arc<SymbolTable> {
        self.registry.symbols()
    }

    /// A context over the current extensions and `paths`, in order.
    pub fn context<P: Into<PathBuf>>(&self, paths: impl IntoIterator<Item = P>) -> ProcessingContext {
        let mut ctx = ProcessingContext::new(&self.registry);
        for path in paths {
            ctx.add_path(path);
        }
        ctx
    }

    /// Reads and compiles the stylesheet at `path`, bound to `params`.
    pub fn compile(&self, ctx: &ProcessingContext, path: &Path, params: XsltParams) -> Result<Stylesheet, MaxeError> {
        Ok(Stylesheet::open(path, ctx)?.with_params(params))
    }

    /// Derives the output configuration for a run.
    ///
    /// With a stylesheet, the result tree is what gets written, so only the
    /// stylesheet's directives count and the document is not consulted.
    /// Without one, the document is written back and its prolog decides.
    /// The programmatic defaults fill whatever is left in either case.
    pub fn derive_config(
        &self,
        ctx: &ProcessingContext,
        stylesheet: Option<&Stylesheet>,
        document: Option<&Path>,
    ) -> Result<SerializationConfig, MaxeError> {
        let derived = match (stylesheet, document) {
            (Some(sheet), _) => sheet.serialization_config()?.clone(),
            (None, Some(path)) => {
                log::info!("Reading document from {}", path.display());
                let text = maxe_core::read_xml(path)?;
                let cwd = std::env::current_dir()?;
                let doc = Document::parse(&text, Some(path), &ctx.read_param(Some(&cwd)))?;
                SerializationConfig::from_document(&doc, self.symbols())
            }
            (None, None) => SerializationConfig::default(),
        };
        Ok(SerializationConfig::merge(&derived, &SerializationConfig::programmatic_defaults()))
    }

    /// Pairs `config` with the encoding to write in: the configured one, else
    /// the locale's, else `utf-8`.
    pub fn plan(config: SerializationConfig) -> OutputPlan {
        let locale = maxe_core::locale_encoding();
        let output_encoding = config.resolve_encoding(&[locale.as_deref()]).to_string();
        OutputPlan {
            config,
            output_encoding,
            params: XsltParams::new(),
        }
    }

    /// [`plan`](Self::plan), carrying the parameters `stylesheet` is bound to.
    pub fn plan_for(stylesheet: &Stylesheet, config: SerializationConfig) -> OutputPlan {
        OutputPlan {
            params: stylesheet.params().clone(),
            ..Self::plan(config)
        }
    }

    /// Resolves `reference` against the context's search paths.
    pub fn resolve(&self, ctx: &ProcessingContext, reference: &str) -> Result<PathBuf, MaxeError> {
        ctx.resolve(reference)
            .map(|found| found.into_path())
            .ok_or_else(|| MaxeError::NotFound(reference.to_string()))
    }
}
