//! Stylesheet compilation for Maxe.
//!
//! Compiling a stylesheet here means everything Maxe needs before handing it
//! to an XSLT engine: checking the root element, collecting the
//! `<xsl:output>` directives of every module, building the extension table
//! and preparing the string parameters.

pub mod error;
pub mod params;
pub mod stylesheet;

pub use error::XsltError;
pub use params::{XsltParamKind, XsltParams, split_assignment, string_literal};
pub use stylesheet::{Stylesheet, XSLT_NAMESPACE};
