pub const XSLT_NS: &str = "http://www.w3.org/1999/XSL/Transform";

/// A stylesheet whose top level is `body`.
pub fn stylesheet(body: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<xsl:stylesheet version="1.0" xmlns:xsl="{}">
{}
<xsl:template match="/"><xsl:copy-of select="."/></xsl:template>
</xsl:stylesheet>"#,
        XSLT_NS, body
    )
}

/// A document with the given prolog in front of `<report/>`.
pub fn document(prolog: &str) -> String {
    format!("{}<report><title>Q3</title></report>", prolog)
}
