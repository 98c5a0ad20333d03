//! Turns the bytes of an XML file into text before it is parsed.
//!
//! roxmltree only accepts `&str`, so a document written in Latin-1 or UTF-16
//! has to be decoded first. The encoding is taken from the byte order mark,
//! then from the UTF-16 shape of `<?`, then from the declaration's
//! `encoding` pseudo-attribute, and is UTF-8 otherwise.

use crate::error::DocumentError;
use crate::prolog::DocumentInfo;
use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use std::path::Path;

/// Longest declaration we look at when sniffing the encoding.
const MAX_DECL_LEN: usize = 1024;

/// Decodes `bytes` into text.
pub fn decode_xml(bytes: &[u8]) -> Result<String, DocumentError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return decode_with(encoding, &bytes[bom_len..]);
    }
    let encoding = match bytes {
        [0x3C, 0x00, 0x3F, 0x00, ..] => UTF_16LE,
        [0x00, 0x3C, 0x00, 0x3F, ..] => UTF_16BE,
        _ => match declared_encoding(bytes)? {
            Some(label) => {
                Encoding::for_label(label.as_bytes()).ok_or(DocumentError::UnknownEncoding(label))?
            }
            None => UTF_8,
        },
    };
    decode_with(encoding, bytes)
}

/// Reads the file at `path` and decodes it.
pub fn read_xml(path: &Path) -> Result<String, DocumentError> {
    let bytes = std::fs::read(path)?;
    decode_xml(&bytes)
}

/// The `encoding` of an ASCII-compatible XML declaration at the start of `bytes`.
fn declared_encoding(bytes: &[u8]) -> Result<Option<String>, DocumentError> {
    if !bytes.starts_with(b"<?xml") {
        return Ok(None);
    }
    let window = &bytes[..bytes.len().min(MAX_DECL_LEN)];
    let Some(end) = window.windows(2).position(|w| w == b"?>") else {
        return Ok(None);
    };
    let decl = std::str::from_utf8(&window[..end + 2])?;
    Ok(DocumentInfo::scan(decl)?.encoding)
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> Result<String, DocumentError> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(DocumentError::Decode {
            encoding: encoding.name().to_string(),
        });
    }
    log::trace!("Decoded {} bytes as {}", bytes.len(), encoding.name());
    Ok(text.into_owned())
}
