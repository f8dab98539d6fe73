//! # PDF Object Graph
//!
//! Everything that ends up in the file is an indirect object held by the
//! [`ObjectRegistry`]. Objects are created through the [`PdfFactory`], which
//! deduplicates structurally equal functions, shadings, patterns, links,
//! destinations, actions and file specifications, and serialized by
//! [`PdfDocument::write`].
//!
//! ## File layout
//!
//! ```text
//! %PDF-1.4            <- header, raised to 1.6 by full CFF embedding
//! 1 0 obj ... endobj  <- objects in ascending number order
//! 2 0 obj ... endobj
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- /Size, /Root, /Info
//! %%EOF
//! ```

pub mod cmap;
pub mod document;
pub mod factory;
pub mod filter;
pub mod object;
pub mod registry;

pub use document::PdfDocument;
pub use factory::PdfFactory;
pub use object::{Dict, Num, ObjRef, ObjectKind, PdfObject, PdfValue};
pub use registry::ObjectRegistry;

use serde::{Deserialize, Serialize};

/// Header version of the written file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum PdfVersion {
    #[default]
    #[serde(rename = "1.4")]
    V1_4,
    #[serde(rename = "1.5")]
    V1_5,
    #[serde(rename = "1.6")]
    V1_6,
    #[serde(rename = "1.7")]
    V1_7,
}

impl PdfVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfVersion::V1_4 => "1.4",
            PdfVersion::V1_5 => "1.5",
            PdfVersion::V1_6 => "1.6",
            PdfVersion::V1_7 => "1.7",
        }
    }
}

/// Escape special characters in a literal string.
pub fn escape_pdf_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}

/// Writes `s` as a PDF text string: a literal string when it is plain
/// ASCII, UTF-16BE hex with a byte-order mark otherwise.
pub fn text_string(s: &str) -> String {
    if s.is_ascii() {
        return format!("({})", escape_pdf_string(s));
    }
    let mut hex = String::from("<FEFF");
    for unit in s.encode_utf16() {
        hex.push_str(&format!("{:04X}", unit));
    }
    hex.push('>');
    hex
}

/// Writes a name object, `#xx`-escaping delimiters, whitespace and
/// anything outside printable ASCII.
pub fn name_object(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 1);
    out.push('/');
    for b in name.bytes() {
        match b {
            b'!'..=b'~' if !b"#()<>[]{}/%".contains(&b) => out.push(b as char),
            _ => out.push_str(&format!("#{:02X}", b)),
        }
    }
    out
}
