//! Document-level settings.
//!
//! Everything has a default, so an empty JSON object is a valid
//! configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::FolioError;
use crate::font::EmbeddingMode;
use crate::pdf::PdfVersion;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentConfig {
    /// Minimum version written in the header. Embedding a CFF OpenType
    /// program in full raises it to 1.6.
    #[serde(default)]
    pub version: PdfVersion,

    /// Flate-compress stream objects.
    #[serde(default = "default_true")]
    pub compress_streams: bool,

    /// zlib level, 0-10.
    #[serde(default = "default_compression_level")]
    pub compression_level: u8,

    /// Applied to fonts whose own mode is `Auto`.
    #[serde(default)]
    pub default_embedding_mode: EmbeddingMode,

    #[serde(default = "default_producer")]
    pub producer: String,

    /// Write a ToUnicode CMap even for fonts using a predefined encoding.
    #[serde(default)]
    pub force_to_unicode: bool,

    /// Directory relative font locators are resolved against.
    #[serde(default)]
    pub font_base_dir: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_compression_level() -> u8 {
    6
}

fn default_producer() -> String {
    concat!("folio ", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for DocumentConfig {
    fn default() -> Self {
        DocumentConfig {
            version: PdfVersion::default(),
            compress_streams: true,
            compression_level: default_compression_level(),
            default_embedding_mode: EmbeddingMode::default(),
            producer: default_producer(),
            force_to_unicode: false,
            font_base_dir: None,
        }
    }
}

impl DocumentConfig {
    pub fn from_json(json: &str) -> Result<Self, FolioError> {
        Ok(serde_json::from_str(json)?)
    }
}
