//! Font program retrieval.
//!
//! Fonts carry a locator string rather than their program bytes. When the
//! factory embeds a font it asks a [`ResourceResolver`] for the bytes. A
//! failed lookup is never fatal for the document: the font is written
//! without an embedded program.

use std::collections::HashMap;
use std::path::PathBuf;

/// Why a locator could not be turned into bytes.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("no resource found for '{0}'")]
    NotFound(String),
    #[error("failed to read '{locator}': {source}")]
    Io {
        locator: String,
        source: std::io::Error,
    },
    #[error("failed to decode '{locator}': {reason}")]
    Decode { locator: String, reason: String },
}

/// Resolves a font-program locator to its bytes.
pub trait ResourceResolver {
    fn resolve(&self, locator: &str) -> Result<Vec<u8>, ResourceError>;
}

/// Reads data URIs, explicit file paths, and raw base64.
///
/// Relative paths (`./`, `../`, or bare names when a base directory is set)
/// are joined onto `base_dir`.
#[derive(Debug, Clone, Default)]
pub struct DefaultResolver {
    base_dir: Option<PathBuf>,
}

impl DefaultResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        DefaultResolver {
            base_dir: Some(base_dir.into()),
        }
    }

    fn read_file(&self, locator: &str) -> Result<Vec<u8>, ResourceError> {
        let path = match (&self.base_dir, locator.starts_with('/')) {
            (Some(base), false) => base.join(locator),
            _ => PathBuf::from(locator),
        };
        std::fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ResourceError::NotFound(locator.to_string())
            } else {
                ResourceError::Io {
                    locator: locator.to_string(),
                    source,
                }
            }
        })
    }
}

impl ResourceResolver for DefaultResolver {
    fn resolve(&self, locator: &str) -> Result<Vec<u8>, ResourceError> {
        // data:font/ttf;base64,AAEAAA...
        if locator.starts_with("data:") {
            let comma_pos = locator.find(',').ok_or_else(|| ResourceError::Decode {
                locator: truncate(locator),
                reason: "data URI is missing its comma".to_string(),
            })?;
            return base64_decode(&locator[comma_pos + 1..], locator);
        }

        let path_like = locator.starts_with('/')
            || locator.starts_with("./")
            || locator.starts_with("../")
            || locator.starts_with("file://");
        if path_like {
            return self.read_file(locator.trim_start_matches("file://"));
        }
        if self.base_dir.is_some() && !locator.contains('=') {
            // Padding never appears in a file name, so anything without it
            // is tried on disk first.
            match self.read_file(locator) {
                Ok(bytes) => return Ok(bytes),
                Err(ResourceError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        base64_decode(locator, locator)
    }
}

fn base64_decode(input: &str, locator: &str) -> Result<Vec<u8>, ResourceError> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| ResourceError::Decode {
            locator: truncate(locator),
            reason: e.to_string(),
        })
}

fn truncate(locator: &str) -> String {
    locator.chars().take(48).collect()
}

/// Serves font programs registered in memory under a name.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, locator: impl Into<String>, data: Vec<u8>) {
        self.entries.insert(locator.into(), data);
    }
}

impl ResourceResolver for MemoryResolver {
    fn resolve(&self, locator: &str) -> Result<Vec<u8>, ResourceError> {
        self.entries
            .get(locator)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(locator.to_string()))
    }
}
