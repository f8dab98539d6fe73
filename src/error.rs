//! Structured error types for folio.
//!
//! Structural, format and configuration errors abort the document build.
//! Resource and capacity problems are recovered where they occur and only
//! show up in the log.

use crate::pdf::ObjRef;
use crate::resource::ResourceError;

/// The unified error type returned by all public folio API functions.
#[derive(Debug, thiserror::Error)]
pub enum FolioError {
    /// An object number was given a second definition.
    #[error("object {0} already has a definition")]
    DuplicateAssignment(ObjRef),

    /// A number was handed out by the registry but no object was ever defined for it.
    #[error("object {0} was reserved but never defined")]
    UndefinedObject(ObjRef),

    /// An object points at a number the registry never handed out.
    #[error("object {by} references {referenced}, which was never registered")]
    UnregisteredObject { referenced: ObjRef, by: ObjRef },

    /// A font program of a kind that cannot be embedded.
    #[error("unsupported font format: {0}")]
    UnsupportedFontFormat(String),

    /// A prerequisite dictionary or tree is missing from the document.
    #[error("missing {structure}: {detail}")]
    MissingStructure {
        structure: &'static str,
        detail: String,
    },

    /// A font program could not be parsed or subset.
    #[error("font error: {0}")]
    Font(String),

    /// The gradient request is inconsistent (stop counts, coordinates).
    #[error("invalid gradient: {0}")]
    InvalidGradient(String),

    /// Configuration JSON failed to parse.
    #[error("failed to parse configuration: {source}{}", hint_suffix(.hint))]
    ConfigParse {
        source: serde_json::Error,
        hint: String,
    },

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FolioError>;

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the configuration schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => "Unexpected end of input. Is the JSON truncated?".to_string(),
            serde_json::error::Category::Io => String::new(),
        };
        FolioError::ConfigParse { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_carries_hint() {
        let err: FolioError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.contains("failed to parse configuration"));
        assert!(msg.contains("trailing commas"));
    }

    #[test]
    fn test_structural_messages_name_objects() {
        let err = FolioError::UnregisteredObject {
            referenced: ObjRef::new(9),
            by: ObjRef::new(2),
        };
        assert_eq!(err.to_string(), "object 2 0 R references 9 0 R, which was never registered");
    }
}
