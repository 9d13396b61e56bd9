//! Error taxonomy for sideload resolution.

use thiserror::Error;

/// Errors produced while resolving a sideloaded document.
///
/// Lookup misses (absent relation key, absent id, id not present in a
/// collection) are never errors; they leave the relation empty.
#[derive(Debug, Error)]
pub enum SideloadError {
    /// The input bytes are not JSON, or the top level is not an object.
    #[error("malformed JSON provided: {0}")]
    MalformedInput(String),

    /// A field directive could not be parsed.
    #[error("bad sideload directive {directive:?}: {reason}")]
    BadAnnotationFormat {
        directive: String,
        reason: &'static str,
    },

    /// A relation field or relation value has the wrong shape.
    #[error("type mismatch for `{field}`: expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Structural decode of a JSON object into a target type failed.
    #[error(transparent)]
    Decode(#[from] serde_json::Error),

    /// Relation nesting went deeper than the configured limit.
    #[error("relation nesting exceeds depth limit of {limit}")]
    DepthLimitExceeded { limit: usize },
}

impl SideloadError {
    pub(crate) fn bad_annotation(directive: &str, reason: &'static str) -> Self {
        SideloadError::BadAnnotationFormat {
            directive: directive.to_string(),
            reason,
        }
    }

    pub(crate) fn type_mismatch(
        field: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        SideloadError::TypeMismatch {
            field: field.into(),
            expected,
            found,
        }
    }
}

pub type Result<T, E = SideloadError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_bad_annotation() {
        let err = SideloadError::bad_annotation("hasone", "missing relation key");
        assert_eq!(
            err.to_string(),
            "bad sideload directive \"hasone\": missing relation key"
        );
    }

    #[test]
    fn test_display_type_mismatch() {
        let err = SideloadError::type_mismatch("author", "object", "string");
        assert_eq!(
            err.to_string(),
            "type mismatch for `author`: expected object, found string"
        );
    }

    #[test]
    fn test_decode_from_serde() {
        let serde_err = serde_json::from_str::<u8>("\"x\"").unwrap_err();
        let err: SideloadError = serde_err.into();
        assert!(matches!(err, SideloadError::Decode(_)));
    }
}
