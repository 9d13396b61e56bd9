//! Resolve sideloaded JSON documents into nested Rust types.
//!
//! A sideloaded document carries a primary resource plus flat, id-indexed
//! collections of related entities. Relations either sit inline under a key
//! of the local object (embedded) or are referenced by id into a top-level
//! collection. Each target type lists its relation fields with directives:
//!
//! ```text
//! hasone,<relationKey>                  embedded single relation
//! hasone,<relationKey>,<idFieldName>    referenced single relation
//! hasmany,<relationKey>                 embedded relation array
//! hasmany,<relationKey>,<idsFieldName>  referenced relation-id array
//! ```
//!
//! # Example
//!
//! ```
//! use json_sideload::{sideload_schema, unmarshal};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize)]
//! struct Author {
//!     name: String,
//! }
//!
//! #[derive(Debug, Default, Deserialize)]
//! struct Article {
//!     title: String,
//!     #[serde(skip)]
//!     author: Option<Box<Author>>,
//!     #[serde(skip)]
//!     reviewers: Vec<Author>,
//! }
//!
//! sideload_schema! {
//!     Author {}
//!     Article {
//!         author => "hasone,authors,authorId",
//!         reviewers => "hasmany,authors,reviewerIds",
//!     }
//! }
//!
//! let input = br#"{
//!     "title": "T",
//!     "authorId": 5,
//!     "reviewerIds": [6, 5],
//!     "authors": [{"id": 5, "name": "Al"}, {"id": 6, "name": "Bo"}]
//! }"#;
//!
//! let mut article = Article::default();
//! unmarshal(input, &mut article).unwrap();
//! assert_eq!(article.author.unwrap().name, "Al");
//! let reviewers: Vec<_> = article.reviewers.iter().map(|a| a.name.as_str()).collect();
//! assert_eq!(reviewers, ["Bo", "Al"]);
//! ```

use std::any::type_name;

use serde_json::Value;
use tracing::debug_span;

mod annotation;
pub use annotation::{FieldAnnotation, RelationKind, RelationMode};

mod error;
pub use error::{Result, SideloadError};

mod lookup;
pub use lookup::{find, get_present, json_type_name, ID_FIELD};

mod options;
pub use options::Options;

mod resolve;

mod schema;
pub use schema::{RelationSlot, Schema, SchemaBuilder, SchemaField, Sideload, SlotShape};

/// Populate `target` from a sideloaded JSON document.
///
/// The document must be a JSON object; it serves both as the root resource
/// and as the universe of collections for id lookups.
///
/// Each node is decoded through its `Deserialize` impl, so `target` is
/// replaced wholesale rather than merged into: fields missing from the
/// document take the values serde gives them, not their previous ones. On
/// error, `target` may already hold the fields resolved before the failure.
pub fn unmarshal<T: Sideload>(input: &[u8], target: &mut T) -> Result<()> {
    unmarshal_with(input, target, &Options::default())
}

/// [`unmarshal`] with explicit [`Options`].
pub fn unmarshal_with<T: Sideload>(
    input: &[u8],
    target: &mut T,
    options: &Options,
) -> Result<()> {
    let document: Value = serde_json::from_slice(input)
        .map_err(|err| SideloadError::MalformedInput(err.to_string()))?;
    resolve_document(&document, target, options)
}

/// Resolve an already decoded document into `target`.
pub fn unmarshal_value<T: Sideload>(
    document: &Value,
    target: &mut T,
    options: &Options,
) -> Result<()> {
    resolve_document(document, target, options)
}

/// Decode a new `T` from sideloaded JSON bytes.
pub fn from_slice<T: Sideload>(input: &[u8]) -> Result<T> {
    let mut target = T::default();
    unmarshal(input, &mut target)?;
    Ok(target)
}

/// Decode a new `T` from a sideloaded JSON string.
pub fn from_str<T: Sideload>(input: &str) -> Result<T> {
    from_slice(input.as_bytes())
}

/// Decode a new `T` from an already decoded document.
pub fn from_value<T: Sideload>(document: &Value) -> Result<T> {
    let mut target = T::default();
    resolve_document(document, &mut target, &Options::default())?;
    Ok(target)
}

fn resolve_document<T: Sideload>(
    document: &Value,
    target: &mut T,
    options: &Options,
) -> Result<()> {
    let Value::Object(root) = document else {
        return Err(SideloadError::MalformedInput(format!(
            "expected a top-level object, found {}",
            json_type_name(document)
        )));
    };
    let _span = debug_span!("unmarshal", node = type_name::<T>()).entered();
    resolve::resolve_node(resolve::Context::root(root, options), document, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sideload_schema;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Plain {
        name: String,
        count: u32,
    }

    sideload_schema! {
        Plain {}
    }

    #[test]
    fn test_unmarshal_plain() {
        let mut plain = Plain::default();
        unmarshal(br#"{"name": "x", "count": 3}"#, &mut plain).unwrap();
        assert_eq!(
            plain,
            Plain {
                name: "x".to_string(),
                count: 3
            }
        );
    }

    #[test]
    fn test_malformed_bytes() {
        let err = from_slice::<Plain>(b"{not json").unwrap_err();
        assert!(matches!(err, SideloadError::MalformedInput(_)));
    }

    #[test]
    fn test_non_object_top_level() {
        for input in ["[1, 2]", "\"text\"", "42", "null"] {
            let err = from_str::<Plain>(input).unwrap_err();
            assert!(
                matches!(err, SideloadError::MalformedInput(_)),
                "input {input}: {err:?}"
            );
        }
    }

    #[test]
    fn test_attribute_type_error_propagates() {
        let err = from_str::<Plain>(r#"{"name": "x", "count": "three"}"#).unwrap_err();
        assert!(matches!(err, SideloadError::Decode(_)));
    }

    #[test]
    fn test_from_value() {
        let plain: Plain = from_value(&json!({"name": "v", "count": 1})).unwrap();
        assert_eq!(plain.count, 1);
        assert!(matches!(
            from_value::<Plain>(&json!([])),
            Err(SideloadError::MalformedInput(_))
        ));
    }
}
