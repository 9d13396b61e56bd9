//! Relation lookup and typed access into the decoded JSON tree.

use serde_json::{Map, Value};

use crate::error::{Result, SideloadError};

/// Name of the entity field matched by [`find`].
pub const ID_FIELD: &str = "id";

/// Find the entity with the given `id` in the top-level collection
/// `collection_key`.
///
/// Returns `None` when the collection is missing, is not an array, or holds
/// no object whose `"id"` is numerically equal to `id`. The first match wins.
///
/// # Example
///
/// ```
/// use json_sideload::find;
/// use serde_json::json;
///
/// let doc = json!({"authors": [{"id": 5, "name": "Al"}, {"id": 6, "name": "Bo"}]});
/// let doc = doc.as_object().unwrap();
/// let found = find(doc, "authors", 6.0).unwrap();
/// assert_eq!(found["name"], "Bo");
/// assert!(find(doc, "authors", 7.0).is_none());
/// assert!(find(doc, "editors", 5.0).is_none());
/// ```
pub fn find<'a>(
    document: &'a Map<String, Value>,
    collection_key: &str,
    id: f64,
) -> Option<&'a Value> {
    let Value::Array(entities) = document.get(collection_key)? else {
        return None;
    };
    // Value::get is None for non-objects
    entities
        .iter()
        .find(|entity| entity.get(ID_FIELD).and_then(Value::as_f64) == Some(id))
}

/// Get `key` from `object`, treating an explicit `null` as absent.
pub fn get_present<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    match object.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value),
    }
}

/// Name of the JSON type of `value`, for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn as_object<'a>(value: &'a Value, field: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| SideloadError::type_mismatch(field, "object", json_type_name(value)))
}

/// Elements of `obj[key]`, or an empty slice when the value is absent, null
/// or not an array.
pub(crate) fn get_list<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    match get_present(obj, key) {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

pub(crate) fn as_id(value: &Value, field: &str) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| SideloadError::type_mismatch(field, "numeric id", json_type_name(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    #[test]
    fn test_find_by_id_not_position() {
        let doc = doc(json!({
            "authors": [{"id": 6, "name": "Bo"}, {"id": 5, "name": "Al"}]
        }));
        assert_eq!(find(&doc, "authors", 5.0).unwrap()["name"], "Al");
        assert_eq!(find(&doc, "authors", 6.0).unwrap()["name"], "Bo");
    }

    #[test]
    fn test_find_first_match_wins() {
        let doc = doc(json!({
            "tags": [{"id": 1, "label": "first"}, {"id": 1, "label": "second"}]
        }));
        assert_eq!(find(&doc, "tags", 1.0).unwrap()["label"], "first");
    }

    #[test]
    fn test_find_numeric_equality() {
        let doc = doc(json!({"items": [{"id": 3.0}, {"id": 4}]}));
        assert!(find(&doc, "items", 3.0).is_some());
        assert!(find(&doc, "items", 4.0).is_some());
    }

    #[test]
    fn test_find_not_found_cases() {
        let doc = doc(json!({
            "notArray": {"id": 1},
            "mixed": [null, 1, "x", {"id": "1"}, {"name": "no id"}],
        }));
        assert!(find(&doc, "missing", 1.0).is_none());
        assert!(find(&doc, "notArray", 1.0).is_none());
        assert!(find(&doc, "mixed", 1.0).is_none());
    }

    #[test]
    fn test_get_present_treats_null_as_absent() {
        let obj = doc(json!({"a": null, "b": 0}));
        assert_eq!(get_present(&obj, "a"), None);
        assert_eq!(get_present(&obj, "b"), Some(&json!(0)));
        assert_eq!(get_present(&obj, "c"), None);
    }

    #[test]
    fn test_get_list_ignores_non_arrays() {
        let obj = doc(json!({"a": [1, 2], "b": {"id": 1}, "c": null, "d": 3}));
        assert_eq!(get_list(&obj, "a"), [json!(1), json!(2)]);
        assert!(get_list(&obj, "b").is_empty());
        assert!(get_list(&obj, "c").is_empty());
        assert!(get_list(&obj, "d").is_empty());
        assert!(get_list(&obj, "e").is_empty());
    }

    #[test]
    fn test_accessors_name_found_type() {
        let err = as_object(&json!([1]), "author").unwrap_err();
        assert!(matches!(
            err,
            SideloadError::TypeMismatch { expected: "object", found: "array", .. }
        ));
        let err = as_id(&json!(true), "authorId").unwrap_err();
        assert!(matches!(
            err,
            SideloadError::TypeMismatch { found: "boolean", .. }
        ));
        assert_eq!(as_id(&json!(7), "authorId").unwrap(), 7.0);
    }
}
