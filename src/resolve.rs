//! Dotted field path resolution
//!
//! `resolve(doc, "a.b.c")` walks nested subdocuments. Arrays are never
//! indexed or flattened here: expansion happens only through the explicit
//! `[]` marker handled by the projection plan.

use crate::types::{Document, Value};

/// Marker that turns a mapping path into an array expansion
pub const EXPANSION_MARKER: &str = "[]";

/// Resolve a dotted path against a document
///
/// Returns `None` when a segment is missing, when an intermediate value is
/// not a subdocument (arrays included), or when the addressed value is null.
pub fn resolve<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = doc.get(first)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Resolve a path against an arbitrary value rather than a document
///
/// An empty path addresses the value itself.
pub fn resolve_in<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return (!value.is_null()).then_some(value);
    }
    resolve(value.as_document()?, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::convert_document;
    use bson::doc;

    fn sample() -> Document {
        convert_document(doc! {
            "_id": 7,
            "username": "ada",
            "profile": {
                "city": "London",
                "last": bson::Bson::Null,
                "address": {"zip": "N1"},
            },
            "pages": [{"text": "a"}, {"text": "b"}],
            "missing_parent": bson::Bson::Null,
        })
    }

    #[test]
    fn test_top_level_field() {
        let doc = sample();
        assert_eq!(resolve(&doc, "username"), Some(&Value::from("ada")));
        assert_eq!(resolve(&doc, "_id"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_nested_field() {
        let doc = sample();
        assert_eq!(resolve(&doc, "profile.city"), Some(&Value::from("London")));
        assert_eq!(resolve(&doc, "profile.address.zip"), Some(&Value::from("N1")));
    }

    #[test]
    fn test_subdocument_is_returned_whole() {
        let doc = sample();
        let address = resolve(&doc, "profile.address").unwrap();
        assert!(address.as_document().is_some());
    }

    #[test]
    fn test_missing_segments_are_absent() {
        let doc = sample();
        assert_eq!(resolve(&doc, "nope"), None);
        assert_eq!(resolve(&doc, "profile.nope"), None);
        assert_eq!(resolve(&doc, "profile.city.nope"), None);
        assert_eq!(resolve(&doc, "nope.deeper.still"), None);
    }

    #[test]
    fn test_null_is_absent() {
        let doc = sample();
        assert_eq!(resolve(&doc, "profile.last"), None);
        assert_eq!(resolve(&doc, "missing_parent"), None);
        assert_eq!(resolve(&doc, "missing_parent.child"), None);
    }

    #[test]
    fn test_arrays_are_not_traversed() {
        let doc = sample();
        assert_eq!(resolve(&doc, "pages.text"), None);
        assert_eq!(resolve(&doc, "pages.0"), None);
        assert_eq!(resolve(&doc, "pages.0.text"), None);
        // the array itself is a value
        assert!(resolve(&doc, "pages").unwrap().as_array().is_some());
    }

    #[test]
    fn test_resolve_in_element() {
        let element = Value::Document(convert_document(doc! {"text": "a", "meta": {"n": 1}}));
        assert_eq!(resolve_in(&element, "text"), Some(&Value::from("a")));
        assert_eq!(resolve_in(&element, "meta.n"), Some(&Value::Int(1)));
        assert_eq!(resolve_in(&element, ""), Some(&element));

        let scalar = Value::from("tag");
        assert_eq!(resolve_in(&scalar, ""), Some(&scalar));
        assert_eq!(resolve_in(&scalar, "text"), None);
        assert_eq!(resolve_in(&Value::Null, ""), None);
    }
}
