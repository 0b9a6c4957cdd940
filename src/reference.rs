//! Reference token parsing and resolution
//!
//! A reference token is a string of the form `$ref.<path>`, where `<path>`
//! is a dot-delimited property path into the data object being validated
//! (e.g. `$ref.user.age`). The textual format is stable: the 5-character
//! prefix is the only marker, and the path is taken verbatim after it.
//!
//! Resolution is a structural traversal only. The path is split on `.` and
//! walked one property lookup at a time; it is never evaluated as code.

use serde_json::Value;

use crate::error::{Result, SchemaError};

/// Prefix marking a string value as a cross-property reference
pub const REF_PREFIX: &str = "$ref.";

/// True iff the string is a reference token
pub fn is_reference(value: &str) -> bool {
    value.starts_with(REF_PREFIX)
}

/// Strip the reference prefix, returning the raw property path.
///
/// Callers are expected to check [`is_reference`] first; a string without
/// the prefix is returned unchanged.
pub fn parse_reference_name(value: &str) -> &str {
    value.strip_prefix(REF_PREFIX).unwrap_or(value)
}

/// Walk a dot-delimited path through a data object.
///
/// Object segments are looked up by key; numeric segments index into
/// arrays. Returns `None` as soon as an intermediate is missing or is not
/// a container, so a `null` in the middle of the path can never be
/// silently traversed.
pub fn lookup_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = data;

    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Resolve a reference token.
///
/// With no data object the token is returned unchanged, which lets callers
/// re-emit a reference instead of resolving it. With a data object the
/// path is looked up structurally; a failed lookup is reported as
/// [`SchemaError::ReferenceResolution`] carrying the offending path, so
/// the caller decides whether that is fatal or just a validation error.
pub fn resolve(reference: &str, data: Option<&Value>) -> Result<Value> {
    let Some(data) = data else {
        return Ok(Value::String(reference.to_string()));
    };

    let path = parse_reference_name(reference);

    lookup_path(data, path)
        .cloned()
        .ok_or_else(|| SchemaError::ReferenceResolution {
            path: path.to_string(),
        })
}
