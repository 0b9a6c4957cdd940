//! Schema normalization
//!
//! Runs once per schema definition, at schema-construction time. Every
//! shorthand declaration is rewritten into a canonical [`PropertySpec`]
//! entry, nested shapes are recursively constructed into schema instances
//! through the host, and constraint shapes are validated. Two raw forms
//! survive untouched: direct-link reference tokens (deferred entirely to
//! validation time) and constraint slots holding reference tokens.
//!
//! All normalization errors abort schema construction; a partially
//! normalized definition is never handed back to the host.

use tracing::{debug, trace};

use crate::error::{Result, SchemaError};
use crate::host::Host;
use crate::reference::is_reference;
use crate::schema::{
    is_pseudo_type, Bound, Pattern, PropertyDecl, PropertySpec, SchemaDef, TypeDecl,
};

/// Normalize a schema definition in place.
///
/// Idempotent through the parsed marker, but the host is expected to call
/// this exactly once per schema instance.
pub fn normalize(schema: &mut SchemaDef, host: &dyn Host) -> Result<()> {
    if schema.is_parsed() {
        return Ok(());
    }
    schema.mark_parsed();

    debug!(properties = schema.len(), "normalizing schema definition");

    for (key, decl) in schema.properties_mut() {
        let normalized = normalize_property(key, decl, host)?;
        if let Some(canonical) = normalized {
            *decl = PropertyDecl::Spec(canonical);
        }
    }

    Ok(())
}

/// Normalize one declaration. Returns the canonical entry to store, or
/// `None` when the declaration stays as-is (direct-link references).
fn normalize_property(
    key: &str,
    decl: &mut PropertyDecl,
    host: &dyn Host,
) -> Result<Option<PropertySpec>> {
    match decl {
        // Shorthand type marker: `age: number`
        PropertyDecl::Marker(marker) => {
            trace!(key = %key, ty = %marker, "shorthand marker declaration");
            Ok(Some(PropertySpec::of(TypeDecl::Marker(*marker))))
        }

        PropertyDecl::Name(name) => {
            if is_pseudo_type(name) {
                Ok(Some(PropertySpec::of(TypeDecl::Name(name.clone()))))
            } else if is_reference(name) {
                // Direct link to another property; all other validation is
                // deferred to the substitution pass
                trace!(key = %key, reference = %name, "direct-link declaration left raw");
                Ok(None)
            } else {
                Err(SchemaError::UnsupportedType {
                    key: key.to_string(),
                    found: name.clone(),
                })
            }
        }

        // Shorthand nested shape: construct a child schema instance
        PropertyDecl::Shape(shape) => {
            let required = !shape.required().is_empty();
            let instance = host.construct(shape.clone()).map_err(|err| {
                debug!(key = %key, %err, "nested schema construction failed");
                SchemaError::SchemaDefinition {
                    key: key.to_string(),
                    reason: "could not parse property as schema".to_string(),
                }
            })?;

            Ok(Some(PropertySpec {
                ty: Some(TypeDecl::Schema(instance)),
                required,
                ..Default::default()
            }))
        }

        PropertyDecl::Spec(spec) => {
            validate_spec(key, spec, host)?;
            Ok(None)
        }
    }
}

/// Shape-check an explicit constraint bag and recurse into nested types
fn validate_spec(key: &str, spec: &mut PropertySpec, host: &dyn Host) -> Result<()> {
    match spec.ty.take() {
        Some(TypeDecl::Marker(marker)) => {
            // Probe the declared type the way invoking a constructor
            // would; regex and enum only apply to string values
            let probe = marker.probe();
            if !probe.is_string() && (spec.enum_values.is_some() || spec.regex.is_some()) {
                return Err(SchemaError::SchemaDefinition {
                    key: key.to_string(),
                    reason: "regex and enum can be set only for strings".to_string(),
                });
            }
            spec.ty = Some(TypeDecl::Marker(marker));
        }

        Some(TypeDecl::Name(name)) => {
            if !is_pseudo_type(&name) && !is_reference(&name) {
                return Err(SchemaError::UnsupportedType {
                    key: key.to_string(),
                    found: name,
                });
            }
            spec.ty = Some(TypeDecl::Name(name));
        }

        Some(TypeDecl::List(mut items)) => {
            if items.len() > 1 {
                return Err(SchemaError::SchemaDefinition {
                    key: key.to_string(),
                    reason:
                        "array items must be declared of any type, or just one type: [string]"
                            .to_string(),
                });
            }

            // Auto-construct a shape element into a child schema
            for item in items.iter_mut() {
                if let TypeDecl::Shape(shape) = item {
                    let instance = host.construct(shape.clone()).map_err(|_| {
                        SchemaError::SchemaDefinition {
                            key: key.to_string(),
                            reason: "could not parse array item as schema".to_string(),
                        }
                    })?;
                    *item = TypeDecl::Schema(instance);
                }
            }

            spec.ty = Some(TypeDecl::List(items));
        }

        Some(TypeDecl::Shape(shape)) => {
            // Child schema declared inline under `type`; keep the entry's
            // own required flag and custom validator
            let instance = host.construct(shape.clone()).map_err(|err| {
                debug!(key = %key, %err, "nested schema construction failed");
                SchemaError::SchemaDefinition {
                    key: key.to_string(),
                    reason: "could not parse property as schema".to_string(),
                }
            })?;
            spec.ty = Some(TypeDecl::Schema(instance));
        }

        other => spec.ty = other,
    }

    if let Some(Pattern::Reference(reference)) = &spec.regex {
        if !is_reference(reference) {
            return Err(SchemaError::SchemaDefinition {
                key: key.to_string(),
                reason: "regex must be an instance of RegExp".to_string(),
            });
        }
    }

    for (slot, bound) in [("min", &spec.min), ("max", &spec.max)] {
        if let Some(Bound::Reference(reference)) = bound {
            if !is_reference(reference) {
                return Err(SchemaError::SchemaDefinition {
                    key: key.to_string(),
                    reason: format!("{slot} property must be a number"),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SchemaInstance;
    use crate::schema::TypeMarker;
    use serde_json::{json, Value};
    use std::sync::Arc;

    /// Minimal engine: constructing a schema normalizes it and wraps it
    #[derive(Debug)]
    struct StubHost;

    #[derive(Debug)]
    struct StubSchema(#[allow(dead_code)] SchemaDef);

    impl SchemaInstance for StubSchema {
        fn validate(&self, _data: &Value) -> Vec<String> {
            Vec::new()
        }
    }

    impl Host for StubHost {
        fn version(&self) -> Option<String> {
            Some("3.2.1".to_string())
        }

        fn construct(&self, mut def: SchemaDef) -> crate::error::Result<Arc<dyn SchemaInstance>> {
            normalize(&mut def, self)?;
            Ok(Arc::new(StubSchema(def)))
        }
    }

    fn normalized(value: Value) -> SchemaDef {
        let mut def = SchemaDef::from_value(&value).unwrap();
        normalize(&mut def, &StubHost).unwrap();
        def
    }

    #[test]
    fn test_marker_shorthand_becomes_required_entry() {
        let def = normalized(json!({"age": "number"}));

        let PropertyDecl::Spec(spec) = def.get("age").unwrap() else {
            panic!("Expected canonical entry");
        };
        assert!(spec.required);
        assert!(matches!(
            spec.ty,
            Some(TypeDecl::Marker(TypeMarker::Number))
        ));
    }

    #[test]
    fn test_pseudo_type_shorthand_becomes_required_entry() {
        let def = normalized(json!({"id": "uuid/v4"}));

        let PropertyDecl::Spec(spec) = def.get("id").unwrap() else {
            panic!("Expected canonical entry");
        };
        assert!(spec.required);
        assert!(matches!(&spec.ty, Some(TypeDecl::Name(n)) if n == "uuid/v4"));
    }

    #[test]
    fn test_direct_link_left_untouched() {
        let def = normalized(json!({"b": "$ref.a"}));
        assert!(matches!(def.get("b"), Some(PropertyDecl::Name(n)) if n == "$ref.a"));
    }

    #[test]
    fn test_unknown_bare_name_rejected() {
        let mut def =
            SchemaDef::new().property("x", PropertyDecl::Name("mystery".to_string()));
        let err = normalize(&mut def, &StubHost).unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedType { key, .. } if key == "x"));
    }

    #[test]
    fn test_nested_shape_constructed() {
        let def = normalized(json!({
            "user": {"name": "string", "required": ["name"]}
        }));

        let PropertyDecl::Spec(spec) = def.get("user").unwrap() else {
            panic!("Expected canonical entry");
        };
        assert!(spec.required, "shape with mandatory fields is required");
        assert!(matches!(spec.ty, Some(TypeDecl::Schema(_))));
    }

    #[test]
    fn test_nested_shape_without_required_fields_is_optional() {
        let def = normalized(json!({"meta": {"note": "string"}}));

        let PropertyDecl::Spec(spec) = def.get("meta").unwrap() else {
            panic!("Expected canonical entry");
        };
        assert!(!spec.required);
    }

    #[test]
    fn test_shape_under_type_key_constructed() {
        let def = normalized(json!({
            "address": {
                "type": {"street": "string"},
                "required": true,
            }
        }));

        let PropertyDecl::Spec(spec) = def.get("address").unwrap() else {
            panic!("Expected canonical entry");
        };
        assert!(spec.required);
        assert!(matches!(spec.ty, Some(TypeDecl::Schema(_))));
    }

    #[test]
    fn test_nested_construction_failure_is_loud() {
        // Inner shape carries an invalid declaration; the parent key is
        // named in the error
        let inner = SchemaDef::new().property("y", PropertyDecl::Name("bogus".to_string()));
        let mut def = SchemaDef::new().property("outer", PropertyDecl::Shape(inner));

        let err = normalize(&mut def, &StubHost).unwrap_err();
        assert!(matches!(err, SchemaError::SchemaDefinition { key, .. } if key == "outer"));
    }

    #[test]
    fn test_list_of_shape_constructed() {
        let def = normalized(json!({
            "contacts": {"type": [{"email": "string"}]}
        }));

        let PropertyDecl::Spec(spec) = def.get("contacts").unwrap() else {
            panic!("Expected canonical entry");
        };
        let Some(TypeDecl::List(items)) = &spec.ty else {
            panic!("Expected list type");
        };
        assert!(matches!(items[0], TypeDecl::Schema(_)));
    }

    #[test]
    fn test_multi_element_list_rejected() {
        let mut def = SchemaDef::from_value(&json!({
            "mixed": {"type": ["string", "number"]}
        }))
        .unwrap();

        let err = normalize(&mut def, &StubHost).unwrap_err();
        assert!(matches!(err, SchemaError::SchemaDefinition { key, .. } if key == "mixed"));
    }

    #[test]
    fn test_regex_on_number_rejected() {
        let mut def = SchemaDef::from_value(&json!({
            "age": {"type": "number", "regex": "^[0-9]+$"}
        }))
        .unwrap();

        let err = normalize(&mut def, &StubHost).unwrap_err();
        assert!(matches!(err, SchemaError::SchemaDefinition { key, .. } if key == "age"));
    }

    #[test]
    fn test_enum_on_number_rejected() {
        let mut def = SchemaDef::from_value(&json!({
            "age": {"type": "number", "enum": [1, 2, 3]}
        }))
        .unwrap();

        assert!(normalize(&mut def, &StubHost).is_err());
    }

    #[test]
    fn test_reference_constraints_survive_normalization() {
        let def = normalized(json!({
            "age": {"type": "number", "min": "$ref.limits.minAge"}
        }));

        let PropertyDecl::Spec(spec) = def.get("age").unwrap() else {
            panic!("Expected canonical entry");
        };
        // Not resolved at parse time; substitution happens per validation
        assert!(
            matches!(&spec.min, Some(Bound::Reference(r)) if r == "$ref.limits.minAge")
        );
    }

    #[test]
    fn test_reference_typed_spec_accepted() {
        let def = normalized(json!({"b": {"type": "$ref.a"}}));

        let PropertyDecl::Spec(spec) = def.get("b").unwrap() else {
            panic!("Expected canonical entry");
        };
        assert_eq!(spec.direct_link(), Some("$ref.a"));
    }

    #[test]
    fn test_malformed_reference_bound_rejected() {
        let mut def = SchemaDef::new().property(
            "age",
            PropertyDecl::Spec(PropertySpec {
                ty: Some(TypeDecl::Marker(TypeMarker::Number)),
                min: Some(Bound::Reference("limits.minAge".to_string())),
                ..Default::default()
            }),
        );

        let err = normalize(&mut def, &StubHost).unwrap_err();
        assert!(matches!(err, SchemaError::SchemaDefinition { key, .. } if key == "age"));
    }

    #[test]
    fn test_normalize_is_idempotent_through_marker() {
        let mut def = SchemaDef::from_value(&json!({"age": "number"})).unwrap();
        normalize(&mut def, &StubHost).unwrap();
        assert!(def.is_parsed());

        // Second run is a no-op, not a re-rewrite
        normalize(&mut def, &StubHost).unwrap();
        assert!(matches!(def.get("age"), Some(PropertyDecl::Spec(_))));
    }
}
