//! Validation-time reference substitution
//!
//! Runs once per validated data object, before the host's own field-level
//! checks. Two jobs:
//!
//! 1. **Direct links**: a property whose declared type is a reference
//!    token must exactly equal the referenced property's value.
//! 2. **Constraint substitution**: `min`, `max` and `regex` slots holding
//!    reference tokens are resolved against the data object.
//!
//! The canonical schema is read-only here. Each call produces its own
//! [`Substitution`] with a fresh error list and a per-call view of the
//! resolved constraints, so validating two data objects against the same
//! schema instance can never leak state between the calls.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, trace};

use crate::reference::{parse_reference_name, resolve};
use crate::schema::{Bound, Pattern, PropertyDecl, SchemaDef};

/// Per-call view of one property's constraint slots, with reference
/// tokens replaced by the values looked up from the data object.
/// `Value::Null` marks a slot whose resolution failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConstraints {
    pub min: Option<Value>,
    pub max: Option<Value>,
    pub regex: Option<Value>,
}

impl ResolvedConstraints {
    fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.regex.is_none()
    }
}

/// Outcome of one substitution pass: the resolved constraint view plus
/// the accumulated validation errors, both owned by this call alone
#[derive(Debug, Default)]
pub struct Substitution {
    resolved: BTreeMap<String, ResolvedConstraints>,
    errors: Vec<String>,
}

impl Substitution {
    /// Resolved constraint slots for a property, when it has any
    pub fn constraints(&self, key: &str) -> Option<&ResolvedConstraints> {
        self.resolved.get(key)
    }

    /// Accumulated validation errors, in property order
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }

    /// True when the pass produced no errors
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Substitute referenced values ahead of the host's validation pass.
///
/// Never stops early: every property is visited and every error is
/// recorded, then the whole outcome is handed back to the host, which
/// decides overall pass/fail from the error list.
pub fn before_validate(schema: &SchemaDef, data: &Value) -> Substitution {
    let mut outcome = Substitution::default();

    if !data.is_object() {
        outcome
            .errors
            .push("Data passed to validate is incorrect. It must be an object.".to_string());
        return outcome;
    }

    for (key, decl) in schema.properties() {
        // A property directly linked to another one is checked for a
        // value match and skipped for constraint substitution
        if let Some(reference) = decl.direct_link() {
            check_direct_link(key, reference, data, &mut outcome.errors);
            continue;
        }

        let PropertyDecl::Spec(spec) = decl else {
            continue;
        };

        let resolved = ResolvedConstraints {
            min: spec
                .min
                .as_ref()
                .map(|bound| resolve_bound(bound, data, &mut outcome.errors)),
            max: spec
                .max
                .as_ref()
                .map(|bound| resolve_bound(bound, data, &mut outcome.errors)),
            regex: spec
                .regex
                .as_ref()
                .map(|pattern| resolve_pattern(pattern, data, &mut outcome.errors)),
        };

        if !resolved.is_empty() {
            trace!(key = %key, ?resolved, "substituted constraint slots");
            outcome.resolved.insert(key.clone(), resolved);
        }
    }

    debug!(
        properties = outcome.resolved.len(),
        errors = outcome.errors.len(),
        "reference substitution pass complete"
    );

    outcome
}

fn check_direct_link(key: &str, reference: &str, data: &Value, errors: &mut Vec<String>) {
    let path = parse_reference_name(reference);

    match resolve(reference, Some(data)) {
        Ok(referenced) => {
            let actual = data.get(key).unwrap_or(&Value::Null);
            if *actual != referenced {
                errors.push(format!(
                    "Property {key} does not match referenced value: {path}"
                ));
            }
        }
        // Recorded, not thrown; validation continues with the remaining
        // properties
        Err(err) => errors.push(err.to_string()),
    }
}

fn resolve_bound(bound: &Bound, data: &Value, errors: &mut Vec<String>) -> Value {
    match bound {
        Bound::Literal(n) => Value::from(*n),
        Bound::Reference(reference) => resolve_or_null(reference, data, errors),
    }
}

fn resolve_pattern(pattern: &Pattern, data: &Value, errors: &mut Vec<String>) -> Value {
    match pattern {
        Pattern::Literal(regex) => Value::String(regex.as_str().to_string()),
        Pattern::Reference(reference) => resolve_or_null(reference, data, errors),
    }
}

fn resolve_or_null(reference: &str, data: &Value, errors: &mut Vec<String>) -> Value {
    match resolve(reference, Some(data)) {
        Ok(value) => value,
        Err(err) => {
            errors.push(err.to_string());
            Value::Null
        }
    }
}
