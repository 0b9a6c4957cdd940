//! Schema definition data model
//!
//! A [`SchemaDef`] is the author-supplied definition of one schema: a map
//! from property name to declaration, plus the reserved `required` list of
//! mandatory property names. Declarations come in shorthand and canonical
//! forms:
//!
//! - **Shorthand**: a bare type marker (`age: number`), a pseudo-type or
//!   reference string (`id: "uuid/v4"`, `b: "$ref.a"`), or a raw nested
//!   shape.
//! - **Canonical**: a full [`PropertySpec`] constraint bag
//!   `{ type, required, min?, max?, regex?, enum?, custom? }`.
//!
//! Normalization (see [`crate::normalize`]) rewrites every shorthand into
//! canonical form, except direct-link references which stay untouched
//! until validation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SchemaError};
use crate::host::SchemaInstance;
use crate::reference::is_reference;

/// Recognized pseudo-type literals
pub const PSEUDO_TYPES: [&str; 2] = ["uuid/v1", "uuid/v4"];

/// True iff the string names a supported pseudo-type
pub fn is_pseudo_type(name: &str) -> bool {
    PSEUDO_TYPES.contains(&name)
}

/// Primitive type marker, the declared base type of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeMarker {
    String,
    Number,
    Boolean,
    Object,
}

impl TypeMarker {
    /// Look up a marker by its textual name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(TypeMarker::String),
            "number" => Some(TypeMarker::Number),
            "boolean" => Some(TypeMarker::Boolean),
            "object" => Some(TypeMarker::Object),
            _ => None,
        }
    }

    /// Probe value of this type, used to sanity-check a declaration the
    /// same way invoking a type constructor with no arguments would
    pub fn probe(&self) -> Value {
        match self {
            TypeMarker::String => Value::String(String::new()),
            TypeMarker::Number => Value::from(0),
            TypeMarker::Boolean => Value::Bool(false),
            TypeMarker::Object => Value::Object(Default::default()),
        }
    }

    /// Whether values of this type are strings; `regex` and `enum`
    /// constraints are only meaningful for string types
    pub fn is_string(&self) -> bool {
        matches!(self, TypeMarker::String)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TypeMarker::String => "string",
            TypeMarker::Number => "number",
            TypeMarker::Boolean => "boolean",
            TypeMarker::Object => "object",
        }
    }
}

impl fmt::Display for TypeMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Custom validator attached to a property declaration
#[derive(Clone)]
pub struct CustomValidator(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl CustomValidator {
    pub fn new(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Run the validator against a candidate value
    pub fn check(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for CustomValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomValidator")
    }
}

/// A numeric constraint slot: a literal bound or a reference token
#[derive(Debug, Clone)]
pub enum Bound {
    Literal(f64),
    Reference(String),
}

/// A regex constraint slot: a compiled pattern or a reference token
#[derive(Debug, Clone)]
pub enum Pattern {
    Literal(Regex),
    Reference(String),
}

/// The declared type of a canonical property entry
#[derive(Debug, Clone)]
pub enum TypeDecl {
    /// Primitive type marker
    Marker(TypeMarker),
    /// Pseudo-type literal or reference token
    Name(String),
    /// Homogeneous list; must hold at most one element type
    List(Vec<TypeDecl>),
    /// Raw nested shape, only present before normalization
    Shape(SchemaDef),
    /// Constructed nested schema instance
    Schema(Arc<dyn SchemaInstance>),
}

/// Canonical property entry: the constraint bag every declaration is
/// rewritten into during normalization
#[derive(Debug, Clone, Default)]
pub struct PropertySpec {
    pub ty: Option<TypeDecl>,
    pub required: bool,
    pub min: Option<Bound>,
    pub max: Option<Bound>,
    pub regex: Option<Pattern>,
    pub enum_values: Option<Vec<Value>>,
    pub custom: Option<CustomValidator>,
}

impl PropertySpec {
    /// Canonical entry for a plain typed property
    pub fn of(ty: TypeDecl) -> Self {
        Self {
            ty: Some(ty),
            required: true,
            ..Default::default()
        }
    }

    /// The reference token when this entry's type is a direct link
    pub fn direct_link(&self) -> Option<&str> {
        match &self.ty {
            Some(TypeDecl::Name(name)) if is_reference(name) => Some(name),
            _ => None,
        }
    }
}

/// Raw author-supplied declaration for one schema key
#[derive(Debug, Clone)]
pub enum PropertyDecl {
    /// Shorthand: bare type marker (`age: number`)
    Marker(TypeMarker),
    /// Shorthand: pseudo-type literal or direct-link reference token
    Name(String),
    /// Shorthand: raw nested schema shape
    Shape(SchemaDef),
    /// Full constraint bag; also the canonical form
    Spec(PropertySpec),
}

impl PropertyDecl {
    /// The reference token when this declaration is a direct link to
    /// another property, in either raw or canonical form
    pub fn direct_link(&self) -> Option<&str> {
        match self {
            PropertyDecl::Name(name) if is_reference(name) => Some(name),
            PropertyDecl::Spec(spec) => spec.direct_link(),
            _ => None,
        }
    }
}

/// One schema definition: named property declarations plus the reserved
/// `required` list
#[derive(Debug, Clone, Default)]
pub struct SchemaDef {
    properties: BTreeMap<String, PropertyDecl>,
    required: Vec<String>,
    parsed: bool,
}

impl SchemaDef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style property declaration
    pub fn property(mut self, name: impl Into<String>, decl: PropertyDecl) -> Self {
        self.properties.insert(name.into(), decl);
        self
    }

    /// Builder-style mandatory property list
    pub fn require(mut self, names: &[&str]) -> Self {
        self.required = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, decl: PropertyDecl) {
        self.properties.insert(name.into(), decl);
    }

    pub fn get(&self, name: &str) -> Option<&PropertyDecl> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&String, &PropertyDecl)> {
        self.properties.iter()
    }

    pub(crate) fn properties_mut(
        &mut self,
    ) -> impl Iterator<Item = (&String, &mut PropertyDecl)> {
        self.properties.iter_mut()
    }

    /// Names of mandatory properties (the reserved `required` key)
    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether normalization has already run on this definition
    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    pub(crate) fn mark_parsed(&mut self) {
        self.parsed = true;
    }

    /// Build a definition from a JSON value.
    ///
    /// This is the ingestion path for schemas authored as plain JSON. All
    /// declaration forms except custom validators are expressible; a
    /// `custom` key in JSON is rejected since a validator can only be
    /// attached programmatically.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(SchemaError::SchemaDefinition {
                key: "<root>".to_string(),
                reason: "schema definition must be an object".to_string(),
            });
        };

        let mut def = SchemaDef::new();

        for (key, raw) in map {
            if key == "required" {
                def.required = parse_required_list(raw)?;
                continue;
            }

            def.insert(key.clone(), PropertyDecl::from_value(key, raw)?);
        }

        Ok(def)
    }
}

fn parse_required_list(value: &Value) -> Result<Vec<String>> {
    let Value::Array(items) = value else {
        return Err(SchemaError::SchemaDefinition {
            key: "required".to_string(),
            reason: "required must be a list of property names".to_string(),
        });
    };

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| SchemaError::SchemaDefinition {
                    key: "required".to_string(),
                    reason: "required must be a list of property names".to_string(),
                })
        })
        .collect()
}

impl PropertyDecl {
    /// Parse one JSON declaration, surfacing the same shape errors the
    /// normalizer would raise for hand-built definitions
    pub fn from_value(key: &str, raw: &Value) -> Result<Self> {
        match raw {
            Value::String(name) => {
                if let Some(marker) = TypeMarker::from_name(name) {
                    Ok(PropertyDecl::Marker(marker))
                } else if is_pseudo_type(name) || is_reference(name) {
                    Ok(PropertyDecl::Name(name.clone()))
                } else {
                    Err(SchemaError::UnsupportedType {
                        key: key.to_string(),
                        found: name.clone(),
                    })
                }
            }

            Value::Object(map) => {
                if map.contains_key("type") {
                    Ok(PropertyDecl::Spec(spec_from_value(key, map)?))
                } else {
                    // No type key: a raw nested shape
                    SchemaDef::from_value(raw).map(PropertyDecl::Shape).map_err(
                        |_| SchemaError::SchemaDefinition {
                            key: key.to_string(),
                            reason: "could not parse property as schema".to_string(),
                        },
                    )
                }
            }

            other => Err(SchemaError::SchemaDefinition {
                key: key.to_string(),
                reason: format!("unsupported declaration: {other}"),
            }),
        }
    }
}

fn spec_from_value(key: &str, map: &serde_json::Map<String, Value>) -> Result<PropertySpec> {
    let ty_raw = map.get("type").ok_or_else(|| SchemaError::SchemaDefinition {
        key: key.to_string(),
        reason: "constraint bag is missing its type".to_string(),
    })?;

    let mut spec = PropertySpec {
        ty: Some(type_decl_from_value(key, ty_raw)?),
        required: map
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        ..Default::default()
    };

    if let Some(raw) = map.get("min") {
        spec.min = Some(bound_from_value(key, "min", raw)?);
    }

    if let Some(raw) = map.get("max") {
        spec.max = Some(bound_from_value(key, "max", raw)?);
    }

    if let Some(raw) = map.get("regex") {
        spec.regex = Some(pattern_from_value(key, raw)?);
    }

    if let Some(raw) = map.get("enum") {
        let Value::Array(values) = raw else {
            return Err(SchemaError::SchemaDefinition {
                key: key.to_string(),
                reason: "enum must be a list of values".to_string(),
            });
        };
        spec.enum_values = Some(values.clone());
    }

    if map.contains_key("custom") {
        return Err(SchemaError::SchemaDefinition {
            key: key.to_string(),
            reason: "custom validator must be a function, attach it programmatically"
                .to_string(),
        });
    }

    Ok(spec)
}

fn type_decl_from_value(key: &str, raw: &Value) -> Result<TypeDecl> {
    match raw {
        Value::String(name) => {
            if let Some(marker) = TypeMarker::from_name(name) {
                Ok(TypeDecl::Marker(marker))
            } else if is_pseudo_type(name) || is_reference(name) {
                Ok(TypeDecl::Name(name.clone()))
            } else {
                Err(SchemaError::UnsupportedType {
                    key: key.to_string(),
                    found: name.clone(),
                })
            }
        }

        Value::Array(items) => items
            .iter()
            .map(|item| type_decl_from_value(key, item))
            .collect::<Result<Vec<_>>>()
            .map(TypeDecl::List),

        Value::Object(_) => SchemaDef::from_value(raw).map(TypeDecl::Shape),

        other => Err(SchemaError::SchemaDefinition {
            key: key.to_string(),
            reason: format!("unsupported type declaration: {other}"),
        }),
    }
}

fn bound_from_value(key: &str, slot: &str, raw: &Value) -> Result<Bound> {
    match raw {
        Value::Number(n) => Ok(Bound::Literal(n.as_f64().unwrap_or_default())),
        Value::String(s) if is_reference(s) => Ok(Bound::Reference(s.clone())),
        _ => Err(SchemaError::SchemaDefinition {
            key: key.to_string(),
            reason: format!("{slot} property must be a number"),
        }),
    }
}

fn pattern_from_value(key: &str, raw: &Value) -> Result<Pattern> {
    match raw {
        Value::String(s) if is_reference(s) => Ok(Pattern::Reference(s.clone())),
        Value::String(s) => Regex::new(s).map(Pattern::Literal).map_err(|_| {
            SchemaError::SchemaDefinition {
                key: key.to_string(),
                reason: "regex must be an instance of RegExp".to_string(),
            }
        }),
        _ => Err(SchemaError::SchemaDefinition {
            key: key.to_string(),
            reason: "regex must be an instance of RegExp".to_string(),
        }),
    }
}
