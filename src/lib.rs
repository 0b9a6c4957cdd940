//! Cross-Property Reference Resolution
//!
//! Lets a schema author declare that one field's constraint (`min`, `max`,
//! `regex`) or its entire value is derived from another field's runtime
//! value instead of a fixed literal:
//!
//! ```text
//! {
//!     "a": "number",
//!     "b": "$ref.a",                                   // must equal a
//!     "age": { "type": "number", "min": "$ref.limits.minAge" }
//! }
//! ```
//!
//! ## Features
//!
//! - **Reference tokens**: `$ref.<dotted.path>` strings resolved by safe
//!   structural traversal of the data object, never by code evaluation
//! - **Schema normalization**: shorthand declarations rewritten once, at
//!   schema construction, into canonical constraint entries; nested
//!   shapes recursively constructed through the host engine
//! - **Per-call substitution**: each validation attempt gets its own view
//!   of the resolved constraints and its own error list, so one schema
//!   instance can validate many data objects safely
//! - **Compatibility gate**: every lifecycle hook checks the host
//!   engine's reported version first
//!
//! ## Lifecycle
//!
//! ```text
//! schema definition ──▶ before_parse (normalize, once per schema)
//!                                │
//! data object ──▶ before_validate (substitute + direct-link checks,
//!                                  once per validation attempt)
//!                                │
//!                 host's own field-level validation
//! ```

pub mod compat;
pub mod error;
pub mod host;
pub mod normalize;
pub mod plugin;
pub mod reference;
pub mod schema;
pub mod validate;

pub use compat::{check_compatibility, REQUIRED_VERSION};
pub use error::{Result, SchemaError};
pub use host::{Host, SchemaInstance};
pub use normalize::normalize;
pub use plugin::{ReferencePlugin, PLUGIN_NAME};
pub use reference::{is_reference, parse_reference_name, resolve, REF_PREFIX};
pub use schema::{
    Bound, CustomValidator, Pattern, PropertyDecl, PropertySpec, SchemaDef, TypeDecl, TypeMarker,
};
pub use validate::{before_validate, ResolvedConstraints, Substitution};
