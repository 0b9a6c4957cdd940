//! Host engine capability contract
//!
//! The reference hooks never talk to a concrete validation engine. They
//! only need two capabilities from whatever engine registers them: a
//! reported version for the compatibility gate, and the ability to
//! construct a nested schema instance so normalization can recurse into
//! shape declarations. The integration layer wires these traits to the
//! real engine.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::schema::SchemaDef;

/// A schema instance constructed by the host engine.
///
/// Nested shapes are normalized into these during schema construction,
/// and the host drives their validation when it validates the parent.
pub trait SchemaInstance: fmt::Debug + Send + Sync {
    /// Validate a data object, returning the accumulated error messages.
    /// An empty list means the data passed.
    fn validate(&self, data: &Value) -> Vec<String>;
}

/// The host validation engine, as seen by the reference hooks
pub trait Host: Send + Sync {
    /// The engine's reported version string; `None` models an engine that
    /// predates version reporting
    fn version(&self) -> Option<String>;

    /// Construct (and normalize) a schema instance from a definition.
    /// Used to recursively instantiate nested schemas.
    fn construct(&self, def: SchemaDef) -> Result<Arc<dyn SchemaInstance>>;
}
