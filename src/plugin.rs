//! Lifecycle hook glue
//!
//! The core passes have no dependency on how they are registered with a
//! host engine. [`ReferencePlugin`] packages them as the two documented
//! extension points an integration layer must call:
//!
//! - [`ReferencePlugin::before_parse`] — once, after a schema definition
//!   is constructed, with the raw definition.
//! - [`ReferencePlugin::before_validate`] — once per validation attempt,
//!   with the data object.
//!
//! Both hooks run the compatibility gate before doing any work, and the
//! plugin exposes the resolver capability the host injects into its own
//! namespace.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::compat::{check_compatibility, REQUIRED_VERSION};
use crate::error::Result;
use crate::host::Host;
use crate::normalize::normalize;
use crate::reference;
use crate::schema::SchemaDef;
use crate::validate::{before_validate, Substitution};

/// Name the plugin registers under
pub const PLUGIN_NAME: &str = "schema-reference-support";

/// Cross-property reference support, bound to one host engine
pub struct ReferencePlugin {
    host: Arc<dyn Host>,
}

impl std::fmt::Debug for ReferencePlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferencePlugin").finish_non_exhaustive()
    }
}

impl ReferencePlugin {
    /// Bind the hooks to a host engine.
    ///
    /// Runs the compatibility gate once up front, mirroring plugin
    /// initialization; each hook re-checks on entry.
    pub fn new(host: Arc<dyn Host>) -> Result<Self> {
        check_compatibility(host.version().as_deref(), REQUIRED_VERSION)?;
        debug!(plugin = PLUGIN_NAME, "reference plugin initialized");
        Ok(Self { host })
    }

    /// The resolver capability handed to the host: resolve a reference
    /// against a data object, or re-emit the token unchanged when no data
    /// is given
    pub fn resolve(&self, reference: &str, data: Option<&Value>) -> Result<Value> {
        reference::resolve(reference, data)
    }

    /// Schema-construction hook: normalize the raw definition in place
    pub fn before_parse(&self, schema: &mut SchemaDef) -> Result<()> {
        check_compatibility(self.host.version().as_deref(), REQUIRED_VERSION)?;
        normalize(schema, &*self.host)
    }

    /// Validation hook: substitute referenced values and check direct
    /// links, ahead of the host's own field checks.
    ///
    /// Only a failed compatibility gate aborts the hook; everything the
    /// pass itself finds is accumulated in the returned [`Substitution`].
    pub fn before_validate(&self, schema: &SchemaDef, data: &Value) -> Result<Substitution> {
        check_compatibility(self.host.version().as_deref(), REQUIRED_VERSION)?;
        Ok(before_validate(schema, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use crate::host::SchemaInstance;
    use serde_json::json;

    #[derive(Debug)]
    struct VersionedHost(Option<&'static str>);

    #[derive(Debug)]
    struct NoopSchema;

    impl SchemaInstance for NoopSchema {
        fn validate(&self, _data: &Value) -> Vec<String> {
            Vec::new()
        }
    }

    impl Host for VersionedHost {
        fn version(&self) -> Option<String> {
            self.0.map(str::to_string)
        }

        fn construct(&self, _def: SchemaDef) -> Result<Arc<dyn SchemaInstance>> {
            Ok(Arc::new(NoopSchema))
        }
    }

    #[test]
    fn test_plugin_rejects_old_host() {
        let err = ReferencePlugin::new(Arc::new(VersionedHost(Some("3.1.0")))).unwrap_err();
        assert!(matches!(err, SchemaError::IncompatibleHost { .. }));
    }

    #[test]
    fn test_plugin_rejects_unversioned_host() {
        let err = ReferencePlugin::new(Arc::new(VersionedHost(None))).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::IncompatibleHost { found: None, .. }
        ));
    }

    #[test]
    fn test_hooks_gate_on_every_call() {
        // The gate runs per hook, not only at initialization; a host
        // whose reported version drops below the floor is refused
        let plugin = ReferencePlugin {
            host: Arc::new(VersionedHost(Some("2.0.0"))),
        };

        let mut def = SchemaDef::new();
        assert!(plugin.before_parse(&mut def).is_err());
        assert!(plugin.before_validate(&def, &json!({})).is_err());
    }

    #[test]
    fn test_resolver_capability() {
        let plugin = ReferencePlugin::new(Arc::new(VersionedHost(Some("3.2.1")))).unwrap();

        let data = json!({"user": {"age": 30}});
        assert_eq!(
            plugin.resolve("$ref.user.age", Some(&data)).unwrap(),
            json!(30)
        );
        assert_eq!(
            plugin.resolve("$ref.user.age", None).unwrap(),
            json!("$ref.user.age")
        );
    }
}
