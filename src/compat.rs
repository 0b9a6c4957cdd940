//! Host engine compatibility gate
//!
//! Every lifecycle hook starts by checking the host's reported version
//! against [`REQUIRED_VERSION`]. Only major and minor components take part
//! in the comparison; patch releases never gate a hook.

use semver::Version;

use crate::error::{Result, SchemaError};

/// Minimum host engine version the reference hooks are known to work with
pub const REQUIRED_VERSION: &str = "3.2.1";

/// Parse a dot-delimited version string leniently.
///
/// Hosts occasionally report two-component versions ("3.2"); missing
/// components are padded with zeros before handing off to semver.
fn parse_version(raw: &str) -> Result<Version> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);

    let padded = match trimmed.split('.').count() {
        1 => format!("{trimmed}.0.0"),
        2 => format!("{trimmed}.0"),
        _ => trimmed.to_string(),
    };

    Ok(Version::parse(&padded)?)
}

/// Check that the host's reported version satisfies the required version.
///
/// Fails with [`SchemaError::IncompatibleHost`] when the host reports no
/// version at all, when its major version is below the required major, or
/// when majors match and its minor version is below the required minor.
pub fn check_compatibility(host_version: Option<&str>, required: &str) -> Result<()> {
    let reported = host_version.ok_or_else(|| SchemaError::IncompatibleHost {
        required: required.to_string(),
        found: None,
    })?;

    let host = parse_version(reported)?;
    let needed = parse_version(required)?;

    if host.major < needed.major || (host.major == needed.major && host.minor < needed.minor) {
        return Err(SchemaError::IncompatibleHost {
            required: required.to_string(),
            found: Some(reported.to_string()),
        });
    }

    Ok(())
}
