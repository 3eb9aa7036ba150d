//! package.json version lookup.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{BuildNumberError, Result};

/// The one manifest field the build number cares about.
#[derive(Debug, Deserialize)]
struct PackageManifest {
    version: Option<String>,
}

/// Resolve the package.json path from the working directory and an optional
/// relative path to the directory that holds it.
pub fn package_json_path(cwd: &Path, relative: Option<&str>) -> PathBuf {
    match relative {
        Some(relative) => cwd.join(relative).join("package.json"),
        None => cwd.join("package.json"),
    }
}

/// Read the `version` field from a package.json file.
///
/// A manifest without a version field is a configuration error: version-based
/// numbering was requested and cannot proceed without one.
pub fn read_version(path: &Path) -> Result<String> {
    debug!("Reading package version from {}", path.display());
    let text = std::fs::read_to_string(path)?;
    let manifest: PackageManifest = serde_json::from_str(&text).map_err(|e| {
        BuildNumberError::Configuration(format!(
            "Could not parse package.json at '{}': {e}",
            path.display()
        ))
    })?;
    manifest.version.ok_or_else(|| {
        BuildNumberError::Configuration(format!(
            "package.json at '{}' has no version field",
            path.display()
        ))
    })
}
