//! Project descriptor lookups.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::manifest::{DEFAULT_API_VERSION, is_valid_api_version};

/// Project descriptor file in the project root.
pub const PROJECT_FILE_NAME: &str = "sfdx-project.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectDescriptor {
    #[serde(default)]
    source_api_version: Option<String>,
}

/// Read `sourceApiVersion` from the project descriptor, if the file exists.
pub fn source_api_version(project_root: &Path) -> anyhow::Result<Option<String>> {
    let path = project_root.join(PROJECT_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read project file: {}", path.display()))?;
    let descriptor: ProjectDescriptor = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse project file: {}", path.display()))?;

    match descriptor.source_api_version {
        Some(version) if is_valid_api_version(&version) => Ok(Some(version)),
        Some(version) => {
            tracing::warn!(
                path = %path.display(),
                version = %version,
                "ignoring invalid sourceApiVersion"
            );
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Pick the API version: explicit value, then configured, then project file, then default.
pub fn resolve_api_version(
    requested: Option<&str>,
    configured: Option<&str>,
    project_root: &Path,
) -> anyhow::Result<String> {
    if let Some(version) = requested.or(configured) {
        if !is_valid_api_version(version) {
            anyhow::bail!("API version '{}' is not a dotted numeric version", version);
        }
        return Ok(version.to_string());
    }
    Ok(source_api_version(project_root)?.unwrap_or_else(|| DEFAULT_API_VERSION.to_string()))
}
