//! Existing-manifest adapter
//!
//! Loads manifest files for merging and classifies each one as a deploy
//! package or a destructive-changes list from its file name.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::manifest::{Manifest, parse_manifest, parse_manifest_str};

const DESTRUCTIVE_PREFIX: &str = "destructiveChanges";

/// Whether a manifest lists components to deploy or to delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestRole {
    Package,
    Destructive,
}

impl ManifestRole {
    /// `destructiveChanges*.xml` files are destructive, anything else is a package.
    pub fn from_path(path: &Path) -> Self {
        let is_destructive = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(DESTRUCTIVE_PREFIX));
        if is_destructive {
            Self::Destructive
        } else {
            Self::Package
        }
    }
}

/// A parsed manifest and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSource {
    pub origin: String,
    pub role: ManifestRole,
    pub manifest: Manifest,
}

impl ManifestSource {
    pub fn new(origin: impl Into<String>, role: ManifestRole, manifest: Manifest) -> Self {
        Self {
            origin: origin.into(),
            role,
            manifest,
        }
    }

    /// Parse manifest text held in memory.
    pub fn parse(origin: &str, role: ManifestRole, content: &str) -> Result<Self> {
        Ok(Self::new(origin, role, parse_manifest_str(content, origin)?))
    }

    /// Load a manifest file, taking its role from the file name.
    pub fn load(path: &Path) -> Result<Self> {
        let manifest = parse_manifest(path)?;
        Ok(Self::new(
            path.display().to_string(),
            ManifestRole::from_path(path),
            manifest,
        ))
    }
}

/// Load every manifest, failing on the first one that cannot be read.
pub fn load_manifest_sources(paths: &[PathBuf]) -> Result<Vec<ManifestSource>> {
    paths.iter().map(|path| ManifestSource::load(path)).collect()
}
