//! Configuration schema for pkgforge.toml
//!
//! The same settings table is used by every layer:
//! - Global: ~/.config/pkgforge/pkgforge.toml
//! - Project: ./pkgforge.toml
//! - Project-Local: [projects."/path"] in global config

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::derive::DeriveOptions;
use crate::manifest::is_valid_api_version;
use crate::types::DestructiveOrder;

/// Root configuration structure for pkgforge.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkgforgeConfig {
    #[serde(flatten)]
    pub settings: Settings,

    /// Project-local overrides (ONLY valid in global config)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub projects: HashMap<String, Settings>,
}

/// Derivation settings. Unset fields fall through to the next layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// API version written into generated manifests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Extra catalog TOML layered over the built-in catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,

    /// JSON ignore file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_file: Option<PathBuf>,

    /// Directory manifests are written to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destructive_order: Option<DestructiveOrder>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_packages: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_destructives: Option<bool>,
}

impl PkgforgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.settings.validate()?;
        for (path, settings) in &self.projects {
            settings
                .validate()
                .with_context(|| format!("Invalid project override: '{}'", path))?;
        }
        Ok(())
    }

    /// Find the override for a project, by exact path or by an enclosing project path.
    pub fn get_project_override(&self, path: &Path) -> Option<&Settings> {
        if let Some(settings) = self.projects.get(&path.to_string_lossy().to_string()) {
            return Some(settings);
        }

        self.projects
            .iter()
            .filter(|(project_path, _)| path.starts_with(project_path.as_str()))
            .max_by_key(|(project_path, _)| project_path.len())
            .map(|(_, settings)| settings)
    }
}

impl Settings {
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(version) = &self.api_version {
            if !is_valid_api_version(version) {
                anyhow::bail!("api_version '{}' is not a dotted numeric version", version);
            }
        }
        for (key, path) in [
            ("catalog", &self.catalog),
            ("ignore_file", &self.ignore_file),
            ("output_dir", &self.output_dir),
        ] {
            if path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
                anyhow::bail!("{} must not be empty", key);
            }
        }
        Ok(())
    }

    /// Apply the derivation switches to `options`. Unset fields leave it unchanged.
    pub fn apply_to(&self, mut options: DeriveOptions) -> DeriveOptions {
        if let Some(explicit) = self.explicit {
            options = options.with_explicit(explicit);
        }
        if let Some(order) = self.destructive_order {
            options = options.with_destructive_order(order);
        }
        if let Some(merge) = self.merge_packages {
            options = options.with_merge_packages(merge);
        }
        if let Some(merge) = self.merge_destructives {
            options = options.with_merge_destructives(merge);
        }
        if let Some(version) = &self.api_version {
            options = options.with_api_version(version.clone());
        }
        options
    }
}
