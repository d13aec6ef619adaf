//! Configuration layer merging logic
//!
//! Implements the 3-layer merge strategy:
//! Global -> Project -> Project-Local

use super::schema::{PkgforgeConfig, Settings};
use std::path::Path;

/// Merge multiple configuration layers
///
/// # Arguments
/// * `global` - Global configuration from ~/.config/pkgforge/pkgforge.toml
/// * `project` - Project configuration from ./pkgforge.toml
/// * `project_path` - Absolute path to the project root
///
/// # Returns
/// Effective settings with project-local overrides applied last
pub fn merge_configs(
    global: Option<PkgforgeConfig>,
    project: Option<PkgforgeConfig>,
    project_path: &Path,
) -> Settings {
    let global = global.unwrap_or_default();
    let mut merged = global.settings.clone();

    if let Some(project) = project {
        if !project.projects.is_empty() {
            tracing::warn!("[projects] tables are only read from the global config");
        }
        overlay(&mut merged, project.settings);
    }

    if let Some(local) = global.get_project_override(project_path) {
        overlay(&mut merged, local.clone());
    }

    merged
}

/// Overlay `layer` on `base`; set fields in `layer` win.
pub fn overlay(base: &mut Settings, layer: Settings) {
    base.api_version = layer.api_version.or(base.api_version.take());
    base.catalog = layer.catalog.or(base.catalog.take());
    base.ignore_file = layer.ignore_file.or(base.ignore_file.take());
    base.output_dir = layer.output_dir.or(base.output_dir.take());
    base.explicit = layer.explicit.or(base.explicit);
    base.destructive_order = layer.destructive_order.or(base.destructive_order);
    base.merge_packages = layer.merge_packages.or(base.merge_packages);
    base.merge_destructives = layer.merge_destructives.or(base.merge_destructives);
}
