//! Config store for loading and saving pkgforge.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::schema::{PkgforgeConfig, Settings};
use super::{CONFIG_FILE_NAME, merge_configs, parser};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    global_path: PathBuf,
    project_root: PathBuf,
}

impl ConfigStore {
    /// Store for `project_root` with the global config in the user config directory.
    pub fn from_project(project_root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let global_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("pkgforge");
        Ok(Self::from_paths(global_dir, project_root.into()))
    }

    pub fn from_paths(global_dir: PathBuf, project_root: PathBuf) -> Self {
        Self {
            global_path: global_dir.join(CONFIG_FILE_NAME),
            project_root,
        }
    }

    pub fn global_path(&self) -> &Path {
        &self.global_path
    }

    pub fn project_path(&self) -> PathBuf {
        self.project_root.join(CONFIG_FILE_NAME)
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Effective settings from every layer. Missing files are empty layers.
    pub fn load(&self) -> anyhow::Result<Settings> {
        let global = load_optional(&self.global_path)?;
        let project = load_optional(&self.project_path())?;
        Ok(merge_configs(global, project, &self.project_root))
    }

    /// Write the project layer.
    pub fn save_project(&self, config: &PkgforgeConfig) -> anyhow::Result<()> {
        let path = self.project_path();
        let content = parser::to_toml(config).context("Failed to serialize config to TOML")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

fn load_optional(path: &Path) -> anyhow::Result<Option<PkgforgeConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    tracing::debug!(path = %path.display(), "loading config");
    parser::parse_config(path).map(Some)
}
