//! Catalog file schema
//!
//! A catalog is a TOML document with one `[[type]]` table per component type:
//!
//! ```toml
//! [[type]]
//! name = "CustomField"
//! directory = "fields"
//! suffix = "field"
//! parent = "objects"
//! ```

use serde::{Deserialize, Serialize};

/// Root of a catalog TOML document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default, rename = "type")]
    pub types: Vec<TypeDefinition>,
}

/// How one component type is laid out on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// Type name as written in manifests (e.g. `ApexClass`)
    pub name: String,

    /// Directory holding components of this type (e.g. `classes`)
    pub directory: String,

    /// File suffix without the dot (e.g. `cls`). Files without it do not match.
    #[serde(default)]
    pub suffix: Option<String>,

    /// Components live in named folders; members resolve to `folder/stem`
    #[serde(default)]
    pub in_folder: bool,

    /// Each component is a directory of files; members resolve to the directory name
    #[serde(default)]
    pub bundle: bool,

    /// Directory of the parent type for child types; members resolve to `Parent.stem`
    #[serde(default)]
    pub parent: Option<String>,

    /// Whether manifests may use the wildcard member for this type
    #[serde(default = "default_supports_wildcard")]
    pub supports_wildcard: bool,

    /// Known members, when an enumeration is available
    #[serde(default)]
    pub members: Option<Vec<String>>,
}

fn default_supports_wildcard() -> bool {
    true
}

impl TypeDefinition {
    /// Flat type stored as `directory/<member>.<suffix>`.
    pub fn flat(name: &str, directory: &str, suffix: &str) -> Self {
        Self {
            name: name.to_string(),
            directory: directory.to_string(),
            suffix: Some(suffix.to_string()),
            in_folder: false,
            bundle: false,
            parent: None,
            supports_wildcard: true,
            members: None,
        }
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn in_folder(mut self) -> Self {
        self.in_folder = true;
        self
    }

    pub fn without_wildcard(mut self) -> Self {
        self.supports_wildcard = false;
        self
    }

    pub fn with_members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members = Some(members.into_iter().map(Into::into).collect());
        self
    }

    /// Check the definition is usable for path resolution.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("type name must not be empty".to_string());
        }
        if self.directory.trim().is_empty() || self.directory.contains('/') {
            return Err(format!(
                "type '{}' needs a single directory segment, got '{}'",
                self.name, self.directory
            ));
        }
        if self.bundle && self.in_folder {
            return Err(format!(
                "type '{}' cannot be both a bundle and folder-based",
                self.name
            ));
        }
        if self.parent.is_some() && (self.bundle || self.in_folder) {
            return Err(format!(
                "child type '{}' cannot be a bundle or folder-based",
                self.name
            ));
        }
        Ok(())
    }
}
