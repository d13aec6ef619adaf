//! Package and destructive-changes manifests
//!
//! A manifest is an API version plus component types with their members.
//! This module parses manifests from XML, renders them back deterministically
//! and merges several manifests into one.

pub mod merge;
pub mod parser;
pub mod serializer;
pub mod version;

use serde::{Deserialize, Serialize};

use crate::types::{MemberSet, TypeMap};

pub use merge::{MergeMode, MergedManifest, merge, merge_with_catalog};
pub use parser::{parse_manifest, parse_manifest_str};
pub use serializer::{PACKAGE_FILE_NAME, serialize};
pub use version::{DEFAULT_API_VERSION, compare_api_versions, is_valid_api_version};

/// A deploy package or a destructive-changes list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub api_version: String,
    #[serde(default)]
    pub types: TypeMap,
}

impl Manifest {
    pub fn new(api_version: impl Into<String>, types: TypeMap) -> Self {
        Self {
            api_version: api_version.into(),
            types,
        }
    }

    /// Manifest with no type blocks.
    pub fn empty(api_version: impl Into<String>) -> Self {
        Self::new(api_version, TypeMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn members(&self, type_name: &str) -> Option<&MemberSet> {
        self.types.get(type_name)
    }

    /// Render as manifest XML.
    pub fn to_xml(&self) -> String {
        serialize(&self.types, &self.api_version)
    }
}
