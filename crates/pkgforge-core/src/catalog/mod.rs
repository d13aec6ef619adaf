//! Component type catalog
//!
//! The catalog knows which component types exist, how repository paths map
//! to `(type, member)` pairs, which types accept the wildcard, and which
//! members are currently known for a type. Everything path- or type-specific
//! lives in catalog data, so new types need no pipeline changes.

pub mod parser;
pub mod schema;
pub mod static_catalog;

use std::collections::BTreeSet;
use std::path::Path;

pub use parser::{parse_catalog, parse_catalog_str};
pub use schema::{CatalogFile, TypeDefinition};
pub use static_catalog::StaticCatalog;

/// A single component addressed by type and member name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentRef {
    pub type_name: String,
    pub member: String,
}

impl ComponentRef {
    pub fn new(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            member: member.into(),
        }
    }
}

/// Type metadata consumed by the derivation pipeline.
pub trait TypeCatalog {
    /// Map a repository path to the component it belongs to.
    ///
    /// Paths that are not component files resolve to `None`.
    fn resolve(&self, path: &Path) -> Option<ComponentRef>;

    /// Whether the type exists in the catalog.
    fn contains(&self, type_name: &str) -> bool;

    /// Whether a manifest may list the type with the wildcard member.
    fn supports_wildcard(&self, type_name: &str) -> bool;

    /// Every member currently known for the type, if enumeration is available.
    fn all_known_members(&self, type_name: &str) -> Option<BTreeSet<String>>;

    /// Whether components of the type are directories of files.
    fn is_bundle(&self, _type_name: &str) -> bool {
        false
    }

    /// Whether a path belongs to a bundle component and is not its descriptor.
    ///
    /// Deleting such a file changes the bundle instead of removing it.
    fn is_bundle_part(&self, _path: &Path) -> bool {
        false
    }
}
