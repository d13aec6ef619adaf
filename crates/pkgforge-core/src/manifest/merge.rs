//! Merging existing manifests
//!
//! Existing manifests are assumed to be intentional, so a wildcard for a type
//! in any input wins over explicit member lists for the same type. The merged
//! manifest carries the highest API version among the inputs.

use super::Manifest;
use super::version::max_api_version;
use crate::catalog::TypeCatalog;
use crate::error::{DeriveError, Result};
use crate::types::{DestructiveOrder, TypeMap, merge_type};

/// What kind of manifests are being merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Deploy packages
    Package,
    /// Destructive-changes lists
    Destructive,
}

/// Result of a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedManifest {
    pub manifest: Manifest,
    /// Placement of a destructive merge; always `None` for packages
    pub order: Option<DestructiveOrder>,
}

/// Merge two or more manifests into a new one.
///
/// # Arguments
/// * `manifests` - Inputs, left untouched
/// * `mode` - Package or destructive merge
/// * `order_hint` - Placement tag for destructive merges (defaults to after)
///
/// # Errors
/// `InsufficientSources` when fewer than two manifests are given.
pub fn merge(
    manifests: &[Manifest],
    mode: MergeMode,
    order_hint: Option<DestructiveOrder>,
) -> Result<MergedManifest> {
    if manifests.len() < 2 {
        return Err(DeriveError::InsufficientSources {
            found: manifests.len(),
        });
    }

    let api_version = max_api_version(manifests.iter().map(|m| m.api_version.as_str()))
        .unwrap_or_default()
        .to_string();

    let mut types = TypeMap::new();
    for manifest in manifests {
        for (type_name, members) in &manifest.types {
            merge_type(&mut types, type_name, members.clone());
        }
    }

    let order = match mode {
        MergeMode::Package => None,
        MergeMode::Destructive => Some(order_hint.unwrap_or_default()),
    };

    tracing::debug!(
        inputs = manifests.len(),
        types = types.len(),
        api_version = %api_version,
        ?mode,
        "merged manifests"
    );

    Ok(MergedManifest {
        manifest: Manifest::new(api_version, types),
        order,
    })
}

/// [`merge`], rejecting types the catalog does not know.
///
/// The error names the index of the first offending input.
pub fn merge_with_catalog(
    manifests: &[Manifest],
    mode: MergeMode,
    order_hint: Option<DestructiveOrder>,
    catalog: &dyn TypeCatalog,
) -> Result<MergedManifest> {
    for (index, manifest) in manifests.iter().enumerate() {
        if let Some(type_name) = manifest.types.keys().find(|name| !catalog.contains(name)) {
            return Err(DeriveError::UnknownType {
                type_name: type_name.clone(),
                source_label: format!("manifest #{index}"),
            });
        }
    }
    merge(manifests, mode, order_hint)
}
