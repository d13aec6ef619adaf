use serde::Serialize;

use crate::manifest::{Manifest, PACKAGE_FILE_NAME};
use crate::types::DestructiveOrder;

/// Final output of a derivation run.
///
/// At most one destructive manifest exists, and its placement decides which
/// slot it occupies. Fields are private so that invariant cannot be broken
/// after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivationResult {
    deploy_manifest: Option<Manifest>,
    destructive_before: Option<Manifest>,
    destructive_after: Option<Manifest>,
    warnings: Vec<String>,
}

impl DerivationResult {
    pub(crate) fn new(
        deploy: Option<Manifest>,
        destructive: Option<(DestructiveOrder, Manifest)>,
        warnings: Vec<String>,
    ) -> Self {
        let (destructive_before, destructive_after) = match destructive {
            Some((DestructiveOrder::Before, manifest)) => (Some(manifest), None),
            Some((DestructiveOrder::After, manifest)) => (None, Some(manifest)),
            None => (None, None),
        };
        Self {
            deploy_manifest: deploy,
            destructive_before,
            destructive_after,
            warnings,
        }
    }

    pub fn deploy_manifest(&self) -> Option<&Manifest> {
        self.deploy_manifest.as_ref()
    }

    pub fn destructive_before(&self) -> Option<&Manifest> {
        self.destructive_before.as_ref()
    }

    pub fn destructive_after(&self) -> Option<&Manifest> {
        self.destructive_after.as_ref()
    }

    /// The destructive manifest and its placement, if any.
    pub fn destructive(&self) -> Option<(DestructiveOrder, &Manifest)> {
        match (&self.destructive_before, &self.destructive_after) {
            (Some(manifest), _) => Some((DestructiveOrder::Before, manifest)),
            (_, Some(manifest)) => Some((DestructiveOrder::After, manifest)),
            _ => None,
        }
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Manifests paired with their conventional file names.
    pub fn outputs(&self) -> Vec<(&'static str, &Manifest)> {
        let mut outputs = Vec::new();
        if let Some(manifest) = &self.deploy_manifest {
            outputs.push((PACKAGE_FILE_NAME, manifest));
        }
        if let Some((order, manifest)) = self.destructive() {
            outputs.push((order.file_name(), manifest));
        }
        outputs
    }

    pub fn is_empty(&self) -> bool {
        self.deploy_manifest.is_none() && self.destructive().is_none()
    }
}
