//! Destructive manifest placement

use super::result::DerivationResult;
use crate::manifest::Manifest;
use crate::types::DestructiveOrder;

/// Assembles the final result, routing the destructive manifest to the
/// before- or after-deploy slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderController {
    order: DestructiveOrder,
}

impl OrderController {
    pub fn new(order: DestructiveOrder) -> Self {
        Self { order }
    }

    pub fn order(&self) -> DestructiveOrder {
        self.order
    }

    /// Place the manifests. A destructive manifest with no types is dropped.
    pub fn place(
        &self,
        deploy: Option<Manifest>,
        destructive: Option<Manifest>,
        warnings: Vec<String>,
    ) -> DerivationResult {
        let destructive = destructive
            .filter(|manifest| !manifest.is_empty())
            .map(|manifest| (self.order, manifest));
        if let Some((order, _)) = &destructive {
            tracing::debug!(%order, "placing destructive manifest");
        }
        DerivationResult::new(deploy, destructive, warnings)
    }
}
