//! Options for a derivation run.

use crate::ignore::IgnoreRules;
use crate::manifest::DEFAULT_API_VERSION;
use crate::types::DestructiveOrder;

/// Options for a derivation run
///
/// Built once with the `with_*` methods and handed to the [`super::Deriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeriveOptions {
    /// List members explicitly instead of emitting wildcards
    pub explicit: bool,
    /// Merge destructive manifests when merging existing manifests
    pub merge_destructives: bool,
    /// Merge package manifests when merging existing manifests
    pub merge_packages: bool,
    /// Placement of the destructive manifest
    pub destructive_order: DestructiveOrder,
    /// Exclusion rules, if any
    pub ignore_rules: Option<IgnoreRules>,
    /// API version written into generated manifests
    pub api_version: String,
}

impl Default for DeriveOptions {
    fn default() -> Self {
        Self {
            explicit: false,
            merge_destructives: true,
            merge_packages: true,
            destructive_order: DestructiveOrder::default(),
            ignore_rules: None,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl DeriveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_explicit(mut self, explicit: bool) -> Self {
        self.explicit = explicit;
        self
    }

    pub fn with_merge_destructives(mut self, merge: bool) -> Self {
        self.merge_destructives = merge;
        self
    }

    pub fn with_merge_packages(mut self, merge: bool) -> Self {
        self.merge_packages = merge;
        self
    }

    pub fn with_destructive_order(mut self, order: DestructiveOrder) -> Self {
        self.destructive_order = order;
        self
    }

    /// Shorthand for `Before` when `before` is set, `After` otherwise.
    pub fn before_deploy(self, before: bool) -> Self {
        let order = if before {
            DestructiveOrder::Before
        } else {
            DestructiveOrder::After
        };
        self.with_destructive_order(order)
    }

    pub fn with_ignore_rules(mut self, rules: IgnoreRules) -> Self {
        self.ignore_rules = Some(rules);
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = DeriveOptions::default();
        assert!(!options.explicit);
        assert!(options.merge_packages);
        assert!(options.merge_destructives);
        assert_eq!(options.destructive_order, DestructiveOrder::After);
        assert_eq!(options.api_version, DEFAULT_API_VERSION);
        assert!(options.ignore_rules.is_none());
    }

    #[test]
    fn test_before_deploy() {
        assert_eq!(
            DeriveOptions::new().before_deploy(true).destructive_order,
            DestructiveOrder::Before
        );
        assert_eq!(
            DeriveOptions::new().before_deploy(false).destructive_order,
            DestructiveOrder::After
        );
    }
}
