//! Derivation pipeline
//!
//! Change sets flow through the ignore filter and the aggregator before being
//! rendered as manifests. Existing manifests skip aggregation and go through
//! the merger instead. Both paths end in the [`OrderController`].

use serde::Serialize;

use super::options::DeriveOptions;
use super::order::OrderController;
use super::result::DerivationResult;
use crate::aggregate::aggregate;
use crate::catalog::TypeCatalog;
use crate::error::{DeriveError, Result};
use crate::ignore::{AmbiguousIgnore, filter_with_report};
use crate::manifest::{Manifest, MergeMode, MergedManifest, merge};
use crate::source::{
    ManifestRole, ManifestSource, RevisionDiff, change_set_from_descriptor, change_set_from_diff,
};
use crate::types::{ChangeSet, TypeMap};

/// Filtered and aggregated components, before rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedChanges {
    pub change_set: ChangeSet,
    pub warnings: Vec<String>,
}

/// Runs derivations against a catalog with fixed options.
pub struct Deriver<'a> {
    catalog: &'a dyn TypeCatalog,
    options: DeriveOptions,
}

impl<'a> Deriver<'a> {
    pub fn new(catalog: &'a dyn TypeCatalog, options: DeriveOptions) -> Self {
        Self { catalog, options }
    }

    pub fn options(&self) -> &DeriveOptions {
        &self.options
    }

    /// Filter and aggregate change sets from any number of sources.
    ///
    /// # Errors
    /// `UnknownType` when a source names a type the catalog does not know.
    pub fn prepare(&self, sources: Vec<ChangeSet>) -> Result<PreparedChanges> {
        for (index, source) in sources.iter().enumerate() {
            let unknown = source
                .to_deploy
                .keys()
                .chain(source.to_delete.keys())
                .find(|type_name| !self.catalog.contains(type_name));
            if let Some(type_name) = unknown {
                return Err(DeriveError::UnknownType {
                    type_name: type_name.clone(),
                    source_label: format!("change source #{index}"),
                });
            }
        }

        let mut warnings = Vec::new();
        let mut deploys = Vec::with_capacity(sources.len());
        let mut deletes = Vec::with_capacity(sources.len());
        let mut ambiguous = Vec::new();
        for source in sources {
            let (deploy, delete) =
                self.apply_ignore(source.to_deploy, source.to_delete, &mut ambiguous);
            deploys.push(deploy);
            deletes.push(delete);
        }

        let deploy = aggregate(&deploys, self.options.explicit, self.catalog);
        let delete = aggregate(&deletes, self.options.explicit, self.catalog);
        warnings.extend(deploy.warnings());
        warnings.extend(delete.warnings());

        let mut change_set = ChangeSet {
            to_deploy: deploy.types,
            to_delete: delete.types,
        };

        // Enumerated wildcards may have brought back ignored members
        if self.options.explicit {
            ambiguous.clear();
            let (to_deploy, to_delete) =
                self.apply_ignore(change_set.to_deploy, change_set.to_delete, &mut ambiguous);
            change_set = ChangeSet {
                to_deploy,
                to_delete,
            };
        }

        warnings.extend(ambiguous.iter().map(ToString::to_string));
        dedup_in_order(&mut warnings);

        tracing::debug!(
            deploy_types = change_set.to_deploy.len(),
            delete_types = change_set.to_delete.len(),
            "prepared change set"
        );

        Ok(PreparedChanges {
            change_set,
            warnings,
        })
    }

    /// Render prepared changes as manifests.
    ///
    /// The deploy manifest is always produced, even when empty.
    pub fn render(&self, prepared: PreparedChanges) -> DerivationResult {
        let api_version = self.options.api_version.clone();
        let deploy = Manifest::new(api_version.clone(), prepared.change_set.to_deploy);
        let destructive = Manifest::new(api_version, prepared.change_set.to_delete);
        OrderController::new(self.options.destructive_order).place(
            Some(deploy),
            Some(destructive),
            prepared.warnings,
        )
    }

    pub fn from_change_sets(&self, sources: Vec<ChangeSet>) -> Result<DerivationResult> {
        let prepared = self.prepare(sources)?;
        Ok(self.render(prepared))
    }

    /// Derive manifests from the files changed between two revisions.
    pub fn from_diff(&self, diff: &dyn RevisionDiff) -> Result<DerivationResult> {
        let entries = diff.entries()?;
        tracing::debug!(entries = entries.len(), "read revision diff");
        let changes = change_set_from_diff(&entries, self.catalog);
        self.from_change_sets(vec![changes])
    }

    /// Derive manifests from JSON descriptor documents.
    ///
    /// Every document is validated before any of them is processed.
    pub fn from_descriptors(&self, documents: &[&str]) -> Result<DerivationResult> {
        let sources = documents
            .iter()
            .map(|document| change_set_from_descriptor(document, self.catalog))
            .collect::<Result<Vec<_>>>()?;
        self.from_change_sets(sources)
    }

    /// Merge existing manifests.
    ///
    /// Packages and destructive manifests are merged separately. A role with a
    /// single manifest passes it through unchanged; a role with none produces
    /// no output.
    ///
    /// # Errors
    /// `InsufficientSources` when fewer than two manifests are given, and
    /// `UnknownType` naming the index of the first manifest with an unknown type.
    pub fn from_manifests(&self, sources: &[ManifestSource]) -> Result<DerivationResult> {
        if sources.len() < 2 {
            return Err(DeriveError::InsufficientSources {
                found: sources.len(),
            });
        }
        for (index, source) in sources.iter().enumerate() {
            let unknown = source
                .manifest
                .types
                .keys()
                .find(|type_name| !self.catalog.contains(type_name));
            if let Some(type_name) = unknown {
                return Err(DeriveError::UnknownType {
                    type_name: type_name.clone(),
                    source_label: format!("manifest #{index} ({})", source.origin),
                });
            }
        }

        let deploy = if self.options.merge_packages {
            self.merge_role(sources, ManifestRole::Package)?
        } else {
            None
        };
        let destructive = if self.options.merge_destructives {
            self.merge_role(sources, ManifestRole::Destructive)?
        } else {
            None
        };

        let order = destructive
            .as_ref()
            .and_then(|merged| merged.order)
            .unwrap_or(self.options.destructive_order);

        let mut ambiguous = Vec::new();
        let deploy = deploy.map(|merged| self.filter_manifest(merged.manifest, &mut ambiguous));
        let destructive =
            destructive.map(|merged| self.filter_manifest(merged.manifest, &mut ambiguous));

        let mut warnings: Vec<String> = ambiguous.iter().map(ToString::to_string).collect();
        dedup_in_order(&mut warnings);

        Ok(OrderController::new(order).place(deploy, destructive, warnings))
    }

    fn merge_role(
        &self,
        sources: &[ManifestSource],
        role: ManifestRole,
    ) -> Result<Option<MergedManifest>> {
        let mut manifests: Vec<Manifest> = sources
            .iter()
            .filter(|source| source.role == role)
            .map(|source| source.manifest.clone())
            .collect();
        let order_hint = Some(self.options.destructive_order);
        let mode = match role {
            ManifestRole::Package => MergeMode::Package,
            ManifestRole::Destructive => MergeMode::Destructive,
        };

        match manifests.len() {
            0 => Ok(None),
            1 => Ok(manifests.pop().map(|manifest| MergedManifest {
                manifest,
                order: match mode {
                    MergeMode::Package => None,
                    MergeMode::Destructive => order_hint,
                },
            })),
            _ => merge(&manifests, mode, order_hint).map(Some),
        }
    }

    fn filter_manifest(
        &self,
        manifest: Manifest,
        ambiguous: &mut Vec<AmbiguousIgnore>,
    ) -> Manifest {
        match &self.options.ignore_rules {
            Some(rules) => {
                let outcome = filter_with_report(&manifest.types, rules);
                ambiguous.extend(outcome.ambiguous);
                Manifest::new(manifest.api_version, outcome.types)
            }
            None => manifest,
        }
    }

    fn apply_ignore(
        &self,
        to_deploy: TypeMap,
        to_delete: TypeMap,
        ambiguous: &mut Vec<AmbiguousIgnore>,
    ) -> (TypeMap, TypeMap) {
        let Some(rules) = &self.options.ignore_rules else {
            return (to_deploy, to_delete);
        };
        let deploy = filter_with_report(&to_deploy, rules);
        let delete = filter_with_report(&to_delete, rules);
        ambiguous.extend(deploy.ambiguous);
        ambiguous.extend(delete.ambiguous);
        (deploy.types, delete.types)
    }
}

fn dedup_in_order(warnings: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    warnings.retain(|warning| seen.insert(warning.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::ignore::IgnoreRules;
    use crate::source::DiffEntry;
    use crate::types::{DestructiveOrder, MemberSet};

    fn catalog() -> StaticCatalog {
        StaticCatalog::builtin().unwrap()
    }

    #[test]
    fn test_diff_to_package() {
        let catalog = catalog();
        let deriver = Deriver::new(&catalog, DeriveOptions::default());
        let diff = vec![
            DiffEntry::added("force-app/main/default/objects/Account/fields/Foo.field-meta.xml"),
            DiffEntry::deleted("force-app/main/default/classes/Old.cls"),
        ];

        let result = deriver.from_diff(&diff).unwrap();

        let deploy = result.deploy_manifest().unwrap();
        assert_eq!(deploy.members("CustomField"), Some(&MemberSet::single("Account.Foo")));
        let after = result.destructive_after().unwrap();
        assert_eq!(after.members("ApexClass"), Some(&MemberSet::single("Old")));
        assert!(result.destructive_before().is_none());
    }

    #[test]
    fn test_no_deletes_means_no_destructive_manifest() {
        let catalog = catalog();
        let deriver = Deriver::new(&catalog, DeriveOptions::default());

        let result = deriver.from_descriptors(&[r#"{"ApexClass": ["Foo"]}"#]).unwrap();

        assert!(result.deploy_manifest().is_some());
        assert!(result.destructive().is_none());
    }

    #[test]
    fn test_empty_input_renders_empty_package() {
        let catalog = catalog();
        let deriver = Deriver::new(&catalog, DeriveOptions::default());

        let result = deriver.from_change_sets(Vec::new()).unwrap();

        assert!(result.deploy_manifest().unwrap().is_empty());
        assert!(result.destructive().is_none());
    }

    #[test]
    fn test_unknown_type_in_change_set() {
        let catalog = catalog();
        let deriver = Deriver::new(&catalog, DeriveOptions::default());
        let mut changes = ChangeSet::new();
        changes.add_delete("Gizmo", "X");

        match deriver.prepare(vec![ChangeSet::new(), changes]) {
            Err(DeriveError::UnknownType {
                type_name,
                source_label,
            }) => {
                assert_eq!(type_name, "Gizmo");
                assert_eq!(source_label, "change source #1");
            }
            other => panic!("expected unknown type, got {other:?}"),
        }
    }

    #[test]
    fn test_explicit_mode_refilters_enumerated_members() {
        let mut catalog = catalog();
        catalog
            .register_members("ApexClass", ["Keep", "Secret"])
            .unwrap();
        let options = DeriveOptions::new()
            .with_explicit(true)
            .with_ignore_rules(IgnoreRules::new().ignore_members("ApexClass", ["Secret"]));
        let deriver = Deriver::new(&catalog, options);

        let result = deriver.from_descriptors(&[r#"{"ApexClass": "*"}"#]).unwrap();

        assert_eq!(
            result.deploy_manifest().unwrap().members("ApexClass"),
            Some(&MemberSet::single("Keep"))
        );
        assert!(result.warnings().is_empty());
    }

    #[test]
    fn test_ambiguous_ignore_is_reported_once() {
        let catalog = catalog();
        let options = DeriveOptions::new()
            .with_ignore_rules(IgnoreRules::new().ignore_members("CustomObject", ["Account"]));
        let deriver = Deriver::new(&catalog, options);

        let result = deriver
            .from_descriptors(&[r#"{"CustomObject": "*"}"#, r#"{"CustomObject": "*"}"#])
            .unwrap();

        assert_eq!(
            result.deploy_manifest().unwrap().members("CustomObject"),
            Some(&MemberSet::Wildcard)
        );
        assert_eq!(result.warnings().len(), 1);
    }

    #[test]
    fn test_merge_routes_roles() {
        let catalog = catalog();
        let deriver = Deriver::new(
            &catalog,
            DeriveOptions::new().with_destructive_order(DestructiveOrder::Before),
        );
        let package = |version: &str, member: &str| {
            let mut types = TypeMap::new();
            types.insert("ApexClass".to_string(), MemberSet::single(member));
            Manifest::new(version, types)
        };
        let sources = vec![
            ManifestSource::new("a/package.xml", ManifestRole::Package, package("55.0", "A")),
            ManifestSource::new("b/package.xml", ManifestRole::Package, package("58.0", "B")),
            ManifestSource::new(
                "a/destructiveChanges.xml",
                ManifestRole::Destructive,
                package("57.0", "Old"),
            ),
        ];

        let result = deriver.from_manifests(&sources).unwrap();

        let deploy = result.deploy_manifest().unwrap();
        assert_eq!(deploy.api_version, "58.0");
        assert_eq!(
            deploy.members("ApexClass"),
            Some(&MemberSet::explicit(["A", "B"]).unwrap())
        );
        let before = result.destructive_before().unwrap();
        assert_eq!(before.members("ApexClass"), Some(&MemberSet::single("Old")));
        assert!(result.destructive_after().is_none());
    }

    #[test]
    fn test_merged_destructives_keep_order_tag() {
        let catalog = catalog();
        let deriver = Deriver::new(
            &catalog,
            DeriveOptions::new().with_destructive_order(DestructiveOrder::Before),
        );
        let destructive = |member: &str| {
            let mut types = TypeMap::new();
            types.insert("ApexClass".to_string(), MemberSet::single(member));
            Manifest::new("58.0", types)
        };
        let sources = vec![
            ManifestSource::new(
                "a/destructiveChanges.xml",
                ManifestRole::Destructive,
                destructive("Old"),
            ),
            ManifestSource::new(
                "b/destructiveChanges.xml",
                ManifestRole::Destructive,
                destructive("Stale"),
            ),
        ];

        let result = deriver.from_manifests(&sources).unwrap();

        let (order, manifest) = result.destructive().unwrap();
        assert_eq!(order, DestructiveOrder::Before);
        assert_eq!(
            manifest.members("ApexClass"),
            Some(&MemberSet::explicit(["Old", "Stale"]).unwrap())
        );
        assert!(result.deploy_manifest().is_none());
    }

    #[test]
    fn test_merge_only_destructive() {
        let catalog = catalog();
        let deriver = Deriver::new(&catalog, DeriveOptions::new().with_merge_packages(false));
        let sources = vec![
            ManifestSource::new("package.xml", ManifestRole::Package, Manifest::empty("58.0")),
            ManifestSource::new("package2.xml", ManifestRole::Package, Manifest::empty("58.0")),
        ];

        let result = deriver.from_manifests(&sources).unwrap();

        assert!(result.is_empty());
    }

    #[test]
    fn test_merge_requires_two_manifests() {
        let catalog = catalog();
        let deriver = Deriver::new(&catalog, DeriveOptions::default());
        let sources = vec![ManifestSource::new(
            "package.xml",
            ManifestRole::Package,
            Manifest::empty("58.0"),
        )];

        assert!(matches!(
            deriver.from_manifests(&sources),
            Err(DeriveError::InsufficientSources { found: 1 })
        ));
    }
}
