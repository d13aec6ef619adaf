//! Revision diff entries and the adapter that turns them into a change set.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{ComponentRef, TypeCatalog};
use crate::error::Result;
use crate::types::ChangeSet;

/// How a file changed between two revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

/// One changed file reported by a revision diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffEntry {
    pub path: PathBuf,
    pub change_kind: ChangeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renamed_from: Option<PathBuf>,
}

impl DiffEntry {
    pub fn added(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ChangeKind::Added)
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ChangeKind::Modified)
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ChangeKind::Deleted)
    }

    /// A file moved from `from` to `to`.
    pub fn renamed(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            path: to.into(),
            change_kind: ChangeKind::Added,
            renamed_from: Some(from.into()),
        }
    }

    fn new(path: impl Into<PathBuf>, change_kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            change_kind,
            renamed_from: None,
        }
    }
}

/// Source of changed files between two revisions.
pub trait RevisionDiff {
    fn entries(&self) -> Result<Vec<DiffEntry>>;
}

impl RevisionDiff for Vec<DiffEntry> {
    fn entries(&self) -> Result<Vec<DiffEntry>> {
        Ok(self.clone())
    }
}

/// Build a change set from diff entries.
///
/// Added and modified files deploy their component, deleted files delete it,
/// and a rename does both for the old and new component. Paths the catalog
/// cannot resolve are not component files and are skipped.
pub fn change_set_from_diff(entries: &[DiffEntry], catalog: &dyn TypeCatalog) -> ChangeSet {
    let removed_bundles = removed_bundles(entries, catalog);
    let mut changes = ChangeSet::new();

    for entry in entries {
        if let Some(old_path) = &entry.renamed_from {
            record_removal(&mut changes, catalog, old_path, &removed_bundles);
        }
        match entry.change_kind {
            ChangeKind::Added | ChangeKind::Modified => {
                if let Some(component) = resolve(catalog, &entry.path) {
                    changes.add_deploy(&component.type_name, component.member);
                }
            }
            ChangeKind::Deleted => {
                record_removal(&mut changes, catalog, &entry.path, &removed_bundles);
            }
        }
    }

    changes.drop_redeployed_deletes();
    changes
}

fn resolve(catalog: &dyn TypeCatalog, path: &Path) -> Option<ComponentRef> {
    let component = catalog.resolve(path);
    if component.is_none() {
        tracing::debug!(path = %path.display(), "skipping non-component path");
    }
    component
}

/// Bundles whose descriptor file is removed by this diff.
fn removed_bundles(entries: &[DiffEntry], catalog: &dyn TypeCatalog) -> HashSet<ComponentRef> {
    entries
        .iter()
        .flat_map(|entry| {
            let deleted = (entry.change_kind == ChangeKind::Deleted).then_some(&entry.path);
            deleted.into_iter().chain(entry.renamed_from.as_ref())
        })
        .filter(|path| !catalog.is_bundle_part(path))
        .filter_map(|path| catalog.resolve(path))
        .filter(|component| catalog.is_bundle(&component.type_name))
        .collect()
}

fn record_removal(
    changes: &mut ChangeSet,
    catalog: &dyn TypeCatalog,
    path: &Path,
    removed_bundles: &HashSet<ComponentRef>,
) {
    let Some(component) = resolve(catalog, path) else {
        return;
    };

    if catalog.is_bundle_part(path) {
        // Losing one file of a surviving bundle is a change to the bundle
        if !removed_bundles.contains(&component) {
            changes.add_deploy(&component.type_name, component.member);
        }
        return;
    }

    changes.add_delete(&component.type_name, component.member);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::types::MemberSet;

    fn catalog() -> StaticCatalog {
        StaticCatalog::builtin().unwrap()
    }

    #[test]
    fn test_added_and_deleted_paths() {
        let entries = vec![
            DiffEntry::added("force-app/main/default/classes/Foo.cls"),
            DiffEntry::modified("force-app/main/default/classes/Foo.cls-meta.xml"),
            DiffEntry::deleted("force-app/main/default/triggers/Old.trigger"),
        ];

        let changes = change_set_from_diff(&entries, &catalog());

        assert_eq!(
            changes.to_deploy.get("ApexClass"),
            Some(&MemberSet::single("Foo"))
        );
        assert_eq!(
            changes.to_delete.get("ApexTrigger"),
            Some(&MemberSet::single("Old"))
        );
    }

    #[test]
    fn test_rename_records_both_sides() {
        let entries = vec![DiffEntry::renamed("classes/Old.cls", "classes/New.cls")];

        let changes = change_set_from_diff(&entries, &catalog());

        assert_eq!(changes.to_deploy.get("ApexClass"), Some(&MemberSet::single("New")));
        assert_eq!(changes.to_delete.get("ApexClass"), Some(&MemberSet::single("Old")));
    }

    #[test]
    fn test_move_within_same_member_is_not_a_delete() {
        let entries = vec![DiffEntry::renamed(
            "force-app/classes/Foo.cls",
            "force-app/main/classes/Foo.cls",
        )];

        let changes = change_set_from_diff(&entries, &catalog());

        assert!(changes.to_delete.is_empty());
        assert_eq!(changes.to_deploy.get("ApexClass"), Some(&MemberSet::single("Foo")));
    }

    #[test]
    fn test_unresolvable_paths_are_skipped() {
        let entries = vec![
            DiffEntry::added("README.md"),
            DiffEntry::deleted("scripts/setup.sh"),
        ];

        let changes = change_set_from_diff(&entries, &catalog());

        assert!(changes.is_empty());
    }

    #[test]
    fn test_deleted_bundle_part_updates_bundle() {
        let entries = vec![DiffEntry::deleted("lwc/card/helper.js")];

        let changes = change_set_from_diff(&entries, &catalog());

        assert!(changes.to_delete.is_empty());
        assert_eq!(
            changes.to_deploy.get("LightningComponentBundle"),
            Some(&MemberSet::single("card"))
        );
    }

    #[test]
    fn test_deleted_bundle_is_deleted() {
        let entries = vec![
            DiffEntry::deleted("lwc/card/card.js"),
            DiffEntry::deleted("lwc/card/card.html"),
            DiffEntry::deleted("lwc/card/card.js-meta.xml"),
        ];

        let changes = change_set_from_diff(&entries, &catalog());

        assert!(changes.to_deploy.is_empty());
        assert_eq!(
            changes.to_delete.get("LightningComponentBundle"),
            Some(&MemberSet::single("card"))
        );
    }
}
