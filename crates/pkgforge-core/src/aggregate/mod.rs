//! Component aggregation
//!
//! Combines the component collections produced by several change sources into
//! one collection per side. In the default mode a wildcard for a type absorbs
//! every explicit list for it. In explicit mode wildcards are enumerated from
//! the catalog's known members so the resulting manifest lists every member by
//! name.

use std::collections::BTreeSet;

use crate::catalog::TypeCatalog;
use crate::types::{MemberSet, TypeMap, merge_type};

/// Aggregated components and the wildcards that could not be enumerated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    pub types: TypeMap,
    /// Types kept as `*` because explicit members were requested but unavailable
    pub unresolved_wildcards: Vec<String>,
    /// Types without wildcard support whose `*` could not be enumerated
    pub dropped_wildcards: Vec<String>,
}

impl Aggregation {
    /// One warning line per unresolved or dropped wildcard.
    pub fn warnings(&self) -> Vec<String> {
        let kept = self.unresolved_wildcards.iter().map(|type_name| {
            format!("members of '{type_name}' are not known; keeping '*' in explicit mode")
        });
        let dropped = self.dropped_wildcards.iter().map(|type_name| {
            format!(
                "members of '{type_name}' are not known and '{type_name}' does not support '*'; \
                 dropping the type"
            )
        });
        kept.chain(dropped).collect()
    }
}

/// Aggregate component collections.
///
/// # Arguments
/// * `sources` - Collections to combine, in any order
/// * `explicit` - Enumerate wildcards instead of letting them dominate
/// * `catalog` - Source of known members and wildcard support
pub fn aggregate(sources: &[TypeMap], explicit: bool, catalog: &dyn TypeCatalog) -> Aggregation {
    let mut combined = TypeMap::new();
    // Names listed explicitly for each type, kept even when a wildcard absorbs them
    let mut seen = TypeMap::new();

    for source in sources {
        for (type_name, members) in source {
            if let MemberSet::Explicit(_) = members {
                merge_type(&mut seen, type_name, members.clone());
            }
            merge_type(&mut combined, type_name, members.clone());
        }
    }

    let mut aggregation = Aggregation::default();
    for (type_name, members) in combined {
        if !members.is_wildcard() {
            aggregation.types.insert(type_name, members);
            continue;
        }
        if !explicit && catalog.supports_wildcard(&type_name) {
            aggregation.types.insert(type_name, MemberSet::Wildcard);
            continue;
        }

        match catalog.all_known_members(&type_name) {
            Some(known) => {
                let listed = seen
                    .get(&type_name)
                    .and_then(MemberSet::names)
                    .cloned()
                    .unwrap_or_default();
                let all: BTreeSet<String> = known.into_iter().chain(listed).collect();
                match MemberSet::explicit(all) {
                    Some(members) => {
                        tracing::debug!(type_name = %type_name, "enumerated wildcard");
                        aggregation.types.insert(type_name, members);
                    }
                    None => {
                        tracing::debug!(type_name = %type_name, "wildcard has no known members");
                    }
                }
            }
            None if catalog.supports_wildcard(&type_name) => {
                tracing::warn!(
                    type_name = %type_name,
                    "cannot enumerate members, keeping wildcard"
                );
                aggregation.unresolved_wildcards.push(type_name.clone());
                aggregation.types.insert(type_name, MemberSet::Wildcard);
            }
            None => {
                tracing::warn!(
                    type_name = %type_name,
                    "cannot enumerate members of a type without wildcard support, dropping it"
                );
                aggregation.dropped_wildcards.push(type_name);
            }
        }
    }

    aggregation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{StaticCatalog, TypeDefinition};

    fn catalog() -> StaticCatalog {
        let mut catalog = StaticCatalog::new(vec![
            TypeDefinition::flat("ApexClass", "classes", "cls"),
            TypeDefinition::flat("CustomObject", "objects", "object"),
            TypeDefinition::flat("Report", "reports", "report")
                .in_folder()
                .without_wildcard(),
        ])
        .unwrap();
        catalog
            .register_members("ApexClass", ["Known1", "Known2"])
            .unwrap();
        catalog
    }

    fn types(entries: &[(&str, MemberSet)]) -> TypeMap {
        entries
            .iter()
            .map(|(name, members)| (name.to_string(), members.clone()))
            .collect()
    }

    #[test]
    fn test_union_of_explicit_sources() {
        let sources = vec![
            types(&[("ApexClass", MemberSet::single("A"))]),
            types(&[("ApexClass", MemberSet::explicit(["B", "A"]).unwrap())]),
        ];

        let result = aggregate(&sources, false, &catalog());

        assert_eq!(
            result.types.get("ApexClass"),
            Some(&MemberSet::explicit(["A", "B"]).unwrap())
        );
        assert!(result.unresolved_wildcards.is_empty());
    }

    #[test]
    fn test_wildcard_dominates_by_default() {
        let sources = vec![
            types(&[("ApexClass", MemberSet::single("A"))]),
            types(&[("ApexClass", MemberSet::Wildcard)]),
        ];

        let result = aggregate(&sources, false, &catalog());

        assert_eq!(result.types.get("ApexClass"), Some(&MemberSet::Wildcard));
    }

    #[test]
    fn test_explicit_mode_enumerates_known_members() {
        let sources = vec![
            types(&[("ApexClass", MemberSet::single("Extra"))]),
            types(&[("ApexClass", MemberSet::Wildcard)]),
        ];

        let result = aggregate(&sources, true, &catalog());

        assert_eq!(
            result.types.get("ApexClass"),
            Some(&MemberSet::explicit(["Extra", "Known1", "Known2"]).unwrap())
        );
    }

    #[test]
    fn test_explicit_mode_keeps_unenumerable_wildcard() {
        let sources = vec![types(&[("CustomObject", MemberSet::Wildcard)])];

        let result = aggregate(&sources, true, &catalog());

        assert_eq!(result.types.get("CustomObject"), Some(&MemberSet::Wildcard));
        assert_eq!(result.unresolved_wildcards, vec!["CustomObject".to_string()]);
        assert_eq!(result.warnings().len(), 1);
    }

    #[test]
    fn test_wildcard_on_unsupported_type_is_enumerated() {
        let mut catalog = catalog();
        catalog
            .register_members("Report", ["Sales/Pipeline"])
            .unwrap();
        let sources = vec![types(&[("Report", MemberSet::Wildcard)])];

        let result = aggregate(&sources, false, &catalog);

        assert_eq!(
            result.types.get("Report"),
            Some(&MemberSet::single("Sales/Pipeline"))
        );
    }

    #[test]
    fn test_unenumerable_wildcard_on_unsupported_type_is_dropped() {
        let sources = vec![types(&[("Report", MemberSet::Wildcard)])];

        let result = aggregate(&sources, false, &catalog());

        assert!(result.types.get("Report").is_none());
        assert!(result.unresolved_wildcards.is_empty());
        assert_eq!(result.dropped_wildcards, vec!["Report".to_string()]);
        let warnings = result.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("dropping"));
        assert!(!warnings[0].contains("explicit mode"));
    }

    #[test]
    fn test_empty_sources() {
        let result = aggregate(&[], true, &catalog());
        assert!(result.types.is_empty());
    }
}
