//! Applying ignore rules to component collections.

use std::fmt;

use serde::Serialize;

use super::{IgnoreRule, IgnoreRules};
use crate::types::{ChangeSet, MemberSet, TypeMap};

/// An explicit member rule that cannot apply to a wildcard component.
///
/// Not an error: the wildcard entry is kept as-is and the rule has no effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbiguousIgnore {
    pub type_name: String,
    pub members: Vec<String>,
}

impl fmt::Display for AmbiguousIgnore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ignore rule for '{}' lists members [{}] but the type is included as '*'; the rule has no effect",
            self.type_name,
            self.members.join(", ")
        )
    }
}

/// Filtered components plus the rules that could not be applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub types: TypeMap,
    pub ambiguous: Vec<AmbiguousIgnore>,
}

/// Remove ignored components from a collection.
pub fn filter(collection: &TypeMap, rules: &IgnoreRules) -> TypeMap {
    filter_with_report(collection, rules).types
}

/// Remove ignored components and report ambiguous rules.
pub fn filter_with_report(collection: &TypeMap, rules: &IgnoreRules) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();

    for (type_name, members) in collection {
        let Some(rule) = rules.get(type_name) else {
            outcome.types.insert(type_name.clone(), members.clone());
            continue;
        };

        match (rule, members) {
            (IgnoreRule::WholeType, _) | (IgnoreRule::Members(MemberSet::Wildcard), _) => {
                tracing::debug!(type_name = %type_name, "ignoring type");
            }
            (IgnoreRule::Members(MemberSet::Explicit(ignored)), MemberSet::Wildcard) => {
                let ambiguous = AmbiguousIgnore {
                    type_name: type_name.clone(),
                    members: ignored.iter().cloned().collect(),
                };
                tracing::warn!("{}", ambiguous);
                outcome.ambiguous.push(ambiguous);
                outcome.types.insert(type_name.clone(), MemberSet::Wildcard);
            }
            (IgnoreRule::Members(MemberSet::Explicit(ignored)), explicit) => {
                match explicit.subtract(ignored) {
                    Some(rest) => {
                        outcome.types.insert(type_name.clone(), rest);
                    }
                    None => {
                        tracing::debug!(type_name = %type_name, "every member ignored");
                    }
                }
            }
        }
    }

    outcome
}

/// Filter both sides of a change set.
pub fn filter_change_set(
    changes: &ChangeSet,
    rules: &IgnoreRules,
) -> (ChangeSet, Vec<AmbiguousIgnore>) {
    let deploy = filter_with_report(&changes.to_deploy, rules);
    let delete = filter_with_report(&changes.to_delete, rules);

    let mut ambiguous = deploy.ambiguous;
    ambiguous.extend(delete.ambiguous);

    let filtered = ChangeSet {
        to_deploy: deploy.types,
        to_delete: delete.types,
    };
    (filtered, ambiguous)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(entries: &[(&str, MemberSet)]) -> TypeMap {
        entries
            .iter()
            .map(|(name, members)| (name.to_string(), members.clone()))
            .collect()
    }

    #[test]
    fn test_wildcard_rule_removes_type() {
        let input = collection(&[("ApexClass", MemberSet::explicit(["Foo", "Bar"]).unwrap())]);
        let rules = IgnoreRules::new().ignore_members("ApexClass", ["*"]);

        assert!(filter(&input, &rules).is_empty());
    }

    #[test]
    fn test_whole_type_rule_removes_wildcard_type() {
        let input = collection(&[("Profile", MemberSet::Wildcard)]);
        let rules = IgnoreRules::new().ignore_type("Profile");

        assert!(filter(&input, &rules).is_empty());
    }

    #[test]
    fn test_member_rule_subtracts() {
        let input = collection(&[
            ("ApexClass", MemberSet::explicit(["Foo", "Bar"]).unwrap()),
            ("Flow", MemberSet::single("F")),
        ]);
        let rules = IgnoreRules::new().ignore_members("ApexClass", ["Foo", "Missing"]);

        let filtered = filter(&input, &rules);

        assert_eq!(filtered.get("ApexClass"), Some(&MemberSet::single("Bar")));
        assert_eq!(filtered.get("Flow"), Some(&MemberSet::single("F")));
    }

    #[test]
    fn test_member_rule_emptying_type_drops_it() {
        let input = collection(&[("ApexClass", MemberSet::single("Foo"))]);
        let rules = IgnoreRules::new().ignore_members("ApexClass", ["Foo"]);

        assert!(!filter(&input, &rules).contains_key("ApexClass"));
    }

    #[test]
    fn test_member_rule_on_wildcard_is_ambiguous() {
        let input = collection(&[("CustomObject", MemberSet::Wildcard)]);
        let rules = IgnoreRules::new().ignore_members("CustomObject", ["Account"]);

        let outcome = filter_with_report(&input, &rules);

        assert_eq!(outcome.types, input);
        assert_eq!(outcome.ambiguous.len(), 1);
        assert_eq!(outcome.ambiguous[0].type_name, "CustomObject");
        assert_eq!(outcome.ambiguous[0].members, vec!["Account".to_string()]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let input = collection(&[
            ("ApexClass", MemberSet::explicit(["A", "B", "C"]).unwrap()),
            ("CustomObject", MemberSet::Wildcard),
            ("Profile", MemberSet::single("Admin")),
        ]);
        let rules = IgnoreRules::new()
            .ignore_members("ApexClass", ["B"])
            .ignore_members("CustomObject", ["Account"])
            .ignore_type("Profile");

        let once = filter(&input, &rules);
        let twice = filter(&once, &rules);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_change_set_both_sides() {
        let mut changes = ChangeSet::new();
        changes.add_deploy("ApexClass", "Keep");
        changes.add_deploy("ApexClass", "Drop");
        changes.add_delete("ApexClass", "Drop");
        let rules = IgnoreRules::new().ignore_members("ApexClass", ["Drop"]);

        let (filtered, ambiguous) = filter_change_set(&changes, &rules);

        assert!(ambiguous.is_empty());
        assert_eq!(filtered.to_deploy.get("ApexClass"), Some(&MemberSet::single("Keep")));
        assert!(filtered.to_delete.is_empty());
    }
}
