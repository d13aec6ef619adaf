//! Shared component types used by every stage of the derivation pipeline.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Literal member name standing for "every member of the type".
pub const WILDCARD: &str = "*";

/// Components of one type, keyed by type name.
///
/// A `BTreeMap` keeps iteration case-sensitive ascending, which is the order
/// manifests are rendered in.
pub type TypeMap = BTreeMap<String, MemberSet>;

/// Members of a single component type.
///
/// A type is either listed member by member or covered by the wildcard. An
/// explicit set is never empty, and a wildcard never carries names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMembers", into = "RawMembers")]
pub enum MemberSet {
    /// Every member of the type.
    Wildcard,
    /// A non-empty set of named members.
    Explicit(BTreeSet<String>),
}

impl MemberSet {
    /// Build an explicit set. Returns `None` when no names were given.
    ///
    /// A `*` among the names collapses the whole set to [`MemberSet::Wildcard`].
    pub fn explicit<I, S>(members: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = BTreeSet::new();
        for member in members {
            let member = member.into();
            if member == WILDCARD {
                return Some(Self::Wildcard);
            }
            set.insert(member);
        }
        if set.is_empty() {
            None
        } else {
            Some(Self::Explicit(set))
        }
    }

    /// Single named member.
    pub fn single(member: impl Into<String>) -> Self {
        let member = member.into();
        if member == WILDCARD {
            return Self::Wildcard;
        }
        Self::Explicit(BTreeSet::from([member]))
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    /// Named members, or `None` for a wildcard.
    pub fn names(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::Wildcard => None,
            Self::Explicit(names) => Some(names),
        }
    }

    /// Whether `member` is covered by this set.
    pub fn contains(&self, member: &str) -> bool {
        match self {
            Self::Wildcard => true,
            Self::Explicit(names) => names.contains(member),
        }
    }

    /// Union with wildcard dominance.
    pub fn union(self, other: Self) -> Self {
        match (self, other) {
            (Self::Explicit(mut left), Self::Explicit(right)) => {
                left.extend(right);
                Self::Explicit(left)
            }
            _ => Self::Wildcard,
        }
    }

    /// Add a named member. A wildcard already covers it.
    pub fn insert(&mut self, member: impl Into<String>) {
        let member = member.into();
        if member == WILDCARD {
            *self = Self::Wildcard;
            return;
        }
        if let Self::Explicit(names) = self {
            names.insert(member);
        }
    }

    /// Remove the given names. Returns `None` if nothing is left.
    ///
    /// A wildcard cannot be reduced by names and is returned unchanged.
    pub fn subtract(&self, removed: &BTreeSet<String>) -> Option<Self> {
        match self {
            Self::Wildcard => Some(Self::Wildcard),
            Self::Explicit(names) => {
                let rest: BTreeSet<String> = names.difference(removed).cloned().collect();
                if rest.is_empty() {
                    None
                } else {
                    Some(Self::Explicit(rest))
                }
            }
        }
    }
}

/// Wire form of a member set: `"*"`, a single name, or a list of names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawMembers {
    Token(String),
    List(Vec<String>),
}

impl TryFrom<RawMembers> for MemberSet {
    type Error = String;

    fn try_from(raw: RawMembers) -> Result<Self, Self::Error> {
        let names = match raw {
            RawMembers::Token(token) => vec![token],
            RawMembers::List(list) => list,
        };
        if let Some(blank) = names.iter().find(|name| name.trim().is_empty()) {
            return Err(format!("member name '{blank}' is blank"));
        }
        MemberSet::explicit(names).ok_or_else(|| "member list is empty".to_string())
    }
}

impl From<MemberSet> for RawMembers {
    fn from(set: MemberSet) -> Self {
        match set {
            MemberSet::Wildcard => RawMembers::Token(WILDCARD.to_string()),
            MemberSet::Explicit(names) => RawMembers::List(names.into_iter().collect()),
        }
    }
}

/// Merge `members` into `map[type_name]` with wildcard dominance.
pub fn merge_type(map: &mut TypeMap, type_name: &str, members: MemberSet) {
    match map.remove(type_name) {
        Some(existing) => {
            map.insert(type_name.to_string(), existing.union(members));
        }
        None => {
            map.insert(type_name.to_string(), members);
        }
    }
}

/// When destructive changes run relative to the deploy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestructiveOrder {
    /// Delete before deploying (`destructiveChanges.xml`)
    Before,
    /// Delete after deploying (`destructiveChangesPost.xml`)
    #[default]
    After,
}

impl DestructiveOrder {
    /// Conventional file name of a destructive manifest with this placement.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Before => "destructiveChanges.xml",
            Self::After => "destructiveChangesPost.xml",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Before => Self::After,
            Self::After => Self::Before,
        }
    }
}

impl std::fmt::Display for DestructiveOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
        }
    }
}

impl TryFrom<&str> for DestructiveOrder {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            other => Err(format!("unknown destructive order '{other}' (use before or after)")),
        }
    }
}

/// Components to deploy and components to delete, produced by one change source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    #[serde(default)]
    pub to_deploy: TypeMap,
    #[serde(default)]
    pub to_delete: TypeMap,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.to_deploy.is_empty() && self.to_delete.is_empty()
    }

    /// Record a member to deploy.
    pub fn add_deploy(&mut self, type_name: &str, member: impl Into<String>) {
        merge_type(&mut self.to_deploy, type_name, MemberSet::single(member));
    }

    /// Record a member to delete.
    pub fn add_delete(&mut self, type_name: &str, member: impl Into<String>) {
        merge_type(&mut self.to_delete, type_name, MemberSet::single(member));
    }

    /// Drop delete records for members that are also being deployed.
    pub fn drop_redeployed_deletes(&mut self) {
        let mut emptied = Vec::new();
        for (type_name, deleted) in &mut self.to_delete {
            let Some(MemberSet::Explicit(deployed)) = self.to_deploy.get(type_name) else {
                continue;
            };
            match deleted.subtract(deployed) {
                Some(rest) => *deleted = rest,
                None => emptied.push(type_name.clone()),
            }
        }
        for type_name in emptied {
            tracing::debug!(type_name = %type_name, "delete records superseded by deploy");
            self.to_delete.remove(&type_name);
        }
    }
}
