//! User exclusion rules
//!
//! Rules are read from a JSON ignore file mapping type names to what should be
//! left out of generated manifests:
//!
//! ```json
//! {
//!     "Profile": "*",
//!     "CustomLabels": true,
//!     "ApexClass": ["LegacyController", "ScratchTest"]
//! }
//! ```
//!
//! `"*"`, `["*"]`, `true`, `null` and `[]` all ignore the whole type; a list of
//! names ignores just those members; `false` disables the entry.

pub mod filter;

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::error::{DeriveError, Result};
use crate::types::MemberSet;

pub use filter::{AmbiguousIgnore, FilterOutcome, filter, filter_change_set, filter_with_report};

/// Default ignore file name, looked up in the project root.
pub const DEFAULT_IGNORE_FILE: &str = ".pkgignore.json";

/// What to ignore for one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreRule {
    /// Ignore every component of the type
    WholeType,
    /// Ignore the listed members, or all of them for a wildcard
    Members(MemberSet),
}

/// Ignore rules keyed by type name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRules {
    rules: BTreeMap<String, IgnoreRule>,
}

impl IgnoreRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load rules from a JSON ignore file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| DeriveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content).map_err(|e| match e {
            DeriveError::InvalidIgnoreRules { reason } => DeriveError::InvalidIgnoreRules {
                reason: format!("{}: {}", path.display(), reason),
            },
            other => other,
        })
    }

    /// Parse rules from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?;
        let Value::Object(entries) = document else {
            return Err(invalid("ignore rules must be a JSON object"));
        };

        let mut rules = Self::new();
        for (type_name, value) in entries {
            if let Some(rule) = parse_rule(&type_name, value)? {
                rules.insert(type_name, rule);
            }
        }
        Ok(rules)
    }

    pub fn insert(&mut self, type_name: impl Into<String>, rule: IgnoreRule) {
        self.rules.insert(type_name.into(), rule);
    }

    /// Ignore the whole type.
    pub fn ignore_type(mut self, type_name: &str) -> Self {
        self.insert(type_name, IgnoreRule::WholeType);
        self
    }

    /// Ignore the given members of a type.
    pub fn ignore_members<I, S>(mut self, type_name: &str, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match MemberSet::explicit(members) {
            Some(members) => self.insert(type_name, IgnoreRule::Members(members)),
            None => self.insert(type_name, IgnoreRule::WholeType),
        }
        self
    }

    pub fn get(&self, type_name: &str) -> Option<&IgnoreRule> {
        self.rules.get(type_name)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &IgnoreRule)> {
        self.rules.iter()
    }
}

fn parse_rule(type_name: &str, value: Value) -> Result<Option<IgnoreRule>> {
    let rule = match value {
        Value::Null | Value::Bool(true) => IgnoreRule::WholeType,
        Value::Bool(false) => return Ok(None),
        Value::String(member) => {
            if member.trim().is_empty() {
                return Err(invalid(format!("blank member for type '{type_name}'")));
            }
            IgnoreRule::Members(MemberSet::single(member))
        }
        Value::Array(items) => {
            let mut names = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(name) if !name.trim().is_empty() => names.push(name),
                    other => {
                        return Err(invalid(format!(
                            "type '{type_name}' has an invalid member entry: {other}"
                        )));
                    }
                }
            }
            match MemberSet::explicit(names) {
                Some(members) => IgnoreRule::Members(members),
                None => IgnoreRule::WholeType,
            }
        }
        other => {
            return Err(invalid(format!(
                "type '{type_name}' must map to \"*\", a member list or true, got {other}"
            )));
        }
    };
    Ok(Some(rule))
}

fn invalid(reason: impl Into<String>) -> DeriveError {
    DeriveError::InvalidIgnoreRules {
        reason: reason.into(),
    }
}
