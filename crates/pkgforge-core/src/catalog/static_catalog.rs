//! In-memory catalog built from type definitions.

use std::collections::{BTreeSet, HashMap};
use std::path::{Component, Path};

use super::parser::{parse_catalog, parse_catalog_str};
use super::schema::TypeDefinition;
use super::{ComponentRef, TypeCatalog};
use crate::error::{DeriveError, Result};

const BUILTIN_CATALOG: &str = include_str!("builtin.toml");

/// Suffix carried by companion descriptor files (`Foo.cls-meta.xml`).
const META_SUFFIX: &str = "-meta.xml";

/// Catalog backed by a list of [`TypeDefinition`]s plus registered member lists.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    definitions: Vec<TypeDefinition>,
    known_members: HashMap<String, BTreeSet<String>>,
}

impl StaticCatalog {
    pub fn new(definitions: Vec<TypeDefinition>) -> Result<Self> {
        let mut catalog = Self::default();
        catalog.extend(definitions)?;
        Ok(catalog)
    }

    /// Catalog of common platform types shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Self::new(parse_catalog_str(content)?.types)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Self::new(parse_catalog(path)?.types)
    }

    /// Add definitions, replacing existing ones with the same name.
    pub fn extend(&mut self, definitions: Vec<TypeDefinition>) -> Result<()> {
        for definition in definitions {
            definition
                .validate()
                .map_err(|reason| DeriveError::Catalog { reason })?;

            if let Some(members) = &definition.members {
                self.known_members.insert(
                    definition.name.clone(),
                    members.iter().cloned().collect(),
                );
            }

            match self
                .definitions
                .iter_mut()
                .find(|existing| existing.name == definition.name)
            {
                Some(existing) => *existing = definition,
                None => self.definitions.push(definition),
            }
        }
        Ok(())
    }

    /// Record the members currently present for a type.
    ///
    /// Used to feed results from a local scan or a remote describe into
    /// explicit-mode aggregation.
    pub fn register_members<I, S>(&mut self, type_name: &str, members: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.contains(type_name) {
            return Err(DeriveError::UnknownType {
                type_name: type_name.to_string(),
                source_label: "member registration".to_string(),
            });
        }
        self.known_members
            .entry(type_name.to_string())
            .or_default()
            .extend(members.into_iter().map(Into::into));
        Ok(())
    }

    pub fn definition(&self, type_name: &str) -> Option<&TypeDefinition> {
        self.definitions.iter().find(|def| def.name == type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|def| def.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Child types first so `objects/X/fields/Y` never falls through to a parent rule.
    fn resolution_order(&self) -> impl Iterator<Item = &TypeDefinition> {
        let children = self.definitions.iter().filter(|def| def.parent.is_some());
        let rest = self.definitions.iter().filter(|def| def.parent.is_none());
        children.chain(rest)
    }

    fn matching_definition<'a>(
        &'a self,
        segments: &[&str],
    ) -> Option<(&'a TypeDefinition, String)> {
        self.resolution_order()
            .find_map(|def| resolve_member(def, segments).map(|member| (def, member)))
    }
}

impl TypeCatalog for StaticCatalog {
    fn resolve(&self, path: &Path) -> Option<ComponentRef> {
        let segments = path_segments(path)?;
        self.matching_definition(&segments)
            .map(|(def, member)| ComponentRef::new(def.name.clone(), member))
    }

    fn contains(&self, type_name: &str) -> bool {
        self.definition(type_name).is_some()
    }

    fn supports_wildcard(&self, type_name: &str) -> bool {
        self.definition(type_name)
            .is_some_and(|def| def.supports_wildcard)
    }

    fn all_known_members(&self, type_name: &str) -> Option<BTreeSet<String>> {
        self.known_members.get(type_name).cloned()
    }

    fn is_bundle(&self, type_name: &str) -> bool {
        self.definition(type_name).is_some_and(|def| def.bundle)
    }

    fn is_bundle_part(&self, path: &Path) -> bool {
        let Some(segments) = path_segments(path) else {
            return false;
        };
        let Some((def, member)) = self.matching_definition(&segments) else {
            return false;
        };
        if !def.bundle {
            return false;
        }
        let Some(file) = segments.last() else {
            return false;
        };
        let is_descriptor = file.ends_with(META_SUFFIX)
            && file.split('.').next() == Some(member.as_str())
            && segments.len() >= 2
            && segments[segments.len() - 2] == member;
        !is_descriptor
    }
}

/// Split a path into UTF-8 segments, dropping roots and `.` components.
fn path_segments(path: &Path) -> Option<Vec<&str>> {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_str()),
            _ => None,
        })
        .collect()
}

/// Member name for `segments` under `def`, if the path belongs to that type.
fn resolve_member(def: &TypeDefinition, segments: &[&str]) -> Option<String> {
    let (file, dirs) = segments.split_last()?;
    let name = file.strip_suffix(META_SUFFIX).unwrap_or(file);
    let dir_index = dirs.iter().rposition(|segment| *segment == def.directory)?;
    let between = &dirs[dir_index + 1..];

    if def.bundle {
        return between.first().map(|bundle| (*bundle).to_string());
    }

    if def.in_folder && between.is_empty() {
        // Folder descriptors sit next to the folders: `reports/Sales.reportFolder-meta.xml`
        let suffix = def.suffix.as_deref()?;
        let folder = name.strip_suffix(&format!(".{suffix}Folder"))?;
        return non_empty(folder).map(str::to_string);
    }

    let stem = file_stem(def, name)?;

    if let Some(parent_dir) = &def.parent {
        if !between.is_empty() || dir_index < 2 || dirs[dir_index - 2] != parent_dir.as_str() {
            return None;
        }
        return Some(format!("{}.{}", dirs[dir_index - 1], stem));
    }

    if def.in_folder {
        return Some(format!("{}/{}", between.join("/"), stem));
    }

    Some(stem.to_string())
}

fn file_stem<'a>(def: &TypeDefinition, name: &'a str) -> Option<&'a str> {
    let stem = match def.suffix.as_deref() {
        Some(suffix) => name.strip_suffix(suffix)?.strip_suffix('.')?,
        None => name.split('.').next()?,
    };
    non_empty(stem)
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}
