//! Manifest XML parser

use std::path::Path;

use serde::Deserialize;

use super::Manifest;
use super::version::is_valid_api_version;
use crate::error::{DeriveError, Result};
use crate::types::{MemberSet, TypeMap, merge_type};

/// Root `<Package>` element.
#[derive(Debug, Deserialize)]
struct PackageElement {
    #[serde(rename = "types", default)]
    types: Vec<TypesElement>,
    #[serde(default)]
    version: Option<String>,
}

/// One `<types>` block. Members may appear on either side of `<name>`.
#[derive(Debug, Deserialize)]
struct TypesElement {
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Parse a manifest file from disk
pub fn parse_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path).map_err(|source| DeriveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_manifest_str(&content, &path.display().to_string())
}

/// Parse manifest XML; `origin` names the source in errors.
///
/// Repeated blocks for the same type are unioned, and a `*` member makes the
/// whole type a wildcard. Blocks without members are dropped.
pub fn parse_manifest_str(content: &str, origin: &str) -> Result<Manifest> {
    let package: PackageElement = quick_xml::de::from_str(content)
        .map_err(|e| DeriveError::malformed_manifest(origin, e.to_string()))?;

    let api_version = package
        .version
        .map(|version| version.trim().to_string())
        .ok_or_else(|| DeriveError::malformed_manifest(origin, "missing <version>"))?;
    if !is_valid_api_version(&api_version) {
        return Err(DeriveError::malformed_manifest(
            origin,
            format!("invalid API version '{api_version}'"),
        ));
    }

    let mut types = TypeMap::new();
    for block in package.types {
        let Some(type_name) = block.name.map(|name| name.trim().to_string()) else {
            return Err(DeriveError::malformed_manifest(
                origin,
                "<types> block without <name>",
            ));
        };
        if type_name.is_empty() {
            return Err(DeriveError::malformed_manifest(origin, "empty type <name>"));
        }

        let names: Vec<String> = block
            .members
            .iter()
            .map(|member| member.trim().to_string())
            .collect();
        if names.iter().any(String::is_empty) {
            return Err(DeriveError::malformed_manifest(
                origin,
                format!("blank member in type '{type_name}'"),
            ));
        }

        match MemberSet::explicit(names) {
            Some(members) => merge_type(&mut types, &type_name, members),
            None => {
                tracing::warn!(
                    origin,
                    type_name = %type_name,
                    "dropping type block without members"
                );
            }
        }
    }

    Ok(Manifest::new(api_version, types))
}
