//! JSON descriptor adapter
//!
//! A descriptor lists components directly, either deploy-only:
//!
//! ```json
//! { "ApexClass": ["Foo", "Bar"], "CustomObject": "*" }
//! ```
//!
//! or split into sections:
//!
//! ```json
//! { "deploy": { "ApexClass": ["Foo"] }, "delete": { "ApexTrigger": ["Old"] } }
//! ```

use std::path::Path;

use serde_json::{Map, Value};

use crate::catalog::TypeCatalog;
use crate::error::{DeriveError, Result};
use crate::types::{ChangeSet, MemberSet, TypeMap};

const DEPLOY_SECTION: &str = "deploy";
const DELETE_SECTION: &str = "delete";

/// Read and validate a descriptor file.
pub fn load_descriptor(path: &Path, catalog: &dyn TypeCatalog) -> Result<ChangeSet> {
    let content = std::fs::read_to_string(path).map_err(|source| DeriveError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    change_set_from_descriptor(&content, catalog).map_err(|e| match e {
        DeriveError::MalformedDescriptor { reason } => DeriveError::MalformedDescriptor {
            reason: format!("{}: {}", path.display(), reason),
        },
        other => other,
    })
}

/// Validate a descriptor document and convert it to a change set.
///
/// The whole document is validated before anything is returned.
pub fn change_set_from_descriptor(content: &str, catalog: &dyn TypeCatalog) -> Result<ChangeSet> {
    let document: Value = serde_json::from_str(content)
        .map_err(|e| DeriveError::malformed_descriptor(format!("invalid JSON: {e}")))?;

    let Value::Object(root) = document else {
        return Err(DeriveError::malformed_descriptor(
            "top level must be an object of component types",
        ));
    };

    let mut changes = ChangeSet::new();

    if is_sectioned(&root) {
        if let Some(section) = root.get(DEPLOY_SECTION) {
            changes.to_deploy = parse_section(DEPLOY_SECTION, section, catalog)?;
        }
        if let Some(section) = root.get(DELETE_SECTION) {
            changes.to_delete = parse_section(DELETE_SECTION, section, catalog)?;
        }
    } else {
        changes.to_deploy = parse_types(DEPLOY_SECTION, &root, catalog)?;
    }

    tracing::debug!(
        deploy_types = changes.to_deploy.len(),
        delete_types = changes.to_delete.len(),
        "parsed descriptor"
    );
    Ok(changes)
}

fn is_sectioned(root: &Map<String, Value>) -> bool {
    !root.is_empty()
        && root
            .keys()
            .all(|key| key == DEPLOY_SECTION || key == DELETE_SECTION)
}

fn parse_section(section: &str, value: &Value, catalog: &dyn TypeCatalog) -> Result<TypeMap> {
    match value {
        Value::Object(types) => parse_types(section, types, catalog),
        _ => Err(DeriveError::malformed_descriptor(format!(
            "section '{section}' must be an object of component types"
        ))),
    }
}

fn parse_types(
    section: &str,
    types: &Map<String, Value>,
    catalog: &dyn TypeCatalog,
) -> Result<TypeMap> {
    let mut parsed = TypeMap::new();

    for (type_name, members) in types {
        if !catalog.contains(type_name) {
            return Err(DeriveError::malformed_descriptor(format!(
                "unknown component type '{type_name}' in section '{section}'"
            )));
        }

        let members: MemberSet = serde_json::from_value(members.clone()).map_err(|e| {
            DeriveError::malformed_descriptor(format!(
                "type '{type_name}' in section '{section}': {e}"
            ))
        })?;

        if members.is_wildcard() && !catalog.supports_wildcard(type_name) {
            return Err(DeriveError::malformed_descriptor(format!(
                "type '{type_name}' in section '{section}' does not support the wildcard member"
            )));
        }

        parsed.insert(type_name.clone(), members);
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;

    fn catalog() -> StaticCatalog {
        StaticCatalog::builtin().unwrap()
    }

    fn reason(result: Result<ChangeSet>) -> String {
        match result {
            Err(DeriveError::MalformedDescriptor { reason }) => reason,
            other => panic!("expected malformed descriptor, got {other:?}"),
        }
    }

    #[test]
    fn test_flat_descriptor_is_deploy_only() {
        let changes = change_set_from_descriptor(
            r#"{"ApexClass": ["Foo", "Bar"], "CustomObject": "*"}"#,
            &catalog(),
        )
        .unwrap();

        assert!(changes.to_delete.is_empty());
        assert_eq!(
            changes.to_deploy.get("ApexClass"),
            Some(&MemberSet::explicit(["Bar", "Foo"]).unwrap())
        );
        assert_eq!(changes.to_deploy.get("CustomObject"), Some(&MemberSet::Wildcard));
    }

    #[test]
    fn test_sectioned_descriptor() {
        let changes = change_set_from_descriptor(
            r#"{"deploy": {"ApexClass": ["Foo"]}, "delete": {"ApexTrigger": ["Old"]}}"#,
            &catalog(),
        )
        .unwrap();

        assert_eq!(changes.to_deploy.len(), 1);
        assert_eq!(
            changes.to_delete.get("ApexTrigger"),
            Some(&MemberSet::single("Old"))
        );
    }

    #[test]
    fn test_empty_document_is_empty_change_set() {
        let changes = change_set_from_descriptor("{}", &catalog()).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let message = reason(change_set_from_descriptor(
            r#"{"NotAType": ["Foo"]}"#,
            &catalog(),
        ));
        assert!(message.contains("NotAType"));
    }

    #[test]
    fn test_empty_member_list_is_rejected() {
        let message = reason(change_set_from_descriptor(
            r#"{"ApexClass": []}"#,
            &catalog(),
        ));
        assert!(message.contains("ApexClass"));
    }

    #[test]
    fn test_wildcard_on_unsupported_type_is_rejected() {
        let message = reason(change_set_from_descriptor(
            r#"{"Report": "*"}"#,
            &catalog(),
        ));
        assert!(message.contains("wildcard"));
    }

    #[test]
    fn test_invalid_shapes_are_rejected() {
        reason(change_set_from_descriptor("[1, 2]", &catalog()));
        reason(change_set_from_descriptor("not json", &catalog()));
        reason(change_set_from_descriptor(
            r#"{"deploy": ["ApexClass"]}"#,
            &catalog(),
        ));
        reason(change_set_from_descriptor(
            r#"{"ApexClass": 42}"#,
            &catalog(),
        ));
    }
}
