//! Error types for manifest derivation.

use std::path::PathBuf;

/// Fatal conditions raised while deriving or merging manifests.
///
/// Every variant names the offending type, path or source so callers can
/// present an actionable message. Non-fatal diagnostics (ambiguous ignore
/// rules, unresolved wildcards) are reported as warnings instead.
#[derive(Debug, thiserror::Error)]
pub enum DeriveError {
    #[error("unknown component type '{type_name}' in {source_label}")]
    UnknownType {
        type_name: String,
        source_label: String,
    },

    #[error("malformed descriptor: {reason}")]
    MalformedDescriptor { reason: String },

    #[error("manifest merge needs at least two sources, found {found}")]
    InsufficientSources { found: usize },

    #[error("malformed manifest {origin}: {reason}")]
    MalformedManifest { origin: String, reason: String },

    #[error("invalid ignore rules: {reason}")]
    InvalidIgnoreRules { reason: String },

    #[error("invalid type catalog: {reason}")]
    Catalog { reason: String },

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Git(#[from] git2::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl DeriveError {
    pub(crate) fn malformed_descriptor(reason: impl Into<String>) -> Self {
        Self::MalformedDescriptor {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_manifest(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedManifest {
            origin: origin.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeriveError>;
