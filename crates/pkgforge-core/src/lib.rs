//! Pkgforge Core Library
//!
//! Derives deployment manifests (a package of components to deploy plus an
//! optional destructive-changes list) from a git diff, JSON descriptors or
//! existing manifests.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod derive;
pub mod error;
pub mod git;
pub mod ignore;
pub mod manifest;
pub mod output;
pub mod source;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Components
    pub use crate::types::{ChangeSet, DestructiveOrder, MemberSet, TypeMap, WILDCARD};

    // Catalog
    pub use crate::catalog::{ComponentRef, StaticCatalog, TypeCatalog, TypeDefinition};

    // Sources
    pub use crate::git::GitRevisionDiff;
    pub use crate::source::{DiffEntry, ManifestRole, ManifestSource, RevisionDiff};

    // Pipeline
    pub use crate::aggregate::{Aggregation, aggregate};
    pub use crate::derive::{DerivationResult, DeriveOptions, Deriver, OrderController};
    pub use crate::ignore::{AmbiguousIgnore, IgnoreRule, IgnoreRules, filter};
    pub use crate::manifest::{Manifest, MergeMode, merge, serialize};

    // Configuration and output
    pub use crate::config::{ConfigStore, PkgforgeConfig, Settings};
    pub use crate::output::ManifestWriter;

    pub use crate::error::{DeriveError, Result};
}
