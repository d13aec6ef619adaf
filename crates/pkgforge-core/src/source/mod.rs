//! Change source adapters
//!
//! Each adapter normalizes one kind of input into the pipeline's shared
//! representation:
//! - `revision`: changed files between two revisions, resolved through the catalog
//! - `descriptor`: a JSON document listing components per type
//! - `manifests`: existing manifests, which go straight to the merger

pub mod descriptor;
pub mod manifests;
pub mod revision;

pub use descriptor::{change_set_from_descriptor, load_descriptor};
pub use manifests::{ManifestRole, ManifestSource, load_manifest_sources};
pub use revision::{ChangeKind, DiffEntry, RevisionDiff, change_set_from_diff};
