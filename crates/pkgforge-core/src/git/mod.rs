//! Git-backed revision diffs.
//!
//! Reads the files changed between two revisions of a repository, or between
//! a revision and the working tree, for the revision-diff change source.

mod diff;

pub use diff::GitRevisionDiff;
