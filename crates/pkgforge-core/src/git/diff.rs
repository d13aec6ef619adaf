use std::path::{Path, PathBuf};

use git2::{Delta, DiffFindOptions, DiffOptions, Repository, Tree};

use crate::error::Result;
use crate::source::{DiffEntry, RevisionDiff};

/// Changed files between two revisions of a git repository.
///
/// Without a target revision the diff runs against the working tree and
/// index, untracked files included.
#[derive(Debug, Clone)]
pub struct GitRevisionDiff {
    repo_path: PathBuf,
    from: String,
    to: Option<String>,
}

impl GitRevisionDiff {
    pub fn new(repo_path: impl Into<PathBuf>, from: impl Into<String>) -> Self {
        Self {
            repo_path: repo_path.into(),
            from: from.into(),
            to: None,
        }
    }

    /// Compare against `rev` instead of the working tree.
    pub fn to(mut self, rev: impl Into<String>) -> Self {
        self.to = Some(rev.into());
        self
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }
}

impl RevisionDiff for GitRevisionDiff {
    fn entries(&self) -> Result<Vec<DiffEntry>> {
        let repo = Repository::open(&self.repo_path)?;
        let from_tree = peel_tree(&repo, &self.from)?;

        let mut diff_opts = DiffOptions::new();
        let mut diff = match &self.to {
            Some(to) => {
                let to_tree = peel_tree(&repo, to)?;
                repo.diff_tree_to_tree(Some(&from_tree), Some(&to_tree), Some(&mut diff_opts))?
            }
            None => {
                diff_opts
                    .include_untracked(true)
                    .recurse_untracked_dirs(true);
                repo.diff_tree_to_workdir_with_index(Some(&from_tree), Some(&mut diff_opts))?
            }
        };

        let mut find_opts = DiffFindOptions::new();
        find_opts.renames(true);
        diff.find_similar(Some(&mut find_opts))?;

        let mut entries = Vec::new();
        for delta in diff.deltas() {
            let old_path = delta.old_file().path().map(Path::to_path_buf);
            let new_path = delta.new_file().path().map(Path::to_path_buf);

            let entry = match (delta.status(), old_path, new_path) {
                (Delta::Added | Delta::Copied | Delta::Untracked, _, Some(path)) => {
                    DiffEntry::added(path)
                }
                (Delta::Modified | Delta::Typechange, _, Some(path)) => DiffEntry::modified(path),
                (Delta::Deleted, Some(path), _) => DiffEntry::deleted(path),
                (Delta::Renamed, Some(from), Some(to)) => DiffEntry::renamed(from, to),
                (status, old, new) => {
                    tracing::debug!(?status, ?old, ?new, "skipping diff delta");
                    continue;
                }
            };
            entries.push(entry);
        }

        tracing::debug!(
            from = %self.from,
            to = self.to.as_deref().unwrap_or("working tree"),
            changed = entries.len(),
            "computed revision diff"
        );
        Ok(entries)
    }
}

fn peel_tree<'r>(repo: &'r Repository, rev: &str) -> Result<Tree<'r>> {
    Ok(repo.revparse_single(rev)?.peel_to_tree()?)
}
