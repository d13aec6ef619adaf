//! Writing derived manifests to disk.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::derive::DerivationResult;

/// Writes a [`DerivationResult`] into an output directory.
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    output_dir: PathBuf,
}

impl ManifestWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write every manifest in the result and return the written paths.
    ///
    /// When the result carries a destructive manifest, a file left in the
    /// other placement is removed so the two never coexist. Nothing else in
    /// the directory is touched.
    pub fn write(&self, result: &DerivationResult) -> anyhow::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                self.output_dir.display()
            )
        })?;

        let outputs = result.outputs();
        let mut written = Vec::with_capacity(outputs.len());
        for (file_name, manifest) in &outputs {
            let path = self.output_dir.join(file_name);
            std::fs::write(&path, manifest.to_xml())
                .with_context(|| format!("Failed to write manifest: {}", path.display()))?;
            tracing::info!(path = %path.display(), types = manifest.types.len(), "wrote manifest");
            written.push(path);
        }

        if let Some((order, _)) = result.destructive() {
            let stale = self.output_dir.join(order.opposite().file_name());
            if stale.exists() {
                std::fs::remove_file(&stale).with_context(|| {
                    format!("Failed to remove stale manifest: {}", stale.display())
                })?;
                tracing::info!(path = %stale.display(), "removed other destructive placement");
            }
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::OrderController;
    use crate::manifest::Manifest;
    use crate::types::{DestructiveOrder, MemberSet, TypeMap};
    use tempfile::TempDir;

    fn destructive() -> Manifest {
        let mut types = TypeMap::new();
        types.insert("ApexClass".to_string(), MemberSet::single("Old"));
        Manifest::new("58.0", types)
    }

    #[test]
    fn test_write_creates_directory_and_files() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("manifest");
        let result = OrderController::default().place(
            Some(Manifest::empty("58.0")),
            Some(destructive()),
            Vec::new(),
        );

        let written = ManifestWriter::new(&out).write(&result).unwrap();

        assert_eq!(written.len(), 2);
        assert!(out.join("package.xml").exists());
        assert!(out.join("destructiveChangesPost.xml").exists());
    }

    #[test]
    fn test_write_removes_other_placement() {
        let temp = TempDir::new().unwrap();
        let writer = ManifestWriter::new(temp.path());

        let after = OrderController::new(DestructiveOrder::After).place(
            Some(Manifest::empty("58.0")),
            Some(destructive()),
            Vec::new(),
        );
        writer.write(&after).unwrap();

        let before = OrderController::new(DestructiveOrder::Before).place(
            Some(Manifest::empty("58.0")),
            Some(destructive()),
            Vec::new(),
        );
        writer.write(&before).unwrap();

        assert!(temp.path().join("destructiveChanges.xml").exists());
        assert!(!temp.path().join("destructiveChangesPost.xml").exists());
    }

    #[test]
    fn test_write_keeps_existing_package_without_deploy_output() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("package.xml"), "USER PACKAGE").unwrap();

        let result = OrderController::default().place(None, Some(destructive()), Vec::new());
        let written = ManifestWriter::new(temp.path()).write(&result).unwrap();

        assert_eq!(written, vec![temp.path().join("destructiveChangesPost.xml")]);
        assert_eq!(
            std::fs::read_to_string(temp.path().join("package.xml")).unwrap(),
            "USER PACKAGE"
        );
    }

    #[test]
    fn test_write_without_destructive_leaves_destructive_files() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("destructiveChanges.xml"), "USER DESTRUCTIVE").unwrap();

        let result = OrderController::default().place(
            Some(Manifest::empty("58.0")),
            None,
            Vec::new(),
        );
        ManifestWriter::new(temp.path()).write(&result).unwrap();

        assert!(temp.path().join("package.xml").exists());
        assert!(temp.path().join("destructiveChanges.xml").exists());
    }
}
