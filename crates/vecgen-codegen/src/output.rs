//! Output set and commit
//!
//! Everything a run produces is collected in memory first. Committing writes
//! the set into a staging directory inside the output directory and then
//! renames each file into place, so a failed render never leaves a partial
//! mix of old and new files behind.

use crate::emitter::GeneratedArtifact;
use crate::error::{GenError, Result};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const STAGING_PREFIX: &str = ".vecgen-staging-";

/// Rendered files keyed by file name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSet {
    files: BTreeMap<String, String>,
}

/// Summary of a committed output set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub directory: PathBuf,
    pub written: usize,
    pub digest: String,
}

impl OutputSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artifact; two artifacts may never share a file name
    pub fn insert(&mut self, artifact: GeneratedArtifact) -> Result<()> {
        if self.files.contains_key(&artifact.file_name) {
            return Err(GenError::DuplicateOutput(artifact.file_name));
        }
        self.files.insert(artifact.file_name, artifact.contents);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.files.get(file_name).map(String::as_str)
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.files.contains_key(file_name)
    }

    /// File names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files
            .iter()
            .map(|(name, contents)| (name.as_str(), contents.as_str()))
    }

    /// SHA-256 over every file name and its contents, in name order
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for (name, contents) in &self.files {
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
            hasher.update(contents.as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }

    /// Write every file into `output_dir`, creating it if needed
    pub fn commit(&self, output_dir: &Path) -> Result<CommitReport> {
        fs::create_dir_all(output_dir).map_err(|e| GenError::write(output_dir, e))?;

        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(output_dir)
            .map_err(|e| GenError::write(output_dir, e))?;
        debug!("Staging output in {:?}", staging.path());

        for (name, contents) in &self.files {
            let path = staging.path().join(name);
            fs::write(&path, contents).map_err(|e| GenError::write(&path, e))?;
        }

        for name in self.files.keys() {
            let target = output_dir.join(name);
            fs::rename(staging.path().join(name), &target)
                .map_err(|e| GenError::write(&target, e))?;
        }
        staging
            .close()
            .map_err(|e| GenError::write(output_dir, e))?;

        let report = CommitReport {
            directory: output_dir.to_path_buf(),
            written: self.files.len(),
            digest: self.digest(),
        };
        info!("Wrote {} files to {:?}", report.written, report.directory);
        Ok(report)
    }

    /// Files in `output_dir` that are missing or differ from this set
    pub fn stale_files(&self, output_dir: &Path) -> Vec<String> {
        self.files
            .iter()
            .filter(|(name, contents)| {
                fs::read_to_string(output_dir.join(name.as_str()))
                    .map(|existing| existing != **contents)
                    .unwrap_or(true)
            })
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn artifact(name: &str, contents: &str) -> GeneratedArtifact {
        GeneratedArtifact {
            file_name: name.to_string(),
            contents: contents.to_string(),
        }
    }

    fn sample() -> OutputSet {
        let mut set = OutputSet::new();
        set.insert(artifact("VectorF.h", "header")).unwrap();
        set.insert(artifact("VectorF.cpp", "source")).unwrap();
        set
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut set = sample();
        let err = set.insert(artifact("VectorF.h", "other")).unwrap_err();
        assert!(matches!(err, GenError::DuplicateOutput(ref name) if name == "VectorF.h"));
        assert_eq!(set.get("VectorF.h"), Some("header"));
    }

    #[test]
    fn test_digest_tracks_content() {
        let a = sample();
        let b = sample();
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);

        let mut c = OutputSet::new();
        c.insert(artifact("VectorF.h", "header!")).unwrap();
        c.insert(artifact("VectorF.cpp", "source")).unwrap();
        assert_ne!(a.digest(), c.digest());
    }

    #[test]
    fn test_commit_writes_and_cleans_staging() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("NewVectors");
        let set = sample();

        let report = set.commit(&out).unwrap();
        assert_eq!(report.written, 2);
        assert_eq!(report.digest, set.digest());
        assert_eq!(fs::read_to_string(out.join("VectorF.cpp")).unwrap(), "source");

        let leftovers: Vec<_> = fs::read_dir(&out)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(STAGING_PREFIX))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_commit_overwrites_and_keeps_unrelated() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("VectorF.h"), "stale").unwrap();
        fs::write(dir.path().join("notes.txt"), "mine").unwrap();

        sample().commit(dir.path()).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("VectorF.h")).unwrap(), "header");
        assert_eq!(fs::read_to_string(dir.path().join("notes.txt")).unwrap(), "mine");
    }

    #[test]
    fn test_stale_files() {
        let dir = TempDir::new().unwrap();
        let set = sample();
        assert_eq!(set.stale_files(dir.path()).len(), 2);

        set.commit(dir.path()).unwrap();
        assert!(set.stale_files(dir.path()).is_empty());

        fs::write(dir.path().join("VectorF.cpp"), "edited").unwrap();
        assert_eq!(set.stale_files(dir.path()), vec!["VectorF.cpp".to_string()]);
    }
}
