//! Commit manifest: message, author, parent and tracked file hashes

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One commit of the dataset history, stored as `.revline/commits/<id>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitManifest {
    /// Short blake3 hash identifying the commit.
    pub id: String,
    pub message: String,
    pub author: String,
    pub parent: Option<String>,
    /// Every tracked file (path relative to the project root) → full hex hash
    /// of its snapshot under `.revline/objects/`.
    pub file_hashes: BTreeMap<String, String>,
    /// Paths staged for this commit.
    pub changed: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl CommitManifest {
    pub fn write_to(&self, commits_dir: &Path) -> Result<()> {
        let path = commits_dir.join(format!("{}.json", self.id));
        let json = serde_json::to_string_pretty(self).context("failed to serialize commit")?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn read_from(commits_dir: &Path, id: &str) -> Result<Self> {
        let path = commits_dir.join(format!("{id}.json"));
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("failed to parse commit {id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> CommitManifest {
        CommitManifest {
            id: "0badc0de".into(),
            message: "Merge duplicate records".into(),
            author: "Reviewer <r@example.org>".into(),
            parent: None,
            file_hashes: BTreeMap::from([("data/records.json".into(), "ab".repeat(32))]),
            changed: vec!["data/records.json".into()],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let m = manifest();
        m.write_to(dir.path()).unwrap();
        assert_eq!(CommitManifest::read_from(dir.path(), &m.id).unwrap(), m);
    }

    #[test]
    fn read_missing_or_corrupt_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CommitManifest::read_from(dir.path(), "deadbeef").is_err());
        std::fs::write(dir.path().join("deadbeef.json"), b"{not json").unwrap();
        assert!(CommitManifest::read_from(dir.path(), "deadbeef").is_err());
    }
}
