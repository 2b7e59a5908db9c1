//! Dataset gateway: record collection file plus content-addressed history
//!
//! Directory layout:
//! ```text
//! {root}/
//! ├── settings.toml
//! ├── data/
//! │   ├── records.json          # active and retired records
//! │   ├── search/<source>.json  # raw search results
//! │   └── ...                   # endpoint artifacts
//! └── .revline/
//!     ├── objects/<blake3>      # file snapshots
//!     ├── commits/<id>.json     # commit manifests
//!     └── HEAD                  # id of the latest commit
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use revline_core::RecordArena;

use crate::hash;
use crate::manifest::CommitManifest;

pub const RECORDS_FILE: &str = "data/records.json";
pub const SETTINGS_FILE: &str = "settings.toml";
const META_DIR: &str = ".revline";

/// Summary of a created commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub id: String,
    pub message: String,
    pub changed: Vec<String>,
}

/// Integrity check result for one tracked file snapshot.
#[derive(Debug)]
pub struct VerifyResult {
    pub path: String,
    pub expected: String,
    pub actual: Option<String>,
}

impl VerifyResult {
    pub fn ok(&self) -> bool {
        self.actual.as_deref() == Some(self.expected.as_str())
    }
}

/// What the pipeline operations need from persistence.
pub trait DatasetGateway {
    fn load_records(&self) -> Result<RecordArena>;
    /// Persist the whole collection atomically and stage it.
    fn save_records(&mut self, arena: &RecordArena) -> Result<()>;
    /// Stage a file (absolute inside the root, or relative to it).
    fn add_change(&mut self, path: &Path) -> Result<()>;
    fn create_commit(&mut self, message: &str) -> Result<CommitInfo>;
    fn has_changes(&self) -> Result<bool>;
}

/// File-backed dataset rooted at a project directory.
pub struct Dataset {
    root: PathBuf,
    author: String,
    staged: BTreeSet<String>,
}

impl Dataset {
    /// Create the project layout (idempotent) and open it.
    pub fn init(root: &Path, author: &str) -> Result<Self> {
        for dir in ["data/search", ".revline/objects", ".revline/commits"] {
            let path = root.join(dir);
            fs::create_dir_all(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
        }
        let mut dataset = Self {
            root: root.to_path_buf(),
            author: author.to_string(),
            staged: BTreeSet::new(),
        };
        if !dataset.records_path().exists() {
            dataset.save_records(&RecordArena::new())?;
        }
        Ok(dataset)
    }

    /// Open an existing project.
    pub fn open(root: &Path, author: &str) -> Result<Self> {
        if !root.join(META_DIR).is_dir() {
            bail!(
                "{} is not a revline project (run `revline init` first)",
                root.display()
            );
        }
        Ok(Self {
            root: root.to_path_buf(),
            author: author.to_string(),
            staged: BTreeSet::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn records_path(&self) -> PathBuf {
        self.root.join(RECORDS_FILE)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    pub fn search_dir(&self) -> PathBuf {
        self.root.join("data/search")
    }

    fn objects_dir(&self) -> PathBuf {
        self.root.join(META_DIR).join("objects")
    }

    fn commits_dir(&self) -> PathBuf {
        self.root.join(META_DIR).join("commits")
    }

    fn head_path(&self) -> PathBuf {
        self.root.join(META_DIR).join("HEAD")
    }

    pub fn staged(&self) -> impl Iterator<Item = &str> {
        self.staged.iter().map(String::as_str)
    }

    /// ID of the latest commit, if any.
    pub fn head(&self) -> Result<Option<String>> {
        let path = self.head_path();
        if !path.exists() {
            return Ok(None);
        }
        let id = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let id = id.trim();
        Ok((!id.is_empty()).then(|| id.to_string()))
    }

    fn head_manifest(&self) -> Result<Option<CommitManifest>> {
        self.head()?
            .map(|id| CommitManifest::read_from(&self.commits_dir(), &id))
            .transpose()
    }

    /// Commits from HEAD back to the first one.
    pub fn log(&self) -> Result<Vec<CommitManifest>> {
        let mut commits = Vec::new();
        let mut next = self.head()?;
        while let Some(id) = next {
            let manifest = CommitManifest::read_from(&self.commits_dir(), &id)?;
            next = manifest.parent.clone();
            commits.push(manifest);
        }
        Ok(commits)
    }

    /// Check every snapshot referenced by HEAD against its recorded hash.
    pub fn verify(&self) -> Result<Vec<VerifyResult>> {
        let Some(manifest) = self.head_manifest()? else {
            return Ok(Vec::new());
        };
        let results = manifest
            .file_hashes
            .iter()
            .map(|(path, expected)| {
                let object = self.objects_dir().join(expected);
                let actual = hash::hash_file(&object)
                    .ok()
                    .map(|h| h.to_hex().to_string());
                VerifyResult {
                    path: path.clone(),
                    expected: expected.clone(),
                    actual,
                }
            })
            .collect();
        Ok(results)
    }

    /// Path relative to the root with `/` separators.
    fn relative(&self, path: &Path) -> Result<String> {
        let rel = if path.is_absolute() {
            path.strip_prefix(&self.root)
                .with_context(|| format!("{} is outside the project", path.display()))?
        } else {
            path
        };
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            bail!("{} is outside the project", path.display());
        }
        let parts: Vec<_> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Ok(parts.join("/"))
    }

    /// Copy a file into the object store under its hash.
    fn snapshot(&self, rel: &str) -> Result<String> {
        let path = self.root.join(rel);
        let digest = hash::hash_file(&path)
            .with_context(|| format!("failed to hash {}", path.display()))?
            .to_hex()
            .to_string();
        let object = self.objects_dir().join(&digest);
        if !object.exists() {
            let tmp = object.with_extension("tmp");
            fs::copy(&path, &tmp)
                .with_context(|| format!("failed to snapshot {}", path.display()))?;
            fs::rename(&tmp, &object)
                .with_context(|| format!("failed to store object {digest}"))?;
        }
        Ok(digest)
    }
}

impl DatasetGateway for Dataset {
    fn load_records(&self) -> Result<RecordArena> {
        let path = self.records_path();
        if !path.exists() {
            return Ok(RecordArena::new());
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let arena: RecordArena = serde_json::from_str(&json)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        log::debug!("loaded {} records from {}", arena.len(), path.display());
        Ok(arena)
    }

    fn save_records(&mut self, arena: &RecordArena) -> Result<()> {
        let path = self.records_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(arena).context("failed to serialize records")?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path).with_context(|| {
            format!("failed to rename {} → {}", tmp.display(), path.display())
        })?;
        self.staged.insert(RECORDS_FILE.to_string());
        Ok(())
    }

    fn add_change(&mut self, path: &Path) -> Result<()> {
        let rel = self.relative(path)?;
        if !self.root.join(&rel).is_file() {
            bail!("cannot stage {rel}: no such file");
        }
        self.staged.insert(rel);
        Ok(())
    }

    fn create_commit(&mut self, message: &str) -> Result<CommitInfo> {
        if self.staged.is_empty() {
            bail!("nothing staged to commit");
        }
        let parent = self.head_manifest()?;
        let mut file_hashes: BTreeMap<String, String> = parent
            .as_ref()
            .map(|m| m.file_hashes.clone())
            .unwrap_or_default();

        for rel in &self.staged {
            let digest = self.snapshot(rel)?;
            file_hashes.insert(rel.clone(), digest);
        }

        let created_at = Utc::now();
        let timestamp = created_at.to_rfc3339();
        let parent_id = parent.map(|m| m.id);
        let mut parts: Vec<&[u8]> = vec![
            message.as_bytes(),
            self.author.as_bytes(),
            timestamp.as_bytes(),
            parent_id.as_deref().unwrap_or("").as_bytes(),
        ];
        for (path, digest) in &file_hashes {
            parts.push(path.as_bytes());
            parts.push(digest.as_bytes());
        }
        let id = hash::short_hash(&hash::hash_parts(parts));

        let changed: Vec<String> = self.staged.iter().cloned().collect();
        let manifest = CommitManifest {
            id: id.clone(),
            message: message.to_string(),
            author: self.author.clone(),
            parent: parent_id,
            file_hashes,
            changed: changed.clone(),
            created_at,
        };
        manifest.write_to(&self.commits_dir())?;
        fs::write(self.head_path(), format!("{id}\n")).context("failed to update HEAD")?;
        self.staged.clear();

        log::info!("commit {id}: {message}");
        Ok(CommitInfo {
            id,
            message: message.to_string(),
            changed,
        })
    }

    fn has_changes(&self) -> Result<bool> {
        if !self.staged.is_empty() {
            return Ok(true);
        }
        let Some(manifest) = self.head_manifest()? else {
            return Ok(self.records_path().exists());
        };
        if !manifest.file_hashes.contains_key(RECORDS_FILE) && self.records_path().exists() {
            return Ok(true);
        }
        for (rel, expected) in &manifest.file_hashes {
            let path = self.root.join(rel);
            match hash::hash_file(&path) {
                Ok(h) if h.to_hex().as_str() == expected.as_str() => {}
                _ => return Ok(true),
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revline_core::{Record, RecordState};

    fn dataset() -> (tempfile::TempDir, Dataset) {
        let dir = tempfile::tempdir().unwrap();
        let ds = Dataset::init(dir.path(), "Reviewer").unwrap();
        (dir, ds)
    }

    #[test]
    fn init_creates_layout_and_empty_collection() {
        let (dir, ds) = dataset();
        assert!(dir.path().join(".revline/objects").is_dir());
        assert!(dir.path().join("data/search").is_dir());
        assert!(ds.load_records().unwrap().is_empty());
        assert_eq!(ds.staged().collect::<Vec<_>>(), vec![RECORDS_FILE]);
    }

    #[test]
    fn open_requires_project() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Dataset::open(dir.path(), "x").is_err());
    }

    #[test]
    fn commit_with_nothing_staged_fails() {
        let (_dir, mut ds) = dataset();
        ds.create_commit("Init").unwrap();
        assert!(ds.create_commit("again").is_err());
    }

    #[test]
    fn commit_chain_and_has_changes() {
        let (_dir, mut ds) = dataset();
        let first = ds.create_commit("Init").unwrap();
        assert!(!ds.has_changes().unwrap());

        let mut arena = ds.load_records().unwrap();
        arena
            .insert(Record::new("R1", RecordState::MdImported))
            .unwrap();
        ds.save_records(&arena).unwrap();
        assert!(ds.has_changes().unwrap());
        let second = ds.create_commit("Import").unwrap();

        let log = ds.log().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].id, second.id);
        assert_eq!(log[0].parent.as_deref(), Some(first.id.as_str()));
        assert!(ds.verify().unwrap().iter().all(VerifyResult::ok));
    }

    #[test]
    fn edited_tracked_file_is_a_change() {
        let (dir, mut ds) = dataset();
        std::fs::write(dir.path().join("data/paper.md"), "# Paper\n").unwrap();
        ds.add_change(Path::new("data/paper.md")).unwrap();
        ds.create_commit("Add paper").unwrap();
        assert!(!ds.has_changes().unwrap());

        std::fs::write(dir.path().join("data/paper.md"), "# Paper\n\nedited\n").unwrap();
        assert!(ds.has_changes().unwrap());
    }

    #[test]
    fn add_change_rejects_outside_or_missing() {
        let (_dir, mut ds) = dataset();
        assert!(ds.add_change(Path::new("../escape.txt")).is_err());
        assert!(ds.add_change(Path::new("data/missing.csv")).is_err());
        assert!(ds.add_change(Path::new("/etc/hosts")).is_err());
    }

    #[test]
    fn records_roundtrip_losslessly() {
        let (_dir, mut ds) = dataset();
        let mut arena = RecordArena::new();
        let mut r = Record::new("R1", RecordState::MdPrepared)
            .with_field("title", "Digital Work")
            .with_origin("a.json/1");
        r.add_masterdata_provenance_note("year", "year-format");
        r.set_status(RecordState::MdProcessed).unwrap();
        arena.insert(r).unwrap();
        arena
            .insert(Record::new("R2", RecordState::MdPrepared).with_origin("b.json/1"))
            .unwrap();
        arena.merge_into("R1", "R2", true).unwrap();

        ds.save_records(&arena).unwrap();
        assert_eq!(ds.load_records().unwrap(), arena);
        assert!(!ds.records_path().with_extension("json.tmp").exists());
    }
}
