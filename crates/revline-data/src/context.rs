use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// `[project]` section of settings.toml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectInfo {
    pub title: String,
    pub review_type: String,
    pub authors: Vec<String>,
}

impl Default for ProjectInfo {
    fn default() -> Self {
        Self {
            title: "Literature review".to_string(),
            review_type: "literature review".to_string(),
            authors: Vec::new(),
        }
    }
}

/// What endpoints need to know about the project they write into.
#[derive(Debug, Clone)]
pub struct DataContext {
    pub root: PathBuf,
    pub project: ProjectInfo,
}

impl DataContext {
    pub fn new(root: impl Into<PathBuf>, project: ProjectInfo) -> Self {
        Self {
            root: root.into(),
            project,
        }
    }

    /// Absolute path of a project-relative path.
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    pub fn author_line(&self) -> String {
        if self.project.authors.is_empty() {
            "Author".to_string()
        } else {
            self.project.authors.join(", ")
        }
    }
}
