pub mod data;
pub mod dedupe;
pub mod history;
pub mod import;
pub mod init;
pub mod pdfs;
pub mod prep;
pub mod prescreen;
pub mod screen;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::Result;
use revline_core::RecordArena;
use revline_store::{CommitInfo, Dataset, DatasetGateway};

use crate::config::Config;
use crate::settings::ProjectSettings;

/// An opened project: dataset gateway plus its settings.
pub struct Project {
    pub dataset: Dataset,
    pub settings: ProjectSettings,
}

impl Project {
    pub fn open(dir: &Path, config: &Config) -> Result<Self> {
        let dataset = Dataset::open(dir, &config.author())?;
        let settings = ProjectSettings::from_file(&dataset.settings_path())?;
        Ok(Self { dataset, settings })
    }

    pub fn root(&self) -> &Path {
        self.dataset.root()
    }

    pub fn load_records(&self) -> Result<RecordArena> {
        self.dataset.load_records()
    }

    /// Persist `arena` (when given), stage `paths` and commit.
    pub fn commit(
        &mut self,
        arena: Option<&RecordArena>,
        paths: &[PathBuf],
        message: &str,
    ) -> Result<CommitInfo> {
        if let Some(arena) = arena {
            self.dataset.save_records(arena)?;
        }
        for path in paths {
            self.dataset.add_change(path)?;
        }
        self.dataset.create_commit(message)
    }

    /// Write settings.toml and stage it.
    pub fn save_settings(&mut self) -> Result<()> {
        let path = self.dataset.settings_path();
        self.settings.save(&path)?;
        self.dataset.add_change(&path)
    }
}
