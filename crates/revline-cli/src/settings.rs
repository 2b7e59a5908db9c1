//! Project settings: settings.toml at the project root

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use revline_data::{DataSettings, EndpointSettings, ProjectInfo};
use revline_dedupe::DedupeSettings;
use revline_prescreen::PrescreenSettings;
use revline_screen::{PdfSettings, ScreenSettings};
use serde::{Deserialize, Serialize};

/// A search whose results live in `data/search/<filename>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSettings {
    pub filename: PathBuf,
    /// Query or description of the search, for the methods section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub project: ProjectInfo,
    pub sources: Vec<SourceSettings>,
    pub dedupe: DedupeSettings,
    pub prescreen: PrescreenSettings,
    pub pdfs: PdfSettings,
    pub screen: ScreenSettings,
    pub data: DataSettings,
}

impl ProjectSettings {
    /// Settings for a fresh project: manuscript and PRISMA endpoints.
    pub fn new_project(project: ProjectInfo) -> Self {
        let endpoints = ["manuscript", "prisma"]
            .into_iter()
            .filter_map(EndpointSettings::defaults)
            .collect();
        Self {
            project,
            data: DataSettings { endpoints },
            ..Self::default()
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("{} not found, using default settings", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse settings: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("failed to serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write settings: {}", path.display()))
    }

    pub fn has_source(&self, filename: &Path) -> bool {
        self.sources.iter().any(|s| s.filename == filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revline_dedupe::DedupeScope;

    #[test]
    fn new_project_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let mut settings = ProjectSettings::new_project(ProjectInfo {
            title: "Platform work".into(),
            ..ProjectInfo::default()
        });
        settings.sources.push(SourceSettings {
            filename: PathBuf::from("crossref.json"),
            search: Some("platform AND work".into()),
        });
        settings.prescreen.scope.time_from = Some(2010);
        settings
            .screen
            .criteria
            .insert("empirical".into(), Default::default());
        settings.save(&path).unwrap();

        let loaded = ProjectSettings::from_file(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.data.endpoints.len(), 2);
        assert!(loaded.has_source(Path::new("crossref.json")));
    }

    #[test]
    fn partial_file_uses_defaults() {
        let settings: ProjectSettings = toml::from_str(
            r#"
            [project]
            title = "Digital work"

            [dedupe]
            scope = "not_processed"
            preferred_sources = ["crossref.json"]

            [pdfs]
            dir = "pdfs"
            "#,
        )
        .unwrap();
        assert_eq!(settings.project.title, "Digital work");
        assert_eq!(settings.dedupe.scope, DedupeScope::NotProcessed);
        assert_eq!(settings.dedupe.max_candidates, 20);
        assert!(settings.data.endpoints.is_empty());
        assert!(settings.prescreen.export_todos_only);
        assert_eq!(settings.pdfs.dir, PathBuf::from("pdfs"));
        assert!(settings.screen.criteria.is_empty());
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ProjectSettings::from_file(&dir.path().join("settings.toml")).unwrap();
        assert_eq!(settings, ProjectSettings::default());
    }
}
