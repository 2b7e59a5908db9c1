//! Zettlr endpoint: one note per record, linked from a main note

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDateTime};
use revline_core::RecordArena;
use serde::{Deserialize, Serialize};

use super::{read_text, write_text};
use crate::block::{insert_items, pending_ids};
use crate::context::DataContext;
use crate::endpoint::{DataEndpoint, EndpointSettings};
use crate::matrix::SynthesisMatrix;

pub const CONFIG_FILE: &str = ".zettlr_config.toml";

const MAIN_TEMPLATE: &str = r#"---
title: "{{project_title}}"
---

# {{project_title}}

<!-- NEW_RECORD_SOURCE -->
"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ZettlrConfig {
    /// File name of the main note inside the endpoint directory.
    main: String,
}

pub struct ZettlrEndpoint {
    dir: PathBuf,
}

impl Default for ZettlrEndpoint {
    fn default() -> Self {
        Self::new(PathBuf::from("data/zettlr"))
    }
}

/// Hands out `%Y%m%d%H%M%S.md` names, stepping back a second whenever
/// the name is taken.
struct NoteNames<'a> {
    dir: &'a Path,
    cursor: NaiveDateTime,
}

impl NoteNames<'_> {
    fn next(&mut self) -> String {
        loop {
            let name = format!("{}.md", self.cursor.format("%Y%m%d%H%M%S"));
            self.cursor -= Duration::seconds(1);
            if !self.dir.join(&name).exists() {
                return name;
            }
        }
    }
}

fn record_note(id: &str) -> String {
    format!("---\ntitle: \"{id}\"\ntags: [synthesis]\n---\n\n@{id}\n")
}

/// `title` of the leading frontmatter block, unquoted.
fn note_title(text: &str) -> Option<&str> {
    let mut lines = text.lines();
    if lines.next()?.trim() != "---" {
        return None;
    }
    lines
        .take_while(|line| line.trim() != "---")
        .find_map(|line| line.trim().strip_prefix("title:"))
        .map(|value| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}

/// Record IDs that already have a note. The main note is not a record note.
fn noted_ids(dir: &Path, main: &str) -> Result<BTreeSet<String>> {
    let pattern = dir.join("*.md");
    let mut ids = BTreeSet::new();
    for entry in glob::glob(&pattern.to_string_lossy())? {
        let path = match entry {
            Ok(p) => p,
            Err(e) => {
                log::warn!("skipping unreadable note: {e}");
                continue;
            }
        };
        if path.file_name().is_some_and(|name| name == main) {
            continue;
        }
        if let Some(id) = note_title(&read_text(&path)?) {
            ids.insert(id.to_string());
        }
    }
    Ok(ids)
}

impl ZettlrEndpoint {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn read_config(dir: &Path) -> Result<Option<ZettlrConfig>> {
        let path = dir.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let config = toml::from_str(&read_text(&path)?)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(Some(config))
    }
}

impl DataEndpoint for ZettlrEndpoint {
    fn endpoint_id(&self) -> &str {
        "zettlr"
    }

    fn default_setup(&self) -> EndpointSettings {
        EndpointSettings::Zettlr {
            dir: self.dir.clone(),
        }
    }

    fn update(
        &self,
        ctx: &DataContext,
        _arena: &RecordArena,
        matrix: &SynthesisMatrix,
    ) -> Result<Vec<PathBuf>> {
        let dir = ctx.path(&self.dir);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let mut names = NoteNames {
            dir: &dir,
            cursor: Local::now().naive_local(),
        };
        let mut written = Vec::new();

        let main = match Self::read_config(&dir)? {
            Some(config) => config.main,
            None => {
                let main = names.next();
                let config = toml::to_string(&ZettlrConfig { main: main.clone() })?;
                write_text(&dir.join(CONFIG_FILE), &config)?;
                let note = MAIN_TEMPLATE.replace("{{project_title}}", &ctx.project.title);
                write_text(&dir.join(&main), &note)?;
                log::info!("created zettlr main note {main}");
                written.push(self.dir.join(CONFIG_FILE));
                written.push(self.dir.join(&main));
                main
            }
        };

        let noted = noted_ids(&dir, &main)?;
        let missing: Vec<String> = matrix
            .record_ids()
            .into_iter()
            .filter(|id| !noted.contains(id))
            .collect();
        if missing.is_empty() {
            log::info!("all records have a zettlr note");
            return Ok(written);
        }

        let mut items = Vec::with_capacity(missing.len());
        for id in &missing {
            let name = names.next();
            write_text(&dir.join(&name), &record_note(id))?;
            items.push(format!("- [[{name}]] @{id}"));
            written.push(self.dir.join(&name));
        }

        let main_path = dir.join(&main);
        let text = if main_path.is_file() {
            read_text(&main_path)?
        } else {
            String::new()
        };
        write_text(&main_path, &insert_items(&text, &items, &main))?;
        if !written.contains(&self.dir.join(&main)) {
            written.push(self.dir.join(&main));
        }
        log::info!("{} records added to zettlr", missing.len());
        Ok(written)
    }

    /// Eligible records that have a note and are no longer in the main
    /// note's to-synthesize block.
    fn completed_ids(&self, ctx: &DataContext, eligible: &[String]) -> Result<BTreeSet<String>> {
        let dir = ctx.path(&self.dir);
        let Some(config) = Self::read_config(&dir)? else {
            return Ok(BTreeSet::new());
        };
        let main_path = dir.join(&config.main);
        let pending: BTreeSet<String> = if main_path.is_file() {
            pending_ids(&read_text(&main_path)?).into_iter().collect()
        } else {
            BTreeSet::new()
        };
        let noted = noted_ids(&dir, &config.main)?;
        Ok(eligible
            .iter()
            .filter(|id| noted.contains(*id) && !pending.contains(*id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ProjectInfo;

    #[test]
    fn creates_main_note_and_record_notes() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = DataContext::new(dir.path(), ProjectInfo::default());
        let endpoint = ZettlrEndpoint::default();
        let ids = vec!["R1".to_string(), "R2".to_string()];
        let matrix = SynthesisMatrix::new(&ids, ["zettlr"]);

        assert!(endpoint.completed_ids(&ctx, &ids).unwrap().is_empty());
        let written = endpoint.update(&ctx, &RecordArena::new(), &matrix).unwrap();
        // config, main note, two record notes
        assert_eq!(written.len(), 4);

        let zettlr = dir.path().join("data/zettlr");
        let config: ZettlrConfig =
            toml::from_str(&std::fs::read_to_string(zettlr.join(CONFIG_FILE)).unwrap()).unwrap();
        let main = std::fs::read_to_string(zettlr.join(&config.main)).unwrap();
        assert_eq!(pending_ids(&main), vec!["R1", "R2"]);
        assert!(endpoint.completed_ids(&ctx, &ids).unwrap().is_empty());

        // Author works R1 into the text
        let edited: Vec<&str> = main.lines().filter(|l| !l.ends_with("@R1")).collect();
        std::fs::write(zettlr.join(&config.main), edited.join("\n")).unwrap();
        let done = endpoint.completed_ids(&ctx, &ids).unwrap();
        assert_eq!(done.into_iter().collect::<Vec<_>>(), vec!["R1"]);

        // Second run adds nothing
        let again = endpoint.update(&ctx, &RecordArena::new(), &matrix).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn main_note_title_is_not_a_record() {
        let dir = tempfile::tempdir().unwrap();
        let project = ProjectInfo {
            title: "R9".to_string(),
            ..ProjectInfo::default()
        };
        let ctx = DataContext::new(dir.path(), project);
        let endpoint = ZettlrEndpoint::default();
        let ids = vec!["R9".to_string()];
        let matrix = SynthesisMatrix::new(&ids, ["zettlr"]);

        // Main note carries `title: "R9"`; R9 still needs its own note
        let written = endpoint.update(&ctx, &RecordArena::new(), &matrix).unwrap();
        assert_eq!(written.len(), 3);
        let zettlr = dir.path().join("data/zettlr");
        let config: ZettlrConfig =
            toml::from_str(&std::fs::read_to_string(zettlr.join(CONFIG_FILE)).unwrap()).unwrap();
        assert_eq!(noted_ids(&zettlr, &config.main).unwrap().len(), 1);
    }

    #[test]
    fn record_note_frontmatter() {
        let note = record_note("R1");
        assert_eq!(note_title(&note), Some("R1"));
        assert!(note.contains("tags: [synthesis]"));
        assert_eq!(note_title("no frontmatter\ntitle: \"R1\"\n"), None);
        assert_eq!(note_title("---\nlayout: x\n---\ntitle: \"R1\"\n"), None);
    }
}
