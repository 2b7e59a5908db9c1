//! Manuscript endpoint: a markdown paper citing every included record

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use revline_core::RecordArena;

use super::{read_text, write_text};
use crate::block::{cited_ids, insert_items, pending_ids};
use crate::context::DataContext;
use crate::endpoint::{DataEndpoint, EndpointSettings};
use crate::matrix::SynthesisMatrix;

const TEMPLATE: &str = r#"---
title: "{{project_title}}"
author: "{{author}}"
---

# Introduction

# Methods

This {{review_type}} follows a structured search, screening and synthesis procedure.

# Results

<!-- NEW_RECORD_SOURCE -->

# Discussion

# References
"#;

pub struct ManuscriptEndpoint {
    paper: PathBuf,
}

impl Default for ManuscriptEndpoint {
    fn default() -> Self {
        Self::new(PathBuf::from("data/paper.md"))
    }
}

impl ManuscriptEndpoint {
    pub fn new(paper: PathBuf) -> Self {
        Self { paper }
    }

    fn render_template(ctx: &DataContext) -> String {
        TEMPLATE
            .replace("{{project_title}}", &ctx.project.title)
            .replace("{{author}}", &ctx.author_line())
            .replace("{{review_type}}", &ctx.project.review_type)
    }
}

impl DataEndpoint for ManuscriptEndpoint {
    fn endpoint_id(&self) -> &str {
        "manuscript"
    }

    fn default_setup(&self) -> EndpointSettings {
        EndpointSettings::Manuscript {
            paper: self.paper.clone(),
        }
    }

    fn update(
        &self,
        ctx: &DataContext,
        _arena: &RecordArena,
        matrix: &SynthesisMatrix,
    ) -> Result<Vec<PathBuf>> {
        let path = ctx.path(&self.paper);
        let (text, created) = if path.is_file() {
            (read_text(&path)?, false)
        } else {
            log::info!("creating manuscript {}", self.paper.display());
            log::info!("please update title and authors in {}", self.paper.display());
            (Self::render_template(ctx), true)
        };

        let cited = cited_ids(&text);
        let missing: Vec<String> = matrix
            .record_ids()
            .into_iter()
            .filter(|id| !cited.contains(id))
            .collect();

        if missing.is_empty() && !created {
            log::info!("all records included in {}", self.paper.display());
            return Ok(Vec::new());
        }

        let file_name = self.paper.display().to_string();
        let items: Vec<String> = missing.iter().map(|id| format!("- @{id}")).collect();
        let text = if items.is_empty() {
            text
        } else {
            insert_items(&text, &items, &file_name)
        };
        write_text(&path, &text)?;
        for id in &missing {
            log::debug!("{id} added to {file_name}");
        }
        log::info!("{} records added to {file_name}", missing.len());
        Ok(vec![self.paper.clone()])
    }

    /// Eligible records no longer listed in the to-synthesize block.
    fn completed_ids(&self, ctx: &DataContext, eligible: &[String]) -> Result<BTreeSet<String>> {
        let path = ctx.path(&self.paper);
        if !path.is_file() {
            return Ok(BTreeSet::new());
        }
        let pending: BTreeSet<String> = pending_ids(&read_text(&path)?).into_iter().collect();
        Ok(eligible
            .iter()
            .filter(|id| !pending.contains(*id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ProjectInfo;

    fn ctx(root: &std::path::Path) -> DataContext {
        DataContext::new(
            root,
            ProjectInfo {
                title: "Platform work".into(),
                review_type: "scoping review".into(),
                authors: vec!["A. Author".into(), "B. Author".into()],
            },
        )
    }

    #[test]
    fn creates_paper_and_lists_new_records() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());
        let endpoint = ManuscriptEndpoint::default();
        let ids = vec!["R1".to_string(), "R2".to_string()];
        let matrix = SynthesisMatrix::new(&ids, ["manuscript"]);

        assert!(endpoint.completed_ids(&ctx, &ids).unwrap().is_empty());
        let written = endpoint.update(&ctx, &RecordArena::new(), &matrix).unwrap();
        assert_eq!(written, vec![PathBuf::from("data/paper.md")]);

        let text = std::fs::read_to_string(dir.path().join("data/paper.md")).unwrap();
        assert!(text.contains("title: \"Platform work\""));
        assert!(text.contains("A. Author, B. Author"));
        assert!(text.contains("This scoping review"));
        assert_eq!(pending_ids(&text), vec!["R1", "R2"]);
        assert!(endpoint.completed_ids(&ctx, &ids).unwrap().is_empty());

        // Nothing new: untouched
        let again = endpoint.update(&ctx, &RecordArena::new(), &matrix).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn record_moved_out_of_block_is_complete() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(
            dir.path().join("data/paper.md"),
            "# Results\n\nAs @R1 shows.\n\n<!-- NEW_RECORD_SOURCE -->\n\n- @R2\n",
        )
        .unwrap();
        let ids = vec!["R1".to_string(), "R2".to_string()];
        let done = ManuscriptEndpoint::default().completed_ids(&ctx, &ids).unwrap();
        assert_eq!(done.into_iter().collect::<Vec<_>>(), vec!["R1"]);
    }
}
