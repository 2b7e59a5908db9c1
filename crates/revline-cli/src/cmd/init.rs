//! `revline init` - create a review project

use std::path::Path;

use anyhow::{bail, Result};
use clap::Args;
use revline_data::ProjectInfo;
use revline_store::{Dataset, DatasetGateway};

use crate::config::Config;
use crate::settings::ProjectSettings;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project title
    #[arg(long, default_value = "Literature review")]
    pub title: String,

    /// Review type (e.g. "scoping review", "meta-analysis")
    #[arg(long, default_value = "literature review")]
    pub review_type: String,

    /// Authors, repeatable
    #[arg(long = "author")]
    pub authors: Vec<String>,
}

pub fn run(args: InitArgs, dir: &Path, config: &Config) -> Result<()> {
    let mut dataset = Dataset::init(dir, &config.author())?;
    if dataset.head()?.is_some() {
        bail!("{} is already a revline project", dir.display());
    }

    let settings_path = dataset.settings_path();
    if !settings_path.exists() {
        let settings = ProjectSettings::new_project(ProjectInfo {
            title: args.title,
            review_type: args.review_type,
            authors: args.authors,
        });
        settings.save(&settings_path)?;
    }
    dataset.add_change(&settings_path)?;
    let records = dataset.records_path();
    dataset.add_change(&records)?;
    let commit = dataset.create_commit("Initial commit")?;

    eprintln!("Initialized review project in {} ({})", dir.display(), commit.id);
    eprintln!("Place search results in {} and run `revline import`", dataset.search_dir().display());
    Ok(())
}
