//! Data endpoint contract and endpoint selection from settings

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{bail, Result};
use revline_core::RecordArena;
use serde::{Deserialize, Serialize};

use crate::context::DataContext;
use crate::endpoints::{ManuscriptEndpoint, PrismaEndpoint, StructuredEndpoint, ZettlrEndpoint};
use crate::matrix::SynthesisMatrix;

/// A synthesis artifact that records are written into and that reports
/// which records it has finished.
pub trait DataEndpoint {
    /// Column of this endpoint in the status matrix.
    fn endpoint_id(&self) -> &str;

    /// Settings written when the endpoint is added to a project.
    fn default_setup(&self) -> EndpointSettings;

    /// Bring the artifact up to date with the eligible records. Returns the
    /// project-relative paths written.
    fn update(
        &self,
        ctx: &DataContext,
        arena: &RecordArena,
        matrix: &SynthesisMatrix,
    ) -> Result<Vec<PathBuf>>;

    /// IDs among `eligible` the artifact reports as done. A missing
    /// artifact completes nothing.
    fn completed_ids(&self, ctx: &DataContext, eligible: &[String]) -> Result<BTreeSet<String>>;

    fn update_status_matrix(
        &self,
        ctx: &DataContext,
        matrix: &mut SynthesisMatrix,
        endpoint_id: &str,
    ) -> Result<()> {
        let eligible = matrix.record_ids();
        for id in self.completed_ids(ctx, &eligible)? {
            if !matrix.mark(&id, endpoint_id) {
                log::warn!("{endpoint_id}: {id} is not eligible for synthesis");
            }
        }
        Ok(())
    }
}

fn default_paper_path() -> PathBuf {
    PathBuf::from("data/paper.md")
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/data.csv")
}

fn default_prisma_path() -> PathBuf {
    PathBuf::from("data/PRISMA.csv")
}

fn default_zettlr_dir() -> PathBuf {
    PathBuf::from("data/zettlr")
}

/// One `[[data.endpoints]]` entry, tagged by `endpoint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "endpoint", rename_all = "snake_case")]
pub enum EndpointSettings {
    Manuscript {
        #[serde(default = "default_paper_path")]
        paper: PathBuf,
    },
    Structured {
        #[serde(default = "default_data_path")]
        data: PathBuf,
        /// Coding columns next to `ID`.
        #[serde(default)]
        fields: Vec<String>,
    },
    Prisma {
        #[serde(default = "default_prisma_path")]
        path: PathBuf,
    },
    Zettlr {
        #[serde(default = "default_zettlr_dir")]
        dir: PathBuf,
    },
}

impl EndpointSettings {
    pub const KINDS: [&'static str; 4] = ["manuscript", "structured", "prisma", "zettlr"];

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Manuscript { .. } => "manuscript",
            Self::Structured { .. } => "structured",
            Self::Prisma { .. } => "prisma",
            Self::Zettlr { .. } => "zettlr",
        }
    }

    /// Default setup of the endpoint named `kind`.
    pub fn defaults(kind: &str) -> Option<Self> {
        let endpoint: Box<dyn DataEndpoint> = match kind {
            "manuscript" => Box::new(ManuscriptEndpoint::default()),
            "structured" => Box::new(StructuredEndpoint::default()),
            "prisma" => Box::new(PrismaEndpoint::default()),
            "zettlr" => Box::new(ZettlrEndpoint::default()),
            _ => return None,
        };
        Some(endpoint.default_setup())
    }

    pub fn build(&self) -> Box<dyn DataEndpoint> {
        match self {
            Self::Manuscript { paper } => Box::new(ManuscriptEndpoint::new(paper.clone())),
            Self::Structured { data, fields } => {
                Box::new(StructuredEndpoint::new(data.clone(), fields.clone()))
            }
            Self::Prisma { path } => Box::new(PrismaEndpoint::new(path.clone())),
            Self::Zettlr { dir } => Box::new(ZettlrEndpoint::new(dir.clone())),
        }
    }
}

/// `[data]` section of settings.toml.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub endpoints: Vec<EndpointSettings>,
}

impl DataSettings {
    /// Instantiate the configured endpoints. Each kind may appear once, as
    /// the kind is the endpoint's matrix column.
    pub fn build_endpoints(&self) -> Result<Vec<Box<dyn DataEndpoint>>> {
        let mut seen = BTreeSet::new();
        let mut endpoints = Vec::with_capacity(self.endpoints.len());
        for settings in &self.endpoints {
            if !seen.insert(settings.kind()) {
                bail!("data endpoint {} configured more than once", settings.kind());
            }
            endpoints.push(settings.build());
        }
        Ok(endpoints)
    }

    pub fn has(&self, kind: &str) -> bool {
        self.endpoints.iter().any(|e| e.kind() == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_from_toml() {
        let settings: DataSettings = toml::from_str(
            r#"
            [[endpoints]]
            endpoint = "manuscript"

            [[endpoints]]
            endpoint = "structured"
            fields = ["contribution", "method"]
            "#,
        )
        .unwrap();
        assert_eq!(
            settings.endpoints[0],
            EndpointSettings::Manuscript {
                paper: PathBuf::from("data/paper.md")
            }
        );
        let endpoints = settings.build_endpoints().unwrap();
        let ids: Vec<_> = endpoints.iter().map(|e| e.endpoint_id()).collect();
        assert_eq!(ids, vec!["manuscript", "structured"]);
    }

    #[test]
    fn duplicate_kind_rejected() {
        let settings = DataSettings {
            endpoints: vec![
                EndpointSettings::defaults("prisma").unwrap(),
                EndpointSettings::defaults("prisma").unwrap(),
            ],
        };
        assert!(settings.build_endpoints().is_err());
        assert!(EndpointSettings::defaults("endnote").is_none());
    }
}
