//! `[screen]` and `[pdfs]` sections of settings.toml

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One inclusion criterion coded per record during screening.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenCriterion {
    pub explanation: String,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenSettings {
    /// Criteria by column name. Without criteria the table carries a
    /// single `screen_inclusion` column.
    pub criteria: BTreeMap<String, ScreenCriterion>,
    /// Only export records still awaiting a decision.
    pub export_todos_only: bool,
}

impl Default for ScreenSettings {
    fn default() -> Self {
        Self {
            criteria: BTreeMap::new(),
            export_todos_only: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfSettings {
    /// Directory holding `<ID>.pdf` files, relative to the project.
    pub dir: PathBuf,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/pdfs"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_from_toml() {
        let settings: ScreenSettings = toml::from_str(
            r#"
[criteria.digital_work]
explanation = "Studies digital forms of work"

[criteria.empirical]
explanation = "Reports empirical data"
"#,
        )
        .unwrap();
        assert_eq!(
            settings.criteria.keys().collect::<Vec<_>>(),
            vec!["digital_work", "empirical"]
        );
        assert!(settings.export_todos_only);
        assert_eq!(PdfSettings::default().dir, PathBuf::from("data/pdfs"));
    }
}
