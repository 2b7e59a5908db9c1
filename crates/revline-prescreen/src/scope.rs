//! Scope-based prescreen: exclude records outside the review's scope

use revline_core::{Record, RecordArena, RecordState, ReviewError};
use serde::{Deserialize, Serialize};

/// Field that names why a record was excluded in prescreen.
pub const PRESCREEN_EXCLUSION: &str = "prescreen_exclusion";

const COMPLEMENTARY_MATERIAL_TITLES: &[&str] = &[
    "about our authors",
    "editorial board",
    "author index",
    "contents",
    "index of authors",
    "list of reviewers",
];

/// A `field = value` pair matched exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutletValue {
    pub field: String,
    pub value: String,
}

/// Scope restrictions. Unset restrictions are not checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeSettings {
    pub time_from: Option<i32>,
    pub time_to: Option<i32>,
    /// Allowed entry types; empty allows all.
    pub entry_types: Vec<String>,
    /// When non-empty, a record must match one of these.
    pub outlet_include: Vec<OutletValue>,
    pub outlet_exclude: Vec<OutletValue>,
    pub exclude_complementary_materials: bool,
}

/// `[prescreen]` section of settings.toml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrescreenSettings {
    pub scope: ScopeSettings,
    /// Only export records still awaiting a decision.
    pub export_todos_only: bool,
}

impl Default for PrescreenSettings {
    fn default() -> Self {
        Self {
            scope: ScopeSettings::default(),
            export_todos_only: true,
        }
    }
}

fn matches_any(record: &Record, values: &[OutletValue]) -> bool {
    values
        .iter()
        .any(|v| record.get(&v.field) == Some(v.value.as_str()))
}

impl ScopeSettings {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Reasons the record falls outside the scope. A missing or
    /// non-numeric year violates either time bound.
    pub fn violations(&self, record: &Record) -> Vec<String> {
        let mut reasons = Vec::new();
        let year = record.get("year").and_then(|y| y.trim().parse::<i32>().ok());

        if !self.entry_types.is_empty() && !self.entry_types.contains(&record.entry_type) {
            reasons.push("not in entry type scope".to_string());
        }
        if matches_any(record, &self.outlet_exclude) {
            reasons.push("in outlet exclusion scope".to_string());
        }
        if let Some(from) = self.time_from {
            if year.is_none_or(|y| y < from) {
                reasons.push(format!("not in time scope (>={from})"));
            }
        }
        if let Some(to) = self.time_to {
            if year.is_none_or(|y| y > to) {
                reasons.push(format!("not in time scope (<={to})"));
            }
        }
        if !self.outlet_include.is_empty() && !matches_any(record, &self.outlet_include) {
            reasons.push("not in outlet inclusion scope".to_string());
        }
        if self.exclude_complementary_materials {
            let title = record.get("title").map(|t| t.trim().to_lowercase());
            if title.is_some_and(|t| COMPLEMENTARY_MATERIAL_TITLES.contains(&t.as_str())) {
                reasons.push("complementary material".to_string());
            }
        }
        reasons
    }
}

/// Exclude `md_processed` records violating the scope. The rest are left
/// for a manual prescreen. Returns the excluded IDs.
pub fn scope_prescreen(
    arena: &mut RecordArena,
    scope: &ScopeSettings,
) -> Result<Vec<String>, ReviewError> {
    let mut excluded = Vec::new();
    for record in arena.iter_active_mut() {
        if record.status() != RecordState::MdProcessed {
            continue;
        }
        let reasons = scope.violations(record);
        if reasons.is_empty() {
            continue;
        }
        record.set_field(PRESCREEN_EXCLUSION, reasons.join("; "), "prescreen");
        record.set_status(RecordState::RevPrescreenExcluded)?;
        log::debug!("{}: prescreen excluded ({})", record.id(), reasons.join("; "));
        excluded.push(record.id().to_string());
    }
    log::info!("prescreen (scope): {} records excluded", excluded.len());
    Ok(excluded)
}
