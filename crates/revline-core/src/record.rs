//! Bibliographic record: fields, provenance, origins and status audit trail

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ReviewError;
use crate::status::RecordState;

/// Fields used for similarity and merging. Everything else is complementary.
pub const IDENTIFYING_FIELDS: [&str; 12] = [
    "title",
    "author",
    "year",
    "journal",
    "booktitle",
    "chapter",
    "publisher",
    "volume",
    "number",
    "pages",
    "editor",
    "institution",
];

/// Masterdata provenance key marking the record's masterdata as curated.
pub const CURATED: &str = "CURATED";

/// Prefix of the note left on a field that won against a differing value.
pub const DISAGREEMENT_PREFIX: &str = "disagreement with ";

fn default_entry_type() -> String {
    "article".to_string()
}

/// Where a field value came from and which defects are attached to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    pub source: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub notes: BTreeSet<String>,
}

impl ProvenanceEntry {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            notes: BTreeSet::new(),
        }
    }

    /// Quality defects (merge disagreement markers are not defects).
    pub fn defect_count(&self) -> usize {
        self.notes
            .iter()
            .filter(|n| !n.starts_with(DISAGREEMENT_PREFIX))
            .count()
    }
}

/// One entry of a record's status audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: RecordState,
    pub to: RecordState,
    pub at: DateTime<Utc>,
    /// Set when the change bypassed the transition rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "ENTRYTYPE", default = "default_entry_type")]
    pub entry_type: String,
    status: RecordState,
    #[serde(default)]
    origin: BTreeSet<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub masterdata_provenance: BTreeMap<String, ProvenanceEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data_provenance: BTreeMap<String, ProvenanceEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    history: Vec<StatusChange>,
}

pub fn is_identifying(field: &str) -> bool {
    IDENTIFYING_FIELDS.contains(&field)
}

impl Record {
    pub fn new(id: impl Into<String>, status: RecordState) -> Self {
        Self {
            id: id.into(),
            entry_type: default_entry_type(),
            status,
            origin: BTreeSet::new(),
            fields: BTreeMap::new(),
            masterdata_provenance: BTreeMap::new(),
            data_provenance: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    /// A freshly retrieved search result: origin is the entry itself.
    pub fn from_search(
        id: impl Into<String>,
        origin: impl Into<String>,
        fields: BTreeMap<String, String>,
    ) -> Self {
        let origin = origin.into();
        let mut record = Self::new(id, RecordState::MdRetrieved);
        if let Some(entry_type) = fields.get("ENTRYTYPE") {
            record.entry_type = entry_type.to_lowercase();
        }
        for (field, value) in fields {
            if field == "ENTRYTYPE" || field == "ID" || value.trim().is_empty() {
                continue;
            }
            record.set_field(&field, value, &origin);
        }
        record.origin.insert(origin);
        record
    }

    pub fn with_entry_type(mut self, entry_type: &str) -> Self {
        self.entry_type = entry_type.to_string();
        self
    }

    pub fn with_field(mut self, field: &str, value: &str) -> Self {
        self.fields.insert(field.to_string(), value.to_string());
        self
    }

    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin.insert(origin.to_string());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> RecordState {
        self.status
    }

    pub fn origin(&self) -> &BTreeSet<String> {
        &self.origin
    }

    pub fn history(&self) -> &[StatusChange] {
        &self.history
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Set a field value and record its source in the matching provenance map.
    pub fn set_field(&mut self, field: &str, value: impl Into<String>, source: &str) {
        self.fields.insert(field.to_string(), value.into());
        let provenance = self.provenance_map_mut(field);
        provenance
            .entry(field.to_string())
            .and_modify(|e| e.source = source.to_string())
            .or_insert_with(|| ProvenanceEntry::new(source));
    }

    pub fn add_origin(&mut self, origin: impl Into<String>) {
        self.origin.insert(origin.into());
    }

    // --- status ---

    /// Move to `target` along a legal single-step transition.
    ///
    /// Setting the current state again is a no-op.
    pub fn set_status(&mut self, target: RecordState) -> Result<(), ReviewError> {
        if target == self.status {
            return Ok(());
        }
        if !self.status.can_transition_to(target) {
            return Err(ReviewError::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to: target,
            });
        }
        self.push_change(target, None);
        Ok(())
    }

    /// Administrative override: applies any target and audits the reason.
    pub fn override_status(&mut self, target: RecordState, reason: &str) {
        if target == self.status {
            return;
        }
        log::debug!(
            "{}: status override {} -> {target} ({reason})",
            self.id,
            self.status
        );
        self.push_change(target, Some(reason.to_string()));
    }

    fn push_change(&mut self, target: RecordState, override_reason: Option<String>) {
        self.history.push(StatusChange {
            from: self.status,
            to: target,
            at: Utc::now(),
            override_reason,
        });
        self.status = target;
    }

    // --- provenance ---

    fn provenance_map_mut(&mut self, field: &str) -> &mut BTreeMap<String, ProvenanceEntry> {
        if is_identifying(field) {
            &mut self.masterdata_provenance
        } else {
            &mut self.data_provenance
        }
    }

    fn provenance_entry(&self, field: &str) -> Option<&ProvenanceEntry> {
        if is_identifying(field) {
            self.masterdata_provenance.get(field)
        } else {
            self.data_provenance.get(field)
        }
    }

    pub fn add_masterdata_provenance_note(&mut self, field: &str, note: &str) {
        add_note(&mut self.masterdata_provenance, field, note);
    }

    pub fn remove_masterdata_provenance_note(&mut self, field: &str, note: &str) {
        remove_note(&mut self.masterdata_provenance, field, note);
    }

    pub fn add_data_provenance_note(&mut self, field: &str, note: &str) {
        add_note(&mut self.data_provenance, field, note);
    }

    pub fn remove_data_provenance_note(&mut self, field: &str, note: &str) {
        remove_note(&mut self.data_provenance, field, note);
    }

    /// Whether any identifying field carries a quality defect.
    pub fn has_masterdata_defects(&self) -> bool {
        self.masterdata_provenance
            .iter()
            .any(|(field, entry)| field != CURATED && entry.defect_count() > 0)
    }

    pub fn is_curated(&self) -> bool {
        self.masterdata_provenance.contains_key(CURATED)
    }

    pub fn mark_curated(&mut self, source: &str) {
        self.masterdata_provenance
            .insert(CURATED.to_string(), ProvenanceEntry::new(source));
    }

    // --- venue ---

    /// Journal, booktitle or series, whichever is present first.
    pub fn container_title(&self) -> Option<&str> {
        self.get("journal")
            .or_else(|| self.get("booktitle"))
            .or_else(|| self.get("series"))
    }

    /// Canonical table-of-contents key scoping duplicate search to one issue.
    pub fn get_toc_key(&self) -> Result<String, ReviewError> {
        let missing = |what: &str| ReviewError::NotTocIdentifiable {
            id: self.id.clone(),
            reason: format!("missing {what}"),
        };
        match self.entry_type.as_str() {
            "article" => {
                let journal = self.get("journal").ok_or_else(|| missing("journal"))?;
                let volume = self.get("volume").ok_or_else(|| missing("volume"))?;
                let number = self.get("number").unwrap_or("");
                Ok(format!(
                    "{}|{}|{}",
                    journal.trim().to_lowercase(),
                    volume.trim(),
                    number.trim()
                ))
            }
            "inproceedings" => {
                let booktitle = self.get("booktitle").ok_or_else(|| missing("booktitle"))?;
                let year = self.get("year").ok_or_else(|| missing("year"))?;
                Ok(format!("{}|{}", booktitle.trim().to_lowercase(), year.trim()))
            }
            other => Err(ReviewError::NotTocIdentifiable {
                id: self.id.clone(),
                reason: format!("entry type {other} has no table of contents"),
            }),
        }
    }

    /// Short "author : title" line for prompts and logs.
    pub fn citation(&self) -> String {
        let mut line = format!(
            "{} : {}",
            self.get("author").unwrap_or("NO_AUTHOR"),
            self.get("title").unwrap_or("NO_TITLE")
        );
        if let Some(container) = self.container_title() {
            line.push_str(&format!(" ({container}"));
            if let Some(year) = self.get("year") {
                line.push_str(&format!(", {year}"));
            }
            line.push(')');
        }
        line
    }

    // --- merge ---

    /// Absorb `other` into this record.
    ///
    /// Origins are unioned. With `prefer_curated`, a curated side wins every
    /// conflicting identifying field against a non-curated side; otherwise
    /// the value with fewer defect notes wins and ties stay with `self`.
    /// The losing value's source is recorded on the winner's provenance.
    pub fn merge(&mut self, other: &Record, prefer_curated: bool) {
        self.origin.extend(other.origin.iter().cloned());

        let other_authoritative = prefer_curated && other.is_curated() && !self.is_curated();
        let self_authoritative = prefer_curated && self.is_curated() && !other.is_curated();
        if other_authoritative {
            if let Some(curated) = other.masterdata_provenance.get(CURATED) {
                self.masterdata_provenance
                    .insert(CURATED.to_string(), curated.clone());
            }
        }

        let fields: BTreeSet<String> = self
            .fields
            .keys()
            .chain(other.fields.keys())
            .cloned()
            .collect();

        for field in fields {
            let Some(theirs) = other.get(&field) else {
                continue;
            };
            let theirs = theirs.to_string();
            let their_entry = other.provenance_entry(&field).cloned();

            let Some(ours) = self.get(&field).map(str::to_string) else {
                self.fields.insert(field.clone(), theirs);
                if let Some(entry) = their_entry {
                    self.provenance_map_mut(&field).insert(field.clone(), entry);
                }
                continue;
            };
            if ours == theirs {
                continue;
            }

            let identifying = is_identifying(&field);
            let our_defects = self.provenance_entry(&field).map_or(0, |e| e.defect_count());
            let their_defects = their_entry.as_ref().map_or(0, |e| e.defect_count());
            let take_theirs = if identifying && other_authoritative {
                true
            } else if identifying && self_authoritative {
                false
            } else {
                their_defects < our_defects
            };

            if take_theirs {
                let note = format!("{DISAGREEMENT_PREFIX}{}", self.value_source(&field));
                self.fields.insert(field.clone(), theirs);
                let mut entry = their_entry.unwrap_or_else(|| {
                    ProvenanceEntry::new(other.value_source(&field))
                });
                entry.notes.insert(note);
                self.provenance_map_mut(&field).insert(field.clone(), entry);
            } else {
                let note = format!("{DISAGREEMENT_PREFIX}{}", other.value_source(&field));
                let source = self.value_source(&field);
                self.provenance_map_mut(&field)
                    .entry(field.clone())
                    .or_insert_with(|| ProvenanceEntry::new(source))
                    .notes
                    .insert(note);
            }
        }
    }

    /// Source of a field value: its provenance, else the record's first origin.
    fn value_source(&self, field: &str) -> String {
        self.provenance_entry(field)
            .map(|e| e.source.clone())
            .filter(|s| !s.is_empty())
            .or_else(|| self.origin.iter().next().cloned())
            .unwrap_or_else(|| self.id.clone())
    }
}

fn add_note(map: &mut BTreeMap<String, ProvenanceEntry>, field: &str, note: &str) {
    map.entry(field.to_string())
        .or_default()
        .notes
        .insert(note.to_string());
}

fn remove_note(map: &mut BTreeMap<String, ProvenanceEntry>, field: &str, note: &str) {
    if let Some(entry) = map.get_mut(field) {
        entry.notes.remove(note);
    }
}
