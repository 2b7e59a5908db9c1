//! Search-result import: JSON field maps become `md_imported` records

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use revline_core::{Record, RecordArena, RecordState};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: Vec<String>,
    /// Entries whose origin is already in the collection.
    pub already_present: usize,
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Import a search result file: a JSON array of flat field maps.
///
/// Each entry's origin is `<file name>/<key>`, where the key is the entry's
/// `ID` or its 1-based position. Re-importing a file skips entries whose
/// origin is already known, so imports are idempotent.
pub fn import_search_file(arena: &mut RecordArena, path: &Path) -> Result<ImportSummary> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read search file {}", path.display()))?;
    let entries: Vec<BTreeMap<String, Value>> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse search file {}", path.display()))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("no file name in {}", path.display()))?;
    let stem = path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.clone());

    let known_origins: BTreeSet<String> = arena
        .iter()
        .flat_map(|slot| slot.record().origin().iter().cloned())
        .collect();

    let mut summary = ImportSummary::default();
    for (index, entry) in entries.into_iter().enumerate() {
        let fields: BTreeMap<String, String> = entry
            .iter()
            .filter_map(|(k, v)| value_to_string(v).map(|v| (k.clone(), v)))
            .collect();
        let key = fields
            .get("ID")
            .cloned()
            .unwrap_or_else(|| format!("{:06}", index + 1));
        let origin = format!("{file_name}/{key}");
        if known_origins.contains(&origin) {
            summary.already_present += 1;
            continue;
        }

        let id = unused_id(arena, &stem, &key);
        let mut record = Record::from_search(id.clone(), origin, fields);
        record.set_status(RecordState::MdImported)?;
        arena.insert(record)?;
        summary.imported.push(id);
    }

    log::info!(
        "import {file_name}: {} new records, {} already present",
        summary.imported.len(),
        summary.already_present
    );
    Ok(summary)
}

/// The entry key when free, else `<stem>_<key>` with a counter suffix.
fn unused_id(arena: &RecordArena, stem: &str, key: &str) -> String {
    if !arena.contains(key) {
        return key.to_string();
    }
    let base = format!("{stem}_{key}");
    let mut candidate = base.clone();
    let mut n = 1;
    while arena.contains(&candidate) {
        n += 1;
        candidate = format!("{base}_{n}");
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_search(dir: &Path, name: &str, json: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn imports_entries_with_origin() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_search(
            dir.path(),
            "crossref.json",
            r#"[
                {"ID": "Smith2020", "ENTRYTYPE": "article", "title": "Digital Work", "year": 2020},
                {"title": "Platform Work", "journal": "X", "volume": "1"}
            ]"#,
        );
        let mut arena = RecordArena::new();
        let summary = import_search_file(&mut arena, &path).unwrap();
        assert_eq!(summary.imported, vec!["Smith2020", "000002"]);

        let r = arena.get("Smith2020").unwrap();
        assert_eq!(r.status(), RecordState::MdImported);
        assert_eq!(r.get("year"), Some("2020"));
        assert!(r.origin().contains("crossref.json/Smith2020"));
        assert_eq!(r.history()[0].from, RecordState::MdRetrieved);
    }

    #[test]
    fn reimport_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_search(dir.path(), "s.json", r#"[{"ID": "A", "title": "T"}]"#);
        let mut arena = RecordArena::new();
        import_search_file(&mut arena, &path).unwrap();
        let again = import_search_file(&mut arena, &path).unwrap();
        assert!(again.imported.is_empty());
        assert_eq!(again.already_present, 1);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn colliding_ids_are_disambiguated() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_search(dir.path(), "a.json", r#"[{"ID": "X1", "title": "T"}]"#);
        let b = write_search(dir.path(), "b.json", r#"[{"ID": "X1", "title": "U"}]"#);
        let mut arena = RecordArena::new();
        import_search_file(&mut arena, &a).unwrap();
        let summary = import_search_file(&mut arena, &b).unwrap();
        assert_eq!(summary.imported, vec!["b_X1"]);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_search(dir.path(), "bad.json", "{}");
        assert!(import_search_file(&mut RecordArena::new(), &path).is_err());
        assert!(import_search_file(&mut RecordArena::new(), &dir.path().join("missing.json")).is_err());
    }
}
