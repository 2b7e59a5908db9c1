//! Structured data endpoint: one coding row per record in a CSV sheet

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use revline_core::RecordArena;

use crate::context::DataContext;
use crate::endpoint::{DataEndpoint, EndpointSettings};
use crate::matrix::SynthesisMatrix;

const TODO: &str = "TODO";

pub struct StructuredEndpoint {
    data: PathBuf,
    fields: Vec<String>,
}

impl Default for StructuredEndpoint {
    fn default() -> Self {
        Self::new(PathBuf::from("data/data.csv"), vec!["contribution".to_string()])
    }
}

struct Sheet {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    id_col: usize,
}

impl Sheet {
    fn read(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let Some(id_col) = header.iter().position(|h| h == "ID") else {
            bail!("{}: ID column missing", path.display());
        };
        let mut rows = Vec::new();
        for row in reader.records() {
            let row = row.with_context(|| format!("malformed row in {}", path.display()))?;
            let mut row: Vec<String> = row.iter().map(str::to_string).collect();
            row.resize(header.len(), TODO.to_string());
            rows.push(row);
        }
        Ok(Self {
            header,
            rows,
            id_col,
        })
    }

    fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        writer.write_record(&self.header)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .flush()
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

impl StructuredEndpoint {
    pub fn new(data: PathBuf, fields: Vec<String>) -> Self {
        Self { data, fields }
    }
}

impl DataEndpoint for StructuredEndpoint {
    fn endpoint_id(&self) -> &str {
        "structured"
    }

    fn default_setup(&self) -> EndpointSettings {
        EndpointSettings::Structured {
            data: self.data.clone(),
            fields: self.fields.clone(),
        }
    }

    fn update(
        &self,
        ctx: &DataContext,
        _arena: &RecordArena,
        matrix: &SynthesisMatrix,
    ) -> Result<Vec<PathBuf>> {
        let path = ctx.path(&self.data);
        let existed = path.is_file();
        let mut sheet = if existed {
            Sheet::read(&path)?
        } else {
            let mut header = vec!["ID".to_string()];
            header.extend(self.fields.iter().cloned());
            Sheet {
                header,
                rows: Vec::new(),
                id_col: 0,
            }
        };

        let mut changed = !existed;
        for field in &self.fields {
            if !sheet.header.contains(field) {
                sheet.header.push(field.clone());
                for row in &mut sheet.rows {
                    row.push(TODO.to_string());
                }
                changed = true;
            }
        }

        let present: BTreeSet<String> = sheet
            .rows
            .iter()
            .map(|row| row[sheet.id_col].clone())
            .collect();
        let mut added = 0;
        for id in matrix.record_ids() {
            if present.contains(&id) {
                continue;
            }
            let mut row = vec![TODO.to_string(); sheet.header.len()];
            row[sheet.id_col] = id;
            sheet.rows.push(row);
            added += 1;
        }

        if added == 0 && !changed {
            log::info!("all records included in {}", self.data.display());
            return Ok(Vec::new());
        }
        let id_col = sheet.id_col;
        sheet.rows.sort_by(|a, b| a[id_col].cmp(&b[id_col]));
        sheet.write(&path)?;
        log::info!("{added} records added to {}", self.data.display());
        Ok(vec![self.data.clone()])
    }

    /// Eligible records with exactly one fully coded row.
    fn completed_ids(&self, ctx: &DataContext, eligible: &[String]) -> Result<BTreeSet<String>> {
        let path = ctx.path(&self.data);
        if !path.is_file() {
            return Ok(BTreeSet::new());
        }
        let sheet = Sheet::read(&path)?;
        let mut rows_per_id: BTreeMap<&str, (usize, bool)> = BTreeMap::new();
        for row in &sheet.rows {
            let coded = row
                .iter()
                .enumerate()
                .all(|(i, cell)| i == sheet.id_col || cell.trim() != TODO);
            let entry = rows_per_id.entry(row[sheet.id_col].as_str()).or_insert((0, true));
            entry.0 += 1;
            entry.1 &= coded;
        }
        Ok(eligible
            .iter()
            .filter(|id| rows_per_id.get(id.as_str()) == Some(&(1, true)))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ProjectInfo;

    #[test]
    fn appends_todo_rows_and_reports_coded_records() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = DataContext::new(dir.path(), ProjectInfo::default());
        let endpoint = StructuredEndpoint::new(
            PathBuf::from("data/data.csv"),
            vec!["contribution".into(), "method".into()],
        );
        let ids = vec!["B".to_string(), "A".to_string()];
        let matrix = SynthesisMatrix::new(&ids, ["structured"]);

        assert!(endpoint.completed_ids(&ctx, &ids).unwrap().is_empty());
        endpoint.update(&ctx, &RecordArena::new(), &matrix).unwrap();
        let path = dir.path().join("data/data.csv");
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "ID,contribution,method\nA,TODO,TODO\nB,TODO,TODO\n"
        );

        std::fs::write(
            &path,
            "ID,contribution,method\nA,theory,survey\nB,TODO,case\nC,x,y\nC,x,y\n",
        )
        .unwrap();
        let done = endpoint
            .completed_ids(&ctx, &["A".into(), "B".into(), "C".into()])
            .unwrap();
        assert_eq!(done.into_iter().collect::<Vec<_>>(), vec!["A"]);
    }

    #[test]
    fn new_field_column_is_added() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = DataContext::new(dir.path(), ProjectInfo::default());
        let path = dir.path().join("data/data.csv");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "ID,contribution\nA,theory\n").unwrap();

        let endpoint = StructuredEndpoint::new(
            PathBuf::from("data/data.csv"),
            vec!["contribution".into(), "method".into()],
        );
        let matrix = SynthesisMatrix::new(&["A".to_string()], ["structured"]);
        let written = endpoint.update(&ctx, &RecordArena::new(), &matrix).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "ID,contribution,method\nA,theory,TODO\n"
        );
    }
}
