//! ID-keyed record store with retirement markers for merged-away records

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ReviewError;
use crate::record::Record;
use crate::status::RecordState;

/// A record collection entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "slot", rename_all = "snake_case")]
pub enum Slot {
    Active(Record),
    /// Merged into `merged_into`; kept for statistics and lineage.
    Retired { record: Record, merged_into: String },
}

impl Slot {
    pub fn record(&self) -> &Record {
        match self {
            Slot::Active(record) => record,
            Slot::Retired { record, .. } => record,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Slot::Active(_))
    }
}

/// The record collection. IDs are never reused, even after retirement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Slot>", into = "Vec<Slot>")]
pub struct RecordArena {
    slots: BTreeMap<String, Slot>,
}

impl TryFrom<Vec<Slot>> for RecordArena {
    type Error = ReviewError;

    fn try_from(slots: Vec<Slot>) -> Result<Self, Self::Error> {
        let mut arena = RecordArena::new();
        for slot in slots {
            let id = slot.record().id().to_string();
            if arena.slots.insert(id.clone(), slot).is_some() {
                return Err(ReviewError::DuplicateId(id));
            }
        }
        Ok(arena)
    }
}

impl From<RecordArena> for Vec<Slot> {
    fn from(arena: RecordArena) -> Self {
        arena.slots.into_values().collect()
    }
}

impl RecordArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: Record) -> Result<(), ReviewError> {
        let id = record.id().to_string();
        if self.slots.contains_key(&id) {
            return Err(ReviewError::DuplicateId(id));
        }
        self.slots.insert(id, Slot::Active(record));
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub fn slot(&self, id: &str) -> Option<&Slot> {
        self.slots.get(id)
    }

    /// Active record by ID.
    pub fn get(&self, id: &str) -> Result<&Record, ReviewError> {
        match self.slots.get(id) {
            Some(Slot::Active(record)) => Ok(record),
            Some(Slot::Retired { merged_into, .. }) => Err(ReviewError::RecordRetired {
                id: id.to_string(),
                merged_into: merged_into.clone(),
            }),
            None => Err(ReviewError::UnknownRecord(id.to_string())),
        }
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut Record, ReviewError> {
        match self.slots.get_mut(id) {
            Some(Slot::Active(record)) => Ok(record),
            Some(Slot::Retired { merged_into, .. }) => Err(ReviewError::RecordRetired {
                id: id.to_string(),
                merged_into: merged_into.clone(),
            }),
            None => Err(ReviewError::UnknownRecord(id.to_string())),
        }
    }

    /// Follow `merged_into` links to the active record an ID ended up in.
    pub fn resolve(&self, id: &str) -> Result<&str, ReviewError> {
        let mut current = id;
        // A chain can never be longer than the collection
        for _ in 0..=self.slots.len() {
            match self.slots.get_key_value(current) {
                Some((key, Slot::Active(_))) => return Ok(key.as_str()),
                Some((_, Slot::Retired { merged_into, .. })) => current = merged_into.as_str(),
                None => return Err(ReviewError::UnknownRecord(current.to_string())),
            }
        }
        Err(ReviewError::UnknownRecord(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.values()
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &Record> {
        self.slots.values().filter_map(|slot| match slot {
            Slot::Active(record) => Some(record),
            Slot::Retired { .. } => None,
        })
    }

    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = &mut Record> {
        self.slots.values_mut().filter_map(|slot| match slot {
            Slot::Active(record) => Some(record),
            Slot::Retired { .. } => None,
        })
    }

    /// Retired records with the ID they were merged into.
    pub fn iter_retired(&self) -> impl Iterator<Item = (&Record, &str)> {
        self.slots.values().filter_map(|slot| match slot {
            Slot::Retired {
                record,
                merged_into,
            } => Some((record, merged_into.as_str())),
            Slot::Active(_) => None,
        })
    }

    /// IDs of active records in any of `states`, sorted.
    pub fn ids_in(&self, states: &[RecordState]) -> Vec<String> {
        self.iter_active()
            .filter(|r| states.contains(&r.status()))
            .map(|r| r.id().to_string())
            .collect()
    }

    /// IDs in `states`, split into `n` near-equal groups in ID order. The
    /// first groups take the remainder.
    pub fn split_ids(&self, states: &[RecordState], n: usize) -> Vec<Vec<String>> {
        let ids = self.ids_in(states);
        let n = n.max(1);
        let base = ids.len() / n;
        let extra = ids.len() % n;
        let mut ids = ids.into_iter();
        (0..n)
            .map(|i| ids.by_ref().take(base + usize::from(i < extra)).collect())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn active_len(&self) -> usize {
        self.iter_active().count()
    }

    /// Merge `loser` into `survivor` and retire `loser`.
    ///
    /// The loser moves to `md_duplicates_removed` by a legal step when it is
    /// still before curation, otherwise by an audited override.
    pub fn merge_into(
        &mut self,
        survivor_id: &str,
        loser_id: &str,
        prefer_curated: bool,
    ) -> Result<(), ReviewError> {
        if survivor_id == loser_id {
            return Err(ReviewError::SelfMerge(loser_id.to_string()));
        }
        let loser = self.get(loser_id)?.clone();
        self.get_mut(survivor_id)?.merge(&loser, prefer_curated);

        let Some(Slot::Active(mut record)) = self.slots.remove(loser_id) else {
            return Err(ReviewError::UnknownRecord(loser_id.to_string()));
        };
        if record.status().can_transition_to(RecordState::MdDuplicatesRemoved) {
            record.set_status(RecordState::MdDuplicatesRemoved)?;
        } else {
            record.override_status(
                RecordState::MdDuplicatesRemoved,
                &format!("merged into {survivor_id}"),
            );
        }
        log::debug!("{loser_id} merged into {survivor_id}");
        self.slots.insert(
            loser_id.to_string(),
            Slot::Retired {
                record,
                merged_into: survivor_id.to_string(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, status: RecordState) -> Record {
        Record::new(id, status).with_origin(&format!("s.json/{id}"))
    }

    #[test]
    fn insert_rejects_duplicates() {
        let mut arena = RecordArena::new();
        arena.insert(rec("A", RecordState::MdPrepared)).unwrap();
        assert_eq!(
            arena.insert(rec("A", RecordState::MdPrepared)),
            Err(ReviewError::DuplicateId("A".into()))
        );
    }

    #[test]
    fn merge_into_retires_loser() {
        let mut arena = RecordArena::new();
        arena.insert(rec("A", RecordState::MdProcessed)).unwrap();
        arena.insert(rec("B", RecordState::MdPrepared)).unwrap();
        arena.merge_into("A", "B", true).unwrap();

        assert!(matches!(
            arena.get("B"),
            Err(ReviewError::RecordRetired { .. })
        ));
        assert_eq!(arena.resolve("B").unwrap(), "A");
        assert_eq!(arena.active_len(), 1);
        let (retired, into) = arena.iter_retired().next().unwrap();
        assert_eq!(retired.status(), RecordState::MdDuplicatesRemoved);
        assert!(retired.history()[0].override_reason.is_none());
        assert_eq!(into, "A");
        assert_eq!(arena.get("A").unwrap().origin().len(), 2);
    }

    #[test]
    fn retiring_processed_record_is_audited() {
        let mut arena = RecordArena::new();
        arena.insert(rec("A", RecordState::RevIncluded)).unwrap();
        arena.insert(rec("B", RecordState::MdProcessed)).unwrap();
        arena.merge_into("A", "B", true).unwrap();
        let slot = arena.slot("B").unwrap();
        assert!(!slot.is_active());
        assert_eq!(
            slot.record().history()[0].override_reason.as_deref(),
            Some("merged into A")
        );
    }

    #[test]
    fn resolve_follows_chain() {
        let mut arena = RecordArena::new();
        arena.insert(rec("A", RecordState::MdProcessed)).unwrap();
        arena.insert(rec("B", RecordState::MdPrepared)).unwrap();
        arena.insert(rec("C", RecordState::MdPrepared)).unwrap();
        arena.merge_into("B", "C", true).unwrap();
        arena.merge_into("A", "B", true).unwrap();
        assert_eq!(arena.resolve("C").unwrap(), "A");
        assert_eq!(arena.get("A").unwrap().origin().len(), 3);
        assert!(matches!(
            arena.resolve("Z"),
            Err(ReviewError::UnknownRecord(_))
        ));
    }

    #[test]
    fn merging_retired_record_fails() {
        let mut arena = RecordArena::new();
        arena.insert(rec("A", RecordState::MdProcessed)).unwrap();
        arena.insert(rec("B", RecordState::MdPrepared)).unwrap();
        arena.merge_into("A", "B", true).unwrap();
        assert!(arena.merge_into("A", "B", true).is_err());
        assert!(arena.merge_into("A", "A", true).is_err());
    }

    #[test]
    fn serde_roundtrip_keeps_retired_slots() {
        let mut arena = RecordArena::new();
        arena.insert(rec("A", RecordState::MdProcessed)).unwrap();
        arena.insert(rec("B", RecordState::MdPrepared)).unwrap();
        arena.merge_into("A", "B", true).unwrap();
        let json = serde_json::to_string(&arena).unwrap();
        let back: RecordArena = serde_json::from_str(&json).unwrap();
        assert_eq!(back, arena);
        assert_eq!(back.resolve("B").unwrap(), "A");
    }

    #[test]
    fn deserialize_rejects_duplicate_ids() {
        let json = r#"[
            {"slot": "active", "ID": "A", "status": "md_prepared"},
            {"slot": "active", "ID": "A", "status": "md_processed"}
        ]"#;
        assert!(serde_json::from_str::<RecordArena>(json).is_err());
    }
}
