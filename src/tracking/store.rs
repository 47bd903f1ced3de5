// src/tracking/store.rs

use crate::domain::{DogRecord, DogStatus};
use crate::errors::{Result, TrackerError};
use crate::events::{ChangeEvent, EventKind};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// What the tracker needs from persistence.
///
/// Write discipline: snapshots are appended, never edited; events are keyed
/// by id and saving an id that already exists is a no-op.
pub trait DogStore {
    /// Returns how many events were new.
    fn save_events(&mut self, events: &[ChangeEvent]) -> Result<usize>;

    fn save_record(&mut self, record: &DogRecord) -> Result<()>;

    fn get_last_record(&self, dog_id: &str) -> Result<Option<DogRecord>>;

    /// Dogs of `source` whose latest snapshot is not terminal.
    fn get_active_ids(&self, source: &str) -> Result<BTreeSet<String>>;

    /// Appends a copy of the latest snapshot carrying `status`.
    fn set_status(&mut self, dog_id: &str, status: DogStatus, at: DateTime<Utc>) -> Result<()>;

    fn events_for_dog(&self, dog_id: &str) -> Result<Vec<ChangeEvent>>;

    /// Newest first, optionally one kind only.
    fn recent_events(&self, kind: Option<EventKind>, limit: usize) -> Result<Vec<ChangeEvent>>;

    /// Latest snapshot of every dog ever seen on `source`.
    fn records_for_source(&self, source: &str) -> Result<Vec<DogRecord>>;

    /// Latest snapshot of every dog, all sources.
    fn latest_records(&self) -> Result<Vec<DogRecord>>;

    /// Events strictly after `since`, newest first.
    fn events_since(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<ChangeEvent>>;

    /// Marks events as seen. Returns how many were not seen before.
    fn acknowledge(&mut self, event_ids: &[String], at: DateTime<Utc>) -> Result<usize>;

    fn acknowledged_ids(&self) -> Result<BTreeSet<String>>;

    /// When the user last acknowledged anything.
    fn last_check(&self) -> Result<Option<DateTime<Utc>>>;

    /// What happened since the last check: events not yet acknowledged,
    /// newest first.
    fn unseen_events(&self, limit: usize) -> Result<Vec<ChangeEvent>> {
        let seen = self.acknowledged_ids()?;
        Ok(self
            .recent_events(None, usize::MAX)?
            .into_iter()
            .filter(|e| !seen.contains(&e.id))
            .take(limit)
            .collect())
    }
}

/// In-process store, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: BTreeMap<String, Vec<DogRecord>>,
    events: BTreeMap<String, ChangeEvent>,
    acknowledged: BTreeMap<String, DateTime<Utc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn latest(&self) -> impl Iterator<Item = &DogRecord> {
        self.snapshots.values().filter_map(|history| history.last())
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn history(&self, dog_id: &str) -> &[DogRecord] {
        self.snapshots.get(dog_id).map(Vec::as_slice).unwrap_or_default()
    }
}

fn newest_first(mut events: Vec<ChangeEvent>) -> Vec<ChangeEvent> {
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
    events
}

impl DogStore for MemoryStore {
    fn save_events(&mut self, events: &[ChangeEvent]) -> Result<usize> {
        let mut inserted = 0;
        for event in events {
            if !self.events.contains_key(&event.id) {
                self.events.insert(event.id.clone(), event.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn save_record(&mut self, record: &DogRecord) -> Result<()> {
        self.snapshots
            .entry(record.id.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn get_last_record(&self, dog_id: &str) -> Result<Option<DogRecord>> {
        Ok(self.history(dog_id).last().cloned())
    }

    fn get_active_ids(&self, source: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .latest()
            .filter(|r| r.source == source && !r.status.is_terminal())
            .map(|r| r.id.clone())
            .collect())
    }

    fn set_status(&mut self, dog_id: &str, status: DogStatus, at: DateTime<Utc>) -> Result<()> {
        let next = self
            .history(dog_id)
            .last()
            .map(|last| last.with_status(status, at))
            .ok_or_else(|| TrackerError::NotFound(dog_id.to_string()))?;
        self.save_record(&next)
    }

    fn events_for_dog(&self, dog_id: &str) -> Result<Vec<ChangeEvent>> {
        Ok(newest_first(
            self.events
                .values()
                .filter(|e| e.dog_id == dog_id)
                .cloned()
                .collect(),
        ))
    }

    fn recent_events(&self, kind: Option<EventKind>, limit: usize) -> Result<Vec<ChangeEvent>> {
        let matching = self
            .events
            .values()
            .filter(|e| kind.map_or(true, |k| e.kind == k))
            .cloned()
            .collect();
        Ok(newest_first(matching).into_iter().take(limit).collect())
    }

    fn records_for_source(&self, source: &str) -> Result<Vec<DogRecord>> {
        Ok(self.latest().filter(|r| r.source == source).cloned().collect())
    }

    fn latest_records(&self) -> Result<Vec<DogRecord>> {
        Ok(self.latest().cloned().collect())
    }

    fn events_since(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<ChangeEvent>> {
        let matching = self
            .events
            .values()
            .filter(|e| e.timestamp > since)
            .cloned()
            .collect();
        Ok(newest_first(matching).into_iter().take(limit).collect())
    }

    fn acknowledge(&mut self, event_ids: &[String], at: DateTime<Utc>) -> Result<usize> {
        let mut added = 0;
        for id in event_ids {
            if !self.acknowledged.contains_key(id) {
                self.acknowledged.insert(id.clone(), at);
                added += 1;
            }
        }
        Ok(added)
    }

    fn acknowledged_ids(&self) -> Result<BTreeSet<String>> {
        Ok(self.acknowledged.keys().cloned().collect())
    }

    fn last_check(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.acknowledged.values().max().copied())
    }
}
