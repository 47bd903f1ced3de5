// src/tracking/pipeline.rs

use super::reconcile::reconcile;
use super::store::DogStore;
use crate::domain::{dog_id, DogRecord};
use crate::errors::Result;
use crate::events::{
    attribute_update, diff, first_seen, split_status, status_change, ChangeEvent, EventKind,
    DEFAULT_TRACKED,
};
use crate::scoring::{is_good_fit, on_watch_list, score};
use crate::settings::Settings;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// What one source's run produced.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub source: String,
    pub new_dogs: usize,
    pub status_changes: usize,
    pub attribute_updates: usize,
    pub retired: usize,
    /// Records dropped because they named another source.
    pub skipped: usize,
    pub events: Vec<ChangeEvent>,
    /// Stored snapshots of dogs seen for the first time in this run.
    pub new_records: Vec<DogRecord>,
}

impl RunSummary {
    fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            ..Self::default()
        }
    }

    fn tally(&mut self, events: Vec<ChangeEvent>) {
        for event in &events {
            match event.kind {
                EventKind::FirstSeen => self.new_dogs += 1,
                EventKind::StatusChange => self.status_changes += 1,
                EventKind::AttributeUpdate => self.attribute_updates += 1,
            }
        }
        self.events.extend(events);
    }

    /// New dogs scoring at or above `min_score`, best first.
    pub fn good_fits(&self, min_score: i32) -> Vec<&DogRecord> {
        let mut fits: Vec<&DogRecord> = self
            .new_records
            .iter()
            .filter(|r| r.fit_score.is_some_and(|s| is_good_fit(s, min_score)))
            .collect();
        fits.sort_by(|a, b| b.fit_score.cmp(&a.fit_score).then_with(|| a.id.cmp(&b.id)));
        fits
    }

    /// Events about dogs on the watch list.
    pub fn watched<'s>(&'s self, watch_list: &[String]) -> Vec<&'s ChangeEvent> {
        self.events
            .iter()
            .filter(|e| on_watch_list(&e.dog_name, watch_list))
            .collect()
    }
}

/// The stored snapshot and the events one record produced.
#[derive(Debug, Clone)]
pub struct Observation {
    pub record: DogRecord,
    pub events: Vec<ChangeEvent>,
}

impl Observation {
    pub fn is_new(&self) -> bool {
        self.events.iter().any(|e| e.kind == EventKind::FirstSeen)
    }
}

/// Runs scrape batches through scoring, change detection and persistence.
///
/// Holds the store explicitly; there is no process-wide instance.
pub struct Tracker<'a, S: DogStore + ?Sized> {
    store: &'a mut S,
    settings: &'a Settings,
}

impl<'a, S: DogStore + ?Sized> Tracker<'a, S> {
    pub fn new(store: &'a mut S, settings: &'a Settings) -> Self {
        Self { store, settings }
    }

    /// Scores one record, compares it with the last stored snapshot and
    /// persists the resulting events, then the snapshot itself.
    ///
    /// Event ids depend on `at`, so replaying the same observation at the
    /// same instant is a no-op. Crash safety across runs comes from the
    /// caller's per-source transaction, not from the write order.
    pub fn observe(&mut self, record: DogRecord, at: DateTime<Utc>) -> Result<Observation> {
        let mut record = record;
        if record.id.is_empty() {
            record.id = dog_id(&record.source, &record.name);
        }

        let overrides = self.settings.overrides_for(&record.id);
        let fit_score = score(&record, overrides, &self.settings.scoring);
        let record = record.observed(at, fit_score);

        let mut events = Vec::new();
        match self.store.get_last_record(&record.id)? {
            None => {
                info!("🆕 New dog: {} ({}) fit score {}", record.name, record.source, fit_score);
                events.push(first_seen(
                    &record.id,
                    &record.name,
                    &record.source,
                    record.status,
                    Some(fit_score),
                    at,
                ));
            }
            Some(previous) => {
                let (status, rest) = split_status(diff(&previous, &record, DEFAULT_TRACKED));
                if status.is_some() {
                    info!(
                        "📢 {}: {} → {}",
                        record.name, previous.status, record.status
                    );
                    events.push(status_change(
                        &record.id,
                        &record.name,
                        &record.source,
                        previous.status,
                        record.status,
                        at,
                    ));
                }
                if !rest.is_empty() {
                    debug!(dog_id = %record.id, fields = rest.len(), "attributes changed");
                    events.push(attribute_update(
                        &record.id,
                        &record.name,
                        &record.source,
                        rest,
                        at,
                    ));
                }
            }
        }

        self.store.save_events(&events)?;
        self.store.save_record(&record)?;
        Ok(Observation { record, events })
    }

    /// One full pass over a source: every record observed in order, then
    /// reconciliation against what the source listed.
    pub fn process_source(
        &mut self,
        source: &str,
        records: Vec<DogRecord>,
        at: DateTime<Utc>,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::new(source);
        let mut observed_ids = BTreeSet::new();

        for record in records {
            if record.source != source {
                warn!(
                    name = %record.name,
                    found = %record.source,
                    expected = source,
                    "record from another source, skipping"
                );
                summary.skipped += 1;
                continue;
            }

            let observation = self.observe(record, at)?;
            observed_ids.insert(observation.record.id.clone());
            if observation.is_new() {
                summary.new_records.push(observation.record);
            }
            summary.tally(observation.events);
        }

        if observed_ids.is_empty() {
            warn!(source, "no usable records, skipping reconciliation");
            return Ok(summary);
        }

        let retired = reconcile(&mut *self.store, source, &observed_ids, at)?;
        summary.retired = retired.len();
        summary.events.extend(retired);

        info!(
            "{}: {} new, {} status changes, {} updates, {} retired",
            source, summary.new_dogs, summary.status_changes, summary.attribute_updates, summary.retired
        );
        Ok(summary)
    }
}
