// src/tracking/reconcile.rs

use super::store::DogStore;
use crate::domain::DogStatus;
use crate::errors::Result;
use crate::events::{status_change, ChangeEvent, Provenance};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Retires every active dog of `source` that the latest scrape did not list.
///
/// Runs once per source after all of that source's records were processed.
/// Each retired dog gets a terminal status change, saved before the status
/// flip. The two writes are only atomic when the caller runs the whole source
/// inside one transaction; a re-run with a later `at` would otherwise mint a
/// second terminal event with a different id. Dogs already terminal are no
/// longer active and produce nothing on a second run; dogs of any other
/// source are never touched.
pub fn reconcile<S: DogStore + ?Sized>(
    store: &mut S,
    source: &str,
    observed_ids: &BTreeSet<String>,
    at: DateTime<Utc>,
) -> Result<Vec<ChangeEvent>> {
    let active = store.get_active_ids(source)?;
    let mut events = Vec::new();

    for dog_id in active.difference(observed_ids) {
        let Some(last) = store.get_last_record(dog_id)? else {
            warn!(dog_id = %dog_id, "active id without a stored record, skipping");
            continue;
        };
        if last.source != source {
            warn!(dog_id = %dog_id, source, found = %last.source, "record belongs to another source, skipping");
            continue;
        }
        if last.status.is_terminal() {
            continue;
        }

        let event = status_change(&last.id, &last.name, source, last.status, DogStatus::Removed, at)
            .with_provenance(Provenance::System);
        store.save_events(std::slice::from_ref(&event))?;
        store.set_status(&last.id, DogStatus::Removed, at)?;

        info!("🏠 Likely adopted: {} ({})", last.name, source);
        events.push(event);
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DogRecord;
    use crate::tracking::store::MemoryStore;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 6, 0, 0).unwrap()
    }

    fn seed(store: &mut MemoryStore, source: &str, name: &str) -> String {
        let dog = DogRecord {
            status: DogStatus::Available,
            ..DogRecord::new(source, name)
        };
        store.save_record(&dog).unwrap();
        dog.id
    }

    #[test]
    fn missing_dog_is_retired_once() {
        let mut store = MemoryStore::new();
        let rex = seed(&mut store, "RescueA", "Rex");
        let zira = seed(&mut store, "RescueA", "Zira");
        let observed: BTreeSet<String> = [zira.clone()].into();

        let first = reconcile(&mut store, "RescueA", &observed, at()).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].dog_id, rex);
        assert_eq!(first[0].old_value.as_deref(), Some("Available"));
        assert_eq!(first[0].new_value.as_deref(), Some("Adopted/Removed"));
        assert_eq!(first[0].provenance, Provenance::System);

        let second = reconcile(&mut store, "RescueA", &observed, at()).unwrap();
        assert!(second.is_empty());
        assert_eq!(store.event_count(), 1);
        assert_eq!(store.get_active_ids("RescueA").unwrap(), observed);
    }

    #[test]
    fn other_sources_are_untouched() {
        let mut store = MemoryStore::new();
        seed(&mut store, "RescueA", "Rex");
        let b_rex = seed(&mut store, "RescueB", "Rex");

        let events = reconcile(&mut store, "RescueA", &BTreeSet::new(), at()).unwrap();
        assert_eq!(events.len(), 1);
        assert!(events.iter().all(|e| e.dog_id != b_rex));
        assert_eq!(store.history(&b_rex).len(), 1);
        assert!(store.get_active_ids("RescueB").unwrap().contains(&b_rex));
    }

    #[test]
    fn nothing_missing_means_no_events() {
        let mut store = MemoryStore::new();
        let rex = seed(&mut store, "RescueA", "Rex");
        let observed: BTreeSet<String> = [rex].into();
        assert!(reconcile(&mut store, "RescueA", &observed, at()).unwrap().is_empty());
    }
}
