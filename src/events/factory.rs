// src/events/factory.rs
//
// Pure constructors, one per event kind. Callers persist the results.

use super::changes::{FieldChange, TrackedField};
use super::model::{event_id, ChangeEvent, EventKind, Provenance};
use crate::domain::DogStatus;
use chrono::{DateTime, Utc};

/// At most this many changes are spelled out in an update summary.
const SUMMARY_CHANGES: usize = 3;

/// How a status transition reads to a person. Descriptive only: it never
/// alters the old/new values stored on the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    NowPending,
    AvailableAgain,
    NowAvailable,
    Adopted,
    Other,
}

impl StatusTransition {
    pub fn classify(old: DogStatus, new: DogStatus) -> Self {
        match (old, new) {
            (_, DogStatus::Pending) => StatusTransition::NowPending,
            (_, DogStatus::Removed) => StatusTransition::Adopted,
            (DogStatus::Pending, DogStatus::Available) => StatusTransition::AvailableAgain,
            (DogStatus::Upcoming, DogStatus::Available) => StatusTransition::NowAvailable,
            _ => StatusTransition::Other,
        }
    }

    fn summary(&self, old: DogStatus, new: DogStatus) -> String {
        match self {
            StatusTransition::NowPending => "Application submitted - now pending".to_string(),
            StatusTransition::AvailableAgain => "Became available again".to_string(),
            StatusTransition::NowAvailable => "Now available for adoption".to_string(),
            StatusTransition::Adopted => "Adopted (no longer listed)".to_string(),
            StatusTransition::Other => format!("Status: {old} → {new}"),
        }
    }
}

fn base(
    dog_id: &str,
    name: &str,
    source: &str,
    kind: EventKind,
    at: DateTime<Utc>,
    summary: String,
) -> ChangeEvent {
    ChangeEvent {
        id: event_id(dog_id, kind, at),
        dog_id: dog_id.to_string(),
        dog_name: name.to_string(),
        kind,
        timestamp: at,
        field: None,
        old_value: None,
        new_value: None,
        changes: Vec::new(),
        summary,
        provenance: Provenance::from_rescue_name(source),
    }
}

/// A dog stored for the first time.
pub fn first_seen(
    dog_id: &str,
    name: &str,
    source: &str,
    status: DogStatus,
    score: Option<i32>,
    at: DateTime<Utc>,
) -> ChangeEvent {
    let mut summary = format!("First seen: {status}");
    if let Some(score) = score {
        summary.push_str(&format!(" (Fit Score: {score})"));
    }

    let mut event = base(dog_id, name, source, EventKind::FirstSeen, at, summary);
    event.field = Some(TrackedField::Status);
    event.new_value = Some(status.as_str().to_string());
    event
}

pub fn status_change(
    dog_id: &str,
    name: &str,
    source: &str,
    old: DogStatus,
    new: DogStatus,
    at: DateTime<Utc>,
) -> ChangeEvent {
    let summary = StatusTransition::classify(old, new).summary(old, new);

    let mut event = base(dog_id, name, source, EventKind::StatusChange, at, summary);
    event.field = Some(TrackedField::Status);
    event.old_value = Some(old.as_str().to_string());
    event.new_value = Some(new.as_str().to_string());
    event
}

/// One event for every non-status field that moved in a single observation.
pub fn attribute_update(
    dog_id: &str,
    name: &str,
    source: &str,
    changes: Vec<FieldChange>,
    at: DateTime<Utc>,
) -> ChangeEvent {
    let summary = summarize(&changes);
    let mut event = base(dog_id, name, source, EventKind::AttributeUpdate, at, summary);
    event.changes = changes;
    event
}

fn describe(change: &FieldChange) -> String {
    let old = if change.old.is_empty() { "?" } else { change.old.as_str() };
    match change.field {
        TrackedField::Weight => format!("Weight: {old} → {} lbs", change.new),
        TrackedField::FitScore => format!("Fit Score: {old} → {}", change.new),
        TrackedField::GoodWithDogs => format!("Good with dogs: {}", change.new),
        TrackedField::GoodWithKids => format!("Good with kids: {}", change.new),
        TrackedField::GoodWithCats => format!("Good with cats: {}", change.new),
        field => format!("{}: {old} → {}", field.as_str(), change.new),
    }
}

fn summarize(changes: &[FieldChange]) -> String {
    let mut summary = changes
        .iter()
        .take(SUMMARY_CHANGES)
        .map(describe)
        .collect::<Vec<_>>()
        .join("; ");
    if changes.len() > SUMMARY_CHANGES {
        summary.push_str(&format!(" (+{} more)", changes.len() - SUMMARY_CHANGES));
    }
    summary
}
