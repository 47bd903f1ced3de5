// src/events/timeline.rs

use super::model::{ChangeEvent, EventKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Default number of items shown per timeline.
pub const DEFAULT_LIMIT: usize = 20;

/// Display-friendly view of one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineItem {
    pub id: String,
    pub dog_id: String,
    pub dog_name: String,
    pub date: DateTime<Utc>,
    pub kind: EventKind,
    pub icon: &'static str,
    pub summary: String,
    pub source: String,
    pub old_status: Option<String>,
    pub new_status: Option<String>,
}

impl From<&ChangeEvent> for TimelineItem {
    fn from(event: &ChangeEvent) -> Self {
        let is_status = event.kind == EventKind::StatusChange;
        Self {
            id: event.id.clone(),
            dog_id: event.dog_id.clone(),
            dog_name: event.dog_name.clone(),
            date: event.timestamp,
            kind: event.kind,
            icon: event.kind.icon(),
            summary: event.summary.clone(),
            source: event.provenance.tag(),
            old_status: event.old_value.clone().filter(|_| is_status),
            new_status: event.new_value.clone().filter(|_| is_status),
        }
    }
}

impl fmt::Display for TimelineItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}: {}",
            self.icon,
            self.date.format("%Y-%m-%d %H:%M"),
            self.dog_name,
            self.summary
        )
    }
}

/// Newest first, at most `limit` items. Same-timestamp events are ordered by
/// id so repeated calls over the same input agree.
pub fn timeline(events: &[ChangeEvent], limit: usize) -> Vec<TimelineItem> {
    let mut sorted: Vec<&ChangeEvent> = events.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
    sorted.into_iter().take(limit).map(TimelineItem::from).collect()
}
