// src/events/model.rs

use super::changes::{FieldChange, TrackedField};
use crate::domain::text;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    FirstSeen,
    StatusChange,
    AttributeUpdate,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::FirstSeen => "first_seen",
            EventKind::StatusChange => "status_change",
            EventKind::AttributeUpdate => "attribute_update",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "first_seen" => Some(EventKind::FirstSeen),
            "status_change" => Some(EventKind::StatusChange),
            "attribute_update" => Some(EventKind::AttributeUpdate),
            _ => None,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            EventKind::FirstSeen => "🆕",
            EventKind::StatusChange => "📢",
            EventKind::AttributeUpdate => "📝",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an event came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// Observed on a rescue's site; holds the rescue slug.
    RescueSite(String),
    /// Inferred by the tracker (e.g. a dog missing from a scrape).
    System,
}

impl Provenance {
    /// "Doodle Rock Rescue" -> `RescueSite("doodle_rock")`
    pub fn from_rescue_name(rescue: &str) -> Self {
        let slug = text::slug(rescue);
        let slug = slug.strip_suffix("_rescue").unwrap_or(&slug).to_string();
        if slug.is_empty() {
            Provenance::System
        } else {
            Provenance::RescueSite(slug)
        }
    }

    /// Stored tag: "doodle_rock_site" or "system".
    pub fn tag(&self) -> String {
        match self {
            Provenance::RescueSite(slug) => format!("{slug}_site"),
            Provenance::System => "system".to_string(),
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "system" | "" => Provenance::System,
            other => Provenance::RescueSite(other.strip_suffix("_site").unwrap_or(other).to_string()),
        }
    }
}

/// Deterministic event id: `<dog_id>_<kind>_<hash>`.
///
/// Re-processing the same observation yields the same id, so stores can
/// upsert instead of duplicating.
pub fn event_id(dog_id: &str, kind: EventKind, timestamp: DateTime<Utc>) -> String {
    let content = format!(
        "{}|{}|{}",
        dog_id,
        kind.as_str(),
        timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    );
    let digest = Sha256::digest(content.as_bytes());
    let hash: String = digest.iter().take(6).map(|b| format!("{b:02x}")).collect();
    format!("{}_{}_{}", dog_id, kind.as_str(), hash)
}

/// An immutable, append-only fact about one dog.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub id: String,
    pub dog_id: String,
    pub dog_name: String,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    /// Set for single-field events (status changes).
    pub field: Option<TrackedField>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    /// Every field moved by an attribute update, in tracked order.
    pub changes: Vec<FieldChange>,
    pub summary: String,
    pub provenance: Provenance,
}

impl ChangeEvent {
    /// Same event, different origin tag. The id does not depend on provenance.
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }
}
