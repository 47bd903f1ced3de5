// src/events/changes.rs

use crate::domain::{text, Compatibility, DogRecord, DogStatus, Energy, Shedding};
use crate::errors::TrackerError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// An attribute monitored for change detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedField {
    Status,
    Weight,
    Age,
    Breed,
    Shedding,
    #[serde(rename = "energy_level")]
    Energy,
    GoodWithKids,
    GoodWithDogs,
    GoodWithCats,
    SpecialNeeds,
    AdoptionFee,
    FitScore,
}

/// Fields the tracker compares on every re-observation.
pub const DEFAULT_TRACKED: &[TrackedField] = &[
    TrackedField::Status,
    TrackedField::Weight,
    TrackedField::Age,
    TrackedField::Breed,
    TrackedField::Shedding,
    TrackedField::Energy,
    TrackedField::GoodWithKids,
    TrackedField::GoodWithDogs,
    TrackedField::GoodWithCats,
    TrackedField::SpecialNeeds,
    TrackedField::AdoptionFee,
    TrackedField::FitScore,
];

impl TrackedField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackedField::Status => "status",
            TrackedField::Weight => "weight",
            TrackedField::Age => "age",
            TrackedField::Breed => "breed",
            TrackedField::Shedding => "shedding",
            TrackedField::Energy => "energy_level",
            TrackedField::GoodWithKids => "good_with_kids",
            TrackedField::GoodWithDogs => "good_with_dogs",
            TrackedField::GoodWithCats => "good_with_cats",
            TrackedField::SpecialNeeds => "special_needs",
            TrackedField::AdoptionFee => "adoption_fee",
            TrackedField::FitScore => "fit_score",
        }
    }

    /// Normalized string form of this field on `record`. Unknown and missing
    /// values are the empty string.
    pub fn value_of(&self, record: &DogRecord) -> String {
        let known = |s: &'static str, unknown: bool| if unknown { String::new() } else { s.to_string() };
        match self {
            TrackedField::Status => known(record.status.as_str(), record.status == DogStatus::Unknown),
            TrackedField::Weight => match record.weight_lbs() {
                Some(lbs) => format_number(lbs),
                None => text::clean(record.weight.as_deref()).unwrap_or_default(),
            },
            TrackedField::Age => text::clean(record.age_text.as_deref()).unwrap_or_default(),
            TrackedField::Breed => text::clean(record.breed.as_deref()).unwrap_or_default(),
            TrackedField::Shedding => known(record.shedding.as_str(), record.shedding == Shedding::Unknown),
            TrackedField::Energy => known(record.energy.as_str(), record.energy == Energy::Unknown),
            TrackedField::GoodWithKids => compat(record.good_with_kids),
            TrackedField::GoodWithDogs => compat(record.good_with_dogs),
            TrackedField::GoodWithCats => compat(record.good_with_cats),
            TrackedField::SpecialNeeds => (if record.special_needs { "Yes" } else { "No" }).to_string(),
            TrackedField::AdoptionFee => text::clean(record.adoption_fee.as_deref()).unwrap_or_default(),
            TrackedField::FitScore => record.fit_score.map(|s| s.to_string()).unwrap_or_default(),
        }
    }
}

impl FromStr for TrackedField {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DEFAULT_TRACKED
            .iter()
            .copied()
            .find(|f| f.as_str() == s.trim())
            .ok_or_else(|| TrackerError::UnknownField(s.to_string()))
    }
}

fn compat(value: Compatibility) -> String {
    match value {
        Compatibility::Unknown => String::new(),
        other => other.as_str().to_string(),
    }
}

/// "45" rather than "45.0"; keeps real fractions.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// A single tracked field that moved between two observations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: TrackedField,
    pub old: String,
    pub new: String,
}

/// Compares two snapshots of the same dog over `tracked` fields.
///
/// A field is reported only when its normalized value differs AND the new
/// value is non-empty. A value that disappears (populated -> empty) is
/// therefore never reported; incomplete scrapes would otherwise look like
/// data removals. Output follows the order of `tracked`.
pub fn diff(previous: &DogRecord, current: &DogRecord, tracked: &[TrackedField]) -> Vec<FieldChange> {
    let mut changes: Vec<FieldChange> = Vec::new();

    for field in tracked {
        if changes.iter().any(|c| c.field == *field) {
            continue;
        }
        let old = field.value_of(previous);
        let new = field.value_of(current);
        if old != new && !new.is_empty() {
            changes.push(FieldChange { field: *field, old, new });
        }
    }

    changes
}

/// `diff` over field names, e.g. from a settings file.
///
/// Unknown names are a configuration bug and fail before anything is compared.
pub fn diff_named(
    previous: &DogRecord,
    current: &DogRecord,
    tracked: &[&str],
) -> Result<Vec<FieldChange>, TrackerError> {
    let fields = tracked
        .iter()
        .map(|name| name.parse())
        .collect::<Result<Vec<TrackedField>, _>>()?;
    Ok(diff(previous, current, &fields))
}

/// Pulls the status change (if any) out of a diff; status gets its own event.
pub fn split_status(changes: Vec<FieldChange>) -> (Option<FieldChange>, Vec<FieldChange>) {
    let (status, rest): (Vec<_>, Vec<_>) = changes
        .into_iter()
        .partition(|c| c.field == TrackedField::Status);
    (status.into_iter().next(), rest)
}
