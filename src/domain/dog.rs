// src/domain/dog.rs

use super::text::{self, first_rule};
use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Whatever a scraper put in a categorical field. Only text is read;
/// null, numbers, booleans, lists and objects all count as unknown.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawText {
    Text(String),
    Other(IgnoredAny),
}

/// Wires a categorical enum into serde and `Display` through its
/// `parse` / `as_str` pair. Anything unrecognized lands on the enum's
/// default (unknown) variant.
macro_rules! categorical {
    ($ty:ident) => {
        impl From<RawText> for $ty {
            fn from(raw: RawText) -> Self {
                match raw {
                    RawText::Text(text) => $ty::parse(&text),
                    RawText::Other(_) => $ty::default(),
                }
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Listing status as published by a rescue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "RawText", into = "String")]
pub enum DogStatus {
    Upcoming,
    Available,
    Pending,
    /// Terminal: adopted, or gone from the rescue's listings.
    Removed,
    #[default]
    Unknown,
}

// "Not available" must not fall through to the Available rule.
const STATUS_RULES: &[(&[&str], DogStatus)] = &[
    (&["not available", "no longer available", "unavailable"], DogStatus::Removed),
    (&["adopted/removed", "adopted", "removed", "inactive"], DogStatus::Removed),
    (&["adoption pending", "pending"], DogStatus::Pending),
    (&["coming soon", "coming_soon", "upcoming"], DogStatus::Upcoming),
    (&["available", "adoptable"], DogStatus::Available),
];

impl DogStatus {
    pub fn parse(text: &str) -> Self {
        first_rule(text, STATUS_RULES).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DogStatus::Upcoming => "Upcoming",
            DogStatus::Available => "Available",
            DogStatus::Pending => "Pending",
            DogStatus::Removed => "Adopted/Removed",
            DogStatus::Unknown => "Unknown",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DogStatus::Removed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "RawText", into = "String")]
pub enum Shedding {
    None,
    Low,
    Moderate,
    High,
    #[default]
    Unknown,
}

const SHEDDING_RULES: &[(&[&str], Shedding)] = &[
    (&["none", "non-shedding", "non shedding", "doesn't shed", "hypoallergenic"], Shedding::None),
    (&["low", "minimal", "light"], Shedding::Low),
    (&["moderate", "medium", "average"], Shedding::Moderate),
    (&["high", "heavy", "lots"], Shedding::High),
];

impl Shedding {
    pub fn parse(text: &str) -> Self {
        first_rule(text, SHEDDING_RULES).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Shedding::None => "None",
            Shedding::Low => "Low",
            Shedding::Moderate => "Moderate",
            Shedding::High => "High",
            Shedding::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "RawText", into = "String")]
pub enum Energy {
    Low,
    Medium,
    High,
    #[default]
    Unknown,
}

// Compound levels resolve explicitly: "medium-high" is High, "low-medium" is Low.
const ENERGY_RULES: &[(&[&str], Energy)] = &[
    (&["medium-high", "medium high", "moderate-high", "medium to high"], Energy::High),
    (&["low-medium", "low medium", "low-moderate", "low to medium"], Energy::Low),
    (&["low", "calm", "mellow", "lazy", "couch"], Energy::Low),
    (&["high", "active", "energetic", "athletic", "hyper"], Energy::High),
    (&["medium", "moderate", "average"], Energy::Medium),
];

impl Energy {
    pub fn parse(text: &str) -> Self {
        first_rule(text, ENERGY_RULES).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Energy::Low => "Low",
            Energy::Medium => "Medium",
            Energy::High => "High",
            Energy::Unknown => "Unknown",
        }
    }
}

/// Three-valued "good with X" flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "RawText", into = "String")]
pub enum Compatibility {
    Yes,
    No,
    #[default]
    Unknown,
}

// Negations are checked before affirmations so "not good" is a No.
const COMPATIBILITY_RULES: &[(&[&str], Compatibility)] = &[
    (&["unknown", "untested", "not tested", "not sure"], Compatibility::Unknown),
    (&["not good", "doesn't", "does not", "no", "not", "false"], Compatibility::No),
    (&["yes", "true", "good", "ok", "friendly", "gets along"], Compatibility::Yes),
];

impl Compatibility {
    pub fn parse(text: &str) -> Self {
        first_rule(text, COMPATIBILITY_RULES).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Compatibility::Yes => "Yes",
            Compatibility::No => "No",
            Compatibility::Unknown => "Unknown",
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, Compatibility::Yes)
    }
}

categorical!(DogStatus);
categorical!(Shedding);
categorical!(Energy);
categorical!(Compatibility);

/// Source-scoped stable identity: the same dog re-observed on the same
/// rescue always maps to the same id.
/// Example: "doodle_rock_rescue:freddy_faz"
pub fn dog_id(source: &str, name: &str) -> String {
    format!("{}:{}", text::slug(source), text::slug(name))
}

/// A snapshot of one dog's attributes at observation time.
///
/// Each scrape produces a new record; stored history is never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DogRecord {
    /// Empty ids are filled in from `dog_id(source, name)` by the tracker.
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Rescue name; also the reconciliation partition key. A scrape batch
    /// fills it in when the record leaves it out.
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub status: DogStatus,

    /// Raw weight text ("45", "45 lbs", "about 50 pounds").
    #[serde(default, deserialize_with = "text_or_number")]
    pub weight: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub age_text: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub sex: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub breed: Option<String>,
    #[serde(default)]
    pub shedding: Shedding,
    #[serde(default)]
    pub energy: Energy,
    #[serde(default)]
    pub good_with_dogs: Compatibility,
    #[serde(default)]
    pub good_with_kids: Compatibility,
    #[serde(default)]
    pub good_with_cats: Compatibility,
    #[serde(default, deserialize_with = "yes_no")]
    pub special_needs: bool,
    #[serde(default, deserialize_with = "text_or_number")]
    pub adoption_fee: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub source_url: Option<String>,

    // Stamped by the tracker when the record is stored.
    #[serde(default)]
    pub fit_score: Option<i32>,
    #[serde(default)]
    pub observed_at: Option<DateTime<Utc>>,
}

impl DogRecord {
    /// A bare record with every attribute unknown.
    pub fn new(source: impl Into<String>, name: impl Into<String>) -> Self {
        let source = source.into();
        let name = name.into();
        Self {
            id: dog_id(&source, &name),
            name,
            source,
            status: DogStatus::Unknown,
            weight: None,
            age_text: None,
            sex: None,
            breed: None,
            shedding: Shedding::Unknown,
            energy: Energy::Unknown,
            good_with_dogs: Compatibility::Unknown,
            good_with_kids: Compatibility::Unknown,
            good_with_cats: Compatibility::Unknown,
            special_needs: false,
            adoption_fee: None,
            image_url: None,
            source_url: None,
            fit_score: None,
            observed_at: None,
        }
    }

    /// First number found in the weight text, in pounds.
    pub fn weight_lbs(&self) -> Option<f64> {
        parse_leading_number(self.weight.as_deref()?)
    }

    /// The stored form of this record: score and observation time stamped.
    pub fn observed(mut self, at: DateTime<Utc>, fit_score: i32) -> Self {
        self.observed_at = Some(at);
        self.fit_score = Some(fit_score);
        self
    }

    /// A copy carrying a new status, observed at `at`.
    pub fn with_status(&self, status: DogStatus, at: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.status = status;
        next.observed_at = Some(at);
        next
    }
}

fn parse_leading_number(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.trim_end_matches('.').parse().ok()
}

/// Scrapers hand weights over as either numbers or text.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
        Other(IgnoredAny),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.and_then(|raw| match raw {
        Raw::Text(s) => text::clean(Some(&s)),
        Raw::Int(n) => Some(n.to_string()),
        Raw::Float(f) => Some(f.to_string()),
        Raw::Other(_) => None,
    }))
}

/// Flags arrive as booleans or as "Yes"/"No" text. Anything else is `false`.
fn yes_no<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Flag(bool),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Flag(flag)) => flag,
        Some(Raw::Text(s)) => matches!(s.trim().to_lowercase().as_str(), "yes" | "true" | "y"),
        Some(Raw::Other(_)) | None => false,
    })
}
