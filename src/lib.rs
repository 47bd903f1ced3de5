pub mod db;
pub mod domain;
pub mod errors;
pub mod events;
pub mod scoring;
pub mod settings;
pub mod tracking;

#[cfg(test)]
mod tests;

pub use domain::{DogRecord, DogStatus, UserOverrides};
pub use errors::{Result, TrackerError};
pub use events::{timeline, ChangeEvent, EventKind, TimelineItem};
pub use scoring::{score, ScoringConfig};
pub use settings::Settings;
pub use tracking::{DogStore, RunSummary, Tracker};
