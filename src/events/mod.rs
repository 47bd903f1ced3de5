pub mod changes;
pub mod factory;
pub mod model;
pub mod timeline;

pub use changes::{diff, diff_named, split_status, FieldChange, TrackedField, DEFAULT_TRACKED};
pub use factory::{attribute_update, first_seen, status_change, StatusTransition};
pub use model::{event_id, ChangeEvent, EventKind, Provenance};
pub use timeline::{timeline, TimelineItem};
