pub mod analytics;
pub mod batch;
pub mod pipeline;
pub mod reconcile;
pub mod store;

pub use analytics::{adoption_stats, predict_time_to_adoption, transition_stats, AdoptionStats, Prediction};
pub use batch::{parse_batches, parse_dogs, ScrapeBatch};
pub use pipeline::{Observation, RunSummary, Tracker};
pub use reconcile::reconcile;
pub use store::{DogStore, MemoryStore};
