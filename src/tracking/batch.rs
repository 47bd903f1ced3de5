// src/tracking/batch.rs

use crate::domain::DogRecord;
use crate::errors::Result;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Everything one rescue listed in one scrape.
#[derive(Debug, Clone, Default)]
pub struct ScrapeBatch {
    pub source: String,
    pub dogs: Vec<DogRecord>,
    /// Entries that were not a usable dog at all (no name, not an object).
    pub rejected: usize,
}

#[derive(Deserialize)]
struct RawBatch {
    source: String,
    #[serde(default)]
    dogs: Vec<Value>,
}

/// Parses a scrape file: a JSON list of `{source, dogs}` objects.
///
/// Only the outer shape has to be right. A dog entry that cannot be read is
/// logged and dropped on its own, so it never takes its batch (or any other
/// batch) down with it.
pub fn parse_batches(json: &str) -> Result<Vec<ScrapeBatch>> {
    let raw: Vec<RawBatch> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .map(|batch| {
            let (dogs, rejected) = read_dogs(batch.dogs, Some(&batch.source));
            ScrapeBatch {
                source: batch.source,
                dogs,
                rejected,
            }
        })
        .collect())
}

/// Parses a bare JSON list of dogs, dropping entries that cannot be read.
pub fn parse_dogs(json: &str) -> Result<Vec<DogRecord>> {
    let raw: Vec<Value> = serde_json::from_str(json)?;
    Ok(read_dogs(raw, None).0)
}

fn read_dogs(values: Vec<Value>, source: Option<&str>) -> (Vec<DogRecord>, usize) {
    let mut dogs = Vec::with_capacity(values.len());
    let mut rejected = 0;

    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<DogRecord>(value) {
            Ok(mut dog) => {
                if let Some(source) = source {
                    if dog.source.is_empty() {
                        dog.source = source.to_string();
                    }
                }
                dogs.push(dog);
            }
            Err(e) => {
                warn!(source = source.unwrap_or("-"), index, "unreadable dog entry, skipping: {e}");
                rejected += 1;
            }
        }
    }

    (dogs, rejected)
}
