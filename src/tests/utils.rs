use crate::db::connection::{init_db, Database};
use crate::domain::{Compatibility, DogRecord, DogStatus, Energy, Shedding};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

/// A fresh on-disk test DB with the production schema.
pub fn init_test_db() -> Database {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let path = env::temp_dir().join(format!("rescue_tracker_test_{nanos}.sqlite"));
    let db = Database::new(path.to_string_lossy().to_string());

    init_db(&db).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    db
}

/// Scrape run `n`, one day apart.
pub fn run_at(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 1, 6, 0, 0).unwrap() + Duration::days(n)
}

/// The reference dog: scores 11 under the default config.
pub fn goldendoodle(source: &str, name: &str) -> DogRecord {
    DogRecord {
        status: DogStatus::Available,
        weight: Some("45".into()),
        shedding: Shedding::None,
        energy: Energy::Low,
        good_with_dogs: Compatibility::Yes,
        breed: Some("Goldendoodle".into()),
        age_text: Some("1.5 yrs".into()),
        ..DogRecord::new(source, name)
    }
}

pub fn plain(source: &str, name: &str) -> DogRecord {
    DogRecord {
        status: DogStatus::Available,
        ..DogRecord::new(source, name)
    }
}
