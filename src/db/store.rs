// src/db/store.rs

use crate::domain::{DogRecord, DogStatus};
use crate::errors::{Result, TrackerError};
use crate::events::{ChangeEvent, EventKind, FieldChange, Provenance, TrackedField};
use crate::tracking::DogStore;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;

// Latest snapshot per dog.
const LATEST_SNAPSHOTS: &str = r#"
    SELECT s.record_json
    FROM dog_snapshots s
    JOIN (SELECT dog_id, MAX(seq) AS seq FROM dog_snapshots GROUP BY dog_id) latest
      ON latest.seq = s.seq
    WHERE s.source = ?1
    ORDER BY s.dog_id
"#;

const ALL_LATEST_SNAPSHOTS: &str = r#"
    SELECT s.record_json
    FROM dog_snapshots s
    JOIN (SELECT dog_id, MAX(seq) AS seq FROM dog_snapshots GROUP BY dog_id) latest
      ON latest.seq = s.seq
    ORDER BY s.dog_id
"#;

const ACTIVE_IDS: &str = r#"
    SELECT s.dog_id
    FROM dog_snapshots s
    JOIN (SELECT dog_id, MAX(seq) AS seq FROM dog_snapshots GROUP BY dog_id) latest
      ON latest.seq = s.seq
    WHERE s.source = ?1 AND s.status != ?2
"#;

const EVENT_COLUMNS: &str = "event_id, dog_id, dog_name, kind, timestamp, field, old_value, new_value, summary, provenance, details_json";

/// Fixed-width UTC text, so string order is time order in SQL.
fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TrackerError::Config(format!("bad timestamp '{text}': {e}")))
}

/// `DogStore` over a SQLite connection (or an open transaction, which derefs
/// to one). Commit and rollback stay with the caller.
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn query_events(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<ChangeEvent>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, EventRow::from_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(ChangeEvent::try_from(row?)?);
        }
        Ok(out)
    }

    fn query_records(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<DogRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;

        let mut out = Vec::new();
        for json in rows {
            out.push(serde_json::from_str(&json?)?);
        }
        Ok(out)
    }
}

/// Raw `dog_events` columns, before any parsing.
struct EventRow {
    id: String,
    dog_id: String,
    dog_name: String,
    kind: String,
    timestamp: String,
    field: Option<String>,
    old_value: Option<String>,
    new_value: Option<String>,
    summary: String,
    provenance: String,
    details_json: String,
}

impl EventRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            dog_id: row.get(1)?,
            dog_name: row.get(2)?,
            kind: row.get(3)?,
            timestamp: row.get(4)?,
            field: row.get(5)?,
            old_value: row.get(6)?,
            new_value: row.get(7)?,
            summary: row.get(8)?,
            provenance: row.get(9)?,
            details_json: row.get(10)?,
        })
    }
}

impl TryFrom<EventRow> for ChangeEvent {
    type Error = TrackerError;

    fn try_from(row: EventRow) -> Result<Self> {
        let kind = EventKind::parse(&row.kind)
            .ok_or_else(|| TrackerError::Config(format!("unknown event kind '{}'", row.kind)))?;
        let field = row
            .field
            .as_deref()
            .map(|name| name.parse::<TrackedField>())
            .transpose()?;
        let changes: Vec<FieldChange> = serde_json::from_str(&row.details_json)?;

        Ok(ChangeEvent {
            id: row.id,
            dog_id: row.dog_id,
            dog_name: row.dog_name,
            kind,
            timestamp: parse_ts(&row.timestamp)?,
            field,
            old_value: row.old_value,
            new_value: row.new_value,
            changes,
            summary: row.summary,
            provenance: Provenance::from_tag(&row.provenance),
        })
    }
}

impl DogStore for SqliteStore<'_> {
    fn save_events(&mut self, events: &[ChangeEvent]) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(
            r#"
            INSERT INTO dog_events (
                event_id, dog_id, dog_name, kind, timestamp,
                field, old_value, new_value, summary, provenance, details_json
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(event_id) DO NOTHING
            "#,
        )?;

        let mut inserted = 0;
        for event in events {
            inserted += stmt.execute(params![
                event.id,
                event.dog_id,
                event.dog_name,
                event.kind.as_str(),
                ts(event.timestamp),
                event.field.map(|f| f.as_str()),
                event.old_value,
                event.new_value,
                event.summary,
                event.provenance.tag(),
                serde_json::to_string(&event.changes)?,
            ])?;
        }
        Ok(inserted)
    }

    fn save_record(&mut self, record: &DogRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO dog_snapshots (dog_id, source, name, status, fit_score, observed_at, record_json)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.id,
                record.source,
                record.name,
                record.status.as_str(),
                record.fit_score,
                record.observed_at.map(ts),
                serde_json::to_string(record)?,
            ],
        )?;
        Ok(())
    }

    fn get_last_record(&self, dog_id: &str) -> Result<Option<DogRecord>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT record_json FROM dog_snapshots WHERE dog_id = ?1 ORDER BY seq DESC LIMIT 1",
                params![dog_id],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn get_active_ids(&self, source: &str) -> Result<BTreeSet<String>> {
        let mut stmt = self.conn.prepare(ACTIVE_IDS)?;
        let rows = stmt.query_map(params![source, DogStatus::Removed.as_str()], |row| {
            row.get::<_, String>(0)
        })?;

        let mut out = BTreeSet::new();
        for r in rows {
            out.insert(r?);
        }
        Ok(out)
    }

    fn set_status(&mut self, dog_id: &str, status: DogStatus, at: DateTime<Utc>) -> Result<()> {
        let last = self
            .get_last_record(dog_id)?
            .ok_or_else(|| TrackerError::NotFound(dog_id.to_string()))?;
        self.save_record(&last.with_status(status, at))
    }

    fn events_for_dog(&self, dog_id: &str) -> Result<Vec<ChangeEvent>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM dog_events WHERE dog_id = ?1 ORDER BY timestamp DESC, event_id ASC"
        );
        self.query_events(&sql, params![dog_id])
    }

    fn recent_events(&self, kind: Option<EventKind>, limit: usize) -> Result<Vec<ChangeEvent>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        match kind {
            Some(kind) => {
                let sql = format!(
                    "SELECT {EVENT_COLUMNS} FROM dog_events WHERE kind = ?1 ORDER BY timestamp DESC, event_id ASC LIMIT ?2"
                );
                self.query_events(&sql, params![kind.as_str(), limit])
            }
            None => {
                let sql = format!(
                    "SELECT {EVENT_COLUMNS} FROM dog_events ORDER BY timestamp DESC, event_id ASC LIMIT ?1"
                );
                self.query_events(&sql, params![limit])
            }
        }
    }

    fn records_for_source(&self, source: &str) -> Result<Vec<DogRecord>> {
        self.query_records(LATEST_SNAPSHOTS, params![source])
    }

    fn latest_records(&self) -> Result<Vec<DogRecord>> {
        self.query_records(ALL_LATEST_SNAPSHOTS, [])
    }

    fn events_since(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<ChangeEvent>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM dog_events WHERE timestamp > ?1 ORDER BY timestamp DESC, event_id ASC LIMIT ?2"
        );
        self.query_events(&sql, params![ts(since), limit])
    }

    fn acknowledge(&mut self, event_ids: &[String], at: DateTime<Utc>) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO acknowledged_events (event_id, acknowledged_at) VALUES (?1, ?2) ON CONFLICT(event_id) DO NOTHING",
        )?;

        let mut added = 0;
        for id in event_ids {
            added += stmt.execute(params![id, ts(at)])?;
        }
        Ok(added)
    }

    fn acknowledged_ids(&self) -> Result<BTreeSet<String>> {
        let mut stmt = self.conn.prepare("SELECT event_id FROM acknowledged_events")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut out = BTreeSet::new();
        for r in rows {
            out.insert(r?);
        }
        Ok(out)
    }

    fn last_check(&self) -> Result<Option<DateTime<Utc>>> {
        let last: Option<String> = self
            .conn
            .query_row("SELECT MAX(acknowledged_at) FROM acknowledged_events", [], |row| row.get(0))?;
        last.as_deref().map(parse_ts).transpose()
    }

    fn unseen_events(&self, limit: usize) -> Result<Vec<ChangeEvent>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM dog_events e \
             WHERE NOT EXISTS (SELECT 1 FROM acknowledged_events a WHERE a.event_id = e.event_id) \
             ORDER BY timestamp DESC, event_id ASC LIMIT ?1"
        );
        self.query_events(&sql, params![limit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::init_schema;
    use crate::events::{attribute_update, first_seen, status_change};
    use chrono::{Duration, TimeZone};

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 6, 0, 0).unwrap()
    }

    fn rex() -> DogRecord {
        DogRecord {
            status: DogStatus::Available,
            weight: Some("45 lbs".into()),
            ..DogRecord::new("Doodle Rock Rescue", "Rex")
        }
        .observed(t0(), 9)
    }

    #[test]
    fn events_round_trip_and_dedupe() {
        let conn = conn();
        let mut store = SqliteStore::new(&conn);

        let seen = first_seen(&rex().id, "Rex", "Doodle Rock Rescue", DogStatus::Available, Some(9), t0());
        let update = attribute_update(
            &rex().id,
            "Rex",
            "Doodle Rock Rescue",
            vec![FieldChange {
                field: TrackedField::Weight,
                old: "45".into(),
                new: "48".into(),
            }],
            t0() + Duration::days(1),
        );

        assert_eq!(store.save_events(&[seen.clone(), update.clone()]).unwrap(), 2);
        assert_eq!(store.save_events(&[seen.clone()]).unwrap(), 0);

        let events = store.events_for_dog(&rex().id).unwrap();
        assert_eq!(events, vec![update, seen]);
        assert_eq!(events[1].provenance, Provenance::RescueSite("doodle_rock".into()));
    }

    #[test]
    fn latest_snapshot_wins() {
        let conn = conn();
        let mut store = SqliteStore::new(&conn);
        store.save_record(&rex()).unwrap();

        let heavier = DogRecord {
            weight: Some("48".into()),
            ..rex()
        };
        store.save_record(&heavier).unwrap();

        let last = store.get_last_record(&rex().id).unwrap().unwrap();
        assert_eq!(last, heavier);
        assert!(store.get_last_record("nobody").unwrap().is_none());
        assert_eq!(store.records_for_source("Doodle Rock Rescue").unwrap(), vec![heavier]);
    }

    #[test]
    fn retired_dogs_leave_the_active_set() {
        let conn = conn();
        let mut store = SqliteStore::new(&conn);
        store.save_record(&rex()).unwrap();
        let zira = DogRecord::new("Doodle Rock Rescue", "Zira").observed(t0(), 2);
        store.save_record(&zira).unwrap();

        store.set_status(&rex().id, DogStatus::Removed, t0()).unwrap();
        let active = store.get_active_ids("Doodle Rock Rescue").unwrap();
        assert_eq!(active.into_iter().collect::<Vec<_>>(), vec![zira.id]);

        let last = store.get_last_record(&rex().id).unwrap().unwrap();
        assert_eq!(last.status, DogStatus::Removed);
        assert_eq!(last.weight.as_deref(), Some("45 lbs"));
        assert!(matches!(
            store.set_status("nobody", DogStatus::Removed, t0()),
            Err(TrackerError::NotFound(_))
        ));
    }

    #[test]
    fn recent_events_filter_and_limit() {
        let conn = conn();
        let mut store = SqliteStore::new(&conn);
        let id = rex().id;
        store
            .save_events(&[
                first_seen(&id, "Rex", "Doodle Rock Rescue", DogStatus::Available, None, t0()),
                status_change(&id, "Rex", "Doodle Rock Rescue", DogStatus::Available, DogStatus::Pending, t0() + Duration::days(1)),
                status_change(&id, "Rex", "Doodle Rock Rescue", DogStatus::Pending, DogStatus::Available, t0() + Duration::days(2)),
            ])
            .unwrap();

        let recent = store.recent_events(None, 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].summary, "Became available again");

        let status = store.recent_events(Some(EventKind::StatusChange), 10).unwrap();
        assert_eq!(status.len(), 2);
        assert!(status.iter().all(|e| e.kind == EventKind::StatusChange));
    }

    #[test]
    fn since_last_check() {
        let conn = conn();
        let mut store = SqliteStore::new(&conn);
        let id = rex().id;
        let seen = first_seen(&id, "Rex", "Doodle Rock Rescue", DogStatus::Available, None, t0());
        let pending = status_change(&id, "Rex", "Doodle Rock Rescue", DogStatus::Available, DogStatus::Pending, t0() + Duration::days(3));
        store.save_events(&[seen.clone(), pending.clone()]).unwrap();

        assert_eq!(store.last_check().unwrap(), None);
        assert_eq!(store.unseen_events(10).unwrap(), vec![pending.clone(), seen.clone()]);

        let checked = t0() + Duration::days(1);
        assert_eq!(store.acknowledge(&[seen.id.clone()], checked).unwrap(), 1);
        assert_eq!(store.acknowledge(&[seen.id.clone()], checked).unwrap(), 0);

        assert_eq!(store.last_check().unwrap(), Some(checked));
        assert_eq!(store.unseen_events(10).unwrap(), vec![pending.clone()]);
        assert_eq!(store.events_since(checked, 10).unwrap(), vec![pending]);
        assert!(store.acknowledged_ids().unwrap().contains(&seen.id));
    }

    #[test]
    fn latest_records_span_sources() {
        let conn = conn();
        let mut store = SqliteStore::new(&conn);
        store.save_record(&rex()).unwrap();
        store.save_record(&DogRecord::new("Other Rescue", "Bo").observed(t0(), 3)).unwrap();
        store.set_status(&rex().id, DogStatus::Pending, t0()).unwrap();

        let latest = store.latest_records().unwrap();
        assert_eq!(latest.len(), 2);
        assert!(latest.iter().any(|r| r.name == "Rex" && r.status == DogStatus::Pending));
    }
}
