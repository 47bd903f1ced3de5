use crate::db::SqliteStore;
use crate::domain::{DogRecord, DogStatus};
use crate::events::{first_seen, EventKind};
use crate::settings::Settings;
use crate::tests::utils::{goldendoodle, init_test_db, plain, run_at};
use crate::tracking::{DogStore, MemoryStore, RunSummary, Tracker};
use std::fs;

fn ingest(db: &crate::db::Database, source: &str, dogs: Vec<DogRecord>, run: i64) -> RunSummary {
    let settings = Settings::default();
    db.with_conn(|conn| {
        let tx = conn.transaction()?;
        let summary = {
            let mut store = SqliteStore::new(&tx);
            Tracker::new(&mut store, &settings).process_source(source, dogs, run_at(run))?
        };
        tx.commit()?;
        Ok(summary)
    })
    .expect("ingest failed")
}

#[test]
fn sqlite_and_memory_stores_agree() {
    let db = init_test_db();
    let mut memory = MemoryStore::new();
    let settings = Settings::default();

    let runs = vec![
        vec![goldendoodle("RescueA", "Freddy"), plain("RescueA", "Rex")],
        vec![DogRecord {
            status: DogStatus::Pending,
            weight: Some("48 lbs".into()),
            ..goldendoodle("RescueA", "Freddy")
        }],
    ];

    for (n, dogs) in runs.into_iter().enumerate() {
        let from_sqlite = ingest(&db, "RescueA", dogs.clone(), n as i64);
        let from_memory = Tracker::new(&mut memory, &settings)
            .process_source("RescueA", dogs, run_at(n as i64))
            .unwrap();
        assert_eq!(from_sqlite.events, from_memory.events);
    }

    let stored = db
        .with_conn(|conn| SqliteStore::new(conn).recent_events(None, 50))
        .unwrap();
    assert_eq!(stored, memory.recent_events(None, 50).unwrap());
    assert!(stored.iter().any(|e| e.kind == EventKind::AttributeUpdate && e.changes.len() == 2));

    let _ = fs::remove_file(db.path());
}

#[test]
fn rerun_after_partial_write_does_not_duplicate() {
    let db = init_test_db();
    ingest(&db, "RescueA", vec![plain("RescueA", "Rex")], 0);

    // Events from run 1 landed, the snapshot did not.
    let pending = DogRecord {
        status: DogStatus::Pending,
        ..plain("RescueA", "Rex")
    };
    db.with_conn(|conn| {
        let mut store = SqliteStore::new(conn);
        let settings = Settings::default();
        let mut scratch = MemoryStore::new();
        scratch.save_record(&store.get_last_record("rescuea:rex")?.unwrap_or_else(|| plain("RescueA", "Rex")))?;
        let replay = Tracker::new(&mut scratch, &settings).observe(pending.clone(), run_at(1))?;
        store.save_events(&replay.events)?;
        Ok(())
    })
    .unwrap();

    let count_before: i64 = db
        .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM dog_events", [], |r| r.get(0))?))
        .unwrap();

    ingest(&db, "RescueA", vec![pending], 1);

    let count_after: i64 = db
        .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM dog_events", [], |r| r.get(0))?))
        .unwrap();
    assert_eq!(count_before, count_after);

    let _ = fs::remove_file(db.path());
}

#[test]
fn rolled_back_source_leaves_no_trace() {
    let db = init_test_db();
    let settings = Settings::default();

    db.with_conn(|conn| {
        let tx = conn.transaction()?;
        {
            let mut store = SqliteStore::new(&tx);
            Tracker::new(&mut store, &settings).process_source(
                "RescueA",
                vec![plain("RescueA", "Rex")],
                run_at(0),
            )?;
        }
        tx.rollback()?;
        Ok(())
    })
    .unwrap();

    let active = db
        .with_conn(|conn| SqliteStore::new(conn).get_active_ids("RescueA"))
        .unwrap();
    assert!(active.is_empty());

    let _ = fs::remove_file(db.path());
}

#[test]
fn duplicate_first_seen_is_stored_once() {
    let db = init_test_db();
    let event = first_seen("rescuea:rex", "Rex", "RescueA", DogStatus::Available, Some(2), run_at(0));

    let inserted = db
        .with_conn(|conn| {
            let mut store = SqliteStore::new(conn);
            Ok(store.save_events(&[event.clone()])? + store.save_events(&[event.clone()])?)
        })
        .unwrap();
    assert_eq!(inserted, 1);

    let _ = fs::remove_file(db.path());
}

#[test]
fn since_last_check_survives_reopening() {
    let db = init_test_db();
    ingest(&db, "RescueA", vec![plain("RescueA", "Rex")], 0);

    let acked = db
        .with_conn(|conn| {
            let mut store = SqliteStore::new(conn);
            let ids: Vec<String> = store.unseen_events(100)?.into_iter().map(|e| e.id).collect();
            store.acknowledge(&ids, run_at(1))
        })
        .unwrap();
    assert_eq!(acked, 1);

    ingest(&db, "RescueA", vec![DogRecord { status: DogStatus::Pending, ..plain("RescueA", "Rex") }], 2);

    let (unseen, last) = db
        .with_conn(|conn| {
            let store = SqliteStore::new(conn);
            Ok((store.unseen_events(100)?, store.last_check()?))
        })
        .unwrap();
    assert_eq!(last, Some(run_at(1)));
    assert_eq!(unseen.len(), 1);
    assert_eq!(unseen[0].kind, EventKind::StatusChange);

    let _ = fs::remove_file(db.path());
}
