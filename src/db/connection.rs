use rusqlite::Connection;
use std::cell::RefCell;

use crate::errors::{Result, TrackerError};

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

// Thread-local connection slot, remembered together with the path it was
// opened for.
thread_local! {
    static DB_CONN: RefCell<Option<(String, Connection)>> = const { RefCell::new(None) };
}

#[derive(Debug, Clone)]
pub struct Database {
    path: String,
}

impl Database {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Provides a mutable connection to the closure. The connection is opened
    /// on first use in this thread and reused afterwards.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        DB_CONN
            .try_with(|cell| {
                let mut slot = cell.borrow_mut();
                let reusable = matches!(slot.as_ref(), Some((path, _)) if *path == self.path);
                if !reusable {
                    let conn = Connection::open(&self.path)?;
                    *slot = Some((self.path.clone(), conn));
                }
                match slot.as_mut() {
                    Some((_, conn)) => f(conn),
                    None => Err(TrackerError::NotFound(format!("connection for {}", self.path))),
                }
            })
            .map_err(|e| TrackerError::Config(format!("connection slot unavailable: {e}")))?
    }
}

/// Creates the snapshot and event tables if they are missing.
pub fn init_db(db: &Database) -> Result<()> {
    db.with_conn(|conn| init_schema(conn))?;
    tracing::info!("✅ Database initialized at {}", db.path());
    Ok(())
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
