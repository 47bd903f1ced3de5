pub mod connection;
pub mod store;

pub use connection::{init_db, init_schema, Database};
pub use store::SqliteStore;
