mod sqlite_tests;
pub mod utils;
