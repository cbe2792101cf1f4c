pub mod connection;
pub mod operations;

pub use connection::{initialize_schema, open_database, DB_SCHEMA};
pub use operations::{fetch_readings, store_reading};
