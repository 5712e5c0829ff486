//! SQLite order store: session handle, query executor, schema, demo data.

pub mod connection;
pub mod executor;
pub mod fixtures;
pub mod schema;
