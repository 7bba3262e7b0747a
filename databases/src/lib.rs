//! Mapspeak storage layer
//!
//! PostGIS-backed implementations of the core store capabilities:
//! spatial queries over the `layers` schema and saved-query persistence
//! in `main.saved_queries`.

pub mod postgres;

pub use postgres::PostgisStore;
