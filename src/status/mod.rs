//! HTTP status surface for monitoring: status page, health, stats, backup.

pub mod routes;

pub use routes::{StatusState, status_routes};
