//! SQLite backend for the EDGE retention and ATS integration ports.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Foreign keys are enforced, so a
//! deletion cascade issued in the wrong order fails instead of orphaning
//! rows.

mod encode;
mod events;
mod retention;
mod schema;
mod store;
mod sync;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
