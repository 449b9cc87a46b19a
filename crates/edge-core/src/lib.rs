//! Core types and trait definitions for the EDGE retention and ATS
//! integration subsystem.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement the port traits in [`store`]; the retention
//! engine in [`retention`] is written purely against those traits.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod ats;
pub mod error;
pub mod events;
pub mod record;
pub mod retention;
pub mod store;
pub mod tenant;

pub use error::{Error, Result};
