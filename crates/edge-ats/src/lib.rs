//! ATS integration for EDGE: Bullhorn and Greenhouse clients, the mapping
//! layer into the canonical `edge_core::ats` model, [`AtsAdapter`]
//! implementations, webhook normalisation and bulk sync.

pub mod adapter;
pub mod bullhorn;
pub mod error;
pub mod greenhouse;
mod http;
pub mod normalize;
pub mod oauth;
pub mod sync;

pub use adapter::{AtsAdapter, UNSUPPORTED_WEBHOOK};
pub use error::{Error, Result};
pub use sync::{EntitySyncCounts, SyncSource, SyncSummary, sync_provider};
