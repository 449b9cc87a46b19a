//! Bullhorn: REST client, mapping, adapter and webhook normalisation.

mod adapter;
mod client;
mod mapping;
mod model;
mod webhook;

pub use adapter::BullhornAdapter;
pub use client::{BullhornApi, BullhornClient, BullhornConfig, SUBMITTED_STATUS};
pub use mapping::{map_candidate, map_job_order, map_placement};
pub use model::{
  BhAddress, BhCandidate, BhJobOrder, BhJobSubmission, BhPage, BhPlacement, BhRef,
};
pub use webhook::{BullhornWebhookEvent, NoLookup, PlacementLookup, normalize_bullhorn_webhook_event};
