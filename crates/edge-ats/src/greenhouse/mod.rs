//! Greenhouse: Harvest client, mapping, adapter and webhook handling.

mod adapter;
mod client;
mod mapping;
mod model;
mod webhook;

pub use adapter::GreenhouseAdapter;
pub use client::{GreenhouseApi, GreenhouseClient, GreenhouseConfig};
pub use mapping::{map_application_to_placement, map_candidate, map_job};
pub use model::{GhApplication, GhCandidate, GhJob, GhNamed, GhOffice, GhTypedValue};
pub use webhook::{
  GhHookApplication, GhHookPayload, GreenhouseWebhookEvent, HIRED, REJECTED,
  normalize_greenhouse_webhook_event, verify_greenhouse_signature,
};
