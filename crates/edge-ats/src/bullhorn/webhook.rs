//! Bullhorn webhook events → [`AtsWebhookEnvelope`].
//!
//! Events this layer cannot interpret are dropped (`Ok(None)`) rather than
//! reported as errors; Bullhorn emits entity types nobody consumes yet.

use std::future::Future;

use chrono::{DateTime, Utc};
use edge_core::ats::{
  AtsProvider, AtsWebhookEnvelope, OutcomeEvent, StageChangeEvent, WebhookMetadata,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
  BhPlacement,
  client::{BullhornApi, BullhornClient},
  model::flexible_id,
};
use crate::{
  Result,
  normalize::{clean, from_epoch_millis},
};

/// A raw Bullhorn event subscription entry, optionally enriched by the
/// sender with the job, candidate and stage it concerns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BullhornWebhookEvent {
  #[serde(deserialize_with = "flexible_id")]
  pub event_id:           Option<String>,
  /// `INSERTED`, `UPDATED`, `DELETED`, …
  pub event_type:         Option<String>,
  pub entity_name:        String,
  #[serde(deserialize_with = "flexible_id")]
  pub entity_id:          Option<String>,
  /// Epoch milliseconds.
  pub event_timestamp:    Option<i64>,
  #[serde(deserialize_with = "flexible_id", alias = "jobOrderId")]
  pub job_id:             Option<String>,
  #[serde(deserialize_with = "flexible_id")]
  pub candidate_id:       Option<String>,
  pub status:             Option<String>,
  pub from_stage:         Option<String>,
  /// Inline placement, sparing a lookup.
  pub placement:          Option<BhPlacement>,
  pub updated_properties: Vec<String>,
}

/// Resolves a placement id that arrived without an inline payload.
pub trait PlacementLookup: Send + Sync {
  fn lookup_placement<'a>(
    &'a self,
    placement_id: &'a str,
  ) -> impl Future<Output = Result<Option<BhPlacement>>> + Send + 'a;
}

impl PlacementLookup for BullhornClient {
  async fn lookup_placement(&self, placement_id: &str) -> Result<Option<BhPlacement>> {
    match self.fetch_placement(placement_id).await {
      Ok(p) => Ok(Some(p)),
      Err(e) if e.is_not_found() => Ok(None),
      Err(e) => Err(e),
    }
  }
}

/// A lookup that never resolves anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

impl PlacementLookup for NoLookup {
  async fn lookup_placement(&self, _: &str) -> Result<Option<BhPlacement>> { Ok(None) }
}

fn metadata(event: &BullhornWebhookEvent) -> WebhookMetadata {
  let mut meta = WebhookMetadata::for_provider(AtsProvider::Bullhorn);
  meta.event_type = clean(event.event_type.as_deref());
  meta.event_id = event.event_id.clone();
  meta.extra.insert("entity_name".into(), event.entity_name.clone().into());
  if let Some(id) = &event.entity_id {
    meta.extra.insert("entity_id".into(), id.clone().into());
  }
  if !event.updated_properties.is_empty() {
    meta.extra.insert("updated_properties".into(), event.updated_properties.clone().into());
  }
  meta
}

/// Map a Bullhorn webhook event to an envelope. `Ok(None)` means "drop".
///
/// - `placement` → `outcome`, using the inline placement or `lookup`.
/// - `jobsubmission` / `candidate` → `stage_change`, the new stage being
///   `status` or else the event type.
/// - anything else, or an event missing its job or candidate, → `None`.
pub async fn normalize_bullhorn_webhook_event<L: PlacementLookup>(
  event: &BullhornWebhookEvent,
  lookup: Option<&L>,
) -> Result<Option<AtsWebhookEnvelope>> {
  let occurred_at: DateTime<Utc> =
    from_epoch_millis(event.event_timestamp).unwrap_or_else(Utc::now);

  match event.entity_name.trim().to_ascii_lowercase().as_str() {
    "placement" => {
      let placement = match (&event.placement, &event.entity_id, lookup) {
        (Some(inline), ..) => Some(inline.clone()),
        (None, Some(id), Some(lookup)) => lookup.lookup_placement(id).await?,
        _ => None,
      };
      let Some(placement) = placement else {
        debug!(entity_id = ?event.entity_id, "dropping unresolvable Bullhorn placement event");
        return Ok(None);
      };

      let job_id = placement.job_order.as_ref().map(|j| j.id.to_string()).or(event.job_id.clone());
      let candidate_id =
        placement.candidate.as_ref().map(|c| c.id.to_string()).or(event.candidate_id.clone());
      let (Some(job_id), Some(candidate_id)) = (job_id, candidate_id) else {
        return Ok(None);
      };

      let outcome = clean(event.status.as_deref())
        .or_else(|| clean(placement.status.as_deref()))
        .or_else(|| clean(event.event_type.as_deref()))
        .unwrap_or_else(|| "Placed".to_owned());

      Ok(Some(AtsWebhookEnvelope::Outcome(OutcomeEvent {
        job_id,
        candidate_id,
        placement_id: Some(placement.id.to_string()),
        outcome,
        occurred_at,
        metadata: metadata(event),
      })))
    }

    "jobsubmission" | "candidate" => {
      let (Some(job_id), Some(candidate_id)) = (&event.job_id, &event.candidate_id) else {
        return Ok(None);
      };
      let Some(to_stage) =
        clean(event.status.as_deref()).or_else(|| clean(event.event_type.as_deref()))
      else {
        return Ok(None);
      };
      let is_submission = event.entity_name.eq_ignore_ascii_case("jobsubmission");

      Ok(Some(AtsWebhookEnvelope::StageChange(StageChangeEvent {
        job_id: job_id.clone(),
        candidate_id: candidate_id.clone(),
        application_id: if is_submission { event.entity_id.clone() } else { None },
        from_stage: clean(event.from_stage.as_deref()),
        to_stage,
        occurred_at,
        metadata: metadata(event),
      })))
    }

    _ => Ok(None),
  }
}
