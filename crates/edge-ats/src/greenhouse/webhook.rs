//! Greenhouse web hooks: signature verification and normalisation.

use chrono::Utc;
use edge_core::ats::{
  AtsProvider, AtsWebhookEnvelope, OutcomeEvent, StageChangeEvent, WebhookMetadata,
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use super::model::{GhApplication, GhNamed};
use crate::normalize::clean;

type HmacSha256 = Hmac<Sha256>;

/// Outcome label for `hire_candidate`.
pub const HIRED: &str = "Hired";
/// Outcome label for `reject_candidate`.
pub const REJECTED: &str = "Rejected";

/// Check a `Signature: sha256 <hex>` header against `body`.
pub fn verify_greenhouse_signature(secret: &str, body: &[u8], header: &str) -> bool {
  let Some(hex_digest) = header.trim().strip_prefix("sha256").map(str::trim) else {
    return false;
  };
  let Ok(expected) = hex::decode(hex_digest) else {
    return false;
  };
  let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
    return false;
  };
  mac.update(body);
  mac.verify_slice(&expected).is_ok()
}

/// The application as embedded in hook payloads: like the API shape but
/// with the candidate nested.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GhHookApplication {
  #[serde(flatten)]
  pub application:    GhApplication,
  pub candidate:      Option<GhNamed>,
  pub previous_stage: Option<GhNamed>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GhHookPayload {
  pub application: Option<GhHookApplication>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GreenhouseWebhookEvent {
  /// `candidate_stage_change`, `hire_candidate`, `reject_candidate`, …
  pub action:  String,
  pub payload: GhHookPayload,
}

/// Map a Greenhouse hook to an envelope; `None` means "drop".
pub fn normalize_greenhouse_webhook_event(
  event: &GreenhouseWebhookEvent,
) -> Option<AtsWebhookEnvelope> {
  let hook = event.payload.application.as_ref()?;
  let app = &hook.application;
  let job_id = app.job_id()?;
  let candidate_id = hook
    .candidate
    .as_ref()
    .map(|c| c.id)
    .filter(|id| *id != 0)
    .or((app.candidate_id != 0).then_some(app.candidate_id))?
    .to_string();
  let occurred_at = app.last_activity_at.unwrap_or_else(Utc::now);

  let mut metadata = WebhookMetadata::for_provider(AtsProvider::Greenhouse);
  metadata.event_type = Some(event.action.clone());

  let label = match event.action.as_str() {
    "candidate_stage_change" => {
      let to_stage = app.current_stage.as_ref().and_then(|s| clean(s.name.as_deref()))?;
      return Some(AtsWebhookEnvelope::StageChange(StageChangeEvent {
        job_id,
        candidate_id,
        application_id: Some(app.id.to_string()),
        from_stage: hook.previous_stage.as_ref().and_then(|s| clean(s.name.as_deref())),
        to_stage,
        occurred_at,
        metadata,
      }));
    }
    "hire_candidate" => HIRED,
    "reject_candidate" => REJECTED,
    _ => return None,
  };

  Some(AtsWebhookEnvelope::Outcome(OutcomeEvent {
    job_id,
    candidate_id,
    placement_id: Some(app.id.to_string()),
    outcome: label.to_owned(),
    occurred_at,
    metadata,
  }))
}
