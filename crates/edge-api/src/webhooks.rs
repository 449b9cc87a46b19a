//! Inbound ATS webhooks.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/webhooks/bullhorn/{tenant_id}` | Bullhorn event subscription entry |
//! | `POST` | `/webhooks/greenhouse/{tenant_id}` | `Signature: sha256 <hex>` checked first |
//!
//! Events that cannot be interpreted are answered `202` with
//! `{"acknowledged": false}` so the provider does not keep retrying them.

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use bytes::Bytes;
use edge_ats::{
  AtsAdapter, UNSUPPORTED_WEBHOOK,
  bullhorn::{
    BullhornAdapter, BullhornApi, BullhornWebhookEvent, PlacementLookup,
    normalize_bullhorn_webhook_event,
  },
  greenhouse::{
    GreenhouseAdapter, GreenhouseApi, GreenhouseWebhookEvent, normalize_greenhouse_webhook_event,
    verify_greenhouse_signature,
  },
};
use edge_core::{
  ats::{AtsWebhookEnvelope, OutcomeAck},
  store::{EventStore, RetentionStore},
};
use tracing::{debug, warn};

use crate::{AppState, error::ApiError, retention::find_tenant};

/// Header carrying the Greenhouse HMAC.
pub const GREENHOUSE_SIGNATURE_HEADER: &str = "Signature";

fn ack_response(ack: OutcomeAck) -> impl IntoResponse {
  let status = if ack.acknowledged { StatusCode::OK } else { StatusCode::ACCEPTED };
  (status, Json(ack))
}

async fn deliver<A: AtsAdapter>(
  adapter: &A,
  envelope: Option<AtsWebhookEnvelope>,
) -> Result<OutcomeAck, ApiError> {
  match envelope {
    Some(envelope) => Ok(adapter.receive_outcome(envelope).await?),
    None => {
      debug!(provider = %adapter.provider(), "dropping webhook event");
      Ok(OutcomeAck::rejected(UNSUPPORTED_WEBHOOK))
    }
  }
}

// ─── Bullhorn ────────────────────────────────────────────────────────────────

/// `POST /webhooks/bullhorn/{tenant_id}`
pub async fn bullhorn<S, B, G>(
  State(state): State<AppState<S, B, G>>,
  Path(tenant_id): Path<String>,
  Json(event): Json<BullhornWebhookEvent>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RetentionStore + EventStore + Clone,
  B: BullhornApi + PlacementLookup + Clone,
{
  let client = state
    .bullhorn
    .as_ref()
    .ok_or_else(|| ApiError::NotFound("Bullhorn integration is not configured".into()))?;
  find_tenant(&*state.store, &tenant_id).await?;

  let envelope = normalize_bullhorn_webhook_event(&event, Some(client)).await?;
  let adapter = BullhornAdapter::new(client.clone(), S::clone(&state.store), tenant_id);
  Ok(ack_response(deliver(&adapter, envelope).await?))
}

// ─── Greenhouse ──────────────────────────────────────────────────────────────

/// `POST /webhooks/greenhouse/{tenant_id}`
///
/// The body is read raw so the signature is checked over the exact bytes
/// Greenhouse signed.
pub async fn greenhouse<S, B, G>(
  State(state): State<AppState<S, B, G>>,
  Path(tenant_id): Path<String>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  S: RetentionStore + EventStore + Clone,
  G: GreenhouseApi + Clone,
{
  if let Some(secret) = &state.greenhouse_webhook_secret {
    let signature = headers
      .get(GREENHOUSE_SIGNATURE_HEADER)
      .and_then(|v| v.to_str().ok())
      .unwrap_or_default();
    if !verify_greenhouse_signature(secret, &body, signature) {
      warn!(tenant_id, "rejecting Greenhouse webhook with a bad signature");
      return Err(ApiError::Unauthorized);
    }
  }

  let client = state
    .greenhouse
    .as_ref()
    .ok_or_else(|| ApiError::NotFound("Greenhouse integration is not configured".into()))?;
  find_tenant(&*state.store, &tenant_id).await?;

  let event: GreenhouseWebhookEvent = serde_json::from_slice(&body)
    .map_err(|e| ApiError::BadRequest(format!("invalid Greenhouse payload: {e}")))?;
  let envelope = normalize_greenhouse_webhook_event(&event);

  let adapter = GreenhouseAdapter::new(client.clone(), S::clone(&state.store), tenant_id);
  Ok(ack_response(deliver(&adapter, envelope).await?))
}
