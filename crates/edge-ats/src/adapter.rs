//! The provider-agnostic adapter contract, plus the event-store plumbing
//! every adapter shares.

use std::future::Future;

use chrono::{DateTime, Utc};
use edge_core::{
  ats::{
    AtsJob, AtsProvider, AtsWebhookEnvelope, IngestedCandidate, IngestedShortlist, OutcomeAck,
    ShortlistPush, ShortlistPushResult,
  },
  events::{OutcomeRecord, ShortlistPushRecord, StageChangeRecord},
  store::EventStore,
};
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Reason given when an envelope's `type` is not understood.
pub const UNSUPPORTED_WEBHOOK: &str = "Unsupported webhook type";

/// One ATS provider, seen through the canonical model.
pub trait AtsAdapter: Send + Sync {
  fn provider(&self) -> AtsProvider;

  fn ingest_job<'a>(
    &'a self,
    job_id: &'a str,
  ) -> impl Future<Output = Result<AtsJob>> + Send + 'a;

  fn ingest_candidate<'a>(
    &'a self,
    job_id: &'a str,
    candidate_id: &'a str,
  ) -> impl Future<Output = Result<IngestedCandidate>> + Send + 'a;

  fn ingest_shortlist<'a>(
    &'a self,
    job_id: &'a str,
  ) -> impl Future<Output = Result<IngestedShortlist>> + Send + 'a;

  /// Send `push.candidates` to the provider and record one shortlist event
  /// per candidate it accepted. A push that fails part-way records the
  /// accepted candidates, then returns [`Error::PartialPush`].
  fn push_shortlist(
    &self,
    push: ShortlistPush,
  ) -> impl Future<Output = Result<ShortlistPushResult>> + Send + '_;

  /// Record a normalised webhook. Unsupported envelopes are acknowledged
  /// with `acknowledged: false` instead of failing.
  fn receive_outcome(
    &self,
    envelope: AtsWebhookEnvelope,
  ) -> impl Future<Output = Result<OutcomeAck>> + Send + '_;
}

/// Stamp `provider` onto `envelope` and hand it to the matching event-store
/// method.
pub(crate) async fn record_envelope<E: EventStore>(
  events: &E,
  tenant_id: &str,
  provider: AtsProvider,
  mut envelope: AtsWebhookEnvelope,
) -> Result<OutcomeAck> {
  if let Some(meta) = envelope.metadata_mut() {
    meta.provider = Some(provider);
  }
  let recorded_at = Utc::now();

  match envelope {
    AtsWebhookEnvelope::StageChange(event) => {
      debug!(tenant_id, %provider, to_stage = %event.to_stage, "recording stage change");
      events
        .record_stage_change(StageChangeRecord {
          tenant_id: tenant_id.to_owned(),
          provider,
          event,
          recorded_at,
        })
        .await
        .map_err(Error::event_store)?;
      Ok(OutcomeAck::accepted())
    }
    AtsWebhookEnvelope::Outcome(event) => {
      debug!(tenant_id, %provider, outcome = %event.outcome, "recording outcome");
      events
        .record_outcome(OutcomeRecord { tenant_id: tenant_id.to_owned(), provider, event, recorded_at })
        .await
        .map_err(Error::event_store)?;
      Ok(OutcomeAck::accepted())
    }
    AtsWebhookEnvelope::Unsupported => Ok(OutcomeAck::rejected(UNSUPPORTED_WEBHOOK)),
  }
}

/// Record the outcome of handing `push` to the provider. `pushed` is the
/// client's result: every candidate on success, or the accepted prefix
/// inside [`Error::PartialPush`].
pub(crate) async fn record_pushed<E: EventStore>(
  events: &E,
  tenant_id: &str,
  provider: AtsProvider,
  push: &ShortlistPush,
  pushed: Result<Vec<String>>,
) -> Result<ShortlistPushResult> {
  let requested_at = Utc::now();
  match pushed {
    Ok(_) => record_shortlist(events, tenant_id, provider, push, requested_at).await,
    Err(Error::PartialPush { created, source }) => {
      let accepted = ShortlistPush {
        job_id:     push.job_id.clone(),
        candidates: push.candidates.iter().take(created.len()).cloned().collect(),
        note:       push.note.clone(),
      };
      warn!(
        tenant_id,
        %provider,
        job_id = %push.job_id,
        accepted = accepted.candidates.len(),
        requested = push.candidates.len(),
        "shortlist push failed part-way"
      );
      record_shortlist(events, tenant_id, provider, &accepted, requested_at).await?;
      Err(Error::PartialPush { created, source })
    }
    Err(e) => Err(e),
  }
}

/// Record one shortlist event per candidate in `push`, after the provider
/// accepted them.
async fn record_shortlist<E: EventStore>(
  events: &E,
  tenant_id: &str,
  provider: AtsProvider,
  push: &ShortlistPush,
  requested_at: DateTime<Utc>,
) -> Result<ShortlistPushResult> {
  for candidate in &push.candidates {
    events
      .record_shortlist_push(ShortlistPushRecord {
        tenant_id: tenant_id.to_owned(),
        provider,
        job_id: push.job_id.clone(),
        candidate_external_id: candidate.external_id.clone(),
        score: candidate.score,
        note: push.note.clone(),
        requested_at,
      })
      .await
      .map_err(Error::event_store)?;
  }

  info!(tenant_id, %provider, job_id = %push.job_id, pushed = push.candidates.len(), "shortlist pushed");
  Ok(ShortlistPushResult {
    pushed: push.candidates.len(),
    external_candidate_ids: push.candidates.iter().map(|c| c.external_id.clone()).collect(),
    requested_at,
  })
}

#[cfg(test)]
mod tests {
  use edge_core::{
    ats::{OutcomeEvent, ShortlistCandidate, WebhookMetadata},
    events::MemoryEventStore,
  };

  use super::*;

  #[tokio::test]
  async fn envelope_provider_is_stamped() {
    let events = MemoryEventStore::new();
    let envelope = AtsWebhookEnvelope::Outcome(OutcomeEvent {
      job_id:       "7".into(),
      candidate_id: "42".into(),
      placement_id: None,
      outcome:      "Hired".into(),
      occurred_at:  Utc::now(),
      metadata:     WebhookMetadata::default(),
    });

    let ack = record_envelope(&events, "t1", AtsProvider::Greenhouse, envelope).await.unwrap();

    assert_eq!(ack, OutcomeAck::accepted());
    let recorded = events.outcomes();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].event.metadata.provider, Some(AtsProvider::Greenhouse));
    assert_eq!(recorded[0].tenant_id, "t1");
  }

  #[tokio::test]
  async fn unsupported_envelope_is_rejected_as_data() {
    let events = MemoryEventStore::new();
    let ack = record_envelope(&events, "t1", AtsProvider::Bullhorn, AtsWebhookEnvelope::Unsupported)
      .await
      .unwrap();

    assert!(!ack.acknowledged);
    assert_eq!(ack.reason.as_deref(), Some(UNSUPPORTED_WEBHOOK));
    assert!(events.outcomes().is_empty());
    assert!(events.stage_changes().is_empty());
  }

  fn three_candidates() -> ShortlistPush {
    ShortlistPush {
      job_id:     "7".into(),
      candidates: ["42", "43", "44"].into_iter().map(ShortlistCandidate::new).collect(),
      note:       None,
    }
  }

  #[tokio::test]
  async fn partial_push_records_accepted_candidates_only() {
    let events = MemoryEventStore::new();
    let pushed = Err(Error::partial_push(vec!["sub-42".into()], Error::Malformed("down".into())));

    let err = record_pushed(&events, "t1", AtsProvider::Bullhorn, &three_candidates(), pushed)
      .await
      .unwrap_err();

    assert!(matches!(&err, Error::PartialPush { created, .. } if created == &["sub-42"]));
    let recorded = events.shortlist_pushes();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].candidate_external_id, "42");
  }

  #[tokio::test]
  async fn push_failing_before_any_candidate_records_nothing() {
    let events = MemoryEventStore::new();
    let pushed = Err(Error::partial_push(Vec::new(), Error::Malformed("down".into())));

    let err = record_pushed(&events, "t1", AtsProvider::Bullhorn, &three_candidates(), pushed)
      .await
      .unwrap_err();

    assert!(matches!(err, Error::Malformed(_)));
    assert!(events.shortlist_pushes().is_empty());
  }
}
