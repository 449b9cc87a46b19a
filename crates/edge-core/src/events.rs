//! ATS event records and the in-memory [`EventStore`] implementation.
//!
//! Production deployments persist events through `edge-store-sqlite`; the
//! in-memory store here is the reference behaviour and the test double.

use std::{
  convert::Infallible,
  sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  ats::{AtsProvider, OutcomeEvent, StageChangeEvent},
  store::EventStore,
};

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageChangeRecord {
  pub tenant_id:   String,
  pub provider:    AtsProvider,
  pub event:       StageChangeEvent,
  pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
  pub tenant_id:   String,
  pub provider:    AtsProvider,
  pub event:       OutcomeEvent,
  pub recorded_at: DateTime<Utc>,
}

/// One candidate sent to an ATS as part of a shortlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortlistPushRecord {
  pub tenant_id:             String,
  pub provider:              AtsProvider,
  pub job_id:                String,
  pub candidate_external_id: String,
  pub score:                 Option<f64>,
  pub note:                  Option<String>,
  pub requested_at:          DateTime<Utc>,
}

// ─── In-memory store ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Inner {
  stage_changes:    Vec<StageChangeRecord>,
  outcomes:         Vec<OutcomeRecord>,
  shortlist_pushes: Vec<ShortlistPushRecord>,
}

/// An [`EventStore`] that keeps everything in process memory.
///
/// Cloning is cheap; clones share the same underlying buffers.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventStore {
  inner: Arc<Mutex<Inner>>,
}

impl MemoryEventStore {
  pub fn new() -> Self { Self::default() }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    // A panic while holding the lock cannot leave the vectors half-written.
    self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  pub fn stage_changes(&self) -> Vec<StageChangeRecord> { self.lock().stage_changes.clone() }

  pub fn outcomes(&self) -> Vec<OutcomeRecord> { self.lock().outcomes.clone() }

  pub fn shortlist_pushes(&self) -> Vec<ShortlistPushRecord> {
    self.lock().shortlist_pushes.clone()
  }
}

impl EventStore for MemoryEventStore {
  type Error = Infallible;

  async fn record_stage_change(&self, record: StageChangeRecord) -> Result<(), Infallible> {
    self.lock().stage_changes.push(record);
    Ok(())
  }

  async fn record_outcome(&self, record: OutcomeRecord) -> Result<(), Infallible> {
    self.lock().outcomes.push(record);
    Ok(())
  }

  async fn record_shortlist_push(&self, record: ShortlistPushRecord) -> Result<(), Infallible> {
    self.lock().shortlist_pushes.push(record);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ats::WebhookMetadata;

  #[tokio::test]
  async fn clones_share_recorded_events() {
    let store = MemoryEventStore::new();
    let clone = store.clone();

    clone
      .record_outcome(OutcomeRecord {
        tenant_id:   "tenant-a".into(),
        provider:    AtsProvider::Bullhorn,
        event:       OutcomeEvent {
          job_id:       "1".into(),
          candidate_id: "2".into(),
          placement_id: Some("3".into()),
          outcome:      "Placed".into(),
          occurred_at:  Utc::now(),
          metadata:     WebhookMetadata::for_provider(AtsProvider::Bullhorn),
        },
        recorded_at: Utc::now(),
      })
      .await
      .unwrap();

    assert_eq!(store.outcomes().len(), 1);
    assert!(store.stage_changes().is_empty());
    assert!(store.shortlist_pushes().is_empty());
  }

  #[tokio::test]
  async fn unawaited_record_is_not_kept() {
    let store = MemoryEventStore::new();
    let pending = store.record_shortlist_push(ShortlistPushRecord {
      tenant_id:             "tenant-a".into(),
      provider:              AtsProvider::Greenhouse,
      job_id:                "11".into(),
      candidate_external_id: "3".into(),
      score:                 None,
      note:                  None,
      requested_at:          Utc::now(),
    });
    drop(pending);
    assert!(store.shortlist_pushes().is_empty());
  }
}
