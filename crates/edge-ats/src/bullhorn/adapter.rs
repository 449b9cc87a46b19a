//! [`AtsAdapter`] for Bullhorn.

use chrono::Utc;
use edge_core::{
  ats::{
    AtsCandidateSummary, AtsJob, AtsProvider, AtsWebhookEnvelope, IngestedCandidate,
    IngestedShortlist, OutcomeAck, ShortlistPush, ShortlistPushResult,
  },
  store::EventStore,
};

use super::{
  client::BullhornApi,
  mapping::{map_candidate, map_job_order},
};
use crate::{
  Result,
  adapter::{AtsAdapter, record_envelope, record_pushed},
  normalize::clean,
};

/// Bullhorn through client `C`, recording events for one tenant into `E`.
pub struct BullhornAdapter<C, E> {
  client:    C,
  events:    E,
  tenant_id: String,
}

impl<C: BullhornApi, E: EventStore> BullhornAdapter<C, E> {
  pub fn new(client: C, events: E, tenant_id: impl Into<String>) -> Self {
    Self { client, events, tenant_id: tenant_id.into() }
  }
}

impl<C: BullhornApi, E: EventStore> AtsAdapter for BullhornAdapter<C, E> {
  fn provider(&self) -> AtsProvider { AtsProvider::Bullhorn }

  async fn ingest_job(&self, job_id: &str) -> Result<AtsJob> {
    let job = self.client.fetch_job(job_id).await?;
    Ok(map_job_order(&job).into())
  }

  async fn ingest_candidate(&self, job_id: &str, candidate_id: &str) -> Result<IngestedCandidate> {
    let (job, candidate) = tokio::try_join!(
      self.client.fetch_job(job_id),
      self.client.fetch_candidate(candidate_id),
    )?;
    Ok(IngestedCandidate {
      job:         map_job_order(&job).into(),
      candidate:   map_candidate(&candidate).into(),
      received_at: Utc::now(),
    })
  }

  async fn ingest_shortlist(&self, job_id: &str) -> Result<IngestedShortlist> {
    let (job, submissions) = tokio::try_join!(
      self.client.fetch_job(job_id),
      self.client.fetch_shortlist_candidates(job_id),
    )?;

    let candidates = submissions
      .into_iter()
      .filter_map(|s| {
        let candidate = s.candidate?;
        Some(AtsCandidateSummary::from(map_candidate(&candidate)).with_stage(clean(s.status.as_deref())))
      })
      .collect();

    Ok(IngestedShortlist { job: map_job_order(&job).into(), candidates, received_at: Utc::now() })
  }

  async fn push_shortlist(&self, push: ShortlistPush) -> Result<ShortlistPushResult> {
    let candidate_ids: Vec<String> = push.candidates.iter().map(|c| c.external_id.clone()).collect();
    let pushed = self.client.push_shortlist(&push.job_id, &candidate_ids, push.note.as_deref()).await;
    record_pushed(&self.events, &self.tenant_id, AtsProvider::Bullhorn, &push, pushed).await
  }

  async fn receive_outcome(&self, envelope: AtsWebhookEnvelope) -> Result<OutcomeAck> {
    record_envelope(&self.events, &self.tenant_id, AtsProvider::Bullhorn, envelope).await
  }
}
