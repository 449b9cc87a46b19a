//! [`AtsAdapter`] for Greenhouse.

use std::collections::HashMap;

use chrono::Utc;
use edge_core::{
  ats::{
    AtsCandidateSummary, AtsJob, AtsProvider, AtsWebhookEnvelope, IngestedCandidate,
    IngestedShortlist, OutcomeAck, ShortlistPush, ShortlistPushResult,
  },
  store::EventStore,
};
use tracing::warn;

use super::{
  client::GreenhouseApi,
  mapping::{map_candidate, map_job},
  model::GhApplication,
};
use crate::{
  Result,
  adapter::{AtsAdapter, record_envelope, record_pushed},
  normalize::clean,
};

fn stage_of(app: &GhApplication) -> Option<String> {
  app.current_stage.as_ref().and_then(|s| clean(s.name.as_deref()))
}

/// Greenhouse through client `C`, recording events for one tenant into `E`.
pub struct GreenhouseAdapter<C, E> {
  client:    C,
  events:    E,
  tenant_id: String,
}

impl<C: GreenhouseApi, E: EventStore> GreenhouseAdapter<C, E> {
  pub fn new(client: C, events: E, tenant_id: impl Into<String>) -> Self {
    Self { client, events, tenant_id: tenant_id.into() }
  }
}

impl<C: GreenhouseApi, E: EventStore> AtsAdapter for GreenhouseAdapter<C, E> {
  fn provider(&self) -> AtsProvider { AtsProvider::Greenhouse }

  async fn ingest_job(&self, job_id: &str) -> Result<AtsJob> {
    let job = self.client.fetch_job(job_id).await?;
    Ok(map_job(&job).into())
  }

  async fn ingest_candidate(&self, job_id: &str, candidate_id: &str) -> Result<IngestedCandidate> {
    let (job, candidate, applications) = tokio::try_join!(
      self.client.fetch_job(job_id),
      self.client.fetch_candidate(candidate_id),
      self.client.fetch_applications(job_id),
    )?;

    let stage = applications
      .iter()
      .find(|a| a.candidate_id == candidate.id)
      .and_then(stage_of);

    Ok(IngestedCandidate {
      job:         map_job(&job).into(),
      candidate:   AtsCandidateSummary::from(map_candidate(&candidate)).with_stage(stage),
      received_at: Utc::now(),
    })
  }

  /// The job's active applications, one candidate each.
  async fn ingest_shortlist(&self, job_id: &str) -> Result<IngestedShortlist> {
    let (job, applications) =
      tokio::try_join!(self.client.fetch_job(job_id), self.client.fetch_applications(job_id))?;

    let mut stages: HashMap<i64, Option<String>> = HashMap::new();
    for app in applications.iter().filter(|a| a.status.as_deref() != Some("rejected")) {
      stages.entry(app.candidate_id).or_insert_with(|| stage_of(app));
    }

    let mut ids: Vec<i64> = stages.keys().copied().collect();
    ids.sort_unstable();

    let mut candidates = Vec::with_capacity(ids.len());
    for id in ids {
      match self.client.fetch_candidate(&id.to_string()).await {
        Ok(c) => {
          let stage = stages.remove(&id).flatten();
          candidates.push(AtsCandidateSummary::from(map_candidate(&c)).with_stage(stage));
        }
        Err(e) if e.is_not_found() => {
          warn!(job_id, candidate_id = id, "application references a missing candidate");
        }
        Err(e) => return Err(e),
      }
    }

    Ok(IngestedShortlist { job: map_job(&job).into(), candidates, received_at: Utc::now() })
  }

  async fn push_shortlist(&self, push: ShortlistPush) -> Result<ShortlistPushResult> {
    let candidate_ids: Vec<String> = push.candidates.iter().map(|c| c.external_id.clone()).collect();
    let pushed = self.client.push_prospects(&push.job_id, &candidate_ids, push.note.as_deref()).await;
    record_pushed(&self.events, &self.tenant_id, AtsProvider::Greenhouse, &push, pushed).await
  }

  async fn receive_outcome(&self, envelope: AtsWebhookEnvelope) -> Result<OutcomeAck> {
    record_envelope(&self.events, &self.tenant_id, AtsProvider::Greenhouse, envelope).await
  }
}
