//! Bulk sync of a provider's jobs, candidates and placements into a
//! [`SyncStore`].
//!
//! A [`SyncSource`] yields pages of already-mapped records; [`sync_provider`]
//! drains each entity in turn and upserts every record, counting what the
//! store did with it.

use std::future::Future;

use chrono::{DateTime, Utc};
use edge_core::{
  ats::{AtsProvider, MappedCandidate, MappedJob, MappedPlacement},
  store::{SyncStore, UpsertOutcome},
};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
  Error, Result,
  bullhorn::{self, BullhornClient},
  greenhouse::{self, GreenhouseClient},
};

/// Records requested per page.
pub const SYNC_PAGE_SIZE: usize = 100;

/// One page of mapped records.
#[derive(Debug, Clone)]
pub struct Page<T> {
  pub items:    Vec<T>,
  pub has_more: bool,
}

// ─── Source ──────────────────────────────────────────────────────────────────

/// A provider that can list its records page by page. `page` is 0-based.
pub trait SyncSource: Send + Sync {
  fn provider(&self) -> AtsProvider;

  fn jobs_page(
    &self,
    page: usize,
    since: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Page<MappedJob>>> + Send + '_;

  fn candidates_page(
    &self,
    page: usize,
    since: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Page<MappedCandidate>>> + Send + '_;

  /// Records that cannot be tied to a job and a candidate are left out.
  fn placements_page(
    &self,
    page: usize,
    since: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Page<MappedPlacement>>> + Send + '_;
}

impl SyncSource for BullhornClient {
  fn provider(&self) -> AtsProvider { AtsProvider::Bullhorn }

  async fn jobs_page(&self, page: usize, since: Option<DateTime<Utc>>) -> Result<Page<MappedJob>> {
    let resp = self.list_jobs(page * SYNC_PAGE_SIZE, SYNC_PAGE_SIZE, since).await?;
    Ok(Page {
      has_more: resp.has_more(SYNC_PAGE_SIZE),
      items:    resp.data.iter().map(bullhorn::map_job_order).collect(),
    })
  }

  async fn candidates_page(
    &self,
    page: usize,
    since: Option<DateTime<Utc>>,
  ) -> Result<Page<MappedCandidate>> {
    let resp = self.list_candidates(page * SYNC_PAGE_SIZE, SYNC_PAGE_SIZE, since).await?;
    Ok(Page {
      has_more: resp.has_more(SYNC_PAGE_SIZE),
      items:    resp.data.iter().map(bullhorn::map_candidate).collect(),
    })
  }

  async fn placements_page(
    &self,
    page: usize,
    since: Option<DateTime<Utc>>,
  ) -> Result<Page<MappedPlacement>> {
    let resp = self.list_placements(page * SYNC_PAGE_SIZE, SYNC_PAGE_SIZE, since).await?;
    Ok(Page {
      has_more: resp.has_more(SYNC_PAGE_SIZE),
      items:    resp.data.iter().filter_map(bullhorn::map_placement).collect(),
    })
  }
}

impl SyncSource for GreenhouseClient {
  fn provider(&self) -> AtsProvider { AtsProvider::Greenhouse }

  async fn jobs_page(&self, page: usize, since: Option<DateTime<Utc>>) -> Result<Page<MappedJob>> {
    let jobs = self.list_jobs(page + 1, SYNC_PAGE_SIZE, since).await?;
    Ok(Page {
      has_more: jobs.len() >= SYNC_PAGE_SIZE,
      items:    jobs.iter().map(greenhouse::map_job).collect(),
    })
  }

  async fn candidates_page(
    &self,
    page: usize,
    since: Option<DateTime<Utc>>,
  ) -> Result<Page<MappedCandidate>> {
    let candidates = self.list_candidates(page + 1, SYNC_PAGE_SIZE, since).await?;
    Ok(Page {
      has_more: candidates.len() >= SYNC_PAGE_SIZE,
      items:    candidates.iter().map(greenhouse::map_candidate).collect(),
    })
  }

  async fn placements_page(
    &self,
    page: usize,
    since: Option<DateTime<Utc>>,
  ) -> Result<Page<MappedPlacement>> {
    let apps = self.list_hired_applications(page + 1, SYNC_PAGE_SIZE, since).await?;
    Ok(Page {
      has_more: apps.len() >= SYNC_PAGE_SIZE,
      items:    apps.iter().filter_map(greenhouse::map_application_to_placement).collect(),
    })
  }
}

// ─── Summary ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntitySyncCounts {
  pub inserted:  u64,
  pub updated:   u64,
  pub unchanged: u64,
  pub skipped:   u64,
}

impl EntitySyncCounts {
  fn record(&mut self, outcome: UpsertOutcome) {
    match outcome {
      UpsertOutcome::Inserted => self.inserted += 1,
      UpsertOutcome::Updated => self.updated += 1,
      UpsertOutcome::Unchanged => self.unchanged += 1,
      UpsertOutcome::Skipped => self.skipped += 1,
    }
  }

  pub fn total(&self) -> u64 { self.inserted + self.updated + self.unchanged + self.skipped }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
  pub provider:    AtsProvider,
  pub tenant_id:   String,
  pub since:       Option<DateTime<Utc>>,
  pub jobs:        EntitySyncCounts,
  pub candidates:  EntitySyncCounts,
  pub placements:  EntitySyncCounts,
  pub started_at:  DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
}

// ─── Orchestrator ────────────────────────────────────────────────────────────

/// Page through every `fetch` page, upserting each item with `upsert`.
async fn drain<T, F, U>(
  entity: &str,
  mut fetch: impl FnMut(usize) -> F,
  mut upsert: impl FnMut(T) -> U,
) -> Result<EntitySyncCounts>
where
  F: Future<Output = Result<Page<T>>>,
  U: Future<Output = Result<UpsertOutcome>>,
{
  let mut counts = EntitySyncCounts::default();
  let mut page = 0;

  loop {
    let Page { items, has_more } = fetch(page).await?;
    debug!(entity, page, items = items.len(), "fetched sync page");
    for item in items {
      counts.record(upsert(item).await?);
    }
    if !has_more {
      break;
    }
    page += 1;
  }

  Ok(counts)
}

/// Copy every job, candidate and placement modified after `since` (all of
/// them when `None`) from `source` into `store` under `tenant_id`.
///
/// Jobs and candidates are written before placements, which refer to them.
/// The first error stops the sync.
pub async fn sync_provider<S: SyncSource, T: SyncStore>(
  source: &S,
  store: &T,
  tenant_id: &str,
  since: Option<DateTime<Utc>>,
) -> Result<SyncSummary> {
  let provider = source.provider();
  let started_at = Utc::now();
  info!(tenant_id, %provider, ?since, "starting ATS sync");

  let jobs = drain(
    "job",
    |page| source.jobs_page(page, since),
    |job| async move { store.upsert_job(tenant_id, &job).await.map_err(Error::sync_store) },
  )
  .await?;

  let candidates = drain(
    "candidate",
    |page| source.candidates_page(page, since),
    |c| async move { store.upsert_candidate(tenant_id, &c).await.map_err(Error::sync_store) },
  )
  .await?;

  let placements = drain(
    "placement",
    |page| source.placements_page(page, since),
    |p| async move { store.upsert_placement(tenant_id, &p).await.map_err(Error::sync_store) },
  )
  .await?;

  info!(
    tenant_id,
    %provider,
    jobs = jobs.total(),
    candidates = candidates.total(),
    candidates_skipped = candidates.skipped,
    placements = placements.total(),
    "ATS sync finished"
  );

  Ok(SyncSummary {
    provider,
    tenant_id: tenant_id.to_owned(),
    since,
    jobs,
    candidates,
    placements,
    started_at,
    finished_at: Utc::now(),
  })
}
