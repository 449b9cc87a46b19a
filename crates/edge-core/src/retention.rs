//! Tenant data retention: policy resolution, expired-record selection and the
//! soft/hard deletion executors.
//!
//! Everything here is written against [`RetentionStore`]; store errors are
//! propagated unmodified. Independent statements within a phase are issued
//! concurrently, tenants are processed one at a time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
  record::{
    DependentCounts, DependentKind, RecordCounts, RecordFilter, RecordIds, RecordKind,
    TenantEntity, TenantEntityCounts,
  },
  store::RetentionStore,
  tenant::{DeletionMode, Tenant},
};

/// Placeholder written over a soft-deleted candidate's name.
pub const REMOVED_CANDIDATE_NAME: &str = "Removed Candidate";

/// Status assigned to a soft-deleted candidate.
pub const DELETED_CANDIDATE_STATUS: &str = "deleted";

// ─── Results ─────────────────────────────────────────────────────────────────

/// A tenant's resolved retention policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
  /// Records strictly older than this instant are expired.
  pub cutoff: DateTime<Utc>,
  pub mode:   DeletionMode,
}

/// Counts from one hard-delete cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardDeleteCounts {
  pub primary:    RecordCounts,
  pub dependents: DependentCounts,
}

/// What a single deletion pass did to a tenant's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionSummary {
  pub mode:       DeletionMode,
  pub records:    RecordCounts,
  /// Always zero for soft deletes.
  pub dependents: DependentCounts,
}

impl DeletionSummary {
  pub fn empty(mode: DeletionMode) -> Self {
    Self { mode, records: RecordCounts::default(), dependents: DependentCounts::default() }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRetentionResult {
  pub tenant_id: String,
  /// `None` when the tenant has no retention policy.
  pub cutoff:    Option<DateTime<Utc>>,
  /// `None` when the tenant was skipped.
  pub summary:   Option<DeletionSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionJobSummary {
  pub tenants_processed: usize,
  /// Tenants with a retention policy (non-null summary).
  pub tenants_acted_on:  usize,
  pub totals:            RecordCounts,
  pub dependent_totals:  DependentCounts,
  pub results:           Vec<TenantRetentionResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantDeletionSummary {
  pub tenant_id:       String,
  pub mode:            DeletionMode,
  pub deletion:        DeletionSummary,
  /// Always zero for soft deletes.
  pub tenant_entities: TenantEntityCounts,
}

/// Read-only view of what the next retention run would do for a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPreview {
  pub tenant_id: String,
  pub policy:    Option<RetentionPolicy>,
  pub expired:   RecordCounts,
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Resolve `tenant`'s retention policy relative to `now`.
///
/// Returns `None` when retention is disabled: no configured day count, or a
/// negative one. A window reaching past the earliest representable instant
/// clamps the cutoff there, so nothing expires.
pub fn resolve_retention_policy(tenant: &Tenant, now: DateTime<Utc>) -> Option<RetentionPolicy> {
  let days = tenant.data_retention_days.filter(|d| *d >= 0)?;
  let cutoff = Duration::try_days(days)
    .and_then(|window| now.checked_sub_signed(window))
    .unwrap_or(DateTime::<Utc>::MIN_UTC);
  Some(RetentionPolicy { cutoff, mode: tenant.deletion_mode })
}

// ─── Selection ───────────────────────────────────────────────────────────────

async fn select_record_ids<S: RetentionStore>(
  store: &S,
  filter: &RecordFilter,
) -> Result<RecordIds, S::Error> {
  let (agent_run_log_ids, match_ids, match_result_ids, candidate_ids) = tokio::try_join!(
    store.select_ids(RecordKind::AgentRunLog, filter),
    store.select_ids(RecordKind::Match, filter),
    store.select_ids(RecordKind::MatchResult, filter),
    store.select_ids(RecordKind::Candidate, filter),
  )?;

  Ok(RecordIds { agent_run_log_ids, match_ids, match_result_ids, candidate_ids })
}

/// Ids of `tenant_id`'s records that expired before `cutoff` and are not
/// already soft-deleted.
pub async fn find_expired_records<S: RetentionStore>(
  store: &S,
  tenant_id: &str,
  cutoff: DateTime<Utc>,
) -> Result<RecordIds, S::Error> {
  select_record_ids(store, &RecordFilter::expired(tenant_id, cutoff)).await
}

/// Ids of every primary record `tenant_id` owns, regardless of age or
/// soft-deletion state.
pub async fn collect_tenant_data<S: RetentionStore>(
  store: &S,
  tenant_id: &str,
) -> Result<RecordIds, S::Error> {
  select_record_ids(store, &RecordFilter::all(tenant_id)).await
}

// ─── Soft delete ─────────────────────────────────────────────────────────────

async fn soft_delete_kind<S: RetentionStore>(
  store: &S,
  kind: RecordKind,
  ids: &[String],
  now: DateTime<Utc>,
) -> Result<u64, S::Error> {
  if ids.is_empty() {
    return Ok(0);
  }
  store.soft_delete(kind, ids, now).await
}

/// Scrub every record in `ids` in place. Dependent tables are not touched.
pub async fn soft_delete_records<S: RetentionStore>(
  store: &S,
  ids: &RecordIds,
  now: DateTime<Utc>,
) -> Result<RecordCounts, S::Error> {
  let (agent_run_logs, matches, match_results, candidates) = tokio::try_join!(
    soft_delete_kind(store, RecordKind::AgentRunLog, &ids.agent_run_log_ids, now),
    soft_delete_kind(store, RecordKind::Match, &ids.match_ids, now),
    soft_delete_kind(store, RecordKind::MatchResult, &ids.match_result_ids, now),
    soft_delete_kind(store, RecordKind::Candidate, &ids.candidate_ids, now),
  )?;

  Ok(RecordCounts { agent_run_logs, matches, match_results, candidates })
}

/// Select and scrub `tenant_id`'s records that expired before `cutoff`.
///
/// Running this twice is a no-op the second time: scrubbed rows carry
/// `deleted_at` and drop out of the selection.
pub async fn soft_delete_expired_records<S: RetentionStore>(
  store: &S,
  tenant_id: &str,
  cutoff: DateTime<Utc>,
  now: DateTime<Utc>,
) -> Result<RecordCounts, S::Error> {
  let ids = find_expired_records(store, tenant_id, cutoff).await?;
  soft_delete_records(store, &ids, now).await
}

// ─── Hard delete ─────────────────────────────────────────────────────────────

async fn delete_dependents_of<S: RetentionStore>(
  store: &S,
  kind: DependentKind,
  candidate_ids: &[String],
) -> Result<u64, S::Error> {
  if candidate_ids.is_empty() {
    return Ok(0);
  }
  store.delete_dependents(kind, candidate_ids).await
}

async fn delete_kind<S: RetentionStore>(
  store: &S,
  kind: RecordKind,
  ids: &[String],
) -> Result<u64, S::Error> {
  if ids.is_empty() {
    return Ok(0);
  }
  store.delete_records(kind, ids).await
}

/// Physically remove `ids` together with every row that references one of
/// the candidates.
///
/// Dependents are removed (phase 1) before any primary record (phase 2);
/// reversing the phases violates the candidate foreign keys. The phases are
/// not wrapped in a transaction.
pub async fn hard_delete_records<S: RetentionStore>(
  store: &S,
  ids: &RecordIds,
) -> Result<HardDeleteCounts, S::Error> {
  let candidate_ids = ids.candidate_ids.as_slice();

  let (candidate_skills, job_candidates, outreach_interactions, dep_match_results, dep_matches) =
    tokio::try_join!(
      delete_dependents_of(store, DependentKind::CandidateSkill, candidate_ids),
      delete_dependents_of(store, DependentKind::JobCandidate, candidate_ids),
      delete_dependents_of(store, DependentKind::OutreachInteraction, candidate_ids),
      delete_dependents_of(store, DependentKind::MatchResult, candidate_ids),
      delete_dependents_of(store, DependentKind::Match, candidate_ids),
    )?;

  let (match_results, matches, agent_run_logs, candidates) = tokio::try_join!(
    delete_kind(store, RecordKind::MatchResult, &ids.match_result_ids),
    delete_kind(store, RecordKind::Match, &ids.match_ids),
    delete_kind(store, RecordKind::AgentRunLog, &ids.agent_run_log_ids),
    delete_kind(store, RecordKind::Candidate, &ids.candidate_ids),
  )?;

  Ok(HardDeleteCounts {
    primary:    RecordCounts { agent_run_logs, matches, match_results, candidates },
    dependents: DependentCounts {
      candidate_skills,
      job_candidates,
      outreach_interactions,
      match_results: dep_match_results,
      matches: dep_matches,
    },
  })
}

async fn execute_deletion<S: RetentionStore>(
  store: &S,
  ids: &RecordIds,
  mode: DeletionMode,
  now: DateTime<Utc>,
) -> Result<DeletionSummary, S::Error> {
  match mode {
    DeletionMode::SoftDelete => {
      let records = soft_delete_records(store, ids, now).await?;
      Ok(DeletionSummary { mode, records, dependents: DependentCounts::default() })
    }
    DeletionMode::HardDelete => {
      let counts = hard_delete_records(store, ids).await?;
      Ok(DeletionSummary { mode, records: counts.primary, dependents: counts.dependents })
    }
  }
}

// ─── Per-tenant processing ───────────────────────────────────────────────────

/// Apply `tenant`'s retention policy once.
pub async fn process_tenant_retention<S: RetentionStore>(
  store: &S,
  tenant: &Tenant,
  now: DateTime<Utc>,
) -> Result<TenantRetentionResult, S::Error> {
  let Some(policy) = resolve_retention_policy(tenant, now) else {
    debug!(tenant_id = %tenant.id, "no retention policy; skipping tenant");
    return Ok(TenantRetentionResult { tenant_id: tenant.id.clone(), cutoff: None, summary: None });
  };

  let ids = find_expired_records(store, &tenant.id, policy.cutoff).await?;

  let summary = if ids.is_empty() {
    debug!(tenant_id = %tenant.id, cutoff = %policy.cutoff, "no expired records");
    DeletionSummary::empty(policy.mode)
  } else {
    execute_deletion(store, &ids, policy.mode, now).await?
  };

  Ok(TenantRetentionResult {
    tenant_id: tenant.id.clone(),
    cutoff:    Some(policy.cutoff),
    summary:   Some(summary),
  })
}

/// Read-only counterpart of [`process_tenant_retention`].
pub async fn preview_tenant_retention<S: RetentionStore>(
  store: &S,
  tenant: &Tenant,
  now: DateTime<Utc>,
) -> Result<RetentionPreview, S::Error> {
  let policy = resolve_retention_policy(tenant, now);
  let expired = match policy {
    Some(p) => find_expired_records(store, &tenant.id, p.cutoff).await?.counts(),
    None => RecordCounts::default(),
  };
  Ok(RetentionPreview { tenant_id: tenant.id.clone(), policy, expired })
}

// ─── Job runner ──────────────────────────────────────────────────────────────

/// Apply every tenant's retention policy, one tenant at a time.
///
/// The first store error aborts the run: it is logged with the failing
/// tenant and returned as-is, and later tenants are not processed.
pub async fn run_tenant_retention_job<S: RetentionStore>(
  store: &S,
  now: DateTime<Utc>,
) -> Result<RetentionJobSummary, S::Error> {
  let tenants = store.list_tenants().await?;
  let mut summary = RetentionJobSummary::default();

  for tenant in &tenants {
    let result = match process_tenant_retention(store, tenant, now).await {
      Ok(r) => r,
      Err(e) => {
        error!(tenant_id = %tenant.id, error = %e, "retention pass failed; aborting job");
        return Err(e);
      }
    };

    summary.tenants_processed += 1;
    if let Some(s) = &result.summary {
      summary.tenants_acted_on += 1;
      summary.totals += s.records;
      summary.dependent_totals += s.dependents;
      if s.records.total() > 0 {
        info!(
          tenant_id = %tenant.id,
          mode = %s.mode,
          records = s.records.total(),
          dependents = s.dependents.total(),
          "retention pass applied"
        );
      }
    }
    summary.results.push(result);
  }

  info!(
    tenants = summary.tenants_processed,
    acted_on = summary.tenants_acted_on,
    records = summary.totals.total(),
    "retention job finished"
  );
  Ok(summary)
}

// ─── Offboarding ─────────────────────────────────────────────────────────────

async fn delete_tenant_entities<S: RetentionStore>(
  store: &S,
  tenant_id: &str,
) -> Result<TenantEntityCounts, S::Error> {
  let (
    feature_flags,
    job_skills,
    job_reqs,
    customers,
    tenant_subscriptions,
    users,
    user_identities,
    ats_placements,
    ats_events,
  ) = tokio::try_join!(
    store.delete_tenant_entities(TenantEntity::FeatureFlag, tenant_id),
    store.delete_tenant_entities(TenantEntity::JobSkill, tenant_id),
    store.delete_tenant_entities(TenantEntity::JobReq, tenant_id),
    store.delete_tenant_entities(TenantEntity::Customer, tenant_id),
    store.delete_tenant_entities(TenantEntity::TenantSubscription, tenant_id),
    store.delete_tenant_entities(TenantEntity::User, tenant_id),
    store.delete_tenant_entities(TenantEntity::UserIdentity, tenant_id),
    store.delete_tenant_entities(TenantEntity::AtsPlacement, tenant_id),
    store.delete_tenant_entities(TenantEntity::AtsEvent, tenant_id),
  )?;

  Ok(TenantEntityCounts {
    feature_flags,
    job_skills,
    job_reqs,
    customers,
    tenant_subscriptions,
    users,
    user_identities,
    ats_placements,
    ats_events,
  })
}

/// Delete all of `tenant_id`'s data, ignoring its retention window.
///
/// A hard delete leaves nothing behind but the tenant row itself; a soft
/// delete scrubs the primary records and leaves tenant-level entities alone.
pub async fn delete_tenant_data<S: RetentionStore>(
  store: &S,
  tenant_id: &str,
  mode: DeletionMode,
  now: DateTime<Utc>,
) -> Result<TenantDeletionSummary, S::Error> {
  let ids = collect_tenant_data(store, tenant_id).await?;
  let deletion = execute_deletion(store, &ids, mode, now).await?;

  let tenant_entities = match mode {
    DeletionMode::HardDelete => delete_tenant_entities(store, tenant_id).await?,
    DeletionMode::SoftDelete => TenantEntityCounts::default(),
  };

  info!(
    tenant_id,
    mode = %mode,
    records = deletion.records.total(),
    dependents = deletion.dependents.total(),
    tenant_entities = tenant_entities.total(),
    "tenant data deleted"
  );

  Ok(TenantDeletionSummary { tenant_id: tenant_id.to_owned(), mode, deletion, tenant_entities })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::{
    future::Future,
    sync::{Arc, Mutex},
  };

  use chrono::TimeZone;

  use super::*;

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() }

  #[test]
  fn null_or_negative_retention_has_no_policy() {
    let tenant = Tenant::new("t", "T");
    assert!(resolve_retention_policy(&tenant, now()).is_none());

    let negative = Tenant::new("t", "T").with_retention(Some(-1), DeletionMode::HardDelete);
    assert!(resolve_retention_policy(&negative, now()).is_none());
  }

  #[test]
  fn cutoff_is_exactly_n_days_before_now() {
    for days in [0_i64, 1, 30, 365] {
      let tenant = Tenant::new("t", "T").with_retention(Some(days), DeletionMode::SoftDelete);
      let policy = resolve_retention_policy(&tenant, now()).unwrap();
      assert_eq!(policy.cutoff, now() - Duration::days(days));
      assert_eq!(policy.mode, DeletionMode::SoftDelete);
    }
  }

  #[tokio::test]
  async fn oversized_window_keeps_policy_and_expires_nothing() {
    let tenant = Tenant::new("t", "T").with_retention(Some(1_000_000_000), DeletionMode::HardDelete);
    let policy = resolve_retention_policy(&tenant, now()).unwrap();
    assert_eq!(policy.cutoff, DateTime::<Utc>::MIN_UTC);
    assert_eq!(policy.mode, DeletionMode::HardDelete);

    let store = RecordingStore::default();
    let result = process_tenant_retention(&store, &tenant, now()).await.unwrap();
    assert_eq!(result.cutoff, Some(DateTime::<Utc>::MIN_UTC));
    assert_eq!(result.summary, Some(DeletionSummary::empty(DeletionMode::HardDelete)));
  }

  /// Canned ids per kind; every mutating call is appended to `calls`.
  #[derive(Default, Clone)]
  struct RecordingStore {
    tenants: Vec<Tenant>,
    ids:     RecordIds,
    calls:   Arc<Mutex<Vec<String>>>,
  }

  impl RecordingStore {
    fn log(&self, entry: String) { self.calls.lock().unwrap().push(entry); }

    fn calls(&self) -> Vec<String> { self.calls.lock().unwrap().clone() }
  }

  #[derive(Debug, thiserror::Error)]
  #[error("boom")]
  struct Boom;

  impl RetentionStore for RecordingStore {
    type Error = Boom;

    fn list_tenants(&self) -> impl Future<Output = Result<Vec<Tenant>, Boom>> + Send + '_ {
      let tenants = self.tenants.clone();
      async move { Ok(tenants) }
    }

    async fn get_tenant(&self, tenant_id: &str) -> Result<Option<Tenant>, Boom> {
      Ok(self.tenants.iter().find(|t| t.id == tenant_id).cloned())
    }

    async fn select_ids(&self, kind: RecordKind, filter: &RecordFilter) -> Result<Vec<String>, Boom> {
      if filter.tenant_id == "broken" {
        return Err(Boom);
      }
      Ok(self.ids.get(kind).to_vec())
    }

    async fn soft_delete(&self, kind: RecordKind, ids: &[String], _: DateTime<Utc>) -> Result<u64, Boom> {
      self.log(format!("soft:{kind}"));
      Ok(ids.len() as u64)
    }

    async fn delete_dependents(&self, kind: DependentKind, ids: &[String]) -> Result<u64, Boom> {
      self.log(format!("dependents:{kind}"));
      Ok(ids.len() as u64)
    }

    async fn delete_records(&self, kind: RecordKind, ids: &[String]) -> Result<u64, Boom> {
      self.log(format!("records:{kind}"));
      Ok(ids.len() as u64)
    }

    async fn delete_tenant_entities(&self, entity: TenantEntity, _: &str) -> Result<u64, Boom> {
      self.log(format!("entity:{entity}"));
      Ok(0)
    }
  }

  #[tokio::test]
  async fn nothing_expired_issues_no_statements() {
    let store = RecordingStore::default();
    let tenant = Tenant::new("a", "A").with_retention(Some(30), DeletionMode::HardDelete);

    let result = process_tenant_retention(&store, &tenant, now()).await.unwrap();

    assert_eq!(result.cutoff, Some(now() - Duration::days(30)));
    assert_eq!(result.summary, Some(DeletionSummary::empty(DeletionMode::HardDelete)));
    assert!(store.calls().is_empty());
  }

  #[tokio::test]
  async fn hard_delete_removes_dependents_first() {
    let store = RecordingStore {
      ids: RecordIds {
        candidate_ids: vec!["c1".into()],
        match_ids: vec!["m1".into()],
        ..Default::default()
      },
      ..Default::default()
    };

    let counts = hard_delete_records(&store, &store.ids.clone()).await.unwrap();
    assert_eq!(counts.primary.candidates, 1);
    assert_eq!(counts.dependents.candidate_skills, 1);

    let calls = store.calls();
    let last_dependent = calls.iter().rposition(|c| c.starts_with("dependents:")).unwrap();
    let first_primary = calls.iter().position(|c| c.starts_with("records:")).unwrap();
    assert!(last_dependent < first_primary, "calls out of order: {calls:?}");
    // Empty id lists never reach the store.
    assert!(!calls.contains(&"records:agent_run_log".to_string()));
  }

  #[tokio::test]
  async fn soft_delete_never_touches_dependents() {
    let store = RecordingStore {
      ids: RecordIds { candidate_ids: vec!["c1".into()], ..Default::default() },
      ..Default::default()
    };
    let tenant = Tenant::new("a", "A").with_retention(Some(1), DeletionMode::SoftDelete);

    let result = process_tenant_retention(&store, &tenant, now()).await.unwrap();

    assert_eq!(result.summary.unwrap().records.candidates, 1);
    assert_eq!(store.calls(), vec!["soft:candidate".to_string()]);
  }

  #[tokio::test]
  async fn job_runner_aggregates_and_skips_tenants_without_policy() {
    let store = RecordingStore {
      tenants: vec![
        Tenant::new("a", "A").with_retention(Some(10), DeletionMode::SoftDelete),
        Tenant::new("b", "B"),
        Tenant::new("c", "C").with_retention(Some(5), DeletionMode::HardDelete),
      ],
      ids: RecordIds { agent_run_log_ids: vec!["l1".into(), "l2".into()], ..Default::default() },
      ..Default::default()
    };

    let summary = run_tenant_retention_job(&store, now()).await.unwrap();

    assert_eq!(summary.tenants_processed, 3);
    assert_eq!(summary.tenants_acted_on, 2);
    assert_eq!(summary.totals.agent_run_logs, 4);
    assert!(summary.results[1].summary.is_none());
    assert!(summary.results[1].cutoff.is_none());
  }

  #[tokio::test]
  async fn job_runner_stops_at_first_failing_tenant() {
    let store = RecordingStore {
      tenants: vec![
        Tenant::new("broken", "Broken").with_retention(Some(1), DeletionMode::HardDelete),
        Tenant::new("after", "After").with_retention(Some(1), DeletionMode::HardDelete),
      ],
      ids: RecordIds { candidate_ids: vec!["c1".into()], ..Default::default() },
      ..Default::default()
    };

    assert!(run_tenant_retention_job(&store, now()).await.is_err());
    assert!(store.calls().is_empty());
  }

  #[tokio::test]
  async fn soft_offboarding_leaves_tenant_entities() {
    let store = RecordingStore {
      ids: RecordIds { match_result_ids: vec!["r1".into()], ..Default::default() },
      ..Default::default()
    };

    let summary = delete_tenant_data(&store, "a", DeletionMode::SoftDelete, now()).await.unwrap();

    assert_eq!(summary.deletion.records.match_results, 1);
    assert_eq!(summary.tenant_entities.total(), 0);
    assert!(store.calls().iter().all(|c| !c.starts_with("entity:")));
  }
}
