//! Storage port traits.
//!
//! The traits are implemented by storage backends (e.g. `edge-store-sqlite`).
//! The retention engine, the ATS adapters and the sync orchestrator depend on
//! these abstractions only, never on a concrete backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  ats::{MappedCandidate, MappedJob, MappedPlacement},
  events::{OutcomeRecord, ShortlistPushRecord, StageChangeRecord},
  record::{DependentKind, RecordFilter, RecordKind, TenantEntity},
  tenant::Tenant,
};

// ─── Retention ───────────────────────────────────────────────────────────────

/// The narrow relational surface the retention engine needs.
///
/// Each method corresponds to one bulk statement against one table. Callers
/// never pass an empty id slice, but implementations must treat one as a
/// no-op returning `0`.
pub trait RetentionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every tenant, in a stable order.
  fn list_tenants(&self) -> impl Future<Output = Result<Vec<Tenant>, Self::Error>> + Send + '_;

  /// The tenant with `tenant_id`, if any.
  fn get_tenant<'a>(
    &'a self,
    tenant_id: &'a str,
  ) -> impl Future<Output = Result<Option<Tenant>, Self::Error>> + Send + 'a;

  /// Ids of `kind` records matching `filter`.
  ///
  /// With a cutoff, a record matches when its
  /// [`timestamp_field`](RecordKind::timestamp_field) is strictly before the
  /// cutoff and, if the kind supports soft delete, `deleted_at IS NULL`.
  fn select_ids<'a>(
    &'a self,
    kind: RecordKind,
    filter: &'a RecordFilter,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'a;

  /// Scrub `ids` in place:
  ///
  /// - agent run logs: stamp `deleted_at`, clear `input`, `output`,
  ///   `error_message`;
  /// - matches: stamp `deleted_at`, clear `score_breakdown`;
  /// - match results: clear `reasons`;
  /// - candidates: stamp `deleted_at`, replace the name with
  ///   [`REMOVED_CANDIDATE_NAME`](crate::retention::REMOVED_CANDIDATE_NAME),
  ///   null every other PII column and set `status = "deleted"`.
  fn soft_delete<'a>(
    &'a self,
    kind: RecordKind,
    ids: &'a [String],
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Delete rows of `kind` whose `candidate_id` is in `candidate_ids`.
  fn delete_dependents<'a>(
    &'a self,
    kind: DependentKind,
    candidate_ids: &'a [String],
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Delete `kind` records by primary key.
  fn delete_records<'a>(
    &'a self,
    kind: RecordKind,
    ids: &'a [String],
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Delete every `entity` row owned by `tenant_id`.
  fn delete_tenant_entities<'a>(
    &'a self,
    entity: TenantEntity,
    tenant_id: &'a str,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// Persistence seam for ATS stage changes, outcomes and shortlist pushes.
pub trait EventStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn record_stage_change(
    &self,
    record: StageChangeRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn record_outcome(
    &self,
    record: OutcomeRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn record_shortlist_push(
    &self,
    record: ShortlistPushRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Sync ────────────────────────────────────────────────────────────────────

/// What an upsert did to the stored copy of a record.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UpsertOutcome {
  Inserted,
  Updated,
  /// The stored copy already matched the incoming record.
  Unchanged,
  /// The record was deliberately not written (e.g. a soft-deleted
  /// candidate, which must not be repopulated with personal data).
  Skipped,
}

/// Idempotent writes of mapped ATS records, keyed by
/// `(tenant_id, provider, external_id)`.
pub trait SyncStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn upsert_job<'a>(
    &'a self,
    tenant_id: &'a str,
    job: &'a MappedJob,
  ) -> impl Future<Output = Result<UpsertOutcome, Self::Error>> + Send + 'a;

  fn upsert_candidate<'a>(
    &'a self,
    tenant_id: &'a str,
    candidate: &'a MappedCandidate,
  ) -> impl Future<Output = Result<UpsertOutcome, Self::Error>> + Send + 'a;

  fn upsert_placement<'a>(
    &'a self,
    tenant_id: &'a str,
    placement: &'a MappedPlacement,
  ) -> impl Future<Output = Result<UpsertOutcome, Self::Error>> + Send + 'a;
}
