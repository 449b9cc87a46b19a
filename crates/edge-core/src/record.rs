//! Record kinds, id sets and deletion counters shared by the retention engine
//! and its storage backends.

use std::ops::AddAssign;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Kinds ───────────────────────────────────────────────────────────────────

/// The four tenant-scoped record types that expire under a retention policy.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordKind {
  AgentRunLog,
  Match,
  MatchResult,
  Candidate,
}

impl RecordKind {
  /// The column whose value decides whether a record has expired.
  pub fn timestamp_field(self) -> &'static str {
    match self {
      Self::AgentRunLog => "started_at",
      Self::Match | Self::MatchResult => "created_at",
      Self::Candidate => "updated_at",
    }
  }

  /// Whether the record carries a `deleted_at` marker.
  ///
  /// Match results have none: a soft delete only clears their `reasons`.
  pub fn supports_soft_delete(self) -> bool { !matches!(self, Self::MatchResult) }
}

/// Rows that exist only through a foreign key to a candidate.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DependentKind {
  CandidateSkill,
  JobCandidate,
  OutreachInteraction,
  MatchResult,
  Match,
}

/// Tenant-level entities removed when a tenant is offboarded.
///
/// None of these reference a candidate, and none reference one another
/// through an enforced key, so they can be deleted in any order once the
/// candidate cascade has run.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TenantEntity {
  FeatureFlag,
  JobSkill,
  JobReq,
  Customer,
  TenantSubscription,
  User,
  UserIdentity,
  AtsPlacement,
  AtsEvent,
}

// ─── Filters and id sets ─────────────────────────────────────────────────────

/// Selection criteria for [`RetentionStore::select_ids`](crate::store::RetentionStore::select_ids).
#[derive(Debug, Clone)]
pub struct RecordFilter {
  pub tenant_id: String,
  /// When set, only records whose timestamp field is strictly before the
  /// cutoff and which are not already soft-deleted match. When `None`, every
  /// record of the tenant matches.
  pub cutoff:    Option<DateTime<Utc>>,
}

impl RecordFilter {
  pub fn expired(tenant_id: impl Into<String>, cutoff: DateTime<Utc>) -> Self {
    Self { tenant_id: tenant_id.into(), cutoff: Some(cutoff) }
  }

  pub fn all(tenant_id: impl Into<String>) -> Self {
    Self { tenant_id: tenant_id.into(), cutoff: None }
  }
}

/// One id list per primary record kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordIds {
  pub agent_run_log_ids: Vec<String>,
  pub match_ids:         Vec<String>,
  pub match_result_ids:  Vec<String>,
  pub candidate_ids:     Vec<String>,
}

impl RecordIds {
  pub fn get(&self, kind: RecordKind) -> &[String] {
    match kind {
      RecordKind::AgentRunLog => &self.agent_run_log_ids,
      RecordKind::Match => &self.match_ids,
      RecordKind::MatchResult => &self.match_result_ids,
      RecordKind::Candidate => &self.candidate_ids,
    }
  }

  pub fn is_empty(&self) -> bool { self.total() == 0 }

  pub fn total(&self) -> usize {
    self.agent_run_log_ids.len()
      + self.match_ids.len()
      + self.match_result_ids.len()
      + self.candidate_ids.len()
  }

  pub fn counts(&self) -> RecordCounts {
    RecordCounts {
      agent_run_logs: self.agent_run_log_ids.len() as u64,
      matches:        self.match_ids.len() as u64,
      match_results:  self.match_result_ids.len() as u64,
      candidates:     self.candidate_ids.len() as u64,
    }
  }
}

// ─── Counters ────────────────────────────────────────────────────────────────

/// Rows affected per primary record kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCounts {
  pub agent_run_logs: u64,
  pub matches:        u64,
  pub match_results:  u64,
  pub candidates:     u64,
}

impl RecordCounts {
  pub fn total(&self) -> u64 {
    self.agent_run_logs + self.matches + self.match_results + self.candidates
  }
}

impl AddAssign for RecordCounts {
  fn add_assign(&mut self, rhs: Self) {
    self.agent_run_logs += rhs.agent_run_logs;
    self.matches += rhs.matches;
    self.match_results += rhs.match_results;
    self.candidates += rhs.candidates;
  }
}

/// Rows removed from candidate-dependent tables during a hard delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentCounts {
  pub candidate_skills:      u64,
  pub job_candidates:        u64,
  pub outreach_interactions: u64,
  pub match_results:         u64,
  pub matches:               u64,
}

impl DependentCounts {
  pub fn total(&self) -> u64 {
    self.candidate_skills
      + self.job_candidates
      + self.outreach_interactions
      + self.match_results
      + self.matches
  }
}

impl AddAssign for DependentCounts {
  fn add_assign(&mut self, rhs: Self) {
    self.candidate_skills += rhs.candidate_skills;
    self.job_candidates += rhs.job_candidates;
    self.outreach_interactions += rhs.outreach_interactions;
    self.match_results += rhs.match_results;
    self.matches += rhs.matches;
  }
}

/// Rows removed per tenant-level entity during offboarding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantEntityCounts {
  pub feature_flags:        u64,
  pub job_skills:           u64,
  pub job_reqs:             u64,
  pub customers:            u64,
  pub tenant_subscriptions: u64,
  pub users:                u64,
  pub user_identities:      u64,
  pub ats_placements:       u64,
  pub ats_events:           u64,
}

impl TenantEntityCounts {
  pub fn total(&self) -> u64 {
    self.feature_flags
      + self.job_skills
      + self.job_reqs
      + self.customers
      + self.tenant_subscriptions
      + self.users
      + self.user_identities
      + self.ats_placements
      + self.ats_events
  }
}
