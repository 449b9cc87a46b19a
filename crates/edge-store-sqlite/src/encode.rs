//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that SQL string comparison orders them
//! chronologically. Enumerations use their canonical wire spelling.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use edge_core::{
  record::{DependentKind, RecordKind, TenantEntity},
  tenant::{DeletionMode, Tenant},
};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

// ─── Content hashes ──────────────────────────────────────────────────────────

/// SHA-256 hex digest of the record's JSON form; decides whether an upsert
/// changed anything.
pub fn content_hash<T: Serialize>(value: &T) -> Result<String> {
  let bytes = serde_json::to_vec(value)?;
  Ok(hex::encode(Sha256::digest(&bytes)))
}

// ─── Table names ─────────────────────────────────────────────────────────────

pub fn record_table(kind: RecordKind) -> &'static str {
  match kind {
    RecordKind::AgentRunLog => "agent_run_logs",
    RecordKind::Match => "matches",
    RecordKind::MatchResult => "match_results",
    RecordKind::Candidate => "candidates",
  }
}

pub fn dependent_table(kind: DependentKind) -> &'static str {
  match kind {
    DependentKind::CandidateSkill => "candidate_skills",
    DependentKind::JobCandidate => "job_candidates",
    DependentKind::OutreachInteraction => "outreach_interactions",
    DependentKind::MatchResult => "match_results",
    DependentKind::Match => "matches",
  }
}

pub fn tenant_entity_table(entity: TenantEntity) -> &'static str {
  match entity {
    TenantEntity::FeatureFlag => "feature_flags",
    TenantEntity::JobSkill => "job_skills",
    TenantEntity::JobReq => "job_reqs",
    TenantEntity::Customer => "customers",
    TenantEntity::TenantSubscription => "tenant_subscriptions",
    TenantEntity::User => "users",
    TenantEntity::UserIdentity => "user_identities",
    TenantEntity::AtsPlacement => "ats_placements",
    TenantEntity::AtsEvent => "ats_events",
  }
}

/// `?{first}, ?{first+1}, …` for `n` positional parameters.
pub fn placeholders(first: usize, n: usize) -> String {
  (first..first + n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `tenants` row.
pub struct RawTenant {
  pub id:                  String,
  pub name:                String,
  pub data_retention_days: Option<i64>,
  pub deletion_mode:       String,
  pub created_at:          String,
}

impl RawTenant {
  pub const COLUMNS: &'static str = "id, name, data_retention_days, deletion_mode, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      name:                row.get(1)?,
      data_retention_days: row.get(2)?,
      deletion_mode:       row.get(3)?,
      created_at:          row.get(4)?,
    })
  }

  pub fn into_tenant(self) -> Result<Tenant> {
    Ok(Tenant {
      id:                  self.id,
      name:                self.name,
      data_retention_days: self.data_retention_days,
      deletion_mode:       self.deletion_mode.parse::<DeletionMode>()?,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let b = a + chrono::Duration::milliseconds(1);
    let c = a + chrono::Duration::days(400);
    let (ea, eb, ec) = (encode_dt(a), encode_dt(b), encode_dt(c));
    assert!(ea < eb && eb < ec);
    assert_eq!(ea.len(), eb.len());
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn placeholder_numbering() {
    assert_eq!(placeholders(2, 3), "?2, ?3, ?4");
  }
}
