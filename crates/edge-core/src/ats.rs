//! Canonical, provider-agnostic ATS shapes.
//!
//! Provider payloads (Bullhorn, Greenhouse) are mapped into the `Mapped*`
//! records by `edge-ats`; adapters expose the slimmer [`AtsJob`] and
//! [`AtsCandidateSummary`] projections. Inbound webhooks are normalised into
//! an [`AtsWebhookEnvelope`].

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Provider ────────────────────────────────────────────────────────────────

/// The third-party system of record a job or candidate came from.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AtsProvider {
  Bullhorn,
  Greenhouse,
}

impl FromStr for AtsProvider {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "bullhorn" => Ok(Self::Bullhorn),
      "greenhouse" => Ok(Self::Greenhouse),
      _ => Err(Error::UnknownProvider(s.to_owned())),
    }
  }
}

// ─── Mapped records ──────────────────────────────────────────────────────────

/// A job requisition in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedJob {
  pub provider:        AtsProvider,
  pub external_id:     String,
  pub title:           String,
  pub status:          Option<String>,
  pub is_open:         bool,
  pub employment_type: Option<String>,
  pub location:        Option<String>,
  pub department:      Option<String>,
  pub client_name:     Option<String>,
  pub description:     Option<String>,
  pub skills:          Vec<String>,
  pub created_at:      Option<DateTime<Utc>>,
  pub updated_at:      Option<DateTime<Utc>>,
}

/// A candidate in canonical form. Every PII field is optional so a scrubbed
/// record is representable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedCandidate {
  pub provider:        AtsProvider,
  pub external_id:     String,
  pub full_name:       String,
  pub first_name:      Option<String>,
  pub last_name:       Option<String>,
  pub email:           Option<String>,
  pub phone:           Option<String>,
  pub location:        Option<String>,
  pub current_title:   Option<String>,
  pub current_company: Option<String>,
  pub status:          Option<String>,
  pub skills:          Vec<String>,
  pub created_at:      Option<DateTime<Utc>>,
  pub updated_at:      Option<DateTime<Utc>>,
}

/// A hire: the link between a job and the candidate who filled it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedPlacement {
  pub provider:              AtsProvider,
  pub external_id:           String,
  pub job_external_id:       String,
  pub candidate_external_id: String,
  pub status:                Option<String>,
  pub start_date:            Option<NaiveDate>,
  pub end_date:              Option<NaiveDate>,
  pub salary:                Option<f64>,
  pub created_at:            Option<DateTime<Utc>>,
  pub updated_at:            Option<DateTime<Utc>>,
}

// ─── Adapter projections ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtsJob {
  pub provider:        AtsProvider,
  pub id:              String,
  pub title:           String,
  pub status:          Option<String>,
  pub is_open:         bool,
  pub location:        Option<String>,
  pub department:      Option<String>,
  pub employment_type: Option<String>,
  pub description:     Option<String>,
  pub updated_at:      Option<DateTime<Utc>>,
}

impl From<MappedJob> for AtsJob {
  fn from(job: MappedJob) -> Self {
    Self {
      provider:        job.provider,
      id:              job.external_id,
      title:           job.title,
      status:          job.status,
      is_open:         job.is_open,
      location:        job.location,
      department:      job.department.or(job.client_name),
      employment_type: job.employment_type,
      description:     job.description,
      updated_at:      job.updated_at,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtsCandidateSummary {
  pub provider:      AtsProvider,
  pub id:            String,
  pub full_name:     String,
  pub email:         Option<String>,
  pub phone:         Option<String>,
  pub location:      Option<String>,
  pub current_title: Option<String>,
  /// Pipeline stage on the job the candidate was ingested for, if known.
  pub stage:         Option<String>,
}

impl From<MappedCandidate> for AtsCandidateSummary {
  fn from(c: MappedCandidate) -> Self {
    Self {
      provider:      c.provider,
      id:            c.external_id,
      full_name:     c.full_name,
      email:         c.email,
      phone:         c.phone,
      location:      c.location,
      current_title: c.current_title,
      stage:         c.status,
    }
  }
}

impl AtsCandidateSummary {
  pub fn with_stage(mut self, stage: Option<String>) -> Self {
    if stage.is_some() {
      self.stage = stage;
    }
    self
  }
}

// ─── Adapter results ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestedCandidate {
  pub job:         AtsJob,
  pub candidate:   AtsCandidateSummary,
  pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestedShortlist {
  pub job:         AtsJob,
  pub candidates:  Vec<AtsCandidateSummary>,
  pub received_at: DateTime<Utc>,
}

/// One entry of a shortlist being sent back to the ATS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortlistCandidate {
  /// The candidate's id in the provider's system.
  pub external_id: String,
  pub score:       Option<f64>,
  pub summary:     Option<String>,
}

impl ShortlistCandidate {
  pub fn new(external_id: impl Into<String>) -> Self {
    Self { external_id: external_id.into(), score: None, summary: None }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortlistPush {
  pub job_id:     String,
  pub candidates: Vec<ShortlistCandidate>,
  pub note:       Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortlistPushResult {
  pub pushed:                 usize,
  pub external_candidate_ids: Vec<String>,
  pub requested_at:           DateTime<Utc>,
}

/// Result of handing a webhook envelope to an adapter. Unsupported payloads
/// are reported here rather than as errors so the sender does not retry them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeAck {
  pub acknowledged: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reason:       Option<String>,
}

impl OutcomeAck {
  pub fn accepted() -> Self { Self { acknowledged: true, reason: None } }

  pub fn rejected(reason: impl Into<String>) -> Self {
    Self { acknowledged: false, reason: Some(reason.into()) }
  }
}

// ─── Webhook envelope ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookMetadata {
  pub provider:   Option<AtsProvider>,
  /// The provider's own name for the event, e.g. `UPDATED` or
  /// `candidate_stage_change`.
  pub event_type: Option<String>,
  pub event_id:   Option<String>,
  #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
  pub extra:      serde_json::Map<String, serde_json::Value>,
}

impl WebhookMetadata {
  pub fn for_provider(provider: AtsProvider) -> Self {
    Self { provider: Some(provider), ..Default::default() }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageChangeEvent {
  pub job_id:         String,
  pub candidate_id:   String,
  pub application_id: Option<String>,
  pub from_stage:     Option<String>,
  pub to_stage:       String,
  pub occurred_at:    DateTime<Utc>,
  #[serde(default)]
  pub metadata:       WebhookMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeEvent {
  pub job_id:       String,
  pub candidate_id: String,
  pub placement_id: Option<String>,
  /// Provider outcome label, e.g. `Placed`, `Hired`, `Rejected`.
  pub outcome:      String,
  pub occurred_at:  DateTime<Utc>,
  #[serde(default)]
  pub metadata:     WebhookMetadata,
}

/// A normalised inbound ATS event. Exactly one payload shape per envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AtsWebhookEnvelope {
  StageChange(StageChangeEvent),
  Outcome(OutcomeEvent),
  /// Any `type` tag this build does not understand.
  #[serde(other)]
  Unsupported,
}

impl AtsWebhookEnvelope {
  pub fn metadata_mut(&mut self) -> Option<&mut WebhookMetadata> {
    match self {
      Self::StageChange(e) => Some(&mut e.metadata),
      Self::Outcome(e) => Some(&mut e.metadata),
      Self::Unsupported => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn envelope_is_tagged_by_type() {
    let json = serde_json::json!({
      "type": "stage_change",
      "job_id": "7",
      "candidate_id": "42",
      "application_id": null,
      "from_stage": "Applied",
      "to_stage": "Interview",
      "occurred_at": "2024-03-01T10:00:00Z",
      "metadata": { "provider": "bullhorn", "event_type": "UPDATED", "event_id": null }
    });
    let env: AtsWebhookEnvelope = serde_json::from_value(json).unwrap();
    match env {
      AtsWebhookEnvelope::StageChange(e) => {
        assert_eq!(e.to_stage, "Interview");
        assert_eq!(e.metadata.provider, Some(AtsProvider::Bullhorn));
      }
      other => panic!("expected stage change, got {other:?}"),
    }
  }

  #[test]
  fn unknown_envelope_type_is_unsupported() {
    let env: AtsWebhookEnvelope =
      serde_json::from_value(serde_json::json!({ "type": "offer_extended" })).unwrap();
    assert_eq!(env, AtsWebhookEnvelope::Unsupported);
  }

  #[test]
  fn candidate_summary_keeps_mapped_status_without_stage() {
    let mapped = MappedCandidate {
      provider:        AtsProvider::Greenhouse,
      external_id:     "9".into(),
      full_name:       "Ada Lovelace".into(),
      first_name:      Some("Ada".into()),
      last_name:       Some("Lovelace".into()),
      email:           None,
      phone:           None,
      location:        None,
      current_title:   None,
      current_company: None,
      status:          Some("active".into()),
      skills:          vec![],
      created_at:      None,
      updated_at:      None,
    };
    let summary = AtsCandidateSummary::from(mapped).with_stage(None);
    assert_eq!(summary.stage.as_deref(), Some("active"));
    assert_eq!(summary.with_stage(Some("Offer".into())).stage.as_deref(), Some("Offer"));
  }
}
