//! Greenhouse Harvest API payloads. Unknown fields are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GhNamed {
  pub id:   i64,
  pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GhLocation {
  pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GhOffice {
  pub id:       i64,
  pub name:     Option<String>,
  pub location: Option<GhLocation>,
}

/// A typed contact value: email address, phone number or postal address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GhTypedValue {
  pub value: Option<String>,
  #[serde(rename = "type")]
  pub kind:  Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GhJob {
  pub id:            i64,
  pub name:          Option<String>,
  /// `open`, `closed` or `draft`.
  pub status:        Option<String>,
  pub notes:         Option<String>,
  pub departments:   Vec<GhNamed>,
  pub offices:       Vec<GhOffice>,
  pub created_at:    Option<DateTime<Utc>>,
  pub updated_at:    Option<DateTime<Utc>>,
  /// Custom fields keyed by their API name, e.g. `employment_type`.
  pub custom_fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GhCandidate {
  pub id:              i64,
  pub first_name:      Option<String>,
  pub last_name:       Option<String>,
  pub company:         Option<String>,
  pub title:           Option<String>,
  pub email_addresses: Vec<GhTypedValue>,
  pub phone_numbers:   Vec<GhTypedValue>,
  pub addresses:       Vec<GhTypedValue>,
  /// Used as the candidate's skill list.
  pub tags:            Vec<String>,
  pub created_at:      Option<DateTime<Utc>>,
  pub updated_at:      Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GhApplication {
  pub id:               i64,
  pub candidate_id:     i64,
  pub prospect:         bool,
  /// `active`, `rejected` or `hired`.
  pub status:           Option<String>,
  pub current_stage:    Option<GhNamed>,
  pub jobs:             Vec<GhNamed>,
  pub applied_at:       Option<DateTime<Utc>>,
  pub rejected_at:      Option<DateTime<Utc>>,
  pub last_activity_at: Option<DateTime<Utc>>,
}

impl GhApplication {
  /// The job this application is for; prospects may have none.
  pub fn job_id(&self) -> Option<String> { self.jobs.first().map(|j| j.id.to_string()) }
}
