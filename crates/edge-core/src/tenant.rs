//! Tenant: the owner of every retention-scoped record.
//!
//! A tenant carries the two knobs the retention engine reads: how many days
//! records are kept, and whether expiry scrubs rows in place or removes them.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// How expired records are disposed of.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DeletionMode {
  /// Stamp `deleted_at` and scrub sensitive fields; the row survives.
  #[default]
  SoftDelete,
  /// Physically remove the row and everything that depends on it.
  HardDelete,
}

impl FromStr for DeletionMode {
  type Err = Error;

  /// Accepts the canonical `SOFT_DELETE` / `HARD_DELETE` spellings as well as
  /// the short `soft` / `hard` forms used on the command line.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_uppercase().as_str() {
      "SOFT_DELETE" | "SOFT" => Ok(Self::SoftDelete),
      "HARD_DELETE" | "HARD" => Ok(Self::HardDelete),
      _ => Err(Error::UnknownDeletionMode(s.to_owned())),
    }
  }
}

/// A customer organisation using the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
  pub id:                  String,
  pub name:                String,
  /// `None` (or a negative value) disables retention for the tenant.
  pub data_retention_days: Option<i64>,
  pub deletion_mode:       DeletionMode,
  pub created_at:          DateTime<Utc>,
}

impl Tenant {
  pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      id:                  id.into(),
      name:                name.into(),
      data_retention_days: None,
      deletion_mode:       DeletionMode::default(),
      created_at:          Utc::now(),
    }
  }

  pub fn with_retention(mut self, days: Option<i64>, mode: DeletionMode) -> Self {
    self.data_retention_days = days;
    self.deletion_mode = mode;
    self
  }
}
