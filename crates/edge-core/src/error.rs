//! Error types for `edge-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown deletion mode: {0:?}")]
  UnknownDeletionMode(String),

  #[error("unknown ATS provider: {0:?}")]
  UnknownProvider(String),

  #[error("unknown upsert outcome: {0:?}")]
  UnknownUpsertOutcome(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
