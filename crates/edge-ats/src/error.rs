//! Error types for `edge-ats`.

use reqwest::{Method, StatusCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A provider answered with a non-2xx status.
  #[error("{method} {path} → {status}")]
  Status {
    method: Method,
    path:   String,
    status: StatusCode,
  },

  #[error("OAuth token exchange failed: {0}")]
  OAuth(String),

  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("malformed provider payload: {0}")]
  Malformed(String),

  /// A shortlist push stopped part-way. `created` holds the provider ids of
  /// the submissions made before `source`, in input order.
  #[error("shortlist push stopped after {} accepted candidate(s): {source}", .created.len())]
  PartialPush {
    created: Vec<String>,
    source:  Box<Error>,
  },

  #[error("event store error: {0}")]
  EventStore(Box<dyn std::error::Error + Send + Sync>),

  #[error("sync store error: {0}")]
  SyncStore(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Whether the provider reported the resource as missing.
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::Status { status, .. } if *status == StatusCode::NOT_FOUND)
  }

  /// `source` raised after `created` submissions already succeeded.
  pub(crate) fn partial_push(created: Vec<String>, source: Error) -> Self {
    if created.is_empty() {
      return source;
    }
    Self::PartialPush { created, source: Box::new(source) }
  }

  pub(crate) fn event_store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::EventStore(Box::new(e))
  }

  pub(crate) fn sync_store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::SyncStore(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
