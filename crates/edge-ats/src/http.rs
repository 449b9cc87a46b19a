//! Response handling shared by the provider clients.

use std::time::Duration;

use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;

use crate::{Error, Result};

pub(crate) fn build_client() -> Result<Client> {
  Ok(Client::builder().timeout(Duration::from_secs(30)).build()?)
}

/// Fail with the method, path and status on a non-2xx response, otherwise
/// decode the JSON body.
pub(crate) async fn decode<T: DeserializeOwned>(
  method: Method,
  path: &str,
  resp: Response,
) -> Result<T> {
  let status = resp.status();
  if !status.is_success() {
    return Err(Error::Status { method, path: path.to_owned(), status });
  }
  Ok(resp.json().await?)
}

/// `base` and `path` joined with exactly one slash.
pub(crate) fn join_url(base: &str, path: &str) -> String {
  format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
