//! OAuth 2.0 token exchange shared by the provider clients.
//!
//! A [`TokenCache`] holds the current access token behind an async mutex, so
//! clones of a client share one token and concurrent callers never trigger
//! parallel exchanges.

use std::{
  sync::Arc,
  time::{Duration, Instant},
};

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{Error, Result};

/// Tokens are treated as expired this long before the server says so.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// How a client proves itself at the token endpoint.
#[derive(Debug, Clone)]
pub enum Grant {
  /// `grant_type=refresh_token`; the token is rotated if the server issues
  /// a new one.
  RefreshToken(String),
  /// `grant_type=client_credentials`.
  ClientCredentials,
}

#[derive(Debug, Clone)]
pub struct OAuthCredentials {
  pub token_url:     String,
  pub client_id:     String,
  pub client_secret: String,
  pub grant:         Grant,
}

/// Token endpoint response. Deliberately not `Serialize`.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
  pub access_token:  String,
  #[serde(default)]
  pub refresh_token: Option<String>,
  #[serde(default)]
  pub expires_in:    Option<u64>,
}

struct AccessToken {
  value:      String,
  expires_at: Option<Instant>,
}

impl AccessToken {
  fn is_fresh(&self) -> bool { self.expires_at.is_none_or(|at| Instant::now() < at) }
}

struct TokenState {
  grant:  Grant,
  access: Option<AccessToken>,
}

/// Cached access token plus the credentials needed to obtain a new one.
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct TokenCache {
  http:          reqwest::Client,
  token_url:     Arc<str>,
  client_id:     Arc<str>,
  client_secret: Arc<str>,
  state:         Arc<Mutex<TokenState>>,
}

impl TokenCache {
  pub fn new(http: reqwest::Client, credentials: OAuthCredentials) -> Self {
    Self {
      http,
      token_url: credentials.token_url.into(),
      client_id: credentials.client_id.into(),
      client_secret: credentials.client_secret.into(),
      state: Arc::new(Mutex::new(TokenState { grant: credentials.grant, access: None })),
    }
  }

  /// The cached access token, exchanging for a new one if there is none or
  /// it has expired.
  pub async fn token(&self) -> Result<String> {
    let mut state = self.state.lock().await;
    if let Some(access) = state.access.as_ref().filter(|a| a.is_fresh()) {
      return Ok(access.value.clone());
    }
    self.exchange(&mut state).await
  }

  /// Discard the cached token and exchange for a new one.
  pub async fn refresh(&self) -> Result<String> {
    let mut state = self.state.lock().await;
    state.access = None;
    self.exchange(&mut state).await
  }

  async fn exchange(&self, state: &mut TokenState) -> Result<String> {
    let mut form: Vec<(&str, &str)> = vec![
      ("client_id", &*self.client_id),
      ("client_secret", &*self.client_secret),
    ];
    match &state.grant {
      Grant::RefreshToken(token) => {
        form.push(("grant_type", "refresh_token"));
        form.push(("refresh_token", token.as_str()));
      }
      Grant::ClientCredentials => form.push(("grant_type", "client_credentials")),
    }

    let resp = self
      .http
      .post(&*self.token_url)
      .form(&form)
      .send()
      .await
      .map_err(|e| Error::OAuth(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Error::OAuth(format!("POST {} → {status}", self.token_url)));
    }
    let body: TokenResponse =
      resp.json().await.map_err(|e| Error::OAuth(format!("decoding token response: {e}")))?;

    if let (Grant::RefreshToken(current), Some(rotated)) = (&mut state.grant, body.refresh_token) {
      *current = rotated;
    }

    let expires_at = body
      .expires_in
      .map(|secs| Instant::now() + Duration::from_secs(secs).saturating_sub(EXPIRY_MARGIN));
    debug!(token_url = %self.token_url, expires_in = ?body.expires_in, "obtained access token");

    state.access = Some(AccessToken { value: body.access_token.clone(), expires_at });
    Ok(body.access_token)
  }

  #[cfg(test)]
  pub(crate) async fn current_refresh_token(&self) -> Option<String> {
    match &self.state.lock().await.grant {
      Grant::RefreshToken(t) => Some(t.clone()),
      Grant::ClientCredentials => None,
    }
  }
}
