//! Request identity: the [`IdentityProvider`] strategy, its HTTP Basic
//! implementation, and the [`Admin`] extractor guarding admin routes.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use serde::Serialize;

use crate::{AppState, error::ApiError};

/// Who is making a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
  pub subject:  String,
  pub is_admin: bool,
}

/// Resolves the caller of a request from its headers.
///
/// Injected into the router so deployments can swap Basic auth for a
/// session or token scheme without touching the handlers.
pub trait IdentityProvider: Send + Sync {
  fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, ApiError>;
}

// ─── Basic auth ──────────────────────────────────────────────────────────────

/// A single admin account checked with HTTP Basic against an argon2 hash.
#[derive(Clone)]
pub struct BasicAuthIdentity {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

impl IdentityProvider for BasicAuthIdentity {
  fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, ApiError> {
    let encoded = headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.strip_prefix("Basic "))
      .ok_or(ApiError::Unauthorized)?;

    let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
    let creds = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;
    let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

    if username != self.username {
      return Err(ApiError::Unauthorized);
    }

    let parsed = PasswordHash::new(&self.password_hash).map_err(|_| ApiError::Unauthorized)?;
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .map_err(|_| ApiError::Unauthorized)?;

    Ok(Identity { subject: username.to_owned(), is_admin: true })
  }
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// Present in a handler's arguments means the caller is an authenticated
/// admin.
pub struct Admin(pub Identity);

impl<S, B, G> FromRequestParts<AppState<S, B, G>> for Admin
where
  S: Send + Sync,
  B: Send + Sync,
  G: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, B, G>,
  ) -> Result<Self, Self::Rejection> {
    let identity = state.identity.authenticate(&parts.headers)?;
    if !identity.is_admin {
      return Err(ApiError::Forbidden(format!("{} is not an administrator", identity.subject)));
    }
    Ok(Admin(identity))
  }
}

#[cfg(test)]
mod tests {
  use argon2::{PasswordHasher, password_hash::SaltString};
  use axum::http::HeaderValue;
  use rand_core::OsRng;

  use super::*;

  fn provider(password: &str) -> BasicAuthIdentity {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt).unwrap().to_string();
    BasicAuthIdentity { username: "admin".to_string(), password_hash: hash }
  }

  fn headers(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
  }

  fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  #[test]
  fn correct_credentials() {
    let identity = provider("secret").authenticate(&headers(&basic("admin", "secret"))).unwrap();
    assert_eq!(identity, Identity { subject: "admin".into(), is_admin: true });
  }

  #[test]
  fn wrong_password_or_user() {
    let p = provider("secret");
    assert!(matches!(p.authenticate(&headers(&basic("admin", "wrong"))), Err(ApiError::Unauthorized)));
    assert!(matches!(p.authenticate(&headers(&basic("root", "secret"))), Err(ApiError::Unauthorized)));
  }

  #[test]
  fn missing_or_malformed_header() {
    let p = provider("secret");
    assert!(matches!(p.authenticate(&HeaderMap::new()), Err(ApiError::Unauthorized)));
    assert!(matches!(
      p.authenticate(&headers("Basic !!!not-base64!!!")),
      Err(ApiError::Unauthorized)
    ));
    assert!(matches!(p.authenticate(&headers("Bearer abc")), Err(ApiError::Unauthorized)));
  }
}
