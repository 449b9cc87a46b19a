//! JSON HTTP API for EDGE retention administration and ATS webhooks.
//!
//! Exposes an axum [`Router`] backed by any store implementing
//! [`RetentionStore`] and [`EventStore`]. Who may call the admin routes is
//! decided by the injected [`IdentityProvider`].
//!
//! # Mounting
//!
//! ```rust,ignore
//! axum::serve(listener, edge_api::router(state)).await?;
//! ```

pub mod auth;
pub mod error;
pub mod retention;
pub mod webhooks;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use edge_ats::{
  bullhorn::{BullhornApi, BullhornClient, PlacementLookup},
  greenhouse::{GreenhouseApi, GreenhouseClient},
};
use edge_core::store::{EventStore, RetentionStore};
use tower_http::trace::TraceLayer;

pub use auth::{BasicAuthIdentity, Identity, IdentityProvider};
pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
///
/// `B` and `G` are the provider clients used by the webhook routes; a
/// provider left as `None` answers its webhook route with 404.
#[derive(Clone)]
pub struct AppState<S, B = BullhornClient, G = GreenhouseClient> {
  pub store:                     Arc<S>,
  pub identity:                  Arc<dyn IdentityProvider>,
  pub bullhorn:                  Option<B>,
  pub greenhouse:                Option<G>,
  /// When set, Greenhouse webhooks must carry a valid signature.
  pub greenhouse_webhook_secret: Option<Arc<str>>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S, B, G>(state: AppState<S, B, G>) -> Router
where
  S: RetentionStore + EventStore + Clone + 'static,
  B: BullhornApi + PlacementLookup + Clone + 'static,
  G: GreenhouseApi + Clone + 'static,
{
  Router::new()
    // Retention
    .route("/tenants/{id}/retention", get(retention::preview::<S, B, G>))
    .route("/tenants/{id}/offboard", post(retention::offboard::<S, B, G>))
    .route("/retention/run", post(retention::run::<S, B, G>))
    // Webhooks
    .route("/webhooks/bullhorn/{tenant_id}", post(webhooks::bullhorn::<S, B, G>))
    .route("/webhooks/greenhouse/{tenant_id}", post(webhooks::greenhouse::<S, B, G>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use edge_ats::{
    Error as AtsError, Result as AtsResult,
    bullhorn::{BhCandidate, BhJobOrder, BhJobSubmission, BhPlacement, BhRef},
    greenhouse::{GhApplication, GhCandidate, GhJob},
  };
  use edge_core::{
    ats::{AtsProvider, MappedCandidate},
    store::SyncStore,
    tenant::{DeletionMode, Tenant},
  };
  use edge_store_sqlite::SqliteStore;
  use hmac::{Hmac, Mac};
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use sha2::Sha256;
  use tower::ServiceExt as _;

  use super::*;

  // ── Fakes ───────────────────────────────────────────────────────────────────

  fn unused<T>() -> AtsResult<T> { Err(AtsError::Malformed("not used by webhooks".into())) }

  /// Resolves placement `55` only.
  #[derive(Clone)]
  struct FakeBullhorn;

  impl BullhornApi for FakeBullhorn {
    async fn fetch_job(&self, _: &str) -> AtsResult<BhJobOrder> { unused() }

    async fn fetch_candidate(&self, _: &str) -> AtsResult<BhCandidate> { unused() }

    async fn fetch_placement(&self, _: &str) -> AtsResult<BhPlacement> { unused() }

    async fn fetch_shortlist_candidates(&self, _: &str) -> AtsResult<Vec<BhJobSubmission>> {
      unused()
    }

    async fn push_shortlist(&self, _: &str, _: &[String], _: Option<&str>) -> AtsResult<Vec<String>> {
      unused()
    }
  }

  impl PlacementLookup for FakeBullhorn {
    async fn lookup_placement(&self, id: &str) -> AtsResult<Option<BhPlacement>> {
      Ok((id == "55").then(|| BhPlacement {
        id: 55,
        job_order: Some(BhRef { id: 7, name: None }),
        candidate: Some(BhRef { id: 42, name: None }),
        status: Some("Approved".into()),
        ..Default::default()
      }))
    }
  }

  #[derive(Clone)]
  struct FakeGreenhouse;

  impl GreenhouseApi for FakeGreenhouse {
    async fn fetch_job(&self, _: &str) -> AtsResult<GhJob> { unused() }

    async fn fetch_candidate(&self, _: &str) -> AtsResult<GhCandidate> { unused() }

    async fn fetch_applications(&self, _: &str) -> AtsResult<Vec<GhApplication>> { unused() }

    async fn push_prospects(&self, _: &str, _: &[String], _: Option<&str>) -> AtsResult<Vec<String>> {
      unused()
    }
  }

  type TestState = AppState<SqliteStore, FakeBullhorn, FakeGreenhouse>;

  const SECRET: &str = "gh-secret";

  async fn make_state(password: &str) -> TestState {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store
      .upsert_tenant(&Tenant::new("acme", "Acme").with_retention(Some(30), DeletionMode::HardDelete))
      .await
      .unwrap();
    store.upsert_tenant(&Tenant::new("globex", "Globex")).await.unwrap();

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt).unwrap().to_string();

    AppState {
      store:                     Arc::new(store),
      identity:                  Arc::new(BasicAuthIdentity {
        username:      "admin".to_string(),
        password_hash: hash,
      }),
      bullhorn:                  Some(FakeBullhorn),
      greenhouse:                Some(FakeGreenhouse),
      greenhouse_webhook_secret: Some(SECRET.into()),
    }
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  fn sign(body: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
    mac.update(body.as_bytes());
    format!("sha256 {}", hex::encode(mac.finalize().into_bytes()))
  }

  async fn send(
    state: TestState,
    method: &str,
    uri: &str,
    headers: Vec<(&str, String)>,
    body: &str,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
  }

  fn admin() -> Vec<(&'static str, String)> {
    vec![("authorization", auth_header("admin", "secret"))]
  }

  fn json_admin() -> Vec<(&'static str, String)> {
    let mut h = admin();
    h.push(("content-type", "application/json".into()));
    h
  }

  fn json_only() -> Vec<(&'static str, String)> {
    vec![("content-type", "application/json".into())]
  }

  async fn seed_candidate(state: &TestState, tenant_id: &str, id: &str) {
    let candidate = MappedCandidate {
      provider:        AtsProvider::Bullhorn,
      external_id:     id.into(),
      full_name:       "Ada Lovelace".into(),
      first_name:      None,
      last_name:       None,
      email:           Some("ada@example.com".into()),
      phone:           None,
      location:        None,
      current_title:   None,
      current_company: None,
      status:          None,
      skills:          vec!["Rust".into()],
      created_at:      None,
      updated_at:      None,
    };
    state.store.upsert_candidate(tenant_id, &candidate).await.unwrap();
  }

  // ── Auth ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn admin_routes_require_credentials() {
    let state = make_state("secret").await;
    let (status, body) = send(state.clone(), "GET", "/tenants/acme/retention", vec![], "").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let wrong = vec![("authorization", auth_header("admin", "nope"))];
    let (status, _) = send(state, "POST", "/retention/run", wrong, "").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn non_admin_identity_is_forbidden() {
    struct Viewer;
    impl IdentityProvider for Viewer {
      fn authenticate(&self, _: &axum::http::HeaderMap) -> Result<Identity, ApiError> {
        Ok(Identity { subject: "viewer".into(), is_admin: false })
      }
    }

    let mut state = make_state("secret").await;
    state.identity = Arc::new(Viewer);
    let (status, body) = send(state, "POST", "/retention/run", vec![], "").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden: viewer is not an administrator");
  }

  // ── Retention ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn preview_reports_policy_and_counts() {
    let state = make_state("secret").await;
    let (status, body) = send(state.clone(), "GET", "/tenants/acme/retention", admin(), "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tenant_id"], "acme");
    assert_eq!(body["policy"]["mode"], "HARD_DELETE");
    assert_eq!(body["expired"]["candidates"], 0);

    let (_, body) = send(state, "GET", "/tenants/globex/retention", admin(), "").await;
    assert!(body["policy"].is_null());
  }

  #[tokio::test]
  async fn unknown_tenant_is_404() {
    let state = make_state("secret").await;
    let (status, body) = send(state.clone(), "GET", "/tenants/nope/retention", admin(), "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not found: tenant nope not found");

    let (status, _) =
      send(state, "POST", "/tenants/nope/offboard", json_admin(), r#"{"mode":"SOFT_DELETE"}"#).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn run_processes_every_tenant() {
    let state = make_state("secret").await;
    let (status, body) = send(state, "POST", "/retention/run", admin(), "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tenants_processed"], 2);
    assert_eq!(body["tenants_acted_on"], 1);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn dry_run_only_previews() {
    let state = make_state("secret").await;
    seed_candidate(&state, "acme", "42").await;
    let (status, body) = send(state.clone(), "POST", "/retention/run?dry_run=true", admin(), "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dry_run"], true);
    assert_eq!(body["previews"].as_array().unwrap().len(), 2);
    assert!(body.get("tenants_processed").is_none());
  }

  #[tokio::test]
  async fn offboard_hard_deletes_everything() {
    let state = make_state("secret").await;
    seed_candidate(&state, "acme", "42").await;
    seed_candidate(&state, "acme", "43").await;

    let (status, body) =
      send(state, "POST", "/tenants/acme/offboard", json_admin(), r#"{"mode":"HARD_DELETE"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "HARD_DELETE");
    assert_eq!(body["deletion"]["records"]["candidates"], 2);
    assert_eq!(body["deletion"]["dependents"]["candidate_skills"], 2);
  }

  #[tokio::test]
  async fn offboard_rejects_unknown_mode() {
    let state = make_state("secret").await;
    let (status, _) =
      send(state, "POST", "/tenants/acme/offboard", json_admin(), r#"{"mode":"SHRED"}"#).await;
    assert!(status.is_client_error());
  }

  // ── Bullhorn webhook ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn bullhorn_stage_change_is_recorded() {
    let state = make_state("secret").await;
    let event = json!({
      "eventType": "UPDATED",
      "entityName": "JobSubmission",
      "entityId": 9,
      "jobOrderId": 7,
      "candidateId": 42,
      "status": "Interview Scheduled"
    });
    let (status, body) =
      send(state.clone(), "POST", "/webhooks/bullhorn/acme", json_only(), &event.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["acknowledged"], true);
    assert_eq!(state.store.count_events("acme", "stage_change").await.unwrap(), 1);
  }

  #[tokio::test]
  async fn bullhorn_placement_is_looked_up() {
    let state = make_state("secret").await;
    let event = json!({ "eventType": "INSERTED", "entityName": "Placement", "entityId": 55 });
    let (status, _) =
      send(state.clone(), "POST", "/webhooks/bullhorn/acme", json_only(), &event.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.store.count_events("acme", "outcome").await.unwrap(), 1);
  }

  #[tokio::test]
  async fn unusable_bullhorn_events_are_accepted_but_not_acknowledged() {
    let state = make_state("secret").await;
    for event in [
      json!({ "entityName": "ClientContact", "entityId": 1 }),
      json!({ "entityName": "Placement", "entityId": 404 }),
      json!({ "entityName": "JobSubmission", "candidateId": 42 }),
    ] {
      let (status, body) =
        send(state.clone(), "POST", "/webhooks/bullhorn/acme", json_only(), &event.to_string()).await;
      assert_eq!(status, StatusCode::ACCEPTED);
      assert_eq!(body, json!({ "acknowledged": false, "reason": "Unsupported webhook type" }));
    }
    assert_eq!(state.store.count_events("acme", "outcome").await.unwrap(), 0);
  }

  #[tokio::test]
  async fn webhook_for_unknown_tenant_is_404() {
    let state = make_state("secret").await;
    let event = json!({ "entityName": "Candidate", "jobId": 7, "candidateId": 42 });
    let (status, _) =
      send(state, "POST", "/webhooks/bullhorn/nope", json_only(), &event.to_string()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn unconfigured_provider_is_404() {
    let mut state = make_state("secret").await;
    state.bullhorn = None;
    let (status, body) =
      send(state, "POST", "/webhooks/bullhorn/acme", json_only(), r#"{"entityName":"Candidate"}"#).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not found: Bullhorn integration is not configured");
  }

  // ── Greenhouse webhook ──────────────────────────────────────────────────────

  fn greenhouse_hire() -> String {
    json!({
      "action": "hire_candidate",
      "payload": {
        "application": {
          "id": 9,
          "candidate": { "id": 3 },
          "jobs": [{ "id": 11 }],
          "status": "hired"
        }
      }
    })
    .to_string()
  }

  #[tokio::test]
  async fn signed_greenhouse_hire_is_recorded() {
    let state = make_state("secret").await;
    let body = greenhouse_hire();
    let headers = vec![("Signature", sign(&body))];
    let (status, ack) = send(state.clone(), "POST", "/webhooks/greenhouse/acme", headers, &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["acknowledged"], true);
    assert_eq!(state.store.count_events("acme", "outcome").await.unwrap(), 1);
  }

  #[tokio::test]
  async fn greenhouse_with_bad_or_missing_signature_is_401() {
    let state = make_state("secret").await;
    let body = greenhouse_hire();

    let forged = vec![("Signature", sign("something else"))];
    let (status, _) = send(state.clone(), "POST", "/webhooks/greenhouse/acme", forged, &body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(state.clone(), "POST", "/webhooks/greenhouse/acme", vec![], &body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(state.store.count_events("acme", "outcome").await.unwrap(), 0);
  }

  #[tokio::test]
  async fn greenhouse_other_actions_are_not_acknowledged() {
    let state = make_state("secret").await;
    let body = json!({ "action": "ping", "payload": {} }).to_string();
    let headers = vec![("Signature", sign(&body))];
    let (status, ack) = send(state, "POST", "/webhooks/greenhouse/acme", headers, &body).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(ack["acknowledged"], false);
  }

  #[tokio::test]
  async fn greenhouse_garbage_is_400() {
    let state = make_state("secret").await;
    let body = "not json";
    let headers = vec![("Signature", sign(body))];
    let (status, _) = send(state, "POST", "/webhooks/greenhouse/acme", headers, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }
}
