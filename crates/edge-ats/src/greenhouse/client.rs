//! Async HTTP client for the Greenhouse Harvest API.
//!
//! Requests carry a bearer token from an OAuth `client_credentials`
//! exchange. A 401 refreshes the token and retries the request once.

use std::{future::Future, sync::Arc};

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::model::{GhApplication, GhCandidate, GhJob};
use crate::{
  Error, Result,
  http::{build_client, decode, join_url},
  oauth::{Grant, OAuthCredentials, TokenCache},
};

/// Applications fetched per request while reading a job's applications.
const APPLICATION_PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct GreenhouseConfig {
  #[serde(default = "default_base_url")]
  pub base_url:       String,
  pub token_url:      String,
  pub client_id:      String,
  pub client_secret:  String,
  /// Greenhouse user id writes are attributed to (`On-Behalf-Of`).
  #[serde(default)]
  pub on_behalf_of:   Option<String>,
  /// Shared secret for webhook signatures.
  #[serde(default)]
  pub webhook_secret: Option<String>,
}

fn default_base_url() -> String { "https://harvest.greenhouse.io".to_owned() }

// ─── Port ────────────────────────────────────────────────────────────────────

/// The Greenhouse operations the adapter needs.
pub trait GreenhouseApi: Send + Sync {
  fn fetch_job<'a>(&'a self, job_id: &'a str) -> impl Future<Output = Result<GhJob>> + Send + 'a;

  fn fetch_candidate<'a>(
    &'a self,
    candidate_id: &'a str,
  ) -> impl Future<Output = Result<GhCandidate>> + Send + 'a;

  /// Every application (prospects included) on `job_id`.
  fn fetch_applications<'a>(
    &'a self,
    job_id: &'a str,
  ) -> impl Future<Output = Result<Vec<GhApplication>>> + Send + 'a;

  /// Add each candidate to `job_id` as a prospect. Returns the new
  /// application ids in input order, or [`Error::PartialPush`] with the ids
  /// created before a later candidate failed.
  fn push_prospects<'a>(
    &'a self,
    job_id: &'a str,
    candidate_ids: &'a [String],
    note: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<String>>> + Send + 'a;
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Cheap to clone; clones share the token cache.
#[derive(Clone)]
pub struct GreenhouseClient {
  http:         reqwest::Client,
  tokens:       TokenCache,
  base_url:     Arc<str>,
  on_behalf_of: Option<Arc<str>>,
}

impl GreenhouseClient {
  pub fn new(config: GreenhouseConfig) -> Result<Self> {
    let http = build_client()?;
    let tokens = TokenCache::new(http.clone(), OAuthCredentials {
      token_url:     config.token_url,
      client_id:     config.client_id,
      client_secret: config.client_secret,
      grant:         Grant::ClientCredentials,
    });
    Ok(Self {
      http,
      tokens,
      base_url: config.base_url.trim_end_matches('/').into(),
      on_behalf_of: config.on_behalf_of.map(Into::into),
    })
  }

  fn request(
    &self,
    token: &str,
    method: Method,
    path: &str,
    query: &[(&str, String)],
    body: Option<&Value>,
  ) -> RequestBuilder {
    let mut req =
      self.http.request(method, join_url(&self.base_url, path)).bearer_auth(token).query(query);
    if let Some(user) = &self.on_behalf_of {
      req = req.header("On-Behalf-Of", &**user);
    }
    match body {
      Some(body) => req.json(body),
      None => req,
    }
  }

  async fn send<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    query: &[(&str, String)],
    body: Option<&Value>,
  ) -> Result<T> {
    let token = self.tokens.token().await?;
    let mut resp = self.request(&token, method.clone(), path, query, body).send().await?;

    if resp.status() == StatusCode::UNAUTHORIZED {
      warn!(%method, path, "Greenhouse rejected token; refreshing and retrying once");
      let token = self.tokens.refresh().await?;
      resp = self.request(&token, method.clone(), path, query, body).send().await?;
    }

    decode(method, path, resp).await
  }

  async fn list<T: DeserializeOwned>(
    &self,
    path: &str,
    mut query: Vec<(&str, String)>,
    page: usize,
    per_page: usize,
  ) -> Result<Vec<T>> {
    query.push(("page", page.to_string()));
    query.push(("per_page", per_page.to_string()));
    self.send(Method::GET, path, &query, None).await
  }

  /// Add one candidate to `job` as a prospect; returns the application id.
  async fn add_prospect(&self, job: i64, candidate_id: &str, note: Option<&str>) -> Result<String> {
    let path = format!("/v1/candidates/{}/applications", numeric_id("candidate", candidate_id)?);
    let body = json!({ "job_id": job, "prospect": true, "notes": note });
    let app: GhApplication = self.send(Method::POST, &path, &[], Some(&body)).await?;
    Ok(app.id.to_string())
  }

  // ── Listing ───────────────────────────────────────────────────────────────
  //
  // Pages are 1-based. A page shorter than `per_page` is the last one.

  pub async fn list_jobs(
    &self,
    page: usize,
    per_page: usize,
    since: Option<DateTime<Utc>>,
  ) -> Result<Vec<GhJob>> {
    self.list("/v1/jobs", after("updated_after", since), page, per_page).await
  }

  pub async fn list_candidates(
    &self,
    page: usize,
    per_page: usize,
    since: Option<DateTime<Utc>>,
  ) -> Result<Vec<GhCandidate>> {
    self.list("/v1/candidates", after("updated_after", since), page, per_page).await
  }

  pub async fn list_hired_applications(
    &self,
    page: usize,
    per_page: usize,
    since: Option<DateTime<Utc>>,
  ) -> Result<Vec<GhApplication>> {
    let mut query = after("last_activity_after", since);
    query.push(("status", "hired".to_owned()));
    self.list("/v1/applications", query, page, per_page).await
  }
}

fn after(key: &'static str, since: Option<DateTime<Utc>>) -> Vec<(&'static str, String)> {
  since.map(|t| (key, t.to_rfc3339_opts(SecondsFormat::Secs, true))).into_iter().collect()
}

fn numeric_id(kind: &str, id: &str) -> Result<i64> {
  id.trim()
    .parse()
    .map_err(|_| Error::Malformed(format!("Greenhouse {kind} id {id:?} is not numeric")))
}

impl GreenhouseApi for GreenhouseClient {
  async fn fetch_job(&self, job_id: &str) -> Result<GhJob> {
    self.send(Method::GET, &format!("/v1/jobs/{job_id}"), &[], None).await
  }

  async fn fetch_candidate(&self, candidate_id: &str) -> Result<GhCandidate> {
    self.send(Method::GET, &format!("/v1/candidates/{candidate_id}"), &[], None).await
  }

  async fn fetch_applications(&self, job_id: &str) -> Result<Vec<GhApplication>> {
    let mut applications = Vec::new();
    let mut page = 1;

    loop {
      let query = vec![("job_id", job_id.to_owned())];
      let batch: Vec<GhApplication> =
        self.list("/v1/applications", query, page, APPLICATION_PAGE_SIZE).await?;
      let last = batch.len() < APPLICATION_PAGE_SIZE;
      applications.extend(batch);
      if last {
        return Ok(applications);
      }
      page += 1;
    }
  }

  async fn push_prospects(
    &self,
    job_id: &str,
    candidate_ids: &[String],
    note: Option<&str>,
  ) -> Result<Vec<String>> {
    let job = numeric_id("job", job_id)?;
    let mut application_ids = Vec::with_capacity(candidate_ids.len());

    for candidate_id in candidate_ids {
      match self.add_prospect(job, candidate_id, note).await {
        Ok(id) => application_ids.push(id),
        Err(e) => return Err(Error::partial_push(application_ids, e)),
      }
    }

    debug!(job_id, pushed = application_ids.len(), "added Greenhouse prospects");
    Ok(application_ids)
  }
}

#[cfg(test)]
mod tests {
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path, query_param},
  };

  use super::*;

  async fn mount_token(server: &MockServer, exchanges: u64) {
    Mock::given(method("POST"))
      .and(path("/oauth/token"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "access_token": "gh-token", "expires_in": 3600
      })))
      .expect(exchanges)
      .mount(server)
      .await;
  }

  fn client(server: &MockServer) -> GreenhouseClient {
    GreenhouseClient::new(GreenhouseConfig {
      base_url:       server.uri(),
      token_url:      format!("{}/oauth/token", server.uri()),
      client_id:      "id".into(),
      client_secret:  "secret".into(),
      on_behalf_of:   Some("77".into()),
      webhook_secret: None,
    })
    .unwrap()
  }

  #[tokio::test]
  async fn fetches_job_with_bearer_token() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
      .and(path("/v1/jobs/11"))
      .and(header("Authorization", "Bearer gh-token"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({ "id": 11, "name": "Eng", "status": "open" })),
      )
      .mount(&server)
      .await;

    let job = client(&server).fetch_job("11").await.unwrap();
    assert_eq!(job.name.as_deref(), Some("Eng"));
  }

  #[tokio::test]
  async fn unauthorized_triggers_one_refresh_and_retry() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;
    Mock::given(method("GET"))
      .and(path("/v1/candidates/3"))
      .respond_with(ResponseTemplate::new(401))
      .up_to_n_times(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/v1/candidates/3"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 3 })))
      .mount(&server)
      .await;

    assert_eq!(client(&server).fetch_candidate("3").await.unwrap().id, 3);
  }

  #[tokio::test]
  async fn prospects_are_posted_per_candidate() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    for (candidate, app) in [(3, 901), (4, 902)] {
      Mock::given(method("POST"))
        .and(path(format!("/v1/candidates/{candidate}/applications")))
        .and(header("On-Behalf-Of", "77"))
        .and(body_partial_json(json!({ "job_id": 11, "prospect": true })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": app, "candidate_id": candidate })))
        .expect(1)
        .mount(&server)
        .await;
    }

    let ids = client(&server)
      .push_prospects("11", &["3".to_string(), "4".to_string()], None)
      .await
      .unwrap();
    assert_eq!(ids, vec!["901", "902"]);
  }

  #[tokio::test]
  async fn prospect_failure_keeps_earlier_application_ids() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
      .and(path("/v1/candidates/3/applications"))
      .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 901, "candidate_id": 3 })))
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/v1/candidates/4/applications"))
      .respond_with(ResponseTemplate::new(500))
      .mount(&server)
      .await;

    let err = client(&server)
      .push_prospects("11", &["3".to_string(), "4".to_string()], None)
      .await
      .unwrap_err();

    let Error::PartialPush { created, .. } = err else { panic!("unexpected error: {err}") };
    assert_eq!(created, vec!["901"]);
  }

  #[tokio::test]
  async fn applications_are_read_until_a_short_page() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    let full: Vec<Value> =
      (0..APPLICATION_PAGE_SIZE as i64).map(|i| json!({ "id": i, "candidate_id": i })).collect();
    Mock::given(method("GET"))
      .and(path("/v1/applications"))
      .and(query_param("job_id", "11"))
      .and(query_param("page", "1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(full))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/v1/applications"))
      .and(query_param("job_id", "11"))
      .and(query_param("page", "2"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!([{ "id": 9000, "candidate_id": 9000 }])),
      )
      .expect(1)
      .mount(&server)
      .await;

    let apps = client(&server).fetch_applications("11").await.unwrap();
    assert_eq!(apps.len(), APPLICATION_PAGE_SIZE + 1);
    assert_eq!(apps.last().map(|a| a.id), Some(9000));
  }

  #[tokio::test]
  async fn hired_applications_filter_by_status_and_activity() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
      .and(path("/v1/applications"))
      .and(query_param("status", "hired"))
      .and(query_param("last_activity_after", "2024-01-01T00:00:00Z"))
      .and(query_param("page", "2"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
        { "id": 9, "candidate_id": 3, "status": "hired", "jobs": [{ "id": 11 }] }
      ])))
      .mount(&server)
      .await;

    let since = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
    let apps = client(&server).list_hired_applications(2, 100, Some(since)).await.unwrap();
    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0].job_id().as_deref(), Some("11"));
  }

  #[tokio::test]
  async fn not_found_is_recognisable() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
      .and(path("/v1/jobs/404"))
      .respond_with(ResponseTemplate::new(404))
      .mount(&server)
      .await;

    let err = client(&server).fetch_job("404").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "GET /v1/jobs/404 → 404 Not Found");
  }
}
