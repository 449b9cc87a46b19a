//! Async HTTP client for the Bullhorn REST API.
//!
//! Authentication is two-step: an OAuth `refresh_token` exchange yields an
//! access token, which `/rest-services/login` trades for a `BhRestToken` and
//! the tenant's `restUrl`. Every resource request carries the `BhRestToken`
//! header. A 401 discards the session, refreshes the token and retries the
//! request once.

use std::{future::Future, sync::Arc};

use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::model::{
  BhCandidate, BhJobOrder, BhJobSubmission, BhPage, BhPlacement, ChangedEntity, LoginResponse,
  Single,
};
use crate::{
  Error, Result,
  http::{build_client, decode, join_url},
  oauth::{Grant, OAuthCredentials, TokenCache},
};

const JOB_FIELDS: &str = "id,title,status,isOpen,employmentType,address,clientCorporation,\
                          publicDescription,description,skillList,dateAdded,dateLastModified";
const CANDIDATE_FIELDS: &str = "id,firstName,lastName,name,email,phone,mobile,address,occupation,\
                                companyName,status,skillSet,dateAdded,dateLastModified";
const PLACEMENT_FIELDS: &str =
  "id,jobOrder,candidate,status,dateBegin,dateEnd,salary,dateAdded,dateLastModified";
const SUBMISSION_FIELDS: &str = "id,status,jobOrder,candidate(id,firstName,lastName,name,email,\
                                 phone,mobile,address,occupation,companyName,status,skillSet)";

/// Submissions fetched per request while reading a shortlist.
const SHORTLIST_PAGE_SIZE: usize = 200;

/// Status given to submissions created by a shortlist push.
pub const SUBMITTED_STATUS: &str = "Submitted";

#[derive(Debug, Clone, Deserialize)]
pub struct BullhornConfig {
  #[serde(default = "default_auth_url")]
  pub auth_url:      String,
  #[serde(default = "default_login_url")]
  pub login_url:     String,
  pub client_id:     String,
  pub client_secret: String,
  pub refresh_token: String,
}

fn default_auth_url() -> String { "https://auth.bullhornstaffing.com/oauth".to_owned() }

fn default_login_url() -> String { "https://rest.bullhornstaffing.com".to_owned() }

// ─── Port ────────────────────────────────────────────────────────────────────

/// The Bullhorn operations the adapter needs.
pub trait BullhornApi: Send + Sync {
  fn fetch_job<'a>(
    &'a self,
    job_id: &'a str,
  ) -> impl Future<Output = Result<BhJobOrder>> + Send + 'a;

  fn fetch_candidate<'a>(
    &'a self,
    candidate_id: &'a str,
  ) -> impl Future<Output = Result<BhCandidate>> + Send + 'a;

  fn fetch_placement<'a>(
    &'a self,
    placement_id: &'a str,
  ) -> impl Future<Output = Result<BhPlacement>> + Send + 'a;

  /// Candidates submitted to `job_id`, with their submission status.
  fn fetch_shortlist_candidates<'a>(
    &'a self,
    job_id: &'a str,
  ) -> impl Future<Output = Result<Vec<BhJobSubmission>>> + Send + 'a;

  /// Create one `JobSubmission` per candidate. Returns the new submission
  /// ids in input order, or [`Error::PartialPush`] with the ids created
  /// before a later candidate failed.
  fn push_shortlist<'a>(
    &'a self,
    job_id: &'a str,
    candidate_ids: &'a [String],
    note: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<String>>> + Send + 'a;
}

// ─── Client ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Session {
  rest_token: String,
  rest_url:   String,
}

/// Cheap to clone; clones share the token cache and REST session.
#[derive(Clone)]
pub struct BullhornClient {
  http:      reqwest::Client,
  tokens:    TokenCache,
  login_url: Arc<str>,
  session:   Arc<Mutex<Option<Session>>>,
}

impl BullhornClient {
  pub fn new(config: BullhornConfig) -> Result<Self> {
    let http = build_client()?;
    let tokens = TokenCache::new(http.clone(), OAuthCredentials {
      token_url:     join_url(&config.auth_url, "token"),
      client_id:     config.client_id,
      client_secret: config.client_secret,
      grant:         Grant::RefreshToken(config.refresh_token),
    });
    Ok(Self {
      http,
      tokens,
      login_url: config.login_url.trim_end_matches('/').into(),
      session: Arc::new(Mutex::new(None)),
    })
  }

  /// The current REST session; `renew` forces a token refresh and a new
  /// login.
  async fn session(&self, renew: bool) -> Result<Session> {
    let mut slot = self.session.lock().await;
    if let (false, Some(session)) = (renew, slot.as_ref()) {
      return Ok(session.clone());
    }

    let access_token =
      if renew { self.tokens.refresh().await? } else { self.tokens.token().await? };

    let path = "/rest-services/login";
    let resp = self
      .http
      .post(format!("{}{path}", self.login_url))
      .query(&[("version", "2.0"), ("access_token", access_token.as_str())])
      .send()
      .await?;
    let login: LoginResponse = decode(Method::POST, path, resp).await?;
    debug!(rest_url = %login.rest_url, "opened Bullhorn REST session");

    let session = Session { rest_token: login.bh_rest_token, rest_url: login.rest_url };
    *slot = Some(session.clone());
    Ok(session)
  }

  fn request(
    &self,
    session: &Session,
    method: Method,
    path: &str,
    query: &[(&str, String)],
    body: Option<&Value>,
  ) -> RequestBuilder {
    let req = self
      .http
      .request(method, join_url(&session.rest_url, path))
      .header("BhRestToken", &session.rest_token)
      .query(query);
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
    let session = self.session(false).await?;
    let mut resp = self.request(&session, method.clone(), path, query, body).send().await?;

    if resp.status() == StatusCode::UNAUTHORIZED {
      warn!(%method, path, "Bullhorn rejected session; refreshing and retrying once");
      let session = self.session(true).await?;
      resp = self.request(&session, method.clone(), path, query, body).send().await?;
    }

    decode(method, path, resp).await
  }

  async fn get_entity<T: DeserializeOwned>(
    &self,
    entity: &str,
    id: &str,
    fields: &str,
  ) -> Result<T> {
    let path = format!("entity/{entity}/{id}");
    let single: Single<T> =
      self.send(Method::GET, &path, &[("fields", fields.to_owned())], None).await?;
    Ok(single.data)
  }

  async fn query<T: DeserializeOwned>(
    &self,
    entity: &str,
    filter: String,
    fields: &str,
    start: usize,
    count: usize,
  ) -> Result<BhPage<T>> {
    let path = format!("query/{entity}");
    let query = [
      ("where", filter),
      ("fields", fields.to_owned()),
      ("start", start.to_string()),
      ("count", count.to_string()),
      ("orderBy", "id".to_owned()),
    ];
    self.send(Method::GET, &path, &query, None).await
  }

  /// Create one `JobSubmission`; returns its id.
  async fn submit(&self, job: i64, candidate_id: &str, note: Option<&str>) -> Result<String> {
    let body = json!({
      "candidate": { "id": numeric_id("candidate", candidate_id)? },
      "jobOrder": { "id": job },
      "status": SUBMITTED_STATUS,
      "dateWebResponse": Utc::now().timestamp_millis(),
      "comments": note,
    });
    let changed: ChangedEntity =
      self.send(Method::PUT, "entity/JobSubmission", &[], Some(&body)).await?;
    Ok(changed.changed_entity_id.to_string())
  }

  // ── Listing ───────────────────────────────────────────────────────────────

  pub async fn list_jobs(
    &self,
    start: usize,
    count: usize,
    since: Option<DateTime<Utc>>,
  ) -> Result<BhPage<BhJobOrder>> {
    self.query("JobOrder", modified_since(since), JOB_FIELDS, start, count).await
  }

  pub async fn list_candidates(
    &self,
    start: usize,
    count: usize,
    since: Option<DateTime<Utc>>,
  ) -> Result<BhPage<BhCandidate>> {
    self.query("Candidate", modified_since(since), CANDIDATE_FIELDS, start, count).await
  }

  pub async fn list_placements(
    &self,
    start: usize,
    count: usize,
    since: Option<DateTime<Utc>>,
  ) -> Result<BhPage<BhPlacement>> {
    self.query("Placement", modified_since(since), PLACEMENT_FIELDS, start, count).await
  }
}

/// `where` clause selecting rows modified after `since`, or every row.
fn modified_since(since: Option<DateTime<Utc>>) -> String {
  match since {
    Some(t) => format!("dateLastModified>{}", t.timestamp_millis()),
    None => "id>0".to_owned(),
  }
}

fn numeric_id(kind: &str, id: &str) -> Result<i64> {
  id.trim()
    .parse()
    .map_err(|_| Error::Malformed(format!("Bullhorn {kind} id {id:?} is not numeric")))
}

impl BullhornApi for BullhornClient {
  async fn fetch_job(&self, job_id: &str) -> Result<BhJobOrder> {
    self.get_entity("JobOrder", job_id, JOB_FIELDS).await
  }

  async fn fetch_candidate(&self, candidate_id: &str) -> Result<BhCandidate> {
    self.get_entity("Candidate", candidate_id, CANDIDATE_FIELDS).await
  }

  async fn fetch_placement(&self, placement_id: &str) -> Result<BhPlacement> {
    self.get_entity("Placement", placement_id, PLACEMENT_FIELDS).await
  }

  async fn fetch_shortlist_candidates(&self, job_id: &str) -> Result<Vec<BhJobSubmission>> {
    let job = numeric_id("job", job_id)?;
    let mut submissions = Vec::new();

    loop {
      let page: BhPage<BhJobSubmission> = self
        .query(
          "JobSubmission",
          format!("jobOrder.id={job}"),
          SUBMISSION_FIELDS,
          submissions.len(),
          SHORTLIST_PAGE_SIZE,
        )
        .await?;
      let more = page.has_more(SHORTLIST_PAGE_SIZE) && !page.data.is_empty();
      submissions.extend(page.data);
      if !more {
        return Ok(submissions);
      }
    }
  }

  async fn push_shortlist(
    &self,
    job_id: &str,
    candidate_ids: &[String],
    note: Option<&str>,
  ) -> Result<Vec<String>> {
    let job = numeric_id("job", job_id)?;
    let mut submission_ids = Vec::with_capacity(candidate_ids.len());

    for candidate_id in candidate_ids {
      match self.submit(job, candidate_id, note).await {
        Ok(id) => submission_ids.push(id),
        Err(e) => return Err(Error::partial_push(submission_ids, e)),
      }
    }

    debug!(job_id, pushed = submission_ids.len(), "created Bullhorn job submissions");
    Ok(submission_ids)
  }
}

#[cfg(test)]
mod tests {
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path, query_param},
  };

  use super::*;

  async fn mount_auth(server: &MockServer, logins: u64) {
    Mock::given(method("POST"))
      .and(path("/oauth/token"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({ "access_token": "access-1" })),
      )
      .expect(logins)
      .mount(server)
      .await;
    Mock::given(method("POST"))
      .and(path("/rest-services/login"))
      .and(query_param("access_token", "access-1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "BhRestToken": "bh-token",
        "restUrl": format!("{}/rest/", server.uri()),
      })))
      .expect(logins)
      .mount(server)
      .await;
  }

  fn client(server: &MockServer) -> BullhornClient {
    BullhornClient::new(BullhornConfig {
      auth_url:      format!("{}/oauth", server.uri()),
      login_url:     server.uri(),
      client_id:     "id".into(),
      client_secret: "secret".into(),
      refresh_token: "rt".into(),
    })
    .unwrap()
  }

  #[tokio::test]
  async fn fetches_job_with_rest_token() {
    let server = MockServer::start().await;
    mount_auth(&server, 1).await;
    Mock::given(method("GET"))
      .and(path("/rest/entity/JobOrder/7"))
      .and(header("BhRestToken", "bh-token"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!({ "data": { "id": 7, "title": "Welder", "isOpen": true } })),
      )
      .mount(&server)
      .await;

    let bh = client(&server);
    let job = bh.fetch_job("7").await.unwrap();
    assert_eq!(job.title.as_deref(), Some("Welder"));
    // Second call reuses the session.
    bh.fetch_job("7").await.unwrap();
  }

  #[tokio::test]
  async fn unauthorized_triggers_one_refresh_and_retry() {
    let server = MockServer::start().await;
    mount_auth(&server, 2).await;
    Mock::given(method("GET"))
      .and(path("/rest/entity/Candidate/42"))
      .respond_with(ResponseTemplate::new(401))
      .up_to_n_times(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/rest/entity/Candidate/42"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": 42, "name": "Ada" } })),
      )
      .mount(&server)
      .await;

    let candidate = client(&server).fetch_candidate("42").await.unwrap();
    assert_eq!(candidate.id, 42);
  }

  #[tokio::test]
  async fn second_unauthorized_is_an_error() {
    let server = MockServer::start().await;
    mount_auth(&server, 2).await;
    Mock::given(method("GET"))
      .and(path("/rest/entity/Placement/9"))
      .respond_with(ResponseTemplate::new(401))
      .expect(2)
      .mount(&server)
      .await;

    let err = client(&server).fetch_placement("9").await.unwrap_err();
    assert!(matches!(err, Error::Status { status: StatusCode::UNAUTHORIZED, .. }));
  }

  #[tokio::test]
  async fn server_error_embeds_status_and_path() {
    let server = MockServer::start().await;
    mount_auth(&server, 1).await;
    Mock::given(method("GET"))
      .and(path("/rest/entity/JobOrder/7"))
      .respond_with(ResponseTemplate::new(500))
      .mount(&server)
      .await;

    let err = client(&server).fetch_job("7").await.unwrap_err();
    assert_eq!(err.to_string(), "GET entity/JobOrder/7 → 500 Internal Server Error");
  }

  #[tokio::test]
  async fn push_creates_one_submission_per_candidate() {
    let server = MockServer::start().await;
    mount_auth(&server, 1).await;
    Mock::given(method("PUT"))
      .and(path("/rest/entity/JobSubmission"))
      .and(body_partial_json(json!({ "jobOrder": { "id": 7 }, "status": "Submitted" })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "changedEntityId": 1001 })))
      .expect(2)
      .mount(&server)
      .await;

    let ids = client(&server)
      .push_shortlist("7", &["42".to_string(), "43".to_string()], Some("strong"))
      .await
      .unwrap();
    assert_eq!(ids, vec!["1001", "1001"]);
  }

  #[tokio::test]
  async fn push_failing_on_second_candidate_reports_the_first() {
    let server = MockServer::start().await;
    mount_auth(&server, 1).await;
    Mock::given(method("PUT"))
      .and(path("/rest/entity/JobSubmission"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "changedEntityId": 1001 })))
      .up_to_n_times(1)
      .mount(&server)
      .await;
    Mock::given(method("PUT"))
      .and(path("/rest/entity/JobSubmission"))
      .respond_with(ResponseTemplate::new(500))
      .expect(1)
      .mount(&server)
      .await;

    let err = client(&server)
      .push_shortlist("7", &["42".to_string(), "43".to_string()], None)
      .await
      .unwrap_err();

    let Error::PartialPush { created, source } = err else { panic!("unexpected error: {err}") };
    assert_eq!(created, vec!["1001"]);
    assert!(matches!(*source, Error::Status { status: StatusCode::INTERNAL_SERVER_ERROR, .. }));
  }

  #[tokio::test]
  async fn shortlist_reads_every_page() {
    let server = MockServer::start().await;
    mount_auth(&server, 1).await;
    Mock::given(method("GET"))
      .and(path("/rest/query/JobSubmission"))
      .and(query_param("where", "jobOrder.id=7"))
      .and(query_param("start", "0"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "total": 3, "start": 0, "count": 2,
        "data": [{ "id": 1, "candidate": { "id": 41 } }, { "id": 2, "candidate": { "id": 42 } }]
      })))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/rest/query/JobSubmission"))
      .and(query_param("start", "2"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "total": 3, "start": 2, "count": 1,
        "data": [{ "id": 3, "candidate": { "id": 43 } }]
      })))
      .expect(1)
      .mount(&server)
      .await;

    let submissions = client(&server).fetch_shortlist_candidates("7").await.unwrap();
    let ids: Vec<i64> = submissions.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
  }

  #[tokio::test]
  async fn list_filters_on_modification_time() {
    let server = MockServer::start().await;
    mount_auth(&server, 1).await;
    let since = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
    Mock::given(method("GET"))
      .and(path("/rest/query/Placement"))
      .and(query_param("where", "dateLastModified>1700000000000"))
      .and(query_param("start", "0"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "total": 1, "start": 0, "count": 1,
        "data": [{ "id": 9, "jobOrder": { "id": 7 }, "candidate": { "id": 42 } }]
      })))
      .mount(&server)
      .await;

    let page = client(&server).list_placements(0, 50, Some(since)).await.unwrap();
    assert_eq!(page.data.len(), 1);
    assert!(!page.has_more(50));
  }
}
