//! Bullhorn REST payloads, as returned under `data` by the entity and query
//! endpoints. Only the fields the mapping layer reads are declared.

use serde::{Deserialize, Deserializer, Serialize};

/// Bullhorn sends ids as JSON numbers; webhooks sometimes send them as
/// strings. Both decode to the decimal string.
pub(crate) fn flexible_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Repr {
    Num(i64),
    Str(String),
  }

  Ok(Option::<Repr>::deserialize(d)?.and_then(|r| match r {
    Repr::Num(n) => Some(n.to_string()),
    Repr::Str(s) if s.trim().is_empty() => None,
    Repr::Str(s) => Some(s.trim().to_owned()),
  }))
}

/// A to-one association, e.g. `clientCorporation` or `jobOrder`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BhRef {
  pub id:   i64,
  pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BhAddress {
  pub address1: Option<String>,
  pub city:     Option<String>,
  pub state:    Option<String>,
  pub zip:      Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BhJobOrder {
  pub id:                 i64,
  pub title:              Option<String>,
  pub status:             Option<String>,
  pub is_open:            Option<bool>,
  pub employment_type:    Option<String>,
  pub address:            Option<BhAddress>,
  pub client_corporation: Option<BhRef>,
  pub public_description: Option<String>,
  pub description:        Option<String>,
  /// Comma or semicolon separated.
  pub skill_list:         Option<String>,
  /// Epoch milliseconds.
  pub date_added:         Option<i64>,
  pub date_last_modified: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BhCandidate {
  pub id:                 i64,
  pub first_name:         Option<String>,
  pub last_name:          Option<String>,
  pub name:               Option<String>,
  pub email:              Option<String>,
  pub phone:              Option<String>,
  pub mobile:             Option<String>,
  pub address:            Option<BhAddress>,
  pub occupation:         Option<String>,
  pub company_name:       Option<String>,
  pub status:             Option<String>,
  pub skill_set:          Option<String>,
  pub date_added:         Option<i64>,
  pub date_last_modified: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BhPlacement {
  pub id:                 i64,
  pub job_order:          Option<BhRef>,
  pub candidate:          Option<BhRef>,
  pub status:             Option<String>,
  pub date_begin:         Option<i64>,
  pub date_end:           Option<i64>,
  pub salary:             Option<f64>,
  pub date_added:         Option<i64>,
  pub date_last_modified: Option<i64>,
}

/// A candidate submitted to a job order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BhJobSubmission {
  pub id:        i64,
  pub status:    Option<String>,
  pub job_order: Option<BhRef>,
  pub candidate: Option<BhCandidate>,
}

/// `{"data": …}` wrapper around single-entity responses.
#[derive(Debug, Deserialize)]
pub(crate) struct Single<T> {
  pub data: T,
}

/// Query/search response page.
#[derive(Debug, Deserialize)]
pub struct BhPage<T> {
  #[serde(default)]
  pub total: Option<usize>,
  #[serde(default)]
  pub start: usize,
  #[serde(default)]
  pub count: usize,
  #[serde(default = "Vec::new")]
  pub data:  Vec<T>,
}

impl<T> BhPage<T> {
  /// Whether a later page may hold more rows.
  pub fn has_more(&self, requested: usize) -> bool {
    match self.total {
      Some(total) => self.start + self.data.len() < total,
      None => self.data.len() >= requested,
    }
  }
}

/// Response of entity `PUT`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChangedEntity {
  pub changed_entity_id: i64,
}

/// Response of `/rest-services/login`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
  #[serde(rename = "BhRestToken")]
  pub bh_rest_token: String,
  pub rest_url:      String,
}
