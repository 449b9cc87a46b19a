//! Field-level cleanup shared by the provider mapping functions.

use chrono::{DateTime, NaiveDate, Utc};

/// Trimmed value, or `None` when absent or blank.
pub fn clean(value: Option<&str>) -> Option<String> {
  value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned)
}

/// Split a free-text skill list on commas and semicolons.
pub fn split_skills(raw: Option<&str>) -> Vec<String> {
  raw
    .unwrap_or_default()
    .split([',', ';'])
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
    .collect()
}

/// `"city, state"`, or whichever half is present.
pub fn join_location(city: Option<&str>, state: Option<&str>) -> Option<String> {
  match (clean(city), clean(state)) {
    (Some(c), Some(s)) => Some(format!("{c}, {s}")),
    (c, s) => c.or(s),
  }
}

/// `first last`, falling back to `name`, with every part trimmed.
pub fn full_name(first: Option<&str>, last: Option<&str>, name: Option<&str>) -> Option<String> {
  let parts: Vec<String> = [clean(first), clean(last)].into_iter().flatten().collect();
  if parts.is_empty() { clean(name) } else { Some(parts.join(" ")) }
}

pub fn from_epoch_millis(millis: Option<i64>) -> Option<DateTime<Utc>> {
  millis.and_then(DateTime::from_timestamp_millis)
}

pub fn date_from_epoch_millis(millis: Option<i64>) -> Option<NaiveDate> {
  from_epoch_millis(millis).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_strings_become_none() {
    assert_eq!(clean(Some("  ")), None);
    assert_eq!(clean(Some(" Ada ")).as_deref(), Some("Ada"));
    assert_eq!(clean(None), None);
  }

  #[test]
  fn skills_split_on_commas_and_semicolons() {
    assert_eq!(split_skills(Some("Rust, SQL;; Go ;")), vec!["Rust", "SQL", "Go"]);
    assert!(split_skills(None).is_empty());
  }

  #[test]
  fn location_joins_available_parts() {
    assert_eq!(join_location(Some("Boston"), Some("MA")).as_deref(), Some("Boston, MA"));
    assert_eq!(join_location(None, Some("MA")).as_deref(), Some("MA"));
    assert_eq!(join_location(Some(""), None), None);
  }

  #[test]
  fn full_name_prefers_parts_over_display_name() {
    assert_eq!(full_name(Some(" Ada"), Some("Lovelace "), Some("x")).as_deref(), Some("Ada Lovelace"));
    assert_eq!(full_name(None, None, Some(" Countess ")).as_deref(), Some("Countess"));
    assert_eq!(full_name(None, Some(""), None), None);
  }

  #[test]
  fn epoch_millis_convert_to_utc() {
    let dt = from_epoch_millis(Some(1_700_000_000_000)).unwrap();
    assert_eq!(dt.to_rfc3339(), "2023-11-14T22:13:20+00:00");
    assert_eq!(date_from_epoch_millis(Some(0)), NaiveDate::from_ymd_opt(1970, 1, 1));
  }
}
