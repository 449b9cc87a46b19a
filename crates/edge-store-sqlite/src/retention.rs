//! [`RetentionStore`] implementation for [`SqliteStore`].

use chrono::{DateTime, Utc};
use edge_core::{
  record::{DependentKind, RecordFilter, RecordKind, TenantEntity},
  retention::{DELETED_CANDIDATE_STATUS, REMOVED_CANDIDATE_NAME},
  store::RetentionStore,
  tenant::Tenant,
};
use rusqlite::{OptionalExtension as _, types::Value};

use crate::{
  Error, Result,
  encode::{RawTenant, dependent_table, encode_dt, record_table, tenant_entity_table},
  store::{SqliteStore, execute_for_ids},
};

/// The `UPDATE … WHERE id` head scrubbing one record kind. Its leading
/// parameters come from [`scrub_params`].
fn scrub_statement(kind: RecordKind) -> &'static str {
  match kind {
    RecordKind::AgentRunLog => {
      "UPDATE agent_run_logs
          SET deleted_at = ?1, input = NULL, output = NULL, error_message = NULL
        WHERE id"
    }
    RecordKind::Match => {
      "UPDATE matches
          SET deleted_at = ?1, score_breakdown = NULL
        WHERE id"
    }
    RecordKind::MatchResult => "UPDATE match_results SET reasons = NULL WHERE id",
    RecordKind::Candidate => {
      "UPDATE candidates
          SET deleted_at      = ?1,
              updated_at      = ?1,
              full_name       = ?2,
              first_name      = NULL,
              last_name       = NULL,
              email           = NULL,
              phone           = NULL,
              location        = NULL,
              current_title   = NULL,
              current_company = NULL,
              linkedin_url    = NULL,
              resume_text     = NULL,
              summary         = NULL,
              status          = ?3
        WHERE id"
    }
  }
}

fn scrub_params(kind: RecordKind, now: DateTime<Utc>) -> Vec<Value> {
  let now = Value::Text(encode_dt(now));
  match kind {
    RecordKind::AgentRunLog | RecordKind::Match => vec![now],
    RecordKind::MatchResult => vec![],
    RecordKind::Candidate => vec![
      now,
      Value::Text(REMOVED_CANDIDATE_NAME.to_owned()),
      Value::Text(DELETED_CANDIDATE_STATUS.to_owned()),
    ],
  }
}

impl RetentionStore for SqliteStore {
  type Error = Error;

  async fn list_tenants(&self) -> Result<Vec<Tenant>> {
    let raws: Vec<RawTenant> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM tenants ORDER BY created_at, id",
          RawTenant::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawTenant::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTenant::into_tenant).collect()
  }

  async fn get_tenant(&self, id: &str) -> Result<Option<Tenant>> {
    let id = id.to_owned();

    let raw: Option<RawTenant> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM tenants WHERE id = ?1", RawTenant::COLUMNS),
              rusqlite::params![id],
              RawTenant::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTenant::into_tenant).transpose()
  }

  async fn select_ids(&self, kind: RecordKind, filter: &RecordFilter) -> Result<Vec<String>> {
    let table = record_table(kind);
    let tenant_id = filter.tenant_id.clone();
    let cutoff = filter.cutoff.map(encode_dt);

    let sql = match cutoff {
      Some(_) => {
        let live = if kind.supports_soft_delete() { " AND deleted_at IS NULL" } else { "" };
        format!(
          "SELECT id FROM {table} WHERE tenant_id = ?1 AND {} < ?2{live} ORDER BY id",
          kind.timestamp_field()
        )
      }
      None => format!("SELECT id FROM {table} WHERE tenant_id = ?1 ORDER BY id"),
    };

    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = match cutoff {
          Some(c) => stmt
            .query_map(rusqlite::params![tenant_id, c], |r| r.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?,
          None => stmt
            .query_map(rusqlite::params![tenant_id], |r| r.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?,
        };
        Ok(rows)
      })
      .await?;

    Ok(ids)
  }

  async fn soft_delete(
    &self,
    kind: RecordKind,
    ids: &[String],
    now: DateTime<Utc>,
  ) -> Result<u64> {
    if ids.is_empty() {
      return Ok(0);
    }
    let ids = ids.to_vec();
    let leading = scrub_params(kind, now);

    let affected = self
      .conn
      .call(move |conn| Ok(execute_for_ids(conn, scrub_statement(kind), &leading, &ids)?))
      .await?;

    tracing::debug!(kind = %kind, affected, "soft-deleted records");
    Ok(affected)
  }

  async fn delete_dependents(&self, kind: DependentKind, candidate_ids: &[String]) -> Result<u64> {
    if candidate_ids.is_empty() {
      return Ok(0);
    }
    let ids = candidate_ids.to_vec();
    let head = format!("DELETE FROM {} WHERE candidate_id", dependent_table(kind));

    Ok(self.conn.call(move |conn| Ok(execute_for_ids(conn, &head, &[], &ids)?)).await?)
  }

  async fn delete_records(&self, kind: RecordKind, ids: &[String]) -> Result<u64> {
    if ids.is_empty() {
      return Ok(0);
    }
    let ids = ids.to_vec();
    let head = format!("DELETE FROM {} WHERE id", record_table(kind));

    Ok(self.conn.call(move |conn| Ok(execute_for_ids(conn, &head, &[], &ids)?)).await?)
  }

  async fn delete_tenant_entities(&self, entity: TenantEntity, tenant_id: &str) -> Result<u64> {
    let sql = format!("DELETE FROM {} WHERE tenant_id = ?1", tenant_entity_table(entity));
    let tenant_id = tenant_id.to_owned();

    let affected = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params![tenant_id])? as u64))
      .await?;
    Ok(affected)
  }
}
