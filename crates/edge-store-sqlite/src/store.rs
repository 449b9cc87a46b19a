//! [`SqliteStore`]: connection handling and tenant administration.
//!
//! The port implementations live in sibling modules: `retention` for
//! [`RetentionStore`](edge_core::store::RetentionStore), `sync` for
//! [`SyncStore`](edge_core::store::SyncStore) and `events` for
//! [`EventStore`](edge_core::store::EventStore).

use std::path::Path;

use edge_core::{
  store::RetentionStore as _,
  tenant::{DeletionMode, Tenant},
};
use rusqlite::types::Value;

use crate::{
  Error, Result,
  encode::{encode_dt, placeholders},
  schema::SCHEMA,
};

/// Upper bound on ids bound into a single `IN (…)` list; SQLite caps the
/// number of host parameters per statement.
const ID_CHUNK: usize = 500;

// ─── Store ───────────────────────────────────────────────────────────────────

/// An EDGE store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Tenants ───────────────────────────────────────────────────────────────

  /// Insert `tenant`, or overwrite its name and retention settings.
  pub async fn upsert_tenant(&self, tenant: &Tenant) -> Result<()> {
    let id = tenant.id.clone();
    let name = tenant.name.clone();
    let days = tenant.data_retention_days;
    let mode = tenant.deletion_mode.to_string();
    let created_at = encode_dt(tenant.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tenants (id, name, data_retention_days, deletion_mode, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (id) DO UPDATE SET
             name                = excluded.name,
             data_retention_days = excluded.data_retention_days,
             deletion_mode       = excluded.deletion_mode",
          rusqlite::params![id, name, days, mode, created_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Change a tenant's retention window and deletion mode.
  pub async fn set_retention(
    &self,
    tenant_id: &str,
    days: Option<i64>,
    mode: DeletionMode,
  ) -> Result<Tenant> {
    let id = tenant_id.to_owned();
    let mode_str = mode.to_string();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE tenants SET data_retention_days = ?2, deletion_mode = ?3 WHERE id = ?1",
          rusqlite::params![id, days, mode_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::TenantNotFound(tenant_id.to_owned()));
    }
    self
      .get_tenant(tenant_id)
      .await?
      .ok_or_else(|| Error::TenantNotFound(tenant_id.to_owned()))
  }
}

// ─── Bulk helpers ────────────────────────────────────────────────────────────

/// Run `{head} IN (<ids>)` once per chunk of `ids`, binding `leading`
/// as `?1..?k` ahead of the id placeholders. Returns total rows affected.
pub(crate) fn execute_for_ids(
  conn: &rusqlite::Connection,
  head: &str,
  leading: &[Value],
  ids: &[String],
) -> rusqlite::Result<u64> {
  let mut affected = 0_u64;
  for chunk in ids.chunks(ID_CHUNK) {
    let sql = format!("{head} IN ({})", placeholders(leading.len() + 1, chunk.len()));
    let params = leading
      .iter()
      .cloned()
      .chain(chunk.iter().cloned().map(Value::Text))
      .collect::<Vec<_>>();
    affected += conn.execute(&sql, rusqlite::params_from_iter(params))? as u64;
  }
  Ok(affected)
}
