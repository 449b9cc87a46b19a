//! [`EventStore`] implementation: ATS events appended to `ats_events`.

use edge_core::{
  events::{OutcomeRecord, ShortlistPushRecord, StageChangeRecord},
  store::EventStore,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{Error, Result, encode::encode_dt, store::SqliteStore};

/// Column values shared by every event row.
struct EventRow {
  tenant_id:    String,
  provider:     String,
  kind:         &'static str,
  job_id:       String,
  candidate_id: String,
  payload:      String,
  recorded_at:  String,
}

impl EventRow {
  fn new<T: Serialize>(
    kind: &'static str,
    tenant_id: &str,
    provider: impl ToString,
    job_id: &str,
    candidate_id: &str,
    recorded_at: chrono::DateTime<chrono::Utc>,
    record: &T,
  ) -> Result<Self> {
    Ok(Self {
      tenant_id: tenant_id.to_owned(),
      provider: provider.to_string(),
      kind,
      job_id: job_id.to_owned(),
      candidate_id: candidate_id.to_owned(),
      payload: serde_json::to_string(record)?,
      recorded_at: encode_dt(recorded_at),
    })
  }
}

impl SqliteStore {
  async fn append_event(&self, row: EventRow) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO ats_events (
             id, tenant_id, provider, kind, job_id, candidate_id, payload, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            Uuid::new_v4().to_string(),
            row.tenant_id,
            row.provider,
            row.kind,
            row.job_id,
            row.candidate_id,
            row.payload,
            row.recorded_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of events of `kind` recorded for `tenant_id`.
  pub async fn count_events(&self, tenant_id: &str, kind: &str) -> Result<u64> {
    let tenant_id = tenant_id.to_owned();
    let kind = kind.to_owned();
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM ats_events WHERE tenant_id = ?1 AND kind = ?2",
          rusqlite::params![tenant_id, kind],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(n as u64)
  }
}

impl EventStore for SqliteStore {
  type Error = Error;

  async fn record_stage_change(&self, record: StageChangeRecord) -> Result<()> {
    let row = EventRow::new(
      "stage_change",
      &record.tenant_id,
      record.provider,
      &record.event.job_id,
      &record.event.candidate_id,
      record.recorded_at,
      &record,
    )?;
    self.append_event(row).await
  }

  async fn record_outcome(&self, record: OutcomeRecord) -> Result<()> {
    let row = EventRow::new(
      "outcome",
      &record.tenant_id,
      record.provider,
      &record.event.job_id,
      &record.event.candidate_id,
      record.recorded_at,
      &record,
    )?;
    self.append_event(row).await
  }

  async fn record_shortlist_push(&self, record: ShortlistPushRecord) -> Result<()> {
    let row = EventRow::new(
      "shortlist_push",
      &record.tenant_id,
      record.provider,
      &record.job_id,
      &record.candidate_external_id,
      record.requested_at,
      &record,
    )?;
    self.append_event(row).await
  }
}
