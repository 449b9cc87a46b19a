//! [`SyncStore`] implementation: idempotent upserts of mapped ATS records.
//!
//! Each upsert runs inside one SQLite transaction. A SHA-256 hash of the
//! mapped record is kept next to the row; an identical hash means nothing
//! changed and no write is issued.

use chrono::Utc;
use edge_core::{
  ats::{MappedCandidate, MappedJob, MappedPlacement},
  store::{SyncStore, UpsertOutcome},
};
use rusqlite::{OptionalExtension as _, Transaction};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{content_hash, encode_date, encode_dt},
  store::SqliteStore,
};

fn replace_skills(
  tx: &Transaction<'_>,
  table: &str,
  owner_column: &str,
  tenant_id: &str,
  owner_id: &str,
  skills: &[String],
) -> rusqlite::Result<()> {
  tx.execute(
    &format!("DELETE FROM {table} WHERE {owner_column} = ?1"),
    rusqlite::params![owner_id],
  )?;
  let mut stmt = tx.prepare(&format!(
    "INSERT INTO {table} (id, tenant_id, {owner_column}, skill) VALUES (?1, ?2, ?3, ?4)"
  ))?;
  for skill in skills {
    stmt.execute(rusqlite::params![Uuid::new_v4().to_string(), tenant_id, owner_id, skill])?;
  }
  Ok(())
}

impl SyncStore for SqliteStore {
  type Error = Error;

  async fn upsert_job(&self, tenant_id: &str, job: &MappedJob) -> Result<UpsertOutcome> {
    let hash = content_hash(job)?;
    let tenant_id = tenant_id.to_owned();
    let job = job.clone();
    let now = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let provider = job.provider.to_string();

        let existing: Option<(String, Option<String>)> = tx
          .query_row(
            "SELECT id, content_hash FROM job_reqs
              WHERE tenant_id = ?1 AND provider = ?2 AND external_id = ?3",
            rusqlite::params![tenant_id, provider, job.external_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;

        let outcome = match existing {
          Some((_, Some(stored))) if stored == hash => UpsertOutcome::Unchanged,
          Some((id, _)) => {
            tx.execute(
              "UPDATE job_reqs SET
                 title = ?2, status = ?3, is_open = ?4, employment_type = ?5,
                 location = ?6, department = ?7, client_name = ?8, description = ?9,
                 content_hash = ?10, updated_at = ?11
               WHERE id = ?1",
              rusqlite::params![
                id,
                job.title,
                job.status,
                job.is_open,
                job.employment_type,
                job.location,
                job.department,
                job.client_name,
                job.description,
                hash,
                now,
              ],
            )?;
            replace_skills(&tx, "job_skills", "job_req_id", &tenant_id, &id, &job.skills)?;
            UpsertOutcome::Updated
          }
          None => {
            let id = Uuid::new_v4().to_string();
            tx.execute(
              "INSERT INTO job_reqs (
                 id, tenant_id, provider, external_id, title, status, is_open,
                 employment_type, location, department, client_name, description,
                 content_hash, created_at, updated_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
              rusqlite::params![
                id,
                tenant_id,
                provider,
                job.external_id,
                job.title,
                job.status,
                job.is_open,
                job.employment_type,
                job.location,
                job.department,
                job.client_name,
                job.description,
                hash,
                now,
              ],
            )?;
            replace_skills(&tx, "job_skills", "job_req_id", &tenant_id, &id, &job.skills)?;
            UpsertOutcome::Inserted
          }
        };

        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    Ok(outcome)
  }

  async fn upsert_candidate(
    &self,
    tenant_id: &str,
    candidate: &MappedCandidate,
  ) -> Result<UpsertOutcome> {
    let hash = content_hash(candidate)?;
    let tenant_id = tenant_id.to_owned();
    let c = candidate.clone();
    let now = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let provider = c.provider.to_string();

        let existing: Option<(String, Option<String>, Option<String>)> = tx
          .query_row(
            "SELECT id, content_hash, deleted_at FROM candidates
              WHERE tenant_id = ?1 AND provider = ?2 AND external_id = ?3",
            rusqlite::params![tenant_id, provider, c.external_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
          )
          .optional()?;

        let outcome = match existing {
          // A scrubbed candidate stays scrubbed.
          Some((_, _, Some(_deleted_at))) => UpsertOutcome::Skipped,
          Some((_, Some(stored), None)) if stored == hash => UpsertOutcome::Unchanged,
          Some((id, _, None)) => {
            tx.execute(
              "UPDATE candidates SET
                 full_name = ?2, first_name = ?3, last_name = ?4, email = ?5, phone = ?6,
                 location = ?7, current_title = ?8, current_company = ?9, status = ?10,
                 content_hash = ?11, updated_at = ?12
               WHERE id = ?1",
              rusqlite::params![
                id,
                c.full_name,
                c.first_name,
                c.last_name,
                c.email,
                c.phone,
                c.location,
                c.current_title,
                c.current_company,
                c.status,
                hash,
                now,
              ],
            )?;
            replace_skills(&tx, "candidate_skills", "candidate_id", &tenant_id, &id, &c.skills)?;
            UpsertOutcome::Updated
          }
          None => {
            let id = Uuid::new_v4().to_string();
            tx.execute(
              "INSERT INTO candidates (
                 id, tenant_id, provider, external_id, full_name, first_name, last_name,
                 email, phone, location, current_title, current_company, status,
                 content_hash, created_at, updated_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)",
              rusqlite::params![
                id,
                tenant_id,
                provider,
                c.external_id,
                c.full_name,
                c.first_name,
                c.last_name,
                c.email,
                c.phone,
                c.location,
                c.current_title,
                c.current_company,
                c.status,
                hash,
                now,
              ],
            )?;
            replace_skills(&tx, "candidate_skills", "candidate_id", &tenant_id, &id, &c.skills)?;
            UpsertOutcome::Inserted
          }
        };

        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    Ok(outcome)
  }

  async fn upsert_placement(
    &self,
    tenant_id: &str,
    placement: &MappedPlacement,
  ) -> Result<UpsertOutcome> {
    let hash = content_hash(placement)?;
    let tenant_id = tenant_id.to_owned();
    let p = placement.clone();
    let now = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let provider = p.provider.to_string();
        let stored: Option<String> = conn
          .query_row(
            "SELECT content_hash FROM ats_placements
              WHERE tenant_id = ?1 AND provider = ?2 AND external_id = ?3",
            rusqlite::params![tenant_id, provider, p.external_id],
            |r| r.get(0),
          )
          .optional()?;

        if stored.as_deref() == Some(hash.as_str()) {
          return Ok(UpsertOutcome::Unchanged);
        }

        conn.execute(
          "INSERT INTO ats_placements (
             id, tenant_id, provider, external_id, job_external_id, candidate_external_id,
             status, start_date, end_date, salary, content_hash, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
           ON CONFLICT (tenant_id, provider, external_id) DO UPDATE SET
             job_external_id       = excluded.job_external_id,
             candidate_external_id = excluded.candidate_external_id,
             status                = excluded.status,
             start_date            = excluded.start_date,
             end_date              = excluded.end_date,
             salary                = excluded.salary,
             content_hash          = excluded.content_hash,
             updated_at            = excluded.updated_at",
          rusqlite::params![
            Uuid::new_v4().to_string(),
            tenant_id,
            provider,
            p.external_id,
            p.job_external_id,
            p.candidate_external_id,
            p.status,
            p.start_date.map(encode_date),
            p.end_date.map(encode_date),
            p.salary,
            hash,
            now,
          ],
        )?;

        Ok(if stored.is_some() { UpsertOutcome::Updated } else { UpsertOutcome::Inserted })
      })
      .await?;

    Ok(outcome)
  }
}
