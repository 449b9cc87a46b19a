//! Retention admin endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/tenants/{id}/retention` | Policy and expired-record counts |
//! | `POST` | `/retention/run` | `?dry_run=true` previews every tenant instead |
//! | `POST` | `/tenants/{id}/offboard` | Body: `{"mode":"HARD_DELETE"}` |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::Utc;
use edge_core::{
  retention::{
    RetentionJobSummary, RetentionPreview, TenantDeletionSummary, delete_tenant_data,
    preview_tenant_retention, run_tenant_retention_job,
  },
  store::RetentionStore,
  tenant::{DeletionMode, Tenant},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, auth::Admin, error::ApiError};

pub(crate) async fn find_tenant<S: RetentionStore>(
  store: &S,
  tenant_id: &str,
) -> Result<Tenant, ApiError> {
  store
    .get_tenant(tenant_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("tenant {tenant_id} not found")))
}

// ─── Preview ─────────────────────────────────────────────────────────────────

/// `GET /tenants/{id}/retention`
pub async fn preview<S, B, G>(
  Admin(_): Admin,
  State(state): State<AppState<S, B, G>>,
  Path(tenant_id): Path<String>,
) -> Result<Json<RetentionPreview>, ApiError>
where
  S: RetentionStore,
{
  let tenant = find_tenant(&*state.store, &tenant_id).await?;
  let preview =
    preview_tenant_retention(&*state.store, &tenant, Utc::now()).await.map_err(ApiError::store)?;
  Ok(Json(preview))
}

// ─── Run ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RunParams {
  #[serde(default)]
  pub dry_run: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RunResponse {
  Completed(RetentionJobSummary),
  DryRun { dry_run: bool, previews: Vec<RetentionPreview> },
}

/// `POST /retention/run[?dry_run=true]`
pub async fn run<S, B, G>(
  Admin(identity): Admin,
  State(state): State<AppState<S, B, G>>,
  Query(params): Query<RunParams>,
) -> Result<Json<RunResponse>, ApiError>
where
  S: RetentionStore,
{
  let store = &*state.store;
  let now = Utc::now();

  if params.dry_run {
    let tenants = store.list_tenants().await.map_err(ApiError::store)?;
    let mut previews = Vec::with_capacity(tenants.len());
    for tenant in &tenants {
      previews.push(preview_tenant_retention(store, tenant, now).await.map_err(ApiError::store)?);
    }
    return Ok(Json(RunResponse::DryRun { dry_run: true, previews }));
  }

  info!(requested_by = %identity.subject, "retention job triggered over HTTP");
  let summary = run_tenant_retention_job(store, now).await.map_err(ApiError::store)?;
  Ok(Json(RunResponse::Completed(summary)))
}

// ─── Offboard ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OffboardBody {
  pub mode: DeletionMode,
}

/// `POST /tenants/{id}/offboard` with body `{"mode":"HARD_DELETE"}`
pub async fn offboard<S, B, G>(
  Admin(identity): Admin,
  State(state): State<AppState<S, B, G>>,
  Path(tenant_id): Path<String>,
  Json(body): Json<OffboardBody>,
) -> Result<Json<TenantDeletionSummary>, ApiError>
where
  S: RetentionStore,
{
  let store = &*state.store;
  find_tenant(store, &tenant_id).await?;

  info!(tenant_id, mode = %body.mode, requested_by = %identity.subject, "offboarding tenant");
  let summary =
    delete_tenant_data(store, &tenant_id, body.mode, Utc::now()).await.map_err(ApiError::store)?;
  Ok(Json(summary))
}
