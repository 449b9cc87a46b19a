//! `edge`: EDGE retention and ATS integration server.
//!
//! Reads `edge.toml` (or the path given with `--config`), opens the SQLite
//! store, and either serves the HTTP API or runs one administrative task and
//! exits. Scheduling the retention job is left to an external cron that
//! calls `edge retention run` or `POST /retention/run`.
//!
//! # Password hash generation
//!
//! ```sh
//! cargo run -p edge-server -- hash-password
//! ```

mod config;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, bail};
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use edge_api::{AppState, BasicAuthIdentity};
use edge_ats::{bullhorn::BullhornClient, greenhouse::GreenhouseClient, sync_provider};
use edge_core::{
  ats::AtsProvider,
  retention::{
    TenantDeletionSummary, delete_tenant_data, preview_tenant_retention, run_tenant_retention_job,
  },
  store::RetentionStore,
  tenant::DeletionMode,
};
use edge_store_sqlite::SqliteStore;
use rand_core::OsRng;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "EDGE retention and ATS integration server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "edge.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API.
  Serve,

  /// Retention job commands.
  Retention {
    #[command(subcommand)]
    action: RetentionAction,
  },

  /// Delete all of a tenant's data, ignoring its retention window.
  Offboard {
    tenant_id: String,
    /// `hard` or `soft`.
    #[arg(long, default_value = "soft")]
    mode:      DeletionMode,
  },

  /// Copy a provider's jobs, candidates and placements into the store.
  Sync {
    /// `bullhorn` or `greenhouse`.
    provider:  AtsProvider,
    tenant_id: String,
    /// Only records modified after this RFC 3339 instant.
    #[arg(long)]
    since:     Option<DateTime<Utc>>,
  },

  /// Print the argon2 hash for a password entered on stdin and exit.
  HashPassword,
}

#[derive(Subcommand)]
enum RetentionAction {
  /// Apply every tenant's retention policy now.
  Run {
    /// Report what would be deleted without deleting anything.
    #[arg(long)]
    dry_run: bool,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if let Command::HashPassword = cli.command {
    return hash_password();
  }

  let cfg = ServerConfig::load(&cli.config)?;
  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  match cli.command {
    Command::Serve => serve(cfg, store).await,
    Command::Retention { action: RetentionAction::Run { dry_run } } => {
      retention_run(&store, dry_run).await
    }
    Command::Offboard { tenant_id, mode } => {
      print_json(&offboard(&store, &tenant_id, mode).await?)
    }
    Command::Sync { provider, tenant_id, since } => {
      sync(&cfg, &store, provider, &tenant_id, since).await
    }
    // Handled before the store is opened.
    Command::HashPassword => Ok(()),
  }
}

async fn serve(cfg: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  if cfg.auth_username.is_empty() || cfg.auth_password_hash.is_empty() {
    bail!("auth_username and auth_password_hash must be set to serve the API");
  }

  let state = AppState {
    store:                     Arc::new(store),
    identity:                  Arc::new(BasicAuthIdentity {
      username:      cfg.auth_username.clone(),
      password_hash: cfg.auth_password_hash.clone(),
    }),
    bullhorn:                  cfg.bullhorn.clone().map(BullhornClient::new).transpose()?,
    greenhouse:                cfg.greenhouse.clone().map(GreenhouseClient::new).transpose()?,
    greenhouse_webhook_secret: cfg
      .greenhouse
      .as_ref()
      .and_then(|g| g.webhook_secret.as_deref())
      .map(Into::into),
  };

  let app = edge_api::router(state);
  let address = format!("{}:{}", cfg.host, cfg.port);

  info!("Listening on http://{address}");
  let listener =
    TcpListener::bind(&address).await.with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

async fn retention_run(store: &SqliteStore, dry_run: bool) -> anyhow::Result<()> {
  let now = Utc::now();
  if !dry_run {
    let summary = run_tenant_retention_job(store, now).await.context("retention job failed")?;
    return print_json(&summary);
  }

  let mut previews = Vec::new();
  for tenant in store.list_tenants().await? {
    previews.push(preview_tenant_retention(store, &tenant, now).await?);
  }
  print_json(&previews)
}

async fn offboard(
  store: &SqliteStore,
  tenant_id: &str,
  mode: DeletionMode,
) -> anyhow::Result<TenantDeletionSummary> {
  if store.get_tenant(tenant_id).await?.is_none() {
    bail!("tenant {tenant_id} not found");
  }
  delete_tenant_data(store, tenant_id, mode, Utc::now())
    .await
    .with_context(|| format!("offboarding {tenant_id} failed"))
}

async fn sync(
  cfg: &ServerConfig,
  store: &SqliteStore,
  provider: AtsProvider,
  tenant_id: &str,
  since: Option<DateTime<Utc>>,
) -> anyhow::Result<()> {
  let summary = match provider {
    AtsProvider::Bullhorn => {
      let bh = cfg.bullhorn.clone().context("no [bullhorn] section in the configuration")?;
      sync_provider(&BullhornClient::new(bh)?, store, tenant_id, since).await?
    }
    AtsProvider::Greenhouse => {
      let gh = cfg.greenhouse.clone().context("no [greenhouse] section in the configuration")?;
      sync_provider(&GreenhouseClient::new(gh)?, store, tenant_id, since).await?
    }
  };
  print_json(&summary)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

fn hash_password() -> anyhow::Result<()> {
  let password = read_password()?;
  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
    .to_string();
  println!("{hash}");
  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

#[cfg(test)]
mod tests {
  use edge_core::tenant::Tenant;

  use super::*;

  #[tokio::test]
  async fn offboarding_an_unknown_tenant_fails() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store.upsert_tenant(&Tenant::new("acme", "Acme")).await.unwrap();

    let err = offboard(&store, "acm", DeletionMode::HardDelete).await.unwrap_err();
    assert_eq!(err.to_string(), "tenant acm not found");

    let summary = offboard(&store, "acme", DeletionMode::HardDelete).await.unwrap();
    assert_eq!(summary.tenant_id, "acme");
  }
}
