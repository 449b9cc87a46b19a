//! Runtime configuration: an optional TOML file overlaid with `EDGE__*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use edge_ats::{bullhorn::BullhornConfig, greenhouse::GreenhouseConfig};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  #[serde(default)]
  pub auth_username:      String,
  /// PHC string from `edge hash-password`.
  #[serde(default)]
  pub auth_password_hash: String,
  pub bullhorn:           Option<BullhornConfig>,
  pub greenhouse:         Option<GreenhouseConfig>,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/edge/edge.db") }

impl ServerConfig {
  /// Read `path` (if it exists), then apply `EDGE__…` overrides, e.g.
  /// `EDGE__PORT=9000` or `EDGE__BULLHORN__CLIENT_ID=…`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("EDGE").prefix_separator("__").separator("__"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: ServerConfig =
      settings.try_deserialize().context("failed to deserialise ServerConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tilde_is_expanded_against_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/edge.db")), PathBuf::from(home).join("edge.db"));
    assert_eq!(expand_tilde(Path::new("/var/edge.db")), PathBuf::from("/var/edge.db"));
  }

  #[test]
  fn file_values_and_defaults_combine() {
    let dir = std::env::temp_dir().join(format!("edge-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("edge.toml");
    std::fs::write(
      &path,
      r#"
        port = 9100
        store_path = "/tmp/edge-test.db"
        auth_username = "admin"

        [greenhouse]
        token_url = "https://auth.example.com/token"
        client_id = "id"
        client_secret = "secret"
        webhook_secret = "hook"
      "#,
    )
    .unwrap();

    let cfg = ServerConfig::load(&path).unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 9100);
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/edge-test.db"));
    assert!(cfg.bullhorn.is_none());
    let gh = cfg.greenhouse.unwrap();
    assert_eq!(gh.base_url, "https://harvest.greenhouse.io");
    assert_eq!(gh.webhook_secret.as_deref(), Some("hook"));

    std::fs::remove_dir_all(dir).ok();
  }
}
