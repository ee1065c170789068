use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct Config {
  pub api: ApiConfig,
  pub cache: CacheConfig,
  pub logging: LoggingConfig,
  pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_endpoint")]
  pub endpoint: String,

  /// Overridable at runtime via `GUARDIAN_API_KEY`.
  #[serde(default)]
  pub api_key: String,

  #[serde(default = "default_client_id")]
  pub client_id: String,

  #[serde(default = "default_client_version")]
  pub client_version: String,

  #[serde(default = "default_timeout_seconds")]
  pub timeout_seconds: u64,
}

impl ApiConfig {
  pub fn resolved_api_key(&self) -> String {
    std::env::var("GUARDIAN_API_KEY").unwrap_or_else(|_| self.api_key.clone())
  }
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      endpoint: default_endpoint(),
      api_key: String::new(),
      client_id: default_client_id(),
      client_version: default_client_version(),
      timeout_seconds: default_timeout_seconds(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
  #[serde(default = "default_ttl_ms")]
  pub ttl_ms: u64,

  #[serde(default = "default_true")]
  pub persist: bool,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_ms: default_ttl_ms(),
      persist: true,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
  #[serde(default = "default_log_level")]
  pub level: String,

  #[serde(default = "default_retention_days")]
  pub retention_days: u64,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      retention_days: default_retention_days(),
    }
  }
}

/// Belongs to the notification UI collaborator; the engine only persists it
/// alongside the cache state so the UI can pick it up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
  #[serde(default = "default_auto_hide_delay_ms")]
  pub auto_hide_delay_ms: u64,
}

impl Default for NotifyConfig {
  fn default() -> Self {
    Self {
      auto_hide_delay_ms: default_auto_hide_delay_ms(),
    }
  }
}

fn default_endpoint() -> String {
  "https://safebrowsing.googleapis.com/v4/threatMatches:find".to_string()
}

fn default_client_id() -> String {
  "safe-browsing-guardian".to_string()
}

fn default_client_version() -> String {
  "1.0.0".to_string()
}

fn default_timeout_seconds() -> u64 {
  10
}

fn default_ttl_ms() -> u64 {
  crate::cache::DEFAULT_TTL_MS
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_retention_days() -> u64 {
  14
}

fn default_auto_hide_delay_ms() -> u64 {
  6_000
}

fn default_true() -> bool {
  true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
  #[serde(default)]
  pub api: Option<ApiConfig>,

  #[serde(default)]
  pub cache: Option<CacheConfig>,

  #[serde(default)]
  pub logging: Option<LoggingConfig>,

  #[serde(default)]
  pub notify: Option<NotifyConfig>,

  // Back-compat: early configs had a top-level `cache_duration_minutes`.
  #[serde(default)]
  pub cache_duration_minutes: Option<u64>,
}

impl ConfigFile {
  fn normalize(self) -> Config {
    let mut cfg = Config::default();
    if let Some(api) = self.api {
      cfg.api = api;
    }

    if let Some(cache) = self.cache {
      cfg.cache = cache;
    } else if let Some(minutes) = self.cache_duration_minutes {
      cfg.cache.ttl_ms = minutes.saturating_mul(60_000);
    }

    if let Some(logging) = self.logging {
      cfg.logging = logging;
    }
    if let Some(notify) = self.notify {
      cfg.notify = notify;
    }

    if let Some(reason) = validate_api_config(&cfg.api) {
      tracing::warn!(reason = %reason, "api config invalid; remote lookups will fail until fixed");
    }

    cfg
  }

  fn needs_upgrade(&self) -> bool {
    self.api.is_none() || self.cache.is_none() || self.logging.is_none() || self.notify.is_none()
  }
}

pub fn load_or_create_default(path: &Path) -> anyhow::Result<Config> {
  load_impl(path, true)
}

pub fn load_or_default_readonly(path: &Path) -> anyhow::Result<Config> {
  load_impl(path, false)
}

fn load_impl(path: &Path, allow_writes: bool) -> anyhow::Result<Config> {
  let parent = path
    .parent()
    .ok_or_else(|| anyhow::anyhow!("config path has no parent: {}", path.display()))?;
  if allow_writes {
    fs::create_dir_all(parent)?;
  }

  if !path.exists() {
    let cfg = Config::default();
    if allow_writes {
      write_atomic(path, &toml::to_string_pretty(&to_config_file(&cfg))?)?;
    } else {
      eprintln!(
        "URL Guardian: config missing at {}; using defaults in read-only mode.",
        path.display()
      );
    }
    return Ok(cfg);
  }

  let raw = fs::read_to_string(path)?;
  match toml::from_str::<ConfigFile>(&raw) {
    Ok(file) => {
      let needs_upgrade = file.needs_upgrade();
      let cfg = file.normalize();
      if allow_writes && needs_upgrade {
        let backup = backup_path(path, "bak");
        let _ = fs::copy(path, &backup);
        let _ = write_atomic(path, &toml::to_string_pretty(&to_config_file(&cfg))?);
        eprintln!(
          "URL Guardian: upgraded config defaults written to {} (backup: {})",
          path.display(),
          backup.display()
        );
      }
      Ok(cfg)
    }
    Err(e) => {
      let cfg = Config::default();
      if allow_writes {
        let backup = backup_path(path, "bad");
        let _ = fs::rename(path, &backup);
        write_atomic(path, &toml::to_string_pretty(&to_config_file(&cfg))?)?;
        eprintln!(
          "URL Guardian: invalid config at {} (backed up to {}): {e}",
          path.display(),
          backup.display()
        );
      } else {
        eprintln!(
          "URL Guardian: invalid config at {}; using defaults in read-only mode: {e}",
          path.display()
        );
      }
      Ok(cfg)
    }
  }
}

fn backup_path(path: &Path, kind: &str) -> std::path::PathBuf {
  let ts = std::time::SystemTime::now()
    .duration_since(std::time::UNIX_EPOCH)
    .unwrap_or_default()
    .as_secs();
  let parent = path.parent().unwrap_or_else(|| Path::new("."));
  parent.join(format!("config.toml.{kind}-{ts}"))
}

fn to_config_file(cfg: &Config) -> ConfigFile {
  ConfigFile {
    api: Some(cfg.api.clone()),
    cache: Some(cfg.cache.clone()),
    logging: Some(cfg.logging.clone()),
    notify: Some(cfg.notify.clone()),
    cache_duration_minutes: None,
  }
}

fn write_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
  let parent = path
    .parent()
    .ok_or_else(|| anyhow::anyhow!("file path has no parent: {}", path.display()))?;
  let tmp = parent.join(format!(
    ".{}.tmp",
    path.file_name().unwrap_or_default().to_string_lossy()
  ));

  fs::write(&tmp, contents)?;
  fs::rename(&tmp, path)?;
  Ok(())
}

pub fn validate_api_config(cfg: &ApiConfig) -> Option<String> {
  if cfg.timeout_seconds == 0 {
    return Some("timeout_seconds must be > 0".to_string());
  }
  if cfg.client_id.trim().is_empty() {
    return Some("client_id must not be empty".to_string());
  }

  let Ok(url) = reqwest::Url::parse(&cfg.endpoint) else {
    return Some(format!("invalid endpoint URL: {}", cfg.endpoint));
  };
  if url.scheme() != "https" {
    return Some(format!("endpoint must use HTTPS: {}", cfg.endpoint));
  }
  if url.host_str().is_none() {
    return Some(format!("endpoint has no host: {}", cfg.endpoint));
  }

  None
}
