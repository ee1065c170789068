use crate::cache::{CacheEntry, ResultCache};
use crate::runtime;
use crate::types::Verdict;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key holding the host-to-verdict map.
pub const CACHE_RESULTS_KEY: &str = "cacheResults";

/// Key holding the notification auto-hide delay (owned by the UI
/// collaborator; the engine only writes it through).
pub const AUTO_HIDE_DELAY_KEY: &str = "autoHideDelay";

/// Abstract key-value collaborator the engine persists through. Values are
/// JSON so callers stay agnostic of the backing format.
pub trait KeyValueStore {
  fn get(&self, key: &str) -> anyhow::Result<Option<serde_json::Value>>;
  fn set(&self, key: &str, value: serde_json::Value) -> anyhow::Result<()>;
}

/// Single-file JSON store with atomic writes (tmp + rename).
pub struct FileStore {
  path: PathBuf,
}

impl FileStore {
  pub fn new(path: PathBuf) -> Self {
    Self { path }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn read_map(&self) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    if !self.path.exists() {
      return Ok(serde_json::Map::new());
    }
    let raw = fs::read(&self.path).with_context(|| format!("read {}", self.path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("parse {}", self.path.display()))
  }
}

impl KeyValueStore for FileStore {
  fn get(&self, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    Ok(self.read_map()?.remove(key))
  }

  fn set(&self, key: &str, value: serde_json::Value) -> anyhow::Result<()> {
    if runtime::is_dry_run() {
      tracing::warn!(key, path = %self.path.display(), "DRY-RUN: would persist state");
      return Ok(());
    }

    let mut map = self.read_map().unwrap_or_default();
    map.insert(key.to_string(), value);

    let bytes = serde_json::to_vec_pretty(&map)?;
    atomic_write_file(&self.path, &bytes)
  }
}

/// Wire shape of one persisted entry, matching the original store layout:
/// hostname -> { result, timestamp }.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
  result: Verdict,
  timestamp: u64,
}

/// Restores persisted verdicts into `cache`, dropping anything stale.
/// Returns how many entries survived. A missing key is an empty cache, not
/// an error.
pub fn load_cache(store: &dyn KeyValueStore, cache: &ResultCache) -> anyhow::Result<usize> {
  let Some(value) = store.get(CACHE_RESULTS_KEY)? else {
    return Ok(0);
  };

  let map: HashMap<String, StoredEntry> =
    serde_json::from_value(value).context("parse cacheResults")?;

  let entries = map.into_iter().map(|(host, e)| {
    (
      host,
      CacheEntry {
        verdict: e.result,
        created_at_unix_ms: e.timestamp,
      },
    )
  });
  Ok(cache.load(entries))
}

pub fn save_cache(store: &dyn KeyValueStore, cache: &ResultCache) -> anyhow::Result<()> {
  let map: HashMap<String, StoredEntry> = cache
    .snapshot()
    .into_iter()
    .map(|(host, entry)| {
      (
        host,
        StoredEntry {
          result: entry.verdict,
          timestamp: entry.created_at_unix_ms,
        },
      )
    })
    .collect();

  store.set(CACHE_RESULTS_KEY, serde_json::to_value(&map)?)
}

fn atomic_write_file(dst: &Path, bytes: &[u8]) -> anyhow::Result<()> {
  let dir = dst
    .parent()
    .ok_or_else(|| anyhow::anyhow!("destination has no parent directory"))?;
  fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;

  let name = dst.file_name().and_then(|s| s.to_str()).unwrap_or("tmp");
  let tmp = dst.with_file_name(format!(".{name}.tmp"));
  fs::write(&tmp, bytes).with_context(|| format!("write {}", tmp.display()))?;
  fs::rename(&tmp, dst).with_context(|| format!("rename {} -> {}", tmp.display(), dst.display()))?;
  Ok(())
}
